pub mod auth;
pub mod auth_session;
pub mod conversation;
pub mod group;
pub mod image;
pub mod message;
pub mod user;
