pub mod group;
pub mod image;
pub mod message;
pub mod user;

pub use group::GroupRecord;
pub use image::ImageRecord;
pub use message::MessageRecord;
pub use user::UserRecord;
