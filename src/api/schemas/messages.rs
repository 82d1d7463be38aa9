use crate::api::schemas::users::UserResponse;
use crate::api::schemas::{ImageInfo, unix_seconds};
use crate::domain::conversation::ConversationEntry;
use crate::domain::message::MessageView;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct SendMessage {
    pub contents: Option<String>,
    pub recipient: Option<Uuid>,
    pub group: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub sender: Option<Uuid>,
    pub receiver: Option<Uuid>,
    pub group: Option<Uuid>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFriend {
    #[serde(default)]
    pub friend_email: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub sender: Option<UserResponse>,
    pub recipient_id: Option<Uuid>,
    pub recipient: Option<UserResponse>,
    pub group_id: Option<Uuid>,
    pub contents: Option<String>,
    pub image: Option<ImageInfo>,
    pub created_at: i64,
}

impl From<MessageView> for MessageResponse {
    fn from(view: MessageView) -> Self {
        let MessageView { message, sender, recipient } = view;
        Self {
            id: message.id,
            sender_id: message.sender_id,
            sender: sender.map(Into::into),
            recipient_id: message.target.recipient_id(),
            recipient: recipient.map(Into::into),
            group_id: message.target.group_id(),
            contents: message.contents,
            image: message.image.map(Into::into),
            created_at: unix_seconds(message.created_at),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub last_message_at: Option<i64>,
    pub is_friend: bool,
}

impl From<ConversationEntry> for ConversationResponse {
    fn from(entry: ConversationEntry) -> Self {
        Self {
            user: entry.profile.into(),
            last_message_at: entry.last_message_at.map(unix_seconds),
            is_friend: entry.is_friend,
        }
    }
}
