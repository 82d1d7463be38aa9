use crate::domain::image::{Image, ImageMeta};
use crate::domain::user::UserProfile;
use crate::error::{AppError, Result};
use time::OffsetDateTime;
use uuid::Uuid;

/// Where a message is delivered. A message targets exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageTarget {
    Direct(Uuid),
    Group(Uuid),
}

impl MessageTarget {
    #[must_use]
    pub const fn recipient_id(self) -> Option<Uuid> {
        match self {
            Self::Direct(id) => Some(id),
            Self::Group(_) => None,
        }
    }

    #[must_use]
    pub const fn group_id(self) -> Option<Uuid> {
        match self {
            Self::Group(id) => Some(id),
            Self::Direct(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Message {
    pub(crate) id: Uuid,
    pub(crate) sender_id: Uuid,
    pub(crate) target: MessageTarget,
    pub(crate) contents: Option<String>,
    pub(crate) image: Option<ImageMeta>,
    pub(crate) created_at: OffsetDateTime,
}

impl Message {
    /// The other participant of a direct message, seen from `user_id`.
    #[must_use]
    pub fn counterpart(&self, user_id: Uuid) -> Option<Uuid> {
        let MessageTarget::Direct(recipient_id) = self.target else {
            return None;
        };
        let other = if self.sender_id == user_id {
            recipient_id
        } else if recipient_id == user_id {
            self.sender_id
        } else {
            return None;
        };
        (other != user_id).then_some(other)
    }

    /// Whether `user_id` is the sender or recipient of a direct message.
    /// Group participation is decided by membership, not by the message.
    #[must_use]
    pub fn is_direct_participant(&self, user_id: Uuid) -> bool {
        self.sender_id == user_id || self.target.recipient_id() == Some(user_id)
    }
}

/// A validated message ready to be stored.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender_id: Uuid,
    pub target: MessageTarget,
    pub contents: Option<String>,
    pub image: Option<Image>,
}

/// Unvalidated send request, assembled from JSON or a multipart form.
#[derive(Debug, Default)]
pub struct MessageDraft {
    pub contents: Option<String>,
    pub recipient: Option<Uuid>,
    pub group: Option<Uuid>,
    pub image: Option<Image>,
}

impl MessageDraft {
    /// # Errors
    /// Returns `AppError::BadRequest` if the draft has no body, an ambiguous or missing target,
    /// or contents longer than `max_contents_chars`.
    pub fn validate(self, sender_id: Uuid, max_contents_chars: usize) -> Result<NewMessage> {
        let contents = self.contents.filter(|c| !c.trim().is_empty());

        if contents.is_none() && self.image.is_none() {
            return Err(AppError::bad_request("Message must have contents or an image"));
        }
        if let Some(text) = &contents
            && text.chars().count() > max_contents_chars
        {
            return Err(AppError::bad_request(format!(
                "Message contents must be at most {max_contents_chars} characters"
            )));
        }

        let target = match (self.recipient, self.group) {
            (Some(_), Some(_)) => {
                return Err(AppError::bad_request("Message cannot have both a recipient and a group"));
            }
            (None, None) => return Err(AppError::bad_request("Message requires a recipient or a group")),
            (Some(recipient), None) => {
                if recipient == sender_id {
                    return Err(AppError::bad_request("Cannot send a message to yourself"));
                }
                MessageTarget::Direct(recipient)
            }
            (None, Some(group)) => MessageTarget::Group(group),
        };

        Ok(NewMessage { sender_id, target, contents, image: self.image })
    }
}

/// Which slice of the message history a caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageFilter {
    Between(Uuid, Uuid),
    Group(Uuid),
    Involving(Uuid),
}

impl MessageFilter {
    /// # Errors
    /// Returns `AppError::BadRequest` for a half-specified pair or a pair mixed with a group.
    pub fn from_query(caller: Uuid, sender: Option<Uuid>, receiver: Option<Uuid>, group: Option<Uuid>) -> Result<Self> {
        match (sender, receiver, group) {
            (None, None, None) => Ok(Self::Involving(caller)),
            (None, None, Some(group)) => Ok(Self::Group(group)),
            (Some(a), Some(b), None) => Ok(Self::Between(a, b)),
            (Some(_), Some(_), Some(_)) => {
                Err(AppError::bad_request("Filter by either a sender/receiver pair or a group, not both"))
            }
            _ => Err(AppError::bad_request("sender and receiver must be provided together")),
        }
    }
}

/// A message with its sender and recipient resolved to public profiles.
#[derive(Debug, Clone)]
pub struct MessageView {
    pub message: Message,
    pub sender: Option<UserProfile>,
    pub recipient: Option<UserProfile>,
}
