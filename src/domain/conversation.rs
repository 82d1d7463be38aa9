use crate::domain::message::Message;
use crate::domain::user::UserProfile;
use std::collections::{HashMap, HashSet};
use time::OffsetDateTime;
use uuid::Uuid;

/// One entry of a user's contact list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub user_id: Uuid,
    pub last_message_at: Option<OffsetDateTime>,
    pub is_friend: bool,
}

/// Merges direct-message counterparts with the friends list.
///
/// Counterparts come first, most recent exchange first; friends with no history follow in
/// the order they were added. Every user appears once and `user_id` never appears.
#[must_use]
pub fn merge_contacts(user_id: Uuid, history: &[Message], friend_ids: &[Uuid]) -> Vec<Contact> {
    let friends: HashSet<Uuid> = friend_ids.iter().copied().collect();
    let mut latest: HashMap<Uuid, OffsetDateTime> = HashMap::new();

    for message in history {
        if let Some(other) = message.counterpart(user_id) {
            latest
                .entry(other)
                .and_modify(|at| {
                    if message.created_at > *at {
                        *at = message.created_at;
                    }
                })
                .or_insert(message.created_at);
        }
    }

    let mut contacts: Vec<Contact> = latest
        .into_iter()
        .map(|(id, at)| Contact { user_id: id, last_message_at: Some(at), is_friend: friends.contains(&id) })
        .collect();
    contacts.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at).then_with(|| a.user_id.cmp(&b.user_id)));

    let mut seen: HashSet<Uuid> = contacts.iter().map(|c| c.user_id).collect();
    seen.insert(user_id);
    for &friend in friend_ids {
        if seen.insert(friend) {
            contacts.push(Contact { user_id: friend, last_message_at: None, is_friend: true });
        }
    }

    contacts
}

/// A contact resolved to the counterpart's public profile.
#[derive(Debug, Clone)]
pub struct ConversationEntry {
    pub profile: UserProfile,
    pub last_message_at: Option<OffsetDateTime>,
    pub is_friend: bool,
}
