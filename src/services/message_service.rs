use crate::adapters::repository::{GroupRepository, MessageRepository, UserRepository};
use crate::config::MessagingConfig;
use crate::domain::conversation::{ConversationEntry, merge_contacts};
use crate::domain::image::Image;
use crate::domain::message::{Message, MessageDraft, MessageFilter, MessageTarget, MessageView};
use crate::domain::user::UserProfile;
use crate::error::{AppError, Result};
use crate::services::load_profiles;
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone, Debug)]
struct Metrics {
    messages_sent_total: Counter<u64>,
    images_served_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("chatterbox-server");
        Self {
            messages_sent_total: meter
                .u64_counter("messages_sent_total")
                .with_description("Total number of messages sent")
                .build(),
            images_served_total: meter
                .u64_counter("message_images_served_total")
                .with_description("Total number of message images downloaded")
                .build(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct MessageService {
    messages: Arc<dyn MessageRepository>,
    groups: Arc<dyn GroupRepository>,
    users: Arc<dyn UserRepository>,
    config: MessagingConfig,
    metrics: Metrics,
}

impl MessageService {
    #[must_use]
    pub fn new(
        messages: Arc<dyn MessageRepository>,
        groups: Arc<dyn GroupRepository>,
        users: Arc<dyn UserRepository>,
        config: MessagingConfig,
    ) -> Self {
        Self { messages, groups, users, config, metrics: Metrics::new() }
    }

    #[must_use]
    pub const fn max_image_bytes(&self) -> usize {
        self.config.max_image_bytes
    }

    #[tracing::instrument(skip(self, draft), fields(message_id = tracing::field::Empty), err(level = "warn"))]
    pub async fn send(&self, sender_id: Uuid, draft: MessageDraft) -> Result<MessageView> {
        let new_message = draft.validate(sender_id, self.config.max_contents_chars)?;

        let kind = match new_message.target {
            MessageTarget::Direct(recipient_id) => {
                if self.users.find_by_id(recipient_id).await?.is_none() {
                    return Err(AppError::not_found("Recipient not found"));
                }
                "direct"
            }
            MessageTarget::Group(group_id) => {
                let group =
                    self.groups.find_by_id(group_id).await?.ok_or_else(|| AppError::not_found("Group not found"))?;
                group.ensure_member(sender_id)?;
                "group"
            }
        };
        let has_image = new_message.image.is_some();

        let message = self.messages.create(new_message).await?;

        tracing::Span::current().record("message_id", tracing::field::display(message.id));
        tracing::debug!(kind, has_image, "Message stored");
        self.metrics
            .messages_sent_total
            .add(1, &[KeyValue::new("kind", kind), KeyValue::new("has_image", has_image)]);

        let mut views = self.populate(vec![message]).await?;
        views.pop().ok_or(AppError::Internal)
    }

    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn list(&self, caller: Uuid, filter: MessageFilter) -> Result<Vec<MessageView>> {
        let messages = match filter {
            MessageFilter::Between(a, b) => {
                if caller != a && caller != b {
                    return Err(AppError::forbidden("Access denied"));
                }
                self.messages.list_between(a, b).await?
            }
            MessageFilter::Group(group_id) => {
                let group =
                    self.groups.find_by_id(group_id).await?.ok_or_else(|| AppError::not_found("Group not found"))?;
                group.ensure_member(caller)?;
                self.messages.list_for_group(group_id).await?
            }
            MessageFilter::Involving(user_id) => {
                let group_ids = self.groups.group_ids_for_member(user_id).await?;
                self.messages.list_involving(user_id, &group_ids).await?
            }
        };

        self.populate(messages).await
    }

    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn get(&self, caller: Uuid, message_id: Uuid) -> Result<MessageView> {
        let message = self.load_readable(caller, message_id).await?;
        let mut views = self.populate(vec![message]).await?;
        views.pop().ok_or(AppError::Internal)
    }

    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn image(&self, caller: Uuid, message_id: Uuid) -> Result<Image> {
        let message = self.load_readable(caller, message_id).await?;
        if message.image.is_none() {
            return Err(AppError::not_found("Message has no image"));
        }

        let image =
            self.messages.find_image(message_id).await?.ok_or_else(|| AppError::not_found("Message has no image"))?;
        self.metrics.images_served_total.add(1, &[]);
        Ok(image)
    }

    /// Everyone the caller has exchanged direct messages with, followed by friends without history.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn conversations(&self, caller: Uuid, user_id: Uuid) -> Result<Vec<ConversationEntry>> {
        if caller != user_id {
            return Err(AppError::forbidden("Access denied"));
        }

        let (history, friend_ids) =
            tokio::try_join!(self.messages.list_direct_for_user(user_id), self.users.friend_ids(user_id))?;

        let contacts = merge_contacts(user_id, &history, &friend_ids);
        let ids: Vec<Uuid> = contacts.iter().map(|c| c.user_id).collect();
        let profiles = load_profiles(self.users.as_ref(), &ids).await?;

        Ok(contacts
            .into_iter()
            .filter_map(|contact| {
                profiles.get(&contact.user_id).map(|profile| ConversationEntry {
                    profile: profile.clone(),
                    last_message_at: contact.last_message_at,
                    is_friend: contact.is_friend,
                })
            })
            .collect())
    }

    async fn load_readable(&self, caller: Uuid, message_id: Uuid) -> Result<Message> {
        let message =
            self.messages.find_by_id(message_id).await?.ok_or_else(|| AppError::not_found("Message not found"))?;

        let allowed = match message.target {
            MessageTarget::Direct(_) => message.is_direct_participant(caller),
            MessageTarget::Group(group_id) => {
                self.groups.find_by_id(group_id).await?.is_some_and(|group| group.is_member(caller))
            }
        };

        if allowed { Ok(message) } else { Err(AppError::forbidden("Access denied")) }
    }

    async fn populate(&self, messages: Vec<Message>) -> Result<Vec<MessageView>> {
        let mut ids: Vec<Uuid> = messages
            .iter()
            .flat_map(|m| std::iter::once(m.sender_id).chain(m.target.recipient_id()))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        let profiles: HashMap<Uuid, UserProfile> = load_profiles(self.users.as_ref(), &ids).await?;

        Ok(messages
            .into_iter()
            .map(|message| {
                let sender = profiles.get(&message.sender_id).cloned();
                let recipient = message.target.recipient_id().and_then(|id| profiles.get(&id).cloned());
                MessageView { message, sender, recipient }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{MemoryGroupRepository, MemoryMessageRepository, MemoryUserRepository};
    use crate::domain::group::NewGroup;
    use crate::domain::user::NewUser;
    use bytes::Bytes;

    struct Fixture {
        service: MessageService,
        users: Arc<MemoryUserRepository>,
        groups: Arc<MemoryGroupRepository>,
    }

    impl Fixture {
        fn new() -> Self {
            let users = Arc::new(MemoryUserRepository::new());
            let groups = Arc::new(MemoryGroupRepository::new());
            let service = MessageService::new(
                Arc::new(MemoryMessageRepository::new()),
                Arc::clone(&groups) as Arc<dyn GroupRepository>,
                Arc::clone(&users) as Arc<dyn UserRepository>,
                MessagingConfig { max_contents_chars: 100, max_image_bytes: 1024 },
            );
            Self { service, users, groups }
        }

        async fn user(&self, name: &str) -> Uuid {
            self.users
                .create(NewUser {
                    email: format!("{name}@example.com"),
                    password_hash: String::new(),
                    first_name: name.into(),
                    last_name: "Test".into(),
                })
                .await
                .unwrap()
                .id
        }

        async fn group(&self, admin: Uuid, members: &[Uuid]) -> Uuid {
            self.groups.create(NewGroup::new(admin, "Team", None, members).unwrap()).await.unwrap().id
        }

        async fn dm(&self, from: Uuid, to: Uuid, text: &str) -> MessageView {
            let draft = MessageDraft { contents: Some(text.into()), recipient: Some(to), ..Default::default() };
            self.service.send(from, draft).await.unwrap()
        }
    }

    #[tokio::test]
    async fn test_send_populates_profiles() {
        let fx = Fixture::new();
        let (ada, bob) = (fx.user("ada").await, fx.user("bob").await);

        let view = fx.dm(ada, bob, "hello").await;
        assert_eq!(view.sender.unwrap().id, ada);
        assert_eq!(view.recipient.unwrap().id, bob);
        assert_eq!(view.message.contents.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_send_checks_targets() {
        let fx = Fixture::new();
        let (ada, bob, eve) = (fx.user("ada").await, fx.user("bob").await, fx.user("eve").await);
        let group_id = fx.group(ada, &[bob]).await;

        let to_ghost = MessageDraft { contents: Some("hi".into()), recipient: Some(Uuid::new_v4()), ..Default::default() };
        assert!(matches!(fx.service.send(ada, to_ghost).await, Err(AppError::NotFound(_))));

        let outsider = MessageDraft { contents: Some("hi".into()), group: Some(group_id), ..Default::default() };
        assert!(matches!(fx.service.send(eve, outsider).await, Err(AppError::Forbidden(_))));

        let missing = MessageDraft { contents: Some("hi".into()), group: Some(Uuid::new_v4()), ..Default::default() };
        assert!(matches!(fx.service.send(ada, missing).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_filters_and_access() {
        let fx = Fixture::new();
        let (ada, bob, eve) = (fx.user("ada").await, fx.user("bob").await, fx.user("eve").await);
        let group_id = fx.group(ada, &[bob]).await;

        fx.dm(ada, bob, "one").await;
        fx.dm(bob, ada, "two").await;
        fx.dm(eve, bob, "other").await;
        let draft = MessageDraft { contents: Some("team".into()), group: Some(group_id), ..Default::default() };
        fx.service.send(bob, draft).await.unwrap();

        let between = fx.service.list(ada, MessageFilter::Between(ada, bob)).await.unwrap();
        let texts: Vec<_> = between.iter().filter_map(|v| v.message.contents.as_deref()).collect();
        assert_eq!(texts, vec!["one", "two"]);

        assert!(matches!(fx.service.list(eve, MessageFilter::Between(ada, bob)).await, Err(AppError::Forbidden(_))));
        assert!(matches!(fx.service.list(eve, MessageFilter::Group(group_id)).await, Err(AppError::Forbidden(_))));

        let mine = fx.service.list(ada, MessageFilter::Involving(ada)).await.unwrap();
        assert_eq!(mine.len(), 3);
    }

    #[tokio::test]
    async fn test_detail_and_image_access() {
        let fx = Fixture::new();
        let (ada, bob, eve) = (fx.user("ada").await, fx.user("bob").await, fx.user("eve").await);

        let image = Image::new(Some("image/gif"), Bytes::from_static(b"GIF89a"), 1024).unwrap();
        let draft = MessageDraft { recipient: Some(bob), image: Some(image.clone()), ..Default::default() };
        let sent = fx.service.send(ada, draft).await.unwrap();
        let id = sent.message.id;

        assert_eq!(fx.service.image(bob, id).await.unwrap(), image);
        assert!(matches!(fx.service.get(eve, id).await, Err(AppError::Forbidden(_))));
        assert!(matches!(fx.service.image(eve, id).await, Err(AppError::Forbidden(_))));

        let text_only = fx.dm(ada, bob, "no picture").await;
        assert!(matches!(fx.service.image(ada, text_only.message.id).await, Err(AppError::NotFound(_))));
        assert!(matches!(fx.service.get(ada, Uuid::new_v4()).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_conversations_merge_friends() {
        let fx = Fixture::new();
        let (ada, bob, carol, dave) =
            (fx.user("ada").await, fx.user("bob").await, fx.user("carol").await, fx.user("dave").await);

        fx.dm(ada, bob, "first").await;
        fx.dm(carol, ada, "second").await;
        fx.users.add_friend(ada, dave).await.unwrap();
        fx.users.add_friend(ada, bob).await.unwrap();

        let entries = fx.service.conversations(ada, ada).await.unwrap();
        let ids: Vec<Uuid> = entries.iter().map(|e| e.profile.id).collect();
        assert_eq!(ids.len(), 3);
        assert_eq!(ids[2], dave);
        assert!(ids.contains(&bob) && ids.contains(&carol));
        assert!(!ids.contains(&ada));
        assert!(entries.iter().find(|e| e.profile.id == bob).unwrap().is_friend);
        assert!(entries[2].last_message_at.is_none());

        assert!(matches!(fx.service.conversations(bob, ada).await, Err(AppError::Forbidden(_))));
    }
}
