//! Messaging Use Cases
//!
//! A [`ConversationWatch`] keeps a conversation's message list current by
//! merging realtime inserts into it. The feed starts at the newest loaded
//! message's `created_at` (the backend's clock, not ours), inclusive, so
//! nothing sent after the history was read is skipped; the id-based merge
//! drops the copies that overlap.

use std::sync::Arc;

use baas::{ChangeEvent, ChangeFeed, ColumnFilter, RowChange, Subscription};
use kernel::id::{ConversationId, UserId};

use crate::application::viewer::Viewer;
use crate::domain::entity::{Conversation, Message, NewMessage, merge_messages};
use crate::domain::repository::ConversationRepository;
use crate::domain::value_object::MessageBody;
use crate::error::{MarketError, MarketResult};

const MESSAGES_TABLE: &str = "messages";

/// Conversation paired with the other participant
#[derive(Debug, Clone)]
pub struct ConversationSummary {
    pub conversation: Conversation,
    pub counterpart: UserId,
}

pub struct MessagingUseCase<C, F>
where
    C: ConversationRepository,
    F: ChangeFeed,
{
    repo: Arc<C>,
    feed: Arc<F>,
}

impl<C, F> MessagingUseCase<C, F>
where
    C: ConversationRepository,
    F: ChangeFeed,
{
    pub fn new(repo: Arc<C>, feed: Arc<F>) -> Self {
        Self { repo, feed }
    }

    /// Conversations the viewer takes part in, most recent activity first
    pub async fn conversations(&self, viewer: &Viewer) -> MarketResult<Vec<ConversationSummary>> {
        let mut conversations = self.repo.list_for_user(&viewer.user_id).await?;
        conversations.sort_by_key(|c| std::cmp::Reverse(c.last_message_at.unwrap_or(c.created_at)));
        Ok(conversations
            .into_iter()
            .map(|conversation| ConversationSummary {
                counterpart: conversation.counterpart(&viewer.user_id),
                conversation,
            })
            .collect())
    }

    /// Message history; marks what the viewer received as read
    pub async fn open(&self, viewer: &Viewer, id: &ConversationId) -> MarketResult<Vec<Message>> {
        self.ensure_participant(viewer, id).await?;
        let mut messages = Vec::new();
        merge_messages(&mut messages, self.repo.messages(id).await?);

        if messages.iter().any(|m| m.is_unread_for(&viewer.user_id)) {
            if let Err(e) = self.repo.mark_read(id, &viewer.user_id).await {
                tracing::warn!(conversation_id = %id, error = %e, "Failed to mark messages read");
            }
        }
        Ok(messages)
    }

    pub async fn send(&self, viewer: &Viewer, id: &ConversationId, text: &str) -> MarketResult<Message> {
        let body = MessageBody::parse(text)?;
        self.ensure_participant(viewer, id).await?;
        let message = self
            .repo
            .send(&NewMessage {
                conversation_id: *id,
                sender_id: viewer.user_id,
                content: body.into_inner(),
            })
            .await?;
        tracing::debug!(conversation_id = %id, message_id = %message.id, "Message sent");
        Ok(message)
    }

    /// History plus a live feed of new messages
    pub async fn watch(&self, viewer: &Viewer, id: &ConversationId) -> MarketResult<ConversationWatch> {
        let conversation = self.ensure_participant(viewer, id).await?;
        let history = self.open(viewer, id).await?;
        let since = history
            .iter()
            .map(|m| m.created_at)
            .max()
            .unwrap_or(conversation.created_at);
        let subscription = self.feed.subscribe_since(
            MESSAGES_TABLE,
            Some(ColumnFilter::eq("conversation_id", id)),
            Some(since),
        );
        Ok(ConversationWatch {
            conversation_id: *id,
            messages: history,
            subscription,
        })
    }

    async fn ensure_participant(&self, viewer: &Viewer, id: &ConversationId) -> MarketResult<Conversation> {
        let conversation = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(MarketError::NotFound("Conversation"))?;
        if !conversation.includes(&viewer.user_id) && !viewer.is_admin() {
            return Err(MarketError::Forbidden("You are not part of this conversation".into()));
        }
        Ok(conversation)
    }
}

/// Live view of one conversation
pub struct ConversationWatch {
    conversation_id: ConversationId,
    messages: Vec<Message>,
    subscription: Subscription,
}

impl ConversationWatch {
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Wait for the next message not seen before
    ///
    /// Returns `None` once the feed has stopped.
    pub async fn next(&mut self) -> Option<Message> {
        loop {
            let change = self.subscription.recv().await?;
            if let Some(message) = self.apply(change) {
                return Some(message);
            }
        }
    }

    /// Merge one change; returns the message if it was new
    pub fn apply(&mut self, change: RowChange) -> Option<Message> {
        if change.event != ChangeEvent::Insert {
            return None;
        }
        let row = change.new?;
        let message: Message = match serde_json::from_value(row) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring malformed message row");
                return None;
            }
        };
        if message.conversation_id != self.conversation_id {
            return None;
        }
        let added = merge_messages(&mut self.messages, [message.clone()]);
        (added > 0).then_some(message)
    }
}
