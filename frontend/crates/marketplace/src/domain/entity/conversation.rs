//! Conversations and Messages
//!
//! One conversation per application, between the student and the recruiter
//! who posted the opportunity.

use chrono::{DateTime, Utc};
use kernel::id::{ApplicationId, ConversationId, MessageId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub application_id: ApplicationId,
    pub student_id: UserId,
    pub recruiter_id: UserId,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_message_at: Option<DateTime<Utc>>,
}

impl Conversation {
    pub fn includes(&self, user_id: &UserId) -> bool {
        self.student_id == *user_id || self.recruiter_id == *user_id
    }

    /// The other participant
    pub fn counterpart(&self, user_id: &UserId) -> UserId {
        if self.student_id == *user_id {
            self.recruiter_id
        } else {
            self.student_id
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read_at: Option<DateTime<Utc>>,
}

impl Message {
    pub fn is_unread_for(&self, user_id: &UserId) -> bool {
        self.read_at.is_none() && self.sender_id != *user_id
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewMessage {
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub content: String,
}

/// Merge `incoming` into `messages`
///
/// Ids already present are skipped, so replaying a realtime delivery is a
/// no-op. The list stays ordered by `created_at` (ties keep arrival order).
/// Returns how many messages were added.
pub fn merge_messages(messages: &mut Vec<Message>, incoming: impl IntoIterator<Item = Message>) -> usize {
    let before = messages.len();
    for message in incoming {
        if messages.iter().any(|existing| existing.id == message.id) {
            continue;
        }
        messages.push(message);
    }
    let added = messages.len() - before;
    if added > 0 {
        messages.sort_by_key(|message| message.created_at);
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn message(conversation_id: ConversationId, minute: u32, content: &str) -> Message {
        Message {
            id: MessageId::new(),
            conversation_id,
            sender_id: UserId::new(),
            content: content.to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 10, minute, 0).unwrap(),
            read_at: None,
        }
    }

    #[test]
    fn test_merge_is_idempotent() {
        let conversation = ConversationId::new();
        let first = message(conversation, 0, "hi");
        let mut messages = vec![first.clone()];

        assert_eq!(merge_messages(&mut messages, [first.clone()]), 0);
        assert_eq!(merge_messages(&mut messages, vec![first]), 0);
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn test_merge_orders_by_creation() {
        let conversation = ConversationId::new();
        let mut messages = vec![message(conversation, 5, "second")];
        let late = message(conversation, 9, "third");
        let early = message(conversation, 1, "first");

        assert_eq!(merge_messages(&mut messages, [late, early]), 2);
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_unread_ignores_own_messages() {
        let msg = message(ConversationId::new(), 0, "hello");
        assert!(!msg.is_unread_for(&msg.sender_id));
        assert!(msg.is_unread_for(&UserId::new()));
    }
}
