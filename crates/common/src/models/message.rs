//! Direct messages and the derived conversation view

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub is_read: bool,
}

impl Message {
    /// True when the message was exchanged between exactly `a` and `b`
    pub fn is_between(&self, a: i64, b: i64) -> bool {
        (self.sender_id == a && self.receiver_id == b)
            || (self.sender_id == b && self.receiver_id == a)
    }

    pub fn involves(&self, user_id: i64) -> bool {
        self.sender_id == user_id || self.receiver_id == user_id
    }

    /// The participant that is not `user_id`
    pub fn counterpart(&self, user_id: i64) -> i64 {
        if self.sender_id == user_id {
            self.receiver_id
        } else {
            self.sender_id
        }
    }
}

/// Body of `POST /messages`; the sender is the authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct NewMessage {
    pub receiver_id: i64,
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
}

/// Conversation key for the unordered participant pair
pub fn conversation_id(a: i64, b: i64) -> String {
    format!("{}-{}", a.min(b), a.max(b))
}

/// All messages between two users, summarised for one viewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    /// Ordered `[min, max]`
    pub participants: [i64; 2],
    pub last_message: Message,
    /// Unread messages addressed to the viewer
    pub unread_count: usize,
}
