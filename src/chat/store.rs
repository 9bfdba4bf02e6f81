use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use super::{ChatMessage, Clock, Sender};

/// In-memory chat history. Expired messages are dropped on every read.
pub struct MessageStore {
    messages: Vec<ChatMessage>,
    clock: Arc<dyn Clock>,
}

impl MessageStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            messages: Vec::new(),
            clock,
        }
    }

    /// Append a message. A TTL of `None` or `Some(0)` means the message never expires.
    pub fn add(&mut self, sender: Sender, body: impl Into<String>, ttl_secs: Option<u64>) {
        let now = self.clock.now();
        let expires_at = ttl_secs
            .filter(|&ttl| ttl > 0)
            .and_then(|ttl| expiry_after(now, ttl));

        self.messages.push(ChatMessage {
            sender,
            body: body.into(),
            created_at_label: self.clock.label_for(now),
            expires_at,
        });
    }

    pub fn delete_all(&mut self) {
        self.messages.clear();
    }

    /// Evict everything that has expired, then return what is left in insertion order.
    pub fn get_all(&mut self) -> &[ChatMessage] {
        let now = self.clock.now();
        let before = self.messages.len();
        self.messages.retain(|m| m.is_visible_at(now));

        let evicted = before - self.messages.len();
        if evicted > 0 {
            log::debug!("Evicted {} expired message(s)", evicted);
        }

        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

// TTLs too large to represent are treated as "never"
fn expiry_after(now: DateTime<Utc>, ttl_secs: u64) -> Option<DateTime<Utc>> {
    let ttl = Duration::try_seconds(i64::try_from(ttl_secs).ok()?)?;
    now.checked_add_signed(ttl)
}
