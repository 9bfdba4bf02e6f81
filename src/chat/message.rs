use chrono::{DateTime, Utc};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sender {
    You,
    System,
    Peer(String),
}

impl Sender {
    pub fn is_you(&self) -> bool {
        matches!(self, Sender::You)
    }

    pub fn is_system(&self) -> bool {
        matches!(self, Sender::System)
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::You => f.write_str("You"),
            Sender::System => f.write_str("System"),
            Sender::Peer(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub sender: Sender,
    pub body: String,
    pub created_at_label: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl ChatMessage {
    /// A message stays visible while its expiry lies strictly in the future.
    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |expiry| expiry > now)
    }

    /// Whole seconds left before expiry, if the message expires and still has time left
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> Option<i64> {
        let remaining = (self.expires_at? - now).num_seconds();
        (remaining > 0).then_some(remaining)
    }
}
