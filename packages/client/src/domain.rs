//! Domain logic for client-side operations.
//!
//! This module contains pure functions and state holders that implement
//! business logic without side effects, making them easy to test.

use std::collections::{BTreeMap, HashMap};

use beehive_server::infrastructure::dto::websocket::{ChatPayload, InboundEvent, OutboundEvent};
use beehive_shared::time::{Clock, timestamp_to_rfc3339};
use uuid::Uuid;

use crate::error::ClientError;

/// Check if the client should exit immediately based on the error type.
///
/// # Returns
///
/// `true` if the error requires immediate exit (e.g., Unauthorized),
/// `false` otherwise
pub fn should_exit_immediately(error: &ClientError) -> bool {
    matches!(
        error,
        ClientError::Unauthorized(_) | ClientError::InvalidUrl(_)
    )
}

/// Check if the client should attempt to reconnect.
///
/// # Arguments
///
/// * `error` - The client error that occurred
/// * `current_attempt` - The current reconnection attempt count (0-indexed)
/// * `max_attempts` - The maximum number of reconnection attempts allowed
pub fn should_attempt_reconnect(
    error: &ClientError,
    current_attempt: u32,
    max_attempts: u32,
) -> bool {
    // Don't reconnect if the error requires immediate exit
    if should_exit_immediately(error) {
        return false;
    }

    current_attempt < max_attempts
}

/// Build a `chat:send` event for one line of input.
///
/// Every message gets a fresh chat identifier, so sends never overwrite each other.
pub fn compose_chat(line: &str, username: &str, clock: &dyn Clock) -> InboundEvent {
    InboundEvent::ChatSend(ChatPayload {
        data: line.to_string(),
        username: username.to_string(),
        timestamp: timestamp_to_rfc3339(clock.now_millis()),
        chat_id: Uuid::new_v4().to_string(),
    })
}

/// What a server frame did to the local view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewUpdate {
    /// The whole view was replaced by a snapshot
    Replaced,
    /// One entry was inserted or overwritten
    Upserted(ChatPayload),
}

/// Local copy of the chat history, keyed by chat identifier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatView {
    entries: BTreeMap<String, ChatPayload>,
}

impl ChatView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a server frame: `chat:list` replaces, `chat:broadcast` upserts
    pub fn apply(&mut self, event: OutboundEvent) -> ViewUpdate {
        match event {
            OutboundEvent::ChatList(entries) => {
                self.entries = entries;
                ViewUpdate::Replaced
            }
            OutboundEvent::ChatBroadcast(payload) => {
                self.entries.insert(payload.chat_id.clone(), payload.clone());
                ViewUpdate::Upserted(payload)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, chat_id: &str) -> bool {
        self.entries.contains_key(chat_id)
    }

    /// Entries ordered by timestamp, then chat identifier
    pub fn sorted(&self) -> Vec<&ChatPayload> {
        let mut entries: Vec<&ChatPayload> = self.entries.values().collect();
        entries.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.chat_id.cmp(&b.chat_id))
        });
        entries
    }
}

/// Sent messages waiting for their broadcast echo
#[derive(Debug, Clone, Default)]
pub struct PendingSends {
    sent_at: HashMap<String, i64>,
}

impl PendingSends {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, chat_id: String, now_millis: i64) {
        self.sent_at.insert(chat_id, now_millis);
    }

    /// Remove `chat_id`; returns `true` if it was pending
    pub fn confirm(&mut self, chat_id: &str) -> bool {
        self.sent_at.remove(chat_id).is_some()
    }

    /// Drop every pending message a snapshot already contains; returns how many
    pub fn confirm_present(&mut self, view: &ChatView) -> usize {
        let before = self.sent_at.len();
        self.sent_at.retain(|chat_id, _| !view.contains(chat_id));
        before - self.sent_at.len()
    }

    /// Whether any message has waited longer than `timeout_millis`
    pub fn has_expired(&self, now_millis: i64, timeout_millis: i64) -> bool {
        self.sent_at
            .values()
            .any(|sent| now_millis - sent > timeout_millis)
    }

    pub fn len(&self) -> usize {
        self.sent_at.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent_at.is_empty()
    }
}
