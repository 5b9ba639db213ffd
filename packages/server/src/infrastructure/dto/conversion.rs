//! Conversion logic between DTOs and domain entities.

use std::collections::BTreeMap;

use crate::domain::{ChatHistory, ChatId, ChatMessage};
use crate::infrastructure::dto::websocket as dto;

// ========================================
// DTO → Domain Entity
// ========================================

impl From<dto::ChatPayload> for ChatMessage {
    fn from(dto: dto::ChatPayload) -> Self {
        Self {
            data: dto.data,
            username: dto.username,
            timestamp: dto.timestamp,
            chat_id: ChatId::new(dto.chat_id),
        }
    }
}

// ========================================
// Domain Entity → DTO
// ========================================

impl From<&ChatMessage> for dto::ChatPayload {
    fn from(model: &ChatMessage) -> Self {
        Self {
            data: model.data.clone(),
            username: model.username.clone(),
            timestamp: model.timestamp.clone(),
            chat_id: model.chat_id.as_str().to_string(),
        }
    }
}

impl From<&ChatHistory> for BTreeMap<String, dto::ChatPayload> {
    fn from(history: &ChatHistory) -> Self {
        history
            .iter()
            .map(|(chat_id, message)| (chat_id.as_str().to_string(), message.into()))
            .collect()
    }
}

impl dto::OutboundEvent {
    /// Incremental event for a single message
    pub fn broadcast(message: &ChatMessage) -> Self {
        Self::ChatBroadcast(message.into())
    }

    /// Full snapshot of the history
    pub fn snapshot(history: &ChatHistory) -> Self {
        Self::ChatList(history.into())
    }
}
