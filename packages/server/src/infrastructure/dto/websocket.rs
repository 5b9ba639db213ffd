//! WebSocket frame DTOs.
//!
//! Every frame is a JSON object `{"messageType": ..., "data": ...}`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const CHAT_SEND: &str = "chat:send";
pub const CHAT_BROADCAST: &str = "chat:broadcast";
pub const CHAT_LIST: &str = "chat:list";

/// Chat message as it appears on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatPayload {
    pub data: String,
    pub username: String,
    pub timestamp: String,
    pub chat_id: String,
}

/// Frames sent by clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "messageType", content = "data")]
pub enum InboundEvent {
    #[serde(rename = "chat:send")]
    ChatSend(ChatPayload),
}

/// Frames sent by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "messageType", content = "data")]
pub enum OutboundEvent {
    #[serde(rename = "chat:broadcast")]
    ChatBroadcast(ChatPayload),
    #[serde(rename = "chat:list")]
    ChatList(BTreeMap<String, ChatPayload>),
}

impl OutboundEvent {
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Envelope used to read the message type before committing to a payload shape
#[derive(Debug, Deserialize)]
struct InboundEnvelope {
    #[serde(rename = "messageType")]
    message_type: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// Result of decoding an inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedFrame {
    Chat(ChatPayload),
    /// A well-formed frame of a type the server does not handle
    Ignored(String),
}

/// Decode a client frame.
///
/// Frames that are not a JSON envelope, and `chat:send` frames whose payload is
/// malformed, are errors. Unknown message types are not.
pub fn decode_inbound(bytes: &[u8]) -> Result<DecodedFrame, serde_json::Error> {
    let envelope: InboundEnvelope = serde_json::from_slice(bytes)?;
    if envelope.message_type == CHAT_SEND {
        let payload = serde_json::from_value(envelope.data)?;
        Ok(DecodedFrame::Chat(payload))
    } else {
        Ok(DecodedFrame::Ignored(envelope.message_type))
    }
}
