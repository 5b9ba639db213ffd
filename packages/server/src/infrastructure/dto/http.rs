//! HTTP API response DTOs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::websocket::ChatPayload;

/// Response of `GET /auth`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
}

/// Body of every error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

/// A registered connection, for the debug endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDto {
    pub id: String,
    pub remote: String,
}

/// Response of `GET /debug/hub`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubStateDto {
    pub connections: Vec<ConnectionDto>,
    pub history: BTreeMap<String, ChatPayload>,
}
