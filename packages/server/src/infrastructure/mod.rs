//! Infrastructure layer: concrete token store, WebSocket sink and wire DTOs.

pub mod connection;
pub mod dto;
pub mod token_store;
