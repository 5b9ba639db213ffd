//! Request handlers.

mod http;
mod websocket;

pub use http::{PASSWORD_HEADER, auth_handler, debug_hub_state, health_check, not_found};
pub use websocket::chat_handler;
