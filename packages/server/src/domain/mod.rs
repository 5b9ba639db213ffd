//! Domain layer: value objects, entities, errors and the ports the relay depends on.

pub mod connection;
pub mod entity;
pub mod error;
pub mod retry;
pub mod token_store;
pub mod value_object;

pub use connection::{CloseKind, Connection, ConnectionSink, classify_close_code};
pub use entity::{ChatHistory, ChatMessage};
pub use error::{DeliveryError, HubError, TokenError, ValueObjectError};
pub use retry::{DeliveryState, FramePlan, RetryPolicy};
pub use token_store::TokenStore;
pub use value_object::{ChatId, ConnectionId, SharedSecret, Token};
