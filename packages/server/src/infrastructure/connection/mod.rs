//! ConnectionSink implementations.

pub mod websocket;

pub use websocket::WebSocketConnectionSink;
