//! Connections as seen by the hub, and how their closure is classified.

use std::{fmt, sync::Arc};

use async_trait::async_trait;

use super::{ConnectionId, DeliveryError, Token};

/// Write half of a client connection.
///
/// The hub only ever writes whole frames and closes; it does not know about
/// the underlying transport.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConnectionSink: Send + Sync {
    /// Write one text frame to the peer
    async fn send_frame(&self, frame: String) -> Result<(), DeliveryError>;

    /// Close the connection. Closing twice is harmless.
    async fn close(&self);
}

/// A registered connection: its identity, the token it was admitted with and its sink.
#[derive(Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub remote: String,
    pub token: Token,
    pub sink: Arc<dyn ConnectionSink>,
}

impl Connection {
    pub fn new(remote: impl Into<String>, token: Token, sink: Arc<dyn ConnectionSink>) -> Self {
        Self {
            id: ConnectionId::generate(),
            remote: remote.into(),
            token,
            sink,
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("remote", &self.remote)
            .finish_non_exhaustive()
    }
}

/// Close codes treated as the peer leaving on purpose.
pub const CLOSE_NORMAL: u16 = 1000;
pub const CLOSE_GOING_AWAY: u16 = 1001;
pub const CLOSE_ABNORMAL: u16 = 1006;

/// How a connection's read side ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseKind {
    /// The peer closed normally or went away
    Expected,
    /// Protocol violation or transport failure
    Unexpected,
}

/// Classify a received close frame. A close frame without a code is a normal close.
pub fn classify_close_code(code: Option<u16>) -> CloseKind {
    match code {
        None | Some(CLOSE_NORMAL) | Some(CLOSE_GOING_AWAY) | Some(CLOSE_ABNORMAL) => {
            CloseKind::Expected
        }
        Some(_) => CloseKind::Unexpected,
    }
}
