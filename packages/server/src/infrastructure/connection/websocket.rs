//! WebSocket を使った ConnectionSink 実装
//!
//! ## 責務
//!
//! - WebSocket の書き込み側（`SplitSink`）を保持し、フレームを直接書き込む
//! - 書き込み失敗をそのまま `DeliveryError` として Hub に返す（リトライ判定は Hub 側）
//! - close 時に読み取り側（Connection Adapter）へ終了を通知する
//!
//! ## 設計ノート
//!
//! 送信用チャンネルを挟まずにソケットへ直接書き込みます。
//! チャンネル経由では書き込みの失敗が Hub から観測できず、再送と再同期が機能しないためです。

use std::{fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures_util::{Sink, SinkExt, stream::SplitSink};
use tokio::sync::{Mutex, Notify};

use crate::domain::{ConnectionSink, DeliveryError};

/// Upper bound for writing one frame; a stalled peer counts as a failed attempt
pub const SEND_TIMEOUT: Duration = Duration::from_secs(10);
/// Upper bound for the close handshake initiated by the server
pub const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// WebSocket を使った ConnectionSink 実装
///
/// 通常は axum の `SplitSink` を保持します。テストでは任意の `Sink<Message>` を渡せます。
pub struct WebSocketConnectionSink<S = SplitSink<WebSocket, Message>> {
    sink: Mutex<S>,
    /// Signalled when the server closes this connection
    closed: Arc<Notify>,
}

impl<S> WebSocketConnectionSink<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink: Mutex::new(sink),
            closed: Arc::new(Notify::new()),
        }
    }

    /// Notification the read side waits on to stop when the server closes the connection
    pub fn closed_signal(&self) -> Arc<Notify> {
        self.closed.clone()
    }
}

#[async_trait]
impl<S> ConnectionSink for WebSocketConnectionSink<S>
where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: fmt::Display + Send,
{
    async fn send_frame(&self, frame: String) -> Result<(), DeliveryError> {
        let send = async {
            let mut sink = self.sink.lock().await;
            sink.send(Message::Text(frame.into())).await
        };
        match tokio::time::timeout(SEND_TIMEOUT, send).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(DeliveryError::WriteFailed(e.to_string())),
            Err(_) => Err(DeliveryError::Timeout),
        }
    }

    async fn close(&self) {
        // stores a permit, so the reader stops even if it is not waiting right now
        self.closed.notify_one();

        let close = async {
            let mut sink = self.sink.lock().await;
            sink.close().await
        };
        match tokio::time::timeout(CLOSE_TIMEOUT, close).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!("Close handshake failed: {}", e),
            Err(_) => tracing::debug!("Close handshake timed out"),
        }
    }
}
