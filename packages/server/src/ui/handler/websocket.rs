//! WebSocket connection handlers.
//!
//! `chat_handler` checks the origin and the token before upgrading. After the
//! upgrade, `handle_socket` registers the connection with the hub and reads
//! frames until the peer goes away, a frame is malformed or the hub closes the
//! connection. Whichever way the read loop ends, the connection is deregistered
//! and its token revoked.

use std::{fmt, net::SocketAddr, sync::Arc};

use axum::{
    extract::{
        ConnectInfo, Query, State,
        rejection::QueryRejection,
        ws::{Message, WebSocket, WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};
use futures_util::{Sink, Stream, StreamExt};
use serde::Deserialize;

use crate::{
    domain::{ChatMessage, CloseKind, Connection, Token, classify_close_code},
    infrastructure::{
        connection::WebSocketConnectionSink,
        dto::websocket::{DecodedFrame, decode_inbound},
    },
    ui::{error::ApiError, state::AppState},
};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ChatQuery {
    pub token: Option<String>,
}

pub async fn chat_handler(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    State(state): State<Arc<AppState>>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    query: Result<Query<ChatQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    if let Some(allowed) = &state.allowed_origin {
        let origin = headers
            .get(header::ORIGIN)
            .and_then(|value| value.to_str().ok());
        if origin != Some(allowed.as_str()) {
            tracing::warn!(
                "Rejected connection from {}: origin {:?} not allowed",
                remote,
                origin
            );
            return Err(ApiError::OriginNotAllowed);
        }
    }

    let token = query
        .ok()
        .and_then(|Query(query)| query.token)
        .map(Token::from);
    if let Err(e) = state
        .connect_connection_usecase
        .authorize(token.as_ref())
        .await
    {
        tracing::warn!("Rejected connection from {}: {}", remote, e);
        return Err(e.into());
    }
    let token = token.ok_or(ApiError::Unauthorized)?;

    let ws = ws.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    tracing::debug!("Upgrading connection from {}", remote);

    Ok(ws
        .on_upgrade(move |socket| handle_socket(socket, state, remote.to_string(), token))
        .into_response())
}

/// Why the read loop stopped
#[derive(Debug)]
enum ReadEnd {
    EndOfStream,
    Closed(Option<u16>),
    Transport(axum::Error),
    Malformed(serde_json::Error),
    HubStopped,
}

impl ReadEnd {
    fn kind(&self) -> CloseKind {
        match self {
            ReadEnd::EndOfStream => CloseKind::Expected,
            ReadEnd::Closed(code) => classify_close_code(*code),
            ReadEnd::Transport(_) | ReadEnd::Malformed(_) | ReadEnd::HubStopped => {
                CloseKind::Unexpected
            }
        }
    }
}

impl fmt::Display for ReadEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadEnd::EndOfStream => write!(f, "end of stream"),
            ReadEnd::Closed(Some(code)) => write!(f, "close frame with code {}", code),
            ReadEnd::Closed(None) => write!(f, "close frame without code"),
            ReadEnd::Transport(e) => write!(f, "transport error: {}", e),
            ReadEnd::Malformed(e) => write!(f, "malformed frame: {}", e),
            ReadEnd::HubStopped => write!(f, "hub stopped"),
        }
    }
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, remote: String, token: Token) {
    let (sender, receiver) = socket.split();
    serve_connection(
        receiver,
        WebSocketConnectionSink::new(sender),
        &state,
        remote,
        token,
    )
    .await;
}

/// Register the connection, read until it ends and tear it down.
async fn serve_connection<R, S>(
    mut receiver: R,
    sink: WebSocketConnectionSink<S>,
    state: &AppState,
    remote: String,
    token: Token,
) where
    R: Stream<Item = Result<Message, axum::Error>> + Unpin,
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: fmt::Display + Send,
{
    let closed = sink.closed_signal();
    let connection = Connection::new(remote.clone(), token.clone(), Arc::new(sink));
    let id = connection.id;

    match state.connect_connection_usecase.execute(connection) {
        Ok(_) => {
            tracing::info!("Connection {} from {} established", id, remote);

            tokio::select! {
                end = read_loop(&mut receiver, state) => match end.kind() {
                    CloseKind::Expected => {
                        tracing::info!("Connection {} from {} closed: {}", id, remote, end)
                    }
                    CloseKind::Unexpected => {
                        tracing::error!("Connection {} from {} failed: {}", id, remote, end)
                    }
                },
                _ = closed.notified() => {
                    tracing::info!("Connection {} from {} closed by server", id, remote)
                }
            }
        }
        Err(e) => tracing::error!("Failed to register connection from {}: {}", remote, e),
    }

    state
        .disconnect_connection_usecase
        .execute(id, &token)
        .await;
}

async fn read_loop<R>(receiver: &mut R, state: &AppState) -> ReadEnd
where
    R: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    while let Some(message) = receiver.next().await {
        let message = match message {
            Ok(message) => message,
            Err(e) => return ReadEnd::Transport(e),
        };

        let bytes: &[u8] = match &message {
            Message::Text(text) => text.as_str().as_bytes(),
            Message::Binary(bytes) => &bytes[..],
            Message::Close(frame) => return ReadEnd::Closed(frame.as_ref().map(|f| f.code)),
            Message::Ping(_) | Message::Pong(_) => continue,
        };

        match decode_inbound(bytes) {
            Ok(DecodedFrame::Chat(payload)) => {
                let message = ChatMessage::from(payload);
                tracing::debug!(
                    "Received chat {} from '{}'",
                    message.chat_id,
                    message.username
                );
                if state.send_chat_usecase.execute(message).is_err() {
                    return ReadEnd::HubStopped;
                }
            }
            Ok(DecodedFrame::Ignored(message_type)) => {
                tracing::debug!("Ignoring frame with messageType '{}'", message_type)
            }
            Err(e) => return ReadEnd::Malformed(e),
        }
    }
    ReadEnd::EndOfStream
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures_util::{sink::drain, stream};

    use super::*;
    use crate::{
        domain::{ConnectionId, RetryPolicy, SharedSecret, TokenStore},
        infrastructure::token_store::InMemoryTokenStore,
        usecase::{
            AuthenticateUseCase, ConnectConnectionUseCase, ConnectionHub,
            DisconnectConnectionUseCase, HubHandle, SendChatUseCase,
        },
    };

    fn create_state(store: Arc<InMemoryTokenStore>, hub: HubHandle) -> Arc<AppState> {
        let secret = SharedSecret::new("secret".to_string()).unwrap();
        Arc::new(AppState {
            authenticate_usecase: Arc::new(AuthenticateUseCase::new(store.clone(), secret)),
            connect_connection_usecase: Arc::new(ConnectConnectionUseCase::new(
                store.clone(),
                hub.clone(),
            )),
            disconnect_connection_usecase: Arc::new(DisconnectConnectionUseCase::new(
                store,
                hub.clone(),
            )),
            send_chat_usecase: Arc::new(SendChatUseCase::new(hub.clone())),
            hub,
            allowed_origin: None,
        })
    }

    async fn wait_for_connection(hub: &HubHandle) -> ConnectionId {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if let Some(c) = hub.status().await.unwrap().connections.first() {
                    return c.id;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("connection was not registered in time")
    }

    #[tokio::test]
    async fn test_server_close_ends_connection_and_revokes_token() {
        // テスト項目: Hub 側から切断された接続は読み取りを終了し、登録解除されトークンが失効する
        // given (前提条件):
        let store = Arc::new(InMemoryTokenStore::new());
        let hub = ConnectionHub::spawn(RetryPolicy::with_backoff_unit(Duration::from_millis(1)));
        let state = create_state(store.clone(), hub.clone());
        let token = store.issue().await;
        let connection = tokio::spawn({
            let token = token.clone();
            async move {
                // the peer never sends anything, so only the server can end this connection
                let receiver = stream::pending::<Result<Message, axum::Error>>();
                let sink = WebSocketConnectionSink::new(drain::<Message>());
                serve_connection(receiver, sink, &state, "127.0.0.1:50000".to_string(), token)
                    .await
            }
        });
        let id = wait_for_connection(&hub).await;

        // when (操作):
        hub.deregister(id).unwrap();
        let finished = tokio::time::timeout(Duration::from_secs(2), connection).await;

        // then (期待する結果):
        assert!(finished.is_ok());
        assert!(!store.is_valid(&token).await);
        assert!(hub.status().await.unwrap().connections.is_empty());
    }

    #[tokio::test]
    async fn test_peer_end_of_stream_revokes_token() {
        // テスト項目: クライアント側のストリーム終了でも登録解除とトークン失効が行われる
        // given (前提条件):
        let store = Arc::new(InMemoryTokenStore::new());
        let hub = ConnectionHub::spawn(RetryPolicy::with_backoff_unit(Duration::from_millis(1)));
        let state = create_state(store.clone(), hub.clone());
        let token = store.issue().await;

        // when (操作):
        serve_connection(
            stream::empty::<Result<Message, axum::Error>>(),
            WebSocketConnectionSink::new(drain::<Message>()),
            &state,
            "127.0.0.1:50000".to_string(),
            token.clone(),
        )
        .await;

        // then (期待する結果):
        assert!(!store.is_valid(&token).await);
        assert!(hub.status().await.unwrap().connections.is_empty());
    }

    #[test]
    fn test_read_end_classification() {
        // テスト項目: 読み取りループの終了理由が想定内・想定外に分類される
        // given (前提条件):
        let malformed = serde_json::from_str::<serde_json::Value>("{").unwrap_err();

        // when (操作):

        // then (期待する結果):
        assert_eq!(ReadEnd::EndOfStream.kind(), CloseKind::Expected);
        assert_eq!(ReadEnd::Closed(None).kind(), CloseKind::Expected);
        assert_eq!(ReadEnd::Closed(Some(1000)).kind(), CloseKind::Expected);
        assert_eq!(ReadEnd::Closed(Some(1001)).kind(), CloseKind::Expected);
        assert_eq!(ReadEnd::Closed(Some(1006)).kind(), CloseKind::Expected);
        assert_eq!(ReadEnd::Closed(Some(1011)).kind(), CloseKind::Unexpected);
        assert_eq!(ReadEnd::Malformed(malformed).kind(), CloseKind::Unexpected);
        assert_eq!(ReadEnd::HubStopped.kind(), CloseKind::Unexpected);
    }

    #[test]
    fn test_read_end_display() {
        // テスト項目: 終了理由がログ向けの文字列になる
        // given (前提条件):

        // when (操作):

        // then (期待する結果):
        assert_eq!(
            ReadEnd::Closed(Some(4000)).to_string(),
            "close frame with code 4000"
        );
        assert_eq!(ReadEnd::EndOfStream.to_string(), "end of stream");
    }
}
