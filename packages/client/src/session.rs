//! WebSocket client session management.

use std::time::Duration;

use beehive_server::infrastructure::dto::websocket::{InboundEvent, OutboundEvent};
use beehive_shared::time::Clock;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{self, http::StatusCode, protocol::Message},
};

use crate::{
    auth::{chat_url, fetch_token},
    domain::{ChatView, PendingSends, ViewUpdate, compose_chat},
    error::ClientError,
};

use super::{formatter::MessageFormatter, ui::redisplay_prompt};

/// A sent message not echoed back within this time ends the session
pub const PENDING_TIMEOUT: Duration = Duration::from_secs(5);
const PENDING_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Run one client session: authenticate, connect and relay until the
/// connection is lost or input ends.
///
/// Returns `Ok(())` when the user ends input (Ctrl+C / Ctrl+D).
pub async fn run_client_session(
    base_url: &str,
    username: &str,
    password: &str,
    input: &mut mpsc::UnboundedReceiver<String>,
    clock: &dyn Clock,
) -> Result<(), ClientError> {
    // a token is good for one connection, so every session asks for a new one
    let token = fetch_token(base_url, password).await?;
    let url = chat_url(base_url, &token)?;

    let (ws_stream, _response) = connect_async(&url).await.map_err(|e| match e {
        tungstenite::Error::Http(response) if response.status() == StatusCode::UNAUTHORIZED => {
            ClientError::Unauthorized("token rejected".to_string())
        }
        e => ClientError::ConnectionError(e.to_string()),
    })?;

    tracing::info!("Connected to chat server!");
    println!(
        "\nYou are '{}'. Type messages and press Enter to send. Press Ctrl+C to exit.\n",
        username
    );

    let (mut write, mut read) = ws_stream.split();
    let mut view = ChatView::new();
    let mut pending = PendingSends::new();
    let mut pending_check = tokio::time::interval(PENDING_CHECK_INTERVAL);

    loop {
        tokio::select! {
            incoming = read.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    handle_frame(text.as_str(), &mut view, &mut pending, username)
                }
                Some(Ok(Message::Binary(data))) => match std::str::from_utf8(&data) {
                    Ok(text) => handle_frame(text, &mut view, &mut pending, username),
                    Err(_) => tracing::warn!("Ignoring non UTF-8 binary frame"),
                },
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!("Server closed the connection");
                    return Err(ClientError::ConnectionError(
                        "Connection lost".to_string(),
                    ));
                }
                Some(Err(e)) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    return Err(ClientError::ConnectionError(e.to_string()));
                }
                Some(Ok(_)) => {}
            },
            line = input.recv() => match line {
                Some(line) => {
                    let event = compose_chat(&line, username, clock);
                    let InboundEvent::ChatSend(payload) = &event;
                    let chat_id = payload.chat_id.clone();

                    let json = match serde_json::to_string(&event) {
                        Ok(json) => json,
                        Err(e) => {
                            tracing::error!("Failed to serialize message: {}", e);
                            continue;
                        }
                    };
                    if let Err(e) = write.send(Message::Text(json.into())).await {
                        tracing::warn!("Failed to send message: {}", e);
                        return Err(ClientError::ConnectionError(e.to_string()));
                    }
                    pending.insert(chat_id, clock.now_millis());
                }
                None => {
                    // input ended (Ctrl+C / Ctrl+D)
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(());
                }
            },
            _ = pending_check.tick() => {
                if pending.has_expired(clock.now_millis(), PENDING_TIMEOUT.as_millis() as i64) {
                    tracing::warn!(
                        "{} message(s) not echoed within {:?}; dropping connection",
                        pending.len(),
                        PENDING_TIMEOUT
                    );
                    return Err(ClientError::ConnectionError(
                        "message delivery timed out".to_string(),
                    ));
                }
            }
        }
    }
}

fn handle_frame(text: &str, view: &mut ChatView, pending: &mut PendingSends, username: &str) {
    match serde_json::from_str::<OutboundEvent>(text) {
        Ok(event) => match view.apply(event) {
            ViewUpdate::Replaced => {
                pending.confirm_present(view);
                print!("{}", MessageFormatter::format_chat_list(view, username));
            }
            ViewUpdate::Upserted(payload) => {
                if pending.confirm(&payload.chat_id) {
                    print!(
                        "\n{}",
                        MessageFormatter::format_delivered_confirmation(&payload.timestamp)
                    );
                } else {
                    print!(
                        "{}",
                        MessageFormatter::format_chat_message(&payload, username)
                    );
                }
            }
        },
        Err(e) => {
            tracing::debug!("Unrecognized frame: {}", e);
            print!("{}", MessageFormatter::format_raw_message(text));
        }
    }
    redisplay_prompt(username);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_frame_applies_snapshot_and_confirms_pending() {
        // テスト項目: chat:list で表示が置き換わり、含まれる送信待ちが解消される
        // given (前提条件):
        let mut view = ChatView::new();
        let mut pending = PendingSends::new();
        pending.insert("c1".to_string(), 0);
        let frame = r#"{"messageType":"chat:list","data":{"c1":{"data":"hi","username":"alice","timestamp":"t1","chatId":"c1"}}}"#;

        // when (操作):
        handle_frame(frame, &mut view, &mut pending, "alice");

        // then (期待する結果):
        assert!(view.contains("c1"));
        assert!(pending.is_empty());
    }

    #[test]
    fn test_handle_frame_broadcast_confirms_own_message() {
        // テスト項目: 自分の送信のエコーで送信待ちが解消され、表示に追加される
        // given (前提条件):
        let mut view = ChatView::new();
        let mut pending = PendingSends::new();
        pending.insert("c2".to_string(), 0);
        let frame = r#"{"messageType":"chat:broadcast","data":{"data":"yo","username":"alice","timestamp":"t2","chatId":"c2"}}"#;

        // when (操作):
        handle_frame(frame, &mut view, &mut pending, "alice");

        // then (期待する結果):
        assert!(view.contains("c2"));
        assert!(pending.is_empty());
    }

    #[test]
    fn test_handle_frame_ignores_unknown_frames() {
        // テスト項目: 解釈できないフレームは表示を変更しない
        // given (前提条件):
        let mut view = ChatView::new();
        let mut pending = PendingSends::new();

        // when (操作):
        handle_frame(
            r#"{"messageType":"chat:typing","data":{}}"#,
            &mut view,
            &mut pending,
            "alice",
        );

        // then (期待する結果):
        assert!(view.is_empty());
    }
}
