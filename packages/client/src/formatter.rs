//! Message formatting utilities for client display.

use beehive_server::infrastructure::dto::websocket::ChatPayload;

use crate::domain::ChatView;

const RULE: &str = "------------------------------------------------------------";
const DOUBLE_RULE: &str = "============================================================";

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format the whole chat view after a `chat:list` snapshot
    ///
    /// # Arguments
    ///
    /// * `view` - The local chat view
    /// * `current_username` - The current user's name (to mark as "me")
    pub fn format_chat_list(view: &ChatView, current_username: &str) -> String {
        let mut output = String::new();
        output.push_str(&format!("\n\n{}\n", DOUBLE_RULE));
        output.push_str("Messages:\n");

        if view.is_empty() {
            output.push_str("(No messages)\n");
        } else {
            for message in view.sorted() {
                output.push_str(&format!(
                    "{}: {} ({})\n",
                    Self::display_name(&message.username, current_username),
                    message.data,
                    message.timestamp
                ));
            }
        }

        output.push_str(&format!("{}\n", DOUBLE_RULE));
        output
    }

    /// Format one broadcast chat message
    pub fn format_chat_message(message: &ChatPayload, current_username: &str) -> String {
        format!(
            "\n\n{}\n@{}: {}\nsent at {}\n{}\n",
            RULE,
            Self::display_name(&message.username, current_username),
            message.data,
            message.timestamp,
            RULE
        )
    }

    /// Format a confirmation after the server echoed our message back
    pub fn format_delivered_confirmation(timestamp: &str) -> String {
        format!("delivered (sent at {})\n", timestamp)
    }

    /// Format a frame the client could not decode
    pub fn format_raw_message(text: &str) -> String {
        format!("\n← Received: {}\n", text)
    }

    fn display_name(username: &str, current_username: &str) -> String {
        if username == current_username {
            format!("{} (me)", username)
        } else {
            username.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use beehive_server::infrastructure::dto::websocket::OutboundEvent;

    use super::*;

    fn payload(chat_id: &str, username: &str, data: &str) -> ChatPayload {
        ChatPayload {
            data: data.to_string(),
            username: username.to_string(),
            timestamp: "2023-01-01T00:00:00.000Z".to_string(),
            chat_id: chat_id.to_string(),
        }
    }

    #[test]
    fn test_format_chat_list_empty() {
        // テスト項目: 履歴が空の場合、適切なメッセージが表示される
        // given (前提条件):
        let view = ChatView::new();

        // when (操作):
        let result = MessageFormatter::format_chat_list(&view, "alice");

        // then (期待する結果):
        assert!(result.contains("Messages:"));
        assert!(result.contains("(No messages)"));
        assert!(result.contains(DOUBLE_RULE));
    }

    #[test]
    fn test_format_chat_list_marks_own_messages() {
        // テスト項目: 自分のメッセージには (me) が付き、他人のメッセージには付かない
        // given (前提条件):
        let mut view = ChatView::new();
        view.apply(OutboundEvent::ChatList(BTreeMap::from([
            ("c1".to_string(), payload("c1", "alice", "hi")),
            ("c2".to_string(), payload("c2", "bob", "hello")),
        ])));

        // when (操作):
        let result = MessageFormatter::format_chat_list(&view, "alice");

        // then (期待する結果):
        assert!(result.contains("alice (me): hi"));
        assert!(result.contains("bob: hello"));
        assert!(!result.contains("bob (me)"));
    }

    #[test]
    fn test_format_chat_message() {
        // テスト項目: チャットメッセージが正しくフォーマットされる
        // given (前提条件):
        let message = payload("c1", "bob", "Hello, world!");

        // when (操作):
        let result = MessageFormatter::format_chat_message(&message, "alice");

        // then (期待する結果):
        assert!(result.contains("@bob: Hello, world!"));
        assert!(result.contains("sent at 2023-01-01T00:00:00.000Z"));
        assert!(result.contains(RULE));
    }

    #[test]
    fn test_format_delivered_confirmation() {
        // テスト項目: 配信確認メッセージに送信時刻が含まれる
        // given (前提条件):
        let timestamp = "2023-01-01T00:00:00.000Z";

        // when (操作):
        let result = MessageFormatter::format_delivered_confirmation(timestamp);

        // then (期待する結果):
        assert!(result.contains("delivered"));
        assert!(result.contains("2023-01-01"));
    }

    #[test]
    fn test_format_raw_message() {
        // テスト項目: 解釈できないフレームはそのまま表示される
        // given (前提条件):
        let text = "unknown message format";

        // when (操作):
        let result = MessageFormatter::format_raw_message(text);

        // then (期待する結果):
        assert!(result.contains("unknown message format"));
        assert!(result.contains("Received:"));
    }
}
