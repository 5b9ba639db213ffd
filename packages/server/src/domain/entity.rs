//! Entities: chat messages and the history they are stored in.

use std::collections::HashMap;

use super::value_object::ChatId;

/// A chat message as submitted by a client.
///
/// The timestamp is whatever the client sent and is never interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub data: String,
    pub username: String,
    pub timestamp: String,
    pub chat_id: ChatId,
}

impl ChatMessage {
    pub fn new(
        data: impl Into<String>,
        username: impl Into<String>,
        timestamp: impl Into<String>,
        chat_id: ChatId,
    ) -> Self {
        Self {
            data: data.into(),
            username: username.into(),
            timestamp: timestamp.into(),
            chat_id,
        }
    }
}

/// Latest message per chat id. Entries are overwritten, never removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatHistory {
    entries: HashMap<ChatId, ChatMessage>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `message` under its chat id, returning the entry it replaced.
    pub fn upsert(&mut self, message: ChatMessage) -> Option<ChatMessage> {
        self.entries.insert(message.chat_id.clone(), message)
    }

    pub fn get(&self, chat_id: &ChatId) -> Option<&ChatMessage> {
        self.entries.get(chat_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ChatId, &ChatMessage)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(chat_id: &str, data: &str) -> ChatMessage {
        ChatMessage::new(data, "alice", "t1", ChatId::new(chat_id))
    }

    #[test]
    fn test_new_history_is_empty() {
        // テスト項目: 作成直後の履歴は空
        // given (前提条件):

        // when (操作):
        let history = ChatHistory::new();

        // then (期待する結果):
        assert!(history.is_empty());
        assert_eq!(history.len(), 0);
    }

    #[test]
    fn test_upsert_overwrites_same_chat_id() {
        // テスト項目: 同じ chat id のメッセージは後勝ちで上書きされる
        // given (前提条件):
        let mut history = ChatHistory::new();
        history.upsert(message("c1", "hi"));

        // when (操作):
        let replaced = history.upsert(message("c1", "hello"));

        // then (期待する結果):
        assert_eq!(replaced, Some(message("c1", "hi")));
        assert_eq!(history.len(), 1);
        assert_eq!(
            history.get(&ChatId::new("c1")).map(|m| m.data.as_str()),
            Some("hello")
        );
    }

    #[test]
    fn test_one_entry_per_distinct_chat_id() {
        // テスト項目: 任意の送信列に対して chat id ごとに最後のメッセージだけが残る
        // given (前提条件):
        let submissions = [
            ("c1", "a"),
            ("c2", "b"),
            ("c1", "c"),
            ("c3", "d"),
            ("c2", "e"),
            ("c1", "f"),
        ];
        let mut history = ChatHistory::new();

        // when (操作):
        for (chat_id, data) in submissions {
            history.upsert(message(chat_id, data));
        }

        // then (期待する結果):
        assert_eq!(history.len(), 3);
        assert_eq!(history.get(&ChatId::new("c1")), Some(&message("c1", "f")));
        assert_eq!(history.get(&ChatId::new("c2")), Some(&message("c2", "e")));
        assert_eq!(history.get(&ChatId::new("c3")), Some(&message("c3", "d")));
    }
}
