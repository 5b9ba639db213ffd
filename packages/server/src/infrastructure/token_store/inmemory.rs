//! InMemory TokenStore 実装
//!
//! ドメイン層が定義する TokenStore trait の具体的な実装。
//! `RwLock<HashSet<Token>>` をインメモリストアとして使用します。
//! 検証（読み取り）は並行に実行でき、発行・失効（書き込み）は排他的に実行されます。

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{Token, TokenError, TokenStore};

/// インメモリ TokenStore 実装
#[derive(Default)]
pub struct InMemoryTokenStore {
    /// 有効なトークンの集合
    tokens: RwLock<HashSet<Token>>,
}

impl InMemoryTokenStore {
    /// 新しい InMemoryTokenStore を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 現在有効なトークン数
    pub async fn count_valid_tokens(&self) -> usize {
        self.tokens.read().await.len()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn issue(&self) -> Token {
        let mut tokens = self.tokens.write().await;
        let mut token = Token::generate();
        // a collision of 128 random bits is not expected, but never hand out a live token twice
        while !tokens.insert(token.clone()) {
            token = Token::generate();
        }
        tracing::debug!("Issued token (valid tokens: {})", tokens.len());
        token
    }

    async fn is_valid(&self, token: &Token) -> bool {
        self.tokens.read().await.contains(token)
    }

    async fn revoke(&self, token: &Token) -> Result<(), TokenError> {
        let mut tokens = self.tokens.write().await;
        if !tokens.remove(token) {
            return Err(TokenError::NotFound);
        }
        tracing::debug!("Revoked token (valid tokens: {})", tokens.len());
        Ok(())
    }
}
