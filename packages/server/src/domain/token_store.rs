//! TokenStore trait 定義
//!
//! トークンの発行・検証・失効のインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{Token, TokenError};

/// Store of currently valid connection tokens.
///
/// Implementations must allow concurrent `is_valid` calls while serializing
/// `issue` and `revoke` against each other and against readers.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Generate a new token and record it as valid
    async fn issue(&self) -> Token;

    /// Whether the token is currently valid
    async fn is_valid(&self, token: &Token) -> bool;

    /// Revoke a token. Returns `TokenError::NotFound` if it was not valid.
    async fn revoke(&self, token: &Token) -> Result<(), TokenError>;
}
