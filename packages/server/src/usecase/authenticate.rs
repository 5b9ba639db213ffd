//! UseCase: 共有シークレットとトークンの交換

use std::sync::Arc;

use crate::domain::{SharedSecret, Token, TokenStore};

use super::error::AuthError;

/// 共有シークレットを検証し、接続用トークンを発行するユースケース
pub struct AuthenticateUseCase {
    token_store: Arc<dyn TokenStore>,
    secret: SharedSecret,
}

impl AuthenticateUseCase {
    pub fn new(token_store: Arc<dyn TokenStore>, secret: SharedSecret) -> Self {
        Self {
            token_store,
            secret,
        }
    }

    /// 認証を実行
    ///
    /// # Arguments
    ///
    /// * `presented` - クライアントが提示したシークレット（ヘッダーが無い場合は `None`）
    ///
    /// # Returns
    ///
    /// * `Ok(Token)` - 発行されたトークン
    /// * `Err(AuthError::InvalidSecret)` - シークレット不一致
    pub async fn execute(&self, presented: Option<&str>) -> Result<Token, AuthError> {
        match presented {
            Some(presented) if self.secret.matches(presented) => {
                Ok(self.token_store.issue().await)
            }
            _ => Err(AuthError::InvalidSecret),
        }
    }
}
