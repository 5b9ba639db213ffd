//! UseCase: 切断処理
//!
//! Connection Adapter の読み取りタスクが終了する際の最後の処理として呼ばれ、
//! Hub への登録解除とトークンの失効を行います。

use std::sync::Arc;

use crate::domain::{ConnectionId, Token, TokenError, TokenStore};

use super::hub::HubHandle;

/// 切断のユースケース
pub struct DisconnectConnectionUseCase {
    token_store: Arc<dyn TokenStore>,
    hub: HubHandle,
}

impl DisconnectConnectionUseCase {
    pub fn new(token_store: Arc<dyn TokenStore>, hub: HubHandle) -> Self {
        Self { token_store, hub }
    }

    /// 切断を実行
    ///
    /// Hub 側で既に登録解除されていても、トークンが既に失効していてもエラーにはしない。
    pub async fn execute(&self, id: ConnectionId, token: &Token) {
        if self.hub.deregister(id).is_err() {
            tracing::warn!("Hub stopped; could not deregister connection {}", id);
        }

        match self.token_store.revoke(token).await {
            Ok(()) => tracing::debug!("Revoked token of connection {}", id),
            Err(TokenError::NotFound) => {
                tracing::debug!("Token of connection {} was already revoked", id)
            }
        }
    }
}
