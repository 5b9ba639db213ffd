//! UseCase: 接続処理
//!
//! アップグレード前のトークン検証と、アップグレード後の Hub への登録を行います。

use std::sync::Arc;

use crate::domain::{Connection, ConnectionId, Token, TokenStore};

use super::{error::ConnectError, hub::HubHandle};

/// 接続のユースケース
pub struct ConnectConnectionUseCase {
    token_store: Arc<dyn TokenStore>,
    hub: HubHandle,
}

impl ConnectConnectionUseCase {
    pub fn new(token_store: Arc<dyn TokenStore>, hub: HubHandle) -> Self {
        Self { token_store, hub }
    }

    /// アップグレード前にトークンを検証する
    pub async fn authorize(&self, token: Option<&Token>) -> Result<(), ConnectError> {
        match token {
            Some(token) if self.token_store.is_valid(token).await => Ok(()),
            _ => Err(ConnectError::InvalidToken),
        }
    }

    /// 接続を Hub に登録する。スナップショットの送信は Hub が行う。
    pub fn execute(&self, connection: Connection) -> Result<ConnectionId, ConnectError> {
        let id = connection.id;
        self.hub.register(connection)?;
        Ok(id)
    }
}
