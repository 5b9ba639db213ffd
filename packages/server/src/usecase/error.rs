//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::HubError;

/// 認証（トークン発行）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// 共有シークレットが一致しない、または指定されていない
    #[error("invalid password")]
    InvalidSecret,
}

/// 接続のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// トークンが無効（未発行・失効済み・未指定）
    #[error("unauthorized")]
    InvalidToken,

    #[error(transparent)]
    Hub(#[from] HubError),
}

/// チャット送信のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendChatError {
    #[error(transparent)]
    Hub(#[from] HubError),
}
