//! UseCase 層
//!
//! - `hub`: 接続と履歴を所有する Connection Hub（単一タスクのイベントループ）
//! - `authenticate`: 共有シークレットとトークンの交換
//! - `connect_connection`: トークン検証と Hub への登録
//! - `send_chat`: チャットメッセージの Hub への投入
//! - `disconnect_connection`: 登録解除とトークン失効

pub mod authenticate;
pub mod connect_connection;
pub mod disconnect_connection;
pub mod error;
pub mod hub;
pub mod send_chat;

pub use authenticate::AuthenticateUseCase;
pub use connect_connection::ConnectConnectionUseCase;
pub use disconnect_connection::DisconnectConnectionUseCase;
pub use error::{AuthError, ConnectError, SendChatError};
pub use hub::{ConnectionHub, HubHandle, HubStatus};
pub use send_chat::SendChatUseCase;
