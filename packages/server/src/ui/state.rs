//! Shared application state.

use std::sync::Arc;

use crate::usecase::{
    AuthenticateUseCase, ConnectConnectionUseCase, DisconnectConnectionUseCase, HubHandle,
    SendChatUseCase,
};

/// Shared application state
pub struct AppState {
    /// AuthenticateUseCase（トークン発行のユースケース）
    pub authenticate_usecase: Arc<AuthenticateUseCase>,
    /// ConnectConnectionUseCase（接続のユースケース）
    pub connect_connection_usecase: Arc<ConnectConnectionUseCase>,
    /// DisconnectConnectionUseCase（切断のユースケース）
    pub disconnect_connection_usecase: Arc<DisconnectConnectionUseCase>,
    /// SendChatUseCase（チャット送信のユースケース）
    pub send_chat_usecase: Arc<SendChatUseCase>,
    /// Hub への問い合わせ用（デバッグエンドポイント）
    pub hub: HubHandle,
    /// 設定されている場合、WebSocket の Origin ヘッダーがこれと一致する必要がある
    pub allowed_origin: Option<String>,
}
