//! UseCase: チャットメッセージ送信

use crate::domain::ChatMessage;

use super::{error::SendChatError, hub::HubHandle};

/// チャットメッセージを Hub に投入するユースケース
///
/// 履歴への保存とブロードキャストは Hub のイベントループで直列に処理されます。
pub struct SendChatUseCase {
    hub: HubHandle,
}

impl SendChatUseCase {
    pub fn new(hub: HubHandle) -> Self {
        Self { hub }
    }

    pub fn execute(&self, message: ChatMessage) -> Result<(), SendChatError> {
        self.hub.submit(message)?;
        Ok(())
    }
}
