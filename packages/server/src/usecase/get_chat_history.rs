//! UseCase: 履歴の取得

use std::sync::Arc;

use crate::domain::{
    ChatMessage, ChatRepository, ConnectionId, MessagePusher, Notification, RoomName,
};

use super::sequencer::DeliverySequencer;

/// 履歴取得のユースケース
///
/// ルームは全接続から見えるため、参加していないルームの履歴も取得できます。
pub struct GetChatHistoryUseCase {
    repository: Arc<dyn ChatRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    sequencer: Arc<DeliverySequencer>,
}

impl GetChatHistoryUseCase {
    pub fn new(
        repository: Arc<dyn ChatRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        sequencer: Arc<DeliverySequencer>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            sequencer,
        }
    }

    /// 履歴（古い順）を要求した接続にだけ送る
    pub async fn execute(&self, connection_id: ConnectionId, room: RoomName) -> Vec<ChatMessage> {
        // 履歴のスナップショットと送信の間に新しいメッセージが割り込まないようにする
        let _guard = self.sequencer.acquire().await;

        let history = self.repository.get_history(&room).await;
        let notification = Notification::ChatHistory {
            room,
            history: history.clone(),
        };
        if let Err(e) = self
            .message_pusher
            .push_to(&connection_id, &notification)
            .await
        {
            tracing::warn!("Failed to send chat history to '{}': {}", connection_id, e);
        }

        history
    }
}
