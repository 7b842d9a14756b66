//! UseCase: メンバー一覧の取得

use std::sync::Arc;

use crate::domain::{ChatRepository, ConnectionId, Member, MessagePusher, Notification, RoomName};

use super::sequencer::DeliverySequencer;

/// メンバー一覧取得のユースケース
pub struct GetUserListUseCase {
    repository: Arc<dyn ChatRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    sequencer: Arc<DeliverySequencer>,
}

impl GetUserListUseCase {
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

    /// メンバー一覧を要求した接続にだけ送る
    pub async fn execute(&self, connection_id: ConnectionId, room: RoomName) -> Vec<Member> {
        let _guard = self.sequencer.acquire().await;

        let users = self.repository.get_members(&room).await;
        let notification = Notification::UserList {
            room,
            users: users.clone(),
        };
        if let Err(e) = self
            .message_pusher
            .push_to(&connection_id, &notification)
            .await
        {
            tracing::warn!("Failed to send user list to '{}': {}", connection_id, e);
        }

        users
    }
}
