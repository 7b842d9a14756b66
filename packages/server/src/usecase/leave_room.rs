//! UseCase: ルーム退出処理

use std::sync::Arc;

use hiroba_shared::time::Clock;

use crate::domain::{
    ChatRepository, ConnectionId, Departure, MessagePusher, PresenceRepository, RoomName,
    Timestamp,
};

use super::{error::RoomAccessError, notifier::RoomNotifier, sequencer::DeliverySequencer};

/// ルーム退出のユースケース
pub struct LeaveRoomUseCase {
    repository: Arc<dyn ChatRepository>,
    notifier: RoomNotifier,
    clock: Arc<dyn Clock>,
    sequencer: Arc<DeliverySequencer>,
}

impl LeaveRoomUseCase {
    pub fn new(
        repository: Arc<dyn ChatRepository>,
        presence: Arc<dyn PresenceRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
        sequencer: Arc<DeliverySequencer>,
    ) -> Self {
        Self {
            notifier: RoomNotifier::new(repository.clone(), presence, message_pusher),
            repository,
            clock,
            sequencer,
        }
    }

    /// ルーム退出を実行
    ///
    /// そのルームに居なければ何もせず `Ok(None)` を返します。
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        room: RoomName,
    ) -> Result<Option<Departure>, RoomAccessError> {
        let _guard = self.sequencer.acquire().await;
        let now = Timestamp::new(self.clock.now_millis());

        let departure = self.repository.leave_room(&connection_id, &room).await?;
        match &departure {
            Some(departure) => {
                self.notifier.departure(departure, now).await;
                tracing::info!("Connection '{}' left room '{}'", connection_id, room);
            }
            None => {
                tracing::debug!(
                    "Connection '{}' asked to leave room '{}' it is not in",
                    connection_id,
                    room
                );
            }
        }

        Ok(departure)
    }
}
