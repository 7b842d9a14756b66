//! UseCase: 入力中表示の更新
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - UpdateTypingUseCase::execute() メソッド
//! - 入力中イベントの配信先（同じユーザー ID の接続を除くルームメンバー）
//!
//! ### なぜこのテストが必要か
//! - 同じユーザーが複数タブを開いている場合、自分自身の入力中表示が
//!   別タブに出てはいけない
//! - 参加していないルームへの入力中イベントが漏れないことを保証する

use std::sync::Arc;

use hiroba_shared::time::Clock;

use crate::domain::{
    ChatRepository, ConnectionId, MessagePusher, Nickname, PresenceRepository, RoomName,
    Timestamp, TypingChange, TypingIndicator, UserId,
};

use super::{error::RoomAccessError, notifier::RoomNotifier, sequencer::DeliverySequencer};

/// 入力中表示更新のユースケース
pub struct UpdateTypingUseCase {
    presence: Arc<dyn PresenceRepository>,
    notifier: RoomNotifier,
    clock: Arc<dyn Clock>,
    sequencer: Arc<DeliverySequencer>,
}

impl UpdateTypingUseCase {
    pub fn new(
        repository: Arc<dyn ChatRepository>,
        presence: Arc<dyn PresenceRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
        sequencer: Arc<DeliverySequencer>,
    ) -> Self {
        Self {
            notifier: RoomNotifier::new(repository, presence.clone(), message_pusher),
            presence,
            clock,
            sequencer,
        }
    }

    /// 入力中フラグを更新して配信する
    ///
    /// 下ろすフラグが無い場合は配信しません（`TypingChange::Unchanged`）。
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        room: RoomName,
        is_typing: bool,
        user_id: Option<UserId>,
        nickname: Option<Nickname>,
    ) -> Result<TypingChange, RoomAccessError> {
        let _guard = self.sequencer.acquire().await;
        let now = Timestamp::new(self.clock.now_millis());

        // 拒否する場合は表示名も変えない
        self.notifier.ensure_member(&connection_id, &room).await?;
        let connection = self
            .notifier
            .refresh_identity(&connection_id, user_id, nickname)
            .await?;

        let indicator = TypingIndicator {
            room,
            user_id: connection.user_id,
            nickname: connection.nickname,
        };
        let change = self
            .presence
            .set_typing(indicator.clone(), is_typing, now)
            .await;

        if change != TypingChange::Unchanged {
            self.notifier
                .typing(&indicator, is_typing, Some(&connection_id))
                .await;
        }

        Ok(change)
    }
}
