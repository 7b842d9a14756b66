//! UseCase: ルーム参加処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinRoomUseCase::execute() メソッド
//! - 履歴の再送、入室通知、メンバー一覧・ルーム一覧の配信
//!
//! ### なぜこのテストが必要か
//! - 1 接続は同時に 1 ルームにしか居られないため、別ルームへの join では
//!   元のルームへの退室通知も必要になる
//! - 履歴は要求した接続だけに届き、入室通知は他のメンバーだけに届くことを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規ルームの作成、既存ルームへの参加
//! - エッジケース：同じルームへの再 join、別ルームへの移動

use std::sync::Arc;

use hiroba_shared::time::{Clock, timestamp_to_rfc3339};

use crate::domain::{
    ChatRepository, ConnectionId, JoinOutcome, MessagePusher, Notification, PresenceRepository,
    RoomName, Timestamp,
};

use super::{error::RoomAccessError, notifier::RoomNotifier, sequencer::DeliverySequencer};

/// ルーム参加のユースケース
pub struct JoinRoomUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn ChatRepository>,
    notifier: RoomNotifier,
    clock: Arc<dyn Clock>,
    sequencer: Arc<DeliverySequencer>,
}

impl JoinRoomUseCase {
    /// 新しい JoinRoomUseCase を作成
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

    /// ルーム参加を実行
    ///
    /// ルームが存在しなければ作成します。別のルームに居た場合はそこから抜けます。
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        room: RoomName,
    ) -> Result<JoinOutcome, RoomAccessError> {
        let _guard = self.sequencer.acquire().await;
        let now = Timestamp::new(self.clock.now_millis());

        // 1. Registry + RoomStore を同時に更新
        let outcome = self.repository.join_room(&connection_id, room).await?;

        // 2. 元のルームへの退室通知
        if let Some(previous) = &outcome.previous {
            self.notifier.departure(previous, now).await;
        }

        // 3. ルームが新しく作られたら全接続のルーム一覧を更新
        if outcome.room_created {
            tracing::info!(
                "Room '{}' created at {}",
                outcome.room,
                timestamp_to_rfc3339(now.value()).unwrap_or_else(|| now.value().to_string())
            );
            self.notifier.room_list().await;
        }

        // 4. 履歴は参加した接続だけに送る
        self.notifier
            .push_to(
                &connection_id,
                &Notification::ChatHistory {
                    room: outcome.room.clone(),
                    history: outcome.history.clone(),
                },
            )
            .await;

        if outcome.already_member {
            return Ok(outcome);
        }

        // 5. 入室通知は他のメンバーへ、メンバー一覧は全員へ
        self.notifier
            .to_room(
                &outcome.room,
                Some(&connection_id),
                &Notification::joined(outcome.room.clone(), &outcome.member, now),
            )
            .await;
        self.notifier.user_list(&outcome.room).await;

        tracing::info!(
            "Connection '{}' ({}) joined room '{}'",
            connection_id,
            outcome.member.nickname,
            outcome.room
        );

        Ok(outcome)
    }
}
