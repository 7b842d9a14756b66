//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - 本文の検証、サーバー時刻の付与、履歴への追加、ルーム全員への配信
//!
//! ### なぜこのテストが必要か
//! - 送信者自身もサーバーが確定した時刻付きのメッセージを受け取る必要がある
//! - 参加していないルームへの送信が履歴にも配信にも現れないことを保証する
//! - 空・長すぎる本文が拒否されることを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：メッセージ送信とブロードキャスト
//! - 異常系：空の本文、長すぎる本文、未参加のルーム
//! - エッジケース：時計が巻き戻った場合のタイムスタンプ

use std::sync::Arc;

use hiroba_shared::time::Clock;

use crate::domain::{
    ChatMessage, ChatRepository, ConnectionId, MessageBody, MessagePusher, Nickname,
    Notification, PresenceRepository, RoomName, Timestamp, UserId,
    value_object::DEFAULT_MAX_MESSAGE_CHARS,
};

use super::{error::SendMessageError, notifier::RoomNotifier, sequencer::DeliverySequencer};

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn ChatRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    notifier: RoomNotifier,
    clock: Arc<dyn Clock>,
    sequencer: Arc<DeliverySequencer>,
    /// 本文の最大文字数
    max_message_length: usize,
}

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
    pub fn new(
        repository: Arc<dyn ChatRepository>,
        presence: Arc<dyn PresenceRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
        sequencer: Arc<DeliverySequencer>,
    ) -> Self {
        Self {
            notifier: RoomNotifier::new(repository.clone(), presence, message_pusher.clone()),
            repository,
            message_pusher,
            clock,
            sequencer,
            max_message_length: DEFAULT_MAX_MESSAGE_CHARS,
        }
    }

    /// 本文の最大文字数を変更
    pub fn with_max_message_length(mut self, max_message_length: usize) -> Self {
        self.max_message_length = max_message_length;
        self
    }

    /// メッセージ送信を実行
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 送信元の接続
    /// * `room` - 送信先のルーム（送信元が参加している必要がある）
    /// * `message` - 本文（前後の空白は除去される）
    /// * `user_id` / `nickname` - ペイロードで名乗られた表示名（あれば接続の表示名を更新）
    ///
    /// # Returns
    ///
    /// * `Ok(ChatMessage)` - 受理されたメッセージ（サーバー時刻付き）
    /// * `Err(SendMessageError)` - 送信失敗（送信元にだけ error イベントで知らせる）
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        room: RoomName,
        message: String,
        user_id: Option<UserId>,
        nickname: Option<Nickname>,
    ) -> Result<ChatMessage, SendMessageError> {
        // 1. 本文の検証
        let body = MessageBody::with_limit(message, self.max_message_length)
            .map_err(|e| SendMessageError::InvalidMessage(e.to_string()))?;

        let _guard = self.sequencer.acquire().await;
        let now = Timestamp::new(self.clock.now_millis());

        // 2. 送信元がルームに居ることの確認（拒否する場合は表示名も変えない）
        self.notifier.ensure_member(&connection_id, &room).await?;

        // 3. 表示名の更新
        self.notifier
            .refresh_identity(&connection_id, user_id, nickname)
            .await?;

        // 4. 履歴に追加
        let posted = self
            .repository
            .post_message(&connection_id, &room, body, now)
            .await?;

        // 5. 送信者を含むルーム全員へ配信
        let notification = Notification::Message(posted.message.clone());
        if let Err(e) = self
            .message_pusher
            .broadcast(posted.recipients, &notification)
            .await
        {
            tracing::warn!("Failed to broadcast message in room '{}': {}", room, e);
        }

        tracing::debug!(
            "Message from '{}' accepted in room '{}' at {}",
            connection_id,
            room,
            posted.message.timestamp.value()
        );

        Ok(posted.message)
    }
}
