//! UseCase: 接続受付処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectParticipantUseCase::execute() メソッド
//! - 接続の登録、名乗りがない場合の ID / 表示名の割り当て、ルーム一覧の送信
//!
//! ### なぜこのテストが必要か
//! - 接続直後のクライアントはルーム一覧を受け取って初めて画面を描画できる
//! - 接続数上限を超えた接続が登録されないことを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：名乗りあり / なしの接続
//! - 異常系：接続数上限の超過

use std::sync::Arc;

use hiroba_shared::time::Clock;

use crate::domain::{
    ChatRepository, Connection, ConnectionIdFactory, MessagePusher, Nickname, Notification,
    PusherChannel, Timestamp, UserId,
};

use super::{error::ConnectError, sequencer::DeliverySequencer};

/// 接続受付のユースケース
pub struct ConnectParticipantUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn ChatRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
    sequencer: Arc<DeliverySequencer>,
}

impl ConnectParticipantUseCase {
    /// 新しい ConnectParticipantUseCase を作成
    pub fn new(
        repository: Arc<dyn ChatRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
        sequencer: Arc<DeliverySequencer>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            clock,
            sequencer,
        }
    }

    /// 接続を登録し、送信キューを MessagePusher に渡す
    ///
    /// # Arguments
    ///
    /// * `user_id` - クライアントが名乗ったユーザー ID（なければ生成する）
    /// * `nickname` - クライアントが名乗った表示名（なければ `Guest` + 乱数）
    /// * `sender` - クライアントへのメッセージ送信用キュー
    ///
    /// # Returns
    ///
    /// * `Ok(Connection)` - 登録された接続（どのルームにも属していない）
    /// * `Err(ConnectError)` - 接続数上限など
    pub async fn execute(
        &self,
        user_id: Option<UserId>,
        nickname: Option<Nickname>,
        sender: PusherChannel,
    ) -> Result<Connection, ConnectError> {
        let _guard = self.sequencer.acquire().await;
        let now = Timestamp::new(self.clock.now_millis());

        let connection = Connection::new(
            ConnectionIdFactory::generate(),
            user_id.unwrap_or_else(UserId::generate),
            nickname.unwrap_or_else(Nickname::guest),
            now,
        );

        // 1. Registry に登録（上限チェック）
        let id = self
            .repository
            .register_connection(connection.clone())
            .await?;

        // 2. 送信キューを登録
        self.message_pusher.register_client(id, sender).await;

        // 3. 現在のルーム一覧を送る
        let rooms = self.repository.list_rooms().await;
        if let Err(e) = self
            .message_pusher
            .push_to(&id, &Notification::RoomList(rooms))
            .await
        {
            tracing::warn!("Failed to send room list to '{}': {}", id, e);
        }

        Ok(connection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ConnectionRegistry, RoomStore},
        usecase::test_support::{TestContext, drain},
    };
    use tokio::sync::mpsc;

    fn create_usecase(ctx: &TestContext) -> ConnectParticipantUseCase {
        ConnectParticipantUseCase::new(
            ctx.repository.clone(),
            ctx.pusher.clone(),
            ctx.clock.clone(),
            ctx.sequencer.clone(),
        )
    }

    #[tokio::test]
    async fn test_connect_success() {
        // テスト項目: 名乗った ID と表示名で接続が登録される
        // given (前提条件):
        let ctx = TestContext::new();
        let usecase = create_usecase(&ctx);
        let (tx, _rx) = mpsc::channel(8);

        // when (操作):
        let result = usecase
            .execute(
                Some(UserId::new("u1").unwrap()),
                Some(Nickname::new("Alice").unwrap()),
                tx,
            )
            .await;

        // then (期待する結果):
        let connection = result.unwrap();
        assert_eq!(connection.user_id.as_str(), "u1");
        assert_eq!(connection.nickname.as_str(), "Alice");
        assert_eq!(connection.room, None);
        assert_eq!(ctx.repository.count_connections().await, 1);
    }

    #[tokio::test]
    async fn test_connect_without_identity_assigns_guest() {
        // テスト項目: 名乗りがない接続には user_ と Guest で始まる名前が割り当てられる
        // given (前提条件):
        let ctx = TestContext::new();
        let usecase = create_usecase(&ctx);
        let (tx, _rx) = mpsc::channel(8);

        // when (操作):
        let connection = usecase.execute(None, None, tx).await.unwrap();

        // then (期待する結果):
        assert!(connection.user_id.as_str().starts_with("user_"));
        assert!(connection.nickname.as_str().starts_with("Guest"));
    }

    #[tokio::test]
    async fn test_connect_sends_room_list() {
        // テスト項目: 接続直後に update_rooms が届く
        // given (前提条件):
        let ctx = TestContext::new();
        let (existing, _existing_rx) = ctx.connect("u0", "Zed").await;
        ctx.join(&existing, "lobby").await;
        let usecase = create_usecase(&ctx);
        let (tx, mut rx) = mpsc::channel(8);

        // when (操作):
        usecase.execute(None, None, tx).await.unwrap();

        // then (期待する結果):
        let events = drain(&mut rx);
        assert_eq!(
            events,
            vec![serde_json::json!({"type": "update_rooms", "rooms": ["lobby"]})]
        );
    }

    #[tokio::test]
    async fn test_connect_over_capacity() {
        // テスト項目: 接続数上限を超える接続は拒否され、送信キューも登録されない
        // given (前提条件):
        let ctx = TestContext::with_rooms(ConnectionRegistry::new(1), RoomStore::new(10));
        let usecase = create_usecase(&ctx);
        let (tx1, _rx1) = mpsc::channel(8);
        let (tx2, mut rx2) = mpsc::channel(8);
        usecase.execute(None, None, tx1).await.unwrap();

        // when (操作):
        let result = usecase.execute(None, None, tx2).await;

        // then (期待する結果):
        assert_eq!(result, Err(ConnectError::ResourceExhausted(1)));
        assert_eq!(ctx.repository.count_connections().await, 1);
        // sender は破棄されている
        assert_eq!(rx2.recv().await, None);
    }
}
