//! UseCase: 切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//! - Registry / RoomStore からの削除と、残ったメンバーへの退室通知
//!
//! ### なぜこのテストが必要か
//! - 切断はクライアントの明示的な close、ネットワーク断、送信キューの溢れなど
//!   複数の経路から呼ばれるため、二重に呼ばれても安全でなければならない
//! - 切断した接続の入力中表示が残り続けないことを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：ルーム参加中の切断
//! - エッジケース：ルーム未参加の切断、二重切断、入力中の切断

use std::sync::Arc;

use hiroba_shared::time::Clock;

use crate::domain::{
    ChatRepository, ConnectionId, Disconnection, MessagePusher, PresenceRepository, Timestamp,
};

use super::{notifier::RoomNotifier, sequencer::DeliverySequencer};

/// 切断のユースケース
pub struct DisconnectParticipantUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn ChatRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    notifier: RoomNotifier,
    clock: Arc<dyn Clock>,
    sequencer: Arc<DeliverySequencer>,
}

impl DisconnectParticipantUseCase {
    /// 新しい DisconnectParticipantUseCase を作成
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
        }
    }

    /// 切断を実行
    ///
    /// # Returns
    ///
    /// * `Some(Disconnection)` - 削除した接続と、抜けたルーム
    /// * `None` - 既に削除済み（何もしない）
    pub async fn execute(&self, connection_id: ConnectionId) -> Option<Disconnection> {
        let _guard = self.sequencer.acquire().await;
        let now = Timestamp::new(self.clock.now_millis());

        // 1. 送信キューを破棄
        self.message_pusher.unregister_client(&connection_id).await;

        // 2. Registry と RoomStore から削除
        let Some(disconnection) = self.repository.unregister_connection(&connection_id).await
        else {
            tracing::debug!("Connection '{}' was already removed", connection_id);
            return None;
        };

        // 3. 残ったメンバーへ通知
        if let Some(departure) = &disconnection.departure {
            self.notifier.departure(departure, now).await;
        }

        Some(disconnection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ConnectionRegistry, RoomName, RoomStore, TypingIndicator},
        usecase::test_support::{TestContext, drain, kinds, room},
    };

    fn create_usecase(ctx: &TestContext) -> DisconnectParticipantUseCase {
        DisconnectParticipantUseCase::new(
            ctx.repository.clone(),
            ctx.presence.clone(),
            ctx.pusher.clone(),
            ctx.clock.clone(),
            ctx.sequencer.clone(),
        )
    }

    #[tokio::test]
    async fn test_disconnect_notifies_remaining_members() {
        // テスト項目: 切断すると残ったメンバーに退室通知とメンバー一覧が届く
        // given (前提条件):
        let ctx = TestContext::new();
        let (alice, _alice_rx) = ctx.connect("u1", "Alice").await;
        let (bob, mut bob_rx) = ctx.connect("u2", "Bob").await;
        ctx.join(&alice, "lobby").await;
        ctx.join(&bob, "lobby").await;
        let usecase = create_usecase(&ctx);

        // when (操作):
        let result = usecase.execute(alice).await;

        // then (期待する結果):
        let disconnection = result.unwrap();
        assert_eq!(disconnection.connection.id, alice);
        assert_eq!(
            disconnection.departure.map(|d| d.room),
            Some(room("lobby"))
        );

        let events = drain(&mut bob_rx);
        assert_eq!(kinds(&events), vec!["message", "user_list"]);
        assert_eq!(events[0]["userId"], "system");
        assert_eq!(events[0]["message"], "Alice has left the room.");
        assert_eq!(
            events[1]["users"],
            serde_json::json!([{"userId": "u2", "nickname": "Bob"}])
        );

        assert_eq!(ctx.repository.get_members(&room("lobby")).await.len(), 1);
        assert!(ctx.repository.get_connection(&alice).await.is_none());
        assert!(ctx.repository.verify_consistency().await.is_ok());
    }

    #[tokio::test]
    async fn test_disconnect_twice_is_noop() {
        // テスト項目: 二度目の切断は何もしない（冪等性）
        // given (前提条件):
        let ctx = TestContext::new();
        let (alice, _alice_rx) = ctx.connect("u1", "Alice").await;
        let (bob, mut bob_rx) = ctx.connect("u2", "Bob").await;
        ctx.join(&alice, "lobby").await;
        ctx.join(&bob, "lobby").await;
        let usecase = create_usecase(&ctx);
        usecase.execute(alice).await.unwrap();
        drain(&mut bob_rx);

        // when (操作):
        let result = usecase.execute(alice).await;

        // then (期待する結果):
        assert!(result.is_none());
        assert!(drain(&mut bob_rx).is_empty());
        assert_eq!(ctx.repository.count_connections().await, 1);
    }

    #[tokio::test]
    async fn test_disconnect_without_room() {
        // テスト項目: ルーム未参加の接続の切断では誰にも通知しない
        // given (前提条件):
        let ctx = TestContext::new();
        let (alice, _alice_rx) = ctx.connect("u1", "Alice").await;
        let (_bob, mut bob_rx) = ctx.connect("u2", "Bob").await;
        let usecase = create_usecase(&ctx);

        // when (操作):
        let result = usecase.execute(alice).await;

        // then (期待する結果):
        assert!(result.unwrap().departure.is_none());
        assert!(drain(&mut bob_rx).is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_while_typing_broadcasts_stop() {
        // テスト項目: 入力中のまま切断すると isTyping:false が配信される
        // given (前提条件):
        let ctx = TestContext::new();
        let (alice, _alice_rx) = ctx.connect("u1", "Alice").await;
        let (bob, mut bob_rx) = ctx.connect("u2", "Bob").await;
        ctx.join(&alice, "lobby").await;
        ctx.join(&bob, "lobby").await;
        let indicator = TypingIndicator {
            room: room("lobby"),
            user_id: crate::domain::UserId::new("u1").unwrap(),
            nickname: crate::domain::Nickname::new("Alice").unwrap(),
        };
        ctx.presence.set_typing(indicator, true, ctx.now()).await;
        let usecase = create_usecase(&ctx);

        // when (操作):
        usecase.execute(alice).await;

        // then (期待する結果):
        let events = drain(&mut bob_rx);
        assert_eq!(kinds(&events), vec!["typing", "message", "user_list"]);
        assert_eq!(events[0]["isTyping"], false);
        assert_eq!(events[0]["userId"], "u1");
        assert!(ctx.presence.active_typists(&room("lobby"), ctx.now()).await.is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_last_member_prunes_room() {
        // テスト項目: 空ルーム削除が有効な場合、最後のメンバーの切断でルーム一覧が更新される
        // given (前提条件):
        let ctx = TestContext::with_rooms(
            ConnectionRegistry::new(10),
            RoomStore::new(10).with_pruning(Some(RoomName::new("default").unwrap())),
        );
        let (alice, _alice_rx) = ctx.connect("u1", "Alice").await;
        let (_bob, mut bob_rx) = ctx.connect("u2", "Bob").await;
        ctx.join(&alice, "side").await;
        let usecase = create_usecase(&ctx);

        // when (操作):
        let disconnection = usecase.execute(alice).await.unwrap();

        // then (期待する結果):
        assert!(disconnection.departure.unwrap().room_pruned);
        assert!(ctx.repository.list_rooms().await.is_empty());
        let events = drain(&mut bob_rx);
        assert_eq!(
            events,
            vec![serde_json::json!({"type": "update_rooms", "rooms": []})]
        );
    }
}
