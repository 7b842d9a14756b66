//! ユースケースのテスト用ヘルパー
//!
//! 実際のインメモリ Repository と WebSocketMessagePusher を組み立て、
//! 各接続の送信キューに届いた JSON を検査できるようにします。

use std::{collections::HashMap, sync::Arc};

use hiroba_shared::time::{Clock, ManualClock};
use tokio::sync::{Mutex, mpsc};

use crate::{
    domain::{
        ChatRepository, ChatState, Connection, ConnectionId, ConnectionIdFactory,
        ConnectionRegistry, MessagePusher, Nickname, RoomName, RoomStore, Timestamp,
        TypingTracker, UserId,
    },
    infrastructure::{
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryChatRepository, InMemoryPresenceRepository},
    },
};

use super::DeliverySequencer;

pub(crate) const START_MILLIS: i64 = 1_700_000_000_000;
pub(crate) const TYPING_TIMEOUT_MS: i64 = 1000;

pub(crate) struct TestContext {
    pub repository: Arc<InMemoryChatRepository>,
    pub presence: Arc<InMemoryPresenceRepository>,
    pub pusher: Arc<WebSocketMessagePusher>,
    pub clock: Arc<ManualClock>,
    pub sequencer: Arc<DeliverySequencer>,
}

impl TestContext {
    pub(crate) fn new() -> Self {
        Self::with_rooms(ConnectionRegistry::new(10), RoomStore::new(100))
    }

    pub(crate) fn with_rooms(registry: ConnectionRegistry, rooms: RoomStore) -> Self {
        let state = Arc::new(Mutex::new(ChatState::new(registry, rooms)));
        let tracker = Arc::new(Mutex::new(TypingTracker::new(TYPING_TIMEOUT_MS)));
        Self {
            repository: Arc::new(InMemoryChatRepository::new(state)),
            presence: Arc::new(InMemoryPresenceRepository::new(tracker)),
            pusher: Arc::new(WebSocketMessagePusher::new(Arc::new(Mutex::new(
                HashMap::new(),
            )))),
            clock: Arc::new(ManualClock::new(START_MILLIS)),
            sequencer: Arc::new(DeliverySequencer::new()),
        }
    }

    pub(crate) fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }

    /// 通知なしで接続を登録する
    pub(crate) async fn connect(
        &self,
        user_id: &str,
        nickname: &str,
    ) -> (ConnectionId, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(64);
        let connection = Connection::new(
            ConnectionIdFactory::generate(),
            UserId::new(user_id).unwrap(),
            Nickname::new(nickname).unwrap(),
            self.now(),
        );
        let id = self
            .repository
            .register_connection(connection)
            .await
            .unwrap();
        self.pusher.register_client(id, tx).await;
        (id, rx)
    }

    /// 通知なしでルームに参加させる
    pub(crate) async fn join(&self, id: &ConnectionId, name: &str) {
        self.repository
            .join_room(id, room(name))
            .await
            .unwrap();
    }
}

pub(crate) fn room(name: &str) -> RoomName {
    RoomName::new(name).unwrap()
}

/// キューに溜まっている JSON を全て取り出す
pub(crate) fn drain(rx: &mut mpsc::Receiver<String>) -> Vec<serde_json::Value> {
    let mut events = Vec::new();
    while let Ok(json) = rx.try_recv() {
        events.push(serde_json::from_str(&json).unwrap());
    }
    events
}

/// `type` フィールドだけを並べる
pub(crate) fn kinds(events: &[serde_json::Value]) -> Vec<&str> {
    events
        .iter()
        .map(|e| e["type"].as_str().unwrap_or_default())
        .collect()
}
