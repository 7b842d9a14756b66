//! InMemory Chat Repository 実装
//!
//! ドメイン層が定義する ChatRepository trait の具体的な実装。
//! `ChatState`（Registry + RoomStore）を 1 つの Mutex で保護し、
//! 全ての変更を単一のクリティカルセクションで適用します。

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ChatMessage, ChatRepository, ChatState, Connection, ConnectionId, Departure, Disconnection,
    JoinOutcome, Member, MessageBody, Nickname, PostedMessage, RepositoryError, RoomName,
    Timestamp, UserId,
};

/// インメモリ Chat Repository 実装
pub struct InMemoryChatRepository {
    state: Arc<Mutex<ChatState>>,
}

impl InMemoryChatRepository {
    /// 新しい InMemoryChatRepository を作成
    pub fn new(state: Arc<Mutex<ChatState>>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl ChatRepository for InMemoryChatRepository {
    async fn register_connection(
        &self,
        connection: Connection,
    ) -> Result<ConnectionId, RepositoryError> {
        let mut state = self.state.lock().await;
        Ok(state.connect(connection)?)
    }

    async fn unregister_connection(&self, id: &ConnectionId) -> Option<Disconnection> {
        let mut state = self.state.lock().await;
        state.disconnect(id)
    }

    async fn join_room(
        &self,
        id: &ConnectionId,
        room: RoomName,
    ) -> Result<JoinOutcome, RepositoryError> {
        let mut state = self.state.lock().await;
        Ok(state.join(id, room)?)
    }

    async fn leave_room(
        &self,
        id: &ConnectionId,
        room: &RoomName,
    ) -> Result<Option<Departure>, RepositoryError> {
        let mut state = self.state.lock().await;
        Ok(state.leave(id, room)?)
    }

    async fn post_message(
        &self,
        id: &ConnectionId,
        room: &RoomName,
        body: MessageBody,
        now: Timestamp,
    ) -> Result<PostedMessage, RepositoryError> {
        let mut state = self.state.lock().await;
        Ok(state.post_message(id, room, body, now)?)
    }

    async fn update_identity(
        &self,
        id: &ConnectionId,
        user_id: Option<UserId>,
        nickname: Option<Nickname>,
    ) -> Result<Connection, RepositoryError> {
        let mut state = self.state.lock().await;
        Ok(state.update_identity(id, user_id, nickname)?)
    }

    async fn get_connection(&self, id: &ConnectionId) -> Option<Connection> {
        let state = self.state.lock().await;
        state.connection(id).cloned()
    }

    async fn get_all_connection_ids(&self) -> Vec<ConnectionId> {
        let state = self.state.lock().await;
        state.connection_ids()
    }

    async fn count_connections(&self) -> usize {
        let state = self.state.lock().await;
        state.connection_count()
    }

    async fn get_members(&self, room: &RoomName) -> Vec<Member> {
        let state = self.state.lock().await;
        state.members(room)
    }

    async fn get_history(&self, room: &RoomName) -> Vec<ChatMessage> {
        let state = self.state.lock().await;
        state.history(room)
    }

    async fn list_rooms(&self) -> Vec<RoomName> {
        let state = self.state.lock().await;
        state.list_rooms()
    }

    async fn verify_consistency(&self) -> Result<(), RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.verify()?)
    }
}
