//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{
    entity::{ChatMessage, Connection, Member},
    error::RepositoryError,
    state::{Departure, Disconnection, JoinOutcome, PostedMessage},
    typing::{TypingChange, TypingIndicator},
    value_object::{ConnectionId, MessageBody, Nickname, RoomName, Timestamp, UserId},
};

/// 接続・ルーム・履歴を扱う Repository
///
/// 各メソッドは 1 回の呼び出しで原子的に適用されます。
/// 特に `join_room` / `leave_room` / `unregister_connection` は、
/// 接続の現在のルームとルームのメンバー集合を同時に更新します。
#[async_trait]
pub trait ChatRepository: Send + Sync {
    async fn register_connection(
        &self,
        connection: Connection,
    ) -> Result<ConnectionId, RepositoryError>;

    /// 未登録の ID に対しては `None`（冪等）
    async fn unregister_connection(&self, id: &ConnectionId) -> Option<Disconnection>;

    async fn join_room(
        &self,
        id: &ConnectionId,
        room: RoomName,
    ) -> Result<JoinOutcome, RepositoryError>;

    async fn leave_room(
        &self,
        id: &ConnectionId,
        room: &RoomName,
    ) -> Result<Option<Departure>, RepositoryError>;

    async fn post_message(
        &self,
        id: &ConnectionId,
        room: &RoomName,
        body: MessageBody,
        now: Timestamp,
    ) -> Result<PostedMessage, RepositoryError>;

    async fn update_identity(
        &self,
        id: &ConnectionId,
        user_id: Option<UserId>,
        nickname: Option<Nickname>,
    ) -> Result<Connection, RepositoryError>;

    async fn get_connection(&self, id: &ConnectionId) -> Option<Connection>;

    async fn get_all_connection_ids(&self) -> Vec<ConnectionId>;

    async fn count_connections(&self) -> usize;

    async fn get_members(&self, room: &RoomName) -> Vec<Member>;

    async fn get_history(&self, room: &RoomName) -> Vec<ChatMessage>;

    async fn list_rooms(&self) -> Vec<RoomName>;

    /// Registry と RoomStore の整合性検査
    async fn verify_consistency(&self) -> Result<(), RepositoryError>;
}

/// 入力中表示を扱う Repository
#[async_trait]
pub trait PresenceRepository: Send + Sync {
    async fn set_typing(
        &self,
        indicator: TypingIndicator,
        is_typing: bool,
        now: Timestamp,
    ) -> TypingChange;

    async fn clear_typing(&self, room: &RoomName, user_id: &UserId) -> Option<TypingIndicator>;

    async fn expire_typing(&self, now: Timestamp) -> Vec<TypingIndicator>;

    async fn active_typists(&self, room: &RoomName, now: Timestamp) -> Vec<TypingIndicator>;
}
