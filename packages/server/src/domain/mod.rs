//! ドメイン層
//!
//! 値オブジェクト・エンティティ・状態遷移と、外部に依存する処理の trait を定義します。

pub mod entity;
pub mod error;
pub mod notification;
pub mod pusher;
pub mod registry;
pub mod repository;
pub mod room_store;
pub mod state;
pub mod typing;
pub mod value_object;

pub use entity::{ChatMessage, Connection, Member, Room};
pub use error::{DomainError, MessagePushError, RepositoryError, ValueObjectError};
pub use notification::{Notification, Rejection, RejectionCode, SYSTEM_NICKNAME, SYSTEM_USER_ID};
pub use pusher::{MessagePusher, PusherChannel};
pub use registry::ConnectionRegistry;
pub use repository::{ChatRepository, PresenceRepository};
pub use room_store::{LeaveResult, RoomStore};
pub use state::{ChatState, Departure, Disconnection, JoinOutcome, PostedMessage};
pub use typing::{TypingChange, TypingIndicator, TypingTracker};
pub use value_object::{
    ConnectionId, ConnectionIdFactory, MessageBody, Nickname, RoomName, Timestamp, UserId,
};
