//! ドメイン層のエラー型

use thiserror::Error;

/// 値オブジェクト生成時のバリデーションエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} is too long ({len} chars, max {max})")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
}

/// `ChatState` / `ConnectionRegistry` / `RoomStore` の操作エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// 同時接続数の上限に達した
    #[error("connection limit reached ({0} connections)")]
    ResourceExhausted(usize),

    #[error("connection '{0}' is not registered")]
    ConnectionNotFound(String),

    /// 接続が指定ルームのメンバーではない
    #[error("connection '{connection_id}' is not a member of room '{room}'")]
    NotInRoom { connection_id: String, room: String },

    /// Registry と RoomStore の不整合（到達しない想定）
    #[error("registry and room store diverged: {0}")]
    InternalInconsistency(String),
}

/// Repository 層のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// MessagePusher のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("client '{0}' not found")]
    ClientNotFound(String),

    /// 送信キューが溢れたため接続を切り離した
    #[error("outbound queue of client '{0}' is full, client dropped")]
    QueueFull(String),

    #[error("client '{0}' closed its outbound queue")]
    Closed(String),

    #[error("failed to serialize notification: {0}")]
    Serialization(String),
}
