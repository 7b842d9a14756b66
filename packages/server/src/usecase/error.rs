//! UseCase 層のエラー型

use thiserror::Error;

use crate::domain::{DomainError, Rejection, RejectionCode, RepositoryError};

/// 接続受付のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("connection limit reached ({0} connections)")]
    ResourceExhausted(usize),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for ConnectError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Domain(DomainError::ResourceExhausted(max)) => {
                Self::ResourceExhausted(max)
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

/// ルーム操作（join / leave / typing / 履歴・メンバー一覧の要求）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomAccessError {
    #[error("not a member of room '{0}'")]
    NotInRoom(String),

    #[error("connection '{0}' is not registered")]
    ConnectionNotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for RoomAccessError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Domain(DomainError::NotInRoom { room, .. }) => Self::NotInRoom(room),
            RepositoryError::Domain(DomainError::ConnectionNotFound(id)) => {
                Self::ConnectionNotFound(id)
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<&RoomAccessError> for Rejection {
    fn from(error: &RoomAccessError) -> Self {
        let code = match error {
            RoomAccessError::NotInRoom(_) => RejectionCode::NotInRoom,
            RoomAccessError::ConnectionNotFound(_) | RoomAccessError::Internal(_) => {
                RejectionCode::InternalError
            }
        };
        Rejection::new(code, error.to_string())
    }
}

/// メッセージ送信のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendMessageError {
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    #[error("not a member of room '{0}'")]
    NotInRoom(String),

    #[error("connection '{0}' is not registered")]
    ConnectionNotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for SendMessageError {
    fn from(error: RepositoryError) -> Self {
        match RoomAccessError::from(error) {
            RoomAccessError::NotInRoom(room) => Self::NotInRoom(room),
            RoomAccessError::ConnectionNotFound(id) => Self::ConnectionNotFound(id),
            RoomAccessError::Internal(reason) => Self::Internal(reason),
        }
    }
}

impl From<&SendMessageError> for Rejection {
    fn from(error: &SendMessageError) -> Self {
        let code = match error {
            SendMessageError::InvalidMessage(_) => RejectionCode::InvalidMessage,
            SendMessageError::NotInRoom(_) => RejectionCode::NotInRoom,
            SendMessageError::ConnectionNotFound(_) | SendMessageError::Internal(_) => {
                RejectionCode::InternalError
            }
        };
        Rejection::new(code, error.to_string())
    }
}
