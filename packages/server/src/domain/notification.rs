//! クライアントへ通知するイベントのドメインモデル
//!
//! 配信の具体的な表現（JSON など）は Infrastructure 層の `MessagePusher` 実装が決めます。

use std::fmt;

use super::{
    entity::{ChatMessage, Member},
    typing::TypingIndicator,
    value_object::{RoomName, Timestamp},
};

/// システム通知の送信者名
pub const SYSTEM_NICKNAME: &str = "System";
/// システム通知の送信者 ID
pub const SYSTEM_USER_ID: &str = "system";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// ルームに受理されたメッセージ
    Message(ChatMessage),
    /// 入退室などのシステム通知（履歴には残らない）
    SystemNotice {
        room: RoomName,
        text: String,
        timestamp: Timestamp,
    },
    /// 履歴の再送（要求した接続だけに送る）
    ChatHistory {
        room: RoomName,
        history: Vec<ChatMessage>,
    },
    Typing {
        indicator: TypingIndicator,
        is_typing: bool,
    },
    /// 全ルーム名
    RoomList(Vec<RoomName>),
    UserList {
        room: RoomName,
        users: Vec<Member>,
    },
    /// 送信元の接続だけに返すエラー
    Rejected(Rejection),
}

impl Notification {
    pub fn joined(room: RoomName, member: &Member, timestamp: Timestamp) -> Self {
        Self::SystemNotice {
            text: format!("{} has joined the room.", member.nickname),
            room,
            timestamp,
        }
    }

    pub fn left(room: RoomName, member: &Member, timestamp: Timestamp) -> Self {
        Self::SystemNotice {
            text: format!("{} has left the room.", member.nickname),
            room,
            timestamp,
        }
    }

    /// ログ用のイベント名
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Message(_) | Self::SystemNotice { .. } => "message",
            Self::ChatHistory { .. } => "chat_history",
            Self::Typing { .. } => "typing",
            Self::RoomList(_) => "update_rooms",
            Self::UserList { .. } => "user_list",
            Self::Rejected(_) => "error",
        }
    }
}

/// エラー種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionCode {
    InvalidMessage,
    InvalidRoom,
    InvalidIdentity,
    NotInRoom,
    InvalidPayload,
    InternalError,
}

impl RejectionCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidMessage => "invalid_message",
            Self::InvalidRoom => "invalid_room",
            Self::InvalidIdentity => "invalid_identity",
            Self::NotInRoom => "not_in_room",
            Self::InvalidPayload => "invalid_payload",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for RejectionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 送信元だけに返す拒否理由
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub code: RejectionCode,
    pub reason: String,
}

impl Rejection {
    pub fn new(code: RejectionCode, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.reason)
    }
}
