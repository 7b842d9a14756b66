//! Conversion logic from domain models to DTOs.

use crate::domain::{
    ChatMessage, Member, Notification, SYSTEM_NICKNAME, SYSTEM_USER_ID, TypingIndicator,
};
use crate::infrastructure::dto::websocket as dto;

impl From<&ChatMessage> for dto::MessagePayload {
    fn from(model: &ChatMessage) -> Self {
        Self {
            message: model.body.as_str().to_string(),
            user_id: model.user_id.as_str().to_string(),
            nickname: model.nickname.as_str().to_string(),
            room: model.room.as_str().to_string(),
            timestamp: model.timestamp.value(),
        }
    }
}

impl From<&Member> for dto::UserInfo {
    fn from(model: &Member) -> Self {
        Self {
            user_id: model.user_id.as_str().to_string(),
            nickname: model.nickname.as_str().to_string(),
        }
    }
}

fn typing_payload(indicator: &TypingIndicator, is_typing: bool) -> dto::TypingPayload {
    dto::TypingPayload {
        is_typing,
        room: indicator.room.as_str().to_string(),
        user_id: indicator.user_id.as_str().to_string(),
        nickname: indicator.nickname.as_str().to_string(),
    }
}

impl From<&Notification> for dto::ServerEvent {
    fn from(notification: &Notification) -> Self {
        match notification {
            Notification::Message(message) => Self::Message(message.into()),
            Notification::SystemNotice {
                room,
                text,
                timestamp,
            } => Self::Message(dto::MessagePayload {
                message: text.clone(),
                user_id: SYSTEM_USER_ID.to_string(),
                nickname: SYSTEM_NICKNAME.to_string(),
                room: room.as_str().to_string(),
                timestamp: timestamp.value(),
            }),
            Notification::ChatHistory { room, history } => Self::ChatHistory {
                room: room.as_str().to_string(),
                history: history.iter().map(Into::into).collect(),
            },
            Notification::Typing {
                indicator,
                is_typing,
            } => Self::Typing(typing_payload(indicator, *is_typing)),
            Notification::RoomList(rooms) => Self::UpdateRooms {
                rooms: rooms.iter().map(|r| r.as_str().to_string()).collect(),
            },
            Notification::UserList { room, users } => Self::UserList {
                room: room.as_str().to_string(),
                users: users.iter().map(Into::into).collect(),
            },
            Notification::Rejected(rejection) => Self::Error {
                code: rejection.code.as_str().to_string(),
                message: rejection.reason.clone(),
            },
        }
    }
}
