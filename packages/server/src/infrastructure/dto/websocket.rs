//! WebSocket で送受信する JSON イベント
//!
//! 全てのイベントは `type` フィールドでイベント名を持ち、ペイロードは同じ階層に
//! camelCase で並びます。
//!
//! ```json
//! {"type":"message","room":"lobby","message":"hi","userId":"u1","nickname":"Alice"}
//! ```

use serde::{Deserialize, Serialize};

/// クライアント → サーバー
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    Join {
        room: String,
    },
    Leave {
        room: String,
    },
    Message {
        room: String,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        nickname: Option<String>,
    },
    Typing {
        room: String,
        is_typing: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        nickname: Option<String>,
    },
    GetChatHistory {
        room: String,
    },
    GetUserList {
        room: String,
    },
}

impl ClientEvent {
    /// ログ用のイベント名
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Leave { .. } => "leave",
            Self::Message { .. } => "message",
            Self::Typing { .. } => "typing",
            Self::GetChatHistory { .. } => "get_chat_history",
            Self::GetUserList { .. } => "get_user_list",
        }
    }
}

/// サーバー → クライアント
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    Message(MessagePayload),
    ChatHistory {
        room: String,
        history: Vec<MessagePayload>,
    },
    Typing(TypingPayload),
    UpdateRooms {
        rooms: Vec<String>,
    },
    UserList {
        room: String,
        users: Vec<UserInfo>,
    },
    Error {
        code: String,
        message: String,
    },
}

/// チャットメッセージ（システム通知を含む）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    pub message: String,
    pub user_id: String,
    pub nickname: String,
    pub room: String,
    /// Unix epoch ミリ秒
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    pub is_typing: bool,
    pub room: String,
    pub user_id: String,
    pub nickname: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub user_id: String,
    pub nickname: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_join_event() {
        // テスト項目: join イベントをパースできる
        // given (前提条件):
        let json = r#"{"type":"join","room":"lobby"}"#;

        // when (操作):
        let event: ClientEvent = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert_eq!(
            event,
            ClientEvent::Join {
                room: "lobby".to_string()
            }
        );
    }

    #[test]
    fn test_parse_message_event_with_camel_case_fields() {
        // テスト項目: message イベントの userId / nickname が camelCase で読まれる
        // given (前提条件):
        let json =
            r#"{"type":"message","room":"lobby","message":"hi","userId":"u1","nickname":"Alice"}"#;

        // when (操作):
        let event: ClientEvent = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert_eq!(
            event,
            ClientEvent::Message {
                room: "lobby".to_string(),
                message: "hi".to_string(),
                user_id: Some("u1".to_string()),
                nickname: Some("Alice".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_typing_event_without_identity() {
        // テスト項目: typing イベントの userId / nickname は省略できる
        // given (前提条件):
        let json = r#"{"type":"typing","room":"lobby","isTyping":true}"#;

        // when (操作):
        let event: ClientEvent = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert_eq!(
            event,
            ClientEvent::Typing {
                room: "lobby".to_string(),
                is_typing: true,
                user_id: None,
                nickname: None,
            }
        );
        assert_eq!(event.kind(), "typing");
    }

    #[test]
    fn test_parse_snake_case_event_names() {
        // テスト項目: 複数語のイベント名は snake_case
        // given (前提条件):
        let history = r#"{"type":"get_chat_history","room":"lobby"}"#;
        let users = r#"{"type":"get_user_list","room":"lobby"}"#;

        // when (操作):
        let history: ClientEvent = serde_json::from_str(history).unwrap();
        let users: ClientEvent = serde_json::from_str(users).unwrap();

        // then (期待する結果):
        assert_eq!(history.kind(), "get_chat_history");
        assert_eq!(users.kind(), "get_user_list");
    }

    #[test]
    fn test_parse_unknown_event_fails() {
        // テスト項目: 未知のイベント・必須フィールド欠落はエラー
        // given (前提条件):
        let unknown = r#"{"type":"dance","room":"lobby"}"#;
        let missing = r#"{"type":"join"}"#;

        // when (操作):
        let unknown = serde_json::from_str::<ClientEvent>(unknown);
        let missing = serde_json::from_str::<ClientEvent>(missing);

        // then (期待する結果):
        assert!(unknown.is_err());
        assert!(missing.is_err());
    }

    #[test]
    fn test_serialize_message_event() {
        // テスト項目: message イベントが type と camelCase フィールドで出力される
        // given (前提条件):
        let event = ServerEvent::Message(MessagePayload {
            message: "hi".to_string(),
            user_id: "u1".to_string(),
            nickname: "Alice".to_string(),
            room: "lobby".to_string(),
            timestamp: 1000,
        });

        // when (操作):
        let value = serde_json::to_value(&event).unwrap();

        // then (期待する結果):
        assert_eq!(
            value,
            serde_json::json!({
                "type": "message",
                "message": "hi",
                "userId": "u1",
                "nickname": "Alice",
                "room": "lobby",
                "timestamp": 1000
            })
        );
    }

    #[test]
    fn test_serialize_update_rooms_and_typing() {
        // テスト項目: update_rooms / typing イベントの形
        // given (前提条件):
        let rooms = ServerEvent::UpdateRooms {
            rooms: vec!["a".to_string(), "b".to_string()],
        };
        let typing = ServerEvent::Typing(TypingPayload {
            is_typing: false,
            room: "lobby".to_string(),
            user_id: "u1".to_string(),
            nickname: "Alice".to_string(),
        });

        // when (操作):
        let rooms = serde_json::to_value(&rooms).unwrap();
        let typing = serde_json::to_value(&typing).unwrap();

        // then (期待する結果):
        assert_eq!(
            rooms,
            serde_json::json!({"type": "update_rooms", "rooms": ["a", "b"]})
        );
        assert_eq!(
            typing,
            serde_json::json!({
                "type": "typing",
                "isTyping": false,
                "room": "lobby",
                "userId": "u1",
                "nickname": "Alice"
            })
        );
    }
}
