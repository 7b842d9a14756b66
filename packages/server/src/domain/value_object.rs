//! 値オブジェクト
//!
//! 生の文字列をバリデーション済みの型に閉じ込めます。
//! クライアントから届く `userId` / `nickname` は表示用のラベルとしてのみ扱い、
//! アクセス制御には使いません。

use std::fmt;

use uuid::Uuid;

use super::error::ValueObjectError;

pub const MAX_ROOM_NAME_CHARS: usize = 64;
pub const MAX_USER_ID_CHARS: usize = 128;
pub const MAX_NICKNAME_CHARS: usize = 64;
pub const DEFAULT_MAX_MESSAGE_CHARS: usize = 2000;

fn validated(
    field: &'static str,
    raw: impl Into<String>,
    max: usize,
) -> Result<String, ValueObjectError> {
    let raw = raw.into();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValueObjectError::Empty { field });
    }
    let len = trimmed.chars().count();
    if len > max {
        return Err(ValueObjectError::TooLong { field, len, max });
    }
    if trimmed.len() == raw.len() {
        Ok(raw)
    } else {
        Ok(trimmed.to_string())
    }
}

/// サーバーが払い出す接続 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(Uuid);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// ConnectionId の生成
pub struct ConnectionIdFactory;

impl ConnectionIdFactory {
    pub fn generate() -> ConnectionId {
        ConnectionId(Uuid::new_v4())
    }
}

macro_rules! string_value_object {
    ($(#[$meta:meta])* $name:ident, $field:literal, $max:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Result<Self, ValueObjectError> {
                validated($field, value, $max).map(Self)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_value_object!(
    /// ルーム名（グローバルに一意）
    RoomName,
    "room",
    MAX_ROOM_NAME_CHARS
);

string_value_object!(
    /// クライアントが名乗るユーザー ID（タブをまたいで同一）
    UserId,
    "userId",
    MAX_USER_ID_CHARS
);

string_value_object!(
    /// 表示名
    Nickname,
    "nickname",
    MAX_NICKNAME_CHARS
);

impl UserId {
    /// ID を名乗らなかった接続に割り当てるユーザー ID
    pub fn generate() -> Self {
        Self(format!("user_{}", Uuid::new_v4().simple()))
    }
}

impl Nickname {
    /// ニックネームを名乗らなかった接続に割り当てる表示名
    pub fn guest() -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!("Guest{}", &suffix[..6]))
    }
}

/// メッセージ本文（前後の空白を除去済み、空でない）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBody(String);

impl MessageBody {
    pub fn new(value: impl Into<String>) -> Result<Self, ValueObjectError> {
        Self::with_limit(value, DEFAULT_MAX_MESSAGE_CHARS)
    }

    /// 最大文字数を指定して生成
    pub fn with_limit(
        value: impl Into<String>,
        max_chars: usize,
    ) -> Result<Self, ValueObjectError> {
        validated("message", value, max_chars).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Unix タイムスタンプ（ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}
