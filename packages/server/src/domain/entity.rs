//! エンティティ
//!
//! - `Connection`: 1 本の WebSocket 接続
//! - `ChatMessage`: ルームに投稿されたメッセージ（不変）
//! - `Room`: メンバー集合と上限付きの履歴バッファ

use std::collections::{BTreeSet, VecDeque};

use super::value_object::{ConnectionId, MessageBody, Nickname, RoomName, Timestamp, UserId};

/// 接続中のクライアント
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub id: ConnectionId,
    pub user_id: UserId,
    pub nickname: Nickname,
    /// 現在のルーム（同時に 1 つまで）
    pub room: Option<RoomName>,
    pub connected_at: Timestamp,
}

impl Connection {
    pub fn new(
        id: ConnectionId,
        user_id: UserId,
        nickname: Nickname,
        connected_at: Timestamp,
    ) -> Self {
        Self {
            id,
            user_id,
            nickname,
            room: None,
            connected_at,
        }
    }

    /// ルーム内の他者から見えるメンバー情報
    pub fn as_member(&self) -> Member {
        Member {
            connection_id: self.id,
            user_id: self.user_id.clone(),
            nickname: self.nickname.clone(),
        }
    }
}

/// ルームのメンバー（ファンアウト先 + 表示情報）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub connection_id: ConnectionId,
    pub user_id: UserId,
    pub nickname: Nickname,
}

/// チャットメッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub room: RoomName,
    pub user_id: UserId,
    pub nickname: Nickname,
    pub body: MessageBody,
    /// サーバーが付与した受理時刻
    pub timestamp: Timestamp,
}

impl ChatMessage {
    pub fn new(
        room: RoomName,
        user_id: UserId,
        nickname: Nickname,
        body: MessageBody,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            room,
            user_id,
            nickname,
            body,
            timestamp,
        }
    }
}

/// チャットルーム
#[derive(Debug, Clone)]
pub struct Room {
    pub name: RoomName,
    /// 作成順（ルーム一覧の並び順に使う）
    pub seq: u64,
    pub members: BTreeSet<ConnectionId>,
    history: VecDeque<ChatMessage>,
    history_capacity: usize,
}

impl Room {
    pub fn new(name: RoomName, seq: u64, history_capacity: usize) -> Self {
        Self {
            name,
            seq,
            members: BTreeSet::new(),
            history: VecDeque::with_capacity(history_capacity.min(1024)),
            history_capacity,
        }
    }

    /// メンバーを追加（既に居る場合は false）
    pub fn add_member(&mut self, connection_id: ConnectionId) -> bool {
        self.members.insert(connection_id)
    }

    /// メンバーを削除（居なかった場合は false）
    pub fn remove_member(&mut self, connection_id: &ConnectionId) -> bool {
        self.members.remove(connection_id)
    }

    pub fn has_member(&self, connection_id: &ConnectionId) -> bool {
        self.members.contains(connection_id)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// 履歴に追加する。上限を超えた分は古いものから捨てる。
    ///
    /// タイムスタンプはルーム内で単調非減少になるよう、直前のメッセージより
    /// 過去の値は直前の値に切り上げる。
    pub fn append(&mut self, mut message: ChatMessage) -> ChatMessage {
        if let Some(last) = self.history.back()
            && message.timestamp < last.timestamp
        {
            message.timestamp = last.timestamp;
        }
        if self.history_capacity == 0 {
            return message;
        }
        while self.history.len() >= self.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(message.clone());
        message
    }

    /// 履歴のスナップショット（古い順）
    pub fn history(&self) -> Vec<ChatMessage> {
        self.history.iter().cloned().collect()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn history_capacity(&self) -> usize {
        self.history_capacity
    }
}
