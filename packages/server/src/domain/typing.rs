//! Presence / Typing Tracker
//!
//! (ルーム, ユーザー) ごとの「入力中」フラグを期限付きで保持します。
//! 期限切れのエントリは、掃除される前であっても入力中とは見なしません。
//! ただし停止通知や退室で取り除いたエントリは、期限切れでも停止として扱います。
//! 開始は配信済みなので、停止を配信しないと相手側の表示が残るためです。

use std::collections::HashMap;

use super::value_object::{Nickname, RoomName, Timestamp, UserId};

/// 入力中表示 1 件分
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingIndicator {
    pub room: RoomName,
    pub user_id: UserId,
    pub nickname: Nickname,
}

/// `set_typing` による状態変化
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingChange {
    Started,
    Refreshed,
    /// エントリを取り除いた（期限切れで掃除待ちだったものを含む）
    Stopped,
    /// エントリの無いユーザーからの停止通知
    Unchanged,
}

#[derive(Debug, Clone)]
struct TypingEntry {
    nickname: Nickname,
    expires_at: Timestamp,
}

#[derive(Debug)]
pub struct TypingTracker {
    entries: HashMap<(RoomName, UserId), TypingEntry>,
    timeout_ms: i64,
}

impl TypingTracker {
    pub fn new(timeout_ms: i64) -> Self {
        Self {
            entries: HashMap::new(),
            timeout_ms,
        }
    }

    /// フラグを立てる / 下ろす。立てるたびに期限を `now + timeout` に延長する。
    pub fn set_typing(
        &mut self,
        room: RoomName,
        user_id: UserId,
        nickname: Nickname,
        is_typing: bool,
        now: Timestamp,
    ) -> TypingChange {
        let key = (room, user_id);
        if !is_typing {
            return match self.entries.remove(&key) {
                Some(_) => TypingChange::Stopped,
                None => TypingChange::Unchanged,
            };
        }

        let expires_at = Timestamp::new(now.value() + self.timeout_ms);
        let previous = self.entries.insert(
            key,
            TypingEntry {
                nickname,
                expires_at,
            },
        );
        match previous {
            Some(entry) if entry.expires_at > now => TypingChange::Refreshed,
            _ => TypingChange::Started,
        }
    }

    /// ルーム内で現在入力中のユーザー（ユーザー ID 順）
    pub fn active(&self, room: &RoomName, now: Timestamp) -> Vec<TypingIndicator> {
        let mut active: Vec<TypingIndicator> = self
            .entries
            .iter()
            .filter(|((r, _), entry)| r == room && entry.expires_at > now)
            .map(|((r, user_id), entry)| TypingIndicator {
                room: r.clone(),
                user_id: user_id.clone(),
                nickname: entry.nickname.clone(),
            })
            .collect();
        active.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        active
    }

    /// 退室・切断時にエントリを消す。消したエントリがあれば返す。
    pub fn clear(&mut self, room: &RoomName, user_id: &UserId) -> Option<TypingIndicator> {
        let key = (room.clone(), user_id.clone());
        let entry = self.entries.remove(&key)?;
        Some(TypingIndicator {
            room: key.0,
            user_id: key.1,
            nickname: entry.nickname,
        })
    }

    /// 期限切れのエントリを取り除いて返す
    pub fn expire(&mut self, now: Timestamp) -> Vec<TypingIndicator> {
        let expired_keys: Vec<(RoomName, UserId)> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.expires_at <= now)
            .map(|(key, _)| key.clone())
            .collect();

        let mut expired: Vec<TypingIndicator> = expired_keys
            .into_iter()
            .filter_map(|key| {
                self.entries.remove(&key).map(|entry| TypingIndicator {
                    room: key.0,
                    user_id: key.1,
                    nickname: entry.nickname,
                })
            })
            .collect();
        expired.sort_by(|a, b| (&a.room, &a.user_id).cmp(&(&b.room, &b.user_id)));
        expired
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
