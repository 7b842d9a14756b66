//! Room Store
//!
//! ルーム名 → `Room` の対応表。ルームはグローバルで、全接続から見えます。
//! ルームは最初の join で遅延生成されます。

use std::collections::HashMap;

use super::{
    entity::{ChatMessage, Room},
    value_object::{ConnectionId, RoomName},
};

/// `leave` の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LeaveResult {
    /// メンバーから実際に取り除いたか
    pub removed: bool,
    /// 空になったルームを削除したか
    pub pruned: bool,
}

#[derive(Debug)]
pub struct RoomStore {
    rooms: HashMap<RoomName, Room>,
    history_capacity: usize,
    /// 空になったルームを削除するか
    prune_empty: bool,
    /// 削除対象から外すルーム
    pinned_room: Option<RoomName>,
    next_seq: u64,
}

impl RoomStore {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            rooms: HashMap::new(),
            history_capacity,
            prune_empty: false,
            pinned_room: None,
            next_seq: 0,
        }
    }

    /// 空室の自動削除を有効にする（`pinned_room` は削除しない）
    pub fn with_pruning(mut self, pinned_room: Option<RoomName>) -> Self {
        self.prune_empty = true;
        self.pinned_room = pinned_room;
        self
    }

    fn ensure_room(&mut self, name: &RoomName) -> (&mut Room, bool) {
        let history_capacity = self.history_capacity;
        let next_seq = &mut self.next_seq;
        let mut created = false;
        let room = self.rooms.entry(name.clone()).or_insert_with(|| {
            created = true;
            let room = Room::new(name.clone(), *next_seq, history_capacity);
            *next_seq += 1;
            room
        });
        (room, created)
    }

    /// メンバーを追加する。ルームを新規作成した場合は true を返す。
    pub fn join(&mut self, name: &RoomName, connection_id: ConnectionId) -> bool {
        let (room, created) = self.ensure_room(name);
        room.add_member(connection_id);
        created
    }

    /// メンバーを取り除く。居なければ何もしない。
    pub fn leave(&mut self, name: &RoomName, connection_id: &ConnectionId) -> LeaveResult {
        let Some(room) = self.rooms.get_mut(name) else {
            return LeaveResult::default();
        };
        let removed = room.remove_member(connection_id);
        let pruned = removed
            && self.prune_empty
            && room.is_empty()
            && self.pinned_room.as_ref() != Some(name);
        if pruned {
            self.rooms.remove(name);
        }
        LeaveResult { removed, pruned }
    }

    /// 履歴に追加する（ルームが無ければ作る）。保存されたメッセージを返す。
    pub fn append_message(&mut self, message: ChatMessage) -> ChatMessage {
        let name = message.room.clone();
        let (room, _) = self.ensure_room(&name);
        room.append(message)
    }

    /// 履歴のスナップショット（古い順）。未知のルームは空。
    pub fn history(&self, name: &RoomName) -> Vec<ChatMessage> {
        self.rooms.get(name).map(Room::history).unwrap_or_default()
    }

    /// 全ルーム名（作成順）
    pub fn list_rooms(&self) -> Vec<RoomName> {
        let mut rooms: Vec<&Room> = self.rooms.values().collect();
        rooms.sort_by_key(|room| room.seq);
        rooms.into_iter().map(|room| room.name.clone()).collect()
    }

    pub fn members(&self, name: &RoomName) -> Vec<ConnectionId> {
        self.rooms
            .get(name)
            .map(|room| room.members.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn is_member(&self, name: &RoomName, connection_id: &ConnectionId) -> bool {
        self.rooms
            .get(name)
            .is_some_and(|room| room.has_member(connection_id))
    }

    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }
}
