//! ChatState: Connection Registry と Room Store の組
//!
//! 接続の「現在のルーム」とルームの「メンバー集合」は常に対になって更新される必要が
//! あります。両者を 1 つの構造体に閉じ込め、`&mut self` の操作 1 回で両方を書き換える
//! ことで、どちらか一方だけが更新された状態を外から観測できないようにしています。

use super::{
    entity::{ChatMessage, Connection, Member},
    error::DomainError,
    registry::ConnectionRegistry,
    room_store::RoomStore,
    value_object::{ConnectionId, MessageBody, Nickname, RoomName, Timestamp, UserId},
};

/// ルームから抜けた記録
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub room: RoomName,
    pub member: Member,
    /// 空室になり削除された
    pub room_pruned: bool,
}

/// `join` の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    pub room: RoomName,
    pub member: Member,
    /// 暗黙の leave（別のルームに居た場合）
    pub previous: Option<Departure>,
    /// 既に同じルームに居た
    pub already_member: bool,
    pub room_created: bool,
    /// join 時点の履歴スナップショット
    pub history: Vec<ChatMessage>,
}

/// 切断処理の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disconnection {
    pub connection: Connection,
    pub departure: Option<Departure>,
}

/// 受理されたメッセージと配信先
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    pub message: ChatMessage,
    pub recipients: Vec<ConnectionId>,
}

#[derive(Debug)]
pub struct ChatState {
    registry: ConnectionRegistry,
    rooms: RoomStore,
}

impl ChatState {
    pub fn new(registry: ConnectionRegistry, rooms: RoomStore) -> Self {
        Self { registry, rooms }
    }

    pub fn connect(&mut self, connection: Connection) -> Result<ConnectionId, DomainError> {
        self.registry.register(connection)
    }

    /// 接続を破棄し、所属ルームからも取り除く。二度目以降は `None`。
    pub fn disconnect(&mut self, id: &ConnectionId) -> Option<Disconnection> {
        let connection = self.registry.get(id)?.clone();
        let departure = match &connection.room {
            Some(room) => match self.detach(&connection, room) {
                Ok(departure) => Some(departure),
                Err(e) => {
                    tracing::error!("{}", e);
                    None
                }
            },
            None => None,
        };
        let connection = self.registry.unregister(id).unwrap_or(connection);
        Some(Disconnection {
            connection,
            departure,
        })
    }

    /// ルームに参加する。別のルームに居た場合は先にそこから抜ける。
    pub fn join(
        &mut self,
        id: &ConnectionId,
        room: RoomName,
    ) -> Result<JoinOutcome, DomainError> {
        let connection = self.connection_or_err(id)?.clone();
        let member = connection.as_member();

        if connection.room.as_ref() == Some(&room) {
            if !self.rooms.is_member(&room, id) {
                return Err(self.inconsistency(
                    id,
                    &room,
                    "registry points at a room that does not list it",
                ));
            }
            return Ok(JoinOutcome {
                history: self.rooms.history(&room),
                room,
                member,
                previous: None,
                already_member: true,
                room_created: false,
            });
        }

        let previous = match &connection.room {
            Some(previous_room) => Some(self.detach(&connection, previous_room)?),
            None => None,
        };

        let room_created = self.rooms.join(&room, *id);
        self.registry.set_room(id, Some(room.clone()))?;

        Ok(JoinOutcome {
            history: self.rooms.history(&room),
            room,
            member,
            previous,
            already_member: false,
            room_created,
        })
    }

    /// ルームから抜ける。そのルームに居なければ `Ok(None)`。
    pub fn leave(
        &mut self,
        id: &ConnectionId,
        room: &RoomName,
    ) -> Result<Option<Departure>, DomainError> {
        let connection = self.connection_or_err(id)?.clone();
        if connection.room.as_ref() != Some(room) {
            return Ok(None);
        }
        self.detach(&connection, room).map(Some)
    }

    /// メッセージを受理して履歴に積み、配信先（送信者を含むルーム全員）を返す
    pub fn post_message(
        &mut self,
        id: &ConnectionId,
        room: &RoomName,
        body: MessageBody,
        now: Timestamp,
    ) -> Result<PostedMessage, DomainError> {
        let connection = self.connection_or_err(id)?;
        if connection.room.as_ref() != Some(room) || !self.rooms.is_member(room, id) {
            return Err(DomainError::NotInRoom {
                connection_id: id.to_string(),
                room: room.to_string(),
            });
        }
        let message = ChatMessage::new(
            room.clone(),
            connection.user_id.clone(),
            connection.nickname.clone(),
            body,
            now,
        );
        let message = self.rooms.append_message(message);
        Ok(PostedMessage {
            message,
            recipients: self.rooms.members(room),
        })
    }

    pub fn update_identity(
        &mut self,
        id: &ConnectionId,
        user_id: Option<UserId>,
        nickname: Option<Nickname>,
    ) -> Result<Connection, DomainError> {
        self.registry
            .update_identity(id, user_id, nickname)
            .map(Connection::clone)
    }

    pub fn connection(&self, id: &ConnectionId) -> Option<&Connection> {
        self.registry.get(id)
    }

    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.registry.ids()
    }

    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    /// ルームのメンバー一覧（接続 ID 順）
    pub fn members(&self, room: &RoomName) -> Vec<Member> {
        self.rooms
            .members(room)
            .iter()
            .filter_map(|id| self.registry.get(id).map(Connection::as_member))
            .collect()
    }

    pub fn history(&self, room: &RoomName) -> Vec<ChatMessage> {
        self.rooms.history(room)
    }

    pub fn list_rooms(&self) -> Vec<RoomName> {
        self.rooms.list_rooms()
    }

    pub fn room_store(&self) -> &RoomStore {
        &self.rooms
    }

    /// Registry と RoomStore の双方向の整合を検査する
    pub fn verify(&self) -> Result<(), DomainError> {
        for connection in self.registry.iter() {
            if let Some(room) = &connection.room
                && !self.rooms.is_member(room, &connection.id)
            {
                return Err(DomainError::InternalInconsistency(format!(
                    "connection '{}' points at room '{}' but is not a member",
                    connection.id, room
                )));
            }
        }
        for room in self.rooms.rooms() {
            for member in &room.members {
                let pointer = self.registry.get(member).and_then(|c| c.room.as_ref());
                if pointer != Some(&room.name) {
                    return Err(DomainError::InternalInconsistency(format!(
                        "room '{}' lists connection '{}' whose current room is {:?}",
                        room.name, member, pointer
                    )));
                }
            }
        }
        Ok(())
    }

    fn connection_or_err(&self, id: &ConnectionId) -> Result<&Connection, DomainError> {
        self.registry
            .get(id)
            .ok_or_else(|| DomainError::ConnectionNotFound(id.to_string()))
    }

    /// RoomStore からの削除と Registry のポインタ解除を同時に行う
    fn detach(
        &mut self,
        connection: &Connection,
        room: &RoomName,
    ) -> Result<Departure, DomainError> {
        let result = self.rooms.leave(room, &connection.id);
        // Registry 側は必ず解除して、不整合を残さない
        self.registry.set_room(&connection.id, None)?;
        if !result.removed {
            return Err(self.inconsistency(
                &connection.id,
                room,
                "registry pointed at the room but the member set did not contain it",
            ));
        }
        Ok(Departure {
            room: room.clone(),
            member: connection.as_member(),
            room_pruned: result.pruned,
        })
    }

    fn inconsistency(&self, id: &ConnectionId, room: &RoomName, detail: &str) -> DomainError {
        let error = DomainError::InternalInconsistency(format!(
            "connection '{}' / room '{}': {}",
            id, room, detail
        ));
        tracing::error!("{}", error);
        error
    }
}
