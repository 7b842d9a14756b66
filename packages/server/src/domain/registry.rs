//! Connection Registry
//!
//! 接続中の全クライアントと、それぞれの現在のルームを保持します。
//! ルームのメンバー集合との整合は `ChatState` が保証します。

use std::collections::HashMap;

use super::{
    entity::Connection,
    error::DomainError,
    value_object::{ConnectionId, Nickname, RoomName, UserId},
};

#[derive(Debug)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, Connection>,
    max_connections: usize,
}

impl ConnectionRegistry {
    pub fn new(max_connections: usize) -> Self {
        Self {
            connections: HashMap::new(),
            max_connections,
        }
    }

    /// 接続を登録する。ルームは未設定のまま。
    pub fn register(&mut self, mut connection: Connection) -> Result<ConnectionId, DomainError> {
        if self.connections.len() >= self.max_connections {
            return Err(DomainError::ResourceExhausted(self.max_connections));
        }
        connection.room = None;
        let id = connection.id;
        self.connections.insert(id, connection);
        Ok(id)
    }

    /// 接続を削除する。未登録の ID に対しては何もしない。
    pub fn unregister(&mut self, id: &ConnectionId) -> Option<Connection> {
        self.connections.remove(id)
    }

    /// 現在のルームを書き換え、直前のルームを返す
    pub fn set_room(
        &mut self,
        id: &ConnectionId,
        room: Option<RoomName>,
    ) -> Result<Option<RoomName>, DomainError> {
        let connection = self
            .connections
            .get_mut(id)
            .ok_or_else(|| DomainError::ConnectionNotFound(id.to_string()))?;
        Ok(std::mem::replace(&mut connection.room, room))
    }

    /// メッセージ / typing のペイロードに載ってきた表示情報で更新する
    pub fn update_identity(
        &mut self,
        id: &ConnectionId,
        user_id: Option<UserId>,
        nickname: Option<Nickname>,
    ) -> Result<&Connection, DomainError> {
        let connection = self
            .connections
            .get_mut(id)
            .ok_or_else(|| DomainError::ConnectionNotFound(id.to_string()))?;
        if let Some(user_id) = user_id {
            connection.user_id = user_id;
        }
        if let Some(nickname) = nickname {
            connection.nickname = nickname;
        }
        Ok(connection)
    }

    pub fn get(&self, id: &ConnectionId) -> Option<&Connection> {
        self.connections.get(id)
    }

    pub fn ids(&self) -> Vec<ConnectionId> {
        self.connections.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
