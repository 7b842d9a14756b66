//! ルーム単位の通知
//!
//! 複数のユースケースで共通する配信（退室通知・メンバー一覧・ルーム一覧・入力中表示）を
//! まとめています。呼び出し側は `DeliverySequencer` のガードを保持していること。

use std::sync::Arc;

use crate::domain::{
    ChatRepository, Connection, ConnectionId, Departure, DomainError, MessagePusher, Nickname,
    Notification, PresenceRepository, RepositoryError, RoomName, Timestamp, TypingIndicator,
    UserId,
};

pub(crate) struct RoomNotifier {
    repository: Arc<dyn ChatRepository>,
    presence: Arc<dyn PresenceRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl RoomNotifier {
    pub(crate) fn new(
        repository: Arc<dyn ChatRepository>,
        presence: Arc<dyn PresenceRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            presence,
            message_pusher,
        }
    }

    /// ルームの現メンバーへ配信（`exclude` を除く）
    pub(crate) async fn to_room(
        &self,
        room: &RoomName,
        exclude: Option<&ConnectionId>,
        notification: &Notification,
    ) {
        let targets: Vec<ConnectionId> = self
            .repository
            .get_members(room)
            .await
            .into_iter()
            .map(|m| m.connection_id)
            .filter(|id| Some(id) != exclude)
            .collect();
        self.broadcast(targets, notification).await;
    }

    /// ルームのメンバー一覧を全メンバーへ配信
    pub(crate) async fn user_list(&self, room: &RoomName) {
        let users = self.repository.get_members(room).await;
        let targets = users.iter().map(|m| m.connection_id).collect();
        let notification = Notification::UserList {
            room: room.clone(),
            users,
        };
        self.broadcast(targets, &notification).await;
    }

    /// ルーム一覧を全接続へ配信
    pub(crate) async fn room_list(&self) {
        let rooms = self.repository.list_rooms().await;
        let targets = self.repository.get_all_connection_ids().await;
        self.broadcast(targets, &Notification::RoomList(rooms)).await;
    }

    /// 入力中表示を配信する。同じユーザー ID の接続（別タブ）と `sender` には送らない。
    pub(crate) async fn typing(
        &self,
        indicator: &TypingIndicator,
        is_typing: bool,
        sender: Option<&ConnectionId>,
    ) {
        let targets: Vec<ConnectionId> = self
            .repository
            .get_members(&indicator.room)
            .await
            .into_iter()
            .filter(|m| m.user_id != indicator.user_id && Some(&m.connection_id) != sender)
            .map(|m| m.connection_id)
            .collect();
        let notification = Notification::Typing {
            indicator: indicator.clone(),
            is_typing,
        };
        self.broadcast(targets, &notification).await;
    }

    /// 退室（leave / 別ルームへの join / 切断）を残ったメンバーへ知らせる
    pub(crate) async fn departure(&self, departure: &Departure, now: Timestamp) {
        let room = &departure.room;
        let member = &departure.member;
        let remaining = self.repository.get_members(room).await;

        // 同じユーザーが別の接続でまだ在室している場合は入力中表示を残す
        if !remaining.iter().any(|m| m.user_id == member.user_id)
            && let Some(indicator) = self.presence.clear_typing(room, &member.user_id).await
        {
            self.typing(&indicator, false, None).await;
        }

        self.to_room(room, None, &Notification::left(room.clone(), member, now))
            .await;
        self.user_list(room).await;

        if departure.room_pruned {
            tracing::info!("Room '{}' is empty and was removed", room);
            self.room_list().await;
        }
    }

    /// 接続が `room` に居ることを確かめる。居なければ `NotInRoom`。
    pub(crate) async fn ensure_member(
        &self,
        connection_id: &ConnectionId,
        room: &RoomName,
    ) -> Result<(), RepositoryError> {
        let connection = self
            .repository
            .get_connection(connection_id)
            .await
            .ok_or_else(|| DomainError::ConnectionNotFound(connection_id.to_string()))?;
        if connection.room.as_ref() != Some(room) {
            return Err(DomainError::NotInRoom {
                connection_id: connection_id.to_string(),
                room: room.to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// ペイロードで名乗られた表示名を反映する。変化があればメンバー一覧を配信する。
    pub(crate) async fn refresh_identity(
        &self,
        connection_id: &ConnectionId,
        user_id: Option<UserId>,
        nickname: Option<Nickname>,
    ) -> Result<Connection, RepositoryError> {
        let before = self.repository.get_connection(connection_id).await;
        if user_id.is_none() && nickname.is_none() {
            return before.ok_or_else(|| {
                DomainError::ConnectionNotFound(connection_id.to_string()).into()
            });
        }

        let after = self
            .repository
            .update_identity(connection_id, user_id, nickname)
            .await?;
        let changed = before
            .is_some_and(|b| b.user_id != after.user_id || b.nickname != after.nickname);
        if changed {
            tracing::debug!(
                "Connection '{}' is now '{}' ({})",
                connection_id,
                after.nickname,
                after.user_id
            );
            if let Some(room) = &after.room {
                self.user_list(room).await;
            }
        }
        Ok(after)
    }

    pub(crate) async fn push_to(&self, connection_id: &ConnectionId, notification: &Notification) {
        if let Err(e) = self.message_pusher.push_to(connection_id, notification).await {
            tracing::warn!(
                "Failed to push '{}' to connection '{}': {}",
                notification.kind(),
                connection_id,
                e
            );
        }
    }

    async fn broadcast(&self, targets: Vec<ConnectionId>, notification: &Notification) {
        if let Err(e) = self.message_pusher.broadcast(targets, notification).await {
            tracing::warn!("Failed to broadcast '{}': {}", notification.kind(), e);
        }
    }
}
