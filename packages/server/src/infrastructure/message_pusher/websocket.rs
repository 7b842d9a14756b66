//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - 接続ごとの送信キュー（上限付き `mpsc::Sender`）を管理
//! - `Notification` を JSON にシリアライズしてキューへ積む（push_to, broadcast）
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は生成された sender を受け取り、メッセージ送信に使用します。
//!
//! キューへの投入は `try_send` で行い、送信側が待たされることはありません。
//! キューが溢れた接続は sender を破棄して切り離します。sender が破棄されると
//! 受信側（送信タスク）が終了し、通常の切断処理に合流します。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc::error::TrySendError};

use crate::{
    domain::{ConnectionId, MessagePushError, MessagePusher, Notification, PusherChannel},
    infrastructure::dto::websocket::ServerEvent,
};

/// WebSocket を使った MessagePusher 実装
pub struct WebSocketMessagePusher {
    /// 接続中のクライアントの送信キュー
    clients: Arc<Mutex<HashMap<ConnectionId, PusherChannel>>>,
}

impl WebSocketMessagePusher {
    /// 新しい WebSocketMessagePusher を作成
    pub fn new(clients: Arc<Mutex<HashMap<ConnectionId, PusherChannel>>>) -> Self {
        Self { clients }
    }

    fn encode(notification: &Notification) -> Result<String, MessagePushError> {
        serde_json::to_string(&ServerEvent::from(notification))
            .map_err(|e| MessagePushError::Serialization(e.to_string()))
    }

    /// キューへ積む。溢れた・閉じたキューは登録を解除する。
    fn deliver(
        clients: &mut HashMap<ConnectionId, PusherChannel>,
        connection_id: &ConnectionId,
        payload: String,
    ) -> Result<(), MessagePushError> {
        let Some(sender) = clients.get(connection_id) else {
            return Err(MessagePushError::ClientNotFound(connection_id.to_string()));
        };

        match sender.try_send(payload) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                clients.remove(connection_id);
                tracing::warn!(
                    "Outbound queue of '{}' is full, disconnecting slow client",
                    connection_id
                );
                Err(MessagePushError::QueueFull(connection_id.to_string()))
            }
            Err(TrySendError::Closed(_)) => {
                clients.remove(connection_id);
                Err(MessagePushError::Closed(connection_id.to_string()))
            }
        }
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel) {
        let mut clients = self.clients.lock().await;
        clients.insert(connection_id, sender);
        tracing::debug!("Connection '{}' registered to MessagePusher", connection_id);
    }

    async fn unregister_client(&self, connection_id: &ConnectionId) {
        let mut clients = self.clients.lock().await;
        clients.remove(connection_id);
        tracing::debug!(
            "Connection '{}' unregistered from MessagePusher",
            connection_id
        );
    }

    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        notification: &Notification,
    ) -> Result<(), MessagePushError> {
        let payload = Self::encode(notification)?;
        let mut clients = self.clients.lock().await;
        Self::deliver(&mut clients, connection_id, payload)?;
        tracing::debug!(
            "Pushed '{}' to connection '{}'",
            notification.kind(),
            connection_id
        );
        Ok(())
    }

    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        notification: &Notification,
    ) -> Result<(), MessagePushError> {
        if targets.is_empty() {
            return Ok(());
        }
        let payload = Self::encode(notification)?;
        let mut clients = self.clients.lock().await;

        for target in targets {
            // ブロードキャストでは一部の送信失敗を許容
            match Self::deliver(&mut clients, &target, payload.clone()) {
                Ok(()) => {
                    tracing::debug!(
                        "Broadcasted '{}' to connection '{}'",
                        notification.kind(),
                        target
                    );
                }
                Err(MessagePushError::ClientNotFound(_)) => {
                    tracing::warn!("Connection '{}' not found during broadcast, skipping", target);
                }
                Err(e) => {
                    tracing::warn!("Failed to push message to connection '{}': {}", target, e);
                }
            }
        }

        Ok(())
    }
}
