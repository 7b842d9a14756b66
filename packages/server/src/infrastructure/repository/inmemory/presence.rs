//! InMemory Presence Repository 実装

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    PresenceRepository, RoomName, Timestamp, TypingChange, TypingIndicator, TypingTracker, UserId,
};

/// `TypingTracker` を Mutex で保護した PresenceRepository 実装
pub struct InMemoryPresenceRepository {
    tracker: Arc<Mutex<TypingTracker>>,
}

impl InMemoryPresenceRepository {
    pub fn new(tracker: Arc<Mutex<TypingTracker>>) -> Self {
        Self { tracker }
    }
}

#[async_trait]
impl PresenceRepository for InMemoryPresenceRepository {
    async fn set_typing(
        &self,
        indicator: TypingIndicator,
        is_typing: bool,
        now: Timestamp,
    ) -> TypingChange {
        let mut tracker = self.tracker.lock().await;
        tracker.set_typing(
            indicator.room,
            indicator.user_id,
            indicator.nickname,
            is_typing,
            now,
        )
    }

    async fn clear_typing(&self, room: &RoomName, user_id: &UserId) -> Option<TypingIndicator> {
        let mut tracker = self.tracker.lock().await;
        tracker.clear(room, user_id)
    }

    async fn expire_typing(&self, now: Timestamp) -> Vec<TypingIndicator> {
        let mut tracker = self.tracker.lock().await;
        tracker.expire(now)
    }

    async fn active_typists(&self, room: &RoomName, now: Timestamp) -> Vec<TypingIndicator> {
        let tracker = self.tracker.lock().await;
        tracker.active(room, now)
    }
}
