//! UseCase: 期限切れの入力中表示の掃除
//!
//! 入力中フラグは一定時間更新がなければ自動的に下ろし、
//! ルームのメンバーへ `isTyping: false` を配信します。

use std::sync::Arc;

use hiroba_shared::time::Clock;

use crate::domain::{
    ChatRepository, MessagePusher, PresenceRepository, Timestamp, TypingIndicator,
};

use super::{notifier::RoomNotifier, sequencer::DeliverySequencer};

pub struct ExpireTypingUseCase {
    presence: Arc<dyn PresenceRepository>,
    notifier: RoomNotifier,
    clock: Arc<dyn Clock>,
    sequencer: Arc<DeliverySequencer>,
}

impl ExpireTypingUseCase {
    pub fn new(
        repository: Arc<dyn ChatRepository>,
        presence: Arc<dyn PresenceRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
        sequencer: Arc<DeliverySequencer>,
    ) -> Self {
        Self {
            notifier: RoomNotifier::new(repository, presence.clone(), message_pusher),
            presence,
            clock,
            sequencer,
        }
    }

    /// 期限切れのフラグを下ろし、下ろしたものを返す
    pub async fn execute(&self) -> Vec<TypingIndicator> {
        let _guard = self.sequencer.acquire().await;
        let now = Timestamp::new(self.clock.now_millis());

        let expired = self.presence.expire_typing(now).await;
        for indicator in &expired {
            tracing::debug!(
                "Typing indicator of '{}' in room '{}' expired",
                indicator.user_id,
                indicator.room
            );
            self.notifier.typing(indicator, false, None).await;
        }

        expired
    }
}
