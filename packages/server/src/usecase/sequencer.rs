//! 配信順序の直列化
//!
//! 状態の変更とファンアウトを 1 つのクリティカルセクションで行うことで、
//! 全ての受信者が同じ順序でイベントを受け取るようにします。

use tokio::sync::{Mutex, MutexGuard};

/// 状態変更 + 配信を直列化するロック
#[derive(Debug, Default)]
pub struct DeliverySequencer {
    lock: Mutex<()>,
}

impl DeliverySequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// ガードを保持している間、他のユースケースは状態変更と配信を行えない
    pub async fn acquire(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().await
    }
}
