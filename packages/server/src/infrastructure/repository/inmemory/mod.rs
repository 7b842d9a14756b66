//! インメモリ Repository 実装
//!
//! プロセス起動時は空の状態から始まり、永続化は行いません。

mod chat;
mod presence;

pub use chat::InMemoryChatRepository;
pub use presence::InMemoryPresenceRepository;
