//! Infrastructure 層
//!
//! - `repository`: Repository trait のインメモリ実装
//! - `message_pusher`: MessagePusher trait の WebSocket 実装
//! - `dto`: ワイヤーフォーマット（JSON）とドメインモデルの変換

pub mod dto;
pub mod message_pusher;
pub mod repository;
