//! Data Transfer Objects (DTOs) for the chat server.
//!
//! - `websocket`: JSON events exchanged over the WebSocket
//! - `http`: HTTP API response DTOs
//! - `conversion`: domain model → DTO

pub mod conversion;
pub mod http;
pub mod websocket;
