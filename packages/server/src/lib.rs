//! Hiroba: room-based real-time chat server.
//!
//! - `domain`: value objects, entities, connection registry, room store and typing tracker
//! - `usecase`: one use case per client event
//! - `infrastructure`: in-memory repositories, WebSocket pusher, wire DTOs
//! - `ui`: Axum router, WebSocket / HTTP handlers
//! - `app`: dependency wiring

pub mod app;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
