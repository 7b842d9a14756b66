//! Shared utilities for the Hiroba workspace.
//!
//! - `time`: clock abstraction and epoch-millisecond timestamps
//! - `logger`: tracing subscriber setup for binaries

pub mod logger;
pub mod time;
