//! Integration test utilities for the confession board
//!
//! Spawns a real gateway over the in-memory adapters and provides a small
//! WebSocket client plus a shared in-process board for viewer sessions.

pub mod helpers;

pub use helpers::*;
