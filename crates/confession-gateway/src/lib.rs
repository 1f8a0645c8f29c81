//! # confession-gateway
//!
//! WebSocket relay for the confession board. Each joined connection receives
//! the post snapshot, then every row change and every like/reaction broadcast
//! as sequenced dispatch events. Viewers publish broadcasts through the same
//! socket.

pub mod connection;
pub mod events;
pub mod handlers;
pub mod protocol;
pub mod server;

pub use server::{create_app, create_gateway_state, run, serve, GatewaySettings, GatewayState};
