//! Redis Pub/Sub module.
//!
//! Publishes broadcast messages and listens for them on dedicated connections.

mod channels;
mod publisher;
mod subscriber;

pub use channels::{PubSubChannel, BROADCAST_PREFIX};
pub use publisher::Publisher;
pub use subscriber::{
    ReceivedMessage, SubscriberBuilder, SubscriberConfig, SubscriberError, SubscriberResult,
};
