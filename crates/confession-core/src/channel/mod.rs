//! Subscription primitives shared by every channel adapter
//!
//! A [`Subscription`] is the unsubscribe handle: dropping or closing it releases the
//! subscriber, and a producer that loses its transport drops the sending side so the
//! subscriber observes `None`.

mod fanout;
mod subscription;

pub use fanout::Fanout;
pub use subscription::Subscription;
