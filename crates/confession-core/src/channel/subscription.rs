//! Receiving end of a channel subscription

use tokio::sync::mpsc;

/// A live subscription to a change feed or broadcast topic
#[derive(Debug)]
pub struct Subscription<T> {
    rx: mpsc::Receiver<T>,
    source: &'static str,
}

impl<T> Subscription<T> {
    /// Wrap an existing receiver
    pub fn new(rx: mpsc::Receiver<T>, source: &'static str) -> Self {
        Self { rx, source }
    }

    /// Create a bounded sender/subscription pair
    pub fn channel(buffer: usize, source: &'static str) -> (mpsc::Sender<T>, Self) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (tx, Self::new(rx, source))
    }

    /// Wait for the next item; `None` once the producer is gone or the
    /// subscription was closed and drained
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Take an already queued item without waiting
    pub fn try_recv(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Stop accepting new items; queued items can still be drained
    pub fn close(&mut self) {
        self.rx.close();
    }

    /// Name of the producing channel (for logs)
    pub fn source(&self) -> &'static str {
        self.source
    }
}
