//! Per-viewer derived state: the ordered feed and displayed counters

mod aggregation;
mod feed;

pub use aggregation::{AggregationState, Applied, Incoming, PostCounters};
pub use feed::Feed;
