//! In-process store and change feed

mod store;

pub use store::MemoryPostStore;
