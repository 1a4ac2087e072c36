//! Cache Module
//!
//! Provides the in-process store with TTL expiration and pattern deletion.

mod entry;
mod pattern;
mod stats;
mod store;


// Re-export public types
pub use entry::Entry;
pub use pattern::KeyPattern;
pub use stats::CacheStats;
pub use store::MemoryStore;

pub(crate) use store::StoreInner;
