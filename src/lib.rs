//! Mini Cache - a multi-store cache manager with TTL expiration
//!
//! Named stores behind one manager, typed reads with coercion, lazy
//! defaults, glob invalidation, and an in-memory driver with a background
//! sweeper. An optional HTTP front-end lives in [`api`].

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod convert;
pub mod error;
pub mod manager;
pub mod models;
pub mod store;
pub mod tasks;
pub mod value;

pub use api::AppState;
pub use cache::{CacheStats, MemoryStore};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, StoreConfig};
pub use convert::{convert, FromValue, Json, ToValue};
pub use error::{CacheError, Result};
pub use manager::{Cache, Fetched, Manager};
pub use store::Store;
pub use value::Value;
