//! Background Tasks Module
//!
//! Contains background tasks owned by stores for their lifetime.
//!
//! # Tasks
//! - Sweeper: Removes expired entries at the configured interval

mod sweeper;

pub use sweeper::SweeperHandle;
pub(crate) use sweeper::spawn_sweeper;
