//! Configuration Module
//!
//! Server configuration loaded from environment variables, and the
//! per-store configuration used by the in-process driver.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::{Clock, SystemClock};

/// Default sweeper interval for in-process stores.
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Sweeper interval in seconds for the in-process store (0 disables it)
    pub cleanup_interval: u64,
    /// Alias the in-process store is registered under
    pub store_alias: String,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Sweeper interval in seconds (default: 600)
    /// - `STORE_ALIAS` - Alias of the in-process store (default: "memory")
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            cleanup_interval: env::var("CLEANUP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cleanup_interval),
            store_alias: env::var("STORE_ALIAS")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.store_alias),
        }
    }

    /// Store configuration derived from the server settings.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::default().with_cleanup_interval(Duration::from_secs(self.cleanup_interval))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL.as_secs(),
            store_alias: "memory".to_string(),
        }
    }
}

/// Configuration for an in-process store.
///
/// ```rust
/// use mini_cache::StoreConfig;
/// use std::time::Duration;
///
/// let config = StoreConfig::default()
///     .with_cleanup_interval(Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Interval between sweeper runs; zero disables the sweeper
    pub cleanup_interval: Duration,
    /// Time source for stamping and checking expiry
    pub clock: Arc<dyn Clock>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
            clock: Arc::new(SystemClock),
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    /// Replaces the time source, typically with a `ManualClock` in tests.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}
