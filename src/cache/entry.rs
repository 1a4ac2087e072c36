//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use chrono::{DateTime, Duration, Utc};

use crate::value::Value;

// == Cache Entry ==
/// A stored value plus its optional expiry instant.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// The stored value
    pub value: Value,
    /// Expiration instant, None = never expires
    pub expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    // == Constructor ==
    /// Creates an entry stamped against `now`.
    ///
    /// A zero `ttl` means the entry never expires. Callers reject negative
    /// TTLs before getting here.
    pub fn new(value: Value, ttl: Duration, now: DateTime<Utc>) -> Self {
        let expires_at = if ttl > Duration::zero() {
            now.checked_add_signed(ttl)
        } else {
            None
        };

        Self { value, expires_at }
    }

    // == Is Expired ==
    /// Checks whether the entry is no longer visible to readers.
    ///
    /// An entry is visible while `now < expires_at`, so it is expired from
    /// the expiry instant onwards.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    // == Is Sweepable ==
    /// Checks whether the background sweeper should remove the entry:
    /// it has an expiry strictly before `now`.
    pub fn is_sweepable(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expires) if expires < now)
    }

    // == Time To Live ==
    /// Returns remaining TTL, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(zero)` if the entry has expired
    /// - `Some(remaining)` if the entry has TTL and hasn't expired
    /// - `None` if the entry never expires
    pub fn ttl_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.expires_at
            .map(|expires| (expires - now).max(Duration::zero()))
    }
}
