//! Outcome of a lazy-default read.

use crate::error::{CacheError, Result};

/// Result of [`Cache::get_or_set`](crate::Cache::get_or_set).
///
/// Populating the cache is best effort: when the producer succeeded but the
/// write failed, the value is still handed back together with the write
/// error.
#[derive(Debug)]
pub enum Fetched<T> {
    /// Served from the cache
    Hit(T),
    /// Produced and written to the cache
    Populated(T),
    /// Produced, but writing it to the cache failed
    Unsaved { value: T, error: CacheError },
}

impl<T> Fetched<T> {
    pub fn value(&self) -> &T {
        match self {
            Fetched::Hit(value) | Fetched::Populated(value) => value,
            Fetched::Unsaved { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        self.into_parts().0
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, Fetched::Hit(_))
    }

    /// The write error, if populating the cache failed.
    pub fn set_error(&self) -> Option<&CacheError> {
        match self {
            Fetched::Unsaved { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Splits into the value and the write error, if any.
    pub fn into_parts(self) -> (T, Option<CacheError>) {
        match self {
            Fetched::Hit(value) | Fetched::Populated(value) => (value, None),
            Fetched::Unsaved { value, error } => (value, Some(error)),
        }
    }

    /// Treats a failed write as a failure, discarding the produced value.
    pub fn into_result(self) -> Result<T> {
        match self.into_parts() {
            (_, Some(error)) => Err(error),
            (value, None) => Ok(value),
        }
    }
}
