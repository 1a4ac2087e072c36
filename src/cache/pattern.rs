//! Key Pattern Module
//!
//! Compiles glob-style key patterns into anchored matchers. `*` matches any
//! run of characters (including none); every other character is literal.

use regex::Regex;

use crate::error::{CacheError, Result};

/// A compiled key pattern.
#[derive(Debug, Clone)]
pub struct KeyPattern {
    regex: Option<Regex>,
}

impl KeyPattern {
    /// Compiles `pattern`. An empty pattern compiles to a matcher that
    /// matches nothing.
    pub fn compile(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Ok(Self { regex: None });
        }

        let body = pattern
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");

        let regex = Regex::new(&format!("^(?s:{})$", body)).map_err(|source| {
            CacheError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            }
        })?;

        Ok(Self { regex: Some(regex) })
    }

    pub fn matches(&self, key: &str) -> bool {
        self.regex.as_ref().is_some_and(|re| re.is_match(key))
    }

    /// True when the pattern can never match a key.
    pub fn is_empty(&self) -> bool {
        self.regex.is_none()
    }
}
