//! Cache configuration.

use clockwb_error::{CacheError, Result};
use serde::{Deserialize, Serialize};

/// What [`flush`](crate::ClockCache::flush) does with an entry after
/// writing it back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushMode {
    /// Save, then drop the entry from the cache. The slot becomes free.
    #[default]
    Evict,
    /// Save and mark clean; the entry stays resident.
    Retain,
}

/// Construction-time configuration for a [`ClockCache`](crate::ClockCache).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockCacheConfig {
    /// Number of slots. Fixed for the cache's lifetime. Must be > 0.
    /// Default: 1024.
    pub capacity: usize,
    /// Behavior of `flush` for written-back entries.
    /// Default: [`FlushMode::Evict`].
    pub flush_mode: FlushMode,
}

impl Default for ClockCacheConfig {
    fn default() -> Self {
        Self {
            capacity: 1024,
            flush_mode: FlushMode::Evict,
        }
    }
}

impl ClockCacheConfig {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn flush_mode(mut self, flush_mode: FlushMode) -> Self {
        self.flush_mode = flush_mode;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(CacheError::InvalidCapacity(self.capacity));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ClockCacheConfig::default();
        assert_eq!(config.capacity, 1024);
        assert_eq!(config.flush_mode, FlushMode::Evict);
        config.validate().expect("default config validates");
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = ClockCacheConfig::with_capacity(0).validate().unwrap_err();
        assert!(matches!(err, CacheError::InvalidCapacity(0)));
    }

    #[test]
    fn deserializes_with_missing_fields() {
        let config: ClockCacheConfig =
            serde_json::from_str(r#"{"flush_mode":"retain"}"#).expect("parse config");
        assert_eq!(config.capacity, 1024);
        assert_eq!(config.flush_mode, FlushMode::Retain);

        let config: ClockCacheConfig =
            serde_json::from_str(r#"{"capacity":8}"#).expect("parse config");
        assert_eq!(config, ClockCacheConfig::with_capacity(8));
    }
}
