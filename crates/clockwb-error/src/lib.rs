#![forbid(unsafe_code)]
//! Error types for clockwb.
//!
//! # Error Taxonomy
//!
//! Every cache operation returns [`CacheError`]. Errors fall into two groups:
//!
//! | Group | Variants | Raised by |
//! |-------|----------|-----------|
//! | Construction | `InvalidCapacity` | `ClockCache` constructors |
//! | Backing store | `Io`, `NotFound`, `ReadOnly`, `Backing` | `load` / `save` implementations |
//!
//! The cache never invents a store error of its own: whatever a store returns
//! from `load` or `save` is propagated unchanged to the caller of `get`,
//! `set`, or `flush`. [`CacheError::is_store_failure`] tells the two groups
//! apart.
//!
//! ## Design Constraints
//!
//! - `clockwb-error` has no dependency on the cache crate.
//! - All string payloads are owned (`String`) so errors can cross thread
//!   boundaries with the `SyncClockCache` wrapper.

use thiserror::Error;

/// Unified error type for all clockwb operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A cache was requested with zero slots.
    #[error("invalid capacity: {0} (must be > 0)")]
    InvalidCapacity(usize),

    /// Operating system I/O error (wraps `std::io::Error`).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing store holds no value for the requested key.
    #[error("not found: {0}")]
    NotFound(String),

    /// The backing store cannot accept writes.
    #[error("read-only backing store")]
    ReadOnly,

    /// Any other failure reported by a user-supplied `load` or `save`.
    #[error("backing store failure: {0}")]
    Backing(String),
}

impl CacheError {
    /// Whether this error originated in the backing store rather than in
    /// the cache itself.
    ///
    /// The match is exhaustive so a new variant has to be classified
    /// before it compiles.
    #[must_use]
    pub fn is_store_failure(&self) -> bool {
        match self {
            Self::InvalidCapacity(_) => false,
            Self::Io(_) | Self::NotFound(_) | Self::ReadOnly | Self::Backing(_) => true,
        }
    }
}

/// Result alias using `CacheError`.
pub type Result<T> = std::result::Result<T, CacheError>;
