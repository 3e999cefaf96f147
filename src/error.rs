//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror.
//!
//! Construction is the only fallible surface of the crate: every lookup on a
//! missing or expired key is reported as `None`, not as an error.

use thiserror::Error;

// == Config Error Enum ==
/// Error returned when a cache is built from an invalid configuration.
///
/// Invalid configurations are rejected outright rather than corrected, so a
/// cache that constructs successfully always runs with exactly the settings
/// it was given.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A capacity bound of zero items was requested
    #[error("maximal item count must be at least 1 when bounded")]
    ZeroMaximalItemCount,
}

// == Result Type Alias ==
/// Convenience Result type for cache construction.
pub type Result<T> = std::result::Result<T, ConfigError>;
