//! Cache error types.

use thiserror::Error;

use crate::config::ConfigFileError;

/// Errors raised when building a cache.
///
/// Fetch and loader failures are not wrapped; they reach the caller with the
/// error type of the closure or loader that produced them.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Configuration values that cannot be used
    #[error("Invalid cache configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigFileError),
}
