//! Unified error handling for the eventwatch crate
//!
//! Domain-specific errors live next to their modules ([`FeedError`],
//! [`ScannerError`], [`ChannelError`]); this module consolidates them into a
//! single [`Error`] enum for use across module boundaries.

use std::io;
use thiserror::Error;

// Re-export domain-specific errors for convenience
pub use crate::feed::FeedError;
pub use crate::notify::ChannelError;
pub use crate::scanner::ScannerError;

/// Unified error type for the eventwatch crate
#[derive(Error, Debug)]
pub enum Error {
    /// Event feed errors (network, decoding)
    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),

    /// Scanner backend errors
    #[error("Scanner error: {0}")]
    Scanner(#[from] ScannerError),

    /// Notification channel errors
    #[error("Notification error: {0}")]
    Notify(#[from] ChannelError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether a retry on the next tick may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Feed(_) | Self::Scanner(_) | Self::Notify(_) | Self::Io(_) => true,
            Self::Json(_) | Self::Config(_) => false,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
