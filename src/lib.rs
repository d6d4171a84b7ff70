//! eventwatch - Game event watcher for scanner backends
//!
//! A polling daemon that follows a remote feed of time-boxed game events and
//! keeps a scanner's cached world state in sync with it: monster pools and
//! quest pools are reset exactly once per event boundary, spawn event windows
//! are reconciled into the scanner's system of record, and operators are
//! notified over chat channels.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`feed`] - HTTP client for the remote event feed
//! - [`classify`] - Raw feed records into typed event categories
//! - [`models`] - Core data structures and transition detection
//! - [`cache`] - Local event cache file for external inspection
//! - [`scanner`] - Scanner backends (database, management API, composite)
//! - [`notify`] - Operator notification channels
//! - [`coordinator`] - Reset coordination and spawn window reconciliation
//! - [`scheduler`] - The polling loop driving everything
//!
//! # Example
//!
//! ```no_run
//! use eventwatch::config::Config;
//! use eventwatch::scheduler::Watcher;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_file(std::path::Path::new("config.toml"))?;
//!     let watcher = Watcher::connect(config).await?;
//!     watcher.run().await?;
//!     Ok(())
//! }
//! ```

// Initialize rust-i18n at crate root level
rust_i18n::i18n!("locales", fallback = "en");

pub mod cache;
pub mod classify;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod feed;
pub mod models;
pub mod notify;
pub mod scanner;
pub mod scheduler;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::classify::{Classifier, EventCategories};
    pub use crate::config::Config;
    pub use crate::coordinator::ResetCoordinator;
    pub use crate::error::{Error, Result};
    pub use crate::models::{GameEvent, RemoteWindow, TickWindow};
    pub use crate::scanner::ScannerBackend;
    pub use crate::scheduler::Watcher;
}

// Direct re-exports for convenience
pub use models::{GameEvent, RemoteWindow, TickWindow};
