//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of startup and of an
//! exerciser session so that `main` can attach context and propagate.

use dopewars_core::{AdminError, ConfigError, ServiceError};

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// Seeding markets or balances failed.
    #[error("admin error: {source}")]
    Admin {
        /// The underlying admin error.
        #[from]
        source: AdminError,
    },

    /// The turn service stopped answering.
    #[error("service error: {source}")]
    Service {
        /// The underlying service error.
        #[from]
        source: ServiceError,
    },

    /// The engine task panicked or was cancelled.
    #[error("engine task failed: {source}")]
    Join {
        /// The underlying join error.
        #[from]
        source: tokio::task::JoinError,
    },
}
