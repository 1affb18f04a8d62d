//! Error types for the server binary.
//!
//! [`AppError`] wraps every failure mode during startup so `main` can
//! propagate with `?`.

/// Top-level error for the server binary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: covey_core::ConfigError,
    },

    /// The configured area layout was rejected.
    #[error("area layout error: {source}")]
    Layout {
        /// The underlying geometry error.
        #[from]
        source: covey_world::WorldError,
    },

    /// The music catalog HTTP client could not be built.
    #[error("music catalog client error: {message}")]
    Catalog {
        /// Description of the client failure.
        message: String,
    },

    /// The observer API failed to start.
    #[error("observer error: {source}")]
    Observer {
        /// The underlying startup error.
        #[from]
        source: covey_observer::StartupError,
    },

    /// Waiting for the shutdown signal failed.
    #[error("signal error: {message}")]
    Signal {
        /// Description of the signal failure.
        message: String,
    },
}
