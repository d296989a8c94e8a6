//! Error types for WaveFit

use thiserror::Error;

/// WaveFit error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Exact-match axis lookup called with a value absent from the axis.
    ///
    /// Always a caller bug: off-grid vectors must go through `nearest`
    /// snapping or interpolation instead.
    #[error("Lookup miss: {0}")]
    Lookup(String),

    /// A grid coordinate has no corresponding simulation output.
    ///
    /// Surfaced at build time; the error grid is never left with
    /// silently defaulted cells.
    #[error("Configuration mismatch: {0}")]
    ConfigurationMismatch(String),

    /// Persisted error-grid cache unreadable or inconsistent with its key.
    #[error("Cache error: {0}")]
    Cache(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
