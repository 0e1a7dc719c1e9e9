//! # Error Types
//!
//! Custom error types for padscope using `thiserror`.
//!
//! Only startup paths surface these to the user. Everything on the per-frame
//! path degrades to neutral values instead of returning an error.

use thiserror::Error;

/// Main error type for padscope
#[derive(Debug, Error)]
pub enum PadscopeError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Model asset could not be parsed
    #[error("Asset error: {0}")]
    Asset(#[from] serde_json::Error),

    /// Malformed `#rrggbb` colour string
    #[error("Invalid paint value: {0}")]
    InvalidPaint(String),

    /// Input device errors
    #[error("Device error: {0}")]
    Device(String),

    /// Terminal or renderer errors
    #[error("Render error: {0}")]
    Render(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for padscope
pub type Result<T> = std::result::Result<T, PadscopeError>;
