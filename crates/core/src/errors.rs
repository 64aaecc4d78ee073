//! Error types for the memdiff core library.
//!
//! Configuration problems have their own [`ConfigError`], and the top-level
//! [`DiffError`] unifies them with the two failure modes of an output pass:
//! synthesized text that the requested encoding cannot represent, and a sink
//! that refuses bytes.
//!
//! Tokenization, normalization and alignment are total functions and never
//! produce errors.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for every diff and merge entry point.
#[derive(Debug, Error)]
pub enum DiffError {
    /// Header, marker or notice text could not be expressed in the
    /// requested output encoding.
    #[error("cannot encode {text:?} as {encoding}")]
    Encoding {
        encoding: String,
        text: String,
    },

    /// The output sink rejected a write. Output already written is not
    /// rolled back.
    #[error("output sink error: {0}")]
    Io(#[from] std::io::Error),

    /// The supplied options were rejected before tokenization.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// TOML serialization error.
    #[error("configuration serialize error: {0}")]
    SerializeError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue {
        field: String,
        detail: String,
    },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
