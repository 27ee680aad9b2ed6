//! Error types for cuebox
//!
//! Defines subsystem-specific error types using thiserror for clear error
//! propagation. Every error is local to the call that produced it; no
//! global error state, and a failed request never disturbs unrelated
//! channels or the catalog.

use thiserror::Error;

/// Main error type for the audio subsystem
#[derive(Error, Debug)]
pub enum Error {
    /// Requested name is absent from the catalog
    #[error("sound not found: {0}")]
    NotFound(String),

    /// Catalog construction saw the same name twice
    #[error("duplicate sound name: {0}")]
    DuplicateName(String),

    /// Every voice is busy and the request was not marked important
    #[error("sound-effect voice pool exhausted")]
    PoolExhausted,

    /// Configuration loading or validation errors
    #[error("configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using cuebox Error
pub type Result<T> = std::result::Result<T, Error>;
