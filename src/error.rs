//! Error types for BlockVault
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using VaultError
pub type Result<T> = std::result::Result<T, VaultError>;

/// Unified error type for BlockVault operations
#[derive(Debug, Error)]
pub enum VaultError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Lookup Errors
    // -------------------------------------------------------------------------
    #[error("Id not found")]
    NotFound,

    // -------------------------------------------------------------------------
    // Write Validation Errors
    // -------------------------------------------------------------------------
    #[error("Empty payload")]
    EmptyPayload,

    #[error("Payload of {len} bytes exceeds the block capacity of {max} bytes")]
    PayloadTooLarge { len: u64, max: u64 },

    // -------------------------------------------------------------------------
    // Capability Errors
    // -------------------------------------------------------------------------
    #[error("Operation not supported by this backend: {0}")]
    Unsupported(&'static str),
}
