//! Error types for GridVault
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using VaultError
pub type Result<T> = std::result::Result<T, VaultError>;

/// Unified error type for GridVault operations
#[derive(Debug, Error)]
pub enum VaultError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Lifecycle Errors
    // -------------------------------------------------------------------------
    /// Operation attempted on a handle that is not in the Open state.
    #[error("invalid handle: object is not open")]
    InvalidHandle,

    /// File create without overwrite on an existing target.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    // -------------------------------------------------------------------------
    // Namespace Errors
    // -------------------------------------------------------------------------
    /// Creation rejected: path collision, invalid shape, bad dataset
    /// options, duplicate attribute name, or a read-only container.
    #[error("create failed: {0}")]
    Create(String),

    /// Open of a missing file, path, or attribute name.
    #[error("not found: {0}")]
    NotFound(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    /// The container file is damaged: bad magic, unsupported version,
    /// checksum mismatch, or an undecodable catalog.
    #[error("container corrupted: {0}")]
    Corrupt(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Type Errors
    // -------------------------------------------------------------------------
    /// Raised only by the explicit `ensure_matches` check; reads never
    /// enforce it and convert silently.
    #[error("type mismatch: requested {requested}, stored {stored}")]
    TypeMismatch { requested: String, stored: String },
}
