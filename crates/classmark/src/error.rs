//! Error types for Classmark operations.
//!
//! This module provides the main error type [`ClassmarkError`] which wraps
//! the error conditions a host application sees from an
//! [`AnnotationSession`](crate::AnnotationSession).

use thiserror::Error;

use classmark_sync::SyncError;

/// The main error type for Classmark operations.
///
/// # Diagnostic Variants
///
/// The `InvalidModelStructure` variant carries the JSON source alongside the
/// sync diagnostics, so hosts can point at the offending location.
#[derive(Debug, Error)]
pub enum ClassmarkError {
    #[error("{err}")]
    InvalidModelStructure { err: SyncError, src: String },

    #[error("pre-annotation is unavailable: {0}")]
    CollaboratorUnavailable(String),

    #[error("pre-annotation was cancelled")]
    PreAnnotationCancelled,

    #[error("pre-annotation failed: {0}")]
    PreAnnotationFailed(String),
}

impl ClassmarkError {
    /// Create a new `InvalidModelStructure` error with the associated JSON.
    pub fn new_sync_error(err: SyncError, src: impl Into<String>) -> Self {
        Self::InvalidModelStructure {
            err,
            src: src.into(),
        }
    }
}
