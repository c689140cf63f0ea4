//! The SyncError type for wrapping import diagnostics.
//!
//! [`SyncError`] wraps one or more error [`Diagnostic`]s found while reading
//! a JSON document (syntax, structure, span shape, or consistency).

use std::fmt;

use crate::error::Diagnostic;

/// Error type for a rejected JSON document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncError {
    diagnostics: Vec<Diagnostic>,
}

impl SyncError {
    /// Create a new sync error from diagnostics.
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    /// Get all diagnostics in this error.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(first) = self.diagnostics.first() {
            write!(f, "{}", first)?;
            if self.diagnostics.len() > 1 {
                write!(f, " (+{} more)", self.diagnostics.len() - 1)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for SyncError {}

impl From<Diagnostic> for SyncError {
    fn from(diagnostic: Diagnostic) -> Self {
        Self {
            diagnostics: vec![diagnostic],
        }
    }
}
