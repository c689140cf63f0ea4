//! Error and diagnostic system for JSON synchronization.
//!
//! This module provides:
//! - Error codes grouped by the phase that detected the problem
//! - JSON pointers and source locations for locating the problem
//! - Severity levels, so consistency fixes can be reported as warnings
//! - A collector for accumulating several problems in one pass
//!
//! # Overview
//!
//! A single problem is a [`Diagnostic`]. Failed imports return a
//! [`SyncError`] wrapping every error-severity diagnostic found; successful
//! imports hand back their warnings alongside the model.
//!
//! # Example
//!
//! ```
//! # use classmark_sync::error::{Diagnostic, ErrorCode};
//!
//! let diag = Diagnostic::error("span [4, 4] is empty")
//!     .with_code(ErrorCode::E200)
//!     .with_pointer("/classes/0/span")
//!     .with_help("spans are [start, end] with start < end");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod severity;
mod sync_error;

pub(crate) use collector::DiagnosticCollector;

pub use diagnostic::{Diagnostic, Location};
pub use error_code::ErrorCode;
pub use severity::Severity;
pub use sync_error::SyncError;
