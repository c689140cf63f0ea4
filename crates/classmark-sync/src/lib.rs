//! JSON Sync Bridge for Classmark annotation models.
//!
//! This crate converts an [`AnnotationModel`](classmark_core::AnnotationModel)
//! to and from its JSON form:
//!
//! ```json
//! {
//!   "classes": [{"name": "User", "span": [2, 6], "attributes": [], "methods": []}],
//!   "relationships": []
//! }
//! ```
//!
//! Spans travel as two-element `[start, end]` arrays. Parsing is strict: a
//! document is either accepted as a whole, possibly with warnings for the
//! normalizations applied, or rejected with a [`SyncError`] listing every
//! problem found. A rejected document never produces a partial model.
//!
//! # Example
//!
//! ```
//! use classmark_core::{AnnotationModel, Span};
//!
//! let mut model = AnnotationModel::new();
//! model.add_class("User", Span::new(2..6)).unwrap();
//!
//! let json = classmark_sync::to_json(&model);
//! let parsed = classmark_sync::parse_model(&json).unwrap();
//! assert_eq!(parsed.model, model);
//! ```

pub mod document;
pub mod error;

mod reader;
mod validate;
mod writer;

pub use error::{Diagnostic, ErrorCode, Location, Severity, SyncError};
pub use reader::{ParsedEnvelope, ParsedModel, parse_envelope, parse_model};
pub use writer::{ExportOptions, export_envelope, to_json, to_json_pretty};
