//! Classmark - an annotation state engine for tagging object models in text.
//!
//! A host loads a piece of natural-language text into an
//! [`AnnotationSession`] and reports word clicks to it. Depending on the
//! selected tag the session records classes, attributes, methods and
//! relationships, keeps a span index and highlight layer in step with the
//! model, and records every change in an undo history. The model can be
//! exported to and re-synchronized from JSON, or rebuilt wholesale from the
//! output of an external [`Analyzer`](preannotate::Analyzer).

pub mod config;
pub mod highlight;
pub mod history;
pub mod preannotate;
pub mod tagging;
pub mod text;

mod error;
mod session;
mod state;

pub use classmark_core::{
    AnnotationModel, Applied, EntityTag, ModelError, RelationshipKind, Span, SpanIndex, model,
};
pub use classmark_sync::{Diagnostic, SyncError};

pub use error::ClassmarkError;
pub use session::AnnotationSession;
