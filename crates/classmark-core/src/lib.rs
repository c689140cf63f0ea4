//! Classmark Core Types and Definitions
//!
//! This crate provides the foundational types of the Classmark annotation
//! engine. It includes:
//!
//! - **Spans**: half-open character intervals ([`span::Span`])
//! - **Tags**: entity tags and relationship kinds ([`tag`] module)
//! - **Model**: the class / attribute / method / relationship graph ([`model`] module)
//! - **Span Index**: the "what is tagged where" lookup ([`span_index::SpanIndex`])
//! - **Errors**: recoverable mutation errors ([`error::ModelError`])

pub mod error;
pub mod model;
pub mod span;
pub mod span_index;
pub mod tag;

pub use error::ModelError;
pub use model::{AnnotationModel, Applied};
pub use span::Span;
pub use span_index::SpanIndex;
pub use tag::{EntityTag, RelationshipKind};
