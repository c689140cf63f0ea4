//! Errors raised by annotation model and span index mutations.
//!
//! Every variant is recoverable: the rejected operation leaves the model
//! untouched and the caller decides how to inform the user.

use thiserror::Error;

use crate::{span::Span, tag::EntityTag};

/// A rejected mutation of the annotation model or span index.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("span {span} is already tagged as {existing_tag} `{existing_text}`")]
    DuplicateSpanConflict {
        span: Span,
        existing_tag: EntityTag,
        existing_text: String,
    },

    #[error("span {span} overlaps the tagged span {existing}")]
    OverlappingSpan { span: Span, existing: Span },

    #[error("class `{name}` at {span} collides with the class at {existing}")]
    DuplicateEntity {
        name: String,
        span: Span,
        existing: Span,
    },

    #[error("class already has a {existing} at {span}")]
    EntityKindConflict { span: Span, existing: EntityTag },

    #[error("no context class selected; tag or select a CLASS first")]
    NoContextClass,

    #[error("{span} is not a tagged CLASS")]
    NotAClass { span: Span },

    #[error("cannot relate the class at {span} to itself")]
    SelfRelationshipRejected { span: Span },

    #[error("relationship endpoint {span} does not resolve to a class")]
    UnresolvedEndpoint { span: Span },
}
