//! The tagging state machine.
//!
//! [`TaggingContext`] turns word clicks into model mutations according to the
//! active [`TagMode`]:
//!
//! ```text
//! Idle ──click CLASS──────────────► select context class
//! Entity(CLASS) ──click──────────► add class
//! Entity(ATTRIBUTE|METHOD)
//!     ──click CLASS──────────────► select context class
//!     ──click, context set───────► add member to context class
//!     ──click, no context────────► abort, back to Idle
//! Relationship { from: None } ───click CLASS──► from = class
//! Relationship { from: Some } ───click CLASS──► add relationship, from = None
//! ```
//!
//! A click hits the narrowest tagged span containing its start offset.

use log::{debug, warn};

use classmark_core::{Applied, EntityTag, ModelError, RelationshipKind, Span};

use crate::{highlight::Highlight, state::AnnotationState};

/// The active tagging mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TagMode {
    /// No tag selected; clicks on classes select the context class.
    #[default]
    Idle,
    /// Clicks tag words as entities.
    Entity(EntityTag),
    /// Clicks pick the FROM and then the TO class of a relationship.
    Relationship {
        kind: RelationshipKind,
        from: Option<Span>,
    },
}

/// What a word click did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// The clicked class became the context class.
    ContextSelected { span: Span, name: String },
    /// An entity was tagged, or was already tagged identically.
    EntityTagged {
        tag: EntityTag,
        span: Span,
        applied: Applied,
    },
    /// The FROM endpoint of a relationship was picked.
    RelationshipStarted { from: Span, name: String },
    /// A relationship was recorded, or already existed.
    RelationshipAdded {
        kind: RelationshipKind,
        from: String,
        to: String,
        applied: Applied,
    },
    /// The click was refused; the model is unchanged.
    Rejected(ModelError),
    /// The click had no effect.
    Ignored,
}

impl SelectionOutcome {
    /// Returns `true` if the model was changed.
    pub fn is_mutation(&self) -> bool {
        match self {
            SelectionOutcome::EntityTagged { applied, .. }
            | SelectionOutcome::RelationshipAdded { applied, .. } => applied.is_inserted(),
            _ => false,
        }
    }

    /// Returns `true` for outcomes that leave no trace in history.
    pub fn is_abort(&self) -> bool {
        matches!(
            self,
            SelectionOutcome::Rejected(_) | SelectionOutcome::Ignored
        )
    }
}

/// Ephemeral tagging state, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaggingContext {
    mode: TagMode,
    context_class: Option<Span>,
}

impl TaggingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> TagMode {
        self.mode
    }

    /// The class new attributes and methods attach to.
    pub fn context_class(&self) -> Option<Span> {
        self.context_class
    }

    pub(crate) fn set_context_class(&mut self, span: Option<Span>) {
        self.context_class = span;
    }

    /// Enter entity tagging. An existing context class is kept.
    pub(crate) fn set_tag_mode(&mut self, tag: EntityTag, state: &mut AnnotationState) {
        self.mode = TagMode::Entity(tag);
        match self.context_class {
            Some(span) if tag.needs_owner() => state.highlights.set_overlay(span, Highlight::Context),
            _ => state.highlights.clear_overlay(),
        }
        debug!(tag:% = tag; "Tag mode selected");
    }

    /// Enter relationship tagging with empty endpoint slots.
    pub(crate) fn set_relationship_mode(
        &mut self,
        kind: RelationshipKind,
        state: &mut AnnotationState,
    ) {
        self.mode = TagMode::Relationship { kind, from: None };
        state.highlights.clear_overlay();
        debug!(kind:% = kind; "Relationship mode selected");
    }

    pub(crate) fn reset_mode(&mut self, state: &mut AnnotationState) {
        self.mode = TagMode::Idle;
        state.highlights.clear_overlay();
    }

    /// Forget the mode, the endpoint slots and the context class.
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    /// Apply a click on `word` at `span`.
    pub(crate) fn handle_selection(
        &mut self,
        word: &str,
        span: Span,
        state: &mut AnnotationState,
        attribute_type: &str,
    ) -> SelectionOutcome {
        let hit_class = state
            .span_index
            .lookup_containing(span.start())
            .filter(|(_, entry)| entry.tag() == EntityTag::Class)
            .map(|(hit, entry)| (hit, entry.text().to_string()));

        let outcome = match self.mode {
            TagMode::Idle => match hit_class {
                Some((hit, name)) => self.select_context(hit, name, state),
                None => SelectionOutcome::Ignored,
            },
            TagMode::Entity(EntityTag::Class) => {
                self.tag(EntityTag::Class, word, span, state, attribute_type)
            }
            TagMode::Entity(tag) => match (hit_class, self.context_class) {
                (Some((hit, name)), _) => self.select_context(hit, name, state),
                (None, Some(_)) => self.tag(tag, word, span, state, attribute_type),
                (None, None) => {
                    self.mode = TagMode::Idle;
                    state.highlights.clear_overlay();
                    SelectionOutcome::Rejected(ModelError::NoContextClass)
                }
            },
            TagMode::Relationship { kind, from } => {
                self.relate(kind, from, span, hit_class, state)
            }
        };

        if let SelectionOutcome::Rejected(err) = &outcome {
            warn!(word, span:% = span, err:%; "Selection rejected");
        }
        outcome
    }

    fn select_context(
        &mut self,
        span: Span,
        name: String,
        state: &mut AnnotationState,
    ) -> SelectionOutcome {
        self.context_class = Some(span);
        state.highlights.set_overlay(span, Highlight::Context);
        debug!(span:% = span, name = name.as_str(); "Context class selected");
        SelectionOutcome::ContextSelected { span, name }
    }

    fn tag(
        &mut self,
        tag: EntityTag,
        word: &str,
        span: Span,
        state: &mut AnnotationState,
        attribute_type: &str,
    ) -> SelectionOutcome {
        match state.tag_entity(tag, word, span, self.context_class, attribute_type) {
            Ok(applied) => SelectionOutcome::EntityTagged { tag, span, applied },
            Err(err) => SelectionOutcome::Rejected(err),
        }
    }

    fn relate(
        &mut self,
        kind: RelationshipKind,
        from: Option<Span>,
        span: Span,
        hit_class: Option<(Span, String)>,
        state: &mut AnnotationState,
    ) -> SelectionOutcome {
        let Some((to, to_name)) = hit_class else {
            return SelectionOutcome::Rejected(ModelError::NotAClass { span });
        };

        let Some(from) = from else {
            self.mode = TagMode::Relationship {
                kind,
                from: Some(to),
            };
            state
                .highlights
                .set_overlay(to, Highlight::RelationshipSource(kind));
            return SelectionOutcome::RelationshipStarted { from: to, name: to_name };
        };

        if from == to {
            // The FROM slot stays filled so a different TO can still be picked.
            return SelectionOutcome::Rejected(ModelError::SelfRelationshipRejected { span: to });
        }

        let from_name = match state.model.class_at(from) {
            Some(class) => class.name().to_string(),
            None => {
                self.mode = TagMode::Relationship { kind, from: None };
                state.highlights.clear_overlay();
                return SelectionOutcome::Rejected(ModelError::UnresolvedEndpoint { span: from });
            }
        };

        let result = state
            .model
            .add_relationship(&from_name, &to_name, kind, from, to);
        self.mode = TagMode::Relationship { kind, from: None };
        state.highlights.clear_overlay();
        match result {
            Ok(applied) => SelectionOutcome::RelationshipAdded {
                kind,
                from: from_name,
                to: to_name,
                applied,
            },
            Err(err) => SelectionOutcome::Rejected(err),
        }
    }
}
