//! The live annotation state: model, span index and highlights.

use log::trace;

use classmark_core::{AnnotationModel, Applied, EntityTag, ModelError, Span, SpanIndex};

use crate::{
    highlight::HighlightLayer,
    history::Snapshot,
};

/// The model together with the views derived from it.
///
/// Every method leaves the span index agreeing with the model.
#[derive(Debug, Clone, Default)]
pub(crate) struct AnnotationState {
    pub(crate) model: AnnotationModel,
    pub(crate) span_index: SpanIndex,
    pub(crate) highlights: HighlightLayer,
}

impl AnnotationState {
    /// Tag `span` as an entity.
    ///
    /// `owner` is the class span for attributes and methods and is ignored
    /// for classes. The span index is written before the model and rolled
    /// back if the model refuses the entity.
    ///
    /// # Errors
    ///
    /// - [`ModelError::DuplicateSpanConflict`] if `span` is tagged differently.
    /// - [`ModelError::OverlappingSpan`] if `span` partially covers a tagged span.
    /// - [`ModelError::NoContextClass`] if a member has no owner class.
    /// - Any error raised by the model itself.
    pub(crate) fn tag_entity(
        &mut self,
        tag: EntityTag,
        text: &str,
        span: Span,
        owner: Option<Span>,
        attribute_type: &str,
    ) -> Result<Applied, ModelError> {
        if let Some(entry) = self.span_index.get(span) {
            if entry.tag() == tag && entry.text() == text {
                return Ok(Applied::AlreadyPresent);
            }
            return Err(ModelError::DuplicateSpanConflict {
                span,
                existing_tag: entry.tag(),
                existing_text: entry.text().to_string(),
            });
        }
        if let Some(existing) = self.span_index.overlapping(span).next() {
            return Err(ModelError::OverlappingSpan { span, existing });
        }

        let owner_name = match tag {
            EntityTag::Class => None,
            EntityTag::Attribute | EntityTag::Method => {
                let owner = owner.ok_or(ModelError::NoContextClass)?;
                let class = self
                    .model
                    .class_at(owner)
                    .ok_or(ModelError::NoContextClass)?;
                Some((owner, class.name().to_string()))
            }
        };

        let owner_ref = owner_name.as_ref().map(|(_, name)| name.as_str());
        self.span_index.insert(span, tag, text, owner_ref)?;

        let added = match (tag, &owner_name) {
            (EntityTag::Class, _) => self.model.add_class(text, span),
            (EntityTag::Attribute, Some((owner, _))) => {
                self.model
                    .add_attribute_typed(text, span, *owner, attribute_type)
            }
            (EntityTag::Method, Some((owner, _))) => self.model.add_method(text, span, *owner),
            (_, None) => Err(ModelError::NoContextClass),
        };
        let applied = match added {
            Ok(applied) => applied,
            Err(err) => {
                self.span_index.remove(span);
                return Err(err);
            }
        };

        self.highlights.apply(span, tag);
        trace!(tag:% = tag, span:% = span, text; "Entity tagged");
        Ok(applied)
    }

    pub(crate) fn snapshot(&self, context_class: Option<Span>) -> Snapshot {
        Snapshot::new(self.model.clone(), self.span_index.clone(), context_class)
    }

    /// Install `snapshot` as the live state.
    ///
    /// The span index and highlights are rebuilt from the restored model.
    /// Returns the snapshot's context class if it still names a class.
    pub(crate) fn restore(&mut self, snapshot: Snapshot) -> Option<Span> {
        let (model, _, context_class) = snapshot.into_parts();
        self.replace_model(model);
        context_class.filter(|span| self.model.class_at(*span).is_some())
    }

    /// Replace the model and rebuild every derived view.
    pub(crate) fn replace_model(&mut self, model: AnnotationModel) {
        self.model = model;
        self.span_index.rebuild_from(&self.model);
        self.highlights.rebuild_from(&self.span_index);
    }

    pub(crate) fn clear(&mut self) {
        self.replace_model(AnnotationModel::new());
    }
}
