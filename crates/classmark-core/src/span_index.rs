//! Lookup cache from tagged spans to their tag metadata.
//!
//! The [`SpanIndex`] answers "what is tagged where". It is written first
//! during interactive tagging and otherwise derived from the
//! [`AnnotationModel`] through [`SpanIndex::rebuild_from`].

use std::collections::BTreeMap;

use log::{debug, warn};

use crate::{
    error::ModelError,
    model::{AnnotationModel, Applied},
    span::Span,
    tag::EntityTag,
};

/// Metadata stored for one tagged span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanEntry {
    text: String,
    tag: EntityTag,
    owner: Option<String>,
}

impl SpanEntry {
    pub fn new(text: impl Into<String>, tag: EntityTag, owner: Option<String>) -> Self {
        Self {
            text: text.into(),
            tag,
            owner,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tag(&self) -> EntityTag {
        self.tag
    }

    /// Name of the owning class, for attributes and methods.
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }
}

/// Ordered map of tagged spans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpanIndex {
    entries: BTreeMap<Span, SpanEntry>,
}

impl SpanIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, span: Span) -> Option<&SpanEntry> {
        self.entries.get(&span)
    }

    /// Iterate over entries in `(start, end)` order.
    pub fn iter(&self) -> impl Iterator<Item = (Span, &SpanEntry)> {
        self.entries.iter().map(|(span, entry)| (*span, entry))
    }

    /// Record `span` as tagged.
    ///
    /// Re-inserting an identical `(span, tag, text)` is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DuplicateSpanConflict`] if the span is already
    /// present with a different tag or text.
    pub fn insert(
        &mut self,
        span: Span,
        tag: EntityTag,
        text: &str,
        owner: Option<&str>,
    ) -> Result<Applied, ModelError> {
        if let Some(existing) = self.entries.get(&span) {
            if existing.tag == tag && existing.text == text {
                return Ok(Applied::AlreadyPresent);
            }
            return Err(ModelError::DuplicateSpanConflict {
                span,
                existing_tag: existing.tag,
                existing_text: existing.text.clone(),
            });
        }

        self.entries
            .insert(span, SpanEntry::new(text, tag, owner.map(str::to_string)));
        Ok(Applied::Inserted)
    }

    /// Forget `span`, returning its entry if it was tagged.
    pub fn remove(&mut self, span: Span) -> Option<SpanEntry> {
        self.entries.remove(&span)
    }

    /// Find the tagged span containing `offset`.
    ///
    /// When tagged spans nest, the narrowest one wins; among equally narrow
    /// spans the one starting first wins.
    pub fn lookup_containing(&self, offset: usize) -> Option<(Span, &SpanEntry)> {
        self.entries
            .range(..=Span::new(offset..usize::MAX))
            .filter(|(span, _)| span.contains(offset))
            .min_by_key(|(span, _)| (span.len(), span.start()))
            .map(|(span, entry)| (*span, entry))
    }

    /// Tagged spans that overlap `span` without being equal to it.
    pub fn overlapping(&self, span: Span) -> impl Iterator<Item = Span> + '_ {
        self.entries
            .range(..Span::new(span.end()..usize::MAX))
            .map(|(other, _)| *other)
            .filter(move |other| *other != span && other.overlaps(span))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Discard the current contents and re-populate strictly from `model`.
    ///
    /// Spans claimed twice in the model are logged and only the first claim
    /// is kept.
    pub fn rebuild_from(&mut self, model: &AnnotationModel) {
        self.entries.clear();
        for tagged in model.tagged_spans() {
            if let Err(err) = self.insert(tagged.span, tagged.tag, tagged.name, tagged.owner) {
                warn!(err:%; "Skipping conflicting span while rebuilding index");
            }
        }
        debug!(entries = self.entries.len(); "Span index rebuilt");
    }

    /// Returns `true` if the index holds exactly the model's tagged spans,
    /// with matching tags and text.
    pub fn agrees_with(&self, model: &AnnotationModel) -> bool {
        let mut count = 0;
        for tagged in model.tagged_spans() {
            count += 1;
            match self.entries.get(&tagged.span) {
                Some(entry) if entry.tag == tagged.tag && entry.text == tagged.name => {}
                _ => return false,
            }
        }
        count == self.entries.len()
    }
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    fn span_strategy() -> impl Strategy<Value = Span> {
        (0usize..60, 1usize..12).prop_map(|(start, len)| Span::new(start..start + len))
    }

    fn index_strategy() -> impl Strategy<Value = SpanIndex> {
        prop::collection::vec(span_strategy(), 0..16).prop_map(|spans| {
            let mut index = SpanIndex::new();
            for span in spans {
                let text = format!("w{}_{}", span.start(), span.end());
                index
                    .insert(span, EntityTag::Class, &text, None)
                    .expect("text is derived from the span");
            }
            index
        })
    }

    // ===================
    // Property Test Functions
    // ===================

    /// `lookup_containing` picks the narrowest containing span, earliest first.
    fn check_lookup_matches_linear_scan(
        index: &SpanIndex,
        offset: usize,
    ) -> Result<(), TestCaseError> {
        let expected = index
            .iter()
            .map(|(span, _)| span)
            .filter(|span| span.contains(offset))
            .min_by_key(|span| (span.len(), span.start()));
        let found = index.lookup_containing(offset).map(|(span, _)| span);
        prop_assert_eq!(found, expected, "offset {}", offset);
        Ok(())
    }

    /// `overlapping` returns every other overlapping span in index order.
    fn check_overlapping_matches_linear_scan(
        index: &SpanIndex,
        probe: Span,
    ) -> Result<(), TestCaseError> {
        let expected: Vec<Span> = index
            .iter()
            .map(|(span, _)| span)
            .filter(|span| *span != probe && span.overlaps(probe))
            .collect();
        let found: Vec<Span> = index.overlapping(probe).collect();
        prop_assert_eq!(found, expected, "probe {}", probe);
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn lookup_matches_linear_scan(index in index_strategy(), offset in 0usize..75) {
            check_lookup_matches_linear_scan(&index, offset)?;
        }

        #[test]
        fn overlapping_matches_linear_scan(index in index_strategy(), probe in span_strategy()) {
            check_overlapping_matches_linear_scan(&index, probe)?;
        }
    }
}
