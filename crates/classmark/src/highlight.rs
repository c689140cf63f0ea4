//! The highlight layer handed to a text renderer.
//!
//! A renderer paints one color per [`Highlight`]; this module only decides
//! which spans carry which visual tag.

use std::collections::BTreeMap;

use classmark_core::{EntityTag, RelationshipKind, Span, SpanIndex};

/// Visual tag for a highlighted span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Highlight {
    /// A tagged entity.
    Entity(EntityTag),
    /// The class new attributes and methods attach to.
    Context,
    /// The FROM endpoint of a relationship being built.
    RelationshipSource(RelationshipKind),
}

/// Spans currently highlighted, in text order.
///
/// Entity highlights mirror the span index. The temporary overlays sit on
/// top of an entity highlight and are dropped on the next rebuild.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightLayer {
    entities: BTreeMap<Span, EntityTag>,
    overlay: Option<(Span, Highlight)>,
}

impl HighlightLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every entity highlight with those of `index` and drop the
    /// overlay.
    pub fn rebuild_from(&mut self, index: &SpanIndex) {
        self.entities = index.iter().map(|(span, entry)| (span, entry.tag())).collect();
        self.overlay = None;
    }

    pub fn apply(&mut self, span: Span, tag: EntityTag) {
        self.entities.insert(span, tag);
    }

    /// Show a temporary overlay, replacing any previous one.
    pub fn set_overlay(&mut self, span: Span, highlight: Highlight) {
        self.overlay = Some((span, highlight));
    }

    pub fn clear_overlay(&mut self) {
        self.overlay = None;
    }

    pub fn overlay(&self) -> Option<(Span, Highlight)> {
        self.overlay
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.overlay = None;
    }

    /// The visual tag painted at `span`; an overlay wins over the entity.
    pub fn get(&self, span: Span) -> Option<Highlight> {
        match self.overlay {
            Some((overlay_span, highlight)) if overlay_span == span => Some(highlight),
            _ => self.entities.get(&span).copied().map(Highlight::Entity),
        }
    }

    /// Every painted span with its visual tag.
    pub fn iter(&self) -> impl Iterator<Item = (Span, Highlight)> + '_ {
        self.entities.keys().filter_map(|span| Some((*span, self.get(*span)?)))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
