//! Snapshot-based undo/redo history.
//!
//! The [`HistoryManager`] keeps deep copies of the annotation state. The
//! bottom of the undo stack is the baseline (the empty or freshly loaded
//! state) and is never removed, so there is always a state to return to.
//!
//! # Recording an action
//!
//! ```text
//! push(before)   deduplicated against the top, so repeated actions on an
//!                unchanged state add nothing
//! ... mutate ...
//! push(after)    on success; the new top is the state undo returns from
//! pop()          on abort, if the first push actually pushed
//! ```

use std::collections::VecDeque;

use log::{debug, trace};

use classmark_core::{AnnotationModel, Span, SpanIndex};

/// A deep copy of the annotation state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    model: AnnotationModel,
    span_index: SpanIndex,
    context_class: Option<Span>,
}

impl Snapshot {
    pub fn new(model: AnnotationModel, span_index: SpanIndex, context_class: Option<Span>) -> Self {
        Self {
            model,
            span_index,
            context_class,
        }
    }

    pub fn model(&self) -> &AnnotationModel {
        &self.model
    }

    pub fn span_index(&self) -> &SpanIndex {
        &self.span_index
    }

    pub fn context_class(&self) -> Option<Span> {
        self.context_class
    }

    pub fn into_parts(self) -> (AnnotationModel, SpanIndex, Option<Span>) {
        (self.model, self.span_index, self.context_class)
    }
}

/// Result of an undo or redo request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryOutcome {
    /// The state to install as the live state.
    Restored(Snapshot),
    /// Only the baseline remains.
    NothingToUndo,
    /// The redo stack is empty.
    NothingToRedo,
}

/// Undo and redo stacks of [`Snapshot`]s.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    undo_stack: VecDeque<Snapshot>,
    redo_stack: Vec<Snapshot>,
    max_depth: Option<usize>,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(Snapshot::default(), None)
    }
}

impl HistoryManager {
    /// Creates a history holding only `baseline`.
    ///
    /// `max_depth` bounds the undo stack, baseline included. A bound of zero
    /// is treated as one.
    pub fn new(baseline: Snapshot, max_depth: Option<usize>) -> Self {
        Self {
            undo_stack: VecDeque::from([baseline]),
            redo_stack: Vec::new(),
            max_depth: max_depth.map(|depth| depth.max(1)),
        }
    }

    /// Discard all history and start over from `baseline`.
    pub fn reset(&mut self, baseline: Snapshot) {
        self.undo_stack.clear();
        self.undo_stack.push_back(baseline);
        self.redo_stack.clear();
        debug!("History reset");
    }

    /// Record `snapshot` on the undo stack.
    ///
    /// Returns `false` without touching either stack if `snapshot` equals the
    /// current top. Otherwise the redo stack is cleared.
    pub fn push(&mut self, snapshot: Snapshot) -> bool {
        if self.undo_stack.back() == Some(&snapshot) {
            trace!("Snapshot unchanged, not pushed");
            return false;
        }

        self.undo_stack.push_back(snapshot);
        if !self.redo_stack.is_empty() {
            trace!(cleared = self.redo_stack.len(); "Redo stack cleared");
            self.redo_stack.clear();
        }
        self.evict();
        trace!(undo_stack = self.undo_stack.len(); "Snapshot pushed");
        true
    }

    /// Remove the most recent snapshot. The baseline is never removed.
    pub fn pop(&mut self) -> Option<Snapshot> {
        if self.undo_stack.len() > 1 {
            self.undo_stack.pop_back()
        } else {
            None
        }
    }

    /// Step back to the previous snapshot.
    pub fn undo(&mut self) -> HistoryOutcome {
        if self.undo_stack.len() <= 1 {
            return HistoryOutcome::NothingToUndo;
        }
        let Some(top) = self.undo_stack.pop_back() else {
            return HistoryOutcome::NothingToUndo;
        };
        self.redo_stack.push(top);
        debug!(undo_stack = self.undo_stack.len(), redo_stack = self.redo_stack.len(); "Undo");
        match self.undo_stack.back() {
            Some(current) => HistoryOutcome::Restored(current.clone()),
            None => HistoryOutcome::NothingToUndo,
        }
    }

    /// Re-apply the most recently undone snapshot.
    pub fn redo(&mut self) -> HistoryOutcome {
        let Some(snapshot) = self.redo_stack.pop() else {
            return HistoryOutcome::NothingToRedo;
        };
        self.undo_stack.push_back(snapshot.clone());
        self.evict();
        debug!(undo_stack = self.undo_stack.len(), redo_stack = self.redo_stack.len(); "Redo");
        HistoryOutcome::Restored(snapshot)
    }

    pub fn can_undo(&self) -> bool {
        self.undo_stack.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// The snapshot at the top of the undo stack.
    pub fn current(&self) -> Option<&Snapshot> {
        self.undo_stack.back()
    }

    fn evict(&mut self) {
        let Some(max_depth) = self.max_depth else {
            return;
        };
        while self.undo_stack.len() > max_depth {
            self.undo_stack.pop_front();
            trace!("Oldest snapshot evicted");
        }
    }
}
