//! Rule-driven bulk construction of a model from analyzer candidates.
//!
//! The linguistic analysis itself lives behind the [`Analyzer`] trait and is
//! owned by the host. This module only structures what an analyzer proposes:
//!
//! - The first accepted span wins; later candidates that duplicate or
//!   overlap it are skipped.
//! - The most recent CLASS candidate owns the ATTRIBUTE and METHOD
//!   candidates that follow it.
//! - Members seen before any CLASS have no owner and are dropped.

use std::{
    collections::BTreeMap,
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use log::{debug, info, trace, warn};
use thiserror::Error;

use classmark_core::{AnnotationModel, EntityTag, Span};

/// A proposed entity: `(text, label, start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    text: String,
    label: EntityTag,
    span: Span,
}

impl Candidate {
    pub fn new(text: impl Into<String>, label: EntityTag, span: Span) -> Self {
        Self {
            text: text.into(),
            label,
            span,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn label(&self) -> EntityTag {
        self.label
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

/// Failure reported by an analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct AnalyzerError(String);

impl AnalyzerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Lazy stream of candidates, ordered by start offset.
pub type CandidateStream<'a> = Box<dyn Iterator<Item = Result<Candidate, AnalyzerError>> + 'a>;

/// A linguistic-analysis collaborator.
pub trait Analyzer {
    /// Propose entities for `text`.
    ///
    /// # Errors
    ///
    /// Returns an [`AnalyzerError`] if analysis cannot start. Failures
    /// mid-stream are reported through the stream items.
    fn analyze<'a>(&'a self, text: &'a str) -> Result<CandidateStream<'a>, AnalyzerError>;
}

type AnalyzerInit = Box<dyn FnOnce() -> Result<Box<dyn Analyzer>, AnalyzerError>>;

enum Slot {
    Pending(AnalyzerInit),
    Ready(Box<dyn Analyzer>),
    Unavailable(String),
}

/// A host-owned analyzer that is initialised on first use.
///
/// A failed initialisation disables the slot for good; pre-annotation then
/// reports the collaborator as unavailable instead of retrying.
pub struct LazyAnalyzer {
    slot: Slot,
}

impl LazyAnalyzer {
    /// Defer construction to the first [`LazyAnalyzer::get`].
    pub fn new<F>(init: F) -> Self
    where
        F: FnOnce() -> Result<Box<dyn Analyzer>, AnalyzerError> + 'static,
    {
        Self {
            slot: Slot::Pending(Box::new(init)),
        }
    }

    /// An analyzer that is already initialised.
    pub fn ready(analyzer: Box<dyn Analyzer>) -> Self {
        Self {
            slot: Slot::Ready(analyzer),
        }
    }

    /// A slot with no analyzer behind it.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            slot: Slot::Unavailable(reason.into()),
        }
    }

    /// Initialise if needed and borrow the analyzer.
    ///
    /// # Errors
    ///
    /// Returns the reason the analyzer is unavailable.
    pub fn get(&mut self) -> Result<&dyn Analyzer, String> {
        if matches!(self.slot, Slot::Pending(_)) {
            let pending = std::mem::replace(&mut self.slot, Slot::Unavailable(String::new()));
            if let Slot::Pending(init) = pending {
                self.slot = match init() {
                    Ok(analyzer) => {
                        info!("Analyzer initialised");
                        Slot::Ready(analyzer)
                    }
                    Err(err) => {
                        warn!(err:%; "Analyzer failed to initialise");
                        Slot::Unavailable(err.to_string())
                    }
                };
            }
        }

        match &self.slot {
            Slot::Ready(analyzer) => Ok(analyzer.as_ref()),
            Slot::Unavailable(reason) => Err(reason.clone()),
            Slot::Pending(_) => Err("analyzer was not initialised".to_string()),
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.slot, Slot::Unavailable(_))
    }
}

impl fmt::Debug for LazyAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.slot {
            Slot::Pending(_) => "pending",
            Slot::Ready(_) => "ready",
            Slot::Unavailable(_) => "unavailable",
        };
        f.debug_struct("LazyAnalyzer").field("slot", &state).finish()
    }
}

/// Cooperative cancellation flag shared between the host and a run.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Counts of what happened to each candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreAnnotationReport {
    pub accepted: usize,
    pub duplicates: usize,
    pub overlaps: usize,
    pub orphans: usize,
}

impl fmt::Display for PreAnnotationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} accepted, {} duplicate, {} overlapping, {} without a class",
            self.accepted, self.duplicates, self.overlaps, self.orphans
        )
    }
}

/// Why structuring stopped early.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructureError {
    #[error("cancelled")]
    Cancelled,

    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),
}

/// Build a fresh model from `candidates`.
///
/// `cancel` is polled after every candidate. Nothing outside the returned
/// model is touched, so an early return leaves no partial state.
///
/// # Errors
///
/// - [`StructureError::Cancelled`] if `cancel` fires.
/// - [`StructureError::Analyzer`] if the stream yields an error.
pub fn structure_candidates<I>(
    candidates: I,
    attribute_type: &str,
    cancel: &CancelToken,
) -> Result<(AnnotationModel, PreAnnotationReport), StructureError>
where
    I: IntoIterator<Item = Result<Candidate, AnalyzerError>>,
{
    let mut model = AnnotationModel::new();
    let mut report = PreAnnotationReport::default();
    // Accepted spans keyed by start, mapping to end.
    let mut accepted: BTreeMap<usize, usize> = BTreeMap::new();
    let mut current_class: Option<Span> = None;

    for candidate in candidates {
        let candidate = candidate?;
        let span = candidate.span;

        if accepted.get(&span.start()) == Some(&span.end()) {
            report.duplicates += 1;
            trace!(span:% = span; "Duplicate candidate skipped");
        } else if overlaps_accepted(&accepted, span) {
            report.overlaps += 1;
            trace!(span:% = span; "Overlapping candidate skipped");
        } else {
            let result = match (candidate.label, current_class) {
                (EntityTag::Class, _) => model.add_class(&candidate.text, span).map(Some),
                (EntityTag::Attribute, Some(owner)) => model
                    .add_attribute_typed(&candidate.text, span, owner, attribute_type)
                    .map(Some),
                (EntityTag::Method, Some(owner)) => {
                    model.add_method(&candidate.text, span, owner).map(Some)
                }
                (EntityTag::Attribute | EntityTag::Method, None) => Ok(None),
            };

            match result {
                Ok(Some(_)) => {
                    accepted.insert(span.start(), span.end());
                    report.accepted += 1;
                    if candidate.label == EntityTag::Class {
                        current_class = Some(span);
                    }
                }
                Ok(None) => {
                    report.orphans += 1;
                    trace!(span:% = span; "Candidate without owner class dropped");
                }
                Err(err) => {
                    report.overlaps += 1;
                    debug!(span:% = span, err:%; "Candidate rejected by model");
                }
            }
        }

        if cancel.is_cancelled() {
            return Err(StructureError::Cancelled);
        }
    }

    Ok((model, report))
}

/// Returns `true` if `span` shares an offset with any accepted span.
///
/// Accepted spans are pairwise disjoint, so only the nearest span starting
/// at or before `span` and the first one starting after it can overlap.
fn overlaps_accepted(accepted: &BTreeMap<usize, usize>, span: Span) -> bool {
    let before = accepted
        .range(..=span.start())
        .next_back()
        .is_some_and(|(_, end)| *end > span.start());
    let after = accepted
        .range(span.start() + 1..)
        .next()
        .is_some_and(|(start, _)| *start < span.end());
    before || after
}
