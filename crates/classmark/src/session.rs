//! The annotation session: the single writer of the annotation state.

use log::{debug, info, warn};

use classmark_core::{AnnotationModel, EntityTag, RelationshipKind, Span, SpanIndex};
use classmark_sync::Diagnostic;

use crate::{
    config::AppConfig,
    error::ClassmarkError,
    highlight::{Highlight, HighlightLayer},
    history::{HistoryManager, HistoryOutcome, Snapshot},
    preannotate::{self, CancelToken, LazyAnalyzer, PreAnnotationReport, StructureError},
    state::AnnotationState,
    tagging::{SelectionOutcome, TagMode, TaggingContext},
    text,
};

const READY_STATUS: &str = "Select a tag, then click on a word to annotate.";

/// An interactive annotation session over one text.
///
/// Every public operation leaves the span index agreeing with the model,
/// and every change to the model is recorded in the undo history.
///
/// # Examples
///
/// ```
/// use classmark::{AnnotationSession, EntityTag, RelationshipKind, config::AppConfig};
///
/// let mut session = AnnotationSession::new(AppConfig::default());
/// session.set_text("A User can borrow a Book.");
///
/// session.set_tag_mode(EntityTag::Class);
/// session.select_word_at(3);
/// session.select_word_at(21);
///
/// session.set_relationship_mode(RelationshipKind::Association);
/// session.select_word_at(3);
/// session.select_word_at(21);
///
/// assert_eq!(session.model().relationships().len(), 1);
/// assert!(session.undo());
/// assert!(session.model().relationships().is_empty());
/// ```
#[derive(Debug)]
pub struct AnnotationSession {
    config: AppConfig,
    text: String,
    state: AnnotationState,
    tagging: TaggingContext,
    history: HistoryManager,
    status: String,
}

impl Default for AnnotationSession {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl AnnotationSession {
    /// Create an empty session with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        let history = HistoryManager::new(Snapshot::default(), config.history().max_depth());
        Self {
            config,
            text: String::new(),
            state: AnnotationState::default(),
            tagging: TaggingContext::new(),
            history,
            status: READY_STATUS.to_string(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn model(&self) -> &AnnotationModel {
        &self.state.model
    }

    pub fn span_index(&self) -> &SpanIndex {
        &self.state.span_index
    }

    pub fn highlights(&self) -> &HighlightLayer {
        &self.state.highlights
    }

    pub fn mode(&self) -> TagMode {
        self.tagging.mode()
    }

    pub fn context_class(&self) -> Option<Span> {
        self.tagging.context_class()
    }

    /// The last user-facing status message.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Returns `true` if the span index agrees with the model.
    pub fn is_consistent(&self) -> bool {
        self.state.span_index.agrees_with(&self.state.model)
    }

    /// Load a new text. Annotations, mode and history are discarded and the
    /// empty state becomes the new baseline.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.state.clear();
        self.tagging.reset();
        self.history.reset(Snapshot::default());
        info!(chars = text::char_len(&self.text); "Text loaded");
        self.status = format!("Text loaded. {READY_STATUS}");
    }

    /// Remove the text and every annotation.
    pub fn clear_text(&mut self) {
        self.set_text(String::new());
        self.status = "Text cleared. Type, paste or load new text.".to_string();
    }

    /// Remove every annotation but keep the text. Recorded in history.
    pub fn clear_annotations(&mut self) {
        self.history.push(self.snapshot());
        self.state.clear();
        self.tagging.reset();
        self.history.push(self.snapshot());
        info!("Annotations cleared");
        self.status = format!("Annotations cleared. {READY_STATUS}");
    }

    /// Select an entity tag for the following clicks.
    pub fn set_tag_mode(&mut self, tag: EntityTag) {
        self.history.push(self.snapshot());
        self.tagging.set_tag_mode(tag, &mut self.state);
        self.status = match (tag.needs_owner(), self.context_class()) {
            (false, _) => format!("Selected tag: {tag}. Click on a word to annotate."),
            (true, Some(span)) => format!(
                "Selected tag: {tag}. Adding to class `{}`; click a class to switch.",
                self.class_name(span)
            ),
            (true, None) => format!("Selected tag: {tag}. Click a tagged CLASS to choose its owner."),
        };
    }

    /// Select a relationship type; the next two class clicks are FROM and TO.
    pub fn set_relationship_mode(&mut self, kind: RelationshipKind) {
        self.history.push(self.snapshot());
        self.tagging.set_relationship_mode(kind, &mut self.state);
        self.status = format!(
            "Selected relationship: {kind}. Click on first class (FROM), then second class (TO)."
        );
    }

    /// Leave any tag or relationship mode.
    pub fn reset_mode(&mut self) {
        self.tagging.reset_mode(&mut self.state);
        self.status = READY_STATUS.to_string();
    }

    /// Handle a click on the word under character `offset`.
    pub fn select_word_at(&mut self, offset: usize) -> SelectionOutcome {
        match text::word_at(&self.text, offset) {
            Some((span, word)) => {
                let word = word.to_string();
                self.handle_word_selection(&word, span)
            }
            None => {
                debug!(offset; "No word under cursor");
                SelectionOutcome::Ignored
            }
        }
    }

    /// Handle a click that selected `word` at `span`.
    pub fn handle_word_selection(&mut self, word: &str, span: Span) -> SelectionOutcome {
        if text::slice(&self.text, span).is_none() {
            warn!(word, span:% = span; "Selection outside the text ignored");
            return SelectionOutcome::Ignored;
        }

        let pushed = self.history.push(self.snapshot());
        let outcome = self.tagging.handle_selection(
            word,
            span,
            &mut self.state,
            self.config.model().default_attribute_type(),
        );

        if outcome.is_mutation() {
            self.history.push(self.snapshot());
        } else if outcome.is_abort() && pushed {
            self.history.pop();
        }

        self.status = self.describe(&outcome, word);
        outcome
    }

    /// Step back to the previous state.
    ///
    /// Returns `false` and reports "nothing to undo" when only the baseline
    /// remains.
    pub fn undo(&mut self) -> bool {
        let outcome = self.history.undo();
        self.apply_history(outcome)
    }

    /// Re-apply the most recently undone change.
    pub fn redo(&mut self) -> bool {
        let outcome = self.history.redo();
        self.apply_history(outcome)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// The model as JSON, formatted per configuration.
    pub fn to_json(&self) -> String {
        if self.config.export().pretty() {
            classmark_sync::to_json_pretty(&self.state.model)
        } else {
            classmark_sync::to_json(&self.state.model)
        }
    }

    /// The model and text as an export envelope.
    pub fn export_envelope(&self) -> String {
        classmark_sync::export_envelope(
            &self.text,
            &self.state.model,
            &self.config.export().options(),
        )
    }

    /// Replace the model with an edited JSON document.
    ///
    /// On success the change is recorded in history and the import warnings
    /// are returned.
    ///
    /// # Errors
    ///
    /// Returns [`ClassmarkError::InvalidModelStructure`] if the document is
    /// rejected; the live state and history are then untouched.
    pub fn sync_from_json(&mut self, src: &str) -> Result<Vec<Diagnostic>, ClassmarkError> {
        let parsed = match classmark_sync::parse_model(src) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(err:%; "JSON sync rejected");
                self.status = format!("Invalid JSON, annotations unchanged: {err}");
                return Err(ClassmarkError::new_sync_error(err, src));
            }
        };

        self.history.push(self.snapshot());
        let context = self.tagging.context_class();
        self.state.replace_model(parsed.model);
        self.tagging.reset_mode(&mut self.state);
        self.tagging
            .set_context_class(context.filter(|span| self.state.model.class_at(*span).is_some()));
        self.history.push(self.snapshot());

        info!(
            classes = self.state.model.classes().len(),
            relationships = self.state.model.relationships().len(),
            warnings = parsed.warnings.len();
            "Model synchronized from JSON"
        );
        self.status = match parsed.warnings.len() {
            0 => "Annotations updated from JSON.".to_string(),
            n => format!("Annotations updated from JSON with {n} correction(s)."),
        };
        Ok(parsed.warnings)
    }

    /// Replace the model with one built from analyzer candidates.
    ///
    /// This is a full replace, never a merge. The live state changes only
    /// once every candidate has been processed.
    ///
    /// # Errors
    ///
    /// - [`ClassmarkError::CollaboratorUnavailable`] if the analyzer cannot
    ///   be initialised.
    /// - [`ClassmarkError::PreAnnotationCancelled`] if `cancel` fires.
    /// - [`ClassmarkError::PreAnnotationFailed`] if analysis fails.
    ///
    /// In every error case the state and history are as before the call.
    pub fn pre_annotate(
        &mut self,
        analyzer: &mut LazyAnalyzer,
        cancel: &CancelToken,
    ) -> Result<PreAnnotationReport, ClassmarkError> {
        let analyzer = match analyzer.get() {
            Ok(analyzer) => analyzer,
            Err(reason) => {
                self.status = format!("Pre-annotation unavailable: {reason}");
                return Err(ClassmarkError::CollaboratorUnavailable(reason));
            }
        };

        info!(chars = text::char_len(&self.text); "Pre-annotation started");
        let pushed = self.history.push(self.snapshot());
        let attribute_type = self.config.model().default_attribute_type();
        let result = analyzer
            .analyze(&self.text)
            .map_err(StructureError::from)
            .and_then(|stream| preannotate::structure_candidates(stream, attribute_type, cancel));

        match result {
            Ok((model, report)) => {
                self.state.replace_model(model);
                self.tagging.reset();
                self.history.push(self.snapshot());
                info!(report:%; "Pre-annotation finished");
                self.status = format!("Pre-annotation complete: {report}.");
                Ok(report)
            }
            Err(err) => {
                if pushed {
                    self.history.pop();
                }
                warn!(err:%; "Pre-annotation rolled back");
                match err {
                    StructureError::Cancelled => {
                        self.status = "Pre-annotation cancelled.".to_string();
                        Err(ClassmarkError::PreAnnotationCancelled)
                    }
                    StructureError::Analyzer(err) => {
                        self.status = format!("Pre-annotation failed: {err}");
                        Err(ClassmarkError::PreAnnotationFailed(err.to_string()))
                    }
                }
            }
        }
    }

    fn snapshot(&self) -> Snapshot {
        self.state.snapshot(self.tagging.context_class())
    }

    fn apply_history(&mut self, outcome: HistoryOutcome) -> bool {
        let snapshot = match outcome {
            HistoryOutcome::Restored(snapshot) => snapshot,
            HistoryOutcome::NothingToUndo => {
                self.status = "Nothing to undo.".to_string();
                return false;
            }
            HistoryOutcome::NothingToRedo => {
                self.status = "Nothing to redo.".to_string();
                return false;
            }
        };

        let context = self.state.restore(snapshot);
        self.tagging.set_context_class(context);
        match self.tagging.mode() {
            TagMode::Relationship { kind, .. } => {
                self.tagging.set_relationship_mode(kind, &mut self.state)
            }
            TagMode::Entity(tag) => self.tagging.set_tag_mode(tag, &mut self.state),
            TagMode::Idle => {
                if let Some(span) = context {
                    self.state.highlights.set_overlay(span, Highlight::Context);
                }
            }
        }
        self.status = format!(
            "Restored {} class(es) and {} relationship(s).",
            self.state.model.classes().len(),
            self.state.model.relationships().len()
        );
        true
    }

    fn class_name(&self, span: Span) -> &str {
        self.state
            .model
            .class_at(span)
            .map_or("?", |class| class.name())
    }

    fn describe(&self, outcome: &SelectionOutcome, word: &str) -> String {
        match outcome {
            SelectionOutcome::ContextSelected { name, .. } => {
                format!("Context class: {name}. Attributes and methods will be added to it.")
            }
            SelectionOutcome::EntityTagged { tag, applied, .. } if applied.is_inserted() => {
                format!("Tagged `{word}` as {tag}.")
            }
            SelectionOutcome::EntityTagged { tag, .. } => {
                format!("`{word}` is already tagged as {tag}.")
            }
            SelectionOutcome::RelationshipStarted { name, .. } => {
                format!("From: {name}. Now select the second class (TO).")
            }
            SelectionOutcome::RelationshipAdded {
                kind,
                from,
                to,
                applied,
            } if applied.is_inserted() => format!("Added relationship: {from} --[{kind}]--> {to}"),
            SelectionOutcome::RelationshipAdded { kind, from, to, .. } => {
                format!("Relationship {from} --[{kind}]--> {to} already exists.")
            }
            SelectionOutcome::Rejected(err) => format!("`{word}`: {err}"),
            SelectionOutcome::Ignored => self.status.clone(),
        }
    }
}
