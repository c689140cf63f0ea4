//! Integration tests for the AnnotationSession API

use classmark::{
    AnnotationSession, Applied, ClassmarkError, EntityTag, ModelError, RelationshipKind, Span,
    config::{AppConfig, ExportConfig, HistoryConfig, ModelConfig},
    highlight::Highlight,
    preannotate::{Analyzer, AnalyzerError, CancelToken, Candidate, CandidateStream, LazyAnalyzer},
    tagging::{SelectionOutcome, TagMode},
    text,
};

const TEXT: &str = "A User can borrow a Book. Each Book has a title.";

fn session() -> AnnotationSession {
    let mut session = AnnotationSession::default();
    session.set_text(TEXT);
    session
}

fn compact() -> AppConfig {
    AppConfig::new(
        ModelConfig::default(),
        HistoryConfig::default(),
        ExportConfig::new(false, true),
    )
}

fn click(session: &mut AnnotationSession, word: &str, nth: usize) -> SelectionOutcome {
    let (span, word) = text::find_word(TEXT, word, nth).expect("word in text");
    session.handle_word_selection(word, span)
}

fn tag_classes(session: &mut AnnotationSession) {
    session.set_tag_mode(EntityTag::Class);
    click(session, "User", 1);
    click(session, "Book", 1);
}

struct FixedAnalyzer(Vec<Candidate>);

impl Analyzer for FixedAnalyzer {
    fn analyze<'a>(&'a self, _text: &'a str) -> Result<CandidateStream<'a>, AnalyzerError> {
        Ok(Box::new(self.0.iter().cloned().map(Ok)))
    }
}

/// Yields its candidates and then fails.
struct FailingAnalyzer(Vec<Candidate>);

impl Analyzer for FailingAnalyzer {
    fn analyze<'a>(&'a self, _text: &'a str) -> Result<CandidateStream<'a>, AnalyzerError> {
        let failure = std::iter::once(Err(AnalyzerError::new("tagger crashed")));
        Ok(Box::new(self.0.iter().cloned().map(Ok).chain(failure)))
    }
}

fn fixed(candidates: Vec<Candidate>) -> LazyAnalyzer {
    LazyAnalyzer::ready(Box::new(FixedAnalyzer(candidates)))
}

#[test]
fn test_relationship_scenario() {
    let mut session = session();
    tag_classes(&mut session);

    session.set_relationship_mode(RelationshipKind::Association);
    assert_eq!(
        click(&mut session, "User", 1),
        SelectionOutcome::RelationshipStarted {
            from: Span::new(2..6),
            name: "User".to_string(),
        }
    );
    assert_eq!(
        session.highlights().overlay(),
        Some((
            Span::new(2..6),
            Highlight::RelationshipSource(RelationshipKind::Association)
        ))
    );
    click(&mut session, "Book", 1);

    let relationships = session.model().relationships();
    assert_eq!(relationships.len(), 1);
    assert_eq!(relationships[0].from_class(), "User");
    assert_eq!(relationships[0].to_class(), "Book");
    assert_eq!(relationships[0].kind(), RelationshipKind::Association);
    assert_eq!(relationships[0].from_span(), Span::new(2..6));
    assert_eq!(relationships[0].to_span(), Span::new(20..24));
    assert_eq!(session.highlights().overlay(), None);

    let json: serde_json::Value = serde_json::from_str(&session.to_json()).unwrap();
    assert_eq!(
        json["relationships"][0],
        serde_json::json!({
            "from_class": "User",
            "to_class": "Book",
            "type": "association",
            "from_span": [2, 6],
            "to_span": [20, 24],
        })
    );
    assert!(session.is_consistent());
}

#[test]
fn test_attribute_without_class_is_rejected() {
    let mut session = AnnotationSession::new(compact());
    session.set_text(TEXT);
    session.set_tag_mode(EntityTag::Attribute);

    let outcome = click(&mut session, "title", 1);

    assert_eq!(outcome, SelectionOutcome::Rejected(ModelError::NoContextClass));
    assert_eq!(session.mode(), TagMode::Idle);
    assert_eq!(session.to_json(), r#"{"classes":[],"relationships":[]}"#);
    assert!(!session.can_undo());
}

#[test]
fn test_tagging_twice_is_idempotent() {
    let mut session = session();
    session.set_tag_mode(EntityTag::Class);
    click(&mut session, "User", 1);
    let model = session.model().clone();

    assert_eq!(
        click(&mut session, "User", 1),
        SelectionOutcome::EntityTagged {
            tag: EntityTag::Class,
            span: Span::new(2..6),
            applied: Applied::AlreadyPresent,
        }
    );
    assert_eq!(session.model(), &model);

    // One recorded change, one undo back to the baseline.
    assert!(session.undo());
    assert!(!session.can_undo());
}

#[test]
fn test_relationship_added_once() {
    let mut session = session();
    tag_classes(&mut session);
    session.set_relationship_mode(RelationshipKind::Composition);
    for _ in 0..2 {
        click(&mut session, "User", 1);
        click(&mut session, "Book", 1);
    }
    assert_eq!(session.model().relationships().len(), 1);
    assert!(session.status().contains("already exists"));
}

#[test]
fn test_self_relationship_leaves_model_unchanged() {
    let mut session = session();
    tag_classes(&mut session);
    let model = session.model().clone();

    session.set_relationship_mode(RelationshipKind::Generalization);
    click(&mut session, "User", 1);
    assert_eq!(
        click(&mut session, "User", 1),
        SelectionOutcome::Rejected(ModelError::SelfRelationshipRejected {
            span: Span::new(2..6)
        })
    );
    assert_eq!(session.model(), &model);
    assert_eq!(
        session.mode(),
        TagMode::Relationship {
            kind: RelationshipKind::Generalization,
            from: Some(Span::new(2..6)),
        }
    );
}

#[test]
fn test_undo_at_baseline() {
    let mut session = session();
    assert!(!session.undo());
    assert_eq!(session.status(), "Nothing to undo.");
    assert!(!session.redo());
    assert_eq!(session.status(), "Nothing to redo.");
    assert!(session.model().is_empty());
}

#[test]
fn test_members_attach_to_selected_class() {
    let mut session = session();
    tag_classes(&mut session);

    session.set_tag_mode(EntityTag::Attribute);
    assert!(matches!(
        click(&mut session, "Book", 1),
        SelectionOutcome::ContextSelected { span, .. } if span == Span::new(20..24)
    ));
    assert_eq!(
        session.highlights().overlay(),
        Some((Span::new(20..24), Highlight::Context))
    );
    click(&mut session, "title", 1);

    let book = session.model().class_at(Span::new(20..24)).unwrap();
    assert_eq!(book.attributes().len(), 1);
    assert_eq!(book.attributes()[0].name(), "title");
    assert_eq!(book.attributes()[0].type_name(), "String");
    assert_eq!(
        session
            .span_index()
            .get(Span::new(42..47))
            .and_then(|entry| entry.owner()),
        Some("Book")
    );

    // Undo the attribute; the context class comes back with the state.
    assert!(session.undo());
    assert!(session.model().class_at(Span::new(20..24)).unwrap().attributes().is_empty());
    assert_eq!(session.context_class(), Some(Span::new(20..24)));
}

#[test]
fn test_redo_cleared_by_new_change() {
    let mut session = session();
    tag_classes(&mut session);
    assert!(session.undo());
    assert!(session.can_redo());

    click(&mut session, "title", 1);
    assert!(!session.can_redo());
    assert_eq!(session.model().classes().len(), 2);
}

#[test]
fn test_clear_annotations_is_undoable() {
    let mut session = session();
    tag_classes(&mut session);
    session.clear_annotations();
    assert!(session.model().is_empty());
    assert_eq!(session.text(), TEXT);

    assert!(session.undo());
    assert_eq!(session.model().classes().len(), 2);
    assert!(session.is_consistent());
}

#[test]
fn test_sync_from_json_is_recorded() {
    let mut session = session();
    tag_classes(&mut session);
    let edited = r#"{
        "classes": [
            {"name": "User", "span": [2, 6], "attributes": [], "methods": []},
            {"name": "Book", "span": [20, 24],
             "attributes": [{"name": "title", "span": [42, 47]}], "methods": []}
        ],
        "relationships": []
    }"#;

    let warnings = session.sync_from_json(edited).unwrap();
    assert!(warnings.is_empty());
    let book = session.model().class_at(Span::new(20..24)).unwrap();
    assert_eq!(book.attributes()[0].type_name(), "String");
    assert!(session.is_consistent());

    assert!(session.undo());
    assert!(
        session
            .model()
            .class_at(Span::new(20..24))
            .unwrap()
            .attributes()
            .is_empty()
    );
}

#[test]
fn test_invalid_json_changes_nothing() {
    let mut session = session();
    tag_classes(&mut session);
    let model = session.model().clone();

    let err = session.sync_from_json(r#"{"classes": []"#).unwrap_err();
    assert!(matches!(err, ClassmarkError::InvalidModelStructure { .. }));
    assert_eq!(session.model(), &model);
    assert!(session.status().starts_with("Invalid JSON"));

    assert!(session.undo());
    assert_eq!(session.model().classes().len(), 1);
}

#[test]
fn test_pre_annotation_first_accepted_wins() {
    let mut session = session();
    let mut analyzer = fixed(vec![
        Candidate::new("Book", EntityTag::Class, Span::new(0..4)),
        Candidate::new("Books", EntityTag::Attribute, Span::new(0..5)),
    ]);

    let report = session
        .pre_annotate(&mut analyzer, &CancelToken::new())
        .unwrap();

    assert_eq!(report.accepted, 1);
    assert_eq!(report.overlaps, 1);
    let classes = session.model().classes();
    assert_eq!(classes.len(), 1);
    assert_eq!(classes[0].name(), "Book");
    assert!(classes[0].attributes().is_empty());
    assert!(session.is_consistent());
}

#[test]
fn test_pre_annotation_replaces_and_undoes() {
    let mut session = session();
    tag_classes(&mut session);
    let mut analyzer = fixed(vec![
        Candidate::new("Book", EntityTag::Class, Span::new(20..24)),
        Candidate::new("title", EntityTag::Attribute, Span::new(42..47)),
    ]);

    session
        .pre_annotate(&mut analyzer, &CancelToken::new())
        .unwrap();
    assert_eq!(session.model().classes().len(), 1);
    assert_eq!(session.model().classes()[0].attributes().len(), 1);

    assert!(session.undo());
    assert_eq!(session.model().classes().len(), 2);
}

#[test]
fn test_cancelled_pre_annotation_rolls_back() {
    let mut session = session();
    tag_classes(&mut session);
    let model = session.model().clone();
    let cancel = CancelToken::new();
    cancel.cancel();

    let mut analyzer = fixed(vec![Candidate::new(
        "Library",
        EntityTag::Class,
        Span::new(0..1),
    )]);
    let err = session.pre_annotate(&mut analyzer, &cancel).unwrap_err();

    assert!(matches!(err, ClassmarkError::PreAnnotationCancelled));
    assert_eq!(session.model(), &model);
    assert!(session.undo());
    assert_eq!(session.model().classes().len(), 1);
}

#[test]
fn test_failed_pre_annotation_rolls_back() {
    let mut session = session();
    tag_classes(&mut session);
    assert!(session.undo());
    let model = session.model().clone();
    let could_redo = session.can_redo();
    assert!(could_redo);

    let mut analyzer = LazyAnalyzer::ready(Box::new(FailingAnalyzer(vec![Candidate::new(
        "Book",
        EntityTag::Class,
        Span::new(31..35),
    )])));
    let err = session
        .pre_annotate(&mut analyzer, &CancelToken::new())
        .unwrap_err();

    assert!(matches!(err, ClassmarkError::PreAnnotationFailed(ref message) if message.contains("tagger crashed")));
    assert_eq!(session.model(), &model);
    assert!(session.is_consistent());
    assert_eq!(session.can_redo(), could_redo);

    assert!(session.undo());
    assert!(session.model().classes().is_empty());
    assert!(session.redo());
    assert_eq!(session.model(), &model);
}

#[test]
fn test_unavailable_analyzer_is_reported() {
    let mut session = session();
    let mut analyzer = LazyAnalyzer::new(|| Err(AnalyzerError::new("no language model")));

    for _ in 0..2 {
        let err = session
            .pre_annotate(&mut analyzer, &CancelToken::new())
            .unwrap_err();
        assert!(
            matches!(err, ClassmarkError::CollaboratorUnavailable(ref reason) if reason == "no language model")
        );
    }
    assert!(!analyzer.is_available());
    assert!(!session.can_undo());
}

#[test]
fn test_export_envelope_flattens_newlines() {
    let mut session = AnnotationSession::new(compact());
    session.set_text("A User\nreads.");
    session.set_tag_mode(EntityTag::Class);
    session.select_word_at(3);

    let json: serde_json::Value = serde_json::from_str(&session.export_envelope()).unwrap();
    assert_eq!(json["text"], "A User reads.");
    assert_eq!(json["classes"][0]["span"], serde_json::json!([2, 6]));
}

#[test]
fn test_set_text_resets_history() {
    let mut session = session();
    tag_classes(&mut session);
    session.set_text("Another text.");
    assert!(session.model().is_empty());
    assert!(!session.can_undo());
    assert_eq!(session.mode(), TagMode::Idle);
}
