//! Phased parsing of JSON documents back into annotation models.
//!
//! 1. Syntax: the source must be JSON.
//! 2. Structure: the top level must be an object with the required keys.
//! 3. Shape: each entry is decoded into its typed document.
//! 4. Consistency: see [`crate::validate`].
//!
//! Each phase reports every problem it finds before the next one runs.

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use classmark_core::AnnotationModel;

use crate::{
    document::{ClassDocument, ModelDocument, RelationshipDocument},
    error::{Diagnostic, DiagnosticCollector, ErrorCode, Location, SyncError},
    validate,
};

/// A successfully parsed model and any warnings raised while normalizing it.
#[derive(Debug, Clone)]
pub struct ParsedModel {
    pub model: AnnotationModel,
    pub warnings: Vec<Diagnostic>,
}

/// A successfully parsed export envelope.
#[derive(Debug, Clone)]
pub struct ParsedEnvelope {
    pub text: String,
    pub model: AnnotationModel,
    pub warnings: Vec<Diagnostic>,
}

/// Parse a model document.
///
/// # Errors
///
/// Returns a [`SyncError`] if the source is not JSON, is not an object with
/// `classes` and `relationships`, has badly shaped fields, or describes an
/// inconsistent model.
pub fn parse_model(src: &str) -> Result<ParsedModel, SyncError> {
    let object = read_object(src, &[])?;
    let doc = decode_model(&object)?;
    let (model, warnings) = validate::build_model(&doc)?;
    report_warnings(&warnings);
    Ok(ParsedModel { model, warnings })
}

/// Parse an export envelope, which carries the text next to the model.
///
/// # Errors
///
/// As [`parse_model`], and additionally requires a string `text` key.
pub fn parse_envelope(src: &str) -> Result<ParsedEnvelope, SyncError> {
    let object = read_object(src, &["text"])?;
    let text = match object.get("text") {
        Some(Value::String(text)) => text.clone(),
        _ => {
            return Err(Diagnostic::error("`text` must be a string")
                .with_code(ErrorCode::E102)
                .with_pointer("/text")
                .into());
        }
    };
    let doc = decode_model(&object)?;
    let (model, warnings) = validate::build_model(&doc)?;
    report_warnings(&warnings);
    Ok(ParsedEnvelope {
        text,
        model,
        warnings,
    })
}

/// Run the syntax and structure phases.
fn read_object(src: &str, extra_keys: &[&str]) -> Result<Map<String, Value>, SyncError> {
    let value: Value = serde_json::from_str(src).map_err(|err| {
        Diagnostic::error(format!("malformed JSON: {err}"))
            .with_code(ErrorCode::E001)
            .with_location(Location::new(err.line(), err.column()))
    })?;

    let Value::Object(object) = value else {
        return Err(Diagnostic::error(format!(
            "expected a JSON object at the top level, found {}",
            kind_of(&value)
        ))
        .with_code(ErrorCode::E100)
        .with_pointer("")
        .with_help("a model looks like {\"classes\": [], \"relationships\": []}")
        .into());
    };

    let mut collector = DiagnosticCollector::new();
    for key in ["classes", "relationships"].iter().chain(extra_keys) {
        if !object.contains_key(*key) {
            collector.emit(
                Diagnostic::error(format!("missing required key `{key}`"))
                    .with_code(ErrorCode::E101)
                    .with_pointer(""),
            );
        }
    }
    collector.finish()?;
    Ok(object)
}

/// Run the shape phase over `classes` and `relationships`.
fn decode_model(object: &Map<String, Value>) -> Result<ModelDocument, SyncError> {
    let mut collector = DiagnosticCollector::new();
    let classes = decode_list::<ClassDocument>(object, "classes", &mut collector);
    let relationships = decode_list::<RelationshipDocument>(object, "relationships", &mut collector);
    collector.finish()?;
    Ok(ModelDocument {
        classes,
        relationships,
    })
}

fn decode_list<T: DeserializeOwned>(
    object: &Map<String, Value>,
    key: &str,
    collector: &mut DiagnosticCollector,
) -> Vec<T> {
    let Some(Value::Array(items)) = object.get(key) else {
        let found = object.get(key).map_or("nothing", kind_of);
        collector.emit(
            Diagnostic::error(format!("`{key}` must be an array, found {found}"))
                .with_code(ErrorCode::E102)
                .with_pointer(format!("/{key}")),
        );
        return Vec::new();
    };

    let mut decoded = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match T::deserialize(item) {
            Ok(doc) => decoded.push(doc),
            Err(err) => collector.emit(
                Diagnostic::error(format!("invalid entry: {err}"))
                    .with_code(ErrorCode::E102)
                    .with_pointer(format!("/{key}/{index}"))
                    .with_help("spans are two-element arrays of non-negative integers"),
            ),
        }
    }
    decoded
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn report_warnings(warnings: &[Diagnostic]) {
    for warning in warnings {
        warn!(warning:%; "Model normalized during import");
    }
    debug!(warnings = warnings.len(); "JSON model parsed");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_code(err: &SyncError) -> Option<ErrorCode> {
        err.diagnostics().first().and_then(Diagnostic::code)
    }

    #[test]
    fn test_parse_empty_model() {
        let parsed = parse_model(r#"{"classes": [], "relationships": []}"#).unwrap();
        assert!(parsed.model.is_empty());
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn test_malformed_json_has_location() {
        let err = parse_model("{\n  \"classes\": [,\n}").unwrap_err();
        let diag = &err.diagnostics()[0];
        assert_eq!(diag.code(), Some(ErrorCode::E001));
        assert_eq!(diag.location().map(|loc| loc.line()), Some(2));
    }

    #[test]
    fn test_top_level_must_be_object() {
        let err = parse_model("[1, 2]").unwrap_err();
        assert_eq!(first_code(&err), Some(ErrorCode::E100));
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn test_missing_keys_are_all_reported() {
        let err = parse_envelope("{}").unwrap_err();
        assert_eq!(err.diagnostics().len(), 3);
        assert!(
            err.diagnostics()
                .iter()
                .all(|diag| diag.code() == Some(ErrorCode::E101))
        );
    }

    #[test]
    fn test_bad_span_shape_points_at_entry() {
        let src = r#"{
            "classes": [
                {"name": "User", "span": [2, 6]},
                {"name": "Book", "span": [20]}
            ],
            "relationships": [{"from_class": "User", "to_class": "Book",
                               "type": "friendship", "from_span": [2, 6], "to_span": [20, 24]}]
        }"#;
        let err = parse_model(src).unwrap_err();
        let pointers: Vec<_> = err.diagnostics().iter().filter_map(Diagnostic::pointer).collect();
        assert_eq!(pointers, vec!["/classes/1", "/relationships/0"]);
        assert_eq!(first_code(&err), Some(ErrorCode::E102));
    }

    #[test]
    fn test_classes_must_be_array() {
        let err = parse_model(r#"{"classes": {}, "relationships": []}"#).unwrap_err();
        assert_eq!(err.diagnostics()[0].pointer(), Some("/classes"));
    }

    #[test]
    fn test_envelope_text_must_be_string() {
        let err =
            parse_envelope(r#"{"text": 3, "classes": [], "relationships": []}"#).unwrap_err();
        assert_eq!(first_code(&err), Some(ErrorCode::E102));
        assert_eq!(err.diagnostics()[0].pointer(), Some("/text"));
    }

    #[test]
    fn test_parse_envelope() {
        let src = r#"{"text": "A User can borrow a Book.",
                      "classes": [{"name": "User", "span": [2, 6]}],
                      "relationships": []}"#;
        let parsed = parse_envelope(src).unwrap();
        assert_eq!(parsed.text, "A User can borrow a Book.");
        assert_eq!(parsed.model.classes()[0].name(), "User");
    }
}
