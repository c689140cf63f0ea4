//! Serialization of annotation models to JSON.

use log::debug;

use classmark_core::AnnotationModel;

use crate::document::{EnvelopeDocument, ModelDocument};

/// Options for [`export_envelope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    /// Indent the output.
    pub pretty: bool,
    /// Replace line breaks in the text with spaces.
    ///
    /// Each `\r` and `\n` becomes one space, so character offsets stay valid.
    pub flatten_newlines: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            pretty: true,
            flatten_newlines: true,
        }
    }
}

/// Serialize `model` as compact JSON.
pub fn to_json(model: &AnnotationModel) -> String {
    serde_json::to_string(&ModelDocument::from(model))
        .expect("annotation documents always serialize")
}

/// Serialize `model` as indented JSON.
pub fn to_json_pretty(model: &AnnotationModel) -> String {
    serde_json::to_string_pretty(&ModelDocument::from(model))
        .expect("annotation documents always serialize")
}

/// Serialize `model` together with the text it annotates.
pub fn export_envelope(text: &str, model: &AnnotationModel, options: &ExportOptions) -> String {
    let text = if options.flatten_newlines {
        text.chars()
            .map(|c| if matches!(c, '\r' | '\n') { ' ' } else { c })
            .collect()
    } else {
        text.to_string()
    };
    let envelope = EnvelopeDocument {
        text,
        model: model.into(),
    };
    debug!(
        pretty = options.pretty,
        flatten_newlines = options.flatten_newlines;
        "Exporting envelope"
    );
    let result = if options.pretty {
        serde_json::to_string_pretty(&envelope)
    } else {
        serde_json::to_string(&envelope)
    };
    result.expect("annotation documents always serialize")
}

#[cfg(test)]
mod tests {
    use super::*;
    use classmark_core::{RelationshipKind, Span};
    use serde_json::{Value, json};

    fn user_book() -> AnnotationModel {
        let mut model = AnnotationModel::new();
        model.add_class("User", Span::new(2..6)).unwrap();
        model.add_class("Book", Span::new(20..24)).unwrap();
        model
            .add_relationship(
                "User",
                "Book",
                RelationshipKind::Association,
                Span::new(2..6),
                Span::new(20..24),
            )
            .unwrap();
        model
    }

    #[test]
    fn test_empty_model_json() {
        assert_eq!(
            to_json(&AnnotationModel::new()),
            r#"{"classes":[],"relationships":[]}"#
        );
    }

    #[test]
    fn test_model_json_shape() {
        let value: Value = serde_json::from_str(&to_json_pretty(&user_book())).unwrap();
        assert_eq!(
            value["relationships"][0],
            json!({
                "from_class": "User",
                "to_class": "Book",
                "type": "association",
                "from_span": [2, 6],
                "to_span": [20, 24]
            })
        );
        assert_eq!(
            value["classes"][0],
            json!({"name": "User", "span": [2, 6], "attributes": [], "methods": []})
        );
    }

    #[test]
    fn test_envelope_flattens_newlines() {
        let text = "A User\ncan borrow\r\na Book.";
        let json = export_envelope(text, &AnnotationModel::new(), &ExportOptions::default());
        let value: Value = serde_json::from_str(&json).unwrap();
        let exported = value["text"].as_str().unwrap();
        assert_eq!(exported, "A User can borrow  a Book.");
        assert_eq!(exported.chars().count(), text.chars().count());
    }

    #[test]
    fn test_envelope_keeps_newlines_when_asked() {
        let options = ExportOptions {
            pretty: false,
            flatten_newlines: false,
        };
        let json = export_envelope("a\nb", &AnnotationModel::new(), &options);
        assert_eq!(
            json,
            r#"{"text":"a\nb","classes":[],"relationships":[]}"#
        );
    }
}
