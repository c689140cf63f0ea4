//! Serde documents mirroring the exported JSON shape.
//!
//! These types are the wire representation only. Conversion to the domain
//! [`AnnotationModel`] goes through the validator, which enforces the
//! consistency rules the documents cannot express.

use serde::{Deserialize, Serialize};

use classmark_core::{
    AnnotationModel, RelationshipKind, Span,
    model::{Attribute, Class, DEFAULT_ATTRIBUTE_TYPE, Method, Relationship},
};

/// A span encoded as a two-element `[start, end]` array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanArray(pub usize, pub usize);

impl From<Span> for SpanArray {
    fn from(span: Span) -> Self {
        Self(span.start(), span.end())
    }
}

impl SpanArray {
    /// Convert into a [`Span`], or `None` if the pair is empty or inverted.
    pub fn to_span(self) -> Option<Span> {
        Span::try_new(self.0, self.1)
    }
}

/// Root model document: `{"classes": [...], "relationships": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDocument {
    pub classes: Vec<ClassDocument>,
    pub relationships: Vec<RelationshipDocument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDocument {
    pub name: String,
    pub span: SpanArray,
    #[serde(default)]
    pub attributes: Vec<AttributeDocument>,
    #[serde(default)]
    pub methods: Vec<MethodDocument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDocument {
    pub name: String,
    pub span: SpanArray,
    #[serde(rename = "type", default = "default_attribute_type")]
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDocument {
    pub name: String,
    pub span: SpanArray,
    #[serde(default)]
    pub parameters: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipDocument {
    pub from_class: String,
    pub to_class: String,
    #[serde(rename = "type")]
    pub kind: RelationshipKind,
    pub from_span: SpanArray,
    pub to_span: SpanArray,
}

/// Export envelope: the model plus the annotated text as a sibling key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeDocument {
    pub text: String,
    #[serde(flatten)]
    pub model: ModelDocument,
}

fn default_attribute_type() -> String {
    DEFAULT_ATTRIBUTE_TYPE.to_string()
}

impl From<&Attribute> for AttributeDocument {
    fn from(attr: &Attribute) -> Self {
        Self {
            name: attr.name().to_string(),
            span: attr.span().into(),
            type_name: attr.type_name().to_string(),
        }
    }
}

impl From<&Method> for MethodDocument {
    fn from(method: &Method) -> Self {
        Self {
            name: method.name().to_string(),
            span: method.span().into(),
            parameters: method.parameters().to_vec(),
        }
    }
}

impl From<&Class> for ClassDocument {
    fn from(class: &Class) -> Self {
        Self {
            name: class.name().to_string(),
            span: class.span().into(),
            attributes: class.attributes().iter().map(Into::into).collect(),
            methods: class.methods().iter().map(Into::into).collect(),
        }
    }
}

impl From<&Relationship> for RelationshipDocument {
    fn from(rel: &Relationship) -> Self {
        Self {
            from_class: rel.from_class().to_string(),
            to_class: rel.to_class().to_string(),
            kind: rel.kind(),
            from_span: rel.from_span().into(),
            to_span: rel.to_span().into(),
        }
    }
}

impl From<&AnnotationModel> for ModelDocument {
    fn from(model: &AnnotationModel) -> Self {
        Self {
            classes: model.classes().iter().map(Into::into).collect(),
            relationships: model.relationships().iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_array_serializes_as_pair() {
        let json = serde_json::to_string(&SpanArray(2, 6)).unwrap();
        assert_eq!(json, "[2,6]");

        let span: SpanArray = serde_json::from_str("[20, 24]").unwrap();
        assert_eq!(span.to_span(), Some(Span::new(20..24)));
    }

    #[test]
    fn test_span_array_rejects_wrong_arity() {
        assert!(serde_json::from_str::<SpanArray>("[1]").is_err());
        assert!(serde_json::from_str::<SpanArray>("[1, 2, 3]").is_err());
        assert!(serde_json::from_str::<SpanArray>("[-1, 2]").is_err());
    }

    #[test]
    fn test_inverted_span_array_has_no_span() {
        assert_eq!(SpanArray(6, 2).to_span(), None);
        assert_eq!(SpanArray(4, 4).to_span(), None);
    }

    #[test]
    fn test_member_defaults() {
        let attr: AttributeDocument =
            serde_json::from_str(r#"{"name": "title", "span": [5, 10]}"#).unwrap();
        assert_eq!(attr.type_name, "String");

        let class: ClassDocument =
            serde_json::from_str(r#"{"name": "Book", "span": [0, 4]}"#).unwrap();
        assert!(class.attributes.is_empty());
        assert!(class.methods.is_empty());
    }

    #[test]
    fn test_relationship_type_key() {
        let rel: RelationshipDocument = serde_json::from_str(
            r#"{"from_class": "User", "to_class": "Book", "type": "composition",
                "from_span": [2, 6], "to_span": [20, 24]}"#,
        )
        .unwrap();
        assert_eq!(rel.kind, RelationshipKind::Composition);
    }
}
