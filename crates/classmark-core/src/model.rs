//! The annotation model: classes with their attributes and methods, plus the
//! relationships linking classes.
//!
//! Spans are the identity of every entity. Display names are free text and
//! may repeat (two mentions of "User" are two classes), but a span belongs to
//! at most one entity across the whole model. All `add_*` operations are
//! idempotent: replaying the same input reports [`Applied::AlreadyPresent`]
//! and leaves the model unchanged.

use log::trace;

use crate::{
    error::ModelError,
    span::Span,
    tag::{EntityTag, RelationshipKind},
};

/// Type marker given to attributes when none is supplied. Never inferred.
pub const DEFAULT_ATTRIBUTE_TYPE: &str = "String";

/// Outcome of a successful model mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// A new record was created.
    Inserted,
    /// An identical record already existed; nothing changed.
    AlreadyPresent,
}

impl Applied {
    pub fn is_inserted(&self) -> bool {
        matches!(self, Applied::Inserted)
    }
}

/// An attribute owned by exactly one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    name: String,
    span: Span,
    type_name: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, span: Span, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            span,
            type_name: type_name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}

/// A method owned by exactly one class.
///
/// Parameters are never extracted from text; they only survive a JSON
/// round trip when an editor supplied them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    name: String,
    span: Span,
    parameters: Vec<String>,
}

impl Method {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self::with_parameters(name, span, Vec::new())
    }

    pub fn with_parameters(name: impl Into<String>, span: Span, parameters: Vec<String>) -> Self {
        Self {
            name: name.into(),
            span,
            parameters,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }
}

/// A class mention and the members scoped to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Class {
    name: String,
    span: Span,
    attributes: Vec<Attribute>,
    methods: Vec<Method>,
}

impl Class {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
            attributes: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// The kind and name of the member of this class at exactly `span`.
    fn member_at(&self, span: Span) -> Option<(EntityTag, &str)> {
        if let Some(attr) = self.attributes.iter().find(|attr| attr.span == span) {
            return Some((EntityTag::Attribute, &attr.name));
        }
        self.methods
            .iter()
            .find(|method| method.span == span)
            .map(|method| (EntityTag::Method, method.name.as_str()))
    }
}

/// A typed, directed link between two class mentions.
///
/// Identity is `(from_span, to_span, kind)`; the class names are carried for
/// display and export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    from_class: String,
    to_class: String,
    kind: RelationshipKind,
    from_span: Span,
    to_span: Span,
}

impl Relationship {
    pub fn new(
        from_class: impl Into<String>,
        to_class: impl Into<String>,
        kind: RelationshipKind,
        from_span: Span,
        to_span: Span,
    ) -> Self {
        Self {
            from_class: from_class.into(),
            to_class: to_class.into(),
            kind,
            from_span,
            to_span,
        }
    }

    pub fn from_class(&self) -> &str {
        &self.from_class
    }

    pub fn to_class(&self) -> &str {
        &self.to_class
    }

    pub fn kind(&self) -> RelationshipKind {
        self.kind
    }

    pub fn from_span(&self) -> Span {
        self.from_span
    }

    pub fn to_span(&self) -> Span {
        self.to_span
    }

    /// The uniqueness key of this relationship.
    pub fn key(&self) -> (Span, Span, RelationshipKind) {
        (self.from_span, self.to_span, self.kind)
    }
}

/// A tagged span as seen through the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaggedSpan<'a> {
    pub span: Span,
    pub tag: EntityTag,
    pub name: &'a str,
    /// Name of the owning class, for attributes and methods.
    pub owner: Option<&'a str>,
}

/// The exported root: every class mention and every relationship.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationModel {
    classes: Vec<Class>,
    relationships: Vec<Relationship>,
}

impl AnnotationModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classes(&self) -> &[Class] {
        &self.classes
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.relationships.is_empty()
    }

    /// Remove every class and relationship.
    pub fn clear(&mut self) {
        self.classes.clear();
        self.relationships.clear();
    }

    /// The class whose own span is exactly `span`.
    pub fn class_at(&self, span: Span) -> Option<&Class> {
        self.classes.iter().find(|class| class.span == span)
    }

    fn class_index_at(&self, span: Span) -> Option<usize> {
        self.classes.iter().position(|class| class.span == span)
    }

    /// The entity of any kind occupying exactly `span`.
    pub fn entity_at(&self, span: Span) -> Option<TaggedSpan<'_>> {
        self.tagged_spans().find(|tagged| tagged.span == span)
    }

    /// Every tagged span in the model: each class followed by its attributes
    /// and methods.
    pub fn tagged_spans(&self) -> impl Iterator<Item = TaggedSpan<'_>> {
        self.classes.iter().flat_map(|class| {
            let owner = Some(class.name.as_str());
            let head = TaggedSpan {
                span: class.span,
                tag: EntityTag::Class,
                name: &class.name,
                owner: None,
            };
            let attributes = class.attributes.iter().map(move |attr| TaggedSpan {
                span: attr.span,
                tag: EntityTag::Attribute,
                name: &attr.name,
                owner,
            });
            let methods = class.methods.iter().map(move |method| TaggedSpan {
                span: method.span,
                tag: EntityTag::Method,
                name: &method.name,
                owner,
            });
            std::iter::once(head).chain(attributes).chain(methods)
        })
    }

    /// Add a class mention at `span`.
    ///
    /// Classes sharing a name at different spans are distinct mentions and
    /// are permitted, unless the spans overlap, which is reported as
    /// [`ModelError::DuplicateEntity`].
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DuplicateSpanConflict`] if `span` is held by a
    /// different entity.
    pub fn add_class(&mut self, name: &str, span: Span) -> Result<Applied, ModelError> {
        if let Some(existing) = self.entity_at(span) {
            return match existing.tag {
                EntityTag::Class if existing.name == name => Ok(Applied::AlreadyPresent),
                _ => Err(ModelError::DuplicateSpanConflict {
                    span,
                    existing_tag: existing.tag,
                    existing_text: existing.name.to_string(),
                }),
            };
        }

        if let Some(other) = self
            .classes
            .iter()
            .find(|class| class.span.overlaps(span) && same_name(&class.name, name))
        {
            return Err(ModelError::DuplicateEntity {
                name: name.to_string(),
                span,
                existing: other.span,
            });
        }

        trace!(name, span:% = span; "Class added");
        self.classes.push(Class::new(name, span));
        Ok(Applied::Inserted)
    }

    /// Add an attribute with the default type marker.
    ///
    /// # Errors
    ///
    /// See [`AnnotationModel::add_attribute_typed`].
    pub fn add_attribute(
        &mut self,
        name: &str,
        span: Span,
        owner: Span,
    ) -> Result<Applied, ModelError> {
        self.add_attribute_typed(name, span, owner, DEFAULT_ATTRIBUTE_TYPE)
    }

    /// Add an attribute to the class at `owner`.
    ///
    /// # Errors
    ///
    /// - [`ModelError::NoContextClass`] if `owner` is not a class span.
    /// - [`ModelError::EntityKindConflict`] if the class already has a method
    ///   (or is itself) at `span`.
    /// - [`ModelError::DuplicateSpanConflict`] if `span` is held elsewhere.
    pub fn add_attribute_typed(
        &mut self,
        name: &str,
        span: Span,
        owner: Span,
        type_name: &str,
    ) -> Result<Applied, ModelError> {
        let index = self.prepare_member(EntityTag::Attribute, name, span, owner)?;
        let Some(index) = index else {
            return Ok(Applied::AlreadyPresent);
        };
        let class = &mut self.classes[index];
        trace!(name, span:% = span, owner = class.name.as_str(); "Attribute added");
        class.attributes.push(Attribute::new(name, span, type_name));
        Ok(Applied::Inserted)
    }

    /// Add a method to the class at `owner`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`AnnotationModel::add_attribute_typed`], with the
    /// roles of attribute and method swapped.
    pub fn add_method(&mut self, name: &str, span: Span, owner: Span) -> Result<Applied, ModelError> {
        self.add_method_with_parameters(name, span, owner, Vec::new())
    }

    /// Add a method carrying explicit parameters (used when re-importing JSON).
    ///
    /// # Errors
    ///
    /// See [`AnnotationModel::add_method`].
    pub fn add_method_with_parameters(
        &mut self,
        name: &str,
        span: Span,
        owner: Span,
        parameters: Vec<String>,
    ) -> Result<Applied, ModelError> {
        let index = self.prepare_member(EntityTag::Method, name, span, owner)?;
        let Some(index) = index else {
            return Ok(Applied::AlreadyPresent);
        };
        let class = &mut self.classes[index];
        trace!(name, span:% = span, owner = class.name.as_str(); "Method added");
        class
            .methods
            .push(Method::with_parameters(name, span, parameters));
        Ok(Applied::Inserted)
    }

    /// Shared validation for attributes and methods.
    ///
    /// Returns the owner's index when the member should be inserted, or
    /// `None` when the identical member already exists.
    fn prepare_member(
        &self,
        tag: EntityTag,
        name: &str,
        span: Span,
        owner: Span,
    ) -> Result<Option<usize>, ModelError> {
        let index = self
            .class_index_at(owner)
            .ok_or(ModelError::NoContextClass)?;
        let class = &self.classes[index];

        if class.span == span {
            return Err(ModelError::EntityKindConflict {
                span,
                existing: EntityTag::Class,
            });
        }

        match class.member_at(span) {
            Some((existing_tag, existing_name)) if existing_tag == tag => {
                if existing_name == name {
                    return Ok(None);
                }
                return Err(ModelError::DuplicateSpanConflict {
                    span,
                    existing_tag,
                    existing_text: existing_name.to_string(),
                });
            }
            Some((existing_tag, _)) => {
                return Err(ModelError::EntityKindConflict {
                    span,
                    existing: existing_tag,
                });
            }
            None => {}
        }

        if let Some(existing) = self.entity_at(span) {
            return Err(ModelError::DuplicateSpanConflict {
                span,
                existing_tag: existing.tag,
                existing_text: existing.name.to_string(),
            });
        }

        Ok(Some(index))
    }

    /// Link two class mentions.
    ///
    /// # Errors
    ///
    /// - [`ModelError::SelfRelationshipRejected`] if both spans are equal.
    /// - [`ModelError::UnresolvedEndpoint`] if either span is not a class.
    pub fn add_relationship(
        &mut self,
        from_class: &str,
        to_class: &str,
        kind: RelationshipKind,
        from_span: Span,
        to_span: Span,
    ) -> Result<Applied, ModelError> {
        if from_span == to_span {
            return Err(ModelError::SelfRelationshipRejected { span: from_span });
        }
        for span in [from_span, to_span] {
            if self.class_at(span).is_none() {
                return Err(ModelError::UnresolvedEndpoint { span });
            }
        }

        let key = (from_span, to_span, kind);
        if self.relationships.iter().any(|rel| rel.key() == key) {
            return Ok(Applied::AlreadyPresent);
        }

        trace!(from = from_class, to = to_class, kind:% = kind; "Relationship added");
        self.relationships.push(Relationship::new(
            from_class, to_class, kind, from_span, to_span,
        ));
        Ok(Applied::Inserted)
    }
}

fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}
