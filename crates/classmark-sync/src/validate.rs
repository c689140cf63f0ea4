//! Consistency validation of decoded documents.
//!
//! [`build_model`] turns a [`ModelDocument`] into an [`AnnotationModel`],
//! reporting every span and reference problem it finds rather than stopping
//! at the first. Classes are registered before any member or relationship,
//! so references never depend on document order.

use std::collections::BTreeMap;

use log::debug;

use classmark_core::{AnnotationModel, ModelError, Span};

use crate::{
    document::{ModelDocument, RelationshipDocument, SpanArray},
    error::{Diagnostic, DiagnosticCollector, ErrorCode, SyncError},
};

/// Build a validated model from a decoded document.
///
/// Returns the model along with the warnings for any normalization applied.
///
/// # Errors
///
/// Returns a [`SyncError`] holding every consistency error found.
pub fn build_model(doc: &ModelDocument) -> Result<(AnnotationModel, Vec<Diagnostic>), SyncError> {
    let mut builder = ModelBuilder::default();

    let mut owners = Vec::with_capacity(doc.classes.len());
    for (index, class) in doc.classes.iter().enumerate() {
        let pointer = format!("/classes/{index}/span");
        let owner = builder.claim(class.span, &pointer).and_then(|span| {
            match builder.model.add_class(&class.name, span) {
                Ok(_) => Some(span),
                Err(err) => {
                    builder.reject(err, &pointer);
                    None
                }
            }
        });
        owners.push(owner);
    }

    for (index, (class, owner)) in doc.classes.iter().zip(owners).enumerate() {
        // Errors for the class itself were already reported.
        let Some(owner) = owner else { continue };

        for (attr_index, attr) in class.attributes.iter().enumerate() {
            let pointer = format!("/classes/{index}/attributes/{attr_index}/span");
            let Some(span) = builder.claim(attr.span, &pointer) else {
                continue;
            };
            if let Err(err) =
                builder
                    .model
                    .add_attribute_typed(&attr.name, span, owner, &attr.type_name)
            {
                builder.reject(err, &pointer);
            }
        }

        for (method_index, method) in class.methods.iter().enumerate() {
            let pointer = format!("/classes/{index}/methods/{method_index}/span");
            let Some(span) = builder.claim(method.span, &pointer) else {
                continue;
            };
            if let Err(err) = builder.model.add_method_with_parameters(
                &method.name,
                span,
                owner,
                method.parameters.clone(),
            ) {
                builder.reject(err, &pointer);
            }
        }
    }

    for (index, rel) in doc.relationships.iter().enumerate() {
        builder.add_relationship(index, rel);
    }

    let ModelBuilder {
        model, collector, ..
    } = builder;
    let warnings = collector.finish()?;
    debug!(
        classes = model.classes().len(),
        relationships = model.relationships().len(),
        warnings = warnings.len();
        "Document validated"
    );
    Ok((model, warnings))
}

#[derive(Default)]
struct ModelBuilder {
    model: AnnotationModel,
    collector: DiagnosticCollector,
    /// Pointer of the first entity claiming each span.
    claimed: BTreeMap<Span, String>,
}

impl ModelBuilder {
    /// Convert `span` and reserve it for one entity.
    fn claim(&mut self, span: SpanArray, pointer: &str) -> Option<Span> {
        let span = self.convert(span, pointer)?;
        if let Some(first) = self.claimed.get(&span) {
            self.collector.emit(
                Diagnostic::error(format!("span {span} is claimed twice"))
                    .with_code(ErrorCode::E300)
                    .with_pointer(pointer)
                    .with_help(format!("first claimed at {first}")),
            );
            return None;
        }
        self.claimed.insert(span, pointer.to_string());
        Some(span)
    }

    fn convert(&mut self, span: SpanArray, pointer: &str) -> Option<Span> {
        let converted = span.to_span();
        if converted.is_none() {
            self.collector.emit(
                Diagnostic::error(format!("span [{}, {}] is empty or inverted", span.0, span.1))
                    .with_code(ErrorCode::E200)
                    .with_pointer(pointer)
                    .with_help("spans are [start, end] with start < end"),
            );
        }
        converted
    }

    fn reject(&mut self, err: ModelError, pointer: &str) {
        let code = match err {
            ModelError::DuplicateEntity { .. } => ErrorCode::E301,
            ModelError::UnresolvedEndpoint { .. } | ModelError::NotAClass { .. } => {
                ErrorCode::E302
            }
            ModelError::SelfRelationshipRejected { .. } => ErrorCode::E303,
            ModelError::DuplicateSpanConflict { .. }
            | ModelError::OverlappingSpan { .. }
            | ModelError::EntityKindConflict { .. }
            | ModelError::NoContextClass => ErrorCode::E300,
        };
        self.collector.emit(
            Diagnostic::error(err.to_string())
                .with_code(code)
                .with_pointer(pointer),
        );
    }

    fn add_relationship(&mut self, index: usize, rel: &RelationshipDocument) {
        let base = format!("/relationships/{index}");
        let from = self.convert(rel.from_span, &format!("{base}/from_span"));
        let to = self.convert(rel.to_span, &format!("{base}/to_span"));
        let (Some(from), Some(to)) = (from, to) else {
            return;
        };

        if from == to {
            self.reject(ModelError::SelfRelationshipRejected { span: from }, &base);
            return;
        }

        let from_class = self.endpoint_name(from, &rel.from_class, &format!("{base}/from_class"));
        let to_class = self.endpoint_name(to, &rel.to_class, &format!("{base}/to_class"));
        let (Some(from_class), Some(to_class)) = (from_class, to_class) else {
            return;
        };

        match self
            .model
            .add_relationship(&from_class, &to_class, rel.kind, from, to)
        {
            Ok(applied) if applied.is_inserted() => {}
            Ok(_) => self.collector.emit(
                Diagnostic::warning(format!(
                    "duplicate {} relationship {from_class} -> {to_class} collapsed",
                    rel.kind
                ))
                .with_code(ErrorCode::E305)
                .with_pointer(base),
            ),
            Err(err) => self.reject(err, &base),
        }
    }

    /// Resolve an endpoint span to its class name.
    ///
    /// A differing name in the document is replaced by the class name.
    fn endpoint_name(&mut self, span: Span, name: &str, pointer: &str) -> Option<String> {
        let Some(class) = self.model.class_at(span) else {
            self.collector.emit(
                Diagnostic::error(format!(
                    "relationship endpoint {span} does not match any class"
                ))
                .with_code(ErrorCode::E302)
                .with_pointer(pointer)
                .with_help("relationship spans must equal the span of a class"),
            );
            return None;
        };

        let class_name = class.name().to_string();
        if class_name != name {
            self.collector.emit(
                Diagnostic::warning(format!(
                    "endpoint name `{name}` does not match class `{class_name}` at {span}"
                ))
                .with_code(ErrorCode::E304)
                .with_pointer(pointer)
                .with_help(format!("the name was replaced with `{class_name}`")),
            );
        }
        Some(class_name)
    }
}
