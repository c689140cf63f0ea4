//! Error adapter for converting CLI errors to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI.
//!
//! # Multi-Error Support
//!
//! A rejected JSON document ([`classmark_sync::SyncError`]) and a broken
//! session script ([`ScriptError`](crate::script::ScriptError)) can both hold
//! several diagnostics; each one is rendered independently.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, Severity as MietteSeverity, SourceSpan};

use classmark::ClassmarkError;
use classmark_sync::{Diagnostic, Severity};

use crate::{error::CliError, script::ScriptDiagnostic};

/// Adapter for a single JSON sync diagnostic.
pub struct SyncDiagnosticAdapter<'a> {
    diag: &'a Diagnostic,
    /// The JSON document the diagnostic refers to
    src: &'a str,
}

impl<'a> SyncDiagnosticAdapter<'a> {
    pub fn new(diag: &'a Diagnostic, src: &'a str) -> Self {
        Self { diag, src }
    }
}

impl fmt::Debug for SyncDiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncDiagnosticAdapter")
            .field("diag", &self.diag)
            .finish()
    }
}

impl fmt::Display for SyncDiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.diag.pointer() {
            Some(pointer) => write!(f, "{} (at {pointer})", self.diag.message()),
            None => write!(f, "{}", self.diag.message()),
        }
    }
}

impl std::error::Error for SyncDiagnosticAdapter<'_> {}

impl MietteDiagnostic for SyncDiagnosticAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .code()
            .map(|c| Box::new(c) as Box<dyn fmt::Display>)
    }

    fn severity(&self) -> Option<MietteSeverity> {
        Some(match self.diag.severity() {
            Severity::Error => MietteSeverity::Error,
            Severity::Warning => MietteSeverity::Warning,
        })
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .help()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let location = self.diag.location()?;
        let offset = location.byte_offset(self.src);
        let message = self.diag.code().map(|code| code.description().to_string());
        Some(Box::new(std::iter::once(
            LabeledSpan::new_primary_with_span(message, SourceSpan::new(offset.into(), 0)),
        )))
    }
}

/// Adapter for a single session script diagnostic.
pub struct ScriptDiagnosticAdapter<'a> {
    diag: &'a ScriptDiagnostic,
    /// The script source
    src: &'a str,
}

impl<'a> ScriptDiagnosticAdapter<'a> {
    pub fn new(diag: &'a ScriptDiagnostic, src: &'a str) -> Self {
        Self { diag, src }
    }
}

impl fmt::Debug for ScriptDiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptDiagnosticAdapter")
            .field("diag", &self.diag)
            .finish()
    }
}

impl fmt::Display for ScriptDiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.diag.message())
    }
}

impl std::error::Error for ScriptDiagnosticAdapter<'_> {}

impl MietteDiagnostic for ScriptDiagnosticAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("classmark::script"))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .help()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.diag.span();
        Some(Box::new(std::iter::once(LabeledSpan::new_primary_with_span(
            Some("here".to_string()),
            SourceSpan::new(span.start.into(), span.len()),
        ))))
    }
}

/// Adapter for errors without source locations.
pub struct ErrorAdapter<'a>(pub &'a CliError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            CliError::Io(_) => "classmark::io",
            CliError::Config(_) => "classmark::config",
            CliError::Script { .. } => "classmark::script",
            CliError::Classmark(ClassmarkError::InvalidModelStructure { .. }) => "classmark::sync",
            CliError::Classmark(
                ClassmarkError::CollaboratorUnavailable(_)
                | ClassmarkError::PreAnnotationCancelled
                | ClassmarkError::PreAnnotationFailed(_),
            ) => "classmark::preannotate",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        None
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        None
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}

/// A reportable error that can be rendered by miette.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A JSON sync diagnostic located in the annotations document.
    Sync(SyncDiagnosticAdapter<'a>),
    /// A diagnostic located in a session script.
    Script(ScriptDiagnosticAdapter<'a>),
    /// A simple error without source location.
    Error(ErrorAdapter<'a>),
}

impl Reportable<'_> {
    fn inner(&self) -> &dyn MietteDiagnostic {
        match self {
            Reportable::Sync(d) => d,
            Reportable::Script(d) => d,
            Reportable::Error(e) => e,
        }
    }
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.inner(), f)
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Sync(_) | Reportable::Script(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.inner().code()
    }

    fn severity(&self) -> Option<MietteSeverity> {
        self.inner().severity()
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.inner().help()
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        self.inner().source_code()
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        self.inner().labels()
    }
}

/// Convert a [`CliError`] into a list of reportable errors.
///
/// A rejected JSON document or a broken script yields one [`Reportable`] per
/// diagnostic. Every other error yields a single [`Reportable`].
pub fn to_reportables(err: &CliError) -> Vec<Reportable<'_>> {
    match err {
        CliError::Classmark(ClassmarkError::InvalidModelStructure { err: sync_err, src }) => sync_err
            .diagnostics()
            .iter()
            .map(|d| Reportable::Sync(SyncDiagnosticAdapter::new(d, src)))
            .collect(),
        CliError::Script {
            err: script_err,
            src,
        } => script_err
            .diagnostics()
            .iter()
            .map(|d| Reportable::Script(ScriptDiagnosticAdapter::new(d, src)))
            .collect(),
        _ => vec![Reportable::Error(ErrorAdapter(err))],
    }
}

#[cfg(test)]
mod tests {
    use classmark_sync::{ErrorCode, Location, SyncError};

    use crate::script::ScriptError;

    use super::*;

    #[test]
    fn test_sync_diagnostics_are_separate() {
        let src = "{\n  \"classes\": 3\n}";
        let diags = vec![
            Diagnostic::error("`classes` must be an array")
                .with_code(ErrorCode::E102)
                .with_pointer("/classes")
                .with_location(Location::new(2, 15)),
            Diagnostic::error("missing key `relationships`").with_code(ErrorCode::E101),
        ];
        let err = CliError::from(ClassmarkError::new_sync_error(SyncError::new(diags), src));

        let reportables = to_reportables(&err);
        assert_eq!(reportables.len(), 2);
        assert_eq!(
            reportables[0].to_string(),
            "`classes` must be an array (at /classes)"
        );
        assert_eq!(reportables[1].to_string(), "missing key `relationships`");

        let labels: Vec<_> = reportables[0].labels().unwrap().collect();
        assert_eq!(labels.len(), 1);
        assert!(labels[0].primary());
        assert_eq!(labels[0].offset(), 16);
        assert!(reportables[1].labels().is_none());
    }

    #[test]
    fn test_warning_severity() {
        let diag = Diagnostic::warning("duplicate relationship").with_code(ErrorCode::E305);
        let adapter = SyncDiagnosticAdapter::new(&diag, "{}");
        assert_eq!(adapter.severity(), Some(MietteSeverity::Warning));
    }

    #[test]
    fn test_script_diagnostic_labels_span() {
        let script_err = ScriptError::from(
            ScriptDiagnostic::new("unknown command", 10..20).with_help("try `tag class`"),
        );
        let err = CliError::new_script_error(script_err, "tag class\nfrobnicate\n");

        let reportables = to_reportables(&err);
        assert_eq!(reportables.len(), 1);
        assert_eq!(reportables[0].to_string(), "unknown command");
        assert_eq!(
            reportables[0].help().map(|h| h.to_string()),
            Some("try `tag class`".to_string())
        );
        let labels: Vec<_> = reportables[0].labels().unwrap().collect();
        assert_eq!(labels[0].offset(), 10);
        assert_eq!(labels[0].len(), 10);
    }

    #[test]
    fn test_plain_error() {
        let err = CliError::from(ClassmarkError::PreAnnotationCancelled);

        let reportables = to_reportables(&err);

        assert_eq!(reportables.len(), 1);
        match &reportables[0] {
            Reportable::Error(e) => {
                assert_eq!(e.to_string(), "pre-annotation was cancelled");
                assert_eq!(
                    e.code().map(|c| c.to_string()),
                    Some("classmark::preannotate".to_string())
                );
            }
            _ => panic!("Expected Error"),
        }
    }

    #[test]
    fn test_io_error_code() {
        let err = CliError::from(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "library.txt",
        ));

        let reportables = to_reportables(&err);

        assert_eq!(reportables.len(), 1);
        assert_eq!(
            reportables[0].code().map(|c| c.to_string()),
            Some("classmark::io".to_string())
        );
    }
}
