//! The core diagnostic type for the synchronization error system.
//!
//! A [`Diagnostic`] represents a single error or warning with an optional
//! error code, a JSON pointer to the offending value, a line/column location
//! for syntax errors, and help text.

use std::fmt;

use crate::error::{Severity, error_code::ErrorCode};

/// A 1-based line and column inside the JSON source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    line: usize,
    column: usize,
}

impl Location {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }

    /// Convert this location into a byte offset inside `source`.
    ///
    /// Columns count bytes, as reported by `serde_json`. The result is
    /// clamped to the line and moved back onto a character boundary.
    pub fn byte_offset(&self, source: &str) -> usize {
        let mut offset = 0;
        for (index, line) in source.split_inclusive('\n').enumerate() {
            if index + 1 == self.line {
                let within = self.column.saturating_sub(1).min(line.len());
                return floor_char_boundary(source, offset + within);
            }
            offset += line.len();
        }
        source.len()
    }
}

fn floor_char_boundary(source: &str, mut offset: usize) -> usize {
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A diagnostic message about a JSON document.
///
/// Diagnostics provide detailed information about errors and warnings,
/// including:
/// - A severity level
/// - An optional error code for documentation and searchability
/// - A primary message describing the issue
/// - An optional JSON pointer (RFC 6901) to the offending value
/// - An optional line/column for syntax errors
/// - Optional help text with suggestions
///
/// # Example
///
/// ```text
/// error[E302]: relationship endpoint [40, 45] does not match any class
///   at /relationships/0/to_span
///   = help: relationship spans must equal the span of a class
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    severity: Severity,
    code: Option<ErrorCode>,
    message: String,
    pointer: Option<String>,
    location: Option<Location>,
    help: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    ///
    /// # Example
    ///
    /// ```
    /// # use classmark_sync::error::{Diagnostic, ErrorCode};
    ///
    /// let diag = Diagnostic::error("span [2, 6] is claimed twice")
    ///     .with_code(ErrorCode::E300)
    ///     .with_pointer("/classes/1/span")
    ///     .with_help("every tagged span belongs to exactly one entity");
    /// ```
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Get the severity of this diagnostic.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Get the error code, if any.
    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    /// Get the primary message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the JSON pointer to the offending value, if any.
    pub fn pointer(&self) -> Option<&str> {
        self.pointer.as_deref()
    }

    /// Get the source location, if any.
    pub fn location(&self) -> Option<Location> {
        self.location
    }

    /// Get the help text, if any.
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Set the error code.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Set the JSON pointer.
    pub fn with_pointer(mut self, pointer: impl Into<String>) -> Self {
        self.pointer = Some(pointer.into());
        self
    }

    /// Set the source location.
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Set the help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            pointer: None,
            location: None,
            help: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format: "error[E001]: message at /pointer" or "error: message"
        write!(f, "{}", self.severity)?;
        if let Some(code) = self.code {
            write!(f, "[{}]", code)?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(pointer) = &self.pointer {
            write!(f, " at {}", pointer)?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_new() {
        let diag = Diagnostic::new(Severity::Error, "test error");

        assert!(diag.severity().is_error());
        assert!(!diag.severity().is_warning());
        assert_eq!(diag.message(), "test error");
        assert!(diag.code().is_none());
        assert!(diag.pointer().is_none());
        assert!(diag.location().is_none());
        assert!(diag.help().is_none());
    }

    #[test]
    fn test_diagnostic_builder_chain() {
        let diag = Diagnostic::error("span claimed twice")
            .with_code(ErrorCode::E300)
            .with_pointer("/classes/1/span")
            .with_location(Location::new(3, 7))
            .with_help("remove one of the entities");

        assert_eq!(diag.code(), Some(ErrorCode::E300));
        assert_eq!(diag.pointer(), Some("/classes/1/span"));
        assert_eq!(diag.location(), Some(Location::new(3, 7)));
        assert_eq!(diag.help(), Some("remove one of the entities"));
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::error("missing key `classes`").with_code(ErrorCode::E101);
        assert_eq!(diag.to_string(), "error[E101]: missing key `classes`");

        let diag = Diagnostic::warning("duplicate relationship collapsed")
            .with_pointer("/relationships/2");
        assert_eq!(
            diag.to_string(),
            "warning: duplicate relationship collapsed at /relationships/2"
        );
    }

    #[test]
    fn test_location_byte_offset() {
        let source = "{\n  \"classes\": x\n}";
        assert_eq!(Location::new(1, 1).byte_offset(source), 0);
        assert_eq!(Location::new(2, 3).byte_offset(source), 4);
        assert_eq!(Location::new(2, 15).byte_offset(source), 16);
        assert_eq!(Location::new(9, 1).byte_offset(source), source.len());
    }

    #[test]
    fn test_location_byte_offset_snaps_to_char_boundary() {
        let source = "{\"ü\": x}";
        assert_eq!(Location::new(1, 8).byte_offset(source), 7);
        // Column 4 points into the middle of the two-byte `ü`.
        assert_eq!(Location::new(1, 4).byte_offset(source), 2);
    }
}
