//! Error codes for the synchronization diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - JSON syntax errors
//! - `E1xx` - Document structure errors
//! - `E2xx` - Span shape errors
//! - `E3xx` - Model consistency errors and normalizations

use std::fmt;

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Syntax Errors (E0xx)
    // =========================================================================
    /// Malformed JSON.
    ///
    /// The text is not valid JSON at all.
    E001,

    // =========================================================================
    // Structure Errors (E1xx)
    // =========================================================================
    /// Top-level value is not an object.
    E100,

    /// Missing required key.
    ///
    /// A model needs both `classes` and `relationships`; an export envelope
    /// additionally needs `text`.
    E101,

    /// Invalid field shape.
    ///
    /// A field has the wrong JSON type, a span is not a two-element array of
    /// non-negative integers, or a relationship type is unknown.
    E102,

    // =========================================================================
    // Span Errors (E2xx)
    // =========================================================================
    /// Empty or inverted span.
    ///
    /// Spans are half-open `[start, end]` pairs with `start < end`.
    E200,

    // =========================================================================
    // Consistency Errors (E3xx)
    // =========================================================================
    /// Span claimed twice.
    ///
    /// Every tagged span belongs to exactly one entity.
    E300,

    /// Overlapping class mentions with the same name.
    E301,

    /// Unresolved relationship endpoint.
    ///
    /// A relationship span does not match any class span.
    E302,

    /// Self relationship.
    ///
    /// A relationship starts and ends at the same class mention.
    E303,

    /// Relationship endpoint name mismatch (warning).
    ///
    /// The name was replaced with the name of the class at the endpoint span.
    E304,

    /// Duplicate relationship (warning).
    ///
    /// A repeated `(from_span, to_span, type)` triple was collapsed.
    E305,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E200 => "E200",
            ErrorCode::E300 => "E300",
            ErrorCode::E301 => "E301",
            ErrorCode::E302 => "E302",
            ErrorCode::E303 => "E303",
            ErrorCode::E304 => "E304",
            ErrorCode::E305 => "E305",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "malformed JSON",
            ErrorCode::E100 => "top-level value is not an object",
            ErrorCode::E101 => "missing required key",
            ErrorCode::E102 => "invalid field shape",
            ErrorCode::E200 => "empty or inverted span",
            ErrorCode::E300 => "span claimed twice",
            ErrorCode::E301 => "overlapping class mentions",
            ErrorCode::E302 => "unresolved relationship endpoint",
            ErrorCode::E303 => "self relationship",
            ErrorCode::E304 => "relationship endpoint name mismatch",
            ErrorCode::E305 => "duplicate relationship",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
