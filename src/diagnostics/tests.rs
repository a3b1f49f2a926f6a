//! Unit tests for diagnostics.
//!
//! This module contains tests for diagnostic construction, codes,
//! severities, and display messages.

use crate::diagnostics::diagnostics::{Diagnostic, DiagnosticKind, Severity};
use crate::Span;

#[test]
fn test_diagnostic_creation() {
    let diagnostic = Diagnostic::new(
        DiagnosticKind::UnrecognisedToken {
            token: "#".to_string(),
        },
        Span::new(10, 11, 1, 11),
    );

    assert_eq!(diagnostic.kind.code(), "unrecognised-token");
    assert_eq!(diagnostic.severity, Severity::Error);
}

#[test]
fn test_diagnostic_span() {
    let diagnostic = Diagnostic::new(
        DiagnosticKind::UnexpectedToken {
            found: "}".to_string(),
        },
        Span::new(42, 43, 3, 7),
    );

    assert_eq!(diagnostic.span.start, 42);
    assert_eq!(diagnostic.span.line, 3);
}

#[test]
fn test_warning_severity() {
    let diagnostic = Diagnostic::warning(
        DiagnosticKind::DuplicateMember {
            name: "run".to_string(),
        },
        Span::default(),
    );

    assert_eq!(diagnostic.severity, Severity::Warning);
    assert!(!diagnostic.is_fatal());
}

#[test]
fn test_nesting_limit_is_fatal() {
    let diagnostic = Diagnostic::new(DiagnosticKind::NestingTooDeep, Span::default());

    assert!(diagnostic.is_fatal());
    assert_eq!(diagnostic.kind.code(), "nesting-too-deep");
}

#[test]
fn test_unexpected_token_message() {
    let kind = DiagnosticKind::UnexpectedToken {
        found: "=".to_string(),
    };

    assert_eq!(format!("{}", kind), "unexpected token: \"=\"");
}

#[test]
fn test_missing_token_message() {
    let kind = DiagnosticKind::MissingToken {
        expected: "`}`".to_string(),
        found: "func".to_string(),
    };

    assert_eq!(format!("{}", kind), "expected `}` before \"func\"");
}

#[test]
fn test_lexical_classification() {
    let lexical = DiagnosticKind::UnterminatedString;
    let syntactic = DiagnosticKind::UnexpectedToken {
        found: ")".to_string(),
    };

    assert!(lexical.is_lexical());
    assert!(!syntactic.is_lexical());
}
