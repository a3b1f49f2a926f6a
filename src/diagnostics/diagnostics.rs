use thiserror::Error;

use crate::Span;

/// How much a diagnostic blocks acceptance of the module. Errors make the
/// parse outcome unacceptable to downstream consumers; warnings do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// One reported problem: what went wrong, how bad it is, and where.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub span: Span,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, span: Span) -> Self {
        Diagnostic {
            kind,
            severity: Severity::Error,
            span,
        }
    }

    pub fn warning(kind: DiagnosticKind, span: Span) -> Self {
        Diagnostic {
            kind,
            severity: Severity::Warning,
            span,
        }
    }

    /// Fatal diagnostics abort the parse call that produced them; everything
    /// else is recovered from by synchronizing.
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind, DiagnosticKind::NestingTooDeep)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiagnosticKind {
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unterminated block comment")]
    UnterminatedComment,
    #[error("invalid escape sequence: \\{escape}")]
    InvalidEscape { escape: char },
    #[error("malformed numeric literal: {literal:?}")]
    MalformedNumber { literal: String },
    #[error("unrecognised token: {token:?}")]
    UnrecognisedToken { token: String },
    #[error("unexpected token: {found:?}")]
    UnexpectedToken { found: String },
    #[error("unexpected token ({message}): {found:?}")]
    UnexpectedTokenDetailed { found: String, message: String },
    #[error("expected {expected} before {found:?}")]
    MissingToken { expected: String, found: String },
    #[error("duplicate member {name:?}")]
    DuplicateMember { name: String },
    #[error("duplicate {section:?} section in agent {agent:?}")]
    DuplicateAgentSection { section: String, agent: String },
    #[error("malformed pattern at {found:?}")]
    MalformedPattern { found: String },
    #[error("malformed type at {found:?}")]
    MalformedType { found: String },
    #[error("nesting depth limit exceeded")]
    NestingTooDeep,
}

impl DiagnosticKind {
    /// Machine-readable code, stable across message wording changes.
    pub fn code(&self) -> &'static str {
        match self {
            DiagnosticKind::UnterminatedString => "unterminated-string",
            DiagnosticKind::UnterminatedComment => "unterminated-comment",
            DiagnosticKind::InvalidEscape { .. } => "invalid-escape",
            DiagnosticKind::MalformedNumber { .. } => "malformed-number",
            DiagnosticKind::UnrecognisedToken { .. } => "unrecognised-token",
            DiagnosticKind::UnexpectedToken { .. } => "unexpected-token",
            DiagnosticKind::UnexpectedTokenDetailed { .. } => "unexpected-token",
            DiagnosticKind::MissingToken { .. } => "missing-token",
            DiagnosticKind::DuplicateMember { .. } => "duplicate-member",
            DiagnosticKind::DuplicateAgentSection { .. } => "duplicate-agent-section",
            DiagnosticKind::MalformedPattern { .. } => "malformed-pattern",
            DiagnosticKind::MalformedType { .. } => "malformed-type",
            DiagnosticKind::NestingTooDeep => "nesting-too-deep",
        }
    }

    /// Which phase of the front-end the diagnostic belongs to.
    pub fn is_lexical(&self) -> bool {
        matches!(
            self,
            DiagnosticKind::UnterminatedString
                | DiagnosticKind::UnterminatedComment
                | DiagnosticKind::InvalidEscape { .. }
                | DiagnosticKind::MalformedNumber { .. }
                | DiagnosticKind::UnrecognisedToken { .. }
        )
    }
}
