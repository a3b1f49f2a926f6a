use serde::Serialize;

use crate::Span;

use super::expressions::Expr;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Pattern {
    Wildcard {
        span: Span,
    },
    Binding {
        name: String,
        span: Span,
    },
    /// Literal patterns cover integer, float, string, `true`, `false`, `null`.
    Literal {
        value: Expr,
        span: Span,
    },
    /// `Name { field: subpattern, shorthand, ... }`; a field without a
    /// subpattern binds the field name itself.
    Record {
        name: Vec<String>,
        fields: Vec<PatternField>,
        span: Span,
    },
    /// `Some(p)` or `Option.Some(p)`.
    Enum {
        qualifier: Option<String>,
        name: String,
        args: Vec<Pattern>,
        span: Span,
    },
    Tuple {
        items: Vec<Pattern>,
        span: Span,
    },
}

impl Pattern {
    pub fn span(&self) -> Span {
        match self {
            Pattern::Wildcard { span }
            | Pattern::Binding { span, .. }
            | Pattern::Literal { span, .. }
            | Pattern::Record { span, .. }
            | Pattern::Enum { span, .. }
            | Pattern::Tuple { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternField {
    pub name: String,
    pub pattern: Option<Pattern>,
    pub span: Span,
}
