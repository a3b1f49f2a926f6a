use serde::Serialize;

use crate::Span;

/// A type annotation. Every type carries an `optional` flag for a trailing
/// `?`; `Option[T]` is normalized at parse time into `T` with the flag set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Type {
    pub kind: TypeKind,
    pub optional: bool,
    pub span: Span,
}

impl Type {
    pub fn new(kind: TypeKind, span: Span) -> Self {
        Type {
            kind,
            optional: false,
            span,
        }
    }

    /// True when this is the named type `path` with no type arguments.
    pub fn is_named(&self, path: &str) -> bool {
        match &self.kind {
            TypeKind::Name { path: p, args } => args.is_empty() && p.join(".") == path,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TypeKind {
    /// A dotted name with optional type arguments, e.g. `core.Url` or
    /// `Result[String, NetError]`.
    Name { path: Vec<String>, args: Vec<Type> },
    List(Box<Type>),
    Map(Box<Type>, Box<Type>),
    Tuple(Vec<Type>),
    Func {
        params: Vec<Type>,
        ret: Option<Box<Type>>,
    },
    /// Inline struct type `{ name: Type, ... }`.
    Struct(Vec<(String, Type)>),
}
