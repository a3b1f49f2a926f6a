use serde::Serialize;

use crate::Span;

use super::declarations::Decl;

/// One compilation unit: optional dotted name, imports, then declarations.
/// Declaration order is preserved; serialization is order-sensitive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Module {
    pub name: Option<Vec<String>>,
    pub imports: Vec<Import>,
    pub decls: Vec<Decl>,
    pub span: Span,
}

/// An import clause. Alias and name-list may appear in either order in
/// source; both normalize to this one shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Import {
    pub path: Vec<String>,
    pub alias: Option<String>,
    pub names: Vec<String>,
    pub span: Span,
}
