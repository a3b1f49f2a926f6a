//! Canonical serializer.
//!
//! Exports the AST to the documented JSON shape (`module`, `imports`,
//! `decls[]`) and reconstructs an equivalent AST from it. Types, imports,
//! and default expressions serialize as source-like strings; everything
//! else is a kind-tagged JSON object mirroring the AST one-to-one.

pub mod json;
pub mod render;

#[cfg(test)]
mod tests;
