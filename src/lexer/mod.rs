//! Lexer module.
//!
//! Converts UTF-8 source text into a token stream with source spans,
//! inserting implicit statement terminators at significant newlines.

pub mod lexer;
pub mod tokens;

#[cfg(test)]
mod tests;
