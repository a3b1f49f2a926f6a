//! Diagnostics module.
//!
//! Lexical and syntax problems are collected, not thrown: every phase
//! accumulates [`diagnostics::Diagnostic`] values and keeps going.

pub mod diagnostics;

#[cfg(test)]
mod tests;
