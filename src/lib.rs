#![allow(clippy::module_inception)]

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    ast::module::Module,
    diagnostics::diagnostics::{Diagnostic, Severity},
};

pub mod ast;
pub mod diagnostics;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod serializer;

extern crate regex;

/// A half-open byte range into the source text, plus the line and column
/// of its first byte (both 1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Span {
            start,
            end,
            line,
            column,
        }
    }

    /// A span stretching from the start of `self` to the end of `other`.
    pub fn to(&self, other: &Span) -> Span {
        Span {
            start: self.start,
            end: other.end,
            line: self.line,
            column: self.column,
        }
    }
}

/// Everything a parse call produces: the (possibly partial) module, the
/// ordered diagnostics, and the file identifier used when rendering them.
#[derive(Debug)]
pub struct ParseOutcome {
    pub module: Module,
    pub diagnostics: Vec<Diagnostic>,
    pub file: String,
}

impl ParseOutcome {
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// True when the parse hit an unrecoverable condition (resource limit)
    /// and gave up on the rest of the input.
    pub fn was_aborted(&self) -> bool {
        self.diagnostics.iter().any(|d| d.is_fatal())
    }
}

/// Parses one HILO module. Always returns an AST (partial on errors) and
/// the diagnostics collected along the way; never panics on user input.
pub fn parse_module(source: &str, file: &str) -> ParseOutcome {
    let start = Instant::now();
    let (tokens, mut diagnostics) = lexer::lexer::tokenize(source);
    debug!(tokens = tokens.len(), elapsed = ?start.elapsed(), "tokenized");

    let parse_start = Instant::now();
    let (module, parse_diagnostics) = parser::parser::parse(tokens);
    debug!(decls = module.decls.len(), elapsed = ?parse_start.elapsed(), "parsed");

    diagnostics.extend(parse_diagnostics);

    ParseOutcome {
        module,
        diagnostics,
        file: file.to_string(),
    }
}

/// Finds the 1-based line number, line text, and offset-within-line for a
/// byte offset into `source`. Offsets at or past the end land on the last line.
pub fn get_line_at_offset(source: &str, offset: usize) -> (usize, String, usize) {
    let mut start = 0;
    let mut line_number = 1;
    let mut last: (usize, String, usize) = (1, String::new(), 0);

    for line in source.split_inclusive('\n') {
        let end = start + line.len();
        if (start..end).contains(&offset) {
            return (line_number, line.to_string(), offset - start);
        }
        last = (line_number, line.to_string(), line.len().saturating_sub(1));
        start = end;
        line_number += 1;
    }

    last
}

/// Renders a diagnostic with a caret display:
///
/// ```text
/// error[unexpected-token]: unexpected token: "}"
/// -> pipeline.hilo
///    |
/// 20 | let a = }
///    | --------^
/// ```
pub fn render_diagnostic(source: &str, file: &str, diagnostic: &Diagnostic) -> String {
    let (line, line_text, line_pos) = get_line_at_offset(source, diagnostic.span.start);

    let line_string = line.to_string();
    let padding = line_string.len() + 2;

    let severity = match diagnostic.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
    };

    let mut out = format!(
        "{}[{}]: {}\n-> {}\n{:>padding$}\n",
        severity,
        diagnostic.kind.code(),
        diagnostic.kind,
        file,
        "|"
    );

    let (line_text_removed, removed_whitespace) = remove_starting_whitespace(&line_text);
    out.push_str(&format!(
        "{} | {}\n",
        line_string,
        line_text_removed.trim_end()
    ));

    let arrows = line_pos.saturating_sub(removed_whitespace) + 1;
    out.push_str(&format!("{:>padding$} {:->arrows$}", "|", "^"));

    out
}

fn remove_starting_whitespace(string: &str) -> (String, usize) {
    let mut start = 0;
    for c in string.chars() {
        if c == ' ' {
            start += 1;
        } else {
            break;
        }
    }

    (String::from(&string[start..]), start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::diagnostics::DiagnosticKind;

    #[test]
    fn test_get_line_at_offset() {
        let source = "module demo\nlet x = 1\nlet y = 2\n";

        let (line_number, line, line_pos) = get_line_at_offset(source, 0);
        assert_eq!(line_number, 1);
        assert_eq!(line, "module demo\n");
        assert_eq!(line_pos, 0);

        let (line_number, line, line_pos) = get_line_at_offset(source, 16);
        assert_eq!(line_number, 2);
        assert_eq!(line, "let x = 1\n");
        assert_eq!(line_pos, 4);
    }

    #[test]
    fn test_get_line_at_offset_past_end() {
        let source = "let x = 1\n";
        let (line_number, _, _) = get_line_at_offset(source, 500);
        assert_eq!(line_number, 1);
    }

    #[test]
    fn test_render_diagnostic_points_at_offender() {
        let source = "let x = 1\nlet = 2\n";
        let diagnostic = Diagnostic::new(
            DiagnosticKind::UnexpectedToken {
                found: "=".to_string(),
            },
            Span::new(14, 15, 2, 5),
        );

        let rendered = render_diagnostic(source, "test.hilo", &diagnostic);
        assert!(rendered.contains("error[unexpected-token]"));
        assert!(rendered.contains("-> test.hilo"));
        assert!(rendered.contains("2 | let = 2"));
    }

    #[test]
    fn test_parse_module_returns_outcome() {
        let outcome = parse_module("let x = 1", "test.hilo");
        assert!(!outcome.has_errors());
        assert_eq!(outcome.module.decls.len(), 1);
        assert_eq!(outcome.file, "test.hilo");
    }
}
