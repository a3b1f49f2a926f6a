//! Unit tests for the lexer module.
//!
//! This module contains tests for tokenization including:
//! - Keywords and identifiers
//! - Numeric, string, and duration literals
//! - Implicit statement terminators
//! - Comments and doc comments
//! - Error cases and recovery

use super::{lexer::tokenize, tokens::TokenKind};

#[test]
fn test_tokenize_keywords() {
    let source = "module import as export const let var type record enum trait class func fn";
    let (tokens, diagnostics) = tokenize(source);

    assert!(diagnostics.is_empty());
    assert_eq!(tokens[0].kind, TokenKind::Module);
    assert_eq!(tokens[1].kind, TokenKind::Import);
    assert_eq!(tokens[2].kind, TokenKind::As);
    assert_eq!(tokens[3].kind, TokenKind::Export);
    assert_eq!(tokens[4].kind, TokenKind::Const);
    assert_eq!(tokens[5].kind, TokenKind::Let);
    assert_eq!(tokens[6].kind, TokenKind::Var);
    assert_eq!(tokens[7].kind, TokenKind::Type);
    assert_eq!(tokens[8].kind, TokenKind::Record);
    assert_eq!(tokens[9].kind, TokenKind::Enum);
    assert_eq!(tokens[10].kind, TokenKind::Trait);
    assert_eq!(tokens[11].kind, TokenKind::Class);
    assert_eq!(tokens[12].kind, TokenKind::Func);
    assert_eq!(tokens[13].kind, TokenKind::Fn);
    assert_eq!(tokens[14].kind, TokenKind::EOF);
}

#[test]
fn test_tokenize_agent_keywords() {
    let source = "agent task workflow test profile capabilities tools policy";
    let (tokens, _) = tokenize(source);

    assert_eq!(tokens[0].kind, TokenKind::Agent);
    assert_eq!(tokens[1].kind, TokenKind::Task);
    assert_eq!(tokens[2].kind, TokenKind::Workflow);
    assert_eq!(tokens[3].kind, TokenKind::Test);
    assert_eq!(tokens[4].kind, TokenKind::Profile);
    assert_eq!(tokens[5].kind, TokenKind::Capabilities);
    assert_eq!(tokens[6].kind, TokenKind::Tools);
    assert_eq!(tokens[7].kind, TokenKind::Policy);
}

#[test]
fn test_tokenize_identifiers() {
    let source = "foo bar baz_123 _underscore CamelCase";
    let (tokens, _) = tokenize(source);

    assert_eq!(tokens[0].kind, TokenKind::Identifier);
    assert_eq!(tokens[0].value, "foo");
    assert_eq!(tokens[1].value, "bar");
    assert_eq!(tokens[2].value, "baz_123");
    assert_eq!(tokens[3].value, "_underscore");
    assert_eq!(tokens[4].value, "CamelCase");
    assert_eq!(tokens[5].kind, TokenKind::EOF);
}

#[test]
fn test_tokenize_numbers() {
    let source = "42 3.14 0";
    let (tokens, diagnostics) = tokenize(source);

    assert!(diagnostics.is_empty());
    assert_eq!(tokens[0].kind, TokenKind::Int);
    assert_eq!(tokens[0].value, "42");
    assert_eq!(tokens[1].kind, TokenKind::Float);
    assert_eq!(tokens[1].value, "3.14");
    assert_eq!(tokens[2].kind, TokenKind::Int);
}

#[test]
fn test_tokenize_durations() {
    let source = "500ms 30s 5m 2h 1d";
    let (tokens, diagnostics) = tokenize(source);

    assert!(diagnostics.is_empty());
    for (i, expected) in ["500ms", "30s", "5m", "2h", "1d"].iter().enumerate() {
        assert_eq!(tokens[i].kind, TokenKind::Duration);
        assert_eq!(tokens[i].value, *expected);
    }
}

#[test]
fn test_tokenize_malformed_number() {
    let source = "12abc";
    let (tokens, diagnostics) = tokenize(source);

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind.code(), "malformed-number");
    assert_eq!(tokens.last().unwrap().kind, TokenKind::EOF);
}

#[test]
fn test_malformed_number_recovers() {
    let source = "12abc let";
    let (tokens, diagnostics) = tokenize(source);

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::Let);
}

#[test]
fn test_tokenize_string_with_escapes() {
    let source = r#""hello\nworld""#;
    let (tokens, diagnostics) = tokenize(source);

    assert!(diagnostics.is_empty());
    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].value, "hello\nworld");
}

#[test]
fn test_tokenize_invalid_escape() {
    let source = r#""a\qb""#;
    let (tokens, diagnostics) = tokenize(source);

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind.code(), "invalid-escape");
    assert_eq!(tokens[0].value, "aqb");
}

#[test]
fn test_tokenize_unterminated_string() {
    let source = "\"abc";
    let (tokens, diagnostics) = tokenize(source);

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind.code(), "unterminated-string");
    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].value, "abc");
}

#[test]
fn test_unterminated_string_later_tokens_survive() {
    let source = "\"abc\nlet x = 1";
    let (tokens, diagnostics) = tokenize(source);

    assert_eq!(diagnostics.len(), 1);
    assert!(tokens.iter().any(|t| t.kind == TokenKind::Let));
}

#[test]
fn test_tokenize_operators() {
    let source = "|> -> => == != <= >= ?. = < > + - * / %";
    let (tokens, _) = tokenize(source);

    let expected = [
        TokenKind::Pipe,
        TokenKind::Arrow,
        TokenKind::FatArrow,
        TokenKind::Equals,
        TokenKind::NotEquals,
        TokenKind::LessEquals,
        TokenKind::GreaterEquals,
        TokenKind::QuestionDot,
        TokenKind::Assignment,
        TokenKind::Less,
        TokenKind::Greater,
        TokenKind::Plus,
        TokenKind::Dash,
        TokenKind::Star,
        TokenKind::Slash,
        TokenKind::Percent,
        TokenKind::EOF,
    ];
    for (i, kind) in expected.iter().enumerate() {
        assert_eq!(tokens[i].kind, *kind);
    }
}

#[test]
fn test_newline_inserts_terminator() {
    let source = "let x = 1\nlet y = 2";
    let (tokens, _) = tokenize(source);

    assert_eq!(tokens[4].kind, TokenKind::Newline);
    assert_eq!(tokens[5].kind, TokenKind::Let);
}

#[test]
fn test_newline_suppressed_after_operator() {
    let source = "let x = 1 +\n2";
    let (tokens, _) = tokenize(source);

    assert!(!tokens.iter().any(|t| t.kind == TokenKind::Newline));
}

#[test]
fn test_newline_suppressed_after_pipe() {
    let source = "xs |>\nmap";
    let (tokens, _) = tokenize(source);

    assert!(!tokens.iter().any(|t| t.kind == TokenKind::Newline));
}

#[test]
fn test_newline_suppressed_after_comma_and_open_brace() {
    let source = "f(a,\nb)\nrecord R {\nx: Int\n}";
    let (tokens, _) = tokenize(source);

    // No terminator between the call arguments; one after the close paren.
    let comma_index = tokens.iter().position(|t| t.kind == TokenKind::Comma).unwrap();
    assert_ne!(tokens[comma_index + 1].kind, TokenKind::Newline);
}

#[test]
fn test_line_comment_skipped() {
    let source = "// a comment\nlet x = 1";
    let (tokens, diagnostics) = tokenize(source);

    assert!(diagnostics.is_empty());
    assert_eq!(tokens[0].kind, TokenKind::Let);
}

#[test]
fn test_block_comment_tracks_lines() {
    let source = "/* first\nsecond */ let x = 1";
    let (tokens, diagnostics) = tokenize(source);

    assert!(diagnostics.is_empty());
    assert_eq!(tokens[0].kind, TokenKind::Let);
    assert_eq!(tokens[0].span.line, 2);
}

#[test]
fn test_unterminated_block_comment() {
    let source = "/* never closed";
    let (tokens, diagnostics) = tokenize(source);

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind.code(), "unterminated-comment");
    assert_eq!(tokens[0].kind, TokenKind::EOF);
}

#[test]
fn test_doc_comment_attaches_to_next_token() {
    let source = "/// Greets the user.\nfunc greet() -> String";
    let (tokens, _) = tokenize(source);

    assert_eq!(tokens[0].kind, TokenKind::Func);
    assert_eq!(tokens[0].doc.as_deref(), Some("Greets the user."));
}

#[test]
fn test_multi_line_doc_comment() {
    let source = "/// First line.\n/// Second line.\nrecord User {}";
    let (tokens, _) = tokenize(source);

    assert_eq!(tokens[0].kind, TokenKind::Record);
    assert_eq!(tokens[0].doc.as_deref(), Some("First line.\nSecond line."));
}

#[test]
fn test_attribute_tokens() {
    let source = "@route(\"x\")";
    let (tokens, _) = tokenize(source);

    assert_eq!(tokens[0].kind, TokenKind::At);
    assert_eq!(tokens[1].kind, TokenKind::Identifier);
    assert_eq!(tokens[1].value, "route");
    assert_eq!(tokens[2].kind, TokenKind::OpenParen);
    assert_eq!(tokens[3].kind, TokenKind::String);
    assert_eq!(tokens[4].kind, TokenKind::CloseParen);
}

#[test]
fn test_unrecognised_token_recovers() {
    let source = "# let";
    let (tokens, diagnostics) = tokenize(source);

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind.code(), "unrecognised-token");
    assert_eq!(tokens[0].kind, TokenKind::Let);
}

#[test]
fn test_spans_have_positions() {
    let source = "let x";
    let (tokens, _) = tokenize(source);

    assert_eq!(tokens[0].span.start, 0);
    assert_eq!(tokens[0].span.end, 3);
    assert_eq!(tokens[0].span.line, 1);
    assert_eq!(tokens[0].span.column, 1);
    assert_eq!(tokens[1].span.start, 4);
    assert_eq!(tokens[1].span.column, 5);
}

#[test]
fn test_tokenize_empty_input() {
    let (tokens, diagnostics) = tokenize("");

    assert!(diagnostics.is_empty());
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::EOF);
}
