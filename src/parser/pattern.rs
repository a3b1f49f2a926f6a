//! Pattern parsing for `match` arms and `for` bindings.
//!
//! A bare identifier is always a binding; enum patterns need a qualifier
//! (`Option.Some`) or an argument list (`Some(x)`) to read as enum cases.

use crate::{
    ast::{
        expressions::Expr,
        patterns::{Pattern, PatternField},
    },
    diagnostics::diagnostics::{Diagnostic, DiagnosticKind},
    lexer::tokens::TokenKind,
};

use super::{expr::parse_primary_expr, parser::Parser};

pub fn parse_pattern(parser: &mut Parser) -> Result<Pattern, Diagnostic> {
    parser.enter_nesting()?;
    let result = parse_pattern_inner(parser);
    parser.exit_nesting();
    result
}

fn parse_pattern_inner(parser: &mut Parser) -> Result<Pattern, Diagnostic> {
    match parser.current_token_kind() {
        TokenKind::Identifier if parser.current_token().value == "_" => {
            let token = parser.advance();
            Ok(Pattern::Wildcard { span: token.span })
        }
        TokenKind::Int
        | TokenKind::Float
        | TokenKind::String
        | TokenKind::True
        | TokenKind::False
        | TokenKind::Null => {
            let value = parse_primary_expr(parser)?;
            let span = value.span();
            Ok(Pattern::Literal { value, span })
        }
        TokenKind::Dash => parse_negative_literal_pattern(parser),
        TokenKind::OpenParen => parse_tuple_pattern(parser),
        TokenKind::Identifier => parse_name_pattern(parser),
        _ => {
            let token = parser.current_token();
            Err(Diagnostic::new(
                DiagnosticKind::MalformedPattern {
                    found: token.value.clone(),
                },
                token.span,
            ))
        }
    }
}

fn parse_negative_literal_pattern(parser: &mut Parser) -> Result<Pattern, Diagnostic> {
    let dash = parser.advance();
    let value = match parser.current_token_kind() {
        TokenKind::Int | TokenKind::Float => parse_primary_expr(parser)?,
        _ => {
            let token = parser.current_token();
            return Err(Diagnostic::new(
                DiagnosticKind::MalformedPattern {
                    found: token.value.clone(),
                },
                token.span,
            ));
        }
    };

    let span = dash.span.to(&value.span());
    let negated = match value {
        Expr::Int { value, .. } => Expr::Int {
            value: -value,
            span,
        },
        Expr::Float { value, .. } => Expr::Float {
            value: -value,
            span,
        },
        other => other,
    };

    Ok(Pattern::Literal {
        value: negated,
        span,
    })
}

fn parse_tuple_pattern(parser: &mut Parser) -> Result<Pattern, Diagnostic> {
    let start = parser.advance().span;
    parser.skip_newlines();

    let mut items = vec![];
    let mut saw_comma = false;
    while !parser.check(TokenKind::CloseParen) && parser.has_tokens() {
        items.push(parse_pattern(parser)?);
        if parser.check(TokenKind::Comma) {
            saw_comma = true;
            parser.advance();
        }
        parser.skip_newlines();
    }
    parser.expect(TokenKind::CloseParen)?;
    let span = parser.span_from(start);

    // `(p)` is just grouping; only a comma makes it a tuple.
    if items.len() == 1 && !saw_comma {
        return Ok(items.pop().unwrap());
    }

    Ok(Pattern::Tuple { items, span })
}

fn parse_name_pattern(parser: &mut Parser) -> Result<Pattern, Diagnostic> {
    let start = parser.current_token().span;
    let mut path = vec![parser.expect(TokenKind::Identifier)?.value];
    while parser.check(TokenKind::Dot) && parser.peek_kind(1) == TokenKind::Identifier {
        parser.advance();
        path.push(parser.expect(TokenKind::Identifier)?.value);
    }

    match parser.current_token_kind() {
        TokenKind::OpenParen => {
            let (qualifier, name) = split_enum_path(parser, path, start)?;
            parser.advance();
            parser.skip_newlines();

            let mut args = vec![];
            while !parser.check(TokenKind::CloseParen) && parser.has_tokens() {
                args.push(parse_pattern(parser)?);
                if parser.check(TokenKind::Comma) {
                    parser.advance();
                }
                parser.skip_newlines();
            }
            parser.expect(TokenKind::CloseParen)?;

            Ok(Pattern::Enum {
                qualifier,
                name,
                args,
                span: parser.span_from(start),
            })
        }
        TokenKind::OpenCurly => {
            parser.advance();
            parser.skip_newlines();

            let mut fields = vec![];
            while !parser.check(TokenKind::CloseCurly) && parser.has_tokens() {
                let name_token = parser.expect(TokenKind::Identifier)?;
                let pattern = if parser.check(TokenKind::Colon) {
                    parser.advance();
                    Some(parse_pattern(parser)?)
                } else {
                    None
                };
                let span = name_token.span.to(&parser.prev_token_span());
                fields.push(PatternField {
                    name: name_token.value,
                    pattern,
                    span,
                });
                if parser.check(TokenKind::Comma) {
                    parser.advance();
                }
                parser.skip_newlines();
            }
            parser.expect(TokenKind::CloseCurly)?;

            Ok(Pattern::Record {
                name: path,
                fields,
                span: parser.span_from(start),
            })
        }
        _ => {
            if path.len() == 1 {
                Ok(Pattern::Binding {
                    name: path.pop().unwrap(),
                    span: parser.span_from(start),
                })
            } else {
                let (qualifier, name) = split_enum_path(parser, path, start)?;
                Ok(Pattern::Enum {
                    qualifier,
                    name,
                    args: vec![],
                    span: parser.span_from(start),
                })
            }
        }
    }
}

/// An enum pattern path is `Name` or `Qualifier.Name`; anything deeper is
/// malformed.
fn split_enum_path(
    parser: &Parser,
    mut path: Vec<String>,
    start: crate::Span,
) -> Result<(Option<String>, String), Diagnostic> {
    match path.len() {
        1 => Ok((None, path.pop().unwrap())),
        2 => {
            let name = path.pop().unwrap();
            Ok((Some(path.pop().unwrap()), name))
        }
        _ => Err(Diagnostic::new(
            DiagnosticKind::MalformedPattern {
                found: path.join("."),
            },
            parser.span_from(start),
        )),
    }
}
