//! Type parsing.
//!
//! Handles qualified names with type arguments, `List`/`Map` shorthands,
//! tuple types, function types, inline struct types, and the trailing `?`
//! optional marker. `Option[T]` normalizes to `T` with the optional flag
//! set so the abbreviated serialization round-trips exactly.
//!
//! Like expression parsing, this uses NUD/LED handlers with binding powers.

use std::collections::HashMap;

use crate::{
    ast::types::{Type, TypeKind},
    diagnostics::diagnostics::{Diagnostic, DiagnosticKind},
    lexer::tokens::TokenKind,
};

use super::{lookups::BindingPower, parser::Parser};

/// Type alias for type null denotation handler functions.
pub type TypeNUDHandler = fn(&mut Parser) -> Result<Type, Diagnostic>;

/// Type alias for type left denotation handler functions.
pub type TypeLEDHandler = fn(&mut Parser, Type, BindingPower) -> Result<Type, Diagnostic>;

pub type TypeNUDLookup = HashMap<TokenKind, TypeNUDHandler>;
pub type TypeLEDLookup = HashMap<TokenKind, TypeLEDHandler>;
pub type TypeBPLookup = HashMap<TokenKind, BindingPower>;

/// Initializes the type parsing lookup tables.
pub fn create_token_type_lookups(parser: &mut Parser) {
    parser.type_nud(TokenKind::Identifier, parse_symbol_type);
    parser.type_nud(TokenKind::OpenParen, parse_tuple_type);
    parser.type_nud(TokenKind::Func, parse_func_type);
    parser.type_nud(TokenKind::OpenCurly, parse_struct_type);
    parser.type_led(TokenKind::Question, BindingPower::Call, parse_optional_type);
}

pub fn parse_type(parser: &mut Parser, bp: BindingPower) -> Result<Type, Diagnostic> {
    parser.enter_nesting()?;
    let result = parse_type_inner(parser, bp);
    parser.exit_nesting();
    result
}

fn parse_type_inner(parser: &mut Parser, bp: BindingPower) -> Result<Type, Diagnostic> {
    let kind = parser.current_token_kind();
    let nud = match parser.get_type_nud_lookup().get(&kind).copied() {
        Some(handler) => handler,
        None => {
            let token = parser.current_token();
            return Err(Diagnostic::new(
                DiagnosticKind::MalformedType {
                    found: token.value.clone(),
                },
                token.span,
            ));
        }
    };

    let mut left = nud(parser)?;

    loop {
        let kind = parser.current_token_kind();
        let power = *parser
            .get_type_bp_lookup()
            .get(&kind)
            .unwrap_or(&BindingPower::Default);
        if power <= bp {
            break;
        }

        match parser.get_type_led_lookup().get(&kind).copied() {
            Some(handler) => left = handler(parser, left, power)?,
            None => break,
        }
    }

    Ok(left)
}

/// A dotted name with optional `[args]`. `List`, `Map`, and `Option` with
/// the right arity normalize to their dedicated shapes.
pub fn parse_symbol_type(parser: &mut Parser) -> Result<Type, Diagnostic> {
    let start = parser.current_token().span;
    let mut path = vec![parser.expect(TokenKind::Identifier)?.value];
    while parser.check(TokenKind::Dot) && parser.peek_kind(1) == TokenKind::Identifier {
        parser.advance();
        path.push(parser.expect(TokenKind::Identifier)?.value);
    }

    let mut args = vec![];
    if parser.check(TokenKind::OpenBracket) {
        parser.advance();
        parser.skip_newlines();
        while !parser.check(TokenKind::CloseBracket) && parser.has_tokens() {
            args.push(parse_type(parser, BindingPower::Default)?);
            if parser.check(TokenKind::Comma) {
                parser.advance();
            }
            parser.skip_newlines();
        }
        parser.expect(TokenKind::CloseBracket)?;
    }

    let span = parser.span_from(start);

    if path.len() == 1 {
        match (path[0].as_str(), args.len()) {
            ("List", 1) => {
                let item = args.pop().unwrap();
                return Ok(Type::new(TypeKind::List(Box::new(item)), span));
            }
            ("Map", 2) => {
                let value = args.pop().unwrap();
                let key = args.pop().unwrap();
                return Ok(Type::new(
                    TypeKind::Map(Box::new(key), Box::new(value)),
                    span,
                ));
            }
            ("Option", 1) => {
                let mut inner = args.pop().unwrap();
                inner.optional = true;
                inner.span = span;
                return Ok(inner);
            }
            _ => {}
        }
    }

    Ok(Type::new(TypeKind::Name { path, args }, span))
}

/// `(A, B)` is a tuple type; a single parenthesized type is transparent.
pub fn parse_tuple_type(parser: &mut Parser) -> Result<Type, Diagnostic> {
    let start = parser.advance().span;
    parser.skip_newlines();

    let mut items = vec![];
    while !parser.check(TokenKind::CloseParen) && parser.has_tokens() {
        items.push(parse_type(parser, BindingPower::Default)?);
        if parser.check(TokenKind::Comma) {
            parser.advance();
        }
        parser.skip_newlines();
    }
    parser.expect(TokenKind::CloseParen)?;
    let span = parser.span_from(start);

    if items.len() == 1 {
        let mut inner = items.pop().unwrap();
        inner.span = span;
        return Ok(inner);
    }

    Ok(Type::new(TypeKind::Tuple(items), span))
}

/// `func(A, B) -> C`; the return type is optional.
pub fn parse_func_type(parser: &mut Parser) -> Result<Type, Diagnostic> {
    let start = parser.advance().span;
    parser.expect(TokenKind::OpenParen)?;
    parser.skip_newlines();

    let mut params = vec![];
    while !parser.check(TokenKind::CloseParen) && parser.has_tokens() {
        params.push(parse_type(parser, BindingPower::Default)?);
        if parser.check(TokenKind::Comma) {
            parser.advance();
        }
        parser.skip_newlines();
    }
    parser.expect(TokenKind::CloseParen)?;

    let ret = if parser.check(TokenKind::Arrow) {
        parser.advance();
        Some(Box::new(parse_type(parser, BindingPower::Default)?))
    } else {
        None
    };

    Ok(Type::new(
        TypeKind::Func { params, ret },
        parser.span_from(start),
    ))
}

/// Inline struct type `{ name: Type, ... }`.
pub fn parse_struct_type(parser: &mut Parser) -> Result<Type, Diagnostic> {
    let start = parser.advance().span;
    parser.skip_newlines();

    let mut fields = vec![];
    while !parser.check(TokenKind::CloseCurly) && parser.has_tokens() {
        let name = parser.expect(TokenKind::Identifier)?.value;
        parser.expect(TokenKind::Colon)?;
        let ty = parse_type(parser, BindingPower::Default)?;
        fields.push((name, ty));
        if parser.check(TokenKind::Comma) {
            parser.advance();
        }
        parser.skip_newlines();
    }
    parser.expect(TokenKind::CloseCurly)?;

    Ok(Type::new(
        TypeKind::Struct(fields),
        parser.span_from(start),
    ))
}

/// Trailing `?` marks the type optional/nullable.
pub fn parse_optional_type(
    parser: &mut Parser,
    left: Type,
    _bp: BindingPower,
) -> Result<Type, Diagnostic> {
    let question = parser.advance();
    let mut ty = left;
    ty.optional = true;
    ty.span = ty.span.to(&question.span);
    Ok(ty)
}
