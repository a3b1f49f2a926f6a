//! Expression parsing: NUD/LED handlers plus the precedence-climbing loop.
//!
//! Postfix suffixes (call, index, field access, optional chain, pipe,
//! struct initializer) apply left-to-right on a primary. The struct
//! initializer suffix is positional: it only fires where struct literals
//! are grammatically allowed and the left side is a dotted name.

use crate::{
    ast::expressions::{
        BinaryOp, CallArg, DurationUnit, Expr, FieldInit, MapEntry, UnaryOp,
    },
    ast::declarations::FuncBody,
    diagnostics::diagnostics::{Diagnostic, DiagnosticKind},
    lexer::tokens::TokenKind,
};

use super::{
    decl::parse_param_list,
    lookups::BindingPower,
    parser::Parser,
    stmt::parse_block,
};

pub fn parse_expr(parser: &mut Parser, bp: BindingPower) -> Result<Expr, Diagnostic> {
    parser.enter_nesting()?;
    let result = parse_expr_inner(parser, bp);
    parser.exit_nesting();
    result
}

fn parse_expr_inner(parser: &mut Parser, bp: BindingPower) -> Result<Expr, Diagnostic> {
    let mut left = parse_nud(parser)?;

    loop {
        let kind = parser.current_token_kind();

        if kind == TokenKind::OpenCurly {
            if parser.struct_literals_allowed()
                && BindingPower::Call > bp
                && struct_literal_target(&left).is_some()
            {
                left = parse_struct_init_expr(parser, left)?;
                continue;
            }
            break;
        }

        let power = *parser
            .get_bp_lookup()
            .get(&kind)
            .unwrap_or(&BindingPower::Default);
        if power <= bp {
            break;
        }

        match parser.get_led_lookup().get(&kind).copied() {
            Some(handler) => left = handler(parser, left, power)?,
            None => {
                let token = parser.current_token();
                return Err(Diagnostic::new(
                    DiagnosticKind::UnexpectedToken {
                        found: token.value.clone(),
                    },
                    token.span,
                ));
            }
        }
    }

    Ok(left)
}

/// Dispatches the prefix (null denotation) handler for the current token.
pub(super) fn parse_nud(parser: &mut Parser) -> Result<Expr, Diagnostic> {
    let kind = parser.current_token_kind();
    match parser.get_nud_lookup().get(&kind).copied() {
        Some(handler) => handler(parser),
        None => {
            let token = parser.current_token();
            Err(Diagnostic::new(
                DiagnosticKind::UnexpectedToken {
                    found: token.value.clone(),
                },
                token.span,
            ))
        }
    }
}

/// The dotted-name path a struct initializer can attach to, if `expr` is
/// an identifier or a field-access chain of identifiers.
fn struct_literal_target(expr: &Expr) -> Option<Vec<String>> {
    match expr {
        Expr::Ident { name, .. } => Some(vec![name.clone()]),
        Expr::Field { target, name, .. } => {
            let mut path = struct_literal_target(target)?;
            path.push(name.clone());
            Some(path)
        }
        _ => None,
    }
}

pub fn parse_primary_expr(parser: &mut Parser) -> Result<Expr, Diagnostic> {
    match parser.current_token_kind() {
        TokenKind::Int => {
            let token = parser.current_token().clone();
            match token.value.parse::<i64>() {
                Ok(value) => {
                    parser.advance();
                    Ok(Expr::Int {
                        value,
                        span: token.span,
                    })
                }
                Err(_) => {
                    parser.advance();
                    Err(Diagnostic::new(
                        DiagnosticKind::MalformedNumber {
                            literal: token.value,
                        },
                        token.span,
                    ))
                }
            }
        }
        TokenKind::Float => {
            let token = parser.current_token().clone();
            match token.value.parse::<f64>() {
                Ok(value) => {
                    parser.advance();
                    Ok(Expr::Float {
                        value,
                        span: token.span,
                    })
                }
                Err(_) => {
                    parser.advance();
                    Err(Diagnostic::new(
                        DiagnosticKind::MalformedNumber {
                            literal: token.value,
                        },
                        token.span,
                    ))
                }
            }
        }
        TokenKind::String => {
            let token = parser.advance();
            Ok(Expr::Str {
                value: token.value,
                span: token.span,
            })
        }
        TokenKind::Duration => {
            let token = parser.advance();
            match parse_duration_literal(&token.value) {
                Some((value, unit)) => Ok(Expr::Duration {
                    value,
                    unit,
                    span: token.span,
                }),
                None => Err(Diagnostic::new(
                    DiagnosticKind::MalformedNumber {
                        literal: token.value,
                    },
                    token.span,
                )),
            }
        }
        TokenKind::Identifier => {
            let token = parser.advance();
            Ok(Expr::Ident {
                name: token.value,
                span: token.span,
            })
        }
        TokenKind::True | TokenKind::False => {
            let token = parser.advance();
            Ok(Expr::Bool {
                value: token.kind == TokenKind::True,
                span: token.span,
            })
        }
        TokenKind::Null => {
            let token = parser.advance();
            Ok(Expr::Null { span: token.span })
        }
        _ => {
            let token = parser.current_token();
            Err(Diagnostic::new(
                DiagnosticKind::UnexpectedToken {
                    found: token.value.clone(),
                },
                token.span,
            ))
        }
    }
}

pub(crate) fn parse_duration_literal(value: &str) -> Option<(i64, DurationUnit)> {
    let split = value.find(|c: char| !c.is_ascii_digit())?;
    let digits = value[..split].parse::<i64>().ok()?;
    let unit = DurationUnit::from_str(&value[split..])?;
    Some((digits, unit))
}

/// Unary prefix operators: `-`, `not`, `await`. The operand binds at unary
/// power, so `await a.b()` awaits the full postfix chain.
pub fn parse_prefix_expr(parser: &mut Parser) -> Result<Expr, Diagnostic> {
    let operator_token = parser.advance();
    let op = match operator_token.kind {
        TokenKind::Dash => UnaryOp::Neg,
        TokenKind::Not => UnaryOp::Not,
        _ => UnaryOp::Await,
    };

    let operand = parse_expr(parser, BindingPower::Unary)?;
    let span = operator_token.span.to(&operand.span());

    Ok(Expr::Unary {
        op,
        expr: Box::new(operand),
        span,
    })
}

pub fn parse_binary_expr(
    parser: &mut Parser,
    left: Expr,
    bp: BindingPower,
) -> Result<Expr, Diagnostic> {
    let operator_token = parser.advance();
    let op = binary_op_for(operator_token.kind).ok_or_else(|| {
        Diagnostic::new(
            DiagnosticKind::UnexpectedToken {
                found: operator_token.value.clone(),
            },
            operator_token.span,
        )
    })?;

    let right = parse_expr(parser, bp)?;
    let span = left.span().to(&right.span());

    Ok(Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
        span,
    })
}

fn binary_op_for(kind: TokenKind) -> Option<BinaryOp> {
    Some(match kind {
        TokenKind::Assignment => BinaryOp::Assign,
        TokenKind::Or => BinaryOp::Or,
        TokenKind::And => BinaryOp::And,
        TokenKind::Equals => BinaryOp::Eq,
        TokenKind::NotEquals => BinaryOp::Ne,
        TokenKind::Less => BinaryOp::Lt,
        TokenKind::LessEquals => BinaryOp::Le,
        TokenKind::Greater => BinaryOp::Gt,
        TokenKind::GreaterEquals => BinaryOp::Ge,
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Dash => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Rem,
        _ => return None,
    })
}

/// Assignment is right-associative: the right side re-enters below the
/// assignment level.
pub fn parse_assignment_expr(
    parser: &mut Parser,
    left: Expr,
    _bp: BindingPower,
) -> Result<Expr, Diagnostic> {
    parser.advance();
    let right = parse_expr(parser, BindingPower::Default)?;
    let span = left.span().to(&right.span());

    Ok(Expr::Binary {
        op: BinaryOp::Assign,
        left: Box::new(left),
        right: Box::new(right),
        span,
    })
}

pub fn parse_grouping_expr(parser: &mut Parser) -> Result<Expr, Diagnostic> {
    let start = parser.advance().span;
    let saved = parser.set_struct_literals(true);
    let result = parse_grouping_tail(parser, start);
    parser.set_struct_literals(saved);
    result
}

fn parse_grouping_tail(parser: &mut Parser, start: crate::Span) -> Result<Expr, Diagnostic> {
    parser.skip_newlines();

    if parser.check(TokenKind::CloseParen) {
        parser.advance();
        return Ok(Expr::Tuple {
            items: vec![],
            span: parser.span_from(start),
        });
    }

    let first = parse_expr(parser, BindingPower::Default)?;
    parser.skip_newlines();

    if parser.check(TokenKind::Comma) {
        let mut items = vec![first];
        while parser.check(TokenKind::Comma) {
            parser.advance();
            parser.skip_newlines();
            if parser.check(TokenKind::CloseParen) {
                break;
            }
            items.push(parse_expr(parser, BindingPower::Default)?);
            parser.skip_newlines();
        }
        parser.expect(TokenKind::CloseParen)?;
        return Ok(Expr::Tuple {
            items,
            span: parser.span_from(start),
        });
    }

    parser.expect(TokenKind::CloseParen)?;
    Ok(Expr::Paren {
        expr: Box::new(first),
        span: parser.span_from(start),
    })
}

pub fn parse_list_expr(parser: &mut Parser) -> Result<Expr, Diagnostic> {
    let start = parser.advance().span;
    let saved = parser.set_struct_literals(true);
    let result = parse_list_tail(parser, start);
    parser.set_struct_literals(saved);
    result
}

fn parse_list_tail(parser: &mut Parser, start: crate::Span) -> Result<Expr, Diagnostic> {
    let mut items = vec![];
    parser.skip_newlines();
    while !parser.check(TokenKind::CloseBracket) && parser.has_tokens() {
        items.push(parse_expr(parser, BindingPower::Default)?);
        if parser.check(TokenKind::Comma) {
            parser.advance();
        }
        parser.skip_newlines();
    }
    parser.expect(TokenKind::CloseBracket)?;

    Ok(Expr::List {
        items,
        span: parser.span_from(start),
    })
}

/// A bare `{ key: value, ... }` in expression position is a map literal;
/// blocks never appear in expression position.
pub fn parse_map_expr(parser: &mut Parser) -> Result<Expr, Diagnostic> {
    let start = parser.advance().span;
    let saved = parser.set_struct_literals(true);
    let result = parse_map_tail(parser, start);
    parser.set_struct_literals(saved);
    result
}

fn parse_map_tail(parser: &mut Parser, start: crate::Span) -> Result<Expr, Diagnostic> {
    let mut entries = vec![];
    parser.skip_newlines();
    while !parser.check(TokenKind::CloseCurly) && parser.has_tokens() {
        let key = parse_expr(parser, BindingPower::Default)?;
        parser.expect(TokenKind::Colon)?;
        let value = parse_expr(parser, BindingPower::Default)?;
        let span = key.span().to(&value.span());
        entries.push(MapEntry { key, value, span });
        if parser.check(TokenKind::Comma) {
            parser.advance();
        }
        parser.skip_newlines();
    }
    parser.expect(TokenKind::CloseCurly)?;

    Ok(Expr::Map {
        entries,
        span: parser.span_from(start),
    })
}

/// Lambdas: `fn(params)` followed by a block body, a `=>` or `->`
/// expression body, or a bare expression body. Lambdas carry no declared
/// return type, so `->` here always introduces the body.
pub fn parse_lambda_expr(parser: &mut Parser) -> Result<Expr, Diagnostic> {
    let start = parser.advance().span;
    parser.expect(TokenKind::OpenParen)?;
    let params = parse_param_list(parser)?;
    parser.expect(TokenKind::CloseParen)?;

    let body = match parser.current_token_kind() {
        TokenKind::OpenCurly => FuncBody::Block(parse_block(parser)?),
        TokenKind::FatArrow | TokenKind::Arrow => {
            parser.advance();
            FuncBody::Expr(Box::new(parse_expr(parser, BindingPower::Default)?))
        }
        _ => FuncBody::Expr(Box::new(parse_expr(parser, BindingPower::Default)?)),
    };

    Ok(Expr::Lambda {
        params,
        body: Box::new(body),
        span: parser.span_from(start),
    })
}

pub fn parse_call_expr(
    parser: &mut Parser,
    left: Expr,
    _bp: BindingPower,
) -> Result<Expr, Diagnostic> {
    parser.advance();
    let saved = parser.set_struct_literals(true);
    let result = parse_call_tail(parser, left);
    parser.set_struct_literals(saved);
    result
}

fn parse_call_tail(parser: &mut Parser, left: Expr) -> Result<Expr, Diagnostic> {
    let mut args = vec![];
    parser.skip_newlines();

    while !parser.check(TokenKind::CloseParen) && parser.has_tokens() {
        // Both `name: expr` and `name = expr` are named-argument forms.
        let named = parser.check(TokenKind::Identifier)
            && matches!(
                parser.peek_kind(1),
                TokenKind::Colon | TokenKind::Assignment
            );

        let arg = if named {
            let name_token = parser.advance();
            parser.advance();
            let value = parse_expr(parser, BindingPower::Default)?;
            let span = name_token.span.to(&value.span());
            CallArg {
                name: Some(name_token.value),
                value,
                span,
            }
        } else {
            let value = parse_expr(parser, BindingPower::Default)?;
            let span = value.span();
            CallArg {
                name: None,
                value,
                span,
            }
        };
        args.push(arg);

        if parser.check(TokenKind::Comma) {
            parser.advance();
        }
        parser.skip_newlines();
    }

    parser.expect(TokenKind::CloseParen)?;
    let span = left.span().to(&parser.prev_token_span());

    Ok(Expr::Call {
        callee: Box::new(left),
        args,
        span,
    })
}

pub fn parse_index_expr(
    parser: &mut Parser,
    left: Expr,
    _bp: BindingPower,
) -> Result<Expr, Diagnostic> {
    parser.advance();
    let saved = parser.set_struct_literals(true);
    let index = parse_expr(parser, BindingPower::Default);
    parser.set_struct_literals(saved);
    let index = index?;
    parser.skip_newlines();
    parser.expect(TokenKind::CloseBracket)?;
    let span = left.span().to(&parser.prev_token_span());

    Ok(Expr::Index {
        target: Box::new(left),
        index: Box::new(index),
        span,
    })
}

pub fn parse_field_expr(
    parser: &mut Parser,
    left: Expr,
    _bp: BindingPower,
) -> Result<Expr, Diagnostic> {
    parser.advance();
    let name = parser.expect(TokenKind::Identifier)?;
    let span = left.span().to(&name.span);

    Ok(Expr::Field {
        target: Box::new(left),
        name: name.value,
        span,
    })
}

pub fn parse_opt_field_expr(
    parser: &mut Parser,
    left: Expr,
    _bp: BindingPower,
) -> Result<Expr, Diagnostic> {
    parser.advance();
    let name = parser.expect(TokenKind::Identifier)?;
    let span = left.span().to(&name.span);

    Ok(Expr::OptField {
        target: Box::new(left),
        name: name.value,
        span,
    })
}

/// The pipe's right-hand side is a primary followed by call/index/field/
/// optional-chain suffixes only; further pipes chain left-associatively
/// through the outer precedence loop.
pub fn parse_pipe_expr(
    parser: &mut Parser,
    left: Expr,
    _bp: BindingPower,
) -> Result<Expr, Diagnostic> {
    parser.advance();
    let right = parse_pipe_operand(parser)?;
    let span = left.span().to(&right.span());

    Ok(Expr::Pipe {
        left: Box::new(left),
        right: Box::new(right),
        span,
    })
}

fn parse_pipe_operand(parser: &mut Parser) -> Result<Expr, Diagnostic> {
    let mut expr = parse_nud(parser)?;

    loop {
        expr = match parser.current_token_kind() {
            TokenKind::OpenParen => parse_call_expr(parser, expr, BindingPower::Call)?,
            TokenKind::OpenBracket => parse_index_expr(parser, expr, BindingPower::Call)?,
            TokenKind::Dot => parse_field_expr(parser, expr, BindingPower::Member)?,
            TokenKind::QuestionDot => parse_opt_field_expr(parser, expr, BindingPower::Member)?,
            _ => break,
        };
    }

    Ok(expr)
}

/// Struct initializer suffix `Name { field: expr, ... }`; only reached when
/// the positional gate in `parse_expr` is open.
fn parse_struct_init_expr(parser: &mut Parser, left: Expr) -> Result<Expr, Diagnostic> {
    let name = struct_literal_target(&left).unwrap_or_default();
    parser.advance();

    let saved = parser.set_struct_literals(true);
    let result = parse_struct_init_tail(parser, left, name);
    parser.set_struct_literals(saved);
    result
}

fn parse_struct_init_tail(
    parser: &mut Parser,
    left: Expr,
    name: Vec<String>,
) -> Result<Expr, Diagnostic> {
    let mut fields = vec![];
    parser.skip_newlines();

    while !parser.check(TokenKind::CloseCurly) && parser.has_tokens() {
        let field_token = parser.expect(TokenKind::Identifier)?;
        parser.expect(TokenKind::Colon)?;
        let value = parse_expr(parser, BindingPower::Default)?;
        let span = field_token.span.to(&value.span());
        fields.push(FieldInit {
            name: field_token.value,
            value,
            span,
        });
        if parser.check(TokenKind::Comma) {
            parser.advance();
        }
        parser.skip_newlines();
    }

    parser.expect(TokenKind::CloseCurly)?;
    let span = left.span().to(&parser.prev_token_span());

    Ok(Expr::StructInit { name, fields, span })
}
