//! Statement parsing.
//!
//! Blocks recover per statement: one diagnostic per mistake, then
//! synchronize and keep going. The block after a condition is always a
//! Block; struct-initializer suffixes are suspended while the condition
//! itself is parsed and restored inside any nested parens or brackets.

use crate::{
    ast::{
        declarations::FuncBody,
        expressions::Expr,
        statements::{CatchClause, MatchArm, SelectArm, SelectOp, Stmt},
    },
    diagnostics::diagnostics::{Diagnostic, DiagnosticKind},
    lexer::tokens::TokenKind,
};

use super::{
    expr::parse_expr,
    lookups::BindingPower,
    parser::Parser,
    pattern::parse_pattern,
    types::parse_type,
};

pub fn parse_stmt(parser: &mut Parser) -> Result<Stmt, Diagnostic> {
    parser.enter_nesting()?;
    let result = parse_stmt_inner(parser);
    parser.exit_nesting();
    result
}

fn parse_stmt_inner(parser: &mut Parser) -> Result<Stmt, Diagnostic> {
    let kind = parser.current_token_kind();

    if let Some(handler) = parser.get_stmt_lookup().get(&kind).copied() {
        return handler(parser);
    }

    // `ident :` at statement level is always a label; map keys only exist
    // inside expression-context braces.
    if kind == TokenKind::Identifier && parser.peek_kind(1) == TokenKind::Colon {
        return parse_label_stmt(parser);
    }

    let expr = parse_expr(parser, BindingPower::Default)?;
    Ok(Stmt::Expr {
        span: expr.span(),
        expr,
    })
}

/// Parses `{ stmt* }`, recovering inside the block so one bad statement
/// costs one diagnostic.
pub fn parse_block(parser: &mut Parser) -> Result<Vec<Stmt>, Diagnostic> {
    parser.expect(TokenKind::OpenCurly)?;
    let body = parse_stmt_list(parser)?;
    parser.expect(TokenKind::CloseCurly)?;
    Ok(body)
}

/// Parses statements until the closing brace (or EOF). Fatal diagnostics
/// propagate; everything else records and synchronizes.
pub fn parse_stmt_list(parser: &mut Parser) -> Result<Vec<Stmt>, Diagnostic> {
    let mut body = vec![];
    parser.skip_terminators();

    while parser.has_tokens() && !parser.check(TokenKind::CloseCurly) {
        let before = parser.position();
        match parse_stmt(parser) {
            Ok(stmt) => {
                body.push(stmt);
                let kind = parser.current_token_kind();
                if !kind.is_terminator() && kind != TokenKind::CloseCurly {
                    let token = parser.current_token();
                    let diagnostic = Diagnostic::new(
                        DiagnosticKind::UnexpectedTokenDetailed {
                            found: token.value.clone(),
                            message: String::from("expected end of statement"),
                        },
                        token.span,
                    );
                    parser.record(diagnostic);
                    parser.synchronize();
                }
            }
            Err(diagnostic) => {
                if diagnostic.is_fatal() {
                    return Err(diagnostic);
                }
                parser.record(diagnostic);
                parser.synchronize();
                if parser.position() == before && parser.has_tokens() {
                    parser.advance();
                }
            }
        }
        parser.skip_terminators();
    }

    Ok(body)
}

/// Parses an expression with struct-initializer suffixes suspended, for
/// positions where a `{` must open the statement's body block.
pub(super) fn parse_condition(parser: &mut Parser) -> Result<Expr, Diagnostic> {
    let saved = parser.set_struct_literals(false);
    let result = parse_expr(parser, BindingPower::Default);
    parser.set_struct_literals(saved);
    result
}

/// Skips a single terminator when the given keyword follows it, so clauses
/// like `else` and `catch` may start on their own line.
fn skip_newline_before(parser: &mut Parser, kind: TokenKind) {
    if parser.check(TokenKind::Newline) && parser.peek_kind(1) == kind {
        parser.advance();
    }
}

pub fn parse_if_stmt(parser: &mut Parser) -> Result<Stmt, Diagnostic> {
    let start = parser.advance().span;
    let cond = parse_condition(parser)?;
    let then_body = parse_block(parser)?;

    skip_newline_before(parser, TokenKind::Else);
    let else_body = if parser.check(TokenKind::Else) {
        parser.advance();
        if parser.check(TokenKind::If) {
            Some(vec![parse_if_stmt(parser)?])
        } else {
            Some(parse_block(parser)?)
        }
    } else {
        None
    };

    Ok(Stmt::If {
        cond,
        then_body,
        else_body,
        span: parser.span_from(start),
    })
}

pub fn parse_while_stmt(parser: &mut Parser) -> Result<Stmt, Diagnostic> {
    let start = parser.advance().span;
    let cond = parse_condition(parser)?;
    let body = parse_block(parser)?;

    Ok(Stmt::While {
        cond,
        body,
        span: parser.span_from(start),
    })
}

pub fn parse_for_stmt(parser: &mut Parser) -> Result<Stmt, Diagnostic> {
    let start = parser.advance().span;
    let pattern = parse_pattern(parser)?;
    parser.expect(TokenKind::In)?;
    let iter = parse_condition(parser)?;
    let body = parse_block(parser)?;

    Ok(Stmt::For {
        pattern,
        iter,
        body,
        span: parser.span_from(start),
    })
}

pub fn parse_match_stmt(parser: &mut Parser) -> Result<Stmt, Diagnostic> {
    let start = parser.advance().span;
    let subject = parse_condition(parser)?;
    parser.expect(TokenKind::OpenCurly)?;
    parser.skip_terminators();

    let mut arms = vec![];
    while parser.has_tokens() && !parser.check(TokenKind::CloseCurly) {
        let arm_start = parser.current_token().span;
        let pattern = parse_pattern(parser)?;

        let guard = if parser.check(TokenKind::If) {
            parser.advance();
            Some(parse_condition(parser)?)
        } else {
            None
        };

        parser.expect(TokenKind::FatArrow)?;

        let body = if parser.check(TokenKind::OpenCurly) {
            FuncBody::Block(parse_block(parser)?)
        } else {
            FuncBody::Expr(Box::new(parse_expr(parser, BindingPower::Default)?))
        };

        arms.push(MatchArm {
            pattern,
            guard,
            body,
            span: parser.span_from(arm_start),
        });

        if parser.check(TokenKind::Comma) {
            parser.advance();
        }
        parser.skip_terminators();
    }

    parser.expect(TokenKind::CloseCurly)?;

    Ok(Stmt::Match {
        subject,
        arms,
        span: parser.span_from(start),
    })
}

pub fn parse_try_stmt(parser: &mut Parser) -> Result<Stmt, Diagnostic> {
    let start = parser.advance().span;
    let body = parse_block(parser)?;

    let mut catches = vec![];
    loop {
        skip_newline_before(parser, TokenKind::Catch);
        if !parser.check(TokenKind::Catch) {
            break;
        }
        let catch_start = parser.advance().span;

        let mut name = None;
        let mut ty = None;
        if parser.check(TokenKind::Identifier) {
            name = Some(parser.advance().value);
            if parser.check(TokenKind::Colon) {
                parser.advance();
                ty = Some(parse_type(parser, BindingPower::Default)?);
            }
        }

        let catch_body = parse_block(parser)?;
        catches.push(CatchClause {
            name,
            ty,
            body: catch_body,
            span: parser.span_from(catch_start),
        });
    }

    skip_newline_before(parser, TokenKind::Finally);
    let finally = if parser.check(TokenKind::Finally) {
        parser.advance();
        Some(parse_block(parser)?)
    } else {
        None
    };

    if catches.is_empty() && finally.is_none() {
        let token = parser.current_token();
        let diagnostic = Diagnostic::new(
            DiagnosticKind::MissingToken {
                expected: String::from("`catch` or `finally`"),
                found: token.value.clone(),
            },
            token.span,
        );
        parser.record(diagnostic);
    }

    Ok(Stmt::Try {
        body,
        catches,
        finally,
        span: parser.span_from(start),
    })
}

pub fn parse_using_stmt(parser: &mut Parser) -> Result<Stmt, Diagnostic> {
    let start = parser.advance().span;
    let resource = parse_condition(parser)?;

    let alias = if parser.check(TokenKind::As) {
        parser.advance();
        Some(parser.expect(TokenKind::Identifier)?.value)
    } else {
        None
    };

    let body = parse_block(parser)?;

    Ok(Stmt::Using {
        resource,
        alias,
        body,
        span: parser.span_from(start),
    })
}

pub fn parse_defer_stmt(parser: &mut Parser) -> Result<Stmt, Diagnostic> {
    let start = parser.advance().span;

    let body = if parser.check(TokenKind::OpenCurly) {
        parse_block(parser)?
    } else {
        vec![parse_stmt(parser)?]
    };

    Ok(Stmt::Defer {
        body,
        span: parser.span_from(start),
    })
}

pub fn parse_return_stmt(parser: &mut Parser) -> Result<Stmt, Diagnostic> {
    let start = parser.advance().span;

    let kind = parser.current_token_kind();
    let value = if kind.is_terminator() || kind == TokenKind::CloseCurly {
        None
    } else {
        Some(parse_expr(parser, BindingPower::Default)?)
    };

    Ok(Stmt::Return {
        value,
        span: parser.span_from(start),
    })
}

pub fn parse_break_stmt(parser: &mut Parser) -> Result<Stmt, Diagnostic> {
    let token = parser.advance();
    Ok(Stmt::Break { span: token.span })
}

pub fn parse_continue_stmt(parser: &mut Parser) -> Result<Stmt, Diagnostic> {
    let token = parser.advance();
    Ok(Stmt::Continue { span: token.span })
}

pub fn parse_throw_stmt(parser: &mut Parser) -> Result<Stmt, Diagnostic> {
    let start = parser.advance().span;
    let value = parse_expr(parser, BindingPower::Default)?;

    Ok(Stmt::Throw {
        value,
        span: parser.span_from(start),
    })
}

pub fn parse_spawn_stmt(parser: &mut Parser) -> Result<Stmt, Diagnostic> {
    let start = parser.advance().span;
    let expr = parse_expr(parser, BindingPower::Default)?;

    Ok(Stmt::Spawn {
        expr,
        span: parser.span_from(start),
    })
}

pub fn parse_channel_stmt(parser: &mut Parser) -> Result<Stmt, Diagnostic> {
    let start = parser.advance().span;
    let name = parser.expect(TokenKind::Identifier)?.value;

    let ty = if parser.check(TokenKind::Colon) {
        parser.advance();
        Some(parse_type(parser, BindingPower::Default)?)
    } else {
        None
    };

    Ok(Stmt::Channel {
        name,
        ty,
        span: parser.span_from(start),
    })
}

pub fn parse_send_stmt(parser: &mut Parser) -> Result<Stmt, Diagnostic> {
    let start = parser.advance().span;
    let value = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::To)?;
    let channel = parse_expr(parser, BindingPower::Default)?;

    Ok(Stmt::Send {
        value,
        channel,
        span: parser.span_from(start),
    })
}

pub fn parse_recv_stmt(parser: &mut Parser) -> Result<Stmt, Diagnostic> {
    let start = parser.advance().span;
    let name = parser.expect(TokenKind::Identifier)?.value;
    parser.expect(TokenKind::From)?;
    let channel = parse_expr(parser, BindingPower::Default)?;

    Ok(Stmt::Recv {
        name,
        channel,
        span: parser.span_from(start),
    })
}

pub fn parse_select_stmt(parser: &mut Parser) -> Result<Stmt, Diagnostic> {
    let start = parser.advance().span;
    parser.expect(TokenKind::OpenCurly)?;
    parser.skip_terminators();

    let mut arms = vec![];
    let mut default = None;

    while parser.has_tokens() && !parser.check(TokenKind::CloseCurly) {
        match parser.current_token_kind() {
            TokenKind::Case => {
                let arm_start = parser.advance().span;
                let op = match parser.current_token_kind() {
                    TokenKind::Recv => {
                        parser.advance();
                        let name = parser.expect(TokenKind::Identifier)?.value;
                        parser.expect(TokenKind::From)?;
                        let channel = parse_condition(parser)?;
                        SelectOp::Recv { name, channel }
                    }
                    TokenKind::Send => {
                        parser.advance();
                        let value = parse_condition(parser)?;
                        parser.expect(TokenKind::To)?;
                        let channel = parse_condition(parser)?;
                        SelectOp::Send { value, channel }
                    }
                    _ => {
                        let token = parser.current_token();
                        return Err(Diagnostic::new(
                            DiagnosticKind::UnexpectedTokenDetailed {
                                found: token.value.clone(),
                                message: String::from("expected `recv` or `send` select arm"),
                            },
                            token.span,
                        ));
                    }
                };

                parser.expect(TokenKind::FatArrow)?;
                let body = parse_block(parser)?;
                arms.push(SelectArm {
                    op,
                    body,
                    span: parser.span_from(arm_start),
                });
            }
            TokenKind::Else => {
                parser.advance();
                parser.expect(TokenKind::FatArrow)?;
                default = Some(parse_block(parser)?);
            }
            _ => {
                let token = parser.current_token();
                return Err(Diagnostic::new(
                    DiagnosticKind::UnexpectedTokenDetailed {
                        found: token.value.clone(),
                        message: String::from("expected `case` or `else` in select"),
                    },
                    token.span,
                ));
            }
        }

        if parser.check(TokenKind::Comma) {
            parser.advance();
        }
        parser.skip_terminators();
    }

    parser.expect(TokenKind::CloseCurly)?;

    Ok(Stmt::Select {
        arms,
        default,
        span: parser.span_from(start),
    })
}

fn parse_label_stmt(parser: &mut Parser) -> Result<Stmt, Diagnostic> {
    let name_token = parser.advance();
    parser.expect(TokenKind::Colon)?;
    let stmt = parse_stmt(parser)?;
    let span = name_token.span.to(&parser.prev_token_span());

    Ok(Stmt::Label {
        name: name_token.value,
        stmt: Box::new(stmt),
        span,
    })
}
