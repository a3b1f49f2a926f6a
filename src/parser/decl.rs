//! Declaration parsing.
//!
//! Covers value declarations, type aliases, records, enums, traits,
//! classes, functions, and the agent/task/workflow/test constructs.
//! Member names are checked for uniqueness within each declaration; a
//! duplicate records a diagnostic without aborting the declaration.

use std::collections::HashSet;

use crate::{
    ast::{
        declarations::{
            AgentDecl, Attribute, ClassDecl, Decl, DeclKind, EnumCase, EnumDecl, Field, FuncBody,
            FuncDecl, KeyValue, Param, RecordDecl, TaskDecl, TestDecl, ToolSig, TraitDecl,
            TypeAliasDecl, ValueDecl, ValueKind, WorkflowDecl,
        },
        expressions::Expr,
        statements::Stmt,
    },
    diagnostics::diagnostics::{Diagnostic, DiagnosticKind},
    lexer::tokens::TokenKind,
    Span,
};

use super::{
    expr::parse_expr,
    lookups::BindingPower,
    parser::{parse_dotted_name, Parser},
    stmt::parse_block,
    types::parse_type,
};

/// Statement handler wrapping declarations usable inside blocks.
pub fn parse_decl_stmt(parser: &mut Parser) -> Result<Stmt, Diagnostic> {
    Ok(Stmt::Decl(parse_decl(parser)?))
}

pub fn parse_decl(parser: &mut Parser) -> Result<Decl, Diagnostic> {
    let start = parser.current_token().span;
    let mut doc = parser.current_doc();

    let mut attributes = vec![];
    while parser.check(TokenKind::At) {
        attributes.push(parse_attribute(parser)?);
        parser.skip_newlines();
    }
    if doc.is_none() {
        doc = parser.current_doc();
    }

    let kind = parse_decl_kind(parser)?;

    Ok(Decl {
        kind,
        doc,
        attributes,
        span: parser.span_from(start),
    })
}

fn parse_decl_kind(parser: &mut Parser) -> Result<DeclKind, Diagnostic> {
    match parser.current_token_kind() {
        TokenKind::Export => {
            parser.advance();
            let inner = parse_decl(parser)?;
            Ok(DeclKind::Export(Box::new(inner)))
        }
        TokenKind::Const | TokenKind::Let | TokenKind::Var => {
            Ok(DeclKind::Value(parse_value_decl(parser)?))
        }
        TokenKind::Type => Ok(DeclKind::TypeAlias(parse_type_alias(parser)?)),
        TokenKind::Record => Ok(DeclKind::Record(parse_record_decl(parser)?)),
        TokenKind::Enum => Ok(DeclKind::Enum(parse_enum_decl(parser)?)),
        TokenKind::Trait => Ok(DeclKind::Trait(parse_trait_decl(parser)?)),
        TokenKind::Class => Ok(DeclKind::Class(parse_class_decl(parser)?)),
        TokenKind::Func | TokenKind::Async => Ok(DeclKind::Func(parse_func(parser, true)?)),
        TokenKind::Agent => Ok(DeclKind::Agent(parse_agent_decl(parser)?)),
        TokenKind::Task => Ok(DeclKind::Task(parse_task_decl(parser)?)),
        TokenKind::Workflow => Ok(DeclKind::Workflow(parse_workflow_decl(parser)?)),
        TokenKind::Test => Ok(DeclKind::Test(parse_test_decl(parser)?)),
        _ => {
            let token = parser.advance();
            Err(Diagnostic::new(
                DiagnosticKind::UnexpectedTokenDetailed {
                    found: token.value.clone(),
                    message: String::from("expected a declaration"),
                },
                token.span,
            ))
        }
    }
}

fn parse_attribute(parser: &mut Parser) -> Result<Attribute, Diagnostic> {
    let start = parser.expect(TokenKind::At)?.span;
    let name = parser.expect(TokenKind::Identifier)?.value;

    let mut args = vec![];
    if parser.check(TokenKind::OpenParen) {
        parser.advance();
        parser.skip_newlines();
        while !parser.check(TokenKind::CloseParen) && parser.has_tokens() {
            args.push(parse_expr(parser, BindingPower::Default)?);
            if parser.check(TokenKind::Comma) {
                parser.advance();
            }
            parser.skip_newlines();
        }
        parser.expect(TokenKind::CloseParen)?;
    }

    Ok(Attribute {
        name,
        args,
        span: parser.span_from(start),
    })
}

fn parse_value_decl(parser: &mut Parser) -> Result<ValueDecl, Diagnostic> {
    let start_token = parser.advance();
    let kind = match start_token.kind {
        TokenKind::Const => ValueKind::Const,
        TokenKind::Let => ValueKind::Let,
        _ => ValueKind::Var,
    };

    let error = Diagnostic::new(
        DiagnosticKind::UnexpectedTokenDetailed {
            found: parser.current_token().value.clone(),
            message: String::from("expected identifier during variable declaration"),
        },
        parser.current_token().span,
    );
    let name = parser
        .expect_error(TokenKind::Identifier, Some(error))?
        .value;

    let ty = if parser.check(TokenKind::Colon) {
        parser.advance();
        Some(parse_type(parser, BindingPower::Default)?)
    } else {
        None
    };

    let value = if parser.check(TokenKind::Assignment) {
        parser.advance();
        Some(parse_expr(parser, BindingPower::Default)?)
    } else {
        None
    };

    if value.is_none() && ty.is_none() {
        return Err(Diagnostic::new(
            DiagnosticKind::UnexpectedTokenDetailed {
                found: parser.current_token().value.clone(),
                message: String::from("expected rhs or explicit type"),
            },
            parser.current_token().span,
        ));
    }

    if kind == ValueKind::Const && value.is_none() {
        return Err(Diagnostic::new(
            DiagnosticKind::UnexpectedTokenDetailed {
                found: parser.current_token().value.clone(),
                message: String::from("expected rhs in constant definition"),
            },
            parser.current_token().span,
        ));
    }

    Ok(ValueDecl {
        kind,
        name,
        ty,
        value,
        span: parser.span_from(start_token.span),
    })
}

fn parse_type_alias(parser: &mut Parser) -> Result<TypeAliasDecl, Diagnostic> {
    let start = parser.advance().span;
    let name = parser.expect(TokenKind::Identifier)?.value;
    let type_params = parse_type_params(parser)?;
    parser.expect(TokenKind::Assignment)?;
    let ty = parse_type(parser, BindingPower::Default)?;

    Ok(TypeAliasDecl {
        name,
        type_params,
        ty,
        span: parser.span_from(start),
    })
}

/// `[T, U]` after a declaration name.
fn parse_type_params(parser: &mut Parser) -> Result<Vec<String>, Diagnostic> {
    let mut params = vec![];
    if parser.check(TokenKind::OpenBracket) {
        parser.advance();
        while !parser.check(TokenKind::CloseBracket) && parser.has_tokens() {
            params.push(parser.expect(TokenKind::Identifier)?.value);
            if parser.check(TokenKind::Comma) {
                parser.advance();
            }
        }
        parser.expect(TokenKind::CloseBracket)?;
    }
    Ok(params)
}

/// Errors with a pinpointed missing-brace diagnostic when a member list
/// runs into EOF or the start of the next declaration. `allow_funcs` is set
/// for bodies where `func`/`async` legitimately begin a member.
fn expect_member_or_close(
    parser: &Parser,
    container: Span,
    allow_funcs: bool,
) -> Result<(), Diagnostic> {
    let kind = parser.current_token_kind();
    let member = allow_funcs && matches!(kind, TokenKind::Func | TokenKind::Async);
    if kind == TokenKind::EOF || (kind.starts_declaration() && !member) {
        return Err(Diagnostic::new(
            DiagnosticKind::MissingToken {
                expected: String::from("`}`"),
                found: parser.current_token().value.clone(),
            },
            container,
        ));
    }
    Ok(())
}

fn parse_record_decl(parser: &mut Parser) -> Result<RecordDecl, Diagnostic> {
    let start = parser.advance().span;
    let name = parser.expect(TokenKind::Identifier)?.value;
    let type_params = parse_type_params(parser)?;
    let open = parser.expect(TokenKind::OpenCurly)?.span;

    let mut fields: Vec<Field> = vec![];
    let mut seen = HashSet::new();
    parser.skip_terminators();
    while !parser.check(TokenKind::CloseCurly) {
        expect_member_or_close(parser, open, false)?;
        let field = parse_field(parser)?;
        if !seen.insert(field.name.clone()) {
            parser.record(Diagnostic::new(
                DiagnosticKind::DuplicateMember {
                    name: field.name.clone(),
                },
                field.span,
            ));
        }
        fields.push(field);
        if parser.check(TokenKind::Comma) {
            parser.advance();
        }
        parser.skip_terminators();
    }
    parser.expect(TokenKind::CloseCurly)?;

    Ok(RecordDecl {
        name,
        type_params,
        fields,
        span: parser.span_from(start),
    })
}

/// `name[?]: Type [= default]`.
fn parse_field(parser: &mut Parser) -> Result<Field, Diagnostic> {
    let name_token = parser.expect(TokenKind::Identifier)?;

    let optional = if parser.check(TokenKind::Question) {
        parser.advance();
        true
    } else {
        false
    };

    parser.expect(TokenKind::Colon)?;
    let ty = parse_type(parser, BindingPower::Default)?;

    let default = if parser.check(TokenKind::Assignment) {
        parser.advance();
        Some(parse_expr(parser, BindingPower::Default)?)
    } else {
        None
    };

    Ok(Field {
        name: name_token.value,
        ty,
        optional,
        default,
        span: name_token.span.to(&parser.prev_token_span()),
    })
}

fn parse_enum_decl(parser: &mut Parser) -> Result<EnumDecl, Diagnostic> {
    let start = parser.advance().span;
    let name = parser.expect(TokenKind::Identifier)?.value;
    let type_params = parse_type_params(parser)?;
    let open = parser.expect(TokenKind::OpenCurly)?.span;

    let mut cases: Vec<EnumCase> = vec![];
    let mut seen = HashSet::new();
    parser.skip_terminators();
    while !parser.check(TokenKind::CloseCurly) {
        expect_member_or_close(parser, open, false)?;
        let case = parse_enum_case(parser)?;
        if !seen.insert(case.name.clone()) {
            parser.record(Diagnostic::new(
                DiagnosticKind::DuplicateMember {
                    name: case.name.clone(),
                },
                case.span,
            ));
        }
        cases.push(case);
        if parser.check(TokenKind::Comma) {
            parser.advance();
        }
        parser.skip_terminators();
    }
    parser.expect(TokenKind::CloseCurly)?;

    Ok(EnumDecl {
        name,
        type_params,
        cases,
        span: parser.span_from(start),
    })
}

/// `Name`, `Name(TypeArgs)`, or `Name { field: Type, ... }`.
fn parse_enum_case(parser: &mut Parser) -> Result<EnumCase, Diagnostic> {
    let name_token = parser.expect(TokenKind::Identifier)?;
    let mut type_args = vec![];
    let mut params = vec![];

    match parser.current_token_kind() {
        TokenKind::OpenParen => {
            parser.advance();
            parser.skip_newlines();
            while !parser.check(TokenKind::CloseParen) && parser.has_tokens() {
                type_args.push(parse_type(parser, BindingPower::Default)?);
                if parser.check(TokenKind::Comma) {
                    parser.advance();
                }
                parser.skip_newlines();
            }
            parser.expect(TokenKind::CloseParen)?;
        }
        TokenKind::OpenCurly => {
            parser.advance();
            parser.skip_newlines();
            while !parser.check(TokenKind::CloseCurly) && parser.has_tokens() {
                let param_name = parser.expect(TokenKind::Identifier)?;
                parser.expect(TokenKind::Colon)?;
                let ty = parse_type(parser, BindingPower::Default)?;
                params.push(Param {
                    name: param_name.value,
                    ty: Some(ty),
                    default: None,
                    span: param_name.span.to(&parser.prev_token_span()),
                });
                if parser.check(TokenKind::Comma) {
                    parser.advance();
                }
                parser.skip_newlines();
            }
            parser.expect(TokenKind::CloseCurly)?;
        }
        _ => {}
    }

    Ok(EnumCase {
        name: name_token.value,
        type_args,
        params,
        span: name_token.span.to(&parser.prev_token_span()),
    })
}

fn parse_trait_decl(parser: &mut Parser) -> Result<TraitDecl, Diagnostic> {
    let start = parser.advance().span;
    let name = parser.expect(TokenKind::Identifier)?.value;
    let open = parser.expect(TokenKind::OpenCurly)?.span;

    let mut funcs: Vec<FuncDecl> = vec![];
    let mut seen = HashSet::new();
    parser.skip_terminators();
    while !parser.check(TokenKind::CloseCurly) {
        expect_member_or_close(parser, open, true)?;
        if !matches!(
            parser.current_token_kind(),
            TokenKind::Func | TokenKind::Async
        ) {
            let token = parser.current_token();
            return Err(Diagnostic::new(
                DiagnosticKind::UnexpectedTokenDetailed {
                    found: token.value.clone(),
                    message: String::from("trait members are function signatures"),
                },
                token.span,
            ));
        }
        let func = parse_func(parser, false)?;
        if !seen.insert(func.name.clone()) {
            parser.record(Diagnostic::new(
                DiagnosticKind::DuplicateMember {
                    name: func.name.clone(),
                },
                func.span,
            ));
        }
        funcs.push(func);
        parser.skip_terminators();
    }
    parser.expect(TokenKind::CloseCurly)?;

    Ok(TraitDecl {
        name,
        funcs,
        span: parser.span_from(start),
    })
}

fn parse_class_decl(parser: &mut Parser) -> Result<ClassDecl, Diagnostic> {
    let start = parser.advance().span;
    let name = parser.expect(TokenKind::Identifier)?.value;
    let type_params = parse_type_params(parser)?;

    let mut traits = vec![];
    if parser.check(TokenKind::Colon) {
        parser.advance();
        loop {
            traits.push(parse_dotted_name(parser)?.join("."));
            if parser.check(TokenKind::Comma) {
                parser.advance();
            } else {
                break;
            }
        }
    }

    let open = parser.expect(TokenKind::OpenCurly)?.span;

    let mut fields: Vec<Field> = vec![];
    let mut funcs: Vec<FuncDecl> = vec![];
    let mut seen = HashSet::new();
    parser.skip_terminators();
    while !parser.check(TokenKind::CloseCurly) {
        expect_member_or_close(parser, open, true)?;
        match parser.current_token_kind() {
            TokenKind::Func | TokenKind::Async => {
                let func = parse_func(parser, true)?;
                if !seen.insert(func.name.clone()) {
                    parser.record(Diagnostic::new(
                        DiagnosticKind::DuplicateMember {
                            name: func.name.clone(),
                        },
                        func.span,
                    ));
                }
                funcs.push(func);
            }
            TokenKind::Identifier => {
                let field = parse_field(parser)?;
                if !seen.insert(field.name.clone()) {
                    parser.record(Diagnostic::new(
                        DiagnosticKind::DuplicateMember {
                            name: field.name.clone(),
                        },
                        field.span,
                    ));
                }
                fields.push(field);
                if parser.check(TokenKind::Comma) {
                    parser.advance();
                }
            }
            _ => {
                let token = parser.current_token();
                return Err(Diagnostic::new(
                    DiagnosticKind::UnexpectedTokenDetailed {
                        found: token.value.clone(),
                        message: String::from("expected field or function member"),
                    },
                    token.span,
                ));
            }
        }
        parser.skip_terminators();
    }
    parser.expect(TokenKind::CloseCurly)?;

    Ok(ClassDecl {
        name,
        type_params,
        traits,
        fields,
        funcs,
        span: parser.span_from(start),
    })
}

/// `[async] func name[T](params) [-> Type]` plus a body when `with_body`:
/// either `{ block }` or `=> expr`. Signatures (trait members) stop after
/// the return type.
fn parse_func(parser: &mut Parser, with_body: bool) -> Result<FuncDecl, Diagnostic> {
    let start = parser.current_token().span;

    let is_async = if parser.check(TokenKind::Async) {
        parser.advance();
        true
    } else {
        false
    };

    parser.expect(TokenKind::Func)?;
    let name = parser.expect(TokenKind::Identifier)?.value;
    let type_params = parse_type_params(parser)?;

    parser.expect(TokenKind::OpenParen)?;
    let params = parse_param_list(parser)?;
    parser.expect(TokenKind::CloseParen)?;

    let ret = if parser.check(TokenKind::Arrow) {
        parser.advance();
        Some(parse_type(parser, BindingPower::Default)?)
    } else {
        None
    };

    let body = if !with_body {
        None
    } else if parser.check(TokenKind::FatArrow) {
        parser.advance();
        Some(FuncBody::Expr(Box::new(parse_expr(
            parser,
            BindingPower::Default,
        )?)))
    } else {
        Some(FuncBody::Block(parse_block(parser)?))
    };

    Ok(FuncDecl {
        name,
        type_params,
        params,
        ret,
        is_async,
        body,
        span: parser.span_from(start),
    })
}

/// Parameter list up to (but not consuming) the closing paren. Types and
/// defaults are both optional here; lambdas omit types freely.
pub(super) fn parse_param_list(parser: &mut Parser) -> Result<Vec<Param>, Diagnostic> {
    let mut params = vec![];
    parser.skip_newlines();

    while !parser.check(TokenKind::CloseParen) && parser.has_tokens() {
        let name_token = parser.expect(TokenKind::Identifier)?;

        let ty = if parser.check(TokenKind::Colon) {
            parser.advance();
            Some(parse_type(parser, BindingPower::Default)?)
        } else {
            None
        };

        let default = if parser.check(TokenKind::Assignment) {
            parser.advance();
            Some(parse_expr(parser, BindingPower::Default)?)
        } else {
            None
        };

        params.push(Param {
            name: name_token.value,
            ty,
            default,
            span: name_token.span.to(&parser.prev_token_span()),
        });

        if parser.check(TokenKind::Comma) {
            parser.advance();
        }
        parser.skip_newlines();
    }

    Ok(params)
}

fn parse_agent_decl(parser: &mut Parser) -> Result<AgentDecl, Diagnostic> {
    let start = parser.advance().span;
    let name = parser.expect(TokenKind::Identifier)?.value;
    let open = parser.expect(TokenKind::OpenCurly)?.span;

    let mut profile = None;
    let mut capabilities = None;
    let mut tools = None;
    let mut policy = None;
    let mut funcs = vec![];

    parser.skip_terminators();
    while !parser.check(TokenKind::CloseCurly) {
        expect_member_or_close(parser, open, true)?;
        match parser.current_token_kind() {
            TokenKind::Profile => {
                let section = parse_kv_block(parser)?;
                set_agent_section(parser, &mut profile, section, "profile", &name);
            }
            TokenKind::Capabilities => {
                let section = parse_kv_block(parser)?;
                for entry in &section {
                    if !matches!(entry.value, Expr::StructInit { .. }) {
                        parser.record(Diagnostic::new(
                            DiagnosticKind::UnexpectedTokenDetailed {
                                found: entry.name.clone(),
                                message: String::from("capability value must be a struct literal"),
                            },
                            entry.value.span(),
                        ));
                    }
                }
                set_agent_section(parser, &mut capabilities, section, "capabilities", &name);
            }
            TokenKind::Tools => {
                let section = parse_tools_block(parser)?;
                set_agent_section(parser, &mut tools, section, "tools", &name);
            }
            TokenKind::Policy => {
                let section = parse_kv_block(parser)?;
                set_agent_section(parser, &mut policy, section, "policy", &name);
            }
            TokenKind::Func | TokenKind::Async => {
                funcs.push(parse_func(parser, true)?);
            }
            _ => {
                let token = parser.current_token();
                return Err(Diagnostic::new(
                    DiagnosticKind::UnexpectedTokenDetailed {
                        found: token.value.clone(),
                        message: String::from(
                            "expected profile, capabilities, tools, policy, or func",
                        ),
                    },
                    token.span,
                ));
            }
        }
        parser.skip_terminators();
    }
    parser.expect(TokenKind::CloseCurly)?;

    Ok(AgentDecl {
        name,
        profile,
        capabilities,
        tools,
        policy,
        funcs,
        span: parser.span_from(start),
    })
}

/// At most one of each section per agent; the first wins, a duplicate is
/// reported and dropped.
fn set_agent_section<T>(
    parser: &mut Parser,
    slot: &mut Option<T>,
    section: T,
    section_name: &str,
    agent: &str,
) {
    if slot.is_some() {
        let span = parser.prev_token_span();
        parser.record(Diagnostic::new(
            DiagnosticKind::DuplicateAgentSection {
                section: section_name.to_string(),
                agent: agent.to_string(),
            },
            span,
        ));
    } else {
        *slot = Some(section);
    }
}

/// `section { identifier : expr, ... }` for profile, capabilities, and
/// policy blocks.
fn parse_kv_block(parser: &mut Parser) -> Result<Vec<KeyValue>, Diagnostic> {
    parser.advance();
    parser.expect(TokenKind::OpenCurly)?;
    parser.skip_terminators();

    let mut entries = vec![];
    while !parser.check(TokenKind::CloseCurly) && parser.has_tokens() {
        let name_token = parser.expect(TokenKind::Identifier)?;
        parser.expect(TokenKind::Colon)?;
        let value = parse_expr(parser, BindingPower::Default)?;
        entries.push(KeyValue {
            name: name_token.value,
            value,
            span: name_token.span.to(&parser.prev_token_span()),
        });
        if parser.check(TokenKind::Comma) {
            parser.advance();
        }
        parser.skip_terminators();
    }
    parser.expect(TokenKind::CloseCurly)?;

    Ok(entries)
}

/// A `tools { }` block contains only bare call signatures
/// (`qualified.name(params) -> Type`), never general statements.
fn parse_tools_block(parser: &mut Parser) -> Result<Vec<ToolSig>, Diagnostic> {
    parser.advance();
    let open = parser.expect(TokenKind::OpenCurly)?.span;
    parser.skip_terminators();

    let mut sigs = vec![];
    while !parser.check(TokenKind::CloseCurly) {
        expect_member_or_close(parser, open, false)?;
        let start = parser.current_token().span;
        let name = parse_dotted_name(parser)?;

        parser.expect(TokenKind::OpenParen)?;
        let params = parse_param_list(parser)?;
        parser.expect(TokenKind::CloseParen)?;

        let ret = if parser.check(TokenKind::Arrow) {
            parser.advance();
            Some(parse_type(parser, BindingPower::Default)?)
        } else {
            None
        };

        sigs.push(ToolSig {
            name,
            params,
            ret,
            span: parser.span_from(start),
        });

        if parser.check(TokenKind::Comma) {
            parser.advance();
        }
        parser.skip_terminators();
    }
    parser.expect(TokenKind::CloseCurly)?;

    Ok(sigs)
}

fn parse_task_decl(parser: &mut Parser) -> Result<TaskDecl, Diagnostic> {
    let start = parser.advance().span;
    let name = parser.expect(TokenKind::Identifier)?.value;

    parser.expect(TokenKind::OpenParen)?;
    let params = parse_param_list(parser)?;
    parser.expect(TokenKind::CloseParen)?;

    let ret = if parser.check(TokenKind::Arrow) {
        parser.advance();
        Some(parse_type(parser, BindingPower::Default)?)
    } else {
        None
    };

    let body = parse_block(parser)?;

    Ok(TaskDecl {
        name,
        params,
        ret,
        body,
        span: parser.span_from(start),
    })
}

fn parse_workflow_decl(parser: &mut Parser) -> Result<WorkflowDecl, Diagnostic> {
    let start = parser.advance().span;
    let name = parser.expect(TokenKind::Identifier)?.value;
    let body = parse_block(parser)?;

    Ok(WorkflowDecl {
        name,
        body,
        span: parser.span_from(start),
    })
}

/// `test "name" { }` or `test name { }`.
fn parse_test_decl(parser: &mut Parser) -> Result<TestDecl, Diagnostic> {
    let start = parser.advance().span;

    let name = match parser.current_token_kind() {
        TokenKind::String | TokenKind::Identifier => parser.advance().value,
        _ => {
            let token = parser.current_token();
            return Err(Diagnostic::new(
                DiagnosticKind::UnexpectedTokenDetailed {
                    found: token.value.clone(),
                    message: String::from("expected test name"),
                },
                token.span,
            ));
        }
    };

    let body = parse_block(parser)?;

    Ok(TestDecl {
        name,
        body,
        span: parser.span_from(start),
    })
}
