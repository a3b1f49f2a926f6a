//! Parser state and the top-level parse loop.
//!
//! The parser owns the token stream, the lookup tables registered by
//! `lookups.rs` and `types.rs`, and the diagnostics accumulated so far.
//! On an unexpected token it records one diagnostic and synchronizes to
//! the next top-level keyword, statement terminator, or unmatched closing
//! brace, which bounds error cascades to one diagnostic per mistake.

use std::collections::HashMap;

use crate::{
    ast::{
        expressions::Expr,
        module::{Import, Module},
        types::Type,
    },
    diagnostics::diagnostics::{Diagnostic, DiagnosticKind},
    lexer::{
        lexer::tokenize,
        tokens::{Token, TokenKind},
    },
    Span,
};

use super::{
    decl::parse_decl,
    expr::parse_expr,
    lookups::{
        create_token_lookups, BPLookup, BindingPower, LEDLookup, NUDLookup, StmtLookup,
    },
    types::{create_token_type_lookups, parse_type, TypeBPLookup, TypeLEDLookup, TypeNUDLookup},
};

/// Hard ceiling on statement/expression/type nesting. Exceeding it aborts
/// the parse with a single fatal diagnostic instead of blowing the stack.
pub const MAX_NESTING_DEPTH: usize = 200;

pub struct Parser {
    /// The list of tokens to parse
    tokens: Vec<Token>,
    /// Current position in the token stream
    pos: usize,
    /// Diagnostics collected so far, in source order
    diagnostics: Vec<Diagnostic>,
    /// Lookup table for statement parsing handlers
    stmt_lookup: StmtLookup,
    /// Lookup table for null denotation (prefix) expression handlers
    nud_lookup: NUDLookup,
    /// Lookup table for left denotation (infix/postfix) expression handlers
    led_lookup: LEDLookup,
    /// Lookup table for expression binding powers (precedence)
    binding_power_lookup: BPLookup,
    /// Lookup table for type null denotation handlers
    type_nud_lookup: TypeNUDLookup,
    /// Lookup table for type left denotation handlers
    type_led_lookup: TypeLEDLookup,
    /// Lookup table for type binding powers
    type_binding_power_lookup: TypeBPLookup,
    /// Whether a `{` suffix currently reads as a struct initializer. False
    /// while parsing a condition or iterable, where `{` opens the body block.
    allow_struct_literal: bool,
    /// Current statement/expression/type nesting depth
    depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            pos: 0,
            diagnostics: vec![],
            stmt_lookup: HashMap::new(),
            nud_lookup: HashMap::new(),
            led_lookup: HashMap::new(),
            binding_power_lookup: HashMap::new(),
            type_nud_lookup: HashMap::new(),
            type_led_lookup: HashMap::new(),
            type_binding_power_lookup: HashMap::new(),
            allow_struct_literal: true,
            depth: 0,
        }
    }

    /// Returns the current token without advancing.
    pub fn current_token(&self) -> &Token {
        &self.tokens[self.pos]
    }

    /// Returns the kind of the current token.
    pub fn current_token_kind(&self) -> TokenKind {
        self.tokens[self.pos].kind
    }

    /// Returns the kind of the token `offset` positions ahead.
    pub fn peek_kind(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::EOF)
    }

    /// Advances to the next token and returns the one that was current.
    /// Never advances past the EOF token.
    pub fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    /// Expects a token of the specified kind, with optional custom error.
    pub fn expect_error(
        &mut self,
        expected_kind: TokenKind,
        error: Option<Diagnostic>,
    ) -> Result<Token, Diagnostic> {
        let token = self.current_token();
        if token.kind != expected_kind {
            match error {
                Some(error) => Err(error),
                None => Err(Diagnostic::new(
                    DiagnosticKind::MissingToken {
                        expected: format!("{}", expected_kind),
                        found: token.value.clone(),
                    },
                    token.span,
                )),
            }
        } else {
            Ok(self.advance())
        }
    }

    /// Expects a token of the specified kind with the default error message.
    pub fn expect(&mut self, expected_kind: TokenKind) -> Result<Token, Diagnostic> {
        self.expect_error(expected_kind, None)
    }

    pub fn check(&self, kind: TokenKind) -> bool {
        self.current_token_kind() == kind
    }

    /// Checks if there are more tokens to parse.
    pub fn has_tokens(&self) -> bool {
        self.pos < self.tokens.len() && self.current_token_kind() != TokenKind::EOF
    }

    /// Skips implicit terminators only; used inside bracketed expressions.
    pub fn skip_newlines(&mut self) {
        while self.current_token_kind() == TokenKind::Newline {
            self.advance();
        }
    }

    /// Skips implicit and explicit statement terminators.
    pub fn skip_terminators(&mut self) {
        while matches!(
            self.current_token_kind(),
            TokenKind::Newline | TokenKind::Semicolon
        ) {
            self.advance();
        }
    }

    pub fn record(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Span of the most recently consumed token.
    pub fn prev_token_span(&self) -> Span {
        if self.pos == 0 {
            self.tokens[0].span
        } else {
            self.tokens[self.pos - 1].span
        }
    }

    /// Span from `start` to the end of the last consumed token.
    pub fn span_from(&self, start: Span) -> Span {
        start.to(&self.prev_token_span())
    }

    /// Doc comment attached to the current token, if any.
    pub fn current_doc(&self) -> Option<String> {
        self.current_token().doc.clone()
    }

    pub fn struct_literals_allowed(&self) -> bool {
        self.allow_struct_literal
    }

    /// Sets whether `{` reads as a struct-initializer suffix, returning the
    /// previous value so callers can restore it.
    pub fn set_struct_literals(&mut self, allowed: bool) -> bool {
        std::mem::replace(&mut self.allow_struct_literal, allowed)
    }

    pub fn enter_nesting(&mut self) -> Result<(), Diagnostic> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            Err(Diagnostic::new(
                DiagnosticKind::NestingTooDeep,
                self.current_token().span,
            ))
        } else {
            Ok(())
        }
    }

    pub fn exit_nesting(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Registers a left denotation (infix/postfix) handler for a token.
    pub fn led(
        &mut self,
        kind: TokenKind,
        binding_power: BindingPower,
        led_fn: super::lookups::LEDHandler,
    ) {
        self.binding_power_lookup.insert(kind, binding_power);
        self.led_lookup.insert(kind, led_fn);
    }

    /// Registers a null denotation (prefix) handler for a token. Tokens that
    /// are also infix operators (`-`, `(`, `[`) keep their led precedence.
    pub fn nud(&mut self, kind: TokenKind, nud_fn: super::lookups::NUDHandler) {
        self.binding_power_lookup
            .entry(kind)
            .or_insert(BindingPower::Primary);
        self.nud_lookup.insert(kind, nud_fn);
    }

    /// Registers a statement handler for a token.
    pub fn stmt(&mut self, kind: TokenKind, stmt_fn: super::lookups::StmtHandler) {
        self.stmt_lookup.insert(kind, stmt_fn);
    }

    /// Registers a type left denotation handler.
    pub fn type_led(
        &mut self,
        kind: TokenKind,
        binding_power: BindingPower,
        led_fn: super::types::TypeLEDHandler,
    ) {
        self.type_binding_power_lookup.insert(kind, binding_power);
        self.type_led_lookup.insert(kind, led_fn);
    }

    /// Registers a type null denotation handler.
    pub fn type_nud(&mut self, kind: TokenKind, nud_fn: super::types::TypeNUDHandler) {
        self.type_binding_power_lookup
            .entry(kind)
            .or_insert(BindingPower::Primary);
        self.type_nud_lookup.insert(kind, nud_fn);
    }

    pub fn get_stmt_lookup(&self) -> &StmtLookup {
        &self.stmt_lookup
    }

    pub fn get_nud_lookup(&self) -> &NUDLookup {
        &self.nud_lookup
    }

    pub fn get_led_lookup(&self) -> &LEDLookup {
        &self.led_lookup
    }

    pub fn get_bp_lookup(&self) -> &BPLookup {
        &self.binding_power_lookup
    }

    pub fn get_type_nud_lookup(&self) -> &TypeNUDLookup {
        &self.type_nud_lookup
    }

    pub fn get_type_led_lookup(&self) -> &TypeLEDLookup {
        &self.type_led_lookup
    }

    pub fn get_type_bp_lookup(&self) -> &TypeBPLookup {
        &self.type_binding_power_lookup
    }

    /// Skips to the next synchronization point: a statement terminator
    /// (consumed), a top-level declaration keyword, or an unmatched closing
    /// brace at the current nesting depth (both left for the caller).
    pub fn synchronize(&mut self) {
        let mut depth = 0usize;

        while self.has_tokens() {
            let kind = self.current_token_kind();
            match kind {
                TokenKind::Newline | TokenKind::Semicolon if depth == 0 => {
                    self.advance();
                    return;
                }
                TokenKind::CloseCurly => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                TokenKind::OpenCurly | TokenKind::OpenParen | TokenKind::OpenBracket => {
                    depth += 1;
                }
                TokenKind::CloseParen | TokenKind::CloseBracket => {
                    depth = depth.saturating_sub(1);
                }
                k if k.starts_declaration() && depth == 0 => return,
                _ => {}
            }
            self.advance();
        }
    }

    /// Current token index; recovery loops compare it across a parse
    /// attempt to guarantee forward progress.
    pub fn position(&self) -> usize {
        self.pos
    }
}

/// Parses a stream of tokens into a Module plus diagnostics.
///
/// This is the main entry point for parsing. It creates a parser instance,
/// initializes all lookup tables, and parses the module header, imports,
/// and declarations until EOF. A fatal diagnostic (resource limit) aborts
/// the loop; everything else is recovered from in place.
pub fn parse(tokens: Vec<Token>) -> (Module, Vec<Diagnostic>) {
    let end = tokens.last().map(|t| t.span.end).unwrap_or(0);
    let mut parser = Parser::new(tokens);
    create_token_lookups(&mut parser);
    create_token_type_lookups(&mut parser);

    let mut module = Module {
        name: None,
        imports: vec![],
        decls: vec![],
        span: Span::new(0, end, 1, 1),
    };

    parser.skip_terminators();
    if parser.check(TokenKind::Module) {
        match parse_module_header(&mut parser) {
            Ok(name) => {
                module.name = Some(name);
                expect_statement_end(&mut parser);
            }
            Err(diagnostic) => {
                parser.record(diagnostic);
                parser.synchronize();
            }
        }
    }

    let mut seen_decl = false;
    loop {
        parser.skip_terminators();
        if !parser.has_tokens() {
            break;
        }

        if parser.check(TokenKind::Import) {
            // A late import still parses and is recorded; it only warns.
            if seen_decl {
                let token = parser.current_token();
                let diagnostic = Diagnostic::warning(
                    DiagnosticKind::UnexpectedTokenDetailed {
                        found: token.value.clone(),
                        message: String::from("imports must appear before declarations"),
                    },
                    token.span,
                );
                parser.record(diagnostic);
            }
            match parse_import(&mut parser) {
                Ok(import) => {
                    module.imports.push(import);
                    expect_statement_end(&mut parser);
                }
                Err(diagnostic) => {
                    parser.record(diagnostic);
                    parser.synchronize();
                }
            }
            continue;
        }

        let before = parser.position();
        match parse_decl(&mut parser) {
            Ok(decl) => {
                seen_decl = true;
                module.decls.push(decl);
                expect_statement_end(&mut parser);
            }
            Err(diagnostic) => {
                let fatal = diagnostic.is_fatal();
                parser.record(diagnostic);
                if fatal {
                    break;
                }
                parser.synchronize();
                // Guarantee forward progress even when the failed parse and
                // the synchronization both consumed nothing.
                if parser.position() == before && parser.has_tokens() {
                    parser.advance();
                }
            }
        }
    }

    (module, parser.diagnostics)
}

/// Requires the current token to end a statement; records a diagnostic and
/// synchronizes when trailing tokens follow a complete declaration.
fn expect_statement_end(parser: &mut Parser) {
    let kind = parser.current_token_kind();
    if kind.is_terminator() || kind == TokenKind::CloseCurly {
        return;
    }
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

fn parse_module_header(parser: &mut Parser) -> Result<Vec<String>, Diagnostic> {
    parser.expect(TokenKind::Module)?;
    parse_dotted_name(parser)
}

/// Parses `ident(.ident)*` into its segments.
pub(crate) fn parse_dotted_name(parser: &mut Parser) -> Result<Vec<String>, Diagnostic> {
    let mut segments = vec![parser.expect(TokenKind::Identifier)?.value];
    while parser.check(TokenKind::Dot) && parser.peek_kind(1) == TokenKind::Identifier {
        parser.advance();
        segments.push(parser.expect(TokenKind::Identifier)?.value);
    }
    Ok(segments)
}

/// Parses one import clause. The `as alias` and `{ names }` tails may come
/// in either order; both normalize to the same Import node.
pub(crate) fn parse_import(parser: &mut Parser) -> Result<Import, Diagnostic> {
    let start = parser.expect(TokenKind::Import)?.span;
    let path = parse_dotted_name(parser)?;

    let mut alias = None;
    let mut names = vec![];
    let mut saw_names = false;

    loop {
        match parser.current_token_kind() {
            TokenKind::As if alias.is_none() => {
                parser.advance();
                alias = Some(parser.expect(TokenKind::Identifier)?.value);
            }
            TokenKind::OpenCurly if !saw_names => {
                saw_names = true;
                parser.advance();
                parser.skip_newlines();
                while !parser.check(TokenKind::CloseCurly) && parser.has_tokens() {
                    names.push(parser.expect(TokenKind::Identifier)?.value);
                    if parser.check(TokenKind::Comma) {
                        parser.advance();
                    }
                    parser.skip_newlines();
                }
                parser.expect(TokenKind::CloseCurly)?;
            }
            _ => break,
        }
    }

    Ok(Import {
        path,
        alias,
        names,
        span: parser.span_from(start),
    })
}

/// Parses a source fragment as a single expression; `None` unless it lexes,
/// parses, and consumes the whole fragment cleanly.
pub fn parse_standalone_expr(source: &str) -> Option<Expr> {
    let (tokens, lex_diagnostics) = tokenize(source);
    if !lex_diagnostics.is_empty() {
        return None;
    }
    let mut parser = Parser::new(tokens);
    create_token_lookups(&mut parser);
    create_token_type_lookups(&mut parser);

    let expr = parse_expr(&mut parser, BindingPower::Default).ok()?;
    parser.skip_terminators();
    if parser.has_tokens() || !parser.diagnostics.is_empty() {
        return None;
    }
    Some(expr)
}

/// Parses a source fragment as a single type annotation.
pub fn parse_standalone_type(source: &str) -> Option<Type> {
    let (tokens, lex_diagnostics) = tokenize(source);
    if !lex_diagnostics.is_empty() {
        return None;
    }
    let mut parser = Parser::new(tokens);
    create_token_lookups(&mut parser);
    create_token_type_lookups(&mut parser);

    let ty = parse_type(&mut parser, BindingPower::Default).ok()?;
    parser.skip_terminators();
    if parser.has_tokens() || !parser.diagnostics.is_empty() {
        return None;
    }
    Some(ty)
}

/// Parses a canonical import string (`path [as alias] [{ names }]`) back
/// into an Import node.
pub fn parse_standalone_import(source: &str) -> Option<Import> {
    let fragment = format!("import {}", source);
    let (tokens, lex_diagnostics) = tokenize(&fragment);
    if !lex_diagnostics.is_empty() {
        return None;
    }
    let mut parser = Parser::new(tokens);
    create_token_lookups(&mut parser);
    create_token_type_lookups(&mut parser);

    let import = parse_import(&mut parser).ok()?;
    parser.skip_terminators();
    if parser.has_tokens() || !parser.diagnostics.is_empty() {
        return None;
    }
    Some(import)
}
