use std::collections::HashMap;

use crate::{
    ast::{expressions::Expr, statements::Stmt},
    diagnostics::diagnostics::Diagnostic,
    lexer::tokens::TokenKind,
};

use super::{decl::parse_decl_stmt, expr::*, parser::Parser, stmt::*};

/// Operator precedence, loosest first:
/// assignment < `or` < `and` < comparison < additive < multiplicative <
/// unary < postfix (call/index/member/pipe/struct-init).
#[derive(PartialEq, PartialOrd, Clone, Copy, Debug)]
pub enum BindingPower {
    Default,
    Assignment,
    Or,
    And,
    Comparison,
    Additive,
    Multiplicative,
    Unary,
    Call,
    Member,
    Primary,
}

pub type StmtHandler = fn(&mut Parser) -> Result<Stmt, Diagnostic>;
pub type NUDHandler = fn(&mut Parser) -> Result<Expr, Diagnostic>;
pub type LEDHandler = fn(&mut Parser, Expr, BindingPower) -> Result<Expr, Diagnostic>;

pub type StmtLookup = HashMap<TokenKind, StmtHandler>;
pub type NUDLookup = HashMap<TokenKind, NUDHandler>;
pub type LEDLookup = HashMap<TokenKind, LEDHandler>;
pub type BPLookup = HashMap<TokenKind, BindingPower>;

pub fn create_token_lookups(parser: &mut Parser) {
    parser.led(
        TokenKind::Assignment,
        BindingPower::Assignment,
        parse_assignment_expr,
    );

    // Logical
    parser.led(TokenKind::Or, BindingPower::Or, parse_binary_expr);
    parser.led(TokenKind::And, BindingPower::And, parse_binary_expr);

    // Comparison
    parser.led(TokenKind::Equals, BindingPower::Comparison, parse_binary_expr);
    parser.led(TokenKind::NotEquals, BindingPower::Comparison, parse_binary_expr);
    parser.led(TokenKind::Less, BindingPower::Comparison, parse_binary_expr);
    parser.led(TokenKind::LessEquals, BindingPower::Comparison, parse_binary_expr);
    parser.led(TokenKind::Greater, BindingPower::Comparison, parse_binary_expr);
    parser.led(TokenKind::GreaterEquals, BindingPower::Comparison, parse_binary_expr);

    // Additive and multiplicative
    parser.led(TokenKind::Plus, BindingPower::Additive, parse_binary_expr);
    parser.led(TokenKind::Dash, BindingPower::Additive, parse_binary_expr);
    parser.led(TokenKind::Star, BindingPower::Multiplicative, parse_binary_expr);
    parser.led(TokenKind::Slash, BindingPower::Multiplicative, parse_binary_expr);
    parser.led(TokenKind::Percent, BindingPower::Multiplicative, parse_binary_expr);

    // Postfix chain: call/index/member/optional-chain/pipe. The struct
    // initializer suffix is handled positionally in parse_expr itself.
    parser.led(TokenKind::OpenParen, BindingPower::Call, parse_call_expr);
    parser.led(TokenKind::OpenBracket, BindingPower::Call, parse_index_expr);
    parser.led(TokenKind::Pipe, BindingPower::Call, parse_pipe_expr);
    parser.led(TokenKind::Dot, BindingPower::Member, parse_field_expr);
    parser.led(TokenKind::QuestionDot, BindingPower::Member, parse_opt_field_expr);

    // Literals and symbols
    parser.nud(TokenKind::Int, parse_primary_expr);
    parser.nud(TokenKind::Float, parse_primary_expr);
    parser.nud(TokenKind::String, parse_primary_expr);
    parser.nud(TokenKind::Duration, parse_primary_expr);
    parser.nud(TokenKind::Identifier, parse_primary_expr);
    parser.nud(TokenKind::True, parse_primary_expr);
    parser.nud(TokenKind::False, parse_primary_expr);
    parser.nud(TokenKind::Null, parse_primary_expr);

    // Prefix operators
    parser.nud(TokenKind::Dash, parse_prefix_expr);
    parser.nud(TokenKind::Not, parse_prefix_expr);
    parser.nud(TokenKind::Await, parse_prefix_expr);

    // Grouping and literals with structure
    parser.nud(TokenKind::OpenParen, parse_grouping_expr);
    parser.nud(TokenKind::OpenBracket, parse_list_expr);
    parser.nud(TokenKind::OpenCurly, parse_map_expr);
    parser.nud(TokenKind::Fn, parse_lambda_expr);

    // Statements
    parser.stmt(TokenKind::If, parse_if_stmt);
    parser.stmt(TokenKind::While, parse_while_stmt);
    parser.stmt(TokenKind::For, parse_for_stmt);
    parser.stmt(TokenKind::Match, parse_match_stmt);
    parser.stmt(TokenKind::Try, parse_try_stmt);
    parser.stmt(TokenKind::Using, parse_using_stmt);
    parser.stmt(TokenKind::Defer, parse_defer_stmt);
    parser.stmt(TokenKind::Return, parse_return_stmt);
    parser.stmt(TokenKind::Break, parse_break_stmt);
    parser.stmt(TokenKind::Continue, parse_continue_stmt);
    parser.stmt(TokenKind::Throw, parse_throw_stmt);
    parser.stmt(TokenKind::Spawn, parse_spawn_stmt);
    parser.stmt(TokenKind::Channel, parse_channel_stmt);
    parser.stmt(TokenKind::Send, parse_send_stmt);
    parser.stmt(TokenKind::Recv, parse_recv_stmt);
    parser.stmt(TokenKind::Select, parse_select_stmt);

    // Declarations usable as statements
    parser.stmt(TokenKind::Const, parse_decl_stmt);
    parser.stmt(TokenKind::Let, parse_decl_stmt);
    parser.stmt(TokenKind::Var, parse_decl_stmt);
    parser.stmt(TokenKind::Type, parse_decl_stmt);
    parser.stmt(TokenKind::Record, parse_decl_stmt);
    parser.stmt(TokenKind::Enum, parse_decl_stmt);
    parser.stmt(TokenKind::Func, parse_decl_stmt);
    parser.stmt(TokenKind::Async, parse_decl_stmt);
}
