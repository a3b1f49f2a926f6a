use lazy_static::lazy_static;
use std::{collections::HashMap, fmt::Display};

use crate::Span;

lazy_static! {
    /// Process-wide, read-only keyword table. Initialized once before any
    /// parsing begins and never mutated afterwards.
    pub static ref RESERVED_LOOKUP: HashMap<&'static str, TokenKind> = {
        let mut map = HashMap::new();
        map.insert("module", TokenKind::Module);
        map.insert("import", TokenKind::Import);
        map.insert("as", TokenKind::As);
        map.insert("export", TokenKind::Export);
        map.insert("const", TokenKind::Const);
        map.insert("let", TokenKind::Let);
        map.insert("var", TokenKind::Var);
        map.insert("type", TokenKind::Type);
        map.insert("record", TokenKind::Record);
        map.insert("enum", TokenKind::Enum);
        map.insert("trait", TokenKind::Trait);
        map.insert("class", TokenKind::Class);
        map.insert("func", TokenKind::Func);
        map.insert("fn", TokenKind::Fn);
        map.insert("async", TokenKind::Async);
        map.insert("await", TokenKind::Await);
        map.insert("agent", TokenKind::Agent);
        map.insert("task", TokenKind::Task);
        map.insert("workflow", TokenKind::Workflow);
        map.insert("test", TokenKind::Test);
        map.insert("profile", TokenKind::Profile);
        map.insert("capabilities", TokenKind::Capabilities);
        map.insert("tools", TokenKind::Tools);
        map.insert("policy", TokenKind::Policy);
        map.insert("if", TokenKind::If);
        map.insert("else", TokenKind::Else);
        map.insert("while", TokenKind::While);
        map.insert("for", TokenKind::For);
        map.insert("in", TokenKind::In);
        map.insert("match", TokenKind::Match);
        map.insert("try", TokenKind::Try);
        map.insert("catch", TokenKind::Catch);
        map.insert("finally", TokenKind::Finally);
        map.insert("using", TokenKind::Using);
        map.insert("defer", TokenKind::Defer);
        map.insert("return", TokenKind::Return);
        map.insert("break", TokenKind::Break);
        map.insert("continue", TokenKind::Continue);
        map.insert("throw", TokenKind::Throw);
        map.insert("spawn", TokenKind::Spawn);
        map.insert("channel", TokenKind::Channel);
        map.insert("send", TokenKind::Send);
        map.insert("recv", TokenKind::Recv);
        map.insert("select", TokenKind::Select);
        map.insert("case", TokenKind::Case);
        map.insert("to", TokenKind::To);
        map.insert("from", TokenKind::From);
        map.insert("or", TokenKind::Or);
        map.insert("and", TokenKind::And);
        map.insert("not", TokenKind::Not);
        map.insert("true", TokenKind::True);
        map.insert("false", TokenKind::False);
        map.insert("null", TokenKind::Null);
        map
    };
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    EOF,
    /// Implicit statement terminator inserted at a significant newline.
    Newline,
    Int,
    Float,
    String,
    Duration,
    Identifier,

    At,

    OpenBracket,
    CloseBracket,
    OpenCurly,
    CloseCurly,
    OpenParen,
    CloseParen,

    Assignment, // =
    Equals,     // ==
    NotEquals,  // !=

    Less,
    LessEquals,
    Greater,
    GreaterEquals,

    Dot,
    QuestionDot,
    Question,
    Comma,
    Colon,
    Semicolon,
    Arrow,    // ->
    FatArrow, // =>
    Pipe,     // |>

    Plus,
    Dash,
    Slash,
    Star,
    Percent,

    // Reserved
    Module,
    Import,
    As,
    Export,
    Const,
    Let,
    Var,
    Type,
    Record,
    Enum,
    Trait,
    Class,
    Func,
    Fn,
    Async,
    Await,
    Agent,
    Task,
    Workflow,
    Test,
    Profile,
    Capabilities,
    Tools,
    Policy,
    If,
    Else,
    While,
    For,
    In,
    Match,
    Try,
    Catch,
    Finally,
    Using,
    Defer,
    Return,
    Break,
    Continue,
    Throw,
    Spawn,
    Channel,
    Send,
    Recv,
    Select,
    Case,
    To,
    From,
    Or,
    And,
    Not,
    True,
    False,
    Null,
}

impl TokenKind {
    /// Statement terminators, implicit or explicit.
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            TokenKind::Newline | TokenKind::Semicolon | TokenKind::EOF
        )
    }

    /// Keywords that can begin a top-level declaration; used as
    /// synchronization points during error recovery.
    pub fn starts_declaration(&self) -> bool {
        matches!(
            self,
            TokenKind::Module
                | TokenKind::Import
                | TokenKind::Export
                | TokenKind::Const
                | TokenKind::Let
                | TokenKind::Var
                | TokenKind::Type
                | TokenKind::Record
                | TokenKind::Enum
                | TokenKind::Trait
                | TokenKind::Class
                | TokenKind::Func
                | TokenKind::Async
                | TokenKind::Agent
                | TokenKind::Task
                | TokenKind::Workflow
                | TokenKind::Test
                | TokenKind::At
        )
    }

    /// Token kinds that may end a statement. A newline after any other kind
    /// means the statement continues on the next line.
    pub fn ends_statement(&self) -> bool {
        matches!(
            self,
            TokenKind::Identifier
                | TokenKind::Int
                | TokenKind::Float
                | TokenKind::String
                | TokenKind::Duration
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
                | TokenKind::CloseBracket
                | TokenKind::CloseCurly
                | TokenKind::CloseParen
                | TokenKind::Question
                | TokenKind::Return
                | TokenKind::Break
                | TokenKind::Continue
        )
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub span: Span,
    /// Doc-comment text attached to this token, if one directly preceded it.
    pub doc: Option<String>,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Token {{ kind: {}, value: {} }}", self.kind, self.value)
    }
}
