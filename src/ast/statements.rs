use serde::Serialize;

use crate::Span;

use super::{
    declarations::{Decl, FuncBody},
    expressions::Expr,
    patterns::Pattern,
    types::Type,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Stmt {
    /// Declarations are also statements inside blocks.
    Decl(Decl),
    If {
        cond: Expr,
        then_body: Vec<Stmt>,
        else_body: Option<Vec<Stmt>>,
        span: Span,
    },
    While {
        cond: Expr,
        body: Vec<Stmt>,
        span: Span,
    },
    For {
        pattern: Pattern,
        iter: Expr,
        body: Vec<Stmt>,
        span: Span,
    },
    Match {
        subject: Expr,
        arms: Vec<MatchArm>,
        span: Span,
    },
    Try {
        body: Vec<Stmt>,
        catches: Vec<CatchClause>,
        finally: Option<Vec<Stmt>>,
        span: Span,
    },
    Using {
        resource: Expr,
        alias: Option<String>,
        body: Vec<Stmt>,
        span: Span,
    },
    Defer {
        body: Vec<Stmt>,
        span: Span,
    },
    Return {
        value: Option<Expr>,
        span: Span,
    },
    Break {
        span: Span,
    },
    Continue {
        span: Span,
    },
    Throw {
        value: Expr,
        span: Span,
    },
    Spawn {
        expr: Expr,
        span: Span,
    },
    Channel {
        name: String,
        ty: Option<Type>,
        span: Span,
    },
    Send {
        value: Expr,
        channel: Expr,
        span: Span,
    },
    Recv {
        name: String,
        channel: Expr,
        span: Span,
    },
    Select {
        arms: Vec<SelectArm>,
        default: Option<Vec<Stmt>>,
        span: Span,
    },
    Label {
        name: String,
        stmt: Box<Stmt>,
        span: Span,
    },
    Expr {
        expr: Expr,
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Decl(decl) => decl.span,
            Stmt::If { span, .. }
            | Stmt::While { span, .. }
            | Stmt::For { span, .. }
            | Stmt::Match { span, .. }
            | Stmt::Try { span, .. }
            | Stmt::Using { span, .. }
            | Stmt::Defer { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::Break { span }
            | Stmt::Continue { span }
            | Stmt::Throw { span, .. }
            | Stmt::Spawn { span, .. }
            | Stmt::Channel { span, .. }
            | Stmt::Send { span, .. }
            | Stmt::Recv { span, .. }
            | Stmt::Select { span, .. }
            | Stmt::Label { span, .. }
            | Stmt::Expr { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchArm {
    pub pattern: Pattern,
    pub guard: Option<Expr>,
    pub body: FuncBody,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatchClause {
    pub name: Option<String>,
    pub ty: Option<Type>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectArm {
    pub op: SelectOp,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SelectOp {
    Recv { name: String, channel: Expr },
    Send { value: Expr, channel: Expr },
}
