//! Source-like rendering of AST nodes.
//!
//! The renderer never inserts parentheses of its own: parser-produced
//! trees carry explicit Paren nodes wherever the source had them, so the
//! plain structural rendering re-parses to the same shape.

use crate::ast::{
    declarations::{Decl, DeclKind, FuncBody, Param},
    expressions::{BinaryOp, Expr},
    module::Import,
    patterns::Pattern,
    statements::{SelectOp, Stmt},
    types::{Type, TypeKind},
};

pub fn render_import(import: &Import) -> String {
    let mut out = import.path.join(".");
    if let Some(alias) = &import.alias {
        out.push_str(&format!(" as {}", alias));
    }
    if !import.names.is_empty() {
        out.push_str(&format!(" {{ {} }}", import.names.join(", ")));
    }
    out
}

pub fn render_type(ty: &Type) -> String {
    // Result[T, E] renders as the documented two-armed union, but only at
    // the top of a type string; nested occurrences keep the named form so
    // the string stays parseable.
    if let TypeKind::Name { path, args } = &ty.kind {
        if path.len() == 1 && path[0] == "Result" && args.len() == 2 {
            let base = format!(
                "{{ok: {}}} | {{err: {}}}",
                render_type_nested(&args[0]),
                render_type_nested(&args[1])
            );
            return if ty.optional {
                format!("{}?", base)
            } else {
                base
            };
        }
    }

    render_type_nested(ty)
}

fn render_type_nested(ty: &Type) -> String {
    let base = match &ty.kind {
        TypeKind::Name { path, args } => {
            if args.is_empty() {
                path.join(".")
            } else {
                let rendered: Vec<String> = args.iter().map(render_type_nested).collect();
                format!("{}[{}]", path.join("."), rendered.join(", "))
            }
        }
        TypeKind::List(item) => format!("List[{}]", render_type_nested(item)),
        TypeKind::Map(key, value) => {
            format!(
                "Map[{}, {}]",
                render_type_nested(key),
                render_type_nested(value)
            )
        }
        TypeKind::Tuple(items) => {
            let rendered: Vec<String> = items.iter().map(render_type_nested).collect();
            format!("({})", rendered.join(", "))
        }
        TypeKind::Func { params, ret } => {
            let rendered: Vec<String> = params.iter().map(render_type_nested).collect();
            let mut out = format!("func({})", rendered.join(", "));
            if let Some(ret) = ret {
                out.push_str(&format!(" -> {}", render_type_nested(ret)));
            }
            // An optional function type needs grouping so the `?` does not
            // attach to the return type instead.
            if ty.optional {
                return format!("({})?", out);
            }
            out
        }
        TypeKind::Struct(fields) => {
            let rendered: Vec<String> = fields
                .iter()
                .map(|(name, ty)| format!("{}: {}", name, render_type_nested(ty)))
                .collect();
            format!("{{{}}}", rendered.join(", "))
        }
    };

    if ty.optional {
        format!("{}?", base)
    } else {
        base
    }
}

pub fn escape_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

fn render_float(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

pub fn render_param(param: &Param) -> String {
    let mut out = param.name.clone();
    if let Some(ty) = &param.ty {
        out.push_str(&format!(": {}", render_type(ty)));
    }
    if let Some(default) = &param.default {
        out.push_str(&format!(" = {}", render_expr(default)));
    }
    out
}

pub fn render_expr(expr: &Expr) -> String {
    match expr {
        Expr::Int { value, .. } => format!("{}", value),
        Expr::Float { value, .. } => render_float(*value),
        Expr::Str { value, .. } => escape_string(value),
        Expr::Bool { value, .. } => format!("{}", value),
        Expr::Null { .. } => String::from("null"),
        Expr::Duration { value, unit, .. } => format!("{}{}", value, unit.as_str()),
        Expr::Ident { name, .. } => name.clone(),
        Expr::Paren { expr, .. } => format!("({})", render_expr(expr)),
        Expr::List { items, .. } => {
            let rendered: Vec<String> = items.iter().map(render_expr).collect();
            format!("[{}]", rendered.join(", "))
        }
        Expr::Map { entries, .. } => {
            let rendered: Vec<String> = entries
                .iter()
                .map(|e| format!("{}: {}", render_expr(&e.key), render_expr(&e.value)))
                .collect();
            format!("{{{}}}", rendered.join(", "))
        }
        Expr::Tuple { items, .. } => {
            let rendered: Vec<String> = items.iter().map(render_expr).collect();
            if items.len() == 1 {
                format!("({},)", rendered[0])
            } else {
                format!("({})", rendered.join(", "))
            }
        }
        Expr::StructInit { name, fields, .. } => {
            if fields.is_empty() {
                format!("{} {{}}", name.join("."))
            } else {
                let rendered: Vec<String> = fields
                    .iter()
                    .map(|f| format!("{}: {}", f.name, render_expr(&f.value)))
                    .collect();
                format!("{} {{ {} }}", name.join("."), rendered.join(", "))
            }
        }
        Expr::Lambda { params, body, .. } => {
            let rendered: Vec<String> = params.iter().map(render_param).collect();
            match body.as_ref() {
                FuncBody::Expr(expr) => {
                    format!("fn({}) => {}", rendered.join(", "), render_expr(expr))
                }
                FuncBody::Block(stmts) => {
                    format!("fn({}) {}", rendered.join(", "), render_block(stmts))
                }
            }
        }
        Expr::Binary {
            op, left, right, ..
        } => {
            if *op == BinaryOp::Assign {
                format!("{} = {}", render_expr(left), render_expr(right))
            } else {
                format!("{} {} {}", render_expr(left), op.as_str(), render_expr(right))
            }
        }
        Expr::Unary { op, expr, .. } => match op {
            crate::ast::expressions::UnaryOp::Neg => format!("-{}", render_expr(expr)),
            other => format!("{} {}", other.as_str(), render_expr(expr)),
        },
        Expr::Call { callee, args, .. } => {
            let rendered: Vec<String> = args
                .iter()
                .map(|a| match &a.name {
                    Some(name) => format!("{}: {}", name, render_expr(&a.value)),
                    None => render_expr(&a.value),
                })
                .collect();
            format!("{}({})", render_expr(callee), rendered.join(", "))
        }
        Expr::Index { target, index, .. } => {
            format!("{}[{}]", render_expr(target), render_expr(index))
        }
        Expr::Field { target, name, .. } => format!("{}.{}", render_expr(target), name),
        Expr::OptField { target, name, .. } => format!("{}?.{}", render_expr(target), name),
        Expr::Pipe { left, right, .. } => {
            format!("{} |> {}", render_expr(left), render_expr(right))
        }
    }
}

fn render_block(stmts: &[Stmt]) -> String {
    if stmts.is_empty() {
        return String::from("{}");
    }
    let rendered: Vec<String> = stmts.iter().map(render_stmt).collect();
    format!("{{ {} }}", rendered.join("; "))
}

fn render_body(body: &FuncBody) -> String {
    match body {
        FuncBody::Block(stmts) => render_block(stmts),
        FuncBody::Expr(expr) => format!("=> {}", render_expr(expr)),
    }
}

/// Compact single-line statement rendering; enough for lambda bodies
/// embedded in default expressions.
pub fn render_stmt(stmt: &Stmt) -> String {
    match stmt {
        Stmt::Decl(decl) => render_decl(decl),
        Stmt::If {
            cond,
            then_body,
            else_body,
            ..
        } => {
            let mut out = format!("if {} {}", render_expr(cond), render_block(then_body));
            if let Some(else_body) = else_body {
                out.push_str(&format!(" else {}", render_block(else_body)));
            }
            out
        }
        Stmt::While { cond, body, .. } => {
            format!("while {} {}", render_expr(cond), render_block(body))
        }
        Stmt::For {
            pattern,
            iter,
            body,
            ..
        } => format!(
            "for {} in {} {}",
            render_pattern(pattern),
            render_expr(iter),
            render_block(body)
        ),
        Stmt::Match { subject, arms, .. } => {
            let rendered: Vec<String> = arms
                .iter()
                .map(|arm| {
                    let mut out = render_pattern(&arm.pattern);
                    if let Some(guard) = &arm.guard {
                        out.push_str(&format!(" if {}", render_expr(guard)));
                    }
                    out.push_str(" => ");
                    out.push_str(&match &arm.body {
                        FuncBody::Block(stmts) => render_block(stmts),
                        FuncBody::Expr(expr) => render_expr(expr),
                    });
                    out
                })
                .collect();
            format!("match {} {{ {} }}", render_expr(subject), rendered.join(", "))
        }
        Stmt::Try {
            body,
            catches,
            finally,
            ..
        } => {
            let mut out = format!("try {}", render_block(body));
            for catch in catches {
                out.push_str(" catch ");
                if let Some(name) = &catch.name {
                    out.push_str(name);
                    if let Some(ty) = &catch.ty {
                        out.push_str(&format!(": {}", render_type(ty)));
                    }
                    out.push(' ');
                }
                out.push_str(&render_block(&catch.body));
            }
            if let Some(finally) = finally {
                out.push_str(&format!(" finally {}", render_block(finally)));
            }
            out
        }
        Stmt::Using {
            resource,
            alias,
            body,
            ..
        } => {
            let mut out = format!("using {}", render_expr(resource));
            if let Some(alias) = alias {
                out.push_str(&format!(" as {}", alias));
            }
            out.push(' ');
            out.push_str(&render_block(body));
            out
        }
        Stmt::Defer { body, .. } => match body.as_slice() {
            [single] => format!("defer {}", render_stmt(single)),
            _ => format!("defer {}", render_block(body)),
        },
        Stmt::Return { value, .. } => match value {
            Some(value) => format!("return {}", render_expr(value)),
            None => String::from("return"),
        },
        Stmt::Break { .. } => String::from("break"),
        Stmt::Continue { .. } => String::from("continue"),
        Stmt::Throw { value, .. } => format!("throw {}", render_expr(value)),
        Stmt::Spawn { expr, .. } => format!("spawn {}", render_expr(expr)),
        Stmt::Channel { name, ty, .. } => match ty {
            Some(ty) => format!("channel {}: {}", name, render_type(ty)),
            None => format!("channel {}", name),
        },
        Stmt::Send { value, channel, .. } => {
            format!("send {} to {}", render_expr(value), render_expr(channel))
        }
        Stmt::Recv { name, channel, .. } => {
            format!("recv {} from {}", name, render_expr(channel))
        }
        Stmt::Select { arms, default, .. } => {
            let mut rendered: Vec<String> = arms
                .iter()
                .map(|arm| {
                    let op = match &arm.op {
                        SelectOp::Recv { name, channel } => {
                            format!("case recv {} from {}", name, render_expr(channel))
                        }
                        SelectOp::Send { value, channel } => {
                            format!("case send {} to {}", render_expr(value), render_expr(channel))
                        }
                    };
                    format!("{} => {}", op, render_block(&arm.body))
                })
                .collect();
            if let Some(default) = default {
                rendered.push(format!("else => {}", render_block(default)));
            }
            format!("select {{ {} }}", rendered.join(", "))
        }
        Stmt::Label { name, stmt, .. } => format!("{}: {}", name, render_stmt(stmt)),
        Stmt::Expr { expr, .. } => render_expr(expr),
    }
}

fn render_decl(decl: &Decl) -> String {
    match &decl.kind {
        DeclKind::Value(v) => {
            let mut out = format!("{} {}", v.kind.as_str(), v.name);
            if let Some(ty) = &v.ty {
                out.push_str(&format!(": {}", render_type(ty)));
            }
            if let Some(value) = &v.value {
                out.push_str(&format!(" = {}", render_expr(value)));
            }
            out
        }
        DeclKind::Func(f) => {
            let params: Vec<String> = f.params.iter().map(render_param).collect();
            let mut out = String::new();
            if f.is_async {
                out.push_str("async ");
            }
            out.push_str(&format!("func {}({})", f.name, params.join(", ")));
            if let Some(ret) = &f.ret {
                out.push_str(&format!(" -> {}", render_type(ret)));
            }
            if let Some(body) = &f.body {
                out.push(' ');
                out.push_str(&render_body(body));
            }
            out
        }
        DeclKind::TypeAlias(t) => format!("type {} = {}", t.name, render_type(&t.ty)),
        DeclKind::Record(r) => {
            let rendered: Vec<String> = r
                .fields
                .iter()
                .map(|f| {
                    let marker = if f.optional { "?" } else { "" };
                    let mut out = format!("{}{}: {}", f.name, marker, render_type(&f.ty));
                    if let Some(default) = &f.default {
                        out.push_str(&format!(" = {}", render_expr(default)));
                    }
                    out
                })
                .collect();
            format!("record {} {{ {} }}", r.name, rendered.join(", "))
        }
        DeclKind::Enum(e) => {
            let rendered: Vec<String> = e
                .cases
                .iter()
                .map(|case| {
                    if !case.type_args.is_empty() {
                        let args: Vec<String> = case.type_args.iter().map(render_type).collect();
                        format!("{}({})", case.name, args.join(", "))
                    } else if !case.params.is_empty() {
                        let params: Vec<String> =
                            case.params.iter().map(render_param).collect();
                        format!("{} {{ {} }}", case.name, params.join(", "))
                    } else {
                        case.name.clone()
                    }
                })
                .collect();
            format!("enum {} {{ {} }}", e.name, rendered.join(", "))
        }
        DeclKind::Trait(t) => format!("trait {} {{ ... }}", t.name),
        DeclKind::Class(c) => format!("class {} {{ ... }}", c.name),
        DeclKind::Agent(a) => format!("agent {} {{ ... }}", a.name),
        DeclKind::Task(t) => format!("task {}(...)", t.name),
        DeclKind::Workflow(w) => format!("workflow {} {{ ... }}", w.name),
        DeclKind::Test(t) => format!("test {} {{ ... }}", t.name),
        DeclKind::Export(inner) => format!("export {}", render_decl(inner)),
    }
}

pub fn render_pattern(pattern: &Pattern) -> String {
    match pattern {
        Pattern::Wildcard { .. } => String::from("_"),
        Pattern::Binding { name, .. } => name.clone(),
        Pattern::Literal { value, .. } => render_expr(value),
        Pattern::Record { name, fields, .. } => {
            let rendered: Vec<String> = fields
                .iter()
                .map(|f| match &f.pattern {
                    Some(pattern) => format!("{}: {}", f.name, render_pattern(pattern)),
                    None => f.name.clone(),
                })
                .collect();
            format!("{} {{ {} }}", name.join("."), rendered.join(", "))
        }
        Pattern::Enum {
            qualifier,
            name,
            args,
            ..
        } => {
            let mut out = match qualifier {
                Some(qualifier) => format!("{}.{}", qualifier, name),
                None => name.clone(),
            };
            if !args.is_empty() {
                let rendered: Vec<String> = args.iter().map(render_pattern).collect();
                out.push_str(&format!("({})", rendered.join(", ")));
            }
            out
        }
        Pattern::Tuple { items, .. } => {
            let rendered: Vec<String> = items.iter().map(render_pattern).collect();
            if items.len() == 1 {
                format!("({},)", rendered[0])
            } else {
                format!("({})", rendered.join(", "))
            }
        }
    }
}
