//! Canonical JSON export and reconstruction.
//!
//! `to_json` maps every AST node to the documented shape: a top-level
//! `{module, imports, decls}` object, kind-tagged objects for declarations,
//! statements, expressions, and patterns, type strings (`"T?"`,
//! `{ok: T} | {err: E}`), and source-like strings for defaults and imports.
//! `from_json` reconstructs an equivalent AST (spans default); string
//! fields are re-parsed through the lexer and parser.

use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::{
    ast::{
        declarations::{
            AgentDecl, Attribute, ClassDecl, Decl, DeclKind, EnumCase, EnumDecl, Field, FuncBody,
            FuncDecl, KeyValue, Param, RecordDecl, TaskDecl, TestDecl, ToolSig, TraitDecl,
            TypeAliasDecl, ValueDecl, ValueKind, WorkflowDecl,
        },
        expressions::{BinaryOp, CallArg, DurationUnit, Expr, FieldInit, MapEntry, UnaryOp},
        module::{Import, Module},
        patterns::{Pattern, PatternField},
        statements::{CatchClause, MatchArm, SelectArm, SelectOp, Stmt},
        types::{Type, TypeKind},
    },
    parser::parser::{parse_standalone_expr, parse_standalone_import, parse_standalone_type},
    Span,
};

use super::render::{render_expr, render_import, render_type};

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("malformed canonical AST: {0}")]
    Malformed(String),
}

/* ===================== Export ===================== */

pub fn to_json(module: &Module) -> Value {
    json!({
        "module": module.name.as_ref().map(|path| path.join(".")),
        "imports": module.imports.iter().map(render_import).collect::<Vec<_>>(),
        "decls": module.decls.iter().map(decl_to_json).collect::<Vec<_>>(),
    })
}

fn decl_to_json(decl: &Decl) -> Value {
    let mut value = decl_kind_to_json(&decl.kind);
    if let Value::Object(map) = &mut value {
        if let Some(doc) = &decl.doc {
            map.insert("doc".into(), json!(doc));
        }
        if !decl.attributes.is_empty() {
            map.insert(
                "attributes".into(),
                Value::Array(decl.attributes.iter().map(attribute_to_json).collect()),
            );
        }
    }
    value
}

fn attribute_to_json(attribute: &Attribute) -> Value {
    let mut map = Map::new();
    map.insert("name".into(), json!(attribute.name));
    if !attribute.args.is_empty() {
        map.insert(
            "args".into(),
            Value::Array(attribute.args.iter().map(expr_to_json).collect()),
        );
    }
    Value::Object(map)
}

fn decl_kind_to_json(kind: &DeclKind) -> Value {
    match kind {
        DeclKind::Value(v) => {
            let mut map = Map::new();
            map.insert("kind".into(), json!(v.kind.as_str()));
            map.insert("name".into(), json!(v.name));
            if let Some(ty) = &v.ty {
                map.insert("type".into(), json!(render_type(ty)));
            }
            if let Some(value) = &v.value {
                map.insert("value".into(), expr_to_json(value));
            }
            Value::Object(map)
        }
        DeclKind::TypeAlias(t) => {
            let mut map = Map::new();
            map.insert("kind".into(), json!("typealias"));
            map.insert("name".into(), json!(t.name));
            insert_type_params(&mut map, &t.type_params);
            map.insert("type".into(), json!(render_type(&t.ty)));
            Value::Object(map)
        }
        DeclKind::Record(r) => {
            let mut map = Map::new();
            map.insert("kind".into(), json!("record"));
            map.insert("name".into(), json!(r.name));
            insert_type_params(&mut map, &r.type_params);
            map.insert(
                "fields".into(),
                Value::Array(r.fields.iter().map(field_to_json).collect()),
            );
            Value::Object(map)
        }
        DeclKind::Enum(e) => {
            let mut map = Map::new();
            map.insert("kind".into(), json!("enum"));
            map.insert("name".into(), json!(e.name));
            insert_type_params(&mut map, &e.type_params);
            map.insert(
                "cases".into(),
                Value::Array(e.cases.iter().map(enum_case_to_json).collect()),
            );
            Value::Object(map)
        }
        DeclKind::Trait(t) => json!({
            "kind": "trait",
            "name": t.name,
            "funcs": t.funcs.iter().map(func_to_json).collect::<Vec<_>>(),
        }),
        DeclKind::Class(c) => {
            let mut map = Map::new();
            map.insert("kind".into(), json!("class"));
            map.insert("name".into(), json!(c.name));
            insert_type_params(&mut map, &c.type_params);
            if !c.traits.is_empty() {
                map.insert("traits".into(), json!(c.traits));
            }
            map.insert(
                "fields".into(),
                Value::Array(c.fields.iter().map(field_to_json).collect()),
            );
            map.insert(
                "funcs".into(),
                Value::Array(c.funcs.iter().map(func_to_json).collect()),
            );
            Value::Object(map)
        }
        DeclKind::Func(f) => func_to_json(f),
        DeclKind::Agent(a) => {
            let mut map = Map::new();
            map.insert("kind".into(), json!("agent"));
            map.insert("name".into(), json!(a.name));
            if let Some(profile) = &a.profile {
                map.insert(
                    "profile".into(),
                    Value::Array(profile.iter().map(kv_to_json).collect()),
                );
            }
            if let Some(capabilities) = &a.capabilities {
                map.insert(
                    "capabilities".into(),
                    Value::Array(capabilities.iter().map(kv_to_json).collect()),
                );
            }
            if let Some(tools) = &a.tools {
                map.insert(
                    "tools".into(),
                    Value::Array(tools.iter().map(tool_to_json).collect()),
                );
            }
            if let Some(policy) = &a.policy {
                map.insert(
                    "policy".into(),
                    Value::Array(policy.iter().map(kv_to_json).collect()),
                );
            }
            map.insert(
                "funcs".into(),
                Value::Array(a.funcs.iter().map(func_to_json).collect()),
            );
            Value::Object(map)
        }
        DeclKind::Task(t) => {
            let mut map = Map::new();
            map.insert("kind".into(), json!("task"));
            map.insert("name".into(), json!(t.name));
            map.insert(
                "params".into(),
                Value::Array(t.params.iter().map(param_to_json).collect()),
            );
            if let Some(ret) = &t.ret {
                map.insert("returns".into(), json!(render_type(ret)));
            }
            map.insert("body".into(), stmts_to_json(&t.body));
            Value::Object(map)
        }
        DeclKind::Workflow(w) => json!({
            "kind": "workflow",
            "name": w.name,
            "body": stmts_to_json(&w.body),
        }),
        DeclKind::Test(t) => json!({
            "kind": "test",
            "name": t.name,
            "body": stmts_to_json(&t.body),
        }),
        DeclKind::Export(inner) => json!({
            "kind": "export",
            "decl": decl_to_json(inner),
        }),
    }
}

fn insert_type_params(map: &mut Map<String, Value>, type_params: &[String]) {
    if !type_params.is_empty() {
        map.insert("typeParams".into(), json!(type_params));
    }
}

fn field_to_json(field: &Field) -> Value {
    let mut map = Map::new();
    map.insert("name".into(), json!(field.name));
    map.insert("type".into(), json!(render_type(&field.ty)));
    if field.optional {
        map.insert("optional".into(), json!(true));
    }
    if let Some(default) = &field.default {
        map.insert("default".into(), json!(render_expr(default)));
    }
    Value::Object(map)
}

/// Enum cases serialize as tagged unions: `{"tag": Name, "args": [...]}`.
fn enum_case_to_json(case: &EnumCase) -> Value {
    let mut map = Map::new();
    map.insert("tag".into(), json!(case.name));
    if !case.type_args.is_empty() {
        map.insert(
            "args".into(),
            json!(case.type_args.iter().map(render_type).collect::<Vec<_>>()),
        );
    }
    if !case.params.is_empty() {
        map.insert(
            "params".into(),
            Value::Array(case.params.iter().map(param_to_json).collect()),
        );
    }
    Value::Object(map)
}

fn func_to_json(func: &FuncDecl) -> Value {
    let mut map = Map::new();
    map.insert("kind".into(), json!("func"));
    map.insert("name".into(), json!(func.name));
    insert_type_params(&mut map, &func.type_params);
    map.insert(
        "params".into(),
        Value::Array(func.params.iter().map(param_to_json).collect()),
    );
    if let Some(ret) = &func.ret {
        map.insert("returns".into(), json!(render_type(ret)));
    }
    if func.is_async {
        map.insert("async".into(), json!(true));
    }
    if let Some(body) = &func.body {
        map.insert("body".into(), body_to_json(body));
    }
    Value::Object(map)
}

fn param_to_json(param: &Param) -> Value {
    let mut map = Map::new();
    map.insert("name".into(), json!(param.name));
    if let Some(ty) = &param.ty {
        map.insert("type".into(), json!(render_type(ty)));
    }
    if let Some(default) = &param.default {
        map.insert("default".into(), json!(render_expr(default)));
    }
    Value::Object(map)
}

fn kv_to_json(entry: &KeyValue) -> Value {
    json!({ "name": entry.name, "value": expr_to_json(&entry.value) })
}

fn tool_to_json(tool: &ToolSig) -> Value {
    let mut map = Map::new();
    map.insert("name".into(), json!(tool.name.join(".")));
    map.insert(
        "params".into(),
        Value::Array(tool.params.iter().map(param_to_json).collect()),
    );
    if let Some(ret) = &tool.ret {
        map.insert("returns".into(), json!(render_type(ret)));
    }
    Value::Object(map)
}

fn body_to_json(body: &FuncBody) -> Value {
    match body {
        FuncBody::Block(stmts) => stmts_to_json(stmts),
        FuncBody::Expr(expr) => json!({ "expr": expr_to_json(expr) }),
    }
}

fn stmts_to_json(stmts: &[Stmt]) -> Value {
    Value::Array(stmts.iter().map(stmt_to_json).collect())
}

fn stmt_to_json(stmt: &Stmt) -> Value {
    match stmt {
        Stmt::Decl(decl) => decl_to_json(decl),
        Stmt::If {
            cond,
            then_body,
            else_body,
            ..
        } => {
            let mut map = Map::new();
            map.insert("kind".into(), json!("if"));
            map.insert("cond".into(), expr_to_json(cond));
            map.insert("then".into(), stmts_to_json(then_body));
            if let Some(else_body) = else_body {
                map.insert("else".into(), stmts_to_json(else_body));
            }
            Value::Object(map)
        }
        Stmt::While { cond, body, .. } => json!({
            "kind": "while",
            "cond": expr_to_json(cond),
            "body": stmts_to_json(body),
        }),
        Stmt::For {
            pattern,
            iter,
            body,
            ..
        } => json!({
            "kind": "for",
            "pattern": pattern_to_json(pattern),
            "iter": expr_to_json(iter),
            "body": stmts_to_json(body),
        }),
        Stmt::Match { subject, arms, .. } => json!({
            "kind": "match",
            "subject": expr_to_json(subject),
            "arms": arms.iter().map(match_arm_to_json).collect::<Vec<_>>(),
        }),
        Stmt::Try {
            body,
            catches,
            finally,
            ..
        } => {
            let mut map = Map::new();
            map.insert("kind".into(), json!("try"));
            map.insert("body".into(), stmts_to_json(body));
            map.insert(
                "catches".into(),
                Value::Array(catches.iter().map(catch_to_json).collect()),
            );
            if let Some(finally) = finally {
                map.insert("finally".into(), stmts_to_json(finally));
            }
            Value::Object(map)
        }
        Stmt::Using {
            resource,
            alias,
            body,
            ..
        } => {
            let mut map = Map::new();
            map.insert("kind".into(), json!("using"));
            map.insert("resource".into(), expr_to_json(resource));
            if let Some(alias) = alias {
                map.insert("alias".into(), json!(alias));
            }
            map.insert("body".into(), stmts_to_json(body));
            Value::Object(map)
        }
        Stmt::Defer { body, .. } => json!({
            "kind": "defer",
            "body": stmts_to_json(body),
        }),
        Stmt::Return { value, .. } => {
            let mut map = Map::new();
            map.insert("kind".into(), json!("return"));
            if let Some(value) = value {
                map.insert("value".into(), expr_to_json(value));
            }
            Value::Object(map)
        }
        Stmt::Break { .. } => json!({ "kind": "break" }),
        Stmt::Continue { .. } => json!({ "kind": "continue" }),
        Stmt::Throw { value, .. } => json!({
            "kind": "throw",
            "value": expr_to_json(value),
        }),
        Stmt::Spawn { expr, .. } => json!({
            "kind": "spawn",
            "expr": expr_to_json(expr),
        }),
        Stmt::Channel { name, ty, .. } => {
            let mut map = Map::new();
            map.insert("kind".into(), json!("channel"));
            map.insert("name".into(), json!(name));
            if let Some(ty) = ty {
                map.insert("type".into(), json!(render_type(ty)));
            }
            Value::Object(map)
        }
        Stmt::Send { value, channel, .. } => json!({
            "kind": "send",
            "value": expr_to_json(value),
            "channel": expr_to_json(channel),
        }),
        Stmt::Recv { name, channel, .. } => json!({
            "kind": "recv",
            "name": name,
            "channel": expr_to_json(channel),
        }),
        Stmt::Select { arms, default, .. } => {
            let mut map = Map::new();
            map.insert("kind".into(), json!("select"));
            map.insert(
                "arms".into(),
                Value::Array(arms.iter().map(select_arm_to_json).collect()),
            );
            if let Some(default) = default {
                map.insert("else".into(), stmts_to_json(default));
            }
            Value::Object(map)
        }
        Stmt::Label { name, stmt, .. } => json!({
            "kind": "label",
            "name": name,
            "stmt": stmt_to_json(stmt),
        }),
        Stmt::Expr { expr, .. } => json!({
            "kind": "expr",
            "expr": expr_to_json(expr),
        }),
    }
}

fn match_arm_to_json(arm: &MatchArm) -> Value {
    let mut map = Map::new();
    map.insert("pattern".into(), pattern_to_json(&arm.pattern));
    if let Some(guard) = &arm.guard {
        map.insert("guard".into(), expr_to_json(guard));
    }
    map.insert("body".into(), body_to_json(&arm.body));
    Value::Object(map)
}

fn catch_to_json(catch: &CatchClause) -> Value {
    let mut map = Map::new();
    if let Some(name) = &catch.name {
        map.insert("name".into(), json!(name));
    }
    if let Some(ty) = &catch.ty {
        map.insert("type".into(), json!(render_type(ty)));
    }
    map.insert("body".into(), stmts_to_json(&catch.body));
    Value::Object(map)
}

fn select_arm_to_json(arm: &SelectArm) -> Value {
    let mut map = Map::new();
    match &arm.op {
        SelectOp::Recv { name, channel } => {
            map.insert("op".into(), json!("recv"));
            map.insert("name".into(), json!(name));
            map.insert("channel".into(), expr_to_json(channel));
        }
        SelectOp::Send { value, channel } => {
            map.insert("op".into(), json!("send"));
            map.insert("value".into(), expr_to_json(value));
            map.insert("channel".into(), expr_to_json(channel));
        }
    }
    map.insert("body".into(), stmts_to_json(&arm.body));
    Value::Object(map)
}

fn expr_to_json(expr: &Expr) -> Value {
    match expr {
        Expr::Int { value, .. } => json!({ "kind": "int", "value": value }),
        Expr::Float { value, .. } => json!({ "kind": "float", "value": value }),
        Expr::Str { value, .. } => json!({ "kind": "string", "value": value }),
        Expr::Bool { value, .. } => json!({ "kind": "bool", "value": value }),
        Expr::Null { .. } => json!({ "kind": "null" }),
        Expr::Duration { value, unit, .. } => json!({
            "kind": "duration",
            "value": value,
            "unit": unit.as_str(),
        }),
        Expr::Ident { name, .. } => json!({ "kind": "ident", "name": name }),
        Expr::Paren { expr, .. } => json!({ "kind": "paren", "expr": expr_to_json(expr) }),
        Expr::List { items, .. } => json!({
            "kind": "list",
            "items": items.iter().map(expr_to_json).collect::<Vec<_>>(),
        }),
        Expr::Map { entries, .. } => json!({
            "kind": "map",
            "entries": entries.iter().map(|e| json!({
                "key": expr_to_json(&e.key),
                "value": expr_to_json(&e.value),
            })).collect::<Vec<_>>(),
        }),
        Expr::Tuple { items, .. } => json!({
            "kind": "tuple",
            "items": items.iter().map(expr_to_json).collect::<Vec<_>>(),
        }),
        Expr::StructInit { name, fields, .. } => json!({
            "kind": "struct",
            "name": name.join("."),
            "fields": fields.iter().map(|f| json!({
                "name": f.name,
                "value": expr_to_json(&f.value),
            })).collect::<Vec<_>>(),
        }),
        // Lambdas are nested func nodes.
        Expr::Lambda { params, body, .. } => json!({
            "kind": "func",
            "isLambda": true,
            "params": params.iter().map(param_to_json).collect::<Vec<_>>(),
            "body": body_to_json(body),
        }),
        Expr::Binary {
            op, left, right, ..
        } => json!({
            "kind": "binary",
            "op": op.as_str(),
            "left": expr_to_json(left),
            "right": expr_to_json(right),
        }),
        Expr::Unary { op, expr, .. } => json!({
            "kind": "unary",
            "op": op.as_str(),
            "expr": expr_to_json(expr),
        }),
        Expr::Call { callee, args, .. } => json!({
            "kind": "call",
            "callee": expr_to_json(callee),
            "args": args.iter().map(call_arg_to_json).collect::<Vec<_>>(),
        }),
        Expr::Index { target, index, .. } => json!({
            "kind": "index",
            "target": expr_to_json(target),
            "index": expr_to_json(index),
        }),
        Expr::Field { target, name, .. } => json!({
            "kind": "field",
            "target": expr_to_json(target),
            "name": name,
        }),
        Expr::OptField { target, name, .. } => json!({
            "kind": "optfield",
            "target": expr_to_json(target),
            "name": name,
        }),
        Expr::Pipe { left, right, .. } => json!({
            "kind": "pipe",
            "left": expr_to_json(left),
            "right": expr_to_json(right),
        }),
    }
}

fn call_arg_to_json(arg: &CallArg) -> Value {
    let mut map = Map::new();
    if let Some(name) = &arg.name {
        map.insert("name".into(), json!(name));
    }
    map.insert("value".into(), expr_to_json(&arg.value));
    Value::Object(map)
}

fn pattern_to_json(pattern: &Pattern) -> Value {
    match pattern {
        Pattern::Wildcard { .. } => json!({ "kind": "wildcard" }),
        Pattern::Binding { name, .. } => json!({ "kind": "binding", "name": name }),
        Pattern::Literal { value, .. } => json!({
            "kind": "literal",
            "value": expr_to_json(value),
        }),
        Pattern::Record { name, fields, .. } => json!({
            "kind": "record",
            "name": name.join("."),
            "fields": fields.iter().map(|f| {
                let mut map = Map::new();
                map.insert("name".into(), json!(f.name));
                if let Some(pattern) = &f.pattern {
                    map.insert("pattern".into(), pattern_to_json(pattern));
                }
                Value::Object(map)
            }).collect::<Vec<_>>(),
        }),
        Pattern::Enum {
            qualifier,
            name,
            args,
            ..
        } => {
            let mut map = Map::new();
            map.insert("kind".into(), json!("enum"));
            if let Some(qualifier) = qualifier {
                map.insert("qualifier".into(), json!(qualifier));
            }
            map.insert("name".into(), json!(name));
            if !args.is_empty() {
                map.insert(
                    "args".into(),
                    Value::Array(args.iter().map(pattern_to_json).collect()),
                );
            }
            Value::Object(map)
        }
        Pattern::Tuple { items, .. } => json!({
            "kind": "tuple",
            "items": items.iter().map(pattern_to_json).collect::<Vec<_>>(),
        }),
    }
}

/* ===================== Reconstruction ===================== */

pub fn from_json(value: &Value) -> Result<Module, DecodeError> {
    let map = as_obj(value, "module")?;

    let name = match map.get("module") {
        None | Some(Value::Null) => None,
        Some(Value::String(name)) => Some(name.split('.').map(String::from).collect()),
        Some(other) => {
            return Err(DecodeError::Malformed(format!(
                "module name must be a string, got {}",
                other
            )))
        }
    };

    let mut imports = vec![];
    for import in opt_array(map, "imports").unwrap_or(&[]) {
        let text = import
            .as_str()
            .ok_or_else(|| DecodeError::Malformed("import entries must be strings".into()))?;
        imports.push(decode_import(text)?);
    }

    let mut decls = vec![];
    for decl in opt_array(map, "decls").unwrap_or(&[]) {
        decls.push(decode_decl(decl)?);
    }

    Ok(Module {
        name,
        imports,
        decls,
        span: Span::default(),
    })
}

fn decode_import(text: &str) -> Result<Import, DecodeError> {
    parse_standalone_import(text)
        .ok_or_else(|| DecodeError::Malformed(format!("invalid import string {:?}", text)))
}

fn decode_type(text: &str) -> Result<Type, DecodeError> {
    if let Some((ok, err, optional)) = split_result_union(text) {
        let mut ty = Type::new(
            TypeKind::Name {
                path: vec![String::from("Result")],
                args: vec![decode_type(ok)?, decode_type(err)?],
            },
            Span::default(),
        );
        ty.optional = optional;
        return Ok(ty);
    }

    parse_standalone_type(text)
        .ok_or_else(|| DecodeError::Malformed(format!("invalid type string {:?}", text)))
}

/// Splits the `{ok: T} | {err: E}` rendering into its arms. Only the
/// serializer produces this shape, so a structural scan is enough.
fn split_result_union(text: &str) -> Option<(&str, &str, bool)> {
    let trimmed = text.trim();
    let (trimmed, optional) = match trimmed.strip_suffix('?') {
        Some(inner) if inner.ends_with('}') => (inner, true),
        _ => (trimmed, false),
    };

    let rest = trimmed.strip_prefix("{ok: ")?;
    let mut depth = 1usize;
    for (i, c) in rest.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let ok = &rest[..i];
                    let err = rest[i + 1..]
                        .strip_prefix(" | {err: ")?
                        .strip_suffix('}')?;
                    return Some((ok, err, optional));
                }
            }
            _ => {}
        }
    }
    None
}

fn decode_default(text: &str) -> Result<Expr, DecodeError> {
    parse_standalone_expr(text)
        .ok_or_else(|| DecodeError::Malformed(format!("invalid expression string {:?}", text)))
}

fn decode_decl(value: &Value) -> Result<Decl, DecodeError> {
    let map = as_obj(value, "declaration")?;
    let kind = kind_of(map)?;

    let doc = opt_str(map, "doc");
    let mut attributes = vec![];
    for attribute in opt_array(map, "attributes").unwrap_or(&[]) {
        attributes.push(decode_attribute(attribute)?);
    }

    let decl_kind = match kind {
        "export" => {
            let inner = map
                .get("decl")
                .ok_or_else(|| DecodeError::Malformed("export without decl".into()))?;
            DeclKind::Export(Box::new(decode_decl(inner)?))
        }
        "const" | "let" | "var" => {
            let value_kind = match kind {
                "const" => ValueKind::Const,
                "let" => ValueKind::Let,
                _ => ValueKind::Var,
            };
            let ty = match opt_str(map, "type") {
                Some(text) => Some(decode_type(&text)?),
                None => None,
            };
            let value = match map.get("value") {
                Some(value) => Some(decode_expr(value)?),
                None => None,
            };
            DeclKind::Value(ValueDecl {
                kind: value_kind,
                name: req_str(map, "name")?,
                ty,
                value,
                span: Span::default(),
            })
        }
        "typealias" => DeclKind::TypeAlias(TypeAliasDecl {
            name: req_str(map, "name")?,
            type_params: decode_string_array(map, "typeParams"),
            ty: decode_type(&req_str(map, "type")?)?,
            span: Span::default(),
        }),
        "record" => {
            let mut fields = vec![];
            for field in opt_array(map, "fields").unwrap_or(&[]) {
                fields.push(decode_field(field)?);
            }
            DeclKind::Record(RecordDecl {
                name: req_str(map, "name")?,
                type_params: decode_string_array(map, "typeParams"),
                fields,
                span: Span::default(),
            })
        }
        "enum" => {
            let mut cases = vec![];
            for case in opt_array(map, "cases").unwrap_or(&[]) {
                cases.push(decode_enum_case(case)?);
            }
            DeclKind::Enum(EnumDecl {
                name: req_str(map, "name")?,
                type_params: decode_string_array(map, "typeParams"),
                cases,
                span: Span::default(),
            })
        }
        "trait" => {
            let mut funcs = vec![];
            for func in opt_array(map, "funcs").unwrap_or(&[]) {
                funcs.push(decode_func(func)?);
            }
            DeclKind::Trait(TraitDecl {
                name: req_str(map, "name")?,
                funcs,
                span: Span::default(),
            })
        }
        "class" => {
            let mut fields = vec![];
            for field in opt_array(map, "fields").unwrap_or(&[]) {
                fields.push(decode_field(field)?);
            }
            let mut funcs = vec![];
            for func in opt_array(map, "funcs").unwrap_or(&[]) {
                funcs.push(decode_func(func)?);
            }
            DeclKind::Class(ClassDecl {
                name: req_str(map, "name")?,
                type_params: decode_string_array(map, "typeParams"),
                traits: decode_string_array(map, "traits"),
                fields,
                funcs,
                span: Span::default(),
            })
        }
        "func" => DeclKind::Func(decode_func(value)?),
        "agent" => {
            let mut funcs = vec![];
            for func in opt_array(map, "funcs").unwrap_or(&[]) {
                funcs.push(decode_func(func)?);
            }
            let tools = match opt_array(map, "tools") {
                Some(entries) => {
                    let mut sigs = vec![];
                    for tool in entries {
                        sigs.push(decode_tool(tool)?);
                    }
                    Some(sigs)
                }
                None => None,
            };
            DeclKind::Agent(AgentDecl {
                name: req_str(map, "name")?,
                profile: decode_kv_section(map, "profile")?,
                capabilities: decode_kv_section(map, "capabilities")?,
                tools,
                policy: decode_kv_section(map, "policy")?,
                funcs,
                span: Span::default(),
            })
        }
        "task" => {
            let mut params = vec![];
            for param in opt_array(map, "params").unwrap_or(&[]) {
                params.push(decode_param(param)?);
            }
            let ret = match opt_str(map, "returns") {
                Some(text) => Some(decode_type(&text)?),
                None => None,
            };
            DeclKind::Task(TaskDecl {
                name: req_str(map, "name")?,
                params,
                ret,
                body: decode_stmts(map, "body")?,
                span: Span::default(),
            })
        }
        "workflow" => DeclKind::Workflow(WorkflowDecl {
            name: req_str(map, "name")?,
            body: decode_stmts(map, "body")?,
            span: Span::default(),
        }),
        "test" => DeclKind::Test(TestDecl {
            name: req_str(map, "name")?,
            body: decode_stmts(map, "body")?,
            span: Span::default(),
        }),
        other => {
            return Err(DecodeError::Malformed(format!(
                "unknown declaration kind {:?}",
                other
            )))
        }
    };

    Ok(Decl {
        kind: decl_kind,
        doc,
        attributes,
        span: Span::default(),
    })
}

fn decode_attribute(value: &Value) -> Result<Attribute, DecodeError> {
    let map = as_obj(value, "attribute")?;
    let mut args = vec![];
    for arg in opt_array(map, "args").unwrap_or(&[]) {
        args.push(decode_expr(arg)?);
    }
    Ok(Attribute {
        name: req_str(map, "name")?,
        args,
        span: Span::default(),
    })
}

fn decode_field(value: &Value) -> Result<Field, DecodeError> {
    let map = as_obj(value, "field")?;
    let default = match opt_str(map, "default") {
        Some(text) => Some(decode_default(&text)?),
        None => None,
    };
    Ok(Field {
        name: req_str(map, "name")?,
        ty: decode_type(&req_str(map, "type")?)?,
        optional: flag(map, "optional"),
        default,
        span: Span::default(),
    })
}

fn decode_enum_case(value: &Value) -> Result<EnumCase, DecodeError> {
    let map = as_obj(value, "enum case")?;
    let mut type_args = vec![];
    for arg in opt_array(map, "args").unwrap_or(&[]) {
        let text = arg
            .as_str()
            .ok_or_else(|| DecodeError::Malformed("enum case args must be type strings".into()))?;
        type_args.push(decode_type(text)?);
    }
    let mut params = vec![];
    for param in opt_array(map, "params").unwrap_or(&[]) {
        params.push(decode_param(param)?);
    }
    Ok(EnumCase {
        name: req_str(map, "tag")?,
        type_args,
        params,
        span: Span::default(),
    })
}

fn decode_func(value: &Value) -> Result<FuncDecl, DecodeError> {
    let map = as_obj(value, "func")?;
    let mut params = vec![];
    for param in opt_array(map, "params").unwrap_or(&[]) {
        params.push(decode_param(param)?);
    }
    let ret = match opt_str(map, "returns") {
        Some(text) => Some(decode_type(&text)?),
        None => None,
    };
    let body = match map.get("body") {
        Some(body) => Some(decode_body(body)?),
        None => None,
    };
    Ok(FuncDecl {
        name: req_str(map, "name")?,
        type_params: decode_string_array(map, "typeParams"),
        params,
        ret,
        is_async: flag(map, "async"),
        body,
        span: Span::default(),
    })
}

fn decode_param(value: &Value) -> Result<Param, DecodeError> {
    let map = as_obj(value, "param")?;
    let ty = match opt_str(map, "type") {
        Some(text) => Some(decode_type(&text)?),
        None => None,
    };
    let default = match opt_str(map, "default") {
        Some(text) => Some(decode_default(&text)?),
        None => None,
    };
    Ok(Param {
        name: req_str(map, "name")?,
        ty,
        default,
        span: Span::default(),
    })
}

fn decode_kv_section(
    map: &Map<String, Value>,
    key: &str,
) -> Result<Option<Vec<KeyValue>>, DecodeError> {
    match opt_array(map, key) {
        Some(entries) => {
            let mut out = vec![];
            for entry in entries {
                let entry_map = as_obj(entry, key)?;
                out.push(KeyValue {
                    name: req_str(entry_map, "name")?,
                    value: decode_expr(
                        entry_map
                            .get("value")
                            .ok_or_else(|| DecodeError::Malformed(format!("{} entry without value", key)))?,
                    )?,
                    span: Span::default(),
                });
            }
            Ok(Some(out))
        }
        None => Ok(None),
    }
}

fn decode_tool(value: &Value) -> Result<ToolSig, DecodeError> {
    let map = as_obj(value, "tool")?;
    let mut params = vec![];
    for param in opt_array(map, "params").unwrap_or(&[]) {
        params.push(decode_param(param)?);
    }
    let ret = match opt_str(map, "returns") {
        Some(text) => Some(decode_type(&text)?),
        None => None,
    };
    Ok(ToolSig {
        name: req_str(map, "name")?
            .split('.')
            .map(String::from)
            .collect(),
        params,
        ret,
        span: Span::default(),
    })
}

fn decode_body(value: &Value) -> Result<FuncBody, DecodeError> {
    match value {
        Value::Array(stmts) => {
            let mut body = vec![];
            for stmt in stmts {
                body.push(decode_stmt(stmt)?);
            }
            Ok(FuncBody::Block(body))
        }
        Value::Object(map) => {
            let expr = map
                .get("expr")
                .ok_or_else(|| DecodeError::Malformed("expression body without expr".into()))?;
            Ok(FuncBody::Expr(Box::new(decode_expr(expr)?)))
        }
        other => Err(DecodeError::Malformed(format!(
            "body must be a statement list or expression object, got {}",
            other
        ))),
    }
}

fn decode_stmts(map: &Map<String, Value>, key: &str) -> Result<Vec<Stmt>, DecodeError> {
    let mut out = vec![];
    for stmt in opt_array(map, key).unwrap_or(&[]) {
        out.push(decode_stmt(stmt)?);
    }
    Ok(out)
}

fn decode_stmt(value: &Value) -> Result<Stmt, DecodeError> {
    let map = as_obj(value, "statement")?;
    let kind = kind_of(map)?;

    Ok(match kind {
        "const" | "let" | "var" | "typealias" | "record" | "enum" | "trait" | "class" | "func"
        | "agent" | "task" | "workflow" | "test" | "export" => Stmt::Decl(decode_decl(value)?),
        "if" => {
            let else_body = match opt_array(map, "else") {
                Some(_) => Some(decode_stmts(map, "else")?),
                None => None,
            };
            Stmt::If {
                cond: decode_expr_field(map, "cond")?,
                then_body: decode_stmts(map, "then")?,
                else_body,
                span: Span::default(),
            }
        }
        "while" => Stmt::While {
            cond: decode_expr_field(map, "cond")?,
            body: decode_stmts(map, "body")?,
            span: Span::default(),
        },
        "for" => Stmt::For {
            pattern: decode_pattern(
                map.get("pattern")
                    .ok_or_else(|| DecodeError::Malformed("for without pattern".into()))?,
            )?,
            iter: decode_expr_field(map, "iter")?,
            body: decode_stmts(map, "body")?,
            span: Span::default(),
        },
        "match" => {
            let mut arms = vec![];
            for arm in opt_array(map, "arms").unwrap_or(&[]) {
                let arm_map = as_obj(arm, "match arm")?;
                let guard = match arm_map.get("guard") {
                    Some(guard) => Some(decode_expr(guard)?),
                    None => None,
                };
                arms.push(MatchArm {
                    pattern: decode_pattern(
                        arm_map
                            .get("pattern")
                            .ok_or_else(|| DecodeError::Malformed("arm without pattern".into()))?,
                    )?,
                    guard,
                    body: decode_body(
                        arm_map
                            .get("body")
                            .ok_or_else(|| DecodeError::Malformed("arm without body".into()))?,
                    )?,
                    span: Span::default(),
                });
            }
            Stmt::Match {
                subject: decode_expr_field(map, "subject")?,
                arms,
                span: Span::default(),
            }
        }
        "try" => {
            let mut catches = vec![];
            for catch in opt_array(map, "catches").unwrap_or(&[]) {
                let catch_map = as_obj(catch, "catch")?;
                let ty = match opt_str(catch_map, "type") {
                    Some(text) => Some(decode_type(&text)?),
                    None => None,
                };
                catches.push(CatchClause {
                    name: opt_str(catch_map, "name"),
                    ty,
                    body: decode_stmts(catch_map, "body")?,
                    span: Span::default(),
                });
            }
            let finally = match opt_array(map, "finally") {
                Some(_) => Some(decode_stmts(map, "finally")?),
                None => None,
            };
            Stmt::Try {
                body: decode_stmts(map, "body")?,
                catches,
                finally,
                span: Span::default(),
            }
        }
        "using" => Stmt::Using {
            resource: decode_expr_field(map, "resource")?,
            alias: opt_str(map, "alias"),
            body: decode_stmts(map, "body")?,
            span: Span::default(),
        },
        "defer" => Stmt::Defer {
            body: decode_stmts(map, "body")?,
            span: Span::default(),
        },
        "return" => {
            let value = match map.get("value") {
                Some(value) => Some(decode_expr(value)?),
                None => None,
            };
            Stmt::Return {
                value,
                span: Span::default(),
            }
        }
        "break" => Stmt::Break {
            span: Span::default(),
        },
        "continue" => Stmt::Continue {
            span: Span::default(),
        },
        "throw" => Stmt::Throw {
            value: decode_expr_field(map, "value")?,
            span: Span::default(),
        },
        "spawn" => Stmt::Spawn {
            expr: decode_expr_field(map, "expr")?,
            span: Span::default(),
        },
        "channel" => {
            let ty = match opt_str(map, "type") {
                Some(text) => Some(decode_type(&text)?),
                None => None,
            };
            Stmt::Channel {
                name: req_str(map, "name")?,
                ty,
                span: Span::default(),
            }
        }
        "send" => Stmt::Send {
            value: decode_expr_field(map, "value")?,
            channel: decode_expr_field(map, "channel")?,
            span: Span::default(),
        },
        "recv" => Stmt::Recv {
            name: req_str(map, "name")?,
            channel: decode_expr_field(map, "channel")?,
            span: Span::default(),
        },
        "select" => {
            let mut arms = vec![];
            for arm in opt_array(map, "arms").unwrap_or(&[]) {
                let arm_map = as_obj(arm, "select arm")?;
                let op = match req_str(arm_map, "op")?.as_str() {
                    "recv" => SelectOp::Recv {
                        name: req_str(arm_map, "name")?,
                        channel: decode_expr_field(arm_map, "channel")?,
                    },
                    "send" => SelectOp::Send {
                        value: decode_expr_field(arm_map, "value")?,
                        channel: decode_expr_field(arm_map, "channel")?,
                    },
                    other => {
                        return Err(DecodeError::Malformed(format!(
                            "unknown select op {:?}",
                            other
                        )))
                    }
                };
                arms.push(SelectArm {
                    op,
                    body: decode_stmts(arm_map, "body")?,
                    span: Span::default(),
                });
            }
            let default = match opt_array(map, "else") {
                Some(_) => Some(decode_stmts(map, "else")?),
                None => None,
            };
            Stmt::Select {
                arms,
                default,
                span: Span::default(),
            }
        }
        "label" => Stmt::Label {
            name: req_str(map, "name")?,
            stmt: Box::new(decode_stmt(
                map.get("stmt")
                    .ok_or_else(|| DecodeError::Malformed("label without stmt".into()))?,
            )?),
            span: Span::default(),
        },
        "expr" => Stmt::Expr {
            expr: decode_expr_field(map, "expr")?,
            span: Span::default(),
        },
        other => {
            return Err(DecodeError::Malformed(format!(
                "unknown statement kind {:?}",
                other
            )))
        }
    })
}

fn decode_expr_field(map: &Map<String, Value>, key: &str) -> Result<Expr, DecodeError> {
    decode_expr(
        map.get(key)
            .ok_or_else(|| DecodeError::Malformed(format!("missing expression field {:?}", key)))?,
    )
}

fn decode_expr(value: &Value) -> Result<Expr, DecodeError> {
    let map = as_obj(value, "expression")?;
    let kind = kind_of(map)?;

    Ok(match kind {
        "int" => Expr::Int {
            value: map
                .get("value")
                .and_then(Value::as_i64)
                .ok_or_else(|| DecodeError::Malformed("int without integer value".into()))?,
            span: Span::default(),
        },
        "float" => Expr::Float {
            value: map
                .get("value")
                .and_then(Value::as_f64)
                .ok_or_else(|| DecodeError::Malformed("float without numeric value".into()))?,
            span: Span::default(),
        },
        "string" => Expr::Str {
            value: req_str(map, "value")?,
            span: Span::default(),
        },
        "bool" => Expr::Bool {
            value: map
                .get("value")
                .and_then(Value::as_bool)
                .ok_or_else(|| DecodeError::Malformed("bool without boolean value".into()))?,
            span: Span::default(),
        },
        "null" => Expr::Null {
            span: Span::default(),
        },
        "duration" => {
            let unit = req_str(map, "unit")?;
            Expr::Duration {
                value: map
                    .get("value")
                    .and_then(Value::as_i64)
                    .ok_or_else(|| DecodeError::Malformed("duration without value".into()))?,
                unit: DurationUnit::from_str(&unit)
                    .ok_or_else(|| DecodeError::Malformed(format!("unknown unit {:?}", unit)))?,
                span: Span::default(),
            }
        }
        "ident" => Expr::Ident {
            name: req_str(map, "name")?,
            span: Span::default(),
        },
        "paren" => Expr::Paren {
            expr: Box::new(decode_expr_field(map, "expr")?),
            span: Span::default(),
        },
        "list" => {
            let mut items = vec![];
            for item in opt_array(map, "items").unwrap_or(&[]) {
                items.push(decode_expr(item)?);
            }
            Expr::List {
                items,
                span: Span::default(),
            }
        }
        "map" => {
            let mut entries = vec![];
            for entry in opt_array(map, "entries").unwrap_or(&[]) {
                let entry_map = as_obj(entry, "map entry")?;
                entries.push(MapEntry {
                    key: decode_expr_field(entry_map, "key")?,
                    value: decode_expr_field(entry_map, "value")?,
                    span: Span::default(),
                });
            }
            Expr::Map {
                entries,
                span: Span::default(),
            }
        }
        "tuple" => {
            let mut items = vec![];
            for item in opt_array(map, "items").unwrap_or(&[]) {
                items.push(decode_expr(item)?);
            }
            Expr::Tuple {
                items,
                span: Span::default(),
            }
        }
        "struct" => {
            let mut fields = vec![];
            for field in opt_array(map, "fields").unwrap_or(&[]) {
                let field_map = as_obj(field, "struct field")?;
                fields.push(FieldInit {
                    name: req_str(field_map, "name")?,
                    value: decode_expr_field(field_map, "value")?,
                    span: Span::default(),
                });
            }
            Expr::StructInit {
                name: req_str(map, "name")?
                    .split('.')
                    .map(String::from)
                    .collect(),
                fields,
                span: Span::default(),
            }
        }
        "func" => {
            let mut params = vec![];
            for param in opt_array(map, "params").unwrap_or(&[]) {
                params.push(decode_param(param)?);
            }
            Expr::Lambda {
                params,
                body: Box::new(decode_body(map.get("body").ok_or_else(|| {
                    DecodeError::Malformed("lambda without body".into())
                })?)?),
                span: Span::default(),
            }
        }
        "binary" => {
            let op = req_str(map, "op")?;
            Expr::Binary {
                op: BinaryOp::from_str(&op)
                    .ok_or_else(|| DecodeError::Malformed(format!("unknown operator {:?}", op)))?,
                left: Box::new(decode_expr_field(map, "left")?),
                right: Box::new(decode_expr_field(map, "right")?),
                span: Span::default(),
            }
        }
        "unary" => {
            let op = req_str(map, "op")?;
            Expr::Unary {
                op: UnaryOp::from_str(&op)
                    .ok_or_else(|| DecodeError::Malformed(format!("unknown operator {:?}", op)))?,
                expr: Box::new(decode_expr_field(map, "expr")?),
                span: Span::default(),
            }
        }
        "call" => {
            let mut args = vec![];
            for arg in opt_array(map, "args").unwrap_or(&[]) {
                let arg_map = as_obj(arg, "call argument")?;
                args.push(CallArg {
                    name: opt_str(arg_map, "name"),
                    value: decode_expr_field(arg_map, "value")?,
                    span: Span::default(),
                });
            }
            Expr::Call {
                callee: Box::new(decode_expr_field(map, "callee")?),
                args,
                span: Span::default(),
            }
        }
        "index" => Expr::Index {
            target: Box::new(decode_expr_field(map, "target")?),
            index: Box::new(decode_expr_field(map, "index")?),
            span: Span::default(),
        },
        "field" => Expr::Field {
            target: Box::new(decode_expr_field(map, "target")?),
            name: req_str(map, "name")?,
            span: Span::default(),
        },
        "optfield" => Expr::OptField {
            target: Box::new(decode_expr_field(map, "target")?),
            name: req_str(map, "name")?,
            span: Span::default(),
        },
        "pipe" => Expr::Pipe {
            left: Box::new(decode_expr_field(map, "left")?),
            right: Box::new(decode_expr_field(map, "right")?),
            span: Span::default(),
        },
        other => {
            return Err(DecodeError::Malformed(format!(
                "unknown expression kind {:?}",
                other
            )))
        }
    })
}

fn decode_pattern(value: &Value) -> Result<Pattern, DecodeError> {
    let map = as_obj(value, "pattern")?;
    let kind = kind_of(map)?;

    Ok(match kind {
        "wildcard" => Pattern::Wildcard {
            span: Span::default(),
        },
        "binding" => Pattern::Binding {
            name: req_str(map, "name")?,
            span: Span::default(),
        },
        "literal" => Pattern::Literal {
            value: decode_expr_field(map, "value")?,
            span: Span::default(),
        },
        "record" => {
            let mut fields = vec![];
            for field in opt_array(map, "fields").unwrap_or(&[]) {
                let field_map = as_obj(field, "pattern field")?;
                let pattern = match field_map.get("pattern") {
                    Some(pattern) => Some(decode_pattern(pattern)?),
                    None => None,
                };
                fields.push(PatternField {
                    name: req_str(field_map, "name")?,
                    pattern,
                    span: Span::default(),
                });
            }
            Pattern::Record {
                name: req_str(map, "name")?
                    .split('.')
                    .map(String::from)
                    .collect(),
                fields,
                span: Span::default(),
            }
        }
        "enum" => {
            let mut args = vec![];
            for arg in opt_array(map, "args").unwrap_or(&[]) {
                args.push(decode_pattern(arg)?);
            }
            Pattern::Enum {
                qualifier: opt_str(map, "qualifier"),
                name: req_str(map, "name")?,
                args,
                span: Span::default(),
            }
        }
        "tuple" => {
            let mut items = vec![];
            for item in opt_array(map, "items").unwrap_or(&[]) {
                items.push(decode_pattern(item)?);
            }
            Pattern::Tuple {
                items,
                span: Span::default(),
            }
        }
        other => {
            return Err(DecodeError::Malformed(format!(
                "unknown pattern kind {:?}",
                other
            )))
        }
    })
}

/* ===================== Value helpers ===================== */

fn as_obj<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>, DecodeError> {
    value
        .as_object()
        .ok_or_else(|| DecodeError::Malformed(format!("{} must be an object, got {}", what, value)))
}

fn kind_of(map: &Map<String, Value>) -> Result<&str, DecodeError> {
    map.get("kind")
        .and_then(Value::as_str)
        .ok_or_else(|| DecodeError::Malformed("object without kind tag".into()))
}

fn req_str(map: &Map<String, Value>, key: &str) -> Result<String, DecodeError> {
    map.get(key)
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| DecodeError::Malformed(format!("missing string field {:?}", key)))
}

fn opt_str(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(String::from)
}

fn opt_array<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a [Value]> {
    map.get(key).and_then(Value::as_array).map(Vec::as_slice)
}

fn flag(map: &Map<String, Value>, key: &str) -> bool {
    map.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn decode_string_array(map: &Map<String, Value>, key: &str) -> Vec<String> {
    opt_array(map, key)
        .unwrap_or(&[])
        .iter()
        .filter_map(Value::as_str)
        .map(String::from)
        .collect()
}
