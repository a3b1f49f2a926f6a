//! Unit tests for the parser module.
//!
//! This module contains tests for parsing declarations, statements,
//! expressions, patterns, and types, plus the documented disambiguation
//! rules and error recovery behavior.

use crate::{
    ast::{
        declarations::{DeclKind, FuncBody, ValueKind},
        expressions::{BinaryOp, Expr, UnaryOp},
        patterns::Pattern,
        statements::Stmt,
        types::TypeKind,
    },
    parse_module,
    parser::parser::parse_standalone_type,
    serializer::json::to_json,
};

fn parse_clean(source: &str) -> crate::ast::module::Module {
    let outcome = parse_module(source, "test.hilo");
    assert!(
        outcome.diagnostics.is_empty(),
        "unexpected diagnostics for {:?}: {:?}",
        source,
        outcome.diagnostics
    );
    outcome.module
}

#[test]
fn test_parse_module_header_and_func() {
    let source = "module demo.hello\nfunc greet(name: String = \"world\") -> String {\n    return \"Hello, \" + name + \"!\"\n}\n";
    let module = parse_clean(source);

    assert_eq!(
        module.name,
        Some(vec![String::from("demo"), String::from("hello")])
    );
    assert_eq!(module.decls.len(), 1);

    let DeclKind::Func(func) = &module.decls[0].kind else {
        panic!("expected func declaration");
    };
    assert_eq!(func.name, "greet");
    assert!(!func.is_async);
    assert_eq!(func.params.len(), 1);
    assert_eq!(func.params[0].name, "name");
    assert!(func.params[0].ty.as_ref().unwrap().is_named("String"));
    assert!(matches!(
        func.params[0].default,
        Some(Expr::Str { ref value, .. }) if value == "world"
    ));
    assert!(func.ret.as_ref().unwrap().is_named("String"));
    assert!(matches!(func.body, Some(FuncBody::Block(ref stmts)) if stmts.len() == 1));
}

#[test]
fn test_import_tail_orders_normalize() {
    let first = parse_clean("import core.text { trim, split } as t\n");
    let second = parse_clean("import core.text as t { trim, split }\n");

    let a = &first.imports[0];
    let b = &second.imports[0];
    assert_eq!(a.path, b.path);
    assert_eq!(a.alias, b.alias);
    assert_eq!(a.names, b.names);
    assert_eq!(a.path.join("."), "core.text");
    assert_eq!(a.alias.as_deref(), Some("t"));
    assert_eq!(a.names, vec!["trim", "split"]);
}

#[test]
fn test_tools_block_parses_signatures() {
    let source =
        "agent Helper {\n  tools {\n    web.search(query: String) -> List[Url]\n    files.read(path: String) -> String\n  }\n}\n";
    let module = parse_clean(source);

    let DeclKind::Agent(agent) = &module.decls[0].kind else {
        panic!("expected agent declaration");
    };
    let tools = agent.tools.as_ref().unwrap();
    assert_eq!(tools.len(), 2);
    assert_eq!(tools[0].name, vec!["web", "search"]);
    assert_eq!(tools[0].params.len(), 1);
    assert!(matches!(
        tools[0].ret.as_ref().unwrap().kind,
        TypeKind::List(_)
    ));
}

#[test]
fn test_named_argument_forms_are_equivalent() {
    let colon = parse_clean("let r = Writer.run(notes, sources, audience: \"Engineer\")\n");
    let equals = parse_clean("let r = Writer.run(notes, sources, audience = \"Engineer\")\n");

    assert_eq!(to_json(&colon), to_json(&equals));
}

#[test]
fn test_optional_type_and_null() {
    let module = parse_clean("let email: String? = null\n");

    let DeclKind::Value(value) = &module.decls[0].kind else {
        panic!("expected value declaration");
    };
    assert_eq!(value.kind, ValueKind::Let);
    let ty = value.ty.as_ref().unwrap();
    assert!(ty.optional);
    assert!(matches!(
        &ty.kind,
        TypeKind::Name { path, .. } if path == &vec![String::from("String")]
    ));
    assert!(matches!(value.value, Some(Expr::Null { .. })));
}

#[test]
fn test_record_missing_brace_recovers() {
    let source = "record User {\n  name: String\n\nfunc greet() -> String {\n  return \"hi\"\n}\n";
    let outcome = parse_module(source, "test.hilo");

    assert_eq!(outcome.diagnostics.len(), 1);
    assert_eq!(outcome.diagnostics[0].kind.code(), "missing-token");
    // The rest of the file still parses.
    assert_eq!(outcome.module.decls.len(), 1);
    assert!(matches!(outcome.module.decls[0].kind, DeclKind::Func(_)));
}

#[test]
fn test_parse_value_declarations() {
    let module = parse_clean("const N: Int = 3\nlet x = 10\nvar counter = 0\n");

    assert_eq!(module.decls.len(), 3);
    let kinds: Vec<ValueKind> = module
        .decls
        .iter()
        .map(|d| match &d.kind {
            DeclKind::Value(v) => v.kind,
            _ => panic!("expected value declaration"),
        })
        .collect();
    assert_eq!(kinds, vec![ValueKind::Const, ValueKind::Let, ValueKind::Var]);
}

#[test]
fn test_const_requires_value() {
    let outcome = parse_module("const N: Int\n", "test.hilo");
    assert_eq!(outcome.diagnostics.len(), 1);
}

#[test]
fn test_parse_type_alias() {
    let module = parse_clean("type Handle = Map[String, Int]\n");

    let DeclKind::TypeAlias(alias) = &module.decls[0].kind else {
        panic!("expected type alias");
    };
    assert_eq!(alias.name, "Handle");
    assert!(matches!(alias.ty.kind, TypeKind::Map(_, _)));
}

#[test]
fn test_parse_record_with_optional_and_default() {
    let module =
        parse_clean("record User {\n  name: String\n  age?: Int\n  role: String = \"guest\"\n}\n");

    let DeclKind::Record(record) = &module.decls[0].kind else {
        panic!("expected record");
    };
    assert_eq!(record.fields.len(), 3);
    assert!(!record.fields[0].optional);
    assert!(record.fields[1].optional);
    assert!(record.fields[2].default.is_some());
}

#[test]
fn test_duplicate_record_field_reports() {
    let outcome = parse_module("record R { x: Int, x: Int }\n", "test.hilo");

    assert_eq!(outcome.diagnostics.len(), 1);
    assert_eq!(outcome.diagnostics[0].kind.code(), "duplicate-member");
    assert_eq!(outcome.module.decls.len(), 1);
}

#[test]
fn test_parse_enum_cases() {
    let module =
        parse_clean("enum Shape[T] {\n  Circle(Float)\n  Point { x: Int, y: Int }\n  Empty\n}\n");

    let DeclKind::Enum(e) = &module.decls[0].kind else {
        panic!("expected enum");
    };
    assert_eq!(e.type_params, vec!["T"]);
    assert_eq!(e.cases.len(), 3);
    assert_eq!(e.cases[0].type_args.len(), 1);
    assert_eq!(e.cases[1].params.len(), 2);
    assert!(e.cases[2].type_args.is_empty() && e.cases[2].params.is_empty());
}

#[test]
fn test_parse_trait_signatures() {
    let module = parse_clean("trait Runner {\n  async func run(input: String) -> String\n}\n");

    let DeclKind::Trait(t) = &module.decls[0].kind else {
        panic!("expected trait");
    };
    assert_eq!(t.funcs.len(), 1);
    assert!(t.funcs[0].is_async);
    assert!(t.funcs[0].body.is_none());
}

#[test]
fn test_parse_class_with_members() {
    let module = parse_clean(
        "class Worker : Runner {\n  state: Int\n  func run(input: String) -> String {\n    return input\n  }\n}\n",
    );

    let DeclKind::Class(c) = &module.decls[0].kind else {
        panic!("expected class");
    };
    assert_eq!(c.traits, vec!["Runner"]);
    assert_eq!(c.fields.len(), 1);
    assert_eq!(c.funcs.len(), 1);
}

#[test]
fn test_parse_expression_bodied_func() {
    let module = parse_clean("func double(x: Int) -> Int => x * 2\n");

    let DeclKind::Func(func) = &module.decls[0].kind else {
        panic!("expected func");
    };
    assert!(matches!(func.body, Some(FuncBody::Expr(_))));
}

#[test]
fn test_parse_export_wraps_declaration() {
    let module = parse_clean("export func helper() -> Int => 1\n");

    let DeclKind::Export(inner) = &module.decls[0].kind else {
        panic!("expected export");
    };
    assert!(matches!(inner.kind, DeclKind::Func(_)));
}

#[test]
fn test_parse_agent_sections() {
    let source = "agent Writer {\n  profile { name: \"writer\", style: \"concise\" }\n  capabilities { web: WebAccess { timeout: 30s } }\n  policy { max_cost: 10.0, allow_network: true }\n  func summarize(notes: String) -> String {\n    return notes\n  }\n}\n";
    let module = parse_clean(source);

    let DeclKind::Agent(agent) = &module.decls[0].kind else {
        panic!("expected agent");
    };
    assert_eq!(agent.profile.as_ref().unwrap().len(), 2);
    assert_eq!(agent.capabilities.as_ref().unwrap().len(), 1);
    assert_eq!(agent.policy.as_ref().unwrap().len(), 2);
    assert_eq!(agent.funcs.len(), 1);
    assert!(agent.tools.is_none());
}

#[test]
fn test_duplicate_agent_section_reports() {
    let source = "agent A {\n  policy { a: 1 }\n  policy { b: 2 }\n}\n";
    let outcome = parse_module(source, "test.hilo");

    assert_eq!(outcome.diagnostics.len(), 1);
    assert_eq!(
        outcome.diagnostics[0].kind.code(),
        "duplicate-agent-section"
    );
    let DeclKind::Agent(agent) = &outcome.module.decls[0].kind else {
        panic!("expected agent");
    };
    // The first section wins.
    assert_eq!(agent.policy.as_ref().unwrap()[0].name, "a");
}

#[test]
fn test_capability_must_be_struct_literal() {
    let source = "agent A {\n  capabilities { web: 42 }\n}\n";
    let outcome = parse_module(source, "test.hilo");

    assert_eq!(outcome.diagnostics.len(), 1);
}

#[test]
fn test_parse_task_and_workflow() {
    let module = parse_clean(
        "task Research(topic: String) -> String {\n  return topic\n}\nworkflow Daily {\n  let x = 1\n}\n",
    );

    assert!(matches!(module.decls[0].kind, DeclKind::Task(_)));
    assert!(matches!(module.decls[1].kind, DeclKind::Workflow(_)));
}

#[test]
fn test_parse_test_declaration() {
    let module = parse_clean("test \"greets politely\" {\n  let x = 1\n}\n");

    let DeclKind::Test(t) = &module.decls[0].kind else {
        panic!("expected test");
    };
    assert_eq!(t.name, "greets politely");
}

#[test]
fn test_attributes_and_doc_attach() {
    let source = "/// Fetches a page.\n@cached\n@route(\"/fetch\")\nfunc fetch(url: String) -> String => url\n";
    let module = parse_clean(source);

    let decl = &module.decls[0];
    assert_eq!(decl.doc.as_deref(), Some("Fetches a page."));
    assert_eq!(decl.attributes.len(), 2);
    assert_eq!(decl.attributes[0].name, "cached");
    assert_eq!(decl.attributes[1].name, "route");
    assert_eq!(decl.attributes[1].args.len(), 1);
}

#[test]
fn test_operator_precedence() {
    let module = parse_clean("let r = 1 + 2 * 3\n");

    let DeclKind::Value(value) = &module.decls[0].kind else {
        panic!("expected value");
    };
    let Some(Expr::Binary {
        op: BinaryOp::Add,
        right,
        ..
    }) = &value.value
    else {
        panic!("expected addition at the top");
    };
    assert!(matches!(
        right.as_ref(),
        Expr::Binary {
            op: BinaryOp::Mul,
            ..
        }
    ));
}

#[test]
fn test_subtraction_keeps_multiplicative_precedence() {
    // `-` is both a prefix and an infix operator; the infix binding power
    // must survive the prefix registration.
    let module = parse_clean("let r = a - b * c\n");

    let DeclKind::Value(value) = &module.decls[0].kind else {
        panic!("expected value");
    };
    let Some(Expr::Binary {
        op: BinaryOp::Sub,
        right,
        ..
    }) = &value.value
    else {
        panic!("expected subtraction at the top");
    };
    assert!(matches!(
        right.as_ref(),
        Expr::Binary {
            op: BinaryOp::Mul,
            ..
        }
    ));
}

#[test]
fn test_logical_precedence() {
    let module = parse_clean("let r = a or b and c == d\n");

    let DeclKind::Value(value) = &module.decls[0].kind else {
        panic!("expected value");
    };
    // `or` binds loosest, then `and`, then comparison.
    let Some(Expr::Binary {
        op: BinaryOp::Or,
        right,
        ..
    }) = &value.value
    else {
        panic!("expected or at the top");
    };
    assert!(matches!(
        right.as_ref(),
        Expr::Binary {
            op: BinaryOp::And,
            ..
        }
    ));
}

#[test]
fn test_await_covers_postfix_chain() {
    let module = parse_clean("let r = await client.fetch(url)\n");

    let DeclKind::Value(value) = &module.decls[0].kind else {
        panic!("expected value");
    };
    let Some(Expr::Unary {
        op: UnaryOp::Await,
        expr,
        ..
    }) = &value.value
    else {
        panic!("expected await at the top");
    };
    assert!(matches!(expr.as_ref(), Expr::Call { .. }));
}

#[test]
fn test_pipe_chains_left_associative() {
    let module = parse_clean("let r = xs |> map(fn(u) -> f(u)) |> sum()\n");

    let DeclKind::Value(value) = &module.decls[0].kind else {
        panic!("expected value");
    };
    let Some(Expr::Pipe { left, right, .. }) = &value.value else {
        panic!("expected pipe at the top");
    };
    assert!(matches!(left.as_ref(), Expr::Pipe { .. }));
    assert!(matches!(right.as_ref(), Expr::Call { .. }));
}

#[test]
fn test_struct_literal_vs_block_is_positional() {
    let source = "func f(ready: Bool, x: Int) -> Int {\n  if ready {\n    return 1\n  }\n  let c = Writer.Config { retries: 3 }\n  return x\n}\n";
    let module = parse_clean(source);

    let DeclKind::Func(func) = &module.decls[0].kind else {
        panic!("expected func");
    };
    let Some(FuncBody::Block(stmts)) = &func.body else {
        panic!("expected block body");
    };
    assert!(matches!(stmts[0], Stmt::If { .. }));
    let Stmt::Decl(decl) = &stmts[1] else {
        panic!("expected let statement");
    };
    let DeclKind::Value(value) = &decl.kind else {
        panic!("expected value declaration");
    };
    assert!(matches!(value.value, Some(Expr::StructInit { .. })));
}

#[test]
fn test_struct_literal_allowed_inside_condition_parens() {
    let module = parse_clean(
        "func f() -> Bool {\n  if accepts(Writer.Config { retries: 3 }) {\n    return true\n  }\n  return false\n}\n",
    );
    assert_eq!(module.decls.len(), 1);
}

#[test]
fn test_lambda_body_forms() {
    let module = parse_clean(
        "let a = fn(u) => u + 1\nlet b = fn(u) -> g(u)\nlet c = fn(u: Int, v: Int = 2) {\n  return u + v\n}\n",
    );

    for decl in &module.decls {
        let DeclKind::Value(value) = &decl.kind else {
            panic!("expected value");
        };
        assert!(matches!(value.value, Some(Expr::Lambda { .. })));
    }
}

#[test]
fn test_match_statement_patterns() {
    let source = "func f(shape: Shape) -> Int {\n  match shape {\n    Circle(r) => 1,\n    Shape.Empty => 2,\n    Point { x, y: 0 } => 3,\n    (a, b) => 4,\n    \"origin\" => 5,\n    n if n > 0 => 6,\n    _ => 0\n  }\n  return 0\n}\n";
    let module = parse_clean(source);

    let DeclKind::Func(func) = &module.decls[0].kind else {
        panic!("expected func");
    };
    let Some(FuncBody::Block(stmts)) = &func.body else {
        panic!("expected block");
    };
    let Stmt::Match { arms, .. } = &stmts[0] else {
        panic!("expected match");
    };
    assert_eq!(arms.len(), 7);
    assert!(matches!(arms[0].pattern, Pattern::Enum { .. }));
    assert!(matches!(
        arms[1].pattern,
        Pattern::Enum { qualifier: Some(_), .. }
    ));
    assert!(matches!(arms[2].pattern, Pattern::Record { .. }));
    assert!(matches!(arms[3].pattern, Pattern::Tuple { .. }));
    assert!(matches!(arms[4].pattern, Pattern::Literal { .. }));
    assert!(matches!(arms[5].pattern, Pattern::Binding { .. }));
    assert!(arms[5].guard.is_some());
    assert!(matches!(arms[6].pattern, Pattern::Wildcard { .. }));
}

#[test]
fn test_try_catch_finally() {
    let source = "func f() -> Int {\n  try {\n    risky()\n  } catch e: NetError {\n    log(e)\n  } catch e {\n    log(e)\n  } finally {\n    cleanup()\n  }\n  return 0\n}\n";
    let module = parse_clean(source);

    let DeclKind::Func(func) = &module.decls[0].kind else {
        panic!("expected func");
    };
    let Some(FuncBody::Block(stmts)) = &func.body else {
        panic!("expected block");
    };
    let Stmt::Try {
        catches, finally, ..
    } = &stmts[0]
    else {
        panic!("expected try");
    };
    assert_eq!(catches.len(), 2);
    assert!(catches[0].ty.is_some());
    assert!(catches[1].ty.is_none());
    assert!(finally.is_some());
}

#[test]
fn test_concurrency_statements() {
    let source = "workflow W {\n  channel results: String\n  spawn worker.run()\n  send \"go\" to results\n  recv first from results\n  select {\n    case recv msg from results => {\n      log(msg)\n    }\n    else => {\n      log(\"idle\")\n    }\n  }\n}\n";
    let module = parse_clean(source);

    let DeclKind::Workflow(workflow) = &module.decls[0].kind else {
        panic!("expected workflow");
    };
    assert!(matches!(workflow.body[0], Stmt::Channel { .. }));
    assert!(matches!(workflow.body[1], Stmt::Spawn { .. }));
    assert!(matches!(workflow.body[2], Stmt::Send { .. }));
    assert!(matches!(workflow.body[3], Stmt::Recv { .. }));
    let Stmt::Select { arms, default, .. } = &workflow.body[4] else {
        panic!("expected select");
    };
    assert_eq!(arms.len(), 1);
    assert!(default.is_some());
}

#[test]
fn test_label_statement() {
    let source = "func f() -> Int {\n  retry: while true {\n    break\n  }\n  return 0\n}\n";
    let module = parse_clean(source);

    let DeclKind::Func(func) = &module.decls[0].kind else {
        panic!("expected func");
    };
    let Some(FuncBody::Block(stmts)) = &func.body else {
        panic!("expected block");
    };
    let Stmt::Label { name, stmt, .. } = &stmts[0] else {
        panic!("expected label");
    };
    assert_eq!(name, "retry");
    assert!(matches!(stmt.as_ref(), Stmt::While { .. }));
}

#[test]
fn test_using_defer_throw() {
    let source = "func f() -> Int {\n  using acquire() as res {\n    defer release(res)\n    throw Timeout()\n  }\n  return 0\n}\n";
    let module = parse_clean(source);
    assert_eq!(module.decls.len(), 1);
}

#[test]
fn test_for_over_pattern() {
    let source = "func f(entries: List[Int]) -> Int {\n  for (k, v) in entries {\n    log(k, v)\n  }\n  return 0\n}\n";
    let module = parse_clean(source);

    let DeclKind::Func(func) = &module.decls[0].kind else {
        panic!("expected func");
    };
    let Some(FuncBody::Block(stmts)) = &func.body else {
        panic!("expected block");
    };
    let Stmt::For { pattern, .. } = &stmts[0] else {
        panic!("expected for");
    };
    assert!(matches!(pattern, Pattern::Tuple { .. }));
}

#[test]
fn test_standalone_types() {
    assert!(matches!(
        parse_standalone_type("Map[String, Int]").unwrap().kind,
        TypeKind::Map(_, _)
    ));
    assert!(matches!(
        parse_standalone_type("List[Int]").unwrap().kind,
        TypeKind::List(_)
    ));

    let option = parse_standalone_type("Option[Int]").unwrap();
    assert!(option.optional);
    assert!(option.is_named("Int") || matches!(option.kind, TypeKind::Name { .. }));

    assert!(matches!(
        parse_standalone_type("func(Int, String) -> Bool").unwrap().kind,
        TypeKind::Func { .. }
    ));
    assert!(matches!(
        parse_standalone_type("{name: String, age: Int?}").unwrap().kind,
        TypeKind::Struct(_)
    ));
    assert!(matches!(
        parse_standalone_type("(Int, String)").unwrap().kind,
        TypeKind::Tuple(_)
    ));

    let qualified = parse_standalone_type("core.Url").unwrap();
    assert!(matches!(
        &qualified.kind,
        TypeKind::Name { path, .. } if path.join(".") == "core.Url"
    ));
}

#[test]
fn test_error_isolation_two_mistakes() {
    let source = "let = 1\nlet y = 2\nlet = 3\nlet z = 4\n";
    let outcome = parse_module(source, "test.hilo");

    assert_eq!(outcome.diagnostics.len(), 2);
    assert_eq!(outcome.module.decls.len(), 2);
}

#[test]
fn test_determinism() {
    let source = "module m\nfunc f(x: Int) -> Int {\n  return x * 2\n}\n";
    let first = parse_module(source, "test.hilo");
    let second = parse_module(source, "test.hilo");

    assert_eq!(first.module, second.module);
}

#[test]
fn test_nesting_limit_aborts() {
    let mut source = String::from("let x = ");
    source.push_str(&"(".repeat(250));
    source.push('1');
    source.push_str(&")".repeat(250));
    source.push('\n');

    let outcome = parse_module(&source, "test.hilo");
    assert!(outcome.was_aborted());
    assert_eq!(
        outcome.diagnostics.last().unwrap().kind.code(),
        "nesting-too-deep"
    );
}

#[test]
fn test_imports_must_precede_declarations() {
    let source = "let x = 1\nimport core.text\n";
    let outcome = parse_module(source, "test.hilo");

    // A misplaced import is a warning; the clause is still recorded.
    assert_eq!(outcome.diagnostics.len(), 1);
    assert!(!outcome.has_errors());
    assert_eq!(outcome.module.imports.len(), 1);
}

#[test]
fn test_trailing_tokens_after_decl_report() {
    let source = "let x = 1 let y = 2\n";
    let outcome = parse_module(source, "test.hilo");

    assert!(!outcome.diagnostics.is_empty());
}
