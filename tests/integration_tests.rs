//! Integration tests for the HILO front-end.
//!
//! These tests verify the complete pipeline from source text through
//! tokenization, parsing, diagnostics, and canonical JSON serialization.

use hilo::{
    parse_module, render_diagnostic,
    serializer::json::{from_json, to_json},
};
use serde_json::json;

#[test]
fn test_parse_hello_module() {
    let source = "module demo.hello\n\nfunc greet(name: String = \"world\") -> String {\n    return \"Hello, \" + name + \"!\"\n}\n";
    let outcome = parse_module(source, "hello.hilo");

    assert!(!outcome.has_errors());
    assert!(outcome.diagnostics.is_empty());

    let value = to_json(&outcome.module);
    assert_eq!(value["module"], json!("demo.hello"));
    assert_eq!(value["decls"][0]["kind"], json!("func"));
    assert_eq!(value["decls"][0]["name"], json!("greet"));
}

#[test]
fn test_import_forms_produce_identical_ast() {
    let first = parse_module("import core.text { trim, split } as t\n", "a.hilo");
    let second = parse_module("import core.text as t { trim, split }\n", "b.hilo");

    assert!(first.diagnostics.is_empty());
    assert!(second.diagnostics.is_empty());
    assert_eq!(to_json(&first.module), to_json(&second.module));
}

#[test]
fn test_agent_pipeline_round_trip() {
    let source = "module pipeline\n\nagent Summarizer {\n  profile { name: \"summarizer\" }\n  tools {\n    web.search(query: String) -> List[Url]\n  }\n  policy { max_cost: 5.0 }\n  async func summarize(notes: String) -> String {\n    let trimmed = notes |> trim() |> dedupe()\n    return trimmed\n  }\n}\n\nworkflow Nightly {\n  channel done: Bool\n  spawn Summarizer.summarize(\"notes\")\n  recv ok from done\n}\n";
    let outcome = parse_module(source, "pipeline.hilo");
    assert!(
        outcome.diagnostics.is_empty(),
        "unexpected diagnostics: {:?}",
        outcome.diagnostics
    );

    let first = to_json(&outcome.module);
    let reconstructed = from_json(&first).expect("canonical JSON must decode");
    let second = to_json(&reconstructed);

    assert_eq!(first, second);
}

#[test]
fn test_error_isolation() {
    // Two independent mistakes separated by synchronizing terminators
    // produce exactly two diagnostics.
    let source = "let = 1\nlet a = 2\nlet = 3\nlet b = 4\n";
    let outcome = parse_module(source, "errors.hilo");

    assert_eq!(outcome.diagnostics.len(), 2);
    assert_eq!(outcome.module.decls.len(), 2);
}

#[test]
fn test_partial_ast_survives_missing_brace() {
    let source = "record User {\n  name: String\n\nfunc greet() -> String {\n  return \"hi\"\n}\n";
    let outcome = parse_module(source, "partial.hilo");

    assert!(outcome.has_errors());
    assert!(!outcome.was_aborted());
    assert_eq!(outcome.diagnostics.len(), 1);
    assert_eq!(outcome.diagnostics[0].kind.code(), "missing-token");

    let value = to_json(&outcome.module);
    assert_eq!(value["decls"][0]["kind"], json!("func"));
    assert_eq!(value["decls"][0]["name"], json!("greet"));
}

#[test]
fn test_parsing_is_deterministic() {
    let source = "module m\n\nrecord Point { x: Int, y: Int }\n\nfunc origin() -> Point {\n  return Point { x: 0, y: 0 }\n}\n";
    let first = parse_module(source, "m.hilo");
    let second = parse_module(source, "m.hilo");

    assert_eq!(first.module, second.module);
    assert_eq!(first.diagnostics, second.diagnostics);
}

#[test]
fn test_resource_limit_aborts() {
    let mut source = String::from("let deep = ");
    source.push_str(&"(".repeat(300));
    source.push('1');
    source.push_str(&")".repeat(300));

    let outcome = parse_module(&source, "deep.hilo");
    assert!(outcome.was_aborted());
}

#[test]
fn test_diagnostic_rendering_includes_location() {
    let source = "let x = 1\nlet = 2\n";
    let outcome = parse_module(source, "loc.hilo");
    assert_eq!(outcome.diagnostics.len(), 1);

    let rendered = render_diagnostic(source, &outcome.file, &outcome.diagnostics[0]);
    assert!(rendered.contains("loc.hilo"));
    assert!(rendered.contains("2 | let = 2"));
    assert!(rendered.contains("^"));
}

#[test]
fn test_lexical_errors_do_not_stop_parsing() {
    let source = "let s = \"unterminated\nlet t = 2\n";
    let outcome = parse_module(source, "lex.hilo");

    // One lexical diagnostic; the second declaration still parses.
    assert!(outcome.has_errors());
    assert_eq!(outcome.module.decls.len(), 2);
}
