//! Unit tests for the canonical serializer.
//!
//! Covers the documented JSON shape, the abbreviated type renderings, and
//! round-trip stability between `to_json` and `from_json`.

use serde_json::json;

use crate::{
    parse_module,
    serializer::{
        json::{from_json, to_json},
        render::{render_import, render_type},
    },
};

fn parse_clean(source: &str) -> crate::ast::module::Module {
    let outcome = parse_module(source, "test.hilo");
    assert!(
        outcome.diagnostics.is_empty(),
        "unexpected diagnostics: {:?}",
        outcome.diagnostics
    );
    outcome.module
}

#[test]
fn test_top_level_shape() {
    let source = "module demo.hello\nimport core.text as t { trim, split }\nfunc greet(name: String = \"world\") -> String {\n  return \"Hello, \" + name + \"!\"\n}\n";
    let value = to_json(&parse_clean(source));

    assert_eq!(value["module"], json!("demo.hello"));
    assert_eq!(value["imports"], json!(["core.text as t { trim, split }"]));
    assert_eq!(value["decls"][0]["kind"], json!("func"));
    assert_eq!(value["decls"][0]["name"], json!("greet"));
    assert_eq!(value["decls"][0]["params"][0]["name"], json!("name"));
    assert_eq!(value["decls"][0]["params"][0]["type"], json!("String"));
    assert_eq!(value["decls"][0]["params"][0]["default"], json!("\"world\""));
    assert_eq!(value["decls"][0]["returns"], json!("String"));
    assert_eq!(value["decls"][0]["body"][0]["kind"], json!("return"));
}

#[test]
fn test_module_without_header_is_null() {
    let value = to_json(&parse_clean("let x = 1\n"));
    assert_eq!(value["module"], json!(null));
}

#[test]
fn test_optional_field_and_type_abbreviation() {
    let source = "record User {\n  name: String\n  age?: Int?\n  home: Option[String]\n}\n";
    let value = to_json(&parse_clean(source));

    let fields = &value["decls"][0]["fields"];
    assert_eq!(fields[0]["type"], json!("String"));
    assert!(fields[0].get("optional").is_none());
    assert_eq!(fields[1]["optional"], json!(true));
    assert_eq!(fields[1]["type"], json!("Int?"));
    // Option[T] serializes as the abbreviated "T?".
    assert_eq!(fields[2]["type"], json!("String?"));
}

#[test]
fn test_result_serializes_as_union() {
    let source = "func fetch(url: String) -> Result[String, NetError] {\n  return url\n}\n";
    let value = to_json(&parse_clean(source));

    assert_eq!(
        value["decls"][0]["returns"],
        json!("{ok: String} | {err: NetError}")
    );
}

#[test]
fn test_nested_result_keeps_named_form() {
    let source = "func f() -> List[Result[Int, String]] {\n  return []\n}\n";
    let value = to_json(&parse_clean(source));

    assert_eq!(value["decls"][0]["returns"], json!("List[Result[Int, String]]"));
}

#[test]
fn test_enum_cases_are_tagged() {
    let source = "enum Shape {\n  Circle(Float)\n  Empty\n}\n";
    let value = to_json(&parse_clean(source));

    let cases = &value["decls"][0]["cases"];
    assert_eq!(cases[0]["tag"], json!("Circle"));
    assert_eq!(cases[0]["args"], json!(["Float"]));
    assert_eq!(cases[1]["tag"], json!("Empty"));
    assert!(cases[1].get("args").is_none());
}

#[test]
fn test_lambda_serializes_as_func_node() {
    let value = to_json(&parse_clean("let f = fn(u) => u + 1\n"));

    let lambda = &value["decls"][0]["value"];
    assert_eq!(lambda["kind"], json!("func"));
    assert_eq!(lambda["isLambda"], json!(true));
    assert_eq!(lambda["params"][0]["name"], json!("u"));
    assert_eq!(lambda["body"]["expr"]["kind"], json!("binary"));
}

#[test]
fn test_doc_and_attributes_serialize() {
    let source = "/// Cached fetch.\n@cached\nfunc fetch(url: String) -> String => url\n";
    let value = to_json(&parse_clean(source));

    assert_eq!(value["decls"][0]["doc"], json!("Cached fetch."));
    assert_eq!(value["decls"][0]["attributes"][0]["name"], json!("cached"));
}

#[test]
fn test_import_rendering_normalizes_order() {
    let first = parse_clean("import core.text { trim, split } as t\n");
    let second = parse_clean("import core.text as t { trim, split }\n");

    assert_eq!(render_import(&first.imports[0]), "core.text as t { trim, split }");
    assert_eq!(
        render_import(&first.imports[0]),
        render_import(&second.imports[0])
    );
}

#[test]
fn test_type_rendering() {
    use crate::parser::parser::parse_standalone_type;

    let cases = [
        ("Map[String, Int]", "Map[String, Int]"),
        ("List[Int]?", "List[Int]?"),
        ("Option[Int]", "Int?"),
        ("(Int, String)", "(Int, String)"),
        ("func(Int) -> Bool", "func(Int) -> Bool"),
        ("{name: String, age: Int?}", "{name: String, age: Int?}"),
        ("core.Url", "core.Url"),
    ];
    for (source, expected) in cases {
        let ty = parse_standalone_type(source).unwrap();
        assert_eq!(render_type(&ty), expected, "rendering {:?}", source);
    }
}

#[test]
fn test_duration_serialization() {
    let value = to_json(&parse_clean("let t = 30s\n"));

    assert_eq!(value["decls"][0]["value"]["kind"], json!("duration"));
    assert_eq!(value["decls"][0]["value"]["value"], json!(30));
    assert_eq!(value["decls"][0]["value"]["unit"], json!("s"));
}

#[test]
fn test_from_json_rejects_unknown_kind() {
    let value = json!({
        "module": null,
        "imports": [],
        "decls": [{ "kind": "mystery" }],
    });
    assert!(from_json(&value).is_err());
}

#[test]
fn test_from_json_rejects_bad_type_string() {
    let value = json!({
        "module": null,
        "imports": [],
        "decls": [{ "kind": "let", "name": "x", "type": "???" }],
    });
    assert!(from_json(&value).is_err());
}

#[test]
fn test_round_trip_stability() {
    let source = r#"module agents.research
import core.text as t { trim, split }
import core.web

/// Shared result shape.
record Report {
  title: String
  body: String
  score?: Float
  tags: List[String] = []
}

enum Status {
  Queued
  Running(Int)
  Done { code: Int }
}

trait Runner {
  async func run(input: String) -> String
}

class Worker : Runner {
  state: Int
  async func run(input: String) -> String {
    return input
  }
}

type Lookup = Map[String, Report]

const LIMIT: Int = 10
let fallback: String? = null

@cached
async func fetch(url: String, retries: Int = 3) -> Result[String, NetError] {
  let body = await core.web.get(url)
  if body == null {
    throw NetError { url: url }
  }
  return body
}

func summarize(notes: List[String]) -> String {
  let joined = notes |> t.trim() |> t.split(",")
  match joined {
    (head, rest) => head,
    other if true => other,
    _ => "many"
  }
  for (i, note) in notes {
    log(i, note)
  }
  try {
    risky()
  } catch e: NetError {
    log(e)
  } finally {
    cleanup()
  }
  using acquire() as res {
    defer release(res)
  }
  retry: while false {
    break
  }
  return "done"
}

agent Writer {
  profile { name: "writer", style: "concise" }
  capabilities { web: WebAccess { timeout: 30s }, files: FileAccess {} }
  tools {
    web.search(query: String) -> List[Url]
    files.read(path: String) -> String
  }
  policy { max_cost: 10.0, allow_network: true }
  func draft(notes: String, audience: String = "Engineer") -> String {
    return Writer.run(notes, audience: audience)
  }
}

task Research(topic: String) -> Report {
  let pages = search(topic)
  return Report { title: topic, body: pages }
}

workflow Daily {
  channel results: String
  spawn Research("news")
  send "go" to results
  recv first from results
  select {
    case recv msg from results => {
      log(msg)
    }
    else => {
      log("idle")
    }
  }
}

test "summarize handles empty input" {
  let out = summarize([])
}
"#;

    let module = parse_clean(source);
    let first = to_json(&module);
    let reconstructed = from_json(&first).expect("canonical JSON must decode");
    let second = to_json(&reconstructed);

    assert_eq!(first, second);
}
