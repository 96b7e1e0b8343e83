//! Compiled procedures and the sandbox.

use std::thread;
use std::time::{Duration, Instant};

use braid::{BufferSink, Engine, RenderMode, Scope, TemplateError, Value};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{capitalize, render, render_compiled, scope};

const SAMPLES: &[&str] = &[
    "There is {{[ much ]]}} {{= a_man in plain}} can do.",
    "{{for i, guy in protagonists {{{{= i}}. {{= guy in html}}\n}} }}",
    "{{if {{protagonists.length > 2}} then many else few}} {{# nothing}}{{ raw}}",
    "{{= a_man in uri}} {{= n in {{float 2}}}} {{= n in exp in uri}} {{nope {{[x]]}}}}",
];

fn sample_scope() -> serde_json::Value {
    json!({
        "a_man": "Jan Ö",
        "n": 1234.5,
        "protagonists": ["Blondie", "Angel <2>", "Tuco"],
    })
}

#[test]
fn compiled_output_matches_direct_output() {
    for template in SAMPLES {
        assert_eq!(
            render_compiled(template, sample_scope()),
            render(template, sample_scope()),
            "template {template:?}"
        );
    }
}

#[test]
fn procedure_is_idempotent() {
    let procedure = Engine::new().compile(SAMPLES[1]).unwrap();
    let first = procedure.render_to_string(&mut scope(sample_scope())).unwrap();
    let second = procedure.render_to_string(&mut scope(sample_scope())).unwrap();
    assert_eq!(first, "0. Blondie\n1. Angel &lt;2&gt;\n2. Tuco\n");
    assert_eq!(first, second);
}

#[test]
fn render_then_reports_completion() {
    let procedure = Engine::new().compile("{{= intro}}, {{= object}}").unwrap();
    let mut out = String::new();
    let mut finished = false;
    procedure.render_then(
        &mut out,
        &mut scope(json!({ "intro": "hello", "object": "world" })),
        |result| {
            assert!(result.is_ok());
            finished = true;
        },
    );
    assert_eq!(out, "hello, world");
    assert!(finished);
}

#[test]
fn sandboxed_render_with_host_function() {
    let engine = Engine::new();
    let procedure = engine
        .compile("{{= players.length in plain}} players:{{for player in players {{\n- {{= capitalize(player) in plain}}}} }}\n")
        .unwrap();
    let mut scope = scope(json!({ "players": ["zadig", "hector"] }));
    scope.set("capitalize", capitalize());
    let mut out = String::new();
    engine.render_sandboxed(&procedure, &scope, &mut out).unwrap();
    assert_eq!(out, "2 players:\n- Zadig\n- Hector\n");
}

#[test]
fn runaway_render_times_out() {
    let engine = Engine::builder()
        .mode(RenderMode::Sandboxed)
        .sandbox_timeout(Duration::from_millis(50))
        .build();
    let mut scope = Scope::new();
    scope.set("xs", Value::list(vec![Value::Null; 100_000]));
    scope.set(
        "spin",
        Value::function("spin", |_| {
            thread::sleep(Duration::from_millis(1));
            Ok(Value::Null)
        }),
    );
    let sink = BufferSink::new();
    let mut writer = sink.clone();
    let started = Instant::now();
    let err = engine
        .render_with_mode("{{for x in xs {{{{= spin()}}}}}}", &mut scope, &mut writer)
        .unwrap_err();
    assert!(matches!(err, TemplateError::Timeout { .. }));
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(sink.output(), "");
}

#[test]
fn compiled_errors_name_enclosing_macros() {
    let procedure = Engine::new()
        .compile("{{for x in xs {{{{= x.name.first}}}}}}")
        .unwrap();
    let err = procedure
        .render_to_string(&mut scope(json!({ "xs": [{ "id": 1 }] })))
        .unwrap_err();
    assert_eq!(err.macro_trace(), vec!["for", "="]);
    assert!(matches!(err.root_cause(), TemplateError::MissingValue { .. }));
}
