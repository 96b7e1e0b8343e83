//! Direct interpretation.

use braid::{Engine, Interpreter, Scope, TemplateError, Value};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{capitalize, render, scope};

// === Text and escapes ===

#[test]
fn escapes_comments_and_loops() {
    assert_eq!(
        render(
            concat!(
                "There is {{[ much ]]}} {{= a_man in plain}} can do.\n\n",
                "{{# {dummy braces test} }}",
                "{{= us in html}} we have many friends: \n",
                "{{for friend in friends {{there is {{= friend in plain}}, }} }}…",
            ),
            json!({
                "a_man": "Jan",
                "us": "My friend & I",
                "friends": ["Thaddee", "Serge", "Marie"],
            }),
        ),
        concat!(
            "There is {{ much ]}} Jan can do.\n\n",
            "My friend &amp; I we have many friends: \n",
            "there is Thaddee, there is Serge, there is Marie, …",
        )
    );
}

#[test]
fn text_without_zones_is_unchanged() {
    assert_eq!(render("Hi.", json!({})), "Hi.");
}

#[test]
fn substituted_text_is_not_rescanned() {
    assert_eq!(
        render("Escaping {{= data in plain}}", json!({ "data": "{{= data in plain}}" })),
        "Escaping {{= data in plain}}"
    );
}

#[test]
fn unknown_macro_is_kept() {
    assert_eq!(
        render("a {{unknownmacro foo}} b", json!({})),
        "a {{unknownmacro foo}} b"
    );
}

// === for ===

#[test]
fn formatter_without_in_keyword() {
    assert_eq!(
        render(
            "Trying to {{for word in sentence {{{{= word plain}} }} }}",
            json!({ "sentence": ["complete", "the", "sentence."] }),
        ),
        "Trying to complete the sentence. "
    );
}

#[test]
fn nested_loops() {
    assert_eq!(
        render(
            "Your base belongs to {{for me in us {{\n- {{for name in me {{{{= name in plain}} }} }};}} }}",
            json!({ "us": [["John", "Connor"], ["Paul", "Irish"], ["Ash", "Williams"]] }),
        ),
        "Your base belongs to \n- John Connor ;\n- Paul Irish ;\n- Ash Williams ;"
    );
}

#[test]
fn loop_with_index() {
    assert_eq!(
        render(
            "Characters:\n{{for i, guy in protagonists {{{{= i in plain}}. {{= guy in plain}}\n}} }}",
            json!({ "protagonists": ["Blondie", "Angel", "Tuco"] }),
        ),
        "Characters:\n0. Blondie\n1. Angel\n2. Tuco\n"
    );
}

#[test]
fn loop_variable_survives_the_loop() {
    let engine = Engine::new();
    let mut scope = scope(json!({ "items": ["a", "b"] }));
    let out = engine
        .render_to_string("{{for x in items {{{{= x in plain}} }}}}", &mut scope)
        .unwrap();
    assert_eq!(out, "a b ");
    assert_eq!(scope.get("x"), Some(&Value::from("b")));
}

// === if ===

#[test]
fn compound_condition() {
    assert_eq!(
        render(
            "Thaddee {{if {{apostles.indexOf(thaddee) != -1}} then was else wasn't}} an apostle",
            json!({
                "thaddee": "Thaddaeus",
                "apostles": ["Simon", "Andrew", "James", "John", "Philip", "Bartholomew",
                             "Matthew", "Thomas", "James", "Simon", "Judas", "Judas"],
            }),
        ),
        "Thaddee wasn't an apostle"
    );
}

#[test]
fn if_without_else() {
    let template = "{{if present then {{I am here. Hello! }} }}Anyway, how do you do?";
    assert_eq!(
        render(template, json!({ "present": true })),
        "I am here. Hello! Anyway, how do you do?"
    );
    assert_eq!(render(template, json!({ "present": false })), "Anyway, how do you do?");
}

#[test]
fn if_else_chain() {
    assert_eq!(
        render(
            "I am {{if present then {{yes}} else {{no}}}}",
            json!({ "present": false }),
        ),
        "I am no"
    );
    assert_eq!(
        render(
            "I am {{if here then {{here. Hello!}} else if atWork then {{at work…}} else out.}} Anyway, how do you do?",
            json!({ "here": false, "atWork": true }),
        ),
        "I am at work… Anyway, how do you do?"
    );
}

#[test]
fn missing_condition_is_false() {
    assert_eq!(render("{{if ghost then yes else no}}", json!({})), "no");
}

// === Host functions and macros ===

#[test]
fn host_function_in_scope() {
    let mut scope = scope(json!({ "data": "hi" }));
    scope.set("capitalize", capitalize());
    assert_eq!(
        Engine::new()
            .render_to_string("{{= capitalize(data) in plain}}.", &mut scope)
            .unwrap(),
        "Hi."
    );
}

#[test]
fn host_macro_joins_a_list() {
    let engine = Engine::new();
    engine.define_macro(
        "join",
        |cx: &mut Interpreter<'_>, params: &[&str]| -> Result<(), TemplateError> {
            let [list, _with, separator] = params else {
                return Err(braid::errors::malformed_macro("join", "expected `<list> with <sep>`"));
            };
            let items = cx.evaluate(list)?;
            let joined = items
                .entries()
                .unwrap_or_default()
                .into_iter()
                .map(|(_, item)| item.to_string())
                .collect::<Vec<_>>()
                .join(separator);
            cx.write(&joined)
        },
    );
    let mut scope = scope(json!({ "kids": ["Jack", "Hugh", "Hector"] }));
    assert_eq!(
        engine
            .render_to_string("I love {{join kids with {{, }}}}.", &mut scope)
            .unwrap(),
        "I love Jack, Hugh, Hector."
    );
}

#[test]
fn template_macro_defined_in_template() {
    assert_eq!(
        render(
            "{{! greet {{Hello, {{= params[0] }}!}}}}{{greet Ann}} {{greet Bo}}",
            json!({}),
        ),
        "Hello, Ann! Hello, Bo!"
    );
}

#[test]
fn scope_view_reads_keys_that_are_not_identifiers() {
    assert_eq!(
        render(
            "{{= {{$_scope[\"back\\\\slash\"] }} in plain}} {{= {{$_scope[\"two words\"] }} }}",
            json!({ "back\\slash": "a \\", "two words": 2 }),
        ),
        "a \\ 2"
    );
}

// === Errors ===

#[test]
fn unknown_formatter_fails_with_context() {
    let mut scope = scope(json!({ "data": "true" }));
    let err = Engine::new()
        .render_to_string("It is {{= data in boolean}}", &mut scope)
        .unwrap_err();
    assert!(matches!(
        err.root_cause(),
        TemplateError::MissingFormatter { name } if name == "boolean"
    ));
    assert_eq!(
        err.to_string(),
        concat!(
            "Template error: macro \"=\" didn't work.\n",
            "Parameters: [\"data\", \"in\", \"boolean\"]\n",
            "Literal: {\"data\":\"true\"}\n",
            "Message: Template error: formatter boolean is missing.",
        )
    );
}

#[test]
fn partial_output_stays_written() {
    let engine = Engine::new();
    let mut out = String::new();
    let result = engine.render("kept {{= ghost}} lost", &mut Scope::new(), &mut out);
    assert!(result.is_err());
    assert_eq!(out, "kept ");
}

#[test]
fn tracing_init_is_repeatable() {
    braid::init_tracing();
    braid::init_tracing();
    assert_eq!(render("ok", json!({})), "ok");
}
