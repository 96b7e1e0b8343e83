//! The formatter pipeline.

use braid::{Engine, Scope, TemplateError, Value};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{render, scope};

#[test]
fn markup_escaping() {
    assert_eq!(
        render("Html {{= data in html}}.", json!({ "data": "<text & stuff>" })),
        "Html &lt;text &amp; stuff&gt;."
    );
    assert_eq!(
        render("Xml {{= data in xml}}.", json!({ "data": "<text & stuff>" })),
        "Xml &lt;text &amp; stuff&gt;."
    );
    assert_eq!(
        render("XmlAttr {{= data in xmlattr}}.", json!({ "data": "<'text' & \"stuff\">" })),
        "XmlAttr &lt;&apos;text&apos; &amp; &quot;stuff&quot;&gt;."
    );
}

#[test]
fn json_string_escaping() {
    assert_eq!(
        render(
            "JsonString \"{{= data in jsonstring}}\"",
            json!({ "data": "file \"foo\\bar\":\tok\nBody:\r\u{c}del=\u{8}" }),
        ),
        "JsonString \"file \\\"foo\\\\bar\\\":\\tok\\nBody:\\r\\fdel=\\b\""
    );
}

#[test]
fn json_compact_and_indented() {
    let data = json!({ "data": { "foo\\bar": "ok\nBody:\r\u{c}del=\u{8}" } });
    assert_eq!(
        render("Json \"{{= data in json}}\"", data.clone()),
        "Json \"{\"foo\\\\bar\":\"ok\\nBody:\\r\\fdel=\\b\"}\""
    );
    assert_eq!(
        render("Json \"{{= data in {{json 2}} }}\"", data),
        "Json \"{\n  \"foo\\\\bar\": \"ok\\nBody:\\r\\fdel=\\b\"\n}\""
    );
}

#[test]
fn json_keeps_key_order() {
    assert_eq!(
        render("{{= data in json}}", json!({ "data": { "zeta": 1, "alpha": [true, null] } })),
        "{\"zeta\":1,\"alpha\":[true,null]}"
    );
}

#[test]
fn uri_round_trip() {
    assert_eq!(
        render("Uri {{= data in uri}}.", json!({ "data": "conversion done" })),
        "Uri conversion%20done."
    );
    assert_eq!(
        render("Non-Uri {{= data in !uri}}.", json!({ "data": "conversion%20done" })),
        "Non-Uri conversion done."
    );
}

#[test]
fn numbers() {
    let n = json!({ "data": 73.6 });
    assert_eq!(render("Int {{= data in integer}}.", n.clone()), "Int 74.");
    assert_eq!(render("Float {{= data in {{float 2}} }}.", n.clone()), "Float 73.60.");
    assert_eq!(render("Exp {{= data in {{exp 2}} }}.", n), "Exp 7.36e+1.");
    assert_eq!(
        render("Radix {{= data in {{intradix 2}} }}.", json!({ "data": 2 })),
        "Radix 10."
    );
    assert_eq!(
        render("Default number {{= data in html}}", json!({ "data": 7 })),
        "Default number 7"
    );
}

#[test]
fn chained_formatters_run_left_to_right() {
    assert_eq!(
        render("http://example.net/{{= data in exp in uri}}", json!({ "data": 1234 })),
        "http://example.net/1e%2B3"
    );
}

#[test]
fn numeric_formatter_on_text_is_empty() {
    assert_eq!(render("Nonint {{= data in integer}}.", json!({ "data": "hi" })), "Nonint .");
}

#[test]
fn bad_radix_is_a_formatter_failure() {
    let err = Engine::new()
        .render_to_string("{{= n in {{intradix 99}}}}", &mut scope(json!({ "n": 5 })))
        .unwrap_err();
    assert!(matches!(
        err.root_cause(),
        TemplateError::FormatterFailed { name, .. } if name == "intradix"
    ));
}

#[test]
fn custom_formatter() {
    let engine = Engine::new();
    engine.define_formatter("paren", |v: &Value, _: &[&str]| -> Result<Value, String> {
        Ok(Value::from(format!("({v})")))
    });
    let mut scope = Scope::new();
    scope.set("data", "unfortunately");
    assert_eq!(
        engine
            .render_to_string("It's a trap {{= data in paren}}", &mut scope)
            .unwrap(),
        "It's a trap (unfortunately)"
    );
}
