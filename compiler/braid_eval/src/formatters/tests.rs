use super::*;
use pretty_assertions::assert_eq;

fn run(name: &str, value: Value, params: &[&str]) -> String {
    let registry = FormatterRegistry::new();
    registry
        .get(name)
        .unwrap()
        .format(&value, params)
        .unwrap()
        .to_string()
}

// === Chain parsing ===

#[test]
fn chain_skips_in_separators() {
    let chain = parse_chain(&["in", "exp", "in", "uri"]);
    let names: Vec<&str> = chain.iter().map(|c| c.name).collect();
    assert_eq!(names, vec!["exp", "uri"]);
}

#[test]
fn chain_splits_parameters() {
    let chain = parse_chain(&["in", "json 2", "in", "float\t3 x"]);
    assert_eq!(chain[0].name, "json");
    assert_eq!(chain[0].params.as_slice(), &["2"]);
    assert_eq!(chain[1].params.as_slice(), &["3", "x"]);
}

#[test]
fn chain_ignores_empty_tokens() {
    assert!(parse_chain(&["in", "", " "]).is_empty());
}

// === Application ===

#[test]
fn apply_composes_left_to_right() {
    let registry = FormatterRegistry::new();
    let chain = parse_chain(&["in", "exp", "in", "uri"]);
    let out = apply(&registry, Value::from(1234), &chain).unwrap();
    assert_eq!(out, Value::from("1e%2B3"));
}

#[test]
fn unknown_formatter_is_named() {
    let registry = FormatterRegistry::new();
    let chain = parse_chain(&["in", "boolean"]);
    let err = apply(&registry, Value::from(true), &chain).unwrap_err();
    assert!(matches!(err, TemplateError::MissingFormatter { ref name } if name == "boolean"));
}

#[test]
fn formatter_errors_are_wrapped() {
    let registry = FormatterRegistry::new();
    let chain = parse_chain(&["in", "intradix 99"]);
    let err = apply(&registry, Value::from(5), &chain).unwrap_err();
    assert!(matches!(err, TemplateError::FormatterFailed { ref name, .. } if name == "intradix"));
}

#[test]
fn custom_formatter_replaces_builtin() {
    let mut registry = FormatterRegistry::new();
    registry.register("plain", |v: &Value, _: &[&str]| -> Result<Value, String> {
        Ok(Value::from(format!("<{v}>")))
    });
    let chain = parse_chain(&["in", "plain"]);
    assert_eq!(
        apply(&registry, Value::from("x"), &chain).unwrap(),
        Value::from("<x>")
    );
}

#[test]
fn registry_lists_builtins() {
    let registry = FormatterRegistry::new();
    for name in [
        "plain", "html", "xml", "xmlattr", "uri", "!uri", "jsonstring", "json", "integer",
        "intradix", "float", "exp",
    ] {
        assert!(registry.contains(name), "missing {name}");
    }
    assert!(FormatterRegistry::empty().names().is_empty());
}

// === Text formatters ===

#[test]
fn markup_escaping() {
    assert_eq!(run("html", Value::from("<a & b>"), &[]), "&lt;a &amp; b&gt;");
    assert_eq!(run("xml", Value::from("<x/>"), &[]), "&lt;x/&gt;");
    assert_eq!(
        run("xmlattr", Value::from(r#"it's "q""#), &[]),
        "it&apos;s &quot;q&quot;"
    );
}

#[test]
fn uri_encoding() {
    assert_eq!(run("uri", Value::from("conversion done"), &[]), "conversion%20done");
    assert_eq!(run("uri", Value::from("a'b(c)*!~|`^"), &[]), "a%27b%28c%29%2A!~|`^");
    assert_eq!(run("uri", Value::from("é"), &[]), "%C3%A9");
}

#[test]
fn uri_decoding() {
    assert_eq!(run("!uri", Value::from("conversion%20done"), &[]), "conversion done");
    assert_eq!(run("!uri", Value::from("%C3%A9"), &[]), "é");
}

#[test]
fn jsonstring_escapes() {
    assert_eq!(
        run("jsonstring", Value::from("a\"b\\c\nd\te\u{08}"), &[]),
        r#"a\"b\\c\nd\te\b"#
    );
}

#[test]
fn json_compact_and_indented() {
    let value = Value::from(serde_json::json!({ "a": [1, 2], "b": "x" }));
    assert_eq!(run("json", value.clone(), &[]), r#"{"a":[1,2],"b":"x"}"#);
    assert_eq!(
        run("json", value, &["2"]),
        "{\n  \"a\": [\n    1,\n    2\n  ],\n  \"b\": \"x\"\n}"
    );
    assert_eq!(run("json", Value::from("s"), &["nope"]), r#""s""#);
}

// === Numeric formatters ===

#[test]
fn integer_rounds() {
    assert_eq!(run("integer", Value::from(73.6), &[]), "74");
    assert_eq!(run("integer", Value::from(2.5), &[]), "3");
    assert_eq!(run("integer", Value::from(-2.5), &[]), "-3");
    assert_eq!(run("integer", Value::from("hi"), &[]), "");
}

#[test]
fn float_fixed_digits() {
    assert_eq!(run("float", Value::from(73.6), &["2"]), "73.60");
    assert_eq!(run("float", Value::from(1.005), &["2"]), "1.00");
    assert_eq!(run("float", Value::from(1.125), &["2"]), "1.13");
    assert_eq!(run("float", Value::from(73.6), &[]), "74");
    assert_eq!(run("float", Value::Null, &["2"]), "");
}

#[test]
fn exp_notation() {
    assert_eq!(run("exp", Value::from(73.6), &["2"]), "7.36e+1");
    assert_eq!(run("exp", Value::from(1234), &[]), "1e+3");
    assert_eq!(run("exp", Value::from(0.00015), &["1"]), "1.5e-4");
    assert_eq!(run("exp", Value::from(9.99), &["1"]), "1.0e+1");
    assert_eq!(run("exp", Value::from(0), &["2"]), "0.00e+0");
}

#[test]
fn radix_conversion() {
    assert_eq!(run("intradix", Value::from(2), &["2"]), "10");
    assert_eq!(run("intradix", Value::from(255), &["16"]), "ff");
    assert_eq!(run("intradix", Value::from(-255), &["16"]), "-ff");
    assert_eq!(run("intradix", Value::from(0.5), &["2"]), "0.1");
    assert_eq!(run("intradix", Value::from(42), &[]), "42");
    assert_eq!(run("intradix", Value::from("42"), &["2"]), "");
}

#[test]
fn out_of_range_digits_fail() {
    let registry = FormatterRegistry::new();
    let float = registry.get("float").unwrap();
    assert!(float.format(&Value::from(1), &["101"]).is_err());
    assert!(float.format(&Value::from(1), &["-1"]).is_err());
}

mod properties {
    use super::*;
    use crate::formatters::builtins::{to_exponential, to_fixed, uri, uri_decode};
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn uri_decode_inverts_uri(text in "\\PC{0,24}") {
            let encoded = uri(&Value::from(text.clone()), &[]).unwrap();
            let decoded = uri_decode(&encoded, &[]).unwrap();
            prop_assert_eq!(decoded.to_string(), text);
        }

        #[test]
        fn fixed_is_within_half_a_unit(n in -1.0e6f64..1.0e6, digits in 0usize..8) {
            let text = to_fixed(n, digits);
            let parsed: f64 = text.parse().unwrap();
            #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation, reason = "digits < 8")]
            let unit = 10f64.powi(-(digits as i32));
            prop_assert!((parsed - n).abs() <= unit / 2.0 + n.abs() * 1e-12, "{n} -> {text}");
        }

        #[test]
        fn exponential_is_within_half_a_unit(n in -1.0e12f64..1.0e12, digits in 0usize..10) {
            prop_assume!(n != 0.0);
            let text = to_exponential(n, digits);
            let (_, exponent) = text.split_once('e').unwrap();
            let exponent: i32 = exponent.parse().unwrap();
            let parsed: f64 = text.parse().unwrap();
            #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation, reason = "digits < 10")]
            let unit = 10f64.powi(exponent - digits as i32);
            prop_assert!((parsed - n).abs() <= unit / 2.0 + n.abs() * 1e-12, "{n} -> {text}");
        }
    }
}
