//! Shared test utilities.

use braid::{Engine, Scope, Value};

/// Scope built from a JSON object literal.
pub fn scope(json: serde_json::Value) -> Scope {
    Scope::from_json(json).expect("scope literal must be a JSON object")
}

/// Render `template` directly with a default engine.
pub fn render(template: &str, json: serde_json::Value) -> String {
    Engine::new()
        .render_to_string(template, &mut scope(json))
        .unwrap()
}

/// Compile `template` with a default engine and render it once.
pub fn render_compiled(template: &str, json: serde_json::Value) -> String {
    Engine::new()
        .compile(template)
        .unwrap()
        .render_to_string(&mut scope(json))
        .unwrap()
}

/// Host function upper-casing the first character of its argument.
pub fn capitalize() -> Value {
    Value::function("capitalize", |args| {
        let text = args.first().map(ToString::to_string).unwrap_or_default();
        let mut chars = text.chars();
        Ok(Value::from(match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
            None => String::new(),
        }))
    })
}
