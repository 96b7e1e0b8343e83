//! Runtime values handed to templates.
//!
//! Scopes hold [`Value`]s. Heap variants sit behind `Arc`, so cloning a
//! value (for a sandbox snapshot or a loop binding) is O(1), and every value
//! is `Send + Sync`.
//!
//! Conversion to text follows the usual dynamic-language rules: integral
//! numbers print without a fractional part, lists join with commas and
//! maps print as `[object Object]`.

mod map;

use std::fmt;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

pub use map::ValueMap;

/// Signature of a host function callable from expressions.
pub type NativeFn = dyn Fn(&[Value]) -> Result<Value, String> + Send + Sync;

/// A named host function.
#[derive(Clone)]
pub struct HostFunction {
    name: Arc<str>,
    call: Arc<NativeFn>,
}

impl HostFunction {
    pub fn new<F>(name: &str, call: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, String> + Send + Sync + 'static,
    {
        HostFunction {
            name: Arc::from(name),
            call: Arc::new(call),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, String> {
        (self.call)(args)
    }
}

impl fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<function {}>", self.name)
    }
}

impl PartialEq for HostFunction {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.call, &other.call)
    }
}

/// A template value.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Arc<str>),
    List(Arc<Vec<Value>>),
    Map(Arc<ValueMap>),
    Function(HostFunction),
}

impl Value {
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Value::String(s.into())
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Arc::new(items))
    }

    pub fn map(map: ValueMap) -> Self {
        Value::Map(Arc::new(map))
    }

    pub fn function<F>(name: &str, call: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, String> + Send + Sync + 'static,
    {
        Value::Function(HostFunction::new(name, call))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Function(_) => "function",
        }
    }

    /// Truthiness used by conditions and logical operators.
    ///
    /// `undefined`, `null`, `false`, `0`, `NaN` and `""` are false;
    /// everything else, including empty lists and maps, is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::List(_) | Value::Map(_) | Value::Function(_) => true,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric coercion for arithmetic and comparisons.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(f64::NAN)
                }
            }
            Value::Undefined | Value::List(_) | Value::Map(_) | Value::Function(_) => f64::NAN,
        }
    }

    /// Property access: `value.name`.
    ///
    /// Missing properties are [`Value::Undefined`], never an error.
    pub fn member(&self, name: &str) -> Value {
        match self {
            Value::Map(map) => map.get(name).cloned().unwrap_or_default(),
            Value::List(items) if name == "length" => Value::from(items.len()),
            Value::String(s) if name == "length" => Value::from(s.chars().count()),
            Value::List(_) | Value::String(_) => match name.parse::<usize>() {
                Ok(index) => self.at(index),
                Err(_) => Value::Undefined,
            },
            _ => Value::Undefined,
        }
    }

    /// Computed access: `value[key]`.
    pub fn index(&self, key: &Value) -> Value {
        match key {
            Value::Number(n) if n.fract() == 0.0 && *n >= 0.0 => {
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    reason = "checked non-negative integral above"
                )]
                let index = *n as usize;
                self.at(index)
            }
            other => self.member(&other.to_string()),
        }
    }

    fn at(&self, index: usize) -> Value {
        match self {
            Value::List(items) => items.get(index).cloned().unwrap_or_default(),
            Value::String(s) => s
                .chars()
                .nth(index)
                .map_or(Value::Undefined, |c| Value::string(c.to_string())),
            _ => Value::Undefined,
        }
    }

    /// Key/value pairs visited by a `for` loop.
    ///
    /// Lists yield `(index, item)`, maps yield `(key, value)` in insertion
    /// order and strings yield `(index, character)`. Scalars and null have
    /// no entries. `None` means the value cannot be iterated at all.
    pub fn entries(&self) -> Option<Vec<(Value, Value)>> {
        match self {
            Value::Undefined => None,
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::Function(_) => {
                Some(Vec::new())
            }
            Value::List(items) => Some(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| (Value::from(i), item.clone()))
                    .collect(),
            ),
            Value::Map(map) => Some(
                map.iter()
                    .map(|(k, v)| (Value::string(k), v.clone()))
                    .collect(),
            ),
            Value::String(s) => Some(
                s.chars()
                    .enumerate()
                    .map(|(i, c)| (Value::from(i), Value::string(c.to_string())))
                    .collect(),
            ),
        }
    }

    /// `===`: same type and same value; heap values compare by identity.
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => Arc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Arc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => a == b,
            _ => false,
        }
    }

    /// `==`: like [`strict_equals`](Self::strict_equals) with coercion
    /// between scalars, and `null == undefined`.
    pub fn loose_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
            (Value::Undefined | Value::Null, _) | (_, Value::Undefined | Value::Null) => false,
            (Value::Number(_) | Value::Bool(_), Value::String(_) | Value::Bool(_))
            | (Value::String(_) | Value::Bool(_), Value::Number(_) | Value::Bool(_)) => {
                self.to_number() == other.to_number()
            }
            _ => self.strict_equals(other),
        }
    }
}

/// Text form of a number: integral values without a fraction, very large and
/// very small magnitudes in exponent form with an explicit sign.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_owned();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_owned();
    }
    if n == 0.0 {
        return "0".to_owned();
    }
    let magnitude = n.abs();
    if !(1e-6..1e21).contains(&magnitude) {
        return exponent_with_sign(&format!("{n:e}"));
    }
    format!("{n}")
}

/// Rewrite `1.5e3` as `1.5e+3`; negative exponents are left alone.
fn exponent_with_sign(text: &str) -> String {
    match text.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => text.to_owned(),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => f.write_str(&number_to_string(*n)),
            Value::String(s) => f.write_str(s),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    if !matches!(item, Value::Undefined | Value::Null) {
                        write!(f, "{item}")?;
                    }
                }
                Ok(())
            }
            Value::Map(_) => f.write_str("[object Object]"),
            Value::Function(func) => write!(f, "function {}() {{ [native code] }}", func.name()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    #[allow(clippy::cast_precision_loss, reason = "template numbers are f64")]
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    #[allow(clippy::cast_precision_loss, reason = "template numbers are f64")]
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list(items)
    }
}

impl From<ValueMap> for Value {
    fn from(map: ValueMap) -> Self {
        Value::map(map)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::string(s),
            serde_json::Value::Array(items) => {
                Value::list(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(fields) => Value::map(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Largest integer an `f64` represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Undefined | Value::Null | Value::Function(_) => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER => {
                #[allow(clippy::cast_possible_truncation, reason = "integral and in range")]
                let int = *n as i64;
                serializer.serialize_i64(int)
            }
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::String(s) => serializer.serialize_str(s),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items.iter() {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map.iter() {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
        }
    }
}
