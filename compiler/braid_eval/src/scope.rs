//! Variable scope for template rendering.
//!
//! A template sees a single flat mapping from names to values. There is no
//! scope stack: `for` bindings and macro parameters are written into the
//! same mapping and stay visible after the construct that introduced them.
//! Bindings iterate in insertion order.

use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::value::{Value, ValueMap};

/// Names visible to expressions.
#[derive(Clone, Default, PartialEq)]
pub struct Scope {
    vars: ValueMap,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a scope from the fields of a JSON object.
    ///
    /// Returns `None` when `json` is not an object.
    pub fn from_json(json: serde_json::Value) -> Option<Self> {
        match json {
            serde_json::Value::Object(fields) => Some(Scope::from(fields)),
            _ => None,
        }
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Bind `name`, replacing any previous value.
    #[inline]
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.vars.insert(name, value.into())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.vars.remove(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.vars.iter()
    }

    /// JSON text of the current bindings, used in error reports.
    pub fn snapshot(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|err| format!("<unprintable scope: {err}>"))
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.vars.iter()).finish()
    }
}

impl Serialize for Scope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.vars.len()))?;
        for (name, value) in self.vars.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl From<ValueMap> for Scope {
    fn from(vars: ValueMap) -> Self {
        Scope { vars }
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for Scope {
    fn from(fields: serde_json::Map<String, serde_json::Value>) -> Self {
        fields
            .into_iter()
            .map(|(name, value)| (name, Value::from(value)))
            .collect()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Scope {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Scope {
            vars: iter.into_iter().collect(),
        }
    }
}
