//! Formatter pipeline.
//!
//! A `=` substitution pipes its value through a chain of formatters written
//! after the expression: `{{= data in html}}`, `{{= n in {{float 2}} in plain}}`.
//! Tokens equal to `in` are separators; every other token is split on
//! whitespace into a formatter name and its parameters.
//!
//! Formatters are pure `(value, params) -> value` transforms looked up by
//! name in a [`FormatterRegistry`]. The built-ins live in [`builtins`].

pub mod builtins;

use std::fmt;
use std::sync::Arc;

use braid_scan::is_zone_whitespace;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::errors::{formatter_failed, missing_formatter, TemplateError};
use crate::value::Value;

/// A named value transform.
pub trait Formatter: Send + Sync {
    fn format(&self, value: &Value, params: &[&str]) -> Result<Value, String>;
}

impl<F> Formatter for F
where
    F: Fn(&Value, &[&str]) -> Result<Value, String> + Send + Sync,
{
    fn format(&self, value: &Value, params: &[&str]) -> Result<Value, String> {
        self(value, params)
    }
}

/// Name → formatter table.
#[derive(Clone)]
pub struct FormatterRegistry {
    entries: FxHashMap<String, Arc<dyn Formatter>>,
}

impl FormatterRegistry {
    /// Registry holding the built-in formatters.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        builtins::register_all(&mut registry);
        registry
    }

    /// Registry with no formatters at all.
    pub fn empty() -> Self {
        FormatterRegistry {
            entries: FxHashMap::default(),
        }
    }

    /// Register `formatter` under `name`, replacing any previous one.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        formatter: impl Formatter + 'static,
    ) -> Option<Arc<dyn Formatter>> {
        self.register_shared(name, Arc::new(formatter))
    }

    pub fn register_shared(
        &mut self,
        name: impl Into<String>,
        formatter: Arc<dyn Formatter>,
    ) -> Option<Arc<dyn Formatter>> {
        self.entries.insert(name.into(), formatter)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Formatter>> {
        self.entries.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn Formatter>> {
        self.entries.remove(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Look up every formatter in `chain`.
    pub fn resolve(&self, chain: &[FormatterCall<'_>]) -> Result<Vec<Arc<dyn Formatter>>, TemplateError> {
        chain
            .iter()
            .map(|call| self.get(call.name).ok_or_else(|| missing_formatter(call.name)))
            .collect()
    }
}

impl Default for FormatterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FormatterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatterRegistry")
            .field("names", &self.names())
            .finish()
    }
}

/// One formatter application parsed from a `=` chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormatterCall<'a> {
    pub name: &'a str,
    pub params: SmallVec<[&'a str; 2]>,
}

/// Parse the tokens following a `=` expression into formatter calls.
pub fn parse_chain<'a>(tokens: &[&'a str]) -> SmallVec<[FormatterCall<'a>; 2]> {
    tokens
        .iter()
        .copied()
        .filter(|token| *token != "in")
        .filter_map(|token| {
            let mut words = token.split(is_zone_whitespace).filter(|w| !w.is_empty());
            let name = words.next()?;
            Some(FormatterCall {
                name,
                params: words.collect(),
            })
        })
        .collect()
}

/// Apply resolved `formatters` to `value` left to right.
///
/// `formatters[i]` is the implementation of `chain[i]`.
pub fn apply_resolved(
    value: Value,
    chain: &[FormatterCall<'_>],
    formatters: &[Arc<dyn Formatter>],
) -> Result<Value, TemplateError> {
    chain
        .iter()
        .zip(formatters)
        .try_fold(value, |value, (call, formatter)| {
            formatter
                .format(&value, &call.params)
                .map_err(|message| formatter_failed(call.name, message))
        })
}

/// Resolve `chain` in `registry` and apply it to `value`.
pub fn apply(
    registry: &FormatterRegistry,
    value: Value,
    chain: &[FormatterCall<'_>],
) -> Result<Value, TemplateError> {
    let formatters = registry.resolve(chain)?;
    apply_resolved(value, chain, &formatters)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests;
