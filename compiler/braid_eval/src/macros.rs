//! Macro registry.
//!
//! The first token of a control zone names a macro. Built-in macros are
//! handled by the interpreter and the compiler directly; everything else is
//! a [`Macro`] implementation: host macros registered by the embedding
//! program, and [`TemplateMacro`]s installed by `{{! name body}}`.
//!
//! | Name | Built-in |
//! |---|---|
//! | `""` | passthrough: the zone body is written verbatim |
//! | `=` | substitution through formatters |
//! | `if` | conditional chain |
//! | `for` | iteration |
//! | `#` | comment |
//! | `!` | macro definition |
//!
//! The registry is shared and mutable; registering a name again replaces
//! the previous entry.

mod forms;

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

pub use forms::{parse_for, parse_if, ForLoop, IfChain};

use crate::errors::TemplateError;
use crate::interpreter::Interpreter;
use crate::value::Value;

/// A macro implemented by the host program.
///
/// `params` are the zone's tokens after the macro name; nested zones arrive
/// as single raw tokens and can be rendered with [`Interpreter::render`].
pub trait Macro: Send + Sync {
    fn expand(&self, cx: &mut Interpreter<'_>, params: &[&str]) -> Result<(), TemplateError>;
}

impl<F> Macro for F
where
    F: Fn(&mut Interpreter<'_>, &[&str]) -> Result<(), TemplateError> + Send + Sync,
{
    fn expand(&self, cx: &mut Interpreter<'_>, params: &[&str]) -> Result<(), TemplateError> {
        self(cx, params)
    }
}

/// Macros understood natively by both execution strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Builtin {
    Passthrough,
    Substitute,
    If,
    For,
    Comment,
    Define,
}

impl Builtin {
    pub const ALL: [Builtin; 6] = [
        Builtin::Passthrough,
        Builtin::Substitute,
        Builtin::If,
        Builtin::For,
        Builtin::Comment,
        Builtin::Define,
    ];

    /// Name the macro is registered under by default.
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Passthrough => "",
            Builtin::Substitute => "=",
            Builtin::If => "if",
            Builtin::For => "for",
            Builtin::Comment => "#",
            Builtin::Define => "!",
        }
    }
}

/// Registry entry.
#[derive(Clone)]
pub enum MacroEntry {
    Builtin(Builtin),
    Custom(Arc<dyn Macro>),
}

impl fmt::Debug for MacroEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacroEntry::Builtin(builtin) => write!(f, "Builtin({builtin:?})"),
            MacroEntry::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// A macro whose body is template text, defined with `{{! name body}}`.
///
/// Invoking it binds `params` (the invocation's tokens, as a list of
/// strings) in the scope and renders the body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateMacro {
    body: String,
}

impl TemplateMacro {
    pub fn new(body: impl Into<String>) -> Self {
        TemplateMacro { body: body.into() }
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

impl Macro for TemplateMacro {
    fn expand(&self, cx: &mut Interpreter<'_>, params: &[&str]) -> Result<(), TemplateError> {
        let params = params.iter().map(|p| Value::from(*p)).collect();
        cx.scope_mut().set("params", Value::list(params));
        cx.render(&self.body)
    }
}

/// Name → macro table.
#[derive(Clone)]
pub struct MacroRegistry {
    entries: FxHashMap<String, MacroEntry>,
}

impl MacroRegistry {
    /// Registry holding the built-ins under their usual names.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for builtin in Builtin::ALL {
            registry.alias(builtin.name(), builtin);
        }
        registry
    }

    pub fn empty() -> Self {
        MacroRegistry {
            entries: FxHashMap::default(),
        }
    }

    pub fn get(&self, name: &str) -> Option<MacroEntry> {
        self.entries.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Register a host macro under `name`.
    pub fn register(&mut self, name: impl Into<String>, handler: impl Macro + 'static) {
        self.register_shared(name, Arc::new(handler));
    }

    pub fn register_shared(&mut self, name: impl Into<String>, handler: Arc<dyn Macro>) {
        self.entries.insert(name.into(), MacroEntry::Custom(handler));
    }

    /// Install a template macro, as `{{! name body}}` does.
    pub fn define_template(&mut self, name: impl Into<String>, body: impl Into<String>) {
        self.register(name, TemplateMacro::new(body));
    }

    /// Make a built-in available under `name`.
    pub fn alias(&mut self, name: impl Into<String>, builtin: Builtin) {
        self.entries.insert(name.into(), MacroEntry::Builtin(builtin));
    }

    pub fn remove(&mut self, name: &str) -> Option<MacroEntry> {
        self.entries.remove(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for MacroRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MacroRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MacroRegistry")
            .field("names", &self.names())
            .finish()
    }
}
