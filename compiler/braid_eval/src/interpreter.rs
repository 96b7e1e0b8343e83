//! Direct interpretation.
//!
//! The interpreter walks the template depth-first: literal text is written
//! as soon as it is scanned, each control zone is tokenized and dispatched
//! to its macro, and macros that own a body (`if`, `for`, template macros)
//! render it by recursing into [`Interpreter::render`]. Nothing is cached
//! between renders; see [`Compiler`](crate::Compiler) for the reusable form.
//!
//! The interpreter is also the API surface host macros see: it exposes the
//! scope, the sink, the expression evaluator and recursive rendering.

mod builtins;

use std::sync::Arc;

use braid_scan::{scan_from, tokenize, unescape_span, ControlZone, Syntax};
use tracing::debug;

use crate::budget::Budget;
use crate::errors::{macro_failed, recursion_limit, TemplateError};
use crate::expr;
use crate::macros::{Builtin, MacroEntry};
use crate::stack::ensure_sufficient_stack;
use crate::value::Value;
use crate::{Context, Scope, Sink};

/// Deepest nesting of renders (template macros calling template macros).
pub const MAX_DEPTH: usize = 256;

/// Renders template text into a sink.
pub struct Interpreter<'a> {
    context: &'a Context,
    scope: &'a mut Scope,
    sink: &'a mut dyn Sink,
    budget: Budget,
    depth: usize,
}

impl<'a> Interpreter<'a> {
    pub fn new(context: &'a Context, scope: &'a mut Scope, sink: &'a mut dyn Sink) -> Self {
        Interpreter {
            context,
            scope,
            sink,
            budget: Budget::unlimited(),
            depth: 0,
        }
    }

    /// Run under `budget` instead of without limits.
    #[must_use]
    pub fn with_budget(mut self, budget: Budget) -> Self {
        self.budget = budget;
        self
    }

    /// Give back the budget, with the steps this interpreter spent.
    pub fn into_budget(self) -> Budget {
        self.budget
    }

    pub fn context(&self) -> &Context {
        self.context
    }

    pub fn scope(&self) -> &Scope {
        self.scope
    }

    pub fn scope_mut(&mut self) -> &mut Scope {
        self.scope
    }

    /// Write `chunk` to the sink. Empty chunks are dropped.
    #[inline]
    pub fn write(&mut self, chunk: &str) -> Result<(), TemplateError> {
        if chunk.is_empty() {
            return Ok(());
        }
        self.sink.write(chunk).map_err(TemplateError::from)
    }

    /// Evaluate `expression` against the current scope.
    pub fn evaluate(&self, expression: &str) -> Result<Value, TemplateError> {
        expr::evaluate(expression, self.scope)
    }

    /// Render `text` with the current scope and sink.
    #[tracing::instrument(level = "trace", skip_all, fields(len = text.len(), depth = self.depth))]
    pub fn render(&mut self, text: &str) -> Result<(), TemplateError> {
        if self.depth >= MAX_DEPTH {
            return Err(recursion_limit(MAX_DEPTH));
        }
        self.depth += 1;
        let result = ensure_sufficient_stack(|| self.render_zones(text));
        self.depth -= 1;
        result
    }

    fn render_zones(&mut self, text: &str) -> Result<(), TemplateError> {
        let syntax = Arc::clone(self.context.syntax());
        let mut cursor = 0;
        loop {
            let state = scan_from(text, cursor, &syntax)?;
            let Some(zone) = state.zone else {
                let tail = unescape_span(text, cursor..text.len(), &state.escapes, &syntax);
                return self.write(&tail);
            };
            let literal = unescape_span(text, cursor..zone.start, &state.escapes, &syntax);
            self.write(&literal)?;
            self.expand(text, &zone, &syntax)?;
            cursor = zone.end;
        }
    }

    /// Dispatch one control zone to its macro.
    fn expand(&mut self, text: &str, zone: &ControlZone, syntax: &Syntax) -> Result<(), TemplateError> {
        self.budget.tick()?;
        let tokens = tokenize(&text[zone.inner(syntax)], syntax)?;
        let entry = tokens
            .first()
            .and_then(|name| self.context.macros().read().get(name));
        let (Some(entry), Some((name, params))) = (entry, tokens.split_first()) else {
            debug!(
                name = tokens.first().copied().unwrap_or_default(),
                "unknown macro, writing zone verbatim"
            );
            let literal = unescape_span(text, zone.span(), &zone.inner_escapes, syntax);
            return self.write(&literal);
        };

        let result = match entry {
            MacroEntry::Builtin(builtin) => self.builtin(builtin, params),
            MacroEntry::Custom(handler) => handler.expand(self, params),
        };
        result.map_err(|source| macro_failed(name, params, self.scope, source))
    }

    fn builtin(&mut self, builtin: Builtin, params: &[&str]) -> Result<(), TemplateError> {
        match builtin {
            Builtin::Passthrough => self.write(&params.concat()),
            Builtin::Substitute => self.substitute(params),
            Builtin::If => self.branch(params),
            Builtin::For => self.iterate(params),
            Builtin::Comment => Ok(()),
            Builtin::Define => self.define(params),
        }
    }
}
