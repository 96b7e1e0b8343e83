//! Built-in macros under direct interpretation.

use tracing::debug;

use super::Interpreter;
use crate::errors::{malformed_macro, missing_value, TemplateError};
use crate::expr::{self, Expression};
use crate::formatters::{self, parse_chain};
use crate::macros::{parse_for, parse_if, TemplateMacro};

impl Interpreter<'_> {
    /// `{{= expression [in formatter [params]]...}}`
    pub(super) fn substitute(&mut self, params: &[&str]) -> Result<(), TemplateError> {
        let Some((expression, rest)) = params.split_first() else {
            return Err(malformed_macro("=", "expected an expression"));
        };
        let value = expr::evaluate(expression, self.scope)?;
        let chain = parse_chain(rest);
        let resolved = self.context.formatters().read().resolve(&chain)?;
        let value = formatters::apply_resolved(value, &chain, &resolved)?;
        self.write(&value.to_string())
    }

    /// `{{if cond then body [else if cond then body]... [else body]}}`
    pub(super) fn branch(&mut self, params: &[&str]) -> Result<(), TemplateError> {
        let chain = parse_if(params)?;
        for (condition, body) in &chain.arms {
            if Expression::parse(condition)?.test(self.scope)? {
                return self.render(body);
            }
        }
        match chain.otherwise {
            Some(body) => self.render(body),
            None => Ok(()),
        }
    }

    /// `{{for [key,] value in iterable body}}`
    pub(super) fn iterate(&mut self, params: &[&str]) -> Result<(), TemplateError> {
        let form = parse_for(params)?;
        let iterable = expr::evaluate(form.iterable, self.scope)?;
        let Some(entries) = iterable.entries() else {
            return Err(missing_value(form.iterable, "iterable is undefined"));
        };
        for (key, value) in entries {
            self.budget.tick()?;
            if let Some(key_name) = form.key {
                self.scope.set(key_name, key);
            }
            self.scope.set(form.value, value);
            self.render(form.body)?;
        }
        Ok(())
    }

    /// `{{! name body}}`
    pub(super) fn define(&mut self, params: &[&str]) -> Result<(), TemplateError> {
        let [name, body] = params else {
            return Err(malformed_macro("!", "expected `<name> <body>`"));
        };
        debug!(name, "defining template macro");
        self.context
            .macros()
            .write()
            .register(*name, TemplateMacro::new(*body));
        Ok(())
    }
}
