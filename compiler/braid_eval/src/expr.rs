//! Template expressions.
//!
//! The `=`, `if` and `for` macros evaluate expressions against the scope.
//! The language is a small JavaScript-like subset:
//!
//! - literals: numbers, `'strings'`, `"strings"`, `true`, `false`, `null`,
//!   `undefined`, `[lists]`
//! - names, `.property`, `[index]`
//! - calls to host functions bound in the scope, plus `toUpperCase`,
//!   `toLowerCase`, `trim`, `indexOf`, `includes`, `join` and `toString` on
//!   lists and strings
//! - `!`, unary `-`/`+`, `* / %`, `+ -`, `< <= > >=`,
//!   `== != === !==`, `&&`, `||`, `?:`
//!
//! A bare name skips the parser entirely. An unbound name is a
//! [`TemplateError::MissingValue`] naming the whole expression.

mod eval;
mod lexer;
mod parser;

use tracing::trace;

pub use parser::{BinaryOp, Expr, UnaryOp};

use crate::errors::{invalid_expression, missing_value, TemplateError};
use crate::value::Value;
use crate::Scope;
use eval::Fault;

/// A parsed expression together with its source text.
#[derive(Clone, Debug, PartialEq)]
pub struct Expression {
    source: Box<str>,
    ast: Expr,
}

impl Expression {
    /// Parse `source`.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let source = source.trim();
        let ast = if is_identifier(source) {
            Expr::Ident(source.into())
        } else {
            let tokens = lexer::lex(source).map_err(|msg| invalid_expression(source, msg))?;
            parser::parse(&tokens).map_err(|msg| invalid_expression(source, msg))?
        };
        Ok(Expression {
            source: source.into(),
            ast,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &Expr {
        &self.ast
    }

    /// Evaluate against `scope`.
    pub fn eval(&self, scope: &Scope) -> Result<Value, TemplateError> {
        let result = match &self.ast {
            Expr::Ident(name) => eval::lookup(name, scope),
            ast => eval::eval(ast, scope),
        };
        result.map_err(|fault| self.fault_to_error(fault))
    }

    /// Evaluate as a condition: a missing value counts as false.
    pub fn test(&self, scope: &Scope) -> Result<bool, TemplateError> {
        match self.eval(scope) {
            Ok(value) => Ok(value.is_truthy()),
            Err(TemplateError::MissingValue { expression, detail }) => {
                trace!(%expression, %detail, "condition treats missing value as false");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    #[cold]
    fn fault_to_error(&self, fault: Fault) -> TemplateError {
        match fault {
            Fault::Unbound(name) => missing_value(&self.source, format!("{name} is not defined")),
            Fault::NoProperty { property, on } => {
                missing_value(&self.source, format!("cannot read {property} of {on}"))
            }
            Fault::NotCallable(name) => {
                invalid_expression(&self.source, format!("{name} is not a function"))
            }
            Fault::Host { name, message } => {
                invalid_expression(&self.source, format!("{name}() failed: {message}"))
            }
        }
    }
}

/// Parse and evaluate `source` in one step.
///
/// Bare names are looked up directly without building a tree.
pub fn evaluate(source: &str, scope: &Scope) -> Result<Value, TemplateError> {
    let trimmed = source.trim();
    if is_identifier(trimmed) {
        return eval::lookup(trimmed, scope)
            .map_err(|_| missing_value(trimmed, format!("{trimmed} is not defined")));
    }
    Expression::parse(trimmed)?.eval(scope)
}

/// Returns `true` for a name that is not a literal keyword.
pub fn is_identifier(source: &str) -> bool {
    let bytes = source.as_bytes();
    match bytes.split_first() {
        Some((&first, rest)) => {
            lexer::is_ident_start(first)
                && rest.iter().all(|&b| lexer::is_ident_continue(b))
                && !matches!(source, "true" | "false" | "null" | "undefined")
        }
        None => false,
    }
}
