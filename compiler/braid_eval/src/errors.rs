//! Template errors and their constructors.
//!
//! Every failure the evaluator can report is a [`TemplateError`]. Construct
//! them through the `#[cold]` factory functions below so messages stay in
//! one place.
//!
//! # Macro failures
//!
//! When a macro fails, the failure is wrapped in [`TemplateError::MacroFailed`]
//! carrying the macro name, its parameters and a JSON snapshot of the scope
//! at the moment of failure. Nested macros wrap again, so the outermost
//! error reads like a stack. [`TemplateError::root_cause`] walks to the
//! innermost failure.

use std::io;
use std::time::Duration;

use braid_scan::ScanError;
use thiserror::Error;

use crate::Scope;

/// Failure while compiling or rendering a template.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The template text could not be scanned.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// A formatter name in a `=` chain is not registered.
    #[error("Template error: formatter {name} is missing.")]
    MissingFormatter { name: String },

    /// An expression referenced a value that is not in scope.
    #[error("Template error: literal {expression} is missing ({detail}).")]
    MissingValue { expression: String, detail: String },

    /// An expression could not be parsed.
    #[error("Template error: invalid expression {expression:?}: {message}")]
    InvalidExpression { expression: String, message: String },

    /// A formatter rejected its input or parameters.
    #[error("Template error: formatter {name} failed: {message}")]
    FormatterFailed { name: String, message: String },

    /// A macro was called with parameters it cannot make sense of.
    #[error("Template error: macro {name:?} is malformed: {message}")]
    MalformedMacro { name: String, message: String },

    /// A macro failed; `source` is the underlying error.
    #[error(
        "Template error: macro {name:?} didn't work.\nParameters: {params:?}\nLiteral: {scope}\nMessage: {source}"
    )]
    MacroFailed {
        name: String,
        params: Vec<String>,
        /// JSON rendering of the scope when the macro failed.
        scope: String,
        source: Box<TemplateError>,
    },

    /// Nested renders went deeper than the interpreter allows.
    #[error("Template error: templates nested deeper than {depth} levels")]
    RecursionLimit { depth: usize },

    /// Sandboxed execution ran past its wall-clock budget.
    #[error("Template error: execution timed out after {budget:?}")]
    Timeout { budget: Duration },

    /// Sandboxed execution ran past its step budget.
    #[error("Template error: execution exceeded {limit} steps")]
    StepLimit { limit: u64 },

    /// The sandbox worker died without reporting a result.
    #[error("Template error: sandbox fault: {message}")]
    SandboxFault { message: String },

    /// The output sink or the template input failed.
    #[error("Template error: I/O failure: {0}")]
    Io(#[from] io::Error),
}

impl TemplateError {
    /// Innermost error beneath any chain of macro failures.
    pub fn root_cause(&self) -> &TemplateError {
        let mut current = self;
        while let TemplateError::MacroFailed { source, .. } = current {
            current = source;
        }
        current
    }

    /// Names of the macros that wrap this error, outermost first.
    pub fn macro_trace(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let mut current = self;
        while let TemplateError::MacroFailed { name, source, .. } = current {
            names.push(name.as_str());
            current = source;
        }
        names
    }

    /// Whether the error came from a sandbox budget rather than the template.
    pub fn is_budget_exhausted(&self) -> bool {
        matches!(
            self.root_cause(),
            TemplateError::Timeout { .. } | TemplateError::StepLimit { .. }
        )
    }
}

// Constructors

/// A formatter in a `=` chain is not registered.
#[cold]
pub fn missing_formatter(name: &str) -> TemplateError {
    TemplateError::MissingFormatter {
        name: name.to_owned(),
    }
}

/// An expression referenced something that is not in scope.
#[cold]
pub fn missing_value(expression: &str, detail: impl Into<String>) -> TemplateError {
    TemplateError::MissingValue {
        expression: expression.to_owned(),
        detail: detail.into(),
    }
}

/// An expression failed to parse.
#[cold]
pub fn invalid_expression(expression: &str, message: impl Into<String>) -> TemplateError {
    TemplateError::InvalidExpression {
        expression: expression.to_owned(),
        message: message.into(),
    }
}

/// A formatter returned an error.
#[cold]
pub fn formatter_failed(name: &str, message: impl Into<String>) -> TemplateError {
    TemplateError::FormatterFailed {
        name: name.to_owned(),
        message: message.into(),
    }
}

/// A built-in macro received parameters it cannot use.
#[cold]
pub fn malformed_macro(name: &str, message: impl Into<String>) -> TemplateError {
    TemplateError::MalformedMacro {
        name: name.to_owned(),
        message: message.into(),
    }
}

/// Wrap `source` as the failure of macro `name`.
#[cold]
pub fn macro_failed<S: AsRef<str>>(
    name: &str,
    params: &[S],
    scope: &Scope,
    source: TemplateError,
) -> TemplateError {
    TemplateError::MacroFailed {
        name: name.to_owned(),
        params: params.iter().map(|p| p.as_ref().to_owned()).collect(),
        scope: scope.snapshot(),
        source: Box::new(source),
    }
}

/// Nesting limit reached.
#[cold]
pub fn recursion_limit(depth: usize) -> TemplateError {
    TemplateError::RecursionLimit { depth }
}

/// Wall-clock budget exhausted.
#[cold]
pub fn timeout(budget: Duration) -> TemplateError {
    TemplateError::Timeout { budget }
}

/// Step budget exhausted.
#[cold]
pub fn step_limit(limit: u64) -> TemplateError {
    TemplateError::StepLimit { limit }
}

/// Sandbox worker failure.
#[cold]
pub fn sandbox_fault(message: impl Into<String>) -> TemplateError {
    TemplateError::SandboxFault {
        message: message.into(),
    }
}
