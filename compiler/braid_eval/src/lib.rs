//! Braid Eval - macro evaluation, formatting and compilation for braid templates.
//!
//! Scanning lives in `braid_scan`; this crate gives control zones meaning.
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────── Context ────────────┐
//!                 │ Syntax · MacroRegistry ·        │
//!                 │ FormatterRegistry (shared)      │
//!                 └───────────────┬─────────────────┘
//!                                 │
//!   text ──► Interpreter::render ─┼──────────────────────► Sink
//!                                 │
//!   text ──► Compiler::compile ──► Procedure ──► Vm ─────► Sink
//!                                      │
//!                                      └──► Sandbox (worker thread + timeout)
//! ```
//!
//! Both strategies share the expression evaluator ([`expr`]), the formatter
//! pipeline ([`formatters`]) and the `if`/`for` parameter parsers, and both
//! report failures as nested [`TemplateError::MacroFailed`] values carrying
//! the macro name, its parameters and a snapshot of the scope.

mod budget;
mod compile;
mod context;
pub mod errors;
pub mod expr;
pub mod formatters;
mod interpreter;
mod macros;
mod sandbox;
mod scope;
mod shared;
mod sink;
mod stack;
mod value;

pub use budget::Budget;
pub use compile::{Compiler, Procedure};
pub use context::Context;
pub use errors::TemplateError;
pub use expr::Expression;
pub use formatters::{Formatter, FormatterCall, FormatterRegistry};
pub use interpreter::{Interpreter, MAX_DEPTH};
pub use macros::{Builtin, Macro, MacroEntry, MacroRegistry, TemplateMacro};
pub use sandbox::{Sandbox, DEFAULT_TIMEOUT};
pub use scope::Scope;
pub use shared::SharedMutableRegistry;
pub use sink::{BufferSink, FnSink, NullSink, Sink, WriterSink};
pub use value::{number_to_string, HostFunction, NativeFn, Value, ValueMap};

pub use braid_scan::Syntax;
