//! Braid - a text-template compiler.
//!
//! Templates are plain text with control zones (`{{ ... }}` by default). The
//! first token of a zone names a macro; everything outside zones is copied
//! through unchanged.
//!
//! ```text
//! Hello {{= user.name in html}}!
//! {{for i, item in items {{{{= i}}: {{= item in {{json 2}}}}}}}}
//! {{if admin then {{<admin>}} else {{<guest>}}}}
//! ```
//!
//! # Architecture
//!
//! ```text
//! braid_scan   zones, tokens, escapes
//!     │
//!     ▼
//! braid_eval   scope, expressions, macros, formatters,
//!     │        interpreter, compiler + VM, sandbox
//!     ▼
//! braid        Engine, EngineBuilder, streaming `format`
//! ```
//!
//! Start with [`Engine::builder`].

mod engine;
mod stream;

use std::sync::Once;

pub use engine::{Engine, EngineBuilder, RenderMode};

pub use braid_eval::{
    errors, expr, formatters, number_to_string, BufferSink, Budget, Builtin, Compiler, Context,
    Expression, FnSink, Formatter, FormatterRegistry, HostFunction, Interpreter, Macro,
    MacroEntry, MacroRegistry, NullSink, Procedure, Sandbox, Scope, Sink, TemplateError,
    TemplateMacro, Value, ValueMap, WriterSink, DEFAULT_TIMEOUT, MAX_DEPTH,
};
pub use braid_scan::{ScanError, SourceBuffer, Syntax};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing output.
///
/// Safe to call more than once. Does nothing unless `RUST_LOG` is set, e.g.
/// `RUST_LOG=braid_eval=debug` or `RUST_LOG=braid_eval=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            // Another subscriber may already be installed by the host.
            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .try_init();
        }
    });
}
