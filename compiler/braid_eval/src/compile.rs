//! Template compilation.
//!
//! [`Compiler`] scans a template once and lowers it to a flat bytecode
//! [`Procedure`]: literal text becomes `Text` ops, `=` becomes a
//! `Substitute` op with its expression parsed and its formatters resolved,
//! `if` and `for` become conditional jumps and loop ops around their lowered
//! bodies, and registered host macros become `Invoke` ops.
//!
//! ```text
//! "Hi {{for x in xs {{{{= x}} }}}}"
//!
//!    0  text "Hi "
//!    1  iter_start "xs"
//!    2  iter_next x exit -> 6
//!    3  substitute "x"
//!    4  text " "
//!    5  jump -> 2
//! ```
//!
//! A procedure is immutable and `Send + Sync`: it can be rendered any number
//! of times, from any thread, each time with its own scope and sink.
//!
//! Macros defined at runtime with `!` are an interpreter feature. A compiled
//! template writes `!` zones and unknown macros back out literally.

mod ir;
mod vm;

use std::fmt;
use std::sync::Arc;

use braid_scan::{scan_from, tokenize, unescape_span, ControlZone, Syntax};
use tracing::debug;

use crate::budget::Budget;
use crate::errors::{macro_failed, malformed_macro, TemplateError};
use crate::expr::Expression;
use crate::formatters::parse_chain;
use crate::macros::{parse_for, parse_if, Builtin, Macro, MacroEntry};
use crate::stack::ensure_sufficient_stack;
use crate::{Context, Scope, Sink};
use ir::{ChainStep, Op, Program, Site, SiteId, UNPATCHED};

/// Lowers template text to a [`Procedure`].
pub struct Compiler<'c> {
    context: &'c Context,
    syntax: Arc<Syntax>,
    program: Program,
}

impl<'c> Compiler<'c> {
    pub fn new(context: &'c Context) -> Self {
        Compiler {
            context,
            syntax: Arc::clone(context.syntax()),
            program: Program::default(),
        }
    }

    /// Compile `text`.
    #[tracing::instrument(level = "debug", skip_all, fields(len = text.len()))]
    pub fn compile(mut self, text: &str) -> Result<Procedure, TemplateError> {
        self.lower(text, None)?;
        debug!(ops = self.program.ops.len(), "compiled template");
        Ok(Procedure {
            program: Arc::new(self.program),
            context: self.context.clone(),
        })
    }

    fn lower(&mut self, text: &str, parent: Option<SiteId>) -> Result<(), TemplateError> {
        ensure_sufficient_stack(|| self.lower_zones(text, parent))
    }

    fn lower_zones(&mut self, text: &str, parent: Option<SiteId>) -> Result<(), TemplateError> {
        let syntax = Arc::clone(&self.syntax);
        let mut cursor = 0;
        loop {
            let state = scan_from(text, cursor, &syntax)?;
            let Some(zone) = state.zone else {
                self.emit_text(&unescape_span(text, cursor..text.len(), &state.escapes, &syntax));
                return Ok(());
            };
            self.emit_text(&unescape_span(text, cursor..zone.start, &state.escapes, &syntax));
            self.lower_zone(text, &zone, &syntax, parent)?;
            cursor = zone.end;
        }
    }

    fn lower_zone(
        &mut self,
        text: &str,
        zone: &ControlZone,
        syntax: &Syntax,
        parent: Option<SiteId>,
    ) -> Result<(), TemplateError> {
        let tokens = tokenize(&text[zone.inner(syntax)], syntax)?;
        let entry = tokens
            .first()
            .and_then(|name| self.context.macros().read().get(name));
        let (entry, name, params) = match (entry, tokens.split_first()) {
            (Some(MacroEntry::Builtin(Builtin::Define)), _) | (None, _) | (_, None) => {
                debug!(
                    name = tokens.first().copied().unwrap_or_default(),
                    "macro not compiled, writing zone verbatim"
                );
                self.emit_text(&unescape_span(text, zone.span(), &zone.inner_escapes, syntax));
                return Ok(());
            }
            (Some(entry), Some((name, params))) => (entry, *name, params),
        };

        let site = self.site(name, params, parent);
        let lowered = match entry {
            MacroEntry::Builtin(builtin) => self.lower_builtin(builtin, params, site),
            MacroEntry::Custom(handler) => {
                self.emit_invoke(handler, params, site);
                Ok(())
            }
        };
        // No scope exists yet; report the failure against an empty one.
        lowered.map_err(|source| macro_failed(name, params, &Scope::new(), source))
    }

    fn lower_builtin(
        &mut self,
        builtin: Builtin,
        params: &[&str],
        site: SiteId,
    ) -> Result<(), TemplateError> {
        match builtin {
            Builtin::Passthrough => {
                self.emit_text(&params.concat());
                Ok(())
            }
            Builtin::Substitute => self.lower_substitute(params, site),
            Builtin::If => self.lower_if(params, site),
            Builtin::For => self.lower_for(params, site),
            Builtin::Comment | Builtin::Define => Ok(()),
        }
    }

    fn lower_substitute(&mut self, params: &[&str], site: SiteId) -> Result<(), TemplateError> {
        let Some((expression, rest)) = params.split_first() else {
            return Err(malformed_macro("=", "expected an expression"));
        };
        let expr = Expression::parse(expression)?;
        let formatters = self.context.formatters().read();
        let chain = parse_chain(rest)
            .into_iter()
            .map(|call| ChainStep {
                name: call.name.into(),
                params: call.params.iter().map(|p| (*p).to_owned()).collect(),
                formatter: formatters.get(call.name),
            })
            .collect();
        drop(formatters);
        self.emit(Op::Substitute { expr, chain, site });
        Ok(())
    }

    fn lower_if(&mut self, params: &[&str], site: SiteId) -> Result<(), TemplateError> {
        let chain = parse_if(params)?;
        let mut exits = Vec::with_capacity(chain.arms.len());
        for (condition, body) in &chain.arms {
            let cond = Expression::parse(condition)?;
            let skip = self.emit(Op::JumpUnless {
                cond,
                target: UNPATCHED,
                site,
            });
            self.lower(body, Some(site))?;
            exits.push(self.emit(Op::Jump { target: UNPATCHED }));
            self.patch(skip);
        }
        if let Some(body) = chain.otherwise {
            self.lower(body, Some(site))?;
        }
        for exit in exits {
            self.patch(exit);
        }
        Ok(())
    }

    fn lower_for(&mut self, params: &[&str], site: SiteId) -> Result<(), TemplateError> {
        let form = parse_for(params)?;
        let iterable = Expression::parse(form.iterable)?;
        self.emit(Op::IterStart { iterable, site });
        let head = self.emit(Op::IterNext {
            key: form.key.map(Into::into),
            value: form.value.into(),
            exit: UNPATCHED,
        });
        self.lower(form.body, Some(site))?;
        self.emit(Op::Jump { target: head });
        self.patch(head);
        Ok(())
    }

    fn emit_invoke(&mut self, handler: Arc<dyn Macro>, params: &[&str], site: SiteId) {
        self.emit(Op::Invoke {
            handler,
            params: params.iter().map(|p| (*p).to_owned()).collect(),
            site,
        });
    }

    fn emit_text(&mut self, text: &str) {
        if !text.is_empty() {
            self.emit(Op::Text(text.into()));
        }
    }

    fn emit(&mut self, op: Op) -> usize {
        self.program.ops.push(op);
        self.program.ops.len() - 1
    }

    /// Point the jump at `at` to the next op to be emitted.
    fn patch(&mut self, at: usize) {
        let next = self.program.ops.len();
        match &mut self.program.ops[at] {
            Op::JumpUnless { target, .. } | Op::Jump { target } => *target = next,
            Op::IterNext { exit, .. } => *exit = next,
            _ => {}
        }
    }

    fn site(&mut self, name: &str, params: &[&str], parent: Option<SiteId>) -> SiteId {
        self.program.sites.push(Site {
            name: name.into(),
            params: params.iter().map(|p| (*p).to_owned()).collect(),
            parent,
        });
        self.program.sites.len() - 1
    }
}

/// A compiled template.
///
/// Cloning is cheap; clones share the bytecode.
#[derive(Clone)]
pub struct Procedure {
    program: Arc<Program>,
    context: Context,
}

impl Procedure {
    /// Render into `sink` with `scope`.
    pub fn render(&self, sink: &mut dyn Sink, scope: &mut Scope) -> Result<(), TemplateError> {
        self.render_with_budget(sink, scope, Budget::unlimited())
    }

    /// Render, then report the outcome to `on_done` instead of returning it.
    pub fn render_then<F>(&self, sink: &mut dyn Sink, scope: &mut Scope, on_done: F)
    where
        F: FnOnce(Result<(), TemplateError>),
    {
        on_done(self.render(sink, scope));
    }

    pub fn render_to_string(&self, scope: &mut Scope) -> Result<String, TemplateError> {
        let mut out = String::new();
        self.render(&mut out, scope)?;
        Ok(out)
    }

    /// Render under `budget`.
    #[tracing::instrument(level = "trace", skip_all, fields(ops = self.program.ops.len()))]
    pub fn render_with_budget(
        &self,
        sink: &mut dyn Sink,
        scope: &mut Scope,
        budget: Budget,
    ) -> Result<(), TemplateError> {
        vm::Vm::new(&self.program, &self.context, scope, sink, budget).run()
    }

    /// Number of bytecode ops.
    pub fn len(&self) -> usize {
        self.program.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.program.ops.is_empty()
    }

    /// Human-readable listing of the bytecode.
    pub fn disassemble(&self) -> String {
        format!("{:?}", self.program)
    }
}

impl fmt::Debug for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Procedure")
            .field("ops", &self.program.ops.len())
            .finish_non_exhaustive()
    }
}
