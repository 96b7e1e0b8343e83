//! Bytecode execution.

use std::vec;

use smallvec::SmallVec;

use super::ir::{ChainStep, Op, Program, SiteId};
use crate::budget::Budget;
use crate::errors::{formatter_failed, macro_failed, missing_formatter, missing_value, TemplateError};
use crate::interpreter::Interpreter;
use crate::value::Value;
use crate::{Context, Scope, Sink};

pub(super) struct Vm<'a> {
    program: &'a Program,
    context: &'a Context,
    scope: &'a mut Scope,
    sink: &'a mut dyn Sink,
    budget: Budget,
    /// Remaining entries of each active `for`, innermost last.
    loops: Vec<vec::IntoIter<(Value, Value)>>,
}

impl<'a> Vm<'a> {
    pub(super) fn new(
        program: &'a Program,
        context: &'a Context,
        scope: &'a mut Scope,
        sink: &'a mut dyn Sink,
        budget: Budget,
    ) -> Self {
        Vm {
            program,
            context,
            scope,
            sink,
            budget,
            loops: Vec::new(),
        }
    }

    pub(super) fn run(mut self) -> Result<(), TemplateError> {
        let program = self.program;
        let mut pc = 0;
        while let Some(op) = program.ops.get(pc) {
            self.budget.tick()?;
            pc = match self.step(pc, op) {
                Ok(next) => next,
                Err(err) => return Err(self.blame(op.site(), err)),
            };
        }
        Ok(())
    }

    /// Execute `op` and return the next pc.
    fn step(&mut self, pc: usize, op: &Op) -> Result<usize, TemplateError> {
        match op {
            Op::Text(text) => self.write(text)?,
            Op::Substitute { expr, chain, .. } => {
                let value = format_chain(expr.eval(self.scope)?, chain)?;
                self.write(&value.to_string())?;
            }
            Op::JumpUnless { cond, target, .. } => {
                if !cond.test(self.scope)? {
                    return Ok(*target);
                }
            }
            Op::Jump { target } => return Ok(*target),
            Op::IterStart { iterable, .. } => {
                let Some(entries) = iterable.eval(self.scope)?.entries() else {
                    return Err(missing_value(iterable.source(), "iterable is undefined"));
                };
                self.loops.push(entries.into_iter());
            }
            Op::IterNext { key, value, exit } => {
                let next = self.loops.last_mut().and_then(Iterator::next);
                let Some((k, v)) = next else {
                    self.loops.pop();
                    return Ok(*exit);
                };
                if let Some(key) = key {
                    self.scope.set(&**key, k);
                }
                self.scope.set(&**value, v);
            }
            Op::Invoke { handler, params, .. } => {
                let params: SmallVec<[&str; 4]> = params.iter().map(String::as_str).collect();
                let budget = std::mem::take(&mut self.budget);
                let mut cx =
                    Interpreter::new(self.context, self.scope, self.sink).with_budget(budget);
                let result = handler.expand(&mut cx, &params);
                self.budget = cx.into_budget();
                result?;
            }
        }
        Ok(pc + 1)
    }

    fn write(&mut self, chunk: &str) -> Result<(), TemplateError> {
        if chunk.is_empty() {
            return Ok(());
        }
        self.sink.write(chunk).map_err(TemplateError::from)
    }

    /// Wrap `err` once per macro from `site` out to the template root.
    fn blame(&self, site: Option<SiteId>, mut err: TemplateError) -> TemplateError {
        let mut at = site;
        while let Some(id) = at {
            let Some(site) = self.program.sites.get(id) else {
                break;
            };
            err = macro_failed(&site.name, &site.params, self.scope, err);
            at = site.parent;
        }
        err
    }
}

fn format_chain(value: Value, chain: &[ChainStep]) -> Result<Value, TemplateError> {
    chain.iter().try_fold(value, |value, step| {
        let Some(formatter) = &step.formatter else {
            return Err(missing_formatter(&step.name));
        };
        let params: SmallVec<[&str; 2]> = step.params.iter().map(String::as_str).collect();
        formatter
            .format(&value, &params)
            .map_err(|message| formatter_failed(&step.name, message))
    })
}
