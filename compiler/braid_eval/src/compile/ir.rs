//! Bytecode for compiled templates.

use std::fmt;
use std::sync::Arc;

use crate::expr::Expression;
use crate::formatters::Formatter;
use crate::macros::Macro;

/// Index into [`Program::sites`].
pub(crate) type SiteId = usize;

/// Placeholder target for a jump that is patched later.
pub(crate) const UNPATCHED: usize = usize::MAX;

/// The macro invocation an op came from, for error reports.
#[derive(Clone, Debug)]
pub(crate) struct Site {
    pub name: Box<str>,
    pub params: Vec<String>,
    /// Enclosing `if`/`for` whose body contains this macro.
    pub parent: Option<SiteId>,
}

/// One formatter application, resolved when the template was compiled.
#[derive(Clone)]
pub(crate) struct ChainStep {
    pub name: Box<str>,
    pub params: Vec<String>,
    /// `None` when the name was not registered at compile time.
    pub formatter: Option<Arc<dyn Formatter>>,
}

pub(crate) enum Op {
    /// Write literal text.
    Text(Box<str>),
    /// Evaluate, format and write.
    Substitute {
        expr: Expression,
        chain: Box<[ChainStep]>,
        site: SiteId,
    },
    /// Jump to `target` when `cond` is false or refers to a missing value.
    JumpUnless {
        cond: Expression,
        target: usize,
        site: SiteId,
    },
    Jump {
        target: usize,
    },
    /// Evaluate the iterable and push its entries.
    IterStart {
        iterable: Expression,
        site: SiteId,
    },
    /// Bind the next entry, or pop the loop and jump to `exit`.
    IterNext {
        key: Option<Box<str>>,
        value: Box<str>,
        exit: usize,
    },
    /// Call a host or template macro.
    Invoke {
        handler: Arc<dyn Macro>,
        params: Vec<String>,
        site: SiteId,
    },
}

impl Op {
    /// Site to blame when this op fails.
    pub(crate) fn site(&self) -> Option<SiteId> {
        match self {
            Op::Substitute { site, .. }
            | Op::JumpUnless { site, .. }
            | Op::IterStart { site, .. }
            | Op::Invoke { site, .. } => Some(*site),
            Op::Text(_) | Op::Jump { .. } | Op::IterNext { .. } => None,
        }
    }
}

impl fmt::Debug for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Text(text) => write!(f, "text {text:?}"),
            Op::Substitute { expr, chain, .. } => {
                write!(f, "substitute {:?}", expr.source())?;
                for step in chain.iter() {
                    write!(f, " | {}", step.name)?;
                    for param in &step.params {
                        write!(f, " {param}")?;
                    }
                }
                Ok(())
            }
            Op::JumpUnless { cond, target, .. } => {
                write!(f, "jump_unless {:?} -> {target}", cond.source())
            }
            Op::Jump { target } => write!(f, "jump -> {target}"),
            Op::IterStart { iterable, .. } => write!(f, "iter_start {:?}", iterable.source()),
            Op::IterNext { key, value, exit } => match key {
                Some(key) => write!(f, "iter_next {key}, {value} exit -> {exit}"),
                None => write!(f, "iter_next {value} exit -> {exit}"),
            },
            Op::Invoke { params, .. } => write!(f, "invoke {params:?}"),
        }
    }
}

/// A compiled template.
#[derive(Default)]
pub(crate) struct Program {
    pub ops: Vec<Op>,
    pub sites: Vec<Site>,
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (pc, op) in self.ops.iter().enumerate() {
            writeln!(f, "{pc:>4}  {op:?}")?;
        }
        Ok(())
    }
}
