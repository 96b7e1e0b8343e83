//! Execution budgets.
//!
//! Unbounded templates (a `for` over a generator-like host value, a
//! self-invoking template macro, a slow host function) are stopped by a
//! [`Budget`]: an optional wall-clock deadline, an optional step limit and
//! an optional cancellation flag set by a supervising thread. Both
//! execution strategies tick the budget once per macro or op.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::errors::{step_limit, timeout, TemplateError};

/// Deadline clock reads happen once per this many steps.
const CLOCK_INTERVAL: u64 = 64;

/// Limits on one render.
#[derive(Clone, Debug, Default)]
pub struct Budget {
    deadline: Option<(Instant, Duration)>,
    max_steps: Option<u64>,
    cancel: Option<Arc<AtomicBool>>,
    steps: u64,
}

impl Budget {
    /// No limits at all.
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Stop once `limit` has elapsed from now.
    #[must_use]
    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.deadline = Some((Instant::now() + limit, limit));
        self
    }

    /// Stop after `limit` steps.
    #[must_use]
    pub fn with_max_steps(mut self, limit: u64) -> Self {
        self.max_steps = Some(limit);
        self
    }

    /// Stop once `flag` is set.
    #[must_use]
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Steps taken so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Account for one step.
    #[inline]
    pub fn tick(&mut self) -> Result<(), TemplateError> {
        self.steps += 1;
        if let Some(limit) = self.max_steps {
            if self.steps > limit {
                return Err(step_limit(limit));
            }
        }
        if self.steps % CLOCK_INTERVAL == 0 {
            self.check_clock()?;
        }
        Ok(())
    }

    /// Check the deadline and the cancellation flag now.
    pub fn check_clock(&self) -> Result<(), TemplateError> {
        let cancelled = self
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed));
        match self.deadline {
            Some((deadline, limit)) if cancelled || Instant::now() >= deadline => {
                Err(timeout(limit))
            }
            None if cancelled => Err(timeout(Duration::ZERO)),
            _ => Ok(()),
        }
    }
}
