//! Rendering under a wall-clock limit.
//!
//! [`Sandbox::run`] renders a compiled procedure on a worker thread against
//! a copy of the caller's scope and waits at most the configured timeout.
//! Output is buffered on the worker and reaches the caller's sink only when
//! the render succeeds in time; on failure or timeout the sink receives the
//! empty string instead.
//!
//! A worker that overruns is told to stop through a cancellation flag the
//! VM checks between ops. A host function that never returns cannot be
//! interrupted; its thread is detached and left to finish on its own.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::budget::Budget;
use crate::compile::Procedure;
use crate::errors::{sandbox_fault, timeout, TemplateError};
use crate::{Scope, Sink};

/// Default wall-clock limit.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Runs procedures on a supervised worker thread.
#[derive(Clone, Debug)]
pub struct Sandbox {
    timeout: Duration,
    max_steps: Option<u64>,
}

impl Default for Sandbox {
    fn default() -> Self {
        Sandbox {
            timeout: DEFAULT_TIMEOUT,
            max_steps: None,
        }
    }
}

impl Sandbox {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Also stop after `limit` ops.
    #[must_use]
    pub fn with_max_steps(mut self, limit: u64) -> Self {
        self.max_steps = Some(limit);
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Render `procedure` with a copy of `scope`, writing the whole output to
    /// `sink` on success and the empty string otherwise.
    #[tracing::instrument(level = "debug", skip_all, fields(timeout = ?self.timeout))]
    pub fn run(
        &self,
        procedure: &Procedure,
        scope: &Scope,
        sink: &mut dyn Sink,
    ) -> Result<(), TemplateError> {
        match self.render_on_worker(procedure, scope) {
            Ok(output) => sink.write(&output).map_err(TemplateError::from),
            Err(err) => {
                if let Err(write_err) = sink.write("") {
                    warn!(%write_err, "writing empty output after failed render");
                }
                Err(err)
            }
        }
    }

    /// Like [`run`](Self::run), but hands the outcome to `on_done`.
    pub fn run_reporting<F>(&self, procedure: &Procedure, scope: &Scope, sink: &mut dyn Sink, on_done: F)
    where
        F: FnOnce(Result<(), TemplateError>),
    {
        on_done(self.run(procedure, scope, sink));
    }

    fn render_on_worker(&self, procedure: &Procedure, scope: &Scope) -> Result<String, TemplateError> {
        let cancel = Arc::new(AtomicBool::new(false));
        let mut budget = Budget::unlimited()
            .with_timeout(self.timeout)
            .with_cancel_flag(Arc::clone(&cancel));
        if let Some(limit) = self.max_steps {
            budget = budget.with_max_steps(limit);
        }

        let procedure = procedure.clone();
        let mut scope = scope.clone();
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("braid-sandbox".into())
            .spawn(move || {
                let mut out = String::new();
                let result = procedure
                    .render_with_budget(&mut out, &mut scope, budget)
                    .map(|()| out);
                // The supervisor may have stopped listening.
                let _ = tx.send(result);
            })
            .map_err(|err| sandbox_fault(format!("cannot start worker: {err}")))?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => {
                debug!(ok = result.is_ok(), "sandboxed render finished");
                result
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                cancel.store(true, Ordering::Relaxed);
                warn!(timeout = ?self.timeout, "sandboxed render timed out");
                Err(timeout(self.timeout))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(sandbox_fault("worker exited without a result"))
            }
        }
    }
}
