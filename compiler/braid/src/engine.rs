//! The engine: configuration plus the three ways to render.

use std::fmt;
use std::time::Duration;

use braid_eval::{
    Budget, Compiler, Context, Formatter, Interpreter, Macro, Procedure, Sandbox, Scope, Sink,
    TemplateError, DEFAULT_TIMEOUT,
};
use braid_scan::Syntax;
use tracing::debug;

/// How [`Engine::format`] renders a template.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenderMode {
    /// Walk the template directly, writing as it goes.
    #[default]
    Interpret,
    /// Compile to a procedure, then run it.
    Compile,
    /// Compile, then run on a worker thread under the sandbox timeout.
    Sandboxed,
}

/// Builder for [`Engine`].
///
/// ```text
/// let engine = Engine::builder()
///     .syntax(Syntax::trigger("#")?)
///     .sandbox_timeout(Duration::from_millis(250))
///     .formatter("shout", |v: &Value, _: &[&str]| Ok(Value::from(v.to_string().to_uppercase())))
///     .build();
/// ```
pub struct EngineBuilder {
    syntax: Syntax,
    mode: RenderMode,
    sandbox_timeout: Duration,
    step_budget: Option<u64>,
    context: Option<Context>,
    formatters: Vec<(String, Box<dyn Formatter>)>,
    macros: Vec<(String, Box<dyn Macro>)>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        EngineBuilder {
            syntax: Syntax::default(),
            mode: RenderMode::default(),
            sandbox_timeout: DEFAULT_TIMEOUT,
            step_budget: None,
            context: None,
            formatters: Vec::new(),
            macros: Vec::new(),
        }
    }
}

impl EngineBuilder {
    #[must_use]
    pub fn syntax(mut self, syntax: Syntax) -> Self {
        self.syntax = syntax;
        self
    }

    #[must_use]
    pub fn mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    /// Wall-clock limit for sandboxed renders.
    #[must_use]
    pub fn sandbox_timeout(mut self, timeout: Duration) -> Self {
        self.sandbox_timeout = timeout;
        self
    }

    /// Maximum macro expansions (direct) or ops (compiled) per render.
    #[must_use]
    pub fn step_budget(mut self, steps: u64) -> Self {
        self.step_budget = Some(steps);
        self
    }

    /// Share registries with an existing context. Its syntax wins over
    /// [`syntax`](Self::syntax).
    #[must_use]
    pub fn context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    #[must_use]
    pub fn formatter(mut self, name: impl Into<String>, formatter: impl Formatter + 'static) -> Self {
        self.formatters.push((name.into(), Box::new(formatter)));
        self
    }

    #[must_use]
    pub fn macro_handler(mut self, name: impl Into<String>, handler: impl Macro + 'static) -> Self {
        self.macros.push((name.into(), Box::new(handler)));
        self
    }

    pub fn build(self) -> Engine {
        let context = self
            .context
            .unwrap_or_else(|| Context::new(self.syntax));
        {
            let mut formatters = context.formatters().write();
            for (name, formatter) in self.formatters {
                formatters.register_shared(name, formatter.into());
            }
        }
        {
            let mut macros = context.macros().write();
            for (name, handler) in self.macros {
                macros.register_shared(name, handler.into());
            }
        }
        let mut sandbox = Sandbox::new().with_timeout(self.sandbox_timeout);
        if let Some(steps) = self.step_budget {
            sandbox = sandbox.with_max_steps(steps);
        }
        Engine {
            context,
            sandbox,
            mode: self.mode,
            step_budget: self.step_budget,
        }
    }
}

impl fmt::Debug for EngineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineBuilder")
            .field("syntax", &self.syntax)
            .field("mode", &self.mode)
            .field("sandbox_timeout", &self.sandbox_timeout)
            .field("step_budget", &self.step_budget)
            .field("formatters", &self.formatters.len())
            .field("macros", &self.macros.len())
            .finish_non_exhaustive()
    }
}

/// Renders templates against shared macro and formatter registries.
///
/// Cloning is cheap; clones share registries.
#[derive(Clone, Debug)]
pub struct Engine {
    context: Context,
    sandbox: Sandbox,
    mode: RenderMode,
    step_budget: Option<u64>,
}

impl Default for Engine {
    fn default() -> Self {
        EngineBuilder::default().build()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Render `text` directly into `sink`.
    ///
    /// Output already written stays written when a later macro fails.
    pub fn render(&self, text: &str, scope: &mut Scope, sink: &mut dyn Sink) -> Result<(), TemplateError> {
        Interpreter::new(&self.context, scope, sink)
            .with_budget(self.budget())
            .render(text)
    }

    pub fn render_to_string(&self, text: &str, scope: &mut Scope) -> Result<String, TemplateError> {
        let mut out = String::new();
        self.render(text, scope, &mut out)?;
        Ok(out)
    }

    /// Compile `text` against the current registries.
    pub fn compile(&self, text: &str) -> Result<Procedure, TemplateError> {
        Compiler::new(&self.context).compile(text)
    }

    /// Run `procedure` in the sandbox. `scope` is copied, not modified.
    pub fn render_sandboxed(
        &self,
        procedure: &Procedure,
        scope: &Scope,
        sink: &mut dyn Sink,
    ) -> Result<(), TemplateError> {
        self.sandbox.run(procedure, scope, sink)
    }

    /// Render `text` the way [`RenderMode`] says.
    pub fn render_with_mode(
        &self,
        text: &str,
        scope: &mut Scope,
        sink: &mut dyn Sink,
    ) -> Result<(), TemplateError> {
        match self.mode {
            RenderMode::Interpret => self.render(text, scope, sink),
            RenderMode::Compile => self
                .compile(text)?
                .render_with_budget(sink, scope, self.budget()),
            RenderMode::Sandboxed => {
                let procedure = self.compile(text)?;
                self.render_sandboxed(&procedure, scope, sink)
            }
        }
    }

    /// Register a host macro.
    pub fn define_macro(&self, name: impl Into<String>, handler: impl Macro + 'static) {
        let name = name.into();
        debug!(%name, "registering host macro");
        self.context.macros().write().register(name, handler);
    }

    /// Register a template macro, as `{{! name body}}` would.
    pub fn define_template(&self, name: impl Into<String>, body: impl Into<String>) {
        self.context.macros().write().define_template(name, body);
    }

    /// Register a formatter.
    pub fn define_formatter(&self, name: impl Into<String>, formatter: impl Formatter + 'static) {
        let name = name.into();
        debug!(%name, "registering formatter");
        self.context.formatters().write().register(name, formatter);
    }

    fn budget(&self) -> Budget {
        match self.step_budget {
            Some(steps) => Budget::unlimited().with_max_steps(steps),
            None => Budget::unlimited(),
        }
    }
}
