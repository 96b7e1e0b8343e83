//! Everything a render needs besides the scope and the sink.

use std::sync::Arc;

use braid_scan::Syntax;

use crate::formatters::FormatterRegistry;
use crate::macros::MacroRegistry;
use crate::shared::SharedMutableRegistry;

/// Syntax plus shared macro and formatter registries.
///
/// Cloning is cheap and clones share registries: a macro defined through
/// one clone is visible through all of them.
#[derive(Clone, Debug)]
pub struct Context {
    syntax: Arc<Syntax>,
    macros: SharedMutableRegistry<MacroRegistry>,
    formatters: SharedMutableRegistry<FormatterRegistry>,
}

impl Context {
    /// Context with default registries for `syntax`.
    pub fn new(syntax: Syntax) -> Self {
        Self::with_registries(
            syntax,
            SharedMutableRegistry::new(MacroRegistry::new()),
            SharedMutableRegistry::new(FormatterRegistry::new()),
        )
    }

    pub fn with_registries(
        syntax: Syntax,
        macros: SharedMutableRegistry<MacroRegistry>,
        formatters: SharedMutableRegistry<FormatterRegistry>,
    ) -> Self {
        Context {
            syntax: Arc::new(syntax),
            macros,
            formatters,
        }
    }

    #[inline]
    pub fn syntax(&self) -> &Arc<Syntax> {
        &self.syntax
    }

    #[inline]
    pub fn macros(&self) -> &SharedMutableRegistry<MacroRegistry> {
        &self.macros
    }

    #[inline]
    pub fn formatters(&self) -> &SharedMutableRegistry<FormatterRegistry> {
        &self.formatters
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(Syntax::default())
    }
}
