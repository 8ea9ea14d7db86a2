//! Machine configuration.

use loops_compiler::{ProcedureCache, ProcedureStore};
use std::sync::Arc;

/// How loop goals reaching the machine at run time are executed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum LoopMode {
    /// Generate (or reuse) a procedure and call it.
    #[default]
    Compiled,
    /// Walk the loop directly without generating a procedure.
    Interpreted,
}

#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub loop_mode: LoopMode,
    /// Compile loops in consulted clauses and queries before running them.
    /// Only applies in [`LoopMode::Compiled`].
    pub expand_ahead: bool,
    /// Maximum nesting of procedure calls, unbounded when `None`.
    pub depth_limit: Option<usize>,
    pub store: Arc<dyn ProcedureStore>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            loop_mode: LoopMode::Compiled,
            expand_ahead: true,
            depth_limit: None,
            store: Arc::new(ProcedureCache::new()),
        }
    }
}

impl EngineConfig {
    /// Run every loop through the reference interpreter.
    pub fn interpreted() -> Self {
        Self::default().with_loop_mode(LoopMode::Interpreted)
    }

    pub fn with_loop_mode(mut self, mode: LoopMode) -> Self {
        self.loop_mode = mode;
        self
    }

    pub fn with_expand_ahead(mut self, expand: bool) -> Self {
        self.expand_ahead = expand;
        self
    }

    pub fn with_depth_limit(mut self, limit: usize) -> Self {
        self.depth_limit = Some(limit);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn ProcedureStore>) -> Self {
        self.store = store;
        self
    }

    /// Register procedures in the process-wide store.
    pub fn with_global_store(self) -> Self {
        self.with_store(ProcedureCache::global())
    }

    pub(crate) fn expands_ahead(&self) -> bool {
        self.expand_ahead && self.loop_mode == LoopMode::Compiled
    }
}
