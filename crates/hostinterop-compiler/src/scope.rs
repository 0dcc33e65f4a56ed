//! Local binding management.
//!
//! [`LocalScope`] tracks the lexically visible locals of the code being
//! analysed. It answers the local-binding lookup that by-ref arguments and
//! symbol analysis need, and assigns each local a frame slot.

use hostinterop_core::{CompilationError, HostType, Span, Symbol};
use rustc_hash::FxHashMap;

/// A lexically visible local binding.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalBinding {
    pub name: String,
    /// Frame slot index.
    pub slot: u16,
    /// Statically known type; `None` for untyped (boxed) locals.
    pub local_type: Option<HostType>,
    /// Scope depth where declared.
    pub depth: u32,
    pub span: Span,
}

/// Locals of one frame, with nested block scopes.
#[derive(Debug, Default)]
pub struct LocalScope {
    /// Bindings by name in the current scope chain.
    bindings: FxHashMap<String, LocalBinding>,

    /// Current scope depth (0 = frame scope).
    depth: u32,

    /// (shadowing depth, name, shadowed binding), restored on `pop_scope`.
    shadowed: Vec<(u32, String, LocalBinding)>,

    next_slot: u16,
    max_slot: u16,
}

impl LocalScope {
    pub fn new() -> Self {
        Self::default()
    }

    // ==========================================================================
    // Scope Management
    // ==========================================================================

    /// Enter a nested scope.
    pub fn push_scope(&mut self) {
        self.depth += 1;
    }

    /// Exit the current scope, dropping its bindings and restoring any it
    /// shadowed.
    pub fn pop_scope(&mut self) {
        let depth = self.depth;
        self.bindings.retain(|_, b| b.depth < depth);

        while let Some((shadowing_depth, _, _)) = self.shadowed.last() {
            if *shadowing_depth != depth {
                break;
            }
            if let Some((_, name, binding)) = self.shadowed.pop() {
                self.bindings.insert(name, binding);
            }
        }

        self.depth = depth.saturating_sub(1);
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    // ==========================================================================
    // Declaration
    // ==========================================================================

    /// Declare a local. Redeclaring a visible name shadows it until the
    /// current scope is popped.
    pub fn declare(
        &mut self,
        name: impl Into<String>,
        local_type: Option<HostType>,
        span: Span,
    ) -> Result<LocalBinding, CompilationError> {
        let name = name.into();
        if let Some(existing) = self.bindings.get(&name) {
            self.shadowed.push((self.depth, name.clone(), existing.clone()));
        }

        let slot = self.allocate_slot()?;
        let binding = LocalBinding {
            name: name.clone(),
            slot,
            local_type,
            depth: self.depth,
            span,
        };
        self.bindings.insert(name, binding.clone());
        Ok(binding)
    }

    fn allocate_slot(&mut self) -> Result<u16, CompilationError> {
        let slot = self.next_slot;
        self.next_slot = slot
            .checked_add(1)
            .ok_or_else(|| CompilationError::Internal {
                message: "too many locals in one frame".to_string(),
            })?;
        self.max_slot = self.max_slot.max(self.next_slot);
        Ok(slot)
    }

    // ==========================================================================
    // Lookup
    // ==========================================================================

    /// Look up a binding by name.
    pub fn get(&self, name: &str) -> Option<&LocalBinding> {
        self.bindings.get(name)
    }

    /// Resolve a symbol to a visible local. Qualified symbols never name
    /// locals.
    pub fn resolve_local(&self, symbol: &Symbol) -> Option<&LocalBinding> {
        if symbol.is_qualified() {
            return None;
        }
        self.bindings.get(symbol.name())
    }

    /// Number of slots a frame for these locals needs.
    pub fn frame_size(&self) -> u16 {
        self.max_slot
    }
}
