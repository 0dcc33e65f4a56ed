//! Analysis contexts.
//!
//! - [`ParserContext`]: the immutable mode flags threaded through recursive
//!   analysis
//! - [`CompilerOptions`]: per-compilation settings
//! - [`CompilationContext`]: collaborators and state for one compilation unit

use std::fmt;
use std::ptr;

use hostinterop_core::{CastMode, ConstantRegistry, HostType, MemberOracle, NamespaceMap, Symbol};

use crate::scope::LocalScope;

// ============================================================================
// ParserContext
// ============================================================================

#[derive(Debug, PartialEq, Eq)]
struct Flags {
    recur_allowed: bool,
    is_assign_target: bool,
}

/// One interned entry per flag combination, indexed by
/// `recur_allowed << 1 | is_assign_target`.
static CONTEXTS: [Flags; 4] = [
    Flags {
        recur_allowed: false,
        is_assign_target: false,
    },
    Flags {
        recur_allowed: false,
        is_assign_target: true,
    },
    Flags {
        recur_allowed: true,
        is_assign_target: false,
    },
    Flags {
        recur_allowed: true,
        is_assign_target: true,
    },
];

/// Immutable analysis-mode flags.
///
/// Contexts are interned, so a transition that leaves its flag unchanged
/// hands back the very same instance (see [`ParserContext::same_instance`]).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ParserContext {
    flags: &'static Flags,
}

impl ParserContext {
    fn interned(recur_allowed: bool, is_assign_target: bool) -> Self {
        let index = ((recur_allowed as usize) << 1) | is_assign_target as usize;
        Self {
            flags: &CONTEXTS[index],
        }
    }

    /// A context with the given flags.
    pub fn new(recur_allowed: bool, is_assign_target: bool) -> Self {
        Self::interned(recur_allowed, is_assign_target)
    }

    /// Expression position: no recur, not an assignment target.
    pub fn expression() -> Self {
        Self::interned(false, false)
    }

    pub fn recur_allowed(&self) -> bool {
        self.flags.recur_allowed
    }

    pub fn is_assign_target(&self) -> bool {
        self.flags.is_assign_target
    }

    /// This context with `recur_allowed` set to `value`.
    pub fn set_recur(&self, value: bool) -> Self {
        if value == self.flags.recur_allowed {
            return *self;
        }
        Self::interned(value, self.flags.is_assign_target)
    }

    /// This context with `is_assign_target` set to `value`.
    pub fn set_assign(&self, value: bool) -> Self {
        if value == self.flags.is_assign_target {
            return *self;
        }
        Self::interned(self.flags.recur_allowed, value)
    }

    /// Identity comparison.
    pub fn same_instance(&self, other: &ParserContext) -> bool {
        ptr::eq(self.flags, other.flags)
    }
}

impl Default for ParserContext {
    fn default() -> Self {
        Self::expression()
    }
}

impl fmt::Debug for ParserContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserContext")
            .field("recur_allowed", &self.flags.recur_allowed)
            .field("is_assign_target", &self.flags.is_assign_target)
            .finish()
    }
}

// ============================================================================
// CompilerOptions
// ============================================================================

/// Per-compilation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompilerOptions {
    /// Narrowing numeric casts truncate instead of raising on overflow.
    pub unchecked_math: bool,
    /// Log a warning whenever a member is left to runtime resolution.
    pub warn_on_reflection: bool,
}

impl CompilerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unchecked_math(mut self, unchecked: bool) -> Self {
        self.unchecked_math = unchecked;
        self
    }

    pub fn with_warn_on_reflection(mut self, warn: bool) -> Self {
        self.warn_on_reflection = warn;
        self
    }

    /// Cast mode for narrowing conversions.
    pub fn cast_mode(&self) -> CastMode {
        if self.unchecked_math {
            CastMode::Unchecked
        } else {
            CastMode::Checked
        }
    }
}

// ============================================================================
// CompilationContext
// ============================================================================

/// Everything analysis and code generation consult for one compilation unit.
///
/// Passed by `&mut` through analysis (locals are declared, stubs change) and
/// by `&` through code generation.
pub struct CompilationContext<'a> {
    oracle: &'a dyn MemberOracle,
    namespace: &'a dyn NamespaceMap,
    constants: &'a dyn ConstantRegistry,
    options: CompilerOptions,
    compile_stub: Option<(Symbol, HostType)>,
    locals: LocalScope,
}

impl<'a> CompilationContext<'a> {
    pub fn new(
        oracle: &'a dyn MemberOracle,
        namespace: &'a dyn NamespaceMap,
        constants: &'a dyn ConstantRegistry,
    ) -> Self {
        Self {
            oracle,
            namespace,
            constants,
            options: CompilerOptions::default(),
            compile_stub: None,
            locals: LocalScope::new(),
        }
    }

    pub fn with_options(mut self, options: CompilerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: CompilerOptions) {
        self.options = options;
    }

    pub fn oracle(&self) -> &'a dyn MemberOracle {
        self.oracle
    }

    pub fn namespace(&self) -> &'a dyn NamespaceMap {
        self.namespace
    }

    pub fn constants(&self) -> &'a dyn ConstantRegistry {
        self.constants
    }

    /// The placeholder type standing in for the type whose body is being
    /// compiled, and the symbol that names it.
    pub fn compile_stub(&self) -> Option<&(Symbol, HostType)> {
        self.compile_stub.as_ref()
    }

    pub fn set_compile_stub(&mut self, symbol: Symbol, stub: HostType) {
        self.compile_stub = Some((symbol, stub));
    }

    pub fn clear_compile_stub(&mut self) {
        self.compile_stub = None;
    }

    pub fn locals(&self) -> &LocalScope {
        &self.locals
    }

    pub fn locals_mut(&mut self) -> &mut LocalScope {
        &mut self.locals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_assign_twice_returns_same_instance() {
        let base = ParserContext::default();
        let assign = base.set_assign(true);
        let again = assign.set_assign(true);
        assert!(again.same_instance(&assign));
        assert!(again.is_assign_target());
        assert!(!base.is_assign_target());
    }

    #[test]
    fn unchanged_transition_is_identity() {
        let ctx = ParserContext::new(true, false);
        assert!(ctx.set_recur(true).same_instance(&ctx));
        assert!(ctx.set_assign(false).same_instance(&ctx));
    }

    #[test]
    fn transitions_flip_exactly_one_flag() {
        let ctx = ParserContext::new(true, false);
        let no_recur = ctx.set_recur(false);
        assert!(!no_recur.recur_allowed());
        assert!(!no_recur.is_assign_target());
        assert!(!no_recur.same_instance(&ctx));

        let assign = ctx.set_assign(true);
        assert!(assign.recur_allowed());
        assert!(assign.is_assign_target());
    }

    #[test]
    fn contexts_are_value_equal() {
        let assign = ParserContext::expression().set_assign(true);
        assert_eq!(ParserContext::new(false, true), assign);
        assert_ne!(ParserContext::new(false, true), ParserContext::expression());
    }

    #[test]
    fn options_builder() {
        let options = CompilerOptions::new()
            .with_unchecked_math(true)
            .with_warn_on_reflection(true);
        assert!(options.unchecked_math);
        assert!(options.warn_on_reflection);
        assert!(!CompilerOptions::default().unchecked_math);
    }
}
