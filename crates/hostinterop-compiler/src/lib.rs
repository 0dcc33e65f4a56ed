//! Host Interop Compiler
//!
//! Analyses `(. target member ...)` host forms against a member oracle and
//! generates stack bytecode for them.
//!
//! ## Pipeline
//!
//! - **Analysis**: [`analyze`] resolves symbols, types and members into an
//!   [`Expr`] tree; overloads are chosen here
//! - **Code generation**: [`Expr::emit`] lowers the tree, coercing
//!   arguments to the chosen parameter types
//!
//! ## Modules
//!
//! - [`bytecode`]: Bytecode types (OpCode, BytecodeChunk, ConstantPool)
//! - [`context`]: Parser context flags, options and compilation context
//! - [`conversion`]: Argument conversions and coercion codegen
//! - [`emit`]: High-level bytecode emitter
//! - [`expr`]: Expression nodes, form analysis and host form parsing
//! - [`overload`]: Overload resolution for method calls
//! - [`scope`]: Local bindings
//! - [`type_resolver`]: Type names and tags to host types

pub mod bytecode;
pub mod context;
pub mod conversion;
pub mod emit;
pub mod expr;
pub mod overload;
pub mod scope;
pub mod type_resolver;

pub use bytecode::{BytecodeChunk, ConstantPool, EmptyKind, OpCode};
pub use context::{CompilationContext, CompilerOptions, ParserContext};
pub use conversion::{ArgInfo, Conversion, ConversionKind, find_conversion};
pub use emit::BytecodeEmitter;
pub use expr::{Expr, Position, analyze, parse_host};
pub use overload::{MethodMatch, resolve_method};
pub use scope::{LocalBinding, LocalScope};
pub use type_resolver::TypeResolver;

// Re-export CompilationError from core for convenience
pub use hostinterop_core::CompilationError;

/// Analyse `form` and generate bytecode producing its value, ending in
/// `RETURN`.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn compile_form(
    ctx: &CompilationContext<'_>,
    form: &hostinterop_core::Form,
) -> Result<BytecodeChunk, CompilationError> {
    let expr = analyze(ctx, ParserContext::expression(), form)?;
    let mut emitter = BytecodeEmitter::new();
    emitter.set_line(form.span.line);
    expr.emit(ctx, &mut emitter, Position::Expression)?;
    emitter.emit(OpCode::Return);
    Ok(emitter.finish())
}
