//! Argument coercion and return boxing.
//!
//! Once a method is selected, every argument is emitted so that the value
//! on the stack has exactly the parameter's type, and the call's result is
//! brought back into the boxed object representation.

use hostinterop_core::{CompilationError, HostType, ParamDef, PrimitiveKind};
use log::trace;

use super::primitive::{cast_helper, direct_conversion};
use crate::bytecode::OpCode;
use crate::context::CompilationContext;
use crate::emit::BytecodeEmitter;
use crate::expr::{ArgMode, Expr, HostArg, Position};

/// Emit one call argument coerced to `param`.
///
/// By-reference arguments push the local's current value; the write-back
/// after the call is emitted by the call node.
pub fn gen_arg(
    ctx: &CompilationContext<'_>,
    em: &mut BytecodeEmitter,
    arg: &HostArg,
    param: &ParamDef,
) -> Result<(), CompilationError> {
    match (&arg.mode, &arg.local) {
        (ArgMode::ByRef, Some(local)) => {
            em.get_local(local.slot);
            Ok(())
        }
        (ArgMode::ByRef, None) => Err(CompilationError::Internal {
            message: "by-ref argument without a local binding".to_string(),
        }),
        (ArgMode::Standard, _) => gen_coerced(ctx, em, &arg.expr, &param.param_type),
    }
}

/// Emit `expr` converted to `target`.
pub fn gen_coerced(
    ctx: &CompilationContext<'_>,
    em: &mut BytecodeEmitter,
    expr: &Expr,
    target: &HostType,
) -> Result<(), CompilationError> {
    let mode = ctx.options().cast_mode();

    // Unboxed fast path: identity, int32<->int64, float32<->float64.
    if let (Some(from), HostType::Primitive(to)) = (expr.unboxed_type(), target) {
        if let Some(step) = direct_conversion(from, *to, mode) {
            trace!("coercing unboxed {} to {}", from.name(), to.name());
            expr.emit_unboxed(ctx, em)?;
            if let Some(op) = step {
                em.emit(op);
            }
            return Ok(());
        }
    }

    if matches!(expr.static_type(), Some(HostType::Void)) {
        // Run for effect, then supply the parameter's default.
        expr.emit(ctx, em, Position::Statement)?;
        em.push_default(target);
        return Ok(());
    }

    match target {
        HostType::Void => {
            expr.emit(ctx, em, Position::Expression)?;
            em.discard();
            em.push_nil();
        }
        HostType::Primitive(kind) => {
            expr.emit(ctx, em, Position::Expression)?;
            em.cast(cast_helper(*kind, mode));
        }
        HostType::Object => expr.emit(ctx, em, Position::Expression)?,
        other => {
            expr.emit(ctx, em, Position::Expression)?;
            em.convert(other)?;
        }
    }
    Ok(())
}

/// Bring a raw member result of type `ty` into object representation.
///
/// Void becomes nil; int32 widens to int64 and float32 to float64 before
/// boxing; other primitives box as-is; reference types are untouched.
pub fn box_return(em: &mut BytecodeEmitter, ty: &HostType) {
    match ty {
        HostType::Void => em.push_nil(),
        HostType::Primitive(PrimitiveKind::Float32) => {
            em.emit(OpCode::F32ToF64);
            em.box_value();
        }
        HostType::Primitive(PrimitiveKind::Int32) => {
            em.emit(OpCode::I32ToI64);
            em.box_value();
        }
        HostType::Primitive(_) => em.box_value(),
        HostType::Object | HostType::Class(_) | HostType::Array(_) => {}
    }
}
