//! Primitive conversions: ranking relations and cast helpers.

use hostinterop_core::{CastMode, PrimitiveKind};

use crate::bytecode::OpCode;

/// Runtime helper applied to a boxed value converted into a primitive
/// parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastHelper {
    /// Truthiness test; never fails.
    Boolean,
    /// Range-checked numeric cast; overflow raises.
    Checked(PrimitiveKind),
    /// Truncating numeric cast.
    Unchecked(PrimitiveKind),
}

/// Select the cast helper for a primitive target.
///
/// Total over every primitive kind: bool maps to the truthiness helper,
/// every other kind to the checked or unchecked numeric cast.
pub fn cast_helper(kind: PrimitiveKind, mode: CastMode) -> CastHelper {
    match (kind, mode) {
        (PrimitiveKind::Bool, _) => CastHelper::Boolean,
        (kind, CastMode::Checked) => CastHelper::Checked(kind),
        (kind, CastMode::Unchecked) => CastHelper::Unchecked(kind),
    }
}

/// Conversion applied to an unboxed value without going through a box.
///
/// `Some(None)` means identity; `Some(Some(op))` means a single conversion
/// instruction; `None` means the pair has no direct path.
pub fn direct_conversion(
    from: PrimitiveKind,
    to: PrimitiveKind,
    mode: CastMode,
) -> Option<Option<OpCode>> {
    use PrimitiveKind::*;

    if from == to {
        return Some(None);
    }
    let op = match (from, to) {
        (Int32, Int64) => OpCode::I32ToI64,
        (Int64, Int32) => match mode {
            CastMode::Checked => OpCode::I64ToI32Checked,
            CastMode::Unchecked => OpCode::I64ToI32,
        },
        (Float32, Float64) => OpCode::F32ToF64,
        (Float64, Float32) => OpCode::F64ToF32,
        _ => return None,
    };
    Some(Some(op))
}

/// Lossless primitive widening.
pub fn is_widening(from: PrimitiveKind, to: PrimitiveKind) -> bool {
    use PrimitiveKind::*;

    matches!((from, to), (Int32, Int64) | (Float32, Float64))
}

/// Any non-identity primitive conversion the runtime cast helpers accept.
///
/// Bool converts to nothing and nothing converts to bool; char converts
/// to and from the integer kinds.
pub fn is_convertible(from: PrimitiveKind, to: PrimitiveKind) -> bool {
    if from == to {
        return true;
    }
    if from == PrimitiveKind::Bool || to == PrimitiveKind::Bool {
        return false;
    }
    if from == PrimitiveKind::Char {
        return to.is_integer();
    }
    if to == PrimitiveKind::Char {
        return from.is_integer();
    }
    from.is_numeric() && to.is_numeric()
}
