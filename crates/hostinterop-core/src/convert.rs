//! Runtime primitive cast helpers.
//!
//! These are the operations generated code calls when a boxed value must be
//! passed where a primitive is expected. Every primitive except `bool` has a
//! checked variant (range errors raise) and an unchecked variant
//! (truncating). `bool` has a single truthiness-based helper.

use crate::{PrimitiveKind, RuntimeError, Value};

/// Overflow behaviour of numeric casts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastMode {
    Checked,
    Unchecked,
}

enum Numeric {
    Int(i128),
    Float(f64),
}

fn numeric_of(value: &Value, target: PrimitiveKind) -> Result<Numeric, RuntimeError> {
    Ok(match value {
        Value::Char(c) => Numeric::Int(*c as i128),
        Value::I8(v) => Numeric::Int(*v as i128),
        Value::U8(v) => Numeric::Int(*v as i128),
        Value::I16(v) => Numeric::Int(*v as i128),
        Value::U16(v) => Numeric::Int(*v as i128),
        Value::I32(v) => Numeric::Int(*v as i128),
        Value::U32(v) => Numeric::Int(*v as i128),
        Value::I64(v) => Numeric::Int(*v as i128),
        Value::U64(v) => Numeric::Int(*v as i128),
        Value::F32(v) => Numeric::Float(*v as f64),
        Value::F64(v) => Numeric::Float(*v),
        other => {
            return Err(RuntimeError::InvalidCast {
                from: other.type_name(),
                to: target.name().to_string(),
            });
        }
    })
}

/// The single, mode-independent boolean helper: nil and false are false.
pub fn boolean_cast(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Nil => false,
        _ => true,
    }
}

macro_rules! int_cast {
    ($num:expr, $mode:expr, $ty:ty, $variant:ident, $kind:expr, $shown:expr) => {
        match $num {
            Numeric::Int(v) => match $mode {
                CastMode::Unchecked => Value::$variant(v as $ty),
                CastMode::Checked => <$ty>::try_from(v)
                    .map(Value::$variant)
                    .map_err(|_| RuntimeError::Overflow {
                        value: $shown,
                        target: $kind.name().to_string(),
                    })?,
            },
            Numeric::Float(f) => match $mode {
                CastMode::Unchecked => Value::$variant(f as $ty),
                CastMode::Checked => {
                    let (min, max) = (<$ty>::MIN as f64, <$ty>::MAX as f64);
                    if f.is_nan() || f.trunc() < min || f.trunc() > max {
                        return Err(RuntimeError::Overflow {
                            value: $shown,
                            target: $kind.name().to_string(),
                        });
                    }
                    Value::$variant(f as $ty)
                }
            },
        }
    };
}

/// Cast a boxed value to the primitive `kind`.
pub fn cast_primitive(
    value: &Value,
    kind: PrimitiveKind,
    mode: CastMode,
) -> Result<Value, RuntimeError> {
    if kind == PrimitiveKind::Bool {
        return Ok(Value::Bool(boolean_cast(value)));
    }
    let num = numeric_of(value, kind)?;
    let shown = format!("{:?}", value);
    Ok(match kind {
        PrimitiveKind::Int8 => int_cast!(num, mode, i8, I8, kind, shown),
        PrimitiveKind::Uint8 => int_cast!(num, mode, u8, U8, kind, shown),
        PrimitiveKind::Int16 => int_cast!(num, mode, i16, I16, kind, shown),
        PrimitiveKind::Uint16 => int_cast!(num, mode, u16, U16, kind, shown),
        PrimitiveKind::Int32 => int_cast!(num, mode, i32, I32, kind, shown),
        PrimitiveKind::Uint32 => int_cast!(num, mode, u32, U32, kind, shown),
        PrimitiveKind::Int64 => int_cast!(num, mode, i64, I64, kind, shown),
        PrimitiveKind::Uint64 => int_cast!(num, mode, u64, U64, kind, shown),
        PrimitiveKind::Float64 => match num {
            Numeric::Int(v) => Value::F64(v as f64),
            Numeric::Float(f) => Value::F64(f),
        },
        PrimitiveKind::Float32 => match num {
            Numeric::Int(v) => Value::F32(v as f32),
            Numeric::Float(f) => {
                if mode == CastMode::Checked && f.is_finite() && f.abs() > f32::MAX as f64 {
                    return Err(RuntimeError::Overflow {
                        value: shown,
                        target: kind.name().to_string(),
                    });
                }
                Value::F32(f as f32)
            }
        },
        PrimitiveKind::Char => {
            let code = match num {
                Numeric::Int(v) => v,
                Numeric::Float(f) => f as i128,
            };
            match mode {
                CastMode::Checked => u16::try_from(code)
                    .ok()
                    .and_then(|c| char::from_u32(c as u32))
                    .map(Value::Char)
                    .ok_or_else(|| RuntimeError::Overflow {
                        value: shown,
                        target: kind.name().to_string(),
                    })?,
                CastMode::Unchecked => {
                    let c = char::from_u32(u32::from(code as u16));
                    Value::Char(c.unwrap_or(char::REPLACEMENT_CHARACTER))
                }
            }
        }
        PrimitiveKind::Bool => Value::Bool(boolean_cast(value)),
    })
}
