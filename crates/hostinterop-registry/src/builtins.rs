//! The built-in host library.
//!
//! Registers the host types every program can reference without imports:
//! `System.Object`, the primitives, `System.String`, `System.Math`, and the
//! source language's own value types.

use std::sync::Arc;

use hostinterop_core::{HostType, ParamDef, PrimitiveKind, RuntimeError, Value, lang_types};

use crate::native::arg;
use crate::registry::{HostRegistry, TypeFlags};

fn int32() -> HostType {
    HostType::primitive(PrimitiveKind::Int32)
}

fn int64() -> HostType {
    HostType::primitive(PrimitiveKind::Int64)
}

fn double() -> HostType {
    HostType::primitive(PrimitiveKind::Float64)
}

fn string() -> HostType {
    HostType::class(lang_types::STRING)
}

fn overflow(value: impl ToString, target: PrimitiveKind) -> RuntimeError {
    RuntimeError::Overflow {
        value: value.to_string(),
        target: target.name().to_string(),
    }
}

/// Host-style rendering used by `Object.ToString()`.
pub(crate) fn display(value: &Value) -> String {
    match value {
        Value::Nil => String::new(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Char(c) => c.to_string(),
        Value::I8(v) => v.to_string(),
        Value::U8(v) => v.to_string(),
        Value::I16(v) => v.to_string(),
        Value::U16(v) => v.to_string(),
        Value::I32(v) => v.to_string(),
        Value::U32(v) => v.to_string(),
        Value::I64(v) => v.to_string(),
        Value::U64(v) => v.to_string(),
        Value::F32(v) => v.to_string(),
        Value::F64(v) => v.to_string(),
        Value::Str(s) => s.to_string(),
        Value::Symbol(sym) => sym.to_string(),
        Value::Keyword(sym) => format!(":{}", sym),
        Value::Type(ty) => ty.name(),
        other => other.type_name(),
    }
}

impl HostRegistry {
    /// Create a registry with the built-in host library.
    pub fn with_builtins() -> Self {
        let mut registry = Self::with_primitives();
        registry.register_builtins();
        registry
    }

    fn register_builtins(&mut self) {
        let value_type = TypeFlags::PUBLIC | TypeFlags::VALUE_TYPE;
        let value = |ty: HostType| vec![ParamDef::new("value", ty)];
        let pair = |ty: HostType| vec![ParamDef::new("a", ty.clone()), ParamDef::new("b", ty)];

        self.define("System.Object", HostType::Object, TypeFlags::PUBLIC)
            .method("ToString", vec![], string(), object_to_string);

        self.define("System.Int32", int32(), value_type)
            .static_field("MaxValue", int32(), Value::I32(i32::MAX))
            .static_field("MinValue", int32(), Value::I32(i32::MIN));

        self.define("System.Int64", int64(), value_type)
            .static_field("MaxValue", int64(), Value::I64(i64::MAX))
            .static_field("MinValue", int64(), Value::I64(i64::MIN));

        self.define(lang_types::STRING, string(), TypeFlags::PUBLIC)
            .property("Length", int32(), string_length)
            .method("ToUpper", vec![], string(), string_to_upper)
            .method(
                "Substring",
                vec![ParamDef::new("startIndex", int32())],
                string(),
                string_substring,
            )
            .static_method("Concat", pair(string()), string(), string_concat)
            .static_method(
                "IsNullOrEmpty",
                value(string()),
                HostType::primitive(PrimitiveKind::Bool),
                string_is_null_or_empty,
            );

        let type_type = HostType::class(lang_types::TYPE);
        self.define(lang_types::TYPE, type_type, TypeFlags::PUBLIC)
            .property("FullName", string(), type_full_name);

        let math = HostType::class("System.Math");
        let math_flags = TypeFlags::PUBLIC | TypeFlags::ABSTRACT;
        self.define("System.Math", math, math_flags)
            .static_field("PI", double(), Value::F64(std::f64::consts::PI))
            .static_field("E", double(), Value::F64(std::f64::consts::E))
            .static_method("Abs", value(int32()), int32(), abs_i32)
            .static_method("Abs", value(int64()), int64(), abs_i64)
            .static_method("Abs", value(double()), double(), abs_f64)
            .static_method("Max", pair(int32()), int32(), max_i32)
            .static_method("Max", pair(int64()), int64(), max_i64)
            .static_method("Max", pair(double()), double(), max_f64);

        for name in [
            lang_types::SYMBOL,
            lang_types::KEYWORD,
            lang_types::LIST,
            lang_types::VECTOR,
            lang_types::MAP,
            lang_types::SET,
        ] {
            self.define(name, HostType::class(name), TypeFlags::PUBLIC);
        }
        for name in [
            lang_types::LIST,
            lang_types::VECTOR,
            lang_types::MAP,
            lang_types::SET,
        ] {
            if let Ok(builder) = self.extend(name) {
                builder.property("Count", int32(), collection_count);
            }
        }
    }
}

// ============================================================================
// Member bodies
// ============================================================================

fn object_to_string(args: &mut [Value]) -> Result<Value, RuntimeError> {
    Ok(Value::string(display(&args[0])))
}

fn string_length(args: &mut [Value]) -> Result<Value, RuntimeError> {
    let s: Arc<str> = arg(args, 0)?;
    Ok(Value::I32(s.chars().count() as i32))
}

fn string_to_upper(args: &mut [Value]) -> Result<Value, RuntimeError> {
    let s: Arc<str> = arg(args, 0)?;
    Ok(Value::string(s.to_uppercase()))
}

fn string_substring(args: &mut [Value]) -> Result<Value, RuntimeError> {
    let s: Arc<str> = arg(args, 0)?;
    let start: i32 = arg(args, 1)?;
    let start = usize::try_from(start)
        .map_err(|_| overflow(start, PrimitiveKind::Int32))?;
    Ok(Value::string(s.chars().skip(start).collect::<String>()))
}

fn string_concat(args: &mut [Value]) -> Result<Value, RuntimeError> {
    let joined = format!("{}{}", display(&args[0]), display(&args[1]));
    Ok(Value::string(joined))
}

fn string_is_null_or_empty(args: &mut [Value]) -> Result<Value, RuntimeError> {
    let empty = match &args[0] {
        Value::Str(s) => s.is_empty(),
        _ => true,
    };
    Ok(Value::Bool(empty))
}

fn type_full_name(args: &mut [Value]) -> Result<Value, RuntimeError> {
    match &args[0] {
        Value::Type(ty) => Ok(Value::string(ty.name())),
        other => Err(RuntimeError::InvalidCast {
            from: other.type_name(),
            to: lang_types::TYPE.to_string(),
        }),
    }
}

fn abs_i32(args: &mut [Value]) -> Result<Value, RuntimeError> {
    let v: i32 = arg(args, 0)?;
    v.checked_abs()
        .map(Value::I32)
        .ok_or_else(|| overflow(v, PrimitiveKind::Int32))
}

fn abs_i64(args: &mut [Value]) -> Result<Value, RuntimeError> {
    let v: i64 = arg(args, 0)?;
    v.checked_abs()
        .map(Value::I64)
        .ok_or_else(|| overflow(v, PrimitiveKind::Int64))
}

fn abs_f64(args: &mut [Value]) -> Result<Value, RuntimeError> {
    let v: f64 = arg(args, 0)?;
    Ok(Value::F64(v.abs()))
}

fn max_i32(args: &mut [Value]) -> Result<Value, RuntimeError> {
    let (a, b): (i32, i32) = (arg(args, 0)?, arg(args, 1)?);
    Ok(Value::I32(a.max(b)))
}

fn max_i64(args: &mut [Value]) -> Result<Value, RuntimeError> {
    let (a, b): (i64, i64) = (arg(args, 0)?, arg(args, 1)?);
    Ok(Value::I64(a.max(b)))
}

fn max_f64(args: &mut [Value]) -> Result<Value, RuntimeError> {
    let (a, b): (f64, f64) = (arg(args, 0)?, arg(args, 1)?);
    Ok(Value::F64(a.max(b)))
}

fn collection_count(args: &mut [Value]) -> Result<Value, RuntimeError> {
    let count = match &args[0] {
        Value::List(items) | Value::Vector(items) | Value::Set(items) => items.len(),
        Value::Map(entries) => entries.len(),
        other => {
            return Err(RuntimeError::InvalidCast {
                from: other.type_name(),
                to: "lang.Counted".to_string(),
            });
        }
    };
    Ok(Value::I32(count as i32))
}
