//! Runtime values.
//!
//! [`Value`] is both the value domain of quoted literals (what the constant
//! pool stores) and the slot type of the reference VM. Primitive variants are
//! unboxed host primitives; everything else is reference-shaped.

use std::fmt;
use std::sync::{Arc, Mutex};

use rustc_hash::FxHashMap;

use crate::{ClassRef, HostType, PrimitiveKind, Symbol};

/// Well-known class names for the source language's own value types.
pub mod lang_types {
    /// Host string type.
    pub const STRING: &str = "System.String";
    /// Host type-handle type.
    pub const TYPE: &str = "System.Type";
    /// Symbol values.
    pub const SYMBOL: &str = "lang.Symbol";
    /// Keyword values.
    pub const KEYWORD: &str = "lang.Keyword";
    /// Persistent list values.
    pub const LIST: &str = "lang.PersistentList";
    /// Persistent vector values.
    pub const VECTOR: &str = "lang.PersistentVector";
    /// Persistent map values.
    pub const MAP: &str = "lang.PersistentArrayMap";
    /// Persistent set values.
    pub const SET: &str = "lang.PersistentHashSet";
}

/// An instance of a host class.
pub struct HostObject {
    class: ClassRef,
    fields: Mutex<FxHashMap<String, Value>>,
}

impl HostObject {
    /// Create an instance of `class` with the given field values.
    pub fn new(class: ClassRef, fields: impl IntoIterator<Item = (String, Value)>) -> Arc<Self> {
        Arc::new(Self {
            class,
            fields: Mutex::new(fields.into_iter().collect()),
        })
    }

    /// The instance's class.
    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    /// Read a field value (Nil when unset).
    pub fn get(&self, name: &str) -> Value {
        self.fields
            .lock()
            .map(|fields| fields.get(name).cloned().unwrap_or(Value::Nil))
            .unwrap_or(Value::Nil)
    }

    /// Write a field value.
    pub fn set(&self, name: &str, value: Value) {
        if let Ok(mut fields) = self.fields.lock() {
            fields.insert(name.to_string(), value);
        }
    }
}

impl fmt::Debug for HostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<{}>", self.class.name())
    }
}

/// A runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Char(char),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    Str(Arc<str>),
    Symbol(Symbol),
    Keyword(Symbol),
    List(Arc<[Value]>),
    Vector(Arc<[Value]>),
    Map(Arc<[(Value, Value)]>),
    Set(Arc<[Value]>),
    Object(Arc<HostObject>),
    Type(HostType),
}

impl Value {
    /// Convenience constructor for string values.
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Value::Str(s.into())
    }

    /// The primitive kind of an unboxed primitive value.
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        Some(match self {
            Value::Bool(_) => PrimitiveKind::Bool,
            Value::Char(_) => PrimitiveKind::Char,
            Value::I8(_) => PrimitiveKind::Int8,
            Value::U8(_) => PrimitiveKind::Uint8,
            Value::I16(_) => PrimitiveKind::Int16,
            Value::U16(_) => PrimitiveKind::Uint16,
            Value::I32(_) => PrimitiveKind::Int32,
            Value::U32(_) => PrimitiveKind::Uint32,
            Value::I64(_) => PrimitiveKind::Int64,
            Value::U64(_) => PrimitiveKind::Uint64,
            Value::F32(_) => PrimitiveKind::Float32,
            Value::F64(_) => PrimitiveKind::Float64,
            _ => return None,
        })
    }

    /// The value's runtime host type; `None` for nil.
    pub fn runtime_type(&self) -> Option<HostType> {
        if let Some(kind) = self.primitive_kind() {
            return Some(HostType::Primitive(kind));
        }
        Some(match self {
            Value::Str(_) => HostType::class(lang_types::STRING),
            Value::Symbol(_) => HostType::class(lang_types::SYMBOL),
            Value::Keyword(_) => HostType::class(lang_types::KEYWORD),
            Value::List(_) => HostType::class(lang_types::LIST),
            Value::Vector(_) => HostType::class(lang_types::VECTOR),
            Value::Map(_) => HostType::class(lang_types::MAP),
            Value::Set(_) => HostType::class(lang_types::SET),
            Value::Object(obj) => HostType::Class(obj.class().clone()),
            Value::Type(_) => HostType::class(lang_types::TYPE),
            _ => return None,
        })
    }

    /// Whether this is a persistent collection with no elements.
    pub fn is_empty_collection(&self) -> bool {
        match self {
            Value::List(items) | Value::Vector(items) | Value::Set(items) => items.is_empty(),
            Value::Map(entries) => entries.is_empty(),
            _ => false,
        }
    }

    /// Whether this value is numeric.
    pub fn is_numeric(&self) -> bool {
        self.primitive_kind().is_some_and(PrimitiveKind::is_numeric)
    }

    /// Source-language truthiness: everything except nil and false.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    /// Short type description for error messages.
    pub fn type_name(&self) -> String {
        self.runtime_type()
            .map(|t| t.name())
            .unwrap_or_else(|| "nil".to_string())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::I8(a), Value::I8(b)) => a == b,
            (Value::U8(a), Value::U8(b)) => a == b,
            (Value::I16(a), Value::I16(b)) => a == b,
            (Value::U16(a), Value::U16(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::U32(a), Value::U32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::U64(a), Value::U64(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Keyword(a), Value::Keyword(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Vector(a), Value::Vector(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Type(a), Value::Type(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::string(v)
    }
}
