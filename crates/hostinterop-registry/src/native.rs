//! Native member bodies.
//!
//! Every method, property accessor and runtime-dispatched member is backed
//! by a [`NativeFn`]. Arguments arrive as a mutable slice: instance members
//! receive their receiver at index 0, generic methods receive their type
//! arguments as leading [`Value::Type`]s, and by-ref parameters are written
//! back from the slice after the call returns.

use std::fmt;
use std::sync::Arc;

use hostinterop_core::{RuntimeError, TypeHash, Value};

/// Trait for anything callable as a native member body.
pub trait NativeCallable {
    /// Invoke with the given arguments.
    fn call(&self, args: &mut [Value]) -> Result<Value, RuntimeError>;
}

impl<F> NativeCallable for F
where
    F: Fn(&mut [Value]) -> Result<Value, RuntimeError>,
{
    fn call(&self, args: &mut [Value]) -> Result<Value, RuntimeError> {
        self(args)
    }
}

/// A shareable native member body.
#[derive(Clone)]
pub struct NativeFn {
    /// Hash of the member this body implements.
    pub id: TypeHash,
    inner: Arc<dyn NativeCallable + Send + Sync>,
}

impl NativeFn {
    /// Wrap a callable as the body of member `id`.
    pub fn new<F>(id: TypeHash, f: F) -> Self
    where
        F: NativeCallable + Send + Sync + 'static,
    {
        Self {
            id,
            inner: Arc::new(f),
        }
    }

    /// Call this native function.
    pub fn call(&self, args: &mut [Value]) -> Result<Value, RuntimeError> {
        self.inner.call(args)
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFn")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Extraction of Rust values from VM slots.
pub trait FromValue: Sized {
    /// Host type name used in cast errors.
    const EXPECTED: &'static str;

    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! from_value {
    ($ty:ty, $variant:ident, $name:literal) => {
        impl FromValue for $ty {
            const EXPECTED: &'static str = $name;

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }
    };
}

from_value!(bool, Bool, "System.Boolean");
from_value!(char, Char, "System.Char");
from_value!(i32, I32, "System.Int32");
from_value!(i64, I64, "System.Int64");
from_value!(f32, F32, "System.Single");
from_value!(f64, F64, "System.Double");
from_value!(Arc<str>, Str, "System.String");

/// Read argument `index` as a `T`, or fail with `InvalidCast`.
pub fn arg<T: FromValue>(args: &[Value], index: usize) -> Result<T, RuntimeError> {
    let value = args
        .get(index)
        .ok_or_else(|| RuntimeError::Native {
            message: format!("missing argument {}", index),
        })?;
    T::from_value(value).ok_or_else(|| RuntimeError::InvalidCast {
        from: value.type_name(),
        to: T::EXPECTED.to_string(),
    })
}
