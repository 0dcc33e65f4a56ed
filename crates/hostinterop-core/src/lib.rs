//! Host interop core types.
//!
//! Shared vocabulary of the interop compiler, the type registry and the
//! reference VM:
//!
//! - [`HostType`] / [`PrimitiveKind`]: static host types
//! - [`TypeHash`]: deterministic identity of types and members
//! - [`Form`] / [`Symbol`]: reader output consumed by the compiler
//! - [`Value`]: literal and runtime values
//! - [`MemberDescriptor`]: reflected fields, properties and methods
//! - [`MemberOracle`], [`NamespaceMap`], [`ConstantRegistry`]: collaborator contracts
//! - [`cast_primitive`]: runtime primitive cast helpers
//! - error types for every phase

mod convert;
mod error;
mod form;
mod host_type;
mod member;
mod oracle;
mod span;
mod symbol;
mod type_hash;
mod value;

pub use convert::{CastMode, boolean_cast, cast_primitive};
pub use error::{CompilationError, Error, LookupError, RegistrationError, RuntimeError};
pub use form::{Form, FormKind};
pub use host_type::{ClassRef, HostType, OBJECT_TYPE_NAME, PrimitiveKind, VOID_TYPE_NAME};
pub use member::{FieldDef, MemberDescriptor, MethodDef, ParamDef, PropertyDef};
pub use oracle::{ConstantRegistry, MemberOracle, MemberQuery, NamespaceMap};
pub use span::Span;
pub use symbol::{Symbol, munge};
pub use type_hash::{TypeHash, hash_constants};
pub use value::{HostObject, Value, lang_types};
