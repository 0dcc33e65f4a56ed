//! Host platform types as seen by the interop compiler.
//!
//! [`HostType`] is the static type of a host value: a primitive, the
//! universal `object` type boxed values are typed as, a named class, an
//! array, or `void` for members that produce no value.

use std::fmt;
use std::sync::Arc;

use crate::TypeHash;

/// Primitive (unboxed) host value kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    Bool,
    Char,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Float32,
    Float64,
}

impl PrimitiveKind {
    /// All primitive kinds, in declaration order.
    pub const ALL: [PrimitiveKind; 12] = [
        PrimitiveKind::Bool,
        PrimitiveKind::Char,
        PrimitiveKind::Int8,
        PrimitiveKind::Uint8,
        PrimitiveKind::Int16,
        PrimitiveKind::Uint16,
        PrimitiveKind::Int32,
        PrimitiveKind::Uint32,
        PrimitiveKind::Int64,
        PrimitiveKind::Uint64,
        PrimitiveKind::Float32,
        PrimitiveKind::Float64,
    ];

    /// The host platform's qualified name for this primitive.
    pub const fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "System.Boolean",
            PrimitiveKind::Char => "System.Char",
            PrimitiveKind::Int8 => "System.SByte",
            PrimitiveKind::Uint8 => "System.Byte",
            PrimitiveKind::Int16 => "System.Int16",
            PrimitiveKind::Uint16 => "System.UInt16",
            PrimitiveKind::Int32 => "System.Int32",
            PrimitiveKind::Uint32 => "System.UInt32",
            PrimitiveKind::Int64 => "System.Int64",
            PrimitiveKind::Uint64 => "System.UInt64",
            PrimitiveKind::Float32 => "System.Single",
            PrimitiveKind::Float64 => "System.Double",
        }
    }

    /// Look up a primitive by its qualified host name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Stable one-byte code used as a bytecode operand.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Decode a bytecode operand produced by [`PrimitiveKind::code`].
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    /// Whether this is an integral numeric kind.
    pub const fn is_integer(self) -> bool {
        !matches!(self, PrimitiveKind::Bool | PrimitiveKind::Char) && !self.is_float()
    }

    /// Whether this is a floating point kind.
    pub const fn is_float(self) -> bool {
        matches!(self, PrimitiveKind::Float32 | PrimitiveKind::Float64)
    }

    /// Whether this is a numeric kind (integral or floating point).
    pub const fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float()
    }
}

/// A named (reference or value) class known to the host.
#[derive(Clone)]
pub struct ClassRef {
    hash: TypeHash,
    name: Arc<str>,
}

impl ClassRef {
    /// Create a class reference from its qualified name.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        let name = name.into();
        Self {
            hash: TypeHash::from_name(&name),
            name,
        }
    }

    /// The class's qualified name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The class's type hash.
    pub fn hash(&self) -> TypeHash {
        self.hash
    }
}

impl PartialEq for ClassRef {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for ClassRef {}

impl std::hash::Hash for ClassRef {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

impl fmt::Debug for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// The static type of a host value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HostType {
    /// No value (return type of procedures).
    Void,
    /// The universal reference type; boxed values are typed as this.
    Object,
    /// An unboxed primitive.
    Primitive(PrimitiveKind),
    /// A named class.
    Class(ClassRef),
    /// A single-dimension array of the element type.
    Array(Box<HostType>),
}

/// Qualified name of [`HostType::Object`].
pub const OBJECT_TYPE_NAME: &str = "System.Object";

/// Qualified name of [`HostType::Void`].
pub const VOID_TYPE_NAME: &str = "System.Void";

impl HostType {
    /// Shorthand for a primitive type.
    pub const fn primitive(kind: PrimitiveKind) -> Self {
        HostType::Primitive(kind)
    }

    /// Shorthand for a named class type.
    pub fn class(name: impl Into<Arc<str>>) -> Self {
        HostType::Class(ClassRef::new(name))
    }

    /// Shorthand for an array type.
    pub fn array_of(element: HostType) -> Self {
        HostType::Array(Box::new(element))
    }

    /// The primitive kind, if this is a primitive type.
    pub fn as_primitive(&self) -> Option<PrimitiveKind> {
        match self {
            HostType::Primitive(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Whether this is a primitive type.
    pub fn is_primitive(&self) -> bool {
        matches!(self, HostType::Primitive(_))
    }

    /// Whether this is `void`.
    pub fn is_void(&self) -> bool {
        matches!(self, HostType::Void)
    }

    /// Qualified host name (`System.Int32[]` for arrays).
    pub fn name(&self) -> String {
        match self {
            HostType::Void => VOID_TYPE_NAME.to_string(),
            HostType::Object => OBJECT_TYPE_NAME.to_string(),
            HostType::Primitive(kind) => kind.name().to_string(),
            HostType::Class(class) => class.name().to_string(),
            HostType::Array(element) => format!("{}[]", element.name()),
        }
    }

    /// The deterministic hash of this type's qualified name.
    pub fn type_hash(&self) -> TypeHash {
        match self {
            HostType::Class(class) => class.hash(),
            other => TypeHash::from_name(&other.name()),
        }
    }
}

impl fmt::Display for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_codes_round_trip() {
        for kind in PrimitiveKind::ALL {
            assert_eq!(PrimitiveKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(PrimitiveKind::from_code(200), None);
    }

    #[test]
    fn primitive_classification() {
        assert!(PrimitiveKind::Int32.is_integer());
        assert!(!PrimitiveKind::Bool.is_numeric());
        assert!(!PrimitiveKind::Char.is_numeric());
        assert!(PrimitiveKind::Float32.is_float());
    }

    #[test]
    fn array_names_and_hashes() {
        let ints = HostType::array_of(HostType::primitive(PrimitiveKind::Int32));
        assert_eq!(ints.name(), "System.Int32[]");
        assert_eq!(ints.type_hash(), TypeHash::from_name("System.Int32[]"));
    }

    #[test]
    fn class_equality_is_by_name() {
        let string = HostType::class("System.String");
        assert_eq!(string, HostType::class("System.String"));
        assert_ne!(HostType::class("System.String"), HostType::Object);
        assert_eq!(
            HostType::class("A.B").type_hash(),
            TypeHash::from_name("A.B")
        );
    }
}
