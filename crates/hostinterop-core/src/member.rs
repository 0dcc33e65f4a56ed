//! Reflected member descriptors.
//!
//! Descriptors are produced by a [`MemberOracle`](crate::MemberOracle) and
//! consumed by the resolver and the code generator. They are shared
//! (`Arc`) because one descriptor is referenced by every node that resolved
//! to it.

use std::sync::Arc;

use crate::{HostType, TypeHash};

/// A field of a host type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub hash: TypeHash,
    pub owner: HostType,
    pub name: String,
    pub field_type: HostType,
    pub is_static: bool,
}

/// A property (getter/setter pair) of a host type.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDef {
    pub hash: TypeHash,
    pub owner: HostType,
    pub name: String,
    pub property_type: HostType,
    pub is_static: bool,
    pub writable: bool,
}

/// A method parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDef {
    pub name: String,
    pub param_type: HostType,
    /// Passed by mutable reference (`ref`/`out` on the host).
    pub by_ref: bool,
}

impl ParamDef {
    /// A by-value parameter.
    pub fn new(name: impl Into<String>, param_type: HostType) -> Self {
        Self {
            name: name.into(),
            param_type,
            by_ref: false,
        }
    }

    /// A by-reference parameter.
    pub fn by_ref(name: impl Into<String>, param_type: HostType) -> Self {
        Self {
            name: name.into(),
            param_type,
            by_ref: true,
        }
    }
}

/// A method of a host type.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDef {
    pub hash: TypeHash,
    pub owner: HostType,
    pub name: String,
    pub params: Vec<ParamDef>,
    pub return_type: HostType,
    pub is_static: bool,
    /// Number of generic type parameters (0 for non-generic methods).
    pub generic_arity: usize,
}

impl MethodDef {
    /// Number of declared parameters.
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Declared parameter types, in order.
    pub fn param_types(&self) -> impl Iterator<Item = &HostType> {
        self.params.iter().map(|p| &p.param_type)
    }

    /// `Name(T1, T2)` for diagnostics.
    pub fn signature(&self) -> String {
        let params: Vec<String> = self.param_types().map(HostType::name).collect();
        format!("{}({})", self.name, params.join(", "))
    }
}

/// A resolved member: exactly one field, property or method.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberDescriptor {
    Field(Arc<FieldDef>),
    Property(Arc<PropertyDef>),
    Method(Arc<MethodDef>),
}

impl MemberDescriptor {
    /// The member's name.
    pub fn name(&self) -> &str {
        match self {
            MemberDescriptor::Field(f) => &f.name,
            MemberDescriptor::Property(p) => &p.name,
            MemberDescriptor::Method(m) => &m.name,
        }
    }

    /// Whether the member is static.
    pub fn is_static(&self) -> bool {
        match self {
            MemberDescriptor::Field(f) => f.is_static,
            MemberDescriptor::Property(p) => p.is_static,
            MemberDescriptor::Method(m) => m.is_static,
        }
    }

    /// The member's declared value type (return type for methods).
    pub fn value_type(&self) -> &HostType {
        match self {
            MemberDescriptor::Field(f) => &f.field_type,
            MemberDescriptor::Property(p) => &p.property_type,
            MemberDescriptor::Method(m) => &m.return_type,
        }
    }

    /// The member's hash.
    pub fn hash(&self) -> TypeHash {
        match self {
            MemberDescriptor::Field(f) => f.hash,
            MemberDescriptor::Property(p) => p.hash,
            MemberDescriptor::Method(m) => m.hash,
        }
    }

    pub fn as_method(&self) -> Option<&Arc<MethodDef>> {
        match self {
            MemberDescriptor::Method(m) => Some(m),
            _ => None,
        }
    }
}
