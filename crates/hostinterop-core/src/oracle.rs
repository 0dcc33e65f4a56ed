//! Contracts of the collaborators the interop compiler queries.
//!
//! The compiler never reflects over host types itself. It asks a
//! [`MemberOracle`] for candidate members, a [`NamespaceMap`] for the active
//! namespace's imports and a [`ConstantRegistry`] for constant-pool slots.
//! Implementations must be internally synchronized where they mutate
//! (`ConstantRegistry::register` takes `&self`).

use crate::{HostType, LookupError, MemberDescriptor, Symbol, Value};

/// A member lookup request.
#[derive(Debug, Clone, Copy)]
pub struct MemberQuery<'a> {
    /// The type whose members are searched.
    pub owner: &'a HostType,
    /// Host (munged) member name.
    pub name: &'a str,
    /// Search static members (`true`) or instance members (`false`).
    pub is_static: bool,
    /// Number of supplied arguments. Fields and properties only match 0.
    pub arity: usize,
    /// Statically known argument types, `None` where unknown.
    pub arg_hints: &'a [Option<HostType>],
}

/// Reflection over host types.
pub trait MemberOracle {
    /// All members named `query.name` on `query.owner` with the requested
    /// staticness and arity. Methods match when their parameter count equals
    /// the arity; fields and properties match only arity 0.
    fn lookup(&self, query: &MemberQuery<'_>) -> Vec<MemberDescriptor>;

    /// Global lookup of a type by qualified name (`Ns.Type`, `Ns.Type[]`).
    ///
    /// `Ok(None)` means no such type; `Err` means the lookup itself failed
    /// (malformed name, failing loader).
    fn find_type(&self, qualified_name: &str) -> Result<Option<HostType>, LookupError>;

    /// Whether code outside the type's assembly may name it.
    fn is_visible(&self, ty: &HostType) -> bool;

    /// Whether a value of static type `from` is usable where `to` is
    /// expected without conversion (identity, subclass, `object`).
    fn is_assignable(&self, from: &HostType, to: &HostType) -> bool;
}

/// The active namespace's symbol → type mapping (imports and aliases).
pub trait NamespaceMap {
    fn get_mapping(&self, sym: &Symbol) -> Option<HostType>;
}

/// Process-wide constant pool.
pub trait ConstantRegistry {
    /// Store `value` and return its slot id. Ids are assigned atomically and
    /// increase monotonically; every call gets a fresh id.
    fn register(&self, value: Value) -> u32;
}
