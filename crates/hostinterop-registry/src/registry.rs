//! HostRegistry - reflected host types and their members.
//!
//! This module provides [`HostRegistry`], the in-memory stand-in for the host
//! platform's reflection API. The compiler only sees it through the
//! [`MemberOracle`] contract; the reference VM additionally uses it to reach
//! the native body behind every member hash.
//!
//! # Storage Model
//!
//! - **Types**: `TypeEntry` by qualified name (`System.Math`, `lang.Symbol`)
//! - **Members**: one map of `MemberEntry` by member hash, plus a per-owner
//!   index of member hashes in registration order
//! - **Statics**: static field values behind a mutex, so the registry can be
//!   shared read-only across threads once populated
//!
//! # Example
//!
//! ```
//! use hostinterop_core::{HostType, MemberOracle, MemberQuery, PrimitiveKind, Value};
//! use hostinterop_registry::{HostRegistry, TypeFlags};
//!
//! let mut registry = HostRegistry::with_builtins();
//! registry
//!     .register_type("Demo.Counter", TypeFlags::PUBLIC, None)
//!     .unwrap()
//!     .static_field("Start", HostType::primitive(PrimitiveKind::Int64), Value::I64(10));
//!
//! let owner = registry.find_type("Demo.Counter").unwrap().unwrap();
//! let found = registry.lookup(&MemberQuery {
//!     owner: &owner,
//!     name: "Start",
//!     is_static: true,
//!     arity: 0,
//!     arg_hints: &[],
//! });
//! assert_eq!(found.len(), 1);
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use bitflags::bitflags;
use log::{debug, trace};
use rustc_hash::FxHashMap;

use hostinterop_core::{
    CastMode, FieldDef, HostType, LookupError, MemberDescriptor, MemberOracle, MemberQuery,
    MethodDef, OBJECT_TYPE_NAME, ParamDef, PrimitiveKind, PropertyDef, RegistrationError,
    RuntimeError, TypeHash, VOID_TYPE_NAME, Value, cast_primitive,
};

use crate::native::{NativeCallable, NativeFn};

bitflags! {
    /// Reflection attributes of a registered type.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TypeFlags: u8 {
        /// Visible outside its defining assembly.
        const PUBLIC = 1 << 0;
        /// A value type (primitives and structs).
        const VALUE_TYPE = 1 << 1;
        /// Cannot be instantiated.
        const ABSTRACT = 1 << 2;
    }
}

/// A registered host type.
#[derive(Debug, Clone)]
pub struct TypeEntry {
    pub ty: HostType,
    pub flags: TypeFlags,
    /// Explicit base class; classes without one derive from `System.Object`.
    pub base: Option<HostType>,
}

/// How a member is realised at run time.
#[derive(Debug, Clone)]
pub enum MemberBody {
    /// Stored on the receiving `HostObject` under the field's name.
    InstanceField,
    /// Stored in the registry's static table under the field's hash.
    StaticField,
    Property {
        getter: NativeFn,
        setter: Option<NativeFn>,
    },
    Method(NativeFn),
}

#[derive(Debug, Clone)]
struct MemberEntry {
    descriptor: MemberDescriptor,
    body: MemberBody,
}

/// Reflected host type registry.
///
/// Populated single-threaded, then read concurrently. The only interior
/// mutability is the static field table.
#[derive(Default)]
pub struct HostRegistry {
    /// Types by qualified name.
    types: FxHashMap<String, TypeEntry>,

    /// Owner type hash -> member hashes, in registration order.
    members_by_owner: FxHashMap<TypeHash, Vec<TypeHash>>,

    /// All members by member hash.
    members: FxHashMap<TypeHash, MemberEntry>,

    /// Static field storage.
    statics: Mutex<FxHashMap<TypeHash, Value>>,
}

impl HostRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with `System.Object`, `System.Void` and every
    /// primitive type pre-registered.
    pub fn with_primitives() -> Self {
        let mut registry = Self::new();
        registry.register_all_primitives();
        registry
    }

    /// Register `System.Object`, `System.Void` and the primitive types.
    ///
    /// Always succeeds; existing entries are overwritten.
    pub fn register_all_primitives(&mut self) {
        self.define(OBJECT_TYPE_NAME, HostType::Object, TypeFlags::PUBLIC);
        self.define(
            VOID_TYPE_NAME,
            HostType::Void,
            TypeFlags::PUBLIC | TypeFlags::VALUE_TYPE,
        );
        for kind in PrimitiveKind::ALL {
            self.define(
                kind.name(),
                HostType::primitive(kind),
                TypeFlags::PUBLIC | TypeFlags::VALUE_TYPE,
            );
        }
    }

    /// Insert a type entry without validation.
    pub(crate) fn define(
        &mut self,
        name: &str,
        ty: HostType,
        flags: TypeFlags,
    ) -> ClassBuilder<'_> {
        self.types.insert(
            name.to_string(),
            TypeEntry {
                ty: ty.clone(),
                flags,
                base: None,
            },
        );
        ClassBuilder {
            registry: self,
            owner: ty,
        }
    }

    // ==========================================================================
    // Registration
    // ==========================================================================

    /// Register a new class type and return a builder for its members.
    ///
    /// Returns an error if the name is malformed, already registered, or
    /// `base` names an unknown type.
    pub fn register_type(
        &mut self,
        name: &str,
        flags: TypeFlags,
        base: Option<&str>,
    ) -> Result<ClassBuilder<'_>, RegistrationError> {
        if !is_valid_type_name(name) {
            return Err(RegistrationError::InvalidTypeName {
                name: name.to_string(),
            });
        }
        if self.types.contains_key(name) {
            return Err(RegistrationError::DuplicateType {
                name: name.to_string(),
            });
        }
        let base = match base {
            Some(base_name) => Some(
                self.types
                    .get(base_name)
                    .map(|e| e.ty.clone())
                    .ok_or_else(|| RegistrationError::UnknownType {
                        name: base_name.to_string(),
                    })?,
            ),
            None => None,
        };

        debug!("registering host type {}", name);
        let ty = HostType::class(name);
        self.types.insert(
            name.to_string(),
            TypeEntry {
                ty: ty.clone(),
                flags,
                base,
            },
        );
        Ok(ClassBuilder {
            registry: self,
            owner: ty,
        })
    }

    /// Get a builder that adds members to an already registered type.
    pub fn extend(&mut self, name: &str) -> Result<ClassBuilder<'_>, RegistrationError> {
        let ty = self
            .types
            .get(name)
            .map(|e| e.ty.clone())
            .ok_or_else(|| RegistrationError::UnknownType {
                name: name.to_string(),
            })?;
        Ok(ClassBuilder {
            registry: self,
            owner: ty,
        })
    }

    fn add_member(&mut self, owner: &HostType, descriptor: MemberDescriptor, body: MemberBody) {
        let hash = descriptor.hash();
        trace!(
            "registering member {}::{} ({})",
            owner,
            descriptor.name(),
            hash
        );
        let index = self.members_by_owner.entry(owner.type_hash()).or_default();
        if !index.contains(&hash) {
            index.push(hash);
        }
        self.members.insert(hash, MemberEntry { descriptor, body });
    }

    // ==========================================================================
    // Type Queries
    // ==========================================================================

    /// Get a type entry by qualified name.
    pub fn get_type(&self, name: &str) -> Option<&TypeEntry> {
        self.types.get(name)
    }

    /// Number of registered types.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Number of registered members.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// The type `ty` inherits members from, if any.
    pub fn base_of(&self, ty: &HostType) -> Option<HostType> {
        match ty {
            HostType::Object | HostType::Void => None,
            HostType::Class(class) => Some(
                self.types
                    .get(class.name())
                    .and_then(|e| e.base.clone())
                    .unwrap_or(HostType::Object),
            ),
            HostType::Primitive(_) | HostType::Array(_) => Some(HostType::Object),
        }
    }

    // ==========================================================================
    // Member Queries
    // ==========================================================================

    /// Get a member's descriptor and body by member hash.
    pub fn member(&self, hash: TypeHash) -> Option<(&MemberDescriptor, &MemberBody)> {
        self.members.get(&hash).map(|e| (&e.descriptor, &e.body))
    }

    /// Members of `owner` and its bases named `name`, most derived first.
    ///
    /// Base members hidden by a derived member of the same shape are skipped.
    fn members_named(&self, owner: &HostType, name: &str) -> Vec<&MemberEntry> {
        let mut found: Vec<&MemberEntry> = Vec::new();
        let mut current = Some(owner.clone());
        while let Some(ty) = current {
            if let Some(hashes) = self.members_by_owner.get(&ty.type_hash()) {
                for entry in hashes.iter().filter_map(|h| self.members.get(h)) {
                    if entry.descriptor.name() != name {
                        continue;
                    }
                    let descriptor = &entry.descriptor;
                    if found.iter().any(|f| hides(&f.descriptor, descriptor)) {
                        continue;
                    }
                    found.push(entry);
                }
            }
            current = self.base_of(&ty);
        }
        found
    }

    // ==========================================================================
    // Runtime Access
    // ==========================================================================

    /// Invoke the method with hash `hash`.
    pub fn invoke(&self, hash: TypeHash, args: &mut [Value]) -> Result<Value, RuntimeError> {
        match self.members.get(&hash) {
            Some(MemberEntry {
                body: MemberBody::Method(f),
                ..
            }) => f.call(args),
            _ => Err(unknown_member(hash)),
        }
    }

    /// Read the field or property with hash `hash`.
    ///
    /// `target` is the receiver for instance members and ignored otherwise.
    pub fn read_member(&self, hash: TypeHash, target: &Value) -> Result<Value, RuntimeError> {
        let entry = self.members.get(&hash).ok_or_else(|| unknown_member(hash))?;
        read_entry(self, entry, target)
    }

    /// Write the field or property with hash `hash`.
    pub fn write_member(
        &self,
        hash: TypeHash,
        target: &Value,
        value: Value,
    ) -> Result<(), RuntimeError> {
        let entry = self.members.get(&hash).ok_or_else(|| unknown_member(hash))?;
        write_entry(self, entry, target, value)
    }

    /// Read a static field value.
    pub fn static_value(&self, hash: TypeHash) -> Result<Value, RuntimeError> {
        let statics = self.statics.lock().map_err(|_| poisoned_statics())?;
        Ok(statics.get(&hash).cloned().unwrap_or(Value::Nil))
    }

    fn set_static_value(&self, hash: TypeHash, value: Value) -> Result<(), RuntimeError> {
        self.statics
            .lock()
            .map_err(|_| poisoned_statics())?
            .insert(hash, value);
        Ok(())
    }

    /// Runtime member resolution for calls whose receiver type was unknown
    /// at compile time.
    ///
    /// `args[0]` is the receiver. With no further arguments the member may be
    /// a field, property or zero-argument method, tried in that order;
    /// otherwise the first method of matching arity whose parameters accept
    /// the runtime arguments is called.
    pub fn invoke_dynamic(&self, name: &str, args: &mut [Value]) -> Result<Value, RuntimeError> {
        let receiver = args.first().ok_or(RuntimeError::StackUnderflow)?;
        let owner = receiver
            .runtime_type()
            .ok_or_else(|| RuntimeError::NullReference {
                member: name.to_string(),
            })?;
        let candidates = self.members_named(&owner, name);
        let arity = args.len() - 1;
        trace!(
            "dynamic lookup {}.{}/{}: {} candidate(s)",
            owner,
            name,
            arity,
            candidates.len()
        );

        if arity == 0 {
            let kinds: [fn(&MemberDescriptor) -> bool; 3] = [
                |d| matches!(d, MemberDescriptor::Field(_)),
                |d| matches!(d, MemberDescriptor::Property(_)),
                |d| matches!(d, MemberDescriptor::Method(m) if m.arity() == 0),
            ];
            for matches_kind in kinds {
                let hit = candidates
                    .iter()
                    .find(|e| !e.descriptor.is_static() && matches_kind(&e.descriptor));
                if let Some(entry) = hit {
                    return match &entry.body {
                        MemberBody::Method(f) => f.call(args),
                        _ => read_entry(self, entry, &args[0]),
                    };
                }
            }
        }

        let (receiver, rest) = args.split_first_mut().ok_or(RuntimeError::StackUnderflow)?;
        for entry in &candidates {
            let (MemberDescriptor::Method(method), MemberBody::Method(f)) =
                (&entry.descriptor, &entry.body)
            else {
                continue;
            };
            if method.is_static || method.arity() != arity || method.generic_arity != 0 {
                continue;
            }
            let coerced: Option<Vec<Value>> = method
                .param_types()
                .zip(rest.iter())
                .map(|(param, value)| coerce_runtime(self, value, param))
                .collect();
            if let Some(coerced) = coerced {
                debug!(
                    "dynamic dispatch {}.{} -> {}",
                    owner,
                    name,
                    method.signature()
                );
                let mut call_args = Vec::with_capacity(arity + 1);
                call_args.push(receiver.clone());
                call_args.extend(coerced);
                let result = f.call(&mut call_args)?;
                for (slot, value) in rest.iter_mut().zip(call_args.into_iter().skip(1)) {
                    *slot = value;
                }
                return Ok(result);
            }
        }

        Err(RuntimeError::MissingMember {
            type_name: owner.name(),
            member: name.to_string(),
            arity,
        })
    }

    /// Runtime field/property read by name.
    pub fn get_dynamic(&self, target: &Value, name: &str) -> Result<Value, RuntimeError> {
        let entry = self.dynamic_slot(target, name)?;
        read_entry(self, entry, target)
    }

    /// Runtime field/property write by name.
    pub fn set_dynamic(
        &self,
        target: &Value,
        name: &str,
        value: Value,
    ) -> Result<(), RuntimeError> {
        let entry = self.dynamic_slot(target, name)?;
        write_entry(self, entry, target, value)
    }

    fn dynamic_slot(&self, target: &Value, name: &str) -> Result<&MemberEntry, RuntimeError> {
        let owner = target
            .runtime_type()
            .ok_or_else(|| RuntimeError::NullReference {
                member: name.to_string(),
            })?;
        self.members_named(&owner, name)
            .into_iter()
            .find(|e| {
                !e.descriptor.is_static()
                    && matches!(
                        e.descriptor,
                        MemberDescriptor::Field(_) | MemberDescriptor::Property(_)
                    )
            })
            .ok_or_else(|| RuntimeError::MissingMember {
                type_name: owner.name(),
                member: name.to_string(),
                arity: 0,
            })
    }
}

impl MemberOracle for HostRegistry {
    fn lookup(&self, query: &MemberQuery<'_>) -> Vec<MemberDescriptor> {
        let found: Vec<MemberDescriptor> = self
            .members_named(query.owner, query.name)
            .into_iter()
            .map(|e| &e.descriptor)
            .filter(|d| d.is_static() == query.is_static)
            .filter(|d| match d {
                MemberDescriptor::Method(m) => m.arity() == query.arity,
                MemberDescriptor::Field(_) | MemberDescriptor::Property(_) => query.arity == 0,
            })
            .cloned()
            .collect();
        trace!(
            "lookup {}{}{}/{} -> {} candidate(s)",
            query.owner,
            if query.is_static { "/" } else { "." },
            query.name,
            query.arity,
            found.len()
        );
        found
    }

    fn find_type(&self, qualified_name: &str) -> Result<Option<HostType>, LookupError> {
        if let Some(element) = qualified_name.strip_suffix("[]") {
            return Ok(self.find_type(element)?.map(HostType::array_of));
        }
        if !is_valid_type_name(qualified_name) {
            return Err(LookupError::MalformedName {
                name: qualified_name.to_string(),
            });
        }
        Ok(self.types.get(qualified_name).map(|e| e.ty.clone()))
    }

    fn is_visible(&self, ty: &HostType) -> bool {
        match ty {
            HostType::Void | HostType::Object | HostType::Primitive(_) => true,
            HostType::Array(element) => self.is_visible(element),
            HostType::Class(class) => self
                .types
                .get(class.name())
                .is_some_and(|e| e.flags.contains(TypeFlags::PUBLIC)),
        }
    }

    fn is_assignable(&self, from: &HostType, to: &HostType) -> bool {
        if from == to {
            return true;
        }
        if *to == HostType::Object {
            return !from.is_void();
        }
        if !matches!(from, HostType::Class(_)) {
            return false;
        }
        let mut current = self.base_of(from);
        while let Some(ty) = current {
            if ty == *to {
                return true;
            }
            current = self.base_of(&ty);
        }
        false
    }
}

impl std::fmt::Debug for HostRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostRegistry")
            .field("types", &self.types.len())
            .field("members", &self.members.len())
            .finish()
    }
}

// ============================================================================
// ClassBuilder
// ============================================================================

/// Adds members to one registered type.
pub struct ClassBuilder<'r> {
    registry: &'r mut HostRegistry,
    owner: HostType,
}

impl ClassBuilder<'_> {
    /// The type being built.
    pub fn host_type(&self) -> &HostType {
        &self.owner
    }

    fn field_def(&self, name: &str, ty: HostType, is_static: bool) -> FieldDef {
        FieldDef {
            hash: TypeHash::from_member(self.owner.type_hash(), name),
            owner: self.owner.clone(),
            name: name.to_string(),
            field_type: ty,
            is_static,
        }
    }

    /// Add an instance field.
    pub fn field(self, name: &str, ty: HostType) -> Self {
        let def = self.field_def(name, ty, false);
        self.registry.add_member(
            &self.owner,
            MemberDescriptor::Field(Arc::new(def)),
            MemberBody::InstanceField,
        );
        self
    }

    /// Add a static field with its initial value.
    pub fn static_field(self, name: &str, ty: HostType, initial: Value) -> Self {
        let def = self.field_def(name, ty, true);
        // Registration holds the registry exclusively, so no lock is taken.
        self.registry
            .statics
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(def.hash, initial);
        self.registry.add_member(
            &self.owner,
            MemberDescriptor::Field(Arc::new(def)),
            MemberBody::StaticField,
        );
        self
    }

    fn add_property(
        self,
        name: &str,
        ty: HostType,
        is_static: bool,
        getter: NativeFn,
        setter: Option<NativeFn>,
    ) -> Self {
        let def = PropertyDef {
            hash: getter.id,
            owner: self.owner.clone(),
            name: name.to_string(),
            property_type: ty,
            is_static,
            writable: setter.is_some(),
        };
        self.registry.add_member(
            &self.owner,
            MemberDescriptor::Property(Arc::new(def)),
            MemberBody::Property { getter, setter },
        );
        self
    }

    /// Add a read-only instance property. The getter receives the receiver.
    pub fn property<F>(self, name: &str, ty: HostType, getter: F) -> Self
    where
        F: NativeCallable + Send + Sync + 'static,
    {
        let hash = TypeHash::from_member(self.owner.type_hash(), name);
        self.add_property(name, ty, false, NativeFn::new(hash, getter), None)
    }

    /// Add a read/write instance property. The setter receives
    /// `[receiver, value]`.
    pub fn writable_property<G, S>(self, name: &str, ty: HostType, getter: G, setter: S) -> Self
    where
        G: NativeCallable + Send + Sync + 'static,
        S: NativeCallable + Send + Sync + 'static,
    {
        let hash = TypeHash::from_member(self.owner.type_hash(), name);
        let getter = NativeFn::new(hash, getter);
        let setter = NativeFn::new(hash, setter);
        self.add_property(name, ty, false, getter, Some(setter))
    }

    /// Add a read-only static property.
    pub fn static_property<F>(self, name: &str, ty: HostType, getter: F) -> Self
    where
        F: NativeCallable + Send + Sync + 'static,
    {
        let hash = TypeHash::from_member(self.owner.type_hash(), name);
        self.add_property(name, ty, true, NativeFn::new(hash, getter), None)
    }

    fn add_method<F>(
        self,
        name: &str,
        params: Vec<ParamDef>,
        return_type: HostType,
        is_static: bool,
        generic_arity: usize,
        f: F,
    ) -> Self
    where
        F: NativeCallable + Send + Sync + 'static,
    {
        let param_hashes: Vec<TypeHash> = params.iter().map(|p| p.param_type.type_hash()).collect();
        let hash = TypeHash::from_method(self.owner.type_hash(), name, &param_hashes);
        let def = MethodDef {
            hash,
            owner: self.owner.clone(),
            name: name.to_string(),
            params,
            return_type,
            is_static,
            generic_arity,
        };
        self.registry.add_member(
            &self.owner,
            MemberDescriptor::Method(Arc::new(def)),
            MemberBody::Method(NativeFn::new(hash, f)),
        );
        self
    }

    /// Add an instance method. The body receives `[receiver, args...]`.
    pub fn method<F>(self, name: &str, params: Vec<ParamDef>, return_type: HostType, f: F) -> Self
    where
        F: NativeCallable + Send + Sync + 'static,
    {
        self.add_method(name, params, return_type, false, 0, f)
    }

    /// Add a static method.
    pub fn static_method<F>(
        self,
        name: &str,
        params: Vec<ParamDef>,
        return_type: HostType,
        f: F,
    ) -> Self
    where
        F: NativeCallable + Send + Sync + 'static,
    {
        self.add_method(name, params, return_type, true, 0, f)
    }

    /// Add a generic static method taking `generic_arity` type arguments.
    /// The body receives `[type args..., args...]`.
    pub fn generic_static_method<F>(
        self,
        name: &str,
        generic_arity: usize,
        params: Vec<ParamDef>,
        return_type: HostType,
        f: F,
    ) -> Self
    where
        F: NativeCallable + Send + Sync + 'static,
    {
        self.add_method(name, params, return_type, true, generic_arity, f)
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Whether `name` is usable as a qualified type name.
fn is_valid_type_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.ends_with('.')
        && !name.contains("..")
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '.' || c == '`')
}

/// Whether `derived` hides `base` during member lookup.
fn hides(derived: &MemberDescriptor, base: &MemberDescriptor) -> bool {
    match (derived, base) {
        (MemberDescriptor::Method(d), MemberDescriptor::Method(b)) => {
            d.is_static == b.is_static && d.param_types().eq(b.param_types())
        }
        (MemberDescriptor::Method(_), _) | (_, MemberDescriptor::Method(_)) => false,
        (d, b) => d.is_static() == b.is_static(),
    }
}

fn poisoned_statics() -> RuntimeError {
    RuntimeError::Poisoned {
        what: "static field storage".to_string(),
    }
}

fn unknown_member(hash: TypeHash) -> RuntimeError {
    RuntimeError::MissingMember {
        type_name: "<unknown>".to_string(),
        member: hash.to_string(),
        arity: 0,
    }
}

fn read_entry(
    registry: &HostRegistry,
    entry: &MemberEntry,
    target: &Value,
) -> Result<Value, RuntimeError> {
    let name = entry.descriptor.name();
    match &entry.body {
        MemberBody::StaticField => registry.static_value(entry.descriptor.hash()),
        MemberBody::InstanceField => match target {
            Value::Object(obj) => Ok(obj.get(name)),
            Value::Nil => Err(RuntimeError::NullReference {
                member: name.to_string(),
            }),
            other => Err(RuntimeError::MissingMember {
                type_name: other.type_name(),
                member: name.to_string(),
                arity: 0,
            }),
        },
        MemberBody::Property { getter, .. } => {
            if entry.descriptor.is_static() {
                getter.call(&mut [])
            } else if matches!(target, Value::Nil) {
                Err(RuntimeError::NullReference {
                    member: name.to_string(),
                })
            } else {
                getter.call(&mut [target.clone()])
            }
        }
        MemberBody::Method(f) => f.call(&mut [target.clone()]),
    }
}

fn write_entry(
    registry: &HostRegistry,
    entry: &MemberEntry,
    target: &Value,
    value: Value,
) -> Result<(), RuntimeError> {
    let name = entry.descriptor.name();
    match &entry.body {
        MemberBody::StaticField => registry.set_static_value(entry.descriptor.hash(), value),
        MemberBody::InstanceField => match target {
            Value::Object(obj) => {
                obj.set(name, value);
                Ok(())
            }
            _ => Err(RuntimeError::NullReference {
                member: name.to_string(),
            }),
        },
        MemberBody::Property {
            setter: Some(setter),
            ..
        } => {
            let mut args = if entry.descriptor.is_static() {
                vec![value]
            } else {
                vec![target.clone(), value]
            };
            setter.call(&mut args).map(|_| ())
        }
        MemberBody::Property { setter: None, .. } | MemberBody::Method(_) => {
            Err(RuntimeError::Native {
                message: format!("member '{}' is not assignable", name),
            })
        }
    }
}

/// Convert a runtime argument to a parameter type, or `None` if it does not
/// fit.
fn coerce_runtime(registry: &HostRegistry, value: &Value, param: &HostType) -> Option<Value> {
    match param {
        HostType::Object => Some(value.clone()),
        HostType::Void => None,
        HostType::Primitive(kind) => {
            if value.primitive_kind() == Some(*kind) {
                return Some(value.clone());
            }
            let convertible = match kind {
                PrimitiveKind::Bool => false,
                _ => value.is_numeric() || matches!(value, Value::Char(_)),
            };
            if !convertible {
                return None;
            }
            cast_primitive(value, *kind, CastMode::Checked).ok()
        }
        HostType::Class(_) | HostType::Array(_) => match value.runtime_type() {
            None => Some(Value::Nil),
            Some(actual) if registry.is_assignable(&actual, param) => Some(value.clone()),
            Some(_) => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostinterop_core::{ClassRef, HostObject};

    fn int32() -> HostType {
        HostType::primitive(PrimitiveKind::Int32)
    }

    fn int64() -> HostType {
        HostType::Primitive(PrimitiveKind::Int64)
    }

    fn sample_registry() -> HostRegistry {
        let mut registry = HostRegistry::with_primitives();
        registry
            .register_type("Demo.Point", TypeFlags::PUBLIC, None)
            .unwrap()
            .field("X", int64())
            .static_field("Origin", HostType::Object, Value::Nil)
            .method(
                "Scale",
                vec![ParamDef::new("by", int32())],
                int64(),
                |args: &mut [Value]| {
                    let Value::Object(obj) = &args[0] else {
                        return Err(RuntimeError::NullReference {
                            member: "Scale".to_string(),
                        });
                    };
                    let Value::I64(x) = obj.get("X") else {
                        return Ok(Value::I64(0));
                    };
                    let Value::I32(by) = args[1] else {
                        return Ok(Value::I64(0));
                    };
                    Ok(Value::I64(x * by as i64))
                },
            );
        registry
            .register_type("Demo.Point3", TypeFlags::PUBLIC, Some("Demo.Point"))
            .unwrap()
            .field("Z", int64());
        registry
            .register_type("Demo.Hidden", TypeFlags::empty(), None)
            .unwrap();
        registry
    }

    fn point(registry: &HostRegistry, x: i64) -> Value {
        let ty = registry.find_type("Demo.Point").unwrap().unwrap();
        let HostType::Class(class) = ty else {
            panic!("expected class");
        };
        Value::Object(HostObject::new(class, [("X".to_string(), Value::I64(x))]))
    }

    #[test]
    fn primitives_are_registered() {
        let registry = HostRegistry::with_primitives();
        assert_eq!(registry.type_count(), PrimitiveKind::ALL.len() + 2);
        assert_eq!(registry.find_type("System.Int32"), Ok(Some(int32())));
        assert_eq!(
            registry.find_type("System.Object"),
            Ok(Some(HostType::Object))
        );
    }

    #[test]
    fn duplicate_and_invalid_types_are_rejected() {
        let mut registry = sample_registry();
        assert!(matches!(
            registry.register_type("Demo.Point", TypeFlags::PUBLIC, None),
            Err(RegistrationError::DuplicateType { .. })
        ));
        assert!(matches!(
            registry.register_type("Demo..Bad", TypeFlags::PUBLIC, None),
            Err(RegistrationError::InvalidTypeName { .. })
        ));
        assert!(matches!(
            registry.register_type("Demo.Orphan", TypeFlags::PUBLIC, Some("Nope")),
            Err(RegistrationError::UnknownType { .. })
        ));
    }

    #[test]
    fn find_type_handles_arrays_and_malformed_names() {
        let registry = sample_registry();
        assert_eq!(
            registry.find_type("System.Int64[]"),
            Ok(Some(HostType::array_of(int64())))
        );
        assert_eq!(registry.find_type("Demo.Missing"), Ok(None));
        assert!(registry.find_type("Demo.Point[").is_err());
        assert!(registry.find_type("").is_err());
    }

    #[test]
    fn lookup_filters_by_kind_staticness_and_arity() {
        let registry = sample_registry();
        let owner = HostType::class("Demo.Point");
        let query = |name: &'static str, is_static: bool, arity: usize| MemberQuery {
            owner: &owner,
            name,
            is_static,
            arity,
            arg_hints: &[],
        };
        assert_eq!(registry.lookup(&query("X", false, 0)).len(), 1);
        assert!(registry.lookup(&query("X", true, 0)).is_empty());
        assert!(registry.lookup(&query("X", false, 1)).is_empty());
        assert_eq!(registry.lookup(&query("Scale", false, 1)).len(), 1);
        assert!(registry.lookup(&query("Scale", false, 0)).is_empty());
        assert_eq!(registry.lookup(&query("Origin", true, 0)).len(), 1);
    }

    #[test]
    fn lookup_walks_base_classes() {
        let registry = sample_registry();
        let owner = HostType::class("Demo.Point3");
        let found = registry.lookup(&MemberQuery {
            owner: &owner,
            name: "X",
            is_static: false,
            arity: 0,
            arg_hints: &[],
        });
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].value_type(), &int64());
    }

    #[test]
    fn visibility_and_assignability() {
        let registry = sample_registry();
        assert!(registry.is_visible(&HostType::class("Demo.Point")));
        assert!(!registry.is_visible(&HostType::class("Demo.Hidden")));
        let hidden_array = HostType::array_of(HostType::class("Demo.Hidden"));
        assert!(!registry.is_visible(&hidden_array));
        assert!(registry.is_visible(&int32()));

        let p3 = HostType::class("Demo.Point3");
        let p = HostType::class("Demo.Point");
        assert!(registry.is_assignable(&p3, &p));
        assert!(!registry.is_assignable(&p, &p3));
        assert!(registry.is_assignable(&int32(), &HostType::Object));
        assert!(!registry.is_assignable(&HostType::Void, &HostType::Object));
        assert!(!registry.is_assignable(&int32(), &int64()));
    }

    #[test]
    fn dynamic_dispatch_reads_fields_and_calls_methods() {
        let registry = sample_registry();
        let p = point(&registry, 7);

        assert_eq!(registry.get_dynamic(&p, "X"), Ok(Value::I64(7)));
        registry.set_dynamic(&p, "X", Value::I64(8)).unwrap();
        assert_eq!(
            registry.invoke_dynamic("X", &mut [p.clone()]),
            Ok(Value::I64(8))
        );

        // I64 argument is converted to the Int32 parameter at run time
        let mut args = [p.clone(), Value::I64(3)];
        assert_eq!(
            registry.invoke_dynamic("Scale", &mut args),
            Ok(Value::I64(24))
        );
    }

    #[test]
    fn dynamic_dispatch_failures() {
        let registry = sample_registry();
        let p = point(&registry, 1);
        assert!(matches!(
            registry.invoke_dynamic("Nope", &mut [p.clone()]),
            Err(RuntimeError::MissingMember { arity: 0, .. })
        ));
        assert!(matches!(
            registry.invoke_dynamic("Scale", &mut [p, Value::string("x")]),
            Err(RuntimeError::MissingMember { arity: 1, .. })
        ));
        assert!(matches!(
            registry.invoke_dynamic("X", &mut [Value::Nil]),
            Err(RuntimeError::NullReference { .. })
        ));
    }

    #[test]
    fn static_fields_live_in_the_registry() {
        let registry = sample_registry();
        let hash = TypeHash::from_member(TypeHash::from_name("Demo.Point"), "Origin");
        assert_eq!(registry.read_member(hash, &Value::Nil), Ok(Value::Nil));
        registry
            .write_member(hash, &Value::Nil, Value::I64(5))
            .unwrap();
        assert_eq!(registry.static_value(hash), Ok(Value::I64(5)));
    }

    #[test]
    fn poisoned_static_storage_is_an_error() {
        let registry = sample_registry();
        let hash = TypeHash::from_member(TypeHash::from_name("Demo.Point"), "Origin");
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = registry.statics.lock().unwrap();
            panic!("panic while holding static storage");
        }));
        assert!(matches!(
            registry.read_member(hash, &Value::Nil),
            Err(RuntimeError::Poisoned { .. })
        ));
        assert!(matches!(
            registry.write_member(hash, &Value::Nil, Value::I64(1)),
            Err(RuntimeError::Poisoned { .. })
        ));
    }

    #[test]
    fn instance_field_on_nil_is_null_reference() {
        let registry = sample_registry();
        let hash = TypeHash::from_member(TypeHash::from_name("Demo.Point"), "X");
        assert!(matches!(
            registry.read_member(hash, &Value::Nil),
            Err(RuntimeError::NullReference { .. })
        ));
        let obj = Value::Object(HostObject::new(ClassRef::new("Demo.Point"), []));
        assert_eq!(registry.read_member(hash, &obj), Ok(Value::Nil));
    }
}
