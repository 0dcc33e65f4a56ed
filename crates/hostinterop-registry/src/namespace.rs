//! Namespace import/alias map.
//!
//! A [`Namespace`] maps unqualified symbols to host types, the way
//! `(import ...)` and aliasing populate a source namespace. The compiler
//! consults it through [`NamespaceMap`] after the array mnemonics and
//! before global lookup by simple name.

use rustc_hash::FxHashMap;

use hostinterop_core::{HostType, MemberOracle, NamespaceMap, RegistrationError, Symbol};

/// A source namespace's type mappings.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    name: String,
    mappings: FxHashMap<String, HostType>,
}

impl Namespace {
    /// Create an empty namespace.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mappings: FxHashMap::default(),
        }
    }

    /// The namespace's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Map a type under the last segment of its name (`System.Text.StringBuilder`
    /// becomes `StringBuilder`).
    pub fn import(&mut self, ty: HostType) {
        let full = ty.name();
        let simple = full.rsplit('.').next().unwrap_or(&full).to_string();
        self.mappings.insert(simple, ty);
    }

    /// Import a type by qualified name from `oracle`.
    pub fn import_from(
        &mut self,
        oracle: &dyn MemberOracle,
        qualified_name: &str,
    ) -> Result<HostType, RegistrationError> {
        let ty = oracle
            .find_type(qualified_name)
            .ok()
            .flatten()
            .ok_or_else(|| RegistrationError::UnknownType {
                name: qualified_name.to_string(),
            })?;
        self.import(ty.clone());
        Ok(ty)
    }

    /// Map an arbitrary alias to a type.
    pub fn alias(&mut self, alias: impl Into<String>, ty: HostType) {
        self.mappings.insert(alias.into(), ty);
    }

    /// Number of mappings.
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Whether the namespace maps nothing.
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

impl NamespaceMap for Namespace {
    fn get_mapping(&self, sym: &Symbol) -> Option<HostType> {
        if sym.is_qualified() {
            return None;
        }
        self.mappings.get(sym.name()).cloned()
    }
}
