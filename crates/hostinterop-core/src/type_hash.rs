//! Deterministic hash-based identity for host types and members.
//!
//! [`TypeHash`] is a 64-bit hash computed from qualified names (types),
//! owner + name + parameter types (methods) or owner + name (fields and
//! properties). Hashes are stable across runs, so emitted bytecode can refer
//! to members by hash without an intermediate id table.
//!
//! # Examples
//!
//! ```
//! use hostinterop_core::TypeHash;
//!
//! let a = TypeHash::from_name("System.Math");
//! let b = TypeHash::from_name("System.Math");
//! assert_eq!(a, b);
//!
//! let int32 = TypeHash::from_name("System.Int32");
//! let int64 = TypeHash::from_name("System.Int64");
//! let m1 = TypeHash::from_method(a, "Abs", &[int32]);
//! let m2 = TypeHash::from_method(a, "Abs", &[int64]);
//! assert_ne!(m1, m2);
//! ```

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants for hash computation.
///
/// Each entity kind gets its own domain marker so that a field and a method
/// sharing a name never collide.
pub mod hash_constants {
    /// Separator constant used when folding parameter hashes.
    pub const SEP: u64 = 0x4bc94d6bd06053ad;

    /// Domain marker for type hashes.
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for method hashes.
    pub const METHOD: u64 = 0x7d3c8b4a92e15f6d;

    /// Domain marker for field and property hashes.
    pub const MEMBER: u64 = 0x3e9f5d2a8c7b1403;

    /// Domain marker for bare identifier hashes (runtime member lookup).
    pub const IDENT: u64 = 0x1a095090689d4647;

    /// Parameter position mixing constants.
    pub const PARAM_MARKERS: [u64; 8] = [
        0x9e3779b97f4a7c15,
        0xbf58476d1ce4e5b9,
        0x94d049bb133111eb,
        0xd6e8feb86659fd93,
        0xe7037ed1a0b428db,
        0xc6a4a7935bd1e995,
        0x8648dbbc94d49b8d,
        0xa2b48b2c69e0d657,
    ];
}

/// A deterministic 64-bit hash identifying a host type or member.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Create a type hash from a qualified type name.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHash(hash_constants::TYPE ^ xxh64(name.as_bytes(), 0))
    }

    /// Create a hash for a bare member name, independent of its owner.
    ///
    /// Used by deferred (runtime-resolved) calls, which only know the name.
    #[inline]
    pub fn from_ident(name: &str) -> Self {
        TypeHash(hash_constants::IDENT ^ xxh64(name.as_bytes(), 0))
    }

    /// Create a field or property hash from its owner and name.
    #[inline]
    pub fn from_member(owner: TypeHash, name: &str) -> Self {
        TypeHash(hash_constants::MEMBER ^ owner.0 ^ xxh64(name.as_bytes(), 0))
    }

    /// Create a method hash from owner type, method name and parameter types.
    ///
    /// Parameter order matters: `(int, long)` and `(long, int)` differ.
    #[inline]
    pub fn from_method(owner: TypeHash, name: &str, param_hashes: &[TypeHash]) -> Self {
        let mut hash = hash_constants::METHOD ^ owner.0 ^ xxh64(name.as_bytes(), 0);
        for (i, param) in param_hashes.iter().enumerate() {
            let marker = hash_constants::PARAM_MARKERS
                .get(i)
                .copied()
                .unwrap_or_else(|| hash_constants::PARAM_MARKERS[0].wrapping_add(i as u64));
            // wrapping_mul keeps the fold order-sensitive
            hash = hash
                .wrapping_mul(hash_constants::SEP)
                .wrapping_add(marker ^ param.0);
        }
        TypeHash(hash)
    }

    /// Check if this is an empty/invalid hash.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Get the underlying u64 value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_deterministic() {
        assert_eq!(
            TypeHash::from_name("System.String"),
            TypeHash::from_name("System.String")
        );
        assert_ne!(
            TypeHash::from_name("System.String"),
            TypeHash::from_name("System.Object")
        );
    }

    #[test]
    fn member_domains_do_not_collide() {
        let owner = TypeHash::from_name("Point");
        let field = TypeHash::from_member(owner, "X");
        let method = TypeHash::from_method(owner, "X", &[]);
        let ident = TypeHash::from_ident("X");
        assert_ne!(field, method);
        assert_ne!(field, ident);
        assert_ne!(method, ident);
    }

    #[test]
    fn parameter_order_matters() {
        let owner = TypeHash::from_name("Util");
        let a = TypeHash::from_name("A");
        let b = TypeHash::from_name("B");
        assert_ne!(
            TypeHash::from_method(owner, "f", &[a, b]),
            TypeHash::from_method(owner, "f", &[b, a])
        );
    }

    #[test]
    fn empty_hash() {
        assert!(TypeHash::EMPTY.is_empty());
        assert!(!TypeHash::from_name("x").is_empty());
    }
}
