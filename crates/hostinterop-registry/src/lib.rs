//! Host interop registry crate.
//!
//! In-memory reflected type information for the interop compiler and the
//! reference VM:
//!
//! - [`HostRegistry`] - types, members and their native bodies; implements
//!   [`MemberOracle`](hostinterop_core::MemberOracle)
//! - [`Namespace`] - import/alias map; implements
//!   [`NamespaceMap`](hostinterop_core::NamespaceMap)
//! - [`NativeFn`] - native member bodies

mod builtins;
mod namespace;
mod native;
mod registry;

pub use namespace::Namespace;
pub use native::{FromValue, NativeCallable, NativeFn, arg};
pub use registry::{ClassBuilder, HostRegistry, MemberBody, TypeEntry, TypeFlags};
