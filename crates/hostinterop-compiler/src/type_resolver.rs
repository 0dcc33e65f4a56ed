//! Resolution of symbols and type tags to host types.
//!
//! This module provides [`TypeResolver`], which decides whether a form
//! names a host type. The order of attempts:
//!
//! 1. An embedded type form resolves to itself
//! 2. The current compile stub symbol resolves to its stub type
//! 3. Dotted names (`System.Math`) and array names (`System.Int64[]`) go
//!    to the oracle's global lookup
//! 4. Array mnemonics (`ints`, `longs`, ...)
//! 5. The active namespace's imports and aliases
//! 6. A local binding of the same name hides any further type lookup
//! 7. Global lookup by the bare name
//!
//! Namespace-qualified symbols (`ns/name`) never name a type.

use hostinterop_core::{CompilationError, Form, FormKind, HostType, PrimitiveKind, Span, Symbol};
use log::{debug, trace};

use crate::context::CompilationContext;

/// Resolves forms and tags to host types.
pub struct TypeResolver<'a, 'reg> {
    ctx: &'a CompilationContext<'reg>,
}

impl<'a, 'reg> TypeResolver<'a, 'reg> {
    pub fn new(ctx: &'a CompilationContext<'reg>) -> Self {
        Self { ctx }
    }

    /// The host type `form` names, if it names one.
    pub fn maybe_type(&self, form: &Form) -> Option<HostType> {
        match &form.kind {
            FormKind::Type(ty) => Some(ty.clone()),
            FormKind::Symbol(sym) => self.maybe_type_symbol(sym),
            _ => None,
        }
    }

    /// The host type an unqualified symbol names, if any.
    pub fn maybe_type_symbol(&self, sym: &Symbol) -> Option<HostType> {
        if sym.is_qualified() {
            return None;
        }
        if let Some((stub_sym, stub_type)) = self.ctx.compile_stub() {
            if stub_sym == sym {
                trace!("{} resolves to compile stub {}", sym, stub_type);
                return Some(stub_type.clone());
            }
        }

        let name = sym.name();
        if name.find('.').is_some_and(|i| i > 0) || name.ends_with(']') {
            return self.find_type(name);
        }
        if let Some(array) = array_mnemonic(name) {
            return Some(array);
        }
        if let Some(mapped) = self.ctx.namespace().get_mapping(sym) {
            return Some(mapped);
        }
        if self.ctx.locals().resolve_local(sym).is_some() {
            return None;
        }
        self.find_type(name)
    }

    /// Resolve a `^Tag` to a host type.
    ///
    /// Tags additionally accept primitive aliases (`int`, `long`, ...).
    /// An unresolvable tag is fatal.
    pub fn tag_to_type(&self, tag: &Symbol, span: Span) -> Result<HostType, CompilationError> {
        if !tag.is_qualified() {
            if let Some(kind) = primitive_alias(tag.name()) {
                return Ok(HostType::Primitive(kind));
            }
        }
        self.maybe_type_symbol(tag)
            .ok_or_else(|| CompilationError::UnresolvedTypeName {
                name: tag.to_string(),
                span,
            })
    }

    /// Resolve the tag attached to `form`, if any.
    pub fn form_tag(&self, form: &Form) -> Result<Option<HostType>, CompilationError> {
        form.tag
            .as_ref()
            .map(|tag| self.tag_to_type(tag, form.span))
            .transpose()
    }

    /// Resolve a type-argument form (symbol or embedded type).
    pub fn type_arg(&self, form: &Form) -> Result<HostType, CompilationError> {
        match &form.kind {
            FormKind::Symbol(sym) => self.tag_to_type(sym, form.span),
            FormKind::Type(ty) => Ok(ty.clone()),
            _ => Err(CompilationError::MalformedForm {
                message: "type-args entries must be type names".to_string(),
                span: form.span,
            }),
        }
    }

    fn find_type(&self, name: &str) -> Option<HostType> {
        match self.ctx.oracle().find_type(name) {
            Ok(found) => found,
            Err(err) => {
                debug!("type lookup for {} failed: {}", name, err);
                None
            }
        }
    }
}

/// Array type named by a shorthand (`ints` is `System.Int32[]`).
pub fn array_mnemonic(name: &str) -> Option<HostType> {
    let element = match name {
        "objects" => HostType::Object,
        "booleans" | "bools" => HostType::Primitive(PrimitiveKind::Bool),
        "chars" => HostType::Primitive(PrimitiveKind::Char),
        "sbytes" => HostType::Primitive(PrimitiveKind::Int8),
        "bytes" => HostType::Primitive(PrimitiveKind::Uint8),
        "shorts" => HostType::Primitive(PrimitiveKind::Int16),
        "ushorts" => HostType::Primitive(PrimitiveKind::Uint16),
        "ints" => HostType::Primitive(PrimitiveKind::Int32),
        "uints" => HostType::Primitive(PrimitiveKind::Uint32),
        "longs" => HostType::Primitive(PrimitiveKind::Int64),
        "ulongs" => HostType::Primitive(PrimitiveKind::Uint64),
        "floats" => HostType::Primitive(PrimitiveKind::Float32),
        "doubles" => HostType::Primitive(PrimitiveKind::Float64),
        _ => return None,
    };
    Some(HostType::array_of(element))
}

fn primitive_alias(name: &str) -> Option<PrimitiveKind> {
    Some(match name {
        "bool" | "boolean" => PrimitiveKind::Bool,
        "char" => PrimitiveKind::Char,
        "sbyte" => PrimitiveKind::Int8,
        "byte" => PrimitiveKind::Uint8,
        "short" => PrimitiveKind::Int16,
        "ushort" => PrimitiveKind::Uint16,
        "int" => PrimitiveKind::Int32,
        "uint" => PrimitiveKind::Uint32,
        "long" => PrimitiveKind::Int64,
        "ulong" => PrimitiveKind::Uint64,
        "float" => PrimitiveKind::Float32,
        "double" => PrimitiveKind::Float64,
        _ => return None,
    })
}
