//! Literal and local-reference nodes, and quoted-constant dispatch.

use std::sync::Arc;

use hostinterop_core::{Form, HostType, PrimitiveKind, Span, Value, lang_types};
use log::trace;

use super::{Expr, Position, Result};
use crate::bytecode::EmptyKind;
use crate::context::CompilationContext;
use crate::conversion::box_return;
use crate::emit::BytecodeEmitter;
use crate::scope::LocalBinding;

/// Build the node for a quoted form.
///
/// Nil and booleans map to the shared literal nodes, numbers to a numeric
/// literal, strings to a string literal, empty collections to an empty
/// collection node; anything else is a pooled constant.
pub fn parse_quoted(ctx: &CompilationContext<'_>, form: &Form) -> Result<Expr> {
    let value = form.to_value();
    Ok(match value {
        Value::Nil => Expr::Nil,
        Value::Bool(true) => Expr::True,
        Value::Bool(false) => Expr::False,
        v if v.is_numeric() => Expr::Number(NumberLiteral::new(ctx, v)),
        Value::Str(s) => Expr::String(StringLiteral::new(s)),
        v if v.is_empty_collection() => match EmptyCollectionLiteral::new(v.clone()) {
            Some(empty) => Expr::EmptyCollection(empty),
            None => Expr::Constant(ConstantLiteral::new(ctx, v)),
        },
        v => Expr::Constant(ConstantLiteral::new(ctx, v)),
    })
}

// ============================================================================
// Numbers
// ============================================================================

/// A numeric literal.
///
/// Registered with the constant pool when built so the boxed form can be
/// loaded by id; the unboxed form is an inline immediate.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberLiteral {
    pub value: Value,
    pub pool_id: u32,
}

impl NumberLiteral {
    pub fn new(ctx: &CompilationContext<'_>, value: Value) -> Self {
        let pool_id = ctx.constants().register(value.clone());
        trace!("number literal {:?} -> pool slot {}", value, pool_id);
        Self { value, pool_id }
    }

    pub fn static_type(&self) -> Option<HostType> {
        self.value.runtime_type()
    }

    pub fn unboxed_type(&self) -> Option<PrimitiveKind> {
        self.value.primitive_kind()
    }

    pub(super) fn emit(&self, em: &mut BytecodeEmitter, pos: Position) {
        if pos == Position::Expression {
            em.load_constant(self.pool_id);
        }
    }

    pub(super) fn emit_unboxed(&self, em: &mut BytecodeEmitter) {
        match self.value {
            Value::I64(v) => em.push_i64(v),
            Value::F64(v) => em.push_f64(v),
            // Narrower kinds share the pooled representation.
            _ => em.load_constant(self.pool_id),
        }
    }
}

// ============================================================================
// Strings and empty collections
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct StringLiteral {
    pub value: Arc<str>,
}

impl StringLiteral {
    pub fn new(value: impl Into<Arc<str>>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn static_type() -> HostType {
        HostType::class(lang_types::STRING)
    }

    pub(super) fn emit(&self, em: &mut BytecodeEmitter, pos: Position) -> Result<()> {
        if pos == Position::Expression {
            em.push_string(&self.value)?;
        }
        Ok(())
    }
}

/// An empty list, vector, map or set.
#[derive(Debug, Clone, PartialEq)]
pub struct EmptyCollectionLiteral {
    pub value: Value,
    pub kind: EmptyKind,
}

impl EmptyCollectionLiteral {
    /// `None` unless `value` is an empty persistent collection.
    pub fn new(value: Value) -> Option<Self> {
        let kind = match &value {
            Value::List(items) if items.is_empty() => EmptyKind::List,
            Value::Vector(items) if items.is_empty() => EmptyKind::Vector,
            Value::Map(entries) if entries.is_empty() => EmptyKind::Map,
            Value::Set(items) if items.is_empty() => EmptyKind::Set,
            _ => return None,
        };
        Some(Self { value, kind })
    }

    pub fn static_type(&self) -> Option<HostType> {
        self.value.runtime_type()
    }

    pub(super) fn emit(&self, em: &mut BytecodeEmitter, pos: Position) {
        if pos == Position::Expression {
            em.push_empty(self.kind);
        }
    }
}

// ============================================================================
// Pooled constants
// ============================================================================

/// A literal value loaded from the constant pool.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantLiteral {
    pub value: Value,
    pub pool_id: u32,
    /// The value's runtime type when that type is publicly visible.
    pub static_type: Option<HostType>,
}

impl ConstantLiteral {
    pub fn new(ctx: &CompilationContext<'_>, value: Value) -> Self {
        let pool_id = ctx.constants().register(value.clone());
        let static_type = value
            .runtime_type()
            .filter(|ty| ctx.oracle().is_visible(ty));
        trace!("constant {:?} -> pool slot {}", value, pool_id);
        Self {
            value,
            pool_id,
            static_type,
        }
    }

    pub(super) fn emit(&self, em: &mut BytecodeEmitter, pos: Position) {
        if pos == Position::Expression {
            em.load_constant(self.pool_id);
        }
    }
}

// ============================================================================
// Locals
// ============================================================================

/// A reference to a local binding.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalRef {
    pub binding: LocalBinding,
    pub tag: Option<HostType>,
    pub span: Span,
}

impl LocalRef {
    pub fn new(binding: LocalBinding, tag: Option<HostType>, span: Span) -> Self {
        Self { binding, tag, span }
    }

    pub fn static_type(&self) -> Option<HostType> {
        self.tag.clone().or_else(|| self.binding.local_type.clone())
    }

    pub fn unboxed_type(&self) -> Option<PrimitiveKind> {
        self.binding
            .local_type
            .as_ref()
            .and_then(HostType::as_primitive)
    }

    pub(super) fn emit(&self, em: &mut BytecodeEmitter, pos: Position) {
        if pos == Position::Statement {
            return;
        }
        em.get_local(self.binding.slot);
        if let Some(ty @ HostType::Primitive(_)) = &self.binding.local_type {
            box_return(em, ty);
        }
    }

    pub(super) fn emit_unboxed(&self, em: &mut BytecodeEmitter) {
        em.get_local(self.binding.slot);
    }
}
