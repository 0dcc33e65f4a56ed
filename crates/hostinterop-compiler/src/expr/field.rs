//! Field and property access nodes, and the runtime-dispatched
//! zero-arity call.

use std::sync::Arc;

use hostinterop_core::{FieldDef, HostType, PropertyDef, Span};

use super::{Expr, Position, Result};
use crate::context::CompilationContext;
use crate::conversion::box_return;
use crate::emit::BytecodeEmitter;

// ============================================================================
// Static members
// ============================================================================

/// `(. Type Field)` on a static field.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticFieldAccess {
    pub field: Arc<FieldDef>,
    pub tag: Option<HostType>,
    pub span: Span,
}

impl StaticFieldAccess {
    pub fn static_type(&self) -> HostType {
        self.tag
            .clone()
            .unwrap_or_else(|| self.field.field_type.clone())
    }

    pub(super) fn emit(&self, em: &mut BytecodeEmitter, pos: Position) {
        em.set_line(self.span.line);
        em.field_access(&self.field);
        match pos {
            Position::Expression => box_return(em, &self.field.field_type),
            Position::Statement => em.discard(),
        }
    }

    pub(super) fn emit_unboxed(&self, em: &mut BytecodeEmitter) {
        em.set_line(self.span.line);
        em.field_access(&self.field);
    }
}

/// `(. Type Property)` on a static property.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticPropertyAccess {
    pub property: Arc<PropertyDef>,
    pub tag: Option<HostType>,
    pub span: Span,
}

impl StaticPropertyAccess {
    pub fn static_type(&self) -> HostType {
        self.tag
            .clone()
            .unwrap_or_else(|| self.property.property_type.clone())
    }

    pub(super) fn emit(&self, em: &mut BytecodeEmitter, pos: Position) {
        em.set_line(self.span.line);
        em.property_access(&self.property);
        match pos {
            Position::Expression => box_return(em, &self.property.property_type),
            Position::Statement => em.discard(),
        }
    }

    pub(super) fn emit_unboxed(&self, em: &mut BytecodeEmitter) {
        em.set_line(self.span.line);
        em.property_access(&self.property);
    }
}

// ============================================================================
// Instance members
// ============================================================================

/// `(. target Field)`.
///
/// Without a descriptor the field is looked up on the target's runtime
/// type when the code runs; this only happens for assignment targets.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceFieldAccess {
    pub target: Box<Expr>,
    pub name: String,
    pub field: Option<Arc<FieldDef>>,
    pub tag: Option<HostType>,
    pub span: Span,
}

impl InstanceFieldAccess {
    pub fn static_type(&self) -> Option<HostType> {
        self.tag
            .clone()
            .or_else(|| self.field.as_ref().map(|f| f.field_type.clone()))
    }

    /// Emit the member read, leaving the raw value.
    fn emit_read(&self, ctx: &CompilationContext<'_>, em: &mut BytecodeEmitter) -> Result<()> {
        self.target.emit(ctx, em, Position::Expression)?;
        em.set_line(self.span.line);
        match &self.field {
            Some(field) => em.field_access(field),
            None => em.dynamic_field_access(&self.name)?,
        }
        Ok(())
    }

    pub(super) fn emit(
        &self,
        ctx: &CompilationContext<'_>,
        em: &mut BytecodeEmitter,
        pos: Position,
    ) -> Result<()> {
        self.emit_read(ctx, em)?;
        match (pos, &self.field) {
            (Position::Statement, _) => em.discard(),
            (Position::Expression, Some(field)) => box_return(em, &field.field_type),
            (Position::Expression, None) => {}
        }
        Ok(())
    }

    pub(super) fn emit_unboxed(
        &self,
        ctx: &CompilationContext<'_>,
        em: &mut BytecodeEmitter,
    ) -> Result<()> {
        self.emit_read(ctx, em)
    }
}

/// `(. target Property)`.
#[derive(Debug, Clone, PartialEq)]
pub struct InstancePropertyAccess {
    pub target: Box<Expr>,
    pub property: Arc<PropertyDef>,
    pub tag: Option<HostType>,
    pub span: Span,
}

impl InstancePropertyAccess {
    pub fn static_type(&self) -> HostType {
        self.tag
            .clone()
            .unwrap_or_else(|| self.property.property_type.clone())
    }

    pub(super) fn emit(
        &self,
        ctx: &CompilationContext<'_>,
        em: &mut BytecodeEmitter,
        pos: Position,
    ) -> Result<()> {
        self.emit_unboxed(ctx, em)?;
        match pos {
            Position::Expression => box_return(em, &self.property.property_type),
            Position::Statement => em.discard(),
        }
        Ok(())
    }

    pub(super) fn emit_unboxed(
        &self,
        ctx: &CompilationContext<'_>,
        em: &mut BytecodeEmitter,
    ) -> Result<()> {
        self.target.emit(ctx, em, Position::Expression)?;
        em.set_line(self.span.line);
        em.property_access(&self.property);
        Ok(())
    }
}

/// `(. target name)` where nothing is known about `name` until run time.
///
/// The runtime tries fields, then properties, then zero-argument methods
/// of the target's actual type.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceZeroArityCall {
    pub target: Box<Expr>,
    pub name: String,
    pub tag: Option<HostType>,
    pub span: Span,
}

impl InstanceZeroArityCall {
    pub(super) fn emit(
        &self,
        ctx: &CompilationContext<'_>,
        em: &mut BytecodeEmitter,
        pos: Position,
    ) -> Result<()> {
        self.target.emit(ctx, em, Position::Expression)?;
        em.set_line(self.span.line);
        em.invoke_dynamic(&self.name, 0)?;
        if pos == Position::Statement {
            em.discard();
        }
        Ok(())
    }
}
