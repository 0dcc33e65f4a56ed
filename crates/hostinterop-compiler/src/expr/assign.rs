//! `(set! (. target member) value)` assignment to fields and properties.

use hostinterop_core::{CompilationError, HostType, Span};

use super::{
    Expr, InstanceFieldAccess, InstancePropertyAccess, Position, Result, StaticFieldAccess,
    StaticPropertyAccess,
};
use crate::context::CompilationContext;
use crate::conversion::{box_return, gen_coerced};
use crate::emit::BytecodeEmitter;

/// A member that can be stored into.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignTarget {
    StaticField(StaticFieldAccess),
    StaticProperty(StaticPropertyAccess),
    InstanceField(InstanceFieldAccess),
    InstanceProperty(InstancePropertyAccess),
}

/// An assignment; evaluates to the stored value.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignExpr {
    pub target: AssignTarget,
    pub value: Expr,
    pub span: Span,
}

impl AssignExpr {
    /// Check that `target` is assignable and build the node.
    pub fn new(target: Expr, value: Expr, span: Span) -> Result<Self> {
        let target = match target {
            Expr::StaticField(f) => AssignTarget::StaticField(f),
            Expr::InstanceField(f) => AssignTarget::InstanceField(f),
            Expr::StaticProperty(p) if p.property.writable => AssignTarget::StaticProperty(p),
            Expr::InstanceProperty(p) if p.property.writable => AssignTarget::InstanceProperty(p),
            Expr::StaticProperty(p) => return Err(read_only(&p.property.name, span)),
            Expr::InstanceProperty(p) => return Err(read_only(&p.property.name, span)),
            _ => {
                return Err(CompilationError::MalformedForm {
                    message: "invalid assignment target".to_string(),
                    span,
                });
            }
        };
        Ok(Self {
            target,
            value,
            span,
        })
    }

    /// Declared type of the assigned member, `None` when resolved at run time.
    pub fn member_type(&self) -> Option<&HostType> {
        match &self.target {
            AssignTarget::StaticField(f) => Some(&f.field.field_type),
            AssignTarget::StaticProperty(p) => Some(&p.property.property_type),
            AssignTarget::InstanceField(f) => f.field.as_ref().map(|d| &d.field_type),
            AssignTarget::InstanceProperty(p) => Some(&p.property.property_type),
        }
    }

    pub fn static_type(&self) -> Option<HostType> {
        self.member_type()
            .cloned()
            .or_else(|| self.value.static_type())
    }

    pub(super) fn emit(
        &self,
        ctx: &CompilationContext<'_>,
        em: &mut BytecodeEmitter,
        pos: Position,
    ) -> Result<()> {
        match &self.target {
            AssignTarget::InstanceField(f) => f.target.emit(ctx, em, Position::Expression)?,
            AssignTarget::InstanceProperty(p) => p.target.emit(ctx, em, Position::Expression)?,
            AssignTarget::StaticField(_) | AssignTarget::StaticProperty(_) => {}
        }

        match self.member_type() {
            Some(ty) => gen_coerced(ctx, em, &self.value, ty)?,
            None => self.value.emit(ctx, em, Position::Expression)?,
        }

        em.set_line(self.span.line);
        match &self.target {
            AssignTarget::StaticField(f) => em.field_assign(&f.field),
            AssignTarget::StaticProperty(p) => em.property_assign(&p.property),
            AssignTarget::InstanceField(f) => match &f.field {
                Some(field) => em.field_assign(field),
                None => em.dynamic_field_assign(&f.name)?,
            },
            AssignTarget::InstanceProperty(p) => em.property_assign(&p.property),
        }

        match (pos, self.member_type()) {
            (Position::Statement, _) => em.discard(),
            (Position::Expression, Some(ty)) => box_return(em, ty),
            (Position::Expression, None) => {}
        }
        Ok(())
    }
}

fn read_only(name: &str, span: Span) -> CompilationError {
    CompilationError::MalformedForm {
        message: format!("property '{name}' is read-only"),
        span,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{ConstantPool, OpCode};
    use hostinterop_core::{FieldDef, PrimitiveKind, PropertyDef, TypeHash};
    use hostinterop_registry::{HostRegistry, Namespace};
    use std::sync::Arc;

    fn counter_field() -> StaticFieldAccess {
        let owner = HostType::class("Demo.Counter");
        StaticFieldAccess {
            field: Arc::new(FieldDef {
                hash: TypeHash::from_member(owner.type_hash(), "Count"),
                owner,
                name: "Count".to_string(),
                field_type: HostType::Primitive(PrimitiveKind::Int64),
                is_static: true,
            }),
            tag: None,
            span: Span::default(),
        }
    }

    #[test]
    fn static_field_store() {
        let registry = HostRegistry::with_builtins();
        let ns = Namespace::new("user");
        let pool = ConstantPool::new();
        let ctx = CompilationContext::new(&registry, &ns, &pool);
        let target = Expr::StaticField(counter_field());
        let assign = AssignExpr::new(target, Expr::Nil, Span::default()).unwrap();
        let long = HostType::Primitive(PrimitiveKind::Int64);
        assert_eq!(assign.static_type(), Some(long));
        let mut em = BytecodeEmitter::new();
        assign.emit(&ctx, &mut em, Position::Expression).unwrap();
        let chunk = em.finish();
        chunk.assert_opcodes(&[
            OpCode::PushNil,
            OpCode::CastChecked,
            OpCode::SetStaticField,
            OpCode::Box,
        ]);
    }

    #[test]
    fn deferred_field_store() {
        let registry = HostRegistry::with_builtins();
        let ns = Namespace::new("user");
        let pool = ConstantPool::new();
        let ctx = CompilationContext::new(&registry, &ns, &pool);
        let target = Expr::InstanceField(InstanceFieldAccess {
            target: Box::new(Expr::Nil),
            name: "x".to_string(),
            field: None,
            tag: None,
            span: Span::default(),
        });
        let assign = AssignExpr::new(target, Expr::True, Span::default()).unwrap();
        let mut em = BytecodeEmitter::new();
        assign.emit(&ctx, &mut em, Position::Statement).unwrap();
        let chunk = em.finish();
        chunk.assert_opcodes(&[
            OpCode::PushNil,
            OpCode::PushTrue,
            OpCode::SetFieldDynamic,
            OpCode::Pop,
        ]);
    }

    #[test]
    fn read_only_property_rejected() {
        let owner = HostType::class("System.String");
        let target = Expr::StaticProperty(StaticPropertyAccess {
            property: Arc::new(PropertyDef {
                hash: TypeHash::from_member(owner.type_hash(), "Empty"),
                owner,
                name: "Empty".to_string(),
                property_type: HostType::class("System.String"),
                is_static: true,
                writable: false,
            }),
            tag: None,
            span: Span::default(),
        });
        let err = AssignExpr::new(target, Expr::Nil, Span::default()).unwrap_err();
        assert!(matches!(err, CompilationError::MalformedForm { .. }));
    }

    #[test]
    fn literals_are_not_assignable() {
        let assign = AssignExpr::new(Expr::Nil, Expr::Nil, Span::default());
        assert!(assign.is_err());
    }
}
