//! Analysed expression nodes and their code generation.
//!
//! [`analyze`] turns a source [`Form`](hostinterop_core::Form) into an
//! [`Expr`] tree, resolving host members against the oracle as it goes.
//! Each node then answers three questions for its consumers:
//!
//! - `static_type()` - the type known at compile time, if any
//! - `unboxed_type()` - the primitive kind it can be emitted as unboxed
//! - `emit()` / `emit_unboxed()` - the bytecode producing its value
//!
//! # Example
//!
//! ```ignore
//! let expr = analyze(&ctx, ParserContext::expression(), &form)?;
//! let mut emitter = BytecodeEmitter::new();
//! expr.emit(&ctx, &mut emitter, Position::Expression)?;
//! ```

mod analyze;
mod assign;
mod field;
mod host;
mod literals;
mod method;

pub use analyze::analyze;
pub use assign::{AssignExpr, AssignTarget};
pub use field::{
    InstanceFieldAccess, InstancePropertyAccess, InstanceZeroArityCall, StaticFieldAccess,
    StaticPropertyAccess,
};
pub use host::parse_host;
pub use literals::{
    ConstantLiteral, EmptyCollectionLiteral, LocalRef, NumberLiteral, StringLiteral, parse_quoted,
};
pub use method::{InstanceMethodCall, StaticMethodCall};

use hostinterop_core::{CompilationError, HostType, PrimitiveKind};

use crate::context::CompilationContext;
use crate::conversion::ArgInfo;
use crate::emit::BytecodeEmitter;
use crate::scope::LocalBinding;

type Result<T> = std::result::Result<T, CompilationError>;

/// Where a node's value goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// The value is discarded; only effects matter.
    Statement,
    /// The value is consumed, in boxed form.
    Expression,
}

/// How a call-site argument is passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgMode {
    Standard,
    /// `(by-ref local)`: the callee may write the local.
    ByRef,
}

/// One call-site argument.
#[derive(Debug, Clone, PartialEq)]
pub struct HostArg {
    pub mode: ArgMode,
    pub expr: Expr,
    /// The local written back after the call (by-ref only).
    pub local: Option<LocalBinding>,
}

impl HostArg {
    pub fn standard(expr: Expr) -> Self {
        Self {
            mode: ArgMode::Standard,
            expr,
            local: None,
        }
    }

    pub fn by_ref(local: LocalBinding, span: hostinterop_core::Span) -> Self {
        Self {
            mode: ArgMode::ByRef,
            expr: Expr::Local(LocalRef::new(local.clone(), None, span)),
            local: Some(local),
        }
    }

    pub fn is_by_ref(&self) -> bool {
        self.mode == ArgMode::ByRef
    }

    /// What overload ranking sees of this argument.
    pub fn info(&self) -> ArgInfo {
        ArgInfo {
            hint: self.expr.static_type(),
            by_ref: self.is_by_ref(),
        }
    }
}

/// An analysed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Nil,
    True,
    False,
    Number(NumberLiteral),
    String(StringLiteral),
    EmptyCollection(EmptyCollectionLiteral),
    Constant(ConstantLiteral),
    Local(LocalRef),
    StaticField(StaticFieldAccess),
    StaticProperty(StaticPropertyAccess),
    StaticMethod(StaticMethodCall),
    InstanceField(InstanceFieldAccess),
    InstanceProperty(InstancePropertyAccess),
    InstanceMethod(InstanceMethodCall),
    InstanceZeroArityDynamic(InstanceZeroArityCall),
    Assign(Box<AssignExpr>),
}

impl Expr {
    /// Whether the node's type is known at compile time.
    pub fn has_static_type(&self) -> bool {
        self.static_type().is_some()
    }

    /// The compile-time type of the node's value. A `^Tag` on a host form
    /// overrides the member's declared type.
    pub fn static_type(&self) -> Option<HostType> {
        match self {
            Expr::Nil => None,
            Expr::True | Expr::False => Some(HostType::Primitive(PrimitiveKind::Bool)),
            Expr::Number(n) => n.static_type(),
            Expr::String(_) => Some(StringLiteral::static_type()),
            Expr::EmptyCollection(c) => c.static_type(),
            Expr::Constant(c) => c.static_type.clone(),
            Expr::Local(l) => l.static_type(),
            Expr::StaticField(f) => Some(f.static_type()),
            Expr::StaticProperty(p) => Some(p.static_type()),
            Expr::StaticMethod(m) => Some(m.static_type()),
            Expr::InstanceField(f) => f.static_type(),
            Expr::InstanceProperty(p) => Some(p.static_type()),
            Expr::InstanceMethod(m) => m.static_type(),
            Expr::InstanceZeroArityDynamic(c) => c.tag.clone(),
            Expr::Assign(a) => a.static_type(),
        }
    }

    /// The primitive kind this node can produce without boxing.
    pub fn unboxed_type(&self) -> Option<PrimitiveKind> {
        match self {
            Expr::True | Expr::False => Some(PrimitiveKind::Bool),
            Expr::Number(n) => n.unboxed_type(),
            Expr::Local(l) => l.unboxed_type(),
            Expr::StaticField(f) => f.field.field_type.as_primitive(),
            Expr::StaticProperty(p) => p.property.property_type.as_primitive(),
            Expr::StaticMethod(m) => m.method.return_type.as_primitive(),
            Expr::InstanceField(f) => f.field.as_ref().and_then(|d| d.field_type.as_primitive()),
            Expr::InstanceProperty(p) => p.property.property_type.as_primitive(),
            Expr::InstanceMethod(m) => m.method.as_ref().and_then(|d| d.return_type.as_primitive()),
            _ => None,
        }
    }

    pub fn can_emit_unboxed(&self) -> bool {
        self.unboxed_type().is_some()
    }

    /// Emit the node's value in object representation, or only its effects
    /// in statement position.
    pub fn emit(
        &self,
        ctx: &CompilationContext<'_>,
        em: &mut BytecodeEmitter,
        pos: Position,
    ) -> Result<()> {
        match self {
            Expr::Nil => {
                if pos == Position::Expression {
                    em.push_nil();
                }
                Ok(())
            }
            Expr::True | Expr::False => {
                if pos == Position::Expression {
                    em.push_bool(matches!(self, Expr::True));
                }
                Ok(())
            }
            Expr::Number(n) => {
                n.emit(em, pos);
                Ok(())
            }
            Expr::String(s) => s.emit(em, pos),
            Expr::EmptyCollection(c) => {
                c.emit(em, pos);
                Ok(())
            }
            Expr::Constant(c) => {
                c.emit(em, pos);
                Ok(())
            }
            Expr::Local(l) => {
                l.emit(em, pos);
                Ok(())
            }
            Expr::StaticField(f) => {
                f.emit(em, pos);
                Ok(())
            }
            Expr::StaticProperty(p) => {
                p.emit(em, pos);
                Ok(())
            }
            Expr::StaticMethod(m) => m.emit(ctx, em, pos),
            Expr::InstanceField(f) => f.emit(ctx, em, pos),
            Expr::InstanceProperty(p) => p.emit(ctx, em, pos),
            Expr::InstanceMethod(m) => m.emit(ctx, em, pos),
            Expr::InstanceZeroArityDynamic(c) => c.emit(ctx, em, pos),
            Expr::Assign(a) => a.emit(ctx, em, pos),
        }
    }

    /// Emit the node's value as an unboxed primitive of `unboxed_type()`.
    pub fn emit_unboxed(
        &self,
        ctx: &CompilationContext<'_>,
        em: &mut BytecodeEmitter,
    ) -> Result<()> {
        match self {
            Expr::True => em.push_bool(true),
            Expr::False => em.push_bool(false),
            Expr::Number(n) => n.emit_unboxed(em),
            Expr::Local(l) if l.unboxed_type().is_some() => l.emit_unboxed(em),
            Expr::StaticField(f) if f.field.field_type.is_primitive() => f.emit_unboxed(em),
            Expr::StaticProperty(p) if p.property.property_type.is_primitive() => {
                p.emit_unboxed(em)
            }
            Expr::StaticMethod(m) if m.method.return_type.is_primitive() => {
                m.emit_unboxed(ctx, em)?
            }
            Expr::InstanceField(f) if self.unboxed_type().is_some() => f.emit_unboxed(ctx, em)?,
            Expr::InstanceProperty(p) if p.property.property_type.is_primitive() => {
                p.emit_unboxed(ctx, em)?
            }
            Expr::InstanceMethod(m) if self.unboxed_type().is_some() => m.emit_unboxed(ctx, em)?,
            _ => {
                return Err(CompilationError::Internal {
                    message: "unboxed emission requested for a boxed-only node".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Argument count operand for a call.
pub(crate) fn arg_count(count: usize) -> Result<u8> {
    u8::try_from(count).map_err(|_| CompilationError::Internal {
        message: format!("call with {count} arguments exceeds the operand limit"),
    })
}
