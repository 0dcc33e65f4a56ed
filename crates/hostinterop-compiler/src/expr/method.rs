//! Method call nodes.
//!
//! Static calls always carry a resolved method. Instance calls carry one
//! when the target's type is known; otherwise the call is dispatched by
//! name on the target's runtime type.

use std::sync::Arc;

use hostinterop_core::{CompilationError, HostType, MethodDef, Span};
use log::{debug, warn};

use super::{Expr, HostArg, Position, Result, arg_count};
use crate::context::CompilationContext;
use crate::conversion::{ArgInfo, box_return, gen_arg};
use crate::emit::BytecodeEmitter;
use crate::overload::{find_methods, resolve_method};

/// `(. Type (Method args...))`.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticMethodCall {
    pub owner: HostType,
    pub name: String,
    pub type_args: Option<Vec<HostType>>,
    pub args: Vec<HostArg>,
    pub method: Arc<MethodDef>,
    pub tag: Option<HostType>,
    pub span: Span,
}

impl StaticMethodCall {
    /// Resolve the overload and build the node. Failing to resolve is fatal.
    pub fn resolve(
        ctx: &CompilationContext<'_>,
        owner: HostType,
        name: String,
        type_args: Option<Vec<HostType>>,
        args: Vec<HostArg>,
        tag: Option<HostType>,
        span: Span,
    ) -> Result<Self> {
        let method = select(ctx, &owner, &name, true, type_args.as_deref(), &args, span)?;
        Ok(Self {
            owner,
            name,
            type_args,
            args,
            method,
            tag,
            span,
        })
    }

    pub fn static_type(&self) -> HostType {
        self.tag
            .clone()
            .unwrap_or_else(|| self.method.return_type.clone())
    }

    fn emit_call(&self, ctx: &CompilationContext<'_>, em: &mut BytecodeEmitter) -> Result<()> {
        let pushed = push_type_args(em, self.type_args.as_deref())?;
        push_args(ctx, em, &self.method, &self.args)?;
        em.set_line(self.span.line);
        em.invoke(&self.method, arg_count(pushed + self.args.len())?);
        write_back(em, &self.args, pushed)
    }

    pub(super) fn emit(
        &self,
        ctx: &CompilationContext<'_>,
        em: &mut BytecodeEmitter,
        pos: Position,
    ) -> Result<()> {
        self.emit_call(ctx, em)?;
        finish_result(em, &self.method.return_type, pos);
        Ok(())
    }

    pub(super) fn emit_unboxed(
        &self,
        ctx: &CompilationContext<'_>,
        em: &mut BytecodeEmitter,
    ) -> Result<()> {
        self.emit_call(ctx, em)
    }
}

/// `(. target (Method args...))`.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceMethodCall {
    pub target: Box<Expr>,
    pub name: String,
    pub type_args: Option<Vec<HostType>>,
    pub args: Vec<HostArg>,
    /// `None` when the call is dispatched at run time.
    pub method: Option<Arc<MethodDef>>,
    pub tag: Option<HostType>,
    pub span: Span,
}

impl InstanceMethodCall {
    /// Build the node, resolving the overload when the target's type is
    /// known. A known type with no matching method is fatal.
    pub fn resolve(
        ctx: &CompilationContext<'_>,
        target: Expr,
        name: String,
        type_args: Option<Vec<HostType>>,
        args: Vec<HostArg>,
        tag: Option<HostType>,
        span: Span,
    ) -> Result<Self> {
        let method = match target.static_type() {
            Some(owner) if !owner.is_void() => {
                let method = select(ctx, &owner, &name, false, type_args.as_deref(), &args, span)?;
                Some(method)
            }
            _ => {
                if type_args.is_some() {
                    return Err(CompilationError::Unsupported {
                        message: format!(
                            "generic method '{name}' called on an untyped target; add a type hint"
                        ),
                        span,
                    });
                }
                if ctx.options().warn_on_reflection {
                    warn!(
                        "at {}: call to method {} cannot be resolved (target type unknown)",
                        span, name
                    );
                }
                debug!("deferring {}/{} to runtime dispatch", name, args.len());
                None
            }
        };
        Ok(Self {
            target: Box::new(target),
            name,
            type_args,
            args,
            method,
            tag,
            span,
        })
    }

    pub fn static_type(&self) -> Option<HostType> {
        self.tag
            .clone()
            .or_else(|| self.method.as_ref().map(|m| m.return_type.clone()))
    }

    fn emit_call(&self, ctx: &CompilationContext<'_>, em: &mut BytecodeEmitter) -> Result<()> {
        self.target.emit(ctx, em, Position::Expression)?;
        match &self.method {
            Some(method) => {
                let pushed = push_type_args(em, self.type_args.as_deref())?;
                push_args(ctx, em, method, &self.args)?;
                em.set_line(self.span.line);
                em.invoke(method, arg_count(pushed + self.args.len())?);
                write_back(em, &self.args, 1 + pushed)
            }
            None => {
                for arg in &self.args {
                    match &arg.local {
                        Some(local) if arg.is_by_ref() => em.get_local(local.slot),
                        _ => arg.expr.emit(ctx, em, Position::Expression)?,
                    }
                }
                em.set_line(self.span.line);
                em.invoke_dynamic(&self.name, arg_count(self.args.len())?)?;
                write_back(em, &self.args, 1)
            }
        }
    }

    pub(super) fn emit(
        &self,
        ctx: &CompilationContext<'_>,
        em: &mut BytecodeEmitter,
        pos: Position,
    ) -> Result<()> {
        self.emit_call(ctx, em)?;
        match &self.method {
            Some(method) => finish_result(em, &method.return_type, pos),
            None if pos == Position::Statement => em.discard(),
            None => {}
        }
        Ok(())
    }

    pub(super) fn emit_unboxed(
        &self,
        ctx: &CompilationContext<'_>,
        em: &mut BytecodeEmitter,
    ) -> Result<()> {
        self.emit_call(ctx, em)
    }
}

/// Resolve a call against a known owner type.
fn select(
    ctx: &CompilationContext<'_>,
    owner: &HostType,
    name: &str,
    is_static: bool,
    type_args: Option<&[HostType]>,
    args: &[HostArg],
    span: Span,
) -> Result<Arc<MethodDef>> {
    let infos: Vec<ArgInfo> = args.iter().map(HostArg::info).collect();
    let type_arg_count = type_args.map_or(0, <[HostType]>::len);
    let candidates = find_methods(ctx.oracle(), owner, name, is_static, &infos, type_arg_count);
    if candidates.is_empty() {
        return Err(CompilationError::MissingMember {
            type_name: owner.name(),
            member: format!("{}/{}", name, args.len()),
            span,
        });
    }
    match resolve_method(ctx.oracle(), &candidates, &infos, span)? {
        Some(found) => Ok(found.method),
        None => Err(CompilationError::NoMatchingOverload {
            name: format!("{}.{}", owner.name(), name),
            args: describe_args(&infos),
            span,
        }),
    }
}

fn describe_args(infos: &[ArgInfo]) -> String {
    infos
        .iter()
        .map(|info| {
            let ty = info
                .hint
                .as_ref()
                .map_or_else(|| "?".to_string(), HostType::name);
            if info.by_ref { format!("ref {ty}") } else { ty }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Push generic type arguments ahead of the call's arguments.
fn push_type_args(em: &mut BytecodeEmitter, type_args: Option<&[HostType]>) -> Result<usize> {
    let type_args = type_args.unwrap_or_default();
    for ty in type_args {
        em.push_type(ty)?;
    }
    Ok(type_args.len())
}

fn push_args(
    ctx: &CompilationContext<'_>,
    em: &mut BytecodeEmitter,
    method: &MethodDef,
    args: &[HostArg],
) -> Result<()> {
    if method.params.len() != args.len() {
        return Err(CompilationError::Internal {
            message: format!(
                "{} resolved with {} arguments",
                method.signature(),
                args.len()
            ),
        });
    }
    for (arg, param) in args.iter().zip(&method.params) {
        gen_arg(ctx, em, arg, param)?;
    }
    Ok(())
}

/// Copy by-ref arguments back into their locals. `base` is the index of
/// the first argument in the call's argument frame.
fn write_back(em: &mut BytecodeEmitter, args: &[HostArg], base: usize) -> Result<()> {
    for (i, arg) in args.iter().enumerate() {
        if let (true, Some(local)) = (arg.is_by_ref(), &arg.local) {
            em.write_back(arg_count(base + i)?, local.slot);
        }
    }
    Ok(())
}

fn finish_result(em: &mut BytecodeEmitter, return_type: &HostType, pos: Position) {
    match pos {
        Position::Expression => box_return(em, return_type),
        Position::Statement if !return_type.is_void() => em.discard(),
        Position::Statement => {}
    }
}
