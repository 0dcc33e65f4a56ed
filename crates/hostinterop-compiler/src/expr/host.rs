//! Parsing of `(. target member ...)` host interop forms.
//!
//! ## Shapes
//!
//! - `(. Type name)` / `(. instance name)` - zero-arity member access;
//!   `name` may be a symbol or keyword
//! - `(. target (method args...))` / `(. target method args...)` - a call
//! - `(type-args T...)` as the first argument supplies generic type
//!   arguments
//! - `(by-ref local)` as an argument passes a local by reference
//!
//! A target that names a type selects the static path; anything else is
//! analysed as an expression and selects the instance path.

use std::sync::Arc;

use hostinterop_core::{
    CompilationError, FieldDef, Form, FormKind, HostType, MemberDescriptor, MemberQuery, MethodDef,
    PropertyDef, Span, munge,
};
use log::{debug, trace, warn};

use super::{
    Expr, HostArg, InstanceFieldAccess, InstanceMethodCall, InstancePropertyAccess,
    InstanceZeroArityCall, Result, StaticFieldAccess, StaticMethodCall, StaticPropertyAccess,
    analyze,
};
use crate::context::{CompilationContext, ParserContext};
use crate::type_resolver::TypeResolver;

/// Parse a `(. target member ...)` form.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn parse_host(ctx: &CompilationContext<'_>, pcon: ParserContext, form: &Form) -> Result<Expr> {
    let span = form.span;
    let items = match form.as_list() {
        Some(items) if items.len() >= 3 => items,
        _ => {
            return Err(malformed(
                "expecting (. target member ...) or (. target (method args...))",
                span,
            ));
        }
    };

    let resolver = TypeResolver::new(ctx);
    let tag = resolver.form_tag(form)?;
    let target_form = &items[1];
    let member_form = &items[2];

    let operand = pcon.set_recur(false).set_assign(false);
    let static_owner = resolver.maybe_type(target_form);
    let instance = match &static_owner {
        Some(owner) => {
            trace!("host form targets type {}", owner);
            None
        }
        None => Some(analyze(ctx, operand, target_form)?),
    };

    // Zero-arity member access
    if items.len() == 3 {
        let name = match &member_form.kind {
            FormKind::Symbol(sym) => Some(sym.name()),
            FormKind::Keyword(kw) => Some(kw.name()),
            _ => None,
        };
        if let Some(name) = name {
            let name = munge(name);
            return match (static_owner, instance) {
                (Some(owner), _) => static_member(ctx, owner, name, tag, span),
                (None, Some(target)) => instance_member(ctx, pcon, target, name, tag, span),
                (None, None) => Err(internal_no_target()),
            };
        }
    }

    // Method call
    let call: &[Form] = match &member_form.kind {
        FormKind::List(inner) if items.len() == 3 => inner,
        _ => &items[2..],
    };
    let Some((head, rest)) = call.split_first() else {
        return Err(malformed("empty method call", member_form.span));
    };
    let Some(method_sym) = head.as_symbol() else {
        return Err(malformed("method name must be a symbol", head.span));
    };
    let name = munge(method_sym.name());

    let (type_args, arg_forms) = match rest.split_first() {
        Some((first, tail)) if first.is_call_to("type-args") => {
            (Some(parse_type_args(&resolver, first)?), tail)
        }
        _ => (None, rest),
    };
    let args = arg_forms
        .iter()
        .map(|f| parse_arg(ctx, pcon, f))
        .collect::<Result<Vec<_>>>()?;

    match (static_owner, instance) {
        (Some(owner), _) => Ok(Expr::StaticMethod(StaticMethodCall::resolve(
            ctx, owner, name, type_args, args, tag, span,
        )?)),
        (None, Some(target)) => {
            // `(. x (foo))` on an untyped target is the same runtime lookup
            // as `(. x foo)`.
            if args.is_empty()
                && type_args.is_none()
                && !pcon.is_assign_target()
                && target.static_type().is_none()
            {
                return Ok(deferred_zero_arity(ctx, pcon, target, name, tag, span));
            }
            Ok(Expr::InstanceMethod(InstanceMethodCall::resolve(
                ctx, target, name, type_args, args, tag, span,
            )?))
        }
        (None, None) => Err(internal_no_target()),
    }
}

/// `(. Type name)`: field, then property, then zero-argument method.
pub(super) fn static_member(
    ctx: &CompilationContext<'_>,
    owner: HostType,
    name: String,
    tag: Option<HostType>,
    span: Span,
) -> Result<Expr> {
    let found = zero_arity_member(ctx, &owner, &name, true);
    Ok(match found {
        Some(ZeroArity::Field(field)) => Expr::StaticField(StaticFieldAccess { field, tag, span }),
        Some(ZeroArity::Property(property)) => Expr::StaticProperty(StaticPropertyAccess {
            property,
            tag,
            span,
        }),
        Some(ZeroArity::Method(method)) => Expr::StaticMethod(StaticMethodCall {
            owner,
            name,
            type_args: None,
            args: Vec::new(),
            method,
            tag,
            span,
        }),
        None => {
            return Err(CompilationError::MissingMember {
                type_name: owner.name(),
                member: name,
                span,
            });
        }
    })
}

/// `(. instance name)`: resolved against the target's static type when
/// known, otherwise deferred.
fn instance_member(
    ctx: &CompilationContext<'_>,
    pcon: ParserContext,
    target: Expr,
    name: String,
    tag: Option<HostType>,
    span: Span,
) -> Result<Expr> {
    let found = target
        .static_type()
        .and_then(|owner| zero_arity_member(ctx, &owner, &name, false));
    let target = Box::new(target);
    Ok(match found {
        Some(ZeroArity::Field(field)) => Expr::InstanceField(InstanceFieldAccess {
            target,
            name,
            field: Some(field),
            tag,
            span,
        }),
        Some(ZeroArity::Property(property)) => Expr::InstanceProperty(InstancePropertyAccess {
            target,
            property,
            tag,
            span,
        }),
        Some(ZeroArity::Method(method)) => Expr::InstanceMethod(InstanceMethodCall {
            target,
            name,
            type_args: None,
            args: Vec::new(),
            method: Some(method),
            tag,
            span,
        }),
        None => deferred_zero_arity(ctx, pcon, *target, name, tag, span),
    })
}

fn deferred_zero_arity(
    ctx: &CompilationContext<'_>,
    pcon: ParserContext,
    target: Expr,
    name: String,
    tag: Option<HostType>,
    span: Span,
) -> Expr {
    if ctx.options().warn_on_reflection {
        warn!(
            "at {}: reference to field/property {} cannot be resolved",
            span, name
        );
    }
    let target = Box::new(target);
    if pcon.is_assign_target() {
        debug!("deferring assignment target {} to runtime lookup", name);
        Expr::InstanceField(InstanceFieldAccess {
            target,
            name,
            field: None,
            tag,
            span,
        })
    } else {
        debug!("deferring zero-arity member {} to runtime dispatch", name);
        Expr::InstanceZeroArityDynamic(InstanceZeroArityCall {
            target,
            name,
            tag,
            span,
        })
    }
}

enum ZeroArity {
    Field(Arc<FieldDef>),
    Property(Arc<PropertyDef>),
    Method(Arc<MethodDef>),
}

/// Look up a zero-arity member, preferring fields over properties over
/// methods.
fn zero_arity_member(
    ctx: &CompilationContext<'_>,
    owner: &HostType,
    name: &str,
    is_static: bool,
) -> Option<ZeroArity> {
    let members = ctx.oracle().lookup(&MemberQuery {
        owner,
        name,
        is_static,
        arity: 0,
        arg_hints: &[],
    });
    trace!("{owner}.{name}: {} zero-arity candidate(s)", members.len());

    let field = members.iter().find_map(|m| match m {
        MemberDescriptor::Field(f) => Some(ZeroArity::Field(Arc::clone(f))),
        _ => None,
    });
    let property = || {
        members.iter().find_map(|m| match m {
            MemberDescriptor::Property(p) => Some(ZeroArity::Property(Arc::clone(p))),
            _ => None,
        })
    };
    let method = || {
        members.iter().find_map(|m| match m {
            MemberDescriptor::Method(m) if m.arity() == 0 && m.generic_arity == 0 => {
                Some(ZeroArity::Method(Arc::clone(m)))
            }
            _ => None,
        })
    };
    field.or_else(property).or_else(method)
}

fn parse_type_args(resolver: &TypeResolver<'_, '_>, form: &Form) -> Result<Vec<HostType>> {
    let items = form.as_list().unwrap_or_default();
    items
        .iter()
        .skip(1)
        .map(|f| resolver.type_arg(f))
        .collect()
}

fn parse_arg(ctx: &CompilationContext<'_>, pcon: ParserContext, form: &Form) -> Result<HostArg> {
    if !form.is_call_to("by-ref") {
        let expr = analyze(ctx, pcon.set_recur(false).set_assign(false), form)?;
        return Ok(HostArg::standard(expr));
    }

    let items = form.as_list().unwrap_or_default();
    let [_, local_form] = items else {
        return Err(malformed("by-ref takes exactly one local binding", form.span));
    };
    let binding = local_form
        .as_symbol()
        .filter(|sym| !sym.is_qualified())
        .and_then(|sym| ctx.locals().resolve_local(sym));
    match binding {
        Some(binding) => Ok(HostArg::by_ref(binding.clone(), local_form.span)),
        None => Err(malformed("by-ref argument must be a local binding", local_form.span)),
    }
}

fn malformed(message: &str, span: Span) -> CompilationError {
    CompilationError::MalformedForm {
        message: message.to_string(),
        span,
    }
}

fn internal_no_target() -> CompilationError {
    CompilationError::Internal {
        message: "host form without a target".to_string(),
    }
}
