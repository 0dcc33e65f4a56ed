//! Form analysis entry point.

use hostinterop_core::{CompilationError, Form, FormKind, Span, Symbol, Value, munge};
use log::trace;

use super::host::static_member;
use super::{
    AssignExpr, ConstantLiteral, EmptyCollectionLiteral, Expr, LocalRef, NumberLiteral, Result,
    StringLiteral, parse_host, parse_quoted,
};
use crate::context::{CompilationContext, ParserContext};
use crate::type_resolver::TypeResolver;

/// Analyse one form into an expression tree.
///
/// Handles literals, symbols, `quote`, `.` host forms, `set!`, and the
/// `(.method target args...)` and `(Type/method args...)` shorthands.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn analyze(ctx: &CompilationContext<'_>, pcon: ParserContext, form: &Form) -> Result<Expr> {
    match &form.kind {
        FormKind::Nil => Ok(Expr::Nil),
        FormKind::Bool(true) => Ok(Expr::True),
        FormKind::Bool(false) => Ok(Expr::False),
        FormKind::Int(_) | FormKind::Float(_) => {
            Ok(Expr::Number(NumberLiteral::new(ctx, form.to_value())))
        }
        FormKind::Str(s) => Ok(Expr::String(StringLiteral::new(s.as_str()))),
        FormKind::Char(_) | FormKind::Keyword(_) | FormKind::Type(_) => {
            Ok(Expr::Constant(ConstantLiteral::new(ctx, form.to_value())))
        }
        FormKind::Symbol(sym) => analyze_symbol(ctx, sym, form),
        FormKind::List(items) => analyze_seq(ctx, pcon, items, form),
        FormKind::Vector(_) | FormKind::Map(_) | FormKind::Set(_) => {
            match EmptyCollectionLiteral::new(form.to_value()) {
                Some(empty) => Ok(Expr::EmptyCollection(empty)),
                None => Err(CompilationError::Unsupported {
                    message: "non-empty collection literals must be quoted".to_string(),
                    span: form.span,
                }),
            }
        }
    }
}

fn analyze_symbol(ctx: &CompilationContext<'_>, sym: &Symbol, form: &Form) -> Result<Expr> {
    let resolver = TypeResolver::new(ctx);

    if let Some(binding) = ctx.locals().resolve_local(sym) {
        let tag = resolver.form_tag(form)?;
        return Ok(Expr::Local(LocalRef::new(binding.clone(), tag, form.span)));
    }

    if let Some(ty) = resolver.maybe_type_symbol(sym) {
        trace!("symbol {} names type {}", sym, ty);
        return Ok(Expr::Constant(ConstantLiteral::new(ctx, Value::Type(ty))));
    }

    // Type/Member static access
    if let Some(ns) = sym.namespace() {
        if let Some(owner) = resolver.maybe_type_symbol(&Symbol::new(ns)) {
            let tag = resolver.form_tag(form)?;
            return static_member(ctx, owner, munge(sym.name()), tag, form.span);
        }
    }

    if !sym.is_qualified() && sym.name().contains('.') {
        return Err(CompilationError::UnresolvedTypeName {
            name: sym.to_string(),
            span: form.span,
        });
    }
    Err(CompilationError::UnresolvedSymbol {
        name: sym.to_string(),
        span: form.span,
    })
}

fn analyze_seq(
    ctx: &CompilationContext<'_>,
    pcon: ParserContext,
    items: &[Form],
    form: &Form,
) -> Result<Expr> {
    let Some(head) = items.first() else {
        return EmptyCollectionLiteral::new(form.to_value())
            .map(Expr::EmptyCollection)
            .ok_or_else(|| CompilationError::Internal {
                message: "empty list is not an empty collection".to_string(),
            });
    };
    let Some(head_sym) = head.as_symbol() else {
        return Err(unsupported_call(head, form.span));
    };

    if !head_sym.is_qualified() {
        match head_sym.name() {
            "quote" => {
                let [_, quoted] = items else {
                    return Err(CompilationError::MalformedForm {
                        message: "quote takes exactly one form".to_string(),
                        span: form.span,
                    });
                };
                return parse_quoted(ctx, quoted);
            }
            "." => return parse_host(ctx, pcon, form),
            "set!" => return analyze_assign(ctx, pcon, items, form.span),
            name if name.len() > 1 && name.starts_with('.') => {
                // (.method target args...) => (. target (method args...))
                let [_, target, args @ ..] = items else {
                    return Err(CompilationError::MalformedForm {
                        message: format!("{name} requires a target"),
                        span: form.span,
                    });
                };
                let method = Form::symbol(&name[1..]).with_span(head.span);
                let call = Form::list(std::iter::once(method).chain(args.iter().cloned()));
                return parse_host(ctx, pcon, &expand_host(form, target.clone(), call));
            }
            _ => {}
        }
    } else if let Some(ns) = head_sym.namespace() {
        // (Type/method args...) => (. Type (method args...))
        if let Some(owner) = TypeResolver::new(ctx).maybe_type_symbol(&Symbol::new(ns)) {
            let method = Form::symbol(head_sym.name()).with_span(head.span);
            let call = Form::list(std::iter::once(method).chain(items[1..].iter().cloned()));
            let target = Form::host_type(owner).with_span(head.span);
            return parse_host(ctx, pcon, &expand_host(form, target, call));
        }
    }

    Err(unsupported_call(head, form.span))
}

/// Build `(. target call)` carrying the source form's span and tag.
fn expand_host(source: &Form, target: Form, call: Form) -> Form {
    let mut expanded = Form::list([Form::symbol("."), target, call]);
    expanded.span = source.span;
    expanded.tag = source.tag.clone();
    expanded
}

fn analyze_assign(
    ctx: &CompilationContext<'_>,
    pcon: ParserContext,
    items: &[Form],
    span: Span,
) -> Result<Expr> {
    let [_, target_form, value_form] = items else {
        return Err(CompilationError::MalformedForm {
            message: "set! takes a target and a value".to_string(),
            span,
        });
    };
    let target = analyze(ctx, pcon.set_assign(true), target_form)?;
    let value = analyze(ctx, pcon.set_assign(false).set_recur(false), value_form)?;
    let assign = AssignExpr::new(target, value, span)?;
    Ok(Expr::Assign(Box::new(assign)))
}

fn unsupported_call(head: &Form, span: Span) -> CompilationError {
    let head = match &head.kind {
        FormKind::Symbol(sym) => sym.to_string(),
        _ => "a non-symbol".to_string(),
    };
    CompilationError::Unsupported {
        message: format!("cannot analyse a call headed by {head}"),
        span,
    }
}
