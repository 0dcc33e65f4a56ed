//! Overload resolution for host method calls.
//!
//! ## Algorithm
//!
//! 1. Query the oracle for methods with the requested name, staticness and
//!    arity, keeping those whose generic arity equals the number of
//!    supplied type arguments
//! 2. Check argument compatibility for each candidate
//! 3. Sum the conversion costs of each applicable candidate
//! 4. Rank by cost and select the best match
//! 5. Report ambiguity when candidates tie
//!
//! No applicable candidate is not an error at this level: the caller
//! decides whether an unresolved call may fall back to runtime dispatch.

mod ranking;

pub use ranking::find_best_match;

use std::sync::Arc;

use hostinterop_core::{
    CompilationError, HostType, MemberDescriptor, MemberOracle, MemberQuery, MethodDef, Span,
};
use log::{debug, trace};

use crate::conversion::{ArgInfo, Conversion, find_conversion};

/// Result of successful overload resolution.
#[derive(Debug, Clone)]
pub struct MethodMatch {
    /// The selected method.
    pub method: Arc<MethodDef>,
    /// Conversion for each argument.
    pub conversions: Vec<Conversion>,
    /// Total conversion cost (lower is better).
    pub total_cost: u32,
}

/// Methods named `name` on `owner` that can take `args.len()` arguments and
/// `type_arg_count` type arguments.
pub fn find_methods(
    oracle: &dyn MemberOracle,
    owner: &HostType,
    name: &str,
    is_static: bool,
    args: &[ArgInfo],
    type_arg_count: usize,
) -> Vec<Arc<MethodDef>> {
    let hints: Vec<Option<HostType>> = args.iter().map(|a| a.hint.clone()).collect();
    oracle
        .lookup(&MemberQuery {
            owner,
            name,
            is_static,
            arity: args.len(),
            arg_hints: &hints,
        })
        .into_iter()
        .filter_map(|member| match member {
            MemberDescriptor::Method(m) if m.generic_arity == type_arg_count => Some(m),
            _ => None,
        })
        .collect()
}

/// Select the best applicable method.
///
/// # Returns
///
/// * `Ok(Some(MethodMatch))` - a unique best candidate
/// * `Ok(None)` - no candidate accepts the arguments
/// * `Err(CompilationError::AmbiguousOverload)` - candidates tie
pub fn resolve_method(
    oracle: &dyn MemberOracle,
    candidates: &[Arc<MethodDef>],
    args: &[ArgInfo],
    span: Span,
) -> Result<Option<MethodMatch>, CompilationError> {
    let viable: Vec<MethodMatch> = candidates
        .iter()
        .filter_map(|m| match_method(oracle, m, args))
        .collect();

    if viable.is_empty() {
        debug!(
            "no applicable overload among {} candidate(s)",
            candidates.len()
        );
        return Ok(None);
    }

    let best = find_best_match(&viable, span)?;
    debug!(
        "resolved {} (cost {})",
        best.method.signature(),
        best.total_cost
    );
    Ok(Some(best))
}

/// Check one candidate against the arguments.
fn match_method(
    oracle: &dyn MemberOracle,
    method: &Arc<MethodDef>,
    args: &[ArgInfo],
) -> Option<MethodMatch> {
    if method.arity() != args.len() {
        return None;
    }

    let mut conversions = Vec::with_capacity(args.len());
    let mut total_cost = 0u32;
    for (arg, param) in args.iter().zip(&method.params) {
        let Some(conv) = find_conversion(oracle, arg, param) else {
            trace!(
                "{} rejected: argument {:?} does not fit {}",
                method.signature(),
                arg.hint,
                param.param_type
            );
            return None;
        };
        total_cost += conv.cost;
        conversions.push(conv);
    }

    Some(MethodMatch {
        method: Arc::clone(method),
        conversions,
        total_cost,
    })
}
