//! Cost-based ranking for overload resolution.
//!
//! Selects the best match from the applicable candidates by total
//! conversion cost, with tie-breaking on exact matches.

use hostinterop_core::{CompilationError, Span};

use super::MethodMatch;

/// Find the best match from viable candidates.
///
/// Selects the candidate with the lowest total conversion cost. Among the
/// cheapest, the one with the most exact argument matches wins; if that
/// still leaves more than one, the call is ambiguous.
///
/// # Returns
///
/// * `Ok(MethodMatch)` - The best matching candidate
/// * `Err(CompilationError::AmbiguousOverload)` - Multiple candidates tie
pub fn find_best_match(
    viable: &[MethodMatch],
    span: Span,
) -> Result<MethodMatch, CompilationError> {
    let Some(min_cost) = viable.iter().map(|m| m.total_cost).min() else {
        return Err(CompilationError::Internal {
            message: "No candidates for overload ranking".to_string(),
        });
    };

    let cheapest: Vec<&MethodMatch> = viable
        .iter()
        .filter(|m| m.total_cost == min_cost)
        .collect();
    if let [only] = cheapest.as_slice() {
        return Ok((*only).clone());
    }

    let best_exact = cheapest
        .iter()
        .map(|m| count_exact_matches(m))
        .max()
        .unwrap_or(0);
    let winners: Vec<&MethodMatch> = cheapest
        .into_iter()
        .filter(|m| count_exact_matches(m) == best_exact)
        .collect();

    match winners.as_slice() {
        [winner] => Ok((*winner).clone()),
        tied => Err(ambiguous_overload_error(tied, span)),
    }
}

/// Count the number of exact (identity) matches in the conversions.
fn count_exact_matches(m: &MethodMatch) -> usize {
    m.conversions.iter().filter(|c| c.is_exact()).count()
}

/// Build error for ambiguous overload.
fn ambiguous_overload_error(tied: &[&MethodMatch], span: Span) -> CompilationError {
    let name = tied
        .first()
        .map(|m| format!("{}.{}", m.method.owner, m.method.name))
        .unwrap_or_else(|| "unknown".to_string());
    let candidates = tied
        .iter()
        .map(|m| m.method.signature())
        .collect::<Vec<_>>()
        .join(" and ");

    CompilationError::AmbiguousOverload {
        name,
        candidates,
        span,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::Conversion;
    use hostinterop_core::{HostType, MethodDef, TypeHash};
    use std::sync::Arc;

    fn make_match(id: u64, conversions: Vec<Conversion>) -> MethodMatch {
        let total_cost = conversions.iter().map(|c| c.cost).sum();
        MethodMatch {
            method: Arc::new(MethodDef {
                hash: TypeHash(id),
                owner: HostType::class("Demo.T"),
                name: format!("m{id}"),
                params: vec![],
                return_type: HostType::Void,
                is_static: true,
                generic_arity: 0,
            }),
            conversions,
            total_cost,
        }
    }

    #[test]
    fn single_viable_returns_it() {
        let m = make_match(1, vec![Conversion::boxing()]);
        let result = find_best_match(&[m], Span::default()).unwrap();
        assert_eq!(result.method.hash, TypeHash(1));
    }

    #[test]
    fn lower_cost_wins() {
        let m1 = make_match(1, vec![Conversion::converting(), Conversion::boxing()]);
        let m2 = make_match(2, vec![Conversion::widening(), Conversion::widening()]);
        let result = find_best_match(&[m1, m2], Span::default()).unwrap();
        assert_eq!(result.method.hash, TypeHash(2));
    }

    #[test]
    fn tie_broken_by_exact_matches() {
        // 0 + 2 vs 1 + 1: same cost, the first has an exact match
        let m1 = make_match(1, vec![Conversion::identity(), Conversion::boxing()]);
        let m2 = make_match(2, vec![Conversion::widening(), Conversion::widening()]);
        let result = find_best_match(&[m2, m1], Span::default()).unwrap();
        assert_eq!(result.method.hash, TypeHash(1));
    }

    #[test]
    fn true_tie_is_ambiguous() {
        let m1 = make_match(1, vec![Conversion::identity(), Conversion::boxing()]);
        let m2 = make_match(2, vec![Conversion::boxing(), Conversion::identity()]);
        let err = find_best_match(&[m1, m2], Span::default()).unwrap_err();
        let CompilationError::AmbiguousOverload { candidates, .. } = err else {
            panic!("expected ambiguity");
        };
        assert!(candidates.contains("m1()"));
        assert!(candidates.contains("m2()"));
    }

    #[test]
    fn no_candidates_is_internal_error() {
        assert!(matches!(
            find_best_match(&[], Span::default()),
            Err(CompilationError::Internal { .. })
        ));
    }
}
