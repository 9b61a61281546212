//! Specificity must never hinge on erased type arguments.

use rustc_hash::FxHashSet;

use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::dispatch::{CandidateDefinition, DefId, DispatchPoint};

use super::{AnalysisCx, DispatchPointAnalysis};

/// Rejects positions where a generic declared type would win specificity.
///
/// Runtime tests only see erasures. When two candidates declare different
/// types at a position whose erasures are ordered, the more specific side is
/// selected by an erased test, so it must be fully described by its erasure.
/// With equal erasures both sides must be.
pub struct DispatchOnGenerics;

impl DispatchPointAnalysis for DispatchOnGenerics {
    fn name(&self) -> &'static str {
        "dispatch on generics"
    }

    fn check(&self, cx: &AnalysisCx<'_>, point: &DispatchPoint, diagnostics: &mut Vec<Diagnostic>) -> bool {
        let mut reported: FxHashSet<(DefId, usize)> = FxHashSet::default();
        let mut ok = true;

        for (i, a) in point.candidates.iter().enumerate() {
            for b in point.candidates.iter().skip(i + 1) {
                for (position, (da, db)) in a.param_types.iter().zip(&b.param_types).enumerate() {
                    if da == db || !(da.is_generic() || db.is_generic()) {
                        continue;
                    }
                    let (Some(ea), Some(eb)) = (da.erasure(cx.env), db.erasure(cx.env)) else {
                        continue;
                    };
                    if !cx.env.comparable(&ea, &eb) {
                        continue;
                    }

                    let winners: &[(&CandidateDefinition, &CandidateDefinition)] = if ea == eb {
                        &[(a, b), (b, a)]
                    } else if cx.env.more_specific_than(&ea, &eb) {
                        &[(a, b)]
                    } else {
                        &[(b, a)]
                    };

                    for &(winner, other) in winners {
                        let declared = &winner.param_types[position];
                        if declared.is_reifiable() || !reported.insert((winner.def_id, position)) {
                            continue;
                        }
                        ok = false;
                        diagnostics.push(
                            Diagnostic::error(
                                DiagnosticCode::GenericDispatch,
                                format!(
                                    "parameter {} of `{}` is more specific only through type arguments of `{}`, which are erased at run time",
                                    position,
                                    winner.name,
                                    cx.env.describe_declared(declared)
                                ),
                            )
                            .at(winner.def_id)
                            .at_position(position)
                            .with_related(
                                other.def_id,
                                format!("competes with `{}` here", cx.env.describe_declared(&other.param_types[position])),
                            ),
                        );
                    }
                }
            }
        }
        ok
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::config::HostConfig;
    use crate::types::{DeclaredType, TypeEnv};

    fn generic(env: &TypeEnv, name: &str, args: Vec<DeclaredType>) -> DeclaredType {
        DeclaredType::Declared {
            id: env.lookup(name).unwrap(),
            args,
        }
    }

    fn run(env: &TypeEnv, params: Vec<DeclaredType>) -> Vec<Diagnostic> {
        let host = HostConfig::default();
        let cx = AnalysisCx { env, host: &host };
        let candidates = params
            .into_iter()
            .enumerate()
            .map(|(i, p)| candidate(i as u32, vec![p], DeclaredType::Void))
            .collect();
        let mut diagnostics = Vec::new();
        let ok = DispatchOnGenerics.check(&cx, &point(vec![], candidates), &mut diagnostics);
        assert_eq!(ok, diagnostics.is_empty());
        diagnostics
    }

    #[test]
    fn test_same_erasure_different_arguments() {
        let env = TypeEnv::java_prelude();
        let diagnostics = run(
            &env,
            vec![
                generic(&env, "List", vec![named(&env, "String")]),
                generic(&env, "List", vec![named(&env, "Integer")]),
            ],
        );
        let offenders: Vec<_> = diagnostics.iter().filter_map(|d| d.def_id).collect();
        assert_eq!(offenders, vec![DefId::new(0), DefId::new(1)]);
    }

    #[test]
    fn test_wildcards_are_fine() {
        let env = TypeEnv::java_prelude();
        let diagnostics = run(
            &env,
            vec![
                generic(&env, "List", vec![DeclaredType::Wildcard]),
                named(&env, "Collection"),
            ],
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_generic_on_losing_side_is_fine() {
        let env = TypeEnv::java_prelude();
        let diagnostics = run(
            &env,
            vec![
                generic(&env, "Collection", vec![named(&env, "String")]),
                named(&env, "List"),
            ],
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_generic_on_winning_side() {
        let env = TypeEnv::java_prelude();
        let diagnostics = run(
            &env,
            vec![
                named(&env, "Collection"),
                generic(&env, "List", vec![named(&env, "String")]),
            ],
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].def_id, Some(DefId::new(1)));
        assert_eq!(diagnostics[0].related[0].0, DefId::new(0));
    }

    #[test]
    fn test_type_variable_with_plain_bound() {
        let env = TypeEnv::java_prelude();
        let var = DeclaredType::TypeVar {
            name: "T".to_string(),
            bound: Box::new(named(&env, "Number")),
        };
        let diagnostics = run(&env, vec![var, named(&env, "Object")]);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_unrelated_positions_ignored() {
        let env = TypeEnv::java_prelude();
        let diagnostics = run(
            &env,
            vec![
                generic(&env, "List", vec![named(&env, "String")]),
                named(&env, "String"),
            ],
        );
        assert!(diagnostics.is_empty());
    }
}
