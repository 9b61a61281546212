//! Primitive parameter types must be orderable against every other candidate.

use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::dispatch::{DispatchPoint, TypeSignature};

use super::{AnalysisCx, DispatchPointAnalysis};

/// Rejects a primitive parameter type that another candidate's type at the
/// same position is neither equal to nor ordered against.
///
/// Without this check `f(int)` and `f(String)` would both be possible winners
/// for unrelated values, and `f(int)` against `f(boolean)` could never be told
/// apart by specificity.
pub struct MatchingPrimitiveTypes;

impl DispatchPointAnalysis for MatchingPrimitiveTypes {
    fn name(&self) -> &'static str {
        "matching primitive types"
    }

    fn check(&self, cx: &AnalysisCx<'_>, point: &DispatchPoint, diagnostics: &mut Vec<Diagnostic>) -> bool {
        let signatures: Vec<TypeSignature> =
            point.candidates.iter().map(|c| c.signature(cx.env)).collect();

        let mut ok = true;
        for (i, first) in point.candidates.iter().enumerate() {
            for (j, second) in point.candidates.iter().enumerate().skip(i + 1) {
                let positions = signatures[i].params.iter().zip(&signatures[j].params).enumerate();
                for (position, (a, b)) in positions {
                    if !(a.is_primitive() || b.is_primitive()) || cx.env.comparable(a, b) {
                        continue;
                    }
                    ok = false;
                    diagnostics.push(
                        Diagnostic::error(
                            DiagnosticCode::IncomparablePrimitive,
                            format!(
                                "parameter {} of `{}` has type `{}`, which cannot be ordered against `{}`",
                                position,
                                second.name,
                                cx.env.describe(b),
                                cx.env.describe(a)
                            ),
                        )
                        .at(second.def_id)
                        .at_position(position)
                        .with_related(first.def_id, format!("declared as `{}` here", cx.env.describe(a))),
                    );
                }
            }
        }
        ok
    }
}
