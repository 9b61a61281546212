//! All candidates and entry points of a dispatch point share one arity.

use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::dispatch::{DefId, DispatchPoint};

use super::{AnalysisCx, DispatchPointAnalysis};

/// Rejects dispatch points whose declarations differ in parameter count.
///
/// The expected arity is the first candidate's, or the first entry point's
/// when there are no candidates.
pub struct MethodArity;

impl DispatchPointAnalysis for MethodArity {
    fn name(&self) -> &'static str {
        "method arity"
    }

    fn check(&self, _cx: &AnalysisCx<'_>, point: &DispatchPoint, diagnostics: &mut Vec<Diagnostic>) -> bool {
        let declarations: Vec<(DefId, usize, &str)> = point
            .candidates
            .iter()
            .map(|c| (c.def_id, c.arity(), "definition"))
            .chain(point.entry_points.iter().map(|e| (e.def_id, e.arity(), "entry point")))
            .collect();

        let Some(&(first_id, expected, _)) = declarations.first() else {
            return true;
        };

        let mut ok = true;
        for &(def_id, arity, what) in &declarations[1..] {
            if arity == expected {
                continue;
            }
            ok = false;
            diagnostics.push(
                Diagnostic::error(
                    DiagnosticCode::ArityMismatch,
                    format!(
                        "{} of `{}` has {} parameter(s), expected {}",
                        what, point.name, arity, expected
                    ),
                )
                .at(def_id)
                .with_related(first_id, format!("this declaration has {} parameter(s)", expected)),
            );
        }
        ok
    }
}
