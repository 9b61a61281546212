//! Candidate return types must fit every entry point's return type.

use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::dispatch::DispatchPoint;
use crate::types::{DeclaredType, ParameterType, TypeEnv};

use super::{AnalysisCx, DispatchPointAnalysis};

/// Rejects candidates whose result could not be returned from a dispatcher.
pub struct ReturnTypeAnalysis;

/// Check if a value of type `from` can be returned where `to` is declared.
///
/// `void` only fits `void`. Primitives widen, or box into their wrapper type
/// and its supertypes; anything fits the top type, and references follow
/// erased subtyping. Boxing never combines with widening.
pub fn is_assignable(env: &TypeEnv, from: &DeclaredType, to: &DeclaredType) -> bool {
    match (from.erasure(env), to.erasure(env)) {
        (None, None) => true,
        (None, Some(_)) | (Some(_), None) => false,
        (Some(from), Some(to)) => match (from, to) {
            (_, ParameterType::Top) => true,
            (ParameterType::Primitive(a), ParameterType::Primitive(b)) => a.widens_to(b),
            (ParameterType::Primitive(a), ParameterType::Reference(b)) => env
                .lookup(a.wrapper_name())
                .is_some_and(|wrapper| env.is_subtype(wrapper, b)),
            (ParameterType::Reference(a), ParameterType::Reference(b)) => env.is_subtype(a, b),
            _ => false,
        },
    }
}

impl DispatchPointAnalysis for ReturnTypeAnalysis {
    fn name(&self) -> &'static str {
        "return type"
    }

    fn check(&self, cx: &AnalysisCx<'_>, point: &DispatchPoint, diagnostics: &mut Vec<Diagnostic>) -> bool {
        let mut ok = true;
        for entry in &point.entry_points {
            for candidate in &point.candidates {
                if is_assignable(cx.env, &candidate.return_type, &entry.return_type) {
                    continue;
                }
                ok = false;
                diagnostics.push(
                    Diagnostic::error(
                        DiagnosticCode::IncompatibleReturn,
                        format!(
                            "return type `{}` of `{}` is not assignable to `{}`",
                            cx.env.describe_declared(&candidate.return_type),
                            candidate.name,
                            cx.env.describe_declared(&entry.return_type)
                        ),
                    )
                    .at(candidate.def_id)
                    .with_related(entry.def_id, "entry point declared here"),
                );
            }
        }
        ok
    }
}
