//! Dispatch points must not accidentally shadow root-type methods.

use crate::config::RootMethod;
use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::dispatch::{DefId, DispatchPoint};
use crate::types::{DeclaredType, TypeEnv};

use super::{AnalysisCx, DispatchPointAnalysis};

/// Rejects declarations that share name and arity with a method every
/// reference type inherits, unless they match it exactly after erasure.
pub struct ObjectMethodNames;

fn erased_name(env: &TypeEnv, ty: &DeclaredType) -> String {
    ty.erasure(env)
        .map(|erased| env.describe(&erased))
        .unwrap_or_else(|| "void".to_string())
}

fn render(method: &RootMethod) -> String {
    format!("{} {}({})", method.returns, method.name, method.params.join(", "))
}

impl DispatchPointAnalysis for ObjectMethodNames {
    fn name(&self) -> &'static str {
        "object method names"
    }

    fn check(&self, cx: &AnalysisCx<'_>, point: &DispatchPoint, diagnostics: &mut Vec<Diagnostic>) -> bool {
        let declarations = point
            .candidates
            .iter()
            .map(|c| (c.def_id, c.name.as_str(), &c.param_types, &c.return_type))
            .chain(
                point
                    .entry_points
                    .iter()
                    .map(|e| (e.def_id, e.name.as_str(), &e.param_types, &e.return_type)),
            );

        let mut ok = true;
        for (def_id, name, params, returns) in declarations {
            for method in cx.host.root_methods.iter() {
                if method.name != name || method.params.len() != params.len() {
                    continue;
                }
                if matches_exactly(cx.env, method, params, returns) {
                    continue;
                }
                ok = false;
                diagnostics.push(clash(def_id, name, method));
            }
        }
        ok
    }
}

fn matches_exactly(env: &TypeEnv, method: &RootMethod, params: &[DeclaredType], returns: &DeclaredType) -> bool {
    params
        .iter()
        .zip(&method.params)
        .all(|(param, expected)| erased_name(env, param) == *expected)
        && erased_name(env, returns) == method.returns
}

fn clash(def_id: DefId, name: &str, method: &RootMethod) -> Diagnostic {
    Diagnostic::error(
        DiagnosticCode::RootMethodCollision,
        format!(
            "`{}` clashes with the inherited method `{}`; use a different name or match it exactly",
            name,
            render(method)
        ),
    )
    .at(def_id)
}
