//! Module references must name a dispatch module.

use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::dispatch::ModuleReference;
use crate::types::DeclaredType;

use super::{AnalysisCx, ModuleReferenceAnalysis};

pub struct ModuleReferenceCheck;

impl ModuleReferenceAnalysis for ModuleReferenceCheck {
    fn name(&self) -> &'static str {
        "module reference"
    }

    fn check(
        &self,
        cx: &AnalysisCx<'_>,
        reference: &ModuleReference,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> bool {
        if let DeclaredType::Declared { id, .. } = &reference.ty {
            if cx.env.is_module(*id) {
                return true;
            }
        }
        diagnostics.push(
            Diagnostic::error(
                DiagnosticCode::InvalidModuleReference,
                format!(
                    "`{}` has type `{}`, which is not a dispatch module",
                    reference.name,
                    cx.env.describe_declared(&reference.ty)
                ),
            )
            .at(reference.def_id),
        );
        false
    }
}
