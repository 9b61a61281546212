//! Validation analyses run before any decision tree is built.
//!
//! Each analysis is a pure check over the candidate set of one dispatch point
//! (or over a single module reference). A failing analysis pushes diagnostics
//! and returns `false`; resolution of that dispatch point is then aborted and
//! no tree is produced. The aggregate check runs every analysis even after a
//! failure, so all problems of a dispatch point are reported together.
//!
//! # Module Structure
//!
//! - [`arity`] - All declarations share one parameter count
//! - [`primitives`] - Primitive parameter types can be ordered against the rest
//! - [`return_type`] - Candidate returns fit the entry point returns
//! - [`object_methods`] - No accidental shadowing of root-type methods
//! - [`generics`] - Specificity never depends on erased type arguments
//! - [`module_ref`] - Module references point at dispatch modules

pub mod arity;
pub mod generics;
pub mod module_ref;
pub mod object_methods;
pub mod primitives;
pub mod return_type;

use crate::config::HostConfig;
use crate::diagnostics::Diagnostic;
use crate::dispatch::{DispatchPoint, ModuleReference};
use crate::types::TypeEnv;

pub use arity::MethodArity;
pub use generics::DispatchOnGenerics;
pub use module_ref::ModuleReferenceCheck;
pub use object_methods::ObjectMethodNames;
pub use primitives::MatchingPrimitiveTypes;
pub use return_type::ReturnTypeAnalysis;

/// Shared, read-only context every analysis receives.
#[derive(Clone, Copy)]
pub struct AnalysisCx<'a> {
    /// The type-comparison context.
    pub env: &'a TypeEnv,
    /// The host language model.
    pub host: &'a HostConfig,
}

/// A check over the candidate set of one dispatch point.
pub trait DispatchPointAnalysis: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Check a dispatch point, pushing diagnostics on failure.
    fn check(&self, cx: &AnalysisCx<'_>, point: &DispatchPoint, diagnostics: &mut Vec<Diagnostic>) -> bool;
}

/// A check over one module reference.
pub trait ModuleReferenceAnalysis: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Check a module reference, pushing diagnostics on failure.
    fn check(
        &self,
        cx: &AnalysisCx<'_>,
        reference: &ModuleReference,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> bool;
}

/// The set of analyses a resolver runs.
pub struct Analyses {
    dispatch_point: Vec<Box<dyn DispatchPointAnalysis>>,
    module_reference: Vec<Box<dyn ModuleReferenceAnalysis>>,
}

impl Default for Analyses {
    fn default() -> Self {
        Self::default_set()
    }
}

impl Analyses {
    /// Every built-in analysis.
    pub fn default_set() -> Self {
        Self::empty()
            .with_dispatch_point(MethodArity)
            .with_dispatch_point(MatchingPrimitiveTypes)
            .with_dispatch_point(ReturnTypeAnalysis)
            .with_dispatch_point(ObjectMethodNames)
            .with_dispatch_point(DispatchOnGenerics)
            .with_module_reference(ModuleReferenceCheck)
    }

    /// No analyses at all.
    pub fn empty() -> Self {
        Self {
            dispatch_point: Vec::new(),
            module_reference: Vec::new(),
        }
    }

    /// Add a dispatch point analysis.
    pub fn with_dispatch_point(mut self, analysis: impl DispatchPointAnalysis + 'static) -> Self {
        self.dispatch_point.push(Box::new(analysis));
        self
    }

    /// Add a module reference analysis.
    pub fn with_module_reference(mut self, analysis: impl ModuleReferenceAnalysis + 'static) -> Self {
        self.module_reference.push(Box::new(analysis));
        self
    }

    /// Names of the dispatch point analyses, in run order.
    pub fn dispatch_point_names(&self) -> Vec<&'static str> {
        self.dispatch_point.iter().map(|a| a.name()).collect()
    }

    /// Run every dispatch point analysis; true if all pass.
    pub fn check_dispatch_point(
        &self,
        cx: &AnalysisCx<'_>,
        point: &DispatchPoint,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> bool {
        self.dispatch_point.iter().fold(true, |ok, analysis| {
            let passed = analysis.check(cx, point, diagnostics);
            if !passed {
                tracing::debug!(point = %point.name, analysis = analysis.name(), "analysis failed");
            }
            ok & passed
        })
    }

    /// Run every module reference analysis; true if all pass.
    pub fn check_module_reference(
        &self,
        cx: &AnalysisCx<'_>,
        reference: &ModuleReference,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> bool {
        self.module_reference
            .iter()
            .fold(true, |ok, analysis| ok & analysis.check(cx, reference, diagnostics))
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::diagnostics::DiagnosticCode;
    use crate::types::{DeclaredType, PrimitiveKind};

    #[test]
    fn test_all_analyses_report() {
        let env = TypeEnv::java_prelude();
        let host = HostConfig::default();
        let cx = AnalysisCx { env: &env, host: &host };

        // Both an arity mismatch and an incomparable primitive: both reported.
        let point = point(
            vec![],
            vec![
                candidate(0, vec![DeclaredType::Primitive(PrimitiveKind::Int)], DeclaredType::Void),
                candidate(1, vec![named(&env, "String")], DeclaredType::Void),
                candidate(2, vec![named(&env, "String"), named(&env, "String")], DeclaredType::Void),
            ],
        );

        let mut diagnostics = Vec::new();
        let ok = Analyses::default_set().check_dispatch_point(&cx, &point, &mut diagnostics);
        assert!(!ok);
        assert!(diagnostics.iter().any(|d| d.code == DiagnosticCode::ArityMismatch));
        assert!(diagnostics.iter().any(|d| d.code == DiagnosticCode::IncomparablePrimitive));
    }

    #[test]
    fn test_empty_set_accepts_everything() {
        let env = TypeEnv::java_prelude();
        let host = HostConfig::default();
        let cx = AnalysisCx { env: &env, host: &host };
        let point = point(
            vec![],
            vec![
                candidate(0, vec![], DeclaredType::Void),
                candidate(1, vec![named(&env, "String")], DeclaredType::Void),
            ],
        );
        let mut diagnostics = Vec::new();
        assert!(Analyses::empty().check_dispatch_point(&cx, &point, &mut diagnostics));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_default_set_order() {
        assert_eq!(
            Analyses::default_set().dispatch_point_names(),
            vec!["method arity", "matching primitive types", "return type", "object method names", "dispatch on generics"]
        );
    }
}
