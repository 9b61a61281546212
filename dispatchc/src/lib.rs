//! Multiple dispatch resolution.
//!
//! Compiles sets of overloaded method definitions into decision trees of
//! runtime type tests, so that a host language with single-receiver virtual
//! dispatch can select, for any combination of argument runtime types, the
//! single most specific applicable definition.
//!
//! # Pipeline
//!
//! 1. [`program`] loads declarations from a program file
//! 2. [`analysis`] validates every dispatch point
//! 3. [`dispatch`] builds one [`DecisionTree`] per entry point
//! 4. [`emit`] renders dispatcher source from the trees
//!
//! # Example
//!
//! ```rust,ignore
//! use dispatchc::{check_source, Config};
//!
//! let outcome = check_source(&std::fs::read_to_string("shapes.toml")?, &Config::default())?;
//! for diagnostic in &outcome.diagnostics {
//!     eprintln!("{}", diagnostic);
//! }
//! ```

pub mod analysis;
pub mod config;
pub mod diagnostics;
pub mod dispatch;
pub mod emit;
pub mod program;
pub mod report;
pub mod resolver;
pub mod types;

pub use config::{Config, ConfigError, Heuristic};
pub use diagnostics::{Diagnostic, DiagnosticCode, DiagnosticKind, DiagnosticSink};
pub use dispatch::{DecisionTree, DispatchResult, SpecificityOrder, TreeBuilder};
pub use program::{LoadError, Program};
pub use resolver::{ResolveError, ResolvedEntry, ResolvedPoint, Resolver};
pub use types::{DeclaredType, ParameterType, PrimitiveKind, RuntimeType, TypeEnv};

/// Everything a check of one program produced.
#[derive(Debug)]
pub struct CheckOutcome {
    pub program: Program,
    /// One result per dispatch point, in program order.
    pub results: Vec<Result<ResolvedPoint, ResolveError>>,
    /// Diagnostics of all dispatch points, then of the module references.
    pub diagnostics: Vec<Diagnostic>,
}

impl CheckOutcome {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Successfully resolved dispatch points.
    pub fn resolved(&self) -> impl Iterator<Item = &ResolvedPoint> {
        self.results.iter().filter_map(|result| result.as_ref().ok())
    }
}

/// Load a program and resolve all of its dispatch points.
pub fn check_source(source: &str, config: &Config) -> Result<CheckOutcome, LoadError> {
    let program = Program::parse(source, &config.host)?;
    let sink = DiagnosticSink::new();

    let resolver = Resolver::new(&program.env, config);
    let results = resolver.resolve_all(&program.points, &sink);
    resolver.check_module_refs(&program.module_refs, &sink);

    let diagnostics = sink.take();
    Ok(CheckOutcome {
        program,
        results,
        diagnostics,
    })
}
