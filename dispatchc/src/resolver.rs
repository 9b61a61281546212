//! Resolution driver.
//!
//! A [`Resolver`] validates each dispatch point with the configured analyses
//! and, when validation passes, builds one decision tree per entry point.
//! Dispatch points are independent, so [`Resolver::resolve_all`] spreads them
//! over worker threads. Diagnostics are still flushed in input order.

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, info_span, warn};

use crate::analysis::{Analyses, AnalysisCx};
use crate::config::Config;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::dispatch::{DecisionTree, DispatchPoint, EntryPoint, ModuleReference, TreeBuilder};
use crate::types::TypeEnv;

/// Errors resolving a dispatch point.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Validation failed; the diagnostics went to the sink.
    #[error("dispatch point `{name}` has {errors} error(s)")]
    Invalid { name: String, errors: usize },

    /// A worker thread panicked before finishing its dispatch point.
    #[error("resolver worker thread panicked")]
    WorkerPanicked,
}

/// The tree built for one entry point.
#[derive(Debug, Clone)]
pub struct ResolvedEntry {
    pub entry: EntryPoint,
    pub tree: DecisionTree,
}

/// A validated dispatch point with its trees.
#[derive(Debug, Clone)]
pub struct ResolvedPoint {
    pub name: String,
    pub module: Option<String>,
    pub entries: Vec<ResolvedEntry>,
}

/// Validates dispatch points and builds their decision trees.
pub struct Resolver<'a> {
    env: &'a TypeEnv,
    config: &'a Config,
    analyses: Analyses,
}

impl<'a> Resolver<'a> {
    /// A resolver running every built-in analysis.
    pub fn new(env: &'a TypeEnv, config: &'a Config) -> Self {
        Self {
            env,
            config,
            analyses: Analyses::default_set(),
        }
    }

    /// Replace the analyses to run.
    pub fn with_analyses(mut self, analyses: Analyses) -> Self {
        self.analyses = analyses;
        self
    }

    pub fn env(&self) -> &'a TypeEnv {
        self.env
    }

    pub fn config(&self) -> &'a Config {
        self.config
    }

    fn cx(&self) -> AnalysisCx<'a> {
        AnalysisCx {
            env: self.env,
            host: &self.config.host,
        }
    }

    /// Run the analyses over one dispatch point.
    pub fn validate(&self, point: &DispatchPoint, diagnostics: &mut Vec<Diagnostic>) -> bool {
        self.analyses.check_dispatch_point(&self.cx(), point, diagnostics)
    }

    /// Validate one dispatch point and build a tree per entry point.
    pub fn resolve_point(
        &self,
        point: &DispatchPoint,
        sink: &DiagnosticSink,
    ) -> Result<ResolvedPoint, ResolveError> {
        let mut batch = Vec::new();
        let result = self.resolve_into(point, &mut batch);
        sink.flush(batch);
        result
    }

    fn resolve_into(
        &self,
        point: &DispatchPoint,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<ResolvedPoint, ResolveError> {
        let _span = info_span!("resolve_point", point = %point.name).entered();

        if !self.validate(point, diagnostics) {
            let errors = diagnostics.iter().filter(|d| d.is_error()).count();
            debug!(errors, "validation failed, no trees built");
            return Err(ResolveError::Invalid {
                name: point.name.clone(),
                errors,
            });
        }

        if point.entry_points.is_empty() {
            warn!(point = %point.name, "dispatch point has no entry points");
        }

        let builder = TreeBuilder::new(self.env, &point.candidates, self.config.resolve.heuristic);
        let entries: Vec<ResolvedEntry> = point
            .entry_points
            .iter()
            .map(|entry| ResolvedEntry {
                entry: entry.clone(),
                tree: builder.build(entry),
            })
            .collect();

        debug!(
            entries = entries.len(),
            leaves = entries.iter().map(|e| e.tree.leaf_count()).sum::<usize>(),
            depth = entries.iter().map(|e| e.tree.depth()).max().unwrap_or(0),
            "dispatch point resolved"
        );

        Ok(ResolvedPoint {
            name: point.name.clone(),
            module: point.module.clone(),
            entries,
        })
    }

    /// Resolve independent dispatch points in parallel.
    ///
    /// An error in one point does not stop the others. Results and
    /// diagnostic batches come back in input order.
    pub fn resolve_all(
        &self,
        points: &[DispatchPoint],
        sink: &DiagnosticSink,
    ) -> Vec<Result<ResolvedPoint, ResolveError>> {
        let jobs = self.config.resolve.effective_jobs().min(points.len()).max(1);
        info!(points = points.len(), jobs, "resolving dispatch points");

        if jobs == 1 {
            return points.iter().map(|point| self.resolve_point(point, sink)).collect();
        }

        type Slot = Option<(Result<ResolvedPoint, ResolveError>, Vec<Diagnostic>)>;
        let slots: Mutex<Vec<Slot>> = Mutex::new((0..points.len()).map(|_| None).collect());

        let (tx, rx) = crossbeam_channel::unbounded();
        for work in points.iter().enumerate() {
            // The receiver is alive, so the send cannot fail.
            let _ = tx.send(work);
        }
        drop(tx);

        let outcome = crossbeam_utils::thread::scope(|scope| {
            for _ in 0..jobs {
                let rx = rx.clone();
                let slots = &slots;
                scope.spawn(move |_| {
                    for (index, point) in rx.iter() {
                        let mut batch = Vec::new();
                        let result = self.resolve_into(point, &mut batch);
                        slots.lock()[index] = Some((result, batch));
                    }
                });
            }
        });
        if outcome.is_err() {
            warn!("a resolver worker panicked; its dispatch points are reported as failed");
        }

        slots
            .into_inner()
            .into_iter()
            .map(|slot| match slot {
                Some((result, batch)) => {
                    sink.flush(batch);
                    result
                }
                None => Err(ResolveError::WorkerPanicked),
            })
            .collect()
    }

    /// Check module references; true if all are valid.
    pub fn check_module_refs(&self, references: &[ModuleReference], sink: &DiagnosticSink) -> bool {
        let mut batch = Vec::new();
        let ok = references.iter().fold(true, |ok, reference| {
            ok & self.analyses.check_module_reference(&self.cx(), reference, &mut batch)
        });
        sink.flush(batch);
        ok
    }
}
