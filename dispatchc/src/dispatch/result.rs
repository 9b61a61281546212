//! Dispatch result types.

use serde::Serialize;

use super::types::DefId;

/// Result of resolving one tuple of runtime argument types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DispatchResult {
    /// A unique most specific definition was found.
    Resolved(DefId),
    /// No definition, not even a default, applies.
    NoMatch,
    /// Two or more applicable definitions are maximal and incomparable.
    Ambiguous(Vec<DefId>),
}

impl DispatchResult {
    /// Check if two results select the same behaviour.
    ///
    /// Ambiguity is compared by kind only: a decision tree stops as soon as
    /// ambiguity is certain, so it may name fewer of the maximal candidates
    /// than a direct resolution does.
    pub fn agrees_with(&self, other: &DispatchResult) -> bool {
        match (self, other) {
            (DispatchResult::Resolved(a), DispatchResult::Resolved(b)) => a == b,
            (DispatchResult::NoMatch, DispatchResult::NoMatch) => true,
            (DispatchResult::Ambiguous(_), DispatchResult::Ambiguous(_)) => true,
            _ => false,
        }
    }

    /// The selected definition, if resolution succeeded.
    pub fn resolved(&self) -> Option<DefId> {
        match self {
            DispatchResult::Resolved(def_id) => Some(*def_id),
            _ => None,
        }
    }
}
