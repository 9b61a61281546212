//! Multiple dispatch resolution.
//!
//! This module compiles the candidate definitions of one dispatch point into
//! a decision tree of runtime type tests that selects, for any combination of
//! argument runtime types, the single most specific applicable definition.
//!
//! # Algorithm Overview
//!
//! 1. **Erase**: Reduce every declared parameter type to its erasure
//! 2. **Order**: Compare candidates by specificity (a partial order)
//! 3. **Split**: Test argument types until the outcome of every path is fixed
//! 4. **Settle**: Emit a call, an ambiguity, or a missing-definition leaf
//!
//! Validation of the candidate set happens before any of this, see
//! [`crate::analysis`].
//!
//! # Module Structure
//!
//! - [`types`] - Core type definitions (CandidateDefinition, EntryPoint, etc.)
//! - [`result`] - Dispatch result of one tuple of runtime types
//! - [`specificity`] - Specificity ordering and direct resolution
//! - [`tree`] - The decision tree
//! - [`builder`] - Decision tree construction

pub mod builder;
pub mod result;
pub mod specificity;
pub mod tree;
pub mod types;

pub use builder::TreeBuilder;
pub use result::DispatchResult;
pub use specificity::SpecificityOrder;
pub use tree::{Condition, DecisionTree, TreeDisplay};
pub use types::{
    CandidateDefinition,
    DefId,
    DispatchPoint,
    EntryPoint,
    ModuleReference,
    TypeParam,
    TypeSignature,
};
