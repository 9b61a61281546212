//! The compiled dispatch artifact.
//!
//! A decision tree is a binary tree of runtime type tests with three kinds of
//! leaves: a call to one definition, a missing-definition signal (a decision
//! without a definition), and an ambiguity signal. Trees are built once per
//! entry point and never mutated afterwards.

use std::fmt;

use serde::Serialize;
use serde_json::{json, Value};

use crate::types::{ParameterType, RuntimeType, TypeEnv};

use super::result::DispatchResult;
use super::types::DefId;

/// A runtime type test on one argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Condition {
    /// The argument position tested.
    pub argument: usize,
    /// The type the argument's runtime type is tested against.
    pub ty: ParameterType,
}

/// A decision tree node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DecisionTree {
    /// Test one argument and continue in one of two subtrees.
    Condition {
        condition: Condition,
        is_true: Box<DecisionTree>,
        is_false: Box<DecisionTree>,
    },
    /// Invoke a definition, or signal a missing definition when `None`.
    Decision { definition: Option<DefId> },
    /// Signal that the remaining applicable definitions are ambiguous.
    Ambiguity { candidates: Vec<DefId> },
}

impl DecisionTree {
    pub fn condition(condition: Condition, is_true: DecisionTree, is_false: DecisionTree) -> Self {
        DecisionTree::Condition {
            condition,
            is_true: Box::new(is_true),
            is_false: Box::new(is_false),
        }
    }

    pub fn decision(def_id: DefId) -> Self {
        DecisionTree::Decision { definition: Some(def_id) }
    }

    pub fn no_match() -> Self {
        DecisionTree::Decision { definition: None }
    }

    pub fn ambiguity(candidates: Vec<DefId>) -> Self {
        DecisionTree::Ambiguity { candidates }
    }

    /// Follow a tuple of runtime argument types to its leaf.
    ///
    /// Arguments beyond the tuple's length never satisfy a test.
    pub fn trace(&self, env: &TypeEnv, arg_types: &[RuntimeType]) -> DispatchResult {
        let mut node = self;
        loop {
            match node {
                DecisionTree::Condition { condition, is_true, is_false } => {
                    let holds = arg_types
                        .get(condition.argument)
                        .is_some_and(|arg| env.applicable(&condition.ty, arg));
                    node = if holds { is_true } else { is_false };
                }
                DecisionTree::Decision { definition: Some(def_id) } => {
                    return DispatchResult::Resolved(*def_id);
                }
                DecisionTree::Decision { definition: None } => return DispatchResult::NoMatch,
                DecisionTree::Ambiguity { candidates } => {
                    return DispatchResult::Ambiguous(candidates.clone());
                }
            }
        }
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        match self {
            DecisionTree::Condition { is_true, is_false, .. } => {
                is_true.leaf_count() + is_false.leaf_count()
            }
            _ => 1,
        }
    }

    /// Number of condition nodes.
    pub fn condition_count(&self) -> usize {
        match self {
            DecisionTree::Condition { is_true, is_false, .. } => {
                1 + is_true.condition_count() + is_false.condition_count()
            }
            _ => 0,
        }
    }

    /// Length of the longest root-to-leaf path, in tests.
    pub fn depth(&self) -> usize {
        match self {
            DecisionTree::Condition { is_true, is_false, .. } => {
                1 + is_true.depth().max(is_false.depth())
            }
            _ => 0,
        }
    }

    /// Definitions invoked by some leaf, in first-reached order.
    pub fn referenced_definitions(&self) -> Vec<DefId> {
        let mut out = Vec::new();
        self.collect_definitions(&mut out);
        out
    }

    fn collect_definitions(&self, out: &mut Vec<DefId>) {
        match self {
            DecisionTree::Condition { is_true, is_false, .. } => {
                is_true.collect_definitions(out);
                is_false.collect_definitions(out);
            }
            DecisionTree::Decision { definition: Some(def_id) } => {
                if !out.contains(def_id) {
                    out.push(*def_id);
                }
            }
            _ => {}
        }
    }

    /// Render the tree on one line using type names from `env`.
    pub fn display<'a>(&'a self, env: &'a TypeEnv) -> TreeDisplay<'a> {
        TreeDisplay { tree: self, env }
    }

    /// A JSON rendering with type names resolved.
    pub fn to_json(&self, env: &TypeEnv) -> Value {
        match self {
            DecisionTree::Condition { condition, is_true, is_false } => json!({
                "argument": condition.argument,
                "instanceof": env.describe(&condition.ty),
                "then": is_true.to_json(env),
                "else": is_false.to_json(env),
            }),
            DecisionTree::Decision { definition: Some(def_id) } => json!({ "call": def_id.index }),
            DecisionTree::Decision { definition: None } => json!("missing-definition"),
            DecisionTree::Ambiguity { candidates } => json!({
                "ambiguous": candidates.iter().map(|id| id.index).collect::<Vec<_>>(),
            }),
        }
    }
}

/// One-line rendering of a [`DecisionTree`].
pub struct TreeDisplay<'a> {
    tree: &'a DecisionTree,
    env: &'a TypeEnv,
}

impl fmt::Display for TreeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tree {
            DecisionTree::Condition { condition, is_true, is_false } => write!(
                f,
                "(p{} instanceof {} ? {} : {})",
                condition.argument,
                self.env.describe(&condition.ty),
                is_true.display(self.env),
                is_false.display(self.env),
            ),
            DecisionTree::Decision { definition: Some(def_id) } => write!(f, "call {}", def_id),
            DecisionTree::Decision { definition: None } => f.write_str("missing"),
            DecisionTree::Ambiguity { candidates } => {
                f.write_str("ambiguous[")?;
                for (i, def_id) in candidates.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", def_id)?;
                }
                f.write_str("]")
            }
        }
    }
}
