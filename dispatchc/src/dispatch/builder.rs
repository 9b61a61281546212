//! Decision tree construction.
//!
//! The builder walks the space of runtime argument types by accumulating
//! facts per argument position: types the argument is known to satisfy and
//! types it is known not to satisfy. Under a set of facts every candidate
//! position is *satisfied*, *refuted* or still *undecided*.
//!
//! Candidates are resolved in two tiers. Regular definitions are considered
//! first; defaults only become relevant once no regular definition can apply.
//! A node becomes a leaf as soon as the outcome of its tier is fixed for
//! every tuple reaching it:
//!
//! 1. every candidate of the tier is decided: the maximal definitely
//!    applicable candidates give the call or the ambiguity;
//! 2. one definitely applicable candidate is strictly more specific than
//!    every other possibly applicable one: it wins whatever the rest do;
//! 3. two definitely applicable candidates cannot be beaten by any possibly
//!    applicable one: the call is ambiguous whatever the rest do.
//!
//! Otherwise an undecided (position, type) pair is tested. Each test decides
//! at least one undecided candidate position and facts only grow along a
//! path, so construction always terminates.

use tracing::{debug, trace};

use crate::config::Heuristic;
use crate::types::{ParameterType, TypeEnv};

use super::specificity::SpecificityOrder;
use super::tree::{Condition, DecisionTree};
use super::types::{CandidateDefinition, DefId, EntryPoint, TypeSignature};

/// What the facts on a path say about one candidate or position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Satisfied,
    Refuted,
    Undecided,
}

/// Per-position knowledge accumulated along a path from the root.
#[derive(Debug, Clone)]
struct Facts {
    holds: Vec<Vec<ParameterType>>,
    fails: Vec<Vec<ParameterType>>,
}

impl Facts {
    fn new(arity: usize) -> Self {
        Self {
            holds: vec![Vec::new(); arity],
            fails: vec![Vec::new(); arity],
        }
    }

    fn holding(&self, argument: usize, ty: ParameterType) -> Self {
        let mut next = self.clone();
        next.holds[argument].push(ty);
        next
    }

    fn failing(&self, argument: usize, ty: ParameterType) -> Self {
        let mut next = self.clone();
        next.fails[argument].push(ty);
        next
    }
}

/// A candidate as seen by the builder.
#[derive(Debug, Clone)]
struct Erased {
    def_id: DefId,
    is_default: bool,
    signature: TypeSignature,
}

/// Candidates of one tier that can still apply on the current path.
#[derive(Debug, Default)]
struct Tier {
    /// Applicable for every tuple reaching the node.
    definite: Vec<usize>,
    /// Not refuted; includes `definite`.
    possible: Vec<usize>,
}

/// Builds decision trees for the candidates of one dispatch point.
pub struct TreeBuilder<'a> {
    env: &'a TypeEnv,
    order: SpecificityOrder<'a>,
    heuristic: Heuristic,
    candidates: Vec<Erased>,
}

impl<'a> TreeBuilder<'a> {
    /// Create a builder over a validated candidate set.
    ///
    /// All candidates must share one arity.
    pub fn new(env: &'a TypeEnv, candidates: &[CandidateDefinition], heuristic: Heuristic) -> Self {
        let candidates = candidates
            .iter()
            .map(|c| Erased {
                def_id: c.def_id,
                is_default: c.is_default,
                signature: c.signature(env),
            })
            .collect();

        Self {
            env,
            order: SpecificityOrder::new(env),
            heuristic,
            candidates,
        }
    }

    /// Build the tree for an entry point.
    pub fn build(&self, entry: &EntryPoint) -> DecisionTree {
        debug!(
            entry = %entry.name,
            candidates = self.candidates.len(),
            heuristic = ?self.heuristic,
            "building decision tree"
        );
        self.build_for(&entry.signature(self.env).params)
    }

    /// Build the tree for arguments with the given erased static types.
    pub fn build_for(&self, static_types: &[ParameterType]) -> DecisionTree {
        let arity = self
            .candidates
            .first()
            .map_or(static_types.len(), |c| c.signature.arity());

        let mut facts = Facts::new(arity);
        for (argument, ty) in static_types.iter().enumerate().take(arity) {
            if !ty.is_top() {
                facts.holds[argument].push(*ty);
            }
        }

        self.build_node(&facts, 0)
    }

    fn build_node(&self, facts: &Facts, depth: usize) -> DecisionTree {
        let statuses: Vec<Status> = self
            .candidates
            .iter()
            .map(|c| self.candidate_status(facts, &c.signature))
            .collect();

        let regular = self.tier(&statuses, false);
        let focus = if regular.possible.is_empty() {
            let defaults = self.tier(&statuses, true);
            if defaults.possible.is_empty() {
                trace!(depth, "no candidate applies");
                return DecisionTree::no_match();
            }
            defaults
        } else {
            regular
        };

        if let Some(leaf) = self.settle(&focus) {
            trace!(depth, ?leaf, "leaf");
            return leaf;
        }

        let Some(condition) = self.choose_test(facts, &focus, &statuses) else {
            // Unreachable for consistent facts: an unsettled tier always has
            // an undecided position to test.
            return self.exhausted(&focus);
        };

        trace!(depth, argument = condition.argument, ty = ?condition.ty, "test");
        let is_true = self.build_node(&facts.holding(condition.argument, condition.ty), depth + 1);
        let is_false = self.build_node(&facts.failing(condition.argument, condition.ty), depth + 1);
        DecisionTree::condition(condition, is_true, is_false)
    }

    fn position_status(&self, facts: &Facts, argument: usize, declared: &ParameterType) -> Status {
        if declared.is_top() {
            return Status::Satisfied;
        }
        let holds = facts.holds.get(argument).map(Vec::as_slice).unwrap_or(&[]);
        let fails = facts.fails.get(argument).map(Vec::as_slice).unwrap_or(&[]);

        if holds.iter().any(|h| self.env.sub_eq(h, declared)) {
            Status::Satisfied
        } else if fails.iter().any(|f| self.env.sub_eq(declared, f))
            || holds.iter().any(|h| self.env.disjoint(h, declared))
        {
            Status::Refuted
        } else {
            Status::Undecided
        }
    }

    fn candidate_status(&self, facts: &Facts, signature: &TypeSignature) -> Status {
        let mut status = Status::Satisfied;
        for (argument, declared) in signature.params.iter().enumerate() {
            match self.position_status(facts, argument, declared) {
                Status::Refuted => return Status::Refuted,
                Status::Undecided => status = Status::Undecided,
                Status::Satisfied => {}
            }
        }
        status
    }

    fn tier(&self, statuses: &[Status], defaults: bool) -> Tier {
        let mut tier = Tier::default();
        for (i, candidate) in self.candidates.iter().enumerate() {
            if candidate.is_default != defaults {
                continue;
            }
            match statuses[i] {
                Status::Refuted => {}
                Status::Satisfied => {
                    tier.definite.push(i);
                    tier.possible.push(i);
                }
                Status::Undecided => tier.possible.push(i),
            }
        }
        tier
    }

    fn more_specific(&self, a: usize, b: usize) -> bool {
        self.order
            .is_more_specific(&self.candidates[a].signature, &self.candidates[b].signature)
    }

    /// The leaf for a tier whose outcome no further test can change.
    fn settle(&self, tier: &Tier) -> Option<DecisionTree> {
        if tier.definite.len() == tier.possible.len() {
            let maximal: Vec<usize> = tier
                .definite
                .iter()
                .copied()
                .filter(|&c| !tier.definite.iter().any(|&d| d != c && self.more_specific(d, c)))
                .collect();
            return Some(self.leaf_for(&maximal));
        }

        // Most specific wins before ambiguity is considered.
        for &c in &tier.definite {
            if tier.possible.iter().all(|&d| d == c || self.more_specific(c, d)) {
                return Some(DecisionTree::decision(self.candidates[c].def_id));
            }
        }

        let unbeatable: Vec<usize> = tier
            .definite
            .iter()
            .copied()
            .filter(|&c| !tier.possible.iter().any(|&d| d != c && self.more_specific(d, c)))
            .collect();
        if unbeatable.len() >= 2 {
            return Some(self.leaf_for(&unbeatable));
        }

        None
    }

    fn exhausted(&self, tier: &Tier) -> DecisionTree {
        for &c in &tier.possible {
            if tier.possible.iter().all(|&d| d == c || self.more_specific(c, d)) {
                return DecisionTree::decision(self.candidates[c].def_id);
            }
        }
        self.leaf_for(&tier.possible)
    }

    fn leaf_for(&self, indices: &[usize]) -> DecisionTree {
        match indices {
            [] => DecisionTree::no_match(),
            [single] => DecisionTree::decision(self.candidates[*single].def_id),
            many => DecisionTree::ambiguity(many.iter().map(|&i| self.candidates[i].def_id).collect()),
        }
    }

    /// Undecided (position, type) pairs of the tier, in candidate order.
    fn options(&self, facts: &Facts, tier: &Tier, statuses: &[Status]) -> Vec<Condition> {
        let mut options: Vec<Condition> = Vec::new();
        for &c in &tier.possible {
            if statuses[c] != Status::Undecided {
                continue;
            }
            for (argument, ty) in self.candidates[c].signature.params.iter().enumerate() {
                if self.position_status(facts, argument, ty) != Status::Undecided {
                    continue;
                }
                let option = Condition { argument, ty: *ty };
                if !options.contains(&option) {
                    options.push(option);
                }
            }
        }
        options
    }

    fn choose_test(&self, facts: &Facts, tier: &Tier, statuses: &[Status]) -> Option<Condition> {
        let options = self.options(facts, tier, statuses);
        match self.heuristic {
            Heuristic::DeclarationOrder => {
                let argument = options.iter().map(|o| o.argument).min()?;
                let at_position: Vec<&Condition> =
                    options.iter().filter(|o| o.argument == argument).collect();
                // Most specific first: a type no other candidate type at this
                // position is strictly more specific than.
                at_position
                    .iter()
                    .find(|o| {
                        !at_position
                            .iter()
                            .any(|other| self.env.more_specific_than(&other.ty, &o.ty))
                    })
                    .or_else(|| at_position.first())
                    .map(|o| **o)
            }
            Heuristic::Balanced => options
                .iter()
                .min_by_key(|o| {
                    let survivors = |next: &Facts| {
                        tier.possible
                            .iter()
                            .filter(|&&c| {
                                self.candidate_status(next, &self.candidates[c].signature)
                                    != Status::Refuted
                            })
                            .count()
                    };
                    let on_true = survivors(&facts.holding(o.argument, o.ty));
                    let on_false = survivors(&facts.failing(o.argument, o.ty));
                    (on_true.max(on_false), o.argument)
                })
                .copied(),
        }
    }
}
