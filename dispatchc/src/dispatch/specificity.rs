//! Specificity ordering over candidate signatures.
//!
//! `s1` is more specific than `s2` when every parameter of `s1` is at least
//! as specific as the corresponding parameter of `s2`, and at least one is
//! strictly more specific. This is a strict partial order; two signatures may
//! be incomparable, which is the ambiguity condition.
//!
//! [`SpecificityOrder::resolve`] is the direct resolution of one tuple of
//! runtime types: the most specific applicable non-default definition, else
//! the most specific applicable default, else no match. Decision trees must
//! agree with it on every tuple.

use std::cmp::Ordering;

use crate::types::{RuntimeType, TypeEnv};

use super::result::DispatchResult;
use super::types::{CandidateDefinition, DefId, TypeSignature};

/// Specificity queries against a type environment.
#[derive(Clone, Copy)]
pub struct SpecificityOrder<'a> {
    env: &'a TypeEnv,
}

impl<'a> SpecificityOrder<'a> {
    pub fn new(env: &'a TypeEnv) -> Self {
        Self { env }
    }

    /// Check if a signature accepts the given runtime argument types.
    pub fn is_applicable(&self, signature: &TypeSignature, arg_types: &[RuntimeType]) -> bool {
        if signature.arity() != arg_types.len() {
            return false;
        }

        signature
            .params
            .iter()
            .zip(arg_types)
            .all(|(param, arg)| self.env.applicable(param, arg))
    }

    /// Check if signature `s1` is more specific than `s2`.
    pub fn is_more_specific(&self, s1: &TypeSignature, s2: &TypeSignature) -> bool {
        // Must have same arity
        if s1.arity() != s2.arity() {
            return false;
        }

        let mut some_strictly = false;
        for (p1, p2) in s1.params.iter().zip(&s2.params) {
            if !self.env.sub_eq(p1, p2) {
                return false;
            }
            if !self.env.sub_eq(p2, p1) {
                some_strictly = true;
            }
        }

        some_strictly
    }

    /// Compare the specificity of two signatures.
    ///
    /// Returns:
    /// - `Ordering::Less` if `s1` is more specific
    /// - `Ordering::Greater` if `s2` is more specific
    /// - `Ordering::Equal` if neither is (equal or incomparable)
    pub fn compare_specificity(&self, s1: &TypeSignature, s2: &TypeSignature) -> Ordering {
        match (self.is_more_specific(s1, s2), self.is_more_specific(s2, s1)) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => Ordering::Equal,
        }
    }

    /// Find the maximally specific entries of an applicable set.
    ///
    /// An entry is maximal if no other entry is strictly more specific.
    pub fn find_maximal(&self, applicable: &[(DefId, TypeSignature)]) -> Vec<DefId> {
        applicable
            .iter()
            .enumerate()
            .filter(|(i, (_, sig))| {
                !applicable
                    .iter()
                    .enumerate()
                    .any(|(j, (_, other))| *i != j && self.is_more_specific(other, sig))
            })
            .map(|(_, (def_id, _))| *def_id)
            .collect()
    }

    /// Resolve dispatch for one tuple of runtime argument types.
    pub fn resolve(
        &self,
        candidates: &[CandidateDefinition],
        arg_types: &[RuntimeType],
    ) -> DispatchResult {
        for defaults in [false, true] {
            let applicable: Vec<_> = candidates
                .iter()
                .filter(|c| c.is_default == defaults)
                .map(|c| (c.def_id, c.signature(self.env)))
                .filter(|(_, sig)| self.is_applicable(sig, arg_types))
                .collect();

            if applicable.is_empty() {
                continue;
            }

            let mut maximal = self.find_maximal(&applicable);
            return if maximal.len() == 1 {
                DispatchResult::Resolved(maximal.remove(0))
            } else {
                DispatchResult::Ambiguous(maximal)
            };
        }

        DispatchResult::NoMatch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeclaredType, ParameterType, PrimitiveKind};

    fn make_candidate(index: u32, params: Vec<DeclaredType>, is_default: bool) -> CandidateDefinition {
        CandidateDefinition {
            def_id: DefId::new(index),
            name: "f".to_string(),
            param_types: params,
            return_type: DeclaredType::Void,
            type_params: vec![],
            is_default,
            target: format!("f{}", index),
        }
    }

    fn named(env: &TypeEnv, name: &str) -> DeclaredType {
        DeclaredType::named(env.lookup(name).unwrap())
    }

    fn runtime(env: &TypeEnv, name: &str) -> RuntimeType {
        RuntimeType::Reference(env.lookup(name).unwrap())
    }

    #[test]
    fn test_more_specific_is_irreflexive() {
        let env = TypeEnv::java_prelude();
        let order = SpecificityOrder::new(&env);
        let sig = TypeSignature::erase(&[named(&env, "Integer")], &env);
        assert!(!order.is_more_specific(&sig, &sig));
        assert_eq!(order.compare_specificity(&sig, &sig), Ordering::Equal);
    }

    #[test]
    fn test_more_specific_needs_every_position() {
        let env = TypeEnv::java_prelude();
        let order = SpecificityOrder::new(&env);
        let a = TypeSignature::erase(&[named(&env, "Number"), named(&env, "String")], &env);
        let b = TypeSignature::erase(&[named(&env, "Integer"), named(&env, "Object")], &env);

        assert!(!order.is_more_specific(&a, &b));
        assert!(!order.is_more_specific(&b, &a));

        let c = TypeSignature::erase(&[named(&env, "Integer"), named(&env, "String")], &env);
        assert!(order.is_more_specific(&c, &a));
        assert!(order.is_more_specific(&c, &b));
        assert_eq!(order.compare_specificity(&c, &a), Ordering::Less);
        assert_eq!(order.compare_specificity(&a, &c), Ordering::Greater);
    }

    #[test]
    fn test_arity_mismatch_is_never_more_specific() {
        let env = TypeEnv::java_prelude();
        let order = SpecificityOrder::new(&env);
        let one = TypeSignature { params: vec![ParameterType::Primitive(PrimitiveKind::Int)] };
        let two = TypeSignature { params: vec![ParameterType::Top, ParameterType::Top] };
        assert!(!order.is_more_specific(&one, &two));
        assert!(!order.is_more_specific(&two, &one));
    }

    #[test]
    fn test_resolve_most_specific() {
        let env = TypeEnv::java_prelude();
        let order = SpecificityOrder::new(&env);
        let candidates = vec![
            make_candidate(0, vec![named(&env, "Number")], false),
            make_candidate(1, vec![named(&env, "Integer")], false),
        ];

        let result = order.resolve(&candidates, &[runtime(&env, "Integer")]);
        assert_eq!(result, DispatchResult::Resolved(DefId::new(1)));

        let result = order.resolve(&candidates, &[runtime(&env, "Double")]);
        assert_eq!(result, DispatchResult::Resolved(DefId::new(0)));

        let result = order.resolve(&candidates, &[runtime(&env, "String")]);
        assert_eq!(result, DispatchResult::NoMatch);
    }

    #[test]
    fn test_resolve_ambiguous() {
        let env = TypeEnv::java_prelude();
        let order = SpecificityOrder::new(&env);
        let candidates = vec![
            make_candidate(0, vec![named(&env, "Number"), named(&env, "String")], false),
            make_candidate(1, vec![named(&env, "Integer"), named(&env, "Object")], false),
        ];

        let result = order.resolve(&candidates, &[runtime(&env, "Integer"), runtime(&env, "String")]);
        match result {
            DispatchResult::Ambiguous(ids) => {
                assert_eq!(ids, vec![DefId::new(0), DefId::new(1)]);
            }
            other => panic!("Expected Ambiguous, got {:?}", other),
        }
    }

    #[test]
    fn test_default_is_last_resort() {
        let env = TypeEnv::java_prelude();
        let order = SpecificityOrder::new(&env);
        // The default is more specific than the regular definition, but it
        // never competes with it.
        let candidates = vec![
            make_candidate(0, vec![named(&env, "Object")], false),
            make_candidate(1, vec![named(&env, "Integer")], true),
        ];
        let result = order.resolve(&candidates, &[runtime(&env, "Integer")]);
        assert_eq!(result, DispatchResult::Resolved(DefId::new(0)));

        let candidates = vec![
            make_candidate(0, vec![DeclaredType::Primitive(PrimitiveKind::Int)], false),
            make_candidate(1, vec![named(&env, "Object")], true),
        ];
        let result = order.resolve(&candidates, &[runtime(&env, "String")]);
        assert_eq!(result, DispatchResult::Resolved(DefId::new(1)));
        let result = order.resolve(&candidates, &[RuntimeType::Primitive(PrimitiveKind::Int)]);
        assert_eq!(result, DispatchResult::Resolved(DefId::new(0)));
    }

    #[test]
    fn test_find_maximal_multiple_equal() {
        let env = TypeEnv::java_prelude();
        let order = SpecificityOrder::new(&env);
        let sig = TypeSignature::erase(&[named(&env, "Integer")], &env);
        let applicable = vec![(DefId::new(0), sig.clone()), (DefId::new(1), sig)];
        assert_eq!(order.find_maximal(&applicable).len(), 2);
    }
}
