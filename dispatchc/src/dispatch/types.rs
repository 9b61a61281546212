//! Core type definitions for dispatch resolution.

use std::fmt;

use serde::Serialize;

use crate::types::{DeclaredType, ParameterType, TypeEnv};

/// Opaque identity of a declaration (definition, entry point or module
/// reference). Only used to refer back to the declaration in diagnostics and
/// emitted code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DefId {
    pub index: u32,
}

impl DefId {
    pub fn new(index: u32) -> Self {
        Self { index }
    }
}

impl fmt::Display for DefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index)
    }
}

/// A method-level type parameter with its upper bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParam {
    /// The type parameter name.
    pub name: String,
    /// The upper bound; the root type when unbounded.
    pub bound: DeclaredType,
}

/// The erased parameter types of a definition, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeSignature {
    pub params: Vec<ParameterType>,
}

impl TypeSignature {
    /// Erase a list of declared parameter types.
    ///
    /// `void` never appears as a parameter type once a program is loaded; it
    /// erases to the top type here so arity is preserved.
    pub fn erase(params: &[DeclaredType], env: &TypeEnv) -> Self {
        Self {
            params: params
                .iter()
                .map(|ty| ty.erasure(env).unwrap_or(ParameterType::Top))
                .collect(),
        }
    }

    /// Number of parameters.
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// One concrete definition competing at a dispatch point.
#[derive(Debug, Clone)]
pub struct CandidateDefinition {
    /// The definition's identity.
    pub def_id: DefId,
    /// The simple name.
    pub name: String,
    /// Declared parameter types.
    pub param_types: Vec<DeclaredType>,
    /// Declared return type.
    pub return_type: DeclaredType,
    /// Type parameters (for generic definitions).
    pub type_params: Vec<TypeParam>,
    /// Fallback supplied by an ancestor; only used when no other definition
    /// applies.
    pub is_default: bool,
    /// Call target used by the emitter.
    pub target: String,
}

impl CandidateDefinition {
    /// Number of declared parameters.
    pub fn arity(&self) -> usize {
        self.param_types.len()
    }

    /// The erased signature.
    pub fn signature(&self, env: &TypeEnv) -> TypeSignature {
        TypeSignature::erase(&self.param_types, env)
    }
}

/// The externally visible call shape a dispatcher is generated for.
#[derive(Debug, Clone)]
pub struct EntryPoint {
    /// The entry point's identity.
    pub def_id: DefId,
    /// The method name.
    pub name: String,
    /// Declared static parameter types.
    pub param_types: Vec<DeclaredType>,
    /// Declared return type.
    pub return_type: DeclaredType,
    /// Type parameters of the entry point.
    pub type_params: Vec<TypeParam>,
}

impl EntryPoint {
    /// Number of declared parameters.
    pub fn arity(&self) -> usize {
        self.param_types.len()
    }

    /// The erased static parameter types.
    pub fn signature(&self, env: &TypeEnv) -> TypeSignature {
        TypeSignature::erase(&self.param_types, env)
    }
}

/// One overloaded method name with its entry points and candidates.
#[derive(Debug, Clone)]
pub struct DispatchPoint {
    /// The method name.
    pub name: String,
    /// The module declaring this dispatch point, if any.
    pub module: Option<String>,
    /// Call shapes to generate dispatchers for.
    pub entry_points: Vec<EntryPoint>,
    /// Competing definitions, in declaration order.
    pub candidates: Vec<CandidateDefinition>,
}

impl DispatchPoint {
    /// Look up a candidate by identity.
    pub fn candidate(&self, def_id: DefId) -> Option<&CandidateDefinition> {
        self.candidates.iter().find(|c| c.def_id == def_id)
    }

    /// Name of a candidate's call target, or its identity when unknown.
    pub fn target_of(&self, def_id: DefId) -> String {
        self.candidate(def_id)
            .map(|c| c.target.clone())
            .unwrap_or_else(|| def_id.to_string())
    }
}

/// A value used as the module to dispatch on.
#[derive(Debug, Clone)]
pub struct ModuleReference {
    /// The reference's identity.
    pub def_id: DefId,
    /// The name the reference is bound to.
    pub name: String,
    /// The referenced type.
    pub ty: DeclaredType,
}
