//! Host type model for dispatch resolution.
//!
//! Dispatch only ever observes erased types. A declared type as written in a
//! definition ([`DeclaredType`]) may carry type arguments and type variables;
//! its [`DeclaredType::erasure`] is the [`ParameterType`] that runtime tests
//! are generated for. Runtime values are described by [`RuntimeType`].
//!
//! All relations between types (subtyping, specificity, applicability) live on
//! [`TypeEnv`], which is passed explicitly to every analysis and to the tree
//! builder.

mod builtins;
mod env;

pub use env::{RefKind, TypeEnv, TypeInfo};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Primitive value kinds of the host language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveKind {
    /// Every primitive kind, in declaration order.
    pub const ALL: [PrimitiveKind; 8] = [
        PrimitiveKind::Boolean,
        PrimitiveKind::Byte,
        PrimitiveKind::Short,
        PrimitiveKind::Char,
        PrimitiveKind::Int,
        PrimitiveKind::Long,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
    ];

    /// The source-level keyword for this kind.
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
        }
    }

    /// Name of the reference type values of this kind box into.
    pub fn wrapper_name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "Boolean",
            PrimitiveKind::Byte => "Byte",
            PrimitiveKind::Short => "Short",
            PrimitiveKind::Char => "Character",
            PrimitiveKind::Int => "Integer",
            PrimitiveKind::Long => "Long",
            PrimitiveKind::Float => "Float",
            PrimitiveKind::Double => "Double",
        }
    }

    /// Kinds whose values pass a test for this kind, in declaration order.
    pub fn narrower_or_equal(self) -> impl Iterator<Item = PrimitiveKind> {
        Self::ALL.into_iter().filter(move |kind| kind.widens_to(self))
    }

    /// Parse a primitive keyword.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Check if a value of this kind converts to `target` by primitive
    /// widening. The relation is reflexive and transitively closed.
    pub fn widens_to(self, target: PrimitiveKind) -> bool {
        use PrimitiveKind::*;

        if self == target {
            return true;
        }

        matches!(
            (self, target),
            (Byte, Short | Int | Long | Float | Double)
                | (Short, Int | Long | Float | Double)
                | (Char, Int | Long | Float | Double)
                | (Int, Long | Float | Double)
                | (Long, Float | Double)
                | (Float, Double)
        )
    }

    /// Check if some runtime primitive satisfies tests for both kinds.
    pub fn overlaps(self, other: PrimitiveKind) -> bool {
        Self::ALL
            .into_iter()
            .any(|kind| kind.widens_to(self) && kind.widens_to(other))
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identity of a reference type registered in a [`TypeEnv`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(u32);

impl TypeId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    /// Index of this type in its environment.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The erased type a dispatch test is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ParameterType {
    /// A primitive kind; satisfied only by primitive runtime values.
    Primitive(PrimitiveKind),
    /// A reference type at its erased identity.
    Reference(TypeId),
    /// The most general type; satisfied by every runtime value.
    Top,
}

impl ParameterType {
    /// Whether this is the top type.
    pub fn is_top(&self) -> bool {
        matches!(self, ParameterType::Top)
    }

    /// Whether this is a primitive kind.
    pub fn is_primitive(&self) -> bool {
        matches!(self, ParameterType::Primitive(_))
    }
}

/// The concrete type of a value at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RuntimeType {
    Primitive(PrimitiveKind),
    Reference(TypeId),
}

/// A type as declared on a parameter or return, before erasure.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeclaredType {
    /// A primitive kind.
    Primitive(PrimitiveKind),
    /// A named reference type, possibly with type arguments.
    Declared {
        /// The erased identity.
        id: TypeId,
        /// Type arguments, empty for raw or non-generic uses.
        args: Vec<DeclaredType>,
    },
    /// A type variable with its upper bound.
    TypeVar {
        name: String,
        bound: Box<DeclaredType>,
    },
    /// An unbounded wildcard (`?`), only valid as a type argument.
    Wildcard,
    /// No value; only valid as a return type.
    Void,
}

impl DeclaredType {
    /// A non-generic use of a reference type.
    pub fn named(id: TypeId) -> Self {
        DeclaredType::Declared { id, args: Vec::new() }
    }

    /// Whether this is `void`.
    pub fn is_void(&self) -> bool {
        matches!(self, DeclaredType::Void)
    }

    /// The erased parameter type, or `None` for `void`.
    pub fn erasure(&self, env: &TypeEnv) -> Option<ParameterType> {
        match self {
            DeclaredType::Primitive(kind) => Some(ParameterType::Primitive(*kind)),
            DeclaredType::Declared { id, .. } if env.is_root(*id) => Some(ParameterType::Top),
            DeclaredType::Declared { id, .. } => Some(ParameterType::Reference(*id)),
            DeclaredType::TypeVar { bound, .. } => bound.erasure(env),
            DeclaredType::Wildcard => Some(ParameterType::Top),
            DeclaredType::Void => None,
        }
    }

    /// Whether a runtime test on the erasure decides membership in this type.
    ///
    /// Only types whose arguments are all unbounded wildcards are reifiable;
    /// type variables are tested at their bound.
    pub fn is_reifiable(&self) -> bool {
        match self {
            DeclaredType::Declared { args, .. } => {
                args.iter().all(|arg| matches!(arg, DeclaredType::Wildcard))
            }
            DeclaredType::TypeVar { bound, .. } => bound.is_reifiable(),
            _ => true,
        }
    }

    /// Whether this type mentions type arguments or type variables.
    pub fn is_generic(&self) -> bool {
        match self {
            DeclaredType::Declared { args, .. } => !args.is_empty(),
            DeclaredType::TypeVar { .. } => true,
            _ => false,
        }
    }
}
