//! The type environment: reference type registry and type relations.
//!
//! Reference types follow the host's inheritance rules: a class extends at
//! most one class, interfaces may have any number of super-interfaces, and a
//! final class has no subtypes. Disjointness reasoning in the tree builder
//! relies on these rules holding for every registered type.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use super::{DeclaredType, ParameterType, RuntimeType, TypeId};

/// Whether a reference type is a class or an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefKind {
    #[default]
    Class,
    Interface,
}

/// Information about a registered reference type.
#[derive(Debug, Clone)]
pub struct TypeInfo {
    /// The type's name.
    pub name: String,
    /// Class or interface.
    pub kind: RefKind,
    /// Final classes have no subtypes.
    pub is_final: bool,
    /// Declared as a dispatch module.
    pub is_module: bool,
    /// Direct supertypes.
    pub supertypes: Vec<TypeId>,
}

/// Registry of reference types and the type-comparison context.
#[derive(Debug, Clone)]
pub struct TypeEnv {
    types: Vec<TypeInfo>,
    by_name: FxHashMap<String, TypeId>,
}

impl TypeEnv {
    /// Create an environment whose only type is the root type `root_name`.
    pub fn new(root_name: &str) -> Self {
        let mut env = Self {
            types: Vec::new(),
            by_name: FxHashMap::default(),
        };
        env.declare(root_name, RefKind::Class);
        env
    }

    /// The root type, which erases to [`ParameterType::Top`].
    pub fn root(&self) -> TypeId {
        TypeId::new(0)
    }

    /// Check if `id` is the root type.
    pub fn is_root(&self, id: TypeId) -> bool {
        id == self.root()
    }

    /// Register a type, or return the existing one with its kind updated.
    pub fn declare(&mut self, name: &str, kind: RefKind) -> TypeId {
        if let Some(&id) = self.by_name.get(name) {
            self.types[id.index()].kind = kind;
            return id;
        }
        let id = TypeId::new(self.types.len());
        self.types.push(TypeInfo {
            name: name.to_string(),
            kind,
            is_final: false,
            is_module: false,
            supertypes: Vec::new(),
        });
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// Record `sup` as a direct supertype of `id`.
    pub fn add_supertype(&mut self, id: TypeId, sup: TypeId) {
        let supertypes = &mut self.types[id.index()].supertypes;
        if !supertypes.contains(&sup) {
            supertypes.push(sup);
        }
    }

    /// Mark a type as final.
    pub fn set_final(&mut self, id: TypeId, is_final: bool) {
        self.types[id.index()].is_final = is_final;
    }

    /// Mark a type as a dispatch module.
    pub fn set_module(&mut self, id: TypeId, is_module: bool) {
        self.types[id.index()].is_module = is_module;
    }

    /// Look up a type by name.
    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    /// Information about a registered type.
    pub fn info(&self, id: TypeId) -> &TypeInfo {
        &self.types[id.index()]
    }

    /// The name of a registered type.
    pub fn name(&self, id: TypeId) -> &str {
        &self.types[id.index()].name
    }

    /// Whether the type is declared as a dispatch module.
    pub fn is_module(&self, id: TypeId) -> bool {
        self.types[id.index()].is_module
    }

    /// Iterate over all registered type ids.
    pub fn ids(&self) -> impl Iterator<Item = TypeId> + '_ {
        (0..self.types.len()).map(TypeId::new)
    }

    /// Number of registered types, the root included.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Always false: the root type is registered on construction.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Check if `sub` is a subtype of (or equal to) `sup`.
    pub fn is_subtype(&self, sub: TypeId, sup: TypeId) -> bool {
        if sub == sup || self.is_root(sup) {
            return true;
        }

        let mut visited = FxHashSet::default();
        let mut stack = vec![sub];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            for &parent in &self.types[current.index()].supertypes {
                if parent == sup {
                    return true;
                }
                stack.push(parent);
            }
        }
        false
    }

    /// Check if every runtime value satisfying `a` also satisfies `b`.
    pub fn sub_eq(&self, a: &ParameterType, b: &ParameterType) -> bool {
        match (a, b) {
            (_, ParameterType::Top) => true,
            (ParameterType::Top, _) => false,
            (ParameterType::Primitive(pa), ParameterType::Primitive(pb)) => pa.widens_to(*pb),
            (ParameterType::Reference(ra), ParameterType::Reference(rb)) => {
                self.is_subtype(*ra, *rb)
            }
            _ => false,
        }
    }

    /// Check if `a` accepts a strict subset of the values `b` accepts.
    pub fn more_specific_than(&self, a: &ParameterType, b: &ParameterType) -> bool {
        self.sub_eq(a, b) && !self.sub_eq(b, a)
    }

    /// Check if `a` and `b` are equal or ordered by specificity.
    pub fn comparable(&self, a: &ParameterType, b: &ParameterType) -> bool {
        a == b || self.more_specific_than(a, b) || self.more_specific_than(b, a)
    }

    /// Check if a runtime value of type `runtime` passes a test for `declared`.
    pub fn applicable(&self, declared: &ParameterType, runtime: &RuntimeType) -> bool {
        match (declared, runtime) {
            (ParameterType::Top, _) => true,
            (ParameterType::Primitive(d), RuntimeType::Primitive(r)) => r.widens_to(*d),
            (ParameterType::Reference(d), RuntimeType::Reference(r)) => self.is_subtype(*r, *d),
            _ => false,
        }
    }

    /// Check if no runtime value can satisfy both `a` and `b`.
    pub fn disjoint(&self, a: &ParameterType, b: &ParameterType) -> bool {
        match (a, b) {
            (ParameterType::Top, _) | (_, ParameterType::Top) => false,
            (ParameterType::Primitive(pa), ParameterType::Primitive(pb)) => !pa.overlaps(*pb),
            (ParameterType::Reference(ra), ParameterType::Reference(rb)) => {
                self.references_disjoint(*ra, *rb)
            }
            _ => true,
        }
    }

    fn references_disjoint(&self, a: TypeId, b: TypeId) -> bool {
        if self.is_subtype(a, b) || self.is_subtype(b, a) {
            return false;
        }
        let (ia, ib) = (self.info(a), self.info(b));
        if ia.is_final || ib.is_final {
            return true;
        }
        ia.kind == RefKind::Class && ib.kind == RefKind::Class
    }

    /// Check the host inheritance rules, returning one message per violation.
    pub fn check_hierarchy(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for id in self.ids() {
            let info = self.info(id);
            let superclasses = info
                .supertypes
                .iter()
                .filter(|sup| self.info(**sup).kind == RefKind::Class && !self.is_root(**sup))
                .count();
            if info.kind == RefKind::Interface && superclasses > 0 {
                problems.push(format!("interface `{}` cannot extend a class", info.name));
            } else if superclasses > 1 {
                problems.push(format!("class `{}` extends more than one class", info.name));
            }
            for &sup in &info.supertypes {
                if self.info(sup).is_final {
                    problems.push(format!(
                        "`{}` cannot extend final type `{}`",
                        info.name,
                        self.name(sup)
                    ));
                }
                if self.is_subtype(sup, id) {
                    problems.push(format!("cyclic inheritance involving `{}`", info.name));
                }
            }
        }
        problems
    }

    /// Human-readable name of an erased parameter type.
    pub fn describe(&self, ty: &ParameterType) -> String {
        match ty {
            ParameterType::Primitive(kind) => kind.name().to_string(),
            ParameterType::Reference(id) => self.name(*id).to_string(),
            ParameterType::Top => self.name(self.root()).to_string(),
        }
    }

    /// Human-readable rendering of a declared type, type arguments included.
    pub fn describe_declared(&self, ty: &DeclaredType) -> String {
        match ty {
            DeclaredType::Primitive(kind) => kind.name().to_string(),
            DeclaredType::Declared { id, args } if args.is_empty() => self.name(*id).to_string(),
            DeclaredType::Declared { id, args } => {
                let args: Vec<_> = args.iter().map(|arg| self.describe_declared(arg)).collect();
                format!("{}<{}>", self.name(*id), args.join(", "))
            }
            DeclaredType::TypeVar { name, .. } => name.clone(),
            DeclaredType::Wildcard => "?".to_string(),
            DeclaredType::Void => "void".to_string(),
        }
    }
}
