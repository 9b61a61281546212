//! Program files: the declarations a resolver works on.
//!
//! A program is a TOML document declaring reference types, dispatch points
//! and module references:
//!
//! ```toml
//! [[types]]
//! name = "Shape"
//! kind = "interface"
//!
//! [[types]]
//! name = "Circle"
//! supertypes = ["Shape"]
//!
//! [[dispatch]]
//! name = "area"
//! module = "Geometry"
//!
//! [[dispatch.entry]]
//! params = ["Shape"]
//! returns = "double"
//!
//! [[dispatch.definitions]]
//! params = ["Circle"]
//! returns = "double"
//!
//! [[module_refs]]
//! name = "geometry"
//! type = "Geometry"
//! ```
//!
//! Every declaration gets a [`DefId`] in file order; the [`SourceMap`] maps it
//! back to the declaration's span for diagnostics.

pub mod lexer;

use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;
use toml::Spanned;
use tracing::debug;

use crate::config::HostConfig;
use crate::dispatch::{CandidateDefinition, DefId, DispatchPoint, EntryPoint, ModuleReference, TypeParam};
use crate::types::{DeclaredType, RefKind, TypeEnv};

use lexer::TypeParser;

/// Errors loading a program file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read program file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid program file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{message}")]
    Syntax { message: String, span: Range<usize> },

    #[error("unknown type `{name}`")]
    UnknownType { name: String, span: Range<usize> },

    #[error("type `{name}` is declared twice")]
    DuplicateType { name: String, span: Range<usize> },

    #[error("`void` is not a valid parameter type")]
    VoidParameter { span: Range<usize> },

    #[error("default definition of `{name}` needs a `target`: `{name}` is not declared in a module")]
    DefaultWithoutTarget { name: String, span: Range<usize> },

    #[error("definition of `{name}` has the parameter types of an entry point, so calling it would re-enter the dispatcher; give it a `target`")]
    SelfDispatch { name: String, span: Range<usize> },

    #[error("the built-in prelude is rooted at `Object`, not `{root}`")]
    RootMismatch { root: String },

    #[error("invalid type hierarchy: {}", .problems.join("; "))]
    Hierarchy { problems: Vec<String> },
}

impl LoadError {
    /// Byte range in the program file the error points at, if known.
    pub fn span(&self) -> Option<Range<usize>> {
        match self {
            LoadError::Toml(err) => err.span(),
            LoadError::Syntax { span, .. }
            | LoadError::UnknownType { span, .. }
            | LoadError::DuplicateType { span, .. }
            | LoadError::VoidParameter { span }
            | LoadError::DefaultWithoutTarget { span, .. }
            | LoadError::SelfDispatch { span, .. } => Some(span.clone()),
            LoadError::Io { .. } | LoadError::RootMismatch { .. } | LoadError::Hierarchy { .. } => None,
        }
    }
}

/// Declaration spans by identity.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    spans: IndexMap<DefId, Range<usize>>,
}

impl SourceMap {
    pub fn insert(&mut self, def_id: DefId, span: Range<usize>) {
        self.spans.insert(def_id, span);
    }

    pub fn span(&self, def_id: DefId) -> Option<Range<usize>> {
        self.spans.get(&def_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

/// A loaded program.
#[derive(Debug, Clone)]
pub struct Program {
    /// Built-in and declared reference types.
    pub env: TypeEnv,
    /// Dispatch points, in file order.
    pub points: Vec<DispatchPoint>,
    /// Module references, in file order.
    pub module_refs: Vec<ModuleReference>,
    /// Declaration spans.
    pub source_map: SourceMap,
}

// === Raw file layout ===

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProgram {
    #[serde(default)]
    types: Vec<Spanned<RawType>>,
    #[serde(default)]
    dispatch: Vec<RawDispatch>,
    #[serde(default)]
    module_refs: Vec<Spanned<RawModuleRef>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawType {
    name: String,
    #[serde(default)]
    kind: RefKind,
    #[serde(default)]
    supertypes: Vec<String>,
    #[serde(default, rename = "final")]
    is_final: bool,
    #[serde(default)]
    module: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDispatch {
    name: String,
    #[serde(default)]
    module: Option<String>,
    #[serde(default)]
    entry: Vec<Spanned<RawEntry>>,
    #[serde(default)]
    definitions: Vec<Spanned<RawDefinition>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEntry {
    #[serde(default)]
    params: Vec<Spanned<String>>,
    #[serde(default)]
    returns: Option<Spanned<String>>,
    #[serde(default)]
    type_params: Vec<Spanned<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDefinition {
    #[serde(default)]
    params: Vec<Spanned<String>>,
    #[serde(default)]
    returns: Option<Spanned<String>>,
    #[serde(default)]
    type_params: Vec<Spanned<String>>,
    #[serde(default)]
    default: bool,
    #[serde(default)]
    target: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawModuleRef {
    name: String,
    #[serde(rename = "type")]
    ty: Spanned<String>,
}

/// The parts shared by entry points and definitions.
struct Signature {
    params: Vec<DeclaredType>,
    returns: DeclaredType,
    type_params: Vec<TypeParam>,
}

impl Program {
    /// Read and parse a program file.
    pub fn load(path: &Path, host: &HostConfig) -> Result<Self, LoadError> {
        let source = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&source, host)
    }

    /// Parse a program from TOML text.
    pub fn parse(source: &str, host: &HostConfig) -> Result<Self, LoadError> {
        let raw: RawProgram = toml::from_str(source)?;

        let mut env = if host.prelude {
            if host.root_type != "Object" {
                return Err(LoadError::RootMismatch {
                    root: host.root_type.clone(),
                });
            }
            TypeEnv::java_prelude()
        } else {
            TypeEnv::new(&host.root_type)
        };

        declare_types(&mut env, &raw)?;

        let mut next_id = 0u32;
        let mut fresh = |source_map: &mut SourceMap, span: Range<usize>| {
            let def_id = DefId::new(next_id);
            next_id += 1;
            source_map.insert(def_id, span);
            def_id
        };

        let mut source_map = SourceMap::default();
        let mut points = Vec::with_capacity(raw.dispatch.len());
        for dispatch in &raw.dispatch {
            let mut entry_points = Vec::with_capacity(dispatch.entry.len());
            for entry in &dispatch.entry {
                let signature = parse_signature(
                    &env,
                    &entry.get_ref().params,
                    entry.get_ref().returns.as_ref(),
                    &entry.get_ref().type_params,
                )?;
                entry_points.push(EntryPoint {
                    def_id: fresh(&mut source_map, entry.span()),
                    name: dispatch.name.clone(),
                    param_types: signature.params,
                    return_type: signature.returns,
                    type_params: signature.type_params,
                });
            }

            let mut candidates = Vec::with_capacity(dispatch.definitions.len());
            for definition in &dispatch.definitions {
                let raw_def = definition.get_ref();
                let signature =
                    parse_signature(&env, &raw_def.params, raw_def.returns.as_ref(), &raw_def.type_params)?;
                let target = match (&raw_def.target, &dispatch.module, raw_def.default) {
                    (Some(target), _, _) => target.clone(),
                    (None, Some(module), true) => format!("{}.super.{}", module, dispatch.name),
                    (None, None, true) => {
                        return Err(LoadError::DefaultWithoutTarget {
                            name: dispatch.name.clone(),
                            span: definition.span(),
                        })
                    }
                    (None, _, false) => dispatch.name.clone(),
                };
                // A call with an entry point's exact signature resolves to the
                // dispatcher itself.
                if target == dispatch.name
                    && entry_points.iter().any(|entry| entry.param_types == signature.params)
                {
                    return Err(LoadError::SelfDispatch {
                        name: dispatch.name.clone(),
                        span: definition.span(),
                    });
                }
                candidates.push(CandidateDefinition {
                    def_id: fresh(&mut source_map, definition.span()),
                    name: dispatch.name.clone(),
                    param_types: signature.params,
                    return_type: signature.returns,
                    type_params: signature.type_params,
                    is_default: raw_def.default,
                    target,
                });
            }

            points.push(DispatchPoint {
                name: dispatch.name.clone(),
                module: dispatch.module.clone(),
                entry_points,
                candidates,
            });
        }

        let parser = TypeParser::new(&env);
        let mut module_refs = Vec::with_capacity(raw.module_refs.len());
        for reference in &raw.module_refs {
            let raw_ref = reference.get_ref();
            let ty = parser.parse(raw_ref.ty.get_ref(), raw_ref.ty.span())?;
            module_refs.push(ModuleReference {
                def_id: fresh(&mut source_map, reference.span()),
                name: raw_ref.name.clone(),
                ty,
            });
        }

        debug!(
            types = env.len(),
            points = points.len(),
            module_refs = module_refs.len(),
            "program loaded"
        );

        Ok(Program {
            env,
            points,
            module_refs,
            source_map,
        })
    }
}

/// Register declared types, then their supertypes, then dispatch modules.
fn declare_types(env: &mut TypeEnv, raw: &RawProgram) -> Result<(), LoadError> {
    let mut seen: IndexMap<&str, Range<usize>> = IndexMap::new();
    for ty in &raw.types {
        let decl = ty.get_ref();
        if seen.insert(decl.name.as_str(), ty.span()).is_some() {
            return Err(LoadError::DuplicateType {
                name: decl.name.clone(),
                span: ty.span(),
            });
        }
        let id = env.declare(&decl.name, decl.kind);
        env.set_final(id, decl.is_final);
        env.set_module(id, decl.module);
    }

    for ty in &raw.types {
        let decl = ty.get_ref();
        let Some(id) = env.lookup(&decl.name) else {
            continue;
        };
        for sup in &decl.supertypes {
            let sup_id = env.lookup(sup).ok_or_else(|| LoadError::UnknownType {
                name: sup.clone(),
                span: ty.span(),
            })?;
            env.add_supertype(id, sup_id);
        }
    }

    for dispatch in &raw.dispatch {
        if let Some(module) = &dispatch.module {
            let id = match env.lookup(module) {
                Some(id) => id,
                None => env.declare(module, RefKind::Interface),
            };
            env.set_module(id, true);
        }
    }

    let problems = env.check_hierarchy();
    if !problems.is_empty() {
        return Err(LoadError::Hierarchy { problems });
    }
    Ok(())
}

fn parse_signature(
    env: &TypeEnv,
    params: &[Spanned<String>],
    returns: Option<&Spanned<String>>,
    type_params: &[Spanned<String>],
) -> Result<Signature, LoadError> {
    let mut parser = TypeParser::new(env);
    for param in type_params {
        parser.declare_type_param(param.get_ref(), param.span())?;
    }

    let mut parsed = Vec::with_capacity(params.len());
    for param in params {
        let ty = parser.parse(param.get_ref(), param.span())?;
        if ty.is_void() {
            return Err(LoadError::VoidParameter { span: param.span() });
        }
        parsed.push(ty);
    }

    let returns = match returns {
        Some(returns) => parser.parse(returns.get_ref(), returns.span())?,
        None => DeclaredType::Void,
    };

    Ok(Signature {
        params: parsed,
        returns,
        type_params: parser.type_params().to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ParameterType;
    use pretty_assertions::assert_eq;

    const SHAPES: &str = r#"
[[types]]
name = "Shape"
kind = "interface"

[[types]]
name = "Circle"
supertypes = ["Shape"]
final = true

[[dispatch]]
name = "area"
module = "Geometry"

[[dispatch.entry]]
params = ["Shape"]
returns = "double"

[[dispatch.definitions]]
params = ["Circle"]
returns = "double"

[[dispatch.definitions]]
params = ["Shape"]
returns = "double"
default = true

[[module_refs]]
name = "geometry"
type = "Geometry"
"#;

    #[test]
    fn test_parse_program() {
        let program = Program::parse(SHAPES, &HostConfig::default()).unwrap();
        let env = &program.env;

        let circle = env.lookup("Circle").unwrap();
        assert!(env.info(circle).is_final);
        assert!(env.is_subtype(circle, env.lookup("Shape").unwrap()));
        assert!(env.is_module(env.lookup("Geometry").unwrap()));

        assert_eq!(program.points.len(), 1);
        let point = &program.points[0];
        assert_eq!(point.entry_points[0].def_id, DefId::new(0));
        assert_eq!(point.candidates[0].def_id, DefId::new(1));
        assert_eq!(point.candidates[0].target, "area");
        assert_eq!(point.candidates[1].target, "Geometry.super.area");
        assert!(point.candidates[1].is_default);
        assert_eq!(
            point.candidates[0].signature(env).params,
            vec![ParameterType::Reference(circle)]
        );

        assert_eq!(program.module_refs[0].def_id, DefId::new(3));
        assert_eq!(program.source_map.len(), 4);
    }

    #[test]
    fn test_spans_point_at_declarations() {
        let program = Program::parse(SHAPES, &HostConfig::default()).unwrap();
        let spans: Vec<Range<usize>> = (0..4)
            .map(|i| program.source_map.span(DefId::new(i)).unwrap())
            .collect();
        for pair in spans.windows(2) {
            assert!(pair[0].start < pair[1].start);
        }
        assert!(spans.iter().all(|span| span.end <= SHAPES.len()));
        assert!(SHAPES[spans[3].clone()].contains("module_refs") || SHAPES[spans[3].clone()].contains("geometry"));
    }

    #[test]
    fn test_unknown_type_has_span() {
        let source = "[[dispatch]]\nname = \"f\"\n[[dispatch.definitions]]\nparams = [\"Sqare\"]\n";
        let err = Program::parse(source, &HostConfig::default()).unwrap_err();
        assert!(matches!(&err, LoadError::UnknownType { name, .. } if name == "Sqare"));
        let span = err.span().unwrap();
        assert_eq!(&source[span], "\"Sqare\"");
    }

    #[test]
    fn test_void_parameter_rejected() {
        let source = "[[dispatch]]\nname = \"f\"\n[[dispatch.entry]]\nparams = [\"void\"]\n";
        let err = Program::parse(source, &HostConfig::default()).unwrap_err();
        assert!(matches!(err, LoadError::VoidParameter { .. }));
    }

    #[test]
    fn test_duplicate_and_hierarchy_errors() {
        let duplicate = "[[types]]\nname = \"A\"\n[[types]]\nname = \"A\"\n";
        assert!(matches!(
            Program::parse(duplicate, &HostConfig::default()),
            Err(LoadError::DuplicateType { .. })
        ));

        let two_classes = r#"
[[types]]
name = "A"
[[types]]
name = "B"
[[types]]
name = "C"
supertypes = ["A", "B"]
"#;
        let err = Program::parse(two_classes, &HostConfig::default()).unwrap_err();
        assert!(err.to_string().contains("more than one class"));
    }

    #[test]
    fn test_without_prelude() {
        let host = HostConfig {
            root_type: "Any".to_string(),
            prelude: false,
            ..HostConfig::default()
        };
        let program = Program::parse("[[types]]\nname = \"Thing\"\n", &host).unwrap();
        assert_eq!(program.env.len(), 2);
        assert!(program.env.lookup("String").is_none());

        let err = Program::parse(
            "",
            &HostConfig {
                root_type: "Any".to_string(),
                ..HostConfig::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::RootMismatch { .. }));
    }

    #[test]
    fn test_default_outside_module_needs_target() {
        let source = r#"
[[dispatch]]
name = "describe"

[[dispatch.entry]]
params = ["Object"]
returns = "String"

[[dispatch.definitions]]
params = ["Integer"]
returns = "String"

[[dispatch.definitions]]
params = ["Object"]
returns = "String"
default = true
"#;
        let err = Program::parse(source, &HostConfig::default()).unwrap_err();
        assert!(matches!(&err, LoadError::DefaultWithoutTarget { name, .. } if name == "describe"));
        assert!(err.span().is_some());

        let with_target = source.replace("default = true", "default = true\ntarget = \"describeAny\"");
        let program = Program::parse(&with_target, &HostConfig::default()).unwrap();
        assert_eq!(program.points[0].candidates[1].target, "describeAny");
    }

    #[test]
    fn test_definition_with_entry_signature_needs_target() {
        let source = r#"
[[dispatch]]
name = "show"
module = "Printer"

[[dispatch.entry]]
params = ["Integer"]
returns = "String"

[[dispatch.definitions]]
params = ["Integer"]
returns = "String"
"#;
        let err = Program::parse(source, &HostConfig::default()).unwrap_err();
        assert!(matches!(&err, LoadError::SelfDispatch { name, .. } if name == "show"));

        let renamed = format!("{}target = \"showInteger\"\n", source);
        let program = Program::parse(&renamed, &HostConfig::default()).unwrap();
        assert_eq!(program.points[0].candidates[0].target, "showInteger");

        // A default in a module calls the inherited method, not the dispatcher.
        let inherited = format!("{}default = true\n", source);
        let program = Program::parse(&inherited, &HostConfig::default()).unwrap();
        assert_eq!(program.points[0].candidates[0].target, "Printer.super.show");
    }

    #[test]
    fn test_toml_errors() {
        let err = Program::parse("[[dispatch]]\nnmae = \"f\"\n", &HostConfig::default()).unwrap_err();
        assert!(matches!(err, LoadError::Toml(_)));
    }
}
