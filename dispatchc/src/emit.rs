//! Dispatcher source rendering.
//!
//! Renders resolved decision trees as Java-like dispatcher methods: nested
//! `instanceof` tests, a call to the selected definition's target (casting
//! arguments whose declared type differs from the entry point's), and
//! `throw` statements for the missing-definition and ambiguity leaves.

use indexmap::IndexMap;

use crate::config::EmitConfig;
use crate::dispatch::{Condition, DecisionTree, DefId, DispatchPoint, EntryPoint, TypeParam};
use crate::resolver::{ResolveError, ResolvedEntry, ResolvedPoint};
use crate::types::{DeclaredType, ParameterType, PrimitiveKind, TypeEnv};

/// Module name used for dispatch points declared outside any module.
pub const GLOBAL_MODULE: &str = "Global";

struct SourceWriter<'a> {
    out: String,
    indent: &'a str,
    level: usize,
}

impl<'a> SourceWriter<'a> {
    fn new(indent: &'a str, level: usize) -> Self {
        Self {
            out: String::new(),
            indent,
            level,
        }
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.level {
            self.out.push_str(self.indent);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn finish(self) -> String {
        self.out
    }
}

struct DispatcherRenderer<'a> {
    env: &'a TypeEnv,
    point: &'a DispatchPoint,
    entry: &'a EntryPoint,
    config: &'a EmitConfig,
}

impl DispatcherRenderer<'_> {
    fn node(&self, w: &mut SourceWriter<'_>, tree: &DecisionTree) {
        match tree {
            DecisionTree::Condition { condition, is_true, is_false } => {
                w.line(&format!("if ({}) {{", self.test(condition)));
                w.level += 1;
                self.node(w, is_true);
                w.level -= 1;
                w.line("} else {");
                w.level += 1;
                self.node(w, is_false);
                w.level -= 1;
                w.line("}");
            }
            DecisionTree::Decision { definition: Some(def_id) } => self.call(w, *def_id),
            DecisionTree::Decision { definition: None } => {
                w.line(&format!("throw new {}();", self.config.missing_definition));
            }
            DecisionTree::Ambiguity { .. } => {
                w.line(&format!("throw new {}();", self.config.ambiguity));
            }
        }
    }

    /// The runtime test for a condition.
    ///
    /// Primitive arguments are only observable boxed, so a primitive test
    /// checks for the wrapper of every kind that widens to the tested one.
    fn test(&self, condition: &Condition) -> String {
        let argument = format!("p{}", condition.argument);
        let ParameterType::Primitive(kind) = condition.ty else {
            return format!("{} instanceof {}", argument, self.env.describe(&condition.ty));
        };

        let static_is_primitive = matches!(
            self.entry.param_types.get(condition.argument),
            Some(DeclaredType::Primitive(_))
        );
        let subject = if static_is_primitive {
            format!("((Object) {})", argument)
        } else {
            argument
        };
        kind.narrower_or_equal()
            .map(|narrower| format!("{} instanceof {}", subject, narrower.wrapper_name()))
            .collect::<Vec<_>>()
            .join(" || ")
    }

    /// An argument passed as `declared` from a parameter of `static_type`.
    fn argument(&self, index: usize, declared: &DeclaredType, static_type: &DeclaredType) -> String {
        let name = format!("p{}", index);
        match (declared, static_type) {
            _ if declared == static_type => name,
            (DeclaredType::Primitive(kind), static_type) if !matches!(static_type, DeclaredType::Primitive(_)) => {
                unboxed(*kind, &name)
            }
            _ => format!("({}) {}", self.env.describe_declared(declared), name),
        }
    }

    fn call(&self, w: &mut SourceWriter<'_>, def_id: DefId) {
        let Some(candidate) = self.point.candidate(def_id) else {
            w.line(&format!("throw new {}();", self.config.missing_definition));
            return;
        };

        let args: Vec<String> = candidate
            .param_types
            .iter()
            .zip(&self.entry.param_types)
            .enumerate()
            .map(|(i, (declared, static_type))| self.argument(i, declared, static_type))
            .collect();
        let call = format!("{}({})", candidate.target, args.join(", "));

        if self.entry.return_type.is_void() {
            w.line(&format!("{};", call));
            w.line("return;");
        } else {
            w.line(&format!("return {};", call));
        }
    }
}

/// Unbox a reference holding any primitive that widens to `kind`.
fn unboxed(kind: PrimitiveKind, value: &str) -> String {
    match kind {
        PrimitiveKind::Boolean | PrimitiveKind::Byte | PrimitiveKind::Char => {
            format!("({}) {}", kind.wrapper_name(), value)
        }
        _ if PrimitiveKind::Char.widens_to(kind) => format!(
            "({value} instanceof Character ? ({kind}) (Character) {value} : ((Number) {value}).{kind}Value())",
            value = value,
            kind = kind.name()
        ),
        _ => format!("((Number) {}).{}Value()", value, kind.name()),
    }
}

fn render_type_params(env: &TypeEnv, params: &[TypeParam]) -> String {
    if params.is_empty() {
        return String::new();
    }
    let rendered: Vec<String> = params
        .iter()
        .map(|param| match &param.bound {
            DeclaredType::Declared { id, .. } if env.is_root(*id) => param.name.clone(),
            bound => format!("{} extends {}", param.name, env.describe_declared(bound)),
        })
        .collect();
    format!("<{}> ", rendered.join(", "))
}

/// Render the dispatcher method for one resolved entry point.
pub fn render_dispatcher(
    env: &TypeEnv,
    point: &DispatchPoint,
    resolved: &ResolvedEntry,
    config: &EmitConfig,
) -> String {
    let entry = &resolved.entry;
    let mut w = SourceWriter::new(&config.indent, 1);

    w.line(&format!("/* {} */", resolved.tree.display(env)));
    let params: Vec<String> = entry
        .param_types
        .iter()
        .enumerate()
        .map(|(i, ty)| format!("{} p{}", env.describe_declared(ty), i))
        .collect();
    w.line(&format!(
        "public {}{} {}({}) {{",
        render_type_params(env, &entry.type_params),
        env.describe_declared(&entry.return_type),
        entry.name,
        params.join(", ")
    ));

    w.level += 1;
    let renderer = DispatcherRenderer { env, point, entry, config };
    renderer.node(&mut w, &resolved.tree);
    w.level -= 1;
    w.line("}");

    w.finish()
}

/// Render every dispatcher of one module as a class implementing it.
pub fn render_module(
    env: &TypeEnv,
    module: &str,
    points: &[(&DispatchPoint, &ResolvedPoint)],
    config: &EmitConfig,
) -> String {
    let class_name = format!("{}{}", module, config.class_suffix);
    let mut out = format!("public final class {} implements {} {{\n", class_name, module);

    let mut first = true;
    for (point, resolved) in points {
        for entry in &resolved.entries {
            if !first {
                out.push('\n');
            }
            first = false;
            out.push_str(&render_dispatcher(env, point, entry, config));
        }
    }

    out.push_str("}\n");
    out
}

/// Pair dispatch points with their successful resolutions, grouped by module
/// in first-seen order.
pub fn group_by_module<'p>(
    points: &'p [DispatchPoint],
    results: &'p [Result<ResolvedPoint, ResolveError>],
) -> IndexMap<&'p str, Vec<(&'p DispatchPoint, &'p ResolvedPoint)>> {
    let mut modules: IndexMap<&str, Vec<_>> = IndexMap::new();
    for (point, result) in points.iter().zip(results) {
        if let Ok(resolved) = result {
            let module = point.module.as_deref().unwrap_or(GLOBAL_MODULE);
            modules.entry(module).or_default().push((point, resolved));
        }
    }
    modules
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Heuristic;
    use crate::dispatch::{CandidateDefinition, TreeBuilder};
    use pretty_assertions::assert_eq;

    fn named(env: &TypeEnv, name: &str) -> DeclaredType {
        DeclaredType::named(env.lookup(name).unwrap())
    }

    fn show_point(env: &TypeEnv, returns: DeclaredType) -> DispatchPoint {
        let candidate = |index: u32, param: &str| CandidateDefinition {
            def_id: DefId::new(index),
            name: "show".to_string(),
            param_types: vec![named(env, param)],
            return_type: returns.clone(),
            type_params: vec![],
            is_default: false,
            target: "show".to_string(),
        };
        DispatchPoint {
            name: "show".to_string(),
            module: Some("Printer".to_string()),
            entry_points: vec![EntryPoint {
                def_id: DefId::new(9),
                name: "show".to_string(),
                param_types: vec![named(env, "Object")],
                return_type: returns.clone(),
                type_params: vec![],
            }],
            candidates: vec![candidate(0, "Number"), candidate(1, "Integer")],
        }
    }

    fn resolve(env: &TypeEnv, point: &DispatchPoint) -> ResolvedEntry {
        let builder = TreeBuilder::new(env, &point.candidates, Heuristic::DeclarationOrder);
        let entry = point.entry_points[0].clone();
        let tree = builder.build(&entry);
        ResolvedEntry { entry, tree }
    }

    #[test]
    fn test_render_void_dispatcher() {
        let env = TypeEnv::java_prelude();
        let point = show_point(&env, DeclaredType::Void);
        let resolved = resolve(&env, &point);
        let config = EmitConfig {
            indent: "  ".to_string(),
            ..EmitConfig::default()
        };

        let expected = "  /* (p0 instanceof Integer ? call #1 : (p0 instanceof Number ? call #0 : missing)) */
  public void show(Object p0) {
    if (p0 instanceof Integer) {
      show((Integer) p0);
      return;
    } else {
      if (p0 instanceof Number) {
        show((Number) p0);
        return;
      } else {
        throw new MissingDefinitionException();
      }
    }
  }
";
        assert_eq!(render_dispatcher(&env, &point, &resolved, &config), expected);
    }

    #[test]
    fn test_render_returning_dispatcher_without_casts() {
        let env = TypeEnv::java_prelude();
        let mut point = show_point(&env, named(&env, "String"));
        point.entry_points[0].param_types = vec![named(&env, "Integer")];
        point.candidates[1].target = "showInteger".to_string();
        let resolved = resolve(&env, &point);

        let rendered = render_dispatcher(&env, &point, &resolved, &EmitConfig::default());
        assert!(rendered.contains("public String show(Integer p0) {"));
        assert!(rendered.contains("return showInteger(p0);"));
        assert!(!rendered.contains("instanceof"));
    }

    #[test]
    fn test_render_primitive_tests_through_wrappers() {
        let env = TypeEnv::java_prelude();
        let mut point = show_point(&env, DeclaredType::Void);
        point.candidates = vec![
            CandidateDefinition {
                def_id: DefId::new(0),
                name: "show".to_string(),
                param_types: vec![DeclaredType::Primitive(PrimitiveKind::Int)],
                return_type: DeclaredType::Void,
                type_params: vec![],
                is_default: false,
                target: "show".to_string(),
            },
            CandidateDefinition {
                def_id: DefId::new(1),
                name: "show".to_string(),
                param_types: vec![named(&env, "Object")],
                return_type: DeclaredType::Void,
                type_params: vec![],
                is_default: true,
                target: "Printer.super.show".to_string(),
            },
        ];
        let resolved = resolve(&env, &point);
        let config = EmitConfig {
            indent: "  ".to_string(),
            ..EmitConfig::default()
        };

        let expected = "  /* (p0 instanceof int ? call #0 : call #1) */
  public void show(Object p0) {
    if (p0 instanceof Byte || p0 instanceof Short || p0 instanceof Character || p0 instanceof Integer) {
      show(p0 instanceof Character ? (int) (Character) p0 : ((Number) p0).intValue());
      return;
    } else {
      Printer.super.show(p0);
      return;
    }
  }
";
        assert_eq!(render_dispatcher(&env, &point, &resolved, &config), expected);
    }

    #[test]
    fn test_unboxed_arguments() {
        assert_eq!(unboxed(PrimitiveKind::Boolean, "p1"), "(Boolean) p1");
        assert_eq!(unboxed(PrimitiveKind::Short, "p1"), "((Number) p1).shortValue()");
        assert_eq!(
            unboxed(PrimitiveKind::Double, "p0"),
            "(p0 instanceof Character ? (double) (Character) p0 : ((Number) p0).doubleValue())"
        );
    }

    #[test]
    fn test_render_ambiguity_and_type_params() {
        let env = TypeEnv::java_prelude();
        let mut point = show_point(&env, DeclaredType::Void);
        point.candidates[1].param_types = vec![named(&env, "Number")];
        point.entry_points[0].type_params = vec![
            TypeParam {
                name: "T".to_string(),
                bound: named(&env, "Object"),
            },
            TypeParam {
                name: "N".to_string(),
                bound: named(&env, "Number"),
            },
        ];
        let resolved = resolve(&env, &point);
        let config = EmitConfig {
            ambiguity: "Ambiguous".to_string(),
            ..EmitConfig::default()
        };

        let rendered = render_dispatcher(&env, &point, &resolved, &config);
        assert!(rendered.contains("public <T, N extends Number> void show(Object p0) {"));
        assert!(rendered.contains("throw new Ambiguous();"));
    }

    #[test]
    fn test_render_module() {
        let env = TypeEnv::java_prelude();
        let point = show_point(&env, DeclaredType::Void);
        let resolved = ResolvedPoint {
            name: point.name.clone(),
            module: point.module.clone(),
            entries: vec![resolve(&env, &point)],
        };
        let results = vec![Ok(resolved)];
        let points = vec![point];

        let modules = group_by_module(&points, &results);
        assert_eq!(modules.keys().copied().collect::<Vec<_>>(), vec!["Printer"]);

        let source = render_module(&env, "Printer", &modules["Printer"], &EmitConfig::default());
        assert!(source.starts_with("public final class PrinterDispatch implements Printer {\n"));
        assert!(source.ends_with("}\n"));
        assert_eq!(source.matches("public void show").count(), 1);
    }
}
