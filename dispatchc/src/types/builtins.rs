//! Built-in reference types of the default host.

use super::{RefKind, TypeEnv};

impl TypeEnv {
    /// An environment pre-populated with the common `java.lang` and
    /// `java.util` types, rooted at `Object`.
    pub fn java_prelude() -> Self {
        let mut env = TypeEnv::new("Object");

        // === Interfaces ===

        env.register_builtin("Comparable", RefKind::Interface, false, &[]);
        env.register_builtin("CharSequence", RefKind::Interface, false, &[]);
        env.register_builtin("Cloneable", RefKind::Interface, false, &[]);
        env.register_builtin("Serializable", RefKind::Interface, false, &[]);
        env.register_builtin("Runnable", RefKind::Interface, false, &[]);
        env.register_builtin("Iterable", RefKind::Interface, false, &[]);
        env.register_builtin("Collection", RefKind::Interface, false, &["Iterable"]);
        env.register_builtin("List", RefKind::Interface, false, &["Collection"]);
        env.register_builtin("Set", RefKind::Interface, false, &["Collection"]);
        env.register_builtin("Map", RefKind::Interface, false, &[]);

        // === Boxed primitives ===

        env.register_builtin("Number", RefKind::Class, false, &["Serializable"]);
        env.register_builtin("Integer", RefKind::Class, true, &["Number", "Comparable"]);
        env.register_builtin("Long", RefKind::Class, true, &["Number", "Comparable"]);
        env.register_builtin("Short", RefKind::Class, true, &["Number", "Comparable"]);
        env.register_builtin("Byte", RefKind::Class, true, &["Number", "Comparable"]);
        env.register_builtin("Float", RefKind::Class, true, &["Number", "Comparable"]);
        env.register_builtin("Double", RefKind::Class, true, &["Number", "Comparable"]);
        env.register_builtin("Character", RefKind::Class, true, &["Serializable", "Comparable"]);
        env.register_builtin("Boolean", RefKind::Class, true, &["Serializable", "Comparable"]);

        // === Other classes ===

        env.register_builtin(
            "String",
            RefKind::Class,
            true,
            &["CharSequence", "Comparable", "Serializable"],
        );
        env.register_builtin("Class", RefKind::Class, true, &["Serializable"]);
        env.register_builtin("Thread", RefKind::Class, false, &["Runnable"]);
        env.register_builtin("Throwable", RefKind::Class, false, &["Serializable"]);
        env.register_builtin("Exception", RefKind::Class, false, &["Throwable"]);
        env.register_builtin("RuntimeException", RefKind::Class, false, &["Exception"]);
        env.register_builtin("ArrayList", RefKind::Class, false, &["List", "Cloneable", "Serializable"]);
        env.register_builtin("LinkedList", RefKind::Class, false, &["List", "Cloneable", "Serializable"]);
        env.register_builtin("HashSet", RefKind::Class, false, &["Set", "Cloneable", "Serializable"]);
        env.register_builtin("HashMap", RefKind::Class, false, &["Map", "Cloneable", "Serializable"]);

        env
    }

    /// Register a single built-in type with its direct supertypes.
    ///
    /// Supertypes must already be registered.
    fn register_builtin(&mut self, name: &str, kind: RefKind, is_final: bool, supertypes: &[&str]) {
        let id = self.declare(name, kind);
        self.set_final(id, is_final);
        for sup in supertypes {
            if let Some(sup) = self.lookup(sup) {
                self.add_supertype(id, sup);
            }
        }
    }
}
