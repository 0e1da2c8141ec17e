//! The builtin-type registry.
//!
//! An explicitly constructed, immutable value injected into the validator and
//! optimizer entry points, so tests can substitute a reduced registry instead
//! of relying on a process-wide table.

use crate::call::{Overloads, Param, ParamKind, ParamList};
use crate::signature::{FunctionSig, Signature, SignatureKind};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct TypeRegistry {
    builtins: HashMap<String, Signature>,
}

impl TypeRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The standard registry: the scalar builtins, their sized aliases, the
    /// `auto` placeholder and the `print` builtin.
    pub fn standard() -> Self {
        let mut registry = Self::default();
        registry.register("void", Signature::builtin(SignatureKind::Void));
        registry.register("bool", Signature::builtin(SignatureKind::Bool));
        registry.register("int", Signature::builtin(SignatureKind::Int));
        registry.register("float", Signature::builtin(SignatureKind::Float));
        registry.register("str", Signature::builtin(SignatureKind::Str));
        registry.register("char", Signature::builtin(SignatureKind::Char));
        registry.register("auto", Signature::builtin(SignatureKind::Auto));
        for width in [8u16, 16, 32, 64, 128] {
            registry.register(format!("i{width}"), Signature::builtin(SignatureKind::Int));
            registry.register(format!("u{width}"), Signature::builtin(SignatureKind::Int));
            registry.register(
                format!("f{width}"),
                Signature::builtin(SignatureKind::Float),
            );
            registry.register(
                format!("uf{width}"),
                Signature::builtin(SignatureKind::Float),
            );
        }

        // print accepts any positional arguments and no keywords
        let mut print_overloads = Overloads::new();
        print_overloads.insert(
            ParamList::new(vec![Param {
                name: "args".to_string(),
                sig: Signature::auto(),
                kind: ParamKind::Variadic,
            }]),
            Signature::void(),
        );
        registry.register(
            "print",
            Signature::builtin(SignatureKind::Function(FunctionSig {
                name: "print".to_string(),
                overloads: print_overloads,
            })),
        );
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, sig: Signature) {
        self.builtins.insert(name.into(), sig);
    }

    pub fn get(&self, name: &str) -> Option<&Signature> {
        self.builtins.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.builtins.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::CallArguments;

    #[test]
    fn test_sized_aliases_resolve_to_scalars() {
        let registry = TypeRegistry::standard();
        assert_eq!(registry.get("i64").unwrap(), &Signature::int());
        assert_eq!(
            registry.get("uf32").unwrap(),
            &Signature::builtin(SignatureKind::Float)
        );
    }

    #[test]
    fn test_print_accepts_positionals_only() {
        let registry = TypeRegistry::standard();
        let print = registry.get("print").unwrap();
        let overloads = print.callable_overloads().unwrap();
        let ok = CallArguments::positional(vec![Signature::int(), Signature::int()]);
        assert!(overloads.find(&ok).is_some());
        let with_kw = CallArguments {
            kwargs: vec![("sep".to_string(), Signature::int())],
            ..Default::default()
        };
        assert!(overloads.find(&with_kw).is_none());
    }

    #[test]
    fn test_reduced_registry_substitutes() {
        let mut registry = TypeRegistry::empty();
        registry.register("int", Signature::int());
        assert!(registry.contains("int"));
        assert!(!registry.contains("print"));
    }
}
