//! Structural type signatures and their capability tables.
//!
//! Two signatures are equal iff their type names match; modifiers never
//! participate in equality. A collection's type name is its element's type
//! name, so `auto` inference over a list literal resolves to a name the
//! registry can answer for. A class's type name is the class name.

use crate::call::Overloads;
use crate::namespace::{NamespaceArena, NamespaceId};
use crate::value::Value;
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// A failed capability lookup. Callers turn these into validation errors (or
/// try the next overload); they never abort resolution by themselves.
#[derive(Debug, Error)]
#[error("'{sig}' does not support {what}")]
pub struct CapabilityError {
    pub sig: String,
    pub what: String,
}

impl CapabilityError {
    fn new(sig: &Signature, what: impl Into<String>) -> Self {
        Self {
            sig: sig.typename(),
            what: what.into(),
        }
    }
}

/// Binding modifiers riding on a signature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub is_const: bool,
    pub is_static: bool,
    pub is_volatile: bool,
}

impl Modifiers {
    pub fn apply(&mut self, keyword: &str) {
        match keyword {
            "const" => self.is_const = true,
            "static" => self.is_static = true,
            "volatile" => self.is_volatile = true,
            _ => {}
        }
    }

    pub fn merge(&mut self, other: Modifiers) {
        self.is_const |= other.is_const;
        self.is_static |= other.is_static;
        self.is_volatile |= other.is_volatile;
    }
}

/// A structural type signature.
#[derive(Debug, Clone)]
pub struct Signature {
    pub kind: SignatureKind,
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone)]
pub enum SignatureKind {
    Void,
    Bool,
    Int,
    Float,
    Str,
    Char,
    /// The `auto` inference placeholder; discarded by `common_type` and a
    /// wildcard in parameter matching.
    Auto,
    Function(FunctionSig),
    KeywordDef(FunctionSig),
    Collection {
        key: Box<Signature>,
        value: Box<Signature>,
    },
    Tuple {
        key: Box<Signature>,
        values: Vec<Signature>,
    },
    Class(ClassSig),
}

/// A named callable's overload table.
#[derive(Debug, Clone)]
pub struct FunctionSig {
    pub name: String,
    pub overloads: Overloads,
}

/// A class: constructor overloads plus an attribute scope living in the
/// namespace arena.
#[derive(Debug, Clone)]
pub struct ClassSig {
    pub name: String,
    pub scope: NamespaceId,
    pub constructors: Overloads,
}

impl Signature {
    pub fn builtin(kind: SignatureKind) -> Self {
        Self {
            kind,
            modifiers: Modifiers::default(),
        }
    }

    pub fn with_modifiers(kind: SignatureKind, modifiers: Modifiers) -> Self {
        Self { kind, modifiers }
    }

    pub fn int() -> Self {
        Self::builtin(SignatureKind::Int)
    }

    pub fn void() -> Self {
        Self::builtin(SignatureKind::Void)
    }

    pub fn auto() -> Self {
        Self::builtin(SignatureKind::Auto)
    }

    pub fn is_auto(&self) -> bool {
        matches!(self.kind, SignatureKind::Auto)
    }

    pub fn is_void(&self) -> bool {
        matches!(self.kind, SignatureKind::Void)
    }

    /// The type name equality is defined over.
    pub fn typename(&self) -> String {
        match &self.kind {
            SignatureKind::Void => "void".to_string(),
            SignatureKind::Bool => "bool".to_string(),
            SignatureKind::Int => "int".to_string(),
            SignatureKind::Float => "float".to_string(),
            SignatureKind::Str => "str".to_string(),
            SignatureKind::Char => "char".to_string(),
            SignatureKind::Auto => "auto".to_string(),
            SignatureKind::Function(_) => "function".to_string(),
            SignatureKind::KeywordDef(_) => "keyworddef".to_string(),
            SignatureKind::Collection { value, .. } => value.typename(),
            SignatureKind::Tuple { .. } => "tuple".to_string(),
            SignatureKind::Class(class) => class.name.clone(),
        }
    }

    /// The overload table when this signature is callable.
    pub fn callable_overloads(&self) -> Option<&Overloads> {
        match &self.kind {
            SignatureKind::Function(f) | SignatureKind::KeywordDef(f) => Some(&f.overloads),
            SignatureKind::Class(c) => Some(&c.constructors),
            _ => None,
        }
    }

    /// Operator capability: `(op, rhs?) → result`.
    pub fn operators(
        &self,
        op: &str,
        rhs: Option<&Signature>,
    ) -> Result<Signature, CapabilityError> {
        use SignatureKind::*;
        let miss = |what: String| CapabilityError::new(self, what);
        let Some(rhs) = rhs else {
            // unary table
            let result = match (&self.kind, op) {
                (Bool | Int, "+" | "-" | "~") => Some(Int),
                (Bool | Int | Float | Str | Char, "!" | "not") => Some(SignatureKind::Bool),
                (Float, "+" | "-") => Some(Float),
                _ => None,
            };
            return result
                .map(Signature::builtin)
                .ok_or_else(|| miss(format!("unary operator '{op}'")));
        };

        // membership against a collection works for any element type
        if matches!(op, "in" | "not in") {
            if let Collection { value, .. } = &rhs.kind {
                if **value == *self {
                    return Ok(Signature::builtin(Bool));
                }
            }
            return Err(miss(format!(
                "operator '{op}' with operand of type '{}'",
                rhs.typename()
            )));
        }

        let result = match (&self.kind, &rhs.kind) {
            (Int, Int | Float) => match op {
                "**" | "+" | "-" | "*" => Some(rhs.kind.clone()),
                "//" | "<<" | ">>" | "&" | "^" | "|" => Some(Int),
                "/" => Some(Float),
                "to" => Some(Int),
                "<" | "<=" | ">" | ">=" | "==" | "!=" => Some(Bool),
                _ => None,
            },
            (Float, Int | Float) => match op {
                "**" | "+" | "-" | "*" | "/" => Some(Float),
                "//" => Some(Int),
                "<" | "<=" | ">" | ">=" | "==" | "!=" => Some(Bool),
                _ => None,
            },
            (Bool, Bool) => match op {
                "&&" | "and" | "but" | "||" | "or" | "^^" | "xor" | "==" | "!=" => Some(Bool),
                _ => None,
            },
            (Str, Str) => match op {
                "+" => Some(Str),
                "==" | "!=" | "<" | "<=" | ">" | ">=" => Some(Bool),
                _ => None,
            },
            (Str, Int) => match op {
                "*" => Some(Str),
                _ => None,
            },
            (Char, Str) => match op {
                "+" => Some(Str),
                _ => None,
            },
            (Char, Int) => match op {
                "+" | "-" => Some(Char),
                "*" => Some(Str),
                _ => None,
            },
            (Char, Char) => match op {
                "+" | "-" => Some(Char),
                "==" | "!=" => Some(Bool),
                _ => None,
            },
            _ => None,
        };
        result.map(Signature::builtin).ok_or_else(|| {
            miss(format!(
                "operator '{op}' with operand of type '{}'",
                rhs.typename()
            ))
        })
    }

    /// Attribute capability: `(accessKind, name) → signature`.
    pub fn attr(
        &self,
        optype: &str,
        name: &str,
        arena: &NamespaceArena,
    ) -> Result<Signature, CapabilityError> {
        match &self.kind {
            SignatureKind::Class(class) if optype == "." => arena
                .lookup(class.scope, name)
                .cloned()
                .ok_or_else(|| {
                    CapabilityError::new(
                        self,
                        format!("attribute operation '{optype}' with attr '{name}'"),
                    )
                }),
            _ => Err(CapabilityError::new(
                self,
                format!("attribute operation '{optype}' with attr '{name}'"),
            )),
        }
    }

    /// Subscript capability: `(keySignature) → signature`. Tuples need the
    /// statically known key to pick their slot.
    pub fn item(
        &self,
        key: &Signature,
        const_key: Option<&Value>,
    ) -> Result<Signature, CapabilityError> {
        let miss = || {
            CapabilityError::new(
                self,
                format!("itemget by key of type '{}'", key.typename()),
            )
        };
        match &self.kind {
            SignatureKind::Str => {
                if matches!(key.kind, SignatureKind::Int) {
                    Ok(Signature::builtin(SignatureKind::Char))
                } else {
                    Err(miss())
                }
            }
            SignatureKind::Collection { key: kt, value } => {
                if **kt == *key {
                    Ok((**value).clone())
                } else {
                    Err(miss())
                }
            }
            SignatureKind::Tuple { key: kt, values } => {
                if **kt != *key {
                    return Err(miss());
                }
                let index = const_key
                    .and_then(Value::as_int)
                    .and_then(|i| usize::try_from(i).ok())
                    .ok_or_else(miss)?;
                values.get(index).cloned().ok_or_else(miss)
            }
            _ => Err(miss()),
        }
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.typename() == other.typename()
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.typename())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(kind: SignatureKind) -> Signature {
        Signature::builtin(kind)
    }

    #[test]
    fn test_equality_is_typename_based() {
        assert_eq!(sig(SignatureKind::Int), sig(SignatureKind::Int));
        assert_ne!(sig(SignatureKind::Int), sig(SignatureKind::Float));
        let mut with_mods = sig(SignatureKind::Int);
        with_mods.modifiers.is_const = true;
        assert_eq!(with_mods, sig(SignatureKind::Int));
    }

    #[test]
    fn test_collection_typename_is_element_typename() {
        let list = sig(SignatureKind::Collection {
            key: Box::new(sig(SignatureKind::Int)),
            value: Box::new(sig(SignatureKind::Str)),
        });
        assert_eq!(list.typename(), "str");
        assert_eq!(list, sig(SignatureKind::Str));
    }

    #[test]
    fn test_int_operator_table() {
        let int = sig(SignatureKind::Int);
        let float = sig(SignatureKind::Float);
        assert_eq!(int.operators("+", Some(&float)).unwrap(), float);
        assert_eq!(int.operators("/", Some(&int)).unwrap(), float);
        assert_eq!(int.operators("//", Some(&float)).unwrap(), int);
        assert_eq!(
            int.operators("<", Some(&int)).unwrap(),
            sig(SignatureKind::Bool)
        );
        assert!(int.operators("+", Some(&sig(SignatureKind::Str))).is_err());
    }

    #[test]
    fn test_unary_table() {
        let int = sig(SignatureKind::Int);
        assert_eq!(int.operators("-", None).unwrap(), int);
        assert_eq!(
            int.operators("not", None).unwrap(),
            sig(SignatureKind::Bool)
        );
        assert!(sig(SignatureKind::Char).operators("-", None).is_err());
    }

    #[test]
    fn test_membership_over_collection() {
        let int = sig(SignatureKind::Int);
        let list = sig(SignatureKind::Collection {
            key: Box::new(int.clone()),
            value: Box::new(int.clone()),
        });
        assert_eq!(
            int.operators("in", Some(&list)).unwrap(),
            sig(SignatureKind::Bool)
        );
    }

    #[test]
    fn test_str_itemget() {
        let s = sig(SignatureKind::Str);
        let int = sig(SignatureKind::Int);
        assert_eq!(s.item(&int, None).unwrap(), sig(SignatureKind::Char));
        assert!(s.item(&s, None).is_err());
    }

    #[test]
    fn test_tuple_itemget_needs_const_key() {
        let tuple = sig(SignatureKind::Tuple {
            key: Box::new(sig(SignatureKind::Int)),
            values: vec![sig(SignatureKind::Int), sig(SignatureKind::Str)],
        });
        let int = sig(SignatureKind::Int);
        assert_eq!(
            tuple.item(&int, Some(&Value::Int(1))).unwrap(),
            sig(SignatureKind::Str)
        );
        assert!(tuple.item(&int, None).is_err());
        assert!(tuple.item(&int, Some(&Value::Int(5))).is_err());
    }
}
