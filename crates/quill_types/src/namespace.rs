//! The scope chain: arena-indexed records with parent indices.
//!
//! A child record never duplicates an unchanged parent entry — lookups walk
//! the parent chain — and mutations (including `delete`, via tombstones)
//! never touch the parent. `derive` is memoized per `(parent, scope name)` so
//! the validate and optimize walks re-derive referentially consistent scopes.

use crate::signature::Signature;
use crate::value::Value;
use derive_more::Display;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Index of a scope record in the arena.
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, Hash)]
#[display(fmt = "ns#{}", _0)]
pub struct NamespaceId(usize);

/// The constant-value knowledge for a name.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Known(Value),
    /// Assigned, but the value is unknown or `volatile`; blocks folding.
    Unknown,
}

#[derive(Debug, Error)]
pub enum NamespaceError {
    #[error("'{name}' redefined (defined as '{existing}')")]
    Redefined { name: String, existing: String },
    #[error("'{0}' is not defined")]
    NotDefined(String),
}

#[derive(Debug, Default)]
struct ScopeRecord {
    parent: Option<NamespaceId>,
    scope: String,
    signatures: HashMap<String, Signature>,
    values: HashMap<String, ConstValue>,
    weak: HashSet<String>,
    /// Names deleted in this scope; stops chain lookups.
    tombstones: HashSet<String>,
}

/// Arena of scope records.
#[derive(Debug, Default)]
pub struct NamespaceArena {
    records: Vec<ScopeRecord>,
    derive_cache: HashMap<(usize, String), NamespaceId>,
}

impl NamespaceArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fresh root scope.
    pub fn root(&mut self, scope: impl Into<String>) -> NamespaceId {
        let id = NamespaceId(self.records.len());
        self.records.push(ScopeRecord {
            parent: None,
            scope: scope.into(),
            ..Default::default()
        });
        id
    }

    /// Derives (or re-derives) the child scope of `parent` named `scope`.
    pub fn derive(&mut self, parent: NamespaceId, scope: &str) -> NamespaceId {
        if let Some(&cached) = self.derive_cache.get(&(parent.0, scope.to_string())) {
            return cached;
        }
        let full = format!("{}.{}", self.records[parent.0].scope, scope);
        log::trace!("deriving scope '{full}'");
        let id = NamespaceId(self.records.len());
        self.records.push(ScopeRecord {
            parent: Some(parent),
            scope: full,
            ..Default::default()
        });
        self.derive_cache.insert((parent.0, scope.to_string()), id);
        id
    }

    /// The dotted scope path of a record.
    pub fn scope_name(&self, id: NamespaceId) -> &str {
        &self.records[id.0].scope
    }

    /// Chained signature lookup.
    pub fn lookup(&self, id: NamespaceId, name: &str) -> Option<&Signature> {
        let mut current = Some(id);
        while let Some(id) = current {
            let record = &self.records[id.0];
            if let Some(sig) = record.signatures.get(name) {
                return Some(sig);
            }
            if record.tombstones.contains(name) {
                return None;
            }
            current = record.parent;
        }
        None
    }

    /// Whether `name` resolves anywhere in the chain.
    pub fn contains(&self, id: NamespaceId, name: &str) -> bool {
        self.lookup(id, name).is_some()
    }

    /// Installs `name → sig`, clearing any prior constant value. Fails when
    /// the name already resolves in the effective scope, is not weak, and
    /// `redefine` was not requested.
    pub fn define(
        &mut self,
        id: NamespaceId,
        name: &str,
        sig: Signature,
        redefine: bool,
    ) -> Result<(), NamespaceError> {
        if !redefine && !self.is_weak(id, name) {
            if let Some(existing) = self.lookup(id, name) {
                return Err(NamespaceError::Redefined {
                    name: name.to_string(),
                    existing: existing.typename(),
                });
            }
        }
        let record = &mut self.records[id.0];
        record.values.remove(name);
        record.signatures.insert(name.to_string(), sig);
        record.weak.remove(name);
        record.tombstones.remove(name);
        Ok(())
    }

    /// Marks `name` as redefinable without error.
    pub fn weaken(&mut self, id: NamespaceId, name: &str) {
        self.records[id.0].weak.insert(name.to_string());
    }

    fn is_weak(&self, id: NamespaceId, name: &str) -> bool {
        let mut current = Some(id);
        while let Some(id) = current {
            let record = &self.records[id.0];
            if record.weak.contains(name) {
                return true;
            }
            if record.signatures.contains_key(name) || record.tombstones.contains(name) {
                return false;
            }
            current = record.parent;
        }
        false
    }

    /// Removes the binding, never touching parent scopes.
    pub fn delete(&mut self, id: NamespaceId, name: &str) -> Result<(), NamespaceError> {
        if !self.contains(id, name) && self.value(id, name).is_none() {
            return Err(NamespaceError::NotDefined(name.to_string()));
        }
        let record = &mut self.records[id.0];
        record.signatures.remove(name);
        record.values.remove(name);
        record.weak.remove(name);
        record.tombstones.insert(name.to_string());
        Ok(())
    }

    /// Chained constant-value lookup.
    pub fn value(&self, id: NamespaceId, name: &str) -> Option<&ConstValue> {
        let mut current = Some(id);
        while let Some(id) = current {
            let record = &self.records[id.0];
            if let Some(value) = record.values.get(name) {
                return Some(value);
            }
            if record.tombstones.contains(name) {
                return None;
            }
            current = record.parent;
        }
        None
    }

    /// Records constant-value knowledge locally.
    pub fn set_value(&mut self, id: NamespaceId, name: &str, value: ConstValue) {
        self.records[id.0].values.insert(name.to_string(), value);
    }

    pub fn clear_value(&mut self, id: NamespaceId, name: &str) {
        self.records[id.0].values.remove(name);
    }

    /// A mutable handle on the effective signature of `name`, copying the
    /// parent's entry down into this record first when needed.
    pub fn signature_mut(&mut self, id: NamespaceId, name: &str) -> Option<&mut Signature> {
        if !self.records[id.0].signatures.contains_key(name) {
            let inherited = self.lookup(id, name)?.clone();
            self.records[id.0]
                .signatures
                .insert(name.to_string(), inherited);
        }
        self.records[id.0].signatures.get_mut(name)
    }

    /// The effective (chained, local-first) signature table; module export
    /// merging reads this.
    pub fn flattened_signatures(&self, id: NamespaceId) -> HashMap<String, Signature> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(id) = current {
            chain.push(id);
            current = self.records[id.0].parent;
        }
        let mut out = HashMap::new();
        for id in chain.into_iter().rev() {
            let record = &self.records[id.0];
            for name in &record.tombstones {
                out.remove(name);
            }
            for (name, sig) in &record.signatures {
                out.insert(name.clone(), sig.clone());
            }
        }
        out
    }

    /// Installs an already-checked signature (the `redefine` path callers use
    /// for argument and self bindings).
    pub fn insert(&mut self, id: NamespaceId, name: &str, sig: Signature) {
        let record = &mut self.records[id.0];
        record.values.remove(name);
        record.signatures.insert(name.to_string(), sig);
        record.tombstones.remove(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::{Signature, SignatureKind};

    fn int() -> Signature {
        Signature::builtin(SignatureKind::Int)
    }

    fn string() -> Signature {
        Signature::builtin(SignatureKind::Str)
    }

    #[test]
    fn test_chained_lookup_falls_through() {
        let mut arena = NamespaceArena::new();
        let root = arena.root("<module>");
        arena.define(root, "x", int(), false).unwrap();
        let child = arena.derive(root, "f");
        assert_eq!(arena.lookup(child, "x").unwrap(), &int());
    }

    #[test]
    fn test_redefinition_in_nested_scope_rejected() {
        let mut arena = NamespaceArena::new();
        let root = arena.root("<module>");
        arena.define(root, "x", int(), false).unwrap();
        let child = arena.derive(root, "<block>");
        let err = arena.define(child, "x", string(), false).unwrap_err();
        assert!(matches!(err, NamespaceError::Redefined { .. }));
    }

    #[test]
    fn test_weak_names_are_redefinable_once() {
        let mut arena = NamespaceArena::new();
        let root = arena.root("<module>");
        arena.define(root, "i", int(), false).unwrap();
        arena.weaken(root, "i");
        // weak: redefining succeeds and clears weakness again
        arena.define(root, "i", int(), false).unwrap();
        assert!(arena.define(root, "i", int(), false).is_err());
    }

    #[test]
    fn test_delete_is_local_to_the_child() {
        let mut arena = NamespaceArena::new();
        let root = arena.root("<module>");
        arena.define(root, "x", int(), false).unwrap();
        let child = arena.derive(root, "<block>");
        arena.delete(child, "x").unwrap();
        assert!(arena.lookup(child, "x").is_none());
        assert!(arena.lookup(root, "x").is_some());
        assert!(matches!(
            arena.delete(child, "x"),
            Err(NamespaceError::NotDefined(_))
        ));
    }

    #[test]
    fn test_derive_is_memoized() {
        let mut arena = NamespaceArena::new();
        let root = arena.root("<module>");
        let a = arena.derive(root, "f");
        let b = arena.derive(root, "f");
        assert_eq!(a, b);
        assert_eq!(arena.scope_name(a), "<module>.f");
    }

    #[test]
    fn test_define_clears_prior_value(){
        let mut arena = NamespaceArena::new();
        let root = arena.root("<module>");
        arena.define(root, "x", int(), false).unwrap();
        arena.set_value(root, "x", ConstValue::Known(Value::Int(5)));
        arena.define(root, "x", string(), true).unwrap();
        assert!(arena.value(root, "x").is_none());
    }
}
