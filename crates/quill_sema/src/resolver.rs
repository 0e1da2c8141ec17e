//! The module-import seam.
//!
//! `import` is the one place the front end has I/O side effects; routing it
//! through a trait keeps the validator pure and lets tests substitute a stub
//! resolver. The file-backed implementation lives in the driver crate.

use quill_types::{Signature, TypeRegistry, ValidationError};
use std::collections::HashMap;

/// What an import contributes to the importing namespace.
#[derive(Debug)]
pub enum ModuleExports {
    /// A single exported name.
    Single(String, Signature),
    /// The module's whole exported-signature table (a `*` import).
    All(HashMap<String, Signature>),
}

pub trait ModuleResolver {
    /// Resolves the raw `[namespace:][path/]package:member` spec of an
    /// `import` statement.
    fn resolve(
        &mut self,
        spec: &str,
        registry: &TypeRegistry,
    ) -> Result<ModuleExports, ValidationError>;
}

impl<T: ModuleResolver + ?Sized> ModuleResolver for &mut T {
    fn resolve(
        &mut self,
        spec: &str,
        registry: &TypeRegistry,
    ) -> Result<ModuleExports, ValidationError> {
        (**self).resolve(spec, registry)
    }
}

/// The default resolver: refuses every import with a typed error.
#[derive(Debug, Default)]
pub struct NoImports;

impl ModuleResolver for NoImports {
    fn resolve(
        &mut self,
        spec: &str,
        _registry: &TypeRegistry,
    ) -> Result<ModuleExports, ValidationError> {
        Err(ValidationError::general(
            format!("cannot import '{spec}': no module resolver is configured"),
            None,
        ))
    }
}
