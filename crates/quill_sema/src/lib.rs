//! Semantic analysis: the validator and optimizer walks.
//!
//! Both walks share a [`SemaContext`]: the injected builtin registry, the
//! namespace arena (memoized scope derivation keeps the two walks
//! referentially consistent), warning settings, and the module resolver the
//! `import` keyword goes through.

pub mod optimize;
pub mod resolver;
pub mod validate;

pub use optimize::optimize;
pub use resolver::{ModuleExports, ModuleResolver, NoImports};
pub use validate::validate;

use quill_tokens::Span;
use quill_types::infer::TypeEnv;
use quill_types::{NamespaceArena, TypeRegistry};
use std::collections::{HashMap, HashSet};

/// Warning-class toggles. Everything is enabled unless disabled explicitly.
#[derive(Debug, Default, Clone)]
pub struct WarningSettings {
    disabled: HashMap<String, bool>,
}

impl WarningSettings {
    pub fn disable(&mut self, class: impl Into<String>) {
        self.disabled.insert(class.into(), true);
    }

    pub fn enabled(&self, class: &str) -> bool {
        !self.disabled.get(class).copied().unwrap_or(false)
    }
}

/// Shared state of the validate/optimize walks.
pub struct SemaContext<'a> {
    pub arena: NamespaceArena,
    pub registry: &'a TypeRegistry,
    pub warnings: WarningSettings,
    pub resolver: Box<dyn ModuleResolver + 'a>,
    warned_sites: HashSet<(usize, usize, &'static str)>,
}

impl<'a> SemaContext<'a> {
    pub fn new(registry: &'a TypeRegistry) -> Self {
        Self {
            arena: NamespaceArena::new(),
            registry,
            warnings: WarningSettings::default(),
            resolver: Box::new(NoImports),
            warned_sites: HashSet::new(),
        }
    }

    pub fn with_resolver(mut self, resolver: impl ModuleResolver + 'a) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub(crate) fn env(&self) -> TypeEnv<'_> {
        TypeEnv {
            arena: &self.arena,
            registry: self.registry,
        }
    }

    /// Emits a non-fatal warning, once per distinct site and class.
    pub(crate) fn warn(&mut self, class: &'static str, span: Span, message: impl AsRef<str>) {
        if !self.warnings.enabled(class) {
            return;
        }
        if self.warned_sites.insert((span.line, span.column, class)) {
            log::warn!(
                "{} ({class}) at line {}, column {}",
                message.as_ref(),
                span.line,
                span.column
            );
        }
    }
}
