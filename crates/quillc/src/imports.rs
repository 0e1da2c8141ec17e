//! Module import resolution.
//!
//! An import names `[namespace:][path/]package:member`. Resolving it reads
//! the target source file, runs the injected tokenizer and the same
//! build→validate pipeline, and merges either the one exported name or (for
//! `*`) the module's whole exported-signature table into the importing
//! namespace. This is the only place the front end touches the filesystem.

use quill_ast_building::AstBuilder;
use quill_sema::{validate, ModuleExports, ModuleResolver, SemaContext};
use quill_tokens::lexing::LexError;
use quill_tokens::TokenGroup;
use quill_types::{TypeRegistry, ValidationError};
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Source-file extension for quill modules.
pub const SOURCE_EXTENSION: &str = "ql";

/// The default import namespace: plain quill source resolution.
pub const DEFAULT_NAMESPACE: &str = "ql";

/// A parsed import target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    pub namespace: String,
    pub path: String,
    pub package: String,
    pub member: String,
}

impl ImportSpec {
    /// Parses the raw spec text of an `import` statement.
    pub fn parse(raw: &str) -> Option<Self> {
        let pattern = Regex::new(r"^(?:(?:(\w+):)?(?:([\w./]+)/)?([\w.]+):)?([\w*]+)$")
            .expect("import spec pattern is well-formed");
        let captures = pattern.captures(raw)?;
        let member = captures.get(4)?.as_str().to_string();
        let namespace = captures
            .get(1)
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
        let path = captures
            .get(2)
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| ".".to_string());
        let package = captures
            .get(3)
            .map(|m| m.as_str().replace('.', "/"))
            .unwrap_or_else(|| member.clone());
        Some(Self {
            namespace,
            path,
            package,
            member,
        })
    }

    /// The source file this spec resolves to, relative to the search root.
    pub fn file_path(&self) -> PathBuf {
        Path::new(&self.path)
            .join(&self.package)
            .with_extension(SOURCE_EXTENSION)
    }
}

/// Tokenizer injected into the resolver; the front end itself never assumes
/// a lexer.
pub type Tokenizer = fn(&str) -> Result<Vec<TokenGroup>, LexError>;

/// The file-backed resolver: reads `<path>/<package>.ql` under a search root
/// and runs the same build→validate pipeline on it.
#[derive(Clone)]
pub struct FileModuleResolver {
    root: PathBuf,
    tokenizer: Tokenizer,
    builder: AstBuilder,
}

impl FileModuleResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            tokenizer: quill_tokens::lexing::tokenize,
            builder: AstBuilder::new(),
        }
    }

    pub fn with_tokenizer(mut self, tokenizer: Tokenizer) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    fn import_error(spec: &ImportSpec, cause: impl std::fmt::Display) -> ValidationError {
        ValidationError::general(
            format!("error importing '{}': {cause}", spec.member),
            None,
        )
    }
}

impl ModuleResolver for FileModuleResolver {
    fn resolve(
        &mut self,
        raw: &str,
        registry: &TypeRegistry,
    ) -> Result<ModuleExports, ValidationError> {
        let Some(spec) = ImportSpec::parse(raw) else {
            return Err(ValidationError::general(
                format!("malformed import spec '{raw}'"),
                None,
            ));
        };
        if spec.namespace != DEFAULT_NAMESPACE {
            return Err(ValidationError::not_implemented(
                format!("import namespace '{}'", spec.namespace),
                None,
            ));
        }
        let path = self.root.join(spec.file_path());
        debug!("resolving import '{raw}' from {}", path.display());
        let source =
            std::fs::read_to_string(&path).map_err(|e| Self::import_error(&spec, e))?;
        let groups = (self.tokenizer)(&source).map_err(|e| Self::import_error(&spec, e))?;
        let mut root = self
            .builder
            .build(groups, path.display().to_string())
            .map_err(|e| Self::import_error(&spec, e))?;

        // nested imports resolve through a copy of this resolver
        let mut nested = self.clone();
        let mut ctx = SemaContext::new(registry).with_resolver(&mut nested);
        let ns = validate(&mut root, &mut ctx).map_err(|e| Self::import_error(&spec, e))?;

        if spec.member == "*" {
            Ok(ModuleExports::All(ctx.arena.flattened_signatures(ns)))
        } else {
            ctx.arena
                .lookup(ns, &spec.member)
                .cloned()
                .map(|sig| ModuleExports::Single(spec.member.clone(), sig))
                .ok_or_else(|| {
                    Self::import_error(&spec, format!("no exported name '{}'", spec.member))
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_member() {
        let spec = ImportSpec::parse("math").unwrap();
        assert_eq!(spec.namespace, "ql");
        assert_eq!(spec.path, ".");
        assert_eq!(spec.package, "math");
        assert_eq!(spec.member, "math");
    }

    #[test]
    fn test_parse_full_spec() {
        let spec = ImportSpec::parse("sys:lib/vendor/collections.deque:Deque").unwrap();
        assert_eq!(spec.namespace, "sys");
        assert_eq!(spec.path, "lib/vendor");
        assert_eq!(spec.package, "collections/deque");
        assert_eq!(spec.member, "Deque");
    }

    #[test]
    fn test_parse_star_import() {
        let spec = ImportSpec::parse("math:*").unwrap();
        assert_eq!(spec.package, "math");
        assert_eq!(spec.member, "*");
        assert_eq!(spec.file_path(), PathBuf::from("./math.ql"));
    }

    #[test]
    fn test_malformed_spec_rejected() {
        assert!(ImportSpec::parse("a b").is_none());
        assert!(ImportSpec::parse("").is_none());
    }
}
