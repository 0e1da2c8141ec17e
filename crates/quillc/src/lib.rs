//! The quill front-end driver.
//!
//! Wires the builder, validator and optimizer into one pipeline and defines
//! the narrow contract code-generation backends consume: a validated (and
//! optionally optimized) tree plus the root namespace it was validated in.

pub mod imports;

pub use imports::{FileModuleResolver, ImportSpec};

use quill_ast::Root;
use quill_ast_building::{AstBuilder, SyntaxError};
use quill_sema::{optimize, validate, ModuleResolver, SemaContext};
use quill_tokens::{Span, TokenGroup};
use quill_types::{NamespaceArena, NamespaceId, TypeRegistry, ValidationError};
use std::error::Error as StdError;
use thiserror::Error;
use tracing::debug;

/// A front-end failure: either build-phase or validation-phase.
#[derive(Debug, Error)]
pub enum FrontendError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl FrontendError {
    /// Renders the error with a caret-annotated excerpt out of the caller's
    /// source text.
    pub fn render_with_source(&self, source: &str) -> String {
        match self {
            FrontendError::Syntax(e) => e.render_with_source(source),
            FrontendError::Validation(e) => e.render_with_source(source),
        }
    }
}

/// A backend failure, carrying the offending position and the causing chain.
#[derive(Debug)]
pub struct CompilationError {
    pub message: String,
    pub span: Option<Span>,
    pub cause: Option<Box<dyn StdError + Send + Sync>>,
}

impl CompilationError {
    pub fn new(message: impl Into<String>, span: impl Into<Option<Span>>) -> Self {
        Self {
            message: message.into(),
            span: span.into(),
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: impl StdError + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

impl std::fmt::Display for CompilationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "compilation error: {}", self.message)?;
        if let Some(span) = &self.span {
            write!(f, " at line {}, column {}", span.line, span.column)?;
        }
        Ok(())
    }
}

impl StdError for CompilationError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn StdError + 'static))
    }
}

/// Any failure of the full compile pipeline.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Frontend(#[from] FrontendError),
    #[error(transparent)]
    Compilation(#[from] CompilationError),
}

/// The validated module handed to backends. Every node reachable from `root`
/// has passed validation, and `optimized_out`-flagged nodes are already
/// pruned when optimization ran.
#[derive(Debug)]
pub struct CompiledModule {
    pub root: Root,
    pub namespace: NamespaceId,
    pub arena: NamespaceArena,
    pub source_name: String,
}

/// A code-generation backend.
pub trait Backend {
    fn compile(&mut self, module: &CompiledModule) -> Result<Vec<u8>, CompilationError>;
}

/// The front-end pipeline: build → validate → optimize → re-validate.
pub struct Frontend<'r> {
    registry: &'r TypeRegistry,
    builder: AstBuilder,
    optimize: bool,
}

impl<'r> Frontend<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self {
            registry,
            builder: AstBuilder::new(),
            optimize: true,
        }
    }

    /// Disables the optimization pass.
    pub fn without_optimization(mut self) -> Self {
        self.optimize = false;
        self
    }

    /// An interactive front end admits bare expression statements.
    pub fn interactive(mut self) -> Self {
        self.builder = self.builder.clone().interactive(true);
        self
    }

    /// Runs the pipeline over pre-tokenized groups.
    pub fn process(
        &self,
        groups: Vec<TokenGroup>,
        source_name: &str,
        resolver: &mut dyn ModuleResolver,
    ) -> Result<CompiledModule, FrontendError> {
        let mut root = self.builder.build(groups, source_name)?;
        debug!("built {} top-level statements", root.code.nodes.len());

        let mut ctx = SemaContext::new(self.registry).with_resolver(&mut *resolver);
        let ns = validate(&mut root, &mut ctx)?;
        if !self.optimize {
            return Ok(CompiledModule {
                root,
                namespace: ns,
                arena: ctx.arena,
                source_name: source_name.to_string(),
            });
        }
        optimize(&mut root, ns, &mut ctx);
        drop(ctx);

        // the optimized tree is validated again; the backend receives the
        // namespace of that final pass
        let mut ctx = SemaContext::new(self.registry).with_resolver(&mut *resolver);
        let namespace = validate(&mut root, &mut ctx)?;
        Ok(CompiledModule {
            root,
            namespace,
            arena: ctx.arena,
            source_name: source_name.to_string(),
        })
    }

    /// Full compile: front end plus one backend.
    pub fn compile(
        &self,
        groups: Vec<TokenGroup>,
        source_name: &str,
        resolver: &mut dyn ModuleResolver,
        backend: &mut dyn Backend,
    ) -> Result<Vec<u8>, CompileError> {
        let module = self.process(groups, source_name, resolver)?;
        Ok(backend.compile(&module)?)
    }
}
