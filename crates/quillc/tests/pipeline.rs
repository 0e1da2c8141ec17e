//! End-to-end pipeline tests: tokenize → build → validate → optimize →
//! backend, including file-backed module imports.

use quill_ast::Statement;
use quill_sema::NoImports;
use quill_tokens::lexing::tokenize;
use quill_types::TypeRegistry;
use quillc::{Backend, CompilationError, CompiledModule, FileModuleResolver, Frontend};
use std::fs;
use std::io::Write as _;
use test_log::test;

/// A backend that records the statements it was handed.
#[derive(Default)]
struct RecordingBackend {
    statements: usize,
}

impl Backend for RecordingBackend {
    fn compile(&mut self, module: &CompiledModule) -> Result<Vec<u8>, CompilationError> {
        self.statements = module.root.code.nodes.len();
        Ok(module.root.to_string().into_bytes())
    }
}

#[test]
fn test_pipeline_produces_backend_bytes() {
    let registry = TypeRegistry::standard();
    let frontend = Frontend::new(&registry);
    let groups = tokenize("int double(int x) = x * 2\nint y = double(4)\n").unwrap();
    let mut backend = RecordingBackend::default();
    let bytes = frontend
        .compile(groups, "<main>", &mut NoImports, &mut backend)
        .expect("pipeline should succeed");
    assert_eq!(backend.statements, 2);
    assert!(!bytes.is_empty());
}

#[test]
fn test_pipeline_optimizes_before_handoff() {
    let registry = TypeRegistry::standard();
    let frontend = Frontend::new(&registry);
    let groups = tokenize("int y = 2 + 3 * 4\n").unwrap();
    let module = frontend
        .process(groups, "<main>", &mut NoImports)
        .expect("pipeline should succeed");
    let Statement::VarDef(v) = &module.root.code.nodes[0] else {
        panic!("expected vardef");
    };
    assert_eq!(
        v.value.as_ref().unwrap().as_literal().unwrap().text,
        "14"
    );
}

#[test]
fn test_pipeline_without_optimization_keeps_tree() {
    let registry = TypeRegistry::standard();
    let frontend = Frontend::new(&registry).without_optimization();
    let groups = tokenize("int y = 2 + 3 * 4\n").unwrap();
    let module = frontend
        .process(groups, "<main>", &mut NoImports)
        .expect("pipeline should succeed");
    let Statement::VarDef(v) = &module.root.code.nodes[0] else {
        panic!("expected vardef");
    };
    assert!(v.value.as_ref().unwrap().as_literal().is_none());
}

#[test]
fn test_syntax_errors_render_with_source() {
    let registry = TypeRegistry::standard();
    let frontend = Frontend::new(&registry);
    let source = "int x = 1\nint 5\n";
    let err = frontend
        .process(tokenize(source).unwrap(), "<main>", &mut NoImports)
        .expect_err("expected a syntax error");
    let rendered = err.render_with_source(source);
    assert!(rendered.contains("int 5"));
    assert!(rendered.contains('^'));
}

#[test]
fn test_file_import_of_single_member() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("math.ql"),
        "int double(int x) = x * 2\n",
    )
    .unwrap();

    let registry = TypeRegistry::standard();
    let frontend = Frontend::new(&registry);
    let mut resolver = FileModuleResolver::new(dir.path());
    let groups = tokenize("import math:double\nint y = double(4)\n").unwrap();
    let module = frontend
        .process(groups, "<main>", &mut resolver)
        .expect("import should resolve");
    assert_eq!(module.root.code.nodes.len(), 2);
}

#[test]
fn test_file_import_star_merges_table() {
    let dir = tempfile::tempdir().unwrap();
    let mut file = fs::File::create(dir.path().join("geometry.ql")).unwrap();
    writeln!(file, "int width(int x) = x").unwrap();
    writeln!(file, "int height(int x) = x").unwrap();
    drop(file);

    let registry = TypeRegistry::standard();
    let frontend = Frontend::new(&registry);
    let mut resolver = FileModuleResolver::new(dir.path());
    let groups = tokenize("import geometry:*\nint y = width(1) + height(2)\n").unwrap();
    assert!(frontend.process(groups, "<main>", &mut resolver).is_ok());
}

#[test]
fn test_missing_module_is_a_validation_error() {
    let dir = tempfile::tempdir().unwrap();
    let registry = TypeRegistry::standard();
    let frontend = Frontend::new(&registry);
    let mut resolver = FileModuleResolver::new(dir.path());
    let groups = tokenize("import nowhere:thing\n").unwrap();
    let err = frontend
        .process(groups, "<main>", &mut resolver)
        .expect_err("missing module must fail");
    assert!(err.to_string().contains("error importing 'thing'"));
}

#[test]
fn test_missing_export_is_a_validation_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("math.ql"), "int one() = 1\n").unwrap();

    let registry = TypeRegistry::standard();
    let frontend = Frontend::new(&registry);
    let mut resolver = FileModuleResolver::new(dir.path());
    let groups = tokenize("import math:two\n").unwrap();
    let err = frontend
        .process(groups, "<main>", &mut resolver)
        .expect_err("missing export must fail");
    assert!(err.to_string().contains("no exported name 'two'"));
}

#[test]
fn test_interactive_frontend_accepts_expressions() {
    let registry = TypeRegistry::standard();
    let frontend = Frontend::new(&registry).interactive();
    let groups = tokenize("1 + 2 * 3\n").unwrap();
    let module = frontend
        .process(groups, "<repl>", &mut NoImports)
        .expect("interactive expression should validate");
    let Statement::Expr(expr) = &module.root.code.nodes[0] else {
        panic!("expected expression statement");
    };
    assert_eq!(expr.as_literal().unwrap().text, "7");
}
