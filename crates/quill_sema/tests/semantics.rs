//! Validator and optimizer integration tests over built trees.

use quill_ast::{Expr, Root, Statement};
use quill_ast_building::AstBuilder;
use quill_sema::{optimize, validate, ModuleExports, ModuleResolver, SemaContext};
use quill_tokens::lexing::tokenize;
use quill_types::{
    NamespaceId, Signature, TypeRegistry, ValidationError, ValidationErrorKind,
};
use test_log::test;

fn parse(src: &str) -> Root {
    AstBuilder::new()
        .build(tokenize(src).unwrap(), "<test>")
        .unwrap_or_else(|e| panic!("parse failed for {src:?}: {e}"))
}

fn check(src: &str) -> Result<(Root, SemaContext<'static>, NamespaceId), ValidationError> {
    let registry = Box::leak(Box::new(TypeRegistry::standard()));
    let mut root = parse(src);
    let mut ctx = SemaContext::new(registry);
    let ns = validate(&mut root, &mut ctx)?;
    Ok((root, ctx, ns))
}

fn check_err(src: &str) -> ValidationError {
    check(src).err().expect("expected a validation error")
}

fn optimized(src: &str) -> Root {
    let (mut root, mut ctx, ns) = check(src).expect("validation should pass");
    optimize(&mut root, ns, &mut ctx);
    root
}

#[test]
fn test_undefined_identifier_rejected() {
    let err = check_err("int y = x + 1\n");
    assert!(matches!(err.kind, ValidationErrorKind::NotDefined(ref n) if n == "x"));
}

#[test]
fn test_vardef_type_mismatch_rejected() {
    let err = check_err("int x = \"five\"\n");
    assert!(err.to_string().contains("of type 'str'"));
}

#[test]
fn test_assignment_to_const_rejected() {
    let err = check_err("const int x = 5\nx = 6\n");
    assert!(err.to_string().contains("assignment to const"));
}

#[test]
fn test_nested_shadowing_rejected() {
    let err = check_err("int x = 1\nif true {\n\tfloat x = 2.0\n}\n");
    assert!(matches!(err.kind, ValidationErrorKind::Redefined { ref name, .. } if name == "x"));
}

#[test]
fn test_loop_variable_is_weak() {
    let src =
        "for i in [int: 1, 2] {\n\tprint(i)\n}\nfor i in [int: 1, 2] {\n\tprint(i)\n}\n";
    assert!(check(src).is_ok());
}

#[test]
fn test_overloads_by_shape() {
    // distinct parameter shapes coexist
    assert!(check("int f(int x) = x\nstr f(str s) = s\nint y = f(1)\nstr z = f(\"a\")\n").is_ok());
    // an identical shape is a redefinition even with different names
    let err = check_err("int f(int x) = x\nint f(int y) = y\n");
    assert!(matches!(err.kind, ValidationErrorKind::Redefined { ref name, .. } if name == "f"));
}

#[test]
fn test_call_matching_with_optional_parameter() {
    assert!(check("int f(int a, int b = 0) = a\nint y = f(1)\n").is_ok());
    assert!(check("int f(int a, int b = 0) = a\nint y = f(1, 2)\n").is_ok());
    let err = check_err("int f(int a, int b = 0) = a\nint y = f(1, 2, 3)\n");
    assert!(err.to_string().contains("don't match"));
}

#[test]
fn test_keyword_argument_binding() {
    assert!(check("int f(int a, int b = 0) = a\nint y = f(1, b=2)\n").is_ok());
}

#[test]
fn test_calling_a_non_callable_rejected() {
    let err = check_err("int x = 1\nx(2)\n");
    assert!(err.to_string().contains("is not callable"));
}

#[test]
fn test_auto_return_type_is_inferred() {
    let (root, _, _) = check("auto f(int x) = x\nint y = f(1)\n").unwrap();
    let Statement::FuncDef(f) = &root.code.nodes[0] else {
        panic!("expected funcdef");
    };
    // the placeholder is resolved in the tree itself
    assert_eq!(f.ty.name.name, "int");
}

#[test]
fn test_return_type_mismatch_rejected() {
    let err = check_err("int f() {\n\treturn \"s\"\n}\n");
    assert!(err.to_string().contains("return type"));
}

#[test]
fn test_conflicting_returns_are_not_implemented() {
    let err = check_err("auto f(int x) {\n\treturn 1\n\treturn \"s\"\n}\n");
    assert!(matches!(err.kind, ValidationErrorKind::NotImplemented(_)));
}

#[test]
fn test_unpack_assignment_checks_arity_and_types() {
    assert!(check("int a = 0\nint b = 0\na, b = (1, 2)\n").is_ok());
    let err = check_err("int a = 0\nint b = 0\na, b = (1, \"x\")\n");
    assert!(err.to_string().contains("unpacking"));
}

#[test]
fn test_list_element_types_checked() {
    let err = check_err("auto xs = [int: 1, \"two\"]\n");
    assert!(err.to_string().contains("does not match list type"));
}

#[test]
fn test_operator_capability_missing() {
    let err = check_err("str s = \"a\"\nint y = 1 + s\n");
    assert!(err.to_string().contains("does not support"));
}

#[test]
fn test_delete_removes_binding() {
    let err = check_err("int x = 1\ndelete x\nint y = x\n");
    assert!(matches!(err.kind, ValidationErrorKind::NotDefined(ref n) if n == "x"));
    let err = check_err("delete z\n");
    assert!(matches!(err.kind, ValidationErrorKind::NotDefined(ref n) if n == "z"));
}

#[test]
fn test_slice_subscripts_not_implemented() {
    let err = check_err("str s = \"abc\"\nauto t = s[0:2]\n");
    assert!(matches!(err.kind, ValidationErrorKind::NotImplemented(_)));
}

#[test]
fn test_class_registers_constructors() {
    let src = "class Point {\n\tconstr (int x) {\n\t}\n\tconstr (str s) {\n\t}\n}\nPoint p = Point(1)\nPoint q = Point(\"a\")\n";
    assert!(check(src).is_ok());
    let err = check_err("class Point {\n\tconstr (int x) {\n\t}\n\tconstr (int y) {\n\t}\n}\n");
    assert!(matches!(err.kind, ValidationErrorKind::Redefined { .. }));
}

#[test]
fn test_class_attribute_access() {
    let src = "class Point {\n\tint x\n\tconstr (int x) {\n\t}\n}\nPoint p = Point(1)\nint y = p.x\n";
    assert!(check(src).is_ok());
    let err = check_err(
        "class Point {\n\tconstr (int x) {\n\t}\n}\nPoint p = Point(1)\nint y = p.missing\n",
    );
    assert!(err.to_string().contains("does not support attribute"));
}

struct StubResolver;

impl ModuleResolver for StubResolver {
    fn resolve(
        &mut self,
        spec: &str,
        _registry: &TypeRegistry,
    ) -> Result<ModuleExports, ValidationError> {
        assert_eq!(spec, "answer");
        Ok(ModuleExports::Single("answer".to_string(), Signature::int()))
    }
}

#[test]
fn test_import_merges_resolved_export() {
    let registry = TypeRegistry::standard();
    let mut root = parse("import answer\nint y = answer\n");
    let mut ctx = SemaContext::new(&registry).with_resolver(StubResolver);
    assert!(validate(&mut root, &mut ctx).is_ok());
}

#[test]
fn test_import_without_resolver_fails() {
    let err = check_err("import answer\n");
    assert!(err.to_string().contains("no module resolver"));
}

#[test]
fn test_constant_folding_to_single_literal() {
    let root = optimized("int y = 2 + 3 * 4\n");
    let Statement::VarDef(v) = &root.code.nodes[0] else {
        panic!("expected vardef");
    };
    let value = v.value.as_ref().unwrap();
    let literal = value.as_literal().expect("folded to a literal");
    assert_eq!(literal.text, "14");
    assert!(literal.meta.flags.folded);
}

#[test]
fn test_power_of_two_strength_reduction() {
    // known non-negative exponent: rewritten to a shift, then folded
    let root = optimized("const int e = 3\nint y = 2 ** e\n");
    let Statement::VarDef(v) = &root.code.nodes[1] else {
        panic!("expected vardef");
    };
    assert_eq!(v.value.as_ref().unwrap().as_literal().unwrap().text, "8");

    // unknown exponent: left unmodified
    let root = optimized("int n = 5\nint y = 2 ** n\n");
    let Statement::VarDef(v) = &root.code.nodes[1] else {
        panic!("expected vardef");
    };
    let Some(Expr::Binary(binary)) = &v.value else {
        panic!("expected binary to survive");
    };
    assert_eq!(binary.operator.op, "**");
}

#[test]
fn test_known_identifier_substitution() {
    let root = optimized("const int k = 2\nint y = k + 1\n");
    let Statement::VarDef(v) = &root.code.nodes[1] else {
        panic!("expected vardef");
    };
    assert_eq!(v.value.as_ref().unwrap().as_literal().unwrap().text, "3");
}

#[test]
fn test_reassigned_name_blocks_folding() {
    let root = optimized("int x = 5\nx = 6\nint y = x + 1\n");
    let Statement::VarDef(v) = &root.code.nodes[2] else {
        panic!("expected vardef");
    };
    assert!(v.value.as_ref().unwrap().as_literal().is_none());
}

#[test]
fn test_double_negation_collapses() {
    let root = optimized("int n = 5\nint y = - -n\n");
    let Statement::VarDef(v) = &root.code.nodes[1] else {
        panic!("expected vardef");
    };
    let identifier = v
        .value
        .as_ref()
        .unwrap()
        .as_identifier()
        .expect("collapsed to the operand");
    assert_eq!(identifier.name, "n");
}

#[test]
fn test_dead_branches_spliced_out() {
    let root = optimized("while false {\n\tprint(1)\n}\nprint(2)\n");
    assert_eq!(root.code.nodes.len(), 1);

    let root = optimized("if false {\n\tprint(1)\n}\nprint(2)\n");
    assert_eq!(root.code.nodes.len(), 1);

    // an if followed by an else stays: pairing is adjacency-based
    let root = optimized("if false {\n\tprint(1)\n} else {\n\tprint(2)\n}\n");
    assert_eq!(root.code.nodes.len(), 2);
}

#[test]
fn test_function_bodies_fold_through_memoized_scopes() {
    let root = optimized("int f() {\n\tconst int k = 2\n\treturn k + k\n}\n");
    let Statement::FuncDef(f) = &root.code.nodes[0] else {
        panic!("expected funcdef");
    };
    let Statement::KeywordExpr(ret) = &f.code.nodes[1] else {
        panic!("expected return");
    };
    let literal = ret.value.as_ref().unwrap().as_literal().unwrap();
    assert_eq!(literal.text, "4");
}
