//! Builder integration tests: whole programs through the group driver.

use quill_ast::{Atom, Expr, Root, Statement};
use quill_ast_building::{AstBuilder, SyntaxError, SyntaxErrorKind};
use quill_tokens::lexing::tokenize;
use test_log::test;

fn parse(src: &str) -> Root {
    AstBuilder::new()
        .build(tokenize(src).unwrap(), "<test>")
        .unwrap_or_else(|e| panic!("parse failed for {src:?}: {e}"))
}

fn parse_err(src: &str) -> SyntaxError {
    AstBuilder::new()
        .build(tokenize(src).unwrap(), "<test>")
        .expect_err("expected a syntax error")
}

#[test]
fn test_vardef_statement() {
    let root = parse("const int x = 5\n");
    assert_eq!(root.code.nodes.len(), 1);
    match &root.code.nodes[0] {
        Statement::VarDef(v) => {
            assert_eq!(v.ty.to_string(), "const int");
            assert_eq!(v.name.name, "x");
        }
        other => panic!("expected vardef, got {other:?}"),
    }
    assert_eq!(root.to_string(), "const int x = 5");
}

#[test]
fn test_operator_precedence() {
    let root = parse("y = 1 + 2 * 3\n");
    let Statement::Assignment(assignment) = &root.code.nodes[0] else {
        panic!("expected assignment");
    };
    let Expr::Binary(plus) = &assignment.value else {
        panic!("expected binary root, got {:?}", assignment.value);
    };
    assert_eq!(plus.operator.op, "+");
    let Expr::Binary(times) = &*plus.rvalue else {
        panic!("multiplication must group under addition");
    };
    assert_eq!(times.operator.op, "*");
}

#[test]
fn test_power_groups_consistently() {
    // every tier splits at its last operator, so chains associate one way
    // and reprinting preserves the grouping
    let root = parse("y = 2 ** 3 ** 2\n");
    let Statement::Assignment(assignment) = &root.code.nodes[0] else {
        panic!("expected assignment");
    };
    let Expr::Binary(outer) = &assignment.value else {
        panic!("expected binary root");
    };
    assert_eq!(outer.operator.op, "**");
    assert!(matches!(&*outer.lvalue, Expr::Binary(_)));
    let printed = root.to_string();
    assert_eq!(parse(&printed).to_string(), printed);
}

#[test]
fn test_parenthesized_grouping_survives() {
    let root = parse("y = (1 + 2) * 3\n");
    let Statement::Assignment(assignment) = &root.code.nodes[0] else {
        panic!("expected assignment");
    };
    let Expr::Binary(times) = &assignment.value else {
        panic!("expected binary root");
    };
    assert_eq!(times.operator.op, "*");
    assert!(matches!(&*times.lvalue, Expr::Binary(_)));
    assert_eq!(root.to_string(), "y = (1 + 2) * 3");
}

#[test]
fn test_block_spans_groups() {
    let root = parse("if x {\n\ty = 1\n\tz = 2\n}\n");
    let Statement::Conditional(cond) = &root.code.nodes[0] else {
        panic!("expected conditional");
    };
    assert!(cond.code.braced);
    assert_eq!(cond.code.code.nodes.len(), 2);
}

#[test]
fn test_nested_blocks() {
    let root = parse("while a {\n\tif b {\n\t\tf()\n\t}\n\tg()\n}\n");
    let Statement::WhileLoop(w) = &root.code.nodes[0] else {
        panic!("expected while loop");
    };
    assert_eq!(w.code.code.nodes.len(), 2);
    let Statement::Conditional(inner) = &w.code.code.nodes[0] else {
        panic!("expected nested conditional");
    };
    assert_eq!(inner.code.code.nodes.len(), 1);
}

#[test]
fn test_single_line_block() {
    // the remainder after `{` is re-queued, with the trailing `}` split off
    let root = parse("if a { f() }\n");
    let Statement::Conditional(cond) = &root.code.nodes[0] else {
        panic!("expected conditional");
    };
    assert_eq!(cond.code.code.nodes.len(), 1);
    assert!(matches!(cond.code.code.nodes[0], Statement::Call(_)));
}

#[test]
fn test_inline_expression_block() {
    let root = parse("if a f()\n");
    let Statement::Conditional(cond) = &root.code.nodes[0] else {
        panic!("expected conditional");
    };
    assert!(!cond.code.braced);
}

#[test]
fn test_else_clause_after_close() {
    let root = parse("if a {\n\tf()\n} else {\n\tg()\n}\n");
    assert_eq!(root.code.nodes.len(), 2);
    assert!(matches!(root.code.nodes[0], Statement::Conditional(_)));
    assert!(matches!(root.code.nodes[1], Statement::ElseClause(_)));
}

#[test]
fn test_funcdef_expression_form() {
    let root = parse("int double(int x) = x * 2\n");
    let Statement::FuncDef(f) = &root.code.nodes[0] else {
        panic!("expected funcdef");
    };
    assert_eq!(f.argdefs.len(), 1);
    assert_eq!(f.code.nodes.len(), 1);
    let Statement::KeywordExpr(ret) = &f.code.nodes[0] else {
        panic!("expression body must desugar to a return");
    };
    assert_eq!(ret.keyword.word, "return");
}

#[test]
fn test_funcdef_block_form() {
    let root = parse("int f(int a, int b = 0) {\n\treturn a + b\n}\n");
    let Statement::FuncDef(f) = &root.code.nodes[0] else {
        panic!("expected funcdef");
    };
    assert_eq!(f.name.name, "f");
    assert_eq!(f.argdefs.len(), 2);
    assert!(f.argdefs[1].value.is_some());
    assert_eq!(f.code.name, "f");
}

#[test]
fn test_default_argument_ordering_enforced() {
    let err = parse_err("int f(int a = 1, int b) {\n}\n");
    assert!(err.to_string().contains("syntax error"));
}

#[test]
fn test_classdef_with_constructor() {
    let root = parse("class Point {\n\tint x\n\tconstr (int x) {\n\t}\n}\n");
    let Statement::ClassDef(c) = &root.code.nodes[0] else {
        panic!("expected classdef");
    };
    assert_eq!(c.name.name, "Point");
    assert_eq!(c.code.nodes.len(), 2);
    assert!(matches!(c.code.nodes[1], Statement::KeywordDef(_)));
}

#[test]
fn test_lambda_desugars_to_return() {
    // a binary-expression body would be split at the operator before the
    // lambda is tried, so the body here is a plain value
    let root = parse("auto g = (int x) -> int = x\n");
    let Statement::VarDef(v) = &root.code.nodes[0] else {
        panic!("expected vardef");
    };
    let Some(Expr::Value(value)) = &v.value else {
        panic!("expected value expression");
    };
    let Atom::Lambda(lambda) = &value.value else {
        panic!("expected lambda, got {:?}", value.value);
    };
    assert_eq!(lambda.code.nodes.len(), 1);
    let Statement::KeywordExpr(ret) = &lambda.code.nodes[0] else {
        panic!("lambda body must be an implicit return");
    };
    assert_eq!(ret.keyword.word, "return");
}

#[test]
fn test_import_joins_all_tokens() {
    let root = parse("import std/collections.deque:Deque\n");
    let Statement::KeywordExpr(kw) = &root.code.nodes[0] else {
        panic!("expected keyword expr");
    };
    let target = kw.value.as_ref().and_then(Expr::as_identifier).unwrap();
    assert_eq!(target.name, "std/collections.deque:Deque");
}

#[test]
fn test_call_with_star_and_keyword_arguments() {
    let root = parse("f(1, *rest, key=2, **options)\n");
    let Statement::Call(call) = &root.code.nodes[0] else {
        panic!("expected call");
    };
    assert_eq!(call.args.args.len(), 1);
    assert_eq!(call.args.star_args.len(), 1);
    assert_eq!(call.kwargs.kwargs.len(), 1);
    assert_eq!(call.kwargs.star_kwargs.len(), 1);
}

#[test]
fn test_unpack_assignment() {
    let root = parse("a, b = (1, 2)\n");
    let Statement::UnpackAssignment(u) = &root.code.nodes[0] else {
        panic!("expected unpack assignment");
    };
    assert_eq!(u.names.len(), 2);
}

#[test]
fn test_comment_only_group_is_skipped() {
    let root = parse("# leading comment\n\nint x = 1\n");
    assert_eq!(root.code.nodes.len(), 1);
}

#[test]
fn test_error_aggregation_unions_candidates() {
    let err = parse_err("int 5\n");
    match err.kind {
        SyntaxErrorKind::MultiExpected { expected, .. } => {
            assert!(expected.len() > 1, "expected several reasons: {expected:?}");
            let joined = expected.join("; ");
            assert!(joined.contains("for"), "labels candidates: {joined}");
        }
        other => panic!("expected aggregated error, got {other:?}"),
    }
}

#[test]
fn test_unclosed_block_is_an_error() {
    let err = parse_err("if a {\n\tf()\n");
    assert!(matches!(err.kind, SyntaxErrorKind::UnclosedBlock));
}

#[test]
fn test_stray_close_brace_is_an_error() {
    assert!(AstBuilder::new()
        .build(tokenize("}\n").unwrap(), "<test>")
        .is_err());
}

#[test]
fn test_interactive_mode_admits_expressions() {
    let groups = tokenize("1 + 2\n").unwrap();
    assert!(AstBuilder::new().build(groups.clone(), "<repl>").is_err());
    let root = AstBuilder::new()
        .interactive(true)
        .build(groups, "<repl>")
        .unwrap();
    assert!(matches!(root.code.nodes[0], Statement::Expr(_)));
}

#[test]
fn test_depth_cap_rejects_pathological_nesting() {
    let mut src = String::from("y = ");
    for _ in 0..400 {
        src.push('(');
    }
    src.push('1');
    for _ in 0..400 {
        src.push(')');
    }
    src.push('\n');
    assert!(AstBuilder::new()
        .build(tokenize(&src).unwrap(), "<test>")
        .is_err());
}

#[test]
fn test_reparse_is_idempotent() {
    let sources = [
        "const int x = 5\n",
        "y = 1 + 2 * 3\n",
        "y = (1 + 2) * 3\n",
        "int f(int a, int b = 0) {\n\treturn a + b\n}\n",
        "if a {\n\tf()\n} else {\n\tg()\n}\n",
        "for i in xs {\n\tprint(i)\n}\n",
        "while x < 10 {\n\tx += 1\n}\n",
        "xs = [int: 1, 2, 3]\n",
        "t = (1, \"two\")\n",
        "v = xs[1:2]\n",
        "delete x\n",
        "return -x\n",
    ];
    for src in sources {
        let first = parse(src).to_string();
        let second = parse(&first).to_string();
        assert_eq!(first, second, "round trip diverged for {src:?}");
    }
}
