//! The optimization walk: constant folding, algebraic rewriting and
//! dead-code elimination.
//!
//! Post-order, in-place. Nodes whose children are statically known fold to
//! literal nodes; `optimized_out`-flagged statements are spliced out of their
//! parent's child list. Scope re-derivation goes through the memoized arena,
//! so the value knowledge recorded during validation is visible here.

use crate::validate::eval_static;
use crate::SemaContext;
use quill_ast::*;
use quill_types::infer::const_value_of;
use quill_types::{ConstValue, NamespaceId, Value};

/// Optimizes the tree in place against the namespace validation produced.
pub fn optimize(root: &mut Root, ns: NamespaceId, ctx: &mut SemaContext) {
    optimize_code(ctx, ns, &mut root.code);
}

fn optimize_code(ctx: &mut SemaContext, ns: NamespaceId, code: &mut CodeBlock) {
    let mut i = 0;
    while i < code.nodes.len() {
        optimize_stmt(ctx, ns, &mut code.nodes[i]);
        mark_dead(ctx, ns, &mut code.nodes, i);
        if code.nodes[i].meta().flags.optimized_out {
            code.nodes.remove(i);
        } else {
            i += 1;
        }
    }
}

/// Flags constant-false loops and branches for removal. An `if` is only
/// dropped when no `else` clause follows it, since else-pairing is
/// adjacency-based.
fn mark_dead(ctx: &SemaContext, ns: NamespaceId, nodes: &mut [Statement], i: usize) {
    let next_is_else = nodes
        .get(i + 1)
        .is_some_and(|s| matches!(s, Statement::ElseClause(_)));
    let dead = match &nodes[i] {
        Statement::WhileLoop(w) => {
            const_value_of(ctx.env(), ns, &w.condition) == Some(Value::Bool(false))
        }
        Statement::Conditional(c) => {
            !next_is_else
                && const_value_of(ctx.env(), ns, &c.condition) == Some(Value::Bool(false))
        }
        _ => false,
    };
    if dead {
        nodes[i].meta_mut().flags.optimized_out = true;
    }
}

fn optimize_stmt(ctx: &mut SemaContext, ns: NamespaceId, stmt: &mut Statement) {
    match stmt {
        Statement::VarDef(v) => {
            if let Some(value) = &mut v.value {
                optimize_expr(ctx, ns, value);
            }
        }
        Statement::Assignment(a) => optimize_expr(ctx, ns, &mut a.value),
        Statement::UnpackAssignment(u) => optimize_expr(ctx, ns, &mut u.value),
        Statement::AttrSet(s) => optimize_expr(ctx, ns, &mut s.assignment.value),
        Statement::Call(call) => optimize_call(ctx, ns, call),
        Statement::KeywordExpr(k) => {
            if let Some(value) = &mut k.value {
                optimize_expr(ctx, ns, value);
            }
        }
        Statement::FuncDef(f) => {
            let code_ns = ctx.arena.derive(ns, &f.code.name);
            optimize_code(ctx, code_ns, &mut f.code);
        }
        Statement::KeywordDef(k) => {
            let code_ns = ctx.arena.derive(ns, &k.code.name);
            optimize_code(ctx, code_ns, &mut k.code);
        }
        Statement::ClassDef(c) => {
            let code_ns = ctx.arena.derive(ns, &c.code.name);
            optimize_code(ctx, code_ns, &mut c.code);
        }
        Statement::Conditional(c) => {
            optimize_expr(ctx, ns, &mut c.condition);
            optimize_block(ctx, ns, &mut c.code);
        }
        Statement::WhileLoop(w) => {
            optimize_expr(ctx, ns, &mut w.condition);
            optimize_block(ctx, ns, &mut w.code);
        }
        Statement::ForLoop(f) => {
            optimize_expr(ctx, ns, &mut f.iterable);
            optimize_block(ctx, ns, &mut f.code);
        }
        Statement::ElseClause(e) => optimize_block(ctx, ns, &mut e.code),
        Statement::Expr(e) => optimize_expr(ctx, ns, e),
    }
}

fn optimize_block(ctx: &mut SemaContext, ns: NamespaceId, block: &mut Block) {
    let block_ns = ctx.arena.derive(ns, "<block>");
    optimize_code(ctx, block_ns, &mut block.code);
}

fn optimize_call(ctx: &mut SemaContext, ns: NamespaceId, call: &mut CallExpr) {
    optimize_expr(ctx, ns, &mut call.callable);
    for arg in call.args.args.iter_mut().chain(&mut call.args.star_args) {
        optimize_expr(ctx, ns, arg);
    }
    for (_, value) in &mut call.kwargs.kwargs {
        optimize_expr(ctx, ns, value);
    }
    for arg in &mut call.kwargs.star_kwargs {
        optimize_expr(ctx, ns, arg);
    }
}

/// A literal expression carrying a folded value.
fn folded_literal(value: &Value, at: NodeMeta) -> Expr {
    let mut meta = at;
    meta.flags.folded = true;
    Expr::Value(ValueExpr {
        value: Atom::Literal(LiteralNode::new(value.repr(), meta)),
        meta,
    })
}

fn optimize_expr(ctx: &mut SemaContext, ns: NamespaceId, expr: &mut Expr) {
    // children first
    match expr {
        Expr::Value(value) => optimize_atom(ctx, ns, &mut value.value),
        Expr::Unary(unary) => optimize_expr(ctx, ns, &mut unary.value),
        Expr::Binary(binary) => {
            optimize_expr(ctx, ns, &mut binary.lvalue);
            optimize_expr(ctx, ns, &mut binary.rvalue);
        }
    }

    // double unary-negation collapses to its operand
    let collapsed = match expr {
        Expr::Unary(outer) if outer.operator.op == "-" => match &mut *outer.value {
            Expr::Unary(inner) if inner.operator.op == "-" => {
                let placeholder = Expr::Value(ValueExpr {
                    value: Atom::Literal(LiteralNode::new("0", inner.meta)),
                    meta: inner.meta,
                });
                Some(std::mem::replace(&mut *inner.value, placeholder))
            }
            _ => None,
        },
        _ => None,
    };
    if let Some(operand) = collapsed {
        *expr = operand;
        return;
    }

    // 2 ** e rewrites to 1 << e when the exponent is statically a
    // non-negative integer
    if let Expr::Binary(binary) = &mut *expr {
        if binary.operator.op == "**" {
            let base = const_value_of(ctx.env(), ns, &binary.lvalue);
            let exponent = const_value_of(ctx.env(), ns, &binary.rvalue)
                .as_ref()
                .and_then(Value::as_int);
            if base == Some(Value::Int(2)) && exponent.is_some_and(|e| e >= 0) {
                binary.operator.op = "<<".to_string();
                *binary.lvalue = folded_literal(&Value::Int(1), *binary.lvalue.meta());
            }
        }
    }

    // constant folding
    let foldable = match &*expr {
        Expr::Unary(_) => true,
        Expr::Binary(binary) => binary.operator.op != "to",
        Expr::Value(_) => false,
    };
    if foldable {
        if let Some(value) = eval_static(ctx.env(), ns, expr) {
            *expr = folded_literal(&value, *expr.meta());
        }
    }
}

fn optimize_atom(ctx: &mut SemaContext, ns: NamespaceId, atom: &mut Atom) {
    match atom {
        Atom::Identifier(identifier) => {
            // substitute identifiers whose value is statically known
            if let Some(ConstValue::Known(value)) = ctx.arena.value(ns, &identifier.name) {
                let value = value.clone();
                let meta = identifier.meta;
                *atom = Atom::Literal(LiteralNode::new(value.repr(), {
                    let mut m = meta;
                    m.flags.folded = true;
                    m
                }));
            }
        }
        Atom::Call(call) => optimize_call(ctx, ns, call),
        Atom::List(list) => {
            for value in &mut list.values {
                optimize_expr(ctx, ns, value);
            }
        }
        Atom::Tuple(tuple) => {
            for value in &mut tuple.values {
                optimize_expr(ctx, ns, value);
            }
        }
        Atom::ItemGet(itemget) => match &mut itemget.key {
            ItemKey::Index(key) => optimize_expr(ctx, ns, key),
            ItemKey::Slice { start, stop, step } => {
                for key in [start, stop, step].into_iter().flatten() {
                    optimize_expr(ctx, ns, key);
                }
            }
        },
        Atom::Lambda(lambda) => {
            let code_ns = ctx.arena.derive(ns, &lambda.code.name);
            optimize_code(ctx, code_ns, &mut lambda.code);
        }
        Atom::Literal(_) | Atom::AttrGet(_) => {}
    }
}
