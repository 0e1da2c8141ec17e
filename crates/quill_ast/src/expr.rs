//! Expression nodes.

use crate::node::{Identifier, LiteralNode, NodeMeta, OperatorNode};
use crate::stmt::{ArgDef, CodeBlock, TypeRef};
use crate::Statement;
use itertools::Itertools;
use quill_tokens::symbols::{binary_precedence, unary_precedence};
use quill_tokens::{Span, Spanned};
use std::fmt::{Display, Formatter};

/// An expression: a value, a unary application, or a binary application.
#[derive(Debug, Clone)]
pub enum Expr {
    Value(ValueExpr),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
}

impl Expr {
    pub fn meta(&self) -> &NodeMeta {
        match self {
            Expr::Value(v) => &v.meta,
            Expr::Unary(u) => &u.meta,
            Expr::Binary(b) => &b.meta,
        }
    }

    pub fn meta_mut(&mut self) -> &mut NodeMeta {
        match self {
            Expr::Value(v) => &mut v.meta,
            Expr::Unary(u) => &mut u.meta,
            Expr::Binary(b) => &mut b.meta,
        }
    }

    pub fn length(&self) -> usize {
        match self {
            Expr::Value(v) => v.length(),
            Expr::Unary(u) => u.operator.length() + u.value.length(),
            Expr::Binary(b) => b.lvalue.length() + b.operator.length() + b.rvalue.length(),
        }
    }

    /// The literal this expression folds to syntactically, if it is one.
    pub fn as_literal(&self) -> Option<&LiteralNode> {
        match self {
            Expr::Value(v) => match &v.value {
                Atom::Literal(lit) => Some(lit),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_identifier(&self) -> Option<&Identifier> {
        match self {
            Expr::Value(v) => match &v.value {
                Atom::Identifier(id) => Some(id),
                _ => None,
            },
            _ => None,
        }
    }
}

impl Spanned for Expr {
    fn span(&self) -> Span {
        self.meta().span_with_len(self.length())
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Value(v) => v.fmt(f),
            Expr::Unary(u) => u.fmt(f),
            Expr::Binary(b) => b.fmt(f),
        }
    }
}

/// A value expression wrapping one atom.
#[derive(Debug, Clone)]
pub struct ValueExpr {
    pub value: Atom,
    pub meta: NodeMeta,
}

impl ValueExpr {
    pub fn length(&self) -> usize {
        self.value.length()
    }
}

impl Display for ValueExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.value.fmt(f)
    }
}

/// The atoms a value expression may hold.
#[derive(Debug, Clone)]
pub enum Atom {
    Literal(LiteralNode),
    Identifier(Identifier),
    Call(Box<CallExpr>),
    AttrGet(AttrGetExpr),
    ItemGet(Box<ItemGetExpr>),
    List(ListExpr),
    Tuple(TupleExpr),
    Lambda(Box<LambdaExpr>),
}

impl Atom {
    pub fn length(&self) -> usize {
        match self {
            Atom::Literal(l) => l.length(),
            Atom::Identifier(i) => i.length(),
            Atom::Call(c) => c.length(),
            Atom::AttrGet(a) => a.length(),
            Atom::ItemGet(i) => i.length(),
            Atom::List(l) => l.length(),
            Atom::Tuple(t) => t.length(),
            Atom::Lambda(l) => l.length(),
        }
    }
}

impl Display for Atom {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Atom::Literal(l) => l.fmt(f),
            Atom::Identifier(i) => i.fmt(f),
            Atom::Call(c) => c.fmt(f),
            Atom::AttrGet(a) => a.fmt(f),
            Atom::ItemGet(i) => i.fmt(f),
            Atom::List(l) => l.fmt(f),
            Atom::Tuple(t) => t.fmt(f),
            Atom::Lambda(l) => l.fmt(f),
        }
    }
}

/// A unary operator application.
#[derive(Debug, Clone)]
pub struct UnaryExpr {
    pub operator: OperatorNode,
    pub value: Box<Expr>,
    pub meta: NodeMeta,
}

impl Display for UnaryExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let prec = unary_precedence(&self.operator.op);
        let needs_parens = match &*self.value {
            Expr::Binary(b) => match (binary_precedence(&b.operator.op), prec) {
                (Some(inner), Some(outer)) => inner >= outer,
                _ => true,
            },
            _ => false,
        };
        let alpha = self
            .operator
            .op
            .chars()
            .last()
            .is_some_and(|c| c.is_alphabetic());
        let sep = if alpha || matches!(&*self.value, Expr::Unary(_)) {
            " "
        } else {
            ""
        };
        if needs_parens {
            write!(f, "{}{sep}({})", self.operator, self.value)
        } else {
            write!(f, "{}{sep}{}", self.operator, self.value)
        }
    }
}

/// A binary operator application.
#[derive(Debug, Clone)]
pub struct BinaryExpr {
    pub lvalue: Box<Expr>,
    pub operator: OperatorNode,
    pub rvalue: Box<Expr>,
    pub meta: NodeMeta,
}

impl BinaryExpr {
    fn side_needs_parens(&self, side: &Expr, right: bool) -> bool {
        match side {
            Expr::Binary(b) => {
                match (
                    binary_precedence(&b.operator.op),
                    binary_precedence(&self.operator.op),
                ) {
                    // all operators associate left; a right operand at the
                    // same tier must keep its grouping through reprinting
                    (Some(inner), Some(outer)) => {
                        if right {
                            inner >= outer
                        } else {
                            inner > outer
                        }
                    }
                    _ => true,
                }
            }
            _ => false,
        }
    }
}

impl Display for BinaryExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let fmt_side = |side: &Expr, right: bool| {
            if self.side_needs_parens(side, right) {
                format!("({side})")
            } else {
                side.to_string()
            }
        };
        write!(
            f,
            "{} {} {}",
            fmt_side(&self.lvalue, false),
            self.operator,
            fmt_side(&self.rvalue, true)
        )
    }
}

/// Subscript access, `value[key]`, with the full slice form.
#[derive(Debug, Clone)]
pub struct ItemGetExpr {
    pub value: Identifier,
    pub key: ItemKey,
    pub meta: NodeMeta,
}

impl ItemGetExpr {
    pub fn length(&self) -> usize {
        self.value.length() + self.key.length()
    }
}

impl Display for ItemGetExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.value, self.key)
    }
}

/// A subscript key: a plain index or a `start:stop:step` slice.
#[derive(Debug, Clone)]
pub enum ItemKey {
    Index(Expr),
    Slice {
        start: Option<Expr>,
        stop: Option<Expr>,
        step: Option<Expr>,
    },
}

impl ItemKey {
    pub fn length(&self) -> usize {
        match self {
            ItemKey::Index(e) => e.length(),
            ItemKey::Slice { start, stop, step } => [start, stop, step]
                .into_iter()
                .flatten()
                .map(Expr::length)
                .sum(),
        }
    }
}

impl Display for ItemKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemKey::Index(e) => e.fmt(f),
            ItemKey::Slice { start, stop, step } => {
                if let Some(start) = start {
                    write!(f, "{start}")?;
                }
                write!(f, ":")?;
                if let Some(stop) = stop {
                    write!(f, "{stop}")?;
                }
                if let Some(step) = step {
                    write!(f, ":{step}")?;
                }
                Ok(())
            }
        }
    }
}

/// Attribute access, `value.attr` (or any other attribute operator).
#[derive(Debug, Clone)]
pub struct AttrGetExpr {
    pub value: Identifier,
    pub optype: OperatorNode,
    pub attr: Identifier,
    pub meta: NodeMeta,
}

impl AttrGetExpr {
    pub fn length(&self) -> usize {
        self.value.length() + self.optype.length() + self.attr.length()
    }
}

impl Display for AttrGetExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.value, self.optype, self.attr)
    }
}

/// A typed list literal, `[type: a, b]`.
#[derive(Debug, Clone)]
pub struct ListExpr {
    pub elem_type: Identifier,
    pub values: Vec<Expr>,
    pub meta: NodeMeta,
}

impl ListExpr {
    pub fn length(&self) -> usize {
        self.elem_type.length() + self.values.iter().map(Expr::length).sum::<usize>()
    }
}

impl Display for ListExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.values.is_empty() {
            write!(f, "[{}]", self.elem_type)
        } else {
            write!(
                f,
                "[{}: {}]",
                self.elem_type,
                self.values.iter().join(", ")
            )
        }
    }
}

/// A tuple literal, `(int x, y)`; per-slot types are optional.
#[derive(Debug, Clone)]
pub struct TupleExpr {
    pub types: Vec<Option<Identifier>>,
    pub values: Vec<Expr>,
    pub meta: NodeMeta,
}

impl TupleExpr {
    pub fn length(&self) -> usize {
        self.types
            .iter()
            .flatten()
            .map(Identifier::length)
            .sum::<usize>()
            + self.values.iter().map(Expr::length).sum::<usize>()
    }
}

impl Display for TupleExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let slots = self
            .values
            .iter()
            .enumerate()
            .map(|(i, v)| match self.types.get(i).and_then(|t| t.as_ref()) {
                Some(t) => format!("{t} {v}"),
                None => v.to_string(),
            })
            .join(", ");
        let trailing = if self.values.len() == 1 { "," } else { "" };
        write!(f, "({slots}{trailing})")
    }
}

/// A lambda, `(args) -> type = expr`; the body is desugared at build time
/// into a one-statement block holding an implicit `return`.
#[derive(Debug, Clone)]
pub struct LambdaExpr {
    pub argdefs: Vec<ArgDef>,
    pub ty: TypeRef,
    pub code: CodeBlock,
    pub meta: NodeMeta,
}

impl LambdaExpr {
    pub fn length(&self) -> usize {
        self.argdefs.iter().map(ArgDef::length).sum::<usize>()
            + self.ty.length()
            + self.code.length()
    }
}

impl Display for LambdaExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}) -> {}", self.argdefs.iter().join(", "), self.ty)?;
        match self.code.nodes.first() {
            Some(Statement::KeywordExpr(kw)) if kw.keyword.word == "return" => {
                match &kw.value {
                    Some(value) => write!(f, " = {value}"),
                    None => write!(f, " = ()"),
                }
            }
            _ => write!(f, " {}", self.code),
        }
    }
}

/// A call, usable both as an expression atom and as a statement.
#[derive(Debug, Clone)]
pub struct CallExpr {
    pub callable: Expr,
    pub args: CallArgs,
    pub kwargs: CallKwargs,
    pub meta: NodeMeta,
}

impl CallExpr {
    pub fn length(&self) -> usize {
        self.callable.length() + self.args.length() + self.kwargs.length()
    }
}

impl Display for CallExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let callable = match &self.callable {
            Expr::Value(v) if matches!(v.value, Atom::Call(_) | Atom::Lambda(_)) => {
                format!("({})", self.callable)
            }
            _ => self.callable.to_string(),
        };
        let args = self.args.to_string();
        let kwargs = self.kwargs.to_string();
        let sep = if !args.is_empty() && !kwargs.is_empty() {
            ", "
        } else {
            ""
        };
        write!(f, "{callable}({args}{sep}{kwargs})")
    }
}

/// Positional and starred call arguments.
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    pub args: Vec<Expr>,
    pub star_args: Vec<Expr>,
    pub meta: NodeMeta,
}

impl CallArgs {
    pub fn length(&self) -> usize {
        self.args.iter().chain(&self.star_args).map(Expr::length).sum()
    }
}

impl Display for CallArgs {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let rendered = self
            .args
            .iter()
            .map(ToString::to_string)
            .chain(self.star_args.iter().map(|a| format!("*{a}")))
            .join(", ");
        write!(f, "{rendered}")
    }
}

/// Keyword and double-starred call arguments.
#[derive(Debug, Clone, Default)]
pub struct CallKwargs {
    pub kwargs: Vec<(Identifier, Expr)>,
    pub star_kwargs: Vec<Expr>,
    pub meta: NodeMeta,
}

impl CallKwargs {
    pub fn length(&self) -> usize {
        self.kwargs
            .iter()
            .map(|(k, v)| k.length() + v.length())
            .sum::<usize>()
            + self.star_kwargs.iter().map(Expr::length).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.kwargs.is_empty() && self.star_kwargs.is_empty()
    }
}

impl Display for CallKwargs {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let rendered = self
            .kwargs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .chain(self.star_kwargs.iter().map(|a| format!("**{a}")))
            .join(", ");
        write!(f, "{rendered}")
    }
}
