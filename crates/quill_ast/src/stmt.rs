//! Statement nodes — the "final" kinds a group may resolve to — plus the
//! supporting type-reference, argument-definition and block nodes.

use crate::expr::{CallExpr, Expr, ValueExpr};
use crate::node::{indent, Identifier, KeywordNode, NodeMeta, OperatorNode};
use itertools::Itertools;
use quill_tokens::{Span, Spanned};
use std::fmt::{Display, Formatter};

/// A type reference with modifier keywords, e.g. `const int`.
#[derive(Debug, Clone)]
pub struct TypeRef {
    pub modifiers: Vec<KeywordNode>,
    pub name: Identifier,
    pub meta: NodeMeta,
}

impl TypeRef {
    pub fn length(&self) -> usize {
        self.modifiers.iter().map(KeywordNode::length).sum::<usize>() + self.name.length()
    }
}

impl Display for TypeRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for m in &self.modifiers {
            write!(f, "{m} ")?;
        }
        write!(f, "{}", self.name)
    }
}

/// Parameter-definition modifier: `+`/`*`/`**` capture, `?` optional,
/// `=default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgModifier {
    Plus,
    Star,
    DoubleStar,
    Optional,
    Default,
}

impl ArgModifier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArgModifier::Plus => "+",
            ArgModifier::Star => "*",
            ArgModifier::DoubleStar => "**",
            ArgModifier::Optional => "?",
            ArgModifier::Default => "=",
        }
    }
}

/// One parameter definition in a function/lambda/keyword-def header.
#[derive(Debug, Clone)]
pub struct ArgDef {
    pub ty: TypeRef,
    pub name: Identifier,
    pub modifier: Option<ArgModifier>,
    pub value: Option<ValueExpr>,
    pub meta: NodeMeta,
}

impl ArgDef {
    pub fn length(&self) -> usize {
        self.ty.length()
            + self.name.length()
            + self.value.as_ref().map(ValueExpr::length).unwrap_or(0)
    }
}

impl Display for ArgDef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.ty, self.name)?;
        match (self.modifier, &self.value) {
            (Some(ArgModifier::Default), Some(value)) => write!(f, "={value}"),
            (Some(m), _) => write!(f, "{}", m.as_str()),
            (None, _) => Ok(()),
        }
    }
}

/// A named statement list; the body of every scope.
#[derive(Debug, Clone)]
pub struct CodeBlock {
    pub name: String,
    pub nodes: Vec<Statement>,
    pub meta: NodeMeta,
}

impl CodeBlock {
    pub fn new(name: impl Into<String>, meta: NodeMeta) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            meta,
        }
    }

    pub fn length(&self) -> usize {
        self.nodes.iter().map(Statement::length).sum()
    }
}

impl Display for CodeBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.nodes.is_empty() {
            return write!(f, "{{}}");
        }
        let body = self.nodes.iter().join("\n");
        write!(f, "{{\n{}\n}}", indent(&body))
    }
}

/// A control-flow body: a braced code block, or a single inline expression.
#[derive(Debug, Clone)]
pub struct Block {
    pub code: CodeBlock,
    pub braced: bool,
    pub meta: NodeMeta,
}

impl Block {
    pub fn length(&self) -> usize {
        self.code.length()
    }
}

impl Display for Block {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.braced {
            self.code.fmt(f)
        } else {
            match self.code.nodes.first() {
                Some(stmt) => stmt.fmt(f),
                None => write!(f, "{{}}"),
            }
        }
    }
}

/// A statement. These are the node kinds that can terminate a group.
#[derive(Debug, Clone)]
pub enum Statement {
    FuncDef(FuncDef),
    ClassDef(ClassDef),
    KeywordExpr(KeywordExpr),
    KeywordDef(KeywordDef),
    VarDef(VarDef),
    Assignment(Assignment),
    UnpackAssignment(UnpackAssignment),
    AttrSet(AttrSet),
    Call(CallExpr),
    Conditional(Conditional),
    ForLoop(ForLoop),
    WhileLoop(WhileLoop),
    ElseClause(ElseClause),
    /// Bare expression statement, admitted in interactive mode only.
    Expr(Expr),
}

impl Statement {
    pub fn meta(&self) -> &NodeMeta {
        match self {
            Statement::FuncDef(s) => &s.meta,
            Statement::ClassDef(s) => &s.meta,
            Statement::KeywordExpr(s) => &s.meta,
            Statement::KeywordDef(s) => &s.meta,
            Statement::VarDef(s) => &s.meta,
            Statement::Assignment(s) => &s.meta,
            Statement::UnpackAssignment(s) => &s.meta,
            Statement::AttrSet(s) => &s.meta,
            Statement::Call(s) => &s.meta,
            Statement::Conditional(s) => &s.meta,
            Statement::ForLoop(s) => &s.meta,
            Statement::WhileLoop(s) => &s.meta,
            Statement::ElseClause(s) => &s.meta,
            Statement::Expr(e) => e.meta(),
        }
    }

    pub fn meta_mut(&mut self) -> &mut NodeMeta {
        match self {
            Statement::FuncDef(s) => &mut s.meta,
            Statement::ClassDef(s) => &mut s.meta,
            Statement::KeywordExpr(s) => &mut s.meta,
            Statement::KeywordDef(s) => &mut s.meta,
            Statement::VarDef(s) => &mut s.meta,
            Statement::Assignment(s) => &mut s.meta,
            Statement::UnpackAssignment(s) => &mut s.meta,
            Statement::AttrSet(s) => &mut s.meta,
            Statement::Call(s) => &mut s.meta,
            Statement::Conditional(s) => &mut s.meta,
            Statement::ForLoop(s) => &mut s.meta,
            Statement::WhileLoop(s) => &mut s.meta,
            Statement::ElseClause(s) => &mut s.meta,
            Statement::Expr(e) => e.meta_mut(),
        }
    }

    pub fn length(&self) -> usize {
        match self {
            Statement::FuncDef(s) => s.length(),
            Statement::ClassDef(s) => s.length(),
            Statement::KeywordExpr(s) => s.length(),
            Statement::KeywordDef(s) => s.length(),
            Statement::VarDef(s) => s.length(),
            Statement::Assignment(s) => s.length(),
            Statement::UnpackAssignment(s) => s.length(),
            Statement::AttrSet(s) => s.length(),
            Statement::Call(s) => s.length(),
            Statement::Conditional(s) => s.length(),
            Statement::ForLoop(s) => s.length(),
            Statement::WhileLoop(s) => s.length(),
            Statement::ElseClause(s) => s.length(),
            Statement::Expr(e) => e.length(),
        }
    }
}

impl Spanned for Statement {
    fn span(&self) -> Span {
        self.meta().span_with_len(self.length())
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Statement::FuncDef(s) => s.fmt(f),
            Statement::ClassDef(s) => s.fmt(f),
            Statement::KeywordExpr(s) => s.fmt(f),
            Statement::KeywordDef(s) => s.fmt(f),
            Statement::VarDef(s) => s.fmt(f),
            Statement::Assignment(s) => s.fmt(f),
            Statement::UnpackAssignment(s) => s.fmt(f),
            Statement::AttrSet(s) => s.fmt(f),
            Statement::Call(s) => s.fmt(f),
            Statement::Conditional(s) => s.fmt(f),
            Statement::ForLoop(s) => s.fmt(f),
            Statement::WhileLoop(s) => s.fmt(f),
            Statement::ElseClause(s) => s.fmt(f),
            Statement::Expr(e) => e.fmt(f),
        }
    }
}

/// A function definition.
#[derive(Debug, Clone)]
pub struct FuncDef {
    pub ty: TypeRef,
    pub name: Identifier,
    pub argdefs: Vec<ArgDef>,
    pub code: CodeBlock,
    pub meta: NodeMeta,
}

impl FuncDef {
    pub fn length(&self) -> usize {
        self.ty.length()
            + self.name.length()
            + self.argdefs.iter().map(ArgDef::length).sum::<usize>()
            + self.code.length()
    }
}

impl Display for FuncDef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}({})",
            self.ty,
            self.name,
            self.argdefs.iter().join(", ")
        )?;
        match self.code.nodes.as_slice() {
            [Statement::KeywordExpr(kw)] if kw.keyword.word == "return" && kw.value.is_some() => {
                write!(f, " = {}", kw.value.as_ref().unwrap())
            }
            _ => write!(f, " {}", self.code),
        }
    }
}

/// A class definition.
#[derive(Debug, Clone)]
pub struct ClassDef {
    pub name: Identifier,
    pub bases: Vec<Identifier>,
    pub code: CodeBlock,
    pub meta: NodeMeta,
}

impl ClassDef {
    pub fn length(&self) -> usize {
        self.name.length()
            + self.bases.iter().map(Identifier::length).sum::<usize>()
            + self.code.length()
    }
}

impl Display for ClassDef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "class {}", self.name)?;
        if !self.bases.is_empty() {
            write!(f, "({})", self.bases.iter().join(", "))?;
        }
        write!(f, " {}", self.code)
    }
}

/// A `keyword [expr]` statement: `return x`, `break`, `import m:n`, ….
#[derive(Debug, Clone)]
pub struct KeywordExpr {
    pub keyword: KeywordNode,
    pub value: Option<Expr>,
    pub meta: NodeMeta,
}

impl KeywordExpr {
    pub fn length(&self) -> usize {
        self.keyword.length() + self.value.as_ref().map(Expr::length).unwrap_or(0)
    }
}

impl Display for KeywordExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{} {}", self.keyword, value),
            None => self.keyword.fmt(f),
        }
    }
}

/// A keyword-introduced definition body: `main { … }`, `constr(args) { … }`,
/// `property name { … }`.
#[derive(Debug, Clone)]
pub struct KeywordDef {
    pub keyword: KeywordNode,
    pub name: Option<Identifier>,
    pub argdefs: Option<Vec<ArgDef>>,
    pub code: CodeBlock,
    pub meta: NodeMeta,
}

impl KeywordDef {
    /// The scope name the definition registers under; unnamed definitions use
    /// their body's name (`<main>`, `<constr>`, …).
    pub fn def_name(&self) -> String {
        match &self.name {
            Some(name) => name.name.clone(),
            None => self.code.name.clone(),
        }
    }

    pub fn length(&self) -> usize {
        self.keyword.length()
            + self.name.as_ref().map(Identifier::length).unwrap_or(0)
            + self
                .argdefs
                .iter()
                .flatten()
                .map(ArgDef::length)
                .sum::<usize>()
            + self.code.length()
    }
}

impl Display for KeywordDef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.keyword)?;
        if let Some(argdefs) = &self.argdefs {
            write!(f, " ({})", argdefs.iter().join(", "))?;
        } else if let Some(name) = &self.name {
            write!(f, " {name}")?;
        }
        write!(f, " {}", self.code)
    }
}

/// A variable definition, `type name [= value]`.
#[derive(Debug, Clone)]
pub struct VarDef {
    pub ty: TypeRef,
    pub name: Identifier,
    pub value: Option<Expr>,
    pub meta: NodeMeta,
}

impl VarDef {
    pub fn length(&self) -> usize {
        self.ty.length() + self.name.length() + self.value.as_ref().map(Expr::length).unwrap_or(0)
    }
}

impl Display for VarDef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.ty, self.name)?;
        if let Some(value) = &self.value {
            write!(f, " = {value}")?;
        }
        Ok(())
    }
}

/// `=` vs `:=` (defining) assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Walrus,
}

impl AssignOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Walrus => ":=",
        }
    }
}

/// An assignment to an existing binding (or attribute, with a leading dot).
#[derive(Debug, Clone)]
pub struct Assignment {
    pub name: Identifier,
    pub is_attr: bool,
    pub op: AssignOp,
    pub inplace: Option<OperatorNode>,
    pub value: Expr,
    pub meta: NodeMeta,
}

impl Assignment {
    pub fn length(&self) -> usize {
        self.name.length()
            + self.inplace.as_ref().map(OperatorNode::length).unwrap_or(0)
            + self.value.length()
    }
}

impl Display for Assignment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let dot = if self.is_attr { "." } else { "" };
        let inplace = self
            .inplace
            .as_ref()
            .map(|op| op.op.clone())
            .unwrap_or_default();
        write!(
            f,
            "{dot}{} {inplace}{} {}",
            self.name,
            self.op.as_str(),
            self.value
        )
    }
}

/// A tuple-unpacking assignment, `a, b = expr`.
#[derive(Debug, Clone)]
pub struct UnpackAssignment {
    pub names: Vec<Identifier>,
    pub op: AssignOp,
    pub inplace: Option<OperatorNode>,
    pub value: Expr,
    pub meta: NodeMeta,
}

impl UnpackAssignment {
    pub fn length(&self) -> usize {
        self.names.iter().map(Identifier::length).sum::<usize>()
            + self.inplace.as_ref().map(OperatorNode::length).unwrap_or(0)
            + self.value.length()
    }
}

impl Display for UnpackAssignment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let inplace = self
            .inplace
            .as_ref()
            .map(|op| op.op.clone())
            .unwrap_or_default();
        write!(
            f,
            "{} {inplace}{} {}",
            self.names.iter().join(", "),
            self.op.as_str(),
            self.value
        )
    }
}

/// An attribute assignment, `obj.attr = value`.
#[derive(Debug, Clone)]
pub struct AttrSet {
    pub value: Identifier,
    pub assignment: Assignment,
    pub meta: NodeMeta,
}

impl AttrSet {
    pub fn length(&self) -> usize {
        self.value.length() + self.assignment.length()
    }
}

impl Display for AttrSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.value, self.assignment)
    }
}

/// An `if` statement.
#[derive(Debug, Clone)]
pub struct Conditional {
    pub condition: Expr,
    pub code: Block,
    pub meta: NodeMeta,
}

impl Conditional {
    pub fn length(&self) -> usize {
        self.condition.length() + self.code.length()
    }
}

impl Display for Conditional {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "if {} {}", self.condition, self.code)
    }
}

/// A `for name in iterable` loop.
#[derive(Debug, Clone)]
pub struct ForLoop {
    pub name: Identifier,
    pub iterable: Expr,
    pub code: Block,
    pub meta: NodeMeta,
}

impl ForLoop {
    pub fn length(&self) -> usize {
        self.name.length() + self.iterable.length() + self.code.length()
    }
}

impl Display for ForLoop {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "for {} in {} {}", self.name, self.iterable, self.code)
    }
}

/// A `while` loop.
#[derive(Debug, Clone)]
pub struct WhileLoop {
    pub condition: Expr,
    pub code: Block,
    pub meta: NodeMeta,
}

impl WhileLoop {
    pub fn length(&self) -> usize {
        self.condition.length() + self.code.length()
    }
}

impl Display for WhileLoop {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "while {} {}", self.condition, self.code)
    }
}

/// An `else` clause; pairs with the preceding `if` by adjacency.
#[derive(Debug, Clone)]
pub struct ElseClause {
    pub code: Block,
    pub meta: NodeMeta,
}

impl ElseClause {
    pub fn length(&self) -> usize {
        self.code.length()
    }
}

impl Display for ElseClause {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "else {}", self.code)
    }
}

/// The root of a built tree.
#[derive(Debug, Clone)]
pub struct Root {
    pub code: CodeBlock,
}

impl Display for Root {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code.nodes.iter().join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{Atom, ValueExpr};
    use crate::node::LiteralNode;

    fn lit(text: &str) -> Expr {
        Expr::Value(ValueExpr {
            value: Atom::Literal(LiteralNode::new(text, NodeMeta::new(1, 0))),
            meta: NodeMeta::new(1, 0),
        })
    }

    #[test]
    fn test_vardef_display() {
        let vardef = VarDef {
            ty: TypeRef {
                modifiers: vec![KeywordNode::new("const", NodeMeta::new(1, 0))],
                name: Identifier::new("int", NodeMeta::new(1, 6)),
                meta: NodeMeta::new(1, 0),
            },
            name: Identifier::new("x", NodeMeta::new(1, 10)),
            value: Some(lit("5")),
            meta: NodeMeta::new(1, 0),
        };
        assert_eq!(vardef.to_string(), "const int x = 5");
    }

    #[test]
    fn test_code_block_display_indents() {
        let mut code = CodeBlock::new("<block>", NodeMeta::new(1, 0));
        code.nodes.push(Statement::KeywordExpr(KeywordExpr {
            keyword: KeywordNode::new("return", NodeMeta::new(1, 0)),
            value: Some(lit("1")),
            meta: NodeMeta::new(1, 0),
        }));
        assert_eq!(code.to_string(), "{\n\treturn 1\n}");
    }

    #[test]
    fn test_length_sums_children() {
        let vardef = VarDef {
            ty: TypeRef {
                modifiers: vec![],
                name: Identifier::new("int", NodeMeta::new(1, 0)),
                meta: NodeMeta::new(1, 0),
            },
            name: Identifier::new("xy", NodeMeta::new(1, 4)),
            value: Some(lit("10")),
            meta: NodeMeta::new(1, 0),
        };
        assert_eq!(vardef.length(), 3 + 2 + 2);
    }
}
