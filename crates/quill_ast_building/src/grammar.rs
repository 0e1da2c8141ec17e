//! Candidate parsers, one per node kind.
//!
//! Every parser consumes a prefix of its cursor on success and leaves the
//! cursor untouched on failure (callers fork before trying). Statement
//! candidates produce either a complete statement or a suspension: a
//! partially built node waiting for a nested block to be fed to it.

use crate::cursor::TokenCursor;
use crate::error::SyntaxError;
use crate::MAX_EXPR_DEPTH;
use quill_ast::*;
use quill_tokens::symbols::{
    self, is_args_def_keyword, is_binary_operator, is_def_keyword, is_expr_keyword,
    is_modifier_keyword, is_named_def_keyword, is_unary_operator, OPERATOR_TIERS,
};
use quill_tokens::{Spanned, TokenKind};

pub type Parse<T> = Result<T, SyntaxError>;

/// A statement candidate's result.
#[derive(Debug)]
pub enum StmtOutcome {
    Complete(Statement),
    /// The candidate consumed up to and including `{` and now waits for the
    /// block body.
    Suspended(PendingStmt),
}

/// A partially built statement awaiting its code block.
#[derive(Debug)]
pub enum PendingStmt {
    FuncDef {
        ty: TypeRef,
        name: Identifier,
        argdefs: Vec<ArgDef>,
        meta: NodeMeta,
    },
    ClassDef {
        name: Identifier,
        bases: Vec<Identifier>,
        meta: NodeMeta,
    },
    KeywordDef {
        keyword: KeywordNode,
        name: Option<Identifier>,
        argdefs: Option<Vec<ArgDef>>,
        meta: NodeMeta,
    },
    Conditional {
        condition: Expr,
        meta: NodeMeta,
    },
    ForLoop {
        name: Identifier,
        iterable: Expr,
        meta: NodeMeta,
    },
    WhileLoop {
        condition: Expr,
        meta: NodeMeta,
    },
    ElseClause {
        meta: NodeMeta,
    },
}

impl PendingStmt {
    /// The scope name the suspended block's code node is created under.
    pub fn scope_name(&self) -> String {
        match self {
            PendingStmt::FuncDef { name, .. } => name.name.clone(),
            PendingStmt::ClassDef { name, .. } => name.name.clone(),
            PendingStmt::KeywordDef { keyword, name, .. } => match name {
                Some(name) => name.name.clone(),
                None => format!("<{}>", keyword.word),
            },
            _ => "<block>".to_string(),
        }
    }

    /// Finalizes the node once its block has been closed.
    pub fn finish(self, code: CodeBlock) -> Statement {
        match self {
            PendingStmt::FuncDef {
                ty,
                name,
                argdefs,
                meta,
            } => Statement::FuncDef(FuncDef {
                ty,
                name,
                argdefs,
                code,
                meta,
            }),
            PendingStmt::ClassDef { name, bases, meta } => Statement::ClassDef(ClassDef {
                name,
                bases,
                code,
                meta,
            }),
            PendingStmt::KeywordDef {
                keyword,
                name,
                argdefs,
                meta,
            } => Statement::KeywordDef(KeywordDef {
                keyword,
                name,
                argdefs,
                code,
                meta,
            }),
            PendingStmt::Conditional { condition, meta } => Statement::Conditional(Conditional {
                condition,
                code: braced(code, meta),
                meta,
            }),
            PendingStmt::ForLoop {
                name,
                iterable,
                meta,
            } => Statement::ForLoop(ForLoop {
                name,
                iterable,
                code: braced(code, meta),
                meta,
            }),
            PendingStmt::WhileLoop { condition, meta } => Statement::WhileLoop(WhileLoop {
                condition,
                code: braced(code, meta),
                meta,
            }),
            PendingStmt::ElseClause { meta } => Statement::ElseClause(ElseClause {
                code: braced(code, meta),
                meta,
            }),
        }
    }
}

fn braced(code: CodeBlock, meta: NodeMeta) -> Block {
    Block {
        code,
        braced: true,
        meta,
    }
}

pub type StmtCandidate = fn(&mut TokenCursor) -> Parse<StmtOutcome>;

/// The final node kinds in registration order.
pub const CANDIDATES: &[(&str, StmtCandidate)] = &[
    ("funcdef", parse_funcdef),
    ("classdef", parse_classdef),
    ("keyword expr", parse_keyword_expr_stmt),
    ("keyword def", parse_keyword_def),
    ("vardef", parse_vardef),
    ("assignment", parse_assignment_stmt),
    ("unpack assignment", parse_unpack_assignment),
    ("attrset", parse_attrset),
    ("funccall", parse_call_stmt),
    ("conditional", parse_conditional),
    ("for loop", parse_for_loop),
    ("while loop", parse_while_loop),
    ("else clause", parse_else_clause),
];

/// Bare expressions terminate statements only in interactive mode.
pub const INTERACTIVE_CANDIDATE: (&str, StmtCandidate) = ("expression", parse_expr_stmt);

// --- leaf parsers ---

pub fn parse_identifier(cur: &mut TokenCursor) -> Parse<Identifier> {
    if cur
        .peek()
        .is_some_and(|t| t.kind() == TokenKind::Identifier)
    {
        let t = cur.next().unwrap();
        return Ok(Identifier::new(t.text(), NodeMeta::at(t)));
    }
    Err(SyntaxError::expected("identifier", cur.peek()))
}

pub fn parse_keyword(cur: &mut TokenCursor) -> Parse<KeywordNode> {
    if cur.peek().is_some_and(|t| t.kind() == TokenKind::Keyword) {
        let t = cur.next().unwrap();
        return Ok(KeywordNode::new(t.text(), NodeMeta::at(t)));
    }
    Err(SyntaxError::expected("keyword", cur.peek()))
}

pub fn parse_literal(cur: &mut TokenCursor) -> Parse<LiteralNode> {
    if cur.peek().is_some_and(|t| t.kind() == TokenKind::Literal) {
        let t = cur.next().unwrap();
        return Ok(LiteralNode::new(t.text(), NodeMeta::at(t)));
    }
    Err(SyntaxError::expected("literal", cur.peek()))
}

pub fn parse_operator(cur: &mut TokenCursor) -> Parse<OperatorNode> {
    if cur.peek().is_some_and(|t| t.kind() == TokenKind::Operator) {
        let t = cur.next().unwrap();
        return Ok(OperatorNode::new(t.text(), NodeMeta::at(t)));
    }
    Err(SyntaxError::expected("operator", cur.peek()))
}

fn parse_any_special(cur: &mut TokenCursor) -> Parse<(String, NodeMeta)> {
    if cur.peek().is_some_and(|t| t.kind() == TokenKind::Special) {
        let t = cur.next().unwrap();
        return Ok((t.text().to_string(), NodeMeta::at(t)));
    }
    Err(SyntaxError::expected("special", cur.peek()))
}

fn expect_special(cur: &mut TokenCursor, text: &str) -> Parse<NodeMeta> {
    if cur.peek().is_some_and(|t| t.is_special(text)) {
        let t = cur.next().unwrap();
        return Ok(NodeMeta::at(t));
    }
    Err(SyntaxError::expected(format!("'{text}'"), cur.peek()))
}

fn start_meta(cur: &TokenCursor, what: &str) -> Parse<NodeMeta> {
    cur.peek()
        .map(NodeMeta::at)
        .ok_or_else(|| SyntaxError::expected(what, None))
}

// --- type / parameter grammar ---

pub fn parse_typedef(cur: &mut TokenCursor) -> Parse<TypeRef> {
    let meta = start_meta(cur, "type")?;
    let mut modifiers = Vec::new();
    while cur.peek().is_some_and(|t| t.kind() == TokenKind::Keyword) {
        let t = cur.peek().unwrap();
        if !is_modifier_keyword(t.text()) {
            return Err(SyntaxError::expected("modifier", Some(t)));
        }
        let t = cur.next().unwrap();
        modifiers.push(KeywordNode::new(t.text(), NodeMeta::at(t)));
    }
    let name = parse_identifier(cur)?;
    Ok(TypeRef {
        modifiers,
        name,
        meta,
    })
}

pub fn parse_argdef(cur: &mut TokenCursor, depth: usize) -> Parse<ArgDef> {
    let meta = start_meta(cur, "argdef")?;
    let ty = parse_typedef(cur)?;
    let name = parse_identifier(cur)?;
    let modifier = match cur.peek() {
        Some(t) if t.kind() == TokenKind::Operator => match t.text() {
            "+" => Some(ArgModifier::Plus),
            "*" => Some(ArgModifier::Star),
            "**" => Some(ArgModifier::DoubleStar),
            _ => None,
        },
        Some(t) if t.kind() == TokenKind::Special => match t.text() {
            "?" => Some(ArgModifier::Optional),
            "=" => Some(ArgModifier::Default),
            _ => None,
        },
        _ => None,
    };
    if modifier.is_some() {
        cur.next();
    }
    let value = if modifier == Some(ArgModifier::Default) {
        Some(parse_value(cur, depth + 1, false)?)
    } else {
        None
    };
    Ok(ArgDef {
        ty,
        name,
        modifier,
        value,
        meta,
    })
}

fn parse_argdef_list(cur: &mut TokenCursor) -> Parse<Vec<ArgDef>> {
    let mut argdefs: Vec<ArgDef> = Vec::new();
    while cur.peek().is_some_and(|t| t.kind() != TokenKind::Special) {
        let argdef = parse_argdef(cur, 0)?;
        if argdef.value.is_none()
            && argdef.modifier.is_none()
            && argdefs
                .last()
                .is_some_and(|prev| prev.value.is_some() || prev.modifier == Some(ArgModifier::Optional))
        {
            return Err(SyntaxError::new(
                crate::error::SyntaxErrorKind::Other(format!(
                    "non-default argument '{}' follows a default argument",
                    argdef.name
                )),
                argdef.name.span(),
            ));
        }
        argdefs.push(argdef);
        if cur.peek().is_some_and(|t| t.is_special(",")) {
            cur.next();
        }
    }
    Ok(argdefs)
}

// --- expressions ---

/// Parses an expression off the cursor, consuming as long a prefix as the
/// grammar allows. `fcall` suppresses the call and lambda atoms so a call's
/// callee cannot left-recurse into another call.
pub fn parse_expr(cur: &mut TokenCursor, depth: usize, fcall: bool) -> Parse<Expr> {
    let meta = start_meta(cur, "expression")?;
    if depth > MAX_EXPR_DEPTH {
        return Err(SyntaxError::new(
            crate::error::SyntaxErrorKind::TooDeep,
            meta.span_with_len(0),
        )
        .fatal());
    }

    // binary productions, loosest tier first, splitting at the last operator
    // of the tier that sits outside parenthesis nesting
    for tier in OPERATOR_TIERS.iter().rev() {
        if tier.unary {
            continue;
        }
        if let Some(expr) = try_binary(cur, tier.ops, depth, meta)? {
            return Ok(expr);
        }
    }

    // unary
    {
        let mut fork = cur.fork();
        if let Ok(operator) = parse_operator(&mut fork) {
            if is_unary_operator(&operator.op) {
                match parse_expr(&mut fork, depth + 1, false) {
                    Ok(value) => {
                        cur.join(fork);
                        return Ok(Expr::Unary(UnaryExpr {
                            operator,
                            value: Box::new(value),
                            meta,
                        }));
                    }
                    Err(e) if e.fatal => return Err(e),
                    Err(_) => {}
                }
            }
        }
    }

    // plain value
    {
        let mut fork = cur.fork();
        match parse_value(&mut fork, depth + 1, fcall) {
            Ok(value) => {
                cur.join(fork);
                return Ok(Expr::Value(value));
            }
            Err(e) if e.fatal => return Err(e),
            Err(_) => {}
        }
    }

    // parenthesized subexpression, extracted by nesting-depth balance
    {
        let mut fork = cur.fork();
        if fork.peek().is_some_and(|t| t.is_special("(")) {
            fork.next();
            let tokens = fork.remaining();
            let mut level = 1usize;
            let mut inner_len = None;
            for (i, t) in tokens.iter().enumerate() {
                if t.kind() == TokenKind::Special {
                    match t.text() {
                        "(" => level += 1,
                        ")" => {
                            level -= 1;
                            if level == 0 {
                                inner_len = Some(i);
                                break;
                            }
                        }
                        _ => {}
                    }
                }
            }
            if let Some(inner_len) = inner_len {
                let mut inner = fork.take_slice(inner_len);
                match parse_expr(&mut inner, depth + 1, false) {
                    Ok(value) if inner.is_empty() => {
                        fork.skip(inner_len + 1);
                        cur.join(fork);
                        return Ok(value);
                    }
                    Err(e) if e.fatal => return Err(e),
                    _ => {}
                }
            }
        }
    }

    Err(SyntaxError::expected("expression", cur.peek()))
}

fn try_binary(
    cur: &mut TokenCursor,
    ops: &[&str],
    depth: usize,
    meta: NodeMeta,
) -> Parse<Option<Expr>> {
    let tokens = cur.remaining();
    let mut level = 0i64;
    let mut splits = Vec::new();
    for (i, t) in tokens.iter().enumerate() {
        if t.kind() == TokenKind::Special {
            match t.text() {
                "(" => level += 1,
                ")" => level -= 1,
                _ => {}
            }
        }
        if level > 0 {
            continue;
        }
        if t.kind() == TokenKind::Operator
            && is_binary_operator(t.text())
            && ops.contains(&t.text())
        {
            splits.push(i);
        }
    }
    // last split first: same-tier operators associate left-to-right
    for &i in splits.iter().rev() {
        let mut left = cur.take_slice(i);
        let lvalue = match parse_expr(&mut left, depth + 1, false) {
            Ok(lvalue) => lvalue,
            Err(e) if e.fatal => return Err(e),
            Err(_) => continue,
        };
        if !left.is_empty() {
            continue;
        }
        let mut rest = cur.fork();
        rest.skip(i);
        let Ok(operator) = parse_operator(&mut rest) else {
            continue;
        };
        let rvalue = match parse_expr(&mut rest, depth + 1, false) {
            Ok(rvalue) => rvalue,
            Err(e) if e.fatal => return Err(e),
            Err(_) => continue,
        };
        cur.join(rest);
        return Ok(Some(Expr::Binary(BinaryExpr {
            lvalue: Box::new(lvalue),
            operator,
            rvalue: Box::new(rvalue),
            meta,
        })));
    }
    Ok(None)
}

/// Parses a value atom. Atom kinds are tried in registration order; the
/// failures of every kind are aggregated when none fits.
pub fn parse_value(cur: &mut TokenCursor, depth: usize, fcall: bool) -> Parse<ValueExpr> {
    let meta = start_meta(cur, "value")?;
    if cur.peek().is_some_and(|t| t.kind() == TokenKind::Literal) {
        let literal = parse_literal(cur)?;
        return Ok(ValueExpr {
            value: Atom::Literal(literal),
            meta,
        });
    }

    type AtomParser = fn(&mut TokenCursor, usize) -> Parse<Atom>;
    let mut kinds: Vec<(&'static str, AtomParser)> = vec![
        ("list", |c, d| parse_list(c, d).map(Atom::List)),
        ("tuple", |c, d| parse_tuple(c, d).map(Atom::Tuple)),
        ("literal", |c, _| parse_literal(c).map(Atom::Literal)),
        ("funccall", |c, d| {
            parse_call(c, d).map(|call| Atom::Call(Box::new(call)))
        }),
        ("attrget", |c, _| parse_attrget(c).map(Atom::AttrGet)),
        ("itemget", |c, d| {
            parse_itemget(c, d).map(|item| Atom::ItemGet(Box::new(item)))
        }),
        ("identifier", |c, _| {
            parse_identifier(c).map(Atom::Identifier)
        }),
        ("lambda", |c, d| {
            parse_lambda(c, d).map(|l| Atom::Lambda(Box::new(l)))
        }),
    ];
    if fcall {
        kinds.retain(|(name, _)| *name != "funccall" && *name != "lambda");
    }

    let mut errors = Vec::new();
    for (name, parser) in kinds {
        let mut fork = cur.fork();
        match parser(&mut fork, depth) {
            Ok(atom) => {
                cur.join(fork);
                return Ok(ValueExpr { value: atom, meta });
            }
            Err(e) if e.fatal => return Err(e),
            Err(e) => errors.push(e.with_usage(name)),
        }
    }
    Err(SyntaxError::from_candidates(errors))
}

fn parse_list(cur: &mut TokenCursor, depth: usize) -> Parse<ListExpr> {
    let meta = start_meta(cur, "list")?;
    expect_special(cur, "[")?;
    let elem_type = parse_identifier(cur)?;
    let mut values = Vec::new();
    if !cur.peek().is_some_and(|t| t.is_special("]")) {
        expect_special(cur, ":")?;
        while cur.peek().is_some_and(|t| t.kind() != TokenKind::Special) {
            values.push(parse_expr(cur, depth + 1, false)?);
            if cur.peek().is_some_and(|t| t.is_special(",")) {
                cur.next();
            }
        }
    }
    expect_special(cur, "]")?;
    Ok(ListExpr {
        elem_type,
        values,
        meta,
    })
}

fn parse_tuple(cur: &mut TokenCursor, depth: usize) -> Parse<TupleExpr> {
    let meta = start_meta(cur, "tuple")?;
    expect_special(cur, "(")?;
    let mut types = Vec::new();
    let mut values = Vec::new();
    while cur.peek().is_some_and(|t| !t.is_special(")")) {
        let ty = if cur.len() >= 2
            && cur.peek().is_some_and(|t| t.kind() == TokenKind::Identifier)
            && cur.peek_at(1).is_some_and(|t| t.text() != ",")
        {
            Some(parse_identifier(cur)?)
        } else {
            None
        };
        types.push(ty);
        values.push(parse_expr(cur, depth + 1, false)?);
        if values.len() < 2 || cur.peek().is_some_and(|t| t.is_special(",")) {
            parse_any_special(cur)?;
        }
    }
    expect_special(cur, ")")?;
    Ok(TupleExpr {
        types,
        values,
        meta,
    })
}

fn parse_itemget(cur: &mut TokenCursor, depth: usize) -> Parse<ItemGetExpr> {
    let meta = start_meta(cur, "itemget")?;
    let value = parse_identifier(cur)?;
    expect_special(cur, "[")?;
    let mut start = None;
    if cur.peek().is_some_and(|t| !t.is_special(":")) {
        start = Some(parse_expr(cur, depth + 1, false)?);
    }
    let key = if cur.peek().is_some_and(|t| t.is_special(":")) {
        cur.next();
        let mut stop = None;
        let mut step = None;
        if cur
            .peek()
            .is_some_and(|t| !t.is_special("]") && !t.is_special(":"))
        {
            stop = Some(parse_expr(cur, depth + 1, false)?);
        }
        if cur.peek().is_some_and(|t| t.is_special(":")) {
            cur.next();
            if cur.peek().is_some_and(|t| !t.is_special("]")) {
                step = Some(parse_expr(cur, depth + 1, false)?);
            }
        }
        ItemKey::Slice { start, stop, step }
    } else {
        ItemKey::Index(start.ok_or_else(|| SyntaxError::expected("expression", cur.peek()))?)
    };
    expect_special(cur, "]")?;
    Ok(ItemGetExpr { value, key, meta })
}

fn parse_attrget(cur: &mut TokenCursor) -> Parse<AttrGetExpr> {
    let meta = start_meta(cur, "attrget")?;
    let value = parse_identifier(cur)?;
    let (optext, opmeta) = parse_any_special(cur)?;
    if !symbols::is_attr_op(&optext) {
        return Err(SyntaxError::new(
            crate::error::SyntaxErrorKind::Expected {
                expected: "attribute operator".to_string(),
                found: format!("special '{optext}'"),
            },
            opmeta.span_with_len(optext.chars().count()),
        ));
    }
    let attr = parse_identifier(cur)?;
    Ok(AttrGetExpr {
        value,
        optype: OperatorNode::new(optext, opmeta),
        attr,
        meta,
    })
}

fn parse_lambda(cur: &mut TokenCursor, depth: usize) -> Parse<LambdaExpr> {
    let meta = start_meta(cur, "lambda")?;
    expect_special(cur, "(")?;
    let mut argdefs = Vec::new();
    while cur.peek().is_some_and(|t| t.kind() != TokenKind::Special) {
        argdefs.push(parse_argdef(cur, depth)?);
        if cur.peek().is_some_and(|t| t.is_special(",")) {
            cur.next();
        }
    }
    expect_special(cur, ")")?;
    expect_special(cur, "->")?;
    let ty = parse_typedef(cur)?;
    expect_special(cur, "=")?;
    let body = parse_expr(cur, depth + 1, false)?;
    let mut code = CodeBlock::new("<lambda>", meta);
    code.nodes.push(Statement::KeywordExpr(KeywordExpr {
        keyword: KeywordNode::new("return", meta),
        value: Some(body),
        meta,
    }));
    Ok(LambdaExpr {
        argdefs,
        ty,
        code,
        meta,
    })
}

pub fn parse_call(cur: &mut TokenCursor, depth: usize) -> Parse<CallExpr> {
    let meta = start_meta(cur, "funccall")?;
    let callable = parse_expr(cur, depth + 1, true)?;
    expect_special(cur, "(")?;
    let args = parse_callargs(cur, depth)?;
    let kwargs = parse_callkwargs(cur, depth)?;
    expect_special(cur, ")")?;
    Ok(CallExpr {
        callable,
        args,
        kwargs,
        meta,
    })
}

fn parse_callargs(cur: &mut TokenCursor, depth: usize) -> Parse<CallArgs> {
    let meta = cur.peek().map(NodeMeta::at).unwrap_or_default();
    let mut args = Vec::new();
    let mut star_args = Vec::new();
    if cur.peek().is_some_and(|t| !t.is_special(")")) {
        while !cur.is_empty() {
            if cur.peek().is_some_and(|t| t.is_operator("*")) {
                cur.next();
                star_args.push(parse_expr(cur, depth + 1, false)?);
            } else if cur.peek_at(1).is_some_and(|t| t.is_special("=")) {
                // keyword arguments start here
                break;
            } else {
                args.push(parse_expr(cur, depth + 1, false)?);
            }
            match cur.peek() {
                Some(t) if t.kind() == TokenKind::Special && !t.is_special(")") => {
                    let (comma, commameta) = parse_any_special(cur)?;
                    if comma != "," {
                        return Err(SyntaxError::new(
                            crate::error::SyntaxErrorKind::Expected {
                                expected: "','".to_string(),
                                found: format!("special '{comma}'"),
                            },
                            commameta.span_with_len(comma.chars().count()),
                        ));
                    }
                }
                _ => break,
            }
        }
    }
    Ok(CallArgs {
        args,
        star_args,
        meta,
    })
}

fn parse_callkwargs(cur: &mut TokenCursor, depth: usize) -> Parse<CallKwargs> {
    let meta = cur.peek().map(NodeMeta::at).unwrap_or_default();
    let mut kwargs = Vec::new();
    let mut star_kwargs = Vec::new();
    if cur.peek().is_some_and(|t| !t.is_special(")")) {
        while !cur.is_empty() {
            if cur.peek().is_some_and(|t| t.is_operator("**")) {
                cur.next();
                star_kwargs.push(parse_expr(cur, depth + 1, false)?);
            } else {
                let key = parse_identifier(cur)?;
                expect_special(cur, "=")?;
                let value = parse_expr(cur, depth + 1, false)?;
                kwargs.push((key, value));
            }
            match cur.peek() {
                Some(t) if t.kind() == TokenKind::Special && !t.is_special(")") => {
                    let (comma, commameta) = parse_any_special(cur)?;
                    if comma != "," {
                        return Err(SyntaxError::new(
                            crate::error::SyntaxErrorKind::Expected {
                                expected: "','".to_string(),
                                found: format!("special '{comma}'"),
                            },
                            commameta.span_with_len(comma.chars().count()),
                        ));
                    }
                }
                _ => break,
            }
        }
    }
    Ok(CallKwargs {
        kwargs,
        star_kwargs,
        meta,
    })
}

// --- statement candidates ---

fn parse_funcdef(cur: &mut TokenCursor) -> Parse<StmtOutcome> {
    let meta = start_meta(cur, "funcdef")?;
    let ty = parse_typedef(cur)?;
    let name = parse_identifier(cur)?;
    expect_special(cur, "(")?;
    let argdefs = parse_argdef_list(cur)?;
    expect_special(cur, ")")?;
    let (cdef, cdefmeta) = parse_any_special(cur)
        .map_err(|_| SyntaxError::expected("'=' or '{'", cur.peek()))?;
    match cdef.as_str() {
        "=" => {
            let value = parse_expr(cur, 0, false)?;
            let mut code = CodeBlock::new(name.name.clone(), meta);
            code.nodes.push(Statement::KeywordExpr(KeywordExpr {
                keyword: KeywordNode::new("return", meta),
                value: Some(value),
                meta,
            }));
            Ok(StmtOutcome::Complete(Statement::FuncDef(FuncDef {
                ty,
                name,
                argdefs,
                code,
                meta,
            })))
        }
        "{" => Ok(StmtOutcome::Suspended(PendingStmt::FuncDef {
            ty,
            name,
            argdefs,
            meta,
        })),
        other => Err(SyntaxError::new(
            crate::error::SyntaxErrorKind::Expected {
                expected: "'=' or '{'".to_string(),
                found: format!("special '{other}'"),
            },
            cdefmeta.span_with_len(other.chars().count()),
        )),
    }
}

fn parse_classdef(cur: &mut TokenCursor) -> Parse<StmtOutcome> {
    let meta = start_meta(cur, "classdef")?;
    let class = parse_keyword(cur)?;
    if class.word != "class" {
        return Err(SyntaxError::expected("'class'", cur.peek()));
    }
    let name = parse_identifier(cur)?;
    let mut bases = Vec::new();
    if cur.peek().is_some_and(|t| t.is_special("(")) {
        cur.next();
        while cur.peek().is_some_and(|t| t.kind() != TokenKind::Special) {
            bases.push(parse_identifier(cur)?);
            if cur.peek().is_some_and(|t| t.is_special(",")) {
                cur.next();
            }
        }
        expect_special(cur, ")")?;
    }
    expect_special(cur, "{")?;
    Ok(StmtOutcome::Suspended(PendingStmt::ClassDef {
        name,
        bases,
        meta,
    }))
}

fn parse_keyword_expr_stmt(cur: &mut TokenCursor) -> Parse<StmtOutcome> {
    let meta = start_meta(cur, "keyword expr")?;
    let keyword = parse_keyword(cur)?;
    if !is_expr_keyword(&keyword.word) {
        return Err(SyntaxError::new(
            crate::error::SyntaxErrorKind::Expected {
                expected: "expression keyword".to_string(),
                found: format!("keyword '{}'", keyword.word),
            },
            keyword.span(),
        ));
    }
    let value = match keyword.word.as_str() {
        "import" => {
            if cur.is_empty() {
                return Err(SyntaxError::new(
                    crate::error::SyntaxErrorKind::ExpectedMore("import".to_string()),
                    meta.span_with_len(keyword.length()),
                ));
            }
            let first = cur.peek().unwrap();
            let target_meta = NodeMeta::at(first);
            let joined: String = cur.remaining().iter().map(|t| t.text()).collect();
            cur.skip(cur.len());
            Some(Expr::Value(ValueExpr {
                value: Atom::Identifier(Identifier::new(joined, target_meta)),
                meta: target_meta,
            }))
        }
        "delete" => {
            let target = parse_identifier(cur)?;
            let target_meta = target.meta;
            Some(Expr::Value(ValueExpr {
                value: Atom::Identifier(target),
                meta: target_meta,
            }))
        }
        _ if !cur.is_empty() => Some(parse_expr(cur, 0, false)?),
        _ => None,
    };
    Ok(StmtOutcome::Complete(Statement::KeywordExpr(KeywordExpr {
        keyword,
        value,
        meta,
    })))
}

fn parse_keyword_def(cur: &mut TokenCursor) -> Parse<StmtOutcome> {
    let meta = start_meta(cur, "keyword def")?;
    let keyword = parse_keyword(cur)?;
    if !is_def_keyword(&keyword.word) {
        return Err(SyntaxError::new(
            crate::error::SyntaxErrorKind::Expected {
                expected: "definition keyword".to_string(),
                found: format!("keyword '{}'", keyword.word),
            },
            keyword.span(),
        ));
    }
    let mut name = None;
    let mut argdefs = None;
    if is_named_def_keyword(&keyword.word) {
        name = Some(parse_identifier(cur)?);
    } else if is_args_def_keyword(&keyword.word) {
        expect_special(cur, "(")?;
        argdefs = Some(parse_argdef_list(cur)?);
        expect_special(cur, ")")?;
    }
    expect_special(cur, "{")?;
    Ok(StmtOutcome::Suspended(PendingStmt::KeywordDef {
        keyword,
        name,
        argdefs,
        meta,
    }))
}

fn parse_vardef(cur: &mut TokenCursor) -> Parse<StmtOutcome> {
    let meta = start_meta(cur, "vardef")?;
    let ty = parse_typedef(cur)?;
    let name = parse_identifier(cur)?;
    let mut value = None;
    if cur.peek().is_some_and(|t| t.kind() == TokenKind::Special) {
        let (assign, assignmeta) = parse_any_special(cur)?;
        if assign != "=" {
            return Err(SyntaxError::new(
                crate::error::SyntaxErrorKind::Expected {
                    expected: "assignment".to_string(),
                    found: format!("special '{assign}'"),
                },
                assignmeta.span_with_len(assign.chars().count()),
            ));
        }
        value = Some(parse_expr(cur, 0, false)?);
    }
    Ok(StmtOutcome::Complete(Statement::VarDef(VarDef {
        ty,
        name,
        value,
        meta,
    })))
}

fn parse_assignment_node(cur: &mut TokenCursor) -> Parse<Assignment> {
    let meta = start_meta(cur, "assignment")?;
    let mut is_attr = false;
    if cur.peek().is_some_and(|t| t.is_special(".")) {
        cur.next();
        is_attr = true;
    }
    let name = parse_identifier(cur)?;
    let mut inplace = None;
    if cur.peek().is_some_and(|t| t.kind() == TokenKind::Operator) {
        let op = parse_operator(cur)?;
        if !is_binary_operator(&op.op) {
            return Err(SyntaxError::new(
                crate::error::SyntaxErrorKind::Expected {
                    expected: "binary operator".to_string(),
                    found: format!("operator '{}'", op.op),
                },
                op.span(),
            ));
        }
        inplace = Some(op);
    }
    let (assign, assignmeta) = parse_any_special(cur)?;
    let op = match assign.as_str() {
        "=" => AssignOp::Assign,
        ":=" => AssignOp::Walrus,
        other => {
            return Err(SyntaxError::new(
                crate::error::SyntaxErrorKind::Expected {
                    expected: "assignment".to_string(),
                    found: format!("special '{other}'"),
                },
                assignmeta.span_with_len(other.chars().count()),
            ))
        }
    };
    let value = parse_expr(cur, 0, false)?;
    Ok(Assignment {
        name,
        is_attr,
        op,
        inplace,
        value,
        meta,
    })
}

fn parse_assignment_stmt(cur: &mut TokenCursor) -> Parse<StmtOutcome> {
    parse_assignment_node(cur).map(|a| StmtOutcome::Complete(Statement::Assignment(a)))
}

fn parse_unpack_assignment(cur: &mut TokenCursor) -> Parse<StmtOutcome> {
    let meta = start_meta(cur, "unpack assignment")?;
    let mut names = Vec::new();
    while cur.peek().is_some_and(|t| t.kind() != TokenKind::Special) {
        names.push(parse_identifier(cur)?);
        if cur.peek().is_some_and(|t| t.is_special(",")) {
            cur.next();
        }
    }
    if names.is_empty() {
        return Err(SyntaxError::expected("identifier", cur.peek()));
    }
    let mut inplace = None;
    if cur.peek().is_some_and(|t| t.kind() == TokenKind::Operator) {
        let op = parse_operator(cur)?;
        if !is_binary_operator(&op.op) {
            return Err(SyntaxError::expected("binary operator", cur.peek()));
        }
        inplace = Some(op);
    }
    let (assign, assignmeta) = parse_any_special(cur)?;
    let op = match assign.as_str() {
        "=" => AssignOp::Assign,
        ":=" => AssignOp::Walrus,
        other => {
            return Err(SyntaxError::new(
                crate::error::SyntaxErrorKind::Expected {
                    expected: "assignment".to_string(),
                    found: format!("special '{other}'"),
                },
                assignmeta.span_with_len(other.chars().count()),
            ))
        }
    };
    let value = parse_expr(cur, 0, false)?;
    Ok(StmtOutcome::Complete(Statement::UnpackAssignment(
        UnpackAssignment {
            names,
            op,
            inplace,
            value,
            meta,
        },
    )))
}

fn parse_attrset(cur: &mut TokenCursor) -> Parse<StmtOutcome> {
    let meta = start_meta(cur, "attrset")?;
    let value = parse_identifier(cur)?;
    let assignment = parse_assignment_node(cur)?;
    if !assignment.is_attr {
        return Err(SyntaxError::expected("attribute assignment", cur.peek()));
    }
    Ok(StmtOutcome::Complete(Statement::AttrSet(AttrSet {
        value,
        assignment,
        meta,
    })))
}

fn parse_call_stmt(cur: &mut TokenCursor) -> Parse<StmtOutcome> {
    parse_call(cur, 0).map(|call| StmtOutcome::Complete(Statement::Call(call)))
}

enum BlockOutcome {
    Inline(Block),
    Opened,
}

fn parse_block(cur: &mut TokenCursor) -> Parse<BlockOutcome> {
    if cur.peek().is_some_and(|t| t.is_special("{")) {
        cur.next();
        return Ok(BlockOutcome::Opened);
    }
    let meta = start_meta(cur, "block")?;
    let expr = parse_expr(cur, 0, false)?;
    let mut code = CodeBlock::new("<expr>", meta);
    code.nodes.push(Statement::Expr(expr));
    Ok(BlockOutcome::Inline(Block {
        code,
        braced: false,
        meta,
    }))
}

fn parse_conditional(cur: &mut TokenCursor) -> Parse<StmtOutcome> {
    let meta = start_meta(cur, "conditional")?;
    let kw = parse_keyword(cur)?;
    if kw.word != "if" {
        return Err(SyntaxError::expected("'if'", cur.peek()));
    }
    let condition = parse_expr(cur, 0, false)?;
    match parse_block(cur)? {
        BlockOutcome::Opened => Ok(StmtOutcome::Suspended(PendingStmt::Conditional {
            condition,
            meta,
        })),
        BlockOutcome::Inline(code) => Ok(StmtOutcome::Complete(Statement::Conditional(
            Conditional {
                condition,
                code,
                meta,
            },
        ))),
    }
}

fn parse_for_loop(cur: &mut TokenCursor) -> Parse<StmtOutcome> {
    let meta = start_meta(cur, "for loop")?;
    let kw = parse_keyword(cur)?;
    if kw.word != "for" {
        return Err(SyntaxError::expected("'for'", cur.peek()));
    }
    let name = parse_identifier(cur)?;
    let in_op = parse_operator(cur)?;
    if in_op.op != "in" {
        return Err(SyntaxError::expected("'in'", cur.peek()));
    }
    let iterable = parse_expr(cur, 0, false)?;
    match parse_block(cur)? {
        BlockOutcome::Opened => Ok(StmtOutcome::Suspended(PendingStmt::ForLoop {
            name,
            iterable,
            meta,
        })),
        BlockOutcome::Inline(code) => Ok(StmtOutcome::Complete(Statement::ForLoop(ForLoop {
            name,
            iterable,
            code,
            meta,
        }))),
    }
}

fn parse_while_loop(cur: &mut TokenCursor) -> Parse<StmtOutcome> {
    let meta = start_meta(cur, "while loop")?;
    let kw = parse_keyword(cur)?;
    if kw.word != "while" {
        return Err(SyntaxError::expected("'while'", cur.peek()));
    }
    let condition = parse_expr(cur, 0, false)?;
    match parse_block(cur)? {
        BlockOutcome::Opened => Ok(StmtOutcome::Suspended(PendingStmt::WhileLoop {
            condition,
            meta,
        })),
        BlockOutcome::Inline(code) => Ok(StmtOutcome::Complete(Statement::WhileLoop(WhileLoop {
            condition,
            code,
            meta,
        }))),
    }
}

fn parse_else_clause(cur: &mut TokenCursor) -> Parse<StmtOutcome> {
    let meta = start_meta(cur, "else clause")?;
    let kw = parse_keyword(cur)?;
    if kw.word != "else" {
        return Err(SyntaxError::expected("'else'", cur.peek()));
    }
    match parse_block(cur)? {
        BlockOutcome::Opened => Ok(StmtOutcome::Suspended(PendingStmt::ElseClause { meta })),
        BlockOutcome::Inline(code) => Ok(StmtOutcome::Complete(Statement::ElseClause(
            ElseClause { code, meta },
        ))),
    }
}

fn parse_expr_stmt(cur: &mut TokenCursor) -> Parse<StmtOutcome> {
    parse_expr(cur, 0, false).map(|e| StmtOutcome::Complete(Statement::Expr(e)))
}
