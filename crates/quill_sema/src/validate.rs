//! The validation walk: scope and type invariants, enforced fail-fast.

use crate::{ModuleExports, SemaContext};
use itertools::Itertools;
use quill_ast::*;
use quill_tokens::{Span, Spanned};
use quill_types::infer::{
    common_type, param_list_of_argdefs, signature_of_argdef, signature_of_atom, signature_of_call,
    signature_of_expr, signature_of_identifier, signature_of_typedef, TypeEnv,
};
use quill_types::{
    ConstValue, NamespaceError, NamespaceId, ParamList, Signature, SignatureKind, ValidationError,
    Value,
};

/// Validates the tree, producing the root namespace. The only tree mutation
/// is the resolution of `auto` type placeholders.
pub fn validate(root: &mut Root, ctx: &mut SemaContext) -> Result<NamespaceId, ValidationError> {
    let name = root.code.name.clone();
    let ns = ctx.arena.root(name);
    validate_code(ctx, ns, &mut root.code)?;
    Ok(ns)
}

pub(crate) fn validate_code(
    ctx: &mut SemaContext,
    ns: NamespaceId,
    code: &mut CodeBlock,
) -> Result<(), ValidationError> {
    for stmt in &mut code.nodes {
        validate_stmt(ctx, ns, stmt)?;
    }
    Ok(())
}

fn validate_stmt(
    ctx: &mut SemaContext,
    ns: NamespaceId,
    stmt: &mut Statement,
) -> Result<(), ValidationError> {
    let result = match stmt {
        Statement::VarDef(v) => validate_vardef(ctx, ns, v),
        Statement::Assignment(a) => validate_assignment(ctx, ns, a),
        Statement::UnpackAssignment(u) => validate_unpack(ctx, ns, u),
        Statement::AttrSet(s) => validate_attrset(ctx, ns, s),
        Statement::Call(c) => validate_call(ctx, ns, c),
        Statement::KeywordExpr(k) => validate_keyword_expr(ctx, ns, k),
        Statement::KeywordDef(k) => validate_keyword_def(ctx, ns, k),
        Statement::FuncDef(f) => validate_funcdef(ctx, ns, f),
        Statement::ClassDef(c) => validate_classdef(ctx, ns, c),
        Statement::Conditional(c) => {
            validate_expr(ctx, ns, &mut c.condition)?;
            validate_block(ctx, ns, &mut c.code)
        }
        Statement::WhileLoop(w) => {
            validate_expr(ctx, ns, &mut w.condition)?;
            validate_block(ctx, ns, &mut w.code)
        }
        Statement::ForLoop(f) => validate_for_loop(ctx, ns, f),
        Statement::ElseClause(e) => validate_block(ctx, ns, &mut e.code),
        Statement::Expr(e) => validate_expr(ctx, ns, e),
    };
    result.map_err(|e| attach_scope(ctx, ns, e))
}

fn attach_scope(ctx: &SemaContext, ns: NamespaceId, error: ValidationError) -> ValidationError {
    if error.scope.is_none() {
        let scope = ctx.arena.scope_name(ns).to_string();
        error.with_scope(scope)
    } else {
        error
    }
}

/// Control-flow bodies are validated in a derived block scope.
fn validate_block(
    ctx: &mut SemaContext,
    ns: NamespaceId,
    block: &mut Block,
) -> Result<(), ValidationError> {
    let block_ns = ctx.arena.derive(ns, "<block>");
    validate_code(ctx, block_ns, &mut block.code)
}

fn define_checked(
    ctx: &mut SemaContext,
    ns: NamespaceId,
    name: &Identifier,
    sig: Signature,
    redefine: bool,
) -> Result<(), ValidationError> {
    if !redefine {
        if let Some(builtin) = ctx.registry.get(&name.name) {
            return Err(ValidationError::redefined(
                &name.name,
                builtin.typename(),
                name.span(),
            ));
        }
    }
    ctx.arena
        .define(ns, &name.name, sig, redefine)
        .map_err(|e| namespace_err(e, name.span()))
}

fn namespace_err(error: NamespaceError, span: Span) -> ValidationError {
    match error {
        NamespaceError::Redefined { name, existing } => {
            ValidationError::redefined(name, existing, span)
        }
        NamespaceError::NotDefined(name) => ValidationError::not_defined(name, span),
    }
}

/// Statically evaluates an expression through the constant-value table.
pub(crate) fn eval_static(env: TypeEnv<'_>, ns: NamespaceId, expr: &Expr) -> Option<Value> {
    match expr {
        Expr::Value(_) => quill_types::infer::const_value_of(env, ns, expr),
        Expr::Unary(unary) => {
            let value = eval_static(env, ns, &unary.value)?;
            Value::unary(&unary.operator.op, &value)
        }
        Expr::Binary(binary) if binary.operator.op != "to" => {
            let lhs = eval_static(env, ns, &binary.lvalue)?;
            let rhs = eval_static(env, ns, &binary.rvalue)?;
            Value::binary(&binary.operator.op, &lhs, &rhs)
        }
        _ => None,
    }
}

fn validate_vardef(
    ctx: &mut SemaContext,
    ns: NamespaceId,
    vardef: &mut VarDef,
) -> Result<(), ValidationError> {
    if vardef.ty.name.name == "auto" {
        let Some(value) = &vardef.value else {
            return Err(ValidationError::general(
                format!("cannot infer a type for '{}' without a value", vardef.name),
                vardef.name.span(),
            ));
        };
        let valsig = signature_of_expr(ctx.env(), ns, value)?;
        vardef.ty.name.name = valsig.typename();
    }
    let sig = signature_of_typedef(ctx.env(), ns, &vardef.ty)?;
    define_checked(ctx, ns, &vardef.name, sig.clone(), false)?;

    if let Some(value) = &mut vardef.value {
        validate_expr(ctx, ns, value)?;
        let valsig = signature_of_expr(ctx.env(), ns, value)?;
        if valsig != sig {
            return Err(ValidationError::general(
                format!(
                    "assignment of value '{value}' of type '{valsig}' to variable '{}' of type '{sig}'",
                    vardef.name
                ),
                vardef.name.span(),
            ));
        }
        let known = if sig.modifiers.is_const && !sig.modifiers.is_volatile {
            eval_static(ctx.env(), ns, value).map(ConstValue::Known)
        } else {
            None
        };
        ctx.arena
            .set_value(ns, &vardef.name.name, known.unwrap_or(ConstValue::Unknown));
    }
    Ok(())
}

fn validate_assignment(
    ctx: &mut SemaContext,
    ns: NamespaceId,
    assignment: &mut Assignment,
) -> Result<(), ValidationError> {
    validate_expr(ctx, ns, &mut assignment.value)?;
    let valsig = signature_of_expr(ctx.env(), ns, &assignment.value)?;
    if assignment.op == AssignOp::Walrus {
        define_checked(ctx, ns, &assignment.name, valsig.clone(), true)?;
    }
    if assignment.is_attr {
        // attribute target checking is the attrset statement's concern
        return Ok(());
    }
    let vartype = signature_of_identifier(ctx.env(), ns, &assignment.name)?;
    if vartype.modifiers.is_const {
        return Err(ValidationError::general(
            format!("assignment to const '{}'", assignment.name),
            assignment.name.span(),
        ));
    }
    if valsig != vartype {
        return Err(ValidationError::general(
            format!(
                "assignment of value '{}' of type '{valsig}' to variable '{}' of type '{vartype}'",
                assignment.value, assignment.name
            ),
            assignment.name.span(),
        ));
    }
    // reassignment invalidates any constant knowledge
    ctx.arena
        .set_value(ns, &assignment.name.name, ConstValue::Unknown);
    Ok(())
}

fn validate_unpack(
    ctx: &mut SemaContext,
    ns: NamespaceId,
    unpack: &mut UnpackAssignment,
) -> Result<(), ValidationError> {
    validate_expr(ctx, ns, &mut unpack.value)?;
    let valsig = signature_of_expr(ctx.env(), ns, &unpack.value)?;
    let SignatureKind::Tuple { values, .. } = valsig.kind.clone() else {
        return Err(ValidationError::general(
            format!("unpacking assignment of non-tuple '{valsig}'"),
            unpack.value.span(),
        ));
    };
    if unpack.op == AssignOp::Walrus {
        for (name, sig) in unpack.names.iter().zip(values.iter()) {
            define_checked(ctx, ns, name, sig.clone(), true)?;
        }
    }
    let mut vartypes = Vec::with_capacity(unpack.names.len());
    for name in &unpack.names {
        let vartype = signature_of_identifier(ctx.env(), ns, name)?;
        if vartype.modifiers.is_const {
            return Err(ValidationError::general(
                format!("assignment to const '{name}'"),
                name.span(),
            ));
        }
        vartypes.push(vartype);
    }
    if vartypes.len() != values.len() || vartypes.iter().zip(&values).any(|(a, b)| a != b) {
        return Err(ValidationError::general(
            format!(
                "unpacking assignment of '{valsig}' to {} variables of types ({})",
                vartypes.len(),
                vartypes.iter().join(", ")
            ),
            unpack.value.span(),
        ));
    }
    for name in &unpack.names {
        ctx.arena.set_value(ns, &name.name, ConstValue::Unknown);
    }
    Ok(())
}

fn validate_attrset(
    ctx: &mut SemaContext,
    ns: NamespaceId,
    attrset: &mut AttrSet,
) -> Result<(), ValidationError> {
    signature_of_identifier(ctx.env(), ns, &attrset.value)?;
    validate_assignment(ctx, ns, &mut attrset.assignment)
}

fn validate_call(
    ctx: &mut SemaContext,
    ns: NamespaceId,
    call: &mut CallExpr,
) -> Result<(), ValidationError> {
    validate_expr(ctx, ns, &mut call.callable)?;
    for arg in call.args.args.iter_mut().chain(&mut call.args.star_args) {
        validate_expr(ctx, ns, arg)?;
    }
    for (_, value) in &mut call.kwargs.kwargs {
        validate_expr(ctx, ns, value)?;
    }
    for arg in &mut call.kwargs.star_kwargs {
        validate_expr(ctx, ns, arg)?;
    }
    signature_of_call(ctx.env(), ns, call).map(drop)
}

fn validate_keyword_expr(
    ctx: &mut SemaContext,
    ns: NamespaceId,
    keyword_expr: &mut KeywordExpr,
) -> Result<(), ValidationError> {
    match keyword_expr.keyword.word.as_str() {
        "import" => {
            let span = keyword_expr.meta.span_with_len(keyword_expr.length());
            let Some(target) = keyword_expr.value.as_ref().and_then(Expr::as_identifier) else {
                return Err(ValidationError::general("malformed import", span));
            };
            let spec = target.name.clone();
            let target_meta = target.meta;
            let exports = ctx
                .resolver
                .resolve(&spec, ctx.registry)
                .map_err(|mut e| {
                    if e.span.is_none() {
                        e.span = Some(span);
                    }
                    e
                })?;
            match exports {
                ModuleExports::Single(name, sig) => {
                    define_checked(ctx, ns, &Identifier::new(name, target_meta), sig, false)?;
                }
                ModuleExports::All(table) => {
                    for (name, sig) in table {
                        ctx.arena.insert(ns, &name, sig);
                    }
                }
            }
            Ok(())
        }
        "delete" => {
            let Some(target) = keyword_expr.value.as_ref().and_then(Expr::as_identifier) else {
                return Err(ValidationError::general(
                    "delete needs an identifier",
                    keyword_expr.keyword.span(),
                ));
            };
            if !ctx.arena.contains(ns, &target.name) {
                return Err(ValidationError::not_defined(&target.name, target.span()));
            }
            let span = target.span();
            let name = target.name.clone();
            ctx.arena
                .delete(ns, &name)
                .map_err(|e| namespace_err(e, span))
        }
        _ => match &mut keyword_expr.value {
            Some(value) => validate_expr(ctx, ns, value),
            None => Ok(()),
        },
    }
}

/// Status of a callable name prior to overload registration.
enum CallableStatus {
    Absent,
    Known { duplicate_shape: bool },
    Other(String),
}

fn callable_status(
    ctx: &SemaContext,
    ns: NamespaceId,
    name: &str,
    params: &ParamList,
    keyword_def: bool,
) -> CallableStatus {
    match ctx.arena.lookup(ns, name) {
        None => CallableStatus::Absent,
        Some(sig) => match (&sig.kind, keyword_def) {
            (SignatureKind::Function(f), false) | (SignatureKind::KeywordDef(f), true) => {
                CallableStatus::Known {
                    duplicate_shape: f.overloads.contains_shape(params),
                }
            }
            _ => CallableStatus::Other(sig.typename()),
        },
    }
}

fn register_overload(
    ctx: &mut SemaContext,
    ns: NamespaceId,
    name: &Identifier,
    params: ParamList,
    ret: Signature,
    keyword_def: bool,
) -> Result<(), ValidationError> {
    match callable_status(ctx, ns, &name.name, &params, keyword_def) {
        CallableStatus::Absent => {
            let fsig = quill_types::FunctionSig {
                name: name.name.clone(),
                overloads: {
                    let mut overloads = quill_types::Overloads::new();
                    overloads.insert(params, ret);
                    overloads
                },
            };
            let kind = if keyword_def {
                SignatureKind::KeywordDef(fsig)
            } else {
                SignatureKind::Function(fsig)
            };
            define_checked(ctx, ns, name, Signature::builtin(kind), false)
        }
        CallableStatus::Known {
            duplicate_shape: true,
        } => Err(ValidationError::redefined(
            &name.name,
            format!("{}({params})", name.name),
            name.span(),
        )),
        CallableStatus::Known {
            duplicate_shape: false,
        } => {
            if let Some(sig) = ctx.arena.signature_mut(ns, &name.name) {
                if let SignatureKind::Function(f) | SignatureKind::KeywordDef(f) = &mut sig.kind {
                    f.overloads.insert(params, ret);
                }
            }
            Ok(())
        }
        CallableStatus::Other(existing) => {
            Err(ValidationError::redefined(&name.name, existing, name.span()))
        }
    }
}

fn validate_argdefs(
    ctx: &mut SemaContext,
    ns: NamespaceId,
    argdefs: &[ArgDef],
) -> Result<(), ValidationError> {
    for argdef in argdefs {
        let sig = signature_of_argdef(ctx.env(), ns, argdef)?;
        if sig.is_void() {
            return Err(ValidationError::general(
                format!("argument cannot have type '{}'", argdef.ty),
                argdef.name.span(),
            ));
        }
        if let Some(value) = &argdef.value {
            signature_of_atom(ctx.env(), ns, &value.value)?;
        }
    }
    Ok(())
}

/// Defines the parameters inside a callable's body scope.
fn bind_argdefs(ctx: &mut SemaContext, code_ns: NamespaceId, argdefs: &[ArgDef]) {
    let sigs: Vec<(String, Signature)> = argdefs
        .iter()
        .filter_map(|argdef| {
            signature_of_argdef(ctx.env(), code_ns, argdef)
                .ok()
                .map(|sig| (argdef.name.name.clone(), sig))
        })
        .collect();
    for (name, sig) in sigs {
        ctx.arena.insert(code_ns, &name, sig);
        ctx.arena.set_value(code_ns, &name, ConstValue::Unknown);
    }
}

/// Collects the signatures of the body's direct `return` statements.
fn return_signatures(
    ctx: &SemaContext,
    code_ns: NamespaceId,
    code: &CodeBlock,
) -> Result<Vec<Signature>, ValidationError> {
    let mut sigs = Vec::new();
    for stmt in &code.nodes {
        if let Statement::KeywordExpr(kw) = stmt {
            if kw.keyword.word == "return" {
                let sig = match &kw.value {
                    Some(value) => signature_of_expr(ctx.env(), code_ns, value)?,
                    None => Signature::void(),
                };
                sigs.push(sig);
            }
        }
    }
    Ok(sigs)
}

fn validate_funcdef(
    ctx: &mut SemaContext,
    ns: NamespaceId,
    funcdef: &mut FuncDef,
) -> Result<(), ValidationError> {
    let params = param_list_of_argdefs(ctx.env(), ns, &funcdef.argdefs)?;
    let declared = if funcdef.ty.name.name == "auto" {
        Signature::auto()
    } else {
        signature_of_typedef(ctx.env(), ns, &funcdef.ty)?
    };
    register_overload(ctx, ns, &funcdef.name, params.clone(), declared, false)?;
    validate_argdefs(ctx, ns, &funcdef.argdefs)?;

    let code_ns = ctx.arena.derive(ns, &funcdef.code.name);
    if let Some(self_sig) = ctx.arena.lookup(ns, &funcdef.name.name).cloned() {
        ctx.arena.insert(code_ns, &funcdef.name.name, self_sig);
    }
    bind_argdefs(ctx, code_ns, &funcdef.argdefs);
    validate_code(ctx, code_ns, &mut funcdef.code)?;

    let rettype = common_type(
        return_signatures(ctx, code_ns, &funcdef.code)?,
        funcdef.name.span(),
    )?
    .unwrap_or_else(Signature::void);
    if funcdef.ty.name.name == "auto" {
        funcdef.ty.name.name = rettype.typename();
        if let Some(sig) = ctx.arena.signature_mut(ns, &funcdef.name.name) {
            if let SignatureKind::Function(f) = &mut sig.kind {
                f.overloads.set_return(&params, rettype);
            }
        }
    } else {
        let expected = signature_of_typedef(ctx.env(), ns, &funcdef.ty)?;
        if rettype != expected {
            return Err(ValidationError::general(
                format!(
                    "returning value of type '{rettype}' from function with return type '{expected}'"
                ),
                funcdef.name.span(),
            ));
        }
    }
    Ok(())
}

fn validate_keyword_def(
    ctx: &mut SemaContext,
    ns: NamespaceId,
    keyword_def: &mut KeywordDef,
) -> Result<(), ValidationError> {
    let argdefs = keyword_def.argdefs.clone().unwrap_or_default();
    let params = param_list_of_argdefs(ctx.env(), ns, &argdefs)?;
    let def_name = keyword_def.def_name();
    let name_node = Identifier::new(def_name, keyword_def.meta);
    register_overload(ctx, ns, &name_node, params, Signature::void(), true)?;
    validate_argdefs(ctx, ns, &argdefs)?;

    let code_ns = ctx.arena.derive(ns, &keyword_def.code.name);
    bind_argdefs(ctx, code_ns, &argdefs);
    validate_code(ctx, code_ns, &mut keyword_def.code)
}

fn validate_classdef(
    ctx: &mut SemaContext,
    ns: NamespaceId,
    classdef: &mut ClassDef,
) -> Result<(), ValidationError> {
    for base in &classdef.bases {
        signature_of_identifier(ctx.env(), ns, base)?;
    }
    if let Some(existing) = ctx.arena.lookup(ns, &classdef.name.name) {
        let existing = existing.typename();
        return Err(ValidationError::redefined(
            &classdef.name.name,
            existing,
            classdef.name.span(),
        ));
    }
    let scope = ctx.arena.derive(ns, &classdef.code.name);

    // one constructor signature per distinct `constr` parameter shape
    let mut constructors = quill_types::Overloads::new();
    let class_ref = Signature::builtin(SignatureKind::Class(quill_types::ClassSig {
        name: classdef.name.name.clone(),
        scope,
        constructors: quill_types::Overloads::new(),
    }));
    for stmt in &classdef.code.nodes {
        if let Statement::KeywordDef(kd) = stmt {
            if kd.keyword.word == "constr" {
                let argdefs = kd.argdefs.clone().unwrap_or_default();
                let shape = param_list_of_argdefs(ctx.env(), ns, &argdefs)?;
                if constructors.contains_shape(&shape) {
                    return Err(ValidationError::redefined(
                        &classdef.name.name,
                        format!("{}({shape})", classdef.name.name),
                        classdef.name.span(),
                    ));
                }
                constructors.insert(shape, class_ref.clone());
            }
        }
    }
    let class_sig = Signature::builtin(SignatureKind::Class(quill_types::ClassSig {
        name: classdef.name.name.clone(),
        scope,
        constructors,
    }));
    define_checked(ctx, ns, &classdef.name, class_sig.clone(), false)?;
    ctx.arena.insert(scope, &classdef.name.name, class_sig);
    validate_code(ctx, scope, &mut classdef.code)
}

fn validate_for_loop(
    ctx: &mut SemaContext,
    ns: NamespaceId,
    for_loop: &mut ForLoop,
) -> Result<(), ValidationError> {
    validate_expr(ctx, ns, &mut for_loop.iterable)?;
    let itersig = signature_of_expr(ctx.env(), ns, &for_loop.iterable)?;
    let valtype = match &itersig.kind {
        SignatureKind::Collection { value, .. } => (**value).clone(),
        SignatureKind::Str => Signature::builtin(SignatureKind::Char),
        _ => {
            return Err(ValidationError::general(
                format!("'{itersig}' is not iterable"),
                for_loop.iterable.span(),
            ))
        }
    };
    define_checked(ctx, ns, &for_loop.name, valtype, false)?;
    ctx.arena.weaken(ns, &for_loop.name.name);
    ctx.arena
        .set_value(ns, &for_loop.name.name, ConstValue::Unknown);
    validate_block(ctx, ns, &mut for_loop.code)
}

pub(crate) fn validate_expr(
    ctx: &mut SemaContext,
    ns: NamespaceId,
    expr: &mut Expr,
) -> Result<(), ValidationError> {
    match expr {
        Expr::Value(value) => return validate_atom(ctx, ns, &mut value.value),
        Expr::Unary(unary) => {
            validate_expr(ctx, ns, &mut unary.value)?;
        }
        Expr::Binary(binary) => {
            validate_expr(ctx, ns, &mut binary.lvalue)?;
            validate_expr(ctx, ns, &mut binary.rvalue)?;
        }
    }
    // operator capability lookup
    signature_of_expr(ctx.env(), ns, expr).map(drop)
}

fn validate_atom(
    ctx: &mut SemaContext,
    ns: NamespaceId,
    atom: &mut Atom,
) -> Result<(), ValidationError> {
    match atom {
        Atom::Literal(literal) => {
            quill_types::infer::signature_of_literal(literal).map(drop)
        }
        Atom::Identifier(identifier) => {
            let sig = signature_of_identifier(ctx.env(), ns, identifier)?;
            let is_builtin = ctx.registry.contains(&identifier.name);
            let is_callable = sig.callable_overloads().is_some();
            let has_value = ctx.arena.value(ns, &identifier.name).is_some();
            if !is_builtin && !is_callable && !has_value {
                let span = identifier.span();
                let message = format!(
                    "using value of possibly uninitialized variable '{}'",
                    identifier.name
                );
                ctx.warn("uninitialized", span, message);
            }
            Ok(())
        }
        Atom::Call(call) => validate_call(ctx, ns, call),
        Atom::AttrGet(_) | Atom::ItemGet(_) => {
            // capability lookups happen during signature inference
            if let Atom::ItemGet(itemget) = atom {
                match &mut itemget.key {
                    ItemKey::Index(key) => validate_expr(ctx, ns, key)?,
                    ItemKey::Slice { start, stop, step } => {
                        for key in [start, stop, step].into_iter().flatten() {
                            validate_expr(ctx, ns, key)?;
                        }
                    }
                }
            }
            signature_of_atom(ctx.env(), ns, atom).map(drop)
        }
        Atom::List(list) => {
            let typesig = signature_of_identifier(ctx.env(), ns, &list.elem_type)?;
            for value in &mut list.values {
                validate_expr(ctx, ns, value)?;
            }
            for value in &list.values {
                let valsig = signature_of_expr(ctx.env(), ns, value)?;
                if valsig != typesig {
                    return Err(ValidationError::general(
                        format!(
                            "list item '{value}' does not match list type '{}'",
                            list.elem_type
                        ),
                        value.span(),
                    ));
                }
            }
            Ok(())
        }
        Atom::Tuple(tuple) => {
            for value in &mut tuple.values {
                validate_expr(ctx, ns, value)?;
            }
            for (i, value) in tuple.values.iter().enumerate() {
                if let Some(ty) = tuple.types.get(i).and_then(|t| t.as_ref()) {
                    let typesig = signature_of_identifier(ctx.env(), ns, ty)?;
                    let valsig = signature_of_expr(ctx.env(), ns, value)?;
                    if valsig != typesig {
                        return Err(ValidationError::general(
                            format!("tuple item '{value}' does not match its type '{ty}'"),
                            value.span(),
                        ));
                    }
                }
            }
            Ok(())
        }
        Atom::Lambda(lambda) => validate_lambda(ctx, ns, lambda),
    }
}

fn validate_lambda(
    ctx: &mut SemaContext,
    ns: NamespaceId,
    lambda: &mut LambdaExpr,
) -> Result<(), ValidationError> {
    validate_argdefs(ctx, ns, &lambda.argdefs)?;
    let code_ns = ctx.arena.derive(ns, &lambda.code.name);
    bind_argdefs(ctx, code_ns, &lambda.argdefs);
    validate_code(ctx, code_ns, &mut lambda.code)?;

    let rettype = common_type(
        return_signatures(ctx, code_ns, &lambda.code)?,
        lambda.ty.name.span(),
    )?
    .unwrap_or_else(Signature::void);
    if lambda.ty.name.name == "auto" {
        lambda.ty.name.name = rettype.typename();
    } else {
        let expected = signature_of_typedef(ctx.env(), ns, &lambda.ty)?;
        if rettype != expected {
            return Err(ValidationError::general(
                format!(
                    "returning value of type '{rettype}' from lambda with return type '{expected}'"
                ),
                lambda.ty.name.span(),
            ));
        }
    }
    Ok(())
}
