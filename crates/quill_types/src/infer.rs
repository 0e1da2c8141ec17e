//! Signature inference: the closed dispatch over node kinds that computes a
//! structural type for any AST subtree.

use crate::call::{CallArguments, Overloads, Param, ParamKind, ParamList};
use crate::error::ValidationError;
use crate::namespace::{ConstValue, NamespaceArena, NamespaceId};
use crate::registry::TypeRegistry;
use crate::signature::{FunctionSig, Signature, SignatureKind};
use crate::value::Value;
use itertools::Itertools;
use quill_ast::{ArgDef, Atom, Expr, CallExpr, Identifier, ItemKey, LiteralNode, TypeRef};
use quill_tokens::Spanned;

/// The read-only environment signature inference runs against.
#[derive(Copy, Clone)]
pub struct TypeEnv<'a> {
    pub arena: &'a NamespaceArena,
    pub registry: &'a TypeRegistry,
}

pub fn signature_of_expr(
    env: TypeEnv<'_>,
    ns: NamespaceId,
    expr: &Expr,
) -> Result<Signature, ValidationError> {
    match expr {
        Expr::Value(value) => signature_of_atom(env, ns, &value.value),
        Expr::Unary(unary) => {
            let valsig = signature_of_expr(env, ns, &unary.value)?;
            valsig
                .operators(&unary.operator.op, None)
                .map_err(|e| ValidationError::general(e.to_string(), expr.span()))
        }
        Expr::Binary(binary) => {
            let lsig = signature_of_expr(env, ns, &binary.lvalue)?;
            let rsig = signature_of_expr(env, ns, &binary.rvalue)?;
            lsig.operators(&binary.operator.op, Some(&rsig))
                .map_err(|e| ValidationError::general(e.to_string(), expr.span()))
        }
    }
}

pub fn signature_of_atom(
    env: TypeEnv<'_>,
    ns: NamespaceId,
    atom: &Atom,
) -> Result<Signature, ValidationError> {
    match atom {
        Atom::Literal(literal) => signature_of_literal(literal),
        Atom::Identifier(identifier) => signature_of_identifier(env, ns, identifier),
        Atom::Call(call) => signature_of_call(env, ns, call),
        Atom::AttrGet(attrget) => {
            let valsig = signature_of_identifier(env, ns, &attrget.value)?;
            valsig
                .attr(&attrget.optype.op, &attrget.attr.name, env.arena)
                .map_err(|e| ValidationError::general(e.to_string(), attrget.value.span()))
        }
        Atom::ItemGet(itemget) => {
            let valsig = signature_of_identifier(env, ns, &itemget.value)?;
            match &itemget.key {
                ItemKey::Index(key) => {
                    let keysig = signature_of_expr(env, ns, key)?;
                    let const_key = const_value_of(env, ns, key);
                    valsig
                        .item(&keysig, const_key.as_ref())
                        .map_err(|e| ValidationError::general(e.to_string(), itemget.value.span()))
                }
                ItemKey::Slice { .. } => Err(ValidationError::not_implemented(
                    "slice subscripts",
                    itemget.value.span(),
                )),
            }
        }
        Atom::List(list) => {
            let value = signature_of_identifier(env, ns, &list.elem_type)?;
            Ok(Signature::builtin(SignatureKind::Collection {
                key: Box::new(Signature::int()),
                value: Box::new(value),
            }))
        }
        Atom::Tuple(tuple) => {
            let mut values = Vec::with_capacity(tuple.values.len());
            for (i, value) in tuple.values.iter().enumerate() {
                let sig = match tuple.types.get(i).and_then(|t| t.as_ref()) {
                    Some(ty) => signature_of_identifier(env, ns, ty)?,
                    None => signature_of_expr(env, ns, value)?,
                };
                values.push(sig);
            }
            Ok(Signature::builtin(SignatureKind::Tuple {
                key: Box::new(Signature::int()),
                values,
            }))
        }
        Atom::Lambda(lambda) => {
            let params = param_list_of_argdefs(env, ns, &lambda.argdefs)?;
            let ret = signature_of_typedef(env, ns, &lambda.ty)?;
            let mut overloads = Overloads::new();
            overloads.insert(params, ret);
            Ok(Signature::builtin(SignatureKind::Function(FunctionSig {
                name: "<lambda>".to_string(),
                overloads,
            })))
        }
    }
}

pub fn signature_of_literal(literal: &LiteralNode) -> Result<Signature, ValidationError> {
    let value = Value::parse_literal(&literal.text)
        .map_err(|e| ValidationError::general(e.to_string(), literal.span()))?;
    let kind = match value {
        Value::Int(_) => SignatureKind::Int,
        Value::Float(_) => SignatureKind::Float,
        Value::Bool(_) => SignatureKind::Bool,
        Value::Str(_) => SignatureKind::Str,
        Value::Char(_) => SignatureKind::Char,
    };
    Ok(Signature::builtin(kind))
}

pub fn signature_of_identifier(
    env: TypeEnv<'_>,
    ns: NamespaceId,
    identifier: &Identifier,
) -> Result<Signature, ValidationError> {
    if let Some(sig) = env.registry.get(&identifier.name) {
        return Ok(sig.clone());
    }
    env.arena
        .lookup(ns, &identifier.name)
        .cloned()
        .ok_or_else(|| ValidationError::not_defined(&identifier.name, identifier.span()))
}

pub fn signature_of_typedef(
    env: TypeEnv<'_>,
    ns: NamespaceId,
    typedef: &TypeRef,
) -> Result<Signature, ValidationError> {
    let mut sig = signature_of_identifier(env, ns, &typedef.name)?;
    for modifier in &typedef.modifiers {
        sig.modifiers.apply(&modifier.word);
    }
    Ok(sig)
}

pub fn signature_of_argdef(
    env: TypeEnv<'_>,
    ns: NamespaceId,
    argdef: &ArgDef,
) -> Result<Signature, ValidationError> {
    signature_of_typedef(env, ns, &argdef.ty)
}

pub fn param_of_argdef(
    env: TypeEnv<'_>,
    ns: NamespaceId,
    argdef: &ArgDef,
) -> Result<Param, ValidationError> {
    let sig = signature_of_argdef(env, ns, argdef)?;
    let kind = match argdef.modifier {
        None => ParamKind::Mandatory,
        Some(quill_ast::ArgModifier::Default) | Some(quill_ast::ArgModifier::Optional) => {
            ParamKind::Optional
        }
        Some(quill_ast::ArgModifier::Plus) | Some(quill_ast::ArgModifier::Star) => {
            ParamKind::Variadic
        }
        Some(quill_ast::ArgModifier::DoubleStar) => ParamKind::KwVariadic,
    };
    Ok(Param {
        name: argdef.name.name.clone(),
        sig,
        kind,
    })
}

pub fn param_list_of_argdefs(
    env: TypeEnv<'_>,
    ns: NamespaceId,
    argdefs: &[ArgDef],
) -> Result<ParamList, ValidationError> {
    let params = argdefs
        .iter()
        .map(|a| param_of_argdef(env, ns, a))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ParamList::new(params))
}

pub fn signature_of_call(
    env: TypeEnv<'_>,
    ns: NamespaceId,
    call: &CallExpr,
) -> Result<Signature, ValidationError> {
    let fsig = signature_of_expr(env, ns, &call.callable)?;
    let Some(overloads) = fsig.callable_overloads() else {
        return Err(ValidationError::general(
            format!("'{}' of type '{fsig}' is not callable", call.callable),
            call.callable.span(),
        ));
    };
    let args = call_arguments(env, ns, call)?;
    overloads.find(&args).cloned().ok_or_else(|| {
        ValidationError::general(
            format!(
                "parameters '({args})' don't match any of '{}' signatures:\n{}",
                call.callable,
                overloads.describe(&call.callable.to_string()),
            ),
            call.meta.span_with_len(call.length()),
        )
    })
}

/// Builds the actual-argument shape of a call site.
pub fn call_arguments(
    env: TypeEnv<'_>,
    ns: NamespaceId,
    call: &CallExpr,
) -> Result<CallArguments, ValidationError> {
    let args = call
        .args
        .args
        .iter()
        .map(|a| signature_of_expr(env, ns, a))
        .collect::<Result<Vec<_>, _>>()?;
    let star_args = call
        .args
        .star_args
        .iter()
        .map(|a| signature_of_expr(env, ns, a))
        .collect::<Result<Vec<_>, _>>()?;
    let kwargs = call
        .kwargs
        .kwargs
        .iter()
        .map(|(k, v)| Ok((k.name.clone(), signature_of_expr(env, ns, v)?)))
        .collect::<Result<Vec<_>, ValidationError>>()?;
    let star_kwargs = call
        .kwargs
        .star_kwargs
        .iter()
        .map(|a| signature_of_expr(env, ns, a))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CallArguments {
        args,
        star_args,
        kwargs,
        star_kwargs,
    })
}

/// The statically known value of an expression, when the namespace's
/// constant table (or the literal itself) knows it.
pub fn const_value_of(env: TypeEnv<'_>, ns: NamespaceId, expr: &Expr) -> Option<Value> {
    match expr {
        Expr::Value(value) => match &value.value {
            Atom::Literal(literal) => Value::parse_literal(&literal.text).ok(),
            Atom::Identifier(identifier) => match env.arena.value(ns, &identifier.name) {
                Some(ConstValue::Known(value)) => Some(value.clone()),
                _ => None,
            },
            _ => None,
        },
        _ => None,
    }
}

/// Collapses a set of candidate signatures to at most one distinct type.
/// `auto` placeholders are discarded; more than one distinct remaining type
/// is a loud not-implemented condition.
pub fn common_type(
    sigs: impl IntoIterator<Item = Signature>,
    span: impl Into<Option<quill_tokens::Span>>,
) -> Result<Option<Signature>, ValidationError> {
    let mut distinct: Vec<Signature> = Vec::new();
    for sig in sigs {
        if sig.is_auto() {
            continue;
        }
        if !distinct.contains(&sig) {
            distinct.push(sig);
        }
    }
    match distinct.len() {
        0 => Ok(None),
        1 => Ok(Some(distinct.into_iter().next().unwrap())),
        _ => Err(ValidationError::not_implemented(
            format!(
                "common type of distinct types {}",
                distinct.iter().map(|s| format!("'{s}'")).join(", ")
            ),
            span,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_ast::NodeMeta;

    #[test]
    fn test_literal_signatures() {
        let lit = LiteralNode::new("5", NodeMeta::new(1, 0));
        assert_eq!(signature_of_literal(&lit).unwrap(), Signature::int());
        let lit = LiteralNode::new("'x'", NodeMeta::new(1, 0));
        assert_eq!(
            signature_of_literal(&lit).unwrap(),
            Signature::builtin(SignatureKind::Char)
        );
    }

    #[test]
    fn test_identifier_prefers_registry_then_chain() {
        let mut arena = NamespaceArena::new();
        let registry = TypeRegistry::standard();
        let ns = arena.root("<module>");
        arena
            .define(ns, "x", Signature::builtin(SignatureKind::Str), false)
            .unwrap();
        let env = TypeEnv {
            arena: &arena,
            registry: &registry,
        };
        let int_id = Identifier::new("int", NodeMeta::new(1, 0));
        assert_eq!(
            signature_of_identifier(env, ns, &int_id).unwrap(),
            Signature::int()
        );
        let x = Identifier::new("x", NodeMeta::new(1, 0));
        assert_eq!(
            signature_of_identifier(env, ns, &x).unwrap(),
            Signature::builtin(SignatureKind::Str)
        );
        let missing = Identifier::new("nope", NodeMeta::new(1, 0));
        assert!(signature_of_identifier(env, ns, &missing).is_err());
    }

    #[test]
    fn test_common_type_discards_auto_and_rejects_ambiguity() {
        let auto = Signature::auto();
        let int = Signature::int();
        let float = Signature::builtin(SignatureKind::Float);
        assert_eq!(common_type(vec![], None).unwrap(), None);
        assert_eq!(
            common_type(vec![auto.clone(), int.clone()], None).unwrap(),
            Some(int.clone())
        );
        assert_eq!(
            common_type(vec![int.clone(), int.clone()], None).unwrap(),
            Some(int.clone())
        );
        assert!(common_type(vec![int, float], None).is_err());
    }
}
