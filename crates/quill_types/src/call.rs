//! Parameter lists, overload multimaps, and call-argument matching.
//!
//! An overload map is ordered: resolution walks it in insertion order and
//! takes the first compatible overload. Redefinition checks compare declared
//! parameter shapes exactly, never through compatibility.

use crate::signature::{Signature, SignatureKind};
use itertools::Itertools;
use std::fmt::{Display, Formatter};

/// How one declared parameter binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Mandatory,
    /// Optional, with a declared default or a bare `?` marker.
    Optional,
    /// Captures any number of remaining positional/spread arguments.
    Variadic,
    /// Captures any number of remaining keyword arguments.
    KwVariadic,
}

/// One declared parameter.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub sig: Signature,
    pub kind: ParamKind,
}

impl Param {
    pub fn mandatory(name: impl Into<String>, sig: Signature) -> Self {
        Self {
            name: name.into(),
            sig,
            kind: ParamKind::Mandatory,
        }
    }

    pub fn optional(name: impl Into<String>, sig: Signature) -> Self {
        Self {
            name: name.into(),
            sig,
            kind: ParamKind::Optional,
        }
    }

    fn accepts(&self, arg: &Signature) -> bool {
        matches!(self.sig.kind, SignatureKind::Auto)
            || matches!(arg.kind, SignatureKind::Auto)
            || self.sig == *arg
    }
}

impl Display for Param {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            ParamKind::Mandatory => write!(f, "{}", self.sig),
            ParamKind::Optional => write!(f, "{}?", self.sig),
            ParamKind::Variadic => write!(f, "{}*", self.sig),
            ParamKind::KwVariadic => write!(f, "{}**", self.sig),
        }
    }
}

/// A declared parameter shape.
#[derive(Debug, Clone, Default)]
pub struct ParamList(pub Vec<Param>);

impl ParamList {
    pub fn new(params: Vec<Param>) -> Self {
        Self(params)
    }

    /// Exact shape equality, used by redefinition checks.
    pub fn shape_eq(&self, other: &ParamList) -> bool {
        self.0.len() == other.0.len()
            && self
                .0
                .iter()
                .zip(&other.0)
                .all(|(a, b)| a.kind == b.kind && a.sig == b.sig)
    }
}

impl Display for ParamList {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.iter().join(", "))
    }
}

/// The ordered parameter-shape → return-signature multimap of a callable.
#[derive(Debug, Clone, Default)]
pub struct Overloads {
    entries: Vec<(ParamList, Signature)>,
}

impl Overloads {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, params: ParamList, ret: Signature) {
        self.entries.push((params, ret));
    }

    pub fn contains_shape(&self, params: &ParamList) -> bool {
        self.entries.iter().any(|(p, _)| p.shape_eq(params))
    }

    /// Replaces the return signature of the overload with this exact shape;
    /// used to patch `auto` returns once inference resolves them.
    pub fn set_return(&mut self, params: &ParamList, ret: Signature) {
        if let Some((_, existing)) = self.entries.iter_mut().find(|(p, _)| p.shape_eq(params)) {
            *existing = ret;
        }
    }

    /// First compatible overload in insertion order, or a typed miss.
    pub fn find(&self, args: &CallArguments) -> Option<&Signature> {
        self.entries
            .iter()
            .find(|(params, _)| args.compatible(params))
            .map(|(_, ret)| ret)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(ParamList, Signature)> {
        self.entries.iter()
    }

    /// Human-readable list of the declared shapes, for diagnostics.
    pub fn describe(&self, name: &str) -> String {
        self.entries
            .iter()
            .map(|(params, _)| format!("{name}({params})"))
            .join("\n")
    }
}

/// A call site's actual arguments, partitioned into positional, starred,
/// keyword, and double-starred groups.
#[derive(Debug, Clone, Default)]
pub struct CallArguments {
    pub args: Vec<Signature>,
    pub star_args: Vec<Signature>,
    pub kwargs: Vec<(String, Signature)>,
    pub star_kwargs: Vec<Signature>,
}

impl CallArguments {
    pub fn positional(args: Vec<Signature>) -> Self {
        Self {
            args,
            ..Default::default()
        }
    }

    /// Whether the arguments can be bound against `params`.
    ///
    /// Parameters are walked left to right. A mandatory parameter must be
    /// satisfied by the next available positional argument, then by the next
    /// available starred argument, then by a matching keyword argument, else
    /// the call is incompatible. An optional parameter is satisfied the same
    /// way only when no mandatory parameter still needs filling further
    /// right; otherwise it is skipped and the positional argument that would
    /// have filled it backfills the first optional parameter past the last
    /// mandatory one. Compatible iff every mandatory parameter is bound and
    /// no argument is left unconsumed.
    pub fn compatible(&self, params: &ParamList) -> bool {
        let mut next_pos = 0usize;
        let mut star_used = vec![false; self.star_args.len()];
        let mut kw_used = vec![false; self.kwargs.len()];
        let mut star_kw_consumed = self.star_kwargs.is_empty();

        for (i, param) in params.0.iter().enumerate() {
            let mandatory_remains = params.0[i + 1..]
                .iter()
                .any(|p| p.kind == ParamKind::Mandatory);
            match param.kind {
                ParamKind::Mandatory => {
                    if !self.bind_one(param, &mut next_pos, &mut star_used, &mut kw_used) {
                        return false;
                    }
                }
                ParamKind::Optional => {
                    if !mandatory_remains {
                        self.bind_one(param, &mut next_pos, &mut star_used, &mut kw_used);
                    }
                }
                ParamKind::Variadic => {
                    while next_pos < self.args.len() && param.accepts(&self.args[next_pos]) {
                        next_pos += 1;
                    }
                    for (used, star) in star_used.iter_mut().zip(&self.star_args) {
                        if !*used && param.accepts(&element_type(star)) {
                            *used = true;
                        }
                    }
                }
                ParamKind::KwVariadic => {
                    for used in kw_used.iter_mut() {
                        *used = true;
                    }
                    star_kw_consumed = true;
                }
            }
        }

        next_pos == self.args.len()
            && star_used.iter().all(|u| *u)
            && kw_used.iter().all(|u| *u)
            && star_kw_consumed
    }

    fn bind_one(
        &self,
        param: &Param,
        next_pos: &mut usize,
        star_used: &mut [bool],
        kw_used: &mut [bool],
    ) -> bool {
        if *next_pos < self.args.len() && param.accepts(&self.args[*next_pos]) {
            *next_pos += 1;
            return true;
        }
        if let Some(idx) = star_used.iter().position(|u| !u) {
            if param.accepts(&element_type(&self.star_args[idx])) {
                star_used[idx] = true;
                return true;
            }
        }
        if let Some(idx) = self
            .kwargs
            .iter()
            .position(|(name, _)| *name == param.name)
        {
            if !kw_used[idx] && param.accepts(&self.kwargs[idx].1) {
                kw_used[idx] = true;
                return true;
            }
        }
        false
    }
}

/// The element type a starred spread contributes: the value type of a
/// collection, or the spread signature itself.
fn element_type(sig: &Signature) -> Signature {
    match &sig.kind {
        SignatureKind::Collection { value, .. } => (**value).clone(),
        _ => sig.clone(),
    }
}

impl Display for CallArguments {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let rendered = self
            .args
            .iter()
            .map(ToString::to_string)
            .chain(self.star_args.iter().map(|s| format!("*{s}")))
            .chain(self.kwargs.iter().map(|(k, v)| format!("{v} {k}")))
            .chain(self.star_kwargs.iter().map(|s| format!("**{s}")))
            .join(", ");
        write!(f, "{rendered}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::Signature;

    fn int() -> Signature {
        Signature::builtin(SignatureKind::Int)
    }

    fn string() -> Signature {
        Signature::builtin(SignatureKind::Str)
    }

    fn params(list: Vec<Param>) -> ParamList {
        ParamList::new(list)
    }

    #[test]
    fn test_optional_default_left_unfilled() {
        // (a: int, b: int = 0) called with (1)
        let shape = params(vec![
            Param::mandatory("a", int()),
            Param::optional("b", int()),
        ]);
        let call = CallArguments::positional(vec![int()]);
        assert!(call.compatible(&shape));
    }

    #[test]
    fn test_excess_positional_rejected() {
        // (a: int, b: int = 0) called with (1, 2, 3)
        let shape = params(vec![
            Param::mandatory("a", int()),
            Param::optional("b", int()),
        ]);
        let call = CallArguments::positional(vec![int(), int(), int()]);
        assert!(!call.compatible(&shape));
    }

    #[test]
    fn test_interior_optional_skipped_for_mandatory() {
        // (a: int, b: int = 0, c: int) called with (1, 2): the second
        // positional must reach the mandatory c, not the optional b
        let shape = params(vec![
            Param::mandatory("a", int()),
            Param::optional("b", int()),
            Param::mandatory("c", int()),
        ]);
        let call = CallArguments::positional(vec![int(), int()]);
        assert!(call.compatible(&shape));
        // and with (1) alone, c goes unbound
        let call = CallArguments::positional(vec![int()]);
        assert!(!call.compatible(&shape));
    }

    #[test]
    fn test_keyword_binding() {
        let shape = params(vec![
            Param::mandatory("a", int()),
            Param::mandatory("b", string()),
        ]);
        let call = CallArguments {
            args: vec![int()],
            kwargs: vec![("b".to_string(), string())],
            ..Default::default()
        };
        assert!(call.compatible(&shape));
        // a keyword nobody declares is left unconsumed
        let call = CallArguments {
            args: vec![int()],
            kwargs: vec![("b".into(), string()), ("z".into(), string())],
            ..Default::default()
        };
        assert!(!call.compatible(&shape));
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let shape = params(vec![Param::mandatory("a", int())]);
        let call = CallArguments::positional(vec![string()]);
        assert!(!call.compatible(&shape));
    }

    #[test]
    fn test_variadic_consumes_rest() {
        let shape = params(vec![
            Param::mandatory("a", int()),
            Param {
                name: "rest".into(),
                sig: int(),
                kind: ParamKind::Variadic,
            },
        ]);
        let call = CallArguments::positional(vec![int(), int(), int()]);
        assert!(call.compatible(&shape));
    }

    #[test]
    fn test_overload_order_and_shape_checks() {
        let mut overloads = Overloads::new();
        let int_shape = params(vec![Param::mandatory("x", int())]);
        let str_shape = params(vec![Param::mandatory("x", string())]);
        overloads.insert(int_shape.clone(), int());
        overloads.insert(str_shape.clone(), string());
        assert!(overloads.contains_shape(&int_shape));
        assert!(overloads.contains_shape(&str_shape));

        let ret = overloads
            .find(&CallArguments::positional(vec![string()]))
            .expect("str overload should match");
        assert_eq!(*ret, string());
        assert!(overloads
            .find(&CallArguments::positional(vec![int(), int()]))
            .is_none());
    }
}
