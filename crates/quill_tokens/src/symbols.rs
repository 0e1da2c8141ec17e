//! Operator and keyword classification tables.
//!
//! The operator table is ordered by precedence tier, tighter-binding first.
//! The builder walks it loosest-first when splitting binary expressions, and
//! within a tier the spellings are tried in declaration order.

/// One precedence tier. `unary` tiers never participate in binary splitting.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct OperatorTier {
    pub unary: bool,
    pub ops: &'static [&'static str],
}

/// Precedence tiers, tightest binding first.
pub const OPERATOR_TIERS: &[OperatorTier] = &[
    OperatorTier {
        unary: true,
        ops: &["!", "+", "-", "~", "++", "--", "**"],
    },
    OperatorTier {
        unary: false,
        ops: &["**"],
    },
    OperatorTier {
        unary: false,
        ops: &["//", "*", "/", "%"],
    },
    OperatorTier {
        unary: false,
        ops: &["+", "-"],
    },
    OperatorTier {
        unary: false,
        ops: &["<<", ">>"],
    },
    OperatorTier {
        unary: false,
        ops: &["&"],
    },
    OperatorTier {
        unary: false,
        ops: &["^"],
    },
    OperatorTier {
        unary: false,
        ops: &["|"],
    },
    OperatorTier {
        unary: false,
        ops: &[
            "<", "<=", ">", ">=", "==", "!=", "is", "is not", "in", "not in", "isof",
        ],
    },
    OperatorTier {
        unary: true,
        ops: &["not"],
    },
    OperatorTier {
        unary: false,
        ops: &["&&", "and", "but"],
    },
    OperatorTier {
        unary: false,
        ops: &["^^", "xor"],
    },
    OperatorTier {
        unary: false,
        ops: &["||", "or"],
    },
    OperatorTier {
        unary: false,
        ops: &["to"],
    },
];

/// Spellings usable both as unary prefix and binary infix operators.
pub const BOTH_OPERATORS: &[&str] = &["+", "-", "++", "--", "**"];

/// Attribute access operators, longest spelling first.
pub const ATTR_OPS: &[&str] = &["->", "@.", "@", ".", ":"];

pub fn is_attr_op(text: &str) -> bool {
    ATTR_OPS.contains(&text)
}

pub fn is_unary_operator(text: &str) -> bool {
    OPERATOR_TIERS
        .iter()
        .any(|tier| tier.unary && tier.ops.contains(&text))
        || BOTH_OPERATORS.contains(&text)
}

pub fn is_binary_operator(text: &str) -> bool {
    OPERATOR_TIERS
        .iter()
        .any(|tier| !tier.unary && tier.ops.contains(&text))
        || BOTH_OPERATORS.contains(&text)
}

/// Tier index of `text` as a binary operator (lower binds tighter).
pub fn binary_precedence(text: &str) -> Option<usize> {
    OPERATOR_TIERS
        .iter()
        .position(|tier| !tier.unary && tier.ops.contains(&text))
}

/// Tier index of `text` as a unary operator.
pub fn unary_precedence(text: &str) -> Option<usize> {
    OPERATOR_TIERS
        .iter()
        .position(|tier| tier.unary && tier.ops.contains(&text))
}

/// Every operator spelling, longest first, for maximal-munch lexing.
pub fn operators_longest_first() -> Vec<&'static str> {
    let mut all: Vec<&'static str> = OPERATOR_TIERS
        .iter()
        .flat_map(|tier| tier.ops.iter().copied())
        .collect();
    all.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    all.dedup();
    all
}

/// Keyword classification. Definition keywords open a braced body; the
/// `*Named`/`*Args` variants additionally take a name or a parenthesized
/// argument list first.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KeywordClass {
    /// Structural keywords consumed by dedicated statement grammars.
    Plain,
    /// Keywords forming a `keyword [expr]` statement.
    Expr,
    Def,
    ClassDef,
    ClassDefNamed,
    ClassDefArgs,
    Modifier,
    Reserved,
}

pub const KEYWORDS: &[(&str, KeywordClass)] = &[
    ("if", KeywordClass::Plain),
    ("for", KeywordClass::Plain),
    ("in", KeywordClass::Plain),
    ("while", KeywordClass::Plain),
    ("else", KeywordClass::Plain),
    ("class", KeywordClass::Plain),
    ("return", KeywordClass::Expr),
    ("break", KeywordClass::Expr),
    ("continue", KeywordClass::Expr),
    ("import", KeywordClass::Expr),
    ("delete", KeywordClass::Expr),
    ("assert", KeywordClass::Expr),
    ("breakpoint", KeywordClass::Expr),
    ("main", KeywordClass::Def),
    ("exit", KeywordClass::Def),
    ("init", KeywordClass::ClassDef),
    ("constr", KeywordClass::ClassDefArgs),
    ("property", KeywordClass::ClassDefNamed),
    ("repr", KeywordClass::ClassDef),
    ("eq", KeywordClass::ClassDef),
    ("const", KeywordClass::Modifier),
    ("static", KeywordClass::Modifier),
    ("volatile", KeywordClass::Modifier),
    ("def", KeywordClass::Reserved),
    ("try", KeywordClass::Reserved),
    ("catch", KeywordClass::Reserved),
    ("except", KeywordClass::Reserved),
    ("finally", KeywordClass::Reserved),
    ("raise", KeywordClass::Reserved),
    ("with", KeywordClass::Reserved),
    ("yield", KeywordClass::Reserved),
    ("include", KeywordClass::Reserved),
    ("using", KeywordClass::Reserved),
    ("default", KeywordClass::Reserved),
];

pub fn keyword_class(text: &str) -> Option<KeywordClass> {
    KEYWORDS
        .iter()
        .find(|(kw, _)| *kw == text)
        .map(|(_, class)| *class)
}

pub fn is_expr_keyword(text: &str) -> bool {
    keyword_class(text) == Some(KeywordClass::Expr)
}

pub fn is_modifier_keyword(text: &str) -> bool {
    keyword_class(text) == Some(KeywordClass::Modifier)
}

/// True for every keyword that opens a braced definition body.
pub fn is_def_keyword(text: &str) -> bool {
    matches!(
        keyword_class(text),
        Some(
            KeywordClass::Def
                | KeywordClass::ClassDef
                | KeywordClass::ClassDefNamed
                | KeywordClass::ClassDefArgs
        )
    )
}

pub fn is_named_def_keyword(text: &str) -> bool {
    keyword_class(text) == Some(KeywordClass::ClassDefNamed)
}

pub fn is_args_def_keyword(text: &str) -> bool {
    keyword_class(text) == Some(KeywordClass::ClassDefArgs)
}

/// Special token spellings, longest first, for maximal-munch lexing.
pub const SPECIALS: &[&str] = &[
    "..", ":=", "->", "@.", "@", ".", ":", "#", "\\", ",", ";", "?", "=", "(", ")", "[", "]", "{",
    "}",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_is_both_unary_and_binary() {
        assert!(is_unary_operator("**"));
        assert!(is_binary_operator("**"));
        assert_eq!(binary_precedence("**"), Some(1));
    }

    #[test]
    fn test_precedence_ordering() {
        assert!(binary_precedence("*").unwrap() < binary_precedence("+").unwrap());
        assert!(binary_precedence("+").unwrap() < binary_precedence("<<").unwrap());
        assert!(binary_precedence("==").unwrap() < binary_precedence("&&").unwrap());
        assert!(binary_precedence("||").unwrap() < binary_precedence("to").unwrap());
    }

    #[test]
    fn test_keyword_classes() {
        assert!(is_expr_keyword("return"));
        assert!(is_def_keyword("main"));
        assert!(is_args_def_keyword("constr"));
        assert!(is_named_def_keyword("property"));
        assert!(is_modifier_keyword("const"));
        assert_eq!(keyword_class("if"), Some(KeywordClass::Plain));
        assert_eq!(keyword_class("frobnicate"), None);
    }

    #[test]
    fn test_longest_first_ordering() {
        let ops = operators_longest_first();
        let not_in = ops.iter().position(|o| *o == "not in").unwrap();
        let lone_in = ops.iter().position(|o| *o == "in").unwrap();
        assert!(not_in < lone_in);
    }
}
