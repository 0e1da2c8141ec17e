//! Statically known constant values and their evaluation semantics.
//!
//! The optimizer folds expression trees through these exactly as the target
//! language defines them: `/` is true division producing a float, `//` and
//! `%` floor, `**` integer power, shifts and bitwise ops on integers only.
//! An operation that is not total (overflow, zero division, negative shift)
//! evaluates to `None` and simply blocks folding.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Char(char),
}

#[derive(Debug, Error)]
#[error("malformed literal: {0}")]
pub struct LiteralError(pub String);

impl Value {
    /// Parses raw literal source text. A single-quoted single-character
    /// literal is a `char`; everything else quoted is a `str`.
    pub fn parse_literal(text: &str) -> Result<Value, LiteralError> {
        let text = text.trim();
        match text {
            "true" => return Ok(Value::Bool(true)),
            "false" => return Ok(Value::Bool(false)),
            _ => {}
        }
        if let Some(quote) = text.chars().next().filter(|c| *c == '"' || *c == '\'') {
            let unescaped = unescape(text, quote)?;
            if quote == '\'' && unescaped.chars().count() == 1 {
                return Ok(Value::Char(unescaped.chars().next().unwrap()));
            }
            return Ok(Value::Str(unescaped));
        }
        let digits: String = text.chars().filter(|c| *c != '_').collect();
        let parsed = if let Some(rest) = digits.strip_prefix("0x") {
            i64::from_str_radix(rest, 16).ok().map(Value::Int)
        } else if let Some(rest) = digits.strip_prefix("0o") {
            i64::from_str_radix(rest, 8).ok().map(Value::Int)
        } else if let Some(rest) = digits.strip_prefix("0b") {
            i64::from_str_radix(rest, 2).ok().map(Value::Int)
        } else if digits.contains('.') {
            digits.parse::<f64>().ok().map(Value::Float)
        } else {
            digits.parse::<i64>().ok().map(Value::Int)
        };
        parsed.ok_or_else(|| LiteralError(text.to_string()))
    }

    /// The builtin type name of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Str(_) => "str",
            Value::Char(_) => "char",
        }
    }

    /// Re-serializable literal text.
    pub fn repr(&self) -> String {
        match self {
            Value::Int(v) => v.to_string(),
            Value::Float(v) => {
                if v.fract() == 0.0 && v.is_finite() {
                    format!("{v:.1}")
                } else {
                    v.to_string()
                }
            }
            Value::Bool(v) => v.to_string(),
            Value::Str(v) => format!("\"{}\"", escape(v)),
            Value::Char(v) => format!("'{}'", escape(&v.to_string())),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    fn truthy(&self) -> bool {
        match self {
            Value::Int(v) => *v != 0,
            Value::Float(v) => *v != 0.0,
            Value::Bool(v) => *v,
            Value::Str(v) => !v.is_empty(),
            Value::Char(_) => true,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Evaluates a unary operator application.
    pub fn unary(op: &str, value: &Value) -> Option<Value> {
        match (op, value) {
            ("+", Value::Int(v)) => Some(Value::Int(*v)),
            ("+", Value::Float(v)) => Some(Value::Float(*v)),
            ("-", Value::Int(v)) => v.checked_neg().map(Value::Int),
            ("-", Value::Float(v)) => Some(Value::Float(-v)),
            ("~", Value::Int(v)) => Some(Value::Int(!v)),
            ("!" | "not", v) => Some(Value::Bool(!v.truthy())),
            _ => None,
        }
    }

    /// Evaluates a binary operator application.
    pub fn binary(op: &str, lhs: &Value, rhs: &Value) -> Option<Value> {
        use Value::*;
        match (lhs, rhs) {
            (Int(l), Int(r)) => match op {
                "+" => l.checked_add(*r).map(Int),
                "-" => l.checked_sub(*r).map(Int),
                "*" => l.checked_mul(*r).map(Int),
                "**" => {
                    if *r >= 0 {
                        l.checked_pow(u32::try_from(*r).ok()?).map(Int)
                    } else {
                        Some(Float((*l as f64).powi(i32::try_from(*r).ok()?)))
                    }
                }
                "/" => {
                    if *r == 0 {
                        None
                    } else {
                        Some(Float(*l as f64 / *r as f64))
                    }
                }
                "//" => {
                    if *r == 0 {
                        None
                    } else {
                        l.checked_div_euclid(*r).map(Int)
                    }
                }
                "%" => {
                    if *r == 0 {
                        None
                    } else {
                        l.checked_rem_euclid(*r).map(Int)
                    }
                }
                "<<" => {
                    let shift = u32::try_from(*r).ok().filter(|s| *s < 64)?;
                    l.checked_shl(shift).map(Int)
                }
                ">>" => {
                    let shift = u32::try_from(*r).ok().filter(|s| *s < 64)?;
                    l.checked_shr(shift).map(Int)
                }
                "&" => Some(Int(l & r)),
                "^" => Some(Int(l ^ r)),
                "|" => Some(Int(l | r)),
                _ => compare_or_none(op, lhs, rhs),
            },
            (Int(_) | Float(_), Int(_) | Float(_)) => {
                let (l, r) = (lhs.as_f64()?, rhs.as_f64()?);
                match op {
                    "+" => Some(Float(l + r)),
                    "-" => Some(Float(l - r)),
                    "*" => Some(Float(l * r)),
                    "**" => Some(Float(l.powf(r))),
                    "/" => (r != 0.0).then(|| Float(l / r)),
                    "//" => (r != 0.0).then(|| Int((l / r).floor() as i64)),
                    _ => compare_or_none(op, lhs, rhs),
                }
            }
            (Bool(l), Bool(r)) => match op {
                "&&" | "and" | "but" => Some(Bool(*l && *r)),
                "||" | "or" => Some(Bool(*l || *r)),
                "^^" | "xor" => Some(Bool(l != r)),
                "==" => Some(Bool(l == r)),
                "!=" => Some(Bool(l != r)),
                _ => None,
            },
            (Str(l), Str(r)) => match op {
                "+" => Some(Str(format!("{l}{r}"))),
                "==" => Some(Bool(l == r)),
                "!=" => Some(Bool(l != r)),
                "<" => Some(Bool(l < r)),
                "<=" => Some(Bool(l <= r)),
                ">" => Some(Bool(l > r)),
                ">=" => Some(Bool(l >= r)),
                _ => None,
            },
            (Str(l), Int(r)) => match op {
                "*" => Some(Str(l.repeat(usize::try_from(*r).ok()?))),
                _ => None,
            },
            (Char(l), Char(r)) => match op {
                "==" => Some(Bool(l == r)),
                "!=" => Some(Bool(l != r)),
                _ => None,
            },
            (Char(l), Int(r)) => match op {
                "+" => char::from_u32(u32::try_from(*l as i64 + r).ok()?).map(Char),
                "-" => char::from_u32(u32::try_from(*l as i64 - r).ok()?).map(Char),
                "*" => Some(Str(l.to_string().repeat(usize::try_from(*r).ok()?))),
                _ => None,
            },
            (Char(l), Str(r)) => match op {
                "+" => Some(Str(format!("{l}{r}"))),
                _ => None,
            },
            _ => None,
        }
    }
}

fn compare_or_none(op: &str, lhs: &Value, rhs: &Value) -> Option<Value> {
    let (l, r) = (lhs.as_f64()?, rhs.as_f64()?);
    let result = match op {
        "<" => l < r,
        "<=" => l <= r,
        ">" => l > r,
        ">=" => l >= r,
        "==" => l == r,
        "!=" => l != r,
        _ => return None,
    };
    Some(Value::Bool(result))
}

fn unescape(text: &str, quote: char) -> Result<String, LiteralError> {
    let inner = text
        .strip_prefix(quote)
        .and_then(|t| t.strip_suffix(quote))
        .ok_or_else(|| LiteralError(text.to_string()))?;
    let mut out = String::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => return Err(LiteralError(text.to_string())),
        }
    }
    Ok(out)
}

fn escape(text: &str) -> String {
    text.chars()
        .flat_map(|c| match c {
            '\n' => vec!['\\', 'n'],
            '\t' => vec!['\\', 't'],
            '\r' => vec!['\\', 'r'],
            '\\' => vec!['\\', '\\'],
            '"' => vec!['\\', '"'],
            '\'' => vec!['\\', '\''],
            other => vec![other],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_radix_literals() {
        assert_eq!(Value::parse_literal("0x1f").unwrap(), Value::Int(31));
        assert_eq!(Value::parse_literal("0b101").unwrap(), Value::Int(5));
        assert_eq!(Value::parse_literal("0o17").unwrap(), Value::Int(15));
        assert_eq!(Value::parse_literal("1_000").unwrap(), Value::Int(1000));
        assert_eq!(Value::parse_literal("2.5").unwrap(), Value::Float(2.5));
    }

    #[test]
    fn test_char_vs_str() {
        assert_eq!(Value::parse_literal("'a'").unwrap(), Value::Char('a'));
        assert_eq!(
            Value::parse_literal("'ab'").unwrap(),
            Value::Str("ab".to_string())
        );
        assert_eq!(
            Value::parse_literal("\"a\"").unwrap(),
            Value::Str("a".to_string())
        );
    }

    #[test]
    fn test_true_division_produces_float() {
        assert_eq!(
            Value::binary("/", &Value::Int(1), &Value::Int(2)),
            Some(Value::Float(0.5))
        );
        assert_eq!(
            Value::binary("//", &Value::Int(7), &Value::Int(2)),
            Some(Value::Int(3))
        );
    }

    #[test]
    fn test_floor_semantics_on_negatives() {
        assert_eq!(
            Value::binary("//", &Value::Int(-7), &Value::Int(2)),
            Some(Value::Int(-4))
        );
        assert_eq!(
            Value::binary("%", &Value::Int(-7), &Value::Int(2)),
            Some(Value::Int(1))
        );
    }

    #[test]
    fn test_overflow_blocks_folding() {
        assert_eq!(Value::binary("*", &Value::Int(i64::MAX), &Value::Int(2)), None);
        assert_eq!(Value::binary("/", &Value::Int(1), &Value::Int(0)), None);
        assert_eq!(Value::binary("<<", &Value::Int(1), &Value::Int(-1)), None);
    }

    #[test]
    fn test_power_and_shift() {
        assert_eq!(
            Value::binary("**", &Value::Int(2), &Value::Int(10)),
            Some(Value::Int(1024))
        );
        assert_eq!(
            Value::binary("<<", &Value::Int(1), &Value::Int(3)),
            Some(Value::Int(8))
        );
    }

    #[test]
    fn test_char_arithmetic() {
        assert_eq!(
            Value::binary("+", &Value::Char('a'), &Value::Int(1)),
            Some(Value::Char('b'))
        );
        assert_eq!(
            Value::binary("*", &Value::Str("ab".into()), &Value::Int(2)),
            Some(Value::Str("abab".into()))
        );
    }

    #[test]
    fn test_repr_round_trips() {
        for text in ["5", "2.5", "true", "\"hi\\n\"", "'a'"] {
            let value = Value::parse_literal(text).unwrap();
            assert_eq!(Value::parse_literal(&value.repr()).unwrap(), value);
        }
    }
}
