//! The boolean-composition layer of the expression evaluator (spec.md
//! §4.1, §9). This is parsed by hand rather than handed wholesale to the
//! traversal sub-parser, because the traversal grammar has no notion of
//! short-circuit and the composition algorithm here is a specific,
//! non-standard one whose exact behavior — including the
//! alphanumeric-precedes-paren heuristic — is a tested invariant.

use super::ast::BoolExpr;
use super::parser::parse_traversal;

pub fn parse_bool_expr(input: &str) -> Result<BoolExpr, String> {
    let s = input.trim();
    let s = strip_outer_group_parens(s);
    let s = s.trim();

    if s.is_empty() {
        return Err("empty expression".to_string());
    }

    if let Some((lhs, rhs)) = split_top_level(s, "||") {
        return Ok(BoolExpr::Or(
            Box::new(parse_bool_expr(lhs)?),
            Box::new(parse_bool_expr(rhs)?),
        ));
    }
    if let Some((lhs, rhs)) = split_top_level(s, "&&") {
        return Ok(BoolExpr::And(
            Box::new(parse_bool_expr(lhs)?),
            Box::new(parse_bool_expr(rhs)?),
        ));
    }
    if let Some(rest) = s.strip_prefix('!') {
        return Ok(BoolExpr::Not(Box::new(parse_bool_expr(rest.trim())?)));
    }

    match s {
        "true" => Ok(BoolExpr::Const(true)),
        "false" => Ok(BoolExpr::Const(false)),
        _ => parse_traversal(s).map(BoolExpr::Traversal),
    }
}

/// A `(` is a call paren — part of a step or anchor invocation — when the
/// character immediately preceding it is alphanumeric. Only a non-call
/// (grouping) paren at the very start of the string, whose match is the
/// string's last character, wraps the whole expression and can be
/// stripped. See spec.md §9's design note: this rule must be preserved
/// exactly since mixed expressions like
/// `g.V(x).out("knows").is(y) || g.V(y).is(x)` depend on it (the `V(`
/// parens there are call parens and must never be mistaken for a
/// grouping wrap).
fn strip_outer_group_parens(s: &str) -> &str {
    let bytes = s.as_bytes();
    if bytes.is_empty() || bytes[0] != b'(' {
        return s;
    }
    // Nothing precedes index 0, so this leading '(' is trivially a
    // grouping paren, not a call paren.
    let mut depth = 0i32;
    let mut match_idx = None;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    match_idx = Some(i);
                    break;
                }
            }
            _ => {}
        }
    }
    match match_idx {
        Some(idx) if idx == s.len() - 1 => {
            strip_outer_group_parens(s[1..idx].trim())
        }
        _ => s,
    }
}

/// Find the first occurrence of `op` (`"||"` or `"&&"`) at paren depth
/// zero, and split the string there. Depth counts every `(`/`)`, call or
/// grouping alike — both kinds must be skipped over identically when
/// looking for a top-level operator.
fn split_top_level<'a>(s: &'a str, op: &str) -> Option<(&'a str, &'a str)> {
    let bytes = s.as_bytes();
    let op_bytes = op.as_bytes();
    let mut depth = 0i32;
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => depth -= 1,
            _ => {}
        }
        if depth == 0 && i + op_bytes.len() <= bytes.len() && &bytes[i..i + op_bytes.len()] == op_bytes
        {
            return Some((&s[..i], &s[i + op_bytes.len()..]));
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::ast::{Anchor, Step};

    #[test]
    fn splits_top_level_or() {
        assert_eq!(split_top_level("a || b", "||"), Some(("a ", " b")));
    }

    #[test]
    fn does_not_split_inside_call_parens() {
        assert_eq!(split_top_level(r#"out("a||b")"#, "||"), None);
    }

    #[test]
    fn strips_genuine_grouping_parens() {
        assert_eq!(strip_outer_group_parens("(a && b)"), "a && b");
    }

    #[test]
    fn does_not_strip_call_parens_even_if_they_reach_the_end() {
        // `is(x)` starts with 'i', not '(', so it's never a candidate —
        // this is the exact case the design note warns about.
        assert_eq!(strip_outer_group_parens("is(x)"), "is(x)");
    }

    #[test]
    fn mixed_call_and_or_parses() {
        let expr = parse_bool_expr(r#"V(x).out("knows").is(y) || V(y).is(x)"#).unwrap();
        match expr {
            BoolExpr::Or(lhs, rhs) => {
                assert!(matches!(*lhs, BoolExpr::Traversal(_)));
                assert!(matches!(*rhs, BoolExpr::Traversal(_)));
            }
            other => panic!("expected Or, got {other:?}"),
        }
    }

    #[test]
    fn leading_not_wraps_remainder() {
        let expr = parse_bool_expr("!V(x).hasLabel(\"person\")").unwrap();
        match expr {
            BoolExpr::Not(inner) => match *inner {
                BoolExpr::Traversal(t) => {
                    assert_eq!(t.anchor, Anchor::VSingle("x".into()));
                    assert_eq!(t.steps, vec![Step::HasLabel("person".into())]);
                }
                other => panic!("expected Traversal, got {other:?}"),
            },
            other => panic!("expected Not, got {other:?}"),
        }
    }
}
