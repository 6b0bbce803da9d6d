//! Parser for the traversal-step grammar, e.g. `V(x).out("knows").is(y)`.
//!
//! Written with `winnow` combinators in the same style as the sibling
//! `sclang` expression-language crate this lineage also carries: small
//! `parse_*` associated functions composed with `alt`/`seq`/`delimited`,
//! each advancing a `&mut &str` cursor.

use winnow::ascii::{alpha1, digit1, multispace0};
use winnow::combinator::{alt, cut_err, delimited, fail, opt, preceded, repeat, separated_pair};
use winnow::error::{StrContext, StrContextValue};
use winnow::stream::AsChar;
use winnow::token::{take_until, take_while};
use winnow::{PResult, Parser};

use super::ast::{Anchor, Literal, Step, TraversalExpr};

pub fn parse_traversal(input: &str) -> Result<TraversalExpr, String> {
    let mut cursor = input;
    delimited(multispace0, traversal, multispace0)
        .parse_next(&mut cursor)
        .map_err(|e| format!("{e}"))
        .and_then(|expr| {
            if cursor.is_empty() {
                Ok(expr)
            } else {
                Err(format!("unexpected trailing input: {cursor:?}"))
            }
        })
}

fn traversal(input: &mut &str) -> PResult<TraversalExpr> {
    (anchor, repeat(0.., step))
        .map(|(anchor, steps)| TraversalExpr { anchor, steps })
        .parse_next(input)
}

fn anchor(input: &mut &str) -> PResult<Anchor> {
    alt((
        ("V", multispace0, "(", multispace0, ")").value(Anchor::VAll),
        ("E", multispace0, "(", multispace0, ")").value(Anchor::EAll),
        preceded(("V", multispace0, "("), cut_err(terminated_ident_rparen)).map(Anchor::VSingle),
        fail.context(StrContext::Label("anchor"))
            .context(StrContext::Expected(StrContextValue::Description(
                "V(x), V(), or E()",
            ))),
    ))
    .parse_next(input)
}

fn terminated_ident_rparen(input: &mut &str) -> PResult<String> {
    delimited(multispace0, ident, (multispace0, ")")).parse_next(input)
}

fn step(input: &mut &str) -> PResult<Step> {
    preceded(
        (multispace0, "."),
        alt((
            labeled_step("out", Step::Out),
            labeled_step("in", Step::In),
            labeled_step("bothE", Step::BothE),
            no_arg_step("outV", Step::OutV),
            no_arg_step("inV", Step::InV),
            no_arg_step("otherV", Step::OtherV),
            has_step,
            has_label_step,
            is_step,
            values_step,
            no_arg_step("count", Step::Count),
            no_arg_step("id", Step::Id),
            no_arg_step("label", Step::Label),
            fail.context(StrContext::Label("step"))
                .context(StrContext::Expected(StrContextValue::Description(
                    "out/in/bothE/outV/inV/otherV/has/hasLabel/is/values/count/id/label",
                ))),
        )),
    )
    .parse_next(input)
}

/// Builds a parser for steps of the shape `name(..)` or `name("label")`.
fn labeled_step(
    name: &'static str,
    ctor: fn(Option<String>) -> Step,
) -> impl Fn(&mut &str) -> PResult<Step> {
    move |input: &mut &str| {
        preceded(
            (name, multispace0, "("),
            cut_err(delimited(multispace0, opt(string_literal), (multispace0, ")"))),
        )
        .map(ctor)
        .parse_next(input)
    }
}

fn no_arg_step(name: &'static str, value: Step) -> impl Fn(&mut &str) -> PResult<Step> {
    move |input: &mut &str| {
        (name, opt((multispace0, "(", multispace0, ")")))
            .value(value.clone())
            .parse_next(input)
    }
}

fn has_step(input: &mut &str) -> PResult<Step> {
    preceded(
        ("has", multispace0, "("),
        cut_err(delimited(
            multispace0,
            separated_pair(string_literal, (multispace0, ",", multispace0), literal),
            (multispace0, ")"),
        )),
    )
    .map(|(key, value)| Step::Has(key, value))
    .parse_next(input)
}

fn has_label_step(input: &mut &str) -> PResult<Step> {
    preceded(
        ("hasLabel", multispace0, "("),
        cut_err(delimited(multispace0, string_literal, (multispace0, ")"))),
    )
    .map(Step::HasLabel)
    .parse_next(input)
}

fn is_step(input: &mut &str) -> PResult<Step> {
    preceded(
        ("is", multispace0, "("),
        cut_err(delimited(multispace0, ident, (multispace0, ")"))),
    )
    .map(Step::Is)
    .parse_next(input)
}

fn values_step(input: &mut &str) -> PResult<Step> {
    preceded(
        ("values", multispace0, "("),
        cut_err(delimited(multispace0, string_literal, (multispace0, ")"))),
    )
    .map(Step::Values)
    .parse_next(input)
}

fn literal(input: &mut &str) -> PResult<Literal> {
    alt((
        string_literal.map(Literal::Str),
        "true".value(Literal::Bool(true)),
        "false".value(Literal::Bool(false)),
        float_literal.map(Literal::Float),
        int_literal.map(Literal::Int),
        fail.context(StrContext::Label("literal")),
    ))
    .parse_next(input)
}

fn string_literal(input: &mut &str) -> PResult<String> {
    delimited('"', take_until(0.., '"'), '"')
        .map(|s: &str| s.to_string())
        .parse_next(input)
}

fn int_literal(input: &mut &str) -> PResult<i64> {
    (opt('-'), digit1)
        .take()
        .try_map(|s: &str| s.parse::<i64>())
        .parse_next(input)
}

fn float_literal(input: &mut &str) -> PResult<f64> {
    (opt('-'), digit1, '.', digit1)
        .take()
        .try_map(|s: &str| s.parse::<f64>())
        .parse_next(input)
}

fn ident(input: &mut &str) -> PResult<String> {
    (alpha1, take_while(0.., |c: char| c.is_alphanum() || c == '_'))
        .context(StrContext::Label("identifier"))
        .parse_next(input)
        .map(|(head, tail): (&str, &str)| format!("{head}{tail}"))
}
