use std::collections::BTreeMap;

/// A scalar attribute value. `BTreeMap` is used for the surrounding map
/// (rather than `HashMap`) so iteration order is deterministic — useful
/// both for `render_string`-style debug output and for stable
/// serialization of query results.
#[derive(Clone, Debug, PartialEq, PartialOrd, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum AttrValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Null,
}

impl AttrValue {
    /// Coercion rule shared with expression evaluation (spec.md §4.1):
    /// `false`/`null`/empty collection coerce to `false`; everything else
    /// (including `0`, which the rule only excludes implicitly via "non-zero
    /// number") coerces to `true` unless it's numerically zero.
    pub fn truthy(&self) -> bool {
        match self {
            AttrValue::Null => false,
            AttrValue::Bool(b) => *b,
            AttrValue::Int(i) => *i != 0,
            AttrValue::Float(f) => *f != 0.0,
            AttrValue::Str(s) => !s.is_empty(),
        }
    }
}

impl std::fmt::Display for AttrValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttrValue::Int(i) => write!(f, "{i}"),
            AttrValue::Float(x) => write!(f, "{x}"),
            AttrValue::Bool(b) => write!(f, "{b}"),
            AttrValue::Str(s) => write!(f, "{s}"),
            AttrValue::Null => write!(f, "null"),
        }
    }
}

pub type AttrMap = BTreeMap<String, AttrValue>;
