//! Executes a parsed `BoolExpr`/`TraversalExpr` against a `GraphStore` and
//! an `Env` (spec.md §4.1). Traversal failures — stepping off an unbound
//! identifier, calling a vertex-only step on an edge focus, and so on — are
//! caught here and folded into `Value::Null` rather than aborting the
//! surrounding decision; this is what the spec calls out as making
//! evaluation total over the boolean-composition layer.

use crate::attr::AttrValue;
use crate::env::{Binding, Env};
use crate::ids::{EdgeId, VertexId};
use crate::model::Edge;
use crate::storage::GraphStore;

use super::ast::{Anchor, BoolExpr, Literal, Step, TraversalExpr, Value};

/// What a traversal is currently standing on. `Edges` carries, alongside
/// each edge, the vertex the traversal was at when it stepped onto that
/// edge — `otherV` needs this to know which endpoint it came from.
enum Focus {
    Vertices(Vec<VertexId>),
    Edges(Vec<(Edge, VertexId)>),
    Scalar(Value),
}

struct TraversalError(String);

/// Default, total evaluation: a traversal subexpression that fails is
/// caught and coerced to `null` (spec.md §4.1 "Failure"). Used when
/// `EngineConfig::catch_expression_errors` is `true`, the default.
pub fn evaluate_bool<G: GraphStore>(expr: &BoolExpr, graph: &G, env: &Env) -> bool {
    match expr {
        BoolExpr::Const(b) => *b,
        BoolExpr::Not(inner) => !evaluate_bool(inner, graph, env),
        BoolExpr::And(lhs, rhs) => evaluate_bool(lhs, graph, env) && evaluate_bool(rhs, graph, env),
        BoolExpr::Or(lhs, rhs) => evaluate_bool(lhs, graph, env) || evaluate_bool(rhs, graph, env),
        BoolExpr::Traversal(t) => evaluate_traversal(t, graph, env).truthy(),
    }
}

/// Strict evaluation: a traversal subexpression that fails propagates its
/// cause instead of being swallowed. Used when `catch_expression_errors`
/// is `false` (spec.md §6 configuration options).
pub fn try_evaluate_bool<G: GraphStore>(expr: &BoolExpr, graph: &G, env: &Env) -> Result<bool, String> {
    match expr {
        BoolExpr::Const(b) => Ok(*b),
        BoolExpr::Not(inner) => Ok(!try_evaluate_bool(inner, graph, env)?),
        BoolExpr::And(lhs, rhs) => Ok(try_evaluate_bool(lhs, graph, env)? && try_evaluate_bool(rhs, graph, env)?),
        BoolExpr::Or(lhs, rhs) => Ok(try_evaluate_bool(lhs, graph, env)? || try_evaluate_bool(rhs, graph, env)?),
        BoolExpr::Traversal(t) => try_evaluate_traversal(t, graph, env).map(|v| v.truthy()),
    }
}

/// Evaluate a traversal expression to a `Value`, catching any internal
/// error and returning `Value::Null` in its place (spec.md §4.1 "Failure").
pub fn evaluate_traversal<G: GraphStore>(expr: &TraversalExpr, graph: &G, env: &Env) -> Value {
    match run_traversal(expr, graph, env) {
        Ok(value) => value,
        Err(TraversalError(reason)) => {
            tracing::debug!(reason, "traversal evaluation failed, coercing to null");
            Value::Null
        }
    }
}

/// As `evaluate_traversal`, but surfaces the failure reason instead of
/// coercing it away.
pub fn try_evaluate_traversal<G: GraphStore>(expr: &TraversalExpr, graph: &G, env: &Env) -> Result<Value, String> {
    run_traversal(expr, graph, env).map_err(|e| e.0)
}

fn run_traversal<G: GraphStore>(
    expr: &TraversalExpr,
    graph: &G,
    env: &Env,
) -> Result<Value, TraversalError> {
    let mut focus = anchor_focus(&expr.anchor, graph, env)?;
    for step in &expr.steps {
        focus = apply_step(focus, step, graph, env)?;
    }
    focus_to_value(focus)
}

fn anchor_focus<G: GraphStore>(
    anchor: &Anchor,
    graph: &G,
    env: &Env,
) -> Result<Focus, TraversalError> {
    match anchor {
        Anchor::VSingle(name) => {
            let binding = env
                .get(name)
                .ok_or_else(|| TraversalError(format!("unbound identifier `{name}`")))?;
            let v = binding
                .as_vertex()
                .ok_or_else(|| TraversalError(format!("`{name}` is bound to a set, not a vertex")))?;
            if graph.vertex(v).is_none() {
                return Err(TraversalError(format!("no such vertex `{v}`")));
            }
            Ok(Focus::Vertices(vec![v]))
        }
        Anchor::VAll => Ok(Focus::Vertices(graph.vertices().into_iter().map(|v| v.id).collect())),
        Anchor::EAll => Ok(Focus::Edges(
            graph
                .edges()
                .into_iter()
                .map(|e| {
                    let origin = e.source;
                    (e, origin)
                })
                .collect(),
        )),
    }
}

fn apply_step<G: GraphStore>(
    focus: Focus,
    step: &Step,
    graph: &G,
    env: &Env,
) -> Result<Focus, TraversalError> {
    match step {
        Step::Out(label) => {
            let vs = expect_vertices(focus, "out")?;
            Ok(Focus::Vertices(
                vs.into_iter()
                    .flat_map(|v| graph.out(v, label.as_deref()).into_iter().map(|n| n.id))
                    .collect(),
            ))
        }
        Step::In(label) => {
            let vs = expect_vertices(focus, "in")?;
            Ok(Focus::Vertices(
                vs.into_iter()
                    .flat_map(|v| graph.r#in(v, label.as_deref()).into_iter().map(|n| n.id))
                    .collect(),
            ))
        }
        Step::BothE(label) => {
            let vs = expect_vertices(focus, "bothE")?;
            let mut edges = Vec::new();
            for v in vs {
                edges.extend(graph.out_edges(v).into_iter().filter(|e| label_matches(e, label)).map(|e| (e, v)));
                edges.extend(graph.in_edges(v).into_iter().filter(|e| label_matches(e, label)).map(|e| (e, v)));
            }
            Ok(Focus::Edges(edges))
        }
        Step::OutV => {
            let es = expect_edges(focus, "outV")?;
            Ok(Focus::Vertices(es.into_iter().map(|(e, _)| e.source).collect()))
        }
        Step::InV => {
            let es = expect_edges(focus, "inV")?;
            Ok(Focus::Vertices(es.into_iter().map(|(e, _)| e.target).collect()))
        }
        Step::OtherV => {
            let es = expect_edges(focus, "otherV")?;
            Ok(Focus::Vertices(
                es.into_iter()
                    .map(|(e, from)| if from == e.source { e.target } else { e.source })
                    .collect(),
            ))
        }
        Step::Has(key, literal) => match focus {
            Focus::Vertices(vs) => Ok(Focus::Vertices(
                vs.into_iter()
                    .filter(|v| attr_matches(graph.vertex_attr(*v, key), literal))
                    .collect(),
            )),
            Focus::Edges(es) => Ok(Focus::Edges(
                es.into_iter()
                    .filter(|(e, _)| attr_matches(graph.edge_attr(e.id, key), literal))
                    .collect(),
            )),
            Focus::Scalar(_) => Err(TraversalError("has() requires a vertex or edge focus".into())),
        },
        Step::HasLabel(label) => match focus {
            Focus::Vertices(vs) => Ok(Focus::Vertices(
                vs.into_iter().filter(|v| graph.vertex(*v).is_some_and(|vv| &vv.label == label)).collect(),
            )),
            Focus::Edges(es) => Ok(Focus::Edges(es.into_iter().filter(|(e, _)| &e.label == label).collect())),
            Focus::Scalar(_) => Err(TraversalError("hasLabel() requires a vertex or edge focus".into())),
        },
        Step::Is(name) => {
            let vs = expect_vertices(focus, "is")?;
            let binding = env
                .get(name)
                .ok_or_else(|| TraversalError(format!("unbound identifier `{name}`")))?;
            let target = binding
                .as_vertex()
                .ok_or_else(|| TraversalError(format!("`{name}` is bound to a set, not a vertex")))?;
            Ok(Focus::Vertices(vs.into_iter().filter(|v| *v == target).collect()))
        }
        Step::Values(key) => {
            let vs = expect_vertices(focus, "values")?;
            match vs.as_slice() {
                [single] => Ok(Focus::Scalar(
                    graph
                        .vertex_attr(*single, key)
                        .map(attr_to_value)
                        .unwrap_or(Value::Null),
                )),
                _ => Ok(Focus::Scalar(Value::Null)),
            }
        }
        Step::Count => match focus {
            Focus::Vertices(vs) => Ok(Focus::Scalar(Value::Int(vs.len() as i64))),
            Focus::Edges(es) => Ok(Focus::Scalar(Value::Int(es.len() as i64))),
            Focus::Scalar(_) => Err(TraversalError("count() requires a vertex or edge focus".into())),
        },
        Step::Id => {
            let vs = expect_vertices(focus, "id")?;
            match vs.as_slice() {
                [single] => Ok(Focus::Scalar(Value::Int(single.id() as i64))),
                _ => Ok(Focus::Scalar(Value::Null)),
            }
        }
        Step::Label => match focus {
            Focus::Vertices(vs) => Ok(Focus::Scalar(match vs.as_slice() {
                [single] => graph.vertex(*single).map(|v| Value::Str(v.label)).unwrap_or(Value::Null),
                _ => Value::Null,
            })),
            Focus::Edges(es) => Ok(Focus::Scalar(match es.as_slice() {
                [(single, _)] => Value::Str(single.label.clone()),
                _ => Value::Null,
            })),
            Focus::Scalar(_) => Err(TraversalError("label() requires a vertex or edge focus".into())),
        },
    }
}

fn expect_vertices(focus: Focus, step_name: &str) -> Result<Vec<VertexId>, TraversalError> {
    match focus {
        Focus::Vertices(vs) => Ok(vs),
        _ => Err(TraversalError(format!("{step_name}() requires a vertex focus"))),
    }
}

fn expect_edges(focus: Focus, step_name: &str) -> Result<Vec<(Edge, VertexId)>, TraversalError> {
    match focus {
        Focus::Edges(es) => Ok(es),
        _ => Err(TraversalError(format!("{step_name}() requires an edge focus"))),
    }
}

fn label_matches(edge: &Edge, label: &Option<String>) -> bool {
    label.as_deref().is_none_or(|l| edge.label == l)
}

fn attr_matches(found: Option<AttrValue>, literal: &Literal) -> bool {
    match found {
        Some(value) => value == AttrValue::from(literal),
        None => false,
    }
}

fn attr_to_value(attr: AttrValue) -> Value {
    match attr {
        AttrValue::Int(i) => Value::Int(i),
        AttrValue::Float(f) => Value::Float(f),
        AttrValue::Bool(b) => Value::Bool(b),
        AttrValue::Str(s) => Value::Str(s),
        AttrValue::Null => Value::Null,
    }
}

impl From<&Literal> for AttrValue {
    fn from(lit: &Literal) -> Self {
        match lit {
            Literal::Int(i) => AttrValue::Int(*i),
            Literal::Float(f) => AttrValue::Float(*f),
            Literal::Bool(b) => AttrValue::Bool(*b),
            Literal::Str(s) => AttrValue::Str(s.clone()),
        }
    }
}

fn focus_to_value(focus: Focus) -> Result<Value, TraversalError> {
    match focus {
        Focus::Vertices(vs) => match vs.as_slice() {
            [single] => Ok(Value::Vertex(*single)),
            _ => Ok(Value::Collection(vs)),
        },
        Focus::Edges(_) => Err(TraversalError(
            "traversal ended on a bare edge focus; convert with outV/inV/otherV or terminate with count()".into(),
        )),
        Focus::Scalar(v) => Ok(v),
    }
}

/// Bind a quantified name to a single vertex or a set for the duration of
/// a closure, matching the push-on-entry/pop-on-exit discipline spec.md
/// §4.3 requires.
pub fn with_binding<T>(env: &mut Env, name: &str, binding: Binding, f: impl FnOnce(&mut Env) -> T) -> T {
    env.push(name.to_string(), binding);
    let result = f(env);
    env.pop();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::AttrValue as Av;
    use crate::expr::compose::parse_bool_expr;
    use crate::model::{Edge as ModelEdge, Vertex};
    use crate::storage::InMemoryGraph;

    fn fixture() -> (InMemoryGraph, VertexId, VertexId, VertexId) {
        let mut g = InMemoryGraph::new();
        let alice = g.add_vertex(Vertex::new("person").with_attr("name", Av::Str("Alice".into())));
        let bob = g.add_vertex(Vertex::new("person").with_attr("name", Av::Str("Bob".into())));
        let carol = g.add_vertex(Vertex::new("person").with_attr("name", Av::Str("Carol".into())));
        g.add_edge(ModelEdge::new("knows", alice, bob));
        g.add_edge(ModelEdge::new("knows", bob, carol));
        (g, alice, bob, carol)
    }

    #[test]
    fn out_with_label_reaches_neighbor() {
        let (g, alice, bob, _carol) = fixture();
        let mut env = Env::new();
        env.push("x".into(), Binding::Vertex(alice));
        env.push("y".into(), Binding::Vertex(bob));
        let expr = parse_bool_expr(r#"V(x).out("knows").is(y)"#).unwrap();
        assert!(evaluate_bool(&expr, &g, &env));
    }

    #[test]
    fn is_rejects_non_neighbor() {
        let (g, alice, _bob, carol) = fixture();
        let mut env = Env::new();
        env.push("x".into(), Binding::Vertex(alice));
        env.push("y".into(), Binding::Vertex(carol));
        let expr = parse_bool_expr(r#"V(x).out("knows").is(y)"#).unwrap();
        assert!(!evaluate_bool(&expr, &g, &env));
    }

    #[test]
    fn unbound_identifier_coerces_to_false() {
        let (g, _alice, _bob, _carol) = fixture();
        let env = Env::new();
        let expr = parse_bool_expr(r#"V(ghost).out("knows").count()"#).unwrap();
        assert!(!evaluate_bool(&expr, &g, &env));
    }

    #[test]
    fn values_reads_vertex_attribute() {
        let (g, alice, _bob, _carol) = fixture();
        let mut env = Env::new();
        env.push("x".into(), Binding::Vertex(alice));
        let expr = parse_bool_expr(r#"V(x).has("name", "Alice")"#).unwrap();
        assert!(evaluate_bool(&expr, &g, &env));
    }

    #[test]
    fn or_short_circuits_to_true_without_evaluating_rhs() {
        let (g, alice, _bob, carol) = fixture();
        let mut env = Env::new();
        env.push("x".into(), Binding::Vertex(alice));
        env.push("y".into(), Binding::Vertex(carol));
        let expr = parse_bool_expr(r#"true || V(x).out("knows").is(y)"#).unwrap();
        assert!(evaluate_bool(&expr, &g, &env));
    }
}
