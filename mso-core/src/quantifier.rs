//! The quantifier engine (spec.md §4.3): recursive backtracking over a
//! query plan's prefix, in the style of this lineage's `Resolver` — a
//! struct holding the read-only collaborators a recursive descent needs,
//! with one method per recursion shape.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashSet};
use std::rc::Rc;

use crate::candidate::family;
use crate::config::EngineConfig;
use crate::cancel::CancellationToken;
use crate::env::{Binding, Env};
use crate::error::{EngineError, EngineResult};
use crate::expr::{evaluate_bool, parse_bool_expr, try_evaluate_bool, with_binding};
use crate::ids::VertexId;
use crate::plan::{Domain, QueryPlan, Quantifier, QuantifierKind};
use crate::storage::GraphStore;

pub struct QuantifierEngine<'e, G: GraphStore> {
    graph: &'e G,
    config: &'e EngineConfig,
    cancel: &'e CancellationToken,
    /// Vertex-domain quantifiers range over the graph's vertex set as it
    /// stood when the engine was constructed (spec.md §3's snapshot
    /// invariant), in storage order.
    vertices: Vec<VertexId>,
    /// Every subset-domain quantifier in a plan draws from the same
    /// family (spec.md §4.4); computed at most once per query.
    family_cache: RefCell<Option<Rc<Vec<HashSet<VertexId>>>>>,
}

impl<'e, G: GraphStore> QuantifierEngine<'e, G> {
    pub fn new(graph: &'e G, config: &'e EngineConfig, cancel: &'e CancellationToken) -> Self {
        let mut vertices: Vec<VertexId> = graph.vertices().into_iter().map(|v| v.id).collect();
        vertices.sort();
        Self {
            graph,
            config,
            cancel,
            vertices,
            family_cache: RefCell::new(None),
        }
    }

    /// `decide(plan) -> bool` (spec.md §4.3 decision mode).
    pub fn decide(&self, plan: &QueryPlan) -> EngineResult<bool> {
        let mut env = Env::new();
        self.decide_up_to(plan, 0, plan.prefix.len(), &mut env)
    }

    /// `collect(plan) -> set of vertex-sets` (spec.md §4.3 collection
    /// mode). The plan's last quantifier must be subset-domain; every
    /// other quantifier combines exactly as it would in decision mode
    /// ("identical to decision mode", spec.md §4.3) with the candidate
    /// under consideration already bound.
    pub fn collect(&self, plan: &QueryPlan) -> EngineResult<Vec<HashSet<VertexId>>> {
        let last_idx = plan
            .prefix
            .len()
            .checked_sub(1)
            .ok_or_else(|| EngineError::PlanInvalid("prefix must be non-empty".into()))?;
        let last = &plan.prefix[last_idx];
        if last.domain != Domain::Subset {
            return Err(EngineError::PlanInvalid(
                "collection mode requires the last quantifier to be subset-domain".into(),
            ));
        }

        let mut witnesses = Vec::new();
        let mut seen = HashSet::new();
        for candidate in self.candidates_for(last, plan)? {
            self.check_cancelled()?;
            let subset = candidate
                .as_set()
                .cloned()
                .expect("last quantifier is subset-domain, validated above");

            let mut env = Env::new();
            let holds = with_binding(&mut env, &last.name, candidate, |env| {
                self.decide_up_to(plan, 0, last_idx, env)
            })?;
            if !holds {
                continue;
            }
            if let Some(agg) = &plan.aggregation {
                if !agg.holds(&subset) {
                    continue;
                }
            }
            let key: BTreeSet<VertexId> = subset.iter().copied().collect();
            if seen.insert(key) {
                witnesses.push(subset);
            }
        }

        if witnesses.len() > self.config.max_result_subsets {
            return Err(EngineError::TooLargeResult {
                limit: self.config.max_result_subsets,
                actual: witnesses.len(),
            });
        }
        Ok(witnesses)
    }

    /// Recursively combines quantifiers `idx..end` by their declared ∃/∀
    /// kind, then evaluates the leaf filter once `idx == end`. `decide()`
    /// runs this over the whole prefix; `collect()` runs it over every
    /// quantifier but the one it's enumerating, with that one's candidate
    /// already bound in `env` — so earlier quantifiers see exactly the
    /// same combination logic in both modes.
    fn decide_up_to(&self, plan: &QueryPlan, idx: usize, end: usize, env: &mut Env) -> EngineResult<bool> {
        self.check_cancelled()?;
        if idx == end {
            return self.leaf_holds(plan, env);
        }
        let q = &plan.prefix[idx];
        let candidates = self.candidates_for(q, plan)?;
        if candidates.is_empty() {
            // Vacuous quantifiers: ∃ over the empty domain is false, ∀ is
            // true (spec.md §9 flags the source's source as doing the
            // opposite).
            return Ok(q.kind == QuantifierKind::ForAll);
        }

        match q.kind {
            QuantifierKind::Exists => {
                for candidate in candidates {
                    self.check_cancelled()?;
                    let held = with_binding(env, &q.name, candidate, |env| self.decide_up_to(plan, idx + 1, end, env))?;
                    if held {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            QuantifierKind::ForAll => {
                for candidate in candidates {
                    self.check_cancelled()?;
                    let held = with_binding(env, &q.name, candidate, |env| self.decide_up_to(plan, idx + 1, end, env))?;
                    if !held {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }

    fn leaf_holds(&self, plan: &QueryPlan, env: &Env) -> EngineResult<bool> {
        let expr = parse_bool_expr(&plan.filter_body)
            .map_err(|cause| EngineError::Expression { expr: plan.filter_body.clone(), cause })?;
        if self.config.catch_expression_errors {
            Ok(evaluate_bool(&expr, self.graph, env))
        } else {
            try_evaluate_bool(&expr, self.graph, env)
                .map_err(|cause| EngineError::Expression { expr: plan.filter_body.clone(), cause })
        }
    }

    fn candidates_for(&self, q: &Quantifier, plan: &QueryPlan) -> EngineResult<Vec<Binding>> {
        match q.domain {
            Domain::Vertex => Ok(self.vertices.iter().map(|&v| Binding::Vertex(v)).collect()),
            Domain::Subset => {
                let family = self.subset_family(plan)?;
                Ok(family.iter().cloned().map(Binding::Set).collect())
            }
        }
    }

    fn subset_family(&self, plan: &QueryPlan) -> EngineResult<Rc<Vec<HashSet<VertexId>>>> {
        if let Some(cached) = self.family_cache.borrow().as_ref() {
            return Ok(Rc::clone(cached));
        }
        let mode = plan
            .candidate_mode
            .as_ref()
            .ok_or_else(|| EngineError::PlanInvalid("subset-domain quantifier requires a candidate-family selector".into()))?;

        if matches!(mode, crate::candidate::CandidateMode::PowerSet)
            && self.vertices.len() > self.config.max_power_set_vertices
        {
            return Err(EngineError::OverLimit {
                mode: mode.to_string(),
                limit: self.config.max_power_set_vertices,
                actual: self.vertices.len(),
            });
        }

        tracing::debug!(mode = %mode, "computing candidate family");
        let computed: Vec<HashSet<VertexId>> = family(mode, self.graph).collect();
        let rc = Rc::new(computed);
        *self.family_cache.borrow_mut() = Some(Rc::clone(&rc));
        Ok(rc)
    }

    fn check_cancelled(&self) -> EngineResult<()> {
        if self.cancel.is_cancelled() {
            Err(EngineError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::AttrValue;
    use crate::candidate::CandidateMode;
    use crate::model::{Edge, Vertex};
    use crate::plan::QueryPlanBuilder;
    use crate::storage::InMemoryGraph;

    /// G0 from spec.md §8: Alice -> Bob -> Charlie -> Alice, all "knows";
    /// David isolated.
    fn g0() -> (InMemoryGraph, VertexId, VertexId, VertexId, VertexId) {
        let mut g = InMemoryGraph::new();
        let alice = g.add_vertex(Vertex::new("person").with_attr("name", AttrValue::Str("Alice".into())));
        let bob = g.add_vertex(Vertex::new("person").with_attr("name", AttrValue::Str("Bob".into())));
        let charlie = g.add_vertex(Vertex::new("person").with_attr("name", AttrValue::Str("Charlie".into())));
        let david = g.add_vertex(Vertex::new("person").with_attr("name", AttrValue::Str("David".into())));
        g.add_edge(Edge::new("knows", alice, bob));
        g.add_edge(Edge::new("knows", bob, charlie));
        g.add_edge(Edge::new("knows", charlie, alice));
        (g, alice, bob, charlie, david)
    }

    fn engine(g: &InMemoryGraph, cfg: &EngineConfig, cancel: &CancellationToken) -> QuantifierEngine<'_, InMemoryGraph> {
        QuantifierEngine::new(g, cfg, cancel)
    }

    #[test]
    fn scenario_1_exists_exists_knows_is_true() {
        let (g, ..) = g0();
        let cfg = EngineConfig::default();
        let cancel = CancellationToken::new();
        let plan = QueryPlanBuilder::new()
            .exists_vertex("x")
            .exists_vertex("y")
            .filter(r#"V(x).out("knows").is(y)"#)
            .build()
            .unwrap();
        assert!(engine(&g, &cfg, &cancel).decide(&plan).unwrap());
    }

    #[test]
    fn scenario_2_exists_forall_universal_reach_is_false() {
        let (g, ..) = g0();
        let cfg = EngineConfig::default();
        let cancel = CancellationToken::new();
        let plan = QueryPlanBuilder::new()
            .exists_vertex("x")
            .forall_vertex("y")
            .filter(r#"V(y).out("knows").is(x) || V(y).is(x)"#)
            .build()
            .unwrap();
        assert!(!engine(&g, &cfg, &cancel).decide(&plan).unwrap());
    }

    #[test]
    fn scenario_3_symmetry_is_false() {
        let (g, ..) = g0();
        let cfg = EngineConfig::default();
        let cancel = CancellationToken::new();
        let plan = QueryPlanBuilder::new()
            .forall_vertex("x")
            .forall_vertex("y")
            .filter(r#"!V(x).out("knows").is(y) || V(y).out("knows").is(x)"#)
            .build()
            .unwrap();
        assert!(!engine(&g, &cfg, &cancel).decide(&plan).unwrap());
    }

    #[test]
    fn scenario_6_wcc_has_a_component_larger_than_one() {
        let (g, ..) = g0();
        let cfg = EngineConfig::default();
        let cancel = CancellationToken::new();
        let plan = QueryPlanBuilder::new()
            .exists_subset("s")
            .filter("true")
            .aggregate(crate::plan::Aggregation::SizeGt(1))
            .candidate_family(CandidateMode::Wcc)
            .build()
            .unwrap();
        let witnesses = engine(&g, &cfg, &cancel).collect(&plan).unwrap();
        assert!(witnesses.iter().any(|w| w.len() > 1));
    }

    #[test]
    fn empty_domain_vertex_exists_is_false_and_forall_is_true() {
        let g = InMemoryGraph::new();
        let cfg = EngineConfig::default();
        let cancel = CancellationToken::new();

        let exists_plan = QueryPlanBuilder::new().exists_vertex("x").filter("true").build().unwrap();
        assert!(!engine(&g, &cfg, &cancel).decide(&exists_plan).unwrap());

        let forall_plan = QueryPlanBuilder::new().forall_vertex("x").filter("false").build().unwrap();
        assert!(engine(&g, &cfg, &cancel).decide(&forall_plan).unwrap());
    }

    #[test]
    fn cancellation_is_observed() {
        let (g, ..) = g0();
        let cfg = EngineConfig::default();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let plan = QueryPlanBuilder::new().exists_vertex("x").filter("true").build().unwrap();
        let err = engine(&g, &cfg, &cancel).decide(&plan).unwrap_err();
        assert!(matches!(err, EngineError::Cancelled));
    }

    #[test]
    fn collect_power_set_yields_every_subset_when_filter_is_unconditional() {
        let (g, ..) = g0();
        let cfg = EngineConfig::default();
        let cancel = CancellationToken::new();
        let plan = QueryPlanBuilder::new()
            .exists_subset("s")
            .filter("true")
            .candidate_family(CandidateMode::PowerSet)
            .build()
            .unwrap();
        let witnesses = engine(&g, &cfg, &cancel).collect(&plan).unwrap();
        // 4 vertices -> 2^4 = 16 subsets, all distinct as sets.
        assert_eq!(witnesses.len(), 16);
        assert!(witnesses.contains(&HashSet::new()));
    }

    #[test]
    fn collect_power_set_with_size_aggregation_drops_small_subsets() {
        let (g, ..) = g0();
        let cfg = EngineConfig::default();
        let cancel = CancellationToken::new();
        let plan = QueryPlanBuilder::new()
            .exists_subset("s")
            .filter("true")
            .aggregate(crate::plan::Aggregation::SizeGt(2))
            .candidate_family(CandidateMode::PowerSet)
            .build()
            .unwrap();
        let witnesses = engine(&g, &cfg, &cancel).collect(&plan).unwrap();
        assert!(witnesses.iter().all(|w| w.len() > 2));
    }
}
