//! Top-level facade gluing the quantifier engine, materializer, config,
//! and cancellation token into the shape a host actually calls.

use std::time::Instant;

use crate::cancel::CancellationToken;
use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::materialize::{CollectionResult, DecisionResult, ResultMaterializer};
use crate::plan::QueryPlan;
use crate::quantifier::QuantifierEngine;
use crate::storage::GraphStore;

pub struct QueryEngine<'e, G: GraphStore> {
    graph: &'e G,
    config: EngineConfig,
}

impl<'e, G: GraphStore> QueryEngine<'e, G> {
    pub fn new(graph: &'e G, config: EngineConfig) -> Self {
        Self { graph, config }
    }

    pub fn decide(&self, plan: &QueryPlan, cancel: &CancellationToken) -> EngineResult<DecisionResult> {
        let start = Instant::now();
        let engine = QuantifierEngine::new(self.graph, &self.config, cancel);
        tracing::info!(quantifiers = plan.prefix.len(), "decide() starting");
        let value = engine.decide(plan)?;
        Ok(ResultMaterializer::decision(value, start.elapsed()))
    }

    pub fn collect(&self, plan: &QueryPlan, cancel: &CancellationToken) -> EngineResult<CollectionResult> {
        let start = Instant::now();
        let engine = QuantifierEngine::new(self.graph, &self.config, cancel);
        tracing::info!(quantifiers = plan.prefix.len(), "collect() starting");
        let witnesses = engine.collect(plan)?;
        Ok(ResultMaterializer::collection(self.graph, witnesses, start.elapsed()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Edge, Vertex};
    use crate::plan::QueryPlanBuilder;
    use crate::storage::InMemoryGraph;

    #[test]
    fn decide_and_collect_round_trip_through_the_facade() {
        let mut g = InMemoryGraph::new();
        let a = g.add_vertex(Vertex::new("person"));
        let b = g.add_vertex(Vertex::new("person"));
        g.add_edge(Edge::new("knows", a, b));

        let engine = QueryEngine::new(&g, EngineConfig::default());
        let cancel = CancellationToken::new();

        let decision_plan = QueryPlanBuilder::new()
            .exists_vertex("x")
            .exists_vertex("y")
            .filter(r#"V(x).out("knows").is(y)"#)
            .build()
            .unwrap();
        let decision = engine.decide(&decision_plan, &cancel).unwrap();
        assert!(decision.value);
        assert_eq!(decision.kind, "bool");

        let collect_plan = QueryPlanBuilder::new()
            .exists_subset("s")
            .filter("true")
            .candidate_family(crate::candidate::CandidateMode::PowerSet)
            .build()
            .unwrap();
        let collection = engine.collect(&collect_plan, &cancel).unwrap();
        assert_eq!(collection.total_count, 4);
    }
}
