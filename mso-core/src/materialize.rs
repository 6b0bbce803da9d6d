//! Result materialization (spec.md §4.5): packages a decision-mode
//! boolean or a collection-mode set-of-sets into a neutral, serializable
//! structure, computing each witness's induced subgraph along the way.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::attr::AttrMap;
use crate::ids::{EdgeId, VertexId};
use crate::storage::GraphStore;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VertexView {
    pub id: VertexId,
    pub label: String,
    pub attrs: AttrMap,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EdgeView {
    pub id: EdgeId,
    pub label: String,
    pub source_id: VertexId,
    pub target_id: VertexId,
    pub attrs: AttrMap,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WitnessSubset {
    pub vertices: Vec<VertexView>,
    pub edges: Vec<EdgeView>,
    pub size: usize,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DecisionResult {
    pub kind: String,
    pub value: bool,
    pub elapsed_ms: u128,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CollectionResult {
    pub kind: String,
    pub subsets: Vec<WitnessSubset>,
    pub total_count: usize,
    pub elapsed_ms: u128,
}

pub struct ResultMaterializer;

impl ResultMaterializer {
    pub fn decision(value: bool, elapsed: Duration) -> DecisionResult {
        DecisionResult { kind: "bool".to_string(), value, elapsed_ms: elapsed.as_millis() }
    }

    /// For each witness set `S`, computes the induced subgraph `{e :
    /// source(e) ∈ S ∧ target(e) ∈ S}` (spec.md §3, §4.5). Out-edges of
    /// every vertex appearing in *any* witness are fetched once and
    /// cached, then intersected per witness, so a vertex recurring across
    /// many witnesses is scanned exactly once.
    pub fn collection<G: GraphStore>(
        graph: &G,
        witnesses: Vec<HashSet<VertexId>>,
        elapsed: Duration,
    ) -> CollectionResult {
        let all_vertices: HashSet<VertexId> = witnesses.iter().flatten().copied().collect();
        let out_edge_cache: HashMap<VertexId, Vec<crate::model::Edge>> = all_vertices
            .iter()
            .map(|&v| (v, graph.out_edges(v)))
            .collect();

        let subsets = witnesses
            .into_iter()
            .map(|members| Self::induce(graph, &out_edge_cache, members))
            .collect::<Vec<_>>();

        let total_count = subsets.len();
        tracing::debug!(total_count, "materialized collection result");
        CollectionResult { kind: "vset".to_string(), subsets, total_count, elapsed_ms: elapsed.as_millis() }
    }

    fn induce<G: GraphStore>(
        graph: &G,
        out_edge_cache: &HashMap<VertexId, Vec<crate::model::Edge>>,
        members: HashSet<VertexId>,
    ) -> WitnessSubset {
        let mut edges = Vec::new();
        let mut seen_edges = HashSet::new();
        for v in &members {
            for edge in out_edge_cache.get(v).into_iter().flatten() {
                if members.contains(&edge.target) && seen_edges.insert(edge.id) {
                    edges.push(EdgeView {
                        id: edge.id,
                        label: edge.label.clone(),
                        source_id: edge.source,
                        target_id: edge.target,
                        attrs: edge.attrs.clone(),
                    });
                }
            }
        }

        let mut vertices: Vec<VertexView> = members
            .iter()
            .filter_map(|&v| graph.vertex(v))
            .map(|v| VertexView { id: v.id, label: v.label, attrs: v.attrs })
            .collect();
        vertices.sort_by_key(|v| v.id);
        edges.sort_by_key(|e| e.id);

        WitnessSubset { size: vertices.len(), vertices, edges }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::AttrValue;
    use crate::model::{Edge, Vertex};
    use crate::storage::InMemoryGraph;

    #[test]
    fn induced_subgraph_keeps_only_internal_edges() {
        let mut g = InMemoryGraph::new();
        let a = g.add_vertex(Vertex::new("person").with_attr("name", AttrValue::Str("a".into())));
        let b = g.add_vertex(Vertex::new("person"));
        let c = g.add_vertex(Vertex::new("person"));
        g.add_edge(Edge::new("knows", a, b));
        g.add_edge(Edge::new("knows", b, c));

        let witnesses = vec![HashSet::from([a, b])];
        let result = ResultMaterializer::collection(&g, witnesses, Duration::from_millis(1));
        assert_eq!(result.total_count, 1);
        let subset = &result.subsets[0];
        assert_eq!(subset.size, 2);
        assert_eq!(subset.edges.len(), 1);
        assert_eq!(subset.edges[0].source_id, a);
        assert_eq!(subset.edges[0].target_id, b);
    }

    #[test]
    fn decision_result_carries_kind_and_value() {
        let result = ResultMaterializer::decision(true, Duration::from_millis(5));
        assert_eq!(result.kind, "bool");
        assert!(result.value);
    }
}
