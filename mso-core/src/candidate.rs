use std::collections::HashSet;

use crate::ids::VertexId;
use crate::storage::GraphStore;

/// Selects which family of vertex subsets a subset-domain quantifier
/// ranges over (spec.md §4.2).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum CandidateMode {
    PowerSet,
    Wcc,
    Scc,
    Community,
    Bfs(VertexId),
}

impl std::fmt::Display for CandidateMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CandidateMode::PowerSet => write!(f, "power-set"),
            CandidateMode::Wcc => write!(f, "wcc"),
            CandidateMode::Scc => write!(f, "scc"),
            CandidateMode::Community => write!(f, "community"),
            CandidateMode::Bfs(seed) => write!(f, "bfs({seed})"),
        }
    }
}

/// Depth-first include/exclude walk over a fixed vertex ordering, using an
/// explicit stack rather than recursion (spec.md §9: candidate generation
/// recurses to depth `|V|`, which can exceed a language's default stack).
/// Each leaf — a fully decided subset — is yielded on the way out, so the
/// full power set is never materialized at once.
pub struct PowerSetIter {
    vertices: Vec<VertexId>,
    stack: Vec<(usize, Vec<VertexId>)>,
}

impl PowerSetIter {
    pub fn new(mut vertices: Vec<VertexId>) -> Self {
        vertices.sort();
        let stack = vec![(0, Vec::new())];
        Self { vertices, stack }
    }
}

impl Iterator for PowerSetIter {
    type Item = HashSet<VertexId>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((idx, included)) = self.stack.pop() {
            if idx == self.vertices.len() {
                return Some(included.into_iter().collect());
            }
            let exclude = included.clone();
            let mut include = included;
            include.push(self.vertices[idx]);
            self.stack.push((idx + 1, exclude));
            self.stack.push((idx + 1, include));
        }
        None
    }
}

/// Produce the family of vertex subsets for `mode` over `graph`. `wcc`,
/// `scc`, and `community` are read directly from the storage engine;
/// `power-set` is generated lazily by `PowerSetIter`; `bfs(seed)` yields
/// the single reachable set. The provider imposes no cap of its own —
/// spec.md §4.2 leaves that to higher layers (see `config::EngineConfig`).
pub fn family<G: GraphStore>(
    mode: &CandidateMode,
    graph: &G,
) -> Box<dyn Iterator<Item = HashSet<VertexId>>> {
    match mode {
        CandidateMode::PowerSet => {
            let vertices = graph.vertices().into_iter().map(|v| v.id).collect();
            Box::new(PowerSetIter::new(vertices))
        }
        CandidateMode::Wcc => Box::new(graph.components_weak().into_iter()),
        CandidateMode::Scc => Box::new(graph.components_strong().into_iter()),
        CandidateMode::Community => Box::new(graph.communities().into_iter()),
        CandidateMode::Bfs(seed) => Box::new(std::iter::once(graph.bfs(*seed))),
    }
}
