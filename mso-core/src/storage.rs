use std::collections::{HashMap, HashSet, VecDeque};

use crate::attr::AttrValue;
use crate::ids::{EdgeId, VertexId};
use crate::model::{Edge, Vertex};

/// The storage-engine contract the evaluator consumes (spec.md §6). All
/// calls are read-only and idempotent. A reimplementation may back this
/// with a real database; `InMemoryGraph` below is the reference
/// implementation this crate ships so the evaluator is usable standalone.
pub trait GraphStore {
    fn vertices(&self) -> Vec<Vertex>;
    fn edges(&self) -> Vec<Edge>;
    fn vertex(&self, id: VertexId) -> Option<Vertex>;

    fn out(&self, v: VertexId, label: Option<&str>) -> Vec<Vertex>;
    fn r#in(&self, v: VertexId, label: Option<&str>) -> Vec<Vertex>;
    fn both(&self, v: VertexId, label: Option<&str>) -> Vec<Vertex>;

    fn out_edges(&self, v: VertexId) -> Vec<Edge>;
    fn in_edges(&self, v: VertexId) -> Vec<Edge>;

    fn vertex_attr(&self, v: VertexId, key: &str) -> Option<AttrValue>;
    fn edge_attr(&self, e: EdgeId, key: &str) -> Option<AttrValue>;

    fn components_weak(&self) -> Vec<HashSet<VertexId>>;
    fn components_strong(&self) -> Vec<HashSet<VertexId>>;
    fn communities(&self) -> Vec<HashSet<VertexId>>;
    fn bfs(&self, seed: VertexId) -> HashSet<VertexId>;
}

/// Arena-backed in-memory graph: vertices and edges each in their own
/// `HashMap` keyed by a stable id, adjacency stored as id lists. This
/// avoids ownership cycles and makes set membership trivially hashable
/// (spec.md §9, "Cyclic graph data model").
#[derive(Debug, Default, Clone)]
pub struct InMemoryGraph {
    vertices: HashMap<VertexId, Vertex>,
    edges: HashMap<EdgeId, Edge>,
    out_adj: HashMap<VertexId, Vec<EdgeId>>,
    in_adj: HashMap<VertexId, Vec<EdgeId>>,
}

impl InMemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vertex(&mut self, vertex: Vertex) -> VertexId {
        let id = vertex.id;
        tracing::trace!(vertex = %id, label = %vertex.label, "adding vertex");
        self.vertices.insert(id, vertex);
        self.out_adj.entry(id).or_default();
        self.in_adj.entry(id).or_default();
        id
    }

    pub fn add_edge(&mut self, edge: Edge) -> EdgeId {
        let id = edge.id;
        tracing::trace!(edge = %id, source = %edge.source, target = %edge.target, label = %edge.label, "adding edge");
        self.out_adj.entry(edge.source).or_default().push(id);
        self.in_adj.entry(edge.target).or_default().push(id);
        self.edges.insert(id, edge);
        id
    }

    fn edge_endpoint_matches(&self, edge: &Edge, label: Option<&str>) -> bool {
        label.is_none_or(|l| edge.label == l)
    }
}

impl GraphStore for InMemoryGraph {
    fn vertices(&self) -> Vec<Vertex> {
        self.vertices.values().cloned().collect()
    }

    fn edges(&self) -> Vec<Edge> {
        self.edges.values().cloned().collect()
    }

    fn vertex(&self, id: VertexId) -> Option<Vertex> {
        self.vertices.get(&id).cloned()
    }

    fn out(&self, v: VertexId, label: Option<&str>) -> Vec<Vertex> {
        self.out_edges_filtered(v, label)
            .filter_map(|e| self.vertices.get(&e.target).cloned())
            .collect()
    }

    fn r#in(&self, v: VertexId, label: Option<&str>) -> Vec<Vertex> {
        self.in_edges_filtered(v, label)
            .filter_map(|e| self.vertices.get(&e.source).cloned())
            .collect()
    }

    fn both(&self, v: VertexId, label: Option<&str>) -> Vec<Vertex> {
        let mut out = self.out(v, label);
        out.extend(self.r#in(v, label));
        out
    }

    fn out_edges(&self, v: VertexId) -> Vec<Edge> {
        self.out_edges_filtered(v, None).cloned().collect()
    }

    fn in_edges(&self, v: VertexId) -> Vec<Edge> {
        self.in_edges_filtered(v, None).cloned().collect()
    }

    fn vertex_attr(&self, v: VertexId, key: &str) -> Option<AttrValue> {
        self.vertices.get(&v).and_then(|vv| vv.attrs.get(key).cloned())
    }

    fn edge_attr(&self, e: EdgeId, key: &str) -> Option<AttrValue> {
        self.edges.get(&e).and_then(|ee| ee.attrs.get(key).cloned())
    }

    fn components_weak(&self) -> Vec<HashSet<VertexId>> {
        let mut seen: HashSet<VertexId> = HashSet::new();
        let mut components = Vec::new();
        for &start in self.vertices.keys() {
            if seen.contains(&start) {
                continue;
            }
            let mut comp = HashSet::new();
            let mut queue = VecDeque::from([start]);
            comp.insert(start);
            seen.insert(start);
            while let Some(cur) = queue.pop_front() {
                for neighbor in self.undirected_neighbors(cur) {
                    if seen.insert(neighbor) {
                        comp.insert(neighbor);
                        queue.push_back(neighbor);
                    }
                }
            }
            components.push(comp);
        }
        tracing::debug!(count = components.len(), "computed weakly connected components");
        components
    }

    fn components_strong(&self) -> Vec<HashSet<VertexId>> {
        tarjan_scc(self)
    }

    fn communities(&self) -> Vec<HashSet<VertexId>> {
        label_propagation(self)
    }

    fn bfs(&self, seed: VertexId) -> HashSet<VertexId> {
        let mut visited = HashSet::new();
        if !self.vertices.contains_key(&seed) {
            return visited;
        }
        let mut queue = VecDeque::from([seed]);
        visited.insert(seed);
        while let Some(cur) = queue.pop_front() {
            for neighbor in self.undirected_neighbors(cur) {
                if visited.insert(neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
        visited
    }
}

impl InMemoryGraph {
    fn out_edges_filtered<'a>(&'a self, v: VertexId, label: Option<&'a str>) -> impl Iterator<Item = &'a Edge> {
        self.out_adj
            .get(&v)
            .into_iter()
            .flatten()
            .filter_map(move |eid| self.edges.get(eid))
            .filter(move |e| self.edge_endpoint_matches(e, label))
    }

    fn in_edges_filtered<'a>(&'a self, v: VertexId, label: Option<&'a str>) -> impl Iterator<Item = &'a Edge> {
        self.in_adj
            .get(&v)
            .into_iter()
            .flatten()
            .filter_map(move |eid| self.edges.get(eid))
            .filter(move |e| self.edge_endpoint_matches(e, label))
    }

    fn undirected_neighbors(&self, v: VertexId) -> Vec<VertexId> {
        let mut out: Vec<VertexId> = self
            .out_edges_filtered(v, None)
            .map(|e| e.target)
            .collect();
        out.extend(self.in_edges_filtered(v, None).map(|e| e.source));
        out
    }
}

/// Tarjan's strongly connected components, iterative to avoid recursion
/// depth issues on large graphs (spec.md §9 asks for the same care around
/// the power-set generator; the same principle applies here).
fn tarjan_scc(graph: &InMemoryGraph) -> Vec<HashSet<VertexId>> {
    struct State {
        index: HashMap<VertexId, usize>,
        lowlink: HashMap<VertexId, usize>,
        on_stack: HashSet<VertexId>,
        stack: Vec<VertexId>,
        next_index: usize,
        components: Vec<HashSet<VertexId>>,
    }

    enum Frame {
        Enter(VertexId),
        Finish(VertexId, Vec<VertexId>),
    }

    let mut state = State {
        index: HashMap::new(),
        lowlink: HashMap::new(),
        on_stack: HashSet::new(),
        stack: Vec::new(),
        next_index: 0,
        components: Vec::new(),
    };

    for &start in graph.vertices.keys() {
        if state.index.contains_key(&start) {
            continue;
        }
        let mut work = vec![Frame::Enter(start)];
        while let Some(frame) = work.pop() {
            match frame {
                Frame::Enter(v) => {
                    if state.index.contains_key(&v) {
                        continue;
                    }
                    state.index.insert(v, state.next_index);
                    state.lowlink.insert(v, state.next_index);
                    state.next_index += 1;
                    state.stack.push(v);
                    state.on_stack.insert(v);

                    let successors: Vec<VertexId> =
                        graph.out_edges_filtered(v, None).map(|e| e.target).collect();
                    work.push(Frame::Finish(v, successors.clone()));
                    for w in successors {
                        if !state.index.contains_key(&w) {
                            work.push(Frame::Enter(w));
                        }
                    }
                }
                Frame::Finish(v, successors) => {
                    for w in successors {
                        if state.on_stack.contains(&w) {
                            let wl = state.lowlink[&w];
                            let vl = state.lowlink[&v];
                            state.lowlink.insert(v, vl.min(wl));
                        } else if let Some(&wi) = state.index.get(&w) {
                            // w already finished and not on stack: only
                            // relevant if it was a cross edge into a
                            // completed component, lowlink unaffected.
                            let _ = wi;
                        }
                    }
                    if state.lowlink[&v] == state.index[&v] {
                        let mut comp = HashSet::new();
                        while let Some(w) = state.stack.pop() {
                            state.on_stack.remove(&w);
                            comp.insert(w);
                            if w == v {
                                break;
                            }
                        }
                        state.components.push(comp);
                    }
                }
            }
        }
    }

    tracing::debug!(count = state.components.len(), "computed strongly connected components");
    state.components
}

/// Greedy label-propagation community detection: every vertex starts in
/// its own community; each round, every vertex adopts the majority label
/// among its (undirected) neighbors, ties broken by smallest label.
/// Terminates when no vertex changes label or after a fixed round cap.
fn label_propagation(graph: &InMemoryGraph) -> Vec<HashSet<VertexId>> {
    let mut labels: HashMap<VertexId, VertexId> =
        graph.vertices.keys().map(|&v| (v, v)).collect();

    const MAX_ROUNDS: usize = 100;
    for _ in 0..MAX_ROUNDS {
        let mut changed = false;
        let mut order: Vec<VertexId> = graph.vertices.keys().copied().collect();
        order.sort();
        for &v in &order {
            let neighbors = graph.undirected_neighbors(v);
            if neighbors.is_empty() {
                continue;
            }
            let mut counts: HashMap<VertexId, usize> = HashMap::new();
            for n in neighbors {
                *counts.entry(labels[&n]).or_insert(0) += 1;
            }
            let best = counts
                .into_iter()
                .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
                .map(|(label, _)| label)
                .unwrap();
            if labels[&v] != best {
                labels.insert(v, best);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    let mut groups: HashMap<VertexId, HashSet<VertexId>> = HashMap::new();
    for (v, label) in labels {
        groups.entry(label).or_default().insert(v);
    }
    let communities: Vec<_> = groups.into_values().collect();
    tracing::debug!(count = communities.len(), "computed communities");
    communities
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> (InMemoryGraph, VertexId, VertexId, VertexId, VertexId) {
        let mut g = InMemoryGraph::new();
        let a = g.add_vertex(Vertex::new("person"));
        let b = g.add_vertex(Vertex::new("person"));
        let c = g.add_vertex(Vertex::new("person"));
        let d = g.add_vertex(Vertex::new("person"));
        g.add_edge(Edge::new("knows", a, b));
        g.add_edge(Edge::new("knows", b, c));
        g.add_edge(Edge::new("knows", c, a));
        (g, a, b, c, d)
    }

    #[test]
    fn wcc_separates_isolated_vertex() {
        let (g, a, b, c, d) = triangle();
        let comps = g.components_weak();
        assert_eq!(comps.len(), 2);
        let cycle = comps.iter().find(|s| s.contains(&a)).unwrap();
        assert_eq!(cycle.len(), 3);
        assert!(cycle.contains(&b) && cycle.contains(&c));
        let singleton = comps.iter().find(|s| s.contains(&d)).unwrap();
        assert_eq!(singleton.len(), 1);
    }

    #[test]
    fn scc_finds_the_cycle() {
        let (g, a, b, c, d) = triangle();
        let comps = g.components_strong();
        let cycle = comps.iter().find(|s| s.contains(&a)).unwrap();
        assert_eq!(cycle.len(), 3);
        assert!(cycle.contains(&b) && cycle.contains(&c));
        let singleton = comps.iter().find(|s| s.contains(&d)).unwrap();
        assert_eq!(singleton.len(), 1);
    }

    #[test]
    fn bfs_reaches_only_the_component() {
        let (g, a, b, c, d) = triangle();
        let reach = g.bfs(a);
        assert!(reach.contains(&a) && reach.contains(&b) && reach.contains(&c));
        assert!(!reach.contains(&d));
    }

    #[test]
    fn out_respects_label_filter() {
        let mut g = InMemoryGraph::new();
        let a = g.add_vertex(Vertex::new("person"));
        let b = g.add_vertex(Vertex::new("person"));
        g.add_edge(Edge::new("knows", a, b));
        g.add_edge(Edge::new("blocks", a, b));
        assert_eq!(g.out(a, Some("knows")).len(), 1);
        assert_eq!(g.out(a, None).len(), 2);
    }
}
