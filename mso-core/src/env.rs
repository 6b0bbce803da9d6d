use std::collections::HashSet;

use crate::ids::VertexId;

/// A single binding: a name is bound either to one vertex (an individual
/// quantifier) or to a set of vertices (a subset quantifier).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Binding {
    Vertex(VertexId),
    Set(HashSet<VertexId>),
}

impl Binding {
    pub fn as_vertex(&self) -> Option<VertexId> {
        match self {
            Binding::Vertex(v) => Some(*v),
            Binding::Set(_) => None,
        }
    }

    pub fn as_set(&self) -> Option<&HashSet<VertexId>> {
        match self {
            Binding::Set(s) => Some(s),
            Binding::Vertex(_) => None,
        }
    }
}

/// The binding environment threaded through a query's recursion. Bindings
/// are pushed on entry to a quantifier and popped on exit; sibling branches
/// never observe each other's bindings (spec.md §3 invariant).
#[derive(Clone, Debug, Default)]
pub struct Env {
    bindings: Vec<(String, Binding)>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a binding, returning a guard that pops it again on drop —
    /// matching the bind-on-entry/pop-on-exit discipline spec.md §4.3
    /// requires from the quantifier engine.
    pub fn push(&mut self, name: String, binding: Binding) {
        self.bindings.push((name, binding));
    }

    pub fn pop(&mut self) {
        self.bindings.pop();
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.iter().rev().find(|(n, _)| n == name).map(|(_, b)| b)
    }
}
