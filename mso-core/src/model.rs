use crate::attr::AttrMap;
use crate::ids::{EdgeId, VertexId};

/// A vertex: an opaque identity, a label (type tag), and an attribute map.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Vertex {
    pub id: VertexId,
    pub label: String,
    pub attrs: AttrMap,
}

impl Vertex {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: VertexId::new(),
            label: label.into(),
            attrs: AttrMap::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: crate::attr::AttrValue) -> Self {
        self.attrs.insert(key.into(), value);
        self
    }
}

/// A directed edge: an opaque identity, a label, endpoints, and an
/// attribute map. The engine never derives `id` from `source`/`target` —
/// see spec.md §9 on the source's buggy `handle << 32 | handle` scheme.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub label: String,
    pub source: VertexId,
    pub target: VertexId,
    pub attrs: AttrMap,
}

impl Edge {
    pub fn new(label: impl Into<String>, source: VertexId, target: VertexId) -> Self {
        Self {
            id: EdgeId::new(),
            label: label.into(),
            source,
            target,
            attrs: AttrMap::new(),
        }
    }
}
