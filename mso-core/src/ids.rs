use std::sync::atomic::{AtomicU64, Ordering};

static VERTEX_COUNTER: AtomicU64 = AtomicU64::new(0);
static EDGE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A stable vertex identity, issued once and never reused for the lifetime
/// of the process. Equality and hashing are `u64` equality/hashing — O(1),
/// as spec.md's design notes ask for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct VertexId(pub u64);

impl VertexId {
    pub fn new() -> Self {
        VertexId(VERTEX_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl Default for VertexId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for VertexId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Edge identity is opaque (spec.md §9 flags the source's
/// `outVertex_handle << 32 | inVertex_handle` scheme as a bug: it assumes
/// 32-bit handles and at most one edge per ordered pair). We never derive
/// an edge's identity from its endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct EdgeId(pub u64);

impl EdgeId {
    pub fn new() -> Self {
        EdgeId(EDGE_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl Default for EdgeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "e{}", self.0)
    }
}
