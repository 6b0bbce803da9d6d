/// Every error kind is explicit and tagged (spec.md §7). Expression errors
/// are the only kind recovered locally by default — MSO semantics are
/// brittle to exceptions, so a single ill-typed traversal subexpression
/// should not invalidate an entire decision. Everything else is fatal and
/// discards any partial result.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("plan invalid: {0}")]
    PlanInvalid(String),

    #[error("expression error while evaluating `{expr}`: {cause}")]
    Expression { expr: String, cause: String },

    #[error("storage engine failure: {0}")]
    Storage(String),

    #[error("candidate family for mode `{mode}` exceeded max_power_set_vertices ({limit}): graph has {actual} vertices")]
    OverLimit {
        mode: String,
        limit: usize,
        actual: usize,
    },

    #[error("collection produced {actual} subsets, exceeding max_result_subsets ({limit})")]
    TooLargeResult { limit: usize, actual: usize },

    #[error("query was cancelled")]
    Cancelled,
}

pub type EngineResult<T> = Result<T, EngineError>;
