//! Query plan assembly (spec.md §4.4): a fluent builder that collects a
//! quantifier prefix, a filter body, and, for subset-domain quantifiers, a
//! candidate-family selector and an optional aggregation predicate.

use std::collections::HashSet;

use crate::candidate::CandidateMode;
use crate::error::EngineError;
use crate::ids::VertexId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuantifierKind {
    Exists,
    ForAll,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Domain {
    Vertex,
    Subset,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Quantifier {
    pub name: String,
    pub kind: QuantifierKind,
    pub domain: Domain,
}

/// A predicate over an admitted witness subset, applied before it's added
/// to a collection-mode result (spec.md §4.4's "optional aggregation
/// predicate on witness size/content"). The size-comparison family covers
/// the one example the spec gives (`size > 1`); the grammar for richer
/// content predicates isn't specified, so this stays a closed, typed enum
/// rather than a second embedded expression language.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Aggregation {
    SizeLt(usize),
    SizeLe(usize),
    SizeEq(usize),
    SizeGe(usize),
    SizeGt(usize),
}

impl Aggregation {
    pub fn holds(&self, subset: &HashSet<VertexId>) -> bool {
        let n = subset.len();
        match self {
            Aggregation::SizeLt(k) => n < *k,
            Aggregation::SizeLe(k) => n <= *k,
            Aggregation::SizeEq(k) => n == *k,
            Aggregation::SizeGe(k) => n >= *k,
            Aggregation::SizeGt(k) => n > *k,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct QueryPlan {
    pub prefix: Vec<Quantifier>,
    pub filter_body: String,
    pub candidate_mode: Option<CandidateMode>,
    pub aggregation: Option<Aggregation>,
}

#[derive(Clone, Debug, Default)]
pub struct QueryPlanBuilder {
    prefix: Vec<Quantifier>,
    filter_body: Option<String>,
    candidate_mode: Option<CandidateMode>,
    aggregation: Option<Aggregation>,
}

impl QueryPlanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exists_vertex(mut self, name: impl Into<String>) -> Self {
        self.push(name, QuantifierKind::Exists, Domain::Vertex)
    }

    pub fn forall_vertex(mut self, name: impl Into<String>) -> Self {
        self.push(name, QuantifierKind::ForAll, Domain::Vertex)
    }

    pub fn exists_subset(mut self, name: impl Into<String>) -> Self {
        self.push(name, QuantifierKind::Exists, Domain::Subset)
    }

    pub fn forall_subset(mut self, name: impl Into<String>) -> Self {
        self.push(name, QuantifierKind::ForAll, Domain::Subset)
    }

    fn push(mut self, name: impl Into<String>, kind: QuantifierKind, domain: Domain) -> Self {
        self.prefix.push(Quantifier { name: name.into(), kind, domain });
        self
    }

    pub fn filter(mut self, body: impl Into<String>) -> Self {
        self.filter_body = Some(body.into());
        self
    }

    pub fn candidate_family(mut self, mode: CandidateMode) -> Self {
        self.candidate_mode = Some(mode);
        self
    }

    pub fn aggregate(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = Some(aggregation);
        self
    }

    pub fn build(self) -> Result<QueryPlan, EngineError> {
        if self.prefix.is_empty() {
            return Err(EngineError::PlanInvalid("prefix must be non-empty".into()));
        }
        let filter_body = self
            .filter_body
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| EngineError::PlanInvalid("filter body must be non-empty".into()))?;

        let mut names = HashSet::new();
        for q in &self.prefix {
            if !names.insert(q.name.clone()) {
                return Err(EngineError::PlanInvalid(format!("duplicate quantifier name `{}`", q.name)));
            }
        }

        let has_subset_quantifier = self.prefix.iter().any(|q| q.domain == Domain::Subset);
        if has_subset_quantifier && self.candidate_mode.is_none() {
            return Err(EngineError::PlanInvalid(
                "a subset-domain quantifier requires a candidate-family selector".into(),
            ));
        }
        if self.aggregation.is_some() && self.candidate_mode.is_none() {
            return Err(EngineError::PlanInvalid(
                "an aggregation predicate requires a candidate-family selector".into(),
            ));
        }

        tracing::info!(quantifiers = self.prefix.len(), "query plan built");
        Ok(QueryPlan {
            prefix: self.prefix,
            filter_body,
            candidate_mode: self.candidate_mode,
            aggregation: self.aggregation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_prefix() {
        let err = QueryPlanBuilder::new().filter("true").build().unwrap_err();
        assert!(matches!(err, EngineError::PlanInvalid(_)));
    }

    #[test]
    fn rejects_empty_filter_body() {
        let err = QueryPlanBuilder::new().exists_vertex("x").build().unwrap_err();
        assert!(matches!(err, EngineError::PlanInvalid(_)));
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = QueryPlanBuilder::new()
            .exists_vertex("x")
            .forall_vertex("x")
            .filter("true")
            .build()
            .unwrap_err();
        assert!(matches!(err, EngineError::PlanInvalid(_)));
    }

    #[test]
    fn rejects_subset_quantifier_without_selector() {
        let err = QueryPlanBuilder::new()
            .exists_subset("s")
            .filter("true")
            .build()
            .unwrap_err();
        assert!(matches!(err, EngineError::PlanInvalid(_)));
    }

    #[test]
    fn accepts_well_formed_plan() {
        let plan = QueryPlanBuilder::new()
            .exists_vertex("x")
            .exists_vertex("y")
            .filter(r#"V(x).out("knows").is(y)"#)
            .build()
            .unwrap();
        assert_eq!(plan.prefix.len(), 2);
    }
}
