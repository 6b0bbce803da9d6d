//! Monadic second-order query evaluator over vertex/edge graphs.
//!
//! Extends first-order graph traversal with quantification over vertex
//! *sets*: a query's prefix binds a sequence of `∃`/`∀` quantifiers, each
//! ranging over either individual vertices or a candidate family of
//! subsets (the power set, a structural partition, or a BFS-reachable
//! set), before handing the fully-bound leaf to a first-order expression
//! evaluator.
//!
//! Module map, leaves first:
//! - [`ids`], [`attr`], [`model`] — the data model.
//! - [`storage`] — the `GraphStore` contract and its in-memory reference
//!   implementation.
//! - [`env`] — the binding environment threaded through recursion.
//! - [`expr`] — the first-order expression evaluator (C1).
//! - [`candidate`] — the candidate-family provider (C2).
//! - [`quantifier`] — the quantifier engine (C3).
//! - [`plan`] — query plan assembly (C4).
//! - [`materialize`] — result materialization (C5).
//! - [`engine`] — the facade tying C1-C5 together for callers.
//! - [`config`], [`cancel`], [`error`] — ambient concerns.

pub mod attr;
pub mod candidate;
pub mod cancel;
pub mod config;
pub mod engine;
pub mod env;
pub mod error;
pub mod expr;
pub mod ids;
pub mod materialize;
pub mod model;
pub mod plan;
pub mod quantifier;
pub mod storage;

pub use config::EngineConfig;
pub use engine::QueryEngine;
pub use error::{EngineError, EngineResult};
pub use plan::{QueryPlan, QueryPlanBuilder};
