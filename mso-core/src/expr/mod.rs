//! The first-order expression evaluator (spec.md §4.1): a boolean
//! composition layer (`compose`) over a traversal-step sublanguage
//! (`ast`, `parser`), executed against a `GraphStore` and `Env` (`eval`).

pub mod ast;
pub mod compose;
pub mod eval;
pub mod parser;

pub use ast::{BoolExpr, TraversalExpr, Value};
pub use compose::parse_bool_expr;
pub use eval::{evaluate_bool, evaluate_traversal, try_evaluate_bool, try_evaluate_traversal, with_binding};
