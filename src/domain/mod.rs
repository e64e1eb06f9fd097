//! Sample planning components bound by the core.
//!
//! Each component kind has:
//! 1. A category trait (`Evaluator`, `OpenListFactory`, `SearchAlgorithm`)
//! 2. Concrete types constructible from `(task, ...resolved recipe)`
//! 3. A `dump` hook for introspection

pub mod evaluator;
pub mod open_list;
pub mod search;
pub mod task;
