//! Bindery: task-independent blueprints bound into shared component graphs.
//!
//! Configure once, bind per task. A blueprint records which concrete type to
//! build and with which recipe; binding it against a task resolves the recipe
//! depth-first and builds every component at most once, so a blueprint that
//! appears several times in a configuration becomes one shared instance.
//!
//! ```
//! use bindery::core::blueprint::{make_blueprint, TypedBlueprint};
//! use bindery::core::types::Verbosity;
//! use bindery::domain::evaluator::{ConstEvaluator, Evaluator, SumEvaluator, WeightedEvaluator};
//! use bindery::domain::task::Task;
//! use std::sync::Arc;
//!
//! let c = make_blueprint::<ConstEvaluator, dyn Evaluator, _>((2i64, "c_eval", Verbosity::Normal));
//! let w = make_blueprint::<WeightedEvaluator, dyn Evaluator, _>((42i64, c.clone(), "w_eval", Verbosity::Normal));
//! let sum = make_blueprint::<SumEvaluator, dyn Evaluator, _>((vec![c, w], "sum_eval", Verbosity::Normal));
//!
//! let bound = sum.bind(&Arc::new(Task::new("demo"))).unwrap();
//! assert_eq!(bound.value(), 86);
//! assert_eq!(bound.dump(), "(2 + 42 * 2)");
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
