//! BD-011: Constant, weighted, and sum evaluators.

use super::task::Task;
use crate::core::blueprint::{BindableFrom, BlueprintRef, Category, Component};
use crate::core::error::BindError;
use crate::core::types::Verbosity;
use crate::impl_category;
use std::sync::Arc;

/// Heuristic evaluator category.
pub trait Evaluator: Send + Sync {
    /// Value reported by this evaluator.
    fn value(&self) -> i64;

    /// Human-readable expression of how the value is computed.
    fn dump(&self) -> String;

    fn description(&self) -> &str;

    /// Sub-evaluators this one reads from.
    fn children(&self) -> Vec<Arc<dyn Evaluator>> {
        Vec::new()
    }
}

impl Category for dyn Evaluator {
    const NAME: &'static str = "Evaluator";
}

pub type EvaluatorBlueprint = BlueprintRef<Task, dyn Evaluator>;

impl_category!(dyn Evaluator: ConstEvaluator, WeightedEvaluator, SumEvaluator);

// ============================================================================
// Const
// ============================================================================

/// Reports a fixed value.
#[derive(Debug)]
pub struct ConstEvaluator {
    c: i64,
    description: String,
}

impl Component for ConstEvaluator {
    type Context = Task;
}

impl<S: AsRef<str>> BindableFrom<(i64, S, Verbosity)> for ConstEvaluator {
    fn bind_from(_task: &Arc<Task>, (c, description, _): (i64, S, Verbosity)) -> Result<Self, BindError> {
        Ok(Self {
            c,
            description: description.as_ref().to_string(),
        })
    }
}

impl Evaluator for ConstEvaluator {
    fn value(&self) -> i64 {
        self.c
    }

    fn dump(&self) -> String {
        self.c.to_string()
    }

    fn description(&self) -> &str {
        &self.description
    }
}

// ============================================================================
// Weighted
// ============================================================================

/// Scales another evaluator by a constant weight.
pub struct WeightedEvaluator {
    w: i64,
    eval: Arc<dyn Evaluator>,
    description: String,
}

impl Component for WeightedEvaluator {
    type Context = Task;
}

impl<S: AsRef<str>> BindableFrom<(i64, Arc<dyn Evaluator>, S, Verbosity)> for WeightedEvaluator {
    fn bind_from(
        _task: &Arc<Task>,
        (w, eval, description, _): (i64, Arc<dyn Evaluator>, S, Verbosity),
    ) -> Result<Self, BindError> {
        Ok(Self {
            w,
            eval,
            description: description.as_ref().to_string(),
        })
    }
}

impl Evaluator for WeightedEvaluator {
    fn value(&self) -> i64 {
        self.w.saturating_mul(self.eval.value())
    }

    fn dump(&self) -> String {
        format!("{} * {}", self.w, self.eval.dump())
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn children(&self) -> Vec<Arc<dyn Evaluator>> {
        vec![Arc::clone(&self.eval)]
    }
}

// ============================================================================
// Sum
// ============================================================================

/// Adds up the values of its children.
pub struct SumEvaluator {
    evals: Vec<Arc<dyn Evaluator>>,
    description: String,
}

impl Component for SumEvaluator {
    type Context = Task;
}

impl<S: AsRef<str>> BindableFrom<(Vec<Arc<dyn Evaluator>>, S, Verbosity)> for SumEvaluator {
    fn bind_from(
        _task: &Arc<Task>,
        (evals, description, _): (Vec<Arc<dyn Evaluator>>, S, Verbosity),
    ) -> Result<Self, BindError> {
        if evals.is_empty() {
            return Err(BindError::invalid_parameter(
                format!("sum '{}'", description.as_ref()),
                "evals",
                "must list at least one evaluator",
            ));
        }
        Ok(Self {
            evals,
            description: description.as_ref().to_string(),
        })
    }
}

impl Evaluator for SumEvaluator {
    fn value(&self) -> i64 {
        self.evals
            .iter()
            .fold(0i64, |acc, e| acc.saturating_add(e.value()))
    }

    fn dump(&self) -> String {
        let parts: Vec<String> = self.evals.iter().map(|e| e.dump()).collect();
        format!("({})", parts.join(" + "))
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn children(&self) -> Vec<Arc<dyn Evaluator>> {
        self.evals.clone()
    }
}
