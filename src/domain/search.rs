//! BD-013: Eager best-first search.

use super::evaluator::Evaluator;
use super::open_list::{OpenList, OpenListFactory, StateEntry};
use super::task::Task;
use crate::core::blueprint::{BindableFrom, BlueprintRef, Category, Component};
use crate::core::error::BindError;
use crate::core::resolver::Opaque;
use crate::core::types::Verbosity;
use crate::impl_category;
use std::sync::Arc;

pub trait SearchAlgorithm: Send + Sync {
    fn description(&self) -> &str;

    fn dump(&self) -> String;
}

impl Category for dyn SearchAlgorithm {
    const NAME: &'static str = "SearchAlgorithm";
}

pub type SearchBlueprint = BlueprintRef<Task, dyn SearchAlgorithm>;

impl_category!(dyn SearchAlgorithm: EagerSearch);

/// Resource bounds shared by any number of searches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchLimits {
    pub max_expansions: Option<u64>,
    pub max_depth: Option<u32>,
}

/// Eager best-first search over an open list built at bind time.
pub struct EagerSearch {
    task: Arc<Task>,
    open_list: Box<dyn OpenList<StateEntry>>,
    f_evaluator: Arc<dyn Evaluator>,
    reopen_closed: bool,
    limits: Opaque<SearchLimits>,
    description: String,
}

impl Component for EagerSearch {
    type Context = Task;
}

pub type EagerArgs<S> = (
    Arc<dyn OpenListFactory>,
    Arc<dyn Evaluator>,
    bool,
    Opaque<SearchLimits>,
    S,
    Verbosity,
);

impl<S: AsRef<str>> BindableFrom<EagerArgs<S>> for EagerSearch {
    fn bind_from(
        task: &Arc<Task>,
        (open, f_eval, reopen_closed, limits, description, _): EagerArgs<S>,
    ) -> Result<Self, BindError> {
        if limits.max_expansions == Some(0) {
            return Err(BindError::invalid_parameter(
                format!("eager '{}'", description.as_ref()),
                "max_expansions",
                "must be positive when set",
            ));
        }
        Ok(Self {
            task: Arc::clone(task),
            open_list: open.create_state_open_list(),
            f_evaluator: f_eval,
            reopen_closed,
            limits,
            description: description.as_ref().to_string(),
        })
    }
}

impl<S: AsRef<str>> BindableFrom<(Arc<dyn OpenListFactory>, Arc<dyn Evaluator>, S, Verbosity)>
    for EagerSearch
{
    fn bind_from(
        task: &Arc<Task>,
        (open, f_eval, description, verbosity): (
            Arc<dyn OpenListFactory>,
            Arc<dyn Evaluator>,
            S,
            Verbosity,
        ),
    ) -> Result<Self, BindError> {
        <Self as BindableFrom<EagerArgs<S>>>::bind_from(
            task,
            (
                open,
                f_eval,
                false,
                Opaque::new(SearchLimits::default()),
                description,
                verbosity,
            ),
        )
    }
}

impl EagerSearch {
    pub fn task(&self) -> &Arc<Task> {
        &self.task
    }

    pub fn f_evaluator(&self) -> &Arc<dyn Evaluator> {
        &self.f_evaluator
    }

    pub fn limits(&self) -> &SearchLimits {
        &self.limits
    }
}

impl SearchAlgorithm for EagerSearch {
    fn description(&self) -> &str {
        &self.description
    }

    fn dump(&self) -> String {
        format!(
            "eager '{}' on '{}' reopen_closed={}\n f-eval: {}\n open: {}",
            self.description,
            self.task.name(),
            self.reopen_closed,
            self.f_evaluator.dump(),
            self.open_list.dump()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::blueprint::{make_blueprint, Blueprint, TypedBlueprint};
    use crate::core::cache::BindingCache;
    use crate::core::types::{BindingContext, CacheKey};
    use crate::domain::evaluator::{
        ConstEvaluator, EvaluatorBlueprint, SumEvaluator, WeightedEvaluator,
    };
    use crate::domain::open_list::{OpenListFactoryBlueprint, TieBreakingOpenListFactory};

    struct Graph {
        c_eval: EvaluatorBlueprint,
        sum_eval: EvaluatorBlueprint,
        tie: OpenListFactoryBlueprint,
    }

    fn graph() -> Graph {
        let c_eval = make_blueprint::<ConstEvaluator, dyn Evaluator, _>((2i64, "c_eval", Verbosity::Normal));
        let w_eval = make_blueprint::<WeightedEvaluator, dyn Evaluator, _>((
            42i64,
            c_eval.clone(),
            "w_eval",
            Verbosity::Normal,
        ));
        let evals = vec![c_eval.clone(), w_eval, c_eval.clone()];
        let sum_eval =
            make_blueprint::<SumEvaluator, dyn Evaluator, _>((evals.clone(), "sum_eval", Verbosity::Normal));
        let tie = make_blueprint::<TieBreakingOpenListFactory, dyn OpenListFactory, _>((
            evals,
            false,
            false,
            "tie",
            Verbosity::Normal,
        ));
        Graph {
            c_eval,
            sum_eval,
            tie,
        }
    }

    #[test]
    fn test_bd013_eager_binds_whole_graph() {
        let g = graph();
        let eager = make_blueprint::<EagerSearch, dyn SearchAlgorithm, _>((
            g.tie.clone(),
            g.sum_eval.clone(),
            "eager",
            Verbosity::Normal,
        ));
        let task = Arc::new(Task::new("gripper"));
        let mut cache = BindingCache::new();
        let search = eager.bind_with_cache(&task, &mut cache).unwrap();

        let text = search.dump();
        assert!(text.starts_with("eager 'eager' on 'gripper' reopen_closed=false"));
        assert!(text.contains("f-eval: (2 + 42 * 2 + 2)"));
        assert!(text.contains("open: tiebreaking[3] size=0"));

        // c, w, sum, tie, eager: five components, every one bound once.
        assert_eq!(cache.len(), 5);
        assert_eq!(cache.misses(), 5);
        assert!(cache.contains(&CacheKey::new(g.c_eval.id(), task.context_id())));

        let snapshot = cache.snapshot();
        let categories: Vec<&str> = snapshot.entries.iter().map(|e| e.category.as_str()).collect();
        assert_eq!(categories.iter().filter(|c| **c == "Evaluator").count(), 3);
        assert_eq!(categories.iter().filter(|c| **c == "OpenListFactory").count(), 1);
        assert_eq!(categories.iter().filter(|c| **c == "SearchAlgorithm").count(), 1);
    }

    #[test]
    fn test_bd013_eager_with_shared_limits() {
        let g = graph();
        let limits = Opaque::new(SearchLimits {
            max_expansions: Some(1000),
            max_depth: None,
        });
        let bp = Blueprint::<EagerSearch, dyn SearchAlgorithm, _>::new((
            g.tie,
            g.sum_eval,
            true,
            limits.clone(),
            "eager-limited".to_string(),
            Verbosity::Verbose,
        ));
        let task = Arc::new(Task::new("logistics"));
        let search = bp.bind(&task).unwrap();
        assert!(search.dump().contains("reopen_closed=true"));
        assert_eq!(bp.args().3.max_expansions, Some(1000));
        assert!(bp.args().3.ptr_eq(&limits));
    }

    #[test]
    fn test_bd013_zero_expansion_limit_rejected() {
        let g = graph();
        let bp = make_blueprint::<EagerSearch, dyn SearchAlgorithm, _>((
            g.tie,
            g.sum_eval,
            false,
            Opaque::new(SearchLimits {
                max_expansions: Some(0),
                max_depth: None,
            }),
            "eager",
            Verbosity::Normal,
        ));
        let task = Arc::new(Task::new("gripper"));
        let mut cache = BindingCache::new();
        let err = bp.bind_with_cache(&task, &mut cache).err().unwrap();
        assert!(err.to_string().contains("max_expansions"));
        // Nothing from the failed pass is kept.
        assert!(cache.is_empty());
    }

    #[test]
    fn test_bd013_search_retains_task() {
        let g = graph();
        let task = Arc::new(Task::new("depot"));
        let search = EagerSearch::bind_from(
            &task,
            (
                g.tie.bind(&task).unwrap(),
                g.sum_eval.bind(&task).unwrap(),
                "direct",
                Verbosity::Silent,
            ),
        )
        .unwrap();
        assert!(Arc::ptr_eq(search.task(), &task));
        assert_eq!(search.f_evaluator().value(), 88);
        assert_eq!(search.limits(), &SearchLimits::default());
    }
}
