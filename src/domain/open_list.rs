//! BD-012: Open lists and the tie-breaking open list factory.
//!
//! A factory is the bound component; the open lists it creates belong to
//! the search that asked for them.

use super::evaluator::Evaluator;
use super::task::Task;
use crate::core::blueprint::{BindableFrom, BlueprintRef, Category, Component};
use crate::core::error::BindError;
use crate::core::types::Verbosity;
use crate::impl_category;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OperatorId(pub u32);

pub type StateEntry = StateId;
pub type EdgeEntry = (StateId, OperatorId);

/// Priority queue of search entries.
pub trait OpenList<E>: Send + Sync {
    /// Insert an entry. Non-preferred entries are dropped by lists that
    /// only accept preferred ones.
    fn insert(&mut self, entry: E, preferred: bool);

    /// Remove an entry with the smallest key; FIFO among equal keys.
    fn remove_min(&mut self) -> Option<E>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn only_preferred(&self) -> bool;

    fn dump(&self) -> String;
}

/// Creates open lists for a search.
pub trait OpenListFactory: Send + Sync {
    fn create_state_open_list(&self) -> Box<dyn OpenList<StateEntry>>;

    fn create_edge_open_list(&self) -> Box<dyn OpenList<EdgeEntry>>;

    fn description(&self) -> &str;

    fn dump(&self) -> String;
}

impl Category for dyn OpenListFactory {
    const NAME: &'static str = "OpenListFactory";
}

pub type OpenListFactoryBlueprint = BlueprintRef<Task, dyn OpenListFactory>;

impl_category!(dyn OpenListFactory: TieBreakingOpenListFactory);

// ============================================================================
// Tie-breaking open list
// ============================================================================

/// Orders entries lexicographically by the values of several evaluators.
pub struct TieBreakingOpenList<E> {
    buckets: BTreeMap<Vec<i64>, VecDeque<E>>,
    size: usize,
    evals: Vec<Arc<dyn Evaluator>>,
    allow_unsafe_pruning: bool,
    only_preferred: bool,
}

impl<E> TieBreakingOpenList<E> {
    fn new(evals: Vec<Arc<dyn Evaluator>>, allow_unsafe_pruning: bool, only_preferred: bool) -> Self {
        Self {
            buckets: BTreeMap::new(),
            size: 0,
            evals,
            allow_unsafe_pruning,
            only_preferred,
        }
    }

    fn key(&self) -> Vec<i64> {
        self.evals.iter().map(|e| e.value()).collect()
    }
}

impl<E: Send + Sync> OpenList<E> for TieBreakingOpenList<E> {
    fn insert(&mut self, entry: E, preferred: bool) {
        if self.only_preferred && !preferred {
            return;
        }
        let key = self.key();
        // With unsafe pruning, a saturated first key marks a dead end.
        if self.allow_unsafe_pruning && key.first() == Some(&i64::MAX) {
            return;
        }
        self.buckets.entry(key).or_default().push_back(entry);
        self.size += 1;
    }

    fn remove_min(&mut self) -> Option<E> {
        let mut first = self.buckets.first_entry()?;
        let entry = first.get_mut().pop_front();
        if first.get().is_empty() {
            first.remove();
        }
        if entry.is_some() {
            self.size -= 1;
        }
        entry
    }

    fn len(&self) -> usize {
        self.size
    }

    fn only_preferred(&self) -> bool {
        self.only_preferred
    }

    fn dump(&self) -> String {
        format!(
            "tiebreaking[{}] size={} buckets={}",
            self.evals.len(),
            self.size,
            self.buckets.len()
        )
    }
}

// ============================================================================
// Factory
// ============================================================================

pub struct TieBreakingOpenListFactory {
    evals: Vec<Arc<dyn Evaluator>>,
    unsafe_pruning: bool,
    pref_only: bool,
    description: String,
}

impl Component for TieBreakingOpenListFactory {
    type Context = Task;
}

impl<S: AsRef<str>> BindableFrom<(Vec<Arc<dyn Evaluator>>, bool, bool, S, Verbosity)>
    for TieBreakingOpenListFactory
{
    fn bind_from(
        _task: &Arc<Task>,
        (evals, unsafe_pruning, pref_only, description, _): (
            Vec<Arc<dyn Evaluator>>,
            bool,
            bool,
            S,
            Verbosity,
        ),
    ) -> Result<Self, BindError> {
        if evals.is_empty() {
            return Err(BindError::invalid_parameter(
                format!("tiebreaking '{}'", description.as_ref()),
                "evals",
                "must list at least one evaluator",
            ));
        }
        Ok(Self {
            evals,
            unsafe_pruning,
            pref_only,
            description: description.as_ref().to_string(),
        })
    }
}

impl<S: AsRef<str>> BindableFrom<(Vec<Arc<dyn Evaluator>>, S, Verbosity)> for TieBreakingOpenListFactory {
    fn bind_from(
        task: &Arc<Task>,
        (evals, description, verbosity): (Vec<Arc<dyn Evaluator>>, S, Verbosity),
    ) -> Result<Self, BindError> {
        <Self as BindableFrom<(Vec<Arc<dyn Evaluator>>, bool, bool, S, Verbosity)>>::bind_from(
            task,
            (evals, false, false, description, verbosity),
        )
    }
}

impl OpenListFactory for TieBreakingOpenListFactory {
    fn create_state_open_list(&self) -> Box<dyn OpenList<StateEntry>> {
        Box::new(TieBreakingOpenList::new(
            self.evals.clone(),
            self.unsafe_pruning,
            self.pref_only,
        ))
    }

    fn create_edge_open_list(&self) -> Box<dyn OpenList<EdgeEntry>> {
        Box::new(TieBreakingOpenList::new(
            self.evals.clone(),
            self.unsafe_pruning,
            self.pref_only,
        ))
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn dump(&self) -> String {
        let evals: Vec<String> = self.evals.iter().map(|e| e.dump()).collect();
        format!(
            "tiebreaking [{}] unsafe_pruning={} pref_only={}",
            evals.join(", "),
            self.unsafe_pruning,
            self.pref_only
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::blueprint::make_blueprint;
    use crate::domain::evaluator::{ConstEvaluator, EvaluatorBlueprint};

    fn task() -> Arc<Task> {
        Arc::new(Task::new("open-list-test"))
    }

    fn const_eval(c: i64) -> EvaluatorBlueprint {
        make_blueprint::<ConstEvaluator, dyn Evaluator, _>((c, "c", Verbosity::Silent))
    }

    fn tiebreaking(evals: Vec<EvaluatorBlueprint>, pref_only: bool) -> OpenListFactoryBlueprint {
        make_blueprint::<TieBreakingOpenListFactory, dyn OpenListFactory, _>((
            evals,
            false,
            pref_only,
            "tie",
            Verbosity::Normal,
        ))
    }

    #[test]
    fn test_bd012_factory_binds_evaluators_in_order() {
        let factory = tiebreaking(vec![const_eval(3), const_eval(1)], false)
            .bind(&task())
            .unwrap();
        assert_eq!(factory.description(), "tie");
        assert_eq!(
            factory.dump(),
            "tiebreaking [3, 1] unsafe_pruning=false pref_only=false"
        );
    }

    #[test]
    fn test_bd012_short_recipe_defaults_flags() {
        let bp = make_blueprint::<TieBreakingOpenListFactory, dyn OpenListFactory, _>((
            vec![const_eval(5)],
            "short",
            Verbosity::Silent,
        ));
        let factory = bp.bind(&task()).unwrap();
        assert!(factory.dump().ends_with("unsafe_pruning=false pref_only=false"));
    }

    #[test]
    fn test_bd012_empty_evaluators_rejected() {
        let err = tiebreaking(vec![], false).bind(&task()).err().unwrap();
        assert_eq!(
            err.to_string(),
            "invalid parameter 'evals' for tiebreaking 'tie': must list at least one evaluator"
        );
    }

    #[test]
    fn test_bd012_state_open_list_fifo_on_ties() {
        let factory = tiebreaking(vec![const_eval(0)], false)
            .bind(&task())
            .unwrap();
        let mut open = factory.create_state_open_list();
        assert!(open.is_empty());
        open.insert(StateId(7), false);
        open.insert(StateId(3), true);
        open.insert(StateId(9), false);
        assert_eq!(open.len(), 3);
        assert_eq!(open.remove_min(), Some(StateId(7)));
        assert_eq!(open.remove_min(), Some(StateId(3)));
        assert_eq!(open.remove_min(), Some(StateId(9)));
        assert_eq!(open.remove_min(), None);
        assert!(open.is_empty());
    }

    #[test]
    fn test_bd012_preferred_only_drops_others() {
        let factory = tiebreaking(vec![const_eval(0)], true)
            .bind(&task())
            .unwrap();
        let mut open = factory.create_edge_open_list();
        assert!(open.only_preferred());
        open.insert((StateId(1), OperatorId(0)), false);
        open.insert((StateId(2), OperatorId(4)), true);
        assert_eq!(open.len(), 1);
        assert_eq!(open.remove_min(), Some((StateId(2), OperatorId(4))));
    }

    #[test]
    fn test_bd012_unsafe_pruning_skips_dead_ends() {
        let bp = make_blueprint::<TieBreakingOpenListFactory, dyn OpenListFactory, _>((
            vec![const_eval(i64::MAX)],
            true,
            false,
            "prune",
            Verbosity::Silent,
        ));
        let factory = bp.bind(&task()).unwrap();
        let mut open = factory.create_state_open_list();
        open.insert(StateId(1), true);
        assert!(open.is_empty());
        assert!(open.dump().contains("size=0"));
    }
}
