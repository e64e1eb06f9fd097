//! BD-023: Document assembly: dependency order and blueprint construction.
//!
//! Components are built in topological order (Kahn's algorithm with
//! alphabetical tie-breaking) so every referenced blueprint exists before
//! the component that refers to it. Each id yields exactly one blueprint;
//! every reference to that id shares it.

use super::parser::{fingerprint, parse_document_file, validate_document};
use super::types::{BlueprintDocument, ComponentCategory, ComponentKind, ComponentSpec};
use super::ConfigError;
use crate::core::blueprint::make_blueprint;
use crate::core::cache::BindingCache;
use crate::core::resolver::Opaque;
use crate::domain::evaluator::{
    ConstEvaluator, Evaluator, EvaluatorBlueprint, SumEvaluator, WeightedEvaluator,
};
use crate::domain::open_list::{OpenListFactory, OpenListFactoryBlueprint, TieBreakingOpenListFactory};
use crate::domain::search::{EagerSearch, SearchAlgorithm, SearchBlueprint, SearchLimits};
use crate::domain::task::Task;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Longest reference chain a document may contain. Binding recurses once
/// per level, so deeper documents are rejected before anything is bound.
pub const MAX_REFERENCE_DEPTH: usize = 512;

/// Build a deterministic construction order from component references.
/// Referenced components come before the components that refer to them.
///
/// Fails with `ConfigError::TooDeep` if any component sits more than
/// [`MAX_REFERENCE_DEPTH`] levels above its deepest leaf.
pub fn build_order(doc: &BlueprintDocument) -> Result<Vec<String>, ConfigError> {
    let ids: Vec<&str> = doc.components.keys().map(String::as_str).collect();
    let mut in_degree: HashMap<&str, usize> = ids.iter().map(|id| (*id, 0)).collect();
    let mut dependents: HashMap<&str, Vec<&str>> = ids.iter().map(|id| (*id, Vec::new())).collect();

    for (id, spec) in &doc.components {
        for reference in spec.kind.references() {
            let Some(targets) = dependents.get_mut(reference.target) else {
                return Err(ConfigError::UnknownComponent(reference.target.to_string()));
            };
            targets.push(id.as_str());
            if let Some(degree) = in_degree.get_mut(id.as_str()) {
                *degree += 1;
            }
        }
    }

    let mut ready: Vec<&str> = in_degree
        .iter()
        .filter(|(_, &d)| d == 0)
        .map(|(id, _)| *id)
        .collect();
    ready.sort_unstable();
    let mut queue: VecDeque<&str> = ready.into();

    // Leaves have depth 1; every other component is one above its deepest reference.
    let mut depth: HashMap<&str, usize> = HashMap::with_capacity(ids.len());
    let mut order = Vec::with_capacity(ids.len());
    while let Some(current) = queue.pop_front() {
        let current_depth = *depth.entry(current).or_insert(1);
        if current_depth > MAX_REFERENCE_DEPTH {
            return Err(ConfigError::TooDeep {
                id: current.to_string(),
                depth: current_depth,
                max: MAX_REFERENCE_DEPTH,
            });
        }
        order.push(current.to_string());

        let mut next_ready = Vec::new();
        for dependent in dependents.get(current).into_iter().flatten() {
            let above = depth.entry(*dependent).or_insert(0);
            *above = (*above).max(current_depth + 1);
            if let Some(degree) = in_degree.get_mut(dependent) {
                *degree -= 1;
                if *degree == 0 {
                    next_ready.push(*dependent);
                }
            }
        }
        next_ready.sort_unstable();
        queue.extend(next_ready);
    }

    if order.len() != ids.len() {
        let ordered: HashSet<&str> = order.iter().map(String::as_str).collect();
        let mut members: Vec<String> = ids
            .iter()
            .filter(|id| !ordered.contains(*id))
            .map(|id| id.to_string())
            .collect();
        members.sort();
        return Err(ConfigError::Cycle { members });
    }

    Ok(order)
}

/// Blueprints assembled from one document, addressable by component id.
pub struct BlueprintSet {
    name: String,
    fingerprint: String,
    root: Option<String>,
    order: Vec<String>,
    evaluators: IndexMap<String, EvaluatorBlueprint>,
    open_lists: IndexMap<String, OpenListFactoryBlueprint>,
    searches: IndexMap<String, SearchBlueprint>,
}

/// Validate `doc` and build one blueprint per component.
pub fn assemble(doc: &BlueprintDocument) -> Result<BlueprintSet, ConfigError> {
    let errors = validate_document(doc);
    if !errors.is_empty() {
        return Err(ConfigError::Invalid(errors));
    }

    let order = build_order(doc)?;
    let mut set = BlueprintSet {
        name: doc.name.clone(),
        fingerprint: fingerprint(doc)?,
        root: doc.root.clone(),
        order: Vec::new(),
        evaluators: IndexMap::new(),
        open_lists: IndexMap::new(),
        searches: IndexMap::new(),
    };

    for id in order {
        let spec = doc
            .components
            .get(&id)
            .ok_or_else(|| ConfigError::UnknownComponent(id.clone()))?;
        set.add(&id, spec)?;
        set.order.push(id);
    }

    info!(
        name = %set.name,
        fingerprint = %set.fingerprint,
        components = set.order.len(),
        "assembled blueprint document"
    );
    Ok(set)
}

/// Parse, validate, and assemble a blueprint.yaml file.
pub fn load(path: &Path) -> Result<BlueprintSet, ConfigError> {
    let doc = parse_document_file(path)?;
    assemble(&doc)
}

impl BlueprintSet {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `blake3:` fingerprint of the source document.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Id of the search named by the document's `root:`.
    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    /// Component ids in construction order.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn category_of(&self, id: &str) -> Option<ComponentCategory> {
        if self.evaluators.contains_key(id) {
            Some(ComponentCategory::Evaluator)
        } else if self.open_lists.contains_key(id) {
            Some(ComponentCategory::OpenList)
        } else if self.searches.contains_key(id) {
            Some(ComponentCategory::Search)
        } else {
            None
        }
    }

    pub fn evaluator(&self, id: &str) -> Option<&EvaluatorBlueprint> {
        self.evaluators.get(id)
    }

    pub fn open_list(&self, id: &str) -> Option<&OpenListFactoryBlueprint> {
        self.open_lists.get(id)
    }

    pub fn search(&self, id: &str) -> Option<&SearchBlueprint> {
        self.searches.get(id)
    }

    /// Bind search `id` against `task` with a fresh cache.
    pub fn bind_search(&self, id: &str, task: &Arc<Task>) -> Result<Arc<dyn SearchAlgorithm>, ConfigError> {
        let blueprint = self.search_ref(id)?;
        Ok(blueprint.bind(task)?)
    }

    /// Bind search `id` against `task`, sharing instances through `cache`.
    pub fn bind_search_with_cache(
        &self,
        id: &str,
        task: &Arc<Task>,
        cache: &mut BindingCache,
    ) -> Result<Arc<dyn SearchAlgorithm>, ConfigError> {
        let blueprint = self.search_ref(id)?;
        Ok(blueprint.bind_with_cache(task, cache)?)
    }

    /// Bind the document's `root` search.
    pub fn bind_root(&self, task: &Arc<Task>) -> Result<Arc<dyn SearchAlgorithm>, ConfigError> {
        let root = self.root().ok_or(ConfigError::NoRoot)?;
        self.bind_search(root, task)
    }

    fn add(&mut self, id: &str, spec: &ComponentSpec) -> Result<(), ConfigError> {
        let description = spec.description_or(id).to_string();
        let verbosity = spec.verbosity;

        match &spec.kind {
            ComponentKind::Const { value } => {
                let bp = make_blueprint::<ConstEvaluator, dyn Evaluator, _>((*value, description, verbosity));
                self.evaluators.insert(id.to_string(), bp);
            }
            ComponentKind::Weighted { weight, eval } => {
                let inner = self.evaluator_ref(eval)?;
                let bp = make_blueprint::<WeightedEvaluator, dyn Evaluator, _>((
                    *weight,
                    inner,
                    description,
                    verbosity,
                ));
                self.evaluators.insert(id.to_string(), bp);
            }
            ComponentKind::Sum { evals } => {
                let evals = self.evaluator_refs(evals)?;
                let bp = make_blueprint::<SumEvaluator, dyn Evaluator, _>((evals, description, verbosity));
                self.evaluators.insert(id.to_string(), bp);
            }
            ComponentKind::Tiebreaking {
                evals,
                unsafe_pruning,
                pref_only,
            } => {
                let evals = self.evaluator_refs(evals)?;
                let bp = make_blueprint::<TieBreakingOpenListFactory, dyn OpenListFactory, _>((
                    evals,
                    *unsafe_pruning,
                    *pref_only,
                    description,
                    verbosity,
                ));
                self.open_lists.insert(id.to_string(), bp);
            }
            ComponentKind::Eager {
                open,
                f_eval,
                reopen_closed,
                max_expansions,
                max_depth,
            } => {
                let open = self.open_list_ref(open)?;
                let f_eval = self.evaluator_ref(f_eval)?;
                let limits = Opaque::new(SearchLimits {
                    max_expansions: *max_expansions,
                    max_depth: *max_depth,
                });
                let bp = make_blueprint::<EagerSearch, dyn SearchAlgorithm, _>((
                    open,
                    f_eval,
                    *reopen_closed,
                    limits,
                    description,
                    verbosity,
                ));
                self.searches.insert(id.to_string(), bp);
            }
        }

        debug!(id, kind = spec.kind.type_name(), "assembled component blueprint");
        Ok(())
    }

    fn mismatch(&self, id: &str, expected: ComponentCategory) -> ConfigError {
        match self.category_of(id) {
            Some(found) => ConfigError::CategoryMismatch {
                id: id.to_string(),
                expected,
                found,
            },
            None => ConfigError::UnknownComponent(id.to_string()),
        }
    }

    fn evaluator_ref(&self, id: &str) -> Result<EvaluatorBlueprint, ConfigError> {
        self.evaluators
            .get(id)
            .cloned()
            .ok_or_else(|| self.mismatch(id, ComponentCategory::Evaluator))
    }

    fn evaluator_refs(&self, ids: &[String]) -> Result<Vec<EvaluatorBlueprint>, ConfigError> {
        ids.iter().map(|id| self.evaluator_ref(id)).collect()
    }

    fn open_list_ref(&self, id: &str) -> Result<OpenListFactoryBlueprint, ConfigError> {
        self.open_lists
            .get(id)
            .cloned()
            .ok_or_else(|| self.mismatch(id, ComponentCategory::OpenList))
    }

    fn search_ref(&self, id: &str) -> Result<&SearchBlueprint, ConfigError> {
        self.searches
            .get(id)
            .ok_or_else(|| self.mismatch(id, ComponentCategory::Search))
    }
}

impl std::fmt::Debug for BlueprintSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlueprintSet")
            .field("name", &self.name)
            .field("fingerprint", &self.fingerprint)
            .field("root", &self.root)
            .field("order", &self.order)
            .finish()
    }
}
