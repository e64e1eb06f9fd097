//! BD-020: Blueprint document types.
//!
//! A blueprint document names every component once and refers to other
//! components by id, so a component listed once and referenced many times
//! becomes one shared blueprint.

use crate::core::blueprint::Category;
use crate::core::types::Verbosity;
use crate::domain::evaluator::Evaluator;
use crate::domain::open_list::OpenListFactory;
use crate::domain::search::SearchAlgorithm;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Root document (blueprint.yaml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlueprintDocument {
    /// Schema version (must be "1.0")
    pub version: String,

    /// Document name
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Search bound by `BlueprintSet::bind_root`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,

    /// Components, keyed by id
    #[serde(default)]
    pub components: IndexMap<String, ComponentSpec>,
}

/// One component entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSpec {
    #[serde(flatten)]
    pub kind: ComponentKind,

    /// Defaults to the component id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub verbosity: Verbosity,
}

impl ComponentSpec {
    /// Description used in the recipe trailer.
    pub fn description_or<'a>(&'a self, id: &'a str) -> &'a str {
        self.description.as_deref().unwrap_or(id)
    }
}

/// Component type and its type-specific fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ComponentKind {
    Const {
        value: i64,
    },
    Weighted {
        weight: i64,
        eval: String,
    },
    Sum {
        evals: Vec<String>,
    },
    Tiebreaking {
        evals: Vec<String>,
        #[serde(default)]
        unsafe_pruning: bool,
        #[serde(default)]
        pref_only: bool,
    },
    Eager {
        open: String,
        f_eval: String,
        #[serde(default)]
        reopen_closed: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_expansions: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_depth: Option<u32>,
    },
}

impl ComponentKind {
    /// The `type:` tag.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Const { .. } => "const",
            Self::Weighted { .. } => "weighted",
            Self::Sum { .. } => "sum",
            Self::Tiebreaking { .. } => "tiebreaking",
            Self::Eager { .. } => "eager",
        }
    }

    pub fn category(&self) -> ComponentCategory {
        match self {
            Self::Const { .. } | Self::Weighted { .. } | Self::Sum { .. } => {
                ComponentCategory::Evaluator
            }
            Self::Tiebreaking { .. } => ComponentCategory::OpenList,
            Self::Eager { .. } => ComponentCategory::Search,
        }
    }

    /// Every component this one refers to, in field order, with the
    /// category the field requires.
    pub fn references(&self) -> Vec<Reference<'_>> {
        match self {
            Self::Const { .. } => Vec::new(),
            Self::Weighted { eval: id, .. } => vec![Reference::evaluator("eval", id)],
            Self::Sum { evals } | Self::Tiebreaking { evals, .. } => {
                evals.iter().map(|id| Reference::evaluator("evals", id)).collect()
            }
            Self::Eager { open, f_eval, .. } => vec![
                Reference {
                    field: "open",
                    target: open.as_str(),
                    expected: ComponentCategory::OpenList,
                },
                Reference::evaluator("f_eval", f_eval),
            ],
        }
    }
}

/// A by-id reference from one component field to another component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference<'a> {
    pub field: &'static str,
    pub target: &'a str,
    pub expected: ComponentCategory,
}

impl<'a> Reference<'a> {
    fn evaluator(field: &'static str, target: &'a str) -> Self {
        Self {
            field,
            target,
            expected: ComponentCategory::Evaluator,
        }
    }
}

/// Category a document component belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentCategory {
    Evaluator,
    OpenList,
    Search,
}

impl ComponentCategory {
    /// Name of the matching category trait object.
    pub fn category_name(self) -> &'static str {
        match self {
            Self::Evaluator => <dyn Evaluator as Category>::NAME,
            Self::OpenList => <dyn OpenListFactory as Category>::NAME,
            Self::Search => <dyn SearchAlgorithm as Category>::NAME,
        }
    }
}

impl fmt::Display for ComponentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Evaluator => "evaluator",
            Self::OpenList => "open list",
            Self::Search => "search",
        };
        write!(f, "{s}")
    }
}
