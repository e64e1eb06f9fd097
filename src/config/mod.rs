//! Blueprint documents: YAML configuration assembled into shared blueprints.

pub mod assembler;
pub mod parser;
pub mod types;

pub use assembler::{assemble, build_order, load, BlueprintSet, MAX_REFERENCE_DEPTH};
pub use parser::{fingerprint, parse_document, parse_document_file, validate_document, ValidationError};
pub use types::{BlueprintDocument, ComponentCategory, ComponentKind, ComponentSpec};

use crate::core::error::BindError;
use std::path::PathBuf;

/// Errors from loading, validating, assembling, or binding a document.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("JSON encode error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{} validation error(s):\n{}", .0.len(), join_messages(.0))]
    Invalid(Vec<ValidationError>),

    #[error("dependency cycle detected involving: {}", .members.join(", "))]
    Cycle { members: Vec<String> },

    #[error("component '{id}' is {depth} references deep, the limit is {max}")]
    TooDeep { id: String, depth: usize, max: usize },

    #[error("unknown component '{0}'")]
    UnknownComponent(String),

    #[error("component '{id}' is {found}, expected {expected}")]
    CategoryMismatch {
        id: String,
        expected: ComponentCategory,
        found: ComponentCategory,
    },

    #[error("document does not name a root search")]
    NoRoot,

    #[error(transparent)]
    Bind(#[from] BindError),
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}
