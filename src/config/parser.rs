//! BD-021: YAML parsing and validation.
//!
//! Parses blueprint.yaml and validates structural constraints:
//! - Version must be "1.0"
//! - Component ids must be identifiers
//! - References must exist and name a component of the right category
//! - Type-specific fields must be usable

use super::types::*;
use super::ConfigError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static COMPONENT_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_\-]*$").expect("valid component id pattern"));

/// Validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Parse a blueprint.yaml file from disk.
pub fn parse_document_file(path: &Path) -> Result<BlueprintDocument, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document(&content)
}

/// Parse a blueprint.yaml from a string.
pub fn parse_document(yaml: &str) -> Result<BlueprintDocument, ConfigError> {
    Ok(serde_yaml_ng::from_str(yaml)?)
}

/// Validate a parsed document. Returns a list of errors (empty = valid).
pub fn validate_document(doc: &BlueprintDocument) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if doc.version != "1.0" {
        errors.push(ValidationError::new(format!(
            "version must be \"1.0\", got \"{}\"",
            doc.version
        )));
    }

    if doc.name.is_empty() {
        errors.push(ValidationError::new("name must not be empty"));
    }

    if let Some(root) = &doc.root {
        match doc.components.get(root) {
            None => errors.push(ValidationError::new(format!(
                "root references unknown component '{root}'"
            ))),
            Some(spec) if spec.kind.category() != ComponentCategory::Search => {
                errors.push(ValidationError::new(format!(
                    "root '{}' is {}, expected {}",
                    root,
                    spec.kind.category().category_name(),
                    ComponentCategory::Search.category_name()
                )))
            }
            Some(_) => {}
        }
    }

    for (id, spec) in &doc.components {
        if !COMPONENT_ID.is_match(id) {
            errors.push(ValidationError::new(format!(
                "component id '{id}' is not a valid identifier"
            )));
        }

        for reference in spec.kind.references() {
            if reference.target == id {
                errors.push(ValidationError::new(format!(
                    "component '{id}' references itself in '{}'",
                    reference.field
                )));
                continue;
            }
            match doc.components.get(reference.target) {
                None => errors.push(ValidationError::new(format!(
                    "component '{}' field '{}' references unknown component '{}'",
                    id, reference.field, reference.target
                ))),
                Some(target) if target.kind.category() != reference.expected => {
                    errors.push(ValidationError::new(format!(
                        "component '{}' field '{}' expects {}, but '{}' is {}",
                        id,
                        reference.field,
                        reference.expected.category_name(),
                        reference.target,
                        target.kind.category().category_name()
                    )))
                }
                Some(_) => {}
            }
        }

        match &spec.kind {
            ComponentKind::Sum { evals } | ComponentKind::Tiebreaking { evals, .. } => {
                if evals.is_empty() {
                    errors.push(ValidationError::new(format!(
                        "component '{}' ({}) has no evals",
                        id,
                        spec.kind.type_name()
                    )));
                }
            }
            ComponentKind::Eager {
                max_expansions: Some(0),
                ..
            } => errors.push(ValidationError::new(format!(
                "component '{id}' (eager) max_expansions must be positive"
            ))),
            _ => {}
        }
    }

    errors
}

/// Content hash of the document's canonical JSON form. Returns
/// `"blake3:{hex}"`.
///
/// Object keys are sorted, so reordering components in the YAML does not
/// change the fingerprint.
pub fn fingerprint(doc: &BlueprintDocument) -> Result<String, ConfigError> {
    let canonical = serde_json::to_value(doc)?;
    let text = serde_json::to_string(&canonical)?;
    Ok(format!("blake3:{}", blake3::hash(text.as_bytes()).to_hex()))
}
