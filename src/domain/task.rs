//! BD-010: Planning task, the binding context of the sample domain.

use crate::core::types::{BindingContext, ContextId};

/// Stand-in for a planning task. Only its identity and name matter here.
#[derive(Debug)]
pub struct Task {
    id: ContextId,
    name: String,
}

impl Task {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ContextId::next(),
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl BindingContext for Task {
    fn context_id(&self) -> ContextId {
        self.id
    }
}
