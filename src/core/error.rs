//! BD-002: Binding errors.
//!
//! The binder never interprets these. A component constructor returns one,
//! and it travels unchanged up to the root `bind` call.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    /// A constructor rejected one of its parameter values.
    #[error("invalid parameter '{parameter}' for {component}: {reason}")]
    InvalidParameter {
        component: String,
        parameter: String,
        reason: String,
    },

    /// A constructor failed for a reason not tied to a single parameter.
    #[error("cannot construct {component}: {reason}")]
    Construction { component: String, reason: String },
}

impl BindError {
    pub fn invalid_parameter(
        component: impl Into<String>,
        parameter: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            component: component.into(),
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    pub fn construction(component: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Construction {
            component: component.into(),
            reason: reason.into(),
        }
    }
}
