use thiserror::Error;

use crate::schema::ActionKind;

/// Errors raised by action construction, scenario validation and the codecs
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActionError {
    /// An action was built with a probability outside [0, 1] or a bad cost
    #[error("invalid action: {reason}")]
    Construction { reason: String },

    /// Flat action space index outside [0, len)
    #[error("invalid action index {index}: action space has {len} actions")]
    InvalidActionIndex { index: i64, len: usize },

    /// Parameterised vector of the wrong shape or with a component out of bounds
    #[error("invalid action vector: {reason}")]
    InvalidActionVector { reason: String },

    /// An action kind reached a helper that has no definition for it,
    /// e.g. a non-scan kind passed to the scan-cost lookup
    #[error("action kind {kind} is not supported here")]
    TypeMismatch { kind: ActionKind },

    #[error("invalid scenario: {reason}")]
    InvalidScenario { reason: String },
}

impl ActionError {
    pub(crate) fn construction(reason: impl Into<String>) -> Self {
        ActionError::Construction { reason: reason.into() }
    }

    pub(crate) fn vector(reason: impl Into<String>) -> Self {
        ActionError::InvalidActionVector { reason: reason.into() }
    }

    pub(crate) fn scenario(reason: impl Into<String>) -> Self {
        ActionError::InvalidScenario { reason: reason.into() }
    }
}
