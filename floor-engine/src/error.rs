//! Engine error types

use thiserror::Error;

use crate::grouping::GroupingError;
use crate::store::StoreError;

/// Floor-plan engine error
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// Rejected locally before any store call
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Canvas dimensions are not known yet
    #[error("Floor plan layout is not ready")]
    LayoutNotReady,

    /// Store call failed
    #[error(transparent)]
    Remote(#[from] StoreError),

    /// Stored grouping tree is corrupt
    #[error("Group invariant violated: {0}")]
    Invariant(GroupingError),
}

impl EngineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// True when the working copy may be stale and must be re-fetched
    pub fn needs_resync(&self) -> bool {
        matches!(self, EngineError::Remote(_) | EngineError::Invariant(_))
    }
}

impl From<GroupingError> for EngineError {
    fn from(err: GroupingError) -> Self {
        if err.is_corruption() {
            EngineError::Invariant(err)
        } else {
            EngineError::Validation(err.to_string())
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
