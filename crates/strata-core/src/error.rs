use crate::types::Collection;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StrataError {
    #[error("not initialized: run 'strata init'")]
    NotInitialized,

    #[error("{collection} not found: {id}")]
    RecordNotFound { collection: Collection, id: String },

    #[error("{collection} already exists: {id}")]
    RecordExists { collection: Collection, id: String },

    #[error("invalid id '{0}': must be alphanumeric with hyphens or underscores")]
    InvalidId(String),

    #[error("invalid work order: {0}")]
    InvalidWorkOrder(String),

    #[error("invalid recurrence: {0}")]
    InvalidRecurrence(String),

    #[error("invalid status: {0}")]
    InvalidStatus(String),

    #[error("invalid priority '{0}': expected low, medium, high or urgent")]
    InvalidPriority(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl StrataError {
    pub fn not_found(collection: Collection, id: impl Into<String>) -> Self {
        StrataError::RecordNotFound {
            collection,
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StrataError::RecordNotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, StrataError>;
