//! Error types for the content model system
//!
//! Provides error handling for repository access, model lifecycle operations,
//! relationship resolution and query building.

use thiserror::Error;

use crate::config::ConfigError;

/// Result type alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised by a [`Repository`](crate::backends::Repository) adapter
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RepositoryError {
    /// The host refused the operation (validation, constraint, ...)
    #[error("{0}")]
    Rejected(String),
    /// The host could not be reached or is in a broken state
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    /// The host does not offer this capability
    #[error("capability not supported: {0}")]
    Unsupported(String),
}

/// Error types for model operations
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    /// Wiring problem: no repository bound, unknown relation or scope, unknown model key
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Model could not be located
    #[error("Unable to find model [{model}] {detail}")]
    NotFound { model: String, detail: String },

    /// Unsupported finder mode string
    #[error("Unsupported find mode [{mode}] for model [{model}]")]
    InvalidMode { model: String, mode: String },

    /// Insert or update reported failure
    #[error("Unable to {operation} model [{model}].{}", message_suffix(.message))]
    Persistence {
        model: String,
        operation: String,
        message: Option<String>,
    },

    /// Related model does not satisfy the content model contract
    #[error("Relationship error: {0}")]
    Relation(String),

    /// Update attempted on an existing model without an id
    #[error("Primary key is missing or invalid")]
    MissingPrimaryKey,

    /// Any other repository failure
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Invalid configuration values
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

fn message_suffix(message: &Option<String>) -> String {
    match message {
        Some(message) => format!(" {}", message),
        None => String::new(),
    }
}

impl ModelError {
    pub fn not_found(model: &str, detail: impl Into<String>) -> Self {
        ModelError::NotFound {
            model: model.to_string(),
            detail: detail.into(),
        }
    }

    pub fn persistence(model: &str, operation: &str, source: RepositoryError) -> Self {
        let message = match source {
            RepositoryError::Rejected(msg)
            | RepositoryError::Unavailable(msg)
            | RepositoryError::Unsupported(msg) => msg,
        };

        ModelError::Persistence {
            model: model.to_string(),
            operation: operation.to_string(),
            message: if message.is_empty() { None } else { Some(message) },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ModelError::NotFound { .. })
    }
}
