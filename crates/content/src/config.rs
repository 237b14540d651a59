//! Content model configuration
//!
//! Defaults applied to every model definition created through a
//! [`ModelRegistry`](crate::registry::ModelRegistry): the status new records
//! are written with and the attribute names used for timestamps and soft
//! deletes.

use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {field}: expected {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

impl ConfigError {
    pub fn validation_failed(message: &str) -> Self {
        ConfigError::ValidationFailed(message.to_string())
    }
}

/// Default values for content configuration
pub struct ContentDefaults;

impl ContentDefaults {
    pub const DEFAULT_STATUS: &'static str = "publish";
    pub const CREATED_AT_COLUMN: &'static str = "created_at";
    pub const UPDATED_AT_COLUMN: &'static str = "updated_at";
    pub const DELETED_AT_COLUMN: &'static str = "deleted_at";
    pub const TIMESTAMPS: bool = true;
}

/// Content model configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Status written on insert when none is set, and filtered on by default
    pub default_status: String,
    /// Attribute stamped when a model is first inserted
    pub created_at_column: String,
    /// Attribute stamped on every insert and update
    pub updated_at_column: String,
    /// Soft delete marker attribute
    pub deleted_at_column: String,
    /// Whether models maintain timestamps unless they opt out
    pub timestamps: bool,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            default_status: ContentDefaults::DEFAULT_STATUS.to_string(),
            created_at_column: ContentDefaults::CREATED_AT_COLUMN.to_string(),
            updated_at_column: ContentDefaults::UPDATED_AT_COLUMN.to_string(),
            deleted_at_column: ContentDefaults::DELETED_AT_COLUMN.to_string(),
            timestamps: ContentDefaults::TIMESTAMPS,
        }
    }
}

impl ContentConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_status.trim().is_empty() {
            return Err(ConfigError::validation_failed(
                "Default status must not be empty",
            ));
        }

        for (field, column) in [
            ("created_at_column", &self.created_at_column),
            ("updated_at_column", &self.updated_at_column),
            ("deleted_at_column", &self.deleted_at_column),
        ] {
            if column.trim().is_empty() {
                return Err(ConfigError::ValidationFailed(format!(
                    "{} must not be empty",
                    field
                )));
            }
        }

        if self.created_at_column == self.updated_at_column {
            return Err(ConfigError::validation_failed(
                "created_at and updated_at columns must differ",
            ));
        }

        Ok(())
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let default_status =
            get_env_or_default("CONTENT_DEFAULT_STATUS", ContentDefaults::DEFAULT_STATUS);
        let created_at_column =
            get_env_or_default("CONTENT_CREATED_AT_COLUMN", ContentDefaults::CREATED_AT_COLUMN);
        let updated_at_column =
            get_env_or_default("CONTENT_UPDATED_AT_COLUMN", ContentDefaults::UPDATED_AT_COLUMN);
        let deleted_at_column =
            get_env_or_default("CONTENT_DELETED_AT_COLUMN", ContentDefaults::DELETED_AT_COLUMN);

        let timestamps = get_env_or_default(
            "CONTENT_TIMESTAMPS",
            &ContentDefaults::TIMESTAMPS.to_string(),
        )
        .parse::<bool>()
        .map_err(|_| ConfigError::InvalidValue {
            field: "timestamps".to_string(),
            value: env::var("CONTENT_TIMESTAMPS").unwrap_or_default(),
            expected: "true or false".to_string(),
        })?;

        let config = ContentConfig {
            default_status,
            created_at_column,
            updated_at_column,
            deleted_at_column,
            timestamps,
        };

        config.validate()?;

        Ok(config)
    }
}

fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
