//! Error types for the payload filter
//!
//! Policy outcomes (malicious content, depth exceeded) are never errors; they
//! are reported through the scan verdict. Everything here is either a
//! configuration problem or a fault while materializing request data.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Invalid disallowed-content pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Failed to materialize argument '{argument}': {source}")]
    Serialization {
        argument: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read request body: {0}")]
    Body(String),

    #[error("Failed to load configuration: {0}")]
    ConfigLoad(String),
}

impl FilterError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Whether the error was caused by configuration rather than a request
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::InvalidPattern { .. } | Self::ConfigLoad(_)
        )
    }
}
