//! Error types for DataQC operations.
//!
//! Only structural failures surface as errors. Per-record validation failures,
//! broken rules and unreachable audit sinks are reported inside the quality
//! output instead, so a batch always produces a best-effort result.

use thiserror::Error;

/// Main error type for DataQC operations.
#[derive(Debug, Error)]
pub enum DataQcError {
    /// Configuration or rule definition error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Structurally invalid input (batch is not a list, missing action)
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Serialization or deserialization failed
    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// I/O operation failed
    #[error("I/O operation failed: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Storing results in an audit sink failed
    #[error("Persistence failed: {context}")]
    Persistence {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Convenience type alias for Results with DataQcError
pub type Result<T> = std::result::Result<T, DataQcError>;

impl DataQcError {
    /// Creates a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a serialization error with context
    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }

    /// Creates a persistence error with context
    pub fn persistence_failed<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Persistence {
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Returns true when the error describes bad caller input rather than
    /// a failure of the service itself.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::InvalidInput { .. } | Self::Configuration { .. })
    }
}
