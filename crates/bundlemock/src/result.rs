//! Result and error types for bundlemock.

use crate::graph::ModuleId;
use thiserror::Error;

/// Result type for bundlemock operations
pub type BundleMockResult<T> = Result<T, BundleMockError>;

/// Errors that can occur while resolving modules or mocks
#[derive(Debug, Error)]
pub enum BundleMockError {
    /// Module id is not part of the bundle's module graph
    #[error("Unknown module id {id}: not present in the bundle's module graph")]
    UnknownModule {
        /// Offending module id
        id: ModuleId,
    },

    /// Malformed configuration (bad unmock pattern, unknown option, ...)
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message
        message: String,
    },

    /// A module factory failed while executing
    #[error("Module {id} failed to execute: {message}")]
    ModuleExecution {
        /// Module that failed
        id: ModuleId,
        /// Error message
        message: String,
    },

    /// Bundle stats missing or malformed
    #[error("Bundle stats error: {message}")]
    Stats {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl BundleMockError {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a module execution error
    #[must_use]
    pub fn module_execution(id: ModuleId, message: impl Into<String>) -> Self {
        Self::ModuleExecution {
            id,
            message: message.into(),
        }
    }

    /// Create a stats error
    #[must_use]
    pub fn stats(message: impl Into<String>) -> Self {
        Self::Stats {
            message: message.into(),
        }
    }

    /// Module id carried by the error, if any
    #[must_use]
    pub const fn module_id(&self) -> Option<ModuleId> {
        match self {
            Self::UnknownModule { id } | Self::ModuleExecution { id, .. } => Some(*id),
            _ => None,
        }
    }
}
