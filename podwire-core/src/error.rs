//! Error types for podwire-core.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for project graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors raised while opening, decoding, or persisting a project graph.
#[derive(Error, Debug)]
pub enum GraphError {
    /// The project's root descriptor does not exist.
    #[error("Project graph not found: {}", path.display())]
    NotFound {
        /// Root descriptor that was looked up.
        path: PathBuf,
    },

    /// The root descriptor exists but could not be read.
    #[error("Failed to read project graph {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The root descriptor was read but does not describe a usable graph.
    #[error("Malformed project graph {}: {message}", path.display())]
    Malformed {
        path: PathBuf,
        /// What was wrong with the object table.
        message: String,
    },

    /// Writing the graph back to disk failed.
    #[error("Failed to save project graph {}: {source}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Updating the root descriptor's modification time failed.
    #[error("Failed to touch project graph {}: {source}", path.display())]
    Touch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GraphError {
    pub(crate) fn malformed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        GraphError::Malformed {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A failed integration run, carrying enough context to diagnose it.
#[derive(Error, Debug)]
#[error("Failed to integrate target `{target}` with {}: {source}", project.display())]
pub struct IntegrationError {
    /// Name of the target being integrated.
    pub target: String,
    /// Project graph path the target is integrated into.
    pub project: PathBuf,
    #[source]
    pub source: GraphError,
}
