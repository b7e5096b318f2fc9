//! Error types for the command line tools.

use planner_core::error::PlannerError;
use thiserror::Error;

/// Result type alias using [`ToolError`].
pub type Result<T> = std::result::Result<T, ToolError>;

/// Errors reading inputs or writing reports.
#[derive(Debug, Error)]
pub enum ToolError {
    /// A file could not be read.
    #[error("Failed to read '{path}': {source}")]
    Io {
        /// Path of the file.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A build order file is malformed.
    #[error("Invalid build order file '{path}': {message}")]
    BuildOrderFile {
        /// Path of the file.
        path: String,
        /// Error message.
        message: String,
    },

    /// Catalog, settings or optimizer input error.
    #[error(transparent)]
    Planner(#[from] PlannerError),

    /// A report could not be encoded.
    #[error("Failed to encode report: {0}")]
    Json(#[from] serde_json::Error),
}
