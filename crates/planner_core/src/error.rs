//! Error types for the planner.
//!
//! A build order that cannot be executed is *not* an error here: the
//! simulator reports it through [`crate::simulation::SimulationError`] on the
//! run it returns. [`PlannerError`] covers misuse of the API and bad data.

use thiserror::Error;

/// Result type alias using [`PlannerError`].
pub type Result<T> = std::result::Result<T, PlannerError>;

/// Top-level error type for catalog, settings and optimizer input errors.
#[derive(Debug, Error)]
pub enum PlannerError {
    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path (or embedded name) of the data that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Catalog data failed validation.
    #[error("Invalid catalog: {}", .0.join("; "))]
    InvalidCatalog(Vec<String>),

    /// The race is not present in the catalog or could not be parsed.
    #[error("Unknown race: {0}")]
    UnknownRace(String),

    /// The named action does not exist for the race.
    #[error("Unknown action '{name}' for {race}")]
    UnknownAction {
        /// Race the lookup was made for.
        race: String,
        /// Name that was looked up.
        name: String,
    },

    /// A setting value had the wrong type or range.
    #[error("Invalid value for setting '{name}': {message}")]
    InvalidSetting {
        /// Setting name.
        name: String,
        /// What was wrong with it.
        message: String,
    },

    /// An optimization target string could not be parsed.
    #[error("Invalid optimization target '{0}'")]
    InvalidTarget(String),

    /// A constraint string could not be parsed.
    #[error("Invalid constraint '{0}'")]
    InvalidConstraint(String),

    /// Encoding a run failed.
    #[error("Serialization failed: {0}")]
    Serialization(String),
}
