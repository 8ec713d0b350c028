//! Unified error hierarchy for treadlog
//!
//! Each concern keeps its own error enum next to the code that raises it;
//! this module ties them together so callers can use a single `Result`.

use thiserror::Error;

use crate::database::DatabaseError;
use crate::export::ExportError;
use crate::validation::ValidationError;

/// Top-level error type for all treadlog operations
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Input rejected at the boundary
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Database operation errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Export errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type alias for treadlog operations
pub type Result<T> = std::result::Result<T, TrackerError>;

impl TrackerError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TrackerError::Validation(_) => ErrorSeverity::Warning,
            TrackerError::Database(DatabaseError::NotFound(_)) => ErrorSeverity::Warning,
            TrackerError::Configuration(_) => ErrorSeverity::Warning,
            TrackerError::Database(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            TrackerError::Validation(ValidationError::RunningExceedsTotal { running, total }) => {
                format!(
                    "Running time ({} min) cannot be longer than the whole workout ({} min).",
                    running, total
                )
            }
            TrackerError::Validation(err) => format!("Please check your input: {}", err),
            TrackerError::Database(DatabaseError::NotFound(what)) => {
                format!("Nothing found for {}. It may already have been deleted.", what)
            }
            TrackerError::Database(_) => {
                "Unable to read or write the local database. Please check the database path."
                    .to_string()
            }
            TrackerError::Configuration(reason) => {
                format!("{}. Check your treadlog config file.", reason)
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Local data cannot be accessed
    Critical,
    /// Operation failed but the app can continue
    Error,
    /// Input problem the user can fix
    Warning,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
        }
    }
}
