// Library interface for treadlog modules
// This allows integration tests and benches to access the core functionality

pub mod aggregate;
pub mod config;
pub mod database;
pub mod display;
pub mod error;
pub mod export;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod steps;
pub mod tracker;
pub mod validation;

// Re-export commonly used types for convenience
pub use models::*;
pub use metrics::WorkoutMetrics;
pub use aggregate::DailySummary;
pub use steps::{FixedStepProvider, StepCount, StepCountProvider, UnavailableStepProvider};
pub use tracker::Tracker;
pub use error::{TrackerError, Result};
pub use logging::{LogConfig, LogLevel, LogFormat};
