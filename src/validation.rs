use crate::models::{UserProfile, WorkoutInput};
use thiserror::Error;

/// Input rejected at the form boundary
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} must be a finite number, got {value}")]
    NotFinite { field: &'static str, value: f64 },

    #[error("{field} cannot be negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} must be greater than zero, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("Running duration ({running} min) exceeds total duration ({total} min)")]
    RunningExceedsTotal { running: f64, total: f64 },
}

/// Validate workout and body data before it is stored
pub struct WorkoutValidator;

impl WorkoutValidator {
    /// Validate a workout form payload
    pub fn validate(input: &WorkoutInput) -> Result<(), ValidationError> {
        Self::non_negative("total duration", input.total_duration_minutes)?;
        Self::non_negative("running duration", input.running_duration_minutes)?;
        Self::non_negative("running speed", input.running_speed_kmh)?;
        Self::non_negative("walking speed", input.walking_speed_kmh)?;

        // Walking time is derived as total minus running
        if input.running_duration_minutes > input.total_duration_minutes {
            return Err(ValidationError::RunningExceedsTotal {
                running: input.running_duration_minutes,
                total: input.total_duration_minutes,
            });
        }

        Ok(())
    }

    /// Validate a body-weight reading
    pub fn validate_weight(weight_kg: f64) -> Result<(), ValidationError> {
        Self::positive("weight", weight_kg)
    }

    /// Validate a complete profile
    pub fn validate_profile(profile: &UserProfile) -> Result<(), ValidationError> {
        Self::positive("weight", profile.weight_kg)?;
        Self::positive("height", profile.height_cm)?;
        Self::positive("daily steps goal", f64::from(profile.daily_steps_goal))?;
        Ok(())
    }

    fn finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(ValidationError::NotFinite { field, value })
        }
    }

    fn non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
        Self::finite(field, value)?;
        if value < 0.0 {
            return Err(ValidationError::Negative { field, value });
        }
        Ok(())
    }

    fn positive(field: &'static str, value: f64) -> Result<(), ValidationError> {
        Self::finite(field, value)?;
        if value <= 0.0 {
            return Err(ValidationError::NotPositive { field, value });
        }
        Ok(())
    }
}
