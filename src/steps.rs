//! Step-count based estimates and the step-count source boundary
//!
//! Steps come from an external health store. The estimate functions treat
//! every step as an average stride walked at a steady pace, independent of
//! the treadmill metrics engine.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Average stride length in meters
pub const STRIDE_LENGTH_M: f64 = 0.762;

/// Assumed walking pace in meters per minute
pub const WALKING_PACE_M_PER_MIN: f64 = 80.0;

/// MET applied to step-derived walking
pub const STEP_WALKING_MET: f64 = 3.0;

/// Distance walked for a step count, km
pub fn steps_to_distance_km(steps: u32) -> f64 {
    f64::from(steps) * STRIDE_LENGTH_M / 1000.0
}

/// Minutes needed to walk a step count at the assumed pace
pub fn steps_to_walking_minutes(steps: u32) -> f64 {
    (f64::from(steps) * STRIDE_LENGTH_M) / WALKING_PACE_M_PER_MIN
}

/// Calories burned walking a step count, kcal
pub fn steps_to_calories_kcal(steps: u32, weight_kg: f64) -> f64 {
    crate::metrics::met_calories(STEP_WALKING_MET, weight_kg, steps_to_walking_minutes(steps))
}

/// Fraction of the daily goal reached; above 1.0 once the goal is beaten
pub fn goal_progress(steps: u32, goal: u32) -> f64 {
    if goal == 0 {
        return 0.0;
    }
    f64::from(steps) / f64::from(goal)
}

/// Outcome of asking the health store for today's steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "steps", rename_all = "lowercase")]
pub enum StepCount {
    /// The store answered with a count
    Available(u32),
    /// No health store is present or it returned nothing
    Unavailable,
    /// The user has not granted read access
    Denied,
}

impl StepCount {
    /// Count for display purposes; unavailable and denied read as zero
    pub fn steps_or_zero(&self) -> u32 {
        match self {
            StepCount::Available(steps) => *steps,
            StepCount::Unavailable | StepCount::Denied => 0,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, StepCount::Available(_))
    }
}

impl std::fmt::Display for StepCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepCount::Available(steps) => write!(f, "{}", steps),
            StepCount::Unavailable => write!(f, "unavailable"),
            StepCount::Denied => write!(f, "permission denied"),
        }
    }
}

/// Source of today's step count.
///
/// Each call yields at most one result; there is no retry policy.
#[async_trait]
pub trait StepCountProvider: Send + Sync {
    async fn current_steps_today(&self) -> StepCount;
}

/// Provider for a count that is already known, e.g. typed in by the user
#[derive(Debug, Clone, Copy)]
pub struct FixedStepProvider {
    steps: u32,
}

impl FixedStepProvider {
    pub fn new(steps: u32) -> Self {
        Self { steps }
    }
}

#[async_trait]
impl StepCountProvider for FixedStepProvider {
    async fn current_steps_today(&self) -> StepCount {
        StepCount::Available(self.steps)
    }
}

/// Provider used when no health source is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableStepProvider;

#[async_trait]
impl StepCountProvider for UnavailableStepProvider {
    async fn current_steps_today(&self) -> StepCount {
        StepCount::Unavailable
    }
}

/// Distance and calorie contribution of a day's steps
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepEstimate {
    pub steps: u32,
    pub distance_km: f64,
    pub calories_kcal: f64,
    pub goal_progress: f64,
}

impl StepEstimate {
    pub fn compute(steps: u32, weight_kg: f64, goal: u32) -> Self {
        Self {
            steps,
            distance_km: steps_to_distance_km(steps),
            calories_kcal: steps_to_calories_kcal(steps, weight_kg),
            goal_progress: goal_progress(steps, goal),
        }
    }
}
