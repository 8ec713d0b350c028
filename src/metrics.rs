//! Treadmill workout metrics and calorie estimation
//!
//! Derived distances, average speed and a MET-based calorie estimate for a
//! [`WorkoutRecord`]. Everything here is pure arithmetic over the record and
//! profile; nothing is stored.
//!
//! Calories use the standard MET conversion
//! `kcal = MET × 3.5 × weight_kg × minutes / 200`, with the MET looked up
//! from a speed-banded table separately for the running and the walking
//! segment.

use crate::models::{UserProfile, WorkoutRecord};
use serde::{Deserialize, Serialize};

/// Oxygen uptake of one MET, ml/kg/min
const MET_OXYGEN_ML_PER_KG_MIN: f64 = 3.5;

/// Divisor turning `MET × 3.5 × kg × min` into kcal
const KCAL_DIVISOR: f64 = 200.0;

/// Walking MET bands: `(upper bound km/h exclusive, MET)`
const WALKING_MET_BANDS: [(f64, f64); 5] = [
    (3.2, 2.0),
    (4.0, 2.5),
    (4.8, 3.0),
    (5.6, 3.5),
    (6.4, 4.0),
];

/// MET for walking at or above the last walking band
const WALKING_MET_MAX: f64 = 4.5;

/// Running MET bands: `(upper bound km/h exclusive, MET)`
const RUNNING_MET_BANDS: [(f64, f64); 10] = [
    (8.0, 8.0),
    (8.4, 9.0),
    (9.7, 10.0),
    (10.8, 11.0),
    (11.3, 11.5),
    (12.1, 12.5),
    (12.9, 13.5),
    (13.8, 14.0),
    (14.5, 15.0),
    (16.1, 16.0),
];

/// MET for running at or above the last running band
const RUNNING_MET_MAX: f64 = 18.0;

/// Walking minutes: total minus running.
///
/// Input where running exceeds total is rejected by
/// [`crate::validation::WorkoutValidator`] before it reaches a record.
pub fn walking_duration(record: &WorkoutRecord) -> f64 {
    record.total_duration_minutes - record.running_duration_minutes
}

/// Distance covered at a constant speed, km
pub fn segment_distance(duration_minutes: f64, speed_kmh: f64) -> f64 {
    (duration_minutes / 60.0) * speed_kmh
}

pub fn running_distance(record: &WorkoutRecord) -> f64 {
    segment_distance(record.running_duration_minutes, record.running_speed_kmh)
}

pub fn walking_distance(record: &WorkoutRecord) -> f64 {
    segment_distance(walking_duration(record), record.walking_speed_kmh)
}

/// Running plus walking distance, km
pub fn total_distance(record: &WorkoutRecord) -> f64 {
    running_distance(record) + walking_distance(record)
}

/// Average speed over the whole session, km/h. Zero for a zero-length session.
pub fn average_speed(record: &WorkoutRecord) -> f64 {
    if record.total_duration_minutes > 0.0 {
        total_distance(record) / (record.total_duration_minutes / 60.0)
    } else {
        0.0
    }
}

/// First band whose upper bound lies above `speed`, else `max`
fn lookup_band(bands: &[(f64, f64)], max: f64, speed: f64) -> f64 {
    bands
        .iter()
        .find(|(upper, _)| speed < *upper)
        .map(|(_, met)| *met)
        .unwrap_or(max)
}

/// MET for walking at `speed_kmh`
pub fn walking_met(speed_kmh: f64) -> f64 {
    lookup_band(&WALKING_MET_BANDS, WALKING_MET_MAX, speed_kmh)
}

/// MET for running at `speed_kmh`
pub fn running_met(speed_kmh: f64) -> f64 {
    lookup_band(&RUNNING_MET_BANDS, RUNNING_MET_MAX, speed_kmh)
}

/// Energy spent at a given MET, kcal
pub fn met_calories(met: f64, weight_kg: f64, duration_minutes: f64) -> f64 {
    (met * MET_OXYGEN_ML_PER_KG_MIN * weight_kg * duration_minutes) / KCAL_DIVISOR
}

pub fn running_calories(record: &WorkoutRecord, profile: &UserProfile) -> f64 {
    met_calories(
        running_met(record.running_speed_kmh),
        profile.weight_kg,
        record.running_duration_minutes,
    )
}

pub fn walking_calories(record: &WorkoutRecord, profile: &UserProfile) -> f64 {
    met_calories(
        walking_met(record.walking_speed_kmh),
        profile.weight_kg,
        walking_duration(record),
    )
}

/// Estimated calories burned across both segments, kcal
pub fn calories_burned(record: &WorkoutRecord, profile: &UserProfile) -> f64 {
    running_calories(record, profile) + walking_calories(record, profile)
}

/// Every derived value of a workout, computed in one go
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkoutMetrics {
    pub walking_duration_minutes: f64,
    pub running_distance_km: f64,
    pub walking_distance_km: f64,
    pub total_distance_km: f64,
    pub average_speed_kmh: f64,
    pub running_met: f64,
    pub walking_met: f64,
    pub running_calories: f64,
    pub walking_calories: f64,
    pub total_calories: f64,
}

impl WorkoutMetrics {
    pub fn compute(record: &WorkoutRecord, profile: &UserProfile) -> Self {
        let running_calories = running_calories(record, profile);
        let walking_calories = walking_calories(record, profile);

        let metrics = Self {
            walking_duration_minutes: walking_duration(record),
            running_distance_km: running_distance(record),
            walking_distance_km: walking_distance(record),
            total_distance_km: total_distance(record),
            average_speed_kmh: average_speed(record),
            running_met: running_met(record.running_speed_kmh),
            walking_met: walking_met(record.walking_speed_kmh),
            running_calories,
            walking_calories,
            total_calories: running_calories + walking_calories,
        };

        tracing::debug!(
            workout_id = %record.id,
            distance_km = metrics.total_distance_km,
            kcal = metrics.total_calories,
            "Computed workout metrics"
        );

        metrics
    }
}
