use crate::metrics::WorkoutMetrics;
use crate::models::{UserProfile, WorkoutRecord};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub mod csv;
pub mod json;

/// Export format types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl std::str::FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Date range filter for exports, inclusive on both ends (UTC calendar days)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        DateRange { start, end }
    }

    /// Check if a date falls within this range
    pub fn contains(&self, date: &NaiveDate) -> bool {
        let after_start = self.start.map_or(true, |start| date >= &start);
        let before_end = self.end.map_or(true, |end| date <= &end);
        after_start && before_end
    }

    /// Filter workouts by date range
    pub fn filter_workouts<'a>(&self, workouts: &'a [WorkoutRecord]) -> Vec<&'a WorkoutRecord> {
        workouts
            .iter()
            .filter(|w| self.contains(&w.date.date_naive()))
            .collect()
    }
}

/// Export errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// One exported workout: stored fields plus every derived metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutExportRow {
    pub id: String,
    pub date: DateTime<Utc>,
    pub total_duration_minutes: f64,
    pub running_duration_minutes: f64,
    pub walking_duration_minutes: f64,
    pub running_speed_kmh: f64,
    pub walking_speed_kmh: f64,
    pub running_distance_km: f64,
    pub walking_distance_km: f64,
    pub total_distance_km: f64,
    pub average_speed_kmh: f64,
    pub calories_kcal: f64,
}

impl WorkoutExportRow {
    pub fn from_record(record: &WorkoutRecord, profile: &UserProfile) -> Self {
        let metrics = WorkoutMetrics::compute(record, profile);
        Self {
            id: record.id.clone(),
            date: record.date,
            total_duration_minutes: record.total_duration_minutes,
            running_duration_minutes: record.running_duration_minutes,
            walking_duration_minutes: metrics.walking_duration_minutes,
            running_speed_kmh: record.running_speed_kmh,
            walking_speed_kmh: record.walking_speed_kmh,
            running_distance_km: metrics.running_distance_km,
            walking_distance_km: metrics.walking_distance_km,
            total_distance_km: metrics.total_distance_km,
            average_speed_kmh: metrics.average_speed_kmh,
            calories_kcal: metrics.total_calories,
        }
    }
}

/// Export workout history with derived metrics, oldest first
pub fn export_workouts<P: AsRef<Path>>(
    workouts: &[&WorkoutRecord],
    profile: &UserProfile,
    format: ExportFormat,
    output_path: P,
) -> Result<usize, ExportError> {
    let mut rows: Vec<WorkoutExportRow> = workouts
        .iter()
        .map(|w| WorkoutExportRow::from_record(w, profile))
        .collect();
    rows.sort_by(|a, b| a.date.cmp(&b.date));

    match format {
        ExportFormat::Csv => csv::export_workout_rows(&rows, &output_path)?,
        ExportFormat::Json => json::export_json(&rows, &output_path)?,
    }

    tracing::info!(
        rows = rows.len(),
        format = ?format,
        path = %output_path.as_ref().display(),
        "Exported workouts"
    );

    Ok(rows.len())
}
