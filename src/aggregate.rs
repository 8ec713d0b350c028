//! Daily aggregation over logged workouts

use crate::metrics;
use crate::models::{UserProfile, WorkoutRecord};
use crate::steps::{StepCount, StepEstimate};
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Workouts logged within `[day_start, day_start + 24h)`
pub fn todays_workouts(records: &[WorkoutRecord], day_start: DateTime<Utc>) -> Vec<&WorkoutRecord> {
    let day_end = day_start + Duration::days(1);
    records
        .iter()
        .filter(|r| r.date >= day_start && r.date < day_end)
        .collect()
}

/// Start of a calendar day in the given time zone, as a UTC instant
pub fn day_start_in<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    first_valid_instant(date, |local| {
        tz.from_local_datetime(local)
            .earliest()
            .map(|d| d.with_timezone(&Utc))
    })
}

/// Granularity used to step over a DST gap; real gaps end on a quarter hour
const GAP_STEP_MINUTES: i64 = 15;

/// First local time on `date` that `resolve` maps to an instant.
///
/// Midnight itself unless a DST jump skips it, in which case the day
/// starts where the gap ends.
fn first_valid_instant<F>(date: NaiveDate, resolve: F) -> DateTime<Utc>
where
    F: Fn(&NaiveDateTime) -> Option<DateTime<Utc>>,
{
    let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();

    let mut local = midnight;
    while local.date() == date {
        if let Some(instant) = resolve(&local) {
            return instant;
        }
        local += Duration::minutes(GAP_STEP_MINUTES);
    }

    tracing::warn!(%date, "No valid local time on this day, using UTC midnight");
    midnight.and_utc()
}

/// Start of a calendar day in the system time zone
pub fn local_day_start(date: NaiveDate) -> DateTime<Utc> {
    day_start_in(date, &Local)
}

/// Start of the current local day
pub fn today_start() -> DateTime<Utc> {
    local_day_start(Local::now().date_naive())
}

pub fn sum_distance<'a, I>(records: I) -> f64
where
    I: IntoIterator<Item = &'a WorkoutRecord>,
{
    records.into_iter().map(metrics::total_distance).sum()
}

pub fn sum_calories<'a, I>(records: I, profile: &UserProfile) -> f64
where
    I: IntoIterator<Item = &'a WorkoutRecord>,
{
    records
        .into_iter()
        .map(|r| metrics::calories_burned(r, profile))
        .sum()
}

/// Sort records for display, most recent first
pub fn sort_newest_first(records: &mut [WorkoutRecord]) {
    records.sort_by(|a, b| b.date.cmp(&a.date));
}

/// Today's dashboard: workouts plus step-derived activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub day_start: DateTime<Utc>,
    pub workout_count: usize,
    pub workout_minutes: f64,
    pub workout_distance_km: f64,
    pub workout_calories: f64,
    pub step_count: StepCount,
    pub steps: StepEstimate,
    pub daily_steps_goal: u32,
}

impl DailySummary {
    pub fn build(
        records: &[WorkoutRecord],
        profile: &UserProfile,
        step_count: StepCount,
        day_start: DateTime<Utc>,
    ) -> Self {
        let today = todays_workouts(records, day_start);
        let steps = StepEstimate::compute(
            step_count.steps_or_zero(),
            profile.weight_kg,
            profile.daily_steps_goal,
        );

        Self {
            day_start,
            workout_count: today.len(),
            workout_minutes: today.iter().map(|r| r.total_duration_minutes).sum(),
            workout_distance_km: sum_distance(today.iter().copied()),
            workout_calories: sum_calories(today.iter().copied(), profile),
            step_count,
            steps,
            daily_steps_goal: profile.daily_steps_goal,
        }
    }

    /// Workout and step calories together
    pub fn total_calories(&self) -> f64 {
        self.workout_calories + self.steps.calories_kcal
    }
}
