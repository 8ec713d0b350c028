//! Terminal formatting for workouts, weights and the daily summary

use crate::aggregate::DailySummary;
use crate::metrics::WorkoutMetrics;
use crate::models::{UserProfile, WeightMeasurement, WorkoutRecord};
use chrono::Local;
use tabled::{settings::Style, Table, Tabled};

/// Minutes as `HH:MM`, truncating any fraction of a minute
pub fn format_minutes(minutes: f64) -> String {
    let whole = if minutes.is_finite() && minutes > 0.0 {
        minutes as u64
    } else {
        0
    };
    format!("{:02}:{:02}", whole / 60, whole % 60)
}

pub fn format_speed(speed_kmh: f64, precision: usize) -> String {
    format!("{:.*} km/h", precision, speed_kmh)
}

pub fn format_distance(distance_km: f64, precision: usize) -> String {
    format!("{:.*} km", precision, distance_km)
}

#[derive(Tabled)]
struct WorkoutRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Total")]
    total: String,
    #[tabled(rename = "Running")]
    running: String,
    #[tabled(rename = "Walking")]
    walking: String,
    #[tabled(rename = "Distance")]
    distance: String,
    #[tabled(rename = "Avg speed")]
    average_speed: String,
    #[tabled(rename = "kcal")]
    calories: String,
}

/// Short form of an id for table display
fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

/// Table of workouts in the order given
pub fn workout_table(workouts: &[WorkoutRecord], profile: &UserProfile, precision: usize) -> String {
    let rows = workouts.iter().map(|w| {
        let metrics = WorkoutMetrics::compute(w, profile);
        WorkoutRow {
            id: short_id(&w.id),
            date: w.date.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
            total: format_minutes(w.total_duration_minutes),
            running: format!(
                "{} @ {}",
                format_minutes(w.running_duration_minutes),
                format_speed(w.running_speed_kmh, 1)
            ),
            walking: format!(
                "{} @ {}",
                format_minutes(metrics.walking_duration_minutes),
                format_speed(w.walking_speed_kmh, 1)
            ),
            distance: format_distance(metrics.total_distance_km, precision),
            average_speed: format_speed(metrics.average_speed_kmh, precision),
            calories: format!("{:.0}", metrics.total_calories),
        }
    });

    Table::new(rows).with(Style::rounded()).to_string()
}

#[derive(Tabled)]
struct WeightRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Weight")]
    weight: String,
}

pub fn weight_table(weights: &[WeightMeasurement]) -> String {
    let rows = weights.iter().map(|m| WeightRow {
        id: short_id(&m.id),
        date: m.date.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
        weight: format!("{:.1} kg", m.weight_kg),
    });

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Multi-line workout breakdown
pub fn workout_details(workout: &WorkoutRecord, profile: &UserProfile, precision: usize) -> String {
    let m = WorkoutMetrics::compute(workout, profile);
    let lines = [
        format!("Workout   {}", workout.id),
        format!(
            "Date      {}",
            workout.date.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        ),
        format!("Total     {}", format_minutes(workout.total_duration_minutes)),
        format!(
            "Running   {} @ {}  {}  MET {:.1}  {:.0} kcal",
            format_minutes(workout.running_duration_minutes),
            format_speed(workout.running_speed_kmh, 1),
            format_distance(m.running_distance_km, precision),
            m.running_met,
            m.running_calories
        ),
        format!(
            "Walking   {} @ {}  {}  MET {:.1}  {:.0} kcal",
            format_minutes(m.walking_duration_minutes),
            format_speed(workout.walking_speed_kmh, 1),
            format_distance(m.walking_distance_km, precision),
            m.walking_met,
            m.walking_calories
        ),
        format!("Distance  {}", format_distance(m.total_distance_km, precision)),
        format!("Avg speed {}", format_speed(m.average_speed_kmh, precision)),
        format!("Calories  {:.0} kcal", m.total_calories),
    ];
    lines.join("\n")
}

pub fn daily_summary_lines(summary: &DailySummary, precision: usize) -> String {
    let lines = [
        format!(
            "Workouts  {} ({})",
            summary.workout_count,
            format_minutes(summary.workout_minutes)
        ),
        format!(
            "Treadmill {}  {:.0} kcal",
            format_distance(summary.workout_distance_km, precision),
            summary.workout_calories
        ),
        format!(
            "Steps     {} / {} ({:.0}%)",
            summary.step_count,
            summary.daily_steps_goal,
            summary.steps.goal_progress * 100.0
        ),
        format!(
            "Walking   {}  {:.0} kcal",
            format_distance(summary.steps.distance_km, precision),
            summary.steps.calories_kcal
        ),
        format!("Total     {:.0} kcal", summary.total_calories()),
    ];
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WorkoutInput;

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(0.0), "00:00");
        assert_eq!(format_minutes(45.0), "00:45");
        assert_eq!(format_minutes(75.9), "01:15");
        assert_eq!(format_minutes(600.0), "10:00");
        assert_eq!(format_minutes(-5.0), "00:00");
        assert_eq!(format_minutes(f64::NAN), "00:00");
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_speed(6.666_666, 2), "6.67 km/h");
        assert_eq!(format_distance(5.0, 1), "5.0 km");
    }

    #[test]
    fn test_workout_table_contains_metrics() {
        let workout = WorkoutRecord::new(WorkoutInput {
            total_duration_minutes: 45.0,
            running_duration_minutes: 15.0,
            running_speed_kmh: 10.0,
            walking_speed_kmh: 5.0,
        });

        let table = workout_table(&[workout.clone()], &UserProfile::default(), 2);
        assert!(table.contains("Distance"));
        assert!(table.contains("5.00 km"));
        assert!(table.contains("6.67 km/h"));
        assert!(table.contains("331"));
        assert!(table.contains(&workout.id[..8]));

        let details = workout_details(&workout, &UserProfile::default(), 2);
        assert!(details.contains("MET 11.0"));
        assert!(details.contains("00:30 @ 5.0 km/h"));
    }
}
