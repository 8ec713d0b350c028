use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use tempfile::TempDir;
use treadlog::{database, export, metrics};

/// Integration tests that exercise complete tracker workflows

#[cfg(test)]
mod integration_tests {
    use super::*;
    use database::Database;
    use export::{DateRange, ExportFormat, WorkoutExportRow};
    use treadlog::{
        FixedStepProvider, Gender, StepCount, Tracker, TrackerError, UnavailableStepProvider,
        UserProfile, WorkoutInput,
    };

    fn reference_input() -> WorkoutInput {
        WorkoutInput {
            total_duration_minutes: 45.0,
            running_duration_minutes: 15.0,
            running_speed_kmh: 10.0,
            walking_speed_kmh: 5.0,
        }
    }

    fn morning(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, 7, 30, 0).unwrap()
    }

    fn open(dir: &TempDir) -> Tracker {
        Tracker::new(Database::new(dir.path().join("treadlog.db")).unwrap())
    }

    /// Reference session: 15 min running at 10 km/h, 30 min walking at 5 km/h
    #[test]
    fn test_reference_workout_metrics() {
        let dir = TempDir::new().unwrap();
        let mut tracker = open(&dir);

        let record = tracker.add_workout_at(reference_input(), morning(3)).unwrap();
        let profile = tracker.active_profile().unwrap();
        let m = metrics::WorkoutMetrics::compute(&record, &profile);

        assert!((m.walking_duration_minutes - 30.0).abs() < 1e-9);
        assert!((m.total_distance_km - 5.0).abs() < 1e-9);
        assert!((m.average_speed_kmh - 20.0 / 3.0).abs() < 1e-9);
        assert!((m.running_calories - 202.125).abs() < 1e-9);
        assert!((m.walking_calories - 128.625).abs() < 1e-9);
        assert!((m.total_calories - 330.75).abs() < 1e-9);
    }

    #[test]
    fn test_history_survives_reopen() {
        let dir = TempDir::new().unwrap();

        let (workout_id, profile_id) = {
            let mut tracker = open(&dir);
            let profile = tracker
                .create_profile(UserProfile::new(82.0, 180.0, Gender::Male, 8_000), true)
                .unwrap();
            let workout = tracker.add_workout_at(reference_input(), morning(4)).unwrap();
            tracker.add_weight(81.2, morning(5)).unwrap();
            (workout.id, profile.id)
        };

        let tracker = open(&dir);
        let workout = tracker.workout(&workout_id).unwrap();
        assert_eq!(workout.date, morning(4));
        assert_eq!(workout.input(), reference_input());

        let profile = tracker.active_profile().unwrap();
        assert_eq!(profile.id, profile_id);
        assert_eq!(profile.weight_kg, 81.2);
        assert_eq!(profile.daily_steps_goal, 8_000);

        let stats = tracker.database().get_stats().unwrap();
        assert_eq!(stats.workout_count, 1);
        assert_eq!(stats.profile_count, 1);
        assert_eq!(stats.weight_count, 1);
    }

    #[test]
    fn test_invalid_input_never_reaches_store() {
        let dir = TempDir::new().unwrap();
        let mut tracker = open(&dir);

        let mut over = reference_input();
        over.running_duration_minutes = 60.0;
        assert!(matches!(
            tracker.add_workout(over),
            Err(TrackerError::Validation(_))
        ));

        let mut negative = reference_input();
        negative.walking_speed_kmh = -1.0;
        assert!(tracker.add_workout(negative).is_err());

        assert!(tracker.add_weight(0.0, morning(1)).is_err());
        assert_eq!(tracker.database().get_stats().unwrap().workout_count, 0);
        assert_eq!(tracker.database().get_stats().unwrap().weight_count, 0);
    }

    #[test]
    fn test_calories_follow_active_profile_weight() {
        let dir = TempDir::new().unwrap();
        let mut tracker = open(&dir);
        let record = tracker.add_workout_at(reference_input(), morning(3)).unwrap();

        tracker.create_profile(UserProfile::default(), true).unwrap();
        let before = metrics::WorkoutMetrics::compute(&record, &tracker.active_profile().unwrap());

        tracker.add_weight(91.0, morning(6)).unwrap();
        let after = metrics::WorkoutMetrics::compute(&record, &tracker.active_profile().unwrap());

        assert!(after.total_calories > before.total_calories);
        // 330.75 kcal at 70 kg scales linearly with weight
        assert!((after.total_calories - 330.75 * 91.0 / 70.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_daily_summary_with_steps() {
        let dir = TempDir::new().unwrap();
        let mut tracker = open(&dir);
        let day_start = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap();

        tracker
            .add_workout_at(reference_input(), day_start + Duration::hours(7))
            .unwrap();
        tracker
            .add_workout_at(reference_input(), day_start - Duration::minutes(1))
            .unwrap();
        tracker
            .add_workout_at(reference_input(), day_start + Duration::days(1))
            .unwrap();

        let summary = tracker
            .daily_summary(&FixedStepProvider::new(10_000), day_start)
            .await
            .unwrap();

        assert_eq!(summary.workout_count, 1);
        assert!((summary.workout_distance_km - 5.0).abs() < 1e-9);
        assert_eq!(summary.step_count, StepCount::Available(10_000));
        assert!((summary.steps.distance_km - 7.62).abs() < 1e-9);
        assert!((summary.steps.goal_progress - 1.0).abs() < 1e-9);
        assert!((summary.total_calories() - (330.75 + 350.043_75)).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_daily_summary_without_step_source() {
        let dir = TempDir::new().unwrap();
        let tracker = open(&dir);

        let summary = tracker
            .daily_summary(&UnavailableStepProvider, morning(1))
            .await
            .unwrap();

        assert_eq!(summary.workout_count, 0);
        assert_eq!(summary.step_count, StepCount::Unavailable);
        assert_eq!(summary.steps.steps, 0);
        assert_eq!(summary.total_calories(), 0.0);
    }

    #[test]
    fn test_export_selected_range_to_csv_and_json() {
        let dir = TempDir::new().unwrap();
        let mut tracker = open(&dir);
        for day in [1, 5, 9] {
            tracker.add_workout_at(reference_input(), morning(day)).unwrap();
        }

        let workouts = tracker.workouts_newest_first().unwrap();
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2025, 3, 2),
            NaiveDate::from_ymd_opt(2025, 3, 9),
        );
        let selected = range.filter_workouts(&workouts);
        let profile = tracker.active_profile().unwrap();

        let csv_path = dir.path().join("workouts.csv");
        let count =
            export::export_workouts(&selected, &profile, ExportFormat::Csv, &csv_path).unwrap();
        assert_eq!(count, 2);

        let mut reader = csv::Reader::from_path(&csv_path).unwrap();
        let rows: Vec<WorkoutExportRow> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, morning(5));
        assert_eq!(rows[1].date, morning(9));
        assert!((rows[0].calories_kcal - 330.75).abs() < 1e-9);

        let json_path = dir.path().join("workouts.json");
        export::export_workouts(&selected, &profile, ExportFormat::Json, &json_path).unwrap();
        let content = std::fs::read_to_string(&json_path).unwrap();
        let parsed: Vec<WorkoutExportRow> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, rows);
    }
}
