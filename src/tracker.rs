//! Workout, profile and weight bookkeeping on top of the local database
//!
//! `Tracker` is the layer the command line talks to. It validates input
//! before anything reaches the store, resolves the active profile
//! explicitly and keeps the profile weight in step with the weight history.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::aggregate::{self, DailySummary};
use crate::database::{Database, DatabaseError};
use crate::error::{Result, TrackerError};
use crate::models::{ProfileUpdate, UserProfile, WeightMeasurement, WorkoutInput, WorkoutRecord};
use crate::steps::StepCountProvider;
use crate::validation::WorkoutValidator;

pub struct Tracker {
    db: Database,
    /// Overrides the database's active profile when set
    profile_override: Option<String>,
}

impl Tracker {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            profile_override: None,
        }
    }

    /// Use `profile_id` for estimates instead of the stored active profile
    pub fn with_profile_override(mut self, profile_id: Option<String>) -> Self {
        self.profile_override = profile_id;
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    // ---- workouts ----

    /// Validate and store a new workout logged now
    pub fn add_workout(&mut self, input: WorkoutInput) -> Result<WorkoutRecord> {
        self.add_workout_at(input, Utc::now())
    }

    /// Validate and store a new workout at an explicit date
    pub fn add_workout_at(&mut self, input: WorkoutInput, date: DateTime<Utc>) -> Result<WorkoutRecord> {
        WorkoutValidator::validate(&input)?;

        let record = WorkoutRecord::with_date(input, date);
        self.db.insert_workout(&record)?;

        info!(workout_id = %record.id, "Workout added");
        Ok(record)
    }

    /// Replace a workout's values; its id and date stay as they were
    pub fn edit_workout(&mut self, workout_id: &str, input: WorkoutInput) -> Result<WorkoutRecord> {
        WorkoutValidator::validate(&input)?;

        let mut record = self.require_workout(workout_id)?;
        record.apply(input);
        self.db.update_workout(&record)?;

        info!(workout_id = %record.id, "Workout updated");
        Ok(record)
    }

    pub fn delete_workout(&mut self, workout_id: &str) -> Result<()> {
        self.db.delete_workout(workout_id)?;
        info!(workout_id, "Workout deleted");
        Ok(())
    }

    pub fn workout(&self, workout_id: &str) -> Result<WorkoutRecord> {
        self.require_workout(workout_id)
    }

    /// All workouts for display, most recent first
    pub fn workouts_newest_first(&self) -> Result<Vec<WorkoutRecord>> {
        let mut workouts = self.db.list_workouts()?;
        aggregate::sort_newest_first(&mut workouts);
        Ok(workouts)
    }

    fn require_workout(&self, workout_id: &str) -> Result<WorkoutRecord> {
        self.db
            .load_workout(workout_id)?
            .ok_or_else(|| DatabaseError::NotFound(format!("workout {}", workout_id)).into())
    }

    // ---- profile ----

    /// The stored active profile, if one has been selected.
    ///
    /// A profile pinned through the config must exist; a stale pin is an
    /// error rather than a silent fallback to defaults.
    pub fn stored_active_profile(&self) -> Result<Option<UserProfile>> {
        resolve_active_profile(&self.db, self.profile_override.as_deref())
    }

    /// Profile used for estimates; the default profile when none is stored
    pub fn active_profile(&self) -> Result<UserProfile> {
        match self.stored_active_profile()? {
            Some(profile) => Ok(profile),
            None => {
                debug!("No active profile, using defaults");
                Ok(UserProfile::default())
            }
        }
    }

    /// Store a new profile, optionally making it the active one
    pub fn create_profile(&mut self, profile: UserProfile, make_active: bool) -> Result<UserProfile> {
        WorkoutValidator::validate_profile(&profile)?;
        if make_active {
            self.ensure_not_pinned(&profile.id)?;
        }

        self.db.insert_profile(&profile)?;
        if make_active {
            self.db.set_active_profile(&profile.id)?;
        }

        info!(profile_id = %profile.id, active = make_active, "Profile created");
        Ok(profile)
    }

    pub fn profiles(&self) -> Result<Vec<UserProfile>> {
        Ok(self.db.list_profiles()?)
    }

    /// Mark a stored profile as active. Refused while the config pins a
    /// different one.
    pub fn use_profile(&mut self, profile_id: &str) -> Result<()> {
        self.ensure_not_pinned(profile_id)?;
        self.db.set_active_profile(profile_id)?;
        info!(profile_id, "Active profile changed");
        Ok(())
    }

    /// Update the active profile, creating and activating one first if
    /// nothing has been stored yet
    pub fn update_active_profile(&mut self, update: &ProfileUpdate) -> Result<UserProfile> {
        let mut profile = match self.stored_active_profile()? {
            Some(profile) => profile,
            None => self.create_profile(UserProfile::default(), true)?,
        };

        update.apply_to(&mut profile);
        WorkoutValidator::validate_profile(&profile)?;
        self.db.update_profile(&profile)?;

        info!(profile_id = %profile.id, "Profile updated");
        Ok(profile)
    }

    /// Profile id pinned by the config, if any
    pub fn pinned_profile(&self) -> Option<&str> {
        self.profile_override.as_deref()
    }

    fn ensure_not_pinned(&self, profile_id: &str) -> Result<()> {
        match self.pinned_profile() {
            Some(pinned) if pinned != profile_id => Err(TrackerError::Configuration(format!(
                "Active profile is pinned to {} by active_profile_id",
                pinned
            ))),
            _ => Ok(()),
        }
    }

    // ---- weight history ----

    pub fn add_weight(&mut self, weight_kg: f64, date: DateTime<Utc>) -> Result<WeightMeasurement> {
        WorkoutValidator::validate_weight(weight_kg)?;

        let measurement = WeightMeasurement::with_date(weight_kg, date);
        let pinned = self.profile_override.as_deref();
        self.db.in_transaction(|db| -> Result<()> {
            db.insert_weight(&measurement)?;
            sync_profile_weight(db, pinned)
        })?;

        info!(weight_id = %measurement.id, weight_kg, "Weight recorded");
        Ok(measurement)
    }

    pub fn edit_weight(
        &mut self,
        measurement_id: &str,
        weight_kg: f64,
        date: Option<DateTime<Utc>>,
    ) -> Result<WeightMeasurement> {
        WorkoutValidator::validate_weight(weight_kg)?;

        let mut measurement = self
            .db
            .load_weight(measurement_id)?
            .ok_or_else(|| DatabaseError::NotFound(format!("weight {}", measurement_id)))?;

        measurement.weight_kg = weight_kg;
        if let Some(date) = date {
            measurement.date = date;
        }

        let pinned = self.profile_override.as_deref();
        self.db.in_transaction(|db| -> Result<()> {
            db.update_weight(&measurement)?;
            sync_profile_weight(db, pinned)
        })?;
        Ok(measurement)
    }

    pub fn delete_weight(&mut self, measurement_id: &str) -> Result<()> {
        let pinned = self.profile_override.as_deref();
        self.db.in_transaction(|db| -> Result<()> {
            db.delete_weight(measurement_id)?;
            sync_profile_weight(db, pinned)
        })?;

        info!(weight_id = measurement_id, "Weight deleted");
        Ok(())
    }

    pub fn weights_newest_first(&self) -> Result<Vec<WeightMeasurement>> {
        let mut weights = self.db.list_weights()?;
        weights.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(weights)
    }

    // ---- dashboard ----

    /// Today's workouts and steps for the active profile
    pub async fn daily_summary(
        &self,
        provider: &dyn StepCountProvider,
        day_start: DateTime<Utc>,
    ) -> Result<DailySummary> {
        let profile = self.active_profile()?;
        let workouts = self.db.list_workouts()?;
        let step_count = provider.current_steps_today().await;

        debug!(steps = %step_count, "Step count received");
        Ok(DailySummary::build(&workouts, &profile, step_count, day_start))
    }
}

/// Look up the active profile, preferring a config pin over the stored pointer
fn resolve_active_profile(db: &Database, pinned: Option<&str>) -> Result<Option<UserProfile>> {
    if let Some(id) = pinned {
        let profile = db
            .load_profile(id)?
            .ok_or_else(|| DatabaseError::NotFound(format!("profile {} (pinned in config)", id)))?;
        return Ok(Some(profile));
    }

    let Some(id) = db.active_profile_id()? else {
        return Ok(None);
    };
    let profile = db.load_profile(&id)?;
    if profile.is_none() {
        warn!(profile_id = %id, "Active profile is missing from the database");
    }
    Ok(profile)
}

/// Copy the most recent reading onto the active profile.
///
/// Nothing happens when no profile is stored or no readings remain.
fn sync_profile_weight(db: &mut Database, pinned: Option<&str>) -> Result<()> {
    let Some(mut profile) = resolve_active_profile(db, pinned)? else {
        return Ok(());
    };
    let Some(latest) = db.latest_weight()? else {
        return Ok(());
    };

    if profile.weight_kg != latest.weight_kg {
        profile.weight_kg = latest.weight_kg;
        db.update_profile(&profile)?;
        debug!(profile_id = %profile.id, weight_kg = latest.weight_kg, "Profile weight synced");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;
    use crate::steps::{FixedStepProvider, StepCount, UnavailableStepProvider};
    use crate::validation::ValidationError;
    use chrono::{Duration, TimeZone};

    fn tracker() -> Tracker {
        Tracker::new(Database::in_memory().unwrap())
    }

    fn reference_input() -> WorkoutInput {
        WorkoutInput {
            total_duration_minutes: 45.0,
            running_duration_minutes: 15.0,
            running_speed_kmh: 10.0,
            walking_speed_kmh: 5.0,
        }
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_add_rejects_running_over_total() {
        let mut tracker = tracker();
        let mut input = reference_input();
        input.running_duration_minutes = 50.0;

        let err = tracker.add_workout(input).unwrap_err();
        assert!(matches!(
            err,
            TrackerError::Validation(ValidationError::RunningExceedsTotal { .. })
        ));
        assert!(tracker.workouts_newest_first().unwrap().is_empty());
    }

    #[test]
    fn test_edit_keeps_id_and_date() {
        let mut tracker = tracker();
        let original = tracker.add_workout_at(reference_input(), at(3, 7)).unwrap();

        let mut input = reference_input();
        input.total_duration_minutes = 60.0;
        let edited = tracker.edit_workout(&original.id, input).unwrap();

        assert_eq!(edited.id, original.id);
        assert_eq!(edited.date, original.date);
        assert_eq!(tracker.workout(&original.id).unwrap().total_duration_minutes, 60.0);
    }

    #[test]
    fn test_edit_missing_workout() {
        let mut tracker = tracker();
        let err = tracker.edit_workout("nope", reference_input()).unwrap_err();
        assert!(matches!(err, TrackerError::Database(DatabaseError::NotFound(_))));
    }

    #[test]
    fn test_workouts_newest_first() {
        let mut tracker = tracker();
        tracker.add_workout_at(reference_input(), at(1, 7)).unwrap();
        tracker.add_workout_at(reference_input(), at(5, 7)).unwrap();
        tracker.add_workout_at(reference_input(), at(3, 7)).unwrap();

        let dates: Vec<_> = tracker
            .workouts_newest_first()
            .unwrap()
            .into_iter()
            .map(|w| w.date)
            .collect();
        assert_eq!(dates, vec![at(5, 7), at(3, 7), at(1, 7)]);
    }

    #[test]
    fn test_default_profile_when_none_stored() {
        let tracker = tracker();
        let profile = tracker.active_profile().unwrap();
        assert_eq!(profile.weight_kg, 70.0);
        assert!(tracker.profiles().unwrap().is_empty());
    }

    #[test]
    fn test_profile_override() {
        let mut tracker = tracker();
        let first = tracker
            .create_profile(UserProfile::new(60.0, 165.0, Gender::Female, 9_000), true)
            .unwrap();
        let second = tracker
            .create_profile(UserProfile::new(90.0, 190.0, Gender::Male, 12_000), false)
            .unwrap();

        assert_eq!(tracker.active_profile().unwrap().id, first.id);

        let tracker = tracker.with_profile_override(Some(second.id.clone()));
        assert_eq!(tracker.active_profile().unwrap().id, second.id);
    }

    #[test]
    fn test_stale_pin_is_an_error() {
        let mut tracker = tracker().with_profile_override(Some("stale-id".to_string()));
        let update = ProfileUpdate {
            weight_kg: Some(80.0),
            ..Default::default()
        };

        for _ in 0..2 {
            let err = tracker.update_active_profile(&update).unwrap_err();
            assert!(matches!(err, TrackerError::Database(DatabaseError::NotFound(_))));
        }
        assert!(tracker.active_profile().is_err());
        assert!(tracker.profiles().unwrap().is_empty());
    }

    #[test]
    fn test_pinned_profile_blocks_switching() {
        let mut tracker = tracker();
        let pinned = tracker.create_profile(UserProfile::default(), true).unwrap();
        let other = tracker
            .create_profile(UserProfile::new(90.0, 190.0, Gender::Male, 12_000), false)
            .unwrap();

        let mut tracker = tracker.with_profile_override(Some(pinned.id.clone()));
        let err = tracker.use_profile(&other.id).unwrap_err();
        assert!(matches!(err, TrackerError::Configuration(_)));
        assert_eq!(tracker.active_profile().unwrap().id, pinned.id);

        let err = tracker
            .create_profile(UserProfile::default(), true)
            .unwrap_err();
        assert!(matches!(err, TrackerError::Configuration(_)));
        assert_eq!(tracker.profiles().unwrap().len(), 2);

        tracker.use_profile(&pinned.id).unwrap();
    }

    #[test]
    fn test_pinned_profile_receives_updates() {
        let mut tracker = tracker();
        tracker.create_profile(UserProfile::default(), true).unwrap();
        let pinned = tracker
            .create_profile(UserProfile::new(60.0, 165.0, Gender::Female, 9_000), false)
            .unwrap();
        let mut tracker = tracker.with_profile_override(Some(pinned.id.clone()));

        let update = ProfileUpdate {
            height_cm: Some(168.0),
            ..Default::default()
        };
        tracker.update_active_profile(&update).unwrap();
        tracker.add_weight(61.5, at(4, 8)).unwrap();

        let active = tracker.active_profile().unwrap();
        assert_eq!(active.id, pinned.id);
        assert_eq!(active.height_cm, 168.0);
        assert_eq!(active.weight_kg, 61.5);
    }

    #[test]
    fn test_weight_write_rolls_back_when_sync_fails() {
        let mut tracker = tracker();
        let kept = tracker.add_weight(72.0, at(1, 8)).unwrap();

        let mut tracker = tracker.with_profile_override(Some("stale-id".to_string()));
        assert!(tracker.add_weight(71.0, at(2, 8)).is_err());
        assert!(tracker.edit_weight(&kept.id, 75.0, None).is_err());
        assert!(tracker.delete_weight(&kept.id).is_err());

        let weights = tracker.weights_newest_first().unwrap();
        assert_eq!(weights.len(), 1);
        assert_eq!(weights[0].weight_kg, 72.0);
    }

    #[test]
    fn test_update_creates_profile_on_first_use() {
        let mut tracker = tracker();
        let update = ProfileUpdate {
            height_cm: Some(182.0),
            ..Default::default()
        };

        let profile = tracker.update_active_profile(&update).unwrap();
        assert_eq!(profile.height_cm, 182.0);
        assert_eq!(tracker.active_profile().unwrap(), profile);
    }

    #[test]
    fn test_weight_history_syncs_profile() {
        let mut tracker = tracker();
        tracker.create_profile(UserProfile::default(), true).unwrap();

        let older = tracker.add_weight(74.0, at(1, 8)).unwrap();
        let newer = tracker.add_weight(72.5, at(8, 8)).unwrap();
        assert_eq!(tracker.active_profile().unwrap().weight_kg, 72.5);

        // Back-dated readings do not override the latest one
        tracker.add_weight(80.0, at(1, 6)).unwrap();
        assert_eq!(tracker.active_profile().unwrap().weight_kg, 72.5);

        tracker.delete_weight(&newer.id).unwrap();
        assert_eq!(tracker.active_profile().unwrap().weight_kg, 74.0);

        tracker.edit_weight(&older.id, 73.0, None).unwrap();
        assert_eq!(tracker.active_profile().unwrap().weight_kg, 73.0);

        let weights = tracker.weights_newest_first().unwrap();
        assert_eq!(weights.len(), 2);
        assert!(weights[0].date > weights[1].date);
    }

    #[test]
    fn test_last_weight_deleted_keeps_profile_weight() {
        let mut tracker = tracker();
        tracker.create_profile(UserProfile::default(), true).unwrap();
        let only = tracker.add_weight(68.0, at(2, 8)).unwrap();

        tracker.delete_weight(&only.id).unwrap();
        assert_eq!(tracker.active_profile().unwrap().weight_kg, 68.0);
    }

    #[tokio::test]
    async fn test_daily_summary() {
        let mut tracker = tracker();
        let day_start = at(15, 0);
        tracker.add_workout_at(reference_input(), day_start + Duration::hours(7)).unwrap();
        tracker.add_workout_at(reference_input(), day_start - Duration::hours(1)).unwrap();

        let summary = tracker
            .daily_summary(&FixedStepProvider::new(10_000), day_start)
            .await
            .unwrap();
        assert_eq!(summary.workout_count, 1);
        assert!((summary.workout_calories - 330.75).abs() < 1e-9);
        assert_eq!(summary.step_count, StepCount::Available(10_000));

        let summary = tracker
            .daily_summary(&UnavailableStepProvider, day_start)
            .await
            .unwrap();
        assert_eq!(summary.steps.steps, 0);
    }
}
