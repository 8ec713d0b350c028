use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

use crate::models::{Gender, UserProfile, WeightMeasurement, WorkoutRecord};

/// Database error types
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Data not found: {0}")]
    NotFound(String),
    #[error("Duplicate entry: {0}")]
    Duplicate(String),
}

/// Local store for workouts, profiles and weight history
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Create or open a database at the specified path
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, DatabaseError> {
        let conn = Connection::open(db_path)?;
        let mut db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Open a throwaway database that lives only as long as this value
    pub fn in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let mut db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema with tables and indexes
    fn init_schema(&mut self) -> Result<(), DatabaseError> {
        // journal_mode returns a row, so it cannot go through execute()
        self.conn
            .query_row("PRAGMA journal_mode=WAL", [], |row| row.get::<_, String>(0))?;
        self.conn.execute("PRAGMA synchronous=NORMAL", [])?;

        self.conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS workouts (
                id TEXT PRIMARY KEY,
                date TEXT NOT NULL,
                total_duration_minutes REAL NOT NULL,
                running_duration_minutes REAL NOT NULL,
                running_speed_kmh REAL NOT NULL,
                walking_speed_kmh REAL NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        self.conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS user_profiles (
                id TEXT PRIMARY KEY,
                weight_kg REAL NOT NULL,
                height_cm REAL NOT NULL,
                gender TEXT NOT NULL,
                daily_steps_goal INTEGER NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        self.conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS weight_measurements (
                id TEXT PRIMARY KEY,
                date TEXT NOT NULL,
                weight_kg REAL NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        // Single-row table holding the explicitly selected profile
        self.conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS app_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_workouts_date ON workouts (date)",
            [],
        )?;
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_weights_date ON weight_measurements (date)",
            [],
        )?;

        Ok(())
    }

    /// Run `op` inside a single transaction, rolling back if it fails
    pub fn in_transaction<T, E, F>(&mut self, op: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<DatabaseError>,
    {
        self.conn
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(DatabaseError::from)?;

        let result = op(self).and_then(|value| {
            self.conn
                .execute_batch("COMMIT")
                .map_err(DatabaseError::from)?;
            Ok(value)
        });

        if result.is_err() && !self.conn.is_autocommit() {
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                tracing::warn!(error = %e, "Rollback failed");
            }
        }
        result
    }

    // ---- workouts ----

    pub fn insert_workout(&mut self, workout: &WorkoutRecord) -> Result<(), DatabaseError> {
        if self.load_workout(&workout.id)?.is_some() {
            return Err(DatabaseError::Duplicate(format!("workout {}", workout.id)));
        }

        self.conn.execute(
            r#"
            INSERT INTO workouts (
                id, date, total_duration_minutes, running_duration_minutes,
                running_speed_kmh, walking_speed_kmh
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                workout.id,
                encode_date(&workout.date),
                workout.total_duration_minutes,
                workout.running_duration_minutes,
                workout.running_speed_kmh,
                workout.walking_speed_kmh,
            ],
        )?;

        tracing::debug!(workout_id = %workout.id, "Stored workout");
        Ok(())
    }

    pub fn load_workout(&self, workout_id: &str) -> Result<Option<WorkoutRecord>, DatabaseError> {
        let raw = self
            .conn
            .query_row(
                r#"
                SELECT id, date, total_duration_minutes, running_duration_minutes,
                       running_speed_kmh, walking_speed_kmh
                FROM workouts
                WHERE id = ?1
                "#,
                params![workout_id],
                raw_workout_from_row,
            )
            .optional()?;

        raw.map(RawWorkout::into_record).transpose()
    }

    /// All stored workouts, in no particular order
    pub fn list_workouts(&self) -> Result<Vec<WorkoutRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, date, total_duration_minutes, running_duration_minutes,
                   running_speed_kmh, walking_speed_kmh
            FROM workouts
            "#,
        )?;

        let rows = stmt.query_map([], raw_workout_from_row)?;

        let mut workouts = Vec::new();
        for raw in rows {
            workouts.push(raw?.into_record()?);
        }
        Ok(workouts)
    }

    /// Replace the stored values of an existing workout
    pub fn update_workout(&mut self, workout: &WorkoutRecord) -> Result<(), DatabaseError> {
        let changed = self.conn.execute(
            r#"
            UPDATE workouts SET
                date = ?2,
                total_duration_minutes = ?3,
                running_duration_minutes = ?4,
                running_speed_kmh = ?5,
                walking_speed_kmh = ?6,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ?1
            "#,
            params![
                workout.id,
                encode_date(&workout.date),
                workout.total_duration_minutes,
                workout.running_duration_minutes,
                workout.running_speed_kmh,
                workout.walking_speed_kmh,
            ],
        )?;

        if changed == 0 {
            return Err(DatabaseError::NotFound(format!("workout {}", workout.id)));
        }
        Ok(())
    }

    pub fn delete_workout(&mut self, workout_id: &str) -> Result<(), DatabaseError> {
        let changed = self
            .conn
            .execute("DELETE FROM workouts WHERE id = ?1", params![workout_id])?;

        if changed == 0 {
            return Err(DatabaseError::NotFound(format!("workout {}", workout_id)));
        }
        Ok(())
    }

    // ---- profiles ----

    pub fn insert_profile(&mut self, profile: &UserProfile) -> Result<(), DatabaseError> {
        if self.load_profile(&profile.id)?.is_some() {
            return Err(DatabaseError::Duplicate(format!("profile {}", profile.id)));
        }

        self.conn.execute(
            r#"
            INSERT INTO user_profiles (id, weight_kg, height_cm, gender, daily_steps_goal)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                profile.id,
                profile.weight_kg,
                profile.height_cm,
                profile.gender.as_str(),
                profile.daily_steps_goal,
            ],
        )?;
        Ok(())
    }

    pub fn load_profile(&self, profile_id: &str) -> Result<Option<UserProfile>, DatabaseError> {
        let raw = self
            .conn
            .query_row(
                r#"
                SELECT id, weight_kg, height_cm, gender, daily_steps_goal
                FROM user_profiles
                WHERE id = ?1
                "#,
                params![profile_id],
                raw_profile_from_row,
            )
            .optional()?;

        raw.map(RawProfile::into_profile).transpose()
    }

    pub fn list_profiles(&self) -> Result<Vec<UserProfile>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, weight_kg, height_cm, gender, daily_steps_goal FROM user_profiles",
        )?;
        let rows = stmt.query_map([], raw_profile_from_row)?;

        let mut profiles = Vec::new();
        for raw in rows {
            profiles.push(raw?.into_profile()?);
        }
        Ok(profiles)
    }

    pub fn update_profile(&mut self, profile: &UserProfile) -> Result<(), DatabaseError> {
        let changed = self.conn.execute(
            r#"
            UPDATE user_profiles SET
                weight_kg = ?2,
                height_cm = ?3,
                gender = ?4,
                daily_steps_goal = ?5,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ?1
            "#,
            params![
                profile.id,
                profile.weight_kg,
                profile.height_cm,
                profile.gender.as_str(),
                profile.daily_steps_goal,
            ],
        )?;

        if changed == 0 {
            return Err(DatabaseError::NotFound(format!("profile {}", profile.id)));
        }
        Ok(())
    }

    /// Delete a profile; clears the active pointer if it referenced it
    pub fn delete_profile(&mut self, profile_id: &str) -> Result<(), DatabaseError> {
        let tx = self.conn.transaction()?;

        let changed = tx.execute("DELETE FROM user_profiles WHERE id = ?1", params![profile_id])?;
        if changed == 0 {
            return Err(DatabaseError::NotFound(format!("profile {}", profile_id)));
        }

        tx.execute(
            "DELETE FROM app_state WHERE key = ?1 AND value = ?2",
            params![ACTIVE_PROFILE_KEY, profile_id],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// Mark a stored profile as the active one
    pub fn set_active_profile(&mut self, profile_id: &str) -> Result<(), DatabaseError> {
        if self.load_profile(profile_id)?.is_none() {
            return Err(DatabaseError::NotFound(format!("profile {}", profile_id)));
        }

        self.conn.execute(
            "INSERT OR REPLACE INTO app_state (key, value) VALUES (?1, ?2)",
            params![ACTIVE_PROFILE_KEY, profile_id],
        )?;
        Ok(())
    }

    pub fn active_profile_id(&self) -> Result<Option<String>, DatabaseError> {
        let id = self
            .conn
            .query_row(
                "SELECT value FROM app_state WHERE key = ?1",
                params![ACTIVE_PROFILE_KEY],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(id)
    }

    // ---- weight history ----

    pub fn insert_weight(&mut self, measurement: &WeightMeasurement) -> Result<(), DatabaseError> {
        if self.load_weight(&measurement.id)?.is_some() {
            return Err(DatabaseError::Duplicate(format!("weight {}", measurement.id)));
        }

        self.conn.execute(
            "INSERT INTO weight_measurements (id, date, weight_kg) VALUES (?1, ?2, ?3)",
            params![
                measurement.id,
                encode_date(&measurement.date),
                measurement.weight_kg,
            ],
        )?;
        Ok(())
    }

    pub fn load_weight(&self, measurement_id: &str) -> Result<Option<WeightMeasurement>, DatabaseError> {
        let raw = self
            .conn
            .query_row(
                "SELECT id, date, weight_kg FROM weight_measurements WHERE id = ?1",
                params![measurement_id],
                raw_weight_from_row,
            )
            .optional()?;

        raw.map(RawWeight::into_measurement).transpose()
    }

    /// All weight readings, in no particular order
    pub fn list_weights(&self) -> Result<Vec<WeightMeasurement>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, date, weight_kg FROM weight_measurements")?;
        let rows = stmt.query_map([], raw_weight_from_row)?;

        let mut weights = Vec::new();
        for raw in rows {
            weights.push(raw?.into_measurement()?);
        }
        Ok(weights)
    }

    pub fn update_weight(&mut self, measurement: &WeightMeasurement) -> Result<(), DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE weight_measurements SET date = ?2, weight_kg = ?3 WHERE id = ?1",
            params![
                measurement.id,
                encode_date(&measurement.date),
                measurement.weight_kg,
            ],
        )?;

        if changed == 0 {
            return Err(DatabaseError::NotFound(format!("weight {}", measurement.id)));
        }
        Ok(())
    }

    pub fn delete_weight(&mut self, measurement_id: &str) -> Result<(), DatabaseError> {
        let changed = self.conn.execute(
            "DELETE FROM weight_measurements WHERE id = ?1",
            params![measurement_id],
        )?;

        if changed == 0 {
            return Err(DatabaseError::NotFound(format!("weight {}", measurement_id)));
        }
        Ok(())
    }

    /// Most recent weight reading by date
    pub fn latest_weight(&self) -> Result<Option<WeightMeasurement>, DatabaseError> {
        // Compared in Rust: stored strings keep their original offset
        Ok(self
            .list_weights()?
            .into_iter()
            .max_by(|a, b| a.date.cmp(&b.date)))
    }

    /// Get database statistics
    pub fn get_stats(&self) -> Result<DatabaseStats, DatabaseError> {
        let count = |table: &str| -> Result<usize, DatabaseError> {
            let n: i64 = self.conn.query_row(
                &format!("SELECT COUNT(*) FROM {}", table),
                [],
                |row| row.get(0),
            )?;
            Ok(n as usize)
        };

        Ok(DatabaseStats {
            workout_count: count("workouts")?,
            profile_count: count("user_profiles")?,
            weight_count: count("weight_measurements")?,
        })
    }
}

const ACTIVE_PROFILE_KEY: &str = "active_profile_id";

/// Database statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseStats {
    pub workout_count: usize,
    pub profile_count: usize,
    pub weight_count: usize,
}

fn encode_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true)
}

fn decode_date(value: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| DatabaseError::SerializationError(format!("Bad date '{}': {}", value, e)))
}

// Rows are read into plain structs first so that parse failures surface as
// DatabaseError instead of panicking inside the rusqlite row closure.

struct RawWorkout {
    id: String,
    date: String,
    total_duration_minutes: f64,
    running_duration_minutes: f64,
    running_speed_kmh: f64,
    walking_speed_kmh: f64,
}

impl RawWorkout {
    fn into_record(self) -> Result<WorkoutRecord, DatabaseError> {
        Ok(WorkoutRecord {
            id: self.id,
            date: decode_date(&self.date)?,
            total_duration_minutes: self.total_duration_minutes,
            running_duration_minutes: self.running_duration_minutes,
            running_speed_kmh: self.running_speed_kmh,
            walking_speed_kmh: self.walking_speed_kmh,
        })
    }
}

fn raw_workout_from_row(row: &Row) -> rusqlite::Result<RawWorkout> {
    Ok(RawWorkout {
        id: row.get("id")?,
        date: row.get("date")?,
        total_duration_minutes: row.get("total_duration_minutes")?,
        running_duration_minutes: row.get("running_duration_minutes")?,
        running_speed_kmh: row.get("running_speed_kmh")?,
        walking_speed_kmh: row.get("walking_speed_kmh")?,
    })
}

struct RawProfile {
    id: String,
    weight_kg: f64,
    height_cm: f64,
    gender: String,
    daily_steps_goal: u32,
}

impl RawProfile {
    fn into_profile(self) -> Result<UserProfile, DatabaseError> {
        let gender = self
            .gender
            .parse::<Gender>()
            .map_err(DatabaseError::SerializationError)?;

        Ok(UserProfile {
            id: self.id,
            weight_kg: self.weight_kg,
            height_cm: self.height_cm,
            gender,
            daily_steps_goal: self.daily_steps_goal,
        })
    }
}

fn raw_profile_from_row(row: &Row) -> rusqlite::Result<RawProfile> {
    Ok(RawProfile {
        id: row.get("id")?,
        weight_kg: row.get("weight_kg")?,
        height_cm: row.get("height_cm")?,
        gender: row.get("gender")?,
        daily_steps_goal: row.get("daily_steps_goal")?,
    })
}

struct RawWeight {
    id: String,
    date: String,
    weight_kg: f64,
}

impl RawWeight {
    fn into_measurement(self) -> Result<WeightMeasurement, DatabaseError> {
        Ok(WeightMeasurement {
            id: self.id,
            date: decode_date(&self.date)?,
            weight_kg: self.weight_kg,
        })
    }
}

fn raw_weight_from_row(row: &Row) -> rusqlite::Result<RawWeight> {
    Ok(RawWeight {
        id: row.get("id")?,
        date: row.get("date")?,
        weight_kg: row.get("weight_kg")?,
    })
}
