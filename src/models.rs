use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default body weight used when no profile has been created yet
pub const DEFAULT_WEIGHT_KG: f64 = 70.0;

/// Default height used when no profile has been created yet
pub const DEFAULT_HEIGHT_CM: f64 = 175.0;

/// Default daily step goal
pub const DEFAULT_DAILY_STEPS_GOAL: u32 = 10_000;

/// Gender recorded on the user profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            "other" | "o" => Ok(Gender::Other),
            _ => Err(format!("Unknown gender: {}", s)),
        }
    }
}

/// Raw workout values as entered on the add/edit form.
///
/// This is what gets validated before a [`WorkoutRecord`] is created or
/// replaced; the identifier and date are never part of the input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkoutInput {
    /// Whole session length in minutes
    pub total_duration_minutes: f64,

    /// Minutes spent in the running segment
    pub running_duration_minutes: f64,

    /// Belt speed while running, km/h
    pub running_speed_kmh: f64,

    /// Belt speed while walking, km/h
    pub walking_speed_kmh: f64,
}

/// One logged treadmill session split into a running and a walking segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutRecord {
    /// Unique identifier, assigned at creation
    pub id: String,

    /// When the workout was logged
    pub date: DateTime<Utc>,

    /// Whole session length in minutes
    pub total_duration_minutes: f64,

    /// Minutes spent in the running segment (never more than the total)
    pub running_duration_minutes: f64,

    /// Belt speed while running, km/h
    pub running_speed_kmh: f64,

    /// Belt speed while walking, km/h
    pub walking_speed_kmh: f64,
}

impl WorkoutRecord {
    /// Create a record stamped with a fresh id and the current time
    pub fn new(input: WorkoutInput) -> Self {
        Self::with_date(input, Utc::now())
    }

    /// Create a record with a fresh id at an explicit date
    pub fn with_date(input: WorkoutInput, date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            date,
            total_duration_minutes: input.total_duration_minutes,
            running_duration_minutes: input.running_duration_minutes,
            running_speed_kmh: input.running_speed_kmh,
            walking_speed_kmh: input.walking_speed_kmh,
        }
    }

    /// Replace the editable values, keeping id and date
    pub fn apply(&mut self, input: WorkoutInput) {
        self.total_duration_minutes = input.total_duration_minutes;
        self.running_duration_minutes = input.running_duration_minutes;
        self.running_speed_kmh = input.running_speed_kmh;
        self.walking_speed_kmh = input.walking_speed_kmh;
    }

    /// The editable values of this record
    pub fn input(&self) -> WorkoutInput {
        WorkoutInput {
            total_duration_minutes: self.total_duration_minutes,
            running_duration_minutes: self.running_duration_minutes,
            running_speed_kmh: self.running_speed_kmh,
            walking_speed_kmh: self.walking_speed_kmh,
        }
    }

    pub fn walking_duration_minutes(&self) -> f64 {
        crate::metrics::walking_duration(self)
    }

    pub fn running_distance_km(&self) -> f64 {
        crate::metrics::running_distance(self)
    }

    pub fn walking_distance_km(&self) -> f64 {
        crate::metrics::walking_distance(self)
    }

    pub fn total_distance_km(&self) -> f64 {
        crate::metrics::total_distance(self)
    }

    pub fn average_speed_kmh(&self) -> f64 {
        crate::metrics::average_speed(self)
    }
}

/// Physical attributes used to personalise calorie estimates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Unique profile identifier
    pub id: String,

    /// Body weight in kilograms
    pub weight_kg: f64,

    /// Height in centimeters
    pub height_cm: f64,

    pub gender: Gender,

    /// Daily step target
    pub daily_steps_goal: u32,
}

impl UserProfile {
    pub fn new(weight_kg: f64, height_cm: f64, gender: Gender, daily_steps_goal: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            weight_kg,
            height_cm,
            gender,
            daily_steps_goal,
        }
    }
}

impl Default for UserProfile {
    fn default() -> Self {
        Self::new(
            DEFAULT_WEIGHT_KG,
            DEFAULT_HEIGHT_CM,
            Gender::Male,
            DEFAULT_DAILY_STEPS_GOAL,
        )
    }
}

/// Partial profile update; `None` fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub gender: Option<Gender>,
    pub daily_steps_goal: Option<u32>,
}

impl ProfileUpdate {
    pub fn apply_to(&self, profile: &mut UserProfile) {
        if let Some(weight) = self.weight_kg {
            profile.weight_kg = weight;
        }
        if let Some(height) = self.height_cm {
            profile.height_cm = height;
        }
        if let Some(gender) = self.gender {
            profile.gender = gender;
        }
        if let Some(goal) = self.daily_steps_goal {
            profile.daily_steps_goal = goal;
        }
    }
}

/// A single body-weight reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightMeasurement {
    pub id: String,

    /// When the reading was taken
    pub date: DateTime<Utc>,

    /// Body weight in kilograms
    pub weight_kg: f64,
}

impl WeightMeasurement {
    /// Reading taken now
    pub fn new(weight_kg: f64) -> Self {
        Self::with_date(weight_kg, Utc::now())
    }

    pub fn with_date(weight_kg: f64, date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            date,
            weight_kg,
        }
    }
}
