use super::{ExportError, WorkoutExportRow};
use std::path::Path;

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::SerializationError(err.to_string())
    }
}

/// Column names of [`WorkoutExportRow`], in field order
const HEADER: [&str; 12] = [
    "id",
    "date",
    "total_duration_minutes",
    "running_duration_minutes",
    "walking_duration_minutes",
    "running_speed_kmh",
    "walking_speed_kmh",
    "running_distance_km",
    "walking_distance_km",
    "total_distance_km",
    "average_speed_kmh",
    "calories_kcal",
];

/// Write workout rows to CSV with a header line
pub fn export_workout_rows<P: AsRef<Path>>(
    rows: &[WorkoutExportRow],
    output_path: P,
) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(output_path)?;

    // serialize() only emits the header alongside the first record
    if rows.is_empty() {
        writer.write_record(HEADER)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }

    writer.flush()?;
    Ok(())
}
