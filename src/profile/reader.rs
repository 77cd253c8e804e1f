use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use super::types::{parse_offset, Profile, ProfileSetpoint, DEFAULT_PROFILE_FILE};
use crate::error::{ChamberError, Result};

/// One row of a profile table. Extra columns are ignored.
#[derive(Debug, Deserialize)]
struct ProfileRow {
    time: String,
    temp: f64,
}

/// Read a profile CSV from disk. `HH:MM` rows land on the first day.
pub fn read_profile(path: &Path) -> Result<Profile> {
    read_profile_for_day(path, 0)
}

/// Read a profile CSV from disk, placing `HH:MM` rows on `elapsed_days`.
pub fn read_profile_for_day(path: &Path, elapsed_days: i64) -> Result<Profile> {
    let content = std::fs::read_to_string(path).map_err(|source| ChamberError::ProfileIo {
        path: path.to_path_buf(),
        source,
    })?;

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(DEFAULT_PROFILE_FILE);

    let profile = parse_profile(&content, file_name, elapsed_days)?;
    debug!(
        "Read profile {:?} with {} setpoints from {:?}",
        profile.file_name(),
        profile.len(),
        path
    );
    Ok(profile)
}

/// Parse profile CSV text (header `time,temp`).
///
/// Parsing is strict: rows must already be sorted with unique times. A table
/// whose rows are all `HH:MM` is a daily profile placed on `elapsed_days`.
pub fn parse_profile(content: &str, file_name: &str, elapsed_days: i64) -> Result<Profile> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut setpoints = Vec::new();
    let mut daily = true;
    for (index, row) in reader.deserialize::<ProfileRow>().enumerate() {
        let row = row.map_err(|e| {
            ChamberError::MalformedProfile(format!("row {}: {}", index + 1, e))
        })?;
        let offset = parse_offset(&row.time, elapsed_days)?;
        daily &= row.time.split(':').count() == 2;
        setpoints.push(ProfileSetpoint::new(offset, row.temp));
    }

    let profile = Profile::new(file_name, setpoints)?;
    Ok(if daily { profile.into_daily() } else { profile })
}
