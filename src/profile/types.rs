use std::sync::Arc;

use chrono::Duration;

use crate::error::{ChamberError, Result};

/// File name used for profiles that were never loaded from disk.
pub const DEFAULT_PROFILE_FILE: &str = "profile.csv";

/// One point of a temperature profile: the target temperature at an offset
/// from the start of the run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileSetpoint {
    pub offset: Duration,
    pub target_temp: f64,
}

impl ProfileSetpoint {
    pub fn new(offset: Duration, target_temp: f64) -> Self {
        Self {
            offset,
            target_temp,
        }
    }
}

/// A validated temperature profile.
///
/// Always non-empty with strictly increasing offsets. The setpoint list is
/// shared (read-only) with every evaluator built from the profile.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    file_name: String,
    setpoints: Arc<[ProfileSetpoint]>,
    daily: bool,
}

impl Profile {
    /// Build a profile, rejecting empty, unordered or duplicated setpoints.
    ///
    /// Use [`crate::profile::editor::normalize`] first when the input may
    /// contain duplicates or arrive out of order.
    pub fn new(file_name: impl Into<String>, setpoints: Vec<ProfileSetpoint>) -> Result<Self> {
        validate_setpoints(&setpoints)?;
        Ok(Self {
            file_name: file_name.into(),
            setpoints: setpoints.into(),
            daily: false,
        })
    }

    /// Name the profile is stored under (in the archive and on disk).
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// True when the source file used `HH:MM` times: the setpoints describe
    /// one day and were placed on a particular run day when read.
    pub fn is_daily(&self) -> bool {
        self.daily
    }

    pub(crate) fn into_daily(mut self) -> Self {
        self.daily = true;
        self
    }

    pub fn setpoints(&self) -> &[ProfileSetpoint] {
        &self.setpoints
    }

    pub(crate) fn shared_setpoints(&self) -> Arc<[ProfileSetpoint]> {
        Arc::clone(&self.setpoints)
    }

    pub fn first(&self) -> &ProfileSetpoint {
        &self.setpoints[0]
    }

    pub fn last(&self) -> &ProfileSetpoint {
        &self.setpoints[self.setpoints.len() - 1]
    }

    /// Time between the first and last setpoint.
    pub fn span(&self) -> Duration {
        self.last().offset - self.first().offset
    }

    pub fn len(&self) -> usize {
        self.setpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.setpoints.is_empty()
    }
}

/// Check the profile invariants: non-empty, finite temperatures, strictly
/// increasing non-negative offsets.
pub fn validate_setpoints(setpoints: &[ProfileSetpoint]) -> Result<()> {
    if setpoints.is_empty() {
        return Err(ChamberError::MalformedProfile(
            "profile has no setpoints".to_string(),
        ));
    }

    for (index, setpoint) in setpoints.iter().enumerate() {
        if setpoint.offset < Duration::zero() {
            return Err(ChamberError::MalformedProfile(format!(
                "setpoint {} has a negative offset",
                index + 1
            )));
        }
        if !setpoint.target_temp.is_finite() {
            return Err(ChamberError::MalformedProfile(format!(
                "setpoint {} has a non-finite temperature",
                index + 1
            )));
        }
    }

    for (index, pair) in setpoints.windows(2).enumerate() {
        if pair[1].offset <= pair[0].offset {
            return Err(ChamberError::MalformedProfile(format!(
                "setpoint {} at {} does not come after {}",
                index + 2,
                format_offset(pair[1].offset),
                format_offset(pair[0].offset)
            )));
        }
    }

    Ok(())
}

/// Parse a profile time cell.
///
/// `DD:HH:MM` is self-contained; `DD` counts run days from 1, so `01:00:00`
/// is the start of the run. `HH:MM` is a time of day placed on
/// `elapsed_days` (0-based).
pub fn parse_offset(cell: &str, elapsed_days: i64) -> Result<Duration> {
    let malformed =
        || ChamberError::MalformedProfile(format!("invalid time {:?}, expected DD:HH:MM or HH:MM", cell));

    let parts = cell
        .trim()
        .split(':')
        .map(|part| part.trim().parse::<i64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| malformed())?;

    let (days, hours, minutes) = match parts.as_slice() {
        [day, hours, minutes] => {
            if *day < 1 {
                return Err(ChamberError::MalformedProfile(format!(
                    "invalid time {:?}: days are counted from 01",
                    cell
                )));
            }
            (day - 1, *hours, *minutes)
        }
        [hours, minutes] => (elapsed_days, *hours, *minutes),
        _ => return Err(malformed()),
    };

    if !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
        return Err(malformed());
    }

    Ok(Duration::days(days) + Duration::hours(hours) + Duration::minutes(minutes))
}

/// Format an offset as canonical `DD:HH:MM` (day counted from 01).
/// Seconds are dropped.
pub fn format_offset(offset: Duration) -> String {
    let total_minutes = offset.num_minutes().max(0);
    let days = total_minutes / (24 * 60);
    let hours = (total_minutes / 60) % 24;
    let minutes = total_minutes % 60;
    format!("{:02}:{:02}:{:02}", days + 1, hours, minutes)
}
