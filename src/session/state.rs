use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::clock::{ClockSnapshot, SessionClock};
use super::log::SessionLog;
use super::record::DataRecord;
use crate::error::Result;
use crate::profile::reader::read_profile_for_day;
use crate::profile::{Profile, ProfileEvaluator};

/// What an archive remembers about the session besides its records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub clock: ClockSnapshot,
    /// Archive entry holding the profile, if one was active.
    pub profile_file: Option<String>,
    /// Where the profile was loaded from, for re-loading after edits.
    pub profile_path: Option<PathBuf>,
}

/// Mutable state of one measurement run.
///
/// Owns the clock, the record log, the active profile and the live
/// evaluator cursor used for incoming samples. The live cursor is rebuilt
/// whenever the profile changes; recalculation always uses its own cursor.
pub struct SessionState {
    clock: SessionClock,
    log: SessionLog,
    profile: Option<Profile>,
    profile_path: Option<PathBuf>,
    evaluator: ProfileEvaluator,
}

impl SessionState {
    pub fn new(clock: SessionClock) -> Self {
        Self::with_log(clock, SessionLog::new())
    }

    pub fn with_log(clock: SessionClock, log: SessionLog) -> Self {
        Self {
            clock,
            log,
            profile: None,
            profile_path: None,
            evaluator: ProfileEvaluator::empty(),
        }
    }

    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut SessionClock {
        &mut self.clock
    }

    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut SessionLog {
        &mut self.log
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn profile_path(&self) -> Option<&Path> {
        self.profile_path.as_deref()
    }

    /// Replace the active profile and recalculate every target temperature.
    pub fn set_profile(&mut self, profile: Option<Profile>, path: Option<PathBuf>) -> Result<()> {
        match &profile {
            Some(p) => info!("Active profile is now {:?} ({} setpoints)", p.file_name(), p.len()),
            None => info!("No active profile"),
        }
        self.profile = profile;
        self.profile_path = path;
        self.evaluator = ProfileEvaluator::new(self.profile.as_ref());
        self.recalculate()
    }

    /// Load the profile at `path` and make it active.
    ///
    /// A daily (`HH:MM`) profile is placed on the current period. On failure
    /// the session continues without a profile (targets become empty) and
    /// the error is returned for the caller to report.
    pub fn load_profile(&mut self, path: &Path) -> Result<()> {
        match self.read_for_current_period(path) {
            Ok(profile) => self.set_profile(Some(profile), Some(path.to_path_buf())),
            Err(e) => {
                warn!("Falling back to no profile, {:?} is unusable: {}", path, e);
                self.set_profile(None, Some(path.to_path_buf()))?;
                Err(e)
            }
        }
    }

    /// Re-read the profile from its last known path.
    pub fn reload_profile(&mut self) -> Result<()> {
        match self.profile_path.clone() {
            Some(path) => self.load_profile(&path),
            None => Ok(()),
        }
    }

    /// Move a daily profile onto the current period.
    ///
    /// Only the live cursor changes: records already taken keep their
    /// targets. Returns false when there is no daily profile to move.
    pub fn follow_daily_profile(&mut self) -> Result<bool> {
        let path = match (&self.profile, &self.profile_path) {
            (Some(profile), Some(path)) if profile.is_daily() => path.clone(),
            _ => return Ok(false),
        };
        let placed = self.read_for_current_period(&path)?;
        info!(
            "Daily profile {:?} now follows period {}",
            placed.file_name(),
            self.clock.period_index()
        );
        self.evaluator = ProfileEvaluator::new(Some(&placed));
        self.profile = Some(placed);
        Ok(true)
    }

    fn read_for_current_period(&self, path: &Path) -> Result<Profile> {
        let day = i64::from(self.clock.period_index().saturating_sub(1));
        read_profile_for_day(path, day)
    }

    /// Re-derive targets for the whole history with a fresh cursor.
    pub fn recalculate(&mut self) -> Result<()> {
        self.log.recalculate(ProfileEvaluator::new(self.profile.as_ref()))
    }

    /// Evaluate and append a sample taken at `elapsed`.
    ///
    /// Returns `None` when the sample does not advance past the previous
    /// record at whole-second precision (e.g. a reading taken while paused).
    pub fn record(&mut self, elapsed: Duration, real_temp: f64) -> Result<Option<DataRecord>> {
        let mut record = DataRecord::new(elapsed, real_temp, None);
        if self.log.last_elapsed().is_some_and(|last| record.elapsed <= last) {
            debug!(
                "Skipping sample at {}s, no time passed since the previous record",
                record.elapsed.num_seconds()
            );
            return Ok(None);
        }

        record.target_temp = self.evaluator.evaluate(record.elapsed);
        self.log.append(record)?;
        Ok(Some(record))
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            clock: self.clock.snapshot(),
            profile_file: self.profile.as_ref().map(|p| p.file_name().to_string()),
            profile_path: self.profile_path.clone(),
        }
    }
}
