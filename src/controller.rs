//! Drives one measurement: samples in, records and archives out.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use tracing::{debug, info, warn};

use crate::archive::{ArchiveContents, ArchiveStore};
use crate::capabilities::{ChartRenderer, MailSender};
use crate::config::Settings;
use crate::error::{ChamberError, Result};
use crate::mail;
use crate::profile::editor::{generate_cycles_in_file, save_profile};
use crate::profile::{Profile, ProfileSetpoint, ProfileWatcher};
use crate::session::{DataRecord, PeriodSignal, SessionClock, SessionLog, SessionState, TimeSource};

/// Why a save was requested by [`Controller::sample`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveReason {
    /// The period with this index has ended and its chart is staged.
    PeriodEnd(u32),
    /// A subperiod ended; saving keeps the archive close to the live data.
    Housekeeping,
}

/// Outcome of one sample.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SampleReport {
    /// The appended record, or `None` if the sample was skipped.
    pub record: Option<DataRecord>,
    /// Set when the caller should schedule a save.
    pub save_due: Option<SaveReason>,
}

pub struct Controller {
    settings: Settings,
    state: SessionState,
    archive: ArchiveStore,
    watcher: Option<ProfileWatcher>,
    last_save_error: Option<String>,
}

impl Controller {
    /// Start a new measurement now.
    pub fn new(settings: Settings, time: Arc<dyn TimeSource>) -> Result<Self> {
        settings.validate()?;
        let clock = SessionClock::start(time, settings.period_length(), settings.subperiod_length());
        let archive = ArchiveStore::new(settings.data_dir());
        Ok(Self {
            settings,
            state: SessionState::new(clock),
            archive,
            watcher: None,
            last_save_error: None,
        })
    }

    /// Continue the measurement saved in the archive at `path`.
    ///
    /// The session comes back paused at the instant it was saved. Records
    /// of finished periods are treated as already checkpointed. Further saves
    /// go to the same archive, or to a new temporary one if it was temporary.
    /// The profile is re-read from its file when that still works, otherwise
    /// the archived snapshot is used.
    pub fn resume_from_archive(settings: Settings, time: Arc<dyn TimeSource>, path: &Path) -> Result<Self> {
        settings.validate()?;
        let loaded = ArchiveStore::load(path)?;
        let session = loaded.session.ok_or_else(|| ChamberError::ArchiveCorrupt {
            path: path.to_path_buf(),
            reason: "no session state to resume from".to_string(),
        })?;

        let clock = SessionClock::restore(
            time,
            &session.clock,
            settings.period_length(),
            settings.subperiod_length(),
        );
        let last_checkpoint = Some(clock.period_index() - 1).filter(|period| *period > 0);
        let committed_through = last_checkpoint.map(|_| clock.period_start());
        let log = SessionLog::from_records(loaded.records, committed_through)?;
        info!(
            "Resuming {:?} in period {} with {} records",
            path,
            clock.period_index(),
            log.len()
        );

        let archive = ArchiveStore::open(path, settings.data_dir(), last_checkpoint);
        let mut controller = Self {
            settings,
            state: SessionState::with_log(clock, log),
            archive,
            watcher: None,
            last_save_error: None,
        };
        match session.profile_path.clone().filter(|p| p.exists()) {
            Some(profile_path) => {
                if let Err(e) = controller.load_profile(&profile_path) {
                    warn!("Using the archived profile snapshot instead of {:?}: {}", profile_path, e);
                    controller.state.set_profile(loaded.profile, Some(profile_path))?;
                }
            }
            None => controller
                .state
                .set_profile(loaded.profile, session.profile_path)?,
        }
        Ok(controller)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn archive(&self) -> &ArchiveStore {
        &self.archive
    }

    /// Error of the most recent save, cleared by the next successful one.
    pub fn last_save_error(&self) -> Option<&str> {
        self.last_save_error.as_deref()
    }

    pub fn pause(&mut self) -> bool {
        self.state.clock_mut().pause()
    }

    pub fn resume(&mut self) -> bool {
        self.state.clock_mut().resume()
    }

    pub fn is_paused(&self) -> bool {
        self.state.clock().is_paused()
    }

    /// Load the profile at `path` and watch it for edits.
    ///
    /// If the profile is unusable the measurement continues without one;
    /// the file is still watched so a fix is picked up.
    pub fn load_profile(&mut self, path: &Path) -> Result<()> {
        let result = self.state.load_profile(path);
        self.watch_profile(path);
        result
    }

    fn watch_profile(&mut self, path: &Path) {
        if self.watcher.as_ref().is_some_and(|w| w.path() == path) {
            return;
        }
        self.watcher = match ProfileWatcher::watch(path) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                warn!("Edits to {:?} will not be picked up: {}", path, e);
                None
            }
        };
    }

    /// Reload the profile if its file changed on disk. Returns true if a
    /// reload happened.
    pub fn poll_profile_changes(&mut self) -> Result<bool> {
        let changed = self.watcher.as_ref().is_some_and(|w| w.take_changed());
        if !changed {
            return Ok(false);
        }
        info!("Profile changed on disk, reloading");
        self.state.reload_profile()?;
        Ok(true)
    }

    /// Normalize and save edited setpoints to the active profile file, then
    /// make them the active profile.
    pub fn save_profile_edits(&mut self, setpoints: Vec<ProfileSetpoint>) -> Result<Profile> {
        let path = self.require_profile_path()?;
        let profile = save_profile(setpoints, &path)?;
        self.state.set_profile(Some(profile.clone()), Some(path))?;
        Ok(profile)
    }

    /// Expand the active profile file into `num_cycles` cycles, capped at
    /// the configured cycle length.
    pub fn generate_cycles(&mut self, num_cycles: u32) -> Result<Profile> {
        let path = self.require_profile_path()?;
        let profile = generate_cycles_in_file(&path, num_cycles, self.settings.cycle_cap())?;
        self.state.set_profile(Some(profile.clone()), Some(path))?;
        Ok(profile)
    }

    fn require_profile_path(&self) -> Result<PathBuf> {
        self.state
            .profile_path()
            .map(Path::to_path_buf)
            .ok_or_else(|| ChamberError::MalformedProfile("no profile file is loaded".to_string()))
    }

    /// Record one sensor reading at the current elapsed time.
    ///
    /// Period boundaries crossed since the previous sample are handled
    /// first, so the reading lands in the period it belongs to. Ending a
    /// period renders and stages its chart and checkpoints its records; the
    /// archive itself is only written by [`Controller::save`].
    pub fn sample(&mut self, real_temp: f64, renderer: &dyn ChartRenderer) -> Result<SampleReport> {
        if self.is_paused() {
            debug!("Sample ignored while paused");
            return Ok(SampleReport::default());
        }

        let elapsed = self.state.clock().elapsed_now();
        let mut save_due = None;
        loop {
            match self.state.clock().check_boundary(elapsed) {
                PeriodSignal::PeriodChange => {
                    let period = self.state.clock().period_index();
                    self.end_period(period, renderer)?;
                    save_due = Some(SaveReason::PeriodEnd(period));
                }
                PeriodSignal::SubperiodChange => {
                    self.state.clock_mut().advance_subperiod();
                    save_due.get_or_insert(SaveReason::Housekeeping);
                }
                PeriodSignal::Ok => break,
            }
        }

        let record = self.state.record(elapsed, real_temp)?;
        Ok(SampleReport { record, save_due })
    }

    fn end_period(&mut self, period: u32, renderer: &dyn ChartRenderer) -> Result<()> {
        let chart = renderer.render_chart(self.state.log().live(), period);
        if !chart.is_empty() {
            self.archive.stage_figure(period, chart);
        }
        self.archive.checkpoint(self.state.log_mut(), period)?;
        self.state.clock_mut().advance_period();
        if let Err(e) = self.state.follow_daily_profile() {
            warn!("Daily profile not moved to period {}: {}", period + 1, e);
        }
        Ok(())
    }

    /// Write the archive to its current location (a temporary file until
    /// [`Controller::save_as`] is used).
    pub fn save(&mut self, renderer: &dyn ChartRenderer) -> Result<PathBuf> {
        let period = self.state.clock().period_index();
        let chart = renderer.render_chart(self.state.log().live(), period);
        let session = self.state.snapshot();
        let contents = ArchiveContents {
            log: self.state.log(),
            profile: self.state.profile(),
            current_period: period,
            current_chart: &chart,
            session: &session,
        };
        let result = self.archive.save(&contents);
        self.note_save(result)
    }

    /// Write the archive to `path` and keep saving there.
    pub fn save_as(&mut self, path: &Path, renderer: &dyn ChartRenderer) -> Result<PathBuf> {
        let period = self.state.clock().period_index();
        let chart = renderer.render_chart(self.state.log().live(), period);
        let session = self.state.snapshot();
        let contents = ArchiveContents {
            log: self.state.log(),
            profile: self.state.profile(),
            current_period: period,
            current_chart: &chart,
            session: &session,
        };
        let result = self.archive.save_as(path, &contents);
        self.note_save(result)
    }

    fn note_save(&mut self, result: Result<PathBuf>) -> Result<PathBuf> {
        self.last_save_error = result.as_ref().err().map(|e| e.to_string());
        result
    }

    /// Mail the most recently saved archive to `address`, or to the
    /// configured default address.
    pub fn send_mail(&self, address: Option<&str>, sender: &dyn MailSender) -> Result<()> {
        let to = address
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .or_else(|| Some(self.settings.default_email.trim()).filter(|a| !a.is_empty()))
            .ok_or_else(|| ChamberError::Mail("no recipient address".to_string()))?;
        let path = self
            .archive
            .path()
            .ok_or_else(|| ChamberError::Mail("nothing has been saved yet".to_string()))?;

        let message = mail::compose(path, self.archive.is_temporary(), Local::now().naive_local(), to)
            .map_err(|e| ChamberError::Mail(e.to_string()))?;
        sender
            .send(&message)
            .map_err(|e| ChamberError::Mail(format!("{:#}", e)))?;

        info!("Mailed {:?} to {}", path, to);
        Ok(())
    }
}
