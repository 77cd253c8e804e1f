//! Measurement time that excludes pauses.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Source of wall-clock instants. Swapped for [`ManualTimeSource`] in tests.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualTimeSource {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualTimeSource {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Outcome of comparing an elapsed time with the period counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodSignal {
    /// The current period (day) has ended.
    PeriodChange,
    /// The current housekeeping subperiod (hour) has ended.
    SubperiodChange,
    Ok,
}

/// Serializable clock state, stored in archives so a session can resume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockSnapshot {
    pub start_time: DateTime<Utc>,
    pub accumulated_pause_ms: i64,
    pub paused_at: Option<DateTime<Utc>>,
    pub taken_at: DateTime<Utc>,
    pub period_index: u32,
    pub subperiod_index: u32,
}

/// Tracks elapsed measurement time across pause/resume cycles.
///
/// Elapsed time is `now - start_time - accumulated_pause`; while paused,
/// `now` is frozen at the pause instant, so no time passes for the
/// measurement. Period indices are 1-based.
pub struct SessionClock {
    time: Arc<dyn TimeSource>,
    start_time: DateTime<Utc>,
    accumulated_pause: Duration,
    paused_at: Option<DateTime<Utc>>,
    period_length: Duration,
    subperiod_length: Duration,
    period_index: u32,
    subperiod_index: u32,
}

impl SessionClock {
    /// Start measuring now.
    pub fn start(time: Arc<dyn TimeSource>, period_length: Duration, subperiod_length: Duration) -> Self {
        let start_time = time.now();
        info!("Measurement clock started at {}", start_time);
        Self {
            time,
            start_time,
            accumulated_pause: Duration::zero(),
            paused_at: None,
            period_length,
            subperiod_length,
            period_index: 1,
            subperiod_index: 1,
        }
    }

    /// Rebuild a clock from a snapshot.
    ///
    /// A clock that was running when the snapshot was taken comes back paused
    /// at the snapshot instant, so the time the session spent on disk is not
    /// counted. Call [`SessionClock::resume`] to continue measuring.
    pub fn restore(
        time: Arc<dyn TimeSource>,
        snapshot: &ClockSnapshot,
        period_length: Duration,
        subperiod_length: Duration,
    ) -> Self {
        Self {
            time,
            start_time: snapshot.start_time,
            accumulated_pause: Duration::milliseconds(snapshot.accumulated_pause_ms),
            paused_at: Some(snapshot.paused_at.unwrap_or(snapshot.taken_at)),
            period_length,
            subperiod_length,
            period_index: snapshot.period_index.max(1),
            subperiod_index: snapshot.subperiod_index.max(1),
        }
    }

    pub fn snapshot(&self) -> ClockSnapshot {
        ClockSnapshot {
            start_time: self.start_time,
            accumulated_pause_ms: self.accumulated_pause.num_milliseconds(),
            paused_at: self.paused_at,
            taken_at: self.time.now(),
            period_index: self.period_index,
            subperiod_index: self.subperiod_index,
        }
    }

    pub fn elapsed_now(&self) -> Duration {
        let now = self.paused_at.unwrap_or_else(|| self.time.now());
        now - self.start_time - self.accumulated_pause
    }

    /// Freeze measurement time. Returns false if already paused.
    pub fn pause(&mut self) -> bool {
        if self.paused_at.is_some() {
            debug!("Pause ignored, clock already paused");
            return false;
        }
        let now = self.time.now();
        self.paused_at = Some(now);
        info!("Measurement paused at {}s", self.elapsed_now().num_seconds());
        true
    }

    /// Continue measuring. Returns false if the clock was not paused.
    pub fn resume(&mut self) -> bool {
        let Some(paused_at) = self.paused_at.take() else {
            debug!("Resume ignored, clock not paused");
            return false;
        };
        let pause = self.time.now() - paused_at;
        if pause > Duration::zero() {
            self.accumulated_pause += pause;
        }
        info!(
            "Measurement resumed after a {}s pause ({}s paused in total)",
            pause.num_seconds(),
            self.accumulated_pause.num_seconds()
        );
        true
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn accumulated_pause(&self) -> Duration {
        self.accumulated_pause
    }

    /// Compare `elapsed` with the current period boundaries.
    ///
    /// Does not advance any counter: the caller advances after handling the
    /// signal, and keeps calling until it gets [`PeriodSignal::Ok`].
    pub fn check_boundary(&self, elapsed: Duration) -> PeriodSignal {
        if elapsed > self.period_length * self.period_index as i32 {
            PeriodSignal::PeriodChange
        } else if elapsed > self.subperiod_length * self.subperiod_index as i32 {
            PeriodSignal::SubperiodChange
        } else {
            PeriodSignal::Ok
        }
    }

    pub fn advance_period(&mut self) {
        self.period_index += 1;
        info!("Entered period {}", self.period_index);
    }

    pub fn advance_subperiod(&mut self) {
        self.subperiod_index += 1;
        debug!("Entered subperiod {}", self.subperiod_index);
    }

    pub fn period_index(&self) -> u32 {
        self.period_index
    }

    pub fn subperiod_index(&self) -> u32 {
        self.subperiod_index
    }

    pub fn period_length(&self) -> Duration {
        self.period_length
    }

    /// Elapsed time at which the current period began.
    pub fn period_start(&self) -> Duration {
        self.period_length * (self.period_index as i32 - 1)
    }
}
