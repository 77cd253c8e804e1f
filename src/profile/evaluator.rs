//! Piecewise-linear profile evaluation over a monotonic stream of times.
//!
//! A `ProfileEvaluator` is a one-pass cursor: each call advances through the
//! sorted setpoints instead of searching them, so evaluating a whole session
//! costs O(records + setpoints). Queries must not go backwards within one
//! cursor's lifetime; build a fresh cursor to restart from the beginning.

use std::sync::Arc;

use chrono::Duration;
use tracing::warn;

use super::types::{validate_setpoints, Profile, ProfileSetpoint};
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct ProfileEvaluator {
    setpoints: Option<Arc<[ProfileSetpoint]>>,
    /// Index of the first setpoint whose offset is not before the last query.
    next: usize,
    last_query: Option<Duration>,
}

impl ProfileEvaluator {
    /// A fresh cursor over `profile`. `None` means "no profile": every
    /// evaluation yields `None`.
    pub fn new(profile: Option<&Profile>) -> Self {
        Self {
            setpoints: profile.map(Profile::shared_setpoints),
            next: 0,
            last_query: None,
        }
    }

    /// A cursor that never yields a target temperature.
    pub fn empty() -> Self {
        Self::new(None)
    }

    /// A fresh cursor over raw setpoints, checking the ordering invariant
    /// so interpolation can never divide by a zero-length interval.
    pub fn from_setpoints(setpoints: Vec<ProfileSetpoint>) -> Result<Self> {
        validate_setpoints(&setpoints)?;
        Ok(Self {
            setpoints: Some(setpoints.into()),
            next: 0,
            last_query: None,
        })
    }

    pub fn has_profile(&self) -> bool {
        self.setpoints.is_some()
    }

    /// Target temperature at `elapsed`.
    ///
    /// Before the first setpoint and after the last one the target is held
    /// flat; in between it is interpolated linearly.
    pub fn evaluate(&mut self, elapsed: Duration) -> Option<f64> {
        let setpoints = self.setpoints.as_deref()?;

        if self.last_query.is_some_and(|last| elapsed < last) {
            warn!(
                "Profile cursor queried backwards ({}s after {}s), restarting scan",
                elapsed.num_seconds(),
                self.last_query.map_or(0, |last| last.num_seconds())
            );
            self.next = 0;
        }
        self.last_query = Some(elapsed);

        while self.next < setpoints.len() && elapsed > setpoints[self.next].offset {
            self.next += 1;
        }

        if self.next == 0 {
            return Some(setpoints[0].target_temp);
        }
        if self.next == setpoints.len() {
            return Some(setpoints[setpoints.len() - 1].target_temp);
        }

        let prev = &setpoints[self.next - 1];
        let next = &setpoints[self.next];
        Some(interpolate(prev, next, elapsed))
    }
}

/// Linear interpolation between two setpoints. `prev.offset < next.offset`
/// holds for every validated setpoint list.
fn interpolate(prev: &ProfileSetpoint, next: &ProfileSetpoint, elapsed: Duration) -> f64 {
    let span = millis(next.offset - prev.offset);
    let progress = millis(elapsed - prev.offset);
    prev.target_temp + (next.target_temp - prev.target_temp) * (progress / span)
}

fn millis(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64
}
