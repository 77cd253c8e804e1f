//! The polling loop that feeds sensor readings to a [`Controller`].
//!
//! Samples are taken on a fixed `tokio` interval. Saves requested by a
//! sample are deferred by the configured save delay so that disk I/O never
//! runs in the same step as the sample it follows; a newer request replaces
//! a pending one. A failed deferred save is logged and left on the
//! controller (see [`Controller::last_save_error`]); a failed final save
//! fails the run.

use std::time::Duration;

use anyhow::Context;
use tokio::sync::watch;
use tokio::time::{interval, sleep_until, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::capabilities::{ChartRenderer, TemperatureSensor};
use crate::controller::{Controller, SaveReason};

pub struct Sampler<S, R> {
    controller: Controller,
    sensor: S,
    renderer: R,
    period: Duration,
    save_delay: Duration,
}

impl<S: TemperatureSensor, R: ChartRenderer> Sampler<S, R> {
    pub fn new(controller: Controller, sensor: S, renderer: R) -> Self {
        let period = controller.settings().measurement_period();
        let save_delay = controller.settings().save_delay();
        Self {
            controller,
            sensor,
            renderer,
            period,
            save_delay,
        }
    }

    /// Sample until `shutdown` turns true (or its sender is dropped), then
    /// save once more and hand the controller back.
    ///
    /// Sensor failures skip a tick. A failing sample is a broken invariant
    /// and ends the loop with an error, as does a failing final save.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<Controller> {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut save_at: Option<Instant> = None;

        info!("Sampling every {:?}", self.period);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Some(reason) = self.tick()? {
                        debug!("Save due ({:?}), writing in {:?}", reason, self.save_delay);
                        save_at = Some(Instant::now() + self.save_delay);
                    }
                }
                _ = sleep_until(save_at.unwrap_or_else(Instant::now)), if save_at.is_some() => {
                    save_at = None;
                    if let Err(e) = self.controller.save(&self.renderer) {
                        error!("Saving the archive failed, retrying at the next request: {}", e);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Sampler stopping");
        let path = self
            .controller
            .save(&self.renderer)
            .context("final save failed")?;
        info!("Final archive at {:?}", path);
        Ok(self.controller)
    }

    fn tick(&mut self) -> anyhow::Result<Option<SaveReason>> {
        if let Err(e) = self.controller.poll_profile_changes() {
            warn!("Reloading the edited profile failed: {}", e);
        }
        if self.controller.is_paused() {
            return Ok(None);
        }

        let temperature = match self.sensor.read_temperature() {
            Ok(t) => t,
            Err(e) => {
                warn!("Sensor read failed, skipping this sample: {:#}", e);
                return Ok(None);
            }
        };

        let report = self.controller.sample(temperature, &self.renderer)?;
        if let Some(record) = report.record {
            debug!(
                "Sampled {} at {}s (target {:?})",
                record.real_temp,
                record.elapsed.num_seconds(),
                record.target_temp
            );
        }
        Ok(report.save_due)
    }
}
