//! Measurement scheduler.
//!
//! Drives ticks: invoke the measurement tool (with retries) → append one row
//! to the result log → sleep for the configured interval → repeat, until the
//! shutdown signal fires. An interval of 0 runs a single tick and returns.
//! Generic over `MeasurementInvoker` so both tool variants (and test fakes)
//! share one loop.

mod interval;
mod settings;

pub use interval::{adaptive_interval, interval_duration};
pub use settings::Settings;

use crate::control::Shutdown;
use crate::invoker::MeasurementInvoker;
use crate::record::MeasurementResult;
use crate::retry::{self, TickOutcome};
use crate::storage::{self, ResultLog};

/// Loop phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Measuring,
    Sleeping,
}

/// What a run did, for callers and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Ticks that reached the log writer.
    pub ticks: u32,
    /// Rows actually persisted (ticks minus write failures).
    pub rows_written: u32,
    /// The loop stopped because of a shutdown signal.
    pub interrupted: bool,
}

pub struct Scheduler<I> {
    invoker: I,
    log: ResultLog,
    settings: Settings,
    shutdown: Shutdown,
}

impl<I: MeasurementInvoker> Scheduler<I> {
    pub fn new(invoker: I, log: ResultLog, settings: Settings, shutdown: Shutdown) -> Self {
        Self {
            invoker,
            log,
            settings,
            shutdown,
        }
    }

    pub fn log(&self) -> &ResultLog {
        &self.log
    }

    /// Run ticks until shutdown. Starts measuring immediately.
    /// An interval of exactly 0 hours means one tick, then return.
    pub async fn run(&mut self) -> RunSummary {
        let mut summary = RunSummary::default();
        let mut phase = Phase::Measuring;
        let mut sleep_hours = 0.0;

        let base = self.settings.interval_hours();
        let continuous = base != 0.0;
        if !continuous {
            tracing::info!("running single speed test");
        } else {
            tracing::info!("starting continuous speed testing every {} hour(s)", base);
            if self.settings.current().below_min_interval(base) {
                tracing::warn!(
                    "interval of {} hour(s) is below the recommended minimum of {} hour(s); expect rate limiting",
                    base,
                    self.settings.current().min_interval_hours
                );
            }
        }

        loop {
            match phase {
                Phase::Measuring => {
                    if self.shutdown.is_triggered() {
                        summary.interrupted = true;
                        break;
                    }
                    self.settings.refresh();
                    if !self.tick(&mut summary).await {
                        summary.interrupted = true;
                        break;
                    }
                    let base = self.settings.interval_hours();
                    if base == 0.0 {
                        if continuous {
                            tracing::warn!("interval set to 0 in configuration; stopping");
                        } else {
                            tracing::info!("single test completed");
                        }
                        break;
                    }
                    sleep_hours = self.next_interval_hours(base);
                    phase = Phase::Sleeping;
                }
                Phase::Sleeping => {
                    tracing::info!("waiting {} hour(s) until next test", sleep_hours);
                    if !self.shutdown.sleep(interval_duration(sleep_hours)).await {
                        summary.interrupted = true;
                        break;
                    }
                    phase = Phase::Measuring;
                }
            }
        }

        if summary.interrupted {
            tracing::info!("speed testing stopped");
        }
        summary
    }

    /// Exactly one tick regardless of the configured interval (on-demand runs).
    pub async fn run_once(&mut self) -> RunSummary {
        let mut summary = RunSummary::default();
        self.settings.refresh();
        if !self.tick(&mut summary).await {
            summary.interrupted = true;
            tracing::info!("speed test stopped");
        }
        summary
    }

    /// One measurement sequence plus its log append.
    /// Returns `false` if shutdown interrupted the tick (no row written).
    async fn tick(&mut self, summary: &mut RunSummary) -> bool {
        let policy = self.settings.current().retry_policy();
        match retry::run_with_retry(&self.invoker, &policy, &mut self.shutdown).await {
            TickOutcome::Interrupted => false,
            TickOutcome::Completed(result) => {
                summary.ticks += 1;
                if self.record(&result) {
                    summary.rows_written += 1;
                }
                true
            }
        }
    }

    /// Append the tick's row. A write failure loses this tick's result but keeps the loop alive.
    fn record(&self, result: &MeasurementResult) -> bool {
        match self.log.append(result) {
            Ok(()) => {
                tracing::info!(
                    path = %self.log.path().display(),
                    "results logged to {}",
                    self.log.path().display()
                );
                true
            }
            Err(e) => {
                tracing::error!(
                    path = %self.log.path().display(),
                    "failed to write result log; measurement from {} is lost: {}",
                    result.timestamp_text(),
                    e
                );
                false
            }
        }
    }

    fn next_interval_hours(&self, base: f64) -> f64 {
        let adaptive = self.settings.current().adaptive.as_ref();
        let Some(adaptive) = adaptive.filter(|a| a.enabled) else {
            return base;
        };
        let failures = match storage::read_rows(self.log.path()) {
            Ok(rows) => storage::trailing_failures(&rows),
            Err(e) => {
                tracing::warn!("could not read result log for adaptive interval: {:#}", e);
                0
            }
        };
        let hours = adaptive_interval(base, failures, adaptive);
        if hours > base {
            tracing::warn!(
                failures,
                "{} consecutive failed tests; stretching interval to {} hour(s)",
                failures,
                hours
            );
        }
        hours
    }
}
