//! CLI command handlers, one file per command.

mod check;
mod completions;
mod once;
mod run;
mod stats;

pub use check::run_check;
pub use completions::{run_completions, run_man};
pub use once::run_once;
pub use run::run_loop;
pub use stats::run_stats;

use speedlog_core::config::{SpeedlogConfig, Variant};
use speedlog_core::control::Shutdown;
use speedlog_core::invoker::{BareSpeedtest, ExtendedSpeedtest};
use speedlog_core::scheduler::{RunSummary, Scheduler, Settings};
use speedlog_core::storage::{ResultLog, Schema};

/// How a scheduler should be driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Loop,
    Once,
}

/// Build the variant-specific invoker and drive the shared scheduler.
pub(crate) async fn drive(
    cfg: &SpeedlogConfig,
    settings: Settings,
    shutdown: Shutdown,
    mode: Mode,
) -> RunSummary {
    let variant = cfg.variant();
    let log = ResultLog::new(&cfg.output, Schema::from(variant));
    if let Err(e) = log.ensure_header() {
        tracing::warn!("could not prepare result log: {}", e);
    }
    match variant {
        Variant::Bare => {
            let invoker = BareSpeedtest::from_config(&cfg.speedtest);
            execute(Scheduler::new(invoker, log, settings, shutdown), mode).await
        }
        Variant::Extended => {
            let invoker = ExtendedSpeedtest::from_config(&cfg.speedtest);
            execute(Scheduler::new(invoker, log, settings, shutdown), mode).await
        }
    }
}

async fn execute<I>(mut scheduler: Scheduler<I>, mode: Mode) -> RunSummary
where
    I: speedlog_core::invoker::MeasurementInvoker,
{
    match mode {
        Mode::Loop => scheduler.run().await,
        Mode::Once => scheduler.run_once().await,
    }
}
