//! `speedlog run` – measure on a schedule until stopped.

use anyhow::Result;
use speedlog_core::config;
use speedlog_core::control;
use speedlog_core::preflight;
use speedlog_core::scheduler::Settings;

use super::{drive, Mode};
use crate::cli::{LoadedConfig, TargetArgs};

pub async fn run_loop(
    loaded: LoadedConfig,
    interval: Option<f64>,
    target: &TargetArgs,
) -> Result<()> {
    if let Some(hours) = interval {
        config::validate_interval(hours)?;
    }
    let mut cfg = loaded.cfg;
    target.apply(&mut cfg);

    let version = preflight::check_tool(&cfg.speedtest.binary).await?;
    tracing::info!("using {}", version);

    let (trigger, shutdown) = control::channel();
    let signals = control::listen_for_signals(trigger);

    let settings = Settings::watched(cfg.clone(), loaded.path).with_interval_override(interval);
    let summary = drive(&cfg, settings, shutdown, Mode::Loop).await;
    signals.abort();

    tracing::info!(
        ticks = summary.ticks,
        rows = summary.rows_written,
        "scheduler finished"
    );
    println!(
        "{} test(s) logged to {}",
        summary.rows_written,
        cfg.output.display()
    );
    Ok(())
}
