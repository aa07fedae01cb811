//! `speedlog once` – one on-demand test, gated by the manual cooldown.

use anyhow::Result;
use speedlog_core::control;
use speedlog_core::manual::{GateDecision, ManualGate};
use speedlog_core::preflight;
use speedlog_core::scheduler::Settings;

use super::{drive, Mode};
use crate::cli::{LoadedConfig, TargetArgs};

pub async fn run_once(loaded: LoadedConfig, target: &TargetArgs, force: bool) -> Result<()> {
    let mut cfg = loaded.cfg;
    target.apply(&mut cfg);

    let gate = ManualGate::new(ManualGate::default_path()?, cfg.manual_cooldown_minutes);
    if !force {
        if let GateDecision::CoolingDown { remaining_minutes } = gate.check_now()? {
            println!(
                "Manual test on cooldown. Please wait {} more minute(s) (or pass --force).",
                remaining_minutes
            );
            return Ok(());
        }
    }

    preflight::check_tool(&cfg.speedtest.binary).await?;

    let (trigger, shutdown) = control::channel();
    let signals = control::listen_for_signals(trigger);
    // Recorded before measuring so a slow or failing test still starts the cooldown.
    if let Err(e) = gate.record_now() {
        tracing::warn!("could not save manual test time: {:#}", e);
    }
    let summary = drive(&cfg, Settings::fixed(cfg.clone()), shutdown, Mode::Once).await;
    signals.abort();

    if summary.interrupted {
        println!("Test interrupted; nothing logged.");
    } else if summary.rows_written == 1 {
        println!("Result logged to {}", cfg.output.display());
    } else {
        println!("Test finished but the result could not be written; see the log.");
    }
    Ok(())
}
