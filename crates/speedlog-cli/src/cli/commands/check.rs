//! `speedlog check` – verify the measurement tool is usable.

use anyhow::Result;
use speedlog_core::config::SpeedlogConfig;
use speedlog_core::preflight;

pub async fn run_check(cfg: &SpeedlogConfig) -> Result<()> {
    let version = preflight::check_tool(&cfg.speedtest.binary).await?;
    println!("{} OK: {}", cfg.speedtest.binary, version);
    Ok(())
}
