//! `speedlog stats` – summarize the result log.

use anyhow::Result;
use speedlog_core::config::SpeedlogConfig;
use speedlog_core::record::format_value;
use speedlog_core::stats::{self, MetricStats};
use speedlog_core::storage;
use std::path::PathBuf;

pub fn run_stats(cfg: &SpeedlogConfig, output: Option<PathBuf>) -> Result<()> {
    let path = output.unwrap_or_else(|| cfg.output.clone());
    let rows = storage::read_rows(&path)?;
    let Some(summary) = stats::summarize(&rows) else {
        let failed = rows.iter().filter(|r| r.is_error()).count();
        println!(
            "No successful tests in {} ({} failed).",
            path.display(),
            failed
        );
        return Ok(());
    };

    println!("Log:          {}", path.display());
    println!("Tests:        {}", summary.total_tests);
    println!("Failed:       {}", summary.failed_tests);
    println!("Period:       {} .. {}", summary.first_test, summary.last_test);
    println!("{:<13} {:>8} {:>8} {:>8}", "", "AVG", "MIN", "MAX");
    print_metric("Download Mbps", &summary.download);
    print_metric("Upload Mbps", &summary.upload);
    print_metric("Ping ms", &summary.ping);
    Ok(())
}

fn print_metric(label: &str, m: &MetricStats) {
    println!(
        "{:<13} {:>8} {:>8} {:>8}",
        label,
        format_value(m.avg),
        format_value(m.min),
        format_value(m.max)
    );
}
