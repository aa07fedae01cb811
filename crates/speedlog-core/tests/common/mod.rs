//! Shared helpers: scripted invokers and fake `speedtest-cli` executables.

#![allow(dead_code)]

use speedlog_core::invoker::{FailureKind, MeasurementInvoker, MeasurementOutcome};
use speedlog_core::record::Metrics;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::time::Instant;

pub const REPORT: &str = r#"{"download": 50000000.0, "upload": 10000000.0, "ping": 15.3, "server": {"name": "Berlin", "country": "Germany"}, "client": {"isp": "Example ISP"}}"#;

/// Replays canned outcomes in order (success once the script runs out) and
/// records when each call happened.
pub struct Scripted {
    outcomes: Mutex<VecDeque<MeasurementOutcome>>,
    calls: Mutex<Vec<Instant>>,
}

impl Scripted {
    pub fn new(outcomes: impl IntoIterator<Item = MeasurementOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().clone()
    }
}

impl MeasurementInvoker for Scripted {
    async fn invoke(&self) -> MeasurementOutcome {
        self.calls.lock().unwrap().push(Instant::now());
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(success)
    }
}

impl MeasurementInvoker for &Scripted {
    async fn invoke(&self) -> MeasurementOutcome {
        (**self).invoke().await
    }
}

pub fn success() -> MeasurementOutcome {
    MeasurementOutcome::Success {
        metrics: Metrics::from_raw(50_000_000.0, 10_000_000.0, 15.3),
        server: None,
    }
}

pub fn forbidden() -> MeasurementOutcome {
    MeasurementOutcome::failure(FailureKind::RateLimited, "HTTP Error 403: Forbidden")
}

/// Write an executable `speedtest-cli` stand-in that fails with a 403 on its
/// first `fails` invocations and prints [`REPORT`] afterwards.
#[cfg(unix)]
pub fn fake_speedtest(dir: &Path, fails: u32) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("speedtest-cli");
    let counter = dir.join("calls");
    let script = format!(
        "#!/bin/sh\n\
         n=$(cat '{counter}' 2>/dev/null || echo 0)\n\
         n=$((n + 1))\n\
         echo \"$n\" > '{counter}'\n\
         if [ \"$1\" = \"--version\" ]; then echo 'speedtest-cli 2.1.3'; exit 0; fi\n\
         if [ \"$n\" -le {fails} ]; then echo 'ERROR: HTTP Error 403: Forbidden' >&2; exit 1; fi\n\
         echo '{report}'\n",
        counter = counter.display(),
        fails = fails,
        report = REPORT,
    );
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Number of times the fake tool ran.
pub fn fake_calls(dir: &Path) -> u32 {
    std::fs::read_to_string(dir.join("calls"))
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0)
}

pub fn data_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .skip(1)
        .map(str::to_string)
        .collect()
}
