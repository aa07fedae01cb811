//! The two `speedtest-cli` variants: bare (numbers only) and extended (server details).

use super::classify::classify_stderr;
use super::command::{CommandRun, SpeedtestCommand};
use super::parse::parse_report;
use super::{FailureKind, MeasurementInvoker, MeasurementOutcome};
use crate::config::SpeedtestConfig;

/// Records download/upload/ping only.
#[derive(Debug, Clone)]
pub struct BareSpeedtest {
    command: SpeedtestCommand,
}

impl BareSpeedtest {
    pub fn new(command: SpeedtestCommand) -> Self {
        Self { command }
    }

    pub fn from_config(cfg: &SpeedtestConfig) -> Self {
        Self::new(SpeedtestCommand::from_config(cfg))
    }
}

impl MeasurementInvoker for BareSpeedtest {
    async fn invoke(&self) -> MeasurementOutcome {
        measure(&self.command, false).await
    }
}

/// Also records server name, server country and ISP.
#[derive(Debug, Clone)]
pub struct ExtendedSpeedtest {
    command: SpeedtestCommand,
}

impl ExtendedSpeedtest {
    pub fn new(command: SpeedtestCommand) -> Self {
        Self { command }
    }

    pub fn from_config(cfg: &SpeedtestConfig) -> Self {
        Self::new(SpeedtestCommand::from_config(cfg))
    }
}

impl MeasurementInvoker for ExtendedSpeedtest {
    async fn invoke(&self) -> MeasurementOutcome {
        measure(&self.command, true).await
    }
}

async fn measure(command: &SpeedtestCommand, with_server: bool) -> MeasurementOutcome {
    tracing::debug!(binary = command.binary(), args = ?command.args(), "running speedtest");
    match command.run().await {
        CommandRun::Exited(output) => {
            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                let detail = if stderr.is_empty() {
                    format!("{} exited with {}", command.binary(), output.status)
                } else {
                    stderr
                };
                return MeasurementOutcome::failure(classify_stderr(&detail), detail);
            }
            let stdout = String::from_utf8_lossy(&output.stdout);
            match parse_report(&stdout) {
                Ok(report) => MeasurementOutcome::Success {
                    metrics: report.metrics,
                    server: with_server.then_some(report.server),
                },
                Err(e) => MeasurementOutcome::failure(FailureKind::Unknown, e.to_string()),
            }
        }
        CommandRun::TimedOut => MeasurementOutcome::failure(
            FailureKind::Timeout,
            format!(
                "{} did not finish within {}s",
                command.binary(),
                command.hard_timeout().as_secs()
            ),
        ),
        CommandRun::Io(e) => MeasurementOutcome::failure(
            FailureKind::Unknown,
            format!("could not run {}: {}", command.binary(), e),
        ),
    }
}
