//! Measurement invoker.
//!
//! Wraps one call to the external `speedtest-cli` tool and turns whatever
//! happens (JSON on stdout, an error text on stderr, a hang) into a
//! `MeasurementOutcome`. Nothing in here returns an error to the caller:
//! every failure path becomes `MeasurementOutcome::Failure` with a
//! classified `FailureKind` so the retry layer can act on it.

mod classify;
mod command;
mod parse;
mod speedtest;

use std::fmt;
use std::future::Future;

use crate::record::{Metrics, ServerMeta};

pub use classify::classify_stderr;
pub use command::{CommandRun, SpeedtestCommand};
pub use parse::{parse_report, ParseError, Report};
pub use speedtest::{BareSpeedtest, ExtendedSpeedtest};

/// Classification of a failed measurement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The measurement service refused us (HTTP 403 / Forbidden).
    RateLimited,
    /// The tool could not fetch its server configuration.
    ConfigUnavailable,
    /// The tool did not finish within the hard wall-clock budget.
    Timeout,
    /// Anything else: other exit texts, spawn errors, unparseable output.
    Unknown,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::RateLimited => "rate_limited",
            FailureKind::ConfigUnavailable => "config_unavailable",
            FailureKind::Timeout => "timeout",
            FailureKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single invocation of the measurement facility.
#[derive(Debug, Clone, PartialEq)]
pub enum MeasurementOutcome {
    Success {
        metrics: Metrics,
        server: Option<ServerMeta>,
    },
    Failure {
        kind: FailureKind,
        detail: String,
    },
}

impl MeasurementOutcome {
    pub fn failure(kind: FailureKind, detail: impl Into<String>) -> Self {
        MeasurementOutcome::Failure {
            kind,
            detail: detail.into(),
        }
    }
}

/// Something that can perform one measurement. The scheduler is generic over this
/// so tests can drive it with canned outcomes instead of the real tool.
pub trait MeasurementInvoker {
    fn invoke(&self) -> impl Future<Output = MeasurementOutcome> + Send;
}
