//! Classify `speedtest-cli` error output into failure kinds.

use super::FailureKind;

/// Classify the stderr text of a failed (non-zero exit) run.
pub fn classify_stderr(text: &str) -> FailureKind {
    if text.contains("403") || text.contains("Forbidden") {
        return FailureKind::RateLimited;
    }
    if let Some(pos) = text.find("Cannot retrieve") {
        if text[pos..].contains("configuration") {
            return FailureKind::ConfigUnavailable;
        }
    }
    FailureKind::Unknown
}
