//! Cooldown gate for on-demand (manual) measurements.
//!
//! Manual runs are independent ticks; this gate only keeps them from being
//! fired back to back. The scheduled loop never consults it.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// What the gate says about running a manual test now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allowed,
    /// Minutes until the cooldown expires, rounded up.
    CoolingDown { remaining_minutes: i64 },
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ManualState {
    last_manual_test: Option<DateTime<Local>>,
}

/// Persisted "last manual test" timestamp plus the cooldown length.
#[derive(Debug, Clone)]
pub struct ManualGate {
    path: PathBuf,
    cooldown: Duration,
}

impl ManualGate {
    pub fn new(path: impl Into<PathBuf>, cooldown_minutes: u64) -> Self {
        Self {
            path: path.into(),
            cooldown: i64::try_from(cooldown_minutes)
                .ok()
                .and_then(Duration::try_minutes)
                .unwrap_or(Duration::MAX),
        }
    }

    /// Default path: `~/.local/state/speedlog/manual.json`.
    pub fn default_path() -> Result<PathBuf> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("speedlog")?;
        Ok(xdg_dirs.get_state_home().join("manual.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn last_manual_test(&self) -> Result<Option<DateTime<Local>>> {
        Ok(self.load()?.last_manual_test)
    }

    pub fn check(&self, now: DateTime<Local>) -> Result<GateDecision> {
        Ok(decide(self.last_manual_test()?, now, self.cooldown))
    }

    pub fn check_now(&self) -> Result<GateDecision> {
        self.check(Local::now())
    }

    pub fn record_now(&self) -> Result<()> {
        self.record(Local::now())
    }

    /// Remember `now` as the time of the latest manual test.
    pub fn record(&self, now: DateTime<Local>) -> Result<()> {
        let state = ManualState {
            last_manual_test: Some(now),
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&state).context("serialize manual state")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("write manual state: {}", self.path.display()))?;
        Ok(())
    }

    /// A missing file means no manual test yet. A corrupt one is ignored with a warning.
    fn load(&self) -> Result<ManualState> {
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ManualState::default())
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("read manual state: {}", self.path.display()))
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(state) => Ok(state),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    "ignoring unreadable manual state: {}",
                    e
                );
                Ok(ManualState::default())
            }
        }
    }
}

/// Pure cooldown check.
pub fn decide(
    last: Option<DateTime<Local>>,
    now: DateTime<Local>,
    cooldown: Duration,
) -> GateDecision {
    let Some(last) = last else {
        return GateDecision::Allowed;
    };
    let since = now.signed_duration_since(last);
    if since >= cooldown {
        return GateDecision::Allowed;
    }
    // A clock that went backwards leaves `since` negative; treat it as a full cooldown.
    let remaining = cooldown.checked_sub(&since).unwrap_or(cooldown);
    GateDecision::CoolingDown {
        remaining_minutes: remaining.num_minutes() + 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_previous_test_is_allowed() {
        assert_eq!(
            decide(None, Local::now(), Duration::minutes(15)),
            GateDecision::Allowed
        );
    }

    #[test]
    fn within_cooldown_reports_remaining() {
        let now = Local::now();
        let last = now - Duration::minutes(5) - Duration::seconds(30);
        assert_eq!(
            decide(Some(last), now, Duration::minutes(15)),
            GateDecision::CoolingDown {
                remaining_minutes: 10
            }
        );
    }

    #[test]
    fn after_cooldown_is_allowed() {
        let now = Local::now();
        assert_eq!(
            decide(Some(now - Duration::minutes(15)), now, Duration::minutes(15)),
            GateDecision::Allowed
        );
    }

    #[test]
    fn record_then_check_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let gate = ManualGate::new(dir.path().join("state").join("manual.json"), 15);
        let now = Local::now();
        assert_eq!(gate.check(now).unwrap(), GateDecision::Allowed);
        gate.record(now).unwrap();
        assert!(gate.last_manual_test().unwrap().is_some());
        assert!(matches!(
            gate.check(now + Duration::minutes(1)).unwrap(),
            GateDecision::CoolingDown { .. }
        ));
        assert_eq!(
            gate.check(now + Duration::minutes(20)).unwrap(),
            GateDecision::Allowed
        );
    }

    #[test]
    fn huge_cooldown_saturates() {
        let dir = tempfile::tempdir().unwrap();
        let gate = ManualGate::new(dir.path().join("manual.json"), u64::MAX);
        let now = Local::now();
        gate.record(now).unwrap();
        assert!(matches!(
            gate.check(now + Duration::days(365)).unwrap(),
            GateDecision::CoolingDown { .. }
        ));
    }

    #[test]
    fn clock_going_backwards_keeps_cooling_down() {
        let now = Local::now();
        assert_eq!(
            decide(Some(now + Duration::minutes(5)), now, Duration::MAX),
            GateDecision::CoolingDown {
                remaining_minutes: Duration::MAX.num_minutes() + 1
            }
        );
    }

    #[test]
    fn default_path_is_directly_under_state_dir() {
        let path = ManualGate::default_path().unwrap();
        assert!(path.ends_with("speedlog/manual.json"));
        assert!(!path.ends_with("speedlog/speedlog/manual.json"));
    }

    #[test]
    fn corrupt_state_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manual.json");
        std::fs::write(&path, b"{not json").unwrap();
        let gate = ManualGate::new(&path, 15);
        assert_eq!(gate.check(Local::now()).unwrap(), GateDecision::Allowed);
    }
}
