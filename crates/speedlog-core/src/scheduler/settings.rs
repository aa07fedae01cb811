//! Settings read at each tick boundary.

use std::path::PathBuf;

use crate::config::{self, SpeedlogConfig};

/// Where the loop gets its per-tick settings from.
///
/// With a backing file the config is re-read at every tick boundary, so edits
/// to the interval, retry and adaptive settings apply from the next tick. The
/// output path, variant and `[speedtest]` section are fixed at start. A file
/// that fails to load keeps the last good settings. A command-line interval
/// always wins.
#[derive(Debug, Clone)]
pub struct Settings {
    current: SpeedlogConfig,
    source: Option<PathBuf>,
    interval_override: Option<f64>,
}

impl Settings {
    /// Fixed settings, never reloaded.
    pub fn fixed(cfg: SpeedlogConfig) -> Self {
        Self {
            current: cfg,
            source: None,
            interval_override: None,
        }
    }

    /// Start from `cfg` and reload from `path` at each tick.
    pub fn watched(cfg: SpeedlogConfig, path: PathBuf) -> Self {
        Self {
            current: cfg,
            source: Some(path),
            interval_override: None,
        }
    }

    pub fn with_interval_override(mut self, hours: Option<f64>) -> Self {
        self.interval_override = hours;
        self
    }

    pub fn current(&self) -> &SpeedlogConfig {
        &self.current
    }

    pub fn interval_hours(&self) -> f64 {
        self.interval_override
            .unwrap_or(self.current.interval_hours)
    }

    /// Re-read the backing file, if any.
    pub fn refresh(&mut self) -> &SpeedlogConfig {
        if let Some(path) = &self.source {
            if path.exists() {
                match config::load_from_path(path) {
                    Ok(fresh) => {
                        if apply_reloadable(&mut self.current, fresh) {
                            tracing::info!(
                                path = %path.display(),
                                "configuration changed; applying from this tick"
                            );
                        }
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            "keeping previous configuration: {:#}",
                            e
                        )
                    }
                }
            }
        }
        &self.current
    }
}

/// Copy the settings that take effect mid-run from `fresh` into `current`.
/// Returns `true` if any of them changed.
fn apply_reloadable(current: &mut SpeedlogConfig, fresh: SpeedlogConfig) -> bool {
    let changed = current.interval_hours != fresh.interval_hours
        || current.min_interval_hours != fresh.min_interval_hours
        || current.retry != fresh.retry
        || current.adaptive != fresh.adaptive;
    current.interval_hours = fresh.interval_hours;
    current.min_interval_hours = fresh.min_interval_hours;
    current.retry = fresh.retry;
    current.adaptive = fresh.adaptive;
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_wins() {
        let s = Settings::fixed(SpeedlogConfig::default()).with_interval_override(Some(0.0));
        assert_eq!(s.interval_hours(), 0.0);
        let s = Settings::fixed(SpeedlogConfig::default());
        assert_eq!(s.interval_hours(), 1.0);
    }

    #[test]
    fn startup_overrides_are_not_a_change() {
        let mut current = SpeedlogConfig::default();
        current.output = "elsewhere.csv".into();
        current.variant = Some(crate::config::Variant::Extended);
        assert!(!apply_reloadable(&mut current, SpeedlogConfig::default()));
        assert_eq!(current.output, std::path::PathBuf::from("elsewhere.csv"));
        assert_eq!(current.variant(), crate::config::Variant::Extended);
    }

    #[test]
    fn only_reloadable_fields_are_applied() {
        let mut current = SpeedlogConfig::default();
        let mut fresh = SpeedlogConfig::default();
        fresh.interval_hours = 3.0;
        fresh.output = "moved.csv".into();
        fresh.speedtest.binary = "/opt/other".to_string();
        assert!(apply_reloadable(&mut current, fresh));
        assert_eq!(current.interval_hours, 3.0);
        assert_eq!(current.output, SpeedlogConfig::default().output);
        assert_eq!(current.speedtest.binary, "speedtest-cli");
    }

    #[test]
    fn refresh_picks_up_edits_and_keeps_last_good() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "interval_hours = 2.0\n").unwrap();
        let mut s = Settings::watched(SpeedlogConfig::default(), path.clone());
        assert_eq!(s.refresh().interval_hours, 2.0);

        std::fs::write(&path, "interval_hours = 0.5\n").unwrap();
        s.refresh();
        assert_eq!(s.interval_hours(), 0.5);

        std::fs::write(&path, "interval_hours = \"soon\"\n").unwrap();
        s.refresh();
        assert_eq!(s.interval_hours(), 0.5);
    }
}
