use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Default result log file name, relative to the working directory.
pub const DEFAULT_OUTPUT: &str = "internet_speed_log.csv";

/// Longest accepted interval (one year).
pub const MAX_INTERVAL_HOURS: f64 = 24.0 * 365.0;

/// Accepted range for `manual_cooldown_minutes` (one minute to one day).
pub const MANUAL_COOLDOWN_RANGE: std::ops::RangeInclusive<u64> = 1..=1440;

/// Which measurement variant drives the loop (and which CSV columns are written).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// download/upload/ping only.
    #[default]
    Bare,
    /// Also records server name, server country and ISP.
    Extended,
}

/// Options passed through to `speedtest-cli` (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedtestConfig {
    /// Executable name or path.
    pub binary: String,
    /// The tool's own `--timeout`; must be shorter than `hard_timeout_secs`.
    pub timeout_secs: u64,
    /// Wall-clock budget for one invocation; the child is killed after this.
    pub hard_timeout_secs: u64,
    /// Pass `--secure` (HTTPS to the measurement servers).
    pub secure: bool,
    /// Pass `--single` (one connection instead of several).
    pub single: bool,
    /// Preferred server ids (`--server`); empty = auto-select.
    pub servers: Vec<u32>,
    /// Server ids to skip (`--exclude`).
    pub exclude_servers: Vec<u32>,
}

impl Default for SpeedtestConfig {
    fn default() -> Self {
        Self {
            binary: "speedtest-cli".to_string(),
            timeout_secs: 60,
            hard_timeout_secs: 120,
            secure: true,
            single: true,
            servers: Vec::new(),
            exclude_servers: Vec::new(),
        }
    }
}

impl SpeedtestConfig {
    pub fn hard_timeout(&self) -> Duration {
        Duration::from_secs(self.hard_timeout_secs)
    }
}

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per tick (including the first).
    pub max_attempts: u32,
    /// Delay in seconds before retrying after attempt i fails (0-based).
    pub delays_secs: Vec<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delays_secs: vec![30, 120, 300],
        }
    }
}

/// Stretch the sleep interval after repeated failed ticks (optional section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveConfig {
    pub enabled: bool,
    /// Consecutive trailing ERROR rows before the interval grows.
    pub error_threshold: u32,
    pub backoff_multiplier: f64,
    /// Upper bound on the stretched interval.
    pub max_interval_hours: f64,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            error_threshold: 3,
            backoff_multiplier: 2.0,
            max_interval_hours: 6.0,
        }
    }
}

/// Global configuration loaded from `~/.config/speedlog/config.toml`.
///
/// Missing keys fall back to the defaults below, so a partial file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedlogConfig {
    /// Hours between ticks. Fractional values are allowed; 0 = measure once and exit.
    pub interval_hours: f64,
    /// Intervals below this (but above 0) are allowed with a rate-limit warning.
    pub min_interval_hours: f64,
    /// Result log path.
    pub output: PathBuf,
    /// Minimum minutes between two manual (`once`) runs.
    pub manual_cooldown_minutes: u64,
    /// Measurement variant: "bare" (default) or "extended".
    pub variant: Option<Variant>,
    pub speedtest: SpeedtestConfig,
    /// Optional retry policy; if missing, built-in defaults are used.
    pub retry: Option<RetryConfig>,
    /// Optional adaptive interval; if missing, the interval is fixed.
    pub adaptive: Option<AdaptiveConfig>,
}

impl Default for SpeedlogConfig {
    fn default() -> Self {
        Self {
            interval_hours: 1.0,
            min_interval_hours: 0.25,
            output: PathBuf::from(DEFAULT_OUTPUT),
            manual_cooldown_minutes: 15,
            variant: None,
            speedtest: SpeedtestConfig::default(),
            retry: None,
            adaptive: None,
        }
    }
}

impl SpeedlogConfig {
    pub fn variant(&self) -> Variant {
        self.variant.unwrap_or_default()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
            .as_ref()
            .map(RetryPolicy::from_config)
            .unwrap_or_default()
    }

    /// Reject values the scheduler cannot run with.
    pub fn validate(&self) -> Result<()> {
        validate_interval(self.interval_hours)?;
        if !MANUAL_COOLDOWN_RANGE.contains(&self.manual_cooldown_minutes) {
            anyhow::bail!(
                "manual_cooldown_minutes must be between {} and {}, got {}",
                MANUAL_COOLDOWN_RANGE.start(),
                MANUAL_COOLDOWN_RANGE.end(),
                self.manual_cooldown_minutes
            );
        }
        if let Some(retry) = &self.retry {
            if retry.max_attempts == 0 {
                anyhow::bail!("retry.max_attempts must be at least 1");
            }
            if retry.delays_secs.is_empty() {
                anyhow::bail!("retry.delays_secs must list at least one delay");
            }
        }
        if self.speedtest.hard_timeout_secs <= self.speedtest.timeout_secs {
            anyhow::bail!(
                "speedtest.hard_timeout_secs ({}) must be greater than speedtest.timeout_secs ({})",
                self.speedtest.hard_timeout_secs,
                self.speedtest.timeout_secs
            );
        }
        if let Some(adaptive) = &self.adaptive {
            if !(adaptive.backoff_multiplier.is_finite() && adaptive.backoff_multiplier >= 1.0) {
                anyhow::bail!("adaptive.backoff_multiplier must be >= 1.0");
            }
            if !(adaptive.max_interval_hours > 0.0
                && adaptive.max_interval_hours <= MAX_INTERVAL_HOURS)
            {
                anyhow::bail!(
                    "adaptive.max_interval_hours must be positive and at most {}",
                    MAX_INTERVAL_HOURS
                );
            }
        }
        Ok(())
    }

    /// True when the interval is positive but shorter than the recommended minimum.
    pub fn below_min_interval(&self, hours: f64) -> bool {
        hours > 0.0 && hours < self.min_interval_hours
    }
}

/// Check an interval in hours: finite, not negative (0 means run once) and at
/// most [`MAX_INTERVAL_HOURS`].
pub fn validate_interval(hours: f64) -> Result<()> {
    if !hours.is_finite() || hours < 0.0 {
        anyhow::bail!("interval must be a non-negative number of hours, got {}", hours);
    }
    if hours > MAX_INTERVAL_HOURS {
        anyhow::bail!(
            "interval of {} hours is too long; the maximum is {} hours",
            hours,
            MAX_INTERVAL_HOURS
        );
    }
    Ok(())
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("speedlog")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<SpeedlogConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = SpeedlogConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load and validate configuration from an explicit path.
pub fn load_from_path(path: &Path) -> Result<SpeedlogConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config: {}", path.display()))?;
    let cfg: SpeedlogConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config: {}", path.display()))?;
    Ok(cfg)
}
