//! Interval arithmetic: hours → sleep duration, adaptive stretching.

use std::time::Duration;

use crate::config::{AdaptiveConfig, MAX_INTERVAL_HOURS};

const SECS_PER_HOUR: f64 = 3600.0;

/// Convert a (possibly fractional) number of hours into a sleep duration.
/// Negative or NaN input yields zero; anything past [`MAX_INTERVAL_HOURS`] is clamped to it.
pub fn interval_duration(hours: f64) -> Duration {
    if hours.is_nan() || hours <= 0.0 {
        return Duration::ZERO;
    }
    let hours = hours.min(MAX_INTERVAL_HOURS);
    Duration::try_from_secs_f64(hours * SECS_PER_HOUR).unwrap_or(Duration::ZERO)
}

/// Interval to use after `failures` consecutive failed ticks.
///
/// Below `error_threshold` (or when disabled) the base interval is returned.
/// Otherwise `base * multiplier^(failures - 2)`, capped at `max_interval_hours`
/// but never shorter than `base`.
pub fn adaptive_interval(base_hours: f64, failures: u32, cfg: &AdaptiveConfig) -> f64 {
    if !cfg.enabled || failures < cfg.error_threshold.max(1) {
        return base_hours;
    }
    let exponent = failures.saturating_sub(2).min(64) as i32;
    let stretched = base_hours * cfg.backoff_multiplier.powi(exponent);
    stretched.min(cfg.max_interval_hours).max(base_hours)
}
