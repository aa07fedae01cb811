//! One row of the result log: a measurement or an explicit failure marker.

use chrono::{Local, NaiveDateTime, Timelike};

/// Timestamp layout used in the result log (local time, second resolution).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Written in place of every numeric field when a tick gives up.
pub const ERROR_SENTINEL: &str = "ERROR";

/// Normalized figures from one successful measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub download_mbps: f64,
    pub upload_mbps: f64,
    pub ping_ms: f64,
}

impl Metrics {
    /// Build from the tool's raw figures: bits/second for throughput, milliseconds for ping.
    pub fn from_raw(download_bps: f64, upload_bps: f64, ping_ms: f64) -> Self {
        Self {
            download_mbps: round2(download_bps / 1_000_000.0),
            upload_mbps: round2(upload_bps / 1_000_000.0),
            ping_ms: round2(ping_ms),
        }
    }
}

/// Server details collected by the extended variant. Unknown values stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerMeta {
    pub server_name: Option<String>,
    pub server_country: Option<String>,
    pub isp: Option<String>,
}

/// What a row carries: numbers (plus optional server details) or the ERROR sentinel.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    Measured {
        metrics: Metrics,
        server: Option<ServerMeta>,
    },
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementResult {
    pub timestamp: NaiveDateTime,
    pub reading: Reading,
}

impl MeasurementResult {
    pub fn success(timestamp: NaiveDateTime, metrics: Metrics, server: Option<ServerMeta>) -> Self {
        Self {
            timestamp: truncate_to_seconds(timestamp),
            reading: Reading::Measured { metrics, server },
        }
    }

    pub fn error(timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp: truncate_to_seconds(timestamp),
            reading: Reading::Failed,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.reading, Reading::Failed)
    }

    pub fn metrics(&self) -> Option<&Metrics> {
        match &self.reading {
            Reading::Measured { metrics, .. } => Some(metrics),
            Reading::Failed => None,
        }
    }

    pub fn server(&self) -> Option<&ServerMeta> {
        match &self.reading {
            Reading::Measured { server, .. } => server.as_ref(),
            Reading::Failed => None,
        }
    }

    pub fn timestamp_text(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Current local wall-clock time, truncated to whole seconds.
pub fn now() -> NaiveDateTime {
    truncate_to_seconds(Local::now().naive_local())
}

fn truncate_to_seconds(ts: NaiveDateTime) -> NaiveDateTime {
    ts.with_nanosecond(0).unwrap_or(ts)
}

/// Round half away from zero to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Render a rounded value the way the log has always shown it: `50.0`, `15.3`, `12.35`.
pub fn format_value(value: f64) -> String {
    let value = round2(value);
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_milli_opt(9, 26, 53, 589)
            .unwrap()
    }

    #[test]
    fn raw_figures_convert_to_mbps() {
        let m = Metrics::from_raw(50_000_000.0, 10_000_000.0, 15.3);
        assert_eq!(m.download_mbps, 50.0);
        assert_eq!(m.upload_mbps, 10.0);
        assert_eq!(m.ping_ms, 15.3);
    }

    #[test]
    fn raw_figures_round_to_two_decimals() {
        let m = Metrics::from_raw(93_456_789.0, 11_114_999.0, 7.8149);
        assert_eq!(m.download_mbps, 93.46);
        assert_eq!(m.upload_mbps, 11.11);
        assert_eq!(m.ping_ms, 7.81);
    }

    #[test]
    fn format_value_matches_log_style() {
        assert_eq!(format_value(50.0), "50.0");
        assert_eq!(format_value(15.3), "15.3");
        assert_eq!(format_value(12.345_1), "12.35");
        assert_eq!(format_value(0.0), "0.0");
    }

    #[test]
    fn timestamp_has_second_resolution() {
        let r = MeasurementResult::error(ts());
        assert_eq!(r.timestamp_text(), "2025-03-14 09:26:53");
        assert!(r.is_error());
        assert!(r.metrics().is_none());
    }

    #[test]
    fn success_exposes_metrics_and_server() {
        let meta = ServerMeta {
            server_name: Some("Frankfurt".into()),
            server_country: Some("Germany".into()),
            isp: None,
        };
        let r = MeasurementResult::success(
            ts(),
            Metrics::from_raw(1_000_000.0, 2_000_000.0, 3.0),
            Some(meta.clone()),
        );
        assert!(!r.is_error());
        assert_eq!(r.metrics().unwrap().download_mbps, 1.0);
        assert_eq!(r.server(), Some(&meta));
    }
}
