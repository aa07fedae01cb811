//! Summary statistics over the result log.

use crate::record::{round2, MeasurementResult};

/// avg/min/max of one metric, rounded to 2 decimals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricStats {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

impl MetricStats {
    fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let sum: f64 = values.iter().sum();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(Self {
            avg: round2(sum / values.len() as f64),
            min: round2(min),
            max: round2(max),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// Successful measurements.
    pub total_tests: usize,
    /// ERROR rows.
    pub failed_tests: usize,
    pub download: MetricStats,
    pub upload: MetricStats,
    pub ping: MetricStats,
    pub first_test: String,
    pub last_test: String,
}

/// Summarize successful rows (ordered by timestamp). `None` when there are none.
pub fn summarize(rows: &[MeasurementResult]) -> Option<Summary> {
    let mut ok: Vec<&MeasurementResult> = rows.iter().filter(|r| !r.is_error()).collect();
    ok.sort_by_key(|r| r.timestamp);
    let failed_tests = rows.len() - ok.len();

    let pick = |f: fn(&crate::record::Metrics) -> f64| -> Vec<f64> {
        ok.iter().filter_map(|r| r.metrics()).map(f).collect()
    };
    let download = MetricStats::from_values(&pick(|m| m.download_mbps))?;
    let upload = MetricStats::from_values(&pick(|m| m.upload_mbps))?;
    let ping = MetricStats::from_values(&pick(|m| m.ping_ms))?;

    Some(Summary {
        total_tests: ok.len(),
        failed_tests,
        download,
        upload,
        ping,
        first_test: ok.first()?.timestamp_text(),
        last_test: ok.last()?.timestamp_text(),
    })
}
