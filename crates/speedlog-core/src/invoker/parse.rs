//! Parse the `speedtest-cli --json` report.

use serde::Deserialize;

use crate::record::{Metrics, ServerMeta};

#[derive(Debug, Deserialize)]
struct RawReport {
    download: f64,
    upload: f64,
    ping: f64,
    #[serde(default)]
    server: Option<RawServer>,
    #[serde(default)]
    client: Option<RawClient>,
}

#[derive(Debug, Deserialize)]
struct RawServer {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawClient {
    #[serde(default)]
    isp: Option<String>,
}

/// Normalized content of one report.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub metrics: Metrics,
    pub server: ServerMeta,
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid JSON from speedtest-cli: {0}")]
    Json(#[from] serde_json::Error),
    #[error("speedtest-cli reported an invalid {field}: {value}")]
    InvalidValue { field: &'static str, value: f64 },
}

/// Parse stdout of `speedtest-cli --json`: bits/second become Mbps, all values rounded
/// to 2 decimals. Negative or non-finite figures are rejected.
pub fn parse_report(stdout: &str) -> Result<Report, ParseError> {
    let raw: RawReport = serde_json::from_str(stdout.trim())?;
    for (field, value) in [
        ("download", raw.download),
        ("upload", raw.upload),
        ("ping", raw.ping),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(ParseError::InvalidValue { field, value });
        }
    }
    let server = ServerMeta {
        server_name: raw.server.as_ref().and_then(|s| non_empty(s.name.as_deref())),
        server_country: raw
            .server
            .as_ref()
            .and_then(|s| non_empty(s.country.as_deref())),
        isp: raw.client.as_ref().and_then(|c| non_empty(c.isp.as_deref())),
    };
    Ok(Report {
        metrics: Metrics::from_raw(raw.download, raw.upload, raw.ping),
        server,
    })
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"{
        "download": 93456789.12,
        "upload": 11114999.0,
        "ping": 17.236,
        "server": {"url": "http://example.net/speedtest/upload.php", "name": "Frankfurt",
                   "country": "Germany", "sponsor": "Example", "id": "1234", "latency": 17.236},
        "timestamp": "2025-03-14T09:26:53.589Z",
        "bytes_sent": 14123008,
        "bytes_received": 117285448,
        "share": null,
        "client": {"ip": "192.0.2.1", "isp": "Example Telecom", "country": "DE"}
    }"#;

    #[test]
    fn parses_full_report() {
        let report = parse_report(FULL).unwrap();
        assert_eq!(report.metrics.download_mbps, 93.46);
        assert_eq!(report.metrics.upload_mbps, 11.11);
        assert_eq!(report.metrics.ping_ms, 17.24);
        assert_eq!(report.server.server_name.as_deref(), Some("Frankfurt"));
        assert_eq!(report.server.server_country.as_deref(), Some("Germany"));
        assert_eq!(report.server.isp.as_deref(), Some("Example Telecom"));
    }

    #[test]
    fn minimal_report_has_no_server_meta() {
        let report =
            parse_report(r#"{"download": 50000000, "upload": 10000000, "ping": 15.3}"#).unwrap();
        assert_eq!(report.metrics, Metrics::from_raw(50_000_000.0, 10_000_000.0, 15.3));
        assert_eq!(report.server, ServerMeta::default());
    }

    #[test]
    fn empty_strings_are_unset() {
        let report = parse_report(
            r#"{"download": 1, "upload": 1, "ping": 1, "server": {"name": "", "country": " "}}"#,
        )
        .unwrap();
        assert!(report.server.server_name.is_none());
        assert!(report.server.server_country.is_none());
    }

    #[test]
    fn rejects_garbage_and_negative_values() {
        assert!(matches!(parse_report("not json"), Err(ParseError::Json(_))));
        assert!(matches!(
            parse_report(r#"{"download": 1, "upload": 1}"#),
            Err(ParseError::Json(_))
        ));
        assert!(matches!(
            parse_report(r#"{"download": -1, "upload": 1, "ping": 1}"#),
            Err(ParseError::InvalidValue { field: "download", .. })
        ));
    }
}
