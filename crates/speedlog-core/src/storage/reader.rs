//! Read the result log back (statistics, adaptive interval).

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::path::Path;

use crate::record::{MeasurementResult, Metrics, ServerMeta, ERROR_SENTINEL, TIMESTAMP_FORMAT};

/// Parse every row of the log in file order. A missing file yields no rows;
/// malformed rows are skipped with a warning.
pub fn read_rows(path: &Path) -> Result<Vec<MeasurementResult>> {
    let mut reader = match csv::ReaderBuilder::new().flexible(true).from_path(path) {
        Ok(r) => r,
        Err(e) => {
            if let csv::ErrorKind::Io(io) = e.kind() {
                if io.kind() == std::io::ErrorKind::NotFound {
                    return Ok(Vec::new());
                }
            }
            return Err(e).with_context(|| format!("open result log: {}", path.display()));
        }
    };

    let headers = reader
        .headers()
        .with_context(|| format!("read header: {}", path.display()))?
        .clone();
    let col = |name: &str| headers.iter().position(|h| h == name);
    let (Some(ts_i), Some(down_i), Some(up_i), Some(ping_i)) = (
        col("timestamp"),
        col("download_speed_mbps"),
        col("upload_speed_mbps"),
        col("ping_ms"),
    ) else {
        anyhow::bail!("unexpected header in {}: {:?}", path.display(), headers);
    };
    let name_i = col("server_name");
    let country_i = col("server_country");
    let isp_i = col("isp");

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(line = line + 2, "skipping unreadable row: {}", e);
                continue;
            }
        };
        let field = |i: usize| record.get(i).unwrap_or("").trim();
        let Ok(timestamp) = NaiveDateTime::parse_from_str(field(ts_i), TIMESTAMP_FORMAT) else {
            tracing::warn!(line = line + 2, "skipping row with invalid timestamp: {:?}", record);
            continue;
        };
        if field(down_i) == ERROR_SENTINEL {
            rows.push(MeasurementResult::error(timestamp));
            continue;
        }
        let parsed = (
            field(down_i).parse::<f64>(),
            field(up_i).parse::<f64>(),
            field(ping_i).parse::<f64>(),
        );
        let (Ok(download_mbps), Ok(upload_mbps), Ok(ping_ms)) = parsed else {
            tracing::warn!(line = line + 2, "skipping row with invalid values: {:?}", record);
            continue;
        };
        let opt = |i: Option<usize>| {
            i.map(|i| field(i))
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let server = if name_i.is_some() || country_i.is_some() || isp_i.is_some() {
            Some(ServerMeta {
                server_name: opt(name_i),
                server_country: opt(country_i),
                isp: opt(isp_i),
            })
        } else {
            None
        };
        rows.push(MeasurementResult::success(
            timestamp,
            Metrics {
                download_mbps,
                upload_mbps,
                ping_ms,
            },
            server,
        ));
    }
    Ok(rows)
}

/// Number of consecutive ERROR rows at the end of `rows`.
pub fn trailing_failures(rows: &[MeasurementResult]) -> u32 {
    rows.iter().rev().take_while(|r| r.is_error()).count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &tempfile::TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("log.csv");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_rows(&dir.path().join("absent.csv")).unwrap().is_empty());
    }

    #[test]
    fn reads_basic_rows_and_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "timestamp,download_speed_mbps,upload_speed_mbps,ping_ms\n\
             2025-01-01 10:00:00,50.0,10.0,15.3\n\
             2025-01-01 11:00:00,ERROR,ERROR,ERROR\n",
        );
        let rows = read_rows(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].metrics().unwrap().download_mbps, 50.0);
        assert!(rows[0].server().is_none());
        assert!(rows[1].is_error());
    }

    #[test]
    fn reads_extended_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "timestamp,download_speed_mbps,upload_speed_mbps,ping_ms,server_name,server_country,isp\n\
             2025-01-01 10:00:00,50.0,10.0,15.3,\"Washington, DC\",,Example\n",
        );
        let rows = read_rows(&path).unwrap();
        let server = rows[0].server().unwrap();
        assert_eq!(server.server_name.as_deref(), Some("Washington, DC"));
        assert!(server.server_country.is_none());
        assert_eq!(server.isp.as_deref(), Some("Example"));
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "timestamp,download_speed_mbps,upload_speed_mbps,ping_ms\n\
             yesterday,1.0,2.0,3.0\n\
             2025-01-01 10:00:00,fast,2.0,3.0\n\
             2025-01-01 11:00:00,1.0,2.0\n\
             2025-01-01 12:00:00,1.0,2.0,3.0\n",
        );
        let rows = read_rows(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].timestamp_text(), "2025-01-01 12:00:00");
    }

    #[test]
    fn wrong_header_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "a,b,c\n1,2,3\n");
        assert!(read_rows(&path).is_err());
    }

    #[test]
    fn counts_trailing_failures() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "timestamp,download_speed_mbps,upload_speed_mbps,ping_ms\n\
             2025-01-01 09:00:00,ERROR,ERROR,ERROR\n\
             2025-01-01 10:00:00,1.0,2.0,3.0\n\
             2025-01-01 11:00:00,ERROR,ERROR,ERROR\n\
             2025-01-01 12:00:00,ERROR,ERROR,ERROR\n",
        );
        let rows = read_rows(&path).unwrap();
        assert_eq!(trailing_failures(&rows), 2);
        assert_eq!(trailing_failures(&rows[..2]), 0);
        assert_eq!(trailing_failures(&[]), 0);
    }
}
