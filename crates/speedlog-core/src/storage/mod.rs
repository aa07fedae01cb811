//! Result log on disk.
//!
//! A CSV file with a fixed header, appended one row per tick and never
//! rewritten in place. The same file is read back for statistics and the
//! adaptive interval.

mod reader;
mod writer;

pub use reader::{read_rows, trailing_failures};
pub use writer::{ResultLog, WriteError};

use crate::config::Variant;
use crate::record::{self, MeasurementResult, Reading, ERROR_SENTINEL};

const BASE_COLUMNS: [&str; 4] = [
    "timestamp",
    "download_speed_mbps",
    "upload_speed_mbps",
    "ping_ms",
];

const EXTENDED_COLUMNS: [&str; 7] = [
    "timestamp",
    "download_speed_mbps",
    "upload_speed_mbps",
    "ping_ms",
    "server_name",
    "server_country",
    "isp",
];

/// Column layout of the log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    Basic,
    Extended,
}

impl From<Variant> for Schema {
    fn from(v: Variant) -> Self {
        match v {
            Variant::Bare => Schema::Basic,
            Variant::Extended => Schema::Extended,
        }
    }
}

impl Schema {
    pub fn header(&self) -> &'static [&'static str] {
        match self {
            Schema::Basic => &BASE_COLUMNS,
            Schema::Extended => &EXTENDED_COLUMNS,
        }
    }

    /// Render a result as the textual fields of one row.
    ///
    /// Error rows carry `ERROR` in every value column; in the extended layout
    /// the server columns are `ERROR` too. Unknown server details are empty cells.
    pub fn row(&self, result: &MeasurementResult) -> Vec<String> {
        let mut fields = Vec::with_capacity(self.header().len());
        fields.push(result.timestamp_text());
        match &result.reading {
            Reading::Measured { metrics, server } => {
                fields.push(record::format_value(metrics.download_mbps));
                fields.push(record::format_value(metrics.upload_mbps));
                fields.push(record::format_value(metrics.ping_ms));
                if *self == Schema::Extended {
                    let meta = server.clone().unwrap_or_default();
                    fields.push(meta.server_name.unwrap_or_default());
                    fields.push(meta.server_country.unwrap_or_default());
                    fields.push(meta.isp.unwrap_or_default());
                }
            }
            Reading::Failed => {
                while fields.len() < self.header().len() {
                    fields.push(ERROR_SENTINEL.to_string());
                }
            }
        }
        fields
    }
}
