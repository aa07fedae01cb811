//! Append-only CSV writer for the result log.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::Schema;
use crate::record::MeasurementResult;

/// Failure to persist a row. The scheduler logs it and moves on.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("open result log {}: {source}", .path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error("encode result row: {0}")]
    Encode(#[from] csv::Error),
    #[error("append to result log {}: {source}", .path.display())]
    Append { path: PathBuf, source: io::Error },
}

/// Handle on the result log file. Cheap to keep around; the file is opened per append.
#[derive(Debug, Clone)]
pub struct ResultLog {
    path: PathBuf,
    schema: Schema,
}

impl ResultLog {
    pub fn new(path: impl Into<PathBuf>, schema: Schema) -> Self {
        Self {
            path: path.into(),
            schema,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> Schema {
        self.schema
    }

    /// Create the file with its header if it does not exist yet (or is empty).
    /// Returns `true` if the header was written by this call.
    pub fn ensure_header(&self) -> Result<bool, WriteError> {
        let mut file = self.open()?;
        if !self.is_empty(&file)? {
            return Ok(false);
        }
        let bytes = self.encode(None)?;
        self.write_bytes(&mut file, &bytes)?;
        tracing::info!(path = %self.path.display(), "created new result log");
        Ok(true)
    }

    /// Append one row. The header is written first if the file is new; an
    /// existing header is never touched. The row goes out in a single write.
    pub fn append(&self, result: &MeasurementResult) -> Result<(), WriteError> {
        let mut file = self.open()?;
        let needs_header = self.is_empty(&file)?;
        let bytes = self.encode(Some((result, needs_header)))?;
        self.write_bytes(&mut file, &bytes)?;
        if needs_header {
            tracing::info!(path = %self.path.display(), "created new result log");
        }
        Ok(())
    }

    fn open(&self) -> Result<File, WriteError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| WriteError::Open {
                path: self.path.clone(),
                source,
            })?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| WriteError::Open {
                path: self.path.clone(),
                source,
            })
    }

    fn is_empty(&self, file: &File) -> Result<bool, WriteError> {
        file.metadata()
            .map(|m| m.len() == 0)
            .map_err(|source| WriteError::Open {
                path: self.path.clone(),
                source,
            })
    }

    /// Encode the header (when `row` is None or asks for it) and the row into one buffer.
    fn encode(&self, row: Option<(&MeasurementResult, bool)>) -> Result<Vec<u8>, WriteError> {
        let mut w = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        match row {
            None => w.write_record(self.schema.header())?,
            Some((result, with_header)) => {
                if with_header {
                    w.write_record(self.schema.header())?;
                }
                w.write_record(self.schema.row(result))?;
            }
        }
        w.into_inner()
            .map_err(|e| WriteError::Encode(csv::Error::from(e.into_error())))
    }

    fn write_bytes(&self, file: &mut File, bytes: &[u8]) -> Result<(), WriteError> {
        file.write_all(bytes)
            .and_then(|_| file.flush())
            .and_then(|_| file.sync_data())
            .map_err(|source| WriteError::Append {
                path: self.path.clone(),
                source,
            })
    }
}
