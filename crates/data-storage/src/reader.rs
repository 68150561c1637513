//! Bulk ingestion of measurement files.
//!
//! Each line is `patientId,timestamp,recordType,measurementValue`, e.g.
//! `1,1700000000000,HeartRate,85.0`. Lines that do not fit are skipped
//! without aborting the read; only a missing source or an I/O failure is a
//! hard error.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use vitals_core::{PatientId, VitalsError};

use crate::{DataStorage, IngestError};

/// Source of measurement records
pub trait DataReader {
    fn read_data(&self, storage: &DataStorage) -> Result<IngestSummary, IngestError>;
}

/// Counters for one ingestion run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub files_read: usize,
    /// Non-blank lines seen
    pub lines_read: usize,
    pub records_added: usize,
    pub lines_skipped: usize,
}

impl IngestSummary {
    fn merge(&mut self, other: IngestSummary) {
        self.files_read += other.files_read;
        self.lines_read += other.lines_read;
        self.records_added += other.records_added;
        self.lines_skipped += other.lines_skipped;
    }
}

/// Reads every regular file in a directory (non-recursive, in file-name
/// order), or a single file when pointed at one.
#[derive(Debug, Clone)]
pub struct FileDataReader {
    path: PathBuf,
}

impl FileDataReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn source_files(&self) -> Result<Vec<PathBuf>, IngestError> {
        if !self.path.exists() {
            return Err(IngestError::SourceNotFound(self.path.clone()));
        }
        if self.path.is_file() {
            return Ok(vec![self.path.clone()]);
        }

        let io_err = |source| IngestError::Io {
            path: self.path.clone(),
            source,
        };
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.path).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn read_file(&self, path: &Path, storage: &DataStorage) -> Result<IngestSummary, IngestError> {
        let io_err = |source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut reader = BufReader::new(File::open(path).map_err(io_err)?);

        let mut summary = IngestSummary {
            files_read: 1,
            ..Default::default()
        };

        let mut buf = Vec::new();
        let mut line_no = 0usize;
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).map_err(io_err)? == 0 {
                break;
            }
            line_no += 1;

            // Invalid UTF-8 decodes to U+FFFD and then fails to parse like any other bad line.
            let decoded = String::from_utf8_lossy(&buf);
            let line = decoded.trim_end_matches(['\r', '\n']);
            if line.trim().is_empty() {
                continue;
            }
            summary.lines_read += 1;

            let result = parse_line(line).and_then(|parsed| {
                storage
                    .add_patient_data(parsed.patient_id, parsed.value, parsed.record_type, parsed.timestamp)
                    .map_err(LineError::Rejected)
            });
            match result {
                Ok(()) => summary.records_added += 1,
                Err(e) => {
                    summary.lines_skipped += 1;
                    tracing::debug!("Skipping {}:{}: {}", path.display(), line_no, e);
                }
            }
        }

        tracing::debug!(
            "Read {}: {} records, {} skipped",
            path.display(),
            summary.records_added,
            summary.lines_skipped
        );
        Ok(summary)
    }
}

impl DataReader for FileDataReader {
    fn read_data(&self, storage: &DataStorage) -> Result<IngestSummary, IngestError> {
        let mut summary = IngestSummary::default();
        for file in self.source_files()? {
            summary.merge(self.read_file(&file, storage)?);
        }

        tracing::info!(
            "Ingested {} records from {} file(s) under {} ({} lines skipped)",
            summary.records_added,
            summary.files_read,
            self.path().display(),
            summary.lines_skipped
        );
        Ok(summary)
    }
}

#[derive(Debug, PartialEq)]
struct ParsedLine<'a> {
    patient_id: PatientId,
    timestamp: i64,
    record_type: &'a str,
    value: f64,
}

#[derive(Debug, PartialEq)]
enum LineError {
    FieldCount(usize),
    NotNumeric(&'static str),
    Rejected(VitalsError),
}

impl std::fmt::Display for LineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineError::FieldCount(n) => write!(f, "expected 4 fields, found {}", n),
            LineError::NotNumeric(field) => write!(f, "{} is not numeric", field),
            LineError::Rejected(e) => write!(f, "{}", e),
        }
    }
}

fn parse_line(line: &str) -> Result<ParsedLine<'_>, LineError> {
    let mut parts: Vec<&str> = line.split(',').collect();
    // Trailing empty fields do not count: `1,1000,ECG,0.5,` is a valid line.
    while parts.len() > 1 && parts.last() == Some(&"") {
        parts.pop();
    }
    if parts.len() != 4 {
        return Err(LineError::FieldCount(parts.len()));
    }
    let parts: Vec<&str> = parts.into_iter().map(str::trim).collect();

    Ok(ParsedLine {
        patient_id: parts[0].parse().map_err(|_| LineError::NotNumeric("patientId"))?,
        timestamp: parts[1].parse().map_err(|_| LineError::NotNumeric("timestamp"))?,
        record_type: parts[2],
        value: parts[3]
            .parse()
            .map_err(|_| LineError::NotNumeric("measurementValue"))?,
    })
}
