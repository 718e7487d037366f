use crate::domain::model::{CsvRow, TextLine};
use crate::domain::ports::RecordSource;
use crate::utils::error::{EtlError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};

fn open_source(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => EtlError::SourceNotFound {
            path: path.to_path_buf(),
        },
        _ => EtlError::IoError(e),
    })
}

/// Line-oriented text file. `\n`, `\r\n` and bare trailing `\r` terminators
/// are stripped, everything else on the line is kept as-is.
#[derive(Debug, Clone)]
pub struct LineSource {
    path: PathBuf,
}

impl LineSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSource for LineSource {
    type Record = TextLine;

    fn read_records(&self) -> Result<Vec<TextLine>> {
        let reader = BufReader::new(open_source(&self.path)?);
        let mut records = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line_no = index as u64 + 1;
            let mut text = line.map_err(|e| match e.kind() {
                ErrorKind::InvalidData => EtlError::MalformedRecord {
                    line: line_no,
                    reason: "line is not valid UTF-8".to_string(),
                },
                _ => EtlError::IoError(e),
            })?;
            let content_len = text.trim_end_matches('\r').len();
            text.truncate(content_len);
            records.push(TextLine {
                line: line_no,
                text,
            });
        }

        tracing::debug!("Read {} lines from {}", records.len(), self.path.display());
        Ok(records)
    }

    fn describe(&self) -> String {
        format!("lines:{}", self.path.display())
    }
}

/// Comma-separated file whose first row names the fields.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

fn classify_csv_error(err: csv::Error) -> EtlError {
    let malformed = match err.kind() {
        csv::ErrorKind::UnequalLengths {
            pos,
            expected_len,
            len,
        } => Some((
            pos.as_ref().map(|p| p.line()).unwrap_or(0),
            format!("expected {} fields, found {}", expected_len, len),
        )),
        csv::ErrorKind::Utf8 { pos, .. } => Some((
            pos.as_ref().map(|p| p.line()).unwrap_or(0),
            "row is not valid UTF-8".to_string(),
        )),
        _ => None,
    };

    match malformed {
        Some((line, reason)) => EtlError::MalformedRecord { line, reason },
        None => EtlError::CsvError(err),
    }
}

impl RecordSource for CsvSource {
    type Record = CsvRow;

    fn read_records(&self) -> Result<Vec<CsvRow>> {
        let file = open_source(&self.path)?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(file);

        let headers = reader.headers().map_err(classify_csv_error)?.clone();
        tracing::debug!("CSV header: {:?}", headers);

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(classify_csv_error)?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let fields = headers
                .iter()
                .zip(record.iter())
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect();
            rows.push(CsvRow { line, fields });
        }

        tracing::debug!("Read {} rows from {}", rows.len(), self.path.display());
        Ok(rows)
    }

    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }
}
