use crate::adapters::source::LineSource;
use crate::domain::model::{LoadResult, Mismatch, Provisioning, VerificationOutcome};
use crate::domain::ports::{Loader, RecordSource, SinkProvisioner, Verifier};
use crate::utils::error::{EtlError, Result};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Text file destination, fully overwritten on every load.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn unreachable(&self, reason: impl Into<String>) -> EtlError {
        EtlError::SinkUnreachable {
            target: self.path.display().to_string(),
            reason: reason.into(),
        }
    }
}

impl SinkProvisioner for FileSink {
    fn provision(&self) -> Result<Provisioning> {
        let dir = self.parent_dir();
        if !dir.is_dir() {
            return Err(self.unreachable(format!(
                "parent directory {} does not exist",
                dir.display()
            )));
        }
        Ok(Provisioning::none_required())
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

impl Loader for FileSink {
    type Record = String;

    fn load(&self, records: &[String]) -> Result<LoadResult> {
        for (index, record) in records.iter().enumerate() {
            if record.contains('\n') || record.ends_with('\r') {
                return Err(EtlError::MalformedRecord {
                    line: index as u64 + 1,
                    reason: "record cannot be written as a single line".to_string(),
                });
            }
        }

        // Write beside the destination and rename, so readers never see a partial file.
        let mut staged = NamedTempFile::new_in(self.parent_dir())
            .map_err(|e| self.unreachable(e.to_string()))?;
        {
            let mut writer = BufWriter::new(staged.as_file_mut());
            for record in records {
                writer.write_all(record.as_bytes())?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
        }
        staged.as_file().sync_all()?;
        staged
            .persist(&self.path)
            .map_err(|e| EtlError::IoError(e.error))?;

        tracing::debug!("Wrote {} lines to {}", records.len(), self.path.display());

        Ok(LoadResult {
            records_written: records.len(),
            confirmed: self.path.exists(),
        })
    }
}

impl Verifier for FileSink {
    fn verify(&self, expected: &[String]) -> Result<VerificationOutcome> {
        let actual = LineSource::new(&self.path).read_records()?;
        let mut mismatches = Vec::new();

        if actual.len() != expected.len() {
            mismatches.push(Mismatch::CountDiffers {
                expected: expected.len(),
                actual: actual.len(),
            });
        }

        for (index, (want, got)) in expected.iter().zip(actual.iter()).enumerate() {
            if *want != got.text {
                mismatches.push(Mismatch::RecordDiffers {
                    index,
                    expected: want.clone(),
                    actual: got.text.clone(),
                });
            }
        }

        Ok(VerificationOutcome {
            checked: expected.len(),
            mismatches,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_load_then_verify_round_trip() {
        let dir = TempDir::new().unwrap();
        let sink = FileSink::new(dir.path().join("new_file.txt"));

        let records = lines(&["hello", "world"]);
        let result = sink.load(&records).unwrap();
        assert!(result.confirmed);
        assert_eq!(result.records_written, 2);

        assert_eq!(
            std::fs::read_to_string(sink.path()).unwrap(),
            "hello\nworld\n"
        );
        assert!(sink.verify(&records).unwrap().is_match());
    }

    #[test]
    fn test_load_overwrites_previous_content() {
        let dir = TempDir::new().unwrap();
        let sink = FileSink::new(dir.path().join("out.txt"));

        sink.load(&lines(&["one", "two", "three"])).unwrap();
        sink.load(&lines(&["four"])).unwrap();

        assert_eq!(std::fs::read_to_string(sink.path()).unwrap(), "four\n");
    }

    #[test]
    fn test_empty_load_creates_empty_file() {
        let dir = TempDir::new().unwrap();
        let sink = FileSink::new(dir.path().join("empty.txt"));

        let result = sink.load(&[]).unwrap();
        assert!(result.confirmed);
        assert!(sink.verify(&[]).unwrap().is_match());
    }

    #[test]
    fn test_provision_requires_parent_directory() {
        let dir = TempDir::new().unwrap();
        let sink = FileSink::new(dir.path().join("missing").join("out.txt"));

        let err = sink.provision().unwrap_err();
        assert!(matches!(err, EtlError::SinkUnreachable { .. }));

        let ok = FileSink::new(dir.path().join("out.txt"));
        assert_eq!(ok.provision().unwrap(), Provisioning::none_required());
    }

    #[test]
    fn test_multiline_record_is_rejected_before_writing() {
        let dir = TempDir::new().unwrap();
        let sink = FileSink::new(dir.path().join("out.txt"));

        let err = sink.load(&lines(&["fine", "two\nlines"])).unwrap_err();
        assert!(matches!(err, EtlError::MalformedRecord { line: 2, .. }));
        assert!(!sink.path().exists());
    }

    #[test]
    fn test_verify_reports_tampering() {
        let dir = TempDir::new().unwrap();
        let sink = FileSink::new(dir.path().join("out.txt"));
        let records = lines(&["HELLO WORLD", "HAPPY NEW YEAR"]);
        sink.load(&records).unwrap();

        std::fs::write(sink.path(), "HELLO WORLD\nhappy new year\nEXTRA\n").unwrap();

        let outcome = sink.verify(&records).unwrap();
        assert_eq!(
            outcome.mismatches,
            vec![
                Mismatch::CountDiffers {
                    expected: 2,
                    actual: 3
                },
                Mismatch::RecordDiffers {
                    index: 1,
                    expected: "HAPPY NEW YEAR".to_string(),
                    actual: "happy new year".to_string(),
                },
            ]
        );
    }
}
