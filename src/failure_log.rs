//! Append-only CSV log of permanently-failed units of work.
//!
//! One row per route or operator that exhausted its retries. The file is
//! opened in append mode on every write so successive runs accumulate into
//! the same log.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;

pub struct FailureLog {
    path: PathBuf,
}

impl FailureLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Append one permanent-failure entry:
    /// (timestamp, url, route name, operator name, error detail).
    pub fn record(
        &self,
        url: &str,
        route_name: &str,
        operator: &str,
        error_detail: &str,
    ) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .context("failed to create failure log directory")?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .context("failed to open failure log")?;

        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        writer.write_record([
            &Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            url,
            route_name,
            operator,
            error_detail,
        ])?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appends_one_row_per_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("failures.csv");
        let log = FailureLog::new(&path);

        log.record("http://example/route", "A to B", "SomeRTC", "timed out")
            .unwrap();
        log.record("http://example/other", "C to D", "OtherRTC", "no button")
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("A to B"));
        assert!(lines[0].contains("timed out"));
        assert!(lines[1].contains("OtherRTC"));
    }

    #[test]
    fn test_quotes_embedded_commas() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("failures.csv");
        let log = FailureLog::new(&path);

        log.record("http://example", "A to B", "RTC", "error: one, two")
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"error: one, two\""));
    }
}
