//! # Telemetry File Logger
//!
//! Writes telemetry records as JSON Lines into a rotating set of files.
//!
//! - A new file is started after `max_records_per_file` records
//! - Only the newest `max_files_to_keep` files are retained
//!
//! Files are named `telemetry_<YYYYmmdd_HHMMSS>_<seq>.jsonl`, so sorting by
//! name sorts by age.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Result, TelloPadError};

const FILE_PREFIX: &str = "telemetry_";
const FILE_SUFFIX: &str = ".jsonl";

/// Rotating JSONL writer.
#[derive(Debug)]
pub struct TelemetryLogger {
    dir: PathBuf,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    current: Option<BufWriter<File>>,
    records_in_file: usize,
    sequence: u32,
}

impl TelemetryLogger {
    /// Creates a logger writing into `dir`, creating it if needed.
    ///
    /// No file is opened until the first record is written.
    ///
    /// # Errors
    ///
    /// Returns `Telemetry` if the directory cannot be created.
    pub fn new<P: AsRef<Path>>(dir: P, max_records_per_file: usize, max_files_to_keep: usize) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            TelloPadError::Telemetry(format!("Failed to create {}: {}", dir.display(), e))
        })?;

        Ok(Self {
            dir,
            max_records_per_file: max_records_per_file.max(1),
            max_files_to_keep: max_files_to_keep.max(1),
            current: None,
            records_in_file: 0,
            sequence: 0,
        })
    }

    /// Appends one record, rotating first if the current file is full.
    ///
    /// # Errors
    ///
    /// Returns `Json` if the record cannot be serialized, or `Io` / `Telemetry`
    /// if writing or rotating fails.
    pub fn write<T: Serialize>(&mut self, record: &T) -> Result<()> {
        if self.current.is_none() || self.records_in_file >= self.max_records_per_file {
            self.rotate()?;
        }

        let line = serde_json::to_string(record)?;
        if let Some(writer) = self.current.as_mut() {
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        self.records_in_file += 1;
        Ok(())
    }

    /// Directory the logger writes into.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.current.take() {
            writer.flush()?;
        }

        let name = format!(
            "{}{}_{:04}{}",
            FILE_PREFIX,
            Local::now().format("%Y%m%d_%H%M%S"),
            self.sequence,
            FILE_SUFFIX
        );
        self.sequence = self.sequence.wrapping_add(1);

        let path = self.dir.join(&name);
        let file = File::create(&path)
            .map_err(|e| TelloPadError::Telemetry(format!("Failed to create {}: {}", path.display(), e)))?;
        info!("Writing telemetry to {}", path.display());

        self.current = Some(BufWriter::new(file));
        self.records_in_file = 0;

        self.prune()
    }

    /// Deletes the oldest log files beyond `max_files_to_keep`.
    fn prune(&self) -> Result<()> {
        let mut files = self.log_files()?;
        if files.len() <= self.max_files_to_keep {
            return Ok(());
        }

        files.sort();
        let excess = files.len() - self.max_files_to_keep;
        for path in files.into_iter().take(excess) {
            debug!("Removing old telemetry file {}", path.display());
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    /// Telemetry files currently in the log directory.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the directory cannot be listed.
    pub fn log_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_log = path
                .file_name()
                .map(|n| {
                    let n = n.to_string_lossy();
                    n.starts_with(FILE_PREFIX) && n.ends_with(FILE_SUFFIX)
                })
                .unwrap_or(false);
            if is_log {
                files.push(path);
            }
        }
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn read_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_no_file_until_first_write() {
        let dir = TempDir::new().unwrap();
        let logger = TelemetryLogger::new(dir.path(), 10, 3).unwrap();
        assert!(logger.log_files().unwrap().is_empty());
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let logger = TelemetryLogger::new(&nested, 10, 3).unwrap();
        assert!(nested.is_dir());
        assert_eq!(logger.dir(), nested.as_path());
    }

    #[test]
    fn test_writes_json_lines() {
        let dir = TempDir::new().unwrap();
        let mut logger = TelemetryLogger::new(dir.path(), 10, 3).unwrap();

        logger.write(&json!({"bat": 90})).unwrap();
        logger.write(&json!({"bat": 89})).unwrap();

        let files = logger.log_files().unwrap();
        assert_eq!(files.len(), 1);

        let lines = read_lines(&files[0]);
        assert_eq!(lines, vec![r#"{"bat":90}"#, r#"{"bat":89}"#]);
    }

    #[test]
    fn test_rotates_after_max_records() {
        let dir = TempDir::new().unwrap();
        let mut logger = TelemetryLogger::new(dir.path(), 2, 10).unwrap();

        for i in 0..5 {
            logger.write(&json!({ "n": i })).unwrap();
        }

        let mut files = logger.log_files().unwrap();
        files.sort();
        assert_eq!(files.len(), 3);
        assert_eq!(read_lines(&files[0]).len(), 2);
        assert_eq!(read_lines(&files[1]).len(), 2);
        assert_eq!(read_lines(&files[2]), vec![r#"{"n":4}"#]);
    }

    #[test]
    fn test_keeps_only_newest_files() {
        let dir = TempDir::new().unwrap();
        let mut logger = TelemetryLogger::new(dir.path(), 1, 2).unwrap();

        for i in 0..5 {
            logger.write(&json!({ "n": i })).unwrap();
        }

        let mut files = logger.log_files().unwrap();
        files.sort();
        assert_eq!(files.len(), 2);
        assert_eq!(read_lines(&files[0]), vec![r#"{"n":3}"#]);
        assert_eq!(read_lines(&files[1]), vec![r#"{"n":4}"#]);
    }

    #[test]
    fn test_ignores_foreign_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), "keep me").unwrap();

        let mut logger = TelemetryLogger::new(dir.path(), 1, 1).unwrap();
        logger.write(&json!({})).unwrap();
        logger.write(&json!({})).unwrap();

        assert!(dir.path().join("notes.txt").exists());
        assert_eq!(logger.log_files().unwrap().len(), 1);
    }

    #[test]
    fn test_zero_limits_are_raised_to_one() {
        let dir = TempDir::new().unwrap();
        let mut logger = TelemetryLogger::new(dir.path(), 0, 0).unwrap();
        logger.write(&json!({"n": 1})).unwrap();
        logger.write(&json!({"n": 2})).unwrap();
        assert_eq!(logger.log_files().unwrap().len(), 1);
    }
}
