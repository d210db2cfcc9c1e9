//! Rotating JSONL writer for burst records.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, warn};

use super::types::BurstRecord;
use crate::config::TelemetryConfig;
use crate::error::Result;

const FILE_PREFIX: &str = "bursts_";
const FILE_EXTENSION: &str = "jsonl";

/// Writes one JSON object per line, rotating files by record count
#[derive(Debug)]
pub struct BurstLogger {
    dir: PathBuf,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    writer: Option<BufWriter<File>>,
    records_in_file: usize,
    files_opened: u64,
}

impl BurstLogger {
    /// Create a logger writing under `dir`, creating it if needed
    pub fn new<P: AsRef<Path>>(dir: P, max_records_per_file: usize, max_files_to_keep: usize) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        Ok(Self {
            dir,
            max_records_per_file: max_records_per_file.max(1),
            max_files_to_keep: max_files_to_keep.max(1),
            writer: None,
            records_in_file: 0,
            files_opened: 0,
        })
    }

    pub fn from_config(config: &TelemetryConfig) -> Result<Self> {
        Self::new(&config.log_dir, config.max_records_per_file, config.max_files_to_keep)
    }

    /// Append a record, rotating first if the current file is full
    pub fn log(&mut self, record: &BurstRecord) -> Result<()> {
        if self.writer.is_none() || self.records_in_file >= self.max_records_per_file {
            self.rotate()?;
        }

        let line = serde_json::to_string(record)?;
        if let Some(writer) = self.writer.as_mut() {
            writeln!(writer, "{}", line)?;
            writer.flush()?;
        }
        self.records_in_file += 1;

        Ok(())
    }

    /// Log files currently on disk, oldest first
    pub fn log_files(&self) -> Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_burst_log(path))
            .collect();
        files.sort();
        Ok(files)
    }

    fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }

        self.files_opened += 1;
        let name = format!(
            "{}{}_{:04}.{}",
            FILE_PREFIX,
            Utc::now().format("%Y%m%d_%H%M%S"),
            self.files_opened,
            FILE_EXTENSION
        );
        let path = self.dir.join(name);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!("Opened burst log {}", path.display());

        self.writer = Some(BufWriter::new(file));
        self.records_in_file = 0;
        self.prune()
    }

    fn prune(&self) -> Result<()> {
        let files = self.log_files()?;
        let excess = files.len().saturating_sub(self.max_files_to_keep);

        for path in files.iter().take(excess) {
            if let Err(e) = fs::remove_file(path) {
                warn!("Failed to remove old burst log {}: {}", path.display(), e);
            }
        }

        Ok(())
    }
}

fn is_burst_log(path: &Path) -> bool {
    let name_ok = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(FILE_PREFIX));
    let ext_ok = path.extension().and_then(|e| e.to_str()) == Some(FILE_EXTENSION);
    name_ok && ext_ok
}
