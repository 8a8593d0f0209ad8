//! JSONL snapshot files
//!
//! One [`ItemRecord`] per line. Reads take a shared lock; writes go to a
//! locked temp file that is then renamed over the original.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;
use log::debug;

use crate::engine::ItemRecord;

/// A JSONL file of item records
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every record in file order; a missing file reads as empty
    pub fn read_all(&self) -> Result<Vec<ItemRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open snapshot: {}", self.path.display()))?;

        file.lock_shared()
            .context("Failed to acquire read lock on snapshot")?;

        let reader = BufReader::new(&file);
        let mut records = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read line {}", line_num + 1))?;

            if line.trim().is_empty() {
                continue;
            }

            let record: ItemRecord = serde_json::from_str(&line).with_context(|| {
                format!(
                    "Failed to parse record at {}:{}",
                    self.path.display(),
                    line_num + 1
                )
            })?;
            records.push(record);
        }

        debug!("Read {} record(s) from {}", records.len(), self.path.display());
        Ok(records)
    }

    /// Replaces the file contents with `records`, in the given order
    pub fn write_all(&self, records: &[ItemRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let temp_path = self.path.with_extension("jsonl.tmp");

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

            file.lock_exclusive()
                .context("Failed to acquire write lock on snapshot")?;

            let mut writer = BufWriter::new(&file);
            for record in records {
                let line = serde_json::to_string(record).context("Failed to serialize record")?;
                writeln!(writer, "{}", line).context("Failed to write record")?;
            }

            writer.flush().context("Failed to flush snapshot")?;
        }

        fs::rename(&temp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                self.path.display()
            )
        })?;

        debug!("Wrote {} record(s) to {}", records.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ItemId, ItemKind, ItemStatus};
    use tempfile::TempDir;

    fn record(id: u32, kind: ItemKind, epic: Option<u32>) -> ItemRecord {
        ItemRecord {
            id: ItemId::new(id).unwrap(),
            kind,
            name: format!("Item {}", id),
            description: String::new(),
            status: ItemStatus::New,
            epic: epic.and_then(ItemId::new),
            start_time: None,
            duration_minutes: None,
        }
    }

    #[test]
    fn read_missing_file() {
        let dir = TempDir::new().unwrap();
        let file = SnapshotFile::new(dir.path().join("items.jsonl"));
        assert!(file.read_all().unwrap().is_empty());
    }

    #[test]
    fn write_and_read_preserves_order() {
        let dir = TempDir::new().unwrap();
        let file = SnapshotFile::new(dir.path().join("items.jsonl"));
        let records = vec![
            record(3, ItemKind::Task, None),
            record(1, ItemKind::Epic, None),
            record(2, ItemKind::Subtask, Some(1)),
        ];

        file.write_all(&records).unwrap();
        assert_eq!(file.read_all().unwrap(), records);
    }

    #[test]
    fn skips_blank_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("items.jsonl");
        fs::write(
            &path,
            "{\"id\":1,\"kind\":\"task\",\"name\":\"Tea\"}\n\n{\"id\":2,\"kind\":\"epic\",\"name\":\"Move\"}\n",
        )
        .unwrap();

        let records = SnapshotFile::new(&path).read_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].kind, ItemKind::Epic);
    }

    #[test]
    fn reports_bad_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("items.jsonl");
        fs::write(&path, "{\"id\":1,\"kind\":\"task\",\"name\":\"Tea\"}\nnot json\n").unwrap();

        let err = SnapshotFile::new(&path).read_all().unwrap_err();
        assert!(format!("{:#}", err).contains(":2"));
    }

    #[test]
    fn creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let file = SnapshotFile::new(dir.path().join("nested").join("items.jsonl"));
        file.write_all(&[record(1, ItemKind::Task, None)]).unwrap();
        assert!(file.path().exists());
    }

    #[test]
    fn atomic_write_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let file = SnapshotFile::new(dir.path().join("items.jsonl"));
        file.write_all(&[record(1, ItemKind::Task, None)]).unwrap();
        file.write_all(&[]).unwrap();

        assert!(!file.path().with_extension("jsonl.tmp").exists());
        assert!(file.read_all().unwrap().is_empty());
    }
}
