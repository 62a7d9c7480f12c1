//! Bounded session history on disk.
//!
//! Finished runs are kept as JSON lines, newest last. The log holds at most
//! `keep` records: once it is full, each new record pushes the oldest one
//! out. Every writer takes an exclusive lock on the log itself and rewrites
//! it in place, so concurrent runs never interleave or lose lines.

use crate::{Result, SessionRecord};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Destination for finished session records
pub trait SessionSink {
    fn append(&mut self, record: &SessionRecord) -> Result<()>;
}

/// The on-disk history of finished runs
pub struct SessionLog {
    path: PathBuf,
    keep: usize,
}

impl SessionLog {
    /// A log at `path` holding the `keep` most recent records (at least one)
    pub fn new(path: impl Into<PathBuf>, keep: usize) -> Self {
        Self {
            path: path.into(),
            keep: keep.max(1),
        }
    }

    fn open_locked(&self) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)?;
        file.lock_exclusive()?;
        Ok(file)
    }
}

impl SessionSink for SessionLog {
    fn append(&mut self, record: &SessionRecord) -> Result<()> {
        let mut file = self.open_locked()?;
        let result = write_bounded(&mut file, record, self.keep);
        file.unlock()?;
        result
    }
}

fn write_bounded(file: &mut File, record: &SessionRecord, keep: usize) -> Result<()> {
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    let new_line = serde_json::to_string(record)?;

    let existing: Vec<&str> = contents.lines().filter(|line| parse_line(line).is_some()).collect();

    if existing.len() < keep {
        // Room left: append, closing off any torn final line first
        file.seek(SeekFrom::End(0))?;
        if !contents.is_empty() && !contents.ends_with('\n') {
            file.write_all(b"\n")?;
        }
        writeln!(file, "{}", new_line)?;
    } else {
        let dropped = existing.len() + 1 - keep;
        let mut rewritten = String::with_capacity(contents.len());
        for line in &existing[dropped..] {
            rewritten.push_str(line);
            rewritten.push('\n');
        }
        rewritten.push_str(&new_line);
        rewritten.push('\n');

        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(rewritten.as_bytes())?;
        tracing::debug!("Session log full, dropped {} oldest record(s)", dropped);
    }

    file.sync_data()?;
    tracing::debug!("Logged record {}", record.id);
    Ok(())
}

fn parse_line(line: &str) -> Option<SessionRecord> {
    if line.trim().is_empty() {
        return None;
    }
    serde_json::from_str(line).ok()
}

/// Every readable record in the log at `path`, oldest first
///
/// A missing log reads as empty. Lines that do not parse are skipped.
pub fn read_log(path: &Path) -> Result<Vec<SessionRecord>> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    file.lock_shared()?;
    let mut contents = String::new();
    let read = file.read_to_string(&mut contents);
    file.unlock()?;
    read?;

    let mut records = Vec::new();
    for (index, line) in contents.lines().enumerate() {
        match parse_line(line) {
            Some(record) => records.push(record),
            None if line.trim().is_empty() => {}
            None => tracing::warn!("Skipping unreadable log line {}", index + 1),
        }
    }
    Ok(records)
}
