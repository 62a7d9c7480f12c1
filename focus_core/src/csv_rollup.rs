//! CSV archive of the session log.
//!
//! Rolling up moves every record from the JSONL log into `sessions.csv` and
//! renames the log so it is never read twice.

use crate::{RecordKind, Result, SessionRecord};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::Path;

/// A row in the CSV archive
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct CsvRow {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: RecordKind,
    pub name: String,
    pub total_seconds: u64,
    pub details: String,
    pub completed_at: String,
}

impl From<&SessionRecord> for CsvRow {
    fn from(record: &SessionRecord) -> Self {
        CsvRow {
            id: record.id.to_string(),
            kind: record.kind,
            name: record.name.clone(),
            total_seconds: record.total_seconds,
            details: record.details.clone(),
            completed_at: record.completed_at.to_rfc3339(),
        }
    }
}

/// Roll up the session log into CSV and archive the log
///
/// This function:
/// 1. Reads all records from the log
/// 2. Appends them to the CSV file (creates with headers if needed)
/// 3. Syncs the CSV to disk
/// 4. Renames the log to `.processed`
/// 5. Returns the number of records archived
pub fn log_to_csv_and_archive(log_path: &Path, csv_path: &Path) -> Result<usize> {
    let records = crate::session_log::read_log(log_path)?;

    if records.is_empty() {
        tracing::info!("No records in session log to roll up");
        return Ok(0);
    }

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    // Only a fresh file gets a header row
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    for record in &records {
        writer.serialize(CsvRow::from(record))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!("Wrote {} records to CSV", records.len());

    let mut processed = log_path.as_os_str().to_owned();
    processed.push(".processed");
    std::fs::rename(log_path, &processed)?;

    tracing::info!("Archived session log to {:?}", processed);

    Ok(records.len())
}

/// Remove every `.processed` log left in `dir` by previous rollups
pub fn cleanup_processed_logs(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();

        if path.extension().is_some_and(|ext| ext == "processed") {
            std::fs::remove_file(&path)?;
            tracing::debug!("Removed processed log: {:?}", path);
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} processed logs", count);
    }

    Ok(count)
}
