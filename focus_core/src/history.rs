//! Recent session history.
//!
//! Combines the live session log with the CSV archive and returns the most
//! recent records, newest first.

use crate::csv_rollup::CsvRow;
use crate::{Error, Result, SessionRecord};
use chrono::{DateTime, Local};
use csv::ReaderBuilder;
use std::collections::HashSet;
use std::path::Path;
use uuid::Uuid;

impl TryFrom<CsvRow> for SessionRecord {
    type Error = Error;

    fn try_from(row: CsvRow) -> Result<Self> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| Error::Other(format!("Invalid UUID: {}", e)))?;

        let completed_at = DateTime::parse_from_rfc3339(&row.completed_at)
            .map_err(|e| Error::Other(format!("Invalid date: {}", e)))?
            .with_timezone(&Local);

        Ok(SessionRecord {
            id,
            kind: row.kind,
            name: row.name,
            total_seconds: row.total_seconds,
            details: row.details,
            completed_at,
        })
    }
}

/// Load at most `limit` records from the log and the archive
///
/// Records present in both are returned once. Sorted by completion time,
/// newest first.
pub fn load_recent_records(
    log_path: &Path,
    csv_path: &Path,
    limit: usize,
) -> Result<Vec<SessionRecord>> {
    let mut records = Vec::new();
    let mut seen_ids = HashSet::new();

    for record in crate::session_log::read_log(log_path)? {
        if seen_ids.insert(record.id) {
            records.push(record);
        }
    }
    tracing::debug!("Loaded {} records from session log", records.len());

    if csv_path.exists() {
        let mut csv_count = 0;
        for record in load_records_from_csv(csv_path)? {
            if seen_ids.insert(record.id) {
                records.push(record);
                csv_count += 1;
            }
        }
        tracing::debug!("Loaded {} records from CSV archive", csv_count);
    }

    records.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
    records.truncate(limit);

    Ok(records)
}

fn load_records_from_csv(path: &Path) -> Result<Vec<SessionRecord>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut records = Vec::new();
    for result in reader.deserialize::<CsvRow>() {
        match result.map_err(Error::from).and_then(SessionRecord::try_from) {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!("Skipping archived row: {}", e),
        }
    }

    Ok(records)
}
