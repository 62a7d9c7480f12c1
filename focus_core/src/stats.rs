//! Monthly aggregate statistics.

use crate::{MonthlyTotals, SessionRecord};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// Storage key for the month containing `date`, e.g. `2024-03`
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Count one finished run toward its month
pub fn record_month(monthly: &mut BTreeMap<String, MonthlyTotals>, record: &SessionRecord) {
    let key = month_key(record.completed_at.date_naive());
    let totals = monthly.entry(key).or_default();
    totals.sessions = totals.sessions.saturating_add(1);
    totals.total_seconds = totals.total_seconds.saturating_add(record.total_seconds);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordKind;
    use chrono::{Local, TimeZone};
    use uuid::Uuid;

    fn record(month: u32, total_seconds: u64) -> SessionRecord {
        SessionRecord {
            id: Uuid::new_v4(),
            kind: RecordKind::Interval,
            name: "Interval".into(),
            total_seconds,
            details: String::new(),
            completed_at: Local.with_ymd_and_hms(2024, month, 15, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_month_key_zero_pads() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(month_key(date), "2024-03");
    }

    #[test]
    fn test_records_grouped_by_month() {
        let mut monthly = BTreeMap::new();
        record_month(&mut monthly, &record(3, 600));
        record_month(&mut monthly, &record(3, 900));
        record_month(&mut monthly, &record(4, 60));

        assert_eq!(monthly["2024-03"].sessions, 2);
        assert_eq!(monthly["2024-03"].total_seconds, 1500);
        assert_eq!(monthly["2024-04"].sessions, 1);
    }
}
