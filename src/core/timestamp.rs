use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::prelude::*;

/// Parse a gateway timestamp into a UTC instant.
///
/// Daily services return plain dates (`YYYY-MM-DD`), load curves return
/// `YYYY-MM-DD HH:MM:SS`. Both are interpreted as UTC, never as local time.
pub fn parse_utc(input: &str) -> Result<DateTime<Utc>> {
    if let Ok(timestamp) = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S") {
        return Ok(timestamp.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    DateTime::parse_from_rfc3339(input)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .with_context(|| format!("unrecognized timestamp `{input}`"))
}

/// The statistic period key: the day's local midnight, kept in UTC.
pub fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
