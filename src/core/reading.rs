use chrono::{DateTime, Utc};

use crate::{api::gateway::RawReading, core::timestamp, prelude::*, quantity::energy::KilowattHours};

/// One normalized meter sample.
#[derive(Copy, Clone, Debug, PartialEq)]
#[must_use]
pub struct IntervalReading {
    pub timestamp: DateTime<Utc>,

    /// Raw energy delta in watt-hours.
    pub watt_hours: f64,

    /// Nominal sampling interval as a fraction of an hour.
    ///
    /// Half-hourly load-curve samples carry `PT30M` and weigh `0.5`, so they
    /// are not double-counted against the hourly default.
    pub interval_hours: f64,
}

impl IntervalReading {
    /// Interval-weighted energy in kilowatt-hours.
    ///
    /// The Wh→kWh division happens here, at accumulation time, to keep the
    /// raw integer values untouched for as long as possible.
    pub fn effective_energy(&self) -> KilowattHours {
        KilowattHours::from_watt_hours(self.watt_hours * self.interval_hours)
    }
}

/// Normalize a raw gateway dataset, preserving the source order.
///
/// The gateway returns readings in ascending chronological order and the
/// aggregation relies on that; this function does not re-sort. Records with
/// an unparseable value or date are skipped, never fatal.
pub fn normalize(dataset: &[RawReading]) -> Vec<IntervalReading> {
    dataset
        .iter()
        .filter_map(|raw| {
            let Ok(watt_hours) = raw.value.parse::<f64>() else {
                debug!(value = %raw.value, "skipping a reading with an unparseable value");
                return None;
            };
            let timestamp = match timestamp::parse_utc(&raw.date) {
                Ok(timestamp) => timestamp,
                Err(error) => {
                    debug!(date = %raw.date, "skipping a reading: {error:#}");
                    return None;
                }
            };
            Some(IntervalReading {
                timestamp,
                watt_hours,
                interval_hours: interval_hours(raw.interval_length.as_deref()),
            })
        })
        .collect()
}

/// Parse an `PT{minutes}M` duration tag into a fraction of an hour.
///
/// Anything else, including a missing tag, means the default hourly cadence.
fn interval_hours(tag: Option<&str>) -> f64 {
    tag.and_then(|tag| tag.strip_prefix("PT")?.strip_suffix('M')?.parse::<u32>().ok())
        .map_or(1.0, |minutes| f64::from(minutes) / 60.0)
}
