use chrono::NaiveTime;
use serde::Deserialize;

/// Daily clock-time window during which a tariff applies.
///
/// The start bound is exclusive and the end bound inclusive, so back-to-back
/// windows hand a boundary sample to exactly one side. A window ending at
/// midnight additionally captures the midnight sample itself, which the meter
/// emits as the closing reading of the previous day.
#[derive(Copy, Clone, Debug, Deserialize, Eq, PartialEq)]
#[must_use]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    /// `00:00:00..00:00:00`, matching every sample of the day.
    pub const WHOLE_DAY: Self = Self { start: NaiveTime::MIN, end: NaiveTime::MIN };

    pub const fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn contains(self, time: NaiveTime) -> bool {
        if time > self.start && time <= self.end {
            return true;
        }
        self.end == NaiveTime::MIN && (time > self.start || time == NaiveTime::MIN)
    }
}
