use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::rule::DOMAIN;

/// One statistics row in the external recorder's shape.
#[derive(Copy, Clone, Debug, Deserialize, PartialEq, Serialize)]
#[must_use]
pub struct StatisticRecord {
    pub start: DateTime<Utc>,

    /// The period's own delta.
    pub state: f64,

    /// Running total since the series began.
    pub sum: f64,
}

/// Series metadata sent along with the first append.
#[derive(Clone, Debug, Serialize)]
#[must_use]
pub struct StatisticsMetadata {
    pub statistic_id: String,
    pub name: String,
    pub source: &'static str,
    pub unit_of_measurement: &'static str,
    pub has_sum: bool,
    pub has_mean: bool,
}

impl StatisticsMetadata {
    pub fn energy(statistic_id: &str, name: &str) -> Self {
        Self {
            statistic_id: statistic_id.to_owned(),
            name: name.to_owned(),
            source: DOMAIN,
            unit_of_measurement: "kWh",
            has_sum: true,
            has_mean: false,
        }
    }

    /// The cost series runs parallel to its energy series under `{id}_cost`.
    pub fn cost(statistic_id: &str, name: &str) -> Self {
        Self {
            statistic_id: format!("{statistic_id}_cost"),
            name: format!("{name}_cost"),
            source: DOMAIN,
            unit_of_measurement: "EUR",
            has_sum: true,
            has_mean: false,
        }
    }
}
