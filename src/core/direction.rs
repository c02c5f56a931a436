use serde::Deserialize;

/// Power direction at the metering point.
#[derive(
    Copy, Clone, Debug, Deserialize, Eq, PartialEq, clap::ValueEnum, derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[display("consumption")]
    Consumption,

    #[display("production")]
    Production,
}

impl Direction {
    /// Gateway service name for the requested granularity.
    ///
    /// Load curves only reach back about a week, daily totals a full year.
    #[must_use]
    pub const fn service(self, detail: bool) -> &'static str {
        match (self, detail) {
            (Self::Consumption, false) => "daily_consumption",
            (Self::Consumption, true) => "consumption_load_curve",
            (Self::Production, false) => "daily_production",
            (Self::Production, true) => "production_load_curve",
        }
    }

    /// How far back to fetch for the given granularity.
    #[must_use]
    pub const fn fetch_days(detail: bool) -> u64 {
        if detail { 6 } else { 365 }
    }
}
