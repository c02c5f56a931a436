use std::collections::BTreeMap;

use chrono::NaiveTime;

use crate::{
    core::{day_color::DayColor, direction::Direction, window::TimeWindow},
    quantity::rate::EuroPerKilowattHour,
};

/// Statistic source namespace, the first path segment of every statistic id.
pub const DOMAIN: &str = "linkystat";

/// Tariff price: flat, or indexed by the day's tempo color.
#[derive(Clone, Debug, PartialEq)]
pub enum Price {
    Flat(EuroPerKilowattHour),

    ByDayColor {
        table: BTreeMap<DayColor, EuroPerKilowattHour>,
        fallback: EuroPerKilowattHour,
    },
}

impl Price {
    /// Resolve the rate for the day being priced.
    ///
    /// An unknown or missing day color falls back to the flat rate, never to
    /// an error: the worst case is a zero rate, which only suppresses the
    /// cost series.
    #[must_use]
    pub fn resolve(&self, day_color: Option<DayColor>) -> EuroPerKilowattHour {
        match self {
            Self::Flat(rate) => *rate,
            Self::ByDayColor { table, fallback } => {
                day_color.and_then(|color| table.get(&color).copied()).unwrap_or(*fallback)
            }
        }
    }
}

/// One named statistic series and the windows/price that feed it.
///
/// Windows of different rules may overlap: a reading then counts towards each
/// matching rule independently, which is how "total" and "sub-category"
/// dashboards coexist.
#[derive(Clone, Debug, bon::Builder)]
#[must_use]
pub struct PricingRule {
    pub statistic_id: String,

    pub name: String,

    #[builder(default = vec![TimeWindow::WHOLE_DAY])]
    pub windows: Vec<TimeWindow>,

    pub price: Price,

    /// Backfill rules run the whole pipeline but must not double-update the
    /// live summary alongside the regular refresh rules.
    #[builder(default = true)]
    pub contributes_to_summary: bool,
}

impl PricingRule {
    /// Derive the stable statistic id for a rule.
    #[must_use]
    pub fn statistic_id(usage_point_id: &str, direction: Direction, rule_name: Option<&str>) -> String {
        match rule_name {
            Some(rule_name) => {
                format!("{DOMAIN}:{usage_point_id}_{direction}_{rule_name}").to_lowercase()
            }
            None => format!("{DOMAIN}:{usage_point_id}_{direction}").to_lowercase(),
        }
    }

    #[must_use]
    pub fn matches(&self, time: NaiveTime) -> bool {
        self.windows.iter().any(|window| window.contains(time))
    }
}
