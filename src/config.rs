use std::{collections::BTreeMap, path::Path};

use serde::Deserialize;

use crate::{
    api::gateway::Contract,
    core::{
        day_color::DayColor,
        direction::Direction,
        rule::{Price, PricingRule},
        window::TimeWindow,
    },
    prelude::*,
    quantity::rate::EuroPerKilowattHour,
};

/// Tariff configuration, one optional section per power direction.
#[derive(Debug, Default, Deserialize)]
#[must_use]
pub struct TariffConfig {
    pub consumption: Option<DirectionConfig>,
    pub production: Option<DirectionConfig>,
}

impl TariffConfig {
    pub fn read_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read `{}`", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("failed to parse `{}`", path.display()))
    }

    pub fn directions(&self) -> [(Direction, Option<&DirectionConfig>); 2] {
        [
            (Direction::Consumption, self.consumption.as_ref()),
            (Direction::Production, self.production.as_ref()),
        ]
    }
}

#[derive(Debug, Deserialize)]
#[must_use]
pub struct DirectionConfig {
    /// Flat price, also the fallback for tariffs without one of their own.
    pub price: EuroPerKilowattHour,

    /// Fetch the half-hourly load curve instead of daily totals.
    #[serde(default)]
    pub detail: bool,

    #[serde(default)]
    pub tariffs: Vec<TariffEntry>,
}

/// One operator-defined tariff: a named statistic plus the windows it covers.
#[derive(Debug, Deserialize)]
#[must_use]
pub struct TariffEntry {
    pub name: String,

    pub price: Option<EuroPerKilowattHour>,

    /// Tempo price table, keyed by day color.
    #[serde(default)]
    pub tempo: BTreeMap<DayColor, EuroPerKilowattHour>,

    #[serde(default)]
    pub windows: Vec<TimeWindow>,

    /// Take the windows from the contract's offpeak notation instead.
    #[serde(default)]
    pub contract_offpeak: bool,
}

impl DirectionConfig {
    /// Build the rule set for one direction.
    ///
    /// Without operator tariffs this is a single whole-day rule at the flat
    /// price, named after the direction itself.
    pub fn build_rules(
        &self,
        usage_point_id: &str,
        direction: Direction,
        contract: Option<&Contract>,
    ) -> Vec<PricingRule> {
        if self.tariffs.is_empty() {
            return vec![
                PricingRule::builder()
                    .statistic_id(PricingRule::statistic_id(usage_point_id, direction, None))
                    .name(direction.to_string())
                    .price(Price::Flat(self.price))
                    .build(),
            ];
        }
        self.tariffs
            .iter()
            .map(|tariff| {
                let fallback = tariff.price.unwrap_or(self.price);
                let price = if tariff.tempo.is_empty() {
                    Price::Flat(fallback)
                } else {
                    Price::ByDayColor { table: tariff.tempo.clone(), fallback }
                };
                let builder = PricingRule::builder()
                    .statistic_id(PricingRule::statistic_id(
                        usage_point_id,
                        direction,
                        Some(&tariff.name),
                    ))
                    .name(tariff.name.clone())
                    .price(price);
                let windows = if tariff.contract_offpeak {
                    let windows =
                        contract.map(Contract::offpeak_windows).unwrap_or_default();
                    if windows.is_empty() {
                        warn!(
                            name = %tariff.name,
                            "the contract carries no offpeak windows, the tariff will match nothing",
                        );
                    }
                    windows
                } else {
                    tariff.windows.clone()
                };
                if windows.is_empty() && !tariff.contract_offpeak {
                    // Whole-day default.
                    builder.build()
                } else {
                    builder.windows(windows).build()
                }
            })
            .collect()
    }

    /// Whether running this direction requires today's tempo color.
    #[must_use]
    pub fn needs_tempo(&self) -> bool {
        self.tariffs.iter().any(|tariff| !tariff.tempo.is_empty())
    }
}
