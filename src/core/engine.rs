use std::collections::BTreeMap;

use crate::{
    api::store::StatisticsStore,
    core::{
        aggregator, cost,
        day_color::DayColor,
        merger,
        reading::IntervalReading,
        rule::PricingRule,
        statistic::StatisticsMetadata,
    },
    prelude::*,
    quantity::{cost::Euros, energy::KilowattHours},
};

/// One aggregation pass: a normalized dataset priced against a rule set.
#[derive(bon::Builder)]
#[must_use]
pub struct Run<'a> {
    readings: &'a [IntervalReading],
    rules: &'a [PricingRule],

    /// Today's tempo color, when any rule prices by day color.
    day_color: Option<DayColor>,
}

impl Run<'_> {
    /// Process every rule in a fixed order, isolating per-rule failures.
    ///
    /// Returns the final cumulative total per rule name. A store failure
    /// inside one rule is logged and leaves the other rules untouched; the
    /// failing series simply stays stale until the next cycle.
    pub async fn execute(&self, store: &impl StatisticsStore) -> BTreeMap<String, KilowattHours> {
        let mut summary = BTreeMap::new();
        for rule in self.rules {
            match self.execute_rule(rule, store).await {
                Ok(total) if rule.contributes_to_summary => {
                    summary.insert(rule.name.clone(), total);
                }
                Ok(_) => {}
                Err(error) => {
                    warn!(statistic_id = %rule.statistic_id, "rule failed: {error:#}");
                }
            }
        }
        summary
    }

    #[instrument(skip_all, fields(statistic_id = %rule.statistic_id))]
    async fn execute_rule(
        &self,
        rule: &PricingRule,
        store: &impl StatisticsStore,
    ) -> Result<KilowattHours> {
        let last = store
            .get_last(&rule.statistic_id)
            .await
            .context("failed to read the last persisted statistic")?;
        let last_sum = last.map_or(KilowattHours::ZERO, |last| KilowattHours(last.sum));

        let buckets = aggregator::aggregate(self.readings, rule, last.map(|last| last.start));
        if buckets.is_empty() {
            debug!("no new buckets");
            return Ok(last_sum);
        }

        let records = merger::merge(&buckets, last_sum);
        let total = records.last().map_or(last_sum, |record| KilowattHours(record.sum));
        store
            .append(&StatisticsMetadata::energy(&rule.statistic_id, &rule.name), &records)
            .await
            .context("failed to append the energy series")?;
        info!(n_records = records.len(), total = %total, "appended");

        let rate = rule.price.resolve(self.day_color);
        if rate.is_positive() {
            let metadata = StatisticsMetadata::cost(&rule.statistic_id, &rule.name);
            let last_cost_sum = store
                .get_last(&metadata.statistic_id)
                .await
                .context("failed to read the last persisted cost")?
                .map_or(Euros::ZERO, |last| Euros(last.sum));
            let costs = cost::project(&buckets, rate, last_cost_sum);
            store.append(&metadata, &costs).await.context("failed to append the cost series")?;
        } else {
            // No zero-cost spam records.
            debug!("non-positive rate, skipping the cost series");
        }

        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDate, TimeDelta, Utc};

    use super::*;
    use crate::{
        api::store::{LastStatistic, MemoryStore},
        core::{rule::Price, statistic::StatisticRecord, timestamp::midnight_utc},
        quantity::rate::EuroPerKilowattHour,
    };

    fn half_hour_day(date: NaiveDate) -> Vec<IntervalReading> {
        (1..=48)
            .map(|step| IntervalReading {
                timestamp: midnight_utc(date) + TimeDelta::minutes(30 * step),
                watt_hours: 1000.0,
                interval_hours: 0.5,
            })
            .collect()
    }

    fn default_rule() -> PricingRule {
        PricingRule::builder()
            .statistic_id("linkystat:12345_consumption".to_owned())
            .name("consumption".to_owned())
            .price(Price::Flat(EuroPerKilowattHour(0.15)))
            .build()
    }

    #[tokio::test]
    async fn test_full_day_scenario() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let readings = half_hour_day(date);
        let rules = [default_rule()];
        let store = MemoryStore::default();

        let summary =
            Run::builder().readings(&readings).rules(&rules).build().execute(&store).await;

        assert_relative_eq!(summary["consumption"].0, 24.0);
        let series = store.series();
        let energy = &series["linkystat:12345_consumption"];
        assert_eq!(energy.len(), 1);
        assert_eq!(energy[0].start, midnight_utc(date));
        assert_relative_eq!(energy[0].state, 24.0);
        assert_relative_eq!(energy[0].sum, 24.0);
        let costs = &series["linkystat:12345_consumption_cost"];
        assert_relative_eq!(costs[0].state, 3.6);
        assert_relative_eq!(costs[0].sum, 3.6);
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let readings = half_hour_day(date);
        let rules = [default_rule()];
        let store = MemoryStore::default();

        let run = Run::builder().readings(&readings).rules(&rules).build();
        run.execute(&store).await;
        let summary = run.execute(&store).await;

        // The second pass finds everything inside the dead zone: no new
        // buckets, and the persisted total carries over into the summary.
        assert_relative_eq!(summary["consumption"].0, 24.0);
        assert_eq!(store.series()["linkystat:12345_consumption"].len(), 1);
    }

    #[tokio::test]
    async fn test_backfill_rule_does_not_touch_summary() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let readings = half_hour_day(date);
        let rules = [PricingRule::builder()
            .statistic_id("linkystat:12345_consumption".to_owned())
            .name("consumption".to_owned())
            .price(Price::Flat(EuroPerKilowattHour(0.15)))
            .contributes_to_summary(false)
            .build()];
        let store = MemoryStore::default();

        let summary =
            Run::builder().readings(&readings).rules(&rules).build().execute(&store).await;

        assert!(summary.is_empty());
        assert_eq!(store.series()["linkystat:12345_consumption"].len(), 1);
    }

    #[tokio::test]
    async fn test_tempo_day_pricing() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let readings = half_hour_day(date);
        let rules = [PricingRule::builder()
            .statistic_id("linkystat:12345_consumption_tempo".to_owned())
            .name("tempo".to_owned())
            .price(Price::ByDayColor {
                table: std::collections::BTreeMap::from([(
                    DayColor::Red,
                    EuroPerKilowattHour(0.75),
                )]),
                fallback: EuroPerKilowattHour(0.15),
            })
            .build()];
        let store = MemoryStore::default();

        Run::builder()
            .readings(&readings)
            .rules(&rules)
            .day_color(DayColor::Red)
            .build()
            .execute(&store)
            .await;

        let series = store.series();
        assert_relative_eq!(series["linkystat:12345_consumption_tempo_cost"][0].state, 18.0);
    }

    /// Store that fails `get_last` for one poisoned id, otherwise delegates.
    struct PoisonedStore {
        inner: MemoryStore,
        poisoned_id: &'static str,
    }

    #[async_trait]
    impl StatisticsStore for PoisonedStore {
        async fn get_last(&self, statistic_id: &str) -> Result<Option<LastStatistic>> {
            ensure!(statistic_id != self.poisoned_id, "store is on fire");
            self.inner.get_last(statistic_id).await
        }

        async fn append(
            &self,
            metadata: &StatisticsMetadata,
            records: &[StatisticRecord],
        ) -> Result {
            self.inner.append(metadata, records).await
        }

        async fn query_range(
            &self,
            statistic_id: &str,
            start: DateTime<Utc>,
            end: Option<DateTime<Utc>>,
        ) -> Result<Vec<StatisticRecord>> {
            self.inner.query_range(statistic_id, start, end).await
        }

        async fn clear(&self, statistic_id: &str) -> Result {
            self.inner.clear(statistic_id).await
        }
    }

    #[tokio::test]
    async fn test_failing_rule_does_not_abort_the_rest() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let readings = half_hour_day(date);
        let rules = [
            PricingRule::builder()
                .statistic_id("linkystat:12345_consumption_broken".to_owned())
                .name("broken".to_owned())
                .price(Price::Flat(EuroPerKilowattHour(0.15)))
                .build(),
            default_rule(),
        ];
        let store = PoisonedStore {
            inner: MemoryStore::default(),
            poisoned_id: "linkystat:12345_consumption_broken",
        };

        let summary =
            Run::builder().readings(&readings).rules(&rules).build().execute(&store).await;

        assert!(!summary.contains_key("broken"));
        assert_relative_eq!(summary["consumption"].0, 24.0);
    }
}
