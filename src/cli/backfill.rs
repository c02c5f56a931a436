use chrono::{NaiveDate, Utc};

use crate::{
    api::store::StatisticsStore,
    cli::BackfillArgs,
    core::{
        aggregator, cost, merger,
        reading,
        rule::{Price, PricingRule},
        statistic::{StatisticRecord, StatisticsMetadata},
        timestamp::midnight_utc,
    },
    prelude::*,
    quantity::{cost::Euros, energy::KilowattHours},
};

/// Reload history into the hole behind the existing series.
///
/// The fetch is bounded by the earliest record already persisted, so the
/// regular refresh and the backfill never fight over the same days. Because
/// everything written here predates the existing series, the dead-zone guard
/// does not apply and the running sums are seeded at zero; the recorder is
/// expected to shift the later sums on its side, as it does for any
/// out-of-order import.
pub async fn backfill(args: &BackfillArgs) -> Result {
    let gateway = args.gateway.new_client()?;
    let recorder = args.recorder.new_client()?;
    let statistic_id =
        PricingRule::statistic_id(&args.gateway.usage_point_id, args.direction, None);

    let existing =
        recorder.query_range(&statistic_id, midnight_utc(args.start), None).await?;
    let end = bounded_end(&existing, args.end, Utc::now().date_naive());
    ensure!(args.start < end, "nothing to backfill: the series already starts at {end}");
    info!(%statistic_id, start = %args.start, %end, "backfilling…");

    let dataset =
        gateway.fetch_readings(args.direction.service(args.detail), args.start, end).await?;
    let readings = reading::normalize(&dataset);

    let rule = PricingRule::builder()
        .statistic_id(statistic_id)
        .name(args.direction.to_string())
        .price(Price::Flat(args.price))
        .contributes_to_summary(false)
        .build();
    let buckets = aggregator::aggregate(&readings, &rule, None);
    if buckets.is_empty() {
        info!("nothing to backfill");
        return Ok(());
    }

    let records = merger::merge(&buckets, KilowattHours::ZERO);
    recorder
        .append(&StatisticsMetadata::energy(&rule.statistic_id, &rule.name), &records)
        .await?;
    if args.price.is_positive() {
        let costs = cost::project(&buckets, args.price, Euros::ZERO);
        recorder.append(&StatisticsMetadata::cost(&rule.statistic_id, &rule.name), &costs).await?;
    }
    info!(n_records = records.len(), "backfilled");
    Ok(())
}

/// The earliest record already persisted bounds the fetch, so the backfill
/// never rewrites days the regular refresh owns.
fn bounded_end(
    existing: &[StatisticRecord],
    requested: Option<NaiveDate>,
    today: NaiveDate,
) -> NaiveDate {
    existing
        .first()
        .map_or_else(|| requested.unwrap_or(today), |record| record.start.date_naive())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn day(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn test_bounded_by_earliest_existing_record() {
        let existing =
            [StatisticRecord { start: midnight_utc(day(10)), state: 1.0, sum: 1.0 }];
        // The requested end is ignored once the series exists.
        assert_eq!(bounded_end(&existing, Some(day(14)), day(15)), day(10));
    }

    #[test]
    fn test_empty_series_uses_requested_end() {
        assert_eq!(bounded_end(&[], Some(day(12)), day(15)), day(12));
    }

    #[test]
    fn test_empty_series_defaults_to_today() {
        assert_eq!(bounded_end(&[], None, day(15)), day(15));
    }
}
