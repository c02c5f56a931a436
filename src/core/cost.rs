use crate::{
    core::{aggregator::DayBuckets, statistic::StatisticRecord, timestamp::midnight_utc},
    quantity::{cost::Euros, rate::EuroPerKilowattHour},
};

/// Project an energy bucket series into its parallel cost series.
///
/// Each bucket is priced at the resolved rate and rounded to cents before it
/// enters the running sum, so the stored states always add up to the stored
/// sum exactly. The caller skips this entirely for non-positive rates.
pub fn project(
    buckets: &DayBuckets,
    rate: EuroPerKilowattHour,
    last_sum: Euros,
) -> Vec<StatisticRecord> {
    let mut running = last_sum;
    buckets
        .iter()
        .map(|(date, energy)| {
            let cost = (*energy * rate).rounded();
            running += cost;
            StatisticRecord { start: midnight_utc(*date), state: cost.0, sum: running.0 }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    use super::*;
    use crate::quantity::energy::KilowattHours;

    #[test]
    fn test_pricing_and_rounding() {
        let buckets = DayBuckets::from([(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            KilowattHours(24.0),
        )]);
        let records = project(&buckets, EuroPerKilowattHour(0.15), Euros::ZERO);
        assert_eq!(records.len(), 1);
        assert_relative_eq!(records[0].state, 3.6);
        assert_relative_eq!(records[0].sum, 3.6);
    }

    #[test]
    fn test_seeded_cost_sum() {
        let buckets = DayBuckets::from([
            (NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), KilowattHours(10.0)),
            (NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(), KilowattHours(20.0)),
        ]);
        let records = project(&buckets, EuroPerKilowattHour(0.2068), Euros(5.0));
        assert_relative_eq!(records[0].state, 2.07);
        assert_relative_eq!(records[0].sum, 7.07);
        assert_relative_eq!(records[1].state, 4.14);
        assert_relative_eq!(records[1].sum, 11.21);
    }
}
