use crate::{
    core::{aggregator::DayBuckets, statistic::StatisticRecord, timestamp::midnight_utc},
    quantity::energy::KilowattHours,
};

/// Merge finalized day buckets into the persisted running sum.
///
/// `last_sum` is the last persisted cumulative total for the series, zero for
/// a fresh series. Buckets are walked chronologically, so every emitted
/// record satisfies `sum[i] == sum[i - 1] + state[i]`.
pub fn merge(buckets: &DayBuckets, last_sum: KilowattHours) -> Vec<StatisticRecord> {
    let mut running = last_sum;
    buckets
        .iter()
        .map(|(date, energy)| {
            running += *energy;
            StatisticRecord { start: midnight_utc(*date), state: energy.0, sum: running.0 }
        })
        .collect()
}
