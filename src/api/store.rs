use std::{
    collections::BTreeMap,
    sync::{Mutex, PoisonError},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{
    core::statistic::{StatisticRecord, StatisticsMetadata},
    prelude::*,
};

/// Last persisted row of a statistic series.
#[derive(Copy, Clone, Debug, Deserialize)]
#[must_use]
pub struct LastStatistic {
    pub start: DateTime<Utc>,
    pub sum: f64,
}

/// External time-series statistics store.
///
/// [`append`][Self::append] has upsert semantics on `(statistic_id, start)`,
/// which is what makes re-running the engine against the same dataset safe.
#[async_trait]
pub trait StatisticsStore: Sync {
    async fn get_last(&self, statistic_id: &str) -> Result<Option<LastStatistic>>;

    async fn append(
        &self,
        metadata: &StatisticsMetadata,
        records: &[StatisticRecord],
    ) -> Result;

    async fn query_range(
        &self,
        statistic_id: &str,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<StatisticRecord>>;

    async fn clear(&self, statistic_id: &str) -> Result;
}

/// In-process store backing `--dry-run` and the tests.
#[derive(Default)]
pub struct MemoryStore(Mutex<BTreeMap<String, BTreeMap<DateTime<Utc>, StatisticRecord>>>);

impl MemoryStore {
    /// Snapshot of every series, for rendering what a dry run would write.
    pub fn series(&self) -> BTreeMap<String, Vec<StatisticRecord>> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(statistic_id, records)| {
                (statistic_id.clone(), records.values().copied().collect())
            })
            .collect()
    }
}

#[async_trait]
impl StatisticsStore for MemoryStore {
    async fn get_last(&self, statistic_id: &str) -> Result<Option<LastStatistic>> {
        Ok(self
            .0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(statistic_id)
            .and_then(|records| records.values().next_back())
            .map(|record| LastStatistic { start: record.start, sum: record.sum }))
    }

    async fn append(
        &self,
        metadata: &StatisticsMetadata,
        records: &[StatisticRecord],
    ) -> Result {
        let mut series = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        let series = series.entry(metadata.statistic_id.clone()).or_default();
        for record in records {
            series.insert(record.start, *record);
        }
        Ok(())
    }

    async fn query_range(
        &self,
        statistic_id: &str,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<StatisticRecord>> {
        Ok(self
            .0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(statistic_id)
            .map(|records| {
                records
                    .values()
                    .filter(|record| {
                        record.start >= start && end.is_none_or(|end| record.start < end)
                    })
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn clear(&self, statistic_id: &str) -> Result {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).remove(statistic_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;
    use crate::core::timestamp::parse_utc;

    #[tokio::test]
    async fn test_append_is_upsert() -> Result {
        let store = MemoryStore::default();
        let metadata = StatisticsMetadata::energy("linkystat:test", "test");
        let start = parse_utc("2024-03-01")?;
        store
            .append(&metadata, &[StatisticRecord { start, state: 1.0, sum: 1.0 }])
            .await?;
        store
            .append(&metadata, &[StatisticRecord { start, state: 2.0, sum: 2.0 }])
            .await?;
        let last = store.get_last("linkystat:test").await?.unwrap();
        assert_eq!(last.sum, 2.0);
        assert_eq!(store.query_range("linkystat:test", start, None).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_last_picks_latest_start() -> Result {
        let store = MemoryStore::default();
        let metadata = StatisticsMetadata::energy("linkystat:test", "test");
        let start = parse_utc("2024-03-01")?;
        store
            .append(
                &metadata,
                &[
                    StatisticRecord { start, state: 1.0, sum: 1.0 },
                    StatisticRecord { start: start + TimeDelta::days(1), state: 2.0, sum: 3.0 },
                ],
            )
            .await?;
        let last = store.get_last("linkystat:test").await?.unwrap();
        assert_eq!(last.start, start + TimeDelta::days(1));
        assert_eq!(last.sum, 3.0);
        Ok(())
    }
}
