//! Recorder client: the external statistics store behind a REST API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{
    Client, StatusCode, Url,
    header::{HeaderMap, HeaderValue},
};
use serde::Serialize;

use crate::{
    api::store::{LastStatistic, StatisticsStore},
    core::statistic::{StatisticRecord, StatisticsMetadata},
    prelude::*,
};

pub struct Recorder {
    client: Client,
    base_url: Url,
}

impl Recorder {
    pub fn new(access_token: &str, base_url: Url) -> Result<Self> {
        let headers = HeaderMap::from_iter([(
            reqwest::header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {access_token}"))
                .context("invalid recorder access token")?,
        )]);
        let client = Client::builder()
            .user_agent("linkystat")
            .timeout(Duration::from_secs(15))
            .default_headers(headers)
            .build()?;
        Ok(Self { client, base_url })
    }

    fn statistics_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| anyhow!("invalid base URL"))?;
            path.push("statistics");
            path.extend(segments);
        }
        Ok(url)
    }
}

#[async_trait]
impl StatisticsStore for Recorder {
    #[instrument(skip_all, fields(statistic_id = statistic_id))]
    async fn get_last(&self, statistic_id: &str) -> Result<Option<LastStatistic>> {
        let response = self
            .client
            .get(self.statistics_url(&[statistic_id, "last"])?)
            .send()
            .await
            .context("failed to query the last statistic")?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let last = response
            .error_for_status()
            .context("last-statistic request failed")?
            .json()
            .await
            .context("failed to deserialize the last statistic")?;
        Ok(Some(last))
    }

    #[instrument(skip_all, fields(statistic_id = %metadata.statistic_id, n_records = records.len()))]
    async fn append(
        &self,
        metadata: &StatisticsMetadata,
        records: &[StatisticRecord],
    ) -> Result {
        #[derive(Serialize)]
        struct AppendRequest<'a> {
            metadata: &'a StatisticsMetadata,
            records: &'a [StatisticRecord],
        }

        info!("appending…");
        self.client
            .post(self.statistics_url(&[])?)
            .json(&AppendRequest { metadata, records })
            .send()
            .await
            .context("failed to append the statistics")?
            .error_for_status()
            .context("append request failed")?;
        Ok(())
    }

    #[instrument(skip_all, fields(statistic_id = statistic_id))]
    async fn query_range(
        &self,
        statistic_id: &str,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<StatisticRecord>> {
        let mut url = self.statistics_url(&[statistic_id])?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("start", &start.to_rfc3339());
            if let Some(end) = end {
                query.append_pair("end", &end.to_rfc3339());
            }
        }
        self.client
            .get(url)
            .send()
            .await
            .context("failed to query the statistics")?
            .error_for_status()
            .context("statistics query failed")?
            .json()
            .await
            .context("failed to deserialize the statistics")
    }

    #[instrument(skip_all, fields(statistic_id = statistic_id))]
    async fn clear(&self, statistic_id: &str) -> Result {
        info!("clearing…");
        self.client
            .delete(self.statistics_url(&[statistic_id])?)
            .send()
            .await
            .context("failed to clear the statistics")?
            .error_for_status()
            .context("clear request failed")?;
        Ok(())
    }
}
