//! [Enedis Gateway](https://enedisgateway.tech) client.

use std::{collections::BTreeMap, time::Duration};

use chrono::{NaiveDate, NaiveTime};
use reqwest::{
    Client, Url,
    header::{HeaderMap, HeaderValue},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_with::serde_as;

use crate::{
    core::{day_color::DayColor, window::TimeWindow},
    prelude::*,
};

pub struct Gateway {
    client: Client,
    api_url: Url,
    usage_point_id: String,
}

impl Gateway {
    pub fn new(token: &str, api_url: Url, usage_point_id: String) -> Result<Self> {
        let headers = HeaderMap::from_iter([(
            reqwest::header::AUTHORIZATION,
            HeaderValue::from_str(token).context("invalid gateway token")?,
        )]);
        let client = Client::builder()
            .user_agent("linkystat")
            .timeout(Duration::from_secs(30))
            .default_headers(headers)
            .build()?;
        Ok(Self { client, api_url, usage_point_id })
    }

    /// Fetch one dataset of interval readings.
    ///
    /// `service` is one of the `daily_*`/`*_load_curve` gateway services, see
    /// [`Direction::service`][crate::core::direction::Direction::service].
    #[instrument(skip_all, fields(service = service))]
    pub async fn fetch_readings(
        &self,
        service: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawReading>> {
        info!(%start, %end, "fetching…");
        let response: MeterReadingResponse = self
            .post(&Payload {
                service,
                usage_point_id: &self.usage_point_id,
                start: Some(start),
                end: Some(end),
            })
            .await
            .with_context(|| format!("failed to fetch `{service}`"))?;
        info!(n_readings = response.meter_reading.interval_reading.len(), "fetched");
        Ok(response.meter_reading.interval_reading)
    }

    /// Fetch the contract attached to the configured usage point.
    #[instrument(skip_all)]
    pub async fn get_contract(&self) -> Result<Contract> {
        let response: ContractsResponse = self
            .post(&Payload {
                service: "contracts",
                usage_point_id: &self.usage_point_id,
                start: None,
                end: None,
            })
            .await
            .context("failed to fetch the contracts")?;
        response
            .customer
            .usage_points
            .into_iter()
            .find(|entry| entry.usage_point.usage_point_id == self.usage_point_id)
            .map(|entry| entry.contracts)
            .with_context(|| format!("no contract for usage point `{}`", self.usage_point_id))
    }

    /// Fetch published tempo day colors, keyed by date.
    #[instrument(skip_all)]
    pub async fn get_tempo_days(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, DayColor>> {
        self.post(&Payload {
            service: "rte_tempo",
            usage_point_id: &self.usage_point_id,
            start: Some(start),
            end: Some(end),
        })
        .await
        .context("failed to fetch the tempo calendar")
    }

    async fn post<R: DeserializeOwned>(&self, payload: &Payload<'_>) -> Result<R> {
        self.client
            .post(self.api_url.clone())
            .json(payload)
            .send()
            .await
            .context("failed to call the gateway")?
            .error_for_status()
            .context("gateway request failed")?
            .json::<GatewayResponse<R>>()
            .await
            .context("failed to deserialize the gateway response")?
            .into_result()
    }
}

#[derive(Serialize)]
struct Payload<'a> {
    #[serde(rename = "type")]
    service: &'a str,

    usage_point_id: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    start: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    end: Option<NaiveDate>,
}

/// Generic gateway response.
///
/// The gateway reports failures in the body: either an `error`/`description`
/// pair or a `tag` such as `limit_reached` when Enedis throttles us.
#[derive(Deserialize)]
#[serde(untagged)]
enum GatewayResponse<R> {
    Success(R),
    Failure(GatewayFailure),
}

#[derive(Deserialize)]
struct GatewayFailure {
    #[serde(default)]
    tag: Option<String>,

    #[serde(default)]
    description: Option<String>,
}

impl<R> GatewayResponse<R> {
    fn into_result(self) -> Result<R> {
        match self {
            Self::Success(result) => Ok(result),
            Self::Failure(failure) => {
                let description =
                    failure.description.unwrap_or_else(|| "no description".to_owned());
                match failure.tag {
                    Some(tag) => bail!(r#"the gateway refused the request ({tag}): "{description}""#),
                    None => bail!(r#"gateway error: "{description}""#),
                }
            }
        }
    }
}

#[must_use]
#[derive(Debug, Deserialize)]
pub struct MeterReadingResponse {
    pub meter_reading: MeterReading,
}

#[must_use]
#[serde_as]
#[derive(Debug, Deserialize)]
pub struct MeterReading {
    #[serde_as(as = "serde_with::VecSkipError<_>")]
    pub interval_reading: Vec<RawReading>,
}

/// One reading as the gateway ships it: everything is a string.
#[derive(Clone, Debug, Deserialize)]
#[must_use]
pub struct RawReading {
    pub value: String,

    pub date: String,

    #[serde(default)]
    pub interval_length: Option<String>,
}

#[derive(Deserialize)]
struct ContractsResponse {
    customer: Customer,
}

#[derive(Deserialize)]
struct Customer {
    usage_points: Vec<UsagePointEntry>,
}

#[derive(Deserialize)]
struct UsagePointEntry {
    usage_point: UsagePoint,
    contracts: Contract,
}

#[derive(Deserialize)]
struct UsagePoint {
    usage_point_id: String,
}

#[must_use]
#[derive(Clone, Debug, Deserialize)]
pub struct Contract {
    #[serde(default)]
    pub subscribed_power: Option<String>,

    /// Offpeak notation, for example: `HC (22H00-6H00)`.
    #[serde(default)]
    pub offpeak_hours: Option<String>,

    #[serde(default)]
    pub last_activation_date: Option<String>,
}

impl Contract {
    /// Parse the offpeak notation into clock-time windows.
    ///
    /// A pair crossing midnight, like `22H00-6H00`, becomes two windows:
    /// `TimeWindow::contains` never wraps except at an exact-midnight end.
    /// Unparseable segments are dropped silently: the notation varies by
    /// distributor and a missed window only means the readings fall through
    /// to whatever other rules the operator configured.
    pub fn offpeak_windows(&self) -> Vec<TimeWindow> {
        let mut windows = Vec::new();
        for segment in self.offpeak_hours.as_deref().unwrap_or_default().split(['(', ')', ';', ' '])
        {
            let Some((start, end)) = segment.split_once('-') else { continue };
            let (Some(start), Some(end)) = (parse_offpeak_time(start), parse_offpeak_time(end))
            else {
                continue;
            };
            if start < end || end == NaiveTime::MIN {
                windows.push(TimeWindow::new(start, end));
            } else {
                windows.push(TimeWindow::new(start, NaiveTime::MIN));
                windows.push(TimeWindow::new(NaiveTime::MIN, end));
            }
        }
        windows
    }
}

/// Parse a `22H00`-style clock time.
fn parse_offpeak_time(input: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(input, "%HH%M").ok()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use super::*;

    #[test]
    fn test_deserialize_meter_reading_ok() -> Result {
        // language=JSON
        const RESPONSE: &str = r#"
            {
                "meter_reading": {
                    "usage_point_id": "12345678901234",
                    "interval_reading": [
                        {"value": "540", "date": "2024-03-01 10:00:00", "interval_length": "PT30M", "measure_type": "B"},
                        {"value": "1260", "date": "2024-03-01 10:30:00", "interval_length": "PT30M", "measure_type": "B"},
                        {"date": "2024-03-01 11:00:00"}
                    ]
                }
            }
        "#;
        let response: GatewayResponse<MeterReadingResponse> = serde_json::from_str(RESPONSE)?;
        let readings = response.into_result()?.meter_reading.interval_reading;
        // The entry without a value is skipped, not fatal.
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].value, "540");
        assert_eq!(readings[0].interval_length.as_deref(), Some("PT30M"));
        Ok(())
    }

    #[test]
    fn test_deserialize_rate_limit_failure() -> Result {
        // language=JSON
        const RESPONSE: &str = r#"
            {"tag": "limit_reached", "description": "50 requests per day"}
        "#;
        let response: GatewayResponse<MeterReadingResponse> = serde_json::from_str(RESPONSE)?;
        let error = response.into_result().unwrap_err();
        assert!(error.to_string().contains("limit_reached"));
        Ok(())
    }

    #[test]
    fn test_deserialize_tempo_days() -> Result {
        // language=JSON
        const RESPONSE: &str = r#"{"2024-03-01": "blue", "2024-03-02": "RED"}"#;
        let response: GatewayResponse<BTreeMap<NaiveDate, DayColor>> =
            serde_json::from_str(RESPONSE)?;
        let days = response.into_result()?;
        assert_eq!(days[&NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()], DayColor::Red);
        Ok(())
    }

    #[test]
    fn test_offpeak_windows() {
        let contract = Contract {
            subscribed_power: None,
            offpeak_hours: Some("HC (22H00-6H00;12H30-14H00)".to_owned()),
            last_activation_date: None,
        };
        let windows = contract.offpeak_windows();
        // The midnight-crossing pair is split in two.
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].start, NaiveTime::from_hms_opt(22, 0, 0).unwrap());
        assert_eq!(windows[0].end, NaiveTime::MIN);
        assert_eq!(windows[1].start, NaiveTime::MIN);
        assert_eq!(windows[1].end, NaiveTime::from_hms_opt(6, 0, 0).unwrap());
        assert_eq!(windows[2].start, NaiveTime::from_hms_opt(12, 30, 0).unwrap());
        assert_eq!(windows[2].end, NaiveTime::from_hms_opt(14, 0, 0).unwrap());
    }

    #[test]
    fn test_offpeak_windows_cover_the_wraparound() {
        let contract = Contract {
            subscribed_power: None,
            offpeak_hours: Some("HC (22H00-6H00)".to_owned()),
            last_activation_date: None,
        };
        let windows = contract.offpeak_windows();
        // 16 of the day's 48 half-hour samples fall into 22:00–06:00.
        let matched = (0..48)
            .map(|step| NaiveTime::from_hms_opt(step / 2, (step % 2) * 30, 0).unwrap())
            .filter(|time| windows.iter().any(|window| window.contains(*time)))
            .count();
        assert_eq!(matched, 16);
    }

    #[test]
    fn test_offpeak_windows_empty() {
        let contract =
            Contract { subscribed_power: None, offpeak_hours: None, last_activation_date: None };
        assert!(contract.offpeak_windows().is_empty());
    }
}
