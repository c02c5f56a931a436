mod backfill;
mod clear;
mod refresh;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use reqwest::Url;

pub use self::{backfill::backfill, clear::clear, refresh::refresh};
use crate::{
    api::{gateway::Gateway, recorder::Recorder},
    core::direction::Direction,
    prelude::*,
    quantity::rate::EuroPerKilowattHour,
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: fetch the readings, aggregate, and push the statistics to the recorder.
    #[clap(name = "refresh")]
    Refresh(Box<RefreshArgs>),

    /// Reload historical statistics into the hole behind the existing series.
    #[clap(name = "backfill")]
    Backfill(Box<BackfillArgs>),

    /// Remove a statistic series from the recorder.
    #[clap(name = "clear")]
    Clear(ClearArgs),
}

#[derive(Parser)]
pub struct GatewayArgs {
    /// Gateway API access token.
    #[clap(long = "gateway-token", env = "GATEWAY_TOKEN")]
    pub token: String,

    /// Gateway API endpoint.
    #[clap(
        long = "gateway-url",
        env = "GATEWAY_URL",
        default_value = "https://enedisgateway.tech/api"
    )]
    pub api_url: Url,

    /// Metering point identifier (PDL).
    #[clap(long = "usage-point-id", env = "USAGE_POINT_ID")]
    pub usage_point_id: String,
}

impl GatewayArgs {
    pub fn new_client(&self) -> Result<Gateway> {
        Gateway::new(&self.token, self.api_url.clone(), self.usage_point_id.clone())
    }
}

#[derive(Parser)]
pub struct RecorderArgs {
    /// Recorder API access token.
    #[clap(long = "recorder-access-token", env = "RECORDER_ACCESS_TOKEN")]
    pub access_token: Option<String>,

    /// Recorder API base URL. For example: `http://localhost:8123/api`.
    #[clap(long = "recorder-api-base-url", env = "RECORDER_API_BASE_URL")]
    pub base_url: Option<Url>,
}

impl RecorderArgs {
    pub fn new_client(&self) -> Result<Recorder> {
        let access_token =
            self.access_token.as_deref().context("missing the recorder access token")?;
        let base_url = self.base_url.clone().context("missing the recorder base URL")?;
        Recorder::new(access_token, base_url)
    }
}

#[derive(Parser)]
pub struct RefreshArgs {
    #[clap(flatten)]
    pub gateway: GatewayArgs,

    #[clap(flatten)]
    pub recorder: RecorderArgs,

    /// Tariff rules file.
    #[clap(long, env = "TARIFFS_PATH", default_value = "tariffs.toml")]
    pub tariffs: PathBuf,

    /// Aggregate everything, write nothing: print what would be written.
    #[clap(long)]
    pub dry_run: bool,

    #[clap(long = "heartbeat-url", env = "HEARTBEAT_URL")]
    pub heartbeat_url: Option<Url>,
}

#[derive(Parser)]
pub struct BackfillArgs {
    #[clap(flatten)]
    pub gateway: GatewayArgs,

    #[clap(flatten)]
    pub recorder: RecorderArgs,

    /// Power direction to backfill.
    #[clap(long, value_enum)]
    pub direction: Direction,

    /// First day to backfill (inclusive).
    #[clap(long)]
    pub start: NaiveDate,

    /// Last day to backfill; defaults to the earliest record already
    /// persisted, or today for an empty series.
    #[clap(long)]
    pub end: Option<NaiveDate>,

    /// Fetch the half-hourly load curve instead of daily totals.
    #[clap(long)]
    pub detail: bool,

    /// Flat price for the cost series; zero skips it.
    #[clap(long, default_value = "0")]
    pub price: EuroPerKilowattHour,
}

#[derive(Parser)]
pub struct ClearArgs {
    #[clap(flatten)]
    pub recorder: RecorderArgs,

    /// Statistic id to remove, including the `linkystat:` prefix.
    pub statistic_id: String,
}
