use std::collections::BTreeMap;

use chrono::{Days, NaiveDate, Utc};
use itertools::Itertools;

use crate::{
    api::{
        gateway::{Contract, Gateway},
        store::{MemoryStore, StatisticsStore},
    },
    cli::RefreshArgs,
    config::{DirectionConfig, TariffConfig},
    core::{day_color::DayColor, direction::Direction, engine::Run, reading},
    prelude::*,
    quantity::energy::KilowattHours,
    tables,
};

/// One full refresh cycle.
///
/// Concurrent cycles are not mutually excluded here: the scheduler must not
/// overlap invocations.
pub async fn refresh(args: &RefreshArgs) -> Result {
    let config = TariffConfig::read_from(&args.tariffs)?;
    let gateway = args.gateway.new_client()?;

    let summary = if args.dry_run {
        let store = MemoryStore::default();
        let summary = run_cycle(&gateway, &store, &config, &args.gateway.usage_point_id).await;
        println!("{}", tables::build_records_table(&store.series()));
        summary
    } else {
        let recorder = args.recorder.new_client()?;
        run_cycle(&gateway, &recorder, &config, &args.gateway.usage_point_id).await
    };
    println!("{}", tables::build_summary_table(&summary));
    Ok(())
}

async fn run_cycle(
    gateway: &Gateway,
    store: &impl StatisticsStore,
    config: &TariffConfig,
    usage_point_id: &str,
) -> BTreeMap<String, KilowattHours> {
    let contract = match gateway.get_contract().await {
        Ok(contract) => {
            info!(
                subscribed_power = contract.subscribed_power.as_deref().unwrap_or("unknown"),
                offpeak_hours = contract.offpeak_hours.as_deref().unwrap_or("none"),
                last_activation_date =
                    contract.last_activation_date.as_deref().unwrap_or("unknown"),
                "fetched the contract",
            );
            Some(contract)
        }
        Err(error) => {
            warn!("failed to fetch the contract: {error:#}");
            None
        }
    };

    let today = Utc::now().date_naive();
    let needs_tempo = config
        .directions()
        .iter()
        .any(|(_, config)| config.is_some_and(DirectionConfig::needs_tempo));
    let day_color = if needs_tempo { get_day_color(gateway, today).await } else { None };

    let mut summary = BTreeMap::new();
    for (direction, direction_config) in config.directions() {
        let Some(direction_config) = direction_config else {
            continue;
        };
        match run_direction(
            gateway,
            store,
            direction,
            direction_config,
            usage_point_id,
            contract.as_ref(),
            day_color,
        )
        .await
        {
            Ok(direction_summary) => summary.extend(direction_summary),
            // The failed direction keeps its previous statistics and is
            // retried on the next cycle.
            Err(error) => warn!(%direction, "skipped this cycle: {error:#}"),
        }
    }
    summary
}

#[instrument(skip_all, fields(direction = %direction))]
async fn run_direction(
    gateway: &Gateway,
    store: &impl StatisticsStore,
    direction: Direction,
    config: &DirectionConfig,
    usage_point_id: &str,
    contract: Option<&Contract>,
    day_color: Option<DayColor>,
) -> Result<BTreeMap<String, KilowattHours>> {
    let end = Utc::now().date_naive();
    let start = end - Days::new(Direction::fetch_days(config.detail));
    let dataset = gateway.fetch_readings(direction.service(config.detail), start, end).await?;
    let readings = reading::normalize(&dataset);

    let rules = config.build_rules(usage_point_id, direction, contract);
    info!(
        n_readings = readings.len(),
        rules = rules.iter().map(|rule| rule.name.as_str()).join(", "),
        "aggregating…",
    );
    Ok(Run::builder()
        .readings(&readings)
        .rules(&rules)
        .maybe_day_color(day_color)
        .build()
        .execute(store)
        .await)
}

async fn get_day_color(gateway: &Gateway, today: NaiveDate) -> Option<DayColor> {
    match gateway.get_tempo_days(today, today + Days::new(1)).await {
        Ok(days) => {
            let day_color = days.get(&today).copied();
            info!(day_color = %day_color.map_or_else(|| "unpublished".to_owned(), |color| color.to_string()), "tempo");
            day_color
        }
        Err(error) => {
            warn!("failed to fetch the tempo calendar: {error:#}");
            None
        }
    }
}
