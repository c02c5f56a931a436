mod api;
mod cli;
mod config;
mod core;
mod prelude;
mod quantity;
mod tables;

use clap::{Parser, crate_version};

use crate::{
    api::heartbeat,
    cli::{Args, Command},
    prelude::*,
};

#[tokio::main]
async fn main() -> Result {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().without_time().compact().init();
    info!(version = crate_version!(), "starting…");

    let args = Args::parse();
    match args.command {
        Command::Refresh(args) => {
            cli::refresh(&args).await?;
            heartbeat::send(args.heartbeat_url.as_ref()).await;
        }
        Command::Backfill(args) => cli::backfill(&args).await?,
        Command::Clear(args) => cli::clear(&args).await?,
    }

    info!("done!");
    Ok(())
}
