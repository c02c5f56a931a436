use std::time::Duration;

use reqwest::{Client, Url};

use crate::prelude::*;

/// Ping the dead-man-switch URL, if any. Failures are logged, never fatal.
#[instrument(skip_all)]
pub async fn send(url: Option<&Url>) {
    let Some(url) = url else { return };
    info!("sending a heartbeat…");
    let result = async {
        Client::builder().timeout(Duration::from_secs(3)).build()?.post(url.clone()).send().await
    }
    .await;
    if let Err(error) = result {
        warn!("failed to send the heartbeat: {error:#}");
    }
}
