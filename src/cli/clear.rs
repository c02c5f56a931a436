use crate::{api::store::StatisticsStore, cli::ClearArgs, core::rule::DOMAIN, prelude::*};

/// Remove one statistic series, refusing anything outside our namespace.
pub async fn clear(args: &ClearArgs) -> Result {
    ensure!(
        args.statistic_id.starts_with(&format!("{DOMAIN}:")),
        "refusing to clear `{}`: outside the `{DOMAIN}:` namespace",
        args.statistic_id,
    );
    args.recorder.new_client()?.clear(&args.statistic_id).await
}
