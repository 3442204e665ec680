use tracing::warn;

use crate::{
    stats::aggregate,
    types::{Forge, QuerySpec, StatsReport},
};

/// Fetches pull requests for `spec` from the forge and aggregates the
/// merged ones into a per-login report.
///
/// Nothing is aggregated unless the fetch succeeds in full.
pub async fn collect_stats<F>(spec: &QuerySpec, forge: &F) -> anyhow::Result<StatsReport>
where
    F: Forge + Sync,
{
    let prs = forge.fetch_pull_requests(spec).await?;

    if prs.len() >= spec.limit {
        warn!(
            limit = spec.limit,
            "fetch hit the result limit; older PRs in the window may be missing"
        );
    }

    Ok(aggregate(&spec.excluded, &prs))
}
