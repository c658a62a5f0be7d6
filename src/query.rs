use chrono::{DateTime, Utc};
use tracing::debug;

use crate::{
    age::resolve_merged_after,
    diffs,
    error::{Error, FetchError},
    gerrit::ReviewHost,
    report,
    search::build_query,
    types::{ChangeInfo, Config, ResultDocument},
};

/// Runs the whole pipeline: resolve the cutoff date, build the query,
/// fetch matching changes, attach per-file diffs and assemble the document.
///
/// `now` is the reference instant for relative ages. Configuration errors
/// are reported before the host is contacted; a failed change query aborts
/// the run, while per-file failures end up inside the document.
pub async fn fetch_merged_diffs<H>(
    config: &Config,
    host: &H,
    now: DateTime<Utc>,
) -> Result<ResultDocument, Error>
where
    H: ReviewHost + Sync,
{
    let merged_after = resolve_merged_after(&config.age, config.merged_after.as_deref(), now)?;
    let query = build_query(&config.status, &config.repository, &merged_after)?;
    debug!(%query, "Searching for changes");

    let changes = fetch_changes(config, &query, host).await?;
    let records = diffs::aggregate(&changes, host, config.max_concurrent).await;

    Ok(report::assemble(query, config, merged_after, records))
}

/// Executes `query` against the host, or returns nothing in dry-run mode
/// without touching the host at all.
pub async fn fetch_changes<H>(
    config: &Config,
    query: &str,
    host: &H,
) -> Result<Vec<ChangeInfo>, FetchError>
where
    H: ReviewHost + Sync,
{
    if config.dry_run {
        debug!("Dry run: skipping change query");
        return Ok(Vec::new());
    }

    let changes = host.query_changes(query).await?;
    debug!(count = changes.len(), "Found matching changes");
    Ok(changes)
}
