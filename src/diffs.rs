//! Attaches per-file diffs to fetched changes.
//!
//! Failures are isolated: a file whose diff cannot be fetched becomes an
//! error entry, and a change whose file list cannot be fetched keeps an
//! error message and no files. Neither stops the remaining work.

use futures::{StreamExt, stream};
use tracing::{debug, warn};

use crate::{
    gerrit::ReviewHost,
    types::{ChangeInfo, ChangeRecord, FileDiff},
};

/// Gerrit lists pseudo-files such as `/COMMIT_MSG` and `/MERGE_LIST`
/// alongside real paths; they have no diff worth reporting.
pub fn is_magic_file(path: &str) -> bool {
    path.starts_with('/')
}

/// Builds a record for every change, preserving the input order.
///
/// Up to `max_concurrent` changes are processed at once, and within each
/// change up to `max_concurrent` diffs are in flight.
pub async fn aggregate<H>(
    changes: &[ChangeInfo],
    host: &H,
    max_concurrent: usize,
) -> Vec<ChangeRecord>
where
    H: ReviewHost + Sync,
{
    stream::iter(changes)
        .map(|change| collect_change(change, host, max_concurrent))
        .buffered(max_concurrent.max(1))
        .collect()
        .await
}

/// Fetches the file list and diffs of one change's current revision.
pub async fn collect_change<H>(
    change: &ChangeInfo,
    host: &H,
    max_concurrent: usize,
) -> ChangeRecord
where
    H: ReviewHost + Sync,
{
    let mut record = ChangeRecord::from_info(change);

    let Some(revision) = change.current_revision.as_deref() else {
        warn!(change = %change.id, "Change has no current revision");
        record.error = Some("change has no current revision".to_string());
        return record;
    };

    let paths = match host.list_files(change, revision).await {
        Ok(paths) => paths,
        Err(err) => {
            warn!(
                change = %change.id,
                error = %err.diagnostic(),
                "Failed to list changed files"
            );
            record.error = Some(err.diagnostic());
            return record;
        }
    };

    let paths: Vec<String> = paths.into_iter().filter(|p| !is_magic_file(p)).collect();
    if paths.is_empty() {
        debug!(change = %change.id, "Change has no file modifications");
    }

    record.files = stream::iter(paths)
        .map(|path| fetch_file(change, revision, path, host))
        .buffered(max_concurrent.max(1))
        .collect()
        .await;

    record
}

async fn fetch_file<H>(change: &ChangeInfo, revision: &str, path: String, host: &H) -> FileDiff
where
    H: ReviewHost + Sync,
{
    match host.fetch_diff(change, revision, &path).await {
        Ok(diff) => {
            debug!(change = %change.id, %path, "Fetched file diff");
            FileDiff::success(path, diff)
        }
        Err(err) => {
            warn!(
                change = %change.id,
                %path,
                error = %err.diagnostic(),
                "Failed to fetch file diff"
            );
            FileDiff::failure(path, &err)
        }
    }
}
