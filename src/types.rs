use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::FetchError;

pub const DEFAULT_REPOSITORY: &str = "openstack/barbican";
pub const DEFAULT_STATUS: &str = "merged";
pub const DEFAULT_AGE: &str = "1d";
pub const DEFAULT_GERRIT_URL: &str = "https://review.opendev.org";

/// Run parameters, resolved once at startup and passed down by reference.
#[derive(Debug, Clone)]
pub struct Config {
    pub repository: String,
    pub status: String,
    /// Relative age token such as `7d`; ignored when `merged_after` is set.
    pub age: String,
    /// Absolute `YYYY-MM-DD` cutoff overriding `age`.
    pub merged_after: Option<String>,
    /// Build the query but never contact Gerrit.
    pub dry_run: bool,
    pub gerrit_url: Url,
    /// Bound on each HTTP request.
    pub timeout: Duration,
    /// Bound on in-flight requests per fan-out level.
    pub max_concurrent: usize,
    pub log: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repository: DEFAULT_REPOSITORY.to_string(),
            status: DEFAULT_STATUS.to_string(),
            age: DEFAULT_AGE.to_string(),
            merged_after: None,
            dry_run: false,
            gerrit_url: Url::parse(DEFAULT_GERRIT_URL).expect("default Gerrit URL is valid"),
            timeout: Duration::from_secs(30),
            max_concurrent: 4,
            log: false,
        }
    }
}

/// Gerrit account as embedded in change records.
///
/// Every field is optional: Gerrit only fills in what the query options and
/// the account's visibility allow. Absent fields are left out on output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    #[serde(rename = "_account_id", default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// A change as returned by Gerrit's change search endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChangeInfo {
    pub id: String,
    #[serde(rename = "_number", default)]
    pub number: Option<u64>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub owner: Option<AccountInfo>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default)]
    pub submitted: Option<String>,
    #[serde(default)]
    pub current_revision: Option<String>,
}

impl ChangeInfo {
    /// Identifier to use in `/changes/{id}/...` paths, unencoded.
    ///
    /// Prefers the numeric change number. The triplet `id` carries the
    /// project with its slashes already escaped as `%2F`, which is undone
    /// here so the URL builder can encode it exactly once.
    pub fn url_id(&self) -> String {
        match self.number {
            Some(number) => number.to_string(),
            None => self.id.replace("%2F", "/").replace("%2f", "/"),
        }
    }
}

/// Outcome of fetching one file's diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Success,
    Error,
}

/// Diff payload for one file of a change's current revision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileDiff {
    pub path: String,
    pub status: FileStatus,
    /// Gerrit's diff document, a string if the body was not JSON, or null
    /// on failure.
    pub diff: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<u16>,
}

impl FileDiff {
    pub fn success(path: impl Into<String>, diff: serde_json::Value) -> Self {
        Self {
            path: path.into(),
            status: FileStatus::Success,
            diff,
            error: None,
            error_code: None,
        }
    }

    pub fn failure(path: impl Into<String>, err: &FetchError) -> Self {
        Self {
            path: path.into(),
            status: FileStatus::Error,
            diff: serde_json::Value::Null,
            error: Some(err.diagnostic()),
            error_code: err.status_code(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == FileStatus::Success
    }
}

/// A change with its per-file diffs, as emitted in the result document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeRecord {
    pub id: String,
    pub subject: Option<String>,
    pub status: Option<String>,
    pub owner: AccountInfo,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub submitted: Option<String>,
    pub revision_id: Option<String>,
    pub files: Vec<FileDiff>,
    /// Why the file list of this change could not be retrieved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChangeRecord {
    /// Copies the reportable fields of `info`; `files` starts out empty.
    pub fn from_info(info: &ChangeInfo) -> Self {
        Self {
            id: info.id.clone(),
            subject: info.subject.clone(),
            status: info.status.clone(),
            owner: info.owner.clone().unwrap_or_default(),
            created: info.created.clone(),
            updated: info.updated.clone(),
            submitted: info.submitted.clone(),
            revision_id: info.current_revision.clone(),
            files: Vec::new(),
            error: None,
        }
    }
}

/// The single JSON document written to stdout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultDocument {
    pub query: String,
    pub count: usize,
    pub repository: String,
    pub status: String,
    pub merged_after: String,
    pub timestamp: String,
    pub changes: Vec<ChangeRecord>,
}
