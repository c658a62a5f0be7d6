//! gerrit-diffs: recently merged Gerrit changes, with their diffs, as JSON.
//!
//! Resolves a relative age (or an absolute date) into a Gerrit search
//! query, runs it against a Gerrit REST endpoint, fetches the per-file diffs
//! of every matching change and assembles a single JSON document. A dry-run
//! mode builds the query without any network access.

pub mod age;
pub mod cli;
pub mod diffs;
pub mod error;
pub mod gerrit;
pub mod query;
pub mod report;
pub mod search;
pub mod types;

pub use cli::parse_args;
pub use error::{ConfigError, Error, FetchError};
pub use gerrit::{Gerrit, ReviewHost};
pub use query::{fetch_changes, fetch_merged_diffs};
pub use report::to_pretty_json;
pub use types::{
    AccountInfo, ChangeInfo, ChangeRecord, Config, FileDiff, FileStatus, ResultDocument,
};
