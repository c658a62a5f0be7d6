use chrono::{DateTime, SecondsFormat, Utc};

use crate::types::{ChangeRecord, Config, ResultDocument};

/// Assembles the result document, stamped with the current time.
pub fn assemble(
    query: String,
    config: &Config,
    merged_after: String,
    changes: Vec<ChangeRecord>,
) -> ResultDocument {
    assemble_at(query, config, merged_after, changes, Utc::now())
}

/// Assembles the result document with an explicit generation time.
///
/// `count` is always the length of `changes`.
pub fn assemble_at(
    query: String,
    config: &Config,
    merged_after: String,
    changes: Vec<ChangeRecord>,
    generated_at: DateTime<Utc>,
) -> ResultDocument {
    ResultDocument {
        query,
        count: changes.len(),
        repository: config.repository.clone(),
        status: config.status.clone(),
        merged_after,
        timestamp: generated_at.to_rfc3339_opts(SecondsFormat::Micros, true),
        changes,
    }
}

/// Renders the document as the pretty-printed JSON written to stdout.
pub fn to_pretty_json(document: &ResultDocument) -> serde_json::Result<String> {
    serde_json::to_string_pretty(document)
}
