//! Error types for the query pipeline.
//!
//! Configuration problems and change-query failures are fatal and surface
//! as `Err`. Per-file diff failures never show up here: they are recorded
//! inline in the [`FileDiff`](crate::FileDiff) they belong to.

/// Invalid or missing filter input, detected before any network activity.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid age '{0}': expected <number><unit> with unit d, h or w (e.g. 7d)")]
    InvalidAge(String),

    #[error("age '{0}' is out of range")]
    AgeOutOfRange(String),

    #[error("invalid merged-after date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("invalid Gerrit URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// A request against the Gerrit REST endpoint failed.
///
/// The HTTP status and response body are kept for diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest_middleware::Error,
    },

    #[error("HTTP {status} from {url}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("undecodable response from {url}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// HTTP status code, when the endpoint answered with a non-success one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The message followed by every underlying cause, `: `-separated.
    ///
    /// Used where the error is stored as data rather than reported through
    /// an error chain.
    pub fn diagnostic(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}

/// Fatal pipeline failure.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}
