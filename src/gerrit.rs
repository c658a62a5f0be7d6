use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use tracing::debug;
use url::Url;

use crate::{error::FetchError, types::ChangeInfo};

/// Gerrit prepends this to every JSON response to defeat XSSI.
pub const XSSI_PREFIX: &str = ")]}'";

/// Query options asking Gerrit for the current revision and full owner
/// details of each change.
const CHANGE_OPTIONS: [&str; 2] = ["CURRENT_REVISION", "DETAILED_ACCOUNTS"];

/// The REST operations the pipeline needs from a Gerrit-compatible host.
#[async_trait]
pub trait ReviewHost {
    /// Runs a change search and returns the matching changes as listed.
    async fn query_changes(&self, query: &str) -> Result<Vec<ChangeInfo>, FetchError>;

    /// Lists the paths touched by `revision` of `change`, including Gerrit's
    /// magic files such as `/COMMIT_MSG`.
    async fn list_files(
        &self,
        change: &ChangeInfo,
        revision: &str,
    ) -> Result<Vec<String>, FetchError>;

    /// Fetches the diff of one file in `revision` of `change`.
    async fn fetch_diff(
        &self,
        change: &ChangeInfo,
        revision: &str,
        path: &str,
    ) -> Result<serde_json::Value, FetchError>;
}

/// HTTP client for a Gerrit REST endpoint.
///
/// Every request is bounded by the configured timeout; transient failures
/// are retried with exponential backoff before being reported.
pub struct Gerrit {
    client: ClientWithMiddleware,
    base_url: Url,
}

impl Gerrit {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let base_client = reqwest::Client::builder()
            .user_agent(concat!("gerrit-diffs/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;

        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(Duration::from_millis(100), Duration::from_secs(5))
            .build_with_max_retries(3);

        let client = ClientBuilder::new(base_client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Only fails for cannot-be-a-base URLs, which config parsing rejects.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get(&self, url: Url) -> Result<String, FetchError> {
        debug!(%url, "GET");

        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source: source.into(),
            })?;

        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        Ok(body)
    }

    async fn get_json<T>(&self, url: Url) -> Result<T, FetchError>
    where
        T: serde::de::DeserializeOwned,
    {
        let body = self.get(url.clone()).await?;
        serde_json::from_str(strip_xssi_prefix(&body)).map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl ReviewHost for Gerrit {
    async fn query_changes(&self, query: &str) -> Result<Vec<ChangeInfo>, FetchError> {
        let mut url = self.endpoint(&["changes", ""]);
        {
            let mut params = url.query_pairs_mut();
            params.append_pair("q", query);
            for option in CHANGE_OPTIONS {
                params.append_pair("o", option);
            }
        }
        self.get_json(url).await
    }

    async fn list_files(
        &self,
        change: &ChangeInfo,
        revision: &str,
    ) -> Result<Vec<String>, FetchError> {
        let change_id = change.url_id();
        let url = self.endpoint(&["changes", &change_id, "revisions", revision, "files", ""]);
        // `preserve_order` keeps the map in the order Gerrit listed the files.
        let files: serde_json::Map<String, serde_json::Value> = self.get_json(url).await?;
        Ok(files.into_iter().map(|(path, _)| path).collect())
    }

    async fn fetch_diff(
        &self,
        change: &ChangeInfo,
        revision: &str,
        path: &str,
    ) -> Result<serde_json::Value, FetchError> {
        let change_id = change.url_id();
        let url = self.endpoint(&[
            "changes",
            &change_id,
            "revisions",
            revision,
            "files",
            path,
            "diff",
        ]);
        let body = self.get(url).await?;
        let body = strip_xssi_prefix(&body);

        // Some endpoints answer with plain text; keep it rather than fail.
        Ok(serde_json::from_str(body)
            .unwrap_or_else(|_| serde_json::Value::String(body.to_string())))
    }
}

/// Removes Gerrit's `)]}'` guard line, if present.
pub fn strip_xssi_prefix(body: &str) -> &str {
    body.strip_prefix(XSSI_PREFIX).unwrap_or(body)
}
