use std::time::Duration;

use anyhow::Result;
use clap::{
    Parser,
    builder::{BoolishValueParser, RangedU64ValueParser},
};
use url::Url;

use crate::{
    error::ConfigError,
    types::{Config, DEFAULT_AGE, DEFAULT_GERRIT_URL, DEFAULT_REPOSITORY, DEFAULT_STATUS},
};

const BUILD_INFO_HUMAN: &str = env!("BUILD_INFO_HUMAN");

#[derive(Parser, Debug)]
#[command(
    name = "gerrit-diffs",
    about = "Query a Gerrit instance for recently merged changes and print them, with per-file diffs, as JSON"
)]
#[command(long_version = BUILD_INFO_HUMAN)]
struct CliArgs {
    /// Repository to search, as 'org/name'
    #[arg(
        short = 'r',
        long = "repo",
        env = "OPENDEV_REPO_NAME",
        default_value = DEFAULT_REPOSITORY,
        value_name = "ORG/NAME"
    )]
    pub repo: String,

    /// Gerrit change status to match (merged, open, abandoned, ...)
    #[arg(short = 's', long, env = "OPENDEV_STATUS", default_value = DEFAULT_STATUS)]
    pub status: String,

    /// Only changes merged within this age (e.g. 12h, 7d, 2w)
    #[arg(short = 'a', long, env = "OPENDEV_AGE", default_value = DEFAULT_AGE)]
    pub age: String,

    /// Only changes merged after this date; overrides --age
    #[arg(
        short = 'm',
        long = "merged-after",
        env = "OPENDEV_MERGED_AFTER",
        value_name = "YYYY-MM-DD"
    )]
    pub merged_after: Option<String>,

    /// Build and print the query without contacting Gerrit
    #[arg(
        short = 'n',
        long = "dry-run",
        env = "OPENDEV_DRY_RUN",
        value_parser = BoolishValueParser::new()
    )]
    pub dry_run: bool,

    /// Base URL of the Gerrit instance
    #[arg(
        long = "gerrit-url",
        env = "OPENDEV_GERRIT_URL",
        default_value = DEFAULT_GERRIT_URL,
        value_name = "URL"
    )]
    pub gerrit_url: String,

    /// Timeout for each HTTP request
    #[arg(
        long,
        env = "OPENDEV_TIMEOUT",
        default_value = "30",
        value_name = "SECONDS",
        value_parser = RangedU64ValueParser::<u64>::new().range(1..)
    )]
    pub timeout: u64,

    /// Maximum number of concurrent requests per change or file batch
    #[arg(
        long = "max-concurrent",
        env = "OPENDEV_MAX_CONCURRENT",
        default_value = "4",
        value_name = "NUM",
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub max_concurrent: usize,

    /// Log progress and diagnostics to stderr
    #[arg(long, env = "OPENDEV_LOG", value_parser = BoolishValueParser::new())]
    pub log: bool,
}

fn parse_gerrit_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("not a base URL".to_string()));
    }

    Ok(url)
}

fn create_config(cli: CliArgs) -> Result<Config> {
    Ok(Config {
        repository: cli.repo.trim().to_string(),
        status: cli.status.trim().to_string(),
        age: cli.age,
        merged_after: cli.merged_after,
        dry_run: cli.dry_run,
        gerrit_url: parse_gerrit_url(&cli.gerrit_url)?,
        timeout: Duration::from_secs(cli.timeout),
        max_concurrent: cli.max_concurrent,
        log: cli.log,
    })
}

/// Parses command-line arguments, falling back to `OPENDEV_*` environment
/// variables and then to defaults, into a run configuration.
///
/// Clap errors (including `--help` and `--version`) are returned as
/// `clap::Error` inside the `anyhow::Error` so the caller can pick the exit
/// code.
pub fn parse_args<I, T>(args: I) -> Result<Config>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = CliArgs::try_parse_from(args)?;
    create_config(cli)
}

#[cfg(test)]
mod tests {
    use super::*;

    // These tests only pass explicit flags for values that matter, so a
    // developer's OPENDEV_* environment cannot change their outcome.

    #[test]
    fn explicit_flags_populate_config() {
        let config = parse_args([
            "gerrit-diffs",
            "--repo",
            " openstack/nova ",
            "--status",
            "open",
            "--age",
            "7d",
            "--merged-after",
            "2025-08-29",
            "--dry-run",
            "--gerrit-url",
            "https://gerrit.example.org/r/",
            "--timeout",
            "5",
            "--max-concurrent",
            "2",
        ])
        .unwrap();

        assert_eq!(config.repository, "openstack/nova");
        assert_eq!(config.status, "open");
        assert_eq!(config.age, "7d");
        assert_eq!(config.merged_after.as_deref(), Some("2025-08-29"));
        assert!(config.dry_run);
        assert_eq!(config.gerrit_url.as_str(), "https://gerrit.example.org/r/");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_concurrent, 2);
    }

    #[test]
    fn rejects_non_http_gerrit_url() {
        let err = parse_args(["gerrit-diffs", "--gerrit-url", "ftp://review.example.org"])
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::InvalidUrl { .. })
        ));

        assert!(parse_args(["gerrit-diffs", "--gerrit-url", "not a url"]).is_err());
    }

    #[test]
    fn rejects_zero_timeout_and_concurrency() {
        for args in [
            ["gerrit-diffs", "--timeout", "0"],
            ["gerrit-diffs", "--max-concurrent", "0"],
        ] {
            let err = parse_args(args).unwrap_err();
            assert!(err.downcast_ref::<clap::Error>().is_some());
        }
    }
}
