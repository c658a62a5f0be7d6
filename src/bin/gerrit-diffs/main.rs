use std::io::Write;

use anyhow::Context;
use chrono::Utc;
use gerrit_diffs::{Gerrit, fetch_merged_diffs, parse_args, to_pretty_json};

fn handle_clap_help_version(clap_err: &clap::Error) -> ! {
    use clap::error::ErrorKind;
    match clap_err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            print!("{clap_err}");
            std::process::exit(0);
        }
        _ => {
            eprint!("{clap_err}");
            std::process::exit(2);
        }
    }
}

/// Logs go to stderr so stdout carries nothing but the JSON document.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let default_directives = if verbose {
        "gerrit_diffs=debug,warn"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match parse_args(std::env::args_os()) {
        Ok(config) => config,
        Err(err) => {
            if let Some(clap_err) = err.downcast_ref::<clap::Error>() {
                handle_clap_help_version(clap_err);
            } else {
                return Err(err);
            }
        }
    };

    init_tracing(config.log);

    let gerrit = Gerrit::new(config.gerrit_url.clone(), config.timeout)
        .context("Failed to create HTTP client")?;
    let document = fetch_merged_diffs(&config, &gerrit, Utc::now()).await?;

    let json = to_pretty_json(&document).context("Failed to serialize result document")?;
    writeln!(std::io::stdout().lock(), "{json}")?;

    Ok(())
}
