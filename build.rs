//! Build script for gerrit-diffs - embeds a human-readable version string.
//!
//! The string shown by `--version` is assembled from:
//!
//! 1. `CARGO_PKG_VERSION`.
//! 2. `git describe --tags --always --dirty` when building from a checkout.
//!    A bare commit hash (no tags yet) is rendered as
//!    `v{CARGO_PKG_VERSION}-{commit-timestamp}-{commit}`.
//! 3. `rustc --version`.
//!
//! Components that cannot be determined (no git, tarball builds) are left out.

use std::{env, process::Command};

use chrono::{DateTime, Utc};

fn main() {
    ["src", "build.rs", "Cargo.toml"]
        .iter()
        .for_each(|path| println!("cargo:rerun-if-changed={path}"));

    println!("cargo:rustc-env=BUILD_INFO_HUMAN={}", build_info());
}

fn command_stdout(program: &str, args: &[&str]) -> Option<String> {
    Command::new(program)
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn commit_timestamp() -> String {
    command_stdout("git", &["log", "-1", "--format=%ct"])
        .and_then(|s| s.parse::<i64>().ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or_else(Utc::now)
        .format("%Y%m%d%H%M%S")
        .to_string()
}

fn git_version() -> Option<String> {
    let desc = command_stdout("git", &["describe", "--tags", "--always", "--dirty"])?;
    if desc.contains('v') || desc.contains("-g") {
        return Some(desc);
    }

    // No tags: describe printed only the (possibly dirty) short hash.
    let version = env!("CARGO_PKG_VERSION");
    Some(format!("v{version}-{}-{desc}", commit_timestamp()))
}

fn build_info() -> String {
    [
        Some(env!("CARGO_PKG_VERSION").to_string()),
        git_version().map(|v| format!("({v})")),
        command_stdout("rustc", &["--version"]),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ")
}
