//! travis-enable - enable Travis CI builds for one or more repositories
//!
//! Resolves each `owner/name` slug to its Travis repository id and activates
//! the build hook, optionally syncing the account with GitHub first. The
//! resulting report is printed to stdout as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::{info, Level};

use travis_enable::{init_tracing, EnableOptions, EnableReport, Enabler, DEFAULT_CONCURRENCY};

#[derive(Parser, Debug)]
#[command(name = "travis-enable")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Enable Travis CI builds for one or more repositories", long_about = None)]
struct Cli {
    /// Repository slugs (owner/name)
    #[arg(required = true, value_name = "SLUG")]
    repos: Vec<String>,

    /// Travis CI access token
    #[arg(long, env = "TRAVIS_TOKEN", hide_env_values = true)]
    token: String,

    /// Endpoint hostname (e.g. api.travis-ci.com)
    #[arg(long, env = "TRAVIS_HOSTNAME")]
    hostname: Option<String>,

    /// User agent string
    #[arg(long, env = "TRAVIS_USERAGENT")]
    useragent: Option<String>,

    /// Sync Travis CI with GitHub before enabling builds
    #[arg(long)]
    sync: bool,

    /// Maximum number of enable requests in flight
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn options(&self) -> EnableOptions {
        let mut options = EnableOptions::new(&self.token)
            .with_sync(self.sync)
            .with_concurrency(self.concurrency);
        if let Some(hostname) = &self.hostname {
            options = options.with_hostname(hostname);
        }
        if let Some(useragent) = &self.useragent {
            options = options.with_useragent(useragent);
        }
        options
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    let enabler = Enabler::new(cli.options()).context("Invalid options")?;
    let report = enabler
        .enable(&cli.repos)
        .await
        .context("Failed to enable builds")?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    summarize(&report);

    Ok(ExitCode::from(exit_status(&report)))
}

fn summarize(report: &EnableReport) {
    let meta = report.meta();
    info!(
        total = meta.total,
        success = meta.success,
        failure = meta.failure,
        "Enabled builds for {} of {} repositories",
        meta.success,
        meta.total
    );
}

/// Non-zero when any repository ended up in `failures`.
fn exit_status(report: &EnableReport) -> u8 {
    if report.all_enabled() {
        0
    } else {
        1
    }
}
