//! Command line of the scenario binary
//!
//! `cargo test` forwards libtest flags to every test target, including this
//! `harness = false` one, so the common ones are accepted and mostly ignored.

use std::path::PathBuf;

use clap::builder::FalseyValueParser;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::scenarios::Scenario;

/// Log level used when `RUST_LOG` is unset or empty
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Parser, Debug)]
#[command(name = "shoptester-e2e")]
#[command(about = "End-to-end scenarios for the shop")]
pub struct Args {
    /// Run only scenarios whose name contains this text
    pub filter: Option<String>,

    /// Run only the scenario with this exact name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Run only scenarios with this tag
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Address of the shop under test
    #[arg(long)]
    pub base_url: Option<String>,

    /// Browser to use (chromium, firefox, webkit)
    #[arg(long)]
    pub browser: Option<String>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Delay between browser actions, in milliseconds
    #[arg(long)]
    pub slow_mo: Option<u64>,

    /// Seconds to wait for the shop to answer before skipping
    #[arg(long, default_value = "5")]
    pub wait_for_app: u64,

    /// Fail instead of skipping when the shop is unreachable
    #[arg(long, env = "SHOPTESTER_REQUIRE_APP", value_parser = FalseyValueParser::new())]
    pub require_app: bool,

    /// Skip the live selector contract check
    #[arg(long)]
    pub skip_contract_check: bool,

    /// Output directory for results
    #[arg(short, long, default_value = "test-results")]
    pub output: PathBuf,

    /// Match the filter against whole scenario names
    #[arg(long, hide = true)]
    pub exact: bool,

    /// Skip scenarios whose name contains this text
    #[arg(long, hide = true)]
    pub skip: Vec<String>,

    /// List the selected scenarios instead of running them
    #[arg(long, hide = true)]
    pub list: bool,

    // Accepted for libtest compatibility; no effect here
    #[arg(long, hide = true)]
    pub nocapture: bool,
    #[arg(long, hide = true)]
    pub show_output: bool,
    #[arg(long, hide = true)]
    pub test_threads: Option<usize>,
    #[arg(long, hide = true)]
    pub ignored: bool,
    #[arg(long, hide = true)]
    pub include_ignored: bool,
    #[arg(short, long, hide = true)]
    pub quiet: bool,
    #[arg(long, hide = true)]
    pub format: Option<String>,
    #[arg(long, hide = true)]
    pub color: Option<String>,
}

impl Args {
    /// Whether the positional filter and `--skip` patterns keep `scenario`
    pub fn selects(&self, scenario: &Scenario) -> bool {
        let kept = match &self.filter {
            Some(filter) if self.exact => scenario.name == filter.as_str(),
            Some(filter) => scenario.name.contains(filter.as_str()),
            None => true,
        };
        kept && !self.skip.iter().any(|s| scenario.name.contains(s.as_str()))
    }
}

/// `RUST_LOG` when it is set, `info` otherwise
pub fn log_filter() -> EnvFilter {
    log_filter_from(std::env::var(EnvFilter::DEFAULT_ENV).ok())
}

fn log_filter_from(directives: Option<String>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}
