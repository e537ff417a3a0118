//! E2E scenario entry point
//!
//! This file is the test binary that runs the shop scenarios in order.
//! Run with: cargo test --package shoptester-e2e --test e2e -- [OPTIONS]
//!
//! When the shop is not reachable the suite is skipped, unless
//! `SHOPTESTER_REQUIRE_APP=1` or `--require-app` is given.

use std::time::Duration;

use clap::Parser;

use shoptester_e2e::cli::{self, Args};
use shoptester_e2e::{BrowserKind, E2eError, E2eResult, RunnerConfig, ScenarioRunner};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(cli::log_filter())
        .init();

    let args = Args::parse();

    let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
    let result = rt.block_on(async_main(args));

    match result {
        Ok(success) => {
            if success {
                std::process::exit(0);
            } else {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

async fn async_main(args: Args) -> E2eResult<bool> {
    let mut scenarios = ScenarioRunner::select(args.name.as_deref(), args.tag.as_deref());
    scenarios.retain(|s| args.selects(s));

    if args.list {
        for scenario in &scenarios {
            println!("{}: test", scenario.name);
        }
        return Ok(true);
    }
    if scenarios.is_empty() {
        eprintln!("No scenarios selected");
        return Ok(true);
    }

    let mut config = RunnerConfig::from_env()?;

    if let Some(url) = args.base_url {
        config.session.base_url = url;
    }
    if let Some(browser) = args.browser {
        config.session.browser = BrowserKind::from_name(&browser);
    }
    if args.headed {
        config.session.headless = false;
    }
    if let Some(ms) = args.slow_mo {
        config.session.slow_mo_ms = ms;
    }
    config.skip_contract_check = args.skip_contract_check;
    config.session.screenshot_dir = args.output.join("screenshots");
    config.output_dir = args.output;

    let runner = ScenarioRunner::new(config);

    match runner
        .wait_for_target(Duration::from_secs(args.wait_for_app))
        .await
    {
        Ok(()) => {}
        Err(e @ E2eError::TargetUnreachable { .. }) if !args.require_app => {
            eprintln!("Skipping: {}", e);
            return Ok(true);
        }
        Err(e) => return Err(e),
    }

    let results = runner.run_suite(&scenarios).await?;
    runner.write_results(&results)?;

    Ok(results.all_passed())
}
