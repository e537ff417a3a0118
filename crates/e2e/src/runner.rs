//! Main scenario runner: target probe, contract check, sequential scenarios

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::{Accounts, SessionConfig};
use crate::contract::{self, SelectorContract};
use crate::error::{E2eError, E2eResult};
use crate::playwright::PlaywrightDriver;
use crate::scenarios::Scenario;
use crate::session::SessionContext;

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub failed_step: Option<String>,
    pub error: Option<String>,
    pub screenshot_path: Option<PathBuf>,
}

/// Result of running a suite of scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

impl SuiteResult {
    pub fn from_results(
        started_at: DateTime<Utc>,
        duration_ms: u64,
        results: Vec<ScenarioResult>,
    ) -> Self {
        let passed = results.iter().filter(|r| r.success).count();
        Self {
            started_at,
            finished_at: Utc::now(),
            total: results.len(),
            passed,
            failed: results.len() - passed,
            duration_ms,
            results,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Configuration for the scenario runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub session: SessionConfig,
    pub accounts: Accounts,
    pub contract: SelectorContract,
    pub output_dir: PathBuf,

    /// Skip the live contract check before the first scenario
    pub skip_contract_check: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            accounts: Accounts::default(),
            contract: SelectorContract::default(),
            output_dir: PathBuf::from("test-results"),
            skip_contract_check: false,
        }
    }
}

impl RunnerConfig {
    /// Defaults with environment overrides for session, accounts and contract
    pub fn from_env() -> E2eResult<Self> {
        Ok(Self {
            session: SessionConfig::from_env(),
            accounts: Accounts::from_env(),
            contract: SelectorContract::from_env()?,
            ..Default::default()
        })
    }
}

/// Runs scenarios one after another, each in a fresh session.
///
/// Scenarios share one application instance and its visible state, so they
/// are never run concurrently.
pub struct ScenarioRunner {
    config: RunnerConfig,
}

impl ScenarioRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Scenarios matching an exact name and/or a tag
    pub fn select(name: Option<&str>, tag: Option<&str>) -> Vec<Scenario> {
        Scenario::all()
            .into_iter()
            .filter(|s| name.map_or(true, |n| s.name == n))
            .filter(|s| tag.map_or(true, |t| s.has_tag(t)))
            .collect()
    }

    /// Poll the target until it answers HTTP or `timeout` passes
    pub async fn wait_for_target(&self, timeout: Duration) -> E2eResult<()> {
        let url = self.config.session.base_url.clone();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;

        let start = Instant::now();
        let mut attempts = 0;

        loop {
            attempts += 1;

            match client.get(&url).send().await {
                Ok(resp) => {
                    debug!("Target answered {}", resp.status());
                    return Ok(());
                }
                Err(e) => {
                    if attempts == 1 {
                        info!("Waiting for {}...", url);
                    }
                    // Connection refused is expected while the app is starting
                    if !e.is_connect() {
                        warn!("Probe error: {}", e);
                    }
                }
            }

            if start.elapsed() >= timeout {
                return Err(E2eError::TargetUnreachable { url, attempts });
            }
            sleep(Duration::from_millis(100)).await;
        }
    }

    /// Validate the contract, then check it live against the home page
    pub async fn check_contract(&self) -> E2eResult<()> {
        self.config.contract.validate()?;

        let session =
            SessionContext::launch(self.config.session.clone(), self.config.contract.clone())
                .await?;
        let checked = contract::smoke_check(&session).await;
        let closed = session.close().await;

        checked?;
        closed
    }

    /// Check prerequisites once, then run every scenario in order
    pub async fn run_suite(&self, scenarios: &[Scenario]) -> E2eResult<SuiteResult> {
        PlaywrightDriver::check_installed().await?;

        if self.config.skip_contract_check {
            self.config.contract.validate()?;
        } else {
            self.check_contract().await?;
        }

        Ok(self.run_scenarios(scenarios).await)
    }

    pub async fn run_scenarios(&self, scenarios: &[Scenario]) -> SuiteResult {
        let started_at = Utc::now();
        let start = Instant::now();
        let mut results = Vec::with_capacity(scenarios.len());

        info!("Running {} scenario(s)...", scenarios.len());

        for scenario in scenarios {
            let result = self.run_scenario(scenario).await;
            if result.success {
                info!("✓ {} ({} ms)", result.name, result.duration_ms);
            } else {
                error!(
                    "✗ {} - {}",
                    result.name,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
            results.push(result);
        }

        let suite = SuiteResult::from_results(started_at, start.elapsed().as_millis() as u64, results);

        info!("");
        info!(
            "Scenario Results: {} passed, {} failed ({} ms)",
            suite.passed, suite.failed, suite.duration_ms
        );
        suite
    }

    /// Run one scenario in its own session; the session is closed whatever
    /// the outcome
    pub async fn run_scenario(&self, scenario: &Scenario) -> ScenarioResult {
        let start = Instant::now();
        debug!("Running scenario: {}", scenario.name);

        let session =
            match SessionContext::launch(self.config.session.clone(), self.config.contract.clone())
                .await
            {
                Ok(session) => session,
                Err(e) => return failed_result(scenario, start, &e, None),
            };

        let outcome = scenario.run(&session, &self.config.accounts).await;

        let screenshot_path = match &outcome {
            Err(_) => match session.screenshot(&format!("{}-failure", scenario.name)).await {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("Failure screenshot for {} not captured: {}", scenario.name, e);
                    None
                }
            },
            Ok(()) => None,
        };

        let closed = session.close().await;

        match (outcome, closed) {
            (Ok(()), Ok(())) => ScenarioResult {
                name: scenario.name.to_string(),
                success: true,
                duration_ms: start.elapsed().as_millis() as u64,
                failed_step: None,
                error: None,
                screenshot_path: None,
            },
            (Ok(()), Err(e)) => failed_result(scenario, start, &e, None),
            (Err(e), closed) => {
                if let Err(close_err) = closed {
                    warn!("Closing session for {} failed: {}", scenario.name, close_err);
                }
                failed_result(scenario, start, &e, screenshot_path)
            }
        }
    }

    /// Write suite results to `test-results.json` in the output directory
    pub fn write_results(&self, results: &SuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

fn failed_result(
    scenario: &Scenario,
    start: Instant,
    error: &E2eError,
    screenshot_path: Option<PathBuf>,
) -> ScenarioResult {
    let failed_step = match error {
        E2eError::StepFailed { step, .. } => Some(step.clone()),
        _ => None,
    };

    ScenarioResult {
        name: scenario.name.to_string(),
        success: false,
        duration_ms: start.elapsed().as_millis() as u64,
        failed_step,
        error: Some(error.root().to_string()),
        screenshot_path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, success: bool) -> ScenarioResult {
        ScenarioResult {
            name: name.to_string(),
            success,
            duration_ms: 10,
            failed_step: None,
            error: None,
            screenshot_path: None,
        }
    }

    #[test]
    fn test_suite_counts() {
        let suite = SuiteResult::from_results(
            Utc::now(),
            20,
            vec![result("checkout-flow", true), result("admin-flow", false)],
        );
        assert_eq!(suite.total, 2);
        assert_eq!(suite.passed, 1);
        assert_eq!(suite.failed, 1);
        assert!(!suite.all_passed());
    }

    #[test]
    fn test_empty_suite_passes() {
        let suite = SuiteResult::from_results(Utc::now(), 0, vec![]);
        assert!(suite.all_passed());
    }

    #[test]
    fn test_select_by_name_and_tag() {
        assert_eq!(ScenarioRunner::select(None, None).len(), 2);
        assert_eq!(
            ScenarioRunner::select(Some("admin-flow"), None),
            vec![Scenario::ADMIN]
        );
        assert_eq!(
            ScenarioRunner::select(None, Some("checkout")),
            vec![Scenario::CHECKOUT]
        );
        assert!(ScenarioRunner::select(Some("admin-flow"), Some("checkout")).is_empty());
    }

    #[test]
    fn test_failed_result_records_step_and_root_error() {
        let error = E2eError::StepFailed {
            step: "6. cart shows 2 items".to_string(),
            source: Box::new(E2eError::AssertionFailed("badge".to_string())),
        };
        let result = failed_result(&Scenario::CHECKOUT, Instant::now(), &error, None);

        assert!(!result.success);
        assert_eq!(result.failed_step.as_deref(), Some("6. cart shows 2 items"));
        assert_eq!(result.error.as_deref(), Some("Assertion failed: badge"));
    }

    #[test]
    fn test_write_results() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScenarioRunner::new(RunnerConfig {
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        });

        let suite = SuiteResult::from_results(Utc::now(), 5, vec![result("checkout-flow", true)]);
        let path = runner.write_results(&suite).unwrap();

        let written: SuiteResult =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written.passed, 1);
        assert_eq!(written.results[0].name, "checkout-flow");
    }

    #[tokio::test]
    async fn test_unreachable_target() {
        // Port 9 (discard) is closed on test machines
        let runner = ScenarioRunner::new(RunnerConfig {
            session: SessionConfig {
                base_url: "http://127.0.0.1:9/".to_string(),
                ..Default::default()
            },
            ..Default::default()
        });

        let err = runner
            .wait_for_target(Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(matches!(err, E2eError::TargetUnreachable { .. }));
    }
}
