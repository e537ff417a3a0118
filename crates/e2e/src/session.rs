//! Per-scenario browser sessions

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::contract::SelectorContract;
use crate::error::{E2eError, E2eResult};
use crate::locator::Locator;
use crate::playwright::{DriverCommand, DriverFailure, FailureKind, PlaywrightDriver};

/// Delay between `expect_*` polls
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Upper bound for a single text read while polling
const POLL_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Everything one scenario owns: a driver process hosting one browser, one
/// context and one page, plus the config and selector contract its steps
/// use.
///
/// Acquire with [`SessionContext::launch`], release with
/// [`SessionContext::close`]. Dropping an unclosed session kills the driver.
pub struct SessionContext {
    driver: PlaywrightDriver,
    config: SessionConfig,
    contract: SelectorContract,
}

impl SessionContext {
    pub async fn launch(config: SessionConfig, contract: SelectorContract) -> E2eResult<Self> {
        let driver = PlaywrightDriver::launch(&config).await?;
        Ok(Self {
            driver,
            config,
            contract,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn contract(&self) -> &SelectorContract {
        &self.contract
    }

    /// Load `url` (relative to the base URL) and wait for it to settle
    pub async fn goto(&self, url: &str) -> E2eResult<()> {
        let url = self.config.resolve_url(url)?;
        debug!("goto {}", url);

        let response = self
            .driver
            .send(&DriverCommand::Goto {
                url: url.clone(),
                timeout_ms: millis(self.config.navigation_timeout),
            })
            .await?;

        response.into_result().map(|_| ()).map_err(|failure| E2eError::Navigation {
            url,
            reason: failure.message,
        })
    }

    pub async fn click(&self, locator: &Locator) -> E2eResult<()> {
        let timeout_ms = millis(self.config.action_timeout);
        self.run(
            locator,
            timeout_ms,
            DriverCommand::Click {
                locator: locator.clone(),
                timeout_ms,
            },
        )
        .await
        .map(|_| ())
    }

    pub async fn fill(&self, locator: &Locator, value: &str) -> E2eResult<()> {
        let timeout_ms = millis(self.config.action_timeout);
        self.run(
            locator,
            timeout_ms,
            DriverCommand::Fill {
                locator: locator.clone(),
                value: value.to_string(),
                timeout_ms,
            },
        )
        .await
        .map(|_| ())
    }

    /// Wait until the element is visible
    pub async fn wait_until_visible(&self, locator: &Locator) -> E2eResult<()> {
        let timeout_ms = millis(self.config.action_timeout);
        self.run(
            locator,
            timeout_ms,
            DriverCommand::WaitFor {
                locator: locator.clone(),
                timeout_ms,
            },
        )
        .await
        .map(|_| ())
    }

    /// Number of elements currently matching, without waiting
    pub async fn count(&self, locator: &Locator) -> E2eResult<usize> {
        let value = self
            .run(
                locator,
                0,
                DriverCommand::Count {
                    locator: locator.clone(),
                },
            )
            .await?;

        value
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| E2eError::Driver(format!("count returned {}", value)))
    }

    /// Assert the element becomes visible within the assertion timeout
    pub async fn expect_visible(&self, locator: &Locator) -> E2eResult<()> {
        let timeout_ms = millis(self.config.assertion_timeout);
        let result = self
            .run(
                locator,
                timeout_ms,
                DriverCommand::WaitFor {
                    locator: locator.clone(),
                    timeout_ms,
                },
            )
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(E2eError::ElementNotFound { .. }) => Err(E2eError::AssertionFailed(format!(
                "{} not visible after {} ms",
                locator, timeout_ms
            ))),
            Err(e) => Err(e),
        }
    }

    /// Assert the element's text contains `expected`, polling until the
    /// assertion timeout
    pub async fn expect_contains_text(&self, locator: &Locator, expected: &str) -> E2eResult<()> {
        let deadline = Instant::now() + self.config.assertion_timeout;
        let mut last_seen: Option<String> = None;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let read_timeout = remaining.min(POLL_READ_TIMEOUT).max(Duration::from_millis(1));

            match self.read_text(locator, read_timeout).await {
                Ok(text) if text.contains(expected) => return Ok(()),
                Ok(text) => last_seen = Some(text),
                Err(E2eError::ElementNotFound { .. }) => {}
                Err(e) => return Err(e),
            }

            if Instant::now() >= deadline {
                return Err(E2eError::AssertionFailed(match last_seen {
                    Some(text) => format!(
                        "{} expected to contain {:?}, last text was {:?}",
                        locator, expected, text
                    ),
                    None => format!(
                        "{} expected to contain {:?}, element never appeared",
                        locator, expected
                    ),
                }));
            }

            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Full-page screenshot at `<screenshot_dir>/<name>.png`
    pub async fn screenshot(&self, name: &str) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.screenshot_dir)?;
        let path = self.config.screenshot_dir.join(format!("{}.png", name));

        let response = self
            .driver
            .send(&DriverCommand::Screenshot {
                path: path_string(&path),
                full_page: true,
            })
            .await?;

        response
            .into_result()
            .map_err(|failure| E2eError::Driver(failure.message))?;
        Ok(path)
    }

    /// Release page, context, browser and driver, in that order
    pub async fn close(self) -> E2eResult<()> {
        self.driver.close().await?;
        info!("Session closed");
        Ok(())
    }

    async fn read_text(&self, locator: &Locator, timeout: Duration) -> E2eResult<String> {
        let timeout_ms = millis(timeout);
        let value = self
            .run(
                locator,
                timeout_ms,
                DriverCommand::InnerText {
                    locator: locator.clone(),
                    timeout_ms,
                },
            )
            .await?;

        Ok(value.as_str().unwrap_or_default().to_string())
    }

    /// Send a locator-addressed command and map failures onto error kinds
    async fn run(
        &self,
        locator: &Locator,
        timeout_ms: u64,
        command: DriverCommand,
    ) -> E2eResult<serde_json::Value> {
        self.driver
            .send(&command)
            .await?
            .into_result()
            .map_err(|failure| classify_failure(locator, timeout_ms, failure))
    }
}

/// Turn a driver failure for `locator` into the matching error kind
pub fn classify_failure(locator: &Locator, timeout_ms: u64, failure: DriverFailure) -> E2eError {
    match failure.kind {
        FailureKind::Timeout => E2eError::ElementNotFound {
            locator: locator.to_string(),
            timeout_ms,
        },
        FailureKind::Strict => E2eError::AmbiguousElement {
            locator: locator.to_string(),
            count: matched_count(&failure.message).unwrap_or(2),
        },
        FailureKind::Navigation => E2eError::Navigation {
            url: locator.to_string(),
            reason: failure.message,
        },
        FailureKind::Error => E2eError::Driver(failure.message),
    }
}

static RESOLVED_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"resolved to (\d+) elements").expect("valid regex"));

/// Pull `N` out of Playwright's "resolved to N elements"
fn matched_count(message: &str) -> Option<usize> {
    RESOLVED_COUNT
        .captures(message)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}

fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
