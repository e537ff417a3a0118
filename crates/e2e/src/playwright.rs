//! Playwright browser automation
//!
//! Each session runs one Node.js driver process. The driver script is
//! generated from the session config, written to a temp directory and run
//! with `node`. It launches the browser, one context and one page, prints a
//! ready line, and then answers one JSON command per stdin line with one JSON
//! response per stdout line.

use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command as TokioCommand};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::{E2eError, E2eResult};
use crate::locator::Locator;

/// Extra time allowed for a response beyond the command's own timeout
const RESPONSE_GRACE: Duration = Duration::from_secs(5);

/// How long `close` waits for the driver process to exit
const EXIT_TIMEOUT: Duration = Duration::from_secs(10);

/// A command understood by the driver script
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DriverCommand {
    Goto {
        url: String,
        timeout_ms: u64,
    },
    Click {
        locator: Locator,
        timeout_ms: u64,
    },
    Fill {
        locator: Locator,
        value: String,
        timeout_ms: u64,
    },
    /// Wait until the element is visible
    WaitFor {
        locator: Locator,
        timeout_ms: u64,
    },
    InnerText {
        locator: Locator,
        timeout_ms: u64,
    },
    Count {
        locator: Locator,
    },
    Screenshot {
        path: String,
        full_page: bool,
    },
    /// Close context and browser, then exit
    Close,
}

impl DriverCommand {
    fn timeout(&self) -> Duration {
        match self {
            DriverCommand::Goto { timeout_ms, .. }
            | DriverCommand::Click { timeout_ms, .. }
            | DriverCommand::Fill { timeout_ms, .. }
            | DriverCommand::WaitFor { timeout_ms, .. }
            | DriverCommand::InnerText { timeout_ms, .. } => Duration::from_millis(*timeout_ms),
            DriverCommand::Count { .. } | DriverCommand::Screenshot { .. } => {
                Duration::from_secs(10)
            }
            DriverCommand::Close => EXIT_TIMEOUT,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            DriverCommand::Goto { .. } => "goto",
            DriverCommand::Click { .. } => "click",
            DriverCommand::Fill { .. } => "fill",
            DriverCommand::WaitFor { .. } => "wait_for",
            DriverCommand::InnerText { .. } => "inner_text",
            DriverCommand::Count { .. } => "count",
            DriverCommand::Screenshot { .. } => "screenshot",
            DriverCommand::Close => "close",
        }
    }
}

#[derive(Serialize)]
struct DriverRequest<'a> {
    id: u64,
    #[serde(flatten)]
    command: &'a DriverCommand,
}

/// How Playwright reported a failed command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// `TimeoutError`: nothing actionable matched in time
    Timeout,
    /// Strict mode violation: the locator matched several elements
    Strict,
    /// `page.goto` failed
    Navigation,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DriverFailure {
    pub kind: FailureKind,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DriverResponse {
    pub id: u64,
    pub ok: bool,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub error: Option<DriverFailure>,
}

impl DriverResponse {
    pub fn into_result(self) -> Result<serde_json::Value, DriverFailure> {
        if self.ok {
            return Ok(self.value);
        }
        Err(self.error.unwrap_or(DriverFailure {
            kind: FailureKind::Error,
            message: "driver reported a failure without detail".to_string(),
        }))
    }
}

struct DriverIo {
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

/// One running driver process: Playwright, a browser, a context and a page
pub struct PlaywrightDriver {
    child: Child,
    io: Mutex<DriverIo>,
    next_id: AtomicU64,

    /// Holds the script file until the driver exits
    _script_dir: tempfile::TempDir,
}

impl PlaywrightDriver {
    /// Check that `npx playwright` is available
    pub async fn check_installed() -> E2eResult<()> {
        let status = TokioCommand::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    /// Start the driver and wait until its page is open
    pub async fn launch(config: &SessionConfig) -> E2eResult<Self> {
        let script_dir = tempfile::tempdir()?;
        let script_path = script_dir.path().join("driver.js");
        std::fs::write(&script_path, driver_script(config))?;

        debug!("Starting Playwright driver: {}", script_path.display());

        let mut cmd = TokioCommand::new("node");
        cmd.arg(&script_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(node_path) = &config.node_path {
            cmd.env("NODE_PATH", node_path);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| E2eError::Driver(format!("failed to spawn node: {}", e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| E2eError::Driver("driver stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| E2eError::Driver("driver stdout unavailable".to_string()))?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(target: "playwright", "{}", line);
                }
            });
        }

        let driver = Self {
            child,
            io: Mutex::new(DriverIo {
                stdin,
                stdout: BufReader::new(stdout).lines(),
            }),
            next_id: AtomicU64::new(1),
            _script_dir: script_dir,
        };

        // The driver answers id 0 once the page exists
        let ready = {
            let mut io = driver.io.lock().await;
            read_response(&mut io, 0, config.navigation_timeout + RESPONSE_GRACE).await?
        };
        if let Err(failure) = ready.into_result() {
            return Err(E2eError::Driver(format!(
                "browser launch failed: {}",
                failure.message
            )));
        }

        info!(
            "Launched {} ({})",
            config.browser.as_str(),
            if config.headless { "headless" } else { "headed" }
        );
        Ok(driver)
    }

    /// Send one command and wait for its response
    pub async fn send(&self, command: &DriverCommand) -> E2eResult<DriverResponse> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut line = serde_json::to_string(&DriverRequest { id, command })?;
        line.push('\n');

        debug!(id, op = command.name(), "driver command");

        let mut io = self.io.lock().await;
        io.stdin.write_all(line.as_bytes()).await?;
        io.stdin.flush().await?;

        read_response(&mut io, id, command.timeout() + RESPONSE_GRACE).await
    }

    /// Close context and browser, then wait for the process to exit.
    ///
    /// The process is killed if it does not exit in time.
    pub async fn close(mut self) -> E2eResult<()> {
        let closed = self.send(&DriverCommand::Close).await;

        match tokio::time::timeout(EXIT_TIMEOUT, self.child.wait()).await {
            Ok(Ok(status)) if !status.success() => {
                warn!("Playwright driver exited with {}", status);
            }
            Ok(Ok(_)) => {}
            Ok(Err(e)) => warn!("Failed to reap Playwright driver: {}", e),
            Err(_) => {
                warn!("Playwright driver did not exit, terminating");
                self.terminate().await;
            }
        }

        closed?.into_result().map(|_| ()).map_err(|failure| {
            E2eError::Driver(format!("closing browser failed: {}", failure.message))
        })
    }

    async fn terminate(&mut self) {
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            if let Some(pid) = self.child.id() {
                if kill(Pid::from_raw(pid as i32), Signal::SIGTERM).is_ok() {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                }
            }
        }

        let _ = self.child.kill().await;
    }
}

/// Read stdout lines until the response with `id` arrives
async fn read_response(io: &mut DriverIo, id: u64, limit: Duration) -> E2eResult<DriverResponse> {
    tokio::time::timeout(limit, next_response(io, id))
        .await
        .map_err(|_| E2eError::Timeout(format!("driver response {} after {:?}", id, limit)))?
}

async fn next_response(io: &mut DriverIo, id: u64) -> E2eResult<DriverResponse> {
    loop {
        let line = io
            .stdout
            .next_line()
            .await?
            .ok_or_else(|| E2eError::Driver("driver exited unexpectedly".to_string()))?;

        match serde_json::from_str::<DriverResponse>(&line) {
            Ok(response) if response.id == id => return Ok(response),
            Ok(response) => debug!(id = response.id, "skipping stale driver response"),
            Err(_) => debug!(target: "playwright", "{}", line),
        }
    }
}

/// Generate the driver script for a session
pub fn driver_script(config: &SessionConfig) -> String {
    format!(
        r#"const {{ chromium, firefox, webkit }} = require('playwright');
const BROWSER = {browser};
const launchOptions = {{ headless: {headless}, slowMo: {slow_mo} }};
const contextOptions = {{ viewport: {{ width: {width}, height: {height} }} }};
{body}"#,
        browser = config.browser.as_str(),
        headless = config.headless,
        slow_mo = config.slow_mo_ms,
        width = config.viewport_width,
        height = config.viewport_height,
        body = DRIVER_LOOP,
    )
}

const DRIVER_LOOP: &str = r#"
const readline = require('readline');

function reply(message) {
  process.stdout.write(JSON.stringify(message) + '\n');
}

function resolve(page, loc) {
  switch (loc.kind) {
    case 'css':
      return page.locator(loc.selector);
    case 'role':
      return loc.name == null
        ? page.getByRole(loc.role)
        : page.getByRole(loc.role, { name: loc.name });
    case 'has_text':
      return page.locator(loc.selector, { hasText: loc.text });
    case 'first':
      return resolve(page, loc.inner).first();
    default:
      throw new Error('unknown locator kind: ' + loc.kind);
  }
}

function classify(error) {
  if (error.driverKind) return error.driverKind;
  if (error.name === 'TimeoutError') return 'timeout';
  if (/strict mode violation/.test(error.message)) return 'strict';
  return 'error';
}

async function handle(page, cmd) {
  switch (cmd.op) {
    case 'goto':
      try {
        const response = await page.goto(cmd.url, { timeout: cmd.timeout_ms });
        return response ? response.status() : null;
      } catch (error) {
        error.driverKind = 'navigation';
        throw error;
      }
    case 'click':
      await resolve(page, cmd.locator).click({ timeout: cmd.timeout_ms });
      return null;
    case 'fill':
      await resolve(page, cmd.locator).fill(cmd.value, { timeout: cmd.timeout_ms });
      return null;
    case 'wait_for':
      await resolve(page, cmd.locator).waitFor({ state: 'visible', timeout: cmd.timeout_ms });
      return null;
    case 'inner_text':
      return await resolve(page, cmd.locator).innerText({ timeout: cmd.timeout_ms });
    case 'count':
      return await resolve(page, cmd.locator).count();
    case 'screenshot':
      await page.screenshot({ path: cmd.path, fullPage: cmd.full_page });
      return cmd.path;
    default:
      throw new Error('unknown op: ' + cmd.op);
  }
}

(async () => {
  let browser;
  let context;
  let page;
  try {
    browser = await BROWSER.launch(launchOptions);
    context = await browser.newContext(contextOptions);
    page = await context.newPage();
  } catch (error) {
    reply({ id: 0, ok: false, error: { kind: 'error', message: error.message } });
    if (browser) await browser.close();
    process.exit(1);
  }
  reply({ id: 0, ok: true, value: null });

  let closeId = null;
  const lines = readline.createInterface({ input: process.stdin, terminal: false });
  for await (const line of lines) {
    if (!line.trim()) continue;
    const cmd = JSON.parse(line);
    if (cmd.op === 'close') {
      closeId = cmd.id;
      break;
    }
    try {
      const value = await handle(page, cmd);
      reply({ id: cmd.id, ok: true, value: value === undefined ? null : value });
    } catch (error) {
      reply({ id: cmd.id, ok: false, error: { kind: classify(error), message: error.message } });
    }
  }

  try {
    await context.close();
    await browser.close();
  } catch (error) {
    if (closeId !== null) {
      reply({ id: closeId, ok: false, error: { kind: 'error', message: error.message } });
    }
    process.exit(1);
  }
  if (closeId !== null) reply({ id: closeId, ok: true, value: null });
  process.exit(0);
})();
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BrowserKind;
    use crate::locator::AriaRole;
    use serde_json::json;

    #[test]
    fn test_request_is_flat_json() {
        let command = DriverCommand::Click {
            locator: Locator::role(AriaRole::Button, "Submit"),
            timeout_ms: 5000,
        };
        let value = serde_json::to_value(DriverRequest { id: 7, command: &command }).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 7,
                "op": "click",
                "locator": { "kind": "role", "role": "button", "name": "Submit" },
                "timeout_ms": 5000
            })
        );
    }

    #[test]
    fn test_close_request() {
        let value =
            serde_json::to_value(DriverRequest { id: 3, command: &DriverCommand::Close }).unwrap();
        assert_eq!(value, json!({ "id": 3, "op": "close" }));
    }

    #[test]
    fn test_wait_for_request() {
        let command = DriverCommand::WaitFor {
            locator: Locator::id("checkout-button"),
            timeout_ms: 100,
        };
        let value = serde_json::to_value(&command).unwrap();
        assert_eq!(value["op"], "wait_for");
        assert_eq!(value["locator"]["selector"], "#checkout-button");
    }

    #[test]
    fn test_parse_failure_response() {
        let line = r#"{"id":4,"ok":false,"error":{"kind":"strict","message":"strict mode violation"}}"#;
        let response: DriverResponse = serde_json::from_str(line).unwrap();
        assert_eq!(response.id, 4);
        let failure = response.into_result().unwrap_err();
        assert_eq!(failure.kind, FailureKind::Strict);
    }

    #[test]
    fn test_parse_success_response() {
        let line = r#"{"id":5,"ok":true,"value":"Cart (2)"}"#;
        let response: DriverResponse = serde_json::from_str(line).unwrap();
        assert_eq!(response.into_result().unwrap(), json!("Cart (2)"));
    }

    #[test]
    fn test_failure_without_detail() {
        let response: DriverResponse = serde_json::from_str(r#"{"id":1,"ok":false}"#).unwrap();
        assert_eq!(response.into_result().unwrap_err().kind, FailureKind::Error);
    }

    #[test]
    fn test_driver_script_reflects_config() {
        let config = SessionConfig {
            browser: BrowserKind::Firefox,
            headless: false,
            slow_mo_ms: 1000,
            viewport_width: 1920,
            viewport_height: 1080,
            ..Default::default()
        };
        let script = driver_script(&config);

        assert!(script.contains("const BROWSER = firefox;"));
        assert!(script.contains("headless: false, slowMo: 1000"));
        assert!(script.contains("width: 1920, height: 1080"));
        assert!(script.contains("readline.createInterface"));
    }
}
