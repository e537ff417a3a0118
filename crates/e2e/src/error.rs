//! Error types for E2E scenarios

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Target {url} unreachable after {attempts} attempts")]
    TargetUnreachable { url: String, attempts: usize },

    #[error("Element not found: {locator} (waited {timeout_ms} ms)")]
    ElementNotFound { locator: String, timeout_ms: u64 },

    #[error("Ambiguous element: {locator} matched {count} elements")]
    AmbiguousElement { locator: String, count: usize },

    #[error("Login as {email} not confirmed: Logout control not visible after {timeout_ms} ms")]
    LoginVerificationTimeout { email: String, timeout_ms: u64 },

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("Playwright not found. Install with: npm install playwright && npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright driver error: {0}")]
    Driver(String),

    #[error("Selector contract violation: {0}")]
    Contract(String),

    #[error("Step failed: {step} - {source}")]
    StepFailed {
        step: String,
        #[source]
        source: Box<E2eError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl E2eError {
    /// The error that started a failure, looking through step wrappers
    pub fn root(&self) -> &E2eError {
        match self {
            E2eError::StepFailed { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type E2eResult<T> = Result<T, E2eError>;
