//! Session and account configuration
//!
//! Defaults match the shop's local development setup. Environment variables
//! prefixed with `SHOPTESTER_` override them; the test binary's flags
//! override both.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;

use crate::error::{E2eError, E2eResult};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BrowserKind {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl BrowserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserKind::Chromium => "chromium",
            BrowserKind::Firefox => "firefox",
            BrowserKind::Webkit => "webkit",
        }
    }

    /// Unknown names fall back to Chromium
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "firefox" => BrowserKind::Firefox,
            "webkit" => BrowserKind::Webkit,
            _ => BrowserKind::Chromium,
        }
    }
}

/// Configuration for one browser session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Address of the shop under test
    pub base_url: String,

    pub browser: BrowserKind,
    pub headless: bool,

    /// Delay Playwright inserts between actions
    pub slow_mo_ms: u64,

    pub viewport_width: u32,
    pub viewport_height: u32,

    /// Upper bound for clicks, fills and element waits
    pub action_timeout: Duration,

    /// Upper bound for page loads
    pub navigation_timeout: Duration,

    /// Upper bound for `expect_*` polling
    pub assertion_timeout: Duration,

    /// Where failure screenshots are written
    pub screenshot_dir: PathBuf,

    /// Extra `NODE_PATH` so the driver script can `require('playwright')`
    pub node_path: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            browser: BrowserKind::Chromium,
            headless: true,
            slow_mo_ms: 0,
            viewport_width: 1280,
            viewport_height: 720,
            action_timeout: Duration::from_secs(5),
            navigation_timeout: Duration::from_secs(30),
            assertion_timeout: Duration::from_secs(5),
            screenshot_dir: PathBuf::from("test-results/screenshots"),
            node_path: None,
        }
    }
}

impl SessionConfig {
    /// Defaults overridden by `SHOPTESTER_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    ///
    /// Unparseable numeric or boolean values are ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("SHOPTESTER_BASE_URL") {
            config.base_url = url;
        }
        if let Some(browser) = lookup("SHOPTESTER_BROWSER") {
            config.browser = BrowserKind::from_name(&browser);
        }
        if let Some(headless) = lookup("SHOPTESTER_HEADLESS").and_then(|v| parse_bool(&v)) {
            config.headless = headless;
        }
        if let Some(ms) = lookup("SHOPTESTER_SLOW_MO_MS").and_then(|v| v.trim().parse().ok()) {
            config.slow_mo_ms = ms;
        }
        if let Some(ms) = lookup("SHOPTESTER_TIMEOUT_MS").and_then(|v| v.trim().parse().ok()) {
            config.action_timeout = Duration::from_millis(ms);
            config.assertion_timeout = Duration::from_millis(ms);
        }
        if let Some(path) = lookup("SHOPTESTER_NODE_PATH") {
            config.node_path = Some(PathBuf::from(path));
        }

        config
    }

    /// Resolve `url` against the base URL; absolute URLs pass through
    pub fn resolve_url(&self, url: &str) -> E2eResult<String> {
        let base = Url::parse(&self.base_url).map_err(|e| E2eError::Navigation {
            url: self.base_url.clone(),
            reason: format!("invalid base URL: {}", e),
        })?;

        base.join(url)
            .map(String::from)
            .map_err(|e| E2eError::Navigation {
                url: url.to_string(),
                reason: format!("invalid URL: {}", e),
            })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Credentials for one shop user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub email: String,
    pub password: String,
}

impl Account {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// The users the scenarios log in as
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accounts {
    pub standard: Account,
    pub admin: Account,
}

impl Default for Accounts {
    fn default() -> Self {
        Self {
            standard: Account::new("john@email.com", "john123"),
            admin: Account::new("admin@admin.com", "admin123"),
        }
    }
}

impl Accounts {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut accounts = Self::default();

        if let Some(email) = lookup("SHOPTESTER_USER_EMAIL") {
            accounts.standard.email = email;
        }
        if let Some(password) = lookup("SHOPTESTER_USER_PASSWORD") {
            accounts.standard.password = password;
        }
        if let Some(email) = lookup("SHOPTESTER_ADMIN_EMAIL") {
            accounts.admin.email = email;
        }
        if let Some(password) = lookup("SHOPTESTER_ADMIN_PASSWORD") {
            accounts.admin.password = password;
        }

        accounts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use test_case::test_case;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test_case("chromium", BrowserKind::Chromium)]
    #[test_case("Firefox", BrowserKind::Firefox)]
    #[test_case(" webkit ", BrowserKind::Webkit)]
    #[test_case("edge", BrowserKind::Chromium ; "unknown falls back")]
    fn test_browser_from_name(name: &str, expected: BrowserKind) {
        assert_eq!(BrowserKind::from_name(name), expected);
    }

    #[test]
    fn test_defaults_without_overrides() {
        let config = SessionConfig::from_lookup(|_| None);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.browser, BrowserKind::Chromium);
        assert!(config.headless);
        assert_eq!(config.action_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_env_overrides() {
        let config = SessionConfig::from_lookup(lookup_from(&[
            ("SHOPTESTER_BASE_URL", "http://shop.test:8080/"),
            ("SHOPTESTER_BROWSER", "Firefox"),
            ("SHOPTESTER_HEADLESS", "false"),
            ("SHOPTESTER_SLOW_MO_MS", "1000"),
            ("SHOPTESTER_TIMEOUT_MS", "750"),
        ]));

        assert_eq!(config.base_url, "http://shop.test:8080/");
        assert_eq!(config.browser, BrowserKind::Firefox);
        assert!(!config.headless);
        assert_eq!(config.slow_mo_ms, 1000);
        assert_eq!(config.action_timeout, Duration::from_millis(750));
        assert_eq!(config.assertion_timeout, Duration::from_millis(750));
        assert_eq!(config.navigation_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_garbage_values_are_ignored() {
        let config = SessionConfig::from_lookup(lookup_from(&[
            ("SHOPTESTER_HEADLESS", "maybe"),
            ("SHOPTESTER_SLOW_MO_MS", "soon"),
        ]));
        assert!(config.headless);
        assert_eq!(config.slow_mo_ms, 0);
    }

    #[test]
    fn test_resolve_url() {
        let config = SessionConfig::default();
        assert_eq!(config.resolve_url("").unwrap(), "http://localhost:5000/");
        assert_eq!(
            config.resolve_url("/profile").unwrap(),
            "http://localhost:5000/profile"
        );
        assert_eq!(
            config.resolve_url("https://example.com/x").unwrap(),
            "https://example.com/x"
        );
    }

    #[test]
    fn test_invalid_base_url_is_navigation_error() {
        let config = SessionConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.resolve_url("/"),
            Err(E2eError::Navigation { .. })
        ));
    }

    #[test]
    fn test_account_overrides() {
        let accounts = Accounts::from_lookup(lookup_from(&[
            ("SHOPTESTER_ADMIN_EMAIL", "root@shop.test"),
        ]));
        assert_eq!(accounts.admin.email, "root@shop.test");
        assert_eq!(accounts.admin.password, "admin123");
        assert_eq!(accounts.standard, Account::new("john@email.com", "john123"));
    }
}
