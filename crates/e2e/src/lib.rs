//! ShopTester E2E Scenario Runner
//!
//! Drives a real browser against a running instance of the shop:
//! - Runs Playwright in a Node.js driver process, one per scenario
//! - Addresses controls through a versioned selector contract
//! - Composes step helpers into the checkout and admin scenarios
//! - Runs scenarios strictly one after another and reports JSON results
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Scenario Runner (Rust)                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ScenarioRunner                                             │
//! │    ├── wait_for_target() -> reachable?                      │
//! │    ├── check_contract()  -> SelectorContract smoke check    │
//! │    └── run_scenario(s)   -> ScenarioResult                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  SessionContext (one per scenario)                          │
//! │    └── PlaywrightDriver: node ─ browser ─ context ─ page    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  steps::*            navigate, click_labeled_control,       │
//! │                      add_product_to_cart, login, ...        │
//! │  scenarios::*        checkout_flow, admin_flow              │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod cli;
pub mod config;
pub mod contract;
pub mod error;
pub mod locator;
pub mod playwright;
pub mod runner;
pub mod scenarios;
pub mod session;
pub mod steps;

pub use config::{Account, Accounts, BrowserKind, SessionConfig};
pub use contract::SelectorContract;
pub use error::{E2eError, E2eResult};
pub use locator::{AriaRole, Locator};
pub use runner::{RunnerConfig, ScenarioRunner, SuiteResult};
pub use scenarios::Scenario;
pub use session::SessionContext;
