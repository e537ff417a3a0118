//! The UI addressing contract
//!
//! Scenarios never hard-code selectors. They ask the [`SelectorContract`]
//! for a semantic name (`nav-cart`, `checkout`, ...) and get a [`Locator`]
//! back. The contract is versioned, validated offline, and checked live once
//! per suite by [`smoke_check`] before any scenario runs.
//!
//! A contract can be loaded from YAML:
//!
//! ```yaml
//! version: 1
//! entries:
//!   - name: nav-cart
//!     by: css
//!     selector: "#nav-cart"
//!     landing: true
//!   - name: login-open
//!     by: role
//!     role: button
//!     label: Login
//!     landing: true
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{E2eError, E2eResult};
use crate::locator::{AriaRole, Locator};
use crate::session::SessionContext;

/// Contract version this crate understands
pub const CONTRACT_VERSION: u32 = 1;

/// Placeholder substituted with the lower-cased product name
pub const PRODUCT_PLACEHOLDER: &str = "{product}";

/// Semantic names the scenarios depend on
pub mod names {
    pub const NAV_CART: &str = "nav-cart";
    pub const ADD_TO_CART: &str = "add-to-cart";
    pub const CART_DELETE: &str = "cart-delete";
    pub const CHECKOUT: &str = "checkout";
    pub const LOGOUT: &str = "logout";
    pub const MAIN_CONTENT: &str = "main-content";
    pub const LOGIN_OPEN: &str = "login-open";
    pub const LOGIN_EMAIL: &str = "login-email";
    pub const LOGIN_PASSWORD: &str = "login-password";
    pub const LOGIN_SUBMIT: &str = "login-submit";
    pub const LOGOUT_INDICATOR: &str = "logout-indicator";

    pub const REQUIRED: &[&str] = &[
        NAV_CART,
        ADD_TO_CART,
        CART_DELETE,
        CHECKOUT,
        LOGOUT,
        MAIN_CONTENT,
        LOGIN_OPEN,
        LOGIN_EMAIL,
        LOGIN_PASSWORD,
        LOGIN_SUBMIT,
        LOGOUT_INDICATOR,
    ];

    /// Entries whose selector carries the product placeholder
    pub const TEMPLATED: &[&str] = &[ADD_TO_CART];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum Selector {
    Css {
        selector: String,
    },
    Role {
        role: AriaRole,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractEntry {
    pub name: String,

    #[serde(flatten)]
    pub selector: Selector,

    /// Present on the anonymous home page, so the smoke check can see it
    #[serde(default)]
    pub landing: bool,
}

impl ContractEntry {
    pub fn css(name: &str, selector: &str) -> Self {
        Self {
            name: name.to_string(),
            selector: Selector::Css {
                selector: selector.to_string(),
            },
            landing: false,
        }
    }

    pub fn role(name: &str, role: AriaRole, label: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            selector: Selector::Role {
                role,
                label: label.map(String::from),
            },
            landing: false,
        }
    }

    pub fn on_landing(mut self) -> Self {
        self.landing = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorContract {
    pub version: u32,
    pub entries: Vec<ContractEntry>,
}

impl Default for SelectorContract {
    fn default() -> Self {
        use names::*;

        Self {
            version: CONTRACT_VERSION,
            entries: vec![
                ContractEntry::css(NAV_CART, "#nav-cart").on_landing(),
                ContractEntry::css(ADD_TO_CART, "#button-add-{product}"),
                ContractEntry::css(CART_DELETE, "#button-delete"),
                ContractEntry::css(CHECKOUT, "#checkout-button"),
                ContractEntry::css(LOGOUT, "#logout-button"),
                ContractEntry::role(MAIN_CONTENT, AriaRole::Main, None),
                ContractEntry::role(LOGIN_OPEN, AriaRole::Button, Some("Login")).on_landing(),
                ContractEntry::role(LOGIN_EMAIL, AriaRole::Textbox, Some("Email:")),
                ContractEntry::role(LOGIN_PASSWORD, AriaRole::Textbox, Some("Password:")),
                ContractEntry::role(LOGIN_SUBMIT, AriaRole::Button, Some("Submit")),
                ContractEntry::role(LOGOUT_INDICATOR, AriaRole::Button, Some("Logout")),
            ],
        }
    }
}

impl SelectorContract {
    /// Parse and validate a contract from YAML
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let contract: Self = serde_yaml::from_str(yaml)?;
        contract.validate()?;
        Ok(contract)
    }

    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// The file named by `SHOPTESTER_CONTRACT`, or the built-in contract
    pub fn from_env() -> E2eResult<Self> {
        match std::env::var_os("SHOPTESTER_CONTRACT") {
            Some(path) => {
                info!("Loading selector contract from {}", Path::new(&path).display());
                Self::from_file(Path::new(&path))
            }
            None => Ok(Self::default()),
        }
    }

    /// Check the contract without a browser
    pub fn validate(&self) -> E2eResult<()> {
        if self.version != CONTRACT_VERSION {
            return Err(E2eError::Contract(format!(
                "unsupported contract version {} (expected {})",
                self.version, CONTRACT_VERSION
            )));
        }

        let mut seen = HashSet::new();
        for entry in &self.entries {
            if !seen.insert(entry.name.as_str()) {
                return Err(E2eError::Contract(format!("duplicate entry '{}'", entry.name)));
            }
            validate_entry(entry)?;
        }

        for required in names::REQUIRED {
            if !seen.contains(required) {
                return Err(E2eError::Contract(format!("missing entry '{}'", required)));
            }
        }

        Ok(())
    }

    pub fn entry(&self, name: &str) -> E2eResult<&ContractEntry> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| E2eError::Contract(format!("no entry named '{}'", name)))
    }

    /// Locator for a plain entry
    pub fn locator(&self, name: &str) -> E2eResult<Locator> {
        let entry = self.entry(name)?;
        if names::TEMPLATED.contains(&name) {
            return Err(E2eError::Contract(format!(
                "entry '{}' needs a product name",
                name
            )));
        }
        Ok(to_locator(&entry.selector))
    }

    /// Locator for a templated entry, filled in with the lower-cased product
    pub fn product_locator(&self, name: &str, product: &str) -> E2eResult<Locator> {
        let entry = self.entry(name)?;
        match &entry.selector {
            Selector::Css { selector } if selector.contains(PRODUCT_PLACEHOLDER) => Ok(
                Locator::css(selector.replace(PRODUCT_PLACEHOLDER, &product.to_lowercase())),
            ),
            _ => Err(E2eError::Contract(format!(
                "entry '{}' has no {} placeholder",
                name, PRODUCT_PLACEHOLDER
            ))),
        }
    }

    pub fn landing_entries(&self) -> impl Iterator<Item = &ContractEntry> {
        self.entries.iter().filter(|e| e.landing)
    }
}

fn validate_entry(entry: &ContractEntry) -> E2eResult<()> {
    let templated = names::TEMPLATED.contains(&entry.name.as_str());

    match &entry.selector {
        Selector::Css { selector } => {
            if selector.trim().is_empty() {
                return Err(E2eError::Contract(format!("entry '{}' has an empty selector", entry.name)));
            }
            let placeholders = selector.matches(PRODUCT_PLACEHOLDER).count();
            if templated && placeholders != 1 {
                return Err(E2eError::Contract(format!(
                    "entry '{}' must contain exactly one {} placeholder",
                    entry.name, PRODUCT_PLACEHOLDER
                )));
            }
            if !templated && placeholders != 0 {
                return Err(E2eError::Contract(format!(
                    "entry '{}' must not contain a placeholder",
                    entry.name
                )));
            }
        }
        Selector::Role { label, .. } => {
            if templated {
                return Err(E2eError::Contract(format!(
                    "entry '{}' must be a css selector",
                    entry.name
                )));
            }
            if label.as_deref().is_some_and(|l| l.trim().is_empty()) {
                return Err(E2eError::Contract(format!("entry '{}' has an empty label", entry.name)));
            }
        }
    }

    Ok(())
}

fn to_locator(selector: &Selector) -> Locator {
    match selector {
        Selector::Css { selector } => Locator::css(selector.clone()),
        Selector::Role { role, label: Some(label) } => Locator::role(*role, label.clone()),
        Selector::Role { role, label: None } => Locator::landmark(*role),
    }
}

/// Load the home page and require every landing entry to resolve.
///
/// Runs once per suite, before any scenario, so a renamed id or label fails
/// fast with the entry's name instead of mid-scenario.
pub async fn smoke_check(session: &SessionContext) -> E2eResult<()> {
    session.goto("/").await?;

    let contract = session.contract();
    for entry in contract.landing_entries() {
        let locator = to_locator(&entry.selector);
        let found = session.count(&locator).await?;
        debug!(entry = %entry.name, found, "contract smoke check");

        if found == 0 {
            return Err(E2eError::Contract(format!(
                "'{}' ({}) not found on the home page",
                entry.name, locator
            )));
        }
    }

    info!("Selector contract v{} verified", contract.version);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_contract_is_valid() {
        SelectorContract::default().validate().unwrap();
    }

    #[test]
    fn test_add_to_cart_uses_lowercased_product() {
        let contract = SelectorContract::default();
        let locator = contract.product_locator(names::ADD_TO_CART, "Smartphone").unwrap();
        assert_eq!(locator, Locator::css("#button-add-smartphone"));
    }

    #[test]
    fn test_templated_entry_needs_product() {
        let contract = SelectorContract::default();
        assert!(matches!(
            contract.locator(names::ADD_TO_CART),
            Err(E2eError::Contract(_))
        ));
        assert!(matches!(
            contract.product_locator(names::NAV_CART, "tablet"),
            Err(E2eError::Contract(_))
        ));
    }

    #[test]
    fn test_role_entries_become_role_locators() {
        let contract = SelectorContract::default();
        assert_eq!(
            contract.locator(names::LOGIN_EMAIL).unwrap(),
            Locator::role(AriaRole::Textbox, "Email:")
        );
        assert_eq!(
            contract.locator(names::MAIN_CONTENT).unwrap(),
            Locator::landmark(AriaRole::Main)
        );
    }

    #[test]
    fn test_landing_entries() {
        let contract = SelectorContract::default();
        let landing: Vec<_> = contract.landing_entries().map(|e| e.name.as_str()).collect();
        assert_eq!(landing, vec![names::NAV_CART, names::LOGIN_OPEN]);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut contract = SelectorContract::default();
        contract.entries.push(ContractEntry::css(names::NAV_CART, "#cart"));
        assert!(matches!(contract.validate(), Err(E2eError::Contract(_))));
    }

    #[test]
    fn test_missing_entry_rejected() {
        let mut contract = SelectorContract::default();
        contract.entries.retain(|e| e.name != names::CHECKOUT);
        let err = contract.validate().unwrap_err();
        assert!(err.to_string().contains("checkout"));
    }

    #[test]
    fn test_wrong_version_rejected() {
        let contract = SelectorContract {
            version: 2,
            ..Default::default()
        };
        assert!(matches!(contract.validate(), Err(E2eError::Contract(_))));
    }

    #[test]
    fn test_placeholder_rules() {
        let mut contract = SelectorContract::default();
        for entry in &mut contract.entries {
            if entry.name == names::ADD_TO_CART {
                entry.selector = Selector::Css {
                    selector: "#button-add".to_string(),
                };
            }
        }
        assert!(contract.validate().is_err());

        let mut contract = SelectorContract::default();
        for entry in &mut contract.entries {
            if entry.name == names::CHECKOUT {
                entry.selector = Selector::Css {
                    selector: "#checkout-{product}".to_string(),
                };
            }
        }
        assert!(contract.validate().is_err());
    }

    #[test]
    fn test_yaml_round_trip_of_default() {
        let yaml = serde_yaml::to_string(&SelectorContract::default()).unwrap();
        let parsed = SelectorContract::from_yaml(&yaml).unwrap();
        assert_eq!(parsed, SelectorContract::default());
    }

    #[test]
    fn test_load_override_file() {
        let mut custom = SelectorContract::default();
        for entry in &mut custom.entries {
            if entry.name == names::NAV_CART {
                entry.selector = Selector::Css {
                    selector: "#cart-badge".to_string(),
                };
            }
        }
        let yaml = serde_yaml::to_string(&custom).unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let contract = SelectorContract::from_file(file.path()).unwrap();
        assert_eq!(
            contract.locator(names::NAV_CART).unwrap(),
            Locator::css("#cart-badge")
        );
    }

    #[test]
    fn test_parse_handwritten_yaml() {
        let yaml = r##"
version: 1
entries:
  - name: nav-cart
    by: css
    selector: "#nav-cart"
    landing: true
  - name: login-open
    by: role
    role: button
    label: Login
"##;
        let contract: SelectorContract = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(contract.entries.len(), 2);
        assert!(contract.entries[0].landing);
        assert_eq!(
            contract.entries[1].selector,
            Selector::Role {
                role: AriaRole::Button,
                label: Some("Login".to_string())
            }
        );
        // Partial contracts parse but do not validate
        assert!(contract.validate().is_err());
    }
}
