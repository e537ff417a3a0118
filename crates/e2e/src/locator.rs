//! Element addressing
//!
//! A [`Locator`] describes how to find an element, never the element itself.
//! It is serialized into every driver command and resolved again by
//! Playwright each time, so nothing goes stale across navigations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// ARIA roles the scenarios address controls by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AriaRole {
    Button,
    Link,
    Textbox,
    Main,
}

impl AriaRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AriaRole::Button => "button",
            AriaRole::Link => "link",
            AriaRole::Textbox => "textbox",
            AriaRole::Main => "main",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Locator {
    /// CSS selector, e.g. `#nav-cart`
    Css { selector: String },

    /// `getByRole(role, { name })`
    Role {
        role: AriaRole,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },

    /// CSS selector filtered to elements containing `text`
    HasText { selector: String, text: String },

    /// First match of the inner locator
    First { inner: Box<Locator> },
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css {
            selector: selector.into(),
        }
    }

    /// Element by `id` attribute
    pub fn id(id: &str) -> Self {
        Locator::css(format!("#{}", id))
    }

    pub fn role(role: AriaRole, name: impl Into<String>) -> Self {
        Locator::Role {
            role,
            name: Some(name.into()),
        }
    }

    /// Role without an accessible-name filter (landmarks such as `main`)
    pub fn landmark(role: AriaRole) -> Self {
        Locator::Role { role, name: None }
    }

    pub fn has_text(selector: impl Into<String>, text: impl Into<String>) -> Self {
        Locator::HasText {
            selector: selector.into(),
            text: text.into(),
        }
    }

    pub fn first(self) -> Self {
        Locator::First {
            inner: Box::new(self),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css { selector } => write!(f, "{}", selector),
            Locator::Role { role, name: Some(name) } => {
                write!(f, "role={}[name={:?}]", role.as_str(), name)
            }
            Locator::Role { role, name: None } => write!(f, "role={}", role.as_str()),
            Locator::HasText { selector, text } => write!(f, "{}:has-text({:?})", selector, text),
            Locator::First { inner } => write!(f, "{} >> nth=0", inner),
        }
    }
}
