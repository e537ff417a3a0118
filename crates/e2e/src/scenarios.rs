//! The end-to-end scenarios
//!
//! Each scenario is a straight line of steps. Assertions sit only where the
//! UI changes in a stable, checkable way: the cart badge, the checkout
//! banner and the Logout control. Everything else is a smoke step that fails
//! only if its control cannot be found.

use crate::config::Accounts;
use crate::error::E2eResult;
use crate::locator::AriaRole;
use crate::session::SessionContext;
use crate::steps::{self, StepTracker};

/// Category filters on the shop page, clicked in this order
pub const CATEGORY_FILTERS: &[&str] = &["Electronics", "Books", "Clothing", "Food", "All"];

/// Admin panel fetch actions, clicked in this order
pub const ADMIN_FETCHES: &[&str] = &["Fetch Users", "Fetch Orders", "Fetch Products"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioKind {
    Checkout,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub name: &'static str,
    pub description: &'static str,
    pub tags: &'static [&'static str],
    pub kind: ScenarioKind,
}

impl Scenario {
    pub const CHECKOUT: Scenario = Scenario {
        name: "checkout-flow",
        description: "Buy products, edit the cart, check out and log out",
        tags: &["checkout", "smoke"],
        kind: ScenarioKind::Checkout,
    };

    pub const ADMIN: Scenario = Scenario {
        name: "admin-flow",
        description: "Log in as admin, browse categories and fetch admin data",
        tags: &["admin", "smoke"],
        kind: ScenarioKind::Admin,
    };

    pub fn all() -> Vec<Scenario> {
        vec![Self::CHECKOUT, Self::ADMIN]
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(&tag)
    }

    pub async fn run(&self, session: &SessionContext, accounts: &Accounts) -> E2eResult<()> {
        match self.kind {
            ScenarioKind::Checkout => checkout_flow(session, accounts).await,
            ScenarioKind::Admin => admin_flow(session, accounts).await,
        }
    }
}

pub async fn checkout_flow(session: &SessionContext, accounts: &Accounts) -> E2eResult<()> {
    let user = &accounts.standard;
    let mut t = StepTracker::new(Scenario::CHECKOUT.name);

    t.step("open home page", steps::navigate(session, "/")).await?;
    t.step("log in as standard user", steps::login(session, &user.email, &user.password))
        .await?;
    t.step("open shop", steps::click_labeled_control(session, AriaRole::Link, "Shop"))
        .await?;

    t.step("add Smartphone", steps::add_product_to_cart(session, "Smartphone", 1))
        .await?;
    t.step("add monitor", steps::add_product_to_cart(session, "monitor", 1))
        .await?;
    t.step("cart shows 2 items", steps::expect_cart_count(session, 2))
        .await?;

    t.step("open cart", steps::click_labeled_control(session, AriaRole::Link, "Cart"))
        .await?;
    t.step("delete first cart line", steps::delete_first_cart_line(session))
        .await?;

    t.step("back to shop", steps::click_labeled_control(session, AriaRole::Link, "Shop"))
        .await?;
    t.step("add tablet", steps::add_product_to_cart(session, "tablet", 1))
        .await?;
    t.step("add jeans", steps::add_product_to_cart(session, "jeans", 1))
        .await?;
    t.step("cart shows 3 items", steps::expect_cart_count(session, 3))
        .await?;

    t.step("open cart", steps::click_labeled_control(session, AriaRole::Link, "Cart"))
        .await?;
    t.step("check out", steps::checkout(session)).await?;

    t.step("open profile", steps::click_labeled_control(session, AriaRole::Link, "Profile"))
        .await?;
    t.step("log out", steps::logout(session)).await?;

    Ok(())
}

pub async fn admin_flow(session: &SessionContext, accounts: &Accounts) -> E2eResult<()> {
    let admin = &accounts.admin;
    let mut t = StepTracker::new(Scenario::ADMIN.name);

    t.step("open home page", steps::navigate(session, "/")).await?;
    t.step("log in as admin", steps::login(session, &admin.email, &admin.password))
        .await?;
    t.step("open shop", steps::click_labeled_control(session, AriaRole::Link, "Shop"))
        .await?;

    // Filters and fetches are smoke steps, results are not inspected
    for category in CATEGORY_FILTERS {
        t.step(
            &format!("filter {}", category),
            steps::click_button_with_text(session, category),
        )
        .await?;
    }

    t.step("open admin panel", steps::click_labeled_control(session, AriaRole::Link, "Admin"))
        .await?;
    for action in ADMIN_FETCHES {
        t.step(action, steps::click_button_with_text(session, action))
            .await?;
    }

    t.step("open profile", steps::click_labeled_control(session, AriaRole::Link, "Profile"))
        .await?;
    t.step("log out", steps::logout(session)).await?;

    Ok(())
}
