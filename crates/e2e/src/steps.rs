//! Step helpers: human-readable actions against the shop UI
//!
//! Every helper takes the session explicitly and resolves its locators on
//! each call. Helpers never catch errors; the first failure propagates and
//! ends the scenario.

use std::future::Future;

use tracing::{debug, info};

use crate::contract::names;
use crate::error::{E2eError, E2eResult};
use crate::locator::{AriaRole, Locator};
use crate::session::SessionContext;

/// Banner shown in the main region after a successful checkout
pub const CHECKOUT_SUCCESS_MESSAGE: &str = "Order placed successfully! Thank you for your purchase.";

/// Text the cart badge shows when holding `count` items
pub fn cart_badge_text(count: usize) -> String {
    format!("Cart ({})", count)
}

pub async fn navigate(session: &SessionContext, url: &str) -> E2eResult<()> {
    session.goto(url).await
}

/// Click the one control of role `kind` whose accessible name matches `name`
pub async fn click_labeled_control(
    session: &SessionContext,
    kind: AriaRole,
    name: &str,
) -> E2eResult<()> {
    session.click(&Locator::role(kind, name)).await
}

/// Click a product's add button once per unit
pub async fn add_product_to_cart(
    session: &SessionContext,
    product_name: &str,
    quantity: u32,
) -> E2eResult<()> {
    let add = session
        .contract()
        .product_locator(names::ADD_TO_CART, product_name)?;

    for unit in 1..=quantity {
        debug!(product = product_name, unit, quantity, "add to cart");
        session.click(&add).await?;
    }
    Ok(())
}

/// Log in and require the Logout control to appear
pub async fn login(session: &SessionContext, email: &str, password: &str) -> E2eResult<()> {
    let contract = session.contract();

    session.click(&contract.locator(names::LOGIN_OPEN)?).await?;
    session.fill(&contract.locator(names::LOGIN_EMAIL)?, email).await?;

    let password_field = contract.locator(names::LOGIN_PASSWORD)?;
    session.click(&password_field).await?;
    session.fill(&password_field, password).await?;

    session.click(&contract.locator(names::LOGIN_SUBMIT)?).await?;

    match session.expect_visible(&contract.locator(names::LOGOUT_INDICATOR)?).await {
        Err(E2eError::AssertionFailed(_)) => Err(E2eError::LoginVerificationTimeout {
            email: email.to_string(),
            timeout_ms: session.config().assertion_timeout.as_millis() as u64,
        }),
        result => {
            if result.is_ok() {
                info!("Logged in as {}", email);
            }
            result
        }
    }
}

/// Assert the cart badge reads `Cart (<count>)`
pub async fn expect_cart_count(session: &SessionContext, count: usize) -> E2eResult<()> {
    let badge = session.contract().locator(names::NAV_CART)?;
    session.expect_contains_text(&badge, &cart_badge_text(count)).await
}

/// Remove the first line item listed in the cart
pub async fn delete_first_cart_line(session: &SessionContext) -> E2eResult<()> {
    let delete = session.contract().locator(names::CART_DELETE)?.first();
    session.click(&delete).await
}

/// Wait for the checkout control, place the order and require the success
/// banner in the main region
pub async fn checkout(session: &SessionContext) -> E2eResult<()> {
    let contract = session.contract();
    let checkout = contract.locator(names::CHECKOUT)?;

    session.wait_until_visible(&checkout).await?;
    session.click(&checkout).await?;
    session
        .expect_contains_text(&contract.locator(names::MAIN_CONTENT)?, CHECKOUT_SUCCESS_MESSAGE)
        .await
}

/// Click the button whose text contains `text`
pub async fn click_button_with_text(session: &SessionContext, text: &str) -> E2eResult<()> {
    session.click(&Locator::has_text("button", text)).await
}

/// Wait for the logout control and click it
pub async fn logout(session: &SessionContext) -> E2eResult<()> {
    let logout = session.contract().locator(names::LOGOUT)?;
    session.wait_until_visible(&logout).await?;
    session.click(&logout).await
}

/// Numbers and names the steps of one scenario run.
///
/// A failing step comes back wrapped in [`E2eError::StepFailed`] so the
/// report says where the scenario stopped.
pub struct StepTracker {
    scenario: &'static str,
    completed: usize,
}

impl StepTracker {
    pub fn new(scenario: &'static str) -> Self {
        Self {
            scenario,
            completed: 0,
        }
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub async fn step<F, T>(&mut self, description: &str, action: F) -> E2eResult<T>
    where
        F: Future<Output = E2eResult<T>>,
    {
        let ordinal = self.completed + 1;
        info!(scenario = self.scenario, step = ordinal, "{}", description);

        let value = action.await.map_err(|source| E2eError::StepFailed {
            step: format!("{}. {}", ordinal, description),
            source: Box::new(source),
        })?;

        self.completed = ordinal;
        Ok(value)
    }
}
