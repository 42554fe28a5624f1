//! Cart mutations through the in-card controls
//!
//! An add or remove only counts once the cart API answers. The response
//! subscription is opened before the click so the acknowledgement cannot
//! race past the listener, and every way the flow can fall short (index
//! past the listing, control missing or disabled, no acknowledgement)
//! reports `false` instead of pretending the click worked.

use anyhow::{Context, Result};
use chromiumoxide::Page;
use chromiumoxide::element::Element;
use tracing::{debug, warn};

use crate::config::WaitConfig;
use crate::extract::js_scripts::{MARKED_CONTROL_SELECTOR, mark_article_control};
use crate::nav::wait;

/// Click `control` and report whether the cart API acknowledged a mutation
pub(crate) async fn click_with_cart_ack(
    page: &Page,
    control: &Element,
    waits: &WaitConfig,
) -> Result<bool> {
    let mut events = wait::cart_response_listener(page).await?;
    control
        .scroll_into_view()
        .await
        .context("Failed to scroll the cart control into view")?;
    control.click().await.context("Failed to click the cart control")?;
    match wait::await_cart_response(&mut events, waits).await {
        Ok(()) => {
            tokio::time::sleep(waits.settle_grace).await;
            Ok(true)
        }
        Err(error) => {
            warn!("Cart mutation was not acknowledged: {error:#}");
            Ok(false)
        }
    }
}

/// Mutate the cart through the labeled control of the article at
/// position `dom_index` in the page's raw article list
///
/// `label` selects the action (add on listing cards, remove on cart
/// lines). Callers resolve snapshot indices to article positions before
/// getting here; see the session index tables. A position past the
/// rendered articles or a control that never becomes actionable yields
/// `Ok(false)`.
pub async fn modify_cart_item(
    page: &Page,
    dom_index: usize,
    label: &str,
    waits: &WaitConfig,
) -> Result<bool> {
    let marker = mark_article_control(dom_index, label);
    if !wait::wait_for_probe(page, &marker, waits).await {
        debug!(dom_index, label, "Card control never became actionable");
        return Ok(false);
    }
    let control = page
        .find_element(MARKED_CONTROL_SELECTOR)
        .await
        .context("Card control disappeared before the click")?;
    click_with_cart_ack(page, &control, waits).await
}
