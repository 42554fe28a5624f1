//! Recipe detail interactions: portion selection and ingredient add
//!
//! The portions picker is a combobox whose listbox is tied to its trigger
//! through `aria-controls`. The option is matched by exact text against
//! the requested count, with a page-wide option scan as fallback when the
//! ARIA relationship is missing. A recipe can only be declared added once
//! the cart API acknowledges it, the same contract as single-product
//! mutations.

use anyhow::{Context, Result};
use chromiumoxide::Page;
use tracing::debug;

use crate::config::WaitConfig;
use crate::extract::js_scripts::{
    MARKED_CONTROL_SELECTOR, PORTIONS_LISTBOX_SCRIPT, mark_labeled_control, mark_portion_option,
};
use crate::nav::cart_actions::click_with_cart_ack;
use crate::nav::wait;
use crate::site::RECIPE_ADD_TO_CART_LABEL;

/// Select `portions` on the open recipe page, then add its ingredients to
/// the cart
///
/// Returns `false` when the page offers no matching portion option or the
/// add control never becomes actionable.
pub async fn add_recipe_to_cart(page: &Page, portions: u32, waits: &WaitConfig) -> Result<bool> {
    if !select_portions(page, portions, waits).await? {
        return Ok(false);
    }
    let marker = mark_labeled_control(RECIPE_ADD_TO_CART_LABEL);
    if !wait::wait_for_probe(page, &marker, waits).await {
        debug!("Recipe add-to-cart control never became actionable");
        return Ok(false);
    }
    let control = page
        .find_element(MARKED_CONTROL_SELECTOR)
        .await
        .context("Recipe add-to-cart control disappeared before the click")?;
    click_with_cart_ack(page, &control, waits).await
}

/// Open the portions picker and click the option matching the count
async fn select_portions(page: &Page, portions: u32, waits: &WaitConfig) -> Result<bool> {
    let listbox_id = match page.evaluate(PORTIONS_LISTBOX_SCRIPT).await {
        Ok(value) => value.into_value::<String>().unwrap_or_default(),
        Err(error) => {
            debug!("Portions picker lookup failed: {error}");
            String::new()
        }
    };

    if listbox_id.is_empty() {
        debug!("No ARIA-linked portions picker, relying on the page-wide option scan");
    } else {
        let trigger_selector = format!("[aria-controls={listbox_id:?}]");
        match page.find_element(trigger_selector).await {
            Ok(trigger) => {
                trigger
                    .scroll_into_view()
                    .await
                    .context("Failed to scroll the portions picker into view")?;
                trigger.click().await.context("Failed to open the portions picker")?;
            }
            Err(error) => debug!("Portions picker trigger not found: {error}"),
        }
    }

    let marker = mark_portion_option(&listbox_id, portions);
    if !wait::wait_for_probe(page, &marker, waits).await {
        debug!(portions, "No portion option matches the requested count");
        return Ok(false);
    }
    let option = page
        .find_element(MARKED_CONTROL_SELECTOR)
        .await
        .context("Portion option disappeared before the click")?;
    option
        .scroll_into_view()
        .await
        .context("Failed to scroll the portion option into view")?;
    option.click().await.context("Failed to click the portion option")?;
    tokio::time::sleep(waits.settle_grace).await;
    Ok(true)
}
