//! Recipe filter toggling
//!
//! Filters are checkboxes addressed by their site-assigned ids. The site
//! renders them visually hidden behind styled labels, so a click on the
//! input can fail where a click on its label succeeds; both are tried.
//! Application is best-effort per id: a missing checkbox is logged and
//! skipped so the remaining filters still land.

use anyhow::{Context, Result};
use chromiumoxide::Page;
use tracing::debug;

use crate::config::WaitConfig;
use crate::nav::wait;

/// Toggle each requested filter checkbox on the recipe listing
pub async fn apply_filters(page: &Page, filter_ids: &[String], waits: &WaitConfig) {
    for id in filter_ids {
        let input = format!("[id={id:?}]");
        let label = format!("label[for={id:?}]");
        let clicked = match try_click(page, input).await {
            Ok(()) => true,
            Err(input_error) => match try_click(page, label).await {
                Ok(()) => true,
                Err(_) => {
                    debug!("Could not toggle filter {id}: {input_error:#}");
                    false
                }
            },
        };
        if clicked {
            wait::wait_for_page_idle(page, waits).await;
            tokio::time::sleep(waits.settle_grace).await;
        }
    }
}

async fn try_click(page: &Page, selector: String) -> Result<()> {
    let element = page
        .find_element(selector)
        .await
        .context("Element not found")?;
    element
        .scroll_into_view()
        .await
        .context("Failed to scroll the element into view")?;
    element.click().await.context("Click failed")?;
    Ok(())
}
