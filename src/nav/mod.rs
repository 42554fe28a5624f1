//! Navigation controller
//!
//! Drives the live pages: load a URL, page through a listing, mutate the
//! cart, work the recipe detail controls. Each action is followed by the
//! bounded waits from [`wait`] so callers hand a settled page to the
//! extractors.

mod cart_actions;
mod filters;
mod pagination;
mod recipe_actions;
pub mod wait;

pub use cart_actions::modify_cart_item;
pub use filters::apply_filters;
pub use pagination::{Direction, paginate};
pub use recipe_actions::add_recipe_to_cart;

use anyhow::{Context, Result};
use chromiumoxide::Page;
use tracing::debug;

use crate::config::WaitConfig;

/// Read the page's current URL
pub async fn current_url(page: &Page) -> Result<String> {
    Ok(page
        .url()
        .await
        .context("Failed to read the current page URL")?
        .unwrap_or_default())
}

/// Navigate to `url` and wait until the document has settled
///
/// The navigation wait is tolerated to fail: client-side route changes
/// never produce one, and the readyState poll that follows covers both
/// kinds of load.
pub async fn goto_settled(page: &Page, url: &str, waits: &WaitConfig) -> Result<()> {
    page.goto(url)
        .await
        .with_context(|| format!("Failed to navigate to {url}"))?;
    if let Err(error) = page.wait_for_navigation().await {
        debug!("Navigation wait failed for {url}: {error}");
    }
    wait::wait_for_page_idle(page, waits).await;
    tokio::time::sleep(waits.settle_grace).await;
    Ok(())
}
