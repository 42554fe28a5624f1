//! Listing pagination through the labeled pager controls

use anyhow::{Context, Result};
use chromiumoxide::Page;
use tracing::debug;

use crate::config::WaitConfig;
use crate::extract::js_scripts::{MARKED_CONTROL_SELECTOR, mark_labeled_control};
use crate::nav::wait;
use crate::site::{NEXT_PAGE_LABEL, PREVIOUS_PAGE_LABEL};

/// Direction of a pagination step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

impl Direction {
    /// Accessible label of the pager control for this direction
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Next => NEXT_PAGE_LABEL,
            Self::Previous => PREVIOUS_PAGE_LABEL,
        }
    }
}

/// Step the current listing one page in `direction`
///
/// Returns `false` when no actionable pager control exists, which is how
/// the site renders the first and last page. After the click the listing
/// is considered settled once the URL or fingerprint has moved, or the
/// bounded waits have run out; identical pages are possible and left for
/// the caller's scrape to report.
pub async fn paginate(
    page: &Page,
    direction: Direction,
    fingerprint_script: &str,
    waits: &WaitConfig,
) -> Result<bool> {
    let marker = mark_labeled_control(direction.label());
    if !wait::wait_for_probe(page, &marker, waits).await {
        debug!(label = direction.label(), "No actionable pager control");
        return Ok(false);
    }

    let before_url = page
        .url()
        .await
        .context("Failed to read the page URL before pagination")?
        .unwrap_or_default();
    let before_fingerprint = wait::read_fingerprint(page, fingerprint_script).await;

    let control = page
        .find_element(MARKED_CONTROL_SELECTOR)
        .await
        .context("Pager control disappeared before the click")?;
    control
        .scroll_into_view()
        .await
        .context("Failed to scroll the pager control into view")?;
    control.click().await.context("Failed to click the pager control")?;

    wait::wait_for_url_change(page, &before_url, waits).await;
    wait::wait_for_page_idle(page, waits).await;
    if !before_fingerprint.is_empty() {
        wait::wait_for_listing_change(page, fingerprint_script, &before_fingerprint, waits).await;
    }
    tokio::time::sleep(waits.settle_grace).await;
    Ok(true)
}
