//! Polling-based synchronization with the live page
//!
//! The storefront is a client-rendered application, so navigation rarely
//! lines up with document loads. Every wait here polls an observable
//! signal (URL, readyState, a listing fingerprint, a DOM probe) and gives
//! up quietly after its budget: callers proceed with whatever the page
//! shows, and extraction decides what that is worth. The one exception is
//! the cart API acknowledgement, which callers treat as the source of
//! truth for whether a mutation happened.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::network::EventResponseReceived;
use futures::{Stream, StreamExt};
use tracing::debug;

use crate::config::WaitConfig;
use crate::extract::js_scripts::CART_READY_SCRIPT;
use crate::site::{CART_ACCEPTED_STATUSES, CART_ITEMS_ENDPOINT};

const READY_STATE_SCRIPT: &str = r#"document.readyState === "complete""#;

/// Evaluate a boolean probe script once, treating any failure as `false`
pub async fn probe_once(page: &Page, script: &str) -> bool {
    match page.evaluate(script).await {
        Ok(value) => value.into_value::<bool>().unwrap_or(false),
        Err(error) => {
            debug!("Probe evaluation failed: {error}");
            false
        }
    }
}

/// Poll a boolean probe until it turns true or the budget runs out
pub async fn wait_for_probe(page: &Page, script: &str, waits: &WaitConfig) -> bool {
    let deadline = Instant::now() + waits.control_ready;
    loop {
        if probe_once(page, script).await {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(waits.poll_interval).await;
    }
}

/// Wait until the document reports itself fully loaded
///
/// Proceeds after the budget regardless: a page stuck in `loading` can
/// still have rendered the cards we need.
pub async fn wait_for_page_idle(page: &Page, waits: &WaitConfig) {
    let deadline = Instant::now() + waits.page_idle;
    loop {
        if probe_once(page, READY_STATE_SCRIPT).await {
            return;
        }
        if Instant::now() >= deadline {
            debug!("Page did not reach readyState complete within budget");
            return;
        }
        tokio::time::sleep(waits.poll_interval).await;
    }
}

/// Wait for the page URL to move away from `before`
pub async fn wait_for_url_change(page: &Page, before: &str, waits: &WaitConfig) {
    let deadline = Instant::now() + waits.url_change;
    loop {
        match page.url().await {
            Ok(Some(current)) if current != before => return,
            Ok(_) => {}
            Err(error) => debug!("URL check failed while waiting for navigation: {error}"),
        }
        if Instant::now() >= deadline {
            debug!("URL did not change within budget, continuing with current page");
            return;
        }
        tokio::time::sleep(waits.poll_interval).await;
    }
}

/// Read a listing fingerprint, treating failures as an empty fingerprint
pub async fn read_fingerprint(page: &Page, script: &str) -> String {
    match page.evaluate(script).await {
        Ok(value) => value.into_value::<String>().unwrap_or_default(),
        Err(error) => {
            debug!("Fingerprint script failed: {error}");
            String::new()
        }
    }
}

/// Wait for the rendered listing to differ from a fingerprint taken before
/// an action
///
/// Client-side routers swap cards without a document load, so this is the
/// only signal that a pagination or filter action actually landed. An
/// unchanged fingerprint after the budget is not an error: identical
/// result sets are legitimate.
pub async fn wait_for_listing_change(page: &Page, script: &str, before: &str, waits: &WaitConfig) {
    let deadline = Instant::now() + waits.listing_change;
    loop {
        let current = read_fingerprint(page, script).await;
        if !current.is_empty() && current != before {
            return;
        }
        if Instant::now() >= deadline {
            debug!("Listing fingerprint unchanged within budget");
            return;
        }
        tokio::time::sleep(waits.poll_interval).await;
    }
}

/// Subscribe to network responses before triggering a cart mutation
///
/// The subscription must exist before the click so the acknowledgement
/// cannot slip past between action and listener.
pub async fn cart_response_listener(
    page: &Page,
) -> Result<impl Stream<Item = Arc<EventResponseReceived>> + Unpin> {
    page.event_listener::<EventResponseReceived>()
        .await
        .context("Failed to subscribe to network responses")
}

/// Wait for the cart API to acknowledge a mutation
///
/// Resolves when a response for the cart items endpoint arrives with an
/// accepted status. Timing out or losing the event stream is an error:
/// without the acknowledgement the mutation cannot be reported as done.
pub async fn await_cart_response<S>(events: &mut S, waits: &WaitConfig) -> Result<()>
where
    S: Stream<Item = Arc<EventResponseReceived>> + Unpin,
{
    let outcome = tokio::time::timeout(waits.cart_response, async {
        while let Some(event) = events.next().await {
            if !event.response.url.contains(CART_ITEMS_ENDPOINT) {
                continue;
            }
            if CART_ACCEPTED_STATUSES.contains(&event.response.status) {
                debug!(
                    status = event.response.status,
                    "Cart endpoint acknowledged the mutation"
                );
                return Ok(());
            }
            debug!(
                status = event.response.status,
                "Cart endpoint rejected the mutation"
            );
        }
        bail!("Network event stream ended before the cart acknowledged the mutation");
    })
    .await;

    match outcome {
        Ok(result) => result,
        Err(_) => bail!("Cart endpoint did not respond within budget"),
    }
}

/// Wait for the cart page to show either line items or the empty-cart
/// notice
pub async fn wait_for_cart_ready(page: &Page, waits: &WaitConfig) -> bool {
    let deadline = Instant::now() + waits.cart_markers;
    loop {
        if probe_once(page, &CART_READY_SCRIPT).await {
            return true;
        }
        if Instant::now() >= deadline {
            debug!("Cart markers did not appear within budget");
            return false;
        }
        tokio::time::sleep(waits.poll_interval).await;
    }
}
