//! Session state shared by the tool facade
//!
//! One [`Session`] owns everything a server run needs: the browser
//! handle, the serialized browsing pages, the sync-locked shared view of
//! what the session has seen, and the registry of detached cart
//! refreshes. Tool operations lock [`Browsing`] for their whole body;
//! the shared view uses a `parking_lot` lock that is never held across
//! an await.

mod context;
mod cookies;
mod tasks;

pub use context::{PageContext, classify_url, require_context, require_one_of};
pub use cookies::{load_cookie_file, restore_cookies, save_cookies, write_cookie_file};
pub use tasks::TaskRegistry;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chromiumoxide::Page;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::browser_setup::BrowserHandle;
use crate::config::{ServerConfig, WaitConfig};
use crate::error::OdaError;
use crate::extract::{CartItem, extract_cart_items};
use crate::nav;
use crate::site;

const SHUTDOWN_DRAIN_LIMIT: Duration = Duration::from_secs(15);

/// Cart contents as last observed, with the observation time
#[derive(Debug, Clone, Default, Serialize)]
pub struct CartSnapshot {
    pub items: Vec<CartItem>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

/// Mutable session state behind the sync lock
#[derive(Debug)]
pub struct SharedState {
    context: PageContext,
    cart: CartSnapshot,
    visited_urls: HashSet<String>,
    recipe_urls: Vec<String>,
    product_dom_indices: Vec<usize>,
    cart_dom_indices: Vec<usize>,
}

impl Default for SharedState {
    fn default() -> Self {
        Self {
            // A fresh session reports the cart until the first navigation
            // classifies something else.
            context: PageContext::Cart,
            cart: CartSnapshot::default(),
            visited_urls: HashSet::new(),
            recipe_urls: Vec::new(),
            product_dom_indices: Vec::new(),
            cart_dom_indices: Vec::new(),
        }
    }
}

impl SharedState {
    /// Record a navigated URL on the allow-list and re-derive the page
    /// context from it; an unclassifiable URL leaves the context as it was
    pub fn record_navigation(&mut self, url: &str) {
        if !url.is_empty() {
            self.visited_urls.insert(url.to_string());
        }
        if let Some(context) = classify_url(url) {
            self.context = context;
        }
    }

    #[must_use]
    pub fn context(&self) -> PageContext {
        self.context
    }

    /// Whether `url` was produced by an earlier operation
    #[must_use]
    pub fn is_trusted(&self, url: &str) -> bool {
        self.visited_urls.contains(url)
    }

    /// Replace the recipe index table with a fresh listing's URLs
    ///
    /// The URLs join the allow-list: they were shown to the caller as
    /// results, so navigating back to them is legitimate.
    pub fn set_recipe_urls(&mut self, urls: Vec<String>) {
        for url in &urls {
            self.visited_urls.insert(url.clone());
        }
        self.recipe_urls = urls;
    }

    /// Resolve a recipe listing index to its detail URL
    pub fn recipe_url(&self, index: usize) -> Result<String, OdaError> {
        self.recipe_urls
            .get(index)
            .cloned()
            .ok_or(OdaError::IndexOutOfRange {
                kind: "recipe",
                index,
                len: self.recipe_urls.len(),
            })
    }

    /// Replace the search-result index table with a fresh scrape's DOM
    /// positions
    pub fn set_product_dom_indices(&mut self, dom_indices: Vec<usize>) {
        self.product_dom_indices = dom_indices;
    }

    /// Replace the cart-line index table with a fresh scrape's DOM
    /// positions
    pub fn set_cart_dom_indices(&mut self, dom_indices: Vec<usize>) {
        self.cart_dom_indices = dom_indices;
    }

    /// Resolve a search-result index to the card's position among the
    /// page's article elements
    ///
    /// The two differ whenever extraction skipped an invalid card, so a
    /// click addressed by snapshot index must go through this table.
    pub fn product_dom_index(&self, index: usize) -> Result<usize, OdaError> {
        self.product_dom_indices
            .get(index)
            .copied()
            .ok_or(OdaError::IndexOutOfRange {
                kind: "product",
                index,
                len: self.product_dom_indices.len(),
            })
    }

    /// Resolve a cart-line index to the card's position among the page's
    /// article elements
    pub fn cart_dom_index(&self, index: usize) -> Result<usize, OdaError> {
        self.cart_dom_indices
            .get(index)
            .copied()
            .ok_or(OdaError::IndexOutOfRange {
                kind: "cart",
                index,
                len: self.cart_dom_indices.len(),
            })
    }

    /// Overwrite the cart snapshot wholesale
    pub fn set_cart(&mut self, items: Vec<CartItem>) {
        self.cart = CartSnapshot {
            items,
            refreshed_at: Some(Utc::now()),
        };
    }

    #[must_use]
    pub fn cart(&self) -> CartSnapshot {
        self.cart.clone()
    }
}

/// The serialized browsing resource
///
/// `page` carries every listing and cart flow; `detail_page` is reserved
/// for recipe detail views so the listing the caller is paging through
/// stays where it is.
pub struct Browsing {
    pub page: Page,
    pub detail_page: Page,
}

/// Everything one server run shares between tool calls
pub struct Session {
    browser: BrowserHandle,
    browsing: Mutex<Browsing>,
    shared: RwLock<SharedState>,
    tasks: TaskRegistry,
    config: ServerConfig,
}

impl Session {
    /// Open the browsing pages and restore any saved login cookies
    pub async fn new(browser: BrowserHandle, config: ServerConfig) -> Result<Self> {
        let page = browser.new_page("about:blank").await?;
        match cookies::restore_cookies(&page, &config.cookie_file()).await {
            Ok(_) => {}
            Err(error) => warn!("Could not restore saved cookies: {error:#}"),
        }
        let detail_page = browser.new_page("about:blank").await?;

        Ok(Self {
            browser,
            browsing: Mutex::new(Browsing { page, detail_page }),
            shared: RwLock::new(SharedState::default()),
            tasks: TaskRegistry::new(),
            config,
        })
    }

    /// Lock the browsing resource for the duration of one operation
    pub async fn browsing(&self) -> MutexGuard<'_, Browsing> {
        self.browsing.lock().await
    }

    #[must_use]
    pub fn waits(&self) -> &WaitConfig {
        &self.config.waits
    }

    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn context(&self) -> PageContext {
        self.shared.read().context()
    }

    pub fn record_navigation(&self, url: &str) {
        self.shared.write().record_navigation(url);
    }

    pub fn is_trusted(&self, url: &str) -> bool {
        self.shared.read().is_trusted(url)
    }

    pub fn set_recipe_urls(&self, urls: Vec<String>) {
        self.shared.write().set_recipe_urls(urls);
    }

    pub fn recipe_url(&self, index: usize) -> Result<String, OdaError> {
        self.shared.read().recipe_url(index)
    }

    pub fn set_product_dom_indices(&self, dom_indices: Vec<usize>) {
        self.shared.write().set_product_dom_indices(dom_indices);
    }

    pub fn set_cart_dom_indices(&self, dom_indices: Vec<usize>) {
        self.shared.write().set_cart_dom_indices(dom_indices);
    }

    pub fn product_dom_index(&self, index: usize) -> Result<usize, OdaError> {
        self.shared.read().product_dom_index(index)
    }

    pub fn cart_dom_index(&self, index: usize) -> Result<usize, OdaError> {
        self.shared.read().cart_dom_index(index)
    }

    pub fn set_cart(&self, items: Vec<CartItem>) {
        self.shared.write().set_cart(items);
    }

    #[must_use]
    pub fn cart_snapshot(&self) -> CartSnapshot {
        self.shared.read().cart()
    }

    /// Refresh the cart snapshot on a freshly opened page
    ///
    /// Runs without the browsing lock so it never delays a tool call. The
    /// page is closed no matter how the scrape went. Only the snapshot is
    /// replaced: the cart-line index table keeps describing the browsing
    /// page, which this refresh never touches.
    pub async fn refresh_cart_snapshot(&self) -> Result<()> {
        let page = self.browser.new_page("about:blank").await?;
        let result = load_cart(&page, &self.config.waits).await;
        if let Err(error) = page.close().await {
            debug!("Failed to close the cart refresh page: {error}");
        }
        let (items, _dom_indices) = result?;
        self.set_cart(items);
        Ok(())
    }

    /// Spawn a detached cart refresh after a successful mutation
    pub async fn spawn_cart_refresh(self: &Arc<Self>) {
        let session = Arc::clone(self);
        self.tasks
            .spawn(async move {
                if let Err(error) = session.refresh_cart_snapshot().await {
                    warn!("Background cart refresh failed: {error:#}");
                }
            })
            .await;
    }

    /// Drain background work, then close the browser
    pub async fn shutdown(&self) {
        self.tasks.drain_with_timeout(SHUTDOWN_DRAIN_LIMIT).await;
        self.browser.shutdown().await;
    }
}

/// Navigate `page` to the cart and scrape its line items
///
/// Returns the typed lines plus each line's position among the page's
/// article elements, in matching order.
pub async fn load_cart(page: &Page, waits: &WaitConfig) -> Result<(Vec<CartItem>, Vec<usize>)> {
    nav::goto_settled(page, site::CART_URL, waits).await?;
    if !nav::wait::wait_for_cart_ready(page, waits).await {
        debug!("Cart readiness markers missing, scraping anyway");
    }
    extract_cart_items(page).await
}
