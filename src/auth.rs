//! Interactive login flow
//!
//! Opens a headed browser on the account page and lets the user log in
//! by hand. Cookies are snapshotted once per second for as long as the
//! window stays open; when the user closes it, the last snapshot is
//! written to `cookies.json` for later server runs to restore. The loop
//! is intentionally unbounded: login takes as long as the user needs.

use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use crate::browser_setup::launch_browser;
use crate::config::ServerConfig;
use crate::session::write_cookie_file;
use crate::site::ACCOUNT_URL;

const COOKIE_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Run the interactive login flow to completion
pub async fn run_auth(mut config: ServerConfig) -> Result<()> {
    // Login needs a visible window regardless of the serve-mode setting.
    config.headless = false;

    let browser = launch_browser(&config).await?;
    let page = browser.new_page(ACCOUNT_URL).await?;

    info!("Log in to Oda in the browser window, then close it when you are done");

    let mut snapshot = Vec::new();
    loop {
        tokio::time::sleep(COOKIE_POLL_INTERVAL).await;
        match page.get_cookies().await {
            Ok(cookies) => snapshot = cookies,
            // The page is gone: the user closed the window.
            Err(_) => break,
        }
        if !browser.is_healthy().await {
            break;
        }
    }

    if snapshot.is_empty() {
        warn!("No cookies captured; the login may not have completed");
    }
    let cookie_file = config.cookie_file();
    write_cookie_file(&cookie_file, &snapshot)?;
    info!(
        "Saved {} cookies to {}",
        snapshot.len(),
        cookie_file.display()
    );

    browser.shutdown().await;
    Ok(())
}
