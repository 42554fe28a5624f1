//! Browser discovery, launch and lifecycle
//!
//! The browser profile lives under the data dir and is deliberately
//! persistent: the login session restored from cookies must survive
//! server restarts, so nothing here cleans up the profile.

use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions};
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::{self, JoinHandle};
use tracing::{error, info, trace, warn};

use crate::config::ServerConfig;
use crate::site::CHROME_USER_AGENT;

/// Find a Chrome/Chromium executable on the system
pub async fn find_browser_executable() -> Result<PathBuf> {
    // Environment variable overrides all other methods
    if let Ok(path) = std::env::var("CHROMIUM_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            info!(
                "Using browser from CHROMIUM_PATH environment variable: {}",
                path.display()
            );
            return Ok(path);
        }
        warn!(
            "CHROMIUM_PATH environment variable points to non-existent file: {}",
            path.display()
        );
    }

    // Common installation paths by platform
    let paths = if cfg!(target_os = "windows") {
        vec![
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files\Chromium\Application\chrome.exe",
            r"C:\Program Files (x86)\Chromium\Application\chrome.exe",
        ]
    } else if cfg!(target_os = "macos") {
        vec![
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Google Chrome Beta.app/Contents/MacOS/Google Chrome Beta",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "~/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "~/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/opt/homebrew/bin/chromium",
        ]
    } else {
        // Linux
        vec![
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
            "/usr/local/bin/chromium",
            "/opt/google/chrome/chrome",
        ]
    };

    for path_str in paths {
        let path = if path_str.starts_with('~') {
            if let Some(home) = dirs::home_dir() {
                home.join(&path_str[2..])
            } else {
                continue;
            }
        } else {
            PathBuf::from(path_str)
        };

        if path.exists() {
            info!("Found browser at: {}", path.display());
            return Ok(path);
        }
    }

    // Use 'which' to find a browser on Unix systems
    if !cfg!(target_os = "windows") {
        for cmd in &["chromium", "chromium-browser", "google-chrome", "chrome"] {
            let output = Command::new("which").arg(cmd).output();

            if let Ok(output) = output
                && output.status.success()
            {
                let path_str = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path_str.is_empty() {
                    let path = PathBuf::from(path_str);
                    info!("Found browser using 'which' command: {}", path.display());
                    return Ok(path);
                }
            }
        }
    }

    warn!("No Chrome/Chromium executable found. Will download and use fetcher.");
    Err(anyhow::anyhow!("Chrome/Chromium executable not found"))
}

/// Download a managed Chromium into the data dir and return its executable
pub async fn download_managed_browser(config: &ServerConfig) -> Result<PathBuf> {
    info!("Downloading managed Chromium browser...");

    let cache_dir = config.chromium_cache_dir();
    std::fs::create_dir_all(&cache_dir).context("Failed to create browser cache directory")?;

    let fetcher = BrowserFetcher::new(
        BrowserFetcherOptions::builder()
            .with_path(&cache_dir)
            .build()
            .context("Failed to build fetcher options")?,
    );

    let revision_info = fetcher.fetch().await.context("Failed to fetch browser")?;

    info!(
        "Downloaded Chromium to: {}",
        revision_info.folder_path.display()
    );

    Ok(revision_info.executable_path)
}

/// Launch the browser with the persistent profile from the data dir
pub async fn launch_browser(config: &ServerConfig) -> Result<BrowserHandle> {
    let chrome_path = match find_browser_executable().await {
        Ok(path) => path,
        Err(_) => download_managed_browser(config).await?,
    };

    let profile_dir = config.profile_dir();
    std::fs::create_dir_all(&profile_dir).context("Failed to create browser profile directory")?;

    let mut config_builder = BrowserConfigBuilder::default()
        .request_timeout(Duration::from_secs(30))
        .window_size(1440, 1080)
        .user_data_dir(profile_dir)
        .chrome_executable(chrome_path);

    if config.headless {
        config_builder = config_builder.headless_mode(HeadlessMode::default());
    } else {
        config_builder = config_builder.with_head();
    }

    // Keep the automation fingerprint down without weakening the browser:
    // the storefront blocks obvious automation but needs no full stealth.
    config_builder = config_builder
        .arg(format!("--user-agent={CHROME_USER_AGENT}"))
        .arg("--disable-blink-features=AutomationControlled")
        .arg("--disable-infobars")
        .arg("--disable-notifications")
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .arg("--password-store=basic")
        .arg("--mute-audio");

    let browser_config = config_builder
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build browser config: {e}"))?;

    info!("Launching browser");
    let (browser, mut handler) = Browser::launch(browser_config)
        .await
        .context("Failed to launch browser")?;

    let handler_task = task::spawn(async move {
        while let Some(h) = handler.next().await {
            if let Err(e) = h {
                let error_msg = e.to_string();

                // Chrome sends CDP events chromiumoxide doesn't recognize;
                // those deserialization failures are noise, not faults.
                // Reference: https://github.com/mattsse/chromiumoxide/issues/167
                //            https://github.com/mattsse/chromiumoxide/issues/229
                let is_benign_serialization_error = error_msg
                    .contains("data did not match any variant of untagged enum Message")
                    || error_msg.contains("Failed to deserialize WS response");

                if is_benign_serialization_error {
                    trace!("Suppressed benign CDP serialization error: {error_msg}");
                } else {
                    error!("Browser handler error: {e:?}");
                }
            }
        }
        info!("Browser handler task completed");
    });

    Ok(BrowserHandle::new(browser, handler_task))
}

struct BrowserInner {
    browser: Browser,
    handler: JoinHandle<()>,
}

struct BrowserShared {
    state: Mutex<Option<BrowserInner>>,
}

impl Drop for BrowserShared {
    fn drop(&mut self) {
        // Shutdown normally ran already; this only stops a still-running
        // handler task when it did not.
        if let Ok(mut guard) = self.state.try_lock()
            && let Some(inner) = guard.take()
        {
            inner.handler.abort();
        }
    }
}

/// Shared handle to the running browser and its event handler task
///
/// Clones share one browser. `shutdown` closes the process gracefully;
/// afterwards every page operation fails, which is the signal the rest of
/// the session reacts to.
#[derive(Clone)]
pub struct BrowserHandle {
    inner: Arc<BrowserShared>,
}

impl BrowserHandle {
    #[must_use]
    pub fn new(browser: Browser, handler: JoinHandle<()>) -> Self {
        Self {
            inner: Arc::new(BrowserShared {
                state: Mutex::new(Some(BrowserInner { browser, handler })),
            }),
        }
    }

    /// Open a new page at `url`
    pub async fn new_page(&self, url: &str) -> Result<Page> {
        let guard = self.inner.state.lock().await;
        let inner = guard.as_ref().context("Browser is already shut down")?;
        inner
            .browser
            .new_page(url)
            .await
            .context("Failed to open a new page")
    }

    /// Probe whether the browser process still answers CDP commands
    pub async fn is_healthy(&self) -> bool {
        let guard = self.inner.state.lock().await;
        match guard.as_ref() {
            Some(inner) => inner.browser.version().await.is_ok(),
            None => false,
        }
    }

    /// Close the browser process and stop the handler task
    ///
    /// Safe to call more than once.
    pub async fn shutdown(&self) {
        let mut guard = self.inner.state.lock().await;
        if let Some(mut inner) = guard.take() {
            info!("Shutting down browser");
            if let Err(e) = inner.browser.close().await {
                warn!("Failed to close browser cleanly: {e}");
            }
            if let Err(e) = inner.browser.wait().await {
                warn!("Failed to wait for browser exit: {e}");
            }
            inner.handler.abort();
        }
    }
}
