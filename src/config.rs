//! Runtime configuration
//!
//! Holds the data directory, the headless toggle and every bounded wait
//! used by the navigation layer. The wait values are tuned against the
//! live site's latency profile; no correctness property depends on their
//! exact magnitude, only on each wait eventually expiring.

use std::path::PathBuf;
use std::time::Duration;

/// Top-level server configuration assembled from the CLI
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directory holding the Chrome profile and saved cookies
    pub data_dir: PathBuf,
    /// Run Chrome without a visible window
    pub headless: bool,
    /// Bounded waits for navigation synchronization
    pub waits: WaitConfig,
}

impl ServerConfig {
    /// Default data directory (`~/.mcp-oda`)
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(".mcp-oda")
    }

    /// Location of the saved cookie set
    #[must_use]
    pub fn cookie_file(&self) -> PathBuf {
        self.data_dir.join("cookies.json")
    }

    /// Persistent Chrome profile directory
    ///
    /// Must survive restarts: the login session lives here.
    #[must_use]
    pub fn profile_dir(&self) -> PathBuf {
        self.data_dir.join("chrome-profile")
    }

    /// Cache directory for a managed Chromium download
    #[must_use]
    pub fn chromium_cache_dir(&self) -> PathBuf {
        self.data_dir.join("chromium")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            data_dir: Self::default_data_dir(),
            headless: true,
            waits: WaitConfig::default(),
        }
    }
}

/// Bounded waits used by the navigation controller
///
/// Every synchronization wait in the session is drawn from here so the
/// values stay adjustable in one place.
#[derive(Debug, Clone)]
pub struct WaitConfig {
    /// Maximum wait for the URL to change after a pagination click
    pub url_change: Duration,
    /// Maximum wait for `document.readyState` to reach `complete`
    pub page_idle: Duration,
    /// Maximum wait for a listing fingerprint to change after pagination
    pub listing_change: Duration,
    /// Poll interval shared by the readiness and fingerprint loops
    pub poll_interval: Duration,
    /// Fixed grace delay absorbing trailing DOM mutations
    pub settle_grace: Duration,
    /// Maximum wait for an action control to become visible and enabled
    pub control_ready: Duration,
    /// Maximum wait for the cart endpoint to acknowledge a mutation
    pub cart_response: Duration,
    /// Maximum wait for one of the cart readiness markers to appear
    pub cart_markers: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            url_change: Duration::from_secs(2),
            page_idle: Duration::from_secs(10),
            listing_change: Duration::from_secs(5),
            poll_interval: Duration::from_millis(200),
            settle_grace: Duration::from_millis(500),
            control_ready: Duration::from_secs(5),
            cart_response: Duration::from_secs(10),
            cart_markers: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_waits_are_bounded() {
        let waits = WaitConfig::default();
        assert!(waits.poll_interval < waits.listing_change);
        assert!(waits.settle_grace < waits.page_idle);
        assert_eq!(waits.url_change, Duration::from_secs(2));
        assert_eq!(waits.cart_response, Duration::from_secs(10));
    }

    #[test]
    fn data_dir_paths_nest_under_the_data_dir() {
        let config = ServerConfig {
            data_dir: PathBuf::from("/tmp/oda-test"),
            ..ServerConfig::default()
        };
        assert_eq!(config.cookie_file(), PathBuf::from("/tmp/oda-test/cookies.json"));
        assert!(config.profile_dir().starts_with(&config.data_dir));
        assert!(config.chromium_cache_dir().starts_with(&config.data_dir));
    }
}
