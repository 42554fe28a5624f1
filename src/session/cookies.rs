//! Cookie persistence across server runs
//!
//! Login state lives in cookies. They are snapshotted to `cookies.json`
//! in the data dir and loaded back into the browser before the first
//! navigation, so a session authenticated once through the auth flow
//! stays authenticated for later runs.

use std::path::Path;

use anyhow::{Context, Result};
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::network::{Cookie, CookieParam};
use tracing::{debug, info};

/// Snapshot the browser's current cookies to `path`
pub async fn save_cookies(page: &Page, path: &Path) -> Result<()> {
    let cookies = page
        .get_cookies()
        .await
        .context("Failed to read cookies from the browser")?;
    write_cookie_file(path, &cookies)
}

/// Serialize a cookie snapshot to disk, creating the data dir if needed
pub fn write_cookie_file(path: &Path, cookies: &[Cookie]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(cookies).context("Failed to serialize cookies")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    debug!("Saved {} cookies to {}", cookies.len(), path.display());
    Ok(())
}

/// Load a previously saved cookie snapshot; a missing file is an empty set
pub fn load_cookie_file(path: &Path) -> Result<Vec<CookieParam>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&json).context("Cookie file does not hold a valid cookie list")
}

/// Restore saved cookies into the browser, returning how many were set
pub async fn restore_cookies(page: &Page, path: &Path) -> Result<usize> {
    let cookies = load_cookie_file(path)?;
    if cookies.is_empty() {
        debug!("No saved cookies to restore");
        return Ok(0);
    }
    let count = cookies.len();
    page.set_cookies(cookies)
        .await
        .context("Failed to restore cookies into the browser")?;
    info!("Restored {count} saved cookies");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_cookie_file_is_an_empty_set() {
        let dir = tempfile::tempdir().unwrap();
        let cookies = load_cookie_file(&dir.path().join("cookies.json")).unwrap();
        assert!(cookies.is_empty());
    }

    #[test]
    fn loads_a_saved_snapshot_back_as_cookie_params() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        std::fs::write(
            &path,
            r#"[{
                "name": "sessionid",
                "value": "abc123",
                "domain": ".oda.com",
                "path": "/",
                "expires": 1893456000.0,
                "size": 16,
                "httpOnly": true,
                "secure": true,
                "session": false,
                "priority": "Medium",
                "sameParty": false,
                "sourceScheme": "Secure",
                "sourcePort": 443
            }]"#,
        )
        .unwrap();

        let cookies = load_cookie_file(&path).unwrap();
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].name, "sessionid");
        assert_eq!(cookies[0].value, "abc123");
        assert_eq!(cookies[0].domain.as_deref(), Some(".oda.com"));
    }

    #[test]
    fn writes_into_a_fresh_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cookies.json");
        write_cookie_file(&path, &[]).unwrap();
        assert!(load_cookie_file(&path).unwrap().is_empty());
    }

    #[test]
    fn corrupt_cookie_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(load_cookie_file(&path).is_err());
    }
}
