//! Live-site tests against oda.com
//!
//! Ignored by default: they need a Chrome installation and network
//! access, and the cart round-trip additionally needs a saved login in
//! the default data directory (run `oda-mcp --auth` first). Run with
//! `cargo test --test live_site -- --ignored --test-threads=1`.

use std::sync::Arc;

use oda_mcp::config::ServerConfig;
use oda_mcp::extract::{self, js_scripts};
use oda_mcp::nav::{self, Direction};
use oda_mcp::session::{self, PageContext};
use oda_mcp::site;
use oda_mcp::{Session, launch_browser};

async fn throwaway_session() -> (Arc<Session>, tempfile::TempDir) {
    let data_dir = tempfile::tempdir().unwrap();
    let config = ServerConfig {
        data_dir: data_dir.path().to_path_buf(),
        ..ServerConfig::default()
    };
    let browser = launch_browser(&config).await.unwrap();
    let session = Session::new(browser, config).await.unwrap();
    (Arc::new(session), data_dir)
}

#[tokio::test]
#[ignore] // Requires browser installation
async fn product_search_finds_and_pages() {
    let (session, _data_dir) = throwaway_session().await;
    {
        let browsing = session.browsing().await;
        let url = site::product_search_url("melk").unwrap();
        nav::goto_settled(&browsing.page, url.as_str(), session.waits())
            .await
            .unwrap();

        let (first, first_dom) = extract::extract_search_results(&browsing.page).await.unwrap();
        assert!(!first.is_empty());
        assert_eq!(first.len(), first_dom.len());
        assert!(first.iter().any(|item| item.name.to_lowercase().contains("melk")));
        assert!(first.iter().all(|item| item.price > 0.0));

        let moved = nav::paginate(
            &browsing.page,
            Direction::Next,
            js_scripts::PRODUCT_FINGERPRINT_SCRIPT,
            session.waits(),
        )
        .await
        .unwrap();
        if moved {
            let (second, _) = extract::extract_search_results(&browsing.page).await.unwrap();
            assert!(!second.is_empty());
            assert_ne!(first[0].name, second[0].name);
        }
    }
    session.shutdown().await;
}

#[tokio::test]
#[ignore] // Requires browser installation and a saved login
async fn cart_add_remove_round_trip() {
    // Uses the real data directory so the restored cookies carry a login.
    let config = ServerConfig::default();
    let browser = launch_browser(&config).await.unwrap();
    let session = Arc::new(Session::new(browser, config).await.unwrap());
    {
        let browsing = session.browsing().await;
        let url = site::product_search_url("club mate").unwrap();
        nav::goto_settled(&browsing.page, url.as_str(), session.waits())
            .await
            .unwrap();
        let (results, dom_indices) = extract::extract_search_results(&browsing.page).await.unwrap();
        assert!(!results.is_empty());

        let added = nav::modify_cart_item(
            &browsing.page,
            dom_indices[0],
            site::ADD_TO_CART_LABEL,
            session.waits(),
        )
        .await
        .unwrap();
        assert!(added);

        let (items, cart_dom) = session::load_cart(&browsing.page, session.waits()).await.unwrap();
        let line = items
            .iter()
            .position(|item| item.name.to_lowercase().contains("mate"))
            .unwrap();

        let removed = nav::modify_cart_item(
            &browsing.page,
            cart_dom[line],
            site::REMOVE_FROM_CART_LABEL,
            session.waits(),
        )
        .await
        .unwrap();
        assert!(removed);
    }
    session.shutdown().await;
}

#[tokio::test]
#[ignore] // Requires browser installation
async fn recipe_listing_flows_into_structured_details() {
    let (session, _data_dir) = throwaway_session().await;
    {
        let browsing = session.browsing().await;
        let url = site::recipe_search_url(Some("taco")).unwrap();
        nav::goto_settled(&browsing.page, url.as_str(), session.waits())
            .await
            .unwrap();

        let (recipes, urls) = extract::extract_recipes(&browsing.page).await.unwrap();
        assert!(!recipes.is_empty());
        assert_eq!(recipes.len(), urls.len());
        assert!(urls.iter().all(|url| extract::is_recipe_url(url)));

        let filters = extract::extract_recipe_filters(&browsing.page).await.unwrap();
        assert!(!filters.is_empty());

        nav::goto_settled(&browsing.detail_page, &urls[0], session.waits())
            .await
            .unwrap();
        let html = browsing.detail_page.content().await.unwrap();
        let detail = extract::parse_recipe_structured_data(&html).unwrap();
        assert!(!detail.name.is_empty());
        assert!(!detail.ingredients.is_empty());
        assert!(!detail.instructions.is_empty());
    }
    session.shutdown().await;
}

#[tokio::test]
#[ignore] // Requires browser installation
async fn visited_urls_become_trusted_targets() {
    let (session, _data_dir) = throwaway_session().await;
    {
        let browsing = session.browsing().await;
        let url = site::product_search_url("melk").unwrap();
        nav::goto_settled(&browsing.page, url.as_str(), session.waits())
            .await
            .unwrap();
        let page_url = nav::current_url(&browsing.page).await.unwrap();
        session.record_navigation(&page_url);

        assert!(session.is_trusted(&page_url));
        assert!(!session.is_trusted("https://oda.com/no/account/settings/"));
        assert_eq!(session.context(), PageContext::ProductSearch);

        // A trusted URL can be revisited.
        nav::goto_settled(&browsing.page, &page_url, session.waits())
            .await
            .unwrap();
    }
    session.shutdown().await;
}
