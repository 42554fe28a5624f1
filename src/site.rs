//! Fixed points of the Oda storefront
//!
//! URLs, accessible control labels and the cart API endpoint the
//! navigation layer synchronizes on. The labels are the nb-NO strings the
//! live site renders; they double as the accessibility anchors the
//! controls are located by.

use anyhow::{Context, Result};
use url::Url;

pub const CART_URL: &str = "https://oda.com/no/cart/";
pub const PRODUCT_SEARCH_URL: &str = "https://oda.com/no/search/products/";
pub const RECIPE_SEARCH_URL: &str = "https://oda.com/no/recipes/all/";
pub const ACCOUNT_URL: &str = "https://oda.com/no/account/";

/// Substring of the cart mutation API endpoint. A response whose URL
/// contains this with an accepted status is the signal that an add or
/// remove actually landed server-side.
pub const CART_ITEMS_ENDPOINT: &str = "tienda-web-api/v1/cart/items/";

/// Statuses the cart endpoint answers successful mutations with
pub const CART_ACCEPTED_STATUSES: [i64; 3] = [200, 201, 204];

// Accessible labels of the controls the session clicks.
pub const NEXT_PAGE_LABEL: &str = "Neste side";
pub const PREVIOUS_PAGE_LABEL: &str = "Forrige side";
pub const ADD_TO_CART_LABEL: &str = "Legg til i handlekurven";
pub const REMOVE_FROM_CART_LABEL: &str = "Fjern fra handlekurven";
pub const RECIPE_ADD_TO_CART_LABEL: &str = "Legg i handlekurven";

// Either of these spans marks the cart page as fully rendered.
pub const CART_READY_TEXT: &str = "Sjekk handlekurven før du går til kassen og betaler.";
pub const CART_EMPTY_TEXT: &str = "Du har ingen varer i handlekurven.";

pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";

/// Build the product search URL for a query
pub fn product_search_url(query: &str) -> Result<Url> {
    let mut url =
        Url::parse(PRODUCT_SEARCH_URL).context("Failed to parse the product search base URL")?;
    url.query_pairs_mut().append_pair("q", query);
    Ok(url)
}

/// Build the recipe listing URL, optionally narrowed by a search term
pub fn recipe_search_url(query: Option<&str>) -> Result<Url> {
    let mut url =
        Url::parse(RECIPE_SEARCH_URL).context("Failed to parse the recipe listing base URL")?;
    if let Some(query) = query
        && !query.is_empty()
    {
        url.query_pairs_mut().append_pair("search", query);
    }
    Ok(url)
}
