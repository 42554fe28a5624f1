//! Structured extraction off the live DOM
//!
//! Each listing is pulled with one batched in-page script returning an
//! array of loosely shaped cards, then mapped into typed records by pure
//! functions. A card that fails required-field validation is skipped and
//! the survivors renumbered from 0, so one broken card never aborts a
//! scrape. Recipe detail extraction reads the page's embedded JSON-LD
//! instead of scraping the visual markup.

pub mod js_scripts;
pub mod types;

mod cart;
mod products;
mod recipe_detail;
mod recipes;

pub use cart::{extract_cart_items, map_cart_cards};
pub use products::{extract_search_results, map_product_cards};
pub use recipe_detail::parse_recipe_structured_data;
pub use recipes::{
    extract_recipe_filters, extract_recipes, is_recipe_url, map_filter_cards, map_recipe_cards,
};
pub use types::{
    CartItem, ProductPage, Recipe, RecipeDetail, RecipeFilter, RecipePage, SearchResult,
};

use anyhow::{Context, Result};
use chromiumoxide::page::Page;
use serde::de::DeserializeOwned;

/// Run a card extraction script and deserialize its array payload
pub(crate) async fn evaluate_cards<T>(page: &Page, script: &str) -> Result<Vec<T>>
where
    T: DeserializeOwned,
{
    let outcome = page
        .evaluate(script)
        .await
        .context("Card extraction script failed")?;
    let cards: Vec<T> = outcome
        .into_value()
        .context("Card payload did not match the extraction contract")?;
    Ok(cards)
}
