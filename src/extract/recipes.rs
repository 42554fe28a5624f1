//! Recipe listing extraction
//!
//! The recipe listing mixes real recipe links with category and
//! navigation links in the same DOM containers, so the mapping applies a
//! structural URL predicate and per-URL deduplication before assigning
//! indices. The scraped URLs are handed back separately: the session
//! keeps them for index-to-URL resolution but they are not part of the
//! `Recipe` record.

use std::collections::HashSet;

use anyhow::Result;
use chromiumoxide::page::Page;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use url::Url;

use super::js_scripts;
use super::types::{RawFilterCard, RawRecipeCard, Recipe, RecipeFilter};
use crate::parse::parse_filter_label;

/// A recipe path sits directly under the recipes prefix with a numeric
/// leading segment: `/no/recipes/123-pasta-bolognese/`
static RECIPE_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/(?:[^/]+/)*recipes/\d[^/]*/?$").expect("recipe path pattern is valid")
});

static DURATION_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:under\s+|over\s+)?\d+\s*min$").expect("duration pattern is valid"));

const DIFFICULTY_LABELS: [&str; 3] = ["Enkel", "Middels", "Avansert"];

/// Scrape the recipe cards off the current listing
///
/// Returns the typed records plus the recipe URLs in matching order.
pub async fn extract_recipes(page: &Page) -> Result<(Vec<Recipe>, Vec<String>)> {
    let raw = super::evaluate_cards::<RawRecipeCard>(page, js_scripts::RECIPE_CARDS_SCRIPT).await?;
    Ok(map_recipe_cards(raw))
}

/// Scrape the filter checkboxes off the current listing
pub async fn extract_recipe_filters(page: &Page) -> Result<Vec<RecipeFilter>> {
    let raw = super::evaluate_cards::<RawFilterCard>(page, js_scripts::RECIPE_FILTERS_SCRIPT).await?;
    Ok(map_filter_cards(raw))
}

/// True when `href` points at a single recipe page
///
/// Links sharing the listing's DOM containers but pointing elsewhere (the
/// listing itself, category pages) have a non-digit segment after
/// `recipes/` and are rejected.
#[must_use]
pub fn is_recipe_url(href: &str) -> bool {
    let Ok(url) = Url::parse(href) else {
        return false;
    };
    RECIPE_PATH.is_match(url.path())
}

/// Map raw recipe links into typed records plus their URLs
///
/// Duplicate URLs keep their first occurrence; indices are assigned after
/// filtering so they stay consecutive from 0.
#[must_use]
pub fn map_recipe_cards(raw: Vec<RawRecipeCard>) -> (Vec<Recipe>, Vec<String>) {
    let mut items = Vec::new();
    let mut urls = Vec::new();
    let mut seen = HashSet::new();
    for card in raw {
        let (Some(url), Some(name)) = (card.url, card.name) else {
            debug!("Skipping recipe card with missing url or name");
            continue;
        };
        if !is_recipe_url(&url) || !seen.insert(url.clone()) {
            continue;
        }
        let name = name.trim().to_string();
        if name.is_empty() {
            continue;
        }
        let (duration, difficulty) = split_meta(&card.meta_texts);
        items.push(Recipe {
            index: items.len(),
            name,
            image_url: card.image_url,
            duration,
            difficulty,
        });
        urls.push(url);
    }
    (items, urls)
}

/// Map raw filter checkboxes into typed filters
#[must_use]
pub fn map_filter_cards(raw: Vec<RawFilterCard>) -> Vec<RecipeFilter> {
    let mut filters = Vec::with_capacity(raw.len());
    for card in raw {
        let (Some(id), Some(label)) = (card.id, card.label) else {
            continue;
        };
        let (name, count) = parse_filter_label(&label);
        if name.is_empty() {
            continue;
        }
        filters.push(RecipeFilter {
            id,
            name,
            count,
            category: card.category.unwrap_or_default(),
        });
    }
    filters
}

/// Pick the duration and difficulty labels out of a card's text fragments
fn split_meta(meta_texts: &[String]) -> (Option<String>, Option<String>) {
    let mut duration = None;
    let mut difficulty = None;
    for text in meta_texts {
        let text = text.trim();
        if duration.is_none() && DURATION_TEXT.is_match(text) {
            duration = Some(text.to_string());
        } else if difficulty.is_none() && DIFFICULTY_LABELS.contains(&text) {
            difficulty = Some(text.to_string());
        }
    }
    (duration, difficulty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_recipe_paths_with_numeric_leading_segment() {
        assert!(is_recipe_url("https://oda.com/no/recipes/123-pasta-bolognese/"));
        assert!(is_recipe_url("https://oda.com/no/recipes/4512-taco/"));
        assert!(is_recipe_url("https://oda.com/no/recipes/77-suppe"));
    }

    #[test]
    fn rejects_non_recipe_paths() {
        assert!(!is_recipe_url("https://oda.com/no/recipes/all/"));
        assert!(!is_recipe_url("https://oda.com/no/recipes/all/?search=taco"));
        assert!(!is_recipe_url("https://oda.com/no/recipes/categories/middag/"));
        assert!(!is_recipe_url("https://oda.com/no/recipes/123-pasta/reviews/"));
        assert!(!is_recipe_url("https://oda.com/no/search/products/?q=melk"));
        assert!(!is_recipe_url("not a url"));
    }

    fn recipe_card(url: &str, name: &str) -> RawRecipeCard {
        RawRecipeCard {
            url: Some(url.to_string()),
            name: Some(name.to_string()),
            image_url: None,
            meta_texts: vec!["30 min".to_string(), "Enkel".to_string()],
        }
    }

    #[test]
    fn dedups_by_url_and_renumbers() {
        let (items, urls) = map_recipe_cards(vec![
            recipe_card("https://oda.com/no/recipes/1-taco/", "Taco"),
            recipe_card("https://oda.com/no/recipes/all/", "Alle oppskrifter"),
            recipe_card("https://oda.com/no/recipes/1-taco/", "Taco"),
            recipe_card("https://oda.com/no/recipes/2-lasagne/", "Lasagne"),
        ]);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].index, 0);
        assert_eq!(items[0].name, "Taco");
        assert_eq!(items[1].index, 1);
        assert_eq!(items[1].name, "Lasagne");
        assert_eq!(
            urls,
            vec![
                "https://oda.com/no/recipes/1-taco/".to_string(),
                "https://oda.com/no/recipes/2-lasagne/".to_string(),
            ]
        );
    }

    #[test]
    fn splits_duration_and_difficulty_from_meta_texts() {
        let (items, _) = map_recipe_cards(vec![RawRecipeCard {
            url: Some("https://oda.com/no/recipes/9-gryte/".to_string()),
            name: Some("Gryte".to_string()),
            image_url: Some("https://images.oda.com/gryte.jpg".to_string()),
            meta_texts: vec![
                "Ny".to_string(),
                "Under 20 min".to_string(),
                "Middels".to_string(),
            ],
        }]);
        assert_eq!(items[0].duration.as_deref(), Some("Under 20 min"));
        assert_eq!(items[0].difficulty.as_deref(), Some("Middels"));
        assert_eq!(items[0].image_url.as_deref(), Some("https://images.oda.com/gryte.jpg"));
    }

    #[test]
    fn maps_filter_labels_through_the_label_parser() {
        let filters = map_filter_cards(vec![
            RawFilterCard {
                id: Some("filter-middag".to_string()),
                label: Some("Middag (12)".to_string()),
                category: Some("Måltid".to_string()),
            },
            RawFilterCard {
                id: Some("filter-orphan".to_string()),
                label: None,
                category: None,
            },
        ]);
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].id, "filter-middag");
        assert_eq!(filters[0].name, "Middag");
        assert_eq!(filters[0].count, 12);
        assert_eq!(filters[0].category, "Måltid");
    }
}
