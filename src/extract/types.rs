//! Typed records produced by the page extractors
//!
//! Records are created fresh on every scrape and never merged across
//! calls. Every `index` is a position within the most recent scrape of
//! one page, renumbered from 0 after invalid cards are dropped; it is not
//! a stable identifier of anything on the site. The mapping functions
//! return each record's raw DOM position alongside, because the two
//! diverge as soon as a card is dropped.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One product card from a search listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SearchResult {
    /// Position within the current result set, 0-based
    pub index: usize,
    pub name: String,
    pub subtitle: String,
    /// Price in store currency (NOK)
    pub price: f64,
    /// Price per comparison unit
    pub relative_price: f64,
    /// Unit label for the relative price, e.g. "/l" or "/kg"
    pub relative_price_unit: String,
}

/// A scraped product search page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProductPage {
    /// Canonical URL of the listing; may later be revisited via navigate_to
    pub page_url: String,
    pub items: Vec<SearchResult>,
}

/// One cart line
///
/// The index addresses a cart line and lives in a different index space
/// from search results; the two must never be mixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CartItem {
    /// Position of the line in the cart, 0-based
    pub index: usize,
    pub name: String,
    pub subtitle: String,
    pub quantity: u32,
    pub price: f64,
    pub relative_price: f64,
    pub relative_price_unit: String,
}

/// One recipe card from the recipe listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Recipe {
    /// Position within the current listing, 0-based
    pub index: usize,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Preparation time label as rendered, e.g. "20 min"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// Difficulty label as rendered, e.g. "Enkel"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
}

/// One recipe filter checkbox
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RecipeFilter {
    /// Site-assigned element id; stable across scrapes of the listing
    pub id: String,
    pub name: String,
    /// Number of recipes behind the filter, per its label
    pub count: u32,
    /// Heading of the filter group the checkbox belongs to
    pub category: String,
}

/// A scraped recipe listing page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RecipePage {
    pub page_url: String,
    pub filters: Vec<RecipeFilter>,
    pub items: Vec<Recipe>,
}

/// Structured recipe detail mapped from the page's JSON-LD block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RecipeDetail {
    pub name: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

// ============================================================================
// Raw extraction contract
// ============================================================================

/// Raw product card as returned by the in-page extraction script
///
/// The scripts return arrays of loosely shaped mappings with nullable
/// fields. Required fields are validated during mapping; a card missing
/// one is skipped and the survivors renumbered from 0. `dom_index` is
/// the card's position in the page's raw article list and keeps a
/// survivor addressable after its neighbours are dropped.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProductCard {
    #[serde(default)]
    pub dom_index: Option<usize>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub price_text: Option<String>,
    #[serde(default)]
    pub relative_price_text: Option<String>,
}

/// Raw cart line as returned by the in-page extraction script
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCartCard {
    #[serde(default)]
    pub dom_index: Option<usize>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub quantity_text: Option<String>,
    #[serde(default)]
    pub price_text: Option<String>,
    #[serde(default)]
    pub relative_price_text: Option<String>,
}

/// Raw recipe link as returned by the in-page extraction script
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecipeCard {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Short text fragments from the card (duration, difficulty, tags)
    #[serde(default)]
    pub meta_texts: Vec<String>,
}

/// Raw filter checkbox as returned by the in-page extraction script
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFilterCard {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}
