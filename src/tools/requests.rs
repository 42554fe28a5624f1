//! Request parameter types for the tool surface
//!
//! Field doc comments become the parameter descriptions in the generated
//! tool schemas.

use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchProductsRequest {
    /// Product search query, e.g. "melk" or "grandiosa pizza"
    pub query: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddToCartRequest {
    /// Index of the product in the current search results
    pub index: usize,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RemoveFromCartRequest {
    /// Index of the line item in the current cart contents
    pub index: usize,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchRecipesRequest {
    /// Optional search term; omit to browse the full recipe listing
    pub query: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RecipeFilterRequest {
    /// Filter ids from the current recipe listing's `filters`
    pub filter_ids: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RecipeDetailsRequest {
    /// Index of the recipe in the current recipe listing
    pub index: usize,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RecipePortionsRequest {
    /// Number of portions to add the recipe's ingredients for
    pub portions: u32,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct NavigateRequest {
    /// Target URL; must have been issued by an earlier operation
    pub url: String,
}
