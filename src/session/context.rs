//! Page context classification and operation preconditions
//!
//! Most tool operations only make sense on a particular kind of page: an
//! add-to-cart index addresses the product listing currently shown, a
//! remove index addresses the cart. The context is derived purely from
//! the page URL so it can never disagree with where the browser actually
//! is.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::OdaError;

/// The kind of page the browser is currently on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageContext {
    Cart,
    ProductSearch,
    RecipeSearch,
    RecipeInfo,
}

impl PageContext {
    /// Stable name used in errors and the context resource
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Cart => "cart",
            Self::ProductSearch => "product_search",
            Self::RecipeSearch => "recipe_search",
            Self::RecipeInfo => "recipe_info",
        }
    }
}

impl fmt::Display for PageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Derive the page context from a URL
///
/// The predicates are ordered: the recipe listing lives under the same
/// `/recipes/` prefix as the detail pages, so it must win before the
/// generic recipe match. An unrecognized URL yields `None` and callers
/// leave the previous context in place.
#[must_use]
pub fn classify_url(url: &str) -> Option<PageContext> {
    let parsed = Url::parse(url).ok()?;
    let path = parsed.path();
    if path.contains("/cart/") {
        Some(PageContext::Cart)
    } else if path.contains("/search/products/") {
        Some(PageContext::ProductSearch)
    } else if path.contains("/recipes/all/") {
        Some(PageContext::RecipeSearch)
    } else if path.contains("/recipes/") {
        Some(PageContext::RecipeInfo)
    } else {
        None
    }
}

/// Require the session to be in `expected` context
pub fn require_context(
    current: PageContext,
    expected: PageContext,
    operation: &'static str,
) -> Result<(), OdaError> {
    if current == expected {
        return Ok(());
    }
    Err(OdaError::WrongContext {
        operation,
        expected: expected.name().to_string(),
        actual: current.name().to_string(),
    })
}

/// Require the session to be in any of the `expected` contexts
pub fn require_one_of(
    current: PageContext,
    expected: &[PageContext],
    operation: &'static str,
) -> Result<(), OdaError> {
    if expected.contains(&current) {
        return Ok(());
    }
    let expected = expected
        .iter()
        .map(|context| context.name())
        .collect::<Vec<_>>()
        .join(" or ");
    Err(OdaError::WrongContext {
        operation,
        expected,
        actual: current.name().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_each_page_kind() {
        assert_eq!(
            classify_url("https://oda.com/no/cart/"),
            Some(PageContext::Cart)
        );
        assert_eq!(
            classify_url("https://oda.com/no/search/products/?q=melk"),
            Some(PageContext::ProductSearch)
        );
        assert_eq!(
            classify_url("https://oda.com/no/recipes/all/?search=taco"),
            Some(PageContext::RecipeSearch)
        );
        assert_eq!(
            classify_url("https://oda.com/no/recipes/123-pasta-bolognese/"),
            Some(PageContext::RecipeInfo)
        );
    }

    #[test]
    fn recipe_listing_wins_over_the_generic_recipe_match() {
        // Both predicates match the listing URL; order decides.
        assert_eq!(
            classify_url("https://oda.com/no/recipes/all/"),
            Some(PageContext::RecipeSearch)
        );
    }

    #[test]
    fn unknown_urls_classify_as_none() {
        assert_eq!(classify_url("https://oda.com/no/account/"), None);
        assert_eq!(classify_url("not a url"), None);
        assert_eq!(classify_url(""), None);
    }

    #[test]
    fn context_guard_names_both_states() {
        let error = require_context(
            PageContext::Cart,
            PageContext::ProductSearch,
            "add_to_cart",
        )
        .unwrap_err();
        let text = error.to_string();
        assert!(text.contains("add_to_cart"));
        assert!(text.contains("product_search"));
        assert!(text.contains("cart"));

        assert!(require_context(PageContext::Cart, PageContext::Cart, "remove_from_cart").is_ok());
    }

    #[test]
    fn one_of_guard_accepts_either_context_and_lists_both() {
        let allowed = [PageContext::RecipeSearch, PageContext::RecipeInfo];
        assert!(require_one_of(PageContext::RecipeSearch, &allowed, "get_recipe_details").is_ok());
        assert!(require_one_of(PageContext::RecipeInfo, &allowed, "get_recipe_details").is_ok());

        let error = require_one_of(PageContext::Cart, &allowed, "get_recipe_details").unwrap_err();
        assert!(error.to_string().contains("recipe_search or recipe_info"));
    }

    #[test]
    fn contexts_serialize_in_snake_case() {
        let json = serde_json::to_string(&PageContext::ProductSearch).unwrap();
        assert_eq!(json, r#""product_search""#);
    }
}
