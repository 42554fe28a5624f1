//! Product card extraction

use anyhow::Result;
use chromiumoxide::page::Page;
use tracing::debug;

use super::js_scripts;
use super::types::{RawProductCard, SearchResult};
use crate::parse::{parse_price, parse_relative_price};

/// Scrape every product card from the current search listing
///
/// Returns the typed results plus each result's position among the
/// page's article elements, in matching order.
pub async fn extract_search_results(page: &Page) -> Result<(Vec<SearchResult>, Vec<usize>)> {
    let raw = super::evaluate_cards::<RawProductCard>(page, js_scripts::PRODUCT_CARDS_SCRIPT).await?;
    Ok(map_product_cards(raw))
}

/// Map raw product cards into typed results
///
/// A card without a name or price text is dropped; survivors are indexed
/// consecutively from 0 in DOM order. The second vector holds each
/// survivor's raw article position, so `items[i]` sits at article
/// `dom_indices[i]` on the page even when earlier cards were dropped.
#[must_use]
pub fn map_product_cards(raw: Vec<RawProductCard>) -> (Vec<SearchResult>, Vec<usize>) {
    let mut items = Vec::with_capacity(raw.len());
    let mut dom_indices = Vec::with_capacity(raw.len());
    for card in raw {
        let (Some(dom_index), Some(name), Some(price_text)) =
            (card.dom_index, card.name, card.price_text)
        else {
            debug!("Skipping product card with missing name or price");
            continue;
        };
        let name = name.trim().to_string();
        if name.is_empty() {
            continue;
        }
        let (relative_price, relative_price_unit) =
            parse_relative_price(card.relative_price_text.as_deref().unwrap_or_default());
        items.push(SearchResult {
            index: items.len(),
            name,
            subtitle: card.subtitle.unwrap_or_default(),
            price: parse_price(&price_text),
            relative_price,
            relative_price_unit,
        });
        dom_indices.push(dom_index);
    }
    (items, dom_indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(dom_index: usize, name: Option<&str>, price: Option<&str>) -> RawProductCard {
        RawProductCard {
            dom_index: Some(dom_index),
            name: name.map(str::to_string),
            subtitle: Some("Tine, 1 l".to_string()),
            price_text: price.map(str::to_string),
            relative_price_text: Some("24,72 kr /l".to_string()),
        }
    }

    #[test]
    fn maps_a_complete_card() {
        let (items, dom_indices) = map_product_cards(vec![card(0, Some("Lettmelk"), Some("24,70 kr"))]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].index, 0);
        assert_eq!(items[0].name, "Lettmelk");
        assert_eq!(items[0].price, 24.70);
        assert_eq!(items[0].relative_price, 24.72);
        assert_eq!(items[0].relative_price_unit, "/l");
        assert_eq!(dom_indices, vec![0]);
    }

    #[test]
    fn skips_invalid_cards_and_renumbers() {
        let (items, dom_indices) = map_product_cards(vec![
            card(0, Some("Lettmelk"), Some("24,70 kr")),
            card(1, None, Some("10,00 kr")),
            card(2, Some("Skummet melk"), None),
            card(3, Some("Helmelk"), Some("25,90 kr")),
        ]);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].index, 0);
        assert_eq!(items[0].name, "Lettmelk");
        assert_eq!(items[1].index, 1);
        assert_eq!(items[1].name, "Helmelk");
        // Renumbered indices still point back at the right articles.
        assert_eq!(dom_indices, vec![0, 3]);
    }

    #[test]
    fn mapping_is_idempotent_for_an_unchanged_payload() {
        let raw = vec![
            card(0, Some("Lettmelk"), Some("24,70 kr")),
            card(1, Some("Helmelk"), Some("25,90 kr")),
        ];
        let first = map_product_cards(raw.clone());
        let second = map_product_cards(raw);
        assert_eq!(first, second);
    }

    #[test]
    fn missing_optional_fields_default_to_empty() {
        let raw = vec![RawProductCard {
            dom_index: Some(0),
            name: Some("Banan".to_string()),
            subtitle: None,
            price_text: Some("4,90 kr".to_string()),
            relative_price_text: None,
        }];
        let (items, _) = map_product_cards(raw);
        assert_eq!(items[0].subtitle, "");
        assert_eq!(items[0].relative_price, 0.0);
        assert_eq!(items[0].relative_price_unit, "");
    }
}
