//! Cart line extraction

use anyhow::Result;
use chromiumoxide::page::Page;
use tracing::debug;

use super::js_scripts;
use super::types::{CartItem, RawCartCard};
use crate::parse::{parse_price, parse_quantity, parse_relative_price};

/// Scrape every cart line from the cart page
///
/// Returns the typed lines plus each line's position among the page's
/// article elements, in matching order.
pub async fn extract_cart_items(page: &Page) -> Result<(Vec<CartItem>, Vec<usize>)> {
    let raw = super::evaluate_cards::<RawCartCard>(page, js_scripts::CART_CARDS_SCRIPT).await?;
    Ok(map_cart_cards(raw))
}

/// Map raw cart cards into typed cart lines
///
/// A line needs a name, a quantity input and a price to count; anything
/// else is a decorative article in the cart layout and is dropped. The
/// second vector holds each survivor's raw article position, so
/// `items[i]` sits at article `dom_indices[i]` on the page even when
/// decorative articles were dropped.
#[must_use]
pub fn map_cart_cards(raw: Vec<RawCartCard>) -> (Vec<CartItem>, Vec<usize>) {
    let mut items = Vec::with_capacity(raw.len());
    let mut dom_indices = Vec::with_capacity(raw.len());
    for card in raw {
        let (Some(dom_index), Some(name), Some(quantity_text), Some(price_text)) =
            (card.dom_index, card.name, card.quantity_text, card.price_text)
        else {
            debug!("Skipping cart card with missing name, quantity or price");
            continue;
        };
        let name = name.trim().to_string();
        if name.is_empty() {
            continue;
        }
        let (relative_price, relative_price_unit) =
            parse_relative_price(card.relative_price_text.as_deref().unwrap_or_default());
        items.push(CartItem {
            index: items.len(),
            name,
            subtitle: card.subtitle.unwrap_or_default(),
            quantity: parse_quantity(&quantity_text),
            price: parse_price(&price_text),
            relative_price,
            relative_price_unit,
        });
        dom_indices.push(dom_index);
    }
    (items, dom_indices)
}
