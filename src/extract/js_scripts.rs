//! JavaScript evaluation scripts
//!
//! In-page payloads used for bulk card extraction and for cheap state
//! probes. Each listing is pulled with a single batched script so a
//! scrape costs one CDP round-trip regardless of how many cards the page
//! shows. The scripts return JSON arrays matching the raw-card contract
//! in [`types`](super::types); missing values are explicit `null`s.

use once_cell::sync::Lazy;

use crate::site::{CART_EMPTY_TEXT, CART_READY_TEXT};

/// Extract all product cards from a search listing
///
/// Card layout: the name paragraph, a first subdued paragraph holding the
/// subtitle, and a last subdued paragraph holding the relative price (the
/// same element when the card only renders one). `dom_index` is the
/// card's position in the page's raw article list, which the marker
/// scripts below index into.
pub const PRODUCT_CARDS_SCRIPT: &str = r#"
    (() => {
        const cards = [];
        document.querySelectorAll('article').forEach((article, position) => {
            const name = article.querySelector('p.k-text-style--title-xxs');
            const subdued = article.querySelectorAll('p.k-text-color--subdued');
            const price = article.querySelector('span.k-text--weight-bold.k-text-color--default');
            cards.push({
                dom_index: position,
                name: name ? name.innerText.trim() : null,
                subtitle: subdued.length ? subdued[0].innerText.trim() : null,
                price_text: price ? price.innerText.trim() : null,
                relative_price_text: subdued.length ? subdued[subdued.length - 1].innerText.trim() : null
            });
        });
        return cards;
    })()
"#;

/// Extract all cart lines from the cart page
pub const CART_CARDS_SCRIPT: &str = r#"
    (() => {
        const cards = [];
        document.querySelectorAll('article').forEach((article, position) => {
            const name = article.querySelector('h1');
            const info = article.querySelectorAll('.styles_ProductInfoText__bDdwb span');
            const quantity = article.querySelector("input[data-testid='cart-buttons-quantity']");
            const bold = article.querySelectorAll('.k-text--weight-bold');
            const subdued = article.querySelectorAll('.k-text-color--subdued');
            cards.push({
                dom_index: position,
                name: name ? name.innerText.trim() : null,
                subtitle: info.length ? info[0].innerText.trim() : null,
                quantity_text: quantity ? quantity.value : null,
                price_text: bold.length ? bold[bold.length - 1].innerText.trim() : null,
                relative_price_text: subdued.length ? subdued[subdued.length - 1].innerText.trim() : null
            });
        });
        return cards;
    })()
"#;

/// Extract all recipe links from the recipe listing
///
/// Returns every anchor under the recipes prefix, including duplicates
/// and non-recipe navigation links; deduplication and the structural URL
/// predicate are applied during mapping where they are testable.
pub const RECIPE_CARDS_SCRIPT: &str = r#"
    (() => {
        const cards = [];
        document.querySelectorAll("a[href*='/recipes/']").forEach(link => {
            const heading = link.querySelector('h1, h2, h3, p.k-text-style--title-xxs');
            const image = link.querySelector('img');
            const meta = Array.from(link.querySelectorAll('span'))
                .map(span => span.innerText.trim())
                .filter(text => text.length > 0);
            cards.push({
                url: link.href,
                name: heading ? heading.innerText.trim() : null,
                image_url: image ? image.src : null,
                meta_texts: meta
            });
        });
        return cards;
    })()
"#;

/// Extract all recipe filter checkboxes with their labels and group headings
pub const RECIPE_FILTERS_SCRIPT: &str = r#"
    (() => {
        const cards = [];
        document.querySelectorAll("input[type='checkbox']").forEach(input => {
            if (!input.id) { return; }
            const label = document.querySelector("label[for='" + input.id + "']");
            const group = input.closest('fieldset');
            const legend = group ? group.querySelector('legend') : null;
            cards.push({
                id: input.id,
                label: label ? label.innerText.trim() : null,
                category: legend ? legend.innerText.trim() : null
            });
        });
        return cards;
    })()
"#;

/// First product card's name, used as the listing fingerprint
pub const PRODUCT_FINGERPRINT_SCRIPT: &str = r#"
    (() => {
        const name = document.querySelector('article p.k-text-style--title-xxs');
        return name ? name.innerText.trim() : null;
    })()
"#;

/// First recipe card's name, used as the listing fingerprint
pub const RECIPE_FINGERPRINT_SCRIPT: &str = r#"
    (() => {
        const link = document.querySelector("a[href*='/recipes/']");
        if (!link) { return null; }
        const heading = link.querySelector('h1, h2, h3, p.k-text-style--title-xxs');
        return heading ? heading.innerText.trim() : null;
    })()
"#;

/// True once either cart readiness marker is rendered
///
/// Built from the marker texts in [`site`](crate::site) so the script
/// cannot drift from the strings it checks for.
pub static CART_READY_SCRIPT: Lazy<String> = Lazy::new(|| {
    CART_READY_TEMPLATE
        .replace("__READY__", &format!("{CART_READY_TEXT:?}"))
        .replace("__EMPTY__", &format!("{CART_EMPTY_TEXT:?}"))
});

const CART_READY_TEMPLATE: &str = r#"
    (() => {
        const texts = Array.from(document.querySelectorAll('span')).map(s => s.innerText.trim());
        return texts.includes(__READY__) || texts.includes(__EMPTY__);
    })()
"#;

/// Id of the listbox holding the portion options, located through the
/// `aria-controls` relationship of its trigger
pub const PORTIONS_LISTBOX_SCRIPT: &str = r#"
    (() => {
        const triggers = Array.from(document.querySelectorAll('[aria-controls]'));
        for (const trigger of triggers) {
            const target = document.getElementById(trigger.getAttribute('aria-controls'));
            if (target && target.getAttribute('role') === 'listbox') {
                return trigger.getAttribute('aria-controls');
            }
        }
        return null;
    })()
"#;

/// Selector for the control most recently tagged by one of the marker
/// scripts below
///
/// The scripts verify a control is visible and enabled, then tag it so
/// the follow-up CDP click can address it with a plain page-level
/// selector regardless of how deep in a card it sits. Each run clears the
/// previous tag first.
pub const MARKED_CONTROL_SELECTOR: &str = "[data-mcp-click]";

/// Tag the page-wide control with the given accessible label if it is
/// present, visible and enabled; returns whether a control was tagged
#[must_use]
pub fn mark_labeled_control(label: &str) -> String {
    LABELED_CONTROL_TEMPLATE.replace("__LABEL__", &format!("{label:?}"))
}

const LABELED_CONTROL_TEMPLATE: &str = r#"
    (() => {
        document.querySelectorAll('[data-mcp-click]').forEach(el => el.removeAttribute('data-mcp-click'));
        const el = document.querySelector('[aria-label=' + JSON.stringify(__LABEL__) + ']');
        if (!el) { return false; }
        const style = window.getComputedStyle(el);
        const rect = el.getBoundingClientRect();
        if (rect.width === 0 || rect.height === 0 || style.visibility === 'hidden' || style.display === 'none') {
            return false;
        }
        if (el.disabled) { return false; }
        el.setAttribute('data-mcp-click', '1');
        return true;
    })()
"#;

/// Tag the control with the given accessible label inside the article at
/// position `dom_index` in the page's raw article list, under the same
/// visibility and enablement requirements
#[must_use]
pub fn mark_article_control(dom_index: usize, label: &str) -> String {
    ARTICLE_CONTROL_TEMPLATE
        .replace("__INDEX__", &dom_index.to_string())
        .replace("__LABEL__", &format!("{label:?}"))
}

const ARTICLE_CONTROL_TEMPLATE: &str = r#"
    (() => {
        document.querySelectorAll('[data-mcp-click]').forEach(el => el.removeAttribute('data-mcp-click'));
        const articles = document.querySelectorAll('article');
        if (__INDEX__ >= articles.length) { return false; }
        const el = articles[__INDEX__].querySelector('[aria-label=' + JSON.stringify(__LABEL__) + ']');
        if (!el) { return false; }
        const style = window.getComputedStyle(el);
        const rect = el.getBoundingClientRect();
        if (rect.width === 0 || rect.height === 0 || style.visibility === 'hidden' || style.display === 'none') {
            return false;
        }
        if (el.disabled) { return false; }
        el.setAttribute('data-mcp-click', '1');
        return true;
    })()
"#;

/// Tag the portion option whose text equals the requested count
///
/// Looks inside the listbox first when its id is known, then falls back
/// to any `role="option"` element on the page.
#[must_use]
pub fn mark_portion_option(listbox_id: &str, portions: u32) -> String {
    PORTION_OPTION_TEMPLATE
        .replace("__LISTBOX__", &format!("{listbox_id:?}"))
        .replace("__PORTIONS__", &format!("{:?}", portions.to_string()))
}

const PORTION_OPTION_TEMPLATE: &str = r#"
    (() => {
        document.querySelectorAll('[data-mcp-click]').forEach(el => el.removeAttribute('data-mcp-click'));
        const want = __PORTIONS__;
        const pools = [];
        const scope = document.getElementById(__LISTBOX__);
        if (scope) { pools.push(scope.querySelectorAll("[role='option']")); }
        pools.push(document.querySelectorAll("[role='option']"));
        for (const pool of pools) {
            for (const option of pool) {
                if (option.innerText.trim() === want) {
                    option.setAttribute('data-mcp-click', '1');
                    return true;
                }
            }
        }
        return false;
    })()
"#;
