//! Recipe detail extraction from embedded structured data
//!
//! Recipe pages embed a schema.org description in JSON-LD script blocks.
//! Reading that instead of the visual markup keeps detail extraction
//! stable across layout changes. The block may carry the Recipe object
//! directly, inside a top-level array, or nested in an `@graph` wrapper;
//! instructions come as plain strings, `HowToStep` objects or
//! `HowToSection` groups. A page without any Recipe block is a hard
//! failure for the call.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

use super::types::RecipeDetail;
use crate::error::OdaError;

static LD_JSON: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("script[type='application/ld+json']").expect("ld+json selector is valid")
});

/// Parse the first schema.org Recipe block out of a page's HTML
pub fn parse_recipe_structured_data(html: &str) -> Result<RecipeDetail, OdaError> {
    let document = Html::parse_document(html);
    for script in document.select(&LD_JSON) {
        let text: String = script.text().collect();
        let Ok(value) = serde_json::from_str::<Value>(&text) else {
            debug!("Skipping unparseable ld+json block");
            continue;
        };
        if let Some(node) = find_recipe_node(&value) {
            return map_recipe_node(node);
        }
    }
    Err(OdaError::MissingRecipeData)
}

/// Locate a Recipe-typed object directly, in a top-level array, or in an
/// `@graph` wrapper
fn find_recipe_node(value: &Value) -> Option<&Value> {
    if is_recipe_node(value) {
        return Some(value);
    }
    match value {
        Value::Array(items) => items.iter().find(|item| is_recipe_node(item)),
        Value::Object(map) => map
            .get("@graph")
            .and_then(Value::as_array)
            .and_then(|items| items.iter().find(|item| is_recipe_node(item))),
        _ => None,
    }
}

fn is_recipe_node(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(kind)) => kind == "Recipe",
        Some(Value::Array(kinds)) => kinds.iter().any(|kind| kind.as_str() == Some("Recipe")),
        _ => false,
    }
}

fn map_recipe_node(node: &Value) -> Result<RecipeDetail, OdaError> {
    let Some(name) = node.get("name").and_then(Value::as_str) else {
        return Err(OdaError::MissingRecipeData);
    };
    Ok(RecipeDetail {
        name: name.to_string(),
        description: node
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        ingredients: string_list(node.get("recipeIngredient")),
        instructions: instruction_list(node.get("recipeInstructions")),
        image_url: first_image_url(node.get("image")),
    })
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(single)) => vec![single.clone()],
        _ => Vec::new(),
    }
}

fn instruction_list(value: Option<&Value>) -> Vec<String> {
    let mut steps = Vec::new();
    collect_instructions(value, &mut steps);
    steps
}

fn collect_instructions(value: Option<&Value>, steps: &mut Vec<String>) {
    match value {
        Some(Value::String(text)) => steps.push(text.clone()),
        Some(Value::Array(items)) => {
            for item in items {
                collect_instructions(Some(item), steps);
            }
        }
        Some(Value::Object(map)) => {
            // HowToStep carries its text directly; HowToSection nests
            // further steps under itemListElement.
            if let Some(text) = map.get("text").and_then(Value::as_str) {
                steps.push(text.to_string());
            } else if let Some(nested) = map.get("itemListElement") {
                collect_instructions(Some(nested), steps);
            }
        }
        _ => {}
    }
}

fn first_image_url(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(url)) => Some(url.clone()),
        Some(Value::Array(items)) => items.first().and_then(|first| first_image_url(Some(first))),
        Some(Value::Object(map)) => map
            .get("url")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_with(ld_json: &str) -> String {
        format!(
            "<html><head><script type=\"application/ld+json\">{ld_json}</script></head><body></body></html>"
        )
    }

    #[test]
    fn parses_a_direct_recipe_block() {
        let html = page_with(
            r#"{
                "@context": "https://schema.org",
                "@type": "Recipe",
                "name": "Pasta bolognese",
                "description": "Klassisk kjøttsaus.",
                "image": "https://images.oda.com/pasta.jpg",
                "recipeIngredient": ["400 g pasta", "500 g kjøttdeig"],
                "recipeInstructions": [
                    {"@type": "HowToStep", "text": "Brun kjøttdeigen."},
                    {"@type": "HowToStep", "text": "Kok pastaen."}
                ]
            }"#,
        );
        let detail = parse_recipe_structured_data(&html).unwrap();
        assert_eq!(detail.name, "Pasta bolognese");
        assert_eq!(detail.description, "Klassisk kjøttsaus.");
        assert_eq!(detail.ingredients.len(), 2);
        assert_eq!(
            detail.instructions,
            vec!["Brun kjøttdeigen.".to_string(), "Kok pastaen.".to_string()]
        );
        assert_eq!(detail.image_url.as_deref(), Some("https://images.oda.com/pasta.jpg"));
    }

    #[test]
    fn finds_the_recipe_inside_a_graph_wrapper() {
        let html = page_with(
            r#"{
                "@context": "https://schema.org",
                "@graph": [
                    {"@type": "WebPage", "name": "Oppskrift"},
                    {
                        "@type": "Recipe",
                        "name": "Taco",
                        "recipeIngredient": ["8 lefser"],
                        "recipeInstructions": "Varm lefsene."
                    }
                ]
            }"#,
        );
        let detail = parse_recipe_structured_data(&html).unwrap();
        assert_eq!(detail.name, "Taco");
        assert_eq!(detail.instructions, vec!["Varm lefsene.".to_string()]);
        assert_eq!(detail.image_url, None);
    }

    #[test]
    fn finds_the_recipe_inside_a_top_level_array() {
        let html = page_with(
            r#"[
                {"@type": "BreadcrumbList"},
                {"@type": "Recipe", "name": "Suppe", "image": {"@type": "ImageObject", "url": "https://images.oda.com/suppe.jpg"}}
            ]"#,
        );
        let detail = parse_recipe_structured_data(&html).unwrap();
        assert_eq!(detail.name, "Suppe");
        assert_eq!(detail.image_url.as_deref(), Some("https://images.oda.com/suppe.jpg"));
    }

    #[test]
    fn flattens_how_to_sections() {
        let html = page_with(
            r#"{
                "@type": "Recipe",
                "name": "Gryte",
                "recipeInstructions": [
                    {
                        "@type": "HowToSection",
                        "name": "Forberedelser",
                        "itemListElement": [
                            {"@type": "HowToStep", "text": "Hakk løken."},
                            {"@type": "HowToStep", "text": "Skjær kjøttet."}
                        ]
                    },
                    {"@type": "HowToStep", "text": "La gryta småkoke."}
                ]
            }"#,
        );
        let detail = parse_recipe_structured_data(&html).unwrap();
        assert_eq!(
            detail.instructions,
            vec![
                "Hakk løken.".to_string(),
                "Skjær kjøttet.".to_string(),
                "La gryta småkoke.".to_string(),
            ]
        );
    }

    #[test]
    fn recipe_typed_as_array_is_recognized() {
        let html = page_with(r#"{"@type": ["Recipe", "CreativeWork"], "name": "Salat"}"#);
        let detail = parse_recipe_structured_data(&html).unwrap();
        assert_eq!(detail.name, "Salat");
        assert!(detail.ingredients.is_empty());
    }

    #[test]
    fn page_without_a_recipe_block_is_a_hard_failure() {
        let html = page_with(r#"{"@type": "WebSite", "name": "Oda"}"#);
        assert!(matches!(
            parse_recipe_structured_data(&html),
            Err(OdaError::MissingRecipeData)
        ));

        let plain = "<html><body><h1>Oppskrift</h1></body></html>";
        assert!(matches!(
            parse_recipe_structured_data(plain),
            Err(OdaError::MissingRecipeData)
        ));
    }

    #[test]
    fn image_array_takes_the_first_entry() {
        let html = page_with(
            r#"{"@type": "Recipe", "name": "Pai", "image": ["https://images.oda.com/pai-1.jpg", "https://images.oda.com/pai-2.jpg"]}"#,
        );
        let detail = parse_recipe_structured_data(&html).unwrap();
        assert_eq!(detail.image_url.as_deref(), Some("https://images.oda.com/pai-1.jpg"));
    }
}
