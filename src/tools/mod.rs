//! MCP tool facade
//!
//! Exposes the grocery session as MCP tools plus two passive resources.
//! Every operation locks the browsing resource for its whole body, so
//! tool calls are serialized against the browser no matter how the
//! client issues them. Mutation outcomes are `true`/`false` payloads;
//! violated preconditions and untrusted URLs surface as invalid-params
//! errors, everything else as internal errors.

mod requests;

use std::sync::Arc;

use chromiumoxide::Page;
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    service::RequestContext,
    tool, tool_handler, tool_router,
};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use crate::error::OdaError;
use crate::extract::{
    self, ProductPage, RecipePage,
    js_scripts::{PRODUCT_FINGERPRINT_SCRIPT, RECIPE_FINGERPRINT_SCRIPT},
};
use crate::nav::{self, Direction};
use crate::session::{self, PageContext, Session, require_context, require_one_of};
use crate::site;
use requests::{
    AddToCartRequest, NavigateRequest, RecipeDetailsRequest, RecipeFilterRequest,
    RecipePortionsRequest, RemoveFromCartRequest, SearchProductsRequest, SearchRecipesRequest,
};

const CART_RESOURCE_URI: &str = "oda://cart";
const CONTEXT_RESOURCE_URI: &str = "oda://context";

/// MCP server for one grocery browsing session
#[derive(Clone)]
pub struct GroceryServer {
    session: Arc<Session>,
    tool_router: ToolRouter<GroceryServer>,
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string(value).map_err(|error| {
        McpError::internal_error(format!("Failed to serialize the result: {error}"), None)
    })?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn tool_error(error: OdaError) -> McpError {
    if error.is_caller_fault() {
        McpError::invalid_params(error.to_string(), None)
    } else {
        McpError::internal_error(error.to_string(), None)
    }
}

fn internal(error: anyhow::Error) -> McpError {
    McpError::internal_error(format!("{error:#}"), None)
}

#[tool_router]
impl GroceryServer {
    #[must_use]
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            tool_router: Self::tool_router(),
        }
    }

    async fn scrape_product_page(&self, page: &Page) -> Result<ProductPage, McpError> {
        let page_url = nav::current_url(page).await.map_err(internal)?;
        self.session.record_navigation(&page_url);
        let (items, dom_indices) = extract::extract_search_results(page).await.map_err(internal)?;
        self.session.set_product_dom_indices(dom_indices);
        Ok(ProductPage { page_url, items })
    }

    async fn scrape_recipe_page(&self, page: &Page) -> Result<RecipePage, McpError> {
        let page_url = nav::current_url(page).await.map_err(internal)?;
        self.session.record_navigation(&page_url);
        let (items, urls) = extract::extract_recipes(page).await.map_err(internal)?;
        let filters = extract::extract_recipe_filters(page).await.map_err(internal)?;
        self.session.set_recipe_urls(urls);
        Ok(RecipePage {
            page_url,
            filters,
            items,
        })
    }

    async fn paginate_products(
        &self,
        direction: Direction,
        operation: &'static str,
    ) -> Result<CallToolResult, McpError> {
        let browsing = self.session.browsing().await;
        require_context(self.session.context(), PageContext::ProductSearch, operation)
            .map_err(tool_error)?;
        let moved = nav::paginate(
            &browsing.page,
            direction,
            PRODUCT_FINGERPRINT_SCRIPT,
            self.session.waits(),
        )
        .await
        .map_err(internal)?;
        if !moved {
            let page_url = nav::current_url(&browsing.page).await.map_err(internal)?;
            return json_result(&ProductPage {
                page_url,
                items: Vec::new(),
            });
        }
        let result = self.scrape_product_page(&browsing.page).await?;
        json_result(&result)
    }

    async fn paginate_recipes(
        &self,
        direction: Direction,
        operation: &'static str,
    ) -> Result<CallToolResult, McpError> {
        let browsing = self.session.browsing().await;
        require_context(self.session.context(), PageContext::RecipeSearch, operation)
            .map_err(tool_error)?;
        let moved = nav::paginate(
            &browsing.page,
            direction,
            RECIPE_FINGERPRINT_SCRIPT,
            self.session.waits(),
        )
        .await
        .map_err(internal)?;
        if !moved {
            let page_url = nav::current_url(&browsing.page).await.map_err(internal)?;
            return json_result(&RecipePage {
                page_url,
                filters: Vec::new(),
                items: Vec::new(),
            });
        }
        let result = self.scrape_recipe_page(&browsing.page).await?;
        json_result(&result)
    }

    #[tool(
        description = "Search Oda for products. Returns the first page of results; item indexes feed add_to_cart."
    )]
    async fn search_products(
        &self,
        Parameters(SearchProductsRequest { query }): Parameters<SearchProductsRequest>,
    ) -> Result<CallToolResult, McpError> {
        info!("Searching products for {query:?}");
        let browsing = self.session.browsing().await;
        let url = site::product_search_url(&query).map_err(internal)?;
        nav::goto_settled(&browsing.page, url.as_str(), self.session.waits())
            .await
            .map_err(internal)?;
        let result = self.scrape_product_page(&browsing.page).await?;
        json_result(&result)
    }

    #[tool(
        description = "Go to the next page of product search results. Returns an empty item list when there is no next page."
    )]
    async fn search_next(&self) -> Result<CallToolResult, McpError> {
        self.paginate_products(Direction::Next, "search_next").await
    }

    #[tool(
        description = "Go back to the previous page of product search results. Returns an empty item list when already on the first page."
    )]
    async fn search_previous(&self) -> Result<CallToolResult, McpError> {
        self.paginate_products(Direction::Previous, "search_previous")
            .await
    }

    #[tool(
        description = "Open the cart and return its line items. Indexes feed remove_from_cart."
    )]
    async fn get_cart_contents(&self) -> Result<CallToolResult, McpError> {
        let browsing = self.session.browsing().await;
        let (items, dom_indices) = session::load_cart(&browsing.page, self.session.waits())
            .await
            .map_err(internal)?;
        let page_url = nav::current_url(&browsing.page).await.map_err(internal)?;
        self.session.record_navigation(&page_url);
        self.session.set_cart_dom_indices(dom_indices);
        self.session.set_cart(items.clone());
        json_result(&items)
    }

    #[tool(
        description = "Add the product at the given search result index to the cart. Requires a product search to be open; returns true only once the cart confirms."
    )]
    async fn add_to_cart(
        &self,
        Parameters(AddToCartRequest { index }): Parameters<AddToCartRequest>,
    ) -> Result<CallToolResult, McpError> {
        info!("Adding product {index} to the cart");
        let browsing = self.session.browsing().await;
        require_context(self.session.context(), PageContext::ProductSearch, "add_to_cart")
            .map_err(tool_error)?;
        // Snapshot indexes skip dropped cards; the click must address the
        // card's raw article position instead.
        let dom_index = match self.session.product_dom_index(index) {
            Ok(dom_index) => dom_index,
            Err(error) => {
                debug!("{error}");
                return json_result(&false);
            }
        };
        let added = nav::modify_cart_item(
            &browsing.page,
            dom_index,
            site::ADD_TO_CART_LABEL,
            self.session.waits(),
        )
        .await
        .map_err(internal)?;
        drop(browsing);
        if added {
            self.session.spawn_cart_refresh().await;
        }
        json_result(&added)
    }

    #[tool(
        description = "Remove the line item at the given cart index. Requires the cart to be open; returns true only once the cart confirms."
    )]
    async fn remove_from_cart(
        &self,
        Parameters(RemoveFromCartRequest { index }): Parameters<RemoveFromCartRequest>,
    ) -> Result<CallToolResult, McpError> {
        info!("Removing cart item {index}");
        let browsing = self.session.browsing().await;
        require_context(self.session.context(), PageContext::Cart, "remove_from_cart")
            .map_err(tool_error)?;
        let dom_index = match self.session.cart_dom_index(index) {
            Ok(dom_index) => dom_index,
            Err(error) => {
                debug!("{error}");
                return json_result(&false);
            }
        };
        let removed = nav::modify_cart_item(
            &browsing.page,
            dom_index,
            site::REMOVE_FROM_CART_LABEL,
            self.session.waits(),
        )
        .await
        .map_err(internal)?;
        drop(browsing);
        if removed {
            self.session.spawn_cart_refresh().await;
        }
        json_result(&removed)
    }

    #[tool(
        description = "Browse Oda's recipes, optionally narrowed by a search term. Returns recipes plus the available filters."
    )]
    async fn search_recipes(
        &self,
        Parameters(SearchRecipesRequest { query }): Parameters<SearchRecipesRequest>,
    ) -> Result<CallToolResult, McpError> {
        info!("Searching recipes for {query:?}");
        let browsing = self.session.browsing().await;
        let url = site::recipe_search_url(query.as_deref()).map_err(internal)?;
        nav::goto_settled(&browsing.page, url.as_str(), self.session.waits())
            .await
            .map_err(internal)?;
        let result = self.scrape_recipe_page(&browsing.page).await?;
        json_result(&result)
    }

    #[tool(
        description = "Toggle recipe filters by id on the current recipe listing and return the narrowed results. Unknown ids are skipped."
    )]
    async fn search_recipes_filter(
        &self,
        Parameters(RecipeFilterRequest { filter_ids }): Parameters<RecipeFilterRequest>,
    ) -> Result<CallToolResult, McpError> {
        info!("Applying {} recipe filters", filter_ids.len());
        let browsing = self.session.browsing().await;
        require_context(
            self.session.context(),
            PageContext::RecipeSearch,
            "search_recipes_filter",
        )
        .map_err(tool_error)?;
        nav::apply_filters(&browsing.page, &filter_ids, self.session.waits()).await;
        let result = self.scrape_recipe_page(&browsing.page).await?;
        json_result(&result)
    }

    #[tool(
        description = "Go to the next page of recipe results. Returns an empty item list when there is no next page."
    )]
    async fn search_recipes_next(&self) -> Result<CallToolResult, McpError> {
        self.paginate_recipes(Direction::Next, "search_recipes_next")
            .await
    }

    #[tool(
        description = "Go back to the previous page of recipe results. Returns an empty item list when already on the first page."
    )]
    async fn search_recipes_previous(&self) -> Result<CallToolResult, McpError> {
        self.paginate_recipes(Direction::Previous, "search_recipes_previous")
            .await
    }

    #[tool(
        description = "Open the recipe at the given recipe listing index and return its details: description, ingredients and instructions."
    )]
    async fn get_recipe_details(
        &self,
        Parameters(RecipeDetailsRequest { index }): Parameters<RecipeDetailsRequest>,
    ) -> Result<CallToolResult, McpError> {
        info!("Opening recipe {index}");
        let browsing = self.session.browsing().await;
        require_one_of(
            self.session.context(),
            &[PageContext::RecipeSearch, PageContext::RecipeInfo],
            "get_recipe_details",
        )
        .map_err(tool_error)?;
        let url = self.session.recipe_url(index).map_err(tool_error)?;
        nav::goto_settled(&browsing.detail_page, &url, self.session.waits())
            .await
            .map_err(internal)?;
        let detail_url = nav::current_url(&browsing.detail_page).await.map_err(internal)?;
        self.session.record_navigation(&detail_url);
        let html = browsing.detail_page.content().await.map_err(|error| {
            McpError::internal_error(format!("Failed to read the recipe page: {error}"), None)
        })?;
        let detail = extract::parse_recipe_structured_data(&html).map_err(tool_error)?;
        json_result(&detail)
    }

    #[tool(
        description = "Add the open recipe's ingredients to the cart for the given number of portions. Requires get_recipe_details first; returns true only once the cart confirms."
    )]
    async fn add_recipe_to_cart(
        &self,
        Parameters(RecipePortionsRequest { portions }): Parameters<RecipePortionsRequest>,
    ) -> Result<CallToolResult, McpError> {
        info!("Adding the open recipe to the cart for {portions} portions");
        let browsing = self.session.browsing().await;
        require_context(self.session.context(), PageContext::RecipeInfo, "add_recipe_to_cart")
            .map_err(tool_error)?;
        let added =
            nav::add_recipe_to_cart(&browsing.detail_page, portions, self.session.waits())
                .await
                .map_err(internal)?;
        drop(browsing);
        if added {
            self.session.spawn_cart_refresh().await;
        }
        json_result(&added)
    }

    #[tool(
        description = "Navigate to a URL previously returned by this server, such as a listing page_url or a recipe URL. Any other URL is rejected."
    )]
    async fn navigate_to(
        &self,
        Parameters(NavigateRequest { url }): Parameters<NavigateRequest>,
    ) -> Result<CallToolResult, McpError> {
        let browsing = self.session.browsing().await;
        if !self.session.is_trusted(&url) {
            return Err(tool_error(OdaError::UntrustedUrl(url)));
        }
        info!("Navigating to {url}");
        let target = if extract::is_recipe_url(&url) {
            &browsing.detail_page
        } else {
            &browsing.page
        };
        nav::goto_settled(target, &url, self.session.waits())
            .await
            .map_err(internal)?;
        let page_url = nav::current_url(target).await.map_err(internal)?;
        self.session.record_navigation(&page_url);
        json_result(&json!({ "url": page_url, "context": self.session.context() }))
    }
}

#[tool_handler]
impl ServerHandler for GroceryServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Shop at the Oda online grocery store through a live browser session. \
                 Start with search_products or search_recipes; the indexes in their \
                 results feed add_to_cart, remove_from_cart and get_recipe_details. \
                 The oda://cart resource returns the last cart snapshot without \
                 touching the browser."
                    .to_string(),
            ),
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        Ok(ListResourcesResult::with_all_items(vec![
            RawResource::new(CART_RESOURCE_URI, "cart").no_annotation(),
            RawResource::new(CONTEXT_RESOURCE_URI, "context").no_annotation(),
        ]))
    }

    async fn read_resource(
        &self,
        ReadResourceRequestParam { uri }: ReadResourceRequestParam,
        _: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        match uri.as_str() {
            CART_RESOURCE_URI => {
                let snapshot = self.session.cart_snapshot();
                let text = serde_json::to_string_pretty(&snapshot).map_err(|error| {
                    McpError::internal_error(
                        format!("Failed to serialize the cart snapshot: {error}"),
                        None,
                    )
                })?;
                Ok(ReadResourceResult {
                    contents: vec![ResourceContents::text(text, uri)],
                })
            }
            CONTEXT_RESOURCE_URI => {
                let context = json!({ "context": self.session.context() });
                Ok(ReadResourceResult {
                    contents: vec![ResourceContents::text(context.to_string(), uri)],
                })
            }
            _ => Err(McpError::resource_not_found(
                "resource_not_found",
                Some(json!({ "uri": uri })),
            )),
        }
    }
}
