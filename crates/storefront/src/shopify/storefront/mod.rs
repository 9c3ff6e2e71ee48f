//! Shopify Storefront API client implementation.
//!
//! Operations implement `graphql_client::GraphQLQuery` and are sent with
//! `reqwest` 0.13. Read-mostly responses (layout, products, collections,
//! pages, policies) are cached with `moka`; carts and searches never are.

#[macro_use]
mod fragments;
mod cache;
mod conversions;
pub mod queries;

use std::sync::Arc;

use canopy_core::Handle;
use graphql_client::{GraphQLQuery, Response};
use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument, warn};

use crate::config::StorefrontConfig;
use crate::shopify::ShopifyError;
use crate::shopify::types::{
    Cart, CartBuyerIdentityInput, CartLineInput, CartLineUpdateInput, Collection,
    CollectionConnection, Layout, Page, PredictiveSearchResults, Product, ProductConnection,
    ProductRecommendationIntent, ProductSort, SearchResults, ShopPolicies,
};

use cache::{CacheKey, CacheValue};
use conversions::{
    convert_cart, convert_cart_user_errors, convert_collection, convert_collection_connection,
    convert_layout, convert_page, convert_policies, convert_predictive_search, convert_product,
    convert_product_card, convert_product_card_connection, convert_search, order_by_handles,
};
use fragments::CartPayloadData;
use queries::{
    AddToCart, CreateCart, GetCart, GetCollectionByHandle, GetCollections, GetPageByHandle,
    GetPolicies, GetProductByHandle, GetProductRecommendations, GetProducts,
    GetProductsByHandles, Layout as LayoutQuery, PredictiveSearch, RemoveFromCart, Search,
    ShopName, UpdateCartBuyerIdentity, UpdateCartDiscountCodes, UpdateCartLines, UpdateCartNote,
    add_to_cart, cart_inputs, create_cart, get_cart, get_collection_by_handle, get_collections,
    get_page_by_handle, get_policies, get_product_by_handle, get_product_recommendations,
    get_products, get_products_by_handles, layout, predictive_search, remove_from_cart, search,
    shop_name, update_cart_buyer_identity, update_cart_discount_codes, update_cart_lines,
    update_cart_note,
};

/// Maximum number of cached responses.
const CACHE_CAPACITY: u64 = 1000;

/// Upper bound on products fetched by handle in one request.
const MAX_PRODUCTS_BY_HANDLE: usize = 10;

// =============================================================================
// StorefrontClient
// =============================================================================

/// Client for the Shopify Storefront API.
///
/// Cheap to clone; all clones share one HTTP client and one response cache.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: String,
    access_token: SecretString,
    /// Hosts (besides the shop's primary domain) whose menu links are rewritten
    /// to relative paths.
    internal_hosts: Vec<String>,
    cache: Cache<String, CacheValue>,
}

impl StorefrontClient {
    /// Create a new Storefront API client.
    #[must_use]
    pub fn new(config: &StorefrontConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(config.cache_ttl)
            .support_invalidation_closures()
            .build();

        let mut internal_hosts = vec![config.shopify.store.to_ascii_lowercase()];
        if let Some(host) = url::Url::parse(&config.base_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        {
            internal_hosts.push(host);
        }

        Self {
            inner: Arc::new(StorefrontClientInner {
                client: reqwest::Client::new(),
                endpoint: config.shopify.storefront_endpoint(),
                access_token: config.shopify.storefront_private_token.clone(),
                internal_hosts,
                cache,
            }),
        }
    }

    /// Execute a GraphQL operation.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, ShopifyError> {
        let request_body = Q::build_query(variables);

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            // Private access tokens use a different header than public tokens
            .header(
                "Shopify-Storefront-Private-Token",
                self.inner.access_token.expose_secret(),
            )
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        // Read the body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                operation = request_body.operation_name,
                body = %truncate(&response_text, 500),
                "Shopify API returned non-success status"
            );
            return Err(ShopifyError::graphql_message(format!(
                "HTTP {status}: {}",
                truncate(&response_text, 200)
            )));
        }

        let response: Response<Q::ResponseData> = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    operation = request_body.operation_name,
                    body = %truncate(&response_text, 500),
                    "Failed to parse Shopify GraphQL response"
                );
                return Err(ShopifyError::Parse(e));
            }
        };

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            debug!(errors = ?errors, "GraphQL errors in response");
            return Err(ShopifyError::GraphQL(
                errors.into_iter().map(Into::into).collect(),
            ));
        }

        response.data.ok_or_else(|| {
            tracing::error!(
                operation = request_body.operation_name,
                body = %truncate(&response_text, 500),
                "Shopify GraphQL response has no data and no errors"
            );
            ShopifyError::graphql_message("No data in response")
        })
    }

    async fn cached(&self, key: &CacheKey) -> Option<CacheValue> {
        let value = self.inner.cache.get(&key.to_string()).await;
        if value.is_some() {
            debug!(key = %key, "Cache hit");
        }
        value
    }

    async fn store(&self, key: CacheKey, value: CacheValue) {
        self.inner.cache.insert(key.to_string(), value).await;
    }

    // =========================================================================
    // Layout / Health
    // =========================================================================

    /// Get the shop info plus header and footer menus.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_layout(
        &self,
        header_menu: &str,
        footer_menu: &str,
    ) -> Result<Layout, ShopifyError> {
        let cache_key = CacheKey::Layout {
            header: header_menu.to_string(),
            footer: footer_menu.to_string(),
        };

        if let Some(CacheValue::Layout(layout)) = self.cached(&cache_key).await {
            return Ok(*layout);
        }

        let data = self
            .execute::<LayoutQuery>(layout::Variables {
                header_menu_handle: header_menu.to_string(),
                footer_menu_handle: footer_menu.to_string(),
            })
            .await?;

        let layout = convert_layout(data, &self.inner.internal_hosts);

        self.store(cache_key, CacheValue::Layout(Box::new(layout.clone())))
            .await;

        Ok(layout)
    }

    /// Fetch the shop name. Used as a cheap connectivity check.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn shop_name(&self) -> Result<String, ShopifyError> {
        let data = self.execute::<ShopName>(shop_name::Variables).await?;
        Ok(data.shop.name)
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get a product by its handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_product_by_handle(&self, handle: &str) -> Result<Product, ShopifyError> {
        let cache_key = CacheKey::Product(handle.to_string());

        if let Some(CacheValue::Product(product)) = self.cached(&cache_key).await {
            return Ok(*product);
        }

        let data = self
            .execute::<GetProductByHandle>(get_product_by_handle::Variables {
                handle: handle.to_string(),
            })
            .await?;

        let product = data
            .product
            .map(convert_product)
            .ok_or_else(|| ShopifyError::NotFound(format!("Product not found: {handle}")))?;

        self.store(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Get a paginated list of products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_products(
        &self,
        first: i64,
        after: Option<String>,
        sort: ProductSort,
    ) -> Result<ProductConnection, ShopifyError> {
        let cache_key = CacheKey::Products {
            cursor: after.clone(),
            sort,
        };

        if let Some(CacheValue::Products(products)) = self.cached(&cache_key).await {
            return Ok(products);
        }

        let (sort_key, reverse) = sort.sort_key();
        let data = self
            .execute::<GetProducts>(get_products::Variables {
                first,
                after,
                sort_key: Some(sort_key),
                reverse: Some(reverse),
            })
            .await?;

        let connection = convert_product_card_connection(data.products);

        self.store(cache_key, CacheValue::Products(connection.clone()))
            .await;

        Ok(connection)
    }

    /// Get full product details for several handles in a single request.
    ///
    /// Results follow the order of `handles`; handles with no matching
    /// product are skipped. Not cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(count = handles.len()))]
    pub async fn get_products_by_handles(
        &self,
        handles: &[Handle],
    ) -> Result<Vec<Product>, ShopifyError> {
        let handles = handles
            .get(..MAX_PRODUCTS_BY_HANDLE)
            .unwrap_or(handles);

        if handles.is_empty() {
            return Ok(vec![]);
        }

        let query = handles
            .iter()
            .map(|h| format!("handle:{h}"))
            .collect::<Vec<_>>()
            .join(" OR ");

        let data = self
            .execute::<GetProductsByHandles>(get_products_by_handles::Variables {
                #[allow(clippy::cast_possible_wrap)] // Bounded by MAX_PRODUCTS_BY_HANDLE
                first: handles.len() as i64,
                query,
            })
            .await?;

        let products = data
            .products
            .nodes
            .into_iter()
            .map(convert_product)
            .collect();

        Ok(order_by_handles(products, handles))
    }

    /// Get related product recommendations.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_product_recommendations(
        &self,
        product_id: &str,
    ) -> Result<Vec<Product>, ShopifyError> {
        let data = self
            .execute::<GetProductRecommendations>(get_product_recommendations::Variables {
                product_id: product_id.to_string(),
                intent: Some(ProductRecommendationIntent::Related),
            })
            .await?;

        Ok(data
            .product_recommendations
            .unwrap_or_default()
            .into_iter()
            .map(convert_product_card)
            .collect())
    }

    // =========================================================================
    // Collection Methods
    // =========================================================================

    /// Get a collection by its handle with one page of products.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection is not found or the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_collection_by_handle(
        &self,
        handle: &str,
        first: i64,
        after: Option<String>,
    ) -> Result<Collection, ShopifyError> {
        let cache_key = CacheKey::Collection {
            handle: handle.to_string(),
            cursor: after.clone(),
        };

        if let Some(CacheValue::Collection(collection)) = self.cached(&cache_key).await {
            return Ok(*collection);
        }

        let data = self
            .execute::<GetCollectionByHandle>(get_collection_by_handle::Variables {
                handle: handle.to_string(),
                first,
                after,
            })
            .await?;

        let collection = data
            .collection
            .map(convert_collection)
            .ok_or_else(|| ShopifyError::NotFound(format!("Collection not found: {handle}")))?;

        self.store(
            cache_key,
            CacheValue::Collection(Box::new(collection.clone())),
        )
        .await;

        Ok(collection)
    }

    /// Get a paginated list of collections.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_collections(
        &self,
        first: i64,
        after: Option<String>,
    ) -> Result<CollectionConnection, ShopifyError> {
        let cache_key = CacheKey::Collections {
            cursor: after.clone(),
        };

        if let Some(CacheValue::Collections(collections)) = self.cached(&cache_key).await {
            return Ok(collections);
        }

        let data = self
            .execute::<GetCollections>(get_collections::Variables { first, after })
            .await?;

        let connection = convert_collection_connection(data.collections);

        self.store(cache_key, CacheValue::Collections(connection.clone()))
            .await;

        Ok(connection)
    }

    // =========================================================================
    // Content Methods
    // =========================================================================

    /// Get a content page by its handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the page is not found or the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_page_by_handle(&self, handle: &str) -> Result<Page, ShopifyError> {
        let cache_key = CacheKey::Page(handle.to_string());

        if let Some(CacheValue::Page(page)) = self.cached(&cache_key).await {
            return Ok(*page);
        }

        let data = self
            .execute::<GetPageByHandle>(get_page_by_handle::Variables {
                handle: handle.to_string(),
            })
            .await?;

        let page = data
            .page
            .map(convert_page)
            .ok_or_else(|| ShopifyError::NotFound(format!("Page not found: {handle}")))?;

        self.store(cache_key, CacheValue::Page(Box::new(page.clone())))
            .await;

        Ok(page)
    }

    /// Get every policy the shop has configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_policies(&self) -> Result<ShopPolicies, ShopifyError> {
        if let Some(CacheValue::Policies(policies)) = self.cached(&CacheKey::Policies).await {
            return Ok(policies);
        }

        let data = self.execute::<GetPolicies>(get_policies::Variables).await?;
        let policies = convert_policies(data.shop);

        self.store(CacheKey::Policies, CacheValue::Policies(policies.clone()))
            .await;

        Ok(policies)
    }

    // =========================================================================
    // Search Methods (not cached)
    // =========================================================================

    /// Full search over products, pages and articles.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        term: &str,
        first: i64,
        after: Option<String>,
    ) -> Result<SearchResults, ShopifyError> {
        let data = self
            .execute::<Search>(search::Variables {
                term: term.to_string(),
                first,
                after,
            })
            .await?;

        Ok(convert_search(data.search))
    }

    /// Search-as-you-type suggestions.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn predictive_search(
        &self,
        term: &str,
        limit: i64,
    ) -> Result<PredictiveSearchResults, ShopifyError> {
        let data = self
            .execute::<PredictiveSearch>(predictive_search::Variables {
                term: term.to_string(),
                limit,
            })
            .await?;

        Ok(data
            .predictive_search
            .map(convert_predictive_search)
            .unwrap_or_default())
    }

    // =========================================================================
    // Cart Methods (not cached - mutable state)
    // =========================================================================

    /// Create a new cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart creation fails or user errors are returned.
    #[instrument(skip(self, lines, buyer_identity))]
    pub async fn create_cart(
        &self,
        lines: Vec<CartLineInput>,
        buyer_identity: Option<CartBuyerIdentityInput>,
    ) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<CreateCart>(create_cart::Variables {
                input: cart_inputs::CartInput {
                    lines: lines.into_iter().map(line_input).collect(),
                    note: None,
                    buyer_identity: buyer_identity.map(buyer_identity_input),
                },
            })
            .await?;

        cart_from_payload(data.payload, "Failed to create cart")
    }

    /// Get an existing cart.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the cart no longer exists, or an error if the API
    /// request fails.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn get_cart(&self, cart_id: &str) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<GetCart>(get_cart::Variables {
                cart_id: cart_id.to_string(),
            })
            .await?;

        data.cart
            .map(convert_cart)
            .ok_or_else(|| ShopifyError::NotFound(format!("Cart not found: {cart_id}")))
    }

    /// Add lines to a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    pub async fn add_to_cart(
        &self,
        cart_id: &str,
        lines: Vec<CartLineInput>,
    ) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<AddToCart>(add_to_cart::Variables {
                cart_id: cart_id.to_string(),
                lines: lines.into_iter().map(line_input).collect(),
            })
            .await?;

        cart_from_payload(data.payload, "Failed to add to cart")
    }

    /// Update cart line quantities.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    pub async fn update_cart(
        &self,
        cart_id: &str,
        lines: Vec<CartLineUpdateInput>,
    ) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<UpdateCartLines>(update_cart_lines::Variables {
                cart_id: cart_id.to_string(),
                lines: lines
                    .into_iter()
                    .map(|line| cart_inputs::CartLineUpdateInput {
                        id: line.id,
                        quantity: line.quantity,
                    })
                    .collect(),
            })
            .await?;

        cart_from_payload(data.payload, "Failed to update cart")
    }

    /// Remove lines from a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, line_ids), fields(cart_id = %cart_id))]
    pub async fn remove_from_cart(
        &self,
        cart_id: &str,
        line_ids: Vec<String>,
    ) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<RemoveFromCart>(remove_from_cart::Variables {
                cart_id: cart_id.to_string(),
                line_ids,
            })
            .await?;

        cart_from_payload(data.payload, "Failed to remove from cart")
    }

    /// Replace the discount codes on a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, discount_codes), fields(cart_id = %cart_id))]
    pub async fn update_discount_codes(
        &self,
        cart_id: &str,
        discount_codes: Vec<String>,
    ) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<UpdateCartDiscountCodes>(update_cart_discount_codes::Variables {
                cart_id: cart_id.to_string(),
                discount_codes,
            })
            .await?;

        cart_from_payload(data.payload, "Failed to update discount codes")
    }

    /// Update the cart note.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, note), fields(cart_id = %cart_id))]
    pub async fn update_cart_note(&self, cart_id: &str, note: &str) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<UpdateCartNote>(update_cart_note::Variables {
                cart_id: cart_id.to_string(),
                note: note.to_string(),
            })
            .await?;

        cart_from_payload(data.payload, "Failed to update cart note")
    }

    /// Associate a cart with a buyer (e.g., the signed-in customer).
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, buyer_identity), fields(cart_id = %cart_id))]
    pub async fn update_buyer_identity(
        &self,
        cart_id: &str,
        buyer_identity: CartBuyerIdentityInput,
    ) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<UpdateCartBuyerIdentity>(update_cart_buyer_identity::Variables {
                cart_id: cart_id.to_string(),
                buyer_identity: buyer_identity_input(buyer_identity),
            })
            .await?;

        cart_from_payload(data.payload, "Failed to update buyer identity")
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Invalidate a cached product.
    pub async fn invalidate_product(&self, handle: &str) {
        self.inner
            .cache
            .invalidate(&CacheKey::Product(handle.to_string()).to_string())
            .await;
    }

    /// Invalidate every cached page of a collection.
    pub fn invalidate_collection(&self, handle: &str) {
        let prefix = format!("collection:{handle}:");
        if let Err(e) = self
            .inner
            .cache
            .invalidate_entries_if(move |key, _| key.starts_with(&prefix))
        {
            warn!(error = %e, "Failed to invalidate collection cache entries");
        }
    }

    /// Invalidate a cached content page.
    pub async fn invalidate_page(&self, handle: &str) {
        self.inner
            .cache
            .invalidate(&CacheKey::Page(handle.to_string()).to_string())
            .await;
    }

    /// Invalidate the cached shop policies.
    pub async fn invalidate_policies(&self) {
        self.inner
            .cache
            .invalidate(&CacheKey::Policies.to_string())
            .await;
    }

    /// Invalidate all cached data.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}

fn line_input(line: CartLineInput) -> cart_inputs::CartLineInput {
    cart_inputs::CartLineInput {
        merchandise_id: line.merchandise_id,
        quantity: line.quantity,
        attributes: line.attributes.map(|attrs| {
            attrs
                .into_iter()
                .map(|a| cart_inputs::AttributeInput {
                    key: a.key,
                    value: a.value,
                })
                .collect()
        }),
    }
}

fn buyer_identity_input(identity: CartBuyerIdentityInput) -> cart_inputs::CartBuyerIdentityInput {
    cart_inputs::CartBuyerIdentityInput {
        customer_access_token: identity.customer_access_token,
        email: identity.email,
        country_code: identity.country_code,
    }
}

/// Unwrap a cart mutation payload, surfacing user errors.
fn cart_from_payload(
    payload: Option<CartPayloadData>,
    failure: &str,
) -> Result<Cart, ShopifyError> {
    let Some(payload) = payload else {
        return Err(ShopifyError::graphql_message(failure));
    };

    if !payload.user_errors.is_empty() {
        return Err(ShopifyError::UserError(
            convert_cart_user_errors(payload.user_errors)
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; "),
        ));
    }

    payload
        .cart
        .map(convert_cart)
        .ok_or_else(|| ShopifyError::graphql_message(failure))
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_from_payload_user_errors() {
        let payload: CartPayloadData = serde_json::from_value(serde_json::json!({
            "cart": null,
            "userErrors": [
                { "code": "INVALID", "field": ["lines", "0", "quantity"], "message": "Quantity is invalid" },
                { "code": null, "field": null, "message": "Variant is sold out" }
            ]
        }))
        .unwrap_or_else(|e| panic!("fixture should parse: {e}"));

        let err = cart_from_payload(Some(payload), "Failed").err();
        assert!(matches!(
            err,
            Some(ShopifyError::UserError(msg)) if msg == "Quantity is invalid; Variant is sold out"
        ));
    }

    #[test]
    fn test_cart_from_payload_missing() {
        let err = cart_from_payload(None, "Failed to create cart").err();
        assert!(matches!(err, Some(ShopifyError::GraphQL(_))));
    }

    fn test_client() -> StorefrontClient {
        use crate::config::{SentryConfig, ShopifyStorefrontConfig};

        StorefrontClient::new(&StorefrontConfig {
            host: std::net::Ipv4Addr::LOCALHOST.into(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            cache_ttl: std::time::Duration::from_secs(60),
            static_dir: std::path::PathBuf::from("static"),
            shopify: ShopifyStorefrontConfig {
                store: "test.myshopify.com".to_string(),
                api_version: "2025-07".to_string(),
                storefront_endpoint: Some("http://127.0.0.1:9/graphql".to_string()),
                storefront_public_token: None,
                storefront_private_token: SecretString::from("private_token"),
                customer_shop_id: "1".to_string(),
                customer_client_id: "client".to_string(),
                customer_client_secret: None,
                customer_account_url: None,
            },
            sentry: SentryConfig::default(),
        })
    }

    fn placeholder() -> CacheValue {
        CacheValue::Policies(ShopPolicies::default())
    }

    #[tokio::test]
    async fn test_invalidate_product_and_page() {
        let client = test_client();
        let product = CacheKey::Product("linen-shirt".to_string());
        let page = CacheKey::Page("about".to_string());
        client.store(product.clone(), placeholder()).await;
        client.store(page.clone(), placeholder()).await;

        client.invalidate_product("linen-shirt").await;
        assert!(client.cached(&product).await.is_none());
        assert!(client.cached(&page).await.is_some());

        client.invalidate_page("about").await;
        assert!(client.cached(&page).await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_collection_drops_every_page() {
        let client = test_client();
        let first = CacheKey::Collection {
            handle: "summer".to_string(),
            cursor: None,
        };
        let second = CacheKey::Collection {
            handle: "summer".to_string(),
            cursor: Some("abc".to_string()),
        };
        let other = CacheKey::Collection {
            handle: "summer-sale".to_string(),
            cursor: None,
        };
        for key in [&first, &second, &other] {
            client.store(key.clone(), placeholder()).await;
        }

        client.invalidate_collection("summer");
        assert!(client.cached(&first).await.is_none());
        assert!(client.cached(&second).await.is_none());
        assert!(client.cached(&other).await.is_some());
    }

    #[tokio::test]
    async fn test_invalidate_all() {
        let client = test_client();
        client.store(CacheKey::Policies, placeholder()).await;
        client
            .store(CacheKey::Collections { cursor: None }, placeholder())
            .await;

        client.invalidate_all().await;
        assert!(client.cached(&CacheKey::Policies).await.is_none());
        assert!(
            client
                .cached(&CacheKey::Collections { cursor: None })
                .await
                .is_none()
        );
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("ééééé", 2), "éé");
        assert_eq!(truncate("ok", 10), "ok");
    }
}
