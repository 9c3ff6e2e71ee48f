//! End-to-end test harness for the Canopy storefront.
//!
//! [`FakeShopify`] serves just enough of the Storefront GraphQL API, the
//! Customer Account API and its OAuth endpoints for the routes under test.
//! Carts and the address book are kept in memory so mutations show up on
//! the next read. [`TestApp`]
//! builds the real router against it and drives requests in-process with
//! `tower::ServiceExt::oneshot`, so no storefront port is bound.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p canopy-integration-tests
//! ```

use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::{
    Form, Json, Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Method, Request, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use canopy_storefront::config::{SentryConfig, ShopifyStorefrontConfig, StorefrontConfig};
use canopy_storefront::middleware::SESSION_COOKIE_NAME;
use canopy_storefront::state::AppState;
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;

/// Public URL the storefront believes it is served from.
pub const BASE_URL: &str = "http://localhost:3000";

/// Customer Account shop ID used in OAuth paths.
pub const SHOP_ID: &str = "87654321";

/// Shop name returned by the fake Storefront API.
pub const SHOP_NAME: &str = "Canopy Test Shop";

/// The only authorization code the fake token endpoint accepts.
pub const AUTH_CODE: &str = "valid-code";

/// Client address sent on every request (the auth rate limiter keys on it).
pub const CLIENT_IP: &str = "203.0.113.7";

/// Access token issued for [`AUTH_CODE`].
pub const ACCESS_TOKEN: &str = "customer-access-token";

/// Access token issued by the refresh grant.
pub const REFRESHED_ACCESS_TOKEN: &str = "customer-access-token-refreshed";

/// The only refresh token the fake token endpoint accepts.
pub const REFRESH_TOKEN: &str = "customer-refresh-token";

/// The one order in the fake customer's history.
pub const ORDER_ID: &str = "gid://shopify/Order/1001";

// =============================================================================
// Fake Shopify
// =============================================================================

#[derive(Clone, Default)]
struct FakeState {
    calls: Arc<Mutex<HashMap<String, usize>>>,
    unavailable: Arc<AtomicBool>,
    nonce: Arc<Mutex<Option<String>>>,
    carts: Arc<Mutex<Carts>>,
    addresses: Arc<Mutex<AddressBook>>,
    expired_tokens: Arc<AtomicBool>,
    reject_tokens: Arc<AtomicBool>,
    last_customer_token: Arc<Mutex<Option<String>>>,
}

impl FakeState {
    fn record(&self, name: &str) {
        *lock(&self.calls).entry(name.to_string()).or_default() += 1;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A local stand-in for the Shopify APIs.
pub struct FakeShopify {
    addr: SocketAddr,
    state: FakeState,
}

impl FakeShopify {
    /// Bind to an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        let state = FakeState::default();
        let app = Router::new()
            .route("/graphql", post(graphql))
            .route(&format!("/{SHOP_ID}/auth/oauth/token"), post(token))
            .route(
                &format!("/{SHOP_ID}/account/customer/api/{{version}}/graphql"),
                post(customer_graphql),
            )
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .expect("bind fake Shopify listener");
        let addr = listener.local_addr().expect("fake Shopify address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state }
    }

    /// Origin of the fake server (`http://127.0.0.1:port`).
    #[must_use]
    pub fn origin(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// How many times a GraphQL operation (or token grant type) has been
    /// requested.
    #[must_use]
    pub fn calls(&self, operation: &str) -> usize {
        lock(&self.state.calls).get(operation).copied().unwrap_or(0)
    }

    /// Make every GraphQL request fail with 503.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Nonce to embed in the next issued id token.
    pub fn issue_nonce(&self, nonce: &str) {
        *lock(&self.state.nonce) = Some(nonce.to_string());
    }

    /// Forget every cart, as Shopify does once a cart expires.
    pub fn expire_carts(&self) {
        lock(&self.state.carts).carts.clear();
    }

    /// Buyer access token on the most recently created cart.
    #[must_use]
    pub fn cart_buyer(&self) -> Option<String> {
        let carts = lock(&self.state.carts);
        carts
            .last_created
            .as_ref()
            .and_then(|id| carts.carts.get(id))
            .and_then(|cart| cart.buyer_token.clone())
    }

    /// Issue access tokens that are already expired at login.
    pub fn issue_expired_tokens(&self, expired: bool) {
        self.state.expired_tokens.store(expired, Ordering::SeqCst);
    }

    /// Answer every Customer Account API request with 401.
    pub fn reject_customer_tokens(&self, reject: bool) {
        self.state.reject_tokens.store(reject, Ordering::SeqCst);
    }

    /// Authorization header of the last Customer Account API request.
    #[must_use]
    pub fn last_customer_token(&self) -> Option<String> {
        lock(&self.state.last_customer_token).clone()
    }

    /// Storefront configuration pointing both APIs at this server.
    #[must_use]
    pub fn config(&self) -> StorefrontConfig {
        StorefrontConfig {
            host: Ipv4Addr::LOCALHOST.into(),
            port: 0,
            base_url: BASE_URL.to_string(),
            cache_ttl: Duration::from_secs(60),
            static_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../storefront/static")),
            shopify: ShopifyStorefrontConfig {
                store: "test.myshopify.com".to_string(),
                api_version: "2025-07".to_string(),
                storefront_endpoint: Some(format!("{}/graphql", self.origin())),
                storefront_public_token: None,
                storefront_private_token: SecretString::from("test-private-token"),
                customer_shop_id: SHOP_ID.to_string(),
                customer_client_id: "test-client".to_string(),
                customer_client_secret: None,
                customer_account_url: Some(self.origin()),
            },
            sentry: SentryConfig::default(),
        }
    }
}

async fn graphql(State(state): State<FakeState>, Json(body): Json<Value>) -> Response {
    let operation = body
        .get("operationName")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    state.record(&operation);

    if state.unavailable.load(Ordering::SeqCst) {
        return (StatusCode::SERVICE_UNAVAILABLE, "maintenance").into_response();
    }

    let variables = body.get("variables").cloned().unwrap_or(Value::Null);
    let handle = variables
        .get("handle")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let data = match operation.as_str() {
        "ShopName" => json!({ "shop": { "name": SHOP_NAME } }),
        "Layout" => layout(),
        "GetPolicies" => policies(),
        "GetPageByHandle" => json!({ "page": (handle == "about").then(about_page) }),
        "GetCollectionByHandle" => {
            json!({ "collection": (handle == "summer").then(summer_collection) })
        }
        "GetProducts" => json!({ "products": {
            "pageInfo": last_page(),
            "nodes": (["linen-shirt", "canvas-tote"].into_iter().filter_map(product).collect::<Vec<_>>())
        } }),
        "GetCollections" => collections(),
        "GetProductByHandle" => json!({ "product": product(handle) }),
        "GetProductsByHandles" => products_by_handles(&variables),
        "GetProductRecommendations" => json!({
            "productRecommendations": product("canvas-tote").into_iter().collect::<Vec<_>>()
        }),
        "GetCart" => {
            let cart_id = variables
                .get("cartId")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let carts = lock(&state.carts);
            json!({ "cart": carts.carts.get(cart_id).map(FakeCart::to_json) })
        }
        "CreateCart"
        | "AddToCart"
        | "UpdateCartLines"
        | "RemoveFromCart"
        | "UpdateCartBuyerIdentity"
        | "UpdateCartNote"
        | "UpdateCartDiscountCodes" => cart_mutation(&state, &operation, &variables),
        "Search" => search(),
        "PredictiveSearch" => json!({
            "predictiveSearch": {
                "products": [],
                "collections": [],
                "pages": [{ "handle": "about", "title": "About us" }],
                "queries": [{ "text": "about", "styledText": "<mark>about</mark>" }]
            }
        }),
        _ => {
            return Json(json!({ "errors": [{ "message": format!("{operation} is not stubbed") }] }))
                .into_response();
        }
    };

    Json(json!({ "data": data })).into_response()
}

async fn token(State(state): State<FakeState>, Form(form): Form<HashMap<String, String>>) -> Response {
    let field = |name: &str| form.get(name).map(String::as_str);
    let grant_type = field("grant_type").unwrap_or_default();
    state.record(grant_type);

    match grant_type {
        "authorization_code"
            if field("code") == Some(AUTH_CODE)
                && field("code_verifier").is_some_and(|v| !v.is_empty()) =>
        {
            let nonce = lock(&state.nonce).clone();
            let expires_in = if state.expired_tokens.load(Ordering::SeqCst) {
                0
            } else {
                3600
            };

            Json(json!({
                "access_token": ACCESS_TOKEN,
                "id_token": id_token(nonce.as_deref()),
                "refresh_token": REFRESH_TOKEN,
                "expires_in": expires_in
            }))
            .into_response()
        }
        // Refresh responses carry no id token
        "refresh_token" if field("refresh_token") == Some(REFRESH_TOKEN) => Json(json!({
            "access_token": REFRESHED_ACCESS_TOKEN,
            "refresh_token": REFRESH_TOKEN,
            "expires_in": 3600
        }))
        .into_response(),
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_grant" })),
        )
            .into_response(),
    }
}

/// Unsigned JWT carrying the given nonce.
#[must_use]
pub fn id_token(nonce: Option<&str>) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        json!({ "sub": "gid://shopify/Customer/42", "nonce": nonce }).to_string(),
    );
    format!("{header}.{payload}.signature")
}

fn layout() -> Value {
    json!({
        "shop": {
            "id": "gid://shopify/Shop/1",
            "name": SHOP_NAME,
            "description": "Everyday goods",
            "primaryDomain": { "url": "https://canopy.example" }
        },
        "headerMenu": {
            "id": "gid://shopify/Menu/1",
            "handle": "main-menu",
            "title": "Main menu",
            "items": [
                {
                    "id": "gid://shopify/MenuItem/1",
                    "title": "Summer",
                    "url": "https://test.myshopify.com/collections/summer",
                    "type": "COLLECTION",
                    "items": []
                },
                {
                    "id": "gid://shopify/MenuItem/2",
                    "title": "Journal",
                    "url": "https://journal.example.org/",
                    "type": "HTTP",
                    "items": []
                }
            ]
        },
        "footerMenu": null
    })
}

fn policies() -> Value {
    json!({
        "shop": {
            "privacyPolicy": {
                "id": "gid://shopify/ShopPolicy/1",
                "handle": "privacy-policy",
                "title": "Privacy Policy",
                "body": "<p>We keep your data safe.</p>",
                "url": "https://test.myshopify.com/policies/privacy-policy"
            },
            "shippingPolicy": null,
            "termsOfService": null,
            "refundPolicy": {
                "id": "gid://shopify/ShopPolicy/2",
                "handle": "refund-policy",
                "title": "Refund Policy",
                "body": "<p>Returns accepted within 30 days.</p>",
                "url": null
            },
            "subscriptionPolicy": {
                "id": null,
                "handle": "subscription-policy",
                "title": "Subscription Policy",
                "body": "",
                "url": null
            }
        }
    })
}

fn about_page() -> Value {
    json!({
        "id": "gid://shopify/Page/1",
        "handle": "about",
        "title": "About us",
        "body": "<p>Small shop, big canopy.</p>",
        "bodySummary": "Small shop, big canopy.",
        "updatedAt": "2026-01-05T10:00:00Z",
        "seo": { "title": null, "description": "Who we are" }
    })
}

fn summer_collection() -> Value {
    json!({
        "id": "gid://shopify/Collection/7",
        "handle": "summer",
        "title": "Summer",
        "description": "Warm days",
        "descriptionHtml": "<p>Warm days</p>",
        "seo": null,
        "image": null,
        "products": {
            "pageInfo": {
                "hasNextPage": true,
                "hasPreviousPage": false,
                "startCursor": "c0",
                "endCursor": "c1=="
            },
            "nodes": [{
                "id": "gid://shopify/Product/11",
                "handle": "linen-shirt",
                "title": "Linen Shirt",
                "vendor": "Canopy",
                "productType": "Shirts",
                "availableForSale": true,
                "featuredImage": null,
                "priceRange": {
                    "minVariantPrice": { "amount": "48.0", "currencyCode": "USD" },
                    "maxVariantPrice": { "amount": "48.0", "currencyCode": "USD" }
                },
                "compareAtPriceRange": null
            }]
        }
    })
}

fn last_page() -> Value {
    json!({
        "hasNextPage": false,
        "hasPreviousPage": false,
        "startCursor": null,
        "endCursor": null
    })
}

fn collections() -> Value {
    json!({
        "collections": {
            "pageInfo": last_page(),
            "nodes": [
                {
                    "id": "gid://shopify/Collection/7",
                    "handle": "summer",
                    "title": "Summer",
                    "description": "Warm days",
                    "descriptionHtml": "<p>Warm days</p>",
                    "image": null
                },
                {
                    "id": "gid://shopify/Collection/8",
                    "handle": "basics",
                    "title": "Basics",
                    "description": "",
                    "descriptionHtml": "",
                    "image": null
                }
            ]
        }
    })
}

fn search() -> Value {
    json!({
        "search": {
            "totalCount": 1,
            "pageInfo": {
                "hasNextPage": false,
                "hasPreviousPage": false,
                "startCursor": null,
                "endCursor": null
            },
            "nodes": [{
                "__typename": "Page",
                "handle": "about",
                "title": "About us",
                "bodySummary": "Small shop, big canopy."
            }]
        }
    })
}

// =============================================================================
// Catalog fixtures
// =============================================================================

/// A purchasable variant in the fake catalog.
struct FakeVariant {
    id: &'static str,
    title: &'static str,
    sku: &'static str,
    cents: i64,
    compare_at: Option<&'static str>,
    option: (&'static str, &'static str),
    product: &'static str,
}

static VARIANTS: [FakeVariant; 3] = [
    FakeVariant {
        id: "gid://shopify/ProductVariant/1",
        title: "S",
        sku: "LS-S",
        cents: 4800,
        compare_at: None,
        option: ("Size", "S"),
        product: "linen-shirt",
    },
    FakeVariant {
        id: "gid://shopify/ProductVariant/2",
        title: "M",
        sku: "LS-M",
        cents: 5200,
        compare_at: Some("60.00"),
        option: ("Size", "M"),
        product: "linen-shirt",
    },
    FakeVariant {
        id: "gid://shopify/ProductVariant/3",
        title: "Default Title",
        sku: "CT-1",
        cents: 2000,
        compare_at: None,
        option: ("Title", "Default Title"),
        product: "canvas-tote",
    },
];

fn variant(id: &str) -> Option<&'static FakeVariant> {
    VARIANTS.iter().find(|v| v.id == id)
}

fn amount(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

fn money(cents: i64) -> Value {
    json!({ "amount": amount(cents), "currencyCode": "USD" })
}

fn product_title(handle: &str) -> &'static str {
    if handle == "linen-shirt" {
        "Linen Shirt"
    } else {
        "Canvas Tote"
    }
}

/// Full `Product` selection for a known handle.
fn product(handle: &str) -> Option<Value> {
    let variants: Vec<&FakeVariant> = VARIANTS.iter().filter(|v| v.product == handle).collect();
    let (first, last) = (variants.first()?, variants.last()?);

    let option_values: Vec<Value> = variants
        .iter()
        .map(|v| json!({ "name": v.option.1 }))
        .collect();

    let kind = if handle == "linen-shirt" { "Shirts" } else { "Bags" };

    Some(json!({
        "id": format!("gid://shopify/Product/{handle}"),
        "handle": handle,
        "title": product_title(handle),
        "vendor": "Canopy",
        "productType": kind,
        "availableForSale": true,
        "featuredImage": null,
        "priceRange": {
            "minVariantPrice": money(first.cents),
            "maxVariantPrice": money(last.cents)
        },
        "compareAtPriceRange": null,
        "description": "Made to last.",
        "descriptionHtml": "<p>Made to last.</p>",
        "tags": [],
        "seo": { "title": null, "description": null },
        "images": { "nodes": [] },
        "options": [{
            "id": format!("gid://shopify/ProductOption/{handle}"),
            "name": first.option.0,
            "optionValues": option_values
        }],
        "variants": {
            "nodes": variants.iter().map(|v| json!({
                "id": v.id,
                "title": v.title,
                "availableForSale": true,
                "sku": v.sku,
                "price": money(v.cents),
                "compareAtPrice": v.compare_at.map(|a| json!({ "amount": a, "currencyCode": "USD" })),
                "selectedOptions": [{ "name": v.option.0, "value": v.option.1 }],
                "image": null
            })).collect::<Vec<_>>()
        }
    }))
}

/// Answer a `handle:a OR handle:b` search, in reverse order like a relevance
/// ranking would.
fn products_by_handles(variables: &Value) -> Value {
    let query = variables
        .get("query")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let mut nodes: Vec<Value> = query
        .split(" OR ")
        .filter_map(|term| term.trim().strip_prefix("handle:"))
        .filter_map(product)
        .collect();
    nodes.reverse();

    json!({ "products": { "nodes": nodes } })
}

// =============================================================================
// Carts
// =============================================================================

#[derive(Default)]
struct Carts {
    next_id: usize,
    carts: HashMap<String, FakeCart>,
    last_created: Option<String>,
}

struct FakeLine {
    id: String,
    variant: &'static FakeVariant,
    quantity: i64,
}

struct FakeCart {
    id: String,
    next_line: usize,
    lines: Vec<FakeLine>,
    buyer_token: Option<String>,
    note: Option<String>,
    discount_codes: Vec<String>,
}

impl FakeCart {
    fn add(&mut self, lines: &[Value]) -> Result<(), Value> {
        for line in lines {
            let merchandise_id = line
                .get("merchandiseId")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let Some(variant) = variant(merchandise_id) else {
                return Err(user_error(
                    &["lines", "0", "merchandiseId"],
                    "The merchandise with the specified ID does not exist.",
                ));
            };
            let quantity = line.get("quantity").and_then(Value::as_i64).unwrap_or(1);

            if let Some(existing) = self.lines.iter_mut().find(|l| l.variant.id == variant.id) {
                existing.quantity += quantity;
            } else {
                self.next_line += 1;
                self.lines.push(FakeLine {
                    id: format!("gid://shopify/CartLine/{}", self.next_line),
                    variant,
                    quantity,
                });
            }
        }
        Ok(())
    }

    fn to_json(&self) -> Value {
        let subtotal: i64 = self
            .lines
            .iter()
            .map(|l| l.variant.cents * l.quantity)
            .sum();

        json!({
            "id": self.id,
            "checkoutUrl": format!("https://test.myshopify.com/cart/c/{}", self.id.rsplit('/').next().unwrap_or_default()),
            "note": self.note,
            "totalQuantity": self.lines.iter().map(|l| l.quantity).sum::<i64>(),
            "buyerIdentity": {
                "email": null,
                "countryCode": null,
                "customer": self.buyer_token.as_ref().map(|_| json!({ "id": "gid://shopify/Customer/42" }))
            },
            "cost": { "subtotalAmount": money(subtotal), "totalAmount": money(subtotal) },
            "discountCodes": self.discount_codes.iter().map(|code| json!({ "code": code, "applicable": false })).collect::<Vec<_>>(),
            "lines": {
                "nodes": self.lines.iter().map(|l| json!({
                    "id": l.id,
                    "quantity": l.quantity,
                    "attributes": [],
                    "cost": {
                        "amountPerQuantity": money(l.variant.cents),
                        "compareAtAmountPerQuantity": null,
                        "subtotalAmount": money(l.variant.cents * l.quantity),
                        "totalAmount": money(l.variant.cents * l.quantity)
                    },
                    "merchandise": {
                        "id": l.variant.id,
                        "title": l.variant.title,
                        "availableForSale": true,
                        "price": money(l.variant.cents),
                        "selectedOptions": [{ "name": l.variant.option.0, "value": l.variant.option.1 }],
                        "image": null,
                        "product": {
                            "id": format!("gid://shopify/Product/{}", l.variant.product),
                            "handle": l.variant.product,
                            "title": product_title(l.variant.product),
                            "vendor": "Canopy",
                            "featuredImage": null
                        }
                    }
                })).collect::<Vec<_>>()
            }
        })
    }
}

fn user_error(field: &[&str], message: &str) -> Value {
    json!({ "code": "INVALID", "field": field, "message": message })
}

fn buyer_token(identity: Option<&Value>) -> Option<String> {
    identity
        .and_then(|i| i.get("customerAccessToken"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Apply a cart mutation and wrap the result in its payload field.
fn cart_mutation(state: &FakeState, operation: &str, variables: &Value) -> Value {
    let field = match operation {
        "CreateCart" => "cartCreate",
        "AddToCart" => "cartLinesAdd",
        "UpdateCartLines" => "cartLinesUpdate",
        "RemoveFromCart" => "cartLinesRemove",
        "UpdateCartBuyerIdentity" => "cartBuyerIdentityUpdate",
        "UpdateCartNote" => "cartNoteUpdate",
        _ => "cartDiscountCodesUpdate",
    };
    let list = |name: &str| {
        variables
            .get(name)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    };

    let mut carts = lock(&state.carts);

    if operation == "CreateCart" {
        let input = variables.get("input").cloned().unwrap_or(Value::Null);
        carts.next_id += 1;
        let mut cart = FakeCart {
            id: format!("gid://shopify/Cart/c{}", carts.next_id),
            next_line: 0,
            lines: Vec::new(),
            buyer_token: buyer_token(input.get("buyerIdentity")),
            note: None,
            discount_codes: Vec::new(),
        };
        let lines = input
            .get("lines")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        if let Err(error) = cart.add(&lines) {
            return json!({ field: { "cart": null, "userErrors": [error] } });
        }

        let payload = json!({ field: { "cart": cart.to_json(), "userErrors": [] } });
        carts.last_created = Some(cart.id.clone());
        carts.carts.insert(cart.id.clone(), cart);
        return payload;
    }

    let cart_id = variables
        .get("cartId")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let Some(cart) = carts.carts.get_mut(cart_id) else {
        let error = user_error(&["cartId"], "The specified cart does not exist.");
        return json!({ field: { "cart": null, "userErrors": [error] } });
    };

    let result = match operation {
        "AddToCart" => cart.add(&list("lines")),
        "UpdateCartLines" => {
            for update in list("lines") {
                let id = update.get("id").and_then(Value::as_str).unwrap_or_default();
                let quantity = update.get("quantity").and_then(Value::as_i64);
                if let (Some(line), Some(quantity)) =
                    (cart.lines.iter_mut().find(|l| l.id == id), quantity)
                {
                    line.quantity = quantity;
                }
            }
            cart.lines.retain(|l| l.quantity > 0);
            Ok(())
        }
        "RemoveFromCart" => {
            let ids = list("lineIds");
            cart.lines
                .retain(|l| !ids.iter().any(|id| id.as_str() == Some(l.id.as_str())));
            Ok(())
        }
        "UpdateCartBuyerIdentity" => {
            cart.buyer_token = buyer_token(variables.get("buyerIdentity"));
            Ok(())
        }
        "UpdateCartNote" => {
            cart.note = variables
                .get("note")
                .and_then(Value::as_str)
                .map(str::to_string);
            Ok(())
        }
        _ => {
            cart.discount_codes = list("discountCodes")
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect();
            Ok(())
        }
    };

    match result {
        Ok(()) => json!({ field: { "cart": cart.to_json(), "userErrors": [] } }),
        Err(error) => json!({ field: { "cart": null, "userErrors": [error] } }),
    }
}

// =============================================================================
// Customer Account API
// =============================================================================

struct AddressBook {
    next_id: usize,
    addresses: Vec<Value>,
    default_id: Option<String>,
}

impl Default for AddressBook {
    fn default() -> Self {
        let id = "gid://shopify/CustomerAddress/1".to_string();
        let address = address_json(
            &id,
            &json!({
                "firstName": "Ada",
                "lastName": "Lovelace",
                "address1": "12 Market St",
                "city": "Toronto",
                "zoneCode": "ON",
                "territoryCode": "CA",
                "zip": "M5V 2T6"
            }),
        );
        Self {
            next_id: 2,
            addresses: vec![address],
            default_id: Some(id),
        }
    }
}

impl AddressBook {
    fn default_address(&self) -> Value {
        self.default_id
            .as_ref()
            .and_then(|id| self.addresses.iter().find(|a| a["id"] == id.as_str()))
            .cloned()
            .unwrap_or(Value::Null)
    }
}

/// A `CustomerAddress` built from mutation input.
fn address_json(id: &str, input: &Value) -> Value {
    let field = |name: &str| input.get(name).and_then(Value::as_str).unwrap_or_default();
    let locality = [field("city"), field("zoneCode"), field("zip")]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let formatted: Vec<&str> = [field("address1"), field("address2"), locality.as_str(), field("territoryCode")]
        .into_iter()
        .filter(|line| !line.is_empty())
        .collect();

    json!({
        "id": id,
        "firstName": input.get("firstName"),
        "lastName": input.get("lastName"),
        "company": input.get("company"),
        "address1": input.get("address1"),
        "address2": input.get("address2"),
        "city": input.get("city"),
        "province": null,
        "zoneCode": input.get("zoneCode"),
        "country": null,
        "territoryCode": input.get("territoryCode"),
        "zip": input.get("zip"),
        "phoneNumber": input.get("phoneNumber"),
        "formatted": formatted
    })
}

fn customer_json(book: &AddressBook, first_name: &str, last_name: &str) -> Value {
    json!({
        "id": "gid://shopify/Customer/42",
        "firstName": first_name,
        "lastName": last_name,
        "displayName": format!("{first_name} {last_name}"),
        "emailAddress": { "emailAddress": "ada@example.com" },
        "phoneNumber": null,
        "defaultAddress": book.default_address()
    })
}

fn order_summary() -> Value {
    json!({
        "id": ORDER_ID,
        "name": "#1001",
        "number": 1001,
        "processedAt": "2026-03-04T12:00:00Z",
        "financialStatus": "PAID",
        "fulfillments": { "nodes": [{ "status": "SUCCESS" }] },
        "totalPrice": money(9360)
    })
}

fn order_detail() -> Value {
    let mut order = order_summary();
    if let Some(fields) = order.as_object_mut() {
        fields.extend(
            json!({
                "cancelledAt": null,
                "statusPageUrl": "https://test.myshopify.com/orders/1001/status",
                "subtotal": money(10400),
                "totalShipping": money(0),
                "totalTax": money(0),
                "shippingAddress": null,
                "discountApplications": { "nodes": [{
                    "code": "WELCOME10",
                    "value": { "__typename": "PricingPercentageValue", "percentage": 10.0 }
                }] },
                "lineItems": { "nodes": [{
                    "title": "Linen Shirt",
                    "variantTitle": "M",
                    "quantity": 2,
                    "sku": "LS-M",
                    "image": null,
                    "price": money(5200),
                    "totalPrice": money(10400)
                }] },
                "allFulfillments": { "nodes": [{
                    "status": "SUCCESS",
                    "trackingInformation": [{ "company": "Canada Post", "number": "CP123", "url": null }]
                }] }
            })
            .as_object()
            .cloned()
            .unwrap_or_default(),
        );
    }
    order
}

/// Validate address input the way Shopify does for the required line.
fn address_errors(input: Option<&Value>) -> Vec<Value> {
    let has_line = input
        .and_then(|a| a.get("address1"))
        .and_then(Value::as_str)
        .is_some_and(|line| !line.trim().is_empty());
    if has_line {
        Vec::new()
    } else {
        vec![json!({ "field": ["address", "address1"], "message": "Address line 1 is required", "code": "BLANK" })]
    }
}

async fn customer_graphql(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let query = body.get("query").and_then(Value::as_str).unwrap_or_default();
    // "query getOrders($first: Int!, ...)" -> "getOrders"
    let operation = query
        .split_whitespace()
        .nth(1)
        .and_then(|word| word.split(['(', '{']).next())
        .unwrap_or_default()
        .to_string();
    state.record(&operation);

    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    *lock(&state.last_customer_token) = Some(token.clone());

    let accepted = token == ACCESS_TOKEN || token == REFRESHED_ACCESS_TOKEN;
    if !accepted || state.reject_tokens.load(Ordering::SeqCst) {
        return (StatusCode::UNAUTHORIZED, "Invalid access token").into_response();
    }

    let variables = body.get("variables").cloned().unwrap_or(Value::Null);
    let mut book = lock(&state.addresses);

    let data = match operation.as_str() {
        "getCustomer" => json!({ "customer": customer_json(&book, "Ada", "Lovelace") }),
        "customerUpdate" => {
            let input = variables.get("input").cloned().unwrap_or(Value::Null);
            let name = |field: &str| {
                input
                    .get(field)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            json!({ "customerUpdate": {
                "customer": customer_json(&book, &name("firstName"), &name("lastName")),
                "userErrors": []
            } })
        }
        "getOrders" => json!({ "customer": { "orders": {
            "nodes": [order_summary()],
            "pageInfo": {
                "hasNextPage": false,
                "hasPreviousPage": false,
                "startCursor": null,
                "endCursor": null
            }
        } } }),
        "getOrder" => {
            let found = variables.get("id").and_then(Value::as_str) == Some(ORDER_ID);
            json!({ "order": found.then(order_detail) })
        }
        "getAddresses" => json!({ "customer": {
            "defaultAddress": book.default_id.as_ref().map(|id| json!({ "id": id })),
            "addresses": { "nodes": book.addresses }
        } }),
        "createAddress" => {
            let input = variables.get("address");
            let errors = address_errors(input);
            let address = if errors.is_empty() {
                let id = format!("gid://shopify/CustomerAddress/{}", book.next_id);
                book.next_id += 1;
                let address = address_json(&id, input.unwrap_or(&Value::Null));
                book.addresses.push(address.clone());
                if variables.get("defaultAddress") == Some(&Value::Bool(true)) {
                    book.default_id = Some(id);
                }
                address
            } else {
                Value::Null
            };
            json!({ "customerAddressCreate": { "customerAddress": address, "userErrors": errors } })
        }
        "updateAddress" => {
            let id = variables
                .get("addressId")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let input = variables.get("address");
            let errors = address_errors(input);
            let mut address = Value::Null;
            if errors.is_empty()
                && let Some(existing) = book.addresses.iter_mut().find(|a| a["id"] == id.as_str())
            {
                *existing = address_json(&id, input.unwrap_or(&Value::Null));
                address = existing.clone();
            }
            json!({ "customerAddressUpdate": { "customerAddress": address, "userErrors": errors } })
        }
        "deleteAddress" => {
            let id = variables
                .get("addressId")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let before = book.addresses.len();
            book.addresses.retain(|a| a["id"] != id);
            let errors = if book.addresses.len() == before {
                vec![json!({ "field": ["addressId"], "message": "Address does not exist", "code": "NOT_FOUND" })]
            } else {
                Vec::new()
            };
            json!({ "customerAddressDelete": {
                "deletedAddressId": errors.is_empty().then_some(id),
                "userErrors": errors
            } })
        }
        _ => {
            return Json(json!({ "errors": [{ "message": format!("{operation} is not stubbed") }] }))
                .into_response();
        }
    };

    Json(json!({ "data": data })).into_response()
}

// =============================================================================
// Storefront under test
// =============================================================================

/// The storefront router wired to a [`FakeShopify`].
pub struct TestApp {
    pub shopify: FakeShopify,
    pub state: AppState,
    router: Router,
}

/// A fully buffered response.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestApp {
    /// Start a fake Shopify and build the storefront against it.
    pub async fn spawn() -> Self {
        let shopify = FakeShopify::start().await;
        let state = AppState::new(shopify.config());
        let router = canopy_storefront::app(state.clone());
        Self {
            shopify,
            state,
            router,
        }
    }

    /// GET without a session.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.send(Method::GET, path, None, None).await
    }

    /// GET with a session cookie.
    pub async fn get_with(&self, path: &str, cookie: &str) -> TestResponse {
        self.send(Method::GET, path, Some(cookie), None).await
    }

    /// POST a urlencoded form.
    pub async fn post_form(&self, path: &str, form: &str, cookie: Option<&str>) -> TestResponse {
        self.send(Method::POST, path, cookie, Some(form)).await
    }

    /// POST a urlencoded form the way HTMX does.
    pub async fn post_htmx(&self, path: &str, form: &str, cookie: Option<&str>) -> TestResponse {
        self.send_with(Method::POST, path, cookie, Some(form), &[("hx-request", "true")])
            .await
    }

    /// Send a request through the full middleware stack.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        cookie: Option<&str>,
        form: Option<&str>,
    ) -> TestResponse {
        self.send_with(method, path, cookie, form, &[]).await
    }

    /// Send a request with extra headers.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    pub async fn send_with(
        &self,
        method: Method,
        path: &str,
        cookie: Option<&str>,
        form: Option<&str>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("x-forwarded-for", CLIENT_IP);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let body = match form {
            Some(form) => {
                builder = builder.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
                Body::from(form.to_string())
            }
            None => Body::empty(),
        };
        let request = builder.body(body).expect("valid test request");

        let Ok(response) = self.router.clone().oneshot(request).await;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable response body");

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}

impl TestResponse {
    /// A header value as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Redirect target.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.header("location")
    }

    /// `name=value` of the session cookie set by this response.
    #[must_use]
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter(|v| v.starts_with(&format!("{SESSION_COOKIE_NAME}=")))
            .find_map(|v| v.split(';').next())
            .map(str::to_string)
    }
}

/// Read a query parameter from an absolute or relative URL.
#[must_use]
pub fn query_param(location: &str, name: &str) -> Option<String> {
    let url = url::Url::parse(location)
        .or_else(|_| url::Url::parse(BASE_URL).and_then(|base| base.join(location)))
        .ok()?;
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}
