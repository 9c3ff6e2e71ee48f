//! End-to-end tests for the storefront router.
//!
//! Every test starts its own fake Shopify and storefront, so caches,
//! sessions and rate limits never leak between tests.

use axum::http::StatusCode;
use canopy_integration_tests::{
    ACCESS_TOKEN, AUTH_CODE, REFRESHED_ACCESS_TOKEN, SHOP_ID, SHOP_NAME, TestApp, query_param,
};

/// Form-encoded variant ids from the fake catalog.
const VARIANT_S: &str = "gid%3A%2F%2Fshopify%2FProductVariant%2F1";
const VARIANT_M: &str = "gid%3A%2F%2Fshopify%2FProductVariant%2F2";

/// Line ids the fake cart hands out, in order.
const LINE_1: &str = "gid%3A%2F%2Fshopify%2FCartLine%2F1";
const LINE_2: &str = "gid%3A%2F%2Fshopify%2FCartLine%2F2";

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_and_readiness() {
    let app = TestApp::spawn().await;

    let resp = app.get("/health").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, "ok");

    let resp = app.get("/health/ready").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, "ready");

    app.shopify.set_unavailable(true);
    let resp = app.get("/health/ready").await;
    assert_eq!(resp.status, StatusCode::SERVICE_UNAVAILABLE);
}

// =============================================================================
// Layout, headers and errors
// =============================================================================

#[tokio::test]
async fn test_home_renders_layout() {
    let app = TestApp::spawn().await;

    let resp = app.get("/").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains(SHOP_NAME));
    // Links to the shop's own domain become relative
    assert!(resp.body.contains(r#"href="/collections/summer""#));
    assert!(resp.body.contains(r#"href="https://journal.example.org/" rel="noopener""#));
    assert!(resp.body.contains(r#"href="/account/login""#));

    app.get("/").await;
    assert_eq!(app.shopify.calls("Layout"), 1, "layout should be cached");
}

#[tokio::test]
async fn test_pages_render_when_shopify_is_down() {
    let app = TestApp::spawn().await;
    app.shopify.set_unavailable(true);

    let resp = app.get("/").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("Store"));
}

#[tokio::test]
async fn test_security_headers_and_request_id() {
    let app = TestApp::spawn().await;
    let resp = app.get("/").await;

    let csp = resp.header("content-security-policy").unwrap_or_default();
    assert!(csp.contains("default-src 'none'"));
    assert!(csp.contains("'nonce-"));
    assert_eq!(resp.header("x-frame-options"), Some("DENY"));
    assert_eq!(resp.header("x-content-type-options"), Some("nosniff"));
    assert!(resp.header("x-request-id").is_some());

    // The nonce in the header is the one on the script tag
    let nonce = csp
        .split("'nonce-")
        .nth(1)
        .and_then(|rest| rest.split('\'').next())
        .unwrap_or_default();
    assert!(!nonce.is_empty());
    assert!(resp.body.contains(&format!(r#"nonce="{nonce}""#)));
}

#[tokio::test]
async fn test_unknown_route_is_404_page() {
    let app = TestApp::spawn().await;

    let resp = app.get("/no-such-page").await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert!(resp.body.contains("Page not found"));
    assert!(resp.body.contains(SHOP_NAME));
}

#[tokio::test]
async fn test_static_assets_are_served() {
    let app = TestApp::spawn().await;

    let resp = app.get("/static/css/site.css").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains(".product-card"));
}

#[tokio::test]
async fn test_home_shows_login_error() {
    let app = TestApp::spawn().await;

    let resp = app.get("/?login_error=access_denied").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("Sign-in was cancelled."));
}

// =============================================================================
// Content
// =============================================================================

#[tokio::test]
async fn test_policies() {
    let app = TestApp::spawn().await;

    let resp = app.get("/policies").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains(r#"href="/policies/privacy-policy""#));
    assert!(resp.body.contains("Refund Policy"));
    // Empty policies are not listed
    assert!(!resp.body.contains("Subscription Policy"));

    let resp = app.get("/policies/refund-policy").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("<p>Returns accepted within 30 days.</p>"));

    assert_eq!(app.get("/policies/shipping-policy").await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.get("/policies/cookie-policy").await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.shopify.calls("GetPolicies"), 1);

    app.state.storefront().invalidate_policies().await;
    app.get("/policies").await;
    assert_eq!(app.shopify.calls("GetPolicies"), 2);
}

#[tokio::test]
async fn test_page_by_handle() {
    let app = TestApp::spawn().await;

    let resp = app.get("/pages/about").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("<p>Small shop, big canopy.</p>"));
    assert!(resp.body.contains(r#"<meta name="description" content="Who we are">"#));

    app.get("/pages/about").await;
    assert_eq!(app.shopify.calls("GetPageByHandle"), 1);

    let resp = app.get("/pages/missing").await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert!(resp.body.contains("Page not found"));
}

#[tokio::test]
async fn test_collection_page() {
    let app = TestApp::spawn().await;

    let resp = app.get("/collections/summer").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("<p>Warm days</p>"));
    assert!(resp.body.contains(r#"href="/products/linen-shirt""#));
    assert!(resp.body.contains("Linen Shirt"));
    assert!(resp.body.contains("/collections/summer?after=c1%3D%3D"));

    app.get("/collections/summer").await;
    assert_eq!(app.shopify.calls("GetCollectionByHandle"), 1);

    app.state.storefront().invalidate_collection("summer");
    app.get("/collections/summer").await;
    assert_eq!(app.shopify.calls("GetCollectionByHandle"), 2);

    assert_eq!(app.get("/collections/winter").await.status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Search
// =============================================================================

#[tokio::test]
async fn test_search() {
    let app = TestApp::spawn().await;

    let resp = app.get("/search").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("Enter a search term"));
    assert_eq!(app.shopify.calls("Search"), 0);

    let resp = app.get("/search?q=%20about%20").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("1 results"));
    assert!(resp.body.contains(r#"href="/pages/about""#));
}

#[tokio::test]
async fn test_search_suggestions() {
    let app = TestApp::spawn().await;

    let resp = app.get("/search/suggest?q=ab").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("About us"));
    assert!(resp.body.contains("<mark>about</mark>"));
    assert!(resp.body.contains(r#"href="/search?q=ab""#));

    let resp = app.get("/search/suggest?q=").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.trim().is_empty());
    assert_eq!(app.shopify.calls("PredictiveSearch"), 1);
}

#[tokio::test]
async fn test_search_suggestions_ignore_malformed_limit() {
    let app = TestApp::spawn().await;

    let resp = app.get("/search/suggest?q=ab&limit=abc").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("About us"));
}

// =============================================================================
// Products
// =============================================================================

#[tokio::test]
async fn test_product_page() {
    let app = TestApp::spawn().await;

    let resp = app.get("/products/linen-shirt").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("<h1>Linen Shirt</h1>"));
    // First available variant is preselected
    assert!(resp.body.contains("SKU LS-S"));
    assert!(resp.body.contains("$48.00"));
    assert!(resp.body.contains(r#"href="/products/linen-shirt?Size=M""#));
    assert!(resp.body.contains(r#"name="variant_id" value="gid://shopify/ProductVariant/1""#));

    // Recommendations
    assert!(resp.body.contains("You may also like"));
    assert!(resp.body.contains(r#"href="/products/canvas-tote""#));

    app.get("/products/linen-shirt").await;
    assert_eq!(app.shopify.calls("GetProductByHandle"), 1);
}

#[tokio::test]
async fn test_product_variant_selection() {
    let app = TestApp::spawn().await;

    let resp = app.get("/products/linen-shirt?Size=M").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("SKU LS-M"));
    assert!(resp.body.contains("$52.00"));
    assert!(resp.body.contains(r#"<s class="price__compare">$60.00</s>"#));
    assert!(resp.body.contains(r#"name="variant_id" value="gid://shopify/ProductVariant/2""#));

    // Unknown option values fall back to the default variant
    let resp = app.get("/products/linen-shirt?Size=XXL").await;
    assert!(resp.body.contains("SKU LS-S"));
}

#[tokio::test]
async fn test_listing_pages() {
    let app = TestApp::spawn().await;

    let resp = app.get("/products").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains(r#"<article class="product-card">"#));
    assert!(resp.body.contains(r#"href="/products/canvas-tote""#));

    let resp = app.get("/collections").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains(r#"href="/collections/basics""#));
    // Only non-empty descriptions are shown
    assert!(resp.body.contains("<p>Warm days</p>"));
    assert_eq!(resp.body.matches("<p></p>").count(), 0);

    let resp = app.get("/").await;
    assert!(resp.body.contains(r#"href="/products/linen-shirt""#));
}

#[tokio::test]
async fn test_missing_product_is_404() {
    let app = TestApp::spawn().await;

    let resp = app.get("/products/no-such-product").await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert!(resp.body.contains("Page not found"));

    // Malformed handles never reach Shopify
    let resp = app.get("/products/Not%20A%20Handle").await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(app.shopify.calls("GetProductByHandle"), 1);
}

// =============================================================================
// Cart
// =============================================================================

#[tokio::test]
async fn test_empty_cart() {
    let app = TestApp::spawn().await;

    let resp = app.get("/cart").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("Your cart is empty"));

    let resp = app.get("/cart/count").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(!resp.body.contains("badge"));

    let resp = app.get("/checkout").await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(resp.location(), Some("/cart"));
}

#[tokio::test]
async fn test_cart_add_update_remove() {
    let app = TestApp::spawn().await;

    let resp = app
        .post_form("/cart/add", &format!("variant_id={VARIANT_M}&quantity=2"), None)
        .await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(resp.location(), Some("/cart"));
    let cookie = resp.session_cookie().unwrap_or_default();
    assert!(!cookie.is_empty());
    assert_eq!(app.shopify.calls("CreateCart"), 1);

    let resp = app.get_with("/cart", &cookie).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("Linen Shirt"));
    assert!(resp.body.contains(r#"<p class="cart-line__variant">M</p>"#));
    assert!(resp.body.contains(r#"name="quantity" value="2""#));
    assert!(resp.body.contains("$104.00"));

    // A zero quantity on add still adds one
    app.post_form("/cart/add", &format!("variant_id={VARIANT_S}&quantity=0"), Some(&cookie))
        .await;
    assert_eq!(app.shopify.calls("AddToCart"), 1);
    let resp = app.get_with("/cart/count", &cookie).await;
    assert!(resp.body.contains(r#"aria-label="3 items in cart""#));

    let resp = app
        .post_form("/cart/update", &format!("line_id={LINE_2}&quantity=4"), Some(&cookie))
        .await;
    assert_eq!(resp.location(), Some("/cart"));
    assert_eq!(app.shopify.calls("UpdateCartLines"), 1);
    let resp = app.get_with("/cart/count", &cookie).await;
    assert!(resp.body.contains(r#"aria-label="6 items in cart""#));

    // Quantity 0 removes the line
    app.post_form("/cart/update", &format!("line_id={LINE_1}&quantity=0"), Some(&cookie))
        .await;
    assert_eq!(app.shopify.calls("RemoveFromCart"), 1);
    assert_eq!(app.shopify.calls("UpdateCartLines"), 1);
    let resp = app.get_with("/cart", &cookie).await;
    assert!(!resp.body.contains(r#"<p class="cart-line__variant">M</p>"#));
    assert!(resp.body.contains(r#"<p class="cart-line__variant">S</p>"#));

    app.post_form("/cart/remove", &format!("line_id={LINE_2}"), Some(&cookie))
        .await;
    assert_eq!(app.shopify.calls("RemoveFromCart"), 2);
    let resp = app.get_with("/cart", &cookie).await;
    assert!(resp.body.contains("Your cart is empty"));
}

#[tokio::test]
async fn test_htmx_add_returns_count_badge() {
    let app = TestApp::spawn().await;

    let resp = app
        .post_htmx("/cart/add", &format!("variant_id={VARIANT_S}"), None)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.header("hx-trigger"), Some("cart-updated"));
    assert!(resp.body.contains(r#"aria-label="1 items in cart""#));
}

#[tokio::test]
async fn test_add_rejects_bad_variants() {
    let app = TestApp::spawn().await;

    let resp = app.post_form("/cart/add", "variant_id=not-a-gid", None).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = app
        .post_form("/cart/add", "variant_id=gid%3A%2F%2Fshopify%2FProduct%2F1", None)
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.shopify.calls("CreateCart"), 0);

    // Well-formed but unknown to Shopify
    let resp = app
        .post_form("/cart/add", "variant_id=gid%3A%2F%2Fshopify%2FProductVariant%2F999", None)
        .await;
    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(resp.body.contains("does not exist"));
}

#[tokio::test]
async fn test_stale_cart_is_dropped() {
    let app = TestApp::spawn().await;

    let resp = app
        .post_form("/cart/add", &format!("variant_id={VARIANT_S}"), None)
        .await;
    let cookie = resp.session_cookie().unwrap_or_default();

    app.shopify.expire_carts();

    let resp = app.get_with("/cart", &cookie).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("Your cart is empty"));
    let lookups = app.shopify.calls("GetCart");

    // The stale id is gone, so Shopify is not asked again
    app.get_with("/cart", &cookie).await;
    assert_eq!(app.shopify.calls("GetCart"), lookups);

    let resp = app
        .post_form("/cart/add", &format!("variant_id={VARIANT_S}"), Some(&cookie))
        .await;
    assert_eq!(resp.location(), Some("/cart"));
    assert_eq!(app.shopify.calls("CreateCart"), 2);
    assert_eq!(app.shopify.calls("AddToCart"), 0);
}

#[tokio::test]
async fn test_signed_in_cart_carries_buyer_identity() {
    let app = TestApp::spawn().await;
    let cookie = sign_in(&app, None).await;

    app.post_form("/cart/add", &format!("variant_id={VARIANT_S}"), Some(&cookie))
        .await;
    assert_eq!(app.shopify.cart_buyer().as_deref(), Some(ACCESS_TOKEN));
}

#[tokio::test]
async fn test_login_attaches_anonymous_cart() {
    let app = TestApp::spawn().await;

    let resp = app
        .post_form("/cart/add", &format!("variant_id={VARIANT_M}"), None)
        .await;
    let cookie = resp.session_cookie().unwrap_or_default();
    assert_eq!(app.shopify.cart_buyer(), None);

    let signed_in = sign_in(&app, Some(&cookie)).await;
    assert_eq!(app.shopify.calls("UpdateCartBuyerIdentity"), 1);
    assert_eq!(app.shopify.cart_buyer().as_deref(), Some(ACCESS_TOKEN));

    let resp = app.get_with("/cart", &signed_in).await;
    assert!(resp.body.contains(r#"<p class="cart-line__variant">M</p>"#));
}

// =============================================================================
// Compare
// =============================================================================

#[tokio::test]
async fn test_compare_shared_handles() {
    let app = TestApp::spawn().await;

    let resp = app.get("/compare?handles=linen-shirt,canvas-tote").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains(r#"<table class="compare-table">"#));
    assert_eq!(app.shopify.calls("GetProductsByHandles"), 1);

    // Columns follow the requested order, not Shopify's
    let shirt = resp.body.find(r#"href="/products/linen-shirt""#);
    let tote = resp.body.find(r#"href="/products/canvas-tote""#);
    assert!(shirt.is_some() && tote.is_some() && shirt < tote);

    assert!(resp.body.contains(r#"<th scope="row">Size</th>"#));
    assert!(resp.body.contains("<td>S, M</td>"));
    assert!(resp.body.contains("<td>—</td>"));
    assert!(resp.body.contains("compare-table__diff"));
    // Shared links don't touch the session list
    assert!(!resp.body.contains("Clear comparison"));
}

#[tokio::test]
async fn test_compare_list_in_session() {
    let app = TestApp::spawn().await;

    let resp = app.get("/compare").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("You haven't added any products to compare yet."));

    let resp = app
        .post_form("/compare/add", "handle=linen-shirt", None)
        .await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(resp.location(), Some("/compare"));
    assert!(resp.session_cookie().is_some());

    let resp = app.get("/compare?handles=").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(app.shopify.calls("GetProductsByHandles"), 0);
}

// =============================================================================
// Customer accounts
// =============================================================================

#[tokio::test]
async fn test_account_pages_require_login() {
    let app = TestApp::spawn().await;

    for path in ["/account", "/account/orders", "/account/addresses", "/account/profile"] {
        let resp = app.get(path).await;
        assert_eq!(resp.status, StatusCode::SEE_OTHER, "{path}");
        assert_eq!(resp.location(), Some("/account/login"), "{path}");
    }

    let resp = app.get("/account/nowhere").await;
    assert_eq!(resp.location(), Some("/account"));
}

#[tokio::test]
async fn test_login_redirects_to_authorization() {
    let app = TestApp::spawn().await;

    let resp = app.get("/account/login").await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert!(resp.session_cookie().is_some());

    let location = resp.location().unwrap_or_default();
    let expected_prefix = format!("{}/{SHOP_ID}/auth/oauth/authorize?", app.shopify.origin());
    assert!(location.starts_with(&expected_prefix), "{location}");
    assert_eq!(query_param(location, "client_id").as_deref(), Some("test-client"));
    assert_eq!(query_param(location, "response_type").as_deref(), Some("code"));
    assert_eq!(
        query_param(location, "redirect_uri").as_deref(),
        Some("http://localhost:3000/account/authorize")
    );
    assert_eq!(query_param(location, "code_challenge_method").as_deref(), Some("S256"));
    assert!(query_param(location, "state").is_some_and(|s| s.len() == 32));
    assert!(query_param(location, "nonce").is_some());
    assert!(query_param(location, "code_challenge").is_some());
}

/// Complete the fake OAuth flow, continuing `cookie`'s session when given,
/// and return the rotated session cookie.
async fn sign_in(app: &TestApp, cookie: Option<&str>) -> String {
    let resp = match cookie {
        Some(cookie) => app.get_with("/account/login", cookie).await,
        None => app.get("/account/login").await,
    };
    let location = resp.location().unwrap_or_default();
    let session = resp
        .session_cookie()
        .or_else(|| cookie.map(str::to_string))
        .unwrap_or_default();
    let state = query_param(location, "state").unwrap_or_default();
    app.shopify
        .issue_nonce(&query_param(location, "nonce").unwrap_or_default());

    let resp = app
        .get_with(&format!("/account/authorize?code={AUTH_CODE}&state={state}"), &session)
        .await;
    assert_eq!(resp.location(), Some("/account"));
    resp.session_cookie().unwrap_or_default()
}

/// Start a login and return the session cookie plus the state and nonce.
async fn begin_login(app: &TestApp) -> (String, String, String) {
    let resp = app.get("/account/login").await;
    let location = resp.location().unwrap_or_default();
    (
        resp.session_cookie().unwrap_or_default(),
        query_param(location, "state").unwrap_or_default(),
        query_param(location, "nonce").unwrap_or_default(),
    )
}

#[tokio::test]
async fn test_full_login_and_logout() {
    let app = TestApp::spawn().await;
    let (cookie, state, nonce) = begin_login(&app).await;
    app.shopify.issue_nonce(&nonce);

    let resp = app
        .get_with(&format!("/account/authorize?code={AUTH_CODE}&state={state}"), &cookie)
        .await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(resp.location(), Some("/account"));

    // Session id is rotated on sign-in
    let signed_in = resp.session_cookie().unwrap_or_default();
    assert!(!signed_in.is_empty());
    assert_ne!(signed_in, cookie);

    let resp = app.get_with("/", &signed_in).await;
    assert!(resp.body.contains("Sign out"));

    let resp = app.post_form("/account/logout", "", Some(&signed_in)).await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    let location = resp.location().unwrap_or_default();
    assert!(
        location.starts_with(&format!("{}/{SHOP_ID}/auth/logout?id_token_hint=", app.shopify.origin())),
        "{location}"
    );
    assert_eq!(
        query_param(location, "post_logout_redirect_uri").as_deref(),
        Some("http://localhost:3000")
    );

    let resp = app.get_with("/", &signed_in).await;
    assert!(!resp.body.contains("Sign out"));
}

#[tokio::test]
async fn test_authorize_state_is_single_use() {
    let app = TestApp::spawn().await;
    let (cookie, state, nonce) = begin_login(&app).await;
    app.shopify.issue_nonce(&nonce);

    let callback = format!("/account/authorize?code={AUTH_CODE}&state={state}");
    let first = app.get_with(&callback, &cookie).await;
    assert_eq!(first.location(), Some("/account"));

    let replay = app.get_with(&callback, &cookie).await;
    assert_eq!(replay.location(), Some("/?login_error=invalid_state"));
}

#[tokio::test]
async fn test_authorize_rejects_forged_state() {
    let app = TestApp::spawn().await;
    let (cookie, _, _) = begin_login(&app).await;

    let resp = app
        .get_with(&format!("/account/authorize?code={AUTH_CODE}&state=forged"), &cookie)
        .await;
    assert_eq!(resp.location(), Some("/?login_error=invalid_state"));
}

#[tokio::test]
async fn test_authorize_rejected_code() {
    let app = TestApp::spawn().await;
    let (cookie, state, _) = begin_login(&app).await;

    let resp = app
        .get_with(&format!("/account/authorize?code=bogus&state={state}"), &cookie)
        .await;
    assert_eq!(resp.location(), Some("/?login_error=token_exchange_failed"));
}

#[tokio::test]
async fn test_authorize_rejects_foreign_nonce() {
    let app = TestApp::spawn().await;
    let (cookie, state, _) = begin_login(&app).await;
    app.shopify.issue_nonce("someone-else");

    let resp = app
        .get_with(&format!("/account/authorize?code={AUTH_CODE}&state={state}"), &cookie)
        .await;
    assert_eq!(resp.location(), Some("/?login_error=invalid_nonce"));
}

#[tokio::test]
async fn test_authorize_provider_errors() {
    let app = TestApp::spawn().await;

    let resp = app
        .get("/account/authorize?error=access_denied&error_description=User%20cancelled")
        .await;
    assert_eq!(resp.location(), Some("/?login_error=access_denied"));

    let resp = app.get("/account/authorize?error=%3Cscript%3E").await;
    assert_eq!(resp.location(), Some("/?login_error=authorization_failed"));

    let resp = app.get("/account/authorize?state=abc").await;
    assert_eq!(resp.location(), Some("/?login_error=invalid_state"));
}

#[tokio::test]
async fn test_logout_without_session() {
    let app = TestApp::spawn().await;

    let resp = app.post_form("/account/logout", "", None).await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(resp.location(), Some("/"));
}

#[tokio::test]
async fn test_auth_routes_are_rate_limited() {
    let app = TestApp::spawn().await;

    for _ in 0..5 {
        assert_eq!(app.get("/account/login").await.status, StatusCode::SEE_OTHER);
    }
    assert_eq!(
        app.get("/account/login").await.status,
        StatusCode::TOO_MANY_REQUESTS
    );

    // Other routes are not limited
    assert_eq!(app.get("/health").await.status, StatusCode::OK);
}

// =============================================================================
// Signed-in account pages
// =============================================================================

#[tokio::test]
async fn test_order_history() {
    let app = TestApp::spawn().await;
    let cookie = sign_in(&app, None).await;

    let resp = app.get_with("/account", &cookie).await;
    assert_eq!(resp.location(), Some("/account/orders"));

    let resp = app.get_with("/account/orders", &cookie).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains(r##"<a href="/account/orders/1001">#1001</a>"##));
    assert!(resp.body.contains("March 4, 2026"));
    assert!(resp.body.contains("$93.60"));
    assert_eq!(app.shopify.last_customer_token().as_deref(), Some(ACCESS_TOKEN));
}

#[tokio::test]
async fn test_order_detail() {
    let app = TestApp::spawn().await;
    let cookie = sign_in(&app, None).await;

    let resp = app.get_with("/account/orders/1001", &cookie).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("<h1>Order #1001</h1>"));
    assert!(resp.body.contains("SKU LS-M"));
    assert!(resp.body.contains("Discount (WELCOME10)"));
    assert!(resp.body.contains("-10%"));
    assert!(resp.body.contains("CP123"));

    let resp = app.get_with("/account/orders/999", &cookie).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert!(resp.body.contains("Page not found"));

    // Non-numeric ids are rejected before any API call
    let before = app.shopify.calls("getOrder");
    let resp = app.get_with("/account/orders/abc", &cookie).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(app.shopify.calls("getOrder"), before);
}

#[tokio::test]
async fn test_address_book_create_update_delete() {
    let app = TestApp::spawn().await;
    let cookie = sign_in(&app, None).await;

    let resp = app.get_with("/account/addresses", &cookie).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("12 Market St"));
    assert!(resp.body.contains(r#"<span class="badge">Default</span>"#));

    let resp = app
        .post_form(
            "/account/addresses",
            "first_name=Grace&last_name=Hopper&address1=1+Harbour+Rd&city=Halifax&zone_code=NS&zip=B3H+1A1&territory_code=ca",
            Some(&cookie),
        )
        .await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(resp.location(), Some("/account/addresses?saved=1"));

    let resp = app.get_with("/account/addresses?saved=1", &cookie).await;
    assert!(resp.body.contains("Your address book was updated."));
    assert!(resp.body.contains("Grace Hopper"));
    assert!(resp.body.contains("Halifax NS B3H 1A1"));
    // Country codes are sent upper-cased
    assert!(!resp.body.contains("ca<br>"));

    let resp = app
        .post_form(
            "/account/addresses/1",
            "first_name=Ada&last_name=Lovelace&address1=14+Market+St&city=Toronto&zone_code=ON&zip=M5V+2T6&territory_code=CA",
            Some(&cookie),
        )
        .await;
    assert_eq!(resp.location(), Some("/account/addresses?saved=1"));
    let resp = app.get_with("/account/addresses", &cookie).await;
    assert!(resp.body.contains("14 Market St"));
    assert!(!resp.body.contains("12 Market St"));

    let resp = app
        .post_form("/account/addresses/2/delete", "", Some(&cookie))
        .await;
    assert_eq!(resp.location(), Some("/account/addresses"));
    let resp = app.get_with("/account/addresses", &cookie).await;
    assert!(!resp.body.contains("1 Harbour Rd"));

    assert_eq!(app.shopify.calls("createAddress"), 1);
    assert_eq!(app.shopify.calls("updateAddress"), 1);
    assert_eq!(app.shopify.calls("deleteAddress"), 1);

    let resp = app
        .post_form("/account/addresses/abc/delete", "", Some(&cookie))
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_address_user_error_rerenders_form() {
    let app = TestApp::spawn().await;
    let cookie = sign_in(&app, None).await;

    let resp = app
        .post_form("/account/addresses", "city=Halifax&zip=B3H", Some(&cookie))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("Address line 1 is required"));
    // The rejected input is kept
    assert!(resp.body.contains(r#"name="city" value="Halifax""#));
    assert_eq!(resp.body.matches(r#"class="address-card""#).count(), 1);

    let resp = app
        .post_form("/account/addresses/1", "city=Ottawa", Some(&cookie))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("Address line 1 is required"));
    assert!(resp.body.contains("<details open>"));
    assert!(resp.body.contains(r#"name="city" value="Ottawa""#));
}

#[tokio::test]
async fn test_profile_update() {
    let app = TestApp::spawn().await;
    let cookie = sign_in(&app, None).await;

    let resp = app.get_with("/account/profile", &cookie).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains(r#"name="first_name" value="Ada""#));

    let resp = app
        .post_form("/account/profile", "first_name=Augusta&last_name=King", Some(&cookie))
        .await;
    assert_eq!(resp.location(), Some("/account/profile?saved=1"));
    assert_eq!(app.shopify.calls("customerUpdate"), 1);
}

#[tokio::test]
async fn test_expired_token_is_refreshed() {
    let app = TestApp::spawn().await;
    app.shopify.issue_expired_tokens(true);
    let cookie = sign_in(&app, None).await;

    let resp = app.get_with("/account/orders", &cookie).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(app.shopify.calls("refresh_token"), 1);
    assert_eq!(
        app.shopify.last_customer_token().as_deref(),
        Some(REFRESHED_ACCESS_TOKEN)
    );

    // The refreshed token was stored
    let resp = app.get_with("/account/orders", &cookie).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(app.shopify.calls("refresh_token"), 1);
}

#[tokio::test]
async fn test_rejected_token_signs_out() {
    let app = TestApp::spawn().await;
    let cookie = sign_in(&app, None).await;
    app.shopify.reject_customer_tokens(true);

    let resp = app.get_with("/account/orders", &cookie).await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(resp.location(), Some("/account/login"));

    let resp = app.get_with("/", &cookie).await;
    assert!(!resp.body.contains("Sign out"));

    // No further Customer Account API calls with the dead token
    let resp = app.get_with("/account/orders", &cookie).await;
    assert_eq!(resp.location(), Some("/account/login"));
    assert_eq!(app.shopify.calls("getOrders"), 1);
}
