//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads;
//! without HTMX the forms fall back to a redirect to `/cart`. The cart ID is
//! stored in the session and dropped once Shopify no longer knows the cart.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use canopy_core::ShopifyGid;

use super::products::ImageView;
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::{OptionalCustomer, PageContext};
use crate::models::session_keys;
use crate::shopify::types::{
    Cart, CartBuyerIdentityInput, CartLine, CartLineInput, CartLineUpdateInput,
};
use crate::shopify::{CustomerAccessToken, ShopifyError};
use crate::state::AppState;

/// Largest quantity accepted for a single line.
const MAX_LINE_QUANTITY: u32 = 99;

/// Event fired for HTMX listeners after any cart change.
const CART_UPDATED: (&str, &str) = ("HX-Trigger", "cart-updated");

/// Cart item display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub variant_title: Option<String>,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
    pub image: Option<ImageView>,
}

impl CartItemView {
    /// Storefront URL path for the line's product.
    #[must_use]
    pub fn path(&self) -> String {
        format!("/products/{}", self.handle)
    }
}

/// Discount code display data.
#[derive(Clone)]
pub struct DiscountView {
    pub code: String,
    pub applicable: bool,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub total: String,
    pub item_count: u32,
    pub discount_codes: Vec<DiscountView>,
    pub note: String,
}

impl CartView {
    /// Create an empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            subtotal: "$0.00".to_string(),
            total: "$0.00".to_string(),
            item_count: 0,
            discount_codes: Vec::new(),
            note: String::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// Type Conversions
// =============================================================================

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.lines.iter().map(CartItemView::from).collect(),
            subtotal: cart.cost.subtotal.display(),
            total: cart.cost.total.display(),
            item_count: u32::try_from(cart.total_quantity).unwrap_or(0),
            discount_codes: cart
                .discount_codes
                .iter()
                .map(|d| DiscountView {
                    code: d.code.clone(),
                    applicable: d.applicable,
                })
                .collect(),
            note: cart.note.clone().unwrap_or_default(),
        }
    }
}

impl From<&CartLine> for CartItemView {
    fn from(line: &CartLine) -> Self {
        let merchandise = &line.merchandise;
        Self {
            id: line.id.clone(),
            handle: merchandise.product.handle.clone(),
            title: merchandise.product.title.clone(),
            variant_title: if merchandise.title == "Default Title" {
                None
            } else {
                Some(merchandise.title.clone())
            },
            quantity: u32::try_from(line.quantity).unwrap_or(1),
            price: line.cost.amount_per_quantity.display(),
            line_price: line.cost.total_amount.display(),
            image: merchandise
                .image
                .as_ref()
                .or(merchandise.product.featured_image.as_ref())
                .map(|img| ImageView::new(img, &merchandise.product.title)),
        }
    }
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Get the cart ID from the session.
async fn get_cart_id(session: &Session) -> Option<String> {
    session
        .get::<String>(session_keys::CART_ID)
        .await
        .ok()
        .flatten()
}

/// Set the cart ID in the session.
async fn set_cart_id(
    session: &Session,
    cart_id: &str,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART_ID, cart_id).await
}

/// Forget a cart Shopify no longer has (expired or completed).
async fn drop_cart_id(session: &Session) {
    if let Err(e) = session.remove::<String>(session_keys::CART_ID).await {
        tracing::warn!(error = %e, "Failed to drop stale cart ID");
    }
}

/// Fetch the session's cart, dropping the ID if the cart is gone.
async fn load_cart(state: &AppState, session: &Session) -> Option<Cart> {
    let cart_id = get_cart_id(session).await?;

    match state.storefront().get_cart(&cart_id).await {
        Ok(cart) => Some(cart),
        Err(ShopifyError::NotFound(_)) => {
            tracing::info!(cart_id = %cart_id, "Cart no longer exists, dropping it");
            drop_cart_id(session).await;
            None
        }
        Err(e) => {
            tracing::warn!(cart_id = %cart_id, error = %e, "Failed to fetch cart");
            None
        }
    }
}

/// Buyer identity for new carts of a signed-in customer.
fn buyer_identity(customer: Option<&CustomerAccessToken>) -> Option<CartBuyerIdentityInput> {
    customer.map(|token| CartBuyerIdentityInput {
        customer_access_token: Some(token.access_token.clone()),
        ..CartBuyerIdentityInput::default()
    })
}

fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("hx-request")
}

/// Clamp a requested line quantity to the accepted range.
fn clamp_quantity(quantity: u32) -> i64 {
    i64::from(quantity.min(MAX_LINE_QUANTITY))
}

/// Quantity for a new line; adding always adds at least one.
fn add_quantity(quantity: Option<u32>) -> i64 {
    i64::from(quantity.unwrap_or(1).clamp(1, MAX_LINE_QUANTITY))
}

/// Only product variant GIDs can be added as cart lines.
fn parse_variant_id(raw: &str) -> Result<ShopifyGid, AppError> {
    ShopifyGid::parse(raw.trim())
        .ok()
        .filter(|gid| gid.resource() == "ProductVariant")
        .ok_or_else(|| AppError::BadRequest("invalid variant id".to_string()))
}

// =============================================================================
// Forms & Templates
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub variant_id: String,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub line_id: String,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub line_id: String,
}

/// Discount code form data. An empty code clears all codes.
#[derive(Debug, Deserialize)]
pub struct DiscountForm {
    #[serde(default)]
    pub code: String,
}

/// Cart note form data.
#[derive(Debug, Deserialize)]
pub struct NoteForm {
    #[serde(default)]
    pub note: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub ctx: PageContext,
    pub cart: CartView,
    pub error: Option<String>,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
    pub error: Option<String>,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Respond to a cart mutation with the items fragment (HTMX) or a redirect.
///
/// User errors (invalid quantity, unknown code) are shown with the current
/// cart; other failures are logged.
async fn cart_response(
    state: &AppState,
    session: &Session,
    headers: &HeaderMap,
    result: Result<Cart, ShopifyError>,
    action: &str,
) -> Response {
    if !is_htmx(headers) {
        if let Err(e) = &result {
            tracing::warn!(error = %e, "Failed to {action}");
        }
        return Redirect::to("/cart").into_response();
    }

    match result {
        Ok(cart) => {
            add_breadcrumb("cart", action, None);
            (
                AppendHeaders([CART_UPDATED]),
                CartItemsTemplate {
                    cart: CartView::from(&cart),
                    error: None,
                },
            )
                .into_response()
        }
        Err(e) => {
            let error = match &e {
                ShopifyError::UserError(message) => message.clone(),
                _ => {
                    tracing::error!(error = %e, "Failed to {action}");
                    "Something went wrong updating your cart".to_string()
                }
            };
            let cart = load_cart(state, session)
                .await
                .map_or_else(CartView::empty, |cart| CartView::from(&cart));
            CartItemsTemplate {
                cart,
                error: Some(error),
            }
            .into_response()
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, session, ctx))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
) -> impl IntoResponse {
    let cart = load_cart(&state, &session)
        .await
        .map_or_else(CartView::empty, |cart| CartView::from(&cart));

    CartShowTemplate {
        ctx,
        cart,
        error: None,
    }
}

/// Add item to cart.
///
/// Creates a new cart if one doesn't exist (or the stored one is gone), or
/// adds to the existing cart. Returns the count badge with an HTMX trigger.
#[instrument(skip(state, session, customer, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    OptionalCustomer(customer): OptionalCustomer,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let variant_id = match parse_variant_id(&form.variant_id) {
        Ok(gid) => gid,
        Err(e) => return e.into_response(),
    };
    let line = CartLineInput::new(variant_id.to_string(), add_quantity(form.quantity));

    let existing = match get_cart_id(&session).await {
        Some(cart_id) => match state.storefront().get_cart(&cart_id).await {
            Ok(_) => Some(cart_id),
            Err(ShopifyError::NotFound(_)) => {
                drop_cart_id(&session).await;
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to check cart before adding");
                Some(cart_id)
            }
        },
        None => None,
    };

    let result = match existing {
        Some(cart_id) => state.storefront().add_to_cart(&cart_id, vec![line]).await,
        None => {
            state
                .storefront()
                .create_cart(vec![line], buyer_identity(customer.as_ref()))
                .await
        }
    };

    match result {
        Ok(cart) => {
            if let Err(e) = set_cart_id(&session, &cart.id).await {
                tracing::error!(error = %e, "Failed to save cart ID to session");
            }
            add_breadcrumb("cart", "Added to cart", None);

            if !is_htmx(&headers) {
                return Redirect::to("/cart").into_response();
            }

            let count = u32::try_from(cart.total_quantity).unwrap_or(0);
            (AppendHeaders([CART_UPDATED]), CartCountTemplate { count }).into_response()
        }
        Err(ShopifyError::UserError(message)) => {
            tracing::info!(error = %message, "Add to cart rejected");
            (StatusCode::UNPROCESSABLE_ENTITY, message).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to add item to cart");
            (StatusCode::BAD_GATEWAY, "Error adding to cart").into_response()
        }
    }
}

/// Update cart item quantity; quantity 0 removes the line.
#[instrument(skip(state, session, headers))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Response {
    let Some(cart_id) = get_cart_id(&session).await else {
        return empty_cart_response(&headers);
    };

    let result = if form.quantity == 0 {
        state
            .storefront()
            .remove_from_cart(&cart_id, vec![form.line_id])
            .await
    } else {
        state
            .storefront()
            .update_cart(
                &cart_id,
                vec![CartLineUpdateInput {
                    id: form.line_id,
                    quantity: Some(clamp_quantity(form.quantity)),
                }],
            )
            .await
    };

    cart_response(&state, &session, &headers, result, "update cart").await
}

/// Remove item from cart.
#[instrument(skip(state, session, headers))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Response {
    let Some(cart_id) = get_cart_id(&session).await else {
        return empty_cart_response(&headers);
    };

    let result = state
        .storefront()
        .remove_from_cart(&cart_id, vec![form.line_id])
        .await;

    cart_response(&state, &session, &headers, result, "remove from cart").await
}

/// Apply a discount code, or clear codes with an empty one.
#[instrument(skip(state, session, headers))]
pub async fn discount(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<DiscountForm>,
) -> Response {
    let Some(cart_id) = get_cart_id(&session).await else {
        return empty_cart_response(&headers);
    };

    let code = form.code.trim();
    let codes = if code.is_empty() {
        Vec::new()
    } else {
        vec![code.to_string()]
    };

    let result = state
        .storefront()
        .update_discount_codes(&cart_id, codes)
        .await;

    cart_response(&state, &session, &headers, result, "apply discount code").await
}

/// Update the cart note.
#[instrument(skip(state, session, headers, form))]
pub async fn note(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<NoteForm>,
) -> Response {
    let Some(cart_id) = get_cart_id(&session).await else {
        return empty_cart_response(&headers);
    };

    let result = state
        .storefront()
        .update_cart_note(&cart_id, form.note.trim())
        .await;

    cart_response(&state, &session, &headers, result, "update cart note").await
}

fn empty_cart_response(headers: &HeaderMap) -> Response {
    if is_htmx(headers) {
        CartItemsTemplate {
            cart: CartView::empty(),
            error: None,
        }
        .into_response()
    } else {
        Redirect::to("/cart").into_response()
    }
}

/// Get cart count badge (HTMX).
#[instrument(skip(state, session))]
pub async fn count(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let count = load_cart(&state, &session)
        .await
        .map_or(0, |cart| u32::try_from(cart.total_quantity).unwrap_or(0));

    CartCountTemplate { count }
}

/// Redirect to Shopify checkout.
#[instrument(skip(state, session))]
pub async fn checkout(State(state): State<AppState>, session: Session) -> Redirect {
    match load_cart(&state, &session).await {
        Some(cart) if !cart.is_empty() => Redirect::to(&cart.checkout_url),
        _ => Redirect::to("/cart"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_quantity() {
        assert_eq!(clamp_quantity(0), 0);
        assert_eq!(clamp_quantity(3), 3);
        assert_eq!(clamp_quantity(5000), 99);
    }

    #[test]
    fn test_add_quantity_is_at_least_one() {
        assert_eq!(add_quantity(None), 1);
        assert_eq!(add_quantity(Some(0)), 1);
        assert_eq!(add_quantity(Some(4)), 4);
        assert_eq!(add_quantity(Some(500)), 99);
    }

    #[test]
    fn test_parse_variant_id() {
        let gid = parse_variant_id(" gid://shopify/ProductVariant/42 ").unwrap();
        assert_eq!(gid.id(), "42");

        assert!(matches!(
            parse_variant_id("gid://shopify/Product/42"),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(parse_variant_id("42"), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_buyer_identity_for_signed_in_customer() {
        assert!(buyer_identity(None).is_none());

        let token = CustomerAccessToken {
            access_token: "shcat_abc".to_string(),
            id_token: None,
            refresh_token: None,
            expires_in: None,
            obtained_at: 0,
        };
        let identity = buyer_identity(Some(&token));
        assert_eq!(
            identity.and_then(|i| i.customer_access_token).as_deref(),
            Some("shcat_abc")
        );
    }

    #[test]
    fn test_is_htmx() {
        let mut headers = HeaderMap::new();
        assert!(!is_htmx(&headers));
        headers.insert("HX-Request", axum::http::HeaderValue::from_static("true"));
        assert!(is_htmx(&headers));
    }
}
