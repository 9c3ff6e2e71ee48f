//! Account route handlers (require a signed-in customer).
//!
//! All data comes from the Customer Account API using the token in the
//! session; nothing about the customer is stored locally.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use canopy_core::ShopifyGid;
use serde::Deserialize;
use tracing::instrument;

use super::CursorQuery;
use crate::error::{AppError, Result, set_sentry_user};
use crate::filters;
use crate::middleware::{PageContext, RequireCustomer};
use crate::shopify::ShopifyError;
use crate::shopify::customer::{
    Address, AddressInput, Customer, CustomerUpdateInput, Order, OrderDetail,
};
use crate::state::AppState;

/// Orders per history page.
const ORDERS_PER_PAGE: i64 = 10;

/// Addresses loaded for the address book.
const MAX_ADDRESSES: i64 = 50;

// =============================================================================
// Forms & Views
// =============================================================================

/// Address form data (create and update).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AddressForm {
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub address1: String,
    pub address2: String,
    pub city: String,
    pub zone_code: String,
    pub territory_code: String,
    pub zip: String,
    pub phone_number: String,
    /// Checkbox; present when checked.
    pub default: Option<String>,
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl AddressForm {
    /// Whether "make default" was checked.
    #[must_use]
    pub const fn is_default(&self) -> bool {
        self.default.is_some()
    }

    /// API input; blank fields are left out.
    #[must_use]
    pub fn to_input(&self) -> AddressInput {
        AddressInput {
            first_name: non_empty(&self.first_name),
            last_name: non_empty(&self.last_name),
            company: non_empty(&self.company),
            address1: non_empty(&self.address1),
            address2: non_empty(&self.address2),
            city: non_empty(&self.city),
            zone_code: non_empty(&self.zone_code),
            territory_code: non_empty(&self.territory_code).map(|c| c.to_uppercase()),
            zip: non_empty(&self.zip),
            phone_number: non_empty(&self.phone_number),
        }
    }
}

impl From<&Address> for AddressForm {
    fn from(address: &Address) -> Self {
        let field = |value: &Option<String>| value.clone().unwrap_or_default();
        Self {
            first_name: field(&address.first_name),
            last_name: field(&address.last_name),
            company: field(&address.company),
            address1: field(&address.address1),
            address2: field(&address.address2),
            city: field(&address.city),
            zone_code: field(&address.zone_code),
            territory_code: field(&address.territory_code),
            zip: field(&address.zip),
            phone_number: field(&address.phone_number),
            default: None,
        }
    }
}

/// An address in the address book.
pub struct AddressView {
    /// Numeric ID used in form URLs.
    pub id: String,
    pub name: String,
    pub lines: Vec<String>,
    pub is_default: bool,
    /// Prefilled edit form.
    pub form: AddressForm,
}

impl AddressView {
    fn new(address: &Address, default_id: Option<&str>) -> Option<Self> {
        let id = address.numeric_id()?;
        let lines = if address.formatted.is_empty() {
            vec![address.formatted_single_line()]
        } else {
            address.formatted.clone()
        };
        Some(Self {
            is_default: default_id
                .and_then(|d| ShopifyGid::parse(d).ok())
                .is_some_and(|d| d.id() == id),
            name: address.name(),
            lines,
            form: AddressForm::from(address),
            id,
        })
    }
}

/// Profile form data.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub first_name: String,
    pub last_name: String,
}

/// Success flags shown after redirects.
#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    pub saved: Option<String>,
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub ctx: PageContext,
    pub orders: Vec<Order>,
    pub next_cursor: Option<String>,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "account/order.html")]
pub struct OrderTemplate {
    pub ctx: PageContext,
    pub detail: OrderDetail,
}

/// Address book template.
#[derive(Template, WebTemplate)]
#[template(path = "account/addresses.html")]
pub struct AddressesTemplate {
    pub ctx: PageContext,
    pub addresses: Vec<AddressView>,
    /// Form for a new address (refilled after a rejected submission).
    pub new_address: AddressForm,
    /// Validation error and the address it belongs to ("new" for create).
    pub error: Option<String>,
    pub error_for: String,
    pub saved: bool,
}

/// Profile template.
#[derive(Template, WebTemplate)]
#[template(path = "account/profile.html")]
pub struct ProfileTemplate {
    pub ctx: PageContext,
    pub customer: Customer,
    pub form: ProfileForm,
    pub error: Option<String>,
    pub saved: bool,
}

// =============================================================================
// Helpers
// =============================================================================

/// Parse a numeric route id into a gid.
fn route_gid(resource: &str, id: &str) -> Result<ShopifyGid> {
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::NotFound(format!("{resource} {id}")));
    }
    ShopifyGid::new(resource, id).map_err(|_| AppError::NotFound(format!("{resource} {id}")))
}

async fn address_book(state: &AppState, access_token: &str) -> Result<Vec<AddressView>> {
    let (addresses, default_id) = state
        .customer()
        .get_addresses(access_token, MAX_ADDRESSES)
        .await?;

    Ok(addresses
        .iter()
        .filter_map(|a| AddressView::new(a, default_id.as_deref()))
        .collect())
}

/// Re-render the address book with a validation error.
async fn addresses_with_error(
    state: &AppState,
    ctx: PageContext,
    access_token: &str,
    error_for: &str,
    form: AddressForm,
    message: String,
) -> Result<Response> {
    let mut addresses = address_book(state, access_token).await?;
    let new_address = if error_for == "new" {
        form
    } else {
        if let Some(view) = addresses.iter_mut().find(|a| a.id == error_for) {
            view.form = form;
        }
        AddressForm::default()
    };

    Ok(AddressesTemplate {
        ctx,
        addresses,
        new_address,
        error: Some(message),
        error_for: error_for.to_string(),
        saved: false,
    }
    .into_response())
}

// =============================================================================
// Handlers
// =============================================================================

/// Account root: the order history is the landing page.
pub async fn index(RequireCustomer(_): RequireCustomer) -> Redirect {
    Redirect::to("/account/orders")
}

/// Unknown account paths go back to the account root.
pub async fn fallback() -> Redirect {
    Redirect::to("/account")
}

/// Display order history, newest first.
#[instrument(skip(state, ctx, token))]
pub async fn orders(
    State(state): State<AppState>,
    ctx: PageContext,
    RequireCustomer(token): RequireCustomer,
    Query(query): Query<CursorQuery>,
) -> Result<impl IntoResponse> {
    let (orders, page_info) = state
        .customer()
        .get_orders(&token.access_token, ORDERS_PER_PAGE, query.cursor())
        .await?;

    Ok(OrdersTemplate {
        ctx,
        orders,
        next_cursor: super::next_page(&page_info),
    })
}

/// Display one order.
#[instrument(skip(state, ctx, token))]
pub async fn order(
    State(state): State<AppState>,
    ctx: PageContext,
    RequireCustomer(token): RequireCustomer,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let gid = route_gid("Order", &id)?;
    let detail = state.customer().get_order(&token.access_token, &gid).await?;

    Ok(OrderTemplate { ctx, detail })
}

/// Display the address book.
#[instrument(skip(state, ctx, token))]
pub async fn addresses(
    State(state): State<AppState>,
    ctx: PageContext,
    RequireCustomer(token): RequireCustomer,
    Query(notice): Query<NoticeQuery>,
) -> Result<impl IntoResponse> {
    let addresses = address_book(&state, &token.access_token).await?;

    Ok(AddressesTemplate {
        ctx,
        addresses,
        new_address: AddressForm::default(),
        error: None,
        error_for: String::new(),
        saved: notice.saved.is_some(),
    })
}

/// Create an address.
#[instrument(skip(state, ctx, token, form))]
pub async fn create_address(
    State(state): State<AppState>,
    ctx: PageContext,
    RequireCustomer(token): RequireCustomer,
    Form(form): Form<AddressForm>,
) -> Result<Response> {
    match state
        .customer()
        .create_address(&token.access_token, form.to_input(), form.is_default())
        .await
    {
        Ok(_) => Ok(Redirect::to("/account/addresses?saved=1").into_response()),
        Err(ShopifyError::UserError(message)) => {
            addresses_with_error(&state, ctx, &token.access_token, "new", form, message).await
        }
        Err(e) => Err(e.into()),
    }
}

/// Update an address.
#[instrument(skip(state, ctx, token, form))]
pub async fn update_address(
    State(state): State<AppState>,
    ctx: PageContext,
    RequireCustomer(token): RequireCustomer,
    Path(id): Path<String>,
    Form(form): Form<AddressForm>,
) -> Result<Response> {
    let gid = route_gid("CustomerAddress", &id)?;

    match state
        .customer()
        .update_address(&token.access_token, &gid, form.to_input(), form.is_default())
        .await
    {
        Ok(_) => Ok(Redirect::to("/account/addresses?saved=1").into_response()),
        Err(ShopifyError::UserError(message)) => {
            addresses_with_error(&state, ctx, &token.access_token, &id, form, message).await
        }
        Err(e) => Err(e.into()),
    }
}

/// Delete an address.
#[instrument(skip(state, token))]
pub async fn delete_address(
    State(state): State<AppState>,
    RequireCustomer(token): RequireCustomer,
    Path(id): Path<String>,
) -> Result<Redirect> {
    let gid = route_gid("CustomerAddress", &id)?;
    state
        .customer()
        .delete_address(&token.access_token, &gid)
        .await?;

    Ok(Redirect::to("/account/addresses"))
}

/// Display the profile form.
#[instrument(skip(state, ctx, token))]
pub async fn profile(
    State(state): State<AppState>,
    ctx: PageContext,
    RequireCustomer(token): RequireCustomer,
    Query(notice): Query<NoticeQuery>,
) -> Result<impl IntoResponse> {
    let customer = state.customer().get_customer(&token.access_token).await?;
    set_sentry_user(&customer.id, customer.email());

    Ok(ProfileTemplate {
        ctx,
        form: ProfileForm {
            first_name: customer.first_name.clone().unwrap_or_default(),
            last_name: customer.last_name.clone().unwrap_or_default(),
        },
        customer,
        error: None,
        saved: notice.saved.is_some(),
    })
}

/// Update first and last name.
#[instrument(skip(state, ctx, token, form))]
pub async fn update_profile(
    State(state): State<AppState>,
    ctx: PageContext,
    RequireCustomer(token): RequireCustomer,
    Form(form): Form<ProfileForm>,
) -> Result<Response> {
    let input = CustomerUpdateInput {
        first_name: non_empty(&form.first_name),
        last_name: non_empty(&form.last_name),
    };

    match state
        .customer()
        .update_customer(&token.access_token, input)
        .await
    {
        Ok(_) => Ok(Redirect::to("/account/profile?saved=1").into_response()),
        Err(ShopifyError::UserError(message)) => {
            let customer = state.customer().get_customer(&token.access_token).await?;
            Ok(ProfileTemplate {
                ctx,
                customer,
                form,
                error: Some(message),
                saved: false,
            }
            .into_response())
        }
        Err(e) => Err(e.into()),
    }
}
