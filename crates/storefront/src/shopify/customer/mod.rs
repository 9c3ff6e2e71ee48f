//! Shopify Customer Account API client.
//!
//! The Customer Account API provides access to customer authentication and
//! account management. Uses OAuth 2.0 with PKCE for authentication.
//!
//! # OAuth Flow
//!
//! 1. Generate a [`Pkce`] pair, a state and a nonce; keep them in the session
//! 2. Redirect the customer to [`CustomerClient::authorization_url`]
//! 3. Shopify redirects back with an authorization code
//! 4. Exchange it with [`CustomerClient::exchange_code`] and the stored verifier
//! 5. Check the id token nonce with [`id_token_nonce`]
//! 6. Use the access token for customer-scoped API calls

mod pkce;
mod types;

pub use pkce::{Pkce, code_challenge, id_token_nonce, random_string};
pub use types::*;

use std::sync::Arc;

use canopy_core::ShopifyGid;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::instrument;

use crate::config::ShopifyStorefrontConfig;
use crate::shopify::types::{Image, Money, PageInfo};
use crate::shopify::{GraphQLError, ShopifyError};

/// OAuth scopes requested at login.
const SCOPES: &str = "openid email customer-account-api:full";

/// Selection shared by every query returning a `CustomerAddress`.
macro_rules! address_fields {
    () => {
        "id firstName lastName company address1 address2 city province zoneCode \
         country territoryCode zip phoneNumber formatted"
    };
}

/// Selection for the customer profile.
macro_rules! customer_fields {
    () => {
        concat!(
            "id firstName lastName displayName \
             emailAddress { emailAddress } phoneNumber { phoneNumber } \
             defaultAddress { ",
            address_fields!(),
            " }"
        )
    };
}

/// Selection for an order summary row.
macro_rules! order_summary_fields {
    () => {
        "id name number processedAt financialStatus \
         fulfillments(first: 1, sortKey: CREATED_AT, reverse: true) { nodes { status } } \
         totalPrice { amount currencyCode }"
    };
}

macro_rules! user_error_fields {
    () => {
        "userErrors { field message code }"
    };
}

// ─────────────────────────────────────────────────────────────────────────────
// GraphQL Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GraphQLRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    variables: Option<serde_json::Value>,
}

fn into_result<T>(response: graphql_client::Response<T>) -> Result<T, ShopifyError> {
    if let Some(errors) = response.errors
        && !errors.is_empty()
    {
        return Err(ShopifyError::GraphQL(
            errors.into_iter().map(GraphQLError::from).collect(),
        ));
    }

    response
        .data
        .ok_or_else(|| ShopifyError::graphql_message("No data in response"))
}

#[derive(Debug, Deserialize)]
struct Nodes<T> {
    nodes: Vec<T>,
}

impl<T> Default for Nodes<T> {
    fn default() -> Self {
        Self { nodes: vec![] }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusData {
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderSummaryData {
    id: String,
    name: String,
    number: i64,
    processed_at: String,
    financial_status: Option<String>,
    #[serde(default)]
    fulfillments: Nodes<StatusData>,
    total_price: Money,
}

impl From<OrderSummaryData> for Order {
    fn from(data: OrderSummaryData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            number: data.number,
            processed_at: data.processed_at,
            financial_status: data.financial_status,
            fulfillment_status: data.fulfillments.nodes.into_iter().find_map(|f| f.status),
            total_price: data.total_price,
        }
    }
}

/// Join mutation user errors into one message.
fn user_errors(errors: &[CustomerUserError]) -> Option<ShopifyError> {
    if errors.is_empty() {
        return None;
    }
    let messages: Vec<_> = errors.iter().map(|e| e.message.as_str()).collect();
    Some(ShopifyError::UserError(messages.join(", ")))
}

// ─────────────────────────────────────────────────────────────────────────────
// Customer Account Client
// ─────────────────────────────────────────────────────────────────────────────

/// Client for the Shopify Customer Account API.
///
/// This client handles OAuth authentication and provides methods for
/// accessing customer data, orders, and addresses.
#[derive(Clone)]
pub struct CustomerClient {
    inner: Arc<CustomerClientInner>,
}

struct CustomerClientInner {
    client: reqwest::Client,
    /// `{origin}/{shop_id}`, the prefix of every OAuth and API endpoint.
    base_url: String,
    api_version: String,
    client_id: String,
    client_secret: Option<SecretString>,
}

impl CustomerClient {
    /// Create a new Customer Account API client.
    #[must_use]
    pub fn new(config: &ShopifyStorefrontConfig) -> Self {
        Self {
            inner: Arc::new(CustomerClientInner {
                client: reqwest::Client::new(),
                base_url: format!(
                    "{}/{}",
                    config.customer_account_origin(),
                    config.customer_shop_id
                ),
                api_version: config.api_version.clone(),
                client_id: config.customer_client_id.clone(),
                client_secret: config.customer_client_secret.clone(),
            }),
        }
    }

    /// Get the OAuth client ID (safe to expose in frontend).
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.inner.client_id
    }

    // ─────────────────────────────────────────────────────────────────────────
    // OAuth Flow
    // ─────────────────────────────────────────────────────────────────────────

    /// Generate the authorization URL for customer login.
    ///
    /// # Arguments
    ///
    /// * `redirect_uri` - The callback URL to redirect to after authentication
    /// * `state` - A random string stored in the session to prevent CSRF attacks
    /// * `nonce` - A random string for `OpenID` Connect replay protection
    /// * `code_challenge` - The S256 PKCE challenge
    #[must_use]
    pub fn authorization_url(
        &self,
        redirect_uri: &str,
        state: &str,
        nonce: &str,
        code_challenge: &str,
    ) -> String {
        format!(
            "{}/auth/oauth/authorize?\
            client_id={}&\
            response_type=code&\
            redirect_uri={}&\
            scope={}&\
            state={}&\
            nonce={}&\
            code_challenge={}&\
            code_challenge_method=S256",
            self.inner.base_url,
            urlencoding::encode(&self.inner.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(SCOPES),
            urlencoding::encode(state),
            urlencoding::encode(nonce),
            urlencoding::encode(code_challenge),
        )
    }

    /// Generate the logout URL.
    ///
    /// # Arguments
    ///
    /// * `id_token` - The ID token from the current session
    /// * `post_logout_redirect_uri` - Where to redirect after logout
    #[must_use]
    pub fn logout_url(&self, id_token: &str, post_logout_redirect_uri: &str) -> String {
        format!(
            "{}/auth/logout?\
            id_token_hint={}&\
            post_logout_redirect_uri={}",
            self.inner.base_url,
            urlencoding::encode(id_token),
            urlencoding::encode(post_logout_redirect_uri)
        )
    }

    /// Exchange an authorization code for access tokens.
    ///
    /// # Arguments
    ///
    /// * `code` - The authorization code from the OAuth callback
    /// * `redirect_uri` - The same redirect URI used in the authorization request
    /// * `code_verifier` - The PKCE verifier whose challenge was sent at login
    ///
    /// # Errors
    ///
    /// Returns an error if the token exchange fails.
    #[instrument(skip_all)]
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        code_verifier: &str,
    ) -> Result<CustomerAccessToken, ShopifyError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("code_verifier", code_verifier),
        ];

        let token_response = self.token_request(&params, "Token exchange failed").await?;
        Ok(token_response.into_token(None))
    }

    /// Refresh an access token.
    ///
    /// The id token from the original login is carried over so logout keeps
    /// working after a refresh.
    ///
    /// # Errors
    ///
    /// Returns an error if the token has no refresh token or the refresh fails.
    #[instrument(skip_all)]
    pub async fn refresh_token(
        &self,
        token: &CustomerAccessToken,
    ) -> Result<CustomerAccessToken, ShopifyError> {
        let refresh_token = token
            .refresh_token
            .as_deref()
            .ok_or_else(|| ShopifyError::OAuth("No refresh token".to_string()))?;

        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];

        let token_response = self.token_request(&params, "Token refresh failed").await?;
        Ok(token_response.into_token(token.id_token.clone()))
    }

    /// POST to the token endpoint with the client credentials added.
    async fn token_request(
        &self,
        params: &[(&str, &str)],
        failure: &str,
    ) -> Result<TokenResponse, ShopifyError> {
        let url = format!("{}/auth/oauth/token", self.inner.base_url);

        let mut form: Vec<(&str, &str)> = Vec::with_capacity(params.len() + 2);
        form.extend(params.iter().copied());
        form.push(("client_id", self.inner.client_id.as_str()));
        if let Some(secret) = &self.inner.client_secret {
            form.push(("client_secret", secret.expose_secret()));
        }

        let response = self.inner.client.post(&url).form(&form).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %text, "{failure}");
            return Err(ShopifyError::OAuth(format!("{failure} ({status})")));
        }

        Ok(response.json().await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // GraphQL Execution
    // ─────────────────────────────────────────────────────────────────────────

    /// Execute a GraphQL query against the Customer Account API.
    async fn query<T: DeserializeOwned>(
        &self,
        access_token: &str,
        query: &str,
        variables: Option<serde_json::Value>,
    ) -> Result<T, ShopifyError> {
        let url = format!(
            "{}/account/customer/api/{}/graphql",
            self.inner.base_url, self.inner.api_version
        );

        let request = GraphQLRequest { query, variables };

        let response = self
            .inner
            .client
            .post(&url)
            .header("Authorization", access_token)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ShopifyError::Unauthorized(
                "Customer access token rejected".to_string(),
            ));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ShopifyError::graphql_message(format!(
                "Customer API request failed ({status}): {}",
                text.chars().take(200).collect::<String>()
            )));
        }

        let gql_response: graphql_client::Response<T> = response.json().await?;
        into_result(gql_response)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Customer Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Get the current customer's profile and default address.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn get_customer(&self, access_token: &str) -> Result<Customer, ShopifyError> {
        #[derive(Deserialize)]
        struct Response {
            customer: Customer,
        }

        const QUERY: &str = concat!("query getCustomer { customer { ", customer_fields!(), " } }");

        let response: Response = self.query(access_token, QUERY, None).await?;
        Ok(response.customer)
    }

    /// Update the current customer's name.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or if there are validation errors.
    #[instrument(skip_all)]
    pub async fn update_customer(
        &self,
        access_token: &str,
        input: CustomerUpdateInput,
    ) -> Result<Customer, ShopifyError> {
        #[derive(Deserialize)]
        struct Response {
            #[serde(rename = "customerUpdate")]
            customer_update: CustomerUpdateResult,
        }

        #[derive(Deserialize)]
        struct CustomerUpdateResult {
            customer: Option<Customer>,
            #[serde(rename = "userErrors")]
            user_errors: Vec<CustomerUserError>,
        }

        const QUERY: &str = concat!(
            "mutation customerUpdate($input: CustomerUpdateInput!) { \
             customerUpdate(input: $input) { customer { ",
            customer_fields!(),
            " } ",
            user_error_fields!(),
            " } }"
        );

        let variables = serde_json::json!({ "input": input });
        let response: Response = self.query(access_token, QUERY, Some(variables)).await?;

        if let Some(err) = user_errors(&response.customer_update.user_errors) {
            return Err(err);
        }

        response
            .customer_update
            .customer
            .ok_or_else(|| ShopifyError::graphql_message("No customer returned"))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Order Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Get one page of the customer's order history, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, access_token))]
    pub async fn get_orders(
        &self,
        access_token: &str,
        first: i64,
        after: Option<String>,
    ) -> Result<(Vec<Order>, PageInfo), ShopifyError> {
        #[derive(Deserialize)]
        struct Response {
            customer: CustomerWithOrders,
        }

        #[derive(Deserialize)]
        struct CustomerWithOrders {
            orders: OrderConnection,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct OrderConnection {
            nodes: Vec<OrderSummaryData>,
            page_info: PageInfo,
        }

        const QUERY: &str = concat!(
            "query getOrders($first: Int!, $after: String) { customer { \
             orders(first: $first, after: $after, sortKey: PROCESSED_AT, reverse: true) { \
             nodes { ",
            order_summary_fields!(),
            " } pageInfo { hasNextPage hasPreviousPage startCursor endCursor } } } }"
        );

        let variables = serde_json::json!({ "first": first, "after": after });
        let response: Response = self.query(access_token, QUERY, Some(variables)).await?;

        let OrderConnection { nodes, page_info } = response.customer.orders;
        Ok((nodes.into_iter().map(Order::from).collect(), page_info))
    }

    /// Get full details for one order.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the order does not exist or belongs to another
    /// customer, or an error if the API request fails.
    #[instrument(skip(self, access_token), fields(order_id = %order_id))]
    pub async fn get_order(
        &self,
        access_token: &str,
        order_id: &ShopifyGid,
    ) -> Result<OrderDetail, ShopifyError> {
        #[derive(Deserialize)]
        struct Response {
            order: Option<OrderData>,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct OrderData {
            #[serde(flatten)]
            summary: OrderSummaryData,
            cancelled_at: Option<String>,
            status_page_url: Option<String>,
            subtotal: Option<Money>,
            total_shipping: Option<Money>,
            total_tax: Option<Money>,
            shipping_address: Option<Address>,
            discount_applications: Nodes<DiscountApplicationData>,
            line_items: Nodes<LineItemData>,
            all_fulfillments: Nodes<FulfillmentData>,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct LineItemData {
            title: String,
            variant_title: Option<String>,
            quantity: i64,
            sku: Option<String>,
            image: Option<Image>,
            price: Option<Money>,
            total_price: Option<Money>,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct DiscountApplicationData {
            code: Option<String>,
            title: Option<String>,
            value: PricingValueData,
        }

        #[derive(Deserialize)]
        #[serde(tag = "__typename")]
        enum PricingValueData {
            MoneyV2(Money),
            PricingPercentageValue { percentage: f64 },
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct FulfillmentData {
            status: Option<String>,
            #[serde(default)]
            tracking_information: Vec<TrackingData>,
        }

        #[derive(Deserialize)]
        struct TrackingData {
            company: Option<String>,
            number: Option<String>,
            url: Option<String>,
        }

        const QUERY: &str = concat!(
            "query getOrder($id: ID!) { order(id: $id) { ",
            order_summary_fields!(),
            " cancelledAt statusPageUrl \
             subtotal { amount currencyCode } \
             totalShipping { amount currencyCode } \
             totalTax { amount currencyCode } \
             shippingAddress { ",
            address_fields!(),
            " } \
             discountApplications(first: 10) { nodes { \
               ... on DiscountCodeApplication { code } \
               ... on AutomaticDiscountApplication { title } \
               ... on ManualDiscountApplication { title } \
               value { __typename \
                 ... on MoneyV2 { amount currencyCode } \
                 ... on PricingPercentageValue { percentage } } } } \
             lineItems(first: 50) { nodes { \
               title variantTitle quantity sku \
               image { url altText width height } \
               price { amount currencyCode } \
               totalPrice { amount currencyCode } } } \
             allFulfillments: fulfillments(first: 10) { nodes { \
               status trackingInformation { company number url } } } \
             } }"
        );

        let variables = serde_json::json!({ "id": order_id.to_string() });
        let response: Response = self.query(access_token, QUERY, Some(variables)).await?;

        let order = response
            .order
            .ok_or_else(|| ShopifyError::NotFound(format!("Order not found: {order_id}")))?;

        Ok(OrderDetail {
            order: order.summary.into(),
            cancelled_at: order.cancelled_at,
            status_page_url: order.status_page_url,
            line_items: order
                .line_items
                .nodes
                .into_iter()
                .map(|item| OrderLineItem {
                    title: item.title,
                    variant_title: item
                        .variant_title
                        .filter(|t| !t.is_empty() && t != "Default Title"),
                    quantity: item.quantity,
                    sku: item.sku.filter(|s| !s.is_empty()),
                    image: item.image,
                    price: item.price,
                    total_price: item.total_price,
                })
                .collect(),
            subtotal: order.subtotal,
            total_shipping: order.total_shipping,
            total_tax: order.total_tax,
            shipping_address: order.shipping_address,
            discounts: order
                .discount_applications
                .nodes
                .into_iter()
                .map(|d| OrderDiscount {
                    label: d
                        .code
                        .or(d.title)
                        .unwrap_or_else(|| "Discount".to_string()),
                    value: match d.value {
                        PricingValueData::MoneyV2(money) => money.display(),
                        PricingValueData::PricingPercentageValue { percentage } => {
                            format!("{percentage}%")
                        }
                    },
                })
                .collect(),
            fulfillments: order
                .all_fulfillments
                .nodes
                .into_iter()
                .map(|f| Fulfillment {
                    status: f.status,
                    tracking: f
                        .tracking_information
                        .into_iter()
                        .map(|t| Tracking {
                            company: t.company,
                            number: t.number,
                            url: t.url,
                        })
                        .collect(),
                })
                .collect(),
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Address Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Get the customer's addresses and the id of their default address.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, access_token))]
    pub async fn get_addresses(
        &self,
        access_token: &str,
        first: i64,
    ) -> Result<(Vec<Address>, Option<String>), ShopifyError> {
        #[derive(Deserialize)]
        struct Response {
            customer: CustomerWithAddresses,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct CustomerWithAddresses {
            addresses: Nodes<Address>,
            default_address: Option<DefaultAddressData>,
        }

        #[derive(Deserialize)]
        struct DefaultAddressData {
            id: String,
        }

        const QUERY: &str = concat!(
            "query getAddresses($first: Int!) { customer { \
             defaultAddress { id } \
             addresses(first: $first) { nodes { ",
            address_fields!(),
            " } } } }"
        );

        let variables = serde_json::json!({ "first": first });
        let response: Response = self.query(access_token, QUERY, Some(variables)).await?;

        Ok((
            response.customer.addresses.nodes,
            response.customer.default_address.map(|a| a.id),
        ))
    }

    /// Create a new address for the customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or if there are validation errors.
    #[instrument(skip(self, access_token, address))]
    pub async fn create_address(
        &self,
        access_token: &str,
        address: AddressInput,
        default_address: bool,
    ) -> Result<Address, ShopifyError> {
        #[derive(Deserialize)]
        struct Response {
            #[serde(rename = "customerAddressCreate")]
            address_create: AddressMutationResult,
        }

        const QUERY: &str = concat!(
            "mutation createAddress($address: CustomerAddressInput!, $defaultAddress: Boolean) { \
             customerAddressCreate(address: $address, defaultAddress: $defaultAddress) { \
             customerAddress { ",
            address_fields!(),
            " } ",
            user_error_fields!(),
            " } }"
        );

        let variables = serde_json::json!({
            "address": address,
            "defaultAddress": default_address,
        });
        let response: Response = self.query(access_token, QUERY, Some(variables)).await?;
        response.address_create.into_address()
    }

    /// Update an existing address.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or if there are validation errors.
    #[instrument(skip(self, access_token, address), fields(address_id = %address_id))]
    pub async fn update_address(
        &self,
        access_token: &str,
        address_id: &ShopifyGid,
        address: AddressInput,
        default_address: bool,
    ) -> Result<Address, ShopifyError> {
        #[derive(Deserialize)]
        struct Response {
            #[serde(rename = "customerAddressUpdate")]
            address_update: AddressMutationResult,
        }

        const QUERY: &str = concat!(
            "mutation updateAddress($addressId: ID!, $address: CustomerAddressInput, \
             $defaultAddress: Boolean) { \
             customerAddressUpdate(addressId: $addressId, address: $address, \
             defaultAddress: $defaultAddress) { customerAddress { ",
            address_fields!(),
            " } ",
            user_error_fields!(),
            " } }"
        );

        let variables = serde_json::json!({
            "addressId": address_id.to_string(),
            "address": address,
            "defaultAddress": default_address,
        });
        let response: Response = self.query(access_token, QUERY, Some(variables)).await?;
        response.address_update.into_address()
    }

    /// Delete an address.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or if there are validation errors.
    #[instrument(skip(self, access_token), fields(address_id = %address_id))]
    pub async fn delete_address(
        &self,
        access_token: &str,
        address_id: &ShopifyGid,
    ) -> Result<(), ShopifyError> {
        #[derive(Deserialize)]
        struct Response {
            #[serde(rename = "customerAddressDelete")]
            address_delete: AddressDeleteResult,
        }

        #[derive(Deserialize)]
        struct AddressDeleteResult {
            #[serde(rename = "userErrors")]
            user_errors: Vec<CustomerUserError>,
        }

        const QUERY: &str = concat!(
            "mutation deleteAddress($addressId: ID!) { \
             customerAddressDelete(addressId: $addressId) { deletedAddressId ",
            user_error_fields!(),
            " } }"
        );

        let variables = serde_json::json!({ "addressId": address_id.to_string() });
        let response: Response = self.query(access_token, QUERY, Some(variables)).await?;

        user_errors(&response.address_delete.user_errors).map_or(Ok(()), Err)
    }
}

#[derive(Deserialize)]
struct AddressMutationResult {
    #[serde(rename = "customerAddress")]
    address: Option<Address>,
    #[serde(rename = "userErrors")]
    user_errors: Vec<CustomerUserError>,
}

impl AddressMutationResult {
    fn into_address(self) -> Result<Address, ShopifyError> {
        if let Some(err) = user_errors(&self.user_errors) {
            return Err(err);
        }
        self.address
            .ok_or_else(|| ShopifyError::graphql_message("No address returned"))
    }
}
