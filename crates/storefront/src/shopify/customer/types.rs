//! Types for Shopify Customer Account API OAuth and responses.

use canopy_core::ShopifyGid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shopify::types::{Image, Money};

// ─────────────────────────────────────────────────────────────────────────────
// OAuth Types
// ─────────────────────────────────────────────────────────────────────────────

/// Seconds before the real expiry at which a token counts as expired.
const EXPIRY_BUFFER_SECS: i64 = 60;

/// Customer access token obtained via OAuth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerAccessToken {
    /// The access token for API requests.
    pub access_token: String,
    /// The ID token (`OpenID` Connect).
    pub id_token: Option<String>,
    /// The refresh token for obtaining new access tokens.
    pub refresh_token: Option<String>,
    /// Token lifetime in seconds.
    pub expires_in: Option<i64>,
    /// Unix timestamp when the token was obtained.
    pub obtained_at: i64,
}

impl CustomerAccessToken {
    /// Check if the access token is expired (with 60s buffer).
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }

    fn is_expired_at(&self, now: i64) -> bool {
        self.expires_in.is_some_and(|expires_in| {
            let expires_at = self.obtained_at + expires_in;
            now >= expires_at - EXPIRY_BUFFER_SECS
        })
    }

    /// Whether the token can be refreshed without a new login.
    #[must_use]
    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Raw token response from the Shopify OAuth endpoint.
#[derive(Debug, Deserialize)]
pub(super) struct TokenResponse {
    pub access_token: String,
    pub id_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
}

impl TokenResponse {
    /// Stamp the response with the time it was received.
    pub(super) fn into_token(self, previous_id_token: Option<String>) -> CustomerAccessToken {
        CustomerAccessToken {
            access_token: self.access_token,
            // Refresh responses omit the id token; keep the one from login
            id_token: self.id_token.or(previous_id_token),
            refresh_token: self.refresh_token,
            expires_in: self.expires_in,
            obtained_at: Utc::now().timestamp(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Customer Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailAddress {
    pub email_address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneNumber {
    pub phone_number: Option<String>,
}

/// A Shopify customer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    /// The customer's unique ID.
    pub id: String,
    /// The customer's first name.
    pub first_name: Option<String>,
    /// The customer's last name.
    pub last_name: Option<String>,
    /// Name to greet the customer with (falls back to email on Shopify's side).
    pub display_name: String,
    /// The customer's email address.
    pub email_address: Option<EmailAddress>,
    /// The customer's phone number.
    pub phone_number: Option<PhoneNumber>,
    /// The customer's default address.
    pub default_address: Option<Address>,
}

impl Customer {
    /// Get the customer's full name.
    #[must_use]
    pub fn full_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => String::new(),
        }
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email_address
            .as_ref()
            .and_then(|e| e.email_address.as_deref())
    }
}

/// A customer address.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// The address ID (may carry a `?model_name=...` suffix).
    #[serde(default)]
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    /// Province/state name.
    pub province: Option<String>,
    /// Province/state code (e.g., "ON").
    pub zone_code: Option<String>,
    pub country: Option<String>,
    /// Two-letter country code.
    pub territory_code: Option<String>,
    /// Postal/ZIP code.
    pub zip: Option<String>,
    pub phone_number: Option<String>,
    /// Lines pre-formatted by Shopify for the address's country.
    #[serde(default)]
    pub formatted: Vec<String>,
}

impl Address {
    /// Numeric part of the address ID, used in form URLs.
    #[must_use]
    pub fn numeric_id(&self) -> Option<String> {
        ShopifyGid::parse(&self.id).ok().map(|gid| gid.id().to_string())
    }

    /// Format the address as a single line.
    #[must_use]
    pub fn formatted_single_line(&self) -> String {
        if !self.formatted.is_empty() {
            return self.formatted.join(", ");
        }

        [
            &self.address1,
            &self.city,
            &self.zone_code,
            &self.zip,
            &self.country,
        ]
        .into_iter()
        .filter_map(|part| part.as_deref().filter(|p| !p.is_empty()))
        .collect::<Vec<_>>()
        .join(", ")
    }

    /// The recipient's name as one string.
    #[must_use]
    pub fn name(&self) -> String {
        [&self.first_name, &self.last_name]
            .into_iter()
            .filter_map(|part| part.as_deref().filter(|p| !p.is_empty()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Order Types
// ─────────────────────────────────────────────────────────────────────────────

/// A customer order, as shown in the order history list.
#[derive(Debug, Clone)]
pub struct Order {
    /// The order GID.
    pub id: String,
    /// The order name (e.g., "#1001").
    pub name: String,
    /// The order number.
    pub number: i64,
    /// When the order was processed (RFC 3339).
    pub processed_at: String,
    /// The financial status (e.g., "PAID").
    pub financial_status: Option<String>,
    /// Status of the most recent fulfillment, if any.
    pub fulfillment_status: Option<String>,
    /// The total price.
    pub total_price: Money,
}

impl Order {
    /// Parse the `processed_at` timestamp.
    #[must_use]
    pub fn processed_at_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.processed_at)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Human-readable processing date, e.g. "March 4, 2025".
    #[must_use]
    pub fn processed_on(&self) -> String {
        self.processed_at_datetime().map_or_else(
            || self.processed_at.clone(),
            |dt| dt.format("%B %-d, %Y").to_string(),
        )
    }

    /// Storefront URL of the order detail page.
    #[must_use]
    pub fn path(&self) -> String {
        ShopifyGid::parse(&self.id).map_or_else(
            |_| "/account/orders".to_string(),
            |gid| format!("/account/orders/{}", gid.id()),
        )
    }
}

/// A purchased line on an order.
#[derive(Debug, Clone)]
pub struct OrderLineItem {
    pub title: String,
    pub variant_title: Option<String>,
    pub quantity: i64,
    pub sku: Option<String>,
    pub image: Option<Image>,
    pub price: Option<Money>,
    pub total_price: Option<Money>,
}

/// A discount applied to an order.
#[derive(Debug, Clone)]
pub struct OrderDiscount {
    /// Discount code or automatic discount title.
    pub label: String,
    /// Formatted value ("10%" or "$5.00").
    pub value: String,
}

/// Shipment tracking details.
#[derive(Debug, Clone)]
pub struct Tracking {
    pub company: Option<String>,
    pub number: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Fulfillment {
    /// Fulfillment status (e.g., "SUCCESS").
    pub status: Option<String>,
    pub tracking: Vec<Tracking>,
}

/// Full order details for the order page.
#[derive(Debug, Clone)]
pub struct OrderDetail {
    pub order: Order,
    pub cancelled_at: Option<String>,
    /// Shopify-hosted order status page.
    pub status_page_url: Option<String>,
    pub line_items: Vec<OrderLineItem>,
    pub subtotal: Option<Money>,
    pub total_shipping: Option<Money>,
    pub total_tax: Option<Money>,
    pub shipping_address: Option<Address>,
    pub discounts: Vec<OrderDiscount>,
    pub fulfillments: Vec<Fulfillment>,
}

impl OrderDetail {
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        self.cancelled_at.is_some()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Input Types
// ─────────────────────────────────────────────────────────────────────────────

/// Input for creating or updating an address.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// Province/state code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_code: Option<String>,
    /// Two-letter country code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub territory_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// Input for updating customer information.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerUpdateInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Internal Response Types
// ─────────────────────────────────────────────────────────────────────────────

/// User error from a mutation.
#[derive(Debug, Deserialize)]
pub(super) struct CustomerUserError {
    pub message: String,
}
