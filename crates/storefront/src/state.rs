//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::shopify::{CustomerClient, StorefrontClient};

/// Menu handle rendered in the site header.
pub const HEADER_MENU: &str = "main-menu";

/// Menu handle rendered in the site footer.
pub const FOOTER_MENU: &str = "footer";

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// configuration and the Shopify API clients, built once at startup.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    storefront: StorefrontClient,
    customer: CustomerClient,
}

impl AppState {
    /// Create a new application state, building both API clients.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let storefront = StorefrontClient::new(&config);
        let customer = CustomerClient::new(&config.shopify);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                storefront,
                customer,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the Shopify Storefront API client.
    #[must_use]
    pub fn storefront(&self) -> &StorefrontClient {
        &self.inner.storefront
    }

    /// Get a reference to the Shopify Customer Account API client.
    #[must_use]
    pub fn customer(&self) -> &CustomerClient {
        &self.inner.customer
    }

    /// OAuth redirect URI registered with the Customer Account API.
    #[must_use]
    pub fn oauth_redirect_uri(&self) -> String {
        format!("{}/account/authorize", self.inner.config.base_url)
    }
}
