//! Per-page context shared by every rendered template.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use super::CspNonce;
use crate::models::session_keys;
use crate::shopify::{CustomerAccessToken, Layout, Menu};
use crate::state::{AppState, FOOTER_MENU, HEADER_MENU};

/// Layout data, CSP nonce and sign-in state for the base template.
///
/// The layout is loaded through the Storefront client's cache. When the API
/// is unavailable the page still renders with an empty header and footer.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    /// Shop info and menus.
    pub layout: Layout,
    /// Nonce for inline `<script>` tags.
    pub nonce: String,
    /// Whether a customer token is in the session.
    pub signed_in: bool,
}

impl PageContext {
    /// Context used when no request state is available (error pages).
    #[must_use]
    pub fn fallback() -> Self {
        Self::default()
    }

    /// Shop name for titles, with a generic fallback.
    #[must_use]
    pub fn shop_name(&self) -> &str {
        let name = self.layout.shop.name.as_str();
        if name.is_empty() { "Store" } else { name }
    }

    /// Header navigation, if the menu exists.
    #[must_use]
    pub const fn header_menu(&self) -> Option<&Menu> {
        self.layout.header_menu.as_ref()
    }

    /// Footer navigation, if the menu exists.
    #[must_use]
    pub const fn footer_menu(&self) -> Option<&Menu> {
        self.layout.footer_menu.as_ref()
    }
}

impl FromRequestParts<AppState> for PageContext {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let nonce = parts
            .extensions
            .get::<CspNonce>()
            .map(|n| n.value().to_string())
            .unwrap_or_default();

        let signed_in = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CustomerAccessToken>(session_keys::CUSTOMER_TOKEN)
                .await
                .ok()
                .flatten()
                .is_some(),
            None => false,
        };

        let layout = match state.storefront().get_layout(HEADER_MENU, FOOTER_MENU).await {
            Ok(layout) => layout,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load layout, rendering without menus");
                Layout::default()
            }
        };

        Ok(Self {
            layout,
            nonce,
            signed_in,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_shop_name() {
        let ctx = PageContext::fallback();
        assert_eq!(ctx.shop_name(), "Store");
        assert!(ctx.header_menu().is_none());
        assert!(!ctx.signed_in);
    }
}
