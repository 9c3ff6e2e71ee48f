//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use super::collections::CollectionView;
use super::products::ProductView;
use crate::filters;
use crate::middleware::PageContext;
use crate::shopify::ProductSort;
use crate::state::AppState;

/// Number of featured collections on the home page.
const FEATURED_COLLECTIONS: i64 = 3;

/// Number of latest products on the home page.
const LATEST_PRODUCTS: i64 = 8;

/// Home page query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct HomeQuery {
    /// Set by the login callback when sign-in failed.
    pub login_error: Option<String>,
}

/// Message for a failed sign-in.
fn login_error_message(code: &str) -> &'static str {
    match code {
        "access_denied" => "Sign-in was cancelled.",
        "invalid_state" | "invalid_nonce" => "Your sign-in session expired. Please try again.",
        _ => "We couldn't sign you in. Please try again.",
    }
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub ctx: PageContext,
    pub collections: Vec<CollectionView>,
    pub products: Vec<ProductView>,
    pub login_error: Option<&'static str>,
}

/// Display the home page.
///
/// Both sections degrade to empty when the API call behind them fails.
#[instrument(skip(state, ctx))]
pub async fn home(
    State(state): State<AppState>,
    ctx: PageContext,
    Query(query): Query<HomeQuery>,
) -> impl IntoResponse {
    let storefront = state.storefront();
    let (collections, products) = tokio::join!(
        storefront.get_collections(FEATURED_COLLECTIONS, None),
        storefront.get_products(LATEST_PRODUCTS, None, ProductSort::Newest),
    );

    let collections = match collections {
        Ok(connection) => connection
            .collections
            .iter()
            .map(CollectionView::from)
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load featured collections");
            Vec::new()
        }
    };

    let products = match products {
        Ok(connection) => connection.products.iter().map(ProductView::from).collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load latest products");
            Vec::new()
        }
    };

    HomeTemplate {
        ctx,
        collections,
        products,
        login_error: query.login_error.as_deref().map(login_error_message),
    }
}
