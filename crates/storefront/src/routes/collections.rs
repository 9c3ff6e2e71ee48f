//! Collection route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use canopy_core::Handle;
use tracing::instrument;

use super::products::{ImageView, ProductView};
use super::{CursorQuery, PAGE_SIZE};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::PageContext;
use crate::shopify::types::Collection as ShopifyCollection;
use crate::state::AppState;

/// Collections per listing page.
const COLLECTIONS_PER_PAGE: i64 = 24;

/// Collection display data for templates.
#[derive(Clone)]
pub struct CollectionView {
    pub handle: String,
    pub title: String,
    pub description: Option<String>,
    pub image: Option<ImageView>,
}

impl CollectionView {
    /// Storefront URL path for this collection.
    #[must_use]
    pub fn path(&self) -> String {
        format!("/collections/{}", self.handle)
    }
}

impl From<&ShopifyCollection> for CollectionView {
    fn from(collection: &ShopifyCollection) -> Self {
        Self {
            handle: collection.handle.clone(),
            title: collection.title.clone(),
            description: if collection.description.is_empty() {
                None
            } else {
                Some(collection.description.clone())
            },
            image: collection
                .image
                .as_ref()
                .map(|img| ImageView::new(img, &collection.title)),
        }
    }
}

/// Collection listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "collections/index.html")]
pub struct CollectionsIndexTemplate {
    pub ctx: PageContext,
    pub collections: Vec<CollectionView>,
    pub next_cursor: Option<String>,
}

/// Collection detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "collections/show.html")]
pub struct CollectionShowTemplate {
    pub ctx: PageContext,
    pub collection: CollectionView,
    pub description_html: String,
    pub seo_description: Option<String>,
    pub products: Vec<ProductView>,
    pub next_cursor: Option<String>,
}

/// Display collection listing page.
#[instrument(skip(state, ctx))]
pub async fn index(
    State(state): State<AppState>,
    ctx: PageContext,
    Query(query): Query<CursorQuery>,
) -> Result<impl IntoResponse> {
    let connection = state
        .storefront()
        .get_collections(COLLECTIONS_PER_PAGE, query.cursor())
        .await?;

    Ok(CollectionsIndexTemplate {
        ctx,
        collections: connection
            .collections
            .iter()
            .map(CollectionView::from)
            .collect(),
        next_cursor: super::next_page(&connection.page_info),
    })
}

/// Display collection detail page with one page of its products.
#[instrument(skip(state, ctx, query), fields(handle = %handle))]
pub async fn show(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(handle): Path<String>,
    Query(query): Query<CursorQuery>,
) -> Result<impl IntoResponse> {
    let handle =
        Handle::parse(&handle).map_err(|_| AppError::NotFound(format!("collection {handle}")))?;

    let collection = state
        .storefront()
        .get_collection_by_handle(handle.as_str(), PAGE_SIZE, query.cursor())
        .await?;

    Ok(CollectionShowTemplate {
        ctx,
        collection: CollectionView::from(&collection),
        description_html: collection.description_html.clone(),
        seo_description: collection.seo.as_ref().and_then(|seo| seo.description.clone()),
        products: collection.products.iter().map(ProductView::from).collect(),
        next_cursor: super::next_page(&collection.products_page_info),
    })
}
