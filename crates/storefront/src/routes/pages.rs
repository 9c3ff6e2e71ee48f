//! Content page route handlers.
//!
//! Pages are authored in the Shopify admin and rendered as-is.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use canopy_core::Handle;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::PageContext;
use crate::shopify::types::Page;
use crate::state::AppState;

/// Content page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/show.html")]
pub struct PageTemplate {
    pub ctx: PageContext,
    pub page: Page,
    pub seo_title: String,
    pub seo_description: Option<String>,
}

/// Display a content page by handle.
#[instrument(skip(state, ctx), fields(handle = %handle))]
pub async fn show(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(handle): Path<String>,
) -> Result<impl IntoResponse> {
    let handle = Handle::parse(&handle).map_err(|_| AppError::NotFound(format!("page {handle}")))?;

    let page = state.storefront().get_page_by_handle(handle.as_str()).await?;

    let seo = page.seo.clone().unwrap_or_default();
    Ok(PageTemplate {
        ctx,
        seo_title: seo
            .title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| page.title.clone()),
        seo_description: seo
            .description
            .filter(|d| !d.is_empty())
            .or_else(|| Some(page.body_summary.clone()).filter(|s| !s.is_empty())),
        page,
    })
}
