//! Shop policy route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::PageContext;
use crate::shopify::types::{Policy, PolicyKind};
use crate::state::AppState;

/// Policy index template.
#[derive(Template, WebTemplate)]
#[template(path = "policies/index.html")]
pub struct PoliciesIndexTemplate {
    pub ctx: PageContext,
    pub policies: Vec<Policy>,
}

/// Policy page template.
#[derive(Template, WebTemplate)]
#[template(path = "policies/show.html")]
pub struct PolicyTemplate {
    pub ctx: PageContext,
    pub policy: Policy,
}

/// List the policies the shop has configured.
#[instrument(skip(state, ctx))]
pub async fn index(State(state): State<AppState>, ctx: PageContext) -> Result<impl IntoResponse> {
    let policies = state.storefront().get_policies().await?;

    Ok(PoliciesIndexTemplate {
        ctx,
        policies: policies.policies,
    })
}

/// Display a single policy.
///
/// Unknown handles and policies the shop hasn't configured are 404s.
#[instrument(skip(state, ctx), fields(handle = %handle))]
pub async fn show(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(handle): Path<String>,
) -> Result<impl IntoResponse> {
    let kind = PolicyKind::from_handle(&handle)
        .ok_or_else(|| AppError::NotFound(format!("policy {handle}")))?;

    let policy = state
        .storefront()
        .get_policies()
        .await?
        .get(kind)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("policy {handle}")))?;

    Ok(PolicyTemplate { ctx, policy })
}
