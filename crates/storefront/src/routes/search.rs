//! Search route handlers.
//!
//! Full search and search-as-you-type both go to the Storefront API; there
//! is no local index.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use super::PAGE_SIZE;
use super::products::ProductView;
use crate::error::Result;
use crate::filters;
use crate::middleware::PageContext;
use crate::shopify::types::{PredictiveSearchResults, SearchArticle, SearchPage};
use crate::state::AppState;

/// Default number of predictive suggestions per type.
pub const DEFAULT_SUGGEST_LIMIT: i64 = 6;

/// Upper bound for `?limit=` on suggestions.
pub const MAX_SUGGEST_LIMIT: i64 = 10;

/// Search query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub after: Option<String>,
}

/// Predictive search query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct SuggestQuery {
    pub q: Option<String>,
    /// Kept as text so a malformed limit falls back to the default.
    pub limit: Option<String>,
}

/// Trimmed search term, `None` when blank.
fn search_term(q: Option<&str>) -> Option<&str> {
    q.map(str::trim).filter(|t| !t.is_empty())
}

/// Clamp the suggestion limit to `1..=MAX_SUGGEST_LIMIT`.
///
/// A missing or unparsable limit uses [`DEFAULT_SUGGEST_LIMIT`].
#[must_use]
pub fn suggest_limit(limit: Option<&str>) -> i64 {
    limit
        .and_then(|l| l.trim().parse::<i64>().ok())
        .map_or(DEFAULT_SUGGEST_LIMIT, |l| l.clamp(1, MAX_SUGGEST_LIMIT))
}

/// Search results display data.
pub struct SearchResultsView {
    pub total_count: i64,
    pub products: Vec<ProductView>,
    pub pages: Vec<SearchPage>,
    pub articles: Vec<SearchArticle>,
    pub next_cursor: Option<String>,
}

impl SearchResultsView {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty() && self.pages.is_empty() && self.articles.is_empty()
    }
}

/// Search page template.
#[derive(Template, WebTemplate)]
#[template(path = "search/index.html")]
pub struct SearchTemplate {
    pub ctx: PageContext,
    pub query: String,
    pub encoded_query: String,
    pub results: Option<SearchResultsView>,
}

/// Predictive search fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/search_suggestions.html")]
pub struct SuggestionsTemplate {
    pub query: String,
    pub encoded_query: String,
    pub results: PredictiveSearchResults,
}

/// Display search results.
///
/// A blank term renders the empty state without calling the API.
#[instrument(skip(state, ctx))]
pub async fn index(
    State(state): State<AppState>,
    ctx: PageContext,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse> {
    let Some(term) = search_term(query.q.as_deref()) else {
        return Ok(SearchTemplate {
            ctx,
            query: String::new(),
            encoded_query: String::new(),
            results: None,
        });
    };

    let after = query.after.clone().filter(|c| !c.is_empty());
    let results = state.storefront().search(term, PAGE_SIZE, after).await?;

    Ok(SearchTemplate {
        ctx,
        query: term.to_string(),
        encoded_query: urlencoding::encode(term).into_owned(),
        results: Some(SearchResultsView {
            total_count: results.total_count,
            products: results.products.iter().map(ProductView::from).collect(),
            next_cursor: super::next_page(&results.page_info),
            pages: results.pages,
            articles: results.articles,
        }),
    })
}

/// Search-as-you-type suggestions (HTMX fragment).
///
/// Failures render an empty fragment so the search box keeps working.
#[instrument(skip(state))]
pub async fn suggest(
    State(state): State<AppState>,
    Query(query): Query<SuggestQuery>,
) -> impl IntoResponse {
    let Some(term) = search_term(query.q.as_deref()) else {
        return SuggestionsTemplate {
            query: String::new(),
            encoded_query: String::new(),
            results: PredictiveSearchResults::default(),
        };
    };

    let results = match state
        .storefront()
        .predictive_search(term, suggest_limit(query.limit.as_deref()))
        .await
    {
        Ok(results) => results,
        Err(e) => {
            tracing::warn!(error = %e, "Predictive search failed");
            PredictiveSearchResults::default()
        }
    };

    SuggestionsTemplate {
        query: term.to_string(),
        encoded_query: urlencoding::encode(term).into_owned(),
        results,
    }
}
