//! Product comparison route handlers.
//!
//! The compare list lives in the session. `/compare?handles=a,b` renders an
//! ad-hoc comparison without touching it, which makes comparisons shareable.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::products::ProductView;
use crate::error::Result;
use crate::filters;
use crate::middleware::PageContext;
use crate::models::{CompareList, session_keys};
use crate::shopify::types::Product;
use crate::state::AppState;

/// Placeholder for a cell with no value.
pub const EMPTY_CELL: &str = "—";

/// Minimum number of products for a comparison.
const MIN_COMPARE: usize = 2;

/// One row of the comparison table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRow {
    pub label: String,
    /// One cell per product, in column order.
    pub cells: Vec<String>,
    /// Every cell holds the same value.
    pub same: bool,
}

impl ComparisonRow {
    fn new(label: impl Into<String>, cells: Vec<String>) -> Self {
        let same = cells.windows(2).all(|pair| pair.first() == pair.last());
        Self {
            label: label.into(),
            cells,
            same,
        }
    }
}

/// Build the comparison rows for products in column order.
///
/// Fixed rows come first, then one row per option name in the order the
/// names are first seen across the products.
#[must_use]
pub fn comparison_rows(products: &[Product]) -> Vec<ComparisonRow> {
    let mut rows = vec![
        ComparisonRow::new(
            "Price",
            products
                .iter()
                .map(|p| ProductView::from(p).price)
                .collect(),
        ),
        ComparisonRow::new(
            "Compare at",
            products
                .iter()
                .map(|p| {
                    ProductView::from(p)
                        .compare_at_price
                        .unwrap_or_else(|| EMPTY_CELL.to_string())
                })
                .collect(),
        ),
        ComparisonRow::new(
            "Availability",
            products
                .iter()
                .map(|p| {
                    if p.available_for_sale {
                        "In stock".to_string()
                    } else {
                        "Sold out".to_string()
                    }
                })
                .collect(),
        ),
        ComparisonRow::new(
            "Vendor",
            products.iter().map(|p| or_empty(&p.vendor)).collect(),
        ),
        ComparisonRow::new(
            "Product type",
            products.iter().map(|p| or_empty(&p.kind)).collect(),
        ),
    ];

    let mut option_names: Vec<&str> = Vec::new();
    for option in products
        .iter()
        .filter(|p| !p.has_only_default_variant())
        .flat_map(|p| &p.options)
    {
        if !option_names.contains(&option.name.as_str()) {
            option_names.push(&option.name);
        }
    }

    rows.extend(option_names.into_iter().map(|name| {
        ComparisonRow::new(
            name,
            products
                .iter()
                .map(|p| {
                    p.options
                        .iter()
                        .find(|o| o.name == name)
                        .map_or_else(|| EMPTY_CELL.to_string(), |o| o.values.join(", "))
                })
                .collect(),
        )
    }));

    rows
}

fn or_empty(value: &str) -> String {
    if value.trim().is_empty() {
        EMPTY_CELL.to_string()
    } else {
        value.to_string()
    }
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Load the compare list from the session (empty if absent or unreadable).
pub async fn load_compare_list(session: &Session) -> CompareList {
    session
        .get::<CompareList>(session_keys::COMPARE_HANDLES)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

async fn save_compare_list(
    session: &Session,
    list: &CompareList,
) -> std::result::Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::COMPARE_HANDLES, list).await
}

// =============================================================================
// Handlers
// =============================================================================

/// Comparison query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct CompareQuery {
    pub handles: Option<String>,
}

/// Compare list form data.
#[derive(Debug, Deserialize)]
pub struct CompareForm {
    pub handle: String,
}

/// Comparison page template.
#[derive(Template, WebTemplate)]
#[template(path = "compare/show.html")]
pub struct CompareTemplate {
    pub ctx: PageContext,
    pub products: Vec<ProductView>,
    pub rows: Vec<ComparisonRow>,
    /// Whether the session list is shown (it can be edited).
    pub from_session: bool,
    pub share_param: String,
}

impl CompareTemplate {
    /// Whether there are enough products to compare.
    #[must_use]
    pub fn ready(&self) -> bool {
        self.products.len() >= MIN_COMPARE
    }
}

/// Display the comparison table.
#[instrument(skip(state, ctx, session))]
pub async fn show(
    State(state): State<AppState>,
    ctx: PageContext,
    session: Session,
    Query(query): Query<CompareQuery>,
) -> Result<impl IntoResponse> {
    let (list, from_session) = match query.handles.as_deref() {
        Some(param) => (CompareList::from_param(param), false),
        None => (load_compare_list(&session).await, true),
    };

    let products = state
        .storefront()
        .get_products_by_handles(&list.handles())
        .await?;

    Ok(CompareTemplate {
        ctx,
        rows: comparison_rows(&products),
        products: products.iter().map(ProductView::from).collect(),
        from_session,
        share_param: urlencoding::encode(&list.to_param()).into_owned(),
    })
}

/// Add a product to the session compare list.
#[instrument(skip(session))]
pub async fn add(session: Session, Form(form): Form<CompareForm>) -> Result<Redirect> {
    let mut list = load_compare_list(&session).await;
    if list.add(&form.handle) {
        save_compare_list(&session, &list).await?;
    } else {
        tracing::debug!(handle = %form.handle, "Compare list unchanged");
    }
    Ok(Redirect::to("/compare"))
}

/// Remove a product from the session compare list.
#[instrument(skip(session))]
pub async fn remove(session: Session, Form(form): Form<CompareForm>) -> Result<Redirect> {
    let mut list = load_compare_list(&session).await;
    list.remove(&form.handle);
    save_compare_list(&session, &list).await?;
    Ok(Redirect::to("/compare"))
}

/// Empty the session compare list.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Redirect> {
    session
        .remove::<CompareList>(session_keys::COMPARE_HANDLES)
        .await?;
    Ok(Redirect::to("/compare"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shopify::types::{Money, PriceRange, ProductOption};

    fn money(amount: &str) -> Money {
        Money {
            amount: amount.to_string(),
            currency_code: "USD".to_string(),
        }
    }

    fn product(handle: &str, price: &str, options: &[(&str, &[&str])]) -> Product {
        Product {
            id: format!("gid://shopify/Product/{handle}"),
            handle: handle.to_string(),
            title: handle.to_string(),
            description: String::new(),
            description_html: String::new(),
            available_for_sale: true,
            kind: "Shirts".to_string(),
            vendor: "Canopy".to_string(),
            tags: vec![],
            seo: None,
            price_range: PriceRange {
                min_variant_price: money(price),
                max_variant_price: money(price),
            },
            compare_at_price_range: None,
            featured_image: None,
            images: vec![],
            options: options
                .iter()
                .map(|(name, values)| ProductOption {
                    id: (*name).to_string(),
                    name: (*name).to_string(),
                    values: values.iter().map(|v| (*v).to_string()).collect(),
                })
                .collect(),
            variants: vec![],
        }
    }

    fn row<'a>(rows: &'a [ComparisonRow], label: &str) -> Option<&'a ComparisonRow> {
        rows.iter().find(|r| r.label == label)
    }

    #[test]
    fn test_fixed_rows_and_sameness() {
        let rows = comparison_rows(&[
            product("a", "10.00", &[]),
            product("b", "12.00", &[]),
        ]);

        let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Price", "Compare at", "Availability", "Vendor", "Product type"]
        );

        let price = row(&rows, "Price");
        assert_eq!(
            price.map(|r| r.cells.clone()),
            Some(vec!["$10.00".to_string(), "$12.00".to_string()])
        );
        assert!(price.is_some_and(|r| !r.same));
        assert!(row(&rows, "Vendor").is_some_and(|r| r.same));
        assert_eq!(
            row(&rows, "Compare at").map(|r| r.cells.clone()),
            Some(vec![EMPTY_CELL.to_string(), EMPTY_CELL.to_string()])
        );
    }

    #[test]
    fn test_option_rows_union_in_first_seen_order() {
        let rows = comparison_rows(&[
            product("a", "10.00", &[("Size", &["S", "M"]), ("Color", &["Red"])]),
            product("b", "10.00", &[("Material", &["Linen"]), ("Size", &["M"])]),
        ]);

        let option_labels: Vec<&str> = rows.iter().skip(5).map(|r| r.label.as_str()).collect();
        assert_eq!(option_labels, vec!["Size", "Color", "Material"]);

        assert_eq!(
            row(&rows, "Size").map(|r| r.cells.clone()),
            Some(vec!["S, M".to_string(), "M".to_string()])
        );
        assert_eq!(
            row(&rows, "Color").map(|r| r.cells.clone()),
            Some(vec!["Red".to_string(), EMPTY_CELL.to_string()])
        );
    }

    #[test]
    fn test_default_title_option_is_skipped() {
        let rows = comparison_rows(&[
            product("a", "10.00", &[("Title", &["Default Title"])]),
            product("b", "10.00", &[("Title", &["Default Title"])]),
        ]);
        assert!(row(&rows, "Title").is_none());
    }

    #[test]
    fn test_single_product_row_is_same() {
        let rows = comparison_rows(&[product("a", "10.00", &[])]);
        assert!(rows.iter().all(|r| r.same));
    }
}
