//! Product route handlers.

use std::collections::HashMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use canopy_core::Handle;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::PAGE_SIZE;
use super::compare::load_compare_list;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::PageContext;
use crate::models::session::MAX_COMPARE;
use crate::shopify::types::{Image, Money, Product, ProductSort, ProductVariant};
use crate::state::AppState;

/// Related products shown under the product detail.
const RELATED_LIMIT: usize = 4;

/// Product card display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub handle: String,
    pub title: String,
    pub vendor: String,
    pub price: String,
    pub compare_at_price: Option<String>,
    pub image: Option<ImageView>,
    pub available: bool,
}

impl ProductView {
    /// Storefront URL path for this product.
    #[must_use]
    pub fn path(&self) -> String {
        format!("/products/{}", self.handle)
    }
}

/// Image display data for templates.
#[derive(Clone)]
pub struct ImageView {
    pub url: String,
    pub alt: String,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

impl ImageView {
    /// Build from an API image, using `fallback_alt` when it has no alt text.
    #[must_use]
    pub fn new(image: &Image, fallback_alt: &str) -> Self {
        Self {
            url: image.url.clone(),
            alt: image.alt_or(fallback_alt).to_string(),
            width: image.width,
            height: image.height,
        }
    }
}

/// One choosable value of a product option.
#[derive(Clone)]
pub struct OptionValueView {
    pub value: String,
    pub selected: bool,
    /// Product URL selecting this value while keeping the other selections.
    pub url: String,
}

/// A product option with its values.
#[derive(Clone)]
pub struct OptionView {
    pub name: String,
    pub values: Vec<OptionValueView>,
}

/// Sort picker entry.
#[derive(Clone)]
pub struct SortOption {
    pub param: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

// =============================================================================
// Type Conversions
// =============================================================================

/// Sale price to show next to `price`, if the compare-at price is higher.
fn compare_at(price: &Money, compare_at: Option<&Money>) -> Option<String> {
    let price = price.price()?;
    let compare_at = compare_at?;
    compare_at
        .price()
        .filter(|c| c.amount > price.amount)
        .map(|c| c.display())
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        let min = &product.price_range.min_variant_price;
        let price = if product.price_range.is_single_price() {
            min.display()
        } else {
            format!("From {}", min.display())
        };

        Self {
            handle: product.handle.clone(),
            title: product.title.clone(),
            vendor: product.vendor.clone(),
            price,
            compare_at_price: compare_at(
                min,
                product
                    .compare_at_price_range
                    .as_ref()
                    .map(|range| &range.min_variant_price),
            ),
            image: product
                .featured_image
                .as_ref()
                .map(|img| ImageView::new(img, &product.title)),
            available: product.available_for_sale,
        }
    }
}

// =============================================================================
// Variant Selection
// =============================================================================

/// Pick the variant to display.
///
/// Query parameters whose names match the product's option names select a
/// variant (`?Size=M&Color=Red`). Without a full match this falls back to the
/// first available variant, then to the first variant.
#[must_use]
pub fn select_variant<'a>(
    product: &'a Product,
    params: &HashMap<String, String>,
) -> Option<&'a ProductVariant> {
    let wanted: Vec<(&str, &str)> = product
        .options
        .iter()
        .filter_map(|option| {
            params
                .get(&option.name)
                .map(|value| (option.name.as_str(), value.as_str()))
        })
        .collect();

    if !wanted.is_empty()
        && let Some(variant) = product.variants.iter().find(|variant| {
            wanted
                .iter()
                .all(|(name, value)| variant.option_value(name) == Some(*value))
        })
    {
        return Some(variant);
    }

    product
        .variants
        .iter()
        .find(|variant| variant.available_for_sale)
        .or_else(|| product.variants.first())
}

/// Option pickers with links that change one option at a time.
fn option_views(product: &Product, selected: Option<&ProductVariant>) -> Vec<OptionView> {
    if product.has_only_default_variant() {
        return Vec::new();
    }

    let current: Vec<(&str, &str)> = product
        .options
        .iter()
        .filter_map(|option| {
            selected
                .and_then(|variant| variant.option_value(&option.name))
                .map(|value| (option.name.as_str(), value))
        })
        .collect();

    product
        .options
        .iter()
        .map(|option| OptionView {
            name: option.name.clone(),
            values: option
                .values
                .iter()
                .map(|value| {
                    let query = current
                        .iter()
                        .map(|&(name, current_value)| {
                            let value = if name == option.name {
                                value.as_str()
                            } else {
                                current_value
                            };
                            format!(
                                "{}={}",
                                urlencoding::encode(name),
                                urlencoding::encode(value)
                            )
                        })
                        .collect::<Vec<_>>()
                        .join("&");

                    OptionValueView {
                        value: value.clone(),
                        selected: current
                            .iter()
                            .any(|&(name, v)| name == option.name && v == value),
                        url: if query.is_empty() {
                            product.path()
                        } else {
                            format!("{}?{query}", product.path())
                        },
                    }
                })
                .collect(),
        })
        .collect()
}

// =============================================================================
// Templates
// =============================================================================

/// Product listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub after: Option<String>,
    pub sort: Option<String>,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub ctx: PageContext,
    pub products: Vec<ProductView>,
    pub sorts: Vec<SortOption>,
    pub sort: &'static str,
    pub next_cursor: Option<String>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub ctx: PageContext,
    pub product: Product,
    pub variant: Option<ProductVariant>,
    pub price: String,
    pub compare_at_price: Option<String>,
    pub images: Vec<ImageView>,
    pub options: Vec<OptionView>,
    pub related_products: Vec<ProductView>,
    pub seo_description: Option<String>,
    pub in_compare: bool,
    pub compare_full: bool,
}

/// Display product listing page.
#[instrument(skip(state, ctx))]
pub async fn index(
    State(state): State<AppState>,
    ctx: PageContext,
    Query(query): Query<ListingQuery>,
) -> Result<impl IntoResponse> {
    let sort = ProductSort::from_param(query.sort.as_deref());
    let after = query.after.filter(|c| !c.is_empty());

    let connection = state
        .storefront()
        .get_products(PAGE_SIZE, after, sort)
        .await?;

    Ok(ProductsIndexTemplate {
        ctx,
        products: connection.products.iter().map(ProductView::from).collect(),
        sorts: ProductSort::ALL
            .into_iter()
            .map(|option| SortOption {
                param: option.param(),
                label: option.label(),
                selected: option == sort,
            })
            .collect(),
        sort: sort.param(),
        next_cursor: super::next_page(&connection.page_info),
    })
}

/// Display product detail page.
#[instrument(skip(state, ctx, session, params), fields(handle = %handle))]
pub async fn show(
    State(state): State<AppState>,
    ctx: PageContext,
    session: Session,
    Path(handle): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse> {
    let handle =
        Handle::parse(&handle).map_err(|_| AppError::NotFound(format!("product {handle}")))?;

    let product = state
        .storefront()
        .get_product_by_handle(handle.as_str())
        .await?;

    let related_products = match state
        .storefront()
        .get_product_recommendations(&product.id)
        .await
    {
        Ok(products) => products
            .iter()
            .take(RELATED_LIMIT)
            .map(ProductView::from)
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load product recommendations");
            Vec::new()
        }
    };

    let compare = load_compare_list(&session).await;
    let variant = select_variant(&product, &params).cloned();
    let options = option_views(&product, variant.as_ref());

    let (price, compare_at_price) = variant.as_ref().map_or_else(
        || (ProductView::from(&product).price, None),
        |v| {
            (
                v.price.display(),
                compare_at(&v.price, v.compare_at_price.as_ref()),
            )
        },
    );

    let mut images: Vec<ImageView> = product
        .images
        .iter()
        .map(|img| ImageView::new(img, &product.title))
        .collect();
    // Lead with the selected variant's image when it has its own
    if let Some(image) = variant.as_ref().and_then(|v| v.image.as_ref()) {
        images.retain(|existing| existing.url != image.url);
        images.insert(0, ImageView::new(image, &product.title));
    }

    Ok(ProductShowTemplate {
        ctx,
        seo_description: product
            .seo
            .as_ref()
            .and_then(|seo| seo.description.clone())
            .or_else(|| Some(product.description.clone()).filter(|d| !d.is_empty())),
        in_compare: compare.contains(&product.handle),
        compare_full: compare.len() >= MAX_COMPARE,
        product,
        variant,
        price,
        compare_at_price,
        images,
        options,
        related_products,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shopify::types::{PriceRange, ProductOption, SelectedOption};

    fn money(amount: &str) -> Money {
        Money {
            amount: amount.to_string(),
            currency_code: "USD".to_string(),
        }
    }

    fn variant(id: &str, size: &str, color: &str, available: bool) -> ProductVariant {
        ProductVariant {
            id: format!("gid://shopify/ProductVariant/{id}"),
            title: format!("{size} / {color}"),
            available_for_sale: available,
            sku: None,
            price: money("20.00"),
            compare_at_price: None,
            selected_options: vec![
                SelectedOption {
                    name: "Size".to_string(),
                    value: size.to_string(),
                },
                SelectedOption {
                    name: "Color".to_string(),
                    value: color.to_string(),
                },
            ],
            image: None,
        }
    }

    fn product(variants: Vec<ProductVariant>) -> Product {
        Product {
            id: "gid://shopify/Product/1".to_string(),
            handle: "linen-shirt".to_string(),
            title: "Linen Shirt".to_string(),
            description: String::new(),
            description_html: String::new(),
            available_for_sale: true,
            kind: "Shirts".to_string(),
            vendor: "Canopy".to_string(),
            tags: vec![],
            seo: None,
            price_range: PriceRange {
                min_variant_price: money("20.00"),
                max_variant_price: money("20.00"),
            },
            compare_at_price_range: None,
            featured_image: None,
            images: vec![],
            options: vec![
                ProductOption {
                    id: "1".to_string(),
                    name: "Size".to_string(),
                    values: vec!["S".to_string(), "M".to_string()],
                },
                ProductOption {
                    id: "2".to_string(),
                    name: "Color".to_string(),
                    values: vec!["Red".to_string(), "Blue".to_string()],
                },
            ],
            variants,
        }
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_select_variant_from_params() {
        let product = product(vec![
            variant("1", "S", "Red", true),
            variant("2", "M", "Blue", true),
        ]);
        let selected = select_variant(&product, &params(&[("Size", "M"), ("Color", "Blue")]));
        assert_eq!(selected.map(|v| v.id.as_str()), Some("gid://shopify/ProductVariant/2"));
    }

    #[test]
    fn test_select_variant_ignores_unknown_params() {
        let product = product(vec![
            variant("1", "S", "Red", true),
            variant("2", "M", "Blue", true),
        ]);
        let selected = select_variant(&product, &params(&[("utm_source", "mail"), ("Size", "M")]));
        assert_eq!(selected.map(|v| v.id.as_str()), Some("gid://shopify/ProductVariant/2"));
    }

    #[test]
    fn test_select_variant_falls_back_to_first_available() {
        let product = product(vec![
            variant("1", "S", "Red", false),
            variant("2", "M", "Blue", true),
        ]);
        let selected = select_variant(&product, &params(&[("Size", "XL")]));
        assert_eq!(selected.map(|v| v.id.as_str()), Some("gid://shopify/ProductVariant/2"));
    }

    #[test]
    fn test_select_variant_falls_back_to_first() {
        let product = product(vec![
            variant("1", "S", "Red", false),
            variant("2", "M", "Blue", false),
        ]);
        let selected = select_variant(&product, &HashMap::new());
        assert_eq!(selected.map(|v| v.id.as_str()), Some("gid://shopify/ProductVariant/1"));

        assert!(select_variant(&self::product(vec![]), &HashMap::new()).is_none());
    }

    #[test]
    fn test_option_views_link_to_variants() {
        let product = product(vec![
            variant("1", "S", "Red", true),
            variant("2", "M", "Blue", true),
        ]);
        let views = option_views(&product, product.variants.first());

        let size = views.first().map(|o| &o.values);
        let urls: Vec<&str> = size
            .map(|values| values.iter().map(|v| v.url.as_str()).collect())
            .unwrap_or_default();
        assert_eq!(
            urls,
            vec![
                "/products/linen-shirt?Size=S&Color=Red",
                "/products/linen-shirt?Size=M&Color=Red",
            ]
        );
        assert!(size.and_then(|values| values.first()).is_some_and(|v| v.selected));
    }

    #[test]
    fn test_compare_at_only_when_higher() {
        assert_eq!(
            compare_at(&money("10.00"), Some(&money("15.00"))).as_deref(),
            Some("$15.00")
        );
        assert_eq!(compare_at(&money("10.00"), Some(&money("10.00"))), None);
        assert_eq!(compare_at(&money("10.00"), None), None);
    }
}
