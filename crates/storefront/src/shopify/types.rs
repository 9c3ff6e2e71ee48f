//! Domain types for the Shopify Storefront API.
//!
//! These types provide a clean, ergonomic API separate from the raw response
//! shapes in `storefront::fragments`. Templates only ever see these.

use canopy_core::Price;
use serde::{Deserialize, Serialize};

// =============================================================================
// Money Types
// =============================================================================

/// Monetary amount with currency code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Decimal amount as string (preserves precision).
    pub amount: String,
    /// ISO 4217 currency code.
    #[serde(alias = "currencyCode")]
    pub currency_code: String,
}

impl Money {
    /// Parse into a typed [`Price`].
    #[must_use]
    pub fn price(&self) -> Option<Price> {
        Price::parse(&self.amount, &self.currency_code).ok()
    }

    /// Format for display, falling back to the raw values if unparseable.
    #[must_use]
    pub fn display(&self) -> String {
        self.price().map_or_else(
            || format!("{} {}", self.amount, self.currency_code),
            |price| price.display(),
        )
    }

    /// Whether the amount is zero (unparseable amounts count as zero).
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.price().is_none_or(|price| price.is_zero())
    }
}

/// Price range for a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRange {
    /// Minimum price among all variants.
    pub min_variant_price: Money,
    /// Maximum price among all variants.
    pub max_variant_price: Money,
}

impl PriceRange {
    /// Whether all variants share one price.
    #[must_use]
    pub fn is_single_price(&self) -> bool {
        self.min_variant_price.price() == self.max_variant_price.price()
    }
}

// =============================================================================
// Image / SEO Types
// =============================================================================

/// Product, collection or article image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    /// Shopify image ID.
    pub id: Option<String>,
    /// Image URL.
    pub url: String,
    /// Alt text for accessibility.
    #[serde(alias = "altText")]
    pub alt_text: Option<String>,
    /// Image width in pixels.
    pub width: Option<i64>,
    /// Image height in pixels.
    pub height: Option<i64>,
}

impl Image {
    /// Alt text, or the given fallback (usually the owning resource's title).
    #[must_use]
    pub fn alt_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.alt_text
            .as_deref()
            .filter(|alt| !alt.is_empty())
            .unwrap_or(fallback)
    }
}

/// SEO metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Seo {
    /// Page title for search engines.
    pub title: Option<String>,
    /// Meta description.
    pub description: Option<String>,
}

// =============================================================================
// Product Types
// =============================================================================

/// Selected option on a product variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectedOption {
    /// Option name (e.g., "Size", "Color").
    pub name: String,
    /// Selected value (e.g., "Large", "Blue").
    pub value: String,
}

/// Product option definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductOption {
    /// Option ID.
    pub id: String,
    /// Option name (e.g., "Size").
    pub name: String,
    /// Available values (e.g., `["Small", "Medium", "Large"]`).
    pub values: Vec<String>,
}

/// A product variant (specific combination of options).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductVariant {
    /// Variant ID.
    pub id: String,
    /// Variant title (combination of option values).
    pub title: String,
    /// Whether this variant is available for sale.
    pub available_for_sale: bool,
    /// SKU code.
    pub sku: Option<String>,
    /// Current price.
    pub price: Money,
    /// Compare-at price (original price if on sale).
    pub compare_at_price: Option<Money>,
    /// Selected options for this variant.
    pub selected_options: Vec<SelectedOption>,
    /// Variant image.
    pub image: Option<Image>,
}

impl ProductVariant {
    /// Value of the named option on this variant.
    #[must_use]
    pub fn option_value(&self, name: &str) -> Option<&str> {
        self.selected_options
            .iter()
            .find(|o| o.name == name)
            .map(|o| o.value.as_str())
    }

    /// Whether the variant is discounted against its compare-at price.
    #[must_use]
    pub fn is_on_sale(&self) -> bool {
        match (&self.compare_at_price, self.price.price()) {
            (Some(compare_at), Some(price)) => compare_at
                .price()
                .is_some_and(|compare_at| compare_at.amount > price.amount),
            _ => false,
        }
    }
}

/// A product in the store.
///
/// Listing queries only fill the card fields; `options`, `variants` and
/// `images` are empty for those.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Product ID.
    pub id: String,
    /// URL handle.
    pub handle: String,
    /// Product title.
    pub title: String,
    /// Plain text description.
    pub description: String,
    /// HTML description.
    pub description_html: String,
    /// Whether any variant is available.
    pub available_for_sale: bool,
    /// Product type/category.
    #[serde(rename = "product_type")]
    pub kind: String,
    /// Vendor name.
    pub vendor: String,
    /// Product tags.
    pub tags: Vec<String>,
    /// SEO metadata.
    pub seo: Option<Seo>,
    /// Price range across variants.
    pub price_range: PriceRange,
    /// Compare-at price range.
    pub compare_at_price_range: Option<PriceRange>,
    /// Featured image.
    pub featured_image: Option<Image>,
    /// All product images.
    pub images: Vec<Image>,
    /// Product options.
    pub options: Vec<ProductOption>,
    /// Product variants.
    pub variants: Vec<ProductVariant>,
}

impl Product {
    /// Storefront URL path for this product.
    #[must_use]
    pub fn path(&self) -> String {
        format!("/products/{}", self.handle)
    }

    /// Options worth showing a picker for (Shopify reports a lone
    /// "Title"/"Default Title" option for single-variant products).
    #[must_use]
    pub fn has_only_default_variant(&self) -> bool {
        self.options.len() <= 1
            && self.variants.len() <= 1
            && self
                .options
                .first()
                .is_none_or(|o| o.name == "Title" && o.values.len() <= 1)
    }
}

// =============================================================================
// Collection Types
// =============================================================================

/// A collection of products.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    /// Collection ID.
    pub id: String,
    /// URL handle.
    pub handle: String,
    /// Collection title.
    pub title: String,
    /// Plain text description.
    pub description: String,
    /// HTML description.
    pub description_html: String,
    /// SEO metadata.
    pub seo: Option<Seo>,
    /// Collection image.
    pub image: Option<Image>,
    /// Products in this collection (one page).
    pub products: Vec<Product>,
    /// Pagination for `products`.
    pub products_page_info: PageInfo,
}

// =============================================================================
// Pagination Types
// =============================================================================

/// Pagination information.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageInfo {
    /// Whether there are more items after this page.
    #[serde(alias = "hasNextPage")]
    pub has_next_page: bool,
    /// Whether there are items before this page.
    #[serde(default, alias = "hasPreviousPage")]
    pub has_previous_page: bool,
    /// Cursor for the first item.
    #[serde(alias = "startCursor")]
    pub start_cursor: Option<String>,
    /// Cursor for the last item.
    #[serde(alias = "endCursor")]
    pub end_cursor: Option<String>,
}

impl PageInfo {
    /// Cursor for the next page, if there is one.
    #[must_use]
    pub fn next_cursor(&self) -> Option<&str> {
        if self.has_next_page {
            self.end_cursor.as_deref()
        } else {
            None
        }
    }
}

/// Paginated list of products.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductConnection {
    /// Products in this page.
    pub products: Vec<Product>,
    /// Pagination info.
    pub page_info: PageInfo,
}

/// Paginated list of collections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConnection {
    /// Collections in this page.
    pub collections: Vec<Collection>,
    /// Pagination info.
    pub page_info: PageInfo,
}

// =============================================================================
// Content Types
// =============================================================================

/// A content page managed in the Shopify admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// Page ID.
    pub id: String,
    /// URL handle.
    pub handle: String,
    /// Page title.
    pub title: String,
    /// HTML body.
    pub body: String,
    /// Plain text summary.
    pub body_summary: String,
    /// SEO metadata.
    pub seo: Option<Seo>,
    /// Last update timestamp.
    pub updated_at: Option<String>,
}

/// The shop policies that can be published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    PrivacyPolicy,
    ShippingPolicy,
    TermsOfService,
    RefundPolicy,
    SubscriptionPolicy,
}

impl PolicyKind {
    /// All policy kinds, in listing order.
    pub const ALL: [Self; 5] = [
        Self::PrivacyPolicy,
        Self::ShippingPolicy,
        Self::TermsOfService,
        Self::RefundPolicy,
        Self::SubscriptionPolicy,
    ];

    /// Resolve a URL handle to a policy kind.
    #[must_use]
    pub fn from_handle(handle: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.handle() == handle)
    }

    /// URL handle (`/policies/{handle}`).
    #[must_use]
    pub const fn handle(self) -> &'static str {
        match self {
            Self::PrivacyPolicy => "privacy-policy",
            Self::ShippingPolicy => "shipping-policy",
            Self::TermsOfService => "terms-of-service",
            Self::RefundPolicy => "refund-policy",
            Self::SubscriptionPolicy => "subscription-policy",
        }
    }
}

/// A published shop policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    /// Policy ID (absent for default subscription policies).
    pub id: Option<String>,
    /// Which policy this is.
    pub kind: PolicyKind,
    /// Policy title.
    pub title: String,
    /// HTML body.
    pub body: String,
    /// Shopify-hosted URL.
    pub url: Option<String>,
}

impl Policy {
    /// Storefront URL path for this policy.
    #[must_use]
    pub fn path(&self) -> String {
        format!("/policies/{}", self.kind.handle())
    }
}

/// All policies the shop has configured.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShopPolicies {
    /// Configured policies in [`PolicyKind::ALL`] order.
    pub policies: Vec<Policy>,
}

impl ShopPolicies {
    /// Look up a configured policy.
    #[must_use]
    pub fn get(&self, kind: PolicyKind) -> Option<&Policy> {
        self.policies.iter().find(|p| p.kind == kind)
    }
}

// =============================================================================
// Shop / Menu Types
// =============================================================================

/// Shop-level information.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Shop {
    /// Shop ID.
    pub id: String,
    /// Shop name.
    pub name: String,
    /// Shop description.
    pub description: Option<String>,
    /// Primary domain URL (e.g., `https://shop.example.com`).
    pub primary_domain_url: String,
}

/// A navigation menu.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Menu {
    /// Menu ID.
    pub id: String,
    /// Menu handle (e.g., "main-menu").
    pub handle: String,
    /// Menu title.
    pub title: String,
    /// Top-level items.
    pub items: Vec<MenuItem>,
}

/// A navigation menu item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    /// Item ID.
    pub id: String,
    /// Link text.
    pub title: String,
    /// Link target; relative for links within the shop.
    pub url: String,
    /// Menu item type (e.g., "COLLECTION", "HTTP").
    pub kind: String,
    /// Nested items.
    pub items: Vec<MenuItem>,
}

impl MenuItem {
    /// Whether the link leaves the shop.
    #[must_use]
    pub fn is_external(&self) -> bool {
        self.url.starts_with("http://") || self.url.starts_with("https://")
    }
}

/// Header and footer data shared by every page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Layout {
    /// Shop information.
    pub shop: Shop,
    /// Header navigation.
    pub header_menu: Option<Menu>,
    /// Footer navigation.
    pub footer_menu: Option<Menu>,
}

// =============================================================================
// Search Types
// =============================================================================

/// A content page hit in search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPage {
    /// Page handle.
    pub handle: String,
    /// Page title.
    pub title: String,
    /// Plain text summary.
    pub body_summary: String,
}

/// A blog article hit in search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchArticle {
    /// Article handle.
    pub handle: String,
    /// Handle of the owning blog.
    pub blog_handle: String,
    /// Article title.
    pub title: String,
    /// Excerpt, if any.
    pub excerpt: Option<String>,
    /// Article image.
    pub image: Option<Image>,
}

impl SearchArticle {
    /// Storefront URL path for this article.
    #[must_use]
    pub fn path(&self) -> String {
        format!("/blogs/{}/{}", self.blog_handle, self.handle)
    }
}

/// Full search results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResults {
    /// Total number of matches across all types.
    pub total_count: i64,
    /// Matching products.
    pub products: Vec<Product>,
    /// Matching pages.
    pub pages: Vec<SearchPage>,
    /// Matching articles.
    pub articles: Vec<SearchArticle>,
    /// Pagination info.
    pub page_info: PageInfo,
}

impl SearchResults {
    /// Whether nothing matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty() && self.pages.is_empty() && self.articles.is_empty()
    }
}

/// A product suggestion in predictive search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictiveProduct {
    /// Product handle.
    pub handle: String,
    /// Product title.
    pub title: String,
    /// Vendor.
    pub vendor: String,
    /// Lowest variant price.
    pub price: Money,
    /// Featured image.
    pub image: Option<Image>,
}

/// A collection suggestion in predictive search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictiveCollection {
    /// Collection handle.
    pub handle: String,
    /// Collection title.
    pub title: String,
    /// Collection image.
    pub image: Option<Image>,
}

/// A page suggestion in predictive search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictivePage {
    /// Page handle.
    pub handle: String,
    /// Page title.
    pub title: String,
}

/// A query completion in predictive search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuerySuggestion {
    /// Suggested search term.
    pub text: String,
    /// Suggested term with the matched part wrapped in `<mark>`.
    pub styled_text: String,
}

/// Search-as-you-type results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictiveSearchResults {
    /// Product suggestions.
    pub products: Vec<PredictiveProduct>,
    /// Collection suggestions.
    pub collections: Vec<PredictiveCollection>,
    /// Page suggestions.
    pub pages: Vec<PredictivePage>,
    /// Query completions.
    pub queries: Vec<QuerySuggestion>,
}

impl PredictiveSearchResults {
    /// Whether there are no suggestions at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
            && self.collections.is_empty()
            && self.pages.is_empty()
            && self.queries.is_empty()
    }
}

// =============================================================================
// Cart Types
// =============================================================================

/// Custom attribute (key-value pair).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute key.
    pub key: String,
    /// Attribute value.
    pub value: Option<String>,
}

/// Input for custom attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeInput {
    /// Attribute key.
    pub key: String,
    /// Attribute value.
    pub value: String,
}

/// Merchandise in a cart line (simplified product variant info).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartMerchandise {
    /// Variant ID.
    pub id: String,
    /// Variant title.
    pub title: String,
    /// Whether available for sale.
    pub available_for_sale: bool,
    /// Current price.
    pub price: Money,
    /// Selected options.
    pub selected_options: Vec<SelectedOption>,
    /// Variant image.
    pub image: Option<Image>,
    /// Parent product info.
    pub product: CartMerchandiseProduct,
}

/// Simplified product info for cart merchandise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartMerchandiseProduct {
    /// Product ID.
    pub id: String,
    /// Product handle.
    pub handle: String,
    /// Product title.
    pub title: String,
    /// Vendor.
    pub vendor: String,
    /// Featured image.
    pub featured_image: Option<Image>,
}

/// Cost for a cart line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLineCost {
    /// Price per unit.
    pub amount_per_quantity: Money,
    /// Compare-at price per unit.
    pub compare_at_amount_per_quantity: Option<Money>,
    /// Subtotal (before discounts).
    pub subtotal_amount: Money,
    /// Total (after discounts).
    pub total_amount: Money,
}

/// A line item in the cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    /// Cart line ID.
    pub id: String,
    /// Quantity.
    pub quantity: i64,
    /// Custom attributes.
    pub attributes: Vec<Attribute>,
    /// Line cost.
    pub cost: CartLineCost,
    /// Product variant.
    pub merchandise: CartMerchandise,
}

/// Cart cost summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartCost {
    /// Subtotal before tax/shipping.
    pub subtotal: Money,
    /// Total amount.
    pub total: Money,
}

/// Discount code applied to cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartDiscountCode {
    /// The discount code.
    pub code: String,
    /// Whether the code is applicable.
    pub applicable: bool,
}

/// Buyer identity for the cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartBuyerIdentity {
    /// Email address.
    pub email: Option<String>,
    /// Country code.
    pub country_code: Option<String>,
    /// Logged-in customer ID.
    pub customer_id: Option<String>,
}

/// A shopping cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    /// Cart ID.
    pub id: String,
    /// Checkout URL.
    pub checkout_url: String,
    /// Cart note.
    pub note: Option<String>,
    /// Total item quantity.
    pub total_quantity: i64,
    /// Buyer identity.
    pub buyer_identity: Option<CartBuyerIdentity>,
    /// Cart cost summary.
    pub cost: CartCost,
    /// Applied discount codes.
    pub discount_codes: Vec<CartDiscountCode>,
    /// Cart lines.
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Input for adding a line to cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLineInput {
    /// Product variant ID.
    pub merchandise_id: String,
    /// Quantity to add.
    pub quantity: i64,
    /// Custom attributes.
    pub attributes: Option<Vec<AttributeInput>>,
}

impl CartLineInput {
    /// A plain line with no attributes.
    #[must_use]
    pub const fn new(merchandise_id: String, quantity: i64) -> Self {
        Self {
            merchandise_id,
            quantity,
            attributes: None,
        }
    }
}

/// Input for updating a cart line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLineUpdateInput {
    /// Cart line ID.
    pub id: String,
    /// New quantity.
    pub quantity: Option<i64>,
}

/// Buyer identity for cart creation and updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartBuyerIdentityInput {
    /// Customer Account API access token of the signed-in customer.
    pub customer_access_token: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// Two-letter country code.
    pub country_code: Option<String>,
}

/// User error from cart mutations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartUserError {
    /// Error code.
    pub code: Option<String>,
    /// Field path that caused the error.
    pub field: Option<Vec<String>>,
    /// Human-readable error message.
    pub message: String,
}

// =============================================================================
// Sort Keys
// =============================================================================

/// Sort keys for product queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductSortKey {
    /// Sort by title.
    Title,
    /// Sort by creation date.
    CreatedAt,
    /// Sort by best selling.
    BestSelling,
    /// Sort by price.
    Price,
    /// Sort by relevance (for search).
    Relevance,
}

/// User-facing product listing order (`?sort=`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProductSort {
    #[default]
    BestSelling,
    Title,
    PriceAsc,
    PriceDesc,
    Newest,
}

impl ProductSort {
    /// All orders, in the order the sort picker lists them.
    pub const ALL: [Self; 5] = [
        Self::BestSelling,
        Self::Title,
        Self::PriceAsc,
        Self::PriceDesc,
        Self::Newest,
    ];

    /// Parse a `?sort=` value; unknown values fall back to the default.
    #[must_use]
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("title") => Self::Title,
            Some("price-asc") => Self::PriceAsc,
            Some("price-desc") => Self::PriceDesc,
            Some("newest") => Self::Newest,
            _ => Self::BestSelling,
        }
    }

    /// Query parameter value.
    #[must_use]
    pub const fn param(self) -> &'static str {
        match self {
            Self::BestSelling => "best-selling",
            Self::Title => "title",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::Newest => "newest",
        }
    }

    /// Label for the sort picker.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::BestSelling => "Best selling",
            Self::Title => "Alphabetical",
            Self::PriceAsc => "Price, low to high",
            Self::PriceDesc => "Price, high to low",
            Self::Newest => "Newest",
        }
    }

    /// API sort key and `reverse` flag.
    #[must_use]
    pub const fn sort_key(self) -> (ProductSortKey, bool) {
        match self {
            Self::BestSelling => (ProductSortKey::BestSelling, false),
            Self::Title => (ProductSortKey::Title, false),
            Self::PriceAsc => (ProductSortKey::Price, false),
            Self::PriceDesc => (ProductSortKey::Price, true),
            Self::Newest => (ProductSortKey::CreatedAt, true),
        }
    }
}

/// Intent for product recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductRecommendationIntent {
    /// Related products.
    Related,
    /// Complementary products.
    Complementary,
}
