//! Shared GraphQL fragments and the response shapes they select.
//!
//! Each `*_fragment!` macro expands to the fragment's document text so query
//! documents can be assembled with `concat!`. A document must define every
//! fragment it spreads and no others, so each query lists its full set.
//! The `*Data` structs next to each fragment mirror its selection.

use serde::Deserialize;

// =============================================================================
// Leaf fragments
// =============================================================================

macro_rules! money_fragment {
    () => {
        "fragment Money on MoneyV2 { amount currencyCode }\n"
    };
}

macro_rules! image_fragment {
    () => {
        "fragment Image on Image { id url altText width height }\n"
    };
}

macro_rules! seo_fragment {
    () => {
        "fragment Seo on SEO { title description }\n"
    };
}

macro_rules! page_info_fragment {
    () => {
        "fragment PageInfo on PageInfo { hasNextPage hasPreviousPage startCursor endCursor }\n"
    };
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyData {
    pub amount: String,
    pub currency_code: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageData {
    pub id: Option<String>,
    pub url: String,
    pub alt_text: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeoData {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfoData {
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
}

/// `{ nodes { ... } }` selection.
#[derive(Debug, Clone, Deserialize)]
pub struct Nodes<T> {
    pub nodes: Vec<T>,
}

impl<T> Default for Nodes<T> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

/// `{ pageInfo { ...PageInfo } nodes { ... } }` selection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    pub page_info: PageInfoData,
    pub nodes: Vec<T>,
}

// =============================================================================
// Product fragments
// =============================================================================

// Requires: Money, Image
macro_rules! product_variant_fragment {
    () => {
        "fragment ProductVariant on ProductVariant {
  id title availableForSale sku
  price { ...Money }
  compareAtPrice { ...Money }
  selectedOptions { name value }
  image { ...Image }
}
"
    };
}

// Requires: Money, Image
macro_rules! product_card_fragment {
    () => {
        "fragment ProductCard on Product {
  id handle title vendor productType availableForSale
  featuredImage { ...Image }
  priceRange { minVariantPrice { ...Money } maxVariantPrice { ...Money } }
  compareAtPriceRange { minVariantPrice { ...Money } maxVariantPrice { ...Money } }
}
"
    };
}

// Requires: ProductCard, ProductVariant, Seo, Money, Image
macro_rules! product_fragment {
    () => {
        "fragment Product on Product {
  ...ProductCard
  description descriptionHtml tags
  seo { ...Seo }
  images(first: 10) { nodes { ...Image } }
  options { id name optionValues { name } }
  variants(first: 100) { nodes { ...ProductVariant } }
}
"
    };
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectedOptionData {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariantData {
    pub id: String,
    pub title: String,
    pub available_for_sale: bool,
    pub sku: Option<String>,
    pub price: MoneyData,
    pub compare_at_price: Option<MoneyData>,
    pub selected_options: Vec<SelectedOptionData>,
    pub image: Option<ImageData>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRangeData {
    pub min_variant_price: MoneyData,
    pub max_variant_price: MoneyData,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCardData {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub vendor: String,
    pub product_type: String,
    pub available_for_sale: bool,
    pub featured_image: Option<ImageData>,
    pub price_range: PriceRangeData,
    pub compare_at_price_range: Option<PriceRangeData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptionValueData {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductOptionData {
    pub id: String,
    pub name: String,
    pub option_values: Vec<OptionValueData>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductData {
    #[serde(flatten)]
    pub card: ProductCardData,
    pub description: String,
    pub description_html: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub seo: Option<SeoData>,
    #[serde(default)]
    pub images: Nodes<ImageData>,
    #[serde(default)]
    pub options: Vec<ProductOptionData>,
    #[serde(default)]
    pub variants: Nodes<ProductVariantData>,
}

// =============================================================================
// Cart fragments
// =============================================================================

// Requires: Money, Image
macro_rules! cart_line_fragment {
    () => {
        "fragment CartLine on BaseCartLine {
  id quantity
  attributes { key value }
  cost {
    amountPerQuantity { ...Money }
    compareAtAmountPerQuantity { ...Money }
    subtotalAmount { ...Money }
    totalAmount { ...Money }
  }
  merchandise {
    ... on ProductVariant {
      id title availableForSale
      price { ...Money }
      selectedOptions { name value }
      image { ...Image }
      product { id handle title vendor featuredImage { ...Image } }
    }
  }
}
"
    };
}

// Requires: CartLine, Money, Image
macro_rules! cart_fragment {
    () => {
        "fragment Cart on Cart {
  id checkoutUrl note totalQuantity
  buyerIdentity { email countryCode customer { id } }
  cost { subtotalAmount { ...Money } totalAmount { ...Money } }
  discountCodes { code applicable }
  lines(first: 100) { nodes { ...CartLine } }
}
"
    };
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttributeData {
    pub key: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineCostData {
    pub amount_per_quantity: MoneyData,
    pub compare_at_amount_per_quantity: Option<MoneyData>,
    pub subtotal_amount: MoneyData,
    pub total_amount: MoneyData,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchandiseProductData {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub vendor: String,
    pub featured_image: Option<ImageData>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchandiseData {
    pub id: String,
    pub title: String,
    pub available_for_sale: bool,
    pub price: MoneyData,
    pub selected_options: Vec<SelectedOptionData>,
    pub image: Option<ImageData>,
    pub product: MerchandiseProductData,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineData {
    pub id: String,
    pub quantity: i64,
    #[serde(default)]
    pub attributes: Vec<AttributeData>,
    pub cost: CartLineCostData,
    pub merchandise: MerchandiseData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdData {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerIdentityData {
    pub email: Option<String>,
    pub country_code: Option<String>,
    pub customer: Option<IdData>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCostData {
    pub subtotal_amount: MoneyData,
    pub total_amount: MoneyData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscountCodeData {
    pub code: String,
    pub applicable: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartData {
    pub id: String,
    pub checkout_url: String,
    pub note: Option<String>,
    pub total_quantity: i64,
    pub buyer_identity: Option<BuyerIdentityData>,
    pub cost: CartCostData,
    #[serde(default)]
    pub discount_codes: Vec<DiscountCodeData>,
    #[serde(default)]
    pub lines: Nodes<CartLineData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CartUserErrorData {
    pub code: Option<String>,
    pub field: Option<Vec<String>>,
    pub message: String,
}

/// Payload shared by every cart mutation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartPayloadData {
    pub cart: Option<CartData>,
    #[serde(default)]
    pub user_errors: Vec<CartUserErrorData>,
}

// =============================================================================
// Layout fragments
// =============================================================================

macro_rules! menu_item_fragment {
    () => {
        "fragment MenuItem on MenuItem { id title url type }\n"
    };
}

// Requires: MenuItem
macro_rules! menu_fragment {
    () => {
        "fragment Menu on Menu {
  id handle title
  items { ...MenuItem items { ...MenuItem items { ...MenuItem } } }
}
"
    };
}

macro_rules! shop_fragment {
    () => {
        "fragment Shop on Shop { id name description primaryDomain { url } }\n"
    };
}

#[derive(Debug, Clone, Deserialize)]
pub struct MenuItemData {
    pub id: String,
    pub title: String,
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub items: Vec<MenuItemData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MenuData {
    pub id: String,
    pub handle: String,
    pub title: String,
    #[serde(default)]
    pub items: Vec<MenuItemData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DomainData {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopData {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub primary_domain: DomainData,
}

// =============================================================================
// Content fragments
// =============================================================================

macro_rules! policy_fragment {
    () => {
        "fragment Policy on ShopPolicy { id handle title body url }\n"
    };
}

// Requires: Seo
macro_rules! page_fragment {
    () => {
        "fragment Page on Page { id handle title body bodySummary updatedAt seo { ...Seo } }\n"
    };
}

#[derive(Debug, Clone, Deserialize)]
pub struct PolicyData {
    pub id: Option<String>,
    pub handle: String,
    pub title: String,
    pub body: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub body: String,
    pub body_summary: String,
    pub updated_at: Option<String>,
    pub seo: Option<SeoData>,
}

// =============================================================================
// Search fragments
// =============================================================================

// Requires: ProductCard, Money, Image
macro_rules! search_product_fragment {
    () => {
        "fragment SearchProduct on Product { __typename ...ProductCard }\n"
    };
}

macro_rules! search_page_fragment {
    () => {
        "fragment SearchPage on Page { __typename handle title bodySummary }\n"
    };
}

// Requires: Image
macro_rules! search_article_fragment {
    () => {
        "fragment SearchArticle on Article { __typename handle title excerpt blog { handle } image { ...Image } }\n"
    };
}

// Requires: Money, Image
macro_rules! predictive_product_fragment {
    () => {
        "fragment PredictiveProduct on Product {
  handle title vendor
  featuredImage { ...Image }
  priceRange { minVariantPrice { ...Money } }
}
"
    };
}

// Requires: Image
macro_rules! predictive_collection_fragment {
    () => {
        "fragment PredictiveCollection on Collection { handle title image { ...Image } }\n"
    };
}

macro_rules! predictive_page_fragment {
    () => {
        "fragment PredictivePage on Page { handle title }\n"
    };
}

macro_rules! predictive_query_fragment {
    () => {
        "fragment PredictiveQuery on SearchQuerySuggestion { text styledText }\n"
    };
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPageData {
    pub handle: String,
    pub title: String,
    pub body_summary: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlogHandleData {
    pub handle: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchArticleData {
    pub handle: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub blog: BlogHandleData,
    pub image: Option<ImageData>,
}

/// A search hit, discriminated by `__typename`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "__typename")]
pub enum SearchItemData {
    Product(ProductCardData),
    Page(SearchPageData),
    Article(SearchArticleData),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchConnectionData {
    pub total_count: i64,
    pub page_info: PageInfoData,
    pub nodes: Vec<SearchItemData>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinPriceData {
    pub min_variant_price: MoneyData,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictiveProductData {
    pub handle: String,
    pub title: String,
    pub vendor: String,
    pub featured_image: Option<ImageData>,
    pub price_range: MinPriceData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictiveCollectionData {
    pub handle: String,
    pub title: String,
    pub image: Option<ImageData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictivePageData {
    pub handle: String,
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictiveQueryData {
    pub text: String,
    pub styled_text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictiveSearchData {
    #[serde(default)]
    pub products: Vec<PredictiveProductData>,
    #[serde(default)]
    pub collections: Vec<PredictiveCollectionData>,
    #[serde(default)]
    pub pages: Vec<PredictivePageData>,
    #[serde(default)]
    pub queries: Vec<PredictiveQueryData>,
}
