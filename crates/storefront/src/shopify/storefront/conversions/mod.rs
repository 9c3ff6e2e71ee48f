//! Type conversion functions for Shopify Storefront API responses.

pub mod cart;
pub mod collections;
pub mod content;
pub mod products;
pub mod search;

pub use cart::{convert_cart, convert_cart_user_errors};
pub use collections::{convert_collection, convert_collection_connection};
pub use content::{convert_layout, convert_page, convert_policies};
pub use products::{
    convert_product, convert_product_card, convert_product_card_connection, order_by_handles,
};
pub use search::{convert_predictive_search, convert_search};

use crate::shopify::types::{Image, Money, PageInfo, PriceRange, Seo};

use super::fragments::{ImageData, MoneyData, PageInfoData, PriceRangeData, SeoData};

// =============================================================================
// Shared leaf conversions
// =============================================================================

pub(crate) fn convert_money(money: MoneyData) -> Money {
    Money {
        amount: money.amount,
        currency_code: money.currency_code,
    }
}

pub(crate) fn convert_image(image: ImageData) -> Image {
    Image {
        id: image.id,
        url: image.url,
        alt_text: image.alt_text,
        width: image.width,
        height: image.height,
    }
}

pub(crate) fn convert_seo(seo: SeoData) -> Seo {
    Seo {
        title: seo.title,
        description: seo.description,
    }
}

pub(crate) fn convert_page_info(info: PageInfoData) -> PageInfo {
    PageInfo {
        has_next_page: info.has_next_page,
        has_previous_page: info.has_previous_page,
        start_cursor: info.start_cursor,
        end_cursor: info.end_cursor,
    }
}

pub(crate) fn convert_price_range(range: PriceRangeData) -> PriceRange {
    PriceRange {
        min_variant_price: convert_money(range.min_variant_price),
        max_variant_price: convert_money(range.max_variant_price),
    }
}
