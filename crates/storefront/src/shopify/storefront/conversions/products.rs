//! Product type conversion functions.

use canopy_core::Handle;

use crate::shopify::types::{
    Product, ProductConnection, ProductOption, ProductVariant, SelectedOption,
};

use super::super::fragments::{
    Connection, ProductCardData, ProductData, ProductOptionData, ProductVariantData,
};
use super::{convert_image, convert_money, convert_page_info, convert_price_range, convert_seo};

/// Convert a `ProductCard` selection. Detail-only fields stay empty.
pub fn convert_product_card(card: ProductCardData) -> Product {
    Product {
        id: card.id,
        handle: card.handle,
        title: card.title,
        description: String::new(),
        description_html: String::new(),
        available_for_sale: card.available_for_sale,
        kind: card.product_type,
        vendor: card.vendor,
        tags: vec![],
        seo: None,
        price_range: convert_price_range(card.price_range),
        compare_at_price_range: card.compare_at_price_range.map(convert_price_range),
        featured_image: card.featured_image.map(convert_image),
        images: vec![],
        options: vec![],
        variants: vec![],
    }
}

/// Convert a full `Product` selection.
pub fn convert_product(product: ProductData) -> Product {
    let ProductData {
        card,
        description,
        description_html,
        tags,
        seo,
        images,
        options,
        variants,
    } = product;

    Product {
        description,
        description_html,
        tags,
        seo: seo.map(convert_seo),
        images: images.nodes.into_iter().map(convert_image).collect(),
        options: options.into_iter().map(convert_option).collect(),
        variants: variants.nodes.into_iter().map(convert_variant).collect(),
        ..convert_product_card(card)
    }
}

pub fn convert_product_card_connection(connection: Connection<ProductCardData>) -> ProductConnection {
    ProductConnection {
        products: connection
            .nodes
            .into_iter()
            .map(convert_product_card)
            .collect(),
        page_info: convert_page_info(connection.page_info),
    }
}

fn convert_option(option: ProductOptionData) -> ProductOption {
    ProductOption {
        id: option.id,
        name: option.name,
        values: option.option_values.into_iter().map(|v| v.name).collect(),
    }
}

fn convert_variant(variant: ProductVariantData) -> ProductVariant {
    ProductVariant {
        id: variant.id,
        title: variant.title,
        available_for_sale: variant.available_for_sale,
        sku: variant.sku.filter(|sku| !sku.is_empty()),
        price: convert_money(variant.price),
        compare_at_price: variant.compare_at_price.map(convert_money),
        selected_options: variant
            .selected_options
            .into_iter()
            .map(|o| SelectedOption {
                name: o.name,
                value: o.value,
            })
            .collect(),
        image: variant.image.map(convert_image),
    }
}

/// Reorder products to follow `handles`, dropping any not requested.
///
/// The search API returns matches in relevance order, not request order.
#[must_use]
pub fn order_by_handles(mut products: Vec<Product>, handles: &[Handle]) -> Vec<Product> {
    handles
        .iter()
        .filter_map(|handle| {
            products
                .iter()
                .position(|p| p.handle == handle.as_str())
                .map(|index| products.swap_remove(index))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product_json(handle: &str) -> serde_json::Value {
        serde_json::json!({
            "id": format!("gid://shopify/Product/{handle}"),
            "handle": handle,
            "title": "Linen Shirt",
            "vendor": "Canopy",
            "productType": "Shirts",
            "availableForSale": true,
            "featuredImage": null,
            "priceRange": {
                "minVariantPrice": { "amount": "40.0", "currencyCode": "USD" },
                "maxVariantPrice": { "amount": "45.0", "currencyCode": "USD" }
            },
            "compareAtPriceRange": {
                "minVariantPrice": { "amount": "0.0", "currencyCode": "USD" },
                "maxVariantPrice": { "amount": "0.0", "currencyCode": "USD" }
            },
            "description": "Breathable linen.",
            "descriptionHtml": "<p>Breathable linen.</p>",
            "tags": ["summer"],
            "seo": { "title": null, "description": null },
            "images": { "nodes": [] },
            "options": [
                { "id": "gid://shopify/ProductOption/1", "name": "Size", "optionValues": [{ "name": "S" }, { "name": "M" }] }
            ],
            "variants": { "nodes": [
                {
                    "id": "gid://shopify/ProductVariant/1",
                    "title": "S",
                    "availableForSale": false,
                    "sku": "",
                    "price": { "amount": "40.0", "currencyCode": "USD" },
                    "compareAtPrice": null,
                    "selectedOptions": [{ "name": "Size", "value": "S" }],
                    "image": null
                }
            ]}
        })
    }

    #[test]
    fn test_convert_product_flattens_card_fields() {
        let data: ProductData = serde_json::from_value(product_json("linen-shirt")).unwrap();
        let product = convert_product(data);

        assert_eq!(product.handle, "linen-shirt");
        assert_eq!(product.kind, "Shirts");
        assert_eq!(product.description_html, "<p>Breathable linen.</p>");
        assert_eq!(product.options[0].values, vec!["S", "M"]);
        assert_eq!(product.variants.len(), 1);
        // Empty SKUs are treated as absent
        assert_eq!(product.variants[0].sku, None);
        assert_eq!(product.price_range.min_variant_price.display(), "$40.00");
    }

    #[test]
    fn test_order_by_handles() {
        let products = ["b", "a", "c"]
            .into_iter()
            .map(|h| convert_product(serde_json::from_value(product_json(h)).unwrap()))
            .collect::<Vec<_>>();

        let handles = ["a", "missing", "b"]
            .into_iter()
            .map(|h| Handle::parse(h).unwrap())
            .collect::<Vec<_>>();
        let ordered = order_by_handles(products, &handles);
        let handles = ordered.iter().map(|p| p.handle.as_str()).collect::<Vec<_>>();
        assert_eq!(handles, vec!["a", "b"]);
    }
}
