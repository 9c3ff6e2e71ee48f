//! Search and predictive search conversion functions.

use crate::shopify::types::{
    PredictiveCollection, PredictivePage, PredictiveProduct, PredictiveSearchResults,
    QuerySuggestion, SearchArticle, SearchPage, SearchResults,
};

use super::super::fragments::{PredictiveSearchData, SearchConnectionData, SearchItemData};
use super::{convert_image, convert_money, convert_page_info, convert_product_card};

/// Split mixed search hits into per-type lists, keeping relevance order.
pub fn convert_search(search: SearchConnectionData) -> SearchResults {
    let mut results = SearchResults {
        total_count: search.total_count,
        page_info: convert_page_info(search.page_info),
        ..SearchResults::default()
    };

    for item in search.nodes {
        match item {
            SearchItemData::Product(card) => results.products.push(convert_product_card(card)),
            SearchItemData::Page(page) => results.pages.push(SearchPage {
                handle: page.handle,
                title: page.title,
                body_summary: page.body_summary,
            }),
            SearchItemData::Article(article) => results.articles.push(SearchArticle {
                handle: article.handle,
                blog_handle: article.blog.handle,
                title: article.title,
                excerpt: article.excerpt.filter(|e| !e.is_empty()),
                image: article.image.map(convert_image),
            }),
        }
    }

    results
}

pub fn convert_predictive_search(data: PredictiveSearchData) -> PredictiveSearchResults {
    PredictiveSearchResults {
        products: data
            .products
            .into_iter()
            .map(|p| PredictiveProduct {
                handle: p.handle,
                title: p.title,
                vendor: p.vendor,
                price: convert_money(p.price_range.min_variant_price),
                image: p.featured_image.map(convert_image),
            })
            .collect(),
        collections: data
            .collections
            .into_iter()
            .map(|c| PredictiveCollection {
                handle: c.handle,
                title: c.title,
                image: c.image.map(convert_image),
            })
            .collect(),
        pages: data
            .pages
            .into_iter()
            .map(|p| PredictivePage {
                handle: p.handle,
                title: p.title,
            })
            .collect(),
        queries: data
            .queries
            .into_iter()
            .map(|q| QuerySuggestion {
                text: q.text,
                styled_text: q.styled_text,
            })
            .collect(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_search_splits_by_typename() {
        let data: SearchConnectionData = serde_json::from_value(serde_json::json!({
            "totalCount": 3,
            "pageInfo": { "hasNextPage": true, "hasPreviousPage": false, "startCursor": "a", "endCursor": "b" },
            "nodes": [
                { "__typename": "Page", "handle": "about", "title": "About", "bodySummary": "Who we are" },
                {
                    "__typename": "Product",
                    "id": "gid://shopify/Product/1",
                    "handle": "linen-shirt",
                    "title": "Linen Shirt",
                    "vendor": "Canopy",
                    "productType": "Shirts",
                    "availableForSale": true,
                    "featuredImage": null,
                    "priceRange": {
                        "minVariantPrice": { "amount": "40.0", "currencyCode": "USD" },
                        "maxVariantPrice": { "amount": "40.0", "currencyCode": "USD" }
                    },
                    "compareAtPriceRange": null
                },
                {
                    "__typename": "Article",
                    "handle": "linen-care",
                    "title": "Caring for linen",
                    "excerpt": "",
                    "blog": { "handle": "journal" },
                    "image": null
                }
            ]
        }))
        .unwrap();

        let results = convert_search(data);
        assert_eq!(results.total_count, 3);
        assert_eq!(results.products[0].handle, "linen-shirt");
        assert_eq!(results.pages[0].handle, "about");
        assert_eq!(results.articles[0].path(), "/blogs/journal/linen-care");
        assert_eq!(results.articles[0].excerpt, None);
        assert_eq!(results.page_info.next_cursor(), Some("b"));
    }

    #[test]
    fn test_convert_predictive_search_empty() {
        let results = convert_predictive_search(PredictiveSearchData::default());
        assert!(results.is_empty());
    }
}
