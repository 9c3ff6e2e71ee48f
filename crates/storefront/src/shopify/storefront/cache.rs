//! Cache types for Storefront API responses.

use std::fmt;

use crate::shopify::types::{
    Collection, CollectionConnection, Layout, Page, Product, ProductConnection, ProductSort,
    ShopPolicies,
};

/// Cache key for read-mostly Storefront data.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Layout { header: String, footer: String },
    Product(String),
    Products { cursor: Option<String>, sort: ProductSort },
    Collection { handle: String, cursor: Option<String> },
    Collections { cursor: Option<String> },
    Page(String),
    Policies,
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Layout { header, footer } => write!(f, "layout:{header}:{footer}"),
            Self::Product(handle) => write!(f, "product:{handle}"),
            Self::Products { cursor, sort } => {
                write!(f, "products:{}:{}", sort.param(), cursor.as_deref().unwrap_or(""))
            }
            Self::Collection { handle, cursor } => {
                write!(f, "collection:{handle}:{}", cursor.as_deref().unwrap_or(""))
            }
            Self::Collections { cursor } => {
                write!(f, "collections:{}", cursor.as_deref().unwrap_or(""))
            }
            Self::Page(handle) => write!(f, "page:{handle}"),
            Self::Policies => f.write_str("policies"),
        }
    }
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Layout(Box<Layout>),
    Product(Box<Product>),
    Products(ProductConnection),
    Collection(Box<Collection>),
    Collections(CollectionConnection),
    Page(Box<Page>),
    Policies(ShopPolicies),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_rendering() {
        assert_eq!(CacheKey::Product("linen-shirt".into()).to_string(), "product:linen-shirt");
        assert_eq!(
            CacheKey::Collection {
                handle: "summer".into(),
                cursor: None
            }
            .to_string(),
            "collection:summer:"
        );
        assert_eq!(
            CacheKey::Products {
                cursor: Some("abc".into()),
                sort: ProductSort::Newest
            }
            .to_string(),
            "products:newest:abc"
        );
        assert_eq!(CacheKey::Policies.to_string(), "policies");
    }
}
