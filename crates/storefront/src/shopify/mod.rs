//! Shopify Storefront and Customer Account API clients.
//!
//! # Architecture
//!
//! - Operation documents implement `graphql_client::GraphQLQuery` by hand and
//!   are assembled from shared fragments at compile time
//! - Shopify is the source of truth; nothing is persisted locally
//! - In-memory caching via `moka` for read-mostly Storefront responses
//!
//! # APIs
//!
//! ## Storefront API
//! - Shop layout (menus), products, collections, pages, policies
//! - Search and predictive search
//! - Cart operations (never cached)
//!
//! ## Customer Account API
//! - OAuth 2.0 authorization code flow with PKCE
//! - Customer profile, order history, addresses
//!
//! # Example
//!
//! ```rust,ignore
//! use canopy_storefront::shopify::StorefrontClient;
//!
//! let client = StorefrontClient::new(&config);
//!
//! let product = client.get_product_by_handle("linen-shirt").await?;
//! let cart = client.create_cart(vec![CartLineInput::new(product.variants[0].id.clone(), 1)], None).await?;
//! ```

pub mod customer;
pub mod storefront;
pub mod types;

pub use customer::{CustomerAccessToken, CustomerClient};
pub use storefront::StorefrontClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when interacting with Shopify APIs.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// User error from mutation (e.g., invalid input).
    #[error("User error: {0}")]
    UserError(String),

    /// OAuth token exchange or Customer Account API failure.
    #[error("OAuth error: {0}")]
    OAuth(String),

    /// The Customer Account API rejected the access token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl ShopifyError {
    /// Build a `GraphQL` error carrying a single message.
    pub(crate) fn graphql_message(message: impl Into<String>) -> Self {
        Self::GraphQL(vec![GraphQLError {
            message: message.into(),
            locations: vec![],
            path: vec![],
        }])
    }
}

/// A GraphQL error returned by the Shopify API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

impl From<graphql_client::Error> for GraphQLError {
    fn from(error: graphql_client::Error) -> Self {
        Self {
            message: error.message,
            locations: error.locations.map_or_else(Vec::new, |locations| {
                locations
                    .into_iter()
                    .map(|l| GraphQLErrorLocation {
                        line: i64::from(l.line),
                        column: i64::from(l.column),
                    })
                    .collect()
            }),
            path: error.path.map_or_else(Vec::new, |path| {
                path.into_iter()
                    .map(|fragment| match fragment {
                        graphql_client::PathFragment::Key(s) => serde_json::Value::String(s),
                        graphql_client::PathFragment::Index(i) => {
                            serde_json::Value::Number(i.into())
                        }
                    })
                    .collect()
            }),
        }
    }
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }

    errors
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let mut parts = Vec::new();

            if !e.message.is_empty() {
                parts.push(e.message.clone());
            }

            if !e.path.is_empty() {
                let path_str = e
                    .path
                    .iter()
                    .map(|p| match p {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(".");
                parts.push(format!("path: {path_str}"));
            }

            if let Some(loc) = e.locations.first() {
                parts.push(format!("at line {}:{}", loc.line, loc.column));
            }

            if parts.is_empty() {
                format!("[error {}]: (no details)", i + 1)
            } else {
                parts.join(" ")
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shopify_error_display() {
        let err = ShopifyError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");
    }

    #[test]
    fn test_graphql_error_formatting() {
        let errors = vec![
            GraphQLError {
                message: "Field not found".to_string(),
                locations: vec![],
                path: vec![],
            },
            GraphQLError {
                message: "Invalid ID".to_string(),
                locations: vec![],
                path: vec![],
            },
        ];
        let err = ShopifyError::GraphQL(errors);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: Field not found; Invalid ID"
        );
    }

    #[test]
    fn test_graphql_error_path_and_location() {
        let errors = vec![GraphQLError {
            message: String::new(),
            locations: vec![GraphQLErrorLocation { line: 5, column: 10 }],
            path: vec![
                serde_json::Value::String("products".to_string()),
                serde_json::Value::Number(0.into()),
            ],
        }];
        let err = ShopifyError::GraphQL(errors);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: path: products.0 at line 5:10"
        );
    }

    #[test]
    fn test_graphql_error_no_details() {
        let errors = vec![GraphQLError {
            message: String::new(),
            locations: vec![],
            path: vec![],
        }];
        let err = ShopifyError::GraphQL(errors);
        assert_eq!(err.to_string(), "GraphQL errors: [error 1]: (no details)");

        let err = ShopifyError::GraphQL(vec![]);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: (no error details provided)"
        );
    }

    #[test]
    fn test_graphql_message_helper() {
        let err = ShopifyError::graphql_message("No data in response");
        assert_eq!(err.to_string(), "GraphQL errors: No data in response");
    }

    #[test]
    fn test_from_graphql_client_error() {
        let raw: graphql_client::Error = serde_json::from_value(serde_json::json!({
            "message": "Throttled",
            "locations": [{ "line": 2, "column": 3 }],
            "path": ["cart", "lines", 1]
        }))
        .unwrap_or_else(|e| panic!("fixture should parse: {e}"));

        let err = GraphQLError::from(raw);
        assert_eq!(err.message, "Throttled");
        assert_eq!(err.locations.len(), 1);
        assert_eq!(
            ShopifyError::GraphQL(vec![err]).to_string(),
            "GraphQL errors: Throttled path: cart.lines.1 at line 2:3"
        );
    }

    #[test]
    fn test_rate_limited_and_oauth_errors() {
        assert_eq!(
            ShopifyError::RateLimited(60).to_string(),
            "Rate limited, retry after 60 seconds"
        );
        assert_eq!(
            ShopifyError::OAuth("invalid_grant".to_string()).to_string(),
            "OAuth error: invalid_grant"
        );
    }
}
