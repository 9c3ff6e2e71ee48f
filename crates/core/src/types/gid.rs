//! Shopify global IDs.
//!
//! Every node in the Storefront and Customer Account APIs is addressed by a
//! global ID of the form `gid://shopify/<Resource>/<id>`. Routes expose only
//! the trailing id (`/account/orders/12345`) and rebuild the gid when
//! querying.

use core::fmt;

use serde::{Deserialize, Serialize};

const GID_PREFIX: &str = "gid://shopify/";

/// Errors that can occur when parsing a [`ShopifyGid`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GidError {
    /// The input does not start with `gid://shopify/`.
    #[error("global id must start with gid://shopify/")]
    MissingPrefix,
    /// The resource segment is missing or not alphabetic.
    #[error("global id has an invalid resource segment")]
    InvalidResource,
    /// The id segment is missing or contains a `/`.
    #[error("global id has an invalid id segment")]
    InvalidId,
}

/// A Shopify global ID.
///
/// A trailing query string (the Customer Account API appends
/// `?key=...` to order ids) is preserved when displaying but is not part of
/// [`ShopifyGid::id`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShopifyGid {
    resource: String,
    id: String,
    query: Option<String>,
}

impl ShopifyGid {
    /// Build a gid for a resource and id.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource is not alphabetic or the id is empty
    /// or contains `/` or `?`.
    pub fn new(resource: &str, id: &str) -> Result<Self, GidError> {
        validate_resource(resource)?;
        validate_id(id)?;
        Ok(Self {
            resource: resource.to_string(),
            id: id.to_string(),
            query: None,
        })
    }

    /// Parse a full `gid://shopify/...` string.
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix, resource, or id segment is invalid.
    pub fn parse(s: &str) -> Result<Self, GidError> {
        let rest = s.strip_prefix(GID_PREFIX).ok_or(GidError::MissingPrefix)?;
        let (resource, tail) = rest.split_once('/').ok_or(GidError::InvalidId)?;
        validate_resource(resource)?;

        let (id, query) = match tail.split_once('?') {
            Some((id, query)) => (id, Some(query.to_string())),
            None => (tail, None),
        };
        validate_id(id)?;

        Ok(Self {
            resource: resource.to_string(),
            id: id.to_string(),
            query,
        })
    }

    /// Resource type (e.g., `Order`, `Product`).
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Trailing id without any query string.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

fn validate_resource(resource: &str) -> Result<(), GidError> {
    if resource.is_empty() || !resource.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(GidError::InvalidResource);
    }
    Ok(())
}

fn validate_id(id: &str) -> Result<(), GidError> {
    if id.is_empty() || id.contains('/') || id.contains('?') {
        return Err(GidError::InvalidId);
    }
    Ok(())
}

impl fmt::Display for ShopifyGid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{GID_PREFIX}{}/{}", self.resource, self.id)?;
        if let Some(query) = &self.query {
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for ShopifyGid {
    type Err = GidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ShopifyGid {
    type Error = GidError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ShopifyGid> for String {
    fn from(gid: ShopifyGid) -> Self {
        gid.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_order_gid() {
        let gid = ShopifyGid::parse("gid://shopify/Order/5678").unwrap();
        assert_eq!(gid.resource(), "Order");
        assert_eq!(gid.id(), "5678");
        assert_eq!(gid.to_string(), "gid://shopify/Order/5678");
    }

    #[test]
    fn test_parse_keeps_query_for_display() {
        let gid = ShopifyGid::parse("gid://shopify/Order/5678?key=abc").unwrap();
        assert_eq!(gid.id(), "5678");
        assert_eq!(gid.to_string(), "gid://shopify/Order/5678?key=abc");
    }

    #[test]
    fn test_new_round_trips() {
        let gid = ShopifyGid::new("CustomerAddress", "42").unwrap();
        assert_eq!(ShopifyGid::parse(&gid.to_string()).unwrap(), gid);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(ShopifyGid::parse("Order/1"), Err(GidError::MissingPrefix));
        assert_eq!(
            ShopifyGid::parse("gid://shopify/Order"),
            Err(GidError::InvalidId)
        );
        assert_eq!(
            ShopifyGid::parse("gid://shopify/Ord3r/1"),
            Err(GidError::InvalidResource)
        );
        assert_eq!(
            ShopifyGid::parse("gid://shopify/Order/1/2"),
            Err(GidError::InvalidId)
        );
    }

    #[test]
    fn test_new_rejects_path_injection() {
        assert_eq!(ShopifyGid::new("Order", "1/../2"), Err(GidError::InvalidId));
        assert_eq!(ShopifyGid::new("Order", ""), Err(GidError::InvalidId));
    }
}
