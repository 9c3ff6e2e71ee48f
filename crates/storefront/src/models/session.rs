//! Session-related types.
//!
//! Values stored in the session for carts, comparison and customer login.

use canopy_core::Handle;
use serde::{Deserialize, Serialize};

/// Maximum number of products that can be compared side by side.
pub const MAX_COMPARE: usize = 4;

/// Product handles the visitor has picked for comparison, in the order added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareList {
    handles: Vec<String>,
}

impl CompareList {
    /// Build a list from raw handles.
    ///
    /// Invalid handles are dropped, duplicates keep their first position and
    /// the list is capped at [`MAX_COMPARE`].
    #[must_use]
    pub fn from_raw<'a>(raw: impl IntoIterator<Item = &'a str>) -> Self {
        let mut list = Self::default();
        for handle in raw {
            list.add(handle.trim());
        }
        list
    }

    /// Parse a comma-separated `handles` query parameter.
    #[must_use]
    pub fn from_param(param: &str) -> Self {
        Self::from_raw(param.split(','))
    }

    /// Add a handle. Returns `false` if it was invalid, already present, or
    /// the list is full.
    pub fn add(&mut self, raw: &str) -> bool {
        let Ok(handle) = Handle::parse(raw) else {
            return false;
        };
        if self.handles.len() >= MAX_COMPARE || self.contains(handle.as_str()) {
            return false;
        }
        self.handles.push(handle.into_inner());
        true
    }

    pub fn remove(&mut self, handle: &str) {
        self.handles.retain(|h| h != handle);
    }

    #[must_use]
    pub fn contains(&self, handle: &str) -> bool {
        self.handles.iter().any(|h| h == handle)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// The handles as validated [`Handle`]s.
    #[must_use]
    pub fn handles(&self) -> Vec<Handle> {
        self.handles
            .iter()
            .filter_map(|h| Handle::parse(h).ok())
            .collect()
    }

    /// Comma-separated form, as used in `/compare?handles=`.
    #[must_use]
    pub fn to_param(&self) -> String {
        self.handles.join(",")
    }
}

/// Session keys for storefront state.
pub mod keys {
    /// Key for storing the Shopify cart ID.
    pub const CART_ID: &str = "cart_id";

    /// Key for the product comparison list.
    pub const COMPARE_HANDLES: &str = "compare_handles";

    /// Key for Shopify OAuth state (CSRF protection).
    pub const OAUTH_STATE: &str = "oauth_state";

    /// Key for Shopify OAuth nonce (`OpenID` Connect replay protection).
    pub const OAUTH_NONCE: &str = "oauth_nonce";

    /// Key for the PKCE code verifier of an in-flight login.
    pub const OAUTH_VERIFIER: &str = "oauth_verifier";

    /// Key for Shopify customer access token.
    pub const CUSTOMER_TOKEN: &str = "customer_token";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_param_dedupes_and_drops_invalid() {
        let list = CompareList::from_param("linen-shirt, Bad Handle,linen-shirt,,wool-coat");
        assert_eq!(list.to_param(), "linen-shirt,wool-coat");
    }

    #[test]
    fn test_capped_at_max() {
        let list = CompareList::from_param("a,b,c,d,e,f");
        assert_eq!(list.len(), MAX_COMPARE);
        assert_eq!(list.to_param(), "a,b,c,d");
    }

    #[test]
    fn test_add_and_remove() {
        let mut list = CompareList::default();
        assert!(list.add("linen-shirt"));
        assert!(!list.add("linen-shirt"));
        assert!(!list.add("../etc"));
        assert!(list.contains("linen-shirt"));

        list.remove("linen-shirt");
        assert!(list.is_empty());
    }
}
