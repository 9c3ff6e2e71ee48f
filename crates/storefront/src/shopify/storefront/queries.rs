//! GraphQL operation definitions for the Shopify Storefront API.
//!
//! Each operation is a unit struct implementing [`GraphQLQuery`] plus a
//! snake_case module holding its document, `Variables` and `ResponseData`.

use graphql_client::{GraphQLQuery, QueryBody};

macro_rules! graphql_operation {
    ($operation:ident, $module:ident) => {
        pub struct $operation;

        impl GraphQLQuery for $operation {
            type Variables = $module::Variables;
            type ResponseData = $module::ResponseData;

            fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
                QueryBody {
                    variables,
                    query: $module::QUERY,
                    operation_name: stringify!($operation),
                }
            }
        }
    };
}

// =============================================================================
// Layout
// =============================================================================

graphql_operation!(Layout, layout);

pub mod layout {
    use serde::{Deserialize, Serialize};

    use super::super::fragments::{MenuData, ShopData};

    pub const QUERY: &str = concat!(
        "query Layout($headerMenuHandle: String!, $footerMenuHandle: String!) {
  shop { ...Shop }
  headerMenu: menu(handle: $headerMenuHandle) { ...Menu }
  footerMenu: menu(handle: $footerMenuHandle) { ...Menu }
}
",
        shop_fragment!(),
        menu_fragment!(),
        menu_item_fragment!(),
    );

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub header_menu_handle: String,
        pub footer_menu_handle: String,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub shop: ShopData,
        pub header_menu: Option<MenuData>,
        pub footer_menu: Option<MenuData>,
    }
}

graphql_operation!(ShopName, shop_name);

/// Minimal query used by the readiness probe.
pub mod shop_name {
    use serde::{Deserialize, Serialize};

    pub const QUERY: &str = "query ShopName { shop { name } }\n";

    #[derive(Debug, Serialize)]
    pub struct Variables;

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub shop: ShopNameData,
    }

    #[derive(Debug, Deserialize)]
    pub struct ShopNameData {
        pub name: String,
    }
}

// =============================================================================
// Products
// =============================================================================

graphql_operation!(GetProductByHandle, get_product_by_handle);

pub mod get_product_by_handle {
    use serde::{Deserialize, Serialize};

    use super::super::fragments::ProductData;

    pub const QUERY: &str = concat!(
        "query GetProductByHandle($handle: String!) {
  product(handle: $handle) { ...Product }
}
",
        product_fragment!(),
        product_card_fragment!(),
        product_variant_fragment!(),
        seo_fragment!(),
        image_fragment!(),
        money_fragment!(),
    );

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub handle: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub product: Option<ProductData>,
    }
}

graphql_operation!(GetProducts, get_products);

pub mod get_products {
    use serde::{Deserialize, Serialize};

    use super::super::fragments::{Connection, ProductCardData};
    use crate::shopify::types::ProductSortKey;

    pub const QUERY: &str = concat!(
        "query GetProducts($first: Int!, $after: String, $sortKey: ProductSortKeys, $reverse: Boolean) {
  products(first: $first, after: $after, sortKey: $sortKey, reverse: $reverse) {
    pageInfo { ...PageInfo }
    nodes { ...ProductCard }
  }
}
",
        product_card_fragment!(),
        page_info_fragment!(),
        image_fragment!(),
        money_fragment!(),
    );

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub first: i64,
        pub after: Option<String>,
        pub sort_key: Option<ProductSortKey>,
        pub reverse: Option<bool>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub products: Connection<ProductCardData>,
    }
}

graphql_operation!(GetProductsByHandles, get_products_by_handles);

pub mod get_products_by_handles {
    use serde::{Deserialize, Serialize};

    use super::super::fragments::{Nodes, ProductData};

    pub const QUERY: &str = concat!(
        "query GetProductsByHandles($first: Int!, $query: String!) {
  products(first: $first, query: $query) { nodes { ...Product } }
}
",
        product_fragment!(),
        product_card_fragment!(),
        product_variant_fragment!(),
        seo_fragment!(),
        image_fragment!(),
        money_fragment!(),
    );

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub first: i64,
        pub query: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub products: Nodes<ProductData>,
    }
}

graphql_operation!(GetProductRecommendations, get_product_recommendations);

pub mod get_product_recommendations {
    use serde::{Deserialize, Serialize};

    use super::super::fragments::ProductCardData;
    use crate::shopify::types::ProductRecommendationIntent;

    pub const QUERY: &str = concat!(
        "query GetProductRecommendations($productId: ID!, $intent: ProductRecommendationIntent) {
  productRecommendations(productId: $productId, intent: $intent) { ...ProductCard }
}
",
        product_card_fragment!(),
        image_fragment!(),
        money_fragment!(),
    );

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub product_id: String,
        pub intent: Option<ProductRecommendationIntent>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub product_recommendations: Option<Vec<ProductCardData>>,
    }
}

// =============================================================================
// Collections
// =============================================================================

graphql_operation!(GetCollectionByHandle, get_collection_by_handle);

pub mod get_collection_by_handle {
    use serde::{Deserialize, Serialize};

    use super::super::fragments::{Connection, ImageData, ProductCardData, SeoData};

    pub const QUERY: &str = concat!(
        "query GetCollectionByHandle($handle: String!, $first: Int!, $after: String) {
  collection(handle: $handle) {
    id handle title description descriptionHtml
    seo { ...Seo }
    image { ...Image }
    products(first: $first, after: $after) {
      pageInfo { ...PageInfo }
      nodes { ...ProductCard }
    }
  }
}
",
        product_card_fragment!(),
        page_info_fragment!(),
        seo_fragment!(),
        image_fragment!(),
        money_fragment!(),
    );

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub handle: String,
        pub first: i64,
        pub after: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub collection: Option<CollectionData>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CollectionData {
        pub id: String,
        pub handle: String,
        pub title: String,
        pub description: String,
        pub description_html: String,
        pub seo: Option<SeoData>,
        pub image: Option<ImageData>,
        pub products: Connection<ProductCardData>,
    }
}

graphql_operation!(GetCollections, get_collections);

pub mod get_collections {
    use serde::{Deserialize, Serialize};

    use super::super::fragments::{Connection, ImageData};

    pub const QUERY: &str = concat!(
        "query GetCollections($first: Int!, $after: String) {
  collections(first: $first, after: $after, sortKey: TITLE) {
    pageInfo { ...PageInfo }
    nodes { id handle title description descriptionHtml image { ...Image } }
  }
}
",
        page_info_fragment!(),
        image_fragment!(),
    );

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub first: i64,
        pub after: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub collections: Connection<CollectionSummaryData>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CollectionSummaryData {
        pub id: String,
        pub handle: String,
        pub title: String,
        pub description: String,
        pub description_html: String,
        pub image: Option<ImageData>,
    }
}

// =============================================================================
// Content
// =============================================================================

graphql_operation!(GetPageByHandle, get_page_by_handle);

pub mod get_page_by_handle {
    use serde::{Deserialize, Serialize};

    use super::super::fragments::PageData;

    pub const QUERY: &str = concat!(
        "query GetPageByHandle($handle: String!) {
  page(handle: $handle) { ...Page }
}
",
        page_fragment!(),
        seo_fragment!(),
    );

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub handle: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub page: Option<PageData>,
    }
}

graphql_operation!(GetPolicies, get_policies);

pub mod get_policies {
    use serde::{Deserialize, Serialize};

    use super::super::fragments::PolicyData;

    // subscriptionPolicy is a ShopPolicyWithDefault, so it cannot use the
    // ShopPolicy fragment.
    pub const QUERY: &str = concat!(
        "query GetPolicies {
  shop {
    privacyPolicy { ...Policy }
    shippingPolicy { ...Policy }
    termsOfService { ...Policy }
    refundPolicy { ...Policy }
    subscriptionPolicy { id handle title body url }
  }
}
",
        policy_fragment!(),
    );

    #[derive(Debug, Serialize)]
    pub struct Variables;

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub shop: ShopPoliciesData,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ShopPoliciesData {
        pub privacy_policy: Option<PolicyData>,
        pub shipping_policy: Option<PolicyData>,
        pub terms_of_service: Option<PolicyData>,
        pub refund_policy: Option<PolicyData>,
        pub subscription_policy: Option<PolicyData>,
    }
}

// =============================================================================
// Search
// =============================================================================

graphql_operation!(Search, search);

pub mod search {
    use serde::{Deserialize, Serialize};

    use super::super::fragments::SearchConnectionData;

    pub const QUERY: &str = concat!(
        "query Search($term: String!, $first: Int!, $after: String) {
  search(query: $term, first: $first, after: $after, types: [PRODUCT, PAGE, ARTICLE], unavailableProducts: LAST) {
    totalCount
    pageInfo { ...PageInfo }
    nodes { ...SearchProduct ...SearchPage ...SearchArticle }
  }
}
",
        search_product_fragment!(),
        search_page_fragment!(),
        search_article_fragment!(),
        product_card_fragment!(),
        page_info_fragment!(),
        image_fragment!(),
        money_fragment!(),
    );

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub term: String,
        pub first: i64,
        pub after: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub search: SearchConnectionData,
    }
}

graphql_operation!(PredictiveSearch, predictive_search);

pub mod predictive_search {
    use serde::{Deserialize, Serialize};

    use super::super::fragments::PredictiveSearchData;

    pub const QUERY: &str = concat!(
        "query PredictiveSearch($term: String!, $limit: Int!) {
  predictiveSearch(query: $term, limit: $limit, limitScope: EACH, types: [PRODUCT, COLLECTION, PAGE, QUERY]) {
    products { ...PredictiveProduct }
    collections { ...PredictiveCollection }
    pages { ...PredictivePage }
    queries { ...PredictiveQuery }
  }
}
",
        predictive_product_fragment!(),
        predictive_collection_fragment!(),
        predictive_page_fragment!(),
        predictive_query_fragment!(),
        image_fragment!(),
        money_fragment!(),
    );

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub term: String,
        pub limit: i64,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub predictive_search: Option<PredictiveSearchData>,
    }
}

// =============================================================================
// Cart
// =============================================================================

/// Input types shared by the cart mutations.
pub mod cart_inputs {
    use serde::Serialize;

    #[derive(Debug, Serialize)]
    pub struct AttributeInput {
        pub key: String,
        pub value: String,
    }

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartLineInput {
        pub merchandise_id: String,
        pub quantity: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub attributes: Option<Vec<AttributeInput>>,
    }

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartLineUpdateInput {
        pub id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub quantity: Option<i64>,
    }

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartBuyerIdentityInput {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub customer_access_token: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub email: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub country_code: Option<String>,
    }

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartInput {
        pub lines: Vec<CartLineInput>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub note: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub buyer_identity: Option<CartBuyerIdentityInput>,
    }
}

/// Declares a cart mutation whose payload field returns `{ cart userErrors }`.
macro_rules! cart_mutation {
    ($operation:ident, $module:ident, $field:literal, $signature:literal, $call:literal, { $($var:ident : $ty:ty),* $(,)? }) => {
        graphql_operation!($operation, $module);

        pub mod $module {
            use serde::{Deserialize, Serialize};

            #[allow(unused_imports)]
            use super::cart_inputs::*;
            use super::super::fragments::CartPayloadData;

            pub const QUERY: &str = concat!(
                "mutation ", stringify!($operation), $signature, " {\n  ", $call,
                " { cart { ...Cart } userErrors { code field message } }\n}\n",
                cart_fragment!(),
                cart_line_fragment!(),
                image_fragment!(),
                money_fragment!(),
            );

            #[derive(Debug, Serialize)]
            #[serde(rename_all = "camelCase")]
            pub struct Variables {
                $(pub $var: $ty,)*
            }

            #[derive(Debug, Deserialize)]
            pub struct ResponseData {
                #[serde(rename = $field)]
                pub payload: Option<CartPayloadData>,
            }
        }
    };
}

cart_mutation!(
    CreateCart,
    create_cart,
    "cartCreate",
    "($input: CartInput!)",
    "cartCreate(input: $input)",
    { input: CartInput }
);

cart_mutation!(
    AddToCart,
    add_to_cart,
    "cartLinesAdd",
    "($cartId: ID!, $lines: [CartLineInput!]!)",
    "cartLinesAdd(cartId: $cartId, lines: $lines)",
    { cart_id: String, lines: Vec<CartLineInput> }
);

cart_mutation!(
    UpdateCartLines,
    update_cart_lines,
    "cartLinesUpdate",
    "($cartId: ID!, $lines: [CartLineUpdateInput!]!)",
    "cartLinesUpdate(cartId: $cartId, lines: $lines)",
    { cart_id: String, lines: Vec<CartLineUpdateInput> }
);

cart_mutation!(
    RemoveFromCart,
    remove_from_cart,
    "cartLinesRemove",
    "($cartId: ID!, $lineIds: [ID!]!)",
    "cartLinesRemove(cartId: $cartId, lineIds: $lineIds)",
    { cart_id: String, line_ids: Vec<String> }
);

cart_mutation!(
    UpdateCartDiscountCodes,
    update_cart_discount_codes,
    "cartDiscountCodesUpdate",
    "($cartId: ID!, $discountCodes: [String!]!)",
    "cartDiscountCodesUpdate(cartId: $cartId, discountCodes: $discountCodes)",
    { cart_id: String, discount_codes: Vec<String> }
);

cart_mutation!(
    UpdateCartNote,
    update_cart_note,
    "cartNoteUpdate",
    "($cartId: ID!, $note: String!)",
    "cartNoteUpdate(cartId: $cartId, note: $note)",
    { cart_id: String, note: String }
);

cart_mutation!(
    UpdateCartBuyerIdentity,
    update_cart_buyer_identity,
    "cartBuyerIdentityUpdate",
    "($cartId: ID!, $buyerIdentity: CartBuyerIdentityInput!)",
    "cartBuyerIdentityUpdate(cartId: $cartId, buyerIdentity: $buyerIdentity)",
    { cart_id: String, buyer_identity: CartBuyerIdentityInput }
);

graphql_operation!(GetCart, get_cart);

pub mod get_cart {
    use serde::{Deserialize, Serialize};

    use super::super::fragments::CartData;

    pub const QUERY: &str = concat!(
        "query GetCart($cartId: ID!) {
  cart(id: $cartId) { ...Cart }
}
",
        cart_fragment!(),
        cart_line_fragment!(),
        image_fragment!(),
        money_fragment!(),
    );

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub cart: Option<CartData>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Names of fragments a document defines and spreads.
    fn fragment_usage(document: &str) -> (Vec<&str>, Vec<&str>) {
        let defined = document
            .split("fragment ")
            .skip(1)
            .filter_map(|rest| rest.split_whitespace().next())
            .collect::<Vec<_>>();
        let spread = document
            .split("...")
            .skip(1)
            .filter_map(|rest| rest.split_whitespace().next())
            .filter(|name| *name != "on")
            .collect::<Vec<_>>();
        (defined, spread)
    }

    fn assert_fragments_balanced(document: &str) {
        let (defined, spread) = fragment_usage(document);
        for name in &spread {
            assert!(
                defined.contains(name),
                "fragment {name} is spread but not defined in:\n{document}"
            );
        }
        for name in &defined {
            assert!(
                spread.contains(name),
                "fragment {name} is defined but never spread in:\n{document}"
            );
        }
        let mut unique = defined.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), defined.len(), "duplicate fragment in:\n{document}");
    }

    #[test]
    fn test_documents_define_exactly_the_fragments_they_spread() {
        for document in [
            layout::QUERY,
            shop_name::QUERY,
            get_product_by_handle::QUERY,
            get_products::QUERY,
            get_products_by_handles::QUERY,
            get_product_recommendations::QUERY,
            get_collection_by_handle::QUERY,
            get_collections::QUERY,
            get_page_by_handle::QUERY,
            get_policies::QUERY,
            search::QUERY,
            predictive_search::QUERY,
            create_cart::QUERY,
            add_to_cart::QUERY,
            update_cart_lines::QUERY,
            remove_from_cart::QUERY,
            update_cart_discount_codes::QUERY,
            update_cart_note::QUERY,
            update_cart_buyer_identity::QUERY,
            get_cart::QUERY,
        ] {
            assert_fragments_balanced(document);
        }
    }

    #[test]
    fn test_build_query_uses_operation_name() {
        let body = GetProductByHandle::build_query(get_product_by_handle::Variables {
            handle: "linen-shirt".to_string(),
        });
        assert_eq!(body.operation_name, "GetProductByHandle");
        assert!(body.query.starts_with("query GetProductByHandle("));

        let body = AddToCart::build_query(add_to_cart::Variables {
            cart_id: "gid://shopify/Cart/1".to_string(),
            lines: vec![],
        });
        assert_eq!(body.operation_name, "AddToCart");
        assert!(body.query.starts_with("mutation AddToCart($cartId: ID!"));
        assert!(body.query.contains("cartLinesAdd(cartId: $cartId, lines: $lines)"));
    }

    #[test]
    fn test_cart_variables_serialize_camel_case() {
        let variables = create_cart::Variables {
            input: cart_inputs::CartInput {
                lines: vec![cart_inputs::CartLineInput {
                    merchandise_id: "gid://shopify/ProductVariant/1".to_string(),
                    quantity: 2,
                    attributes: None,
                }],
                note: None,
                buyer_identity: Some(cart_inputs::CartBuyerIdentityInput {
                    customer_access_token: Some("token".to_string()),
                    email: None,
                    country_code: None,
                }),
            },
        };
        let json = serde_json::to_value(&variables).unwrap_or_default();
        assert_eq!(
            json,
            serde_json::json!({
                "input": {
                    "lines": [{ "merchandiseId": "gid://shopify/ProductVariant/1", "quantity": 2 }],
                    "buyerIdentity": { "customerAccessToken": "token" }
                }
            })
        );
    }
}
