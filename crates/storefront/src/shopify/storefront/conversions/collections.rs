//! Collection type conversion functions.

use crate::shopify::types::{Collection, CollectionConnection, PageInfo};

use super::super::fragments::Connection;
use super::super::queries::{get_collection_by_handle, get_collections};
use super::{convert_image, convert_page_info, convert_product_card, convert_seo};

pub fn convert_collection(collection: get_collection_by_handle::CollectionData) -> Collection {
    Collection {
        id: collection.id,
        handle: collection.handle,
        title: collection.title,
        description: collection.description,
        description_html: collection.description_html,
        seo: collection.seo.map(convert_seo),
        image: collection.image.map(convert_image),
        products: collection
            .products
            .nodes
            .into_iter()
            .map(convert_product_card)
            .collect(),
        products_page_info: convert_page_info(collection.products.page_info),
    }
}

pub fn convert_collection_connection(
    connection: Connection<get_collections::CollectionSummaryData>,
) -> CollectionConnection {
    CollectionConnection {
        collections: connection
            .nodes
            .into_iter()
            .map(|c| Collection {
                id: c.id,
                handle: c.handle,
                title: c.title,
                description: c.description,
                description_html: c.description_html,
                seo: None,
                image: c.image.map(convert_image),
                products: vec![],
                products_page_info: PageInfo::default(),
            })
            .collect(),
        page_info: convert_page_info(connection.page_info),
    }
}
