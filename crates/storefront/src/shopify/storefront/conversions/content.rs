//! Layout, menu, page and policy conversion functions.

use crate::shopify::types::{
    Layout, Menu, MenuItem, Page, Policy, PolicyKind, Shop, ShopPolicies,
};

use super::super::fragments::{MenuData, MenuItemData, PageData, PolicyData};
use super::super::queries::{get_policies, layout};
use super::convert_seo;

/// Convert the layout query, rewriting menu links that point at the shop
/// itself into relative paths.
///
/// `extra_hosts` are additional hosts that count as the shop (the
/// `*.myshopify.com` store domain and the storefront's own public host).
pub fn convert_layout(data: layout::ResponseData, extra_hosts: &[String]) -> Layout {
    let mut internal_hosts = extra_hosts.to_vec();
    if let Some(host) = host_of(&data.shop.primary_domain.url) {
        internal_hosts.push(host);
    }

    Layout {
        shop: Shop {
            id: data.shop.id,
            name: data.shop.name,
            description: data.shop.description.filter(|d| !d.is_empty()),
            primary_domain_url: data.shop.primary_domain.url,
        },
        header_menu: data.header_menu.map(|m| convert_menu(m, &internal_hosts)),
        footer_menu: data.footer_menu.map(|m| convert_menu(m, &internal_hosts)),
    }
}

fn convert_menu(menu: MenuData, internal_hosts: &[String]) -> Menu {
    Menu {
        id: menu.id,
        handle: menu.handle,
        title: menu.title,
        items: menu
            .items
            .into_iter()
            .map(|item| convert_menu_item(item, internal_hosts))
            .collect(),
    }
}

fn convert_menu_item(item: MenuItemData, internal_hosts: &[String]) -> MenuItem {
    MenuItem {
        id: item.id,
        title: item.title,
        url: item
            .url
            .as_deref()
            .map_or_else(|| "#".to_string(), |url| relative_menu_url(url, internal_hosts)),
        kind: item.kind,
        items: item
            .items
            .into_iter()
            .map(|child| convert_menu_item(child, internal_hosts))
            .collect(),
    }
}

fn host_of(url: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
}

/// Strip scheme and host from links to the shop's own domains.
pub(crate) fn relative_menu_url(url: &str, internal_hosts: &[String]) -> String {
    let Ok(parsed) = url::Url::parse(url) else {
        // Already relative (or unparseable); leave as-is
        return url.to_string();
    };

    let is_internal = parsed.host_str().is_some_and(|host| {
        internal_hosts
            .iter()
            .any(|internal| internal.eq_ignore_ascii_case(host))
    });

    if !is_internal {
        return url.to_string();
    }

    let mut relative = parsed.path().to_string();
    if let Some(query) = parsed.query() {
        relative.push('?');
        relative.push_str(query);
    }
    if let Some(fragment) = parsed.fragment() {
        relative.push('#');
        relative.push_str(fragment);
    }
    relative
}

pub fn convert_page(page: PageData) -> Page {
    Page {
        id: page.id,
        handle: page.handle,
        title: page.title,
        body: page.body,
        body_summary: page.body_summary,
        seo: page.seo.map(convert_seo),
        updated_at: page.updated_at,
    }
}

/// Collect the configured policies in [`PolicyKind::ALL`] order.
///
/// Policies with an empty body count as not configured.
pub fn convert_policies(shop: get_policies::ShopPoliciesData) -> ShopPolicies {
    let get_policies::ShopPoliciesData {
        privacy_policy,
        shipping_policy,
        terms_of_service,
        refund_policy,
        subscription_policy,
    } = shop;

    let policies = [
        (PolicyKind::PrivacyPolicy, privacy_policy),
        (PolicyKind::ShippingPolicy, shipping_policy),
        (PolicyKind::TermsOfService, terms_of_service),
        (PolicyKind::RefundPolicy, refund_policy),
        (PolicyKind::SubscriptionPolicy, subscription_policy),
    ]
    .into_iter()
    .filter_map(|(kind, data)| data.map(|d| convert_policy(kind, d)))
    .filter(|policy| !policy.body.trim().is_empty())
    .collect();

    ShopPolicies { policies }
}

fn convert_policy(kind: PolicyKind, policy: PolicyData) -> Policy {
    Policy {
        id: policy.id,
        kind,
        title: policy.title,
        body: policy.body,
        url: policy.url,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn hosts() -> Vec<String> {
        vec![
            "shop.example.org".to_string(),
            "example.myshopify.com".to_string(),
        ]
    }

    #[test]
    fn test_relative_menu_url_internal() {
        assert_eq!(
            relative_menu_url("https://shop.example.org/collections/all?sort=price#top", &hosts()),
            "/collections/all?sort=price#top"
        );
        assert_eq!(
            relative_menu_url("https://EXAMPLE.myshopify.com/pages/about", &hosts()),
            "/pages/about"
        );
    }

    #[test]
    fn test_relative_menu_url_external_and_relative() {
        assert_eq!(
            relative_menu_url("https://instagram.com/canopy", &hosts()),
            "https://instagram.com/canopy"
        );
        assert_eq!(relative_menu_url("/search", &hosts()), "/search");
    }

    #[test]
    fn test_convert_layout_uses_primary_domain() {
        let data: layout::ResponseData = serde_json::from_value(serde_json::json!({
            "shop": {
                "id": "gid://shopify/Shop/1",
                "name": "Canopy",
                "description": "",
                "primaryDomain": { "url": "https://www.canopy.test" }
            },
            "headerMenu": {
                "id": "gid://shopify/Menu/1",
                "handle": "main-menu",
                "title": "Main menu",
                "items": [{
                    "id": "gid://shopify/MenuItem/1",
                    "title": "Shop",
                    "url": "https://www.canopy.test/collections/all",
                    "type": "COLLECTION",
                    "items": [{
                        "id": "gid://shopify/MenuItem/2",
                        "title": "Journal",
                        "url": "https://journal.example.net/",
                        "type": "HTTP",
                        "items": []
                    }]
                }]
            },
            "footerMenu": null
        }))
        .unwrap();

        let layout = convert_layout(data, &[]);
        assert_eq!(layout.shop.description, None);
        let header = layout.header_menu.unwrap();
        assert_eq!(header.items[0].url, "/collections/all");
        assert!(header.items[0].items[0].is_external());
        assert!(layout.footer_menu.is_none());
    }

    #[test]
    fn test_convert_policies_skips_unconfigured() {
        let data: get_policies::ShopPoliciesData = serde_json::from_value(serde_json::json!({
            "privacyPolicy": {
                "id": "gid://shopify/ShopPolicy/1",
                "handle": "privacy-policy",
                "title": "Privacy Policy",
                "body": "<p>We respect your privacy.</p>",
                "url": "https://example.myshopify.com/policies/privacy-policy"
            },
            "shippingPolicy": null,
            "termsOfService": null,
            "refundPolicy": null,
            "subscriptionPolicy": {
                "id": null,
                "handle": "subscription-policy",
                "title": "Subscription Policy",
                "body": "",
                "url": "https://example.myshopify.com/policies/subscription-policy"
            }
        }))
        .unwrap();

        let policies = convert_policies(data);
        assert_eq!(policies.policies.len(), 1);
        assert!(policies.get(PolicyKind::PrivacyPolicy).is_some());
        assert!(policies.get(PolicyKind::SubscriptionPolicy).is_none());
    }
}
