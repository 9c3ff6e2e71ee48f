//! Cart type conversion functions.
//!
//! Every cart query and mutation selects the same `Cart` fragment, so one
//! conversion covers them all.

use crate::shopify::types::{
    Attribute, Cart, CartBuyerIdentity, CartCost, CartDiscountCode, CartLine, CartLineCost,
    CartMerchandise, CartMerchandiseProduct, CartUserError, SelectedOption,
};

use super::super::fragments::{CartData, CartLineData, CartUserErrorData};
use super::{convert_image, convert_money};

pub fn convert_cart(cart: CartData) -> Cart {
    Cart {
        id: cart.id,
        checkout_url: cart.checkout_url,
        note: cart.note.filter(|note| !note.is_empty()),
        total_quantity: cart.total_quantity,
        buyer_identity: cart.buyer_identity.map(|b| CartBuyerIdentity {
            email: b.email,
            country_code: b.country_code,
            customer_id: b.customer.map(|c| c.id),
        }),
        cost: CartCost {
            subtotal: convert_money(cart.cost.subtotal_amount),
            total: convert_money(cart.cost.total_amount),
        },
        discount_codes: cart
            .discount_codes
            .into_iter()
            .map(|d| CartDiscountCode {
                code: d.code,
                applicable: d.applicable,
            })
            .collect(),
        lines: cart.lines.nodes.into_iter().map(convert_cart_line).collect(),
    }
}

fn convert_cart_line(line: CartLineData) -> CartLine {
    let merchandise = line.merchandise;

    CartLine {
        id: line.id,
        quantity: line.quantity,
        attributes: line
            .attributes
            .into_iter()
            .map(|a| Attribute {
                key: a.key,
                value: a.value,
            })
            .collect(),
        cost: CartLineCost {
            amount_per_quantity: convert_money(line.cost.amount_per_quantity),
            compare_at_amount_per_quantity: line
                .cost
                .compare_at_amount_per_quantity
                .map(convert_money),
            subtotal_amount: convert_money(line.cost.subtotal_amount),
            total_amount: convert_money(line.cost.total_amount),
        },
        merchandise: CartMerchandise {
            id: merchandise.id,
            title: merchandise.title,
            available_for_sale: merchandise.available_for_sale,
            price: convert_money(merchandise.price),
            selected_options: merchandise
                .selected_options
                .into_iter()
                .map(|o| SelectedOption {
                    name: o.name,
                    value: o.value,
                })
                .collect(),
            image: merchandise.image.map(convert_image),
            product: CartMerchandiseProduct {
                id: merchandise.product.id,
                handle: merchandise.product.handle,
                title: merchandise.product.title,
                vendor: merchandise.product.vendor,
                featured_image: merchandise.product.featured_image.map(convert_image),
            },
        },
    }
}

pub fn convert_cart_user_errors(errors: Vec<CartUserErrorData>) -> Vec<CartUserError> {
    errors
        .into_iter()
        .map(|e| CartUserError {
            code: e.code,
            field: e.field,
            message: e.message,
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_cart() {
        let data: CartData = serde_json::from_value(serde_json::json!({
            "id": "gid://shopify/Cart/abc",
            "checkoutUrl": "https://shop.example.org/cart/c/abc",
            "note": "",
            "totalQuantity": 2,
            "buyerIdentity": { "email": null, "countryCode": "US", "customer": null },
            "cost": {
                "subtotalAmount": { "amount": "80.0", "currencyCode": "USD" },
                "totalAmount": { "amount": "80.0", "currencyCode": "USD" }
            },
            "discountCodes": [{ "code": "SUMMER", "applicable": false }],
            "lines": { "nodes": [{
                "id": "gid://shopify/CartLine/1",
                "quantity": 2,
                "attributes": [],
                "cost": {
                    "amountPerQuantity": { "amount": "40.0", "currencyCode": "USD" },
                    "compareAtAmountPerQuantity": null,
                    "subtotalAmount": { "amount": "80.0", "currencyCode": "USD" },
                    "totalAmount": { "amount": "80.0", "currencyCode": "USD" }
                },
                "merchandise": {
                    "id": "gid://shopify/ProductVariant/1",
                    "title": "M",
                    "availableForSale": true,
                    "price": { "amount": "40.0", "currencyCode": "USD" },
                    "selectedOptions": [{ "name": "Size", "value": "M" }],
                    "image": null,
                    "product": {
                        "id": "gid://shopify/Product/1",
                        "handle": "linen-shirt",
                        "title": "Linen Shirt",
                        "vendor": "Canopy",
                        "featuredImage": null
                    }
                }
            }]}
        }))
        .unwrap();

        let cart = convert_cart(data);
        assert_eq!(cart.total_quantity, 2);
        assert_eq!(cart.note, None);
        assert_eq!(cart.lines[0].merchandise.product.handle, "linen-shirt");
        assert_eq!(cart.cost.total.display(), "$80.00");
        assert!(!cart.discount_codes[0].applicable);
        assert!(!cart.is_empty());
    }
}
