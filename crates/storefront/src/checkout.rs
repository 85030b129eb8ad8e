//! Order placement from the cart.
//!
//! Checkout reads a snapshot of the cart, submits it with the shipping
//! details, and empties the cart only once the API has accepted the order.

use kaimono_cart::{CartLineItem, CartStore, KeyValueStore};
use tracing::{info, instrument, warn};

use crate::api::{ApiClient, Order, OrderItemRequest, OrderRequest};
use crate::auth::AuthSession;
use crate::error::{ApiError, Result};

/// Shipping details entered at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShippingInfo {
    pub name: String,
    pub phone: String,
    pub postal_code: String,
    pub prefecture: String,
    pub city: String,
    pub address1: String,
    /// Building, room number; optional.
    pub address2: Option<String>,
}

impl ShippingInfo {
    /// Check that every required field is filled in.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Invalid` naming the first blank field.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("name", &self.name),
            ("phone", &self.phone),
            ("postal code", &self.postal_code),
            ("prefecture", &self.prefecture),
            ("city", &self.city),
            ("address", &self.address1),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ApiError::Invalid(format!("shipping {field} is required")));
            }
        }
        Ok(())
    }

    /// Single-line postal address, e.g. `〒150-0001 東京都渋谷区神宮前1-2-3 101号室`.
    #[must_use]
    pub fn full_address(&self) -> String {
        let mut address = format!(
            "〒{} {}{}{}",
            self.postal_code.trim(),
            self.prefecture.trim(),
            self.city.trim(),
            self.address1.trim()
        );
        if let Some(extra) = self.address2.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            address.push(' ');
            address.push_str(extra);
        }
        address
    }
}

/// Build the order submission for the given cart lines.
#[must_use]
pub fn order_request(shipping: &ShippingInfo, items: &[CartLineItem]) -> OrderRequest {
    OrderRequest {
        shipping_name: shipping.name.trim().to_string(),
        shipping_phone: shipping.phone.trim().to_string(),
        shipping_address: shipping.full_address(),
        items: items
            .iter()
            .map(|item| OrderItemRequest {
                product_id: item.product_id,
                quantity: item.quantity,
                price: item.unit_price,
            })
            .collect(),
    }
}

/// Place an order for everything in the cart.
///
/// On success the cart is cleared and the created order returned. On any
/// failure the cart is left exactly as it was.
///
/// # Errors
///
/// Returns `ApiError::NotLoggedIn` without a session, `ApiError::EmptyCart`
/// for an empty cart, `ApiError::Invalid` for incomplete shipping details, or
/// whatever the API reported.
#[instrument(skip_all, fields(lines = cart.len(), total = %cart.total_price()))]
pub async fn place_order<C, A>(
    api: &ApiClient,
    session: &AuthSession<A>,
    cart: &mut CartStore<C>,
    shipping: &ShippingInfo,
) -> Result<Order>
where
    C: KeyValueStore,
    A: KeyValueStore,
{
    let token = session.token()?;
    if cart.is_empty() {
        return Err(ApiError::EmptyCart);
    }
    shipping.validate()?;

    let request = order_request(shipping, cart.items());

    match api.submit_order(token, &request).await {
        Ok(order) => {
            info!(order_id = %order.id, total = %order.total_amount, "Order placed");
            if order.total_amount != cart.total_price() {
                warn!(
                    cart_total = %cart.total_price(),
                    order_total = %order.total_amount,
                    "Order total differs from cart total"
                );
            }
            cart.clear();
            Ok(order)
        }
        Err(error) => {
            warn!(%error, "Order failed; cart kept");
            Err(error)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use kaimono_cart::{MemoryStore, ProductSnapshot};
    use kaimono_core::{Price, ProductId};

    use super::*;

    fn shipping() -> ShippingInfo {
        ShippingInfo {
            name: "佐藤 花子".to_string(),
            phone: "090-1234-5678".to_string(),
            postal_code: "150-0001".to_string(),
            prefecture: "東京都".to_string(),
            city: "渋谷区".to_string(),
            address1: "神宮前1-2-3".to_string(),
            address2: Some("101号室".to_string()),
        }
    }

    #[test]
    fn test_full_address() {
        assert_eq!(shipping().full_address(), "〒150-0001 東京都渋谷区神宮前1-2-3 101号室");

        let without_building = ShippingInfo {
            address2: Some("  ".to_string()),
            ..shipping()
        };
        assert_eq!(without_building.full_address(), "〒150-0001 東京都渋谷区神宮前1-2-3");
    }

    #[test]
    fn test_validate_names_blank_field() {
        assert!(shipping().validate().is_ok());

        let info = ShippingInfo {
            city: " ".to_string(),
            ..shipping()
        };
        let err = info.validate().unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: shipping city is required");
    }

    #[test]
    fn test_order_request_uses_cart_prices_in_order() {
        let mut cart = CartStore::open(MemoryStore::new());
        cart.add_item(&ProductSnapshot::new(ProductId::new(5), "Cap", Price::from(1000)), 2);
        cart.add_item(&ProductSnapshot::new(ProductId::new(2), "Belt", Price::from(500)), 3);

        let request = order_request(&shipping(), cart.items());

        assert_eq!(request.shipping_name, "佐藤 花子");
        assert_eq!(
            request.items,
            vec![
                OrderItemRequest {
                    product_id: ProductId::new(5),
                    quantity: 2,
                    price: Price::from(1000),
                },
                OrderItemRequest {
                    product_id: ProductId::new(2),
                    quantity: 3,
                    price: Price::from(500),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_place_order_requires_login() {
        let config = crate::config::StorefrontConfig::from_lookup(|_| None).unwrap();
        let api = ApiClient::new(&config).unwrap();
        let session = AuthSession::open(MemoryStore::new());
        let mut cart = CartStore::open(MemoryStore::new());
        cart.add_item(&ProductSnapshot::new(ProductId::new(1), "Cap", Price::from(1000)), 1);

        let err = place_order(&api, &session, &mut cart, &shipping()).await.unwrap_err();

        assert!(matches!(err, ApiError::NotLoggedIn));
        assert_eq!(cart.len(), 1);
    }

    #[tokio::test]
    async fn test_place_order_rejects_empty_cart() {
        let config = crate::config::StorefrontConfig::from_lookup(|_| None).unwrap();
        let api = ApiClient::new(&config).unwrap();
        let storage = MemoryStore::new();
        storage.set(crate::auth::TOKEN_STORAGE_KEY, "abc").unwrap();
        let session = AuthSession::open(storage);
        let mut cart = CartStore::open(MemoryStore::new());

        let err = place_order(&api, &session, &mut cart, &shipping()).await.unwrap_err();

        assert!(matches!(err, ApiError::EmptyCart));
    }
}
