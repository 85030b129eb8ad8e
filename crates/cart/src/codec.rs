//! Persisted text format of a cart.
//!
//! A cart is stored as a JSON array of line items in cart order:
//!
//! ```json
//! [
//!   {"productId": 1, "unitPrice": 1000.0, "quantity": 2,
//!    "name": "Linen tee", "imageRef": "/img/tee.jpg", "description": null}
//! ]
//! ```

use std::collections::HashMap;

use kaimono_core::ProductId;

use crate::item::CartLineItem;

/// Serialize line items in order.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode(items: &[CartLineItem]) -> Result<String, serde_json::Error> {
    serde_json::to_string(items)
}

/// Parse a persisted cart and restore the line-item invariants.
///
/// Records with a zero quantity or a negative unit price are dropped, and a
/// repeated product id is folded into its first occurrence (quantities
/// summed, first snapshot kept). A line whose total is not representable is
/// dropped after merging.
///
/// # Errors
///
/// Returns an error if `text` is not a JSON array of line items.
pub fn decode(text: &str) -> Result<Vec<CartLineItem>, serde_json::Error> {
    let raw: Vec<CartLineItem> = serde_json::from_str(text)?;
    Ok(normalize(raw))
}

fn normalize(raw: Vec<CartLineItem>) -> Vec<CartLineItem> {
    let mut items: Vec<CartLineItem> = Vec::with_capacity(raw.len());
    let mut positions: HashMap<ProductId, usize> = HashMap::with_capacity(raw.len());

    for item in raw {
        if item.quantity == 0 {
            tracing::debug!(product_id = %item.product_id, "Dropping persisted line with zero quantity");
            continue;
        }
        if item.unit_price.is_negative() {
            tracing::warn!(product_id = %item.product_id, unit_price = %item.unit_price, "Dropping persisted line with negative price");
            continue;
        }
        if let Some(existing) = positions.get(&item.product_id).and_then(|&pos| items.get_mut(pos)) {
            tracing::debug!(product_id = %item.product_id, "Merging duplicate persisted line");
            existing.quantity = existing.quantity.saturating_add(item.quantity);
            continue;
        }
        positions.insert(item.product_id, items.len());
        items.push(item);
    }

    items.retain(|item| {
        let representable = item.unit_price.checked_times(item.quantity).is_some();
        if !representable {
            tracing::warn!(product_id = %item.product_id, quantity = item.quantity, "Dropping persisted line whose total overflows");
        }
        representable
    });
    items
}
