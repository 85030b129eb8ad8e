//! Cart line items and the product snapshots they are created from.

use kaimono_core::{Price, ProductId};
use serde::{Deserialize, Serialize};

/// The denormalized view of a product handed to [`CartStore::add_item`].
///
/// Only the fields needed to render and total a cart line are kept; stock,
/// status and category stay with the ProductAPI.
///
/// [`CartStore::add_item`]: crate::CartStore::add_item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub image_url: Option<String>,
    pub description: Option<String>,
}

impl ProductSnapshot {
    /// Create a snapshot with no image or description.
    #[must_use]
    pub fn new(id: ProductId, name: impl Into<String>, price: Price) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            image_url: None,
            description: None,
        }
    }

    #[must_use]
    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// One product entry in the cart.
///
/// `unit_price` and the display fields are captured when the product is first
/// added and are never refreshed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub product_id: ProductId,
    pub unit_price: Price,
    /// Always at least 1 while the item is in a cart.
    pub quantity: u32,
    pub name: String,
    #[serde(default)]
    pub image_ref: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl CartLineItem {
    pub(crate) fn from_snapshot(snapshot: &ProductSnapshot, quantity: u32) -> Self {
        Self {
            product_id: snapshot.id,
            unit_price: snapshot.price,
            quantity,
            name: snapshot.name.clone(),
            image_ref: snapshot.image_url.clone(),
            description: snapshot.description.clone(),
        }
    }

    /// `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total() {
        let snapshot = ProductSnapshot::new(ProductId::new(3), "Wool scarf", Price::from(2400));
        let line = CartLineItem::from_snapshot(&snapshot, 3);
        assert_eq!(line.line_total(), Price::from(7200));
    }

    #[test]
    fn test_from_snapshot_copies_display_fields() {
        let snapshot = ProductSnapshot::new(ProductId::new(3), "Wool scarf", Price::from(2400))
            .with_image("/images/scarf.jpg")
            .with_description("Grey, 180cm");
        let line = CartLineItem::from_snapshot(&snapshot, 1);
        assert_eq!(line.product_id, ProductId::new(3));
        assert_eq!(line.image_ref.as_deref(), Some("/images/scarf.jpg"));
        assert_eq!(line.description.as_deref(), Some("Grey, 180cm"));
    }
}
