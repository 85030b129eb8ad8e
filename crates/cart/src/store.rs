//! The cart state manager.
//!
//! [`CartStore`] owns the authoritative in-memory cart. It is loaded once from
//! its storage slot when opened, and every mutation is written straight back
//! (write-through). Storage problems never reach the caller: a slot that
//! cannot be parsed opens as an empty cart, and a failed write leaves the
//! in-memory cart in charge for the rest of the session.

use core::fmt;

use kaimono_core::{Price, ProductId};
use tracing::{debug, warn};

use crate::codec;
use crate::item::{CartLineItem, ProductSnapshot};
use crate::storage::{CART_STORAGE_KEY, KeyValueStore};

/// A successful cart mutation, delivered to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartEvent {
    /// A new line item was appended.
    ItemAdded { product_id: ProductId, quantity: u32 },
    /// An existing line item's quantity was increased; `quantity` is the new total.
    ItemMerged { product_id: ProductId, quantity: u32 },
    /// A line item was removed.
    ItemRemoved { product_id: ProductId },
    /// A line item's quantity was overwritten.
    QuantityChanged { product_id: ProductId, quantity: u32 },
    /// The cart was emptied.
    Cleared,
}

/// Handle returned by [`CartStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn Fn(&CartEvent, &[CartLineItem]) + Send + Sync>;

/// In-memory cart mirrored to a durable key-value slot.
///
/// Construct one per application with [`CartStore::open`] and pass it by
/// reference to whatever needs the cart.
pub struct CartStore<S: KeyValueStore> {
    storage: S,
    items: Vec<CartLineItem>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
    last_flush_failed: bool,
}

impl<S: KeyValueStore> CartStore<S> {
    /// Open the cart, loading whatever was last flushed to `storage`.
    ///
    /// A missing, unreadable or malformed slot yields an empty cart.
    pub fn open(storage: S) -> Self {
        let items = load(&storage);
        debug!(lines = items.len(), "Cart loaded");
        Self {
            storage,
            items,
            listeners: Vec::new(),
            next_subscription: 0,
            last_flush_failed: false,
        }
    }

    /// Add `quantity` units of a product.
    ///
    /// If the product is already in the cart only its quantity grows (the
    /// snapshot taken on first add is kept). A quantity of 0 is treated as 1.
    pub fn add_item(&mut self, product: &ProductSnapshot, quantity: u32) {
        let quantity = quantity.max(1);

        let event = if let Some(existing) = self.find_mut(product.id) {
            existing.quantity = existing.quantity.saturating_add(quantity);
            CartEvent::ItemMerged {
                product_id: product.id,
                quantity: existing.quantity,
            }
        } else {
            self.items.push(CartLineItem::from_snapshot(product, quantity));
            CartEvent::ItemAdded {
                product_id: product.id,
                quantity,
            }
        };

        debug!(product_id = %product.id, quantity, "Added to cart");
        self.commit(&event);
    }

    /// Remove a product's line item. Removing an absent product does nothing.
    pub fn remove_item(&mut self, product_id: ProductId) {
        let before = self.items.len();
        self.items.retain(|item| item.product_id != product_id);
        if self.items.len() == before {
            return;
        }

        debug!(%product_id, "Removed from cart");
        self.commit(&CartEvent::ItemRemoved { product_id });
    }

    /// Overwrite a product's quantity; 0 removes the line item.
    ///
    /// Never creates a line item: setting the quantity of a product that is
    /// not in the cart does nothing.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: u32) {
        if quantity == 0 {
            self.remove_item(product_id);
            return;
        }

        let Some(existing) = self.find_mut(product_id) else {
            return;
        };
        existing.quantity = quantity;

        debug!(%product_id, quantity, "Cart quantity updated");
        self.commit(&CartEvent::QuantityChanged {
            product_id,
            quantity,
        });
    }

    /// Empty the cart. Always flushes, even if it was already empty.
    pub fn clear(&mut self) {
        self.items.clear();
        debug!("Cart cleared");
        self.commit(&CartEvent::Cleared);
    }

    /// Sum of quantities across all line items.
    #[must_use]
    pub fn total_item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of `unit_price * quantity` using the prices captured at add time.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.items.iter().map(CartLineItem::line_total).sum()
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    #[must_use]
    pub fn get(&self, product_id: ProductId) -> Option<&CartLineItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the most recent flush failed to reach storage.
    #[must_use]
    pub const fn last_flush_failed(&self) -> bool {
        self.last_flush_failed
    }

    /// The storage provider this cart flushes to.
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Register `callback` to run after every successful mutation.
    ///
    /// Callbacks receive the event and the line items after the mutation.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&CartEvent, &[CartLineItem]) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(callback)));
        id
    }

    /// Drop a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    fn find_mut(&mut self, product_id: ProductId) -> Option<&mut CartLineItem> {
        self.items
            .iter_mut()
            .find(|item| item.product_id == product_id)
    }

    fn commit(&mut self, event: &CartEvent) {
        self.flush();
        for (_, listener) in &self.listeners {
            listener(event, &self.items);
        }
    }

    /// Write the full cart to storage, swallowing failures.
    fn flush(&mut self) {
        let result = codec::encode(&self.items)
            .map_err(|e| e.to_string())
            .and_then(|text| {
                self.storage
                    .set(CART_STORAGE_KEY, &text)
                    .map_err(|e| e.to_string())
            });

        match result {
            Ok(()) => self.last_flush_failed = false,
            Err(error) => {
                warn!(%error, "Failed to persist cart; keeping in-memory state");
                self.last_flush_failed = true;
            }
        }
    }
}

impl<S: KeyValueStore + fmt::Debug> fmt::Debug for CartStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartStore")
            .field("storage", &self.storage)
            .field("items", &self.items)
            .field("listeners", &self.listeners.len())
            .field("last_flush_failed", &self.last_flush_failed)
            .finish()
    }
}

fn load<S: KeyValueStore>(storage: &S) -> Vec<CartLineItem> {
    let text = match storage.get(CART_STORAGE_KEY) {
        Ok(Some(text)) => text,
        Ok(None) => return Vec::new(),
        Err(error) => {
            warn!(%error, "Failed to read persisted cart; starting empty");
            return Vec::new();
        }
    };

    codec::decode(&text).unwrap_or_else(|error| {
        warn!(%error, "Discarding malformed persisted cart");
        Vec::new()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::storage::{MemoryStore, StorageError};

    fn product(id: i32, name: &str, price: i64) -> ProductSnapshot {
        ProductSnapshot::new(ProductId::new(id), name, Price::from(price))
            .with_image(format!("/images/{id}.jpg"))
    }

    fn open() -> CartStore<MemoryStore> {
        CartStore::open(MemoryStore::new())
    }

    #[test]
    fn test_new_cart_is_empty() {
        let cart = open();
        assert!(cart.is_empty());
        assert_eq!(cart.total_item_count(), 0);
        assert_eq!(cart.total_price(), Price::ZERO);
    }

    #[test]
    fn test_repeated_adds_merge_into_one_line() {
        let mut cart = open();
        let tee = product(1, "Linen tee", 1000);
        for quantity in [1, 4, 2, 3] {
            cart.add_item(&tee, quantity);
        }
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(tee.id).unwrap().quantity, 10);
    }

    #[test]
    fn test_merge_keeps_first_snapshot() {
        let mut cart = open();
        cart.add_item(&product(1, "Linen tee", 1000), 2);
        let repriced = product(1, "Linen tee (sale)", 800).with_description("Now cheaper");
        cart.add_item(&repriced, 3);

        let line = cart.get(ProductId::new(1)).unwrap();
        assert_eq!(line.quantity, 5);
        assert_eq!(line.name, "Linen tee");
        assert_eq!(line.unit_price, Price::from(1000));
        assert_eq!(line.description, None);
    }

    #[test]
    fn test_add_preserves_insertion_order() {
        let mut cart = open();
        cart.add_item(&product(3, "C", 100), 1);
        cart.add_item(&product(1, "A", 100), 1);
        cart.add_item(&product(2, "B", 100), 1);
        cart.add_item(&product(3, "C", 100), 1);

        let ids: Vec<i32> = cart.items().iter().map(|i| i.product_id.as_i32()).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_add_zero_quantity_clamps_to_one() {
        let mut cart = open();
        cart.add_item(&product(1, "A", 100), 0);
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, 1);
    }

    #[test]
    fn test_add_saturates_quantity() {
        let mut cart = open();
        let p = product(1, "A", 1);
        cart.add_item(&p, u32::MAX);
        cart.add_item(&p, 5);
        assert_eq!(cart.get(p.id).unwrap().quantity, u32::MAX);
    }

    #[test]
    fn test_totals() {
        let mut cart = open();
        cart.add_item(&product(1, "A", 1000), 2);
        cart.add_item(&product(2, "B", 500), 3);
        assert_eq!(cart.total_price(), Price::from(3500));
        assert_eq!(cart.total_item_count(), 5);
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = open();
        cart.add_item(&product(1, "A", 1000), 2);
        cart.add_item(&product(2, "B", 500), 3);

        cart.set_quantity(ProductId::new(2), 0);

        assert!(cart.get(ProductId::new(2)).is_none());
        assert_eq!(cart.total_item_count(), 2);
    }

    #[test]
    fn test_set_quantity_overwrites() {
        let mut cart = open();
        cart.add_item(&product(1, "A", 1000), 2);
        cart.set_quantity(ProductId::new(1), 7);
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, 7);
        assert_eq!(cart.total_price(), Price::from(7000));
    }

    #[test]
    fn test_set_quantity_never_creates() {
        let mut cart = open();
        cart.set_quantity(ProductId::new(9), 4);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let storage = MemoryStore::new();
        let mut cart = CartStore::open(storage.clone());
        cart.add_item(&product(1, "A", 1000), 2);
        let before = cart.items().to_vec();
        let persisted = storage.get(CART_STORAGE_KEY).unwrap();

        cart.remove_item(ProductId::new(42));

        assert_eq!(cart.items(), before.as_slice());
        assert_eq!(cart.total_price(), Price::from(2000));
        assert_eq!(storage.get(CART_STORAGE_KEY).unwrap(), persisted);
    }

    #[test]
    fn test_every_mutation_is_flushed() {
        let storage = MemoryStore::new();
        let mut cart = CartStore::open(storage.clone());
        let persisted = || codec::decode(&storage.get(CART_STORAGE_KEY).unwrap().unwrap()).unwrap();

        cart.add_item(&product(1, "A", 1000), 1);
        assert_eq!(persisted(), cart.items());

        cart.add_item(&product(2, "B", 500), 2);
        cart.set_quantity(ProductId::new(1), 3);
        assert_eq!(persisted(), cart.items());

        cart.remove_item(ProductId::new(2));
        assert_eq!(persisted(), cart.items());
    }

    #[test]
    fn test_reopen_restores_cart() {
        let storage = MemoryStore::new();
        let mut cart = CartStore::open(storage.clone());
        cart.add_item(&product(2, "B", 500), 3);
        cart.add_item(&product(1, "A", 1000), 2);

        let reopened = CartStore::open(storage);
        assert_eq!(reopened.items(), cart.items());
        assert_eq!(reopened.total_price(), Price::from(3500));
    }

    #[test]
    fn test_clear_empties_and_persists() {
        let storage = MemoryStore::new();
        let mut cart = CartStore::open(storage.clone());
        cart.add_item(&product(1, "A", 1000), 2);

        cart.clear();

        assert_eq!(cart.total_item_count(), 0);
        assert_eq!(cart.total_price(), Price::ZERO);
        assert!(CartStore::open(storage).is_empty());
    }

    #[test]
    fn test_huge_line_total_saturates() {
        let mut cart = open();
        let price = Price::parse("100000000000000000000").unwrap();
        cart.add_item(&ProductSnapshot::new(ProductId::new(1), "Yacht", price), u32::MAX);
        cart.add_item(&product(2, "B", 500), 1);

        assert_eq!(cart.total_price(), Price::MAX);
        assert_eq!(cart.total_item_count(), u64::from(u32::MAX) + 1);
    }

    #[test]
    fn test_overflowing_persisted_line_is_dropped() {
        let storage = MemoryStore::new();
        storage
            .set(
                CART_STORAGE_KEY,
                r#"[{"productId":1,"unitPrice":7e28,"quantity":2,"name":"x"},
                    {"productId":2,"unitPrice":-500,"quantity":2,"name":"y"},
                    {"productId":3,"unitPrice":300,"quantity":1,"name":"Socks"}]"#,
            )
            .unwrap();

        let cart = CartStore::open(storage);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.total_price(), Price::from(300));
    }

    #[test]
    fn test_corrupt_storage_opens_empty() {
        let storage = MemoryStore::new();
        storage.set(CART_STORAGE_KEY, "{not json").unwrap();

        let mut cart = CartStore::open(storage.clone());
        assert!(cart.is_empty());

        // The corrupt value is replaced on the next flush.
        cart.add_item(&product(1, "A", 1000), 1);
        assert_eq!(CartStore::open(storage).len(), 1);
    }

    #[test]
    fn test_write_failure_keeps_memory_state() {
        let mut cart = CartStore::open(MemoryStore::with_quota(8));
        cart.add_item(&product(1, "A", 1000), 2);

        assert!(cart.last_flush_failed());
        assert_eq!(cart.total_item_count(), 2);

        cart.clear();
        assert!(!cart.last_flush_failed());
    }

    #[test]
    fn test_unreadable_storage_opens_empty() {
        struct Broken;

        impl KeyValueStore for Broken {
            fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
                Err(StorageError::Unavailable("disabled".to_string()))
            }
            fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
                Err(StorageError::Unavailable("disabled".to_string()))
            }
            fn remove(&self, _key: &str) -> Result<(), StorageError> {
                Ok(())
            }
        }

        let mut cart = CartStore::open(Broken);
        cart.add_item(&product(1, "A", 1000), 1);
        cart.set_quantity(ProductId::new(1), 4);
        assert_eq!(cart.total_item_count(), 4);
        assert!(cart.last_flush_failed());
    }

    #[test]
    fn test_subscribers_see_mutations_in_order() {
        let mut cart = open();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        cart.subscribe(move |event, items| {
            sink.lock().unwrap().push((*event, items.len()));
        });

        let a = product(1, "A", 1000);
        cart.add_item(&a, 1);
        cart.add_item(&a, 2);
        cart.set_quantity(a.id, 5);
        cart.remove_item(ProductId::new(99));
        cart.set_quantity(ProductId::new(99), 3);
        cart.remove_item(a.id);
        cart.clear();

        let id = a.id;
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                (CartEvent::ItemAdded { product_id: id, quantity: 1 }, 1),
                (CartEvent::ItemMerged { product_id: id, quantity: 3 }, 1),
                (CartEvent::QuantityChanged { product_id: id, quantity: 5 }, 1),
                (CartEvent::ItemRemoved { product_id: id }, 0),
                (CartEvent::Cleared, 0),
            ]
        );
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let mut cart = open();
        let count = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&count);
        let id = cart.subscribe(move |_, _| *sink.lock().unwrap() += 1);

        cart.add_item(&product(1, "A", 1), 1);
        assert!(cart.unsubscribe(id));
        assert!(!cart.unsubscribe(id));
        cart.clear();

        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn test_last_flush_wins_across_stores() {
        let storage = MemoryStore::new();
        let mut tab_a = CartStore::open(storage.clone());
        let mut tab_b = CartStore::open(storage.clone());

        tab_a.add_item(&product(1, "A", 1000), 1);
        tab_b.add_item(&product(2, "B", 500), 1);

        let reopened = CartStore::open(storage);
        assert_eq!(reopened.items(), tab_b.items());
    }
}
