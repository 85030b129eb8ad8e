//! Plain-text rendering of storefront data.

use std::io::{self, Write};

use kaimono_cart::{CartLineItem, CartStore, KeyValueStore};
use kaimono_storefront::api::{Category, Order, Product, Seller, User};

/// Listing line: `#12  Denim jacket  ¥8,900  [outer]  (sold out)`.
pub fn product_line(out: &mut impl Write, product: &Product) -> io::Result<()> {
    write!(out, "#{:<5} {}  {}", product.id, product.name, product.price)?;
    if let Some(slug) = product.category_slug() {
        write!(out, "  [{slug}]")?;
    }
    if !product.is_purchasable() {
        write!(out, "  (sold out)")?;
    }
    writeln!(out)
}

pub fn products(out: &mut impl Write, products: &[Product]) -> io::Result<()> {
    if products.is_empty() {
        return writeln!(out, "No products found.");
    }
    for product in products {
        product_line(out, product)?;
    }
    Ok(())
}

/// A seller's shop page: a header naming the seller, then their listings.
pub fn shop(out: &mut impl Write, seller: &Seller, products: &[Product]) -> io::Result<()> {
    writeln!(out, "{}'s shop (#{})", seller.username, seller.id)?;
    writeln!(out)?;
    self::products(out, products)
}

/// Full product view.
pub fn product(out: &mut impl Write, product: &Product) -> io::Result<()> {
    writeln!(out, "{} (#{})", product.name, product.id)?;
    writeln!(out, "Price:    {}", product.price)?;
    if let Some(category) = &product.category {
        writeln!(out, "Category: {} [{}]", category.name, category.slug)?;
    }
    if let Some(seller) = &product.seller {
        writeln!(out, "Seller:   {} (#{})", seller.username, seller.id)?;
    }
    writeln!(out, "Stock:    {}", product.stock)?;
    writeln!(out, "Status:   {}", product.status)?;
    if let Some(description) = product.description.as_deref().filter(|d| !d.is_empty()) {
        writeln!(out)?;
        writeln!(out, "{description}")?;
    }
    Ok(())
}

pub fn categories(out: &mut impl Write, categories: &[Category]) -> io::Result<()> {
    for category in categories {
        writeln!(out, "{:<12} {}", category.slug, category.name)?;
    }
    Ok(())
}

fn cart_line(out: &mut impl Write, item: &CartLineItem) -> io::Result<()> {
    writeln!(
        out,
        "#{:<5} {} x {}  @ {}  = {}",
        item.product_id,
        item.quantity,
        item.name,
        item.unit_price,
        item.line_total()
    )
}

/// Cart contents followed by the item count and total price.
pub fn cart<S: KeyValueStore>(out: &mut impl Write, cart: &CartStore<S>) -> io::Result<()> {
    if cart.is_empty() {
        return writeln!(out, "Your cart is empty.");
    }
    for item in cart.items() {
        cart_line(out, item)?;
    }
    writeln!(
        out,
        "{} item(s), total {}",
        cart.total_item_count(),
        cart.total_price()
    )
}

pub fn user(out: &mut impl Write, user: &User) -> io::Result<()> {
    write!(out, "#{:<5} {} <{}> {}", user.id, user.username, user.email, user.role)?;
    if !user.is_active {
        write!(out, " (inactive)")?;
    }
    writeln!(out)
}

/// One-line order summary.
pub fn order_line(out: &mut impl Write, order: &Order) -> io::Result<()> {
    write!(out, "Order #{:<5} {:<10} {}", order.id, order.status, order.total_amount)?;
    if let Some(created_at) = order.created_at {
        write!(out, "  {}", created_at.format("%Y-%m-%d %H:%M"))?;
    }
    writeln!(out)
}

/// Order summary, shipping details and lines.
pub fn order(out: &mut impl Write, order: &Order) -> io::Result<()> {
    order_line(out, order)?;
    writeln!(out, "Ship to: {} ({})", order.shipping_name, order.shipping_phone)?;
    writeln!(out, "         {}", order.shipping_address)?;
    for item in &order.order_items {
        writeln!(out, "  #{:<5} {} x {}", item.product_id, item.quantity, item.price)?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use kaimono_cart::{MemoryStore, ProductSnapshot};
    use kaimono_core::{Price, ProductId, UserId};

    use super::*;

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn product_json(stock: u32) -> Product {
        serde_json::from_value(serde_json::json!({
            "id": 12, "name": "Denim jacket", "price": 8900.0, "category_id": 2,
            "stock": stock, "status": "available",
            "category": {"id": 2, "name": "Outerwear", "slug": "outer"}
        }))
        .unwrap()
    }

    #[test]
    fn test_product_line_marks_sold_out() {
        let line = render(|out| product_line(out, &product_json(3)));
        assert_eq!(line, "#12    Denim jacket  ¥8,900  [outer]\n");

        let line = render(|out| product_line(out, &product_json(0)));
        assert!(line.ends_with("(sold out)\n"));
    }

    #[test]
    fn test_empty_listing() {
        assert_eq!(render(|out| products(out, &[])), "No products found.\n");
    }

    #[test]
    fn test_shop_names_the_seller() {
        let seller = Seller {
            id: UserId::new(2),
            username: "mika".to_string(),
        };
        let text = render(|out| shop(out, &seller, &[product_json(3)]));
        assert_eq!(text, "mika's shop (#2)\n\n#12    Denim jacket  ¥8,900  [outer]\n");

        let text = render(|out| shop(out, &seller, &[]));
        assert!(text.ends_with("No products found.\n"));
    }

    #[test]
    fn test_cart_with_totals() {
        let mut store = CartStore::open(MemoryStore::new());
        store.add_item(&ProductSnapshot::new(ProductId::new(1), "Linen tee", Price::from(1000)), 3);
        store.add_item(&ProductSnapshot::new(ProductId::new(2), "Socks", Price::from(250)), 2);

        let text = render(|out| cart(out, &store));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "#1     3 x Linen tee  @ ¥1,000  = ¥3,000");
        assert_eq!(lines[2], "5 item(s), total ¥3,500");
    }

    #[test]
    fn test_empty_cart() {
        let store = CartStore::open(MemoryStore::new());
        assert_eq!(render(|out| cart(out, &store)), "Your cart is empty.\n");
    }

    #[test]
    fn test_order_details() {
        let order: Order = serde_json::from_value(serde_json::json!({
            "id": 31, "user_id": 5, "total_amount": 3500.0, "status": "pending",
            "shipping_name": "Sato", "shipping_phone": "090",
            "shipping_address": "〒150-0001 東京都渋谷区神宮前1-2-3",
            "created_at": "2025-04-02T09:30:15",
            "order_items": [{"product_id": 1, "quantity": 3, "price": 1000.0}]
        }))
        .unwrap();

        let text = render(|out| super::order(out, &order));

        assert!(text.starts_with("Order #31    pending    ¥3,500  2025-04-02 09:30\n"));
        assert!(text.contains("〒150-0001"));
        assert!(text.contains("  #1     3 x ¥1,000\n"));
    }
}
