//! Client-side catalog filtering.
//!
//! The ProductAPI returns the whole active catalog; narrowing it down by
//! category and price happens here.

use kaimono_cart::ProductSnapshot;
use kaimono_core::Price;

use crate::api::Product;

/// Category and price filters for a product listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Only products whose category slug equals this.
    pub category: Option<String>,
    /// Only products priced at or below this.
    pub max_price: Option<Price>,
}

impl ProductFilter {
    /// Whether no filter is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.category.is_none() && self.max_price.is_none()
    }

    /// Whether `product` passes every set filter.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(slug) = &self.category
            && product.category_slug() != Some(slug.as_str())
        {
            return false;
        }
        if let Some(max) = self.max_price
            && product.price > max
        {
            return false;
        }
        true
    }

    /// Keep the matching products, in their original order.
    #[must_use]
    pub fn apply(&self, products: Vec<Product>) -> Vec<Product> {
        if self.is_empty() {
            return products;
        }
        products.into_iter().filter(|p| self.matches(p)).collect()
    }

    /// Human-readable summary, e.g. `tops, up to ¥5,000`.
    #[must_use]
    pub fn describe(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(slug) = &self.category {
            parts.push(slug.clone());
        }
        if let Some(max) = self.max_price {
            parts.push(format!("up to {max}"));
        }
        (!parts.is_empty()).then(|| parts.join(", "))
    }
}

impl From<&Product> for ProductSnapshot {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            image_url: product.image_url.clone(),
            description: product.description.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use kaimono_core::{CategoryId, ProductId, ProductStatus};

    use super::*;
    use crate::api::Category;

    fn product(id: i32, slug: &str, price: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            description: Some("Soft cotton".to_string()),
            price: Price::from(price),
            category_id: CategoryId::new(1),
            seller_id: None,
            image_url: Some(format!("/images/{id}.jpg")),
            stock: 5,
            is_active: true,
            status: ProductStatus::Available,
            category: Some(Category {
                id: CategoryId::new(1),
                name: slug.to_uppercase(),
                slug: slug.to_string(),
            }),
            seller: None,
        }
    }

    fn ids(products: &[Product]) -> Vec<i32> {
        products.iter().map(|p| p.id.as_i32()).collect()
    }

    fn catalog() -> Vec<Product> {
        vec![
            product(1, "tops", 3000),
            product(2, "bottoms", 5000),
            product(3, "tops", 8000),
            product(4, "shoes", 5001),
        ]
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        let filter = ProductFilter::default();
        assert!(filter.is_empty());
        assert_eq!(ids(&filter.apply(catalog())), vec![1, 2, 3, 4]);
        assert_eq!(filter.describe(), None);
    }

    #[test]
    fn test_category_filter() {
        let filter = ProductFilter {
            category: Some("tops".to_string()),
            max_price: None,
        };
        assert_eq!(ids(&filter.apply(catalog())), vec![1, 3]);
    }

    #[test]
    fn test_max_price_is_inclusive() {
        let filter = ProductFilter {
            category: None,
            max_price: Some(Price::from(5000)),
        };
        assert_eq!(ids(&filter.apply(catalog())), vec![1, 2]);
    }

    #[test]
    fn test_combined_filters() {
        let filter = ProductFilter {
            category: Some("tops".to_string()),
            max_price: Some(Price::from(5000)),
        };
        assert_eq!(ids(&filter.apply(catalog())), vec![1]);
        assert_eq!(filter.describe().as_deref(), Some("tops, up to ¥5,000"));
    }

    #[test]
    fn test_product_without_category_fails_category_filter() {
        let mut uncategorized = product(9, "tops", 100);
        uncategorized.category = None;
        let filter = ProductFilter {
            category: Some("tops".to_string()),
            max_price: None,
        };
        assert!(!filter.matches(&uncategorized));
    }

    #[test]
    fn test_snapshot_from_product() {
        let p = product(7, "tops", 2500);
        let snapshot = ProductSnapshot::from(&p);
        assert_eq!(snapshot.id, ProductId::new(7));
        assert_eq!(snapshot.price, Price::from(2500));
        assert_eq!(snapshot.image_url.as_deref(), Some("/images/7.jpg"));
        assert_eq!(snapshot.description.as_deref(), Some("Soft cotton"));
    }
}
