//! Catalog entries.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// Fixed set of catalog categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Tops,
    Bottoms,
    Footwear,
    Outerwear,
    Accessories,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Self; 5] = [
        Self::Tops,
        Self::Bottoms,
        Self::Footwear,
        Self::Outerwear,
        Self::Accessories,
    ];

    /// Display name, also used for case-insensitive category filtering.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tops => "Tops",
            Self::Bottoms => "Bottoms",
            Self::Footwear => "Footwear",
            Self::Outerwear => "Outerwear",
            Self::Accessories => "Accessories",
        }
    }

    /// Category suggested alongside an item from this one.
    #[must_use]
    pub const fn complement(&self) -> Self {
        match self {
            Self::Tops => Self::Bottoms,
            Self::Bottoms => Self::Footwear,
            Self::Footwear | Self::Outerwear => Self::Accessories,
            Self::Accessories => Self::Tops,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable catalog entry, created once when the catalog is seeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: Category,
    pub price: Price,
    pub in_stock: bool,
    /// Average review score out of 5.
    pub rating: f32,
    pub review_count: u32,
}

impl Product {
    /// Case-insensitive substring match against the product name.
    #[must_use]
    pub fn name_matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(&needle.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_matches_ignores_case() {
        let product = Product {
            id: ProductId::new(1),
            name: "Classic T-Shirt".to_string(),
            category: Category::Tops,
            price: Price::usd_cents(2000),
            in_stock: true,
            rating: 4.5,
            review_count: 10,
        };
        assert!(product.name_matches("t-shirt"));
        assert!(product.name_matches("CLASSIC"));
        assert!(!product.name_matches("jeans"));
    }

    #[test]
    fn test_complement_never_self() {
        for category in Category::ALL {
            assert_ne!(category.complement(), category);
        }
    }
}
