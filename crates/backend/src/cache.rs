//! Cache types for public catalog responses.

use bazaar_core::catalog::{Brand, Category, Product};
use bazaar_core::review::Review;
use bazaar_core::{ProductId, ShopId};

use crate::types::Paginated;

/// Cache key for catalog reads. Every key is scoped to one shop.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Products { shop: ShopId, params: String },
    Product { shop: ShopId, id: ProductId },
    Categories(ShopId),
    Brands(ShopId),
    Reviews { shop: ShopId, product: ProductId, page: u32 },
}

impl CacheKey {
    pub const fn shop(&self) -> ShopId {
        match self {
            Self::Products { shop, .. }
            | Self::Product { shop, .. }
            | Self::Reviews { shop, .. }
            | Self::Categories(shop)
            | Self::Brands(shop) => *shop,
        }
    }

    /// Whether this entry holds data about `product`.
    pub fn concerns_product(&self, product: ProductId) -> bool {
        match self {
            Self::Product { id, .. } => *id == product,
            Self::Reviews { product: p, .. } => *p == product,
            Self::Products { .. } => true,
            Self::Categories(_) | Self::Brands(_) => false,
        }
    }
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Products(Paginated<Product>),
    Product(Box<Product>),
    Categories(Vec<Category>),
    Brands(Vec<Brand>),
    Reviews(Paginated<Review>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_scope() {
        let shop = ShopId::new(1);
        let key = CacheKey::Product {
            shop,
            id: ProductId::new(5),
        };
        assert_eq!(key.shop(), shop);
        assert!(key.concerns_product(ProductId::new(5)));
        assert!(!key.concerns_product(ProductId::new(6)));
        assert!(!CacheKey::Brands(shop).concerns_product(ProductId::new(5)));
    }
}
