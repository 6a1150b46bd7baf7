//! Public catalog reads, cached per shop.

use bazaar_core::catalog::{Brand, Category, Product, ProductQuery};
use bazaar_core::review::Review;
use bazaar_core::{ProductId, ShopId};
use tracing::{debug, instrument, warn};

use crate::cache::{CacheKey, CacheValue};
use crate::client::BackendClient;
use crate::error::ApiError;
use crate::types::{Listing, Paginated};

impl BackendClient {
    /// One page of a shop's products.
    ///
    /// Search results are not cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, query), fields(shop = %shop, page = query.page))]
    pub async fn products(
        &self,
        shop: ShopId,
        query: &ProductQuery,
    ) -> Result<Paginated<Product>, ApiError> {
        let params = query.backend_params();
        let key = CacheKey::Products {
            shop,
            params: params
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("&"),
        };
        let cacheable = query.search.is_none();

        if cacheable && let Some(CacheValue::Products(page)) = self.cache().get(&key).await {
            debug!("Cache hit for products");
            return Ok(page);
        }

        let page = self
            .get::<Listing<Product>>(&format!("/api/public/shops/{shop}/products"), &params, None)
            .await?
            .into_page();

        if cacheable {
            self.cache()
                .insert(key, CacheValue::Products(page.clone()))
                .await;
        }
        Ok(page)
    }

    /// A single product with its variants.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for unknown products, or an error if
    /// the API request fails.
    #[instrument(skip(self), fields(shop = %shop, product = %id))]
    pub async fn product(&self, shop: ShopId, id: ProductId) -> Result<Product, ApiError> {
        let key = CacheKey::Product { shop, id };
        if let Some(CacheValue::Product(product)) = self.cache().get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product: Product = self
            .get(&format!("/api/public/shops/{shop}/products/{id}"), &[], None)
            .await?;
        self.cache()
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(shop = %shop))]
    pub async fn categories(&self, shop: ShopId) -> Result<Vec<Category>, ApiError> {
        let key = CacheKey::Categories(shop);
        if let Some(CacheValue::Categories(categories)) = self.cache().get(&key).await {
            return Ok(categories);
        }
        let categories = self
            .get::<Listing<Category>>(&format!("/api/public/shops/{shop}/categories"), &[], None)
            .await?
            .into_vec();
        self.cache()
            .insert(key, CacheValue::Categories(categories.clone()))
            .await;
        Ok(categories)
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(shop = %shop))]
    pub async fn brands(&self, shop: ShopId) -> Result<Vec<Brand>, ApiError> {
        let key = CacheKey::Brands(shop);
        if let Some(CacheValue::Brands(brands)) = self.cache().get(&key).await {
            return Ok(brands);
        }
        let brands = self
            .get::<Listing<Brand>>(&format!("/api/public/shops/{shop}/brands"), &[], None)
            .await?
            .into_vec();
        self.cache()
            .insert(key, CacheValue::Brands(brands.clone()))
            .await;
        Ok(brands)
    }

    /// Approved reviews of a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(shop = %shop, product = %product))]
    pub async fn product_reviews(
        &self,
        shop: ShopId,
        product: ProductId,
        page: u32,
    ) -> Result<Paginated<Review>, ApiError> {
        let page = page.max(1);
        let key = CacheKey::Reviews {
            shop,
            product,
            page,
        };
        if let Some(CacheValue::Reviews(reviews)) = self.cache().get(&key).await {
            return Ok(reviews);
        }
        let reviews = self
            .get::<Listing<Review>>(
                &format!("/api/public/shops/{shop}/products/{product}/reviews"),
                &[("page", page.to_string())],
                None,
            )
            .await?
            .into_page();
        self.cache()
            .insert(key, CacheValue::Reviews(reviews.clone()))
            .await;
        Ok(reviews)
    }

    /// Drop cached entries that mention one product (its page, its reviews
    /// and every product listing of the shop).
    pub fn invalidate_product(&self, shop: ShopId, product: ProductId) {
        if let Err(e) = self.cache().invalidate_entries_if(move |key, _| {
            key.shop() == shop && key.concerns_product(product)
        }) {
            warn!(error = %e, shop = %shop, "Failed to invalidate product cache");
        }
    }
}
