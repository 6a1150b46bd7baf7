//! Product listing filters.
//!
//! A [`ProductQuery`] is parsed from the storefront URL, sent to the backend
//! as query pairs, and turned back into URLs for pagination links so every
//! filter survives a page change.

use serde::{Deserialize, Serialize};

use crate::{BrandId, CategoryId};

/// Sort order offered on the listing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    NameAsc,
    Popular,
}

impl ProductSort {
    pub const ALL: [Self; 5] = [
        Self::Newest,
        Self::PriceAsc,
        Self::PriceDesc,
        Self::NameAsc,
        Self::Popular,
    ];

    /// Value used in URLs and backend requests.
    #[must_use]
    pub const fn as_param(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::NameAsc => "name_asc",
            Self::Popular => "popular",
        }
    }

    /// Parse a URL value; unknown values fall back to the default.
    #[must_use]
    pub fn from_param(value: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|s| s.as_param() == value)
            .unwrap_or_default()
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Newest => "Newest",
            Self::PriceAsc => "Price: low to high",
            Self::PriceDesc => "Price: high to low",
            Self::NameAsc => "Name",
            Self::Popular => "Most popular",
        }
    }
}

/// Filters and paging for a product listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub page: u32,
    pub per_page: u32,
    pub category: Option<CategoryId>,
    pub brand: Option<BrandId>,
    pub search: Option<String>,
    pub sort: ProductSort,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: Self::DEFAULT_PER_PAGE,
            category: None,
            brand: None,
            search: None,
            sort: ProductSort::default(),
            min_price: None,
            max_price: None,
        }
    }
}

impl ProductQuery {
    pub const DEFAULT_PER_PAGE: u32 = 12;
    pub const MAX_PER_PAGE: u32 = 60;

    /// Query for the first page with the given sort and size.
    #[must_use]
    pub fn first_page(sort: ProductSort, per_page: u32) -> Self {
        Self {
            sort,
            per_page: per_page.clamp(1, Self::MAX_PER_PAGE),
            ..Self::default()
        }
    }

    /// Copy of this query pointing at another page.
    #[must_use]
    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page: page.max(1),
            ..self.clone()
        }
    }

    /// Whether any filter beyond paging and sort is active.
    #[must_use]
    pub const fn has_filters(&self) -> bool {
        self.category.is_some()
            || self.brand.is_some()
            || self.search.is_some()
            || self.min_price.is_some()
            || self.max_price.is_some()
    }

    /// Pairs sent to the backend's product listing endpoint.
    #[must_use]
    pub fn backend_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.max(1).to_string()),
            ("per_page", self.per_page.clamp(1, Self::MAX_PER_PAGE).to_string()),
            ("sort", self.sort.as_param().to_string()),
        ];
        if let Some(category) = self.category {
            params.push(("category_id", category.to_string()));
        }
        if let Some(brand) = self.brand {
            params.push(("brand_id", brand.to_string()));
        }
        if let Some(search) = &self.search {
            params.push(("q", search.clone()));
        }
        if let Some(min) = self.min_price {
            params.push(("min_price", min.to_string()));
        }
        if let Some(max) = self.max_price {
            params.push(("max_price", max.to_string()));
        }
        params
    }

    /// Storefront URL parameters (defaults omitted).
    #[must_use]
    pub fn url_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if self.page > 1 {
            params.push(("page", self.page.to_string()));
        }
        if self.sort != ProductSort::default() {
            params.push(("sort", self.sort.as_param().to_string()));
        }
        if let Some(category) = self.category {
            params.push(("category", category.to_string()));
        }
        if let Some(brand) = self.brand {
            params.push(("brand", brand.to_string()));
        }
        if let Some(search) = &self.search {
            params.push(("q", search.clone()));
        }
        if let Some(min) = self.min_price {
            params.push(("min_price", min.to_string()));
        }
        if let Some(max) = self.max_price {
            params.push(("max_price", max.to_string()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_param_round_trip() {
        for sort in ProductSort::ALL {
            assert_eq!(ProductSort::from_param(sort.as_param()), sort);
        }
        assert_eq!(ProductSort::from_param("bogus"), ProductSort::Newest);
    }

    #[test]
    fn test_backend_params_include_filters() {
        let query = ProductQuery {
            page: 3,
            category: Some(CategoryId::new(4)),
            search: Some("linen".into()),
            min_price: Some(10),
            ..ProductQuery::default()
        };
        let params = query.backend_params();
        assert!(params.contains(&("page", "3".to_string())));
        assert!(params.contains(&("per_page", "12".to_string())));
        assert!(params.contains(&("category_id", "4".to_string())));
        assert!(params.contains(&("q", "linen".to_string())));
        assert!(params.contains(&("min_price", "10".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "brand_id"));
    }

    #[test]
    fn test_url_params_keep_filters_across_pages() {
        let query = ProductQuery {
            brand: Some(BrandId::new(2)),
            sort: ProductSort::PriceDesc,
            ..ProductQuery::default()
        };
        assert_eq!(
            query.url_params(),
            vec![("sort", "price_desc".to_string()), ("brand", "2".to_string())]
        );
        let next = query.with_page(2);
        assert_eq!(next.url_params().first(), Some(&("page", "2".to_string())));
        assert!(next.has_filters());
        assert_eq!(query.with_page(0).page, 1);
    }

    #[test]
    fn test_first_page_clamps_size() {
        assert_eq!(ProductQuery::first_page(ProductSort::Popular, 500).per_page, 60);
        assert_eq!(ProductQuery::first_page(ProductSort::Popular, 0).per_page, 1);
    }
}
