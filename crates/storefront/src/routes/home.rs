//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use bazaar_core::catalog::{Category, ProductQuery, ProductSort};
use tracing::instrument;

use crate::filters;
use crate::middleware::CurrentShop;
use crate::state::AppState;
use crate::views::{Page, ProductCard};

const FEATURED_COUNT: u32 = 8;
const HOME_CATEGORY_COUNT: usize = 8;

/// Hero banner driven by the shop theme.
#[derive(Clone)]
pub struct Hero {
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: Option<String>,
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct HomeTemplate {
    pub page: Page,
    pub hero: Hero,
    pub featured: Vec<ProductCard>,
    pub categories: Vec<Category>,
}

/// Display the home page.
///
/// Catalog failures leave the sections empty rather than failing the page.
#[instrument(skip(state, shop, page), fields(shop = %shop.slug))]
pub async fn home(
    State(state): State<AppState>,
    CurrentShop(shop): CurrentShop,
    page: Page,
) -> impl IntoResponse {
    let query = ProductQuery::first_page(ProductSort::Popular, FEATURED_COUNT);
    let (products, categories) = tokio::join!(
        state.backend().products(shop.id, &query),
        state.backend().categories(shop.id),
    );

    let featured = match products {
        Ok(products) => products
            .items
            .iter()
            .map(|p| ProductCard::new(p, &shop))
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch featured products");
            Vec::new()
        }
    };
    let categories = match categories {
        Ok(mut categories) => {
            categories.retain(|c| c.parent_id.is_none());
            categories.truncate(HOME_CATEGORY_COUNT);
            categories
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch categories");
            Vec::new()
        }
    };

    let hero = Hero {
        title: shop
            .theme
            .hero_title
            .clone()
            .unwrap_or_else(|| format!("Welcome to {}", shop.name)),
        subtitle: shop.theme.hero_subtitle.clone(),
        image_url: shop.theme.hero_image_url.clone(),
    };

    HomeTemplate {
        page,
        hero,
        featured,
        categories,
    }
}
