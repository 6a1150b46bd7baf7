//! Category and brand directory.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use bazaar_core::catalog::{Brand, Category};
use tracing::instrument;

use crate::filters;
use crate::middleware::CurrentShop;
use crate::state::AppState;
use crate::views::Page;

/// A top-level category with its children.
#[derive(Clone)]
pub struct CategoryTree {
    pub category: Category,
    pub children: Vec<Category>,
}

/// Group categories under their parents. Children whose parent is missing
/// are shown at the top level.
#[must_use]
pub fn build_tree(categories: Vec<Category>) -> Vec<CategoryTree> {
    let (roots, children): (Vec<_>, Vec<_>) = categories.into_iter().partition(|c| {
        c.parent_id.is_none()
    });
    let mut tree: Vec<CategoryTree> = roots
        .into_iter()
        .map(|category| CategoryTree {
            category,
            children: Vec::new(),
        })
        .collect();

    for child in children {
        match tree
            .iter_mut()
            .find(|t| Some(t.category.id) == child.parent_id)
        {
            Some(parent) => parent.children.push(child),
            None => tree.push(CategoryTree {
                category: child,
                children: Vec::new(),
            }),
        }
    }
    tree
}

/// Categories page template.
#[derive(Template, WebTemplate)]
#[template(path = "categories.html")]
pub struct CategoriesTemplate {
    pub page: Page,
    pub categories: Vec<CategoryTree>,
    pub brands: Vec<Brand>,
    pub error: Option<String>,
}

/// Display categories and brands.
#[instrument(skip(state, shop, page), fields(shop = %shop.slug))]
pub async fn index(
    State(state): State<AppState>,
    CurrentShop(shop): CurrentShop,
    page: Page,
) -> impl IntoResponse {
    let (categories, brands) = tokio::join!(
        state.backend().categories(shop.id),
        state.backend().brands(shop.id),
    );

    let mut error = None;
    let categories = categories.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to fetch categories");
        error = Some("We could not load categories right now.".to_string());
        Vec::new()
    });
    let brands = brands.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to fetch brands");
        Vec::new()
    });

    CategoriesTemplate {
        page,
        categories: build_tree(categories),
        brands,
        error,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn category(id: i64, parent: Option<i64>) -> Category {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": format!("Category {id}"),
            "slug": format!("category-{id}"),
            "parent_id": parent,
        }))
        .unwrap()
    }

    #[test]
    fn test_build_tree_groups_children() {
        let tree = build_tree(vec![
            category(1, None),
            category(2, Some(1)),
            category(3, None),
            category(4, Some(99)),
        ]);
        assert_eq!(tree.len(), 3);
        assert_eq!(tree[0].children.len(), 1);
        assert_eq!(tree[2].category.name, "Category 4");
    }
}
