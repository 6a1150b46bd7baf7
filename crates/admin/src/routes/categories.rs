//! Category management.
//!
//! Merchants manage their shop's categories under `/categories`; superadmins
//! manage the platform-wide set under `/superadmin/categories`. Both screens
//! share the same table and form, differing only in backend scope.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use bazaar_backend::{ApiError, CategoryScope};
use bazaar_core::CategoryId;
use bazaar_core::catalog::{Category, CategoryDraft};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::{RequireMerchant, RequireSuperAdmin};
use crate::models::CurrentAdmin;
use crate::state::AppState;
use crate::views::{AdminUserView, flash, take_flash};

/// Where a category screen lives and which backend set it edits.
#[derive(Debug, Clone, Copy)]
struct Section {
    scope: CategoryScope,
    base: &'static str,
    title: &'static str,
}

const MERCHANT: Section = Section {
    scope: CategoryScope::Merchant,
    base: "/categories",
    title: "Categories",
};

const PLATFORM: Section = Section {
    scope: CategoryScope::Platform,
    base: "/superadmin/categories",
    title: "Platform categories",
};

/// Category row for templates.
#[derive(Debug, Clone)]
pub struct CategoryRow {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub parent: Option<String>,
    pub product_count: u32,
    pub icon_url: Option<String>,
}

/// Parent choice in the form's select box.
#[derive(Debug, Clone)]
pub struct ParentOption {
    pub id: String,
    pub name: String,
    pub selected: bool,
}

/// Values shown in the create/edit form.
#[derive(Debug, Clone, Default)]
pub struct CategoryFormView {
    /// Set when editing an existing category.
    pub id: Option<String>,
    pub name: String,
    pub slug: String,
    pub icon_url: String,
    pub parent_id: String,
}

impl CategoryFormView {
    fn action(&self, base: &str) -> String {
        match &self.id {
            Some(id) => format!("{base}/{id}"),
            None => base.to_string(),
        }
    }
}

impl From<&Category> for CategoryFormView {
    fn from(category: &Category) -> Self {
        Self {
            id: Some(category.id.to_string()),
            name: category.name.clone(),
            slug: category.slug.clone(),
            icon_url: category.icon_url.clone().unwrap_or_default(),
            parent_id: category
                .parent_id
                .map(|p| p.to_string())
                .unwrap_or_default(),
        }
    }
}

/// Categories page template.
#[derive(Template)]
#[template(path = "categories.html")]
pub struct CategoriesTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<String>,
    pub title: &'static str,
    pub base: &'static str,
    pub categories: Vec<CategoryRow>,
    pub parents: Vec<ParentOption>,
    pub form: CategoryFormView,
    pub form_action: String,
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CategoriesQuery {
    pub edit: Option<CategoryId>,
}

/// Raw form fields; blank strings mean "not set".
#[derive(Debug, Default, Deserialize)]
pub struct CategoryForm {
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub icon_url: String,
    #[serde(default)]
    pub parent_id: String,
}

impl CategoryForm {
    fn draft(&self) -> std::result::Result<CategoryDraft, String> {
        let parent_id = match self.parent_id.trim() {
            "" => None,
            raw => Some(
                raw.parse::<CategoryId>()
                    .map_err(|_| "Unknown parent category.".to_string())?,
            ),
        };
        Ok(CategoryDraft {
            name: self.name.clone(),
            slug: Some(self.slug.clone()).filter(|s| !s.trim().is_empty()),
            icon_url: Some(self.icon_url.clone()).filter(|s| !s.trim().is_empty()),
            parent_id,
        })
    }

    fn view(&self, id: Option<CategoryId>) -> CategoryFormView {
        CategoryFormView {
            id: id.map(|i| i.to_string()),
            name: self.name.clone(),
            slug: self.slug.clone(),
            icon_url: self.icon_url.clone(),
            parent_id: self.parent_id.trim().to_string(),
        }
    }
}

fn rows(categories: &[Category]) -> Vec<CategoryRow> {
    categories
        .iter()
        .map(|c| CategoryRow {
            id: c.id.to_string(),
            name: c.name.clone(),
            slug: c.slug.clone(),
            parent: c
                .parent_id
                .and_then(|p| categories.iter().find(|o| o.id == p))
                .map(|p| p.name.clone()),
            product_count: c.product_count.unwrap_or(0),
            icon_url: c.icon_url.clone(),
        })
        .collect()
}

/// Parents offered in the form. A category cannot be its own parent.
fn parent_options(
    categories: &[Category],
    editing: Option<&str>,
    selected: &str,
) -> Vec<ParentOption> {
    categories
        .iter()
        .map(|c| (c, c.id.to_string()))
        .filter(|(_, id)| Some(id.as_str()) != editing)
        .map(|(c, id)| ParentOption {
            selected: id == selected,
            id,
            name: c.name.clone(),
        })
        .collect()
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(merchant_index).post(merchant_create))
        .route("/categories/{id}", post(merchant_update))
        .route("/categories/{id}/delete", post(merchant_delete))
        .route(
            "/superadmin/categories",
            get(platform_index).post(platform_create),
        )
        .route("/superadmin/categories/{id}", post(platform_update))
        .route("/superadmin/categories/{id}/delete", post(platform_delete))
}

#[instrument(skip(admin, state, session))]
async fn merchant_index(
    RequireMerchant(admin, _shop): RequireMerchant,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CategoriesQuery>,
) -> Result<Html<String>> {
    index(MERCHANT, &admin, &state, &session, query.edit).await
}

#[instrument(skip(admin, state, session))]
async fn platform_index(
    RequireSuperAdmin(admin): RequireSuperAdmin,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CategoriesQuery>,
) -> Result<Html<String>> {
    index(PLATFORM, &admin, &state, &session, query.edit).await
}

#[instrument(skip(admin, state, session, form))]
async fn merchant_create(
    RequireMerchant(admin, _shop): RequireMerchant,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CategoryForm>,
) -> Result<Response> {
    save(MERCHANT, &admin, &state, &session, None, form).await
}

#[instrument(skip(admin, state, session, form))]
async fn platform_create(
    RequireSuperAdmin(admin): RequireSuperAdmin,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CategoryForm>,
) -> Result<Response> {
    save(PLATFORM, &admin, &state, &session, None, form).await
}

#[instrument(skip(admin, state, session, form))]
async fn merchant_update(
    RequireMerchant(admin, _shop): RequireMerchant,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<CategoryId>,
    Form(form): Form<CategoryForm>,
) -> Result<Response> {
    save(MERCHANT, &admin, &state, &session, Some(id), form).await
}

#[instrument(skip(admin, state, session, form))]
async fn platform_update(
    RequireSuperAdmin(admin): RequireSuperAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<CategoryId>,
    Form(form): Form<CategoryForm>,
) -> Result<Response> {
    save(PLATFORM, &admin, &state, &session, Some(id), form).await
}

#[instrument(skip(admin, state, session))]
async fn merchant_delete(
    RequireMerchant(admin, _shop): RequireMerchant,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<CategoryId>,
) -> Result<Redirect> {
    delete(MERCHANT, &admin, &state, &session, id).await
}

#[instrument(skip(admin, state, session))]
async fn platform_delete(
    RequireSuperAdmin(admin): RequireSuperAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<CategoryId>,
) -> Result<Redirect> {
    delete(PLATFORM, &admin, &state, &session, id).await
}

/// Load the categories, keeping the page usable when the backend fails.
async fn load(
    section: Section,
    admin: &CurrentAdmin,
    state: &AppState,
) -> Result<(Vec<Category>, Option<String>)> {
    match state
        .backend()
        .managed_categories(admin.token(), section.scope)
        .await
    {
        Ok(categories) => Ok((categories, None)),
        Err(ApiError::Unauthorized) => Err(ApiError::Unauthorized.into()),
        Err(e) => {
            tracing::error!("Failed to fetch categories: {e}");
            Ok((
                Vec::new(),
                Some("Categories could not be loaded right now.".to_string()),
            ))
        }
    }
}

async fn render(
    section: Section,
    admin: &CurrentAdmin,
    state: &AppState,
    session: &Session,
    form: CategoryFormView,
    error: Option<String>,
) -> Result<Html<String>> {
    let (categories, load_error) = load(section, admin, state).await?;
    let template = CategoriesTemplate {
        admin_user: AdminUserView::from(admin),
        current_path: section.base.to_string(),
        flash: take_flash(session).await,
        title: section.title,
        base: section.base,
        parents: parent_options(&categories, form.id.as_deref(), &form.parent_id),
        categories: rows(&categories),
        form_action: form.action(section.base),
        form,
        error: error.or(load_error),
    };

    Ok(Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    })))
}

async fn index(
    section: Section,
    admin: &CurrentAdmin,
    state: &AppState,
    session: &Session,
    edit: Option<CategoryId>,
) -> Result<Html<String>> {
    let form = match edit {
        Some(id) => {
            let (categories, _) = load(section, admin, state).await?;
            match categories.iter().find(|c| c.id == id) {
                Some(category) => CategoryFormView::from(category),
                None => {
                    return render(
                        section,
                        admin,
                        state,
                        session,
                        CategoryFormView::default(),
                        Some(format!("Category {id} was not found.")),
                    )
                    .await;
                }
            }
        }
        None => CategoryFormView::default(),
    };
    render(section, admin, state, session, form, None).await
}

async fn save(
    section: Section,
    admin: &CurrentAdmin,
    state: &AppState,
    session: &Session,
    id: Option<CategoryId>,
    form: CategoryForm,
) -> Result<Response> {
    let input = match form
        .draft()
        .and_then(|draft| draft.validate(id).map_err(|e| e.to_string()))
    {
        Ok(input) => input,
        Err(message) => {
            let page = render(section, admin, state, session, form.view(id), Some(message));
            return Ok(page.await?.into_response());
        }
    };

    let backend = state.backend();
    let result = match id {
        Some(id) => backend
            .update_category(admin.token(), section.scope, id, &input)
            .await
            .map(|()| format!("Category \"{}\" updated.", input.name)),
        None => backend
            .create_category(admin.token(), section.scope, &input)
            .await
            .map(|created| format!("Category \"{}\" created.", created.name)),
    };

    match result {
        Ok(message) => {
            flash(session, message).await;
            Ok(Redirect::to(section.base).into_response())
        }
        Err(ApiError::Validation(message)) => {
            let page = render(section, admin, state, session, form.view(id), Some(message));
            Ok(page.await?.into_response())
        }
        Err(e) => Err(e.into()),
    }
}

async fn delete(
    section: Section,
    admin: &CurrentAdmin,
    state: &AppState,
    session: &Session,
    id: CategoryId,
) -> Result<Redirect> {
    match state
        .backend()
        .delete_category(admin.token(), section.scope, id)
        .await
    {
        Ok(()) => {
            tracing::info!(category = %id, "Category deleted");
            flash(session, "Category deleted.").await;
        }
        Err(e @ (ApiError::Validation(_) | ApiError::NotFound(_))) => {
            flash(session, e.user_message()).await;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(Redirect::to(section.base))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn category(id: i64, name: &str, parent: Option<i64>) -> Category {
        Category {
            id: CategoryId::new(id),
            name: name.to_string(),
            slug: name.to_lowercase(),
            icon_url: None,
            parent_id: parent.map(CategoryId::new),
            product_count: None,
        }
    }

    #[test]
    fn test_blank_fields_become_none() {
        let form = CategoryForm {
            name: "Shoes".to_string(),
            slug: "  ".to_string(),
            icon_url: String::new(),
            parent_id: " ".to_string(),
        };
        let draft = form.draft().unwrap();
        assert_eq!(draft.slug, None);
        assert_eq!(draft.icon_url, None);
        assert_eq!(draft.parent_id, None);
        assert_eq!(draft.validate(None).unwrap().slug, "shoes");
    }

    #[test]
    fn test_bad_parent_is_reported() {
        let form = CategoryForm {
            name: "Shoes".to_string(),
            parent_id: "abc".to_string(),
            ..CategoryForm::default()
        };
        assert!(form.draft().is_err());
    }

    #[test]
    fn test_rows_resolve_parent_names() {
        let categories = vec![category(1, "Clothing", None), category(2, "Shirts", Some(1))];
        let rows = rows(&categories);
        assert_eq!(rows[0].parent, None);
        assert_eq!(rows[1].parent.as_deref(), Some("Clothing"));
    }

    #[test]
    fn test_parent_options_skip_the_edited_category() {
        let categories = vec![category(1, "Clothing", None), category(2, "Shirts", Some(1))];
        let options = parent_options(&categories, Some("2"), "1");
        assert_eq!(options.len(), 1);
        assert!(options[0].selected);
    }

    #[test]
    fn test_form_action() {
        let edit = CategoryFormView::from(&category(7, "Hats", None));
        assert_eq!(edit.action(PLATFORM.base), "/superadmin/categories/7");
        assert_eq!(CategoryFormView::default().action(MERCHANT.base), "/categories");
    }
}
