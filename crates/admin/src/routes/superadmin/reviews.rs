//! Review moderation queue (superadmin only).

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{Html, Redirect},
    routing::{get, post},
};
use bazaar_backend::{ApiError, Paginated};
use bazaar_core::ReviewId;
use bazaar_core::review::{Review, ReviewStatus};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireSuperAdmin;
use crate::routes::orders::StatusTab;
use crate::state::AppState;
use crate::views::{AdminUserView, Pager, flash, format_datetime, take_flash};

const REVIEWS_PER_PAGE: u32 = 20;

/// Review row for the queue.
#[derive(Debug, Clone)]
pub struct ReviewRow {
    pub id: String,
    pub product_id: String,
    pub rating: u8,
    pub stars: String,
    pub title: String,
    pub body: String,
    pub author: String,
    pub images: Vec<String>,
    pub status_label: &'static str,
    pub status_class: &'static str,
    pub is_pending: bool,
    pub submitted: String,
}

impl From<&Review> for ReviewRow {
    fn from(review: &Review) -> Self {
        let (full, empty) = review.stars();
        Self {
            id: review.id.to_string(),
            product_id: review.product_id.to_string(),
            rating: review.rating,
            stars: format!(
                "{}{}",
                "★".repeat(usize::from(full)),
                "☆".repeat(usize::from(empty))
            ),
            title: review.title.clone(),
            body: review.body.clone(),
            author: review
                .author_name
                .clone()
                .unwrap_or_else(|| "Anonymous".to_string()),
            images: review.images.clone(),
            status_label: review.status.label(),
            status_class: review.status.badge_class(),
            is_pending: review.status == ReviewStatus::Pending,
            submitted: format_datetime(review.created_at),
        }
    }
}

/// Moderation page template.
#[derive(Template)]
#[template(path = "superadmin/reviews.html")]
pub struct ReviewsTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<String>,
    pub reviews: Vec<ReviewRow>,
    pub tabs: Vec<StatusTab>,
    pub status: &'static str,
    pub page: u32,
    pub pager: Pager,
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReviewsQuery {
    pub status: Option<String>,
    pub page: Option<u32>,
}

/// Where to go back to after a decision.
#[derive(Debug, Default, Deserialize)]
pub struct ModerationForm {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub page: Option<u32>,
}

fn reviews_href(status: ReviewStatus, page: u32) -> String {
    format!("/superadmin/reviews?status={}&page={page}", status.as_str())
}

fn status_tabs(selected: ReviewStatus) -> Vec<StatusTab> {
    ReviewStatus::ALL
        .into_iter()
        .map(|s| StatusTab {
            href: format!("/superadmin/reviews?status={}", s.as_str()),
            label: s.label(),
            active: s == selected,
        })
        .collect()
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/superadmin/reviews", get(index))
        .route("/superadmin/reviews/{id}/approve", post(approve))
        .route("/superadmin/reviews/{id}/reject", post(reject))
}

/// Reviews by moderation state, pending first by default.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireSuperAdmin(admin): RequireSuperAdmin,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ReviewsQuery>,
) -> Result<Html<String>> {
    let status = query
        .status
        .as_deref()
        .and_then(ReviewStatus::from_param)
        .unwrap_or_default();
    let page = query.page.unwrap_or(1).max(1);

    let (listing, error) = match state
        .backend()
        .moderation_queue(admin.token(), status, page)
        .await
    {
        Ok(listing) => (listing, None),
        Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized.into()),
        Err(e) => {
            tracing::error!("Failed to fetch moderation queue: {e}");
            (
                Paginated::empty(),
                Some("Reviews could not be loaded right now.".to_string()),
            )
        }
    };

    let pagination = listing.pagination(REVIEWS_PER_PAGE);
    let template = ReviewsTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/superadmin/reviews".to_string(),
        flash: take_flash(&session).await,
        reviews: listing.items.iter().map(ReviewRow::from).collect(),
        tabs: status_tabs(status),
        status: status.as_str(),
        page: pagination.page(),
        pager: Pager::new(&pagination, |n| reviews_href(status, n)),
        error,
    };

    Ok(Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    })))
}

async fn moderate(
    state: &AppState,
    session: &Session,
    token: &str,
    id: ReviewId,
    approve: bool,
    form: &ModerationForm,
) -> Result<Redirect> {
    let status = ReviewStatus::from_param(&form.status).unwrap_or_default();
    let back = Redirect::to(&reviews_href(status, form.page.unwrap_or(1).max(1)));

    match state.backend().moderate_review(token, id, approve).await {
        Ok(()) => {
            let verb = if approve { "approved" } else { "rejected" };
            flash(session, format!("Review {id} {verb}.")).await;
        }
        Err(e @ (ApiError::Validation(_) | ApiError::NotFound(_))) => {
            flash(session, e.user_message()).await;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(back)
}

/// Publish a review on the storefront.
#[instrument(skip(admin, state, session, form))]
pub async fn approve(
    RequireSuperAdmin(admin): RequireSuperAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ReviewId>,
    Form(form): Form<ModerationForm>,
) -> Result<Redirect> {
    moderate(&state, &session, admin.token(), id, true, &form).await
}

/// Keep a review off the storefront.
#[instrument(skip(admin, state, session, form))]
pub async fn reject(
    RequireSuperAdmin(admin): RequireSuperAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ReviewId>,
    Form(form): Form<ModerationForm>,
) -> Result<Redirect> {
    moderate(&state, &session, admin.token(), id, false, &form).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_row_from_review() {
        let review: Review = serde_json::from_value(serde_json::json!({
            "id": 11,
            "product_id": 3,
            "rating": 4,
            "comment": "Lovely mug",
            "status": "pending"
        }))
        .unwrap();
        let row = ReviewRow::from(&review);
        assert_eq!(row.stars, "★★★★☆");
        assert_eq!(row.body, "Lovely mug");
        assert_eq!(row.author, "Anonymous");
        assert!(row.is_pending);
    }

    #[test]
    fn test_tabs_and_hrefs() {
        let tabs = status_tabs(ReviewStatus::Approved);
        assert_eq!(tabs.len(), 3);
        assert!(tabs[1].active);
        assert_eq!(
            reviews_href(ReviewStatus::Rejected, 2),
            "/superadmin/reviews?status=rejected&page=2"
        );
    }
}
