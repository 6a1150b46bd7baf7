//! Support tickets raised against the merchant's shop.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{Html, Redirect},
    routing::{get, post},
};
use bazaar_backend::{ApiError, Paginated};
use bazaar_core::TicketId;
use bazaar_core::support::{ReplyDraft, Ticket, TicketMessage, TicketStatus};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireMerchant;
use crate::routes::orders::StatusTab;
use crate::state::AppState;
use crate::views::{AdminUserView, Pager, filter_param, flash, format_datetime, take_flash};

const TICKETS_PER_PAGE: u32 = 20;

/// Ticket row for the list.
#[derive(Debug, Clone)]
pub struct TicketRow {
    pub id: String,
    pub subject: String,
    pub customer: String,
    pub status: &'static str,
    pub status_label: &'static str,
    pub status_class: &'static str,
    pub priority_label: &'static str,
    pub priority_class: &'static str,
    pub updated: String,
}

impl From<&Ticket> for TicketRow {
    fn from(ticket: &Ticket) -> Self {
        Self {
            id: ticket.id.to_string(),
            subject: ticket.subject.clone(),
            customer: ticket
                .customer_name
                .clone()
                .unwrap_or_else(|| ticket.created_by_role.label().to_string()),
            status: ticket.status.as_str(),
            status_label: ticket.status.label(),
            status_class: ticket.status.badge_class(),
            priority_label: ticket.priority.label(),
            priority_class: ticket.priority.badge_class(),
            updated: format_datetime(ticket.updated_at.or(ticket.created_at)),
        }
    }
}

/// One message in the thread.
#[derive(Debug, Clone)]
pub struct MessageView {
    pub author: String,
    pub from_staff: bool,
    pub body: String,
    pub attachment_url: Option<String>,
    pub sent: String,
}

impl From<&TicketMessage> for MessageView {
    fn from(message: &TicketMessage) -> Self {
        Self {
            author: message
                .author_name
                .clone()
                .unwrap_or_else(|| message.author_role.label().to_string()),
            from_staff: message.is_from_staff(),
            body: message.body.clone(),
            attachment_url: message.attachment_url.clone(),
            sent: format_datetime(message.created_at),
        }
    }
}

/// Status the merchant can set from the detail page.
#[derive(Debug, Clone)]
pub struct StatusOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Tickets list template.
#[derive(Template)]
#[template(path = "tickets/index.html")]
pub struct TicketsTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<String>,
    pub tickets: Vec<TicketRow>,
    pub tabs: Vec<StatusTab>,
    pub pager: Pager,
    pub error: Option<String>,
}

/// Ticket detail template.
#[derive(Template)]
#[template(path = "tickets/show.html")]
pub struct TicketTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<String>,
    pub ticket: TicketRow,
    pub order_id: Option<String>,
    pub messages: Vec<MessageView>,
    pub statuses: Vec<StatusOption>,
    pub accepts_replies: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct TicketsQuery {
    pub status: Option<String>,
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ReplyForm {
    pub body: String,
    #[serde(default)]
    pub attachment_url: String,
    /// Status the page was rendered with.
    pub status: String,
}

impl ReplyForm {
    fn draft(&self) -> std::result::Result<ReplyDraft, String> {
        let status = TicketStatus::from_param(&self.status).unwrap_or_default();
        ReplyDraft {
            body: self.body.clone(),
            attachment_url: Some(self.attachment_url.clone()),
        }
        .validate_for(status)
        .map_err(|e| e.to_string())
    }
}

#[derive(Debug, Deserialize)]
pub struct TicketStatusForm {
    pub status: String,
}

fn status_tabs(selected: Option<TicketStatus>) -> Vec<StatusTab> {
    let all = StatusTab {
        href: "/tickets".to_string(),
        label: "All",
        active: selected.is_none(),
    };
    std::iter::once(all)
        .chain(TicketStatus::ALL.into_iter().map(|s| StatusTab {
            href: format!("/tickets?status={}", s.as_str()),
            label: s.label(),
            active: selected == Some(s),
        }))
        .collect()
}

fn ticket_href(id: TicketId) -> String {
    format!("/tickets/{id}")
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tickets", get(index))
        .route("/tickets/{id}", get(show))
        .route("/tickets/{id}/reply", post(reply))
        .route("/tickets/{id}/status", post(set_status))
}

/// Ticket list with a status filter.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireMerchant(admin, _shop): RequireMerchant,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<TicketsQuery>,
) -> Result<Html<String>> {
    let status = query.status.as_deref().and_then(TicketStatus::from_param);
    let page = query.page.unwrap_or(1).max(1);

    let (listing, error) = match state
        .backend()
        .merchant_tickets(admin.token(), status, page)
        .await
    {
        Ok(listing) => (listing, None),
        Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized.into()),
        Err(e) => {
            tracing::error!("Failed to fetch tickets: {e}");
            (
                Paginated::empty(),
                Some("Tickets could not be loaded right now.".to_string()),
            )
        }
    };

    let pagination = listing.pagination(TICKETS_PER_PAGE);
    let status_param = status.map(TicketStatus::as_str);
    let template = TicketsTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/tickets".to_string(),
        flash: take_flash(&session).await,
        tickets: listing.items.iter().map(TicketRow::from).collect(),
        tabs: status_tabs(status),
        pager: Pager::new(&pagination, |n| {
            format!("/tickets?{}page={n}", filter_param("status", status_param))
        }),
        error,
    };

    Ok(Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    })))
}

/// Ticket thread with reply and status forms.
#[instrument(skip(admin, state, session))]
pub async fn show(
    RequireMerchant(admin, _shop): RequireMerchant,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<TicketId>,
) -> Result<Html<String>> {
    let ticket = match state.backend().merchant_ticket(admin.token(), id).await {
        Ok(ticket) => ticket,
        Err(e) if e.is_not_found() => {
            return Err(AppError::NotFound(format!("Ticket {id} not found")));
        }
        Err(e) => return Err(e.into()),
    };

    let template = TicketTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/tickets".to_string(),
        flash: take_flash(&session).await,
        order_id: ticket.order_id.map(|o| o.to_string()),
        messages: ticket.messages.iter().map(MessageView::from).collect(),
        statuses: TicketStatus::ALL
            .into_iter()
            .map(|s| StatusOption {
                value: s.as_str(),
                label: s.label(),
                selected: s == ticket.status,
            })
            .collect(),
        accepts_replies: ticket.status.accepts_replies(),
        ticket: TicketRow::from(&ticket),
    };

    Ok(Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    })))
}

/// Post a staff reply.
#[instrument(skip(admin, state, session, form))]
pub async fn reply(
    RequireMerchant(admin, _shop): RequireMerchant,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<TicketId>,
    Form(form): Form<ReplyForm>,
) -> Result<Redirect> {
    let back = Redirect::to(&ticket_href(id));
    let draft = match form.draft() {
        Ok(draft) => draft,
        Err(message) => {
            flash(&session, message).await;
            return Ok(back);
        }
    };

    match state.backend().merchant_reply(admin.token(), id, &draft).await {
        Ok(()) => {
            tracing::info!(ticket = %id, "Merchant replied to ticket");
            flash(&session, "Reply sent.").await;
        }
        Err(ApiError::Validation(message)) => flash(&session, message).await,
        Err(e) => return Err(e.into()),
    }
    Ok(back)
}

/// Change a ticket's status.
#[instrument(skip(admin, state, session, form))]
pub async fn set_status(
    RequireMerchant(admin, _shop): RequireMerchant,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<TicketId>,
    Form(form): Form<TicketStatusForm>,
) -> Result<Redirect> {
    let back = Redirect::to(&ticket_href(id));
    let Some(status) = TicketStatus::from_param(&form.status) else {
        flash(&session, "Unknown ticket status.").await;
        return Ok(back);
    };

    match state
        .backend()
        .set_ticket_status(admin.token(), id, status)
        .await
    {
        Ok(()) => {
            flash(
                &session,
                format!("Ticket marked as {}.", status.label().to_lowercase()),
            )
            .await;
        }
        Err(ApiError::Validation(message)) => flash(&session, message).await,
        Err(e) => return Err(e.into()),
    }
    Ok(back)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn reply(body: &str, status: &str) -> ReplyForm {
        ReplyForm {
            body: body.to_string(),
            attachment_url: " ".to_string(),
            status: status.to_string(),
        }
    }

    #[test]
    fn test_reply_to_open_ticket() {
        let draft = reply("  On its way  ", "in_progress").draft().unwrap();
        assert_eq!(draft.body, "On its way");
        assert_eq!(draft.attachment_url, None);
    }

    #[test]
    fn test_reply_refused_when_closed_or_empty() {
        assert_eq!(
            reply("Hello", "closed").draft().unwrap_err(),
            "This ticket is closed"
        );
        assert_eq!(reply("   ", "open").draft().unwrap_err(), "Message is required");
    }

    #[test]
    fn test_row_falls_back_to_role() {
        let ticket: Ticket = serde_json::from_value(serde_json::json!({
            "id": 9,
            "subject": "Where is my parcel?",
            "status": "open",
            "created_by_role": "customer"
        }))
        .unwrap();
        let row = TicketRow::from(&ticket);
        assert_eq!(row.customer, "Customer");
        assert_eq!(row.status_label, "Open");
        assert_eq!(row.updated, "-");
    }

    #[test]
    fn test_tabs() {
        let tabs = status_tabs(None);
        assert_eq!(tabs.len(), 5);
        assert!(tabs[0].active);
        assert_eq!(tabs[2].href, "/tickets?status=in_progress");
    }
}
