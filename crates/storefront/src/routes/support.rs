//! Customer support tickets.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use bazaar_backend::ApiError;
use bazaar_core::support::{NewTicket, ReplyDraft, Ticket, TicketPriority, TicketStatus};
use bazaar_core::{OrderId, TicketId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::routes::account::PageParams;
use crate::state::AppState;
use crate::views::{self, Page, Pager, flash};

const TICKETS_PER_PAGE: u32 = 10;

/// Ticket row in the list.
#[derive(Clone)]
pub struct TicketRow {
    pub href: String,
    pub subject: String,
    pub status_label: &'static str,
    pub status_class: &'static str,
    pub priority_label: &'static str,
    pub updated: String,
}

impl From<&Ticket> for TicketRow {
    fn from(ticket: &Ticket) -> Self {
        Self {
            href: format!("/support/{}", ticket.id),
            subject: ticket.subject.clone(),
            status_label: ticket.status.label(),
            status_class: ticket.status.badge_class(),
            priority_label: ticket.priority.label(),
            updated: views::format_date(ticket.updated_at.or(ticket.created_at)),
        }
    }
}

/// Ticket list template.
#[derive(Template, WebTemplate)]
#[template(path = "support/index.html")]
pub struct SupportIndexTemplate {
    pub page: Page,
    pub tickets: Vec<TicketRow>,
    pub pager: Pager,
    pub error: Option<String>,
}

/// Display the shopper's tickets.
#[instrument(skip(state, customer, page))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    page: Page,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse> {
    let requested = params.page.unwrap_or(1).max(1);
    let (listing, error) = match state.backend().my_tickets(customer.token(), requested).await {
        Ok(listing) => (listing, None),
        Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized.into()),
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch tickets");
            (
                bazaar_backend::Paginated::empty(),
                Some("We could not load your tickets right now.".to_string()),
            )
        }
    };

    let pagination = listing.pagination(TICKETS_PER_PAGE);
    Ok(SupportIndexTemplate {
        page,
        tickets: listing.items.iter().map(TicketRow::from).collect(),
        pager: Pager::new(&pagination, |n| format!("/support?page={n}")),
        error,
    })
}

/// New ticket form data, kept as text so it can be re-rendered as typed.
#[derive(Debug, Default, Deserialize)]
pub struct NewTicketForm {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub attachment_url: String,
}

impl NewTicketForm {
    fn ticket(&self) -> NewTicket {
        NewTicket {
            subject: self.subject.clone(),
            priority: TicketPriority::from_param(&self.priority).unwrap_or_default(),
            order_id: self.order_id.trim().parse::<OrderId>().ok(),
            message: ReplyDraft {
                body: self.body.clone(),
                attachment_url: Some(self.attachment_url.clone()),
            },
        }
    }
}

/// A choice in a select box.
#[derive(Clone)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// New ticket template.
#[derive(Template, WebTemplate)]
#[template(path = "support/new.html")]
pub struct NewTicketTemplate {
    pub page: Page,
    pub form: NewTicketForm,
    pub priorities: Vec<SelectOption>,
    pub orders: Vec<SelectOption>,
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NewTicketParams {
    pub order: Option<String>,
}

async fn new_ticket_template(
    state: &AppState,
    token: &str,
    page: Page,
    form: NewTicketForm,
    error: Option<String>,
) -> NewTicketTemplate {
    let selected_priority = TicketPriority::from_param(&form.priority).unwrap_or_default();
    let orders = match state.backend().my_orders(token, 1).await {
        Ok(orders) => orders
            .items
            .iter()
            .map(|o| SelectOption {
                value: o.id.to_string(),
                label: format!("{} ({})", o.display_number(), views::format_date(o.created_at)),
                selected: form.order_id.trim() == o.id.to_string(),
            })
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch orders for ticket form");
            Vec::new()
        }
    };

    NewTicketTemplate {
        page,
        priorities: TicketPriority::ALL
            .into_iter()
            .map(|p| SelectOption {
                value: p.as_str().to_string(),
                label: p.label().to_string(),
                selected: p == selected_priority,
            })
            .collect(),
        orders,
        form,
        error,
    }
}

/// Display the new ticket form. `?order=ID` preselects an order.
#[instrument(skip(state, customer, page))]
pub async fn new_ticket_page(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    page: Page,
    Query(params): Query<NewTicketParams>,
) -> impl IntoResponse {
    let form = NewTicketForm {
        order_id: params.order.unwrap_or_default(),
        ..NewTicketForm::default()
    };
    new_ticket_template(&state, customer.token(), page, form, None).await
}

/// Open a ticket.
#[instrument(skip(state, customer, session, page, form))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    session: Session,
    page: Page,
    Form(form): Form<NewTicketForm>,
) -> Result<Response> {
    let ticket = match form.ticket().validate() {
        Ok(ticket) => ticket,
        Err(e) => {
            let error = Some(e.to_string());
            return Ok(new_ticket_template(&state, customer.token(), page, form, error)
                .await
                .into_response());
        }
    };

    let created = match state.backend().open_ticket(customer.token(), &ticket).await {
        Ok(created) => created,
        Err(ApiError::Validation(message)) => {
            return Ok(
                new_ticket_template(&state, customer.token(), page, form, Some(message))
                    .await
                    .into_response(),
            );
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(ticket = %created.id, "Support ticket opened");
    flash(&session, "Your request has been sent. We will get back to you soon.").await;
    Ok(Redirect::to(&format!("/support/{}", created.id)).into_response())
}

/// One message of a thread.
#[derive(Clone)]
pub struct MessageView {
    pub author: String,
    pub from_staff: bool,
    pub body: String,
    pub attachment_url: Option<String>,
    pub at: String,
}

/// Ticket thread template.
#[derive(Template, WebTemplate)]
#[template(path = "support/show.html")]
pub struct TicketTemplate {
    pub page: Page,
    pub id: String,
    pub subject: String,
    pub status_label: &'static str,
    pub status_class: &'static str,
    pub priority_label: &'static str,
    pub order_href: Option<String>,
    pub messages: Vec<MessageView>,
    pub accepts_replies: bool,
}

/// Display a ticket thread.
#[instrument(skip(state, customer, page))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    page: Page,
    Path(id): Path<TicketId>,
) -> Result<impl IntoResponse> {
    let ticket = state
        .backend()
        .my_ticket(customer.token(), id)
        .await
        .map_err(|e| {
            if e.is_not_found() {
                AppError::NotFound(format!("ticket {id}"))
            } else {
                AppError::Backend(e)
            }
        })?;

    Ok(TicketTemplate {
        page,
        id: ticket.id.to_string(),
        subject: ticket.subject.clone(),
        status_label: ticket.status.label(),
        status_class: ticket.status.badge_class(),
        priority_label: ticket.priority.label(),
        order_href: ticket.order_id.map(|o| format!("/account/orders/{o}")),
        messages: ticket
            .messages
            .iter()
            .map(|m| MessageView {
                author: if m.is_from_staff() {
                    m.author_name.clone().unwrap_or_else(|| "Support".to_string())
                } else {
                    "You".to_string()
                },
                from_staff: m.is_from_staff(),
                body: m.body.clone(),
                attachment_url: m.attachment_url.clone(),
                at: views::format_datetime(m.created_at),
            })
            .collect(),
        accepts_replies: ticket.status.accepts_replies(),
    })
}

/// Reply form data.
#[derive(Debug, Deserialize)]
pub struct ReplyForm {
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub attachment_url: String,
}

/// Reply to a ticket. Closed tickets are refused before calling the backend.
#[instrument(skip(state, customer, session, form))]
pub async fn reply(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    session: Session,
    Path(id): Path<TicketId>,
    Form(form): Form<ReplyForm>,
) -> Result<Redirect> {
    let back = Redirect::to(&format!("/support/{id}"));
    let ticket = state.backend().my_ticket(customer.token(), id).await?;

    let draft = ReplyDraft {
        body: form.body,
        attachment_url: Some(form.attachment_url),
    };
    let reply = match draft.validate_for(ticket.status) {
        Ok(reply) => reply,
        Err(e) => {
            flash(&session, e.to_string()).await;
            return Ok(back);
        }
    };

    match state
        .backend()
        .reply_to_ticket(customer.token(), id, &reply)
        .await
    {
        Ok(()) => {}
        Err(ApiError::Validation(message)) => flash(&session, message).await,
        Err(e) => return Err(e.into()),
    }
    Ok(back)
}

/// Close a ticket.
#[instrument(skip(state, customer, session))]
pub async fn close(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    session: Session,
    Path(id): Path<TicketId>,
) -> Result<Redirect> {
    let ticket = state.backend().my_ticket(customer.token(), id).await?;
    if ticket.status == TicketStatus::Closed {
        flash(&session, "This ticket is already closed.").await;
    } else {
        state.backend().close_ticket(customer.token(), id).await?;
        tracing::info!(ticket = %id, "Support ticket closed by customer");
        flash(&session, "Ticket closed.").await;
    }
    Ok(Redirect::to(&format!("/support/{id}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ticket_form_maps_fields() {
        let form = NewTicketForm {
            subject: "  Late parcel ".to_string(),
            priority: "high".to_string(),
            order_id: "42".to_string(),
            body: "Where is it?".to_string(),
            attachment_url: String::new(),
        };
        let ticket = form.ticket().validate().unwrap_or_default();
        assert_eq!(ticket.subject, "Late parcel");
        assert_eq!(ticket.priority, TicketPriority::High);
        assert_eq!(ticket.order_id, Some(OrderId::new(42)));
        assert_eq!(ticket.message.attachment_url, None);
    }

    #[test]
    fn test_unknown_priority_falls_back_to_default() {
        let form = NewTicketForm {
            priority: "whenever".to_string(),
            ..NewTicketForm::default()
        };
        assert_eq!(form.ticket().priority, TicketPriority::default());
    }
}
