//! Customer support tickets.

use bazaar_core::TicketId;
use bazaar_core::support::{NewTicket, ReplyDraft, Ticket};
use reqwest::Method;
use tracing::instrument;

use crate::client::BackendClient;
use crate::error::ApiError;
use crate::types::{Listing, Paginated};

impl BackendClient {
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn my_tickets(&self, token: &str, page: u32) -> Result<Paginated<Ticket>, ApiError> {
        Ok(self
            .get::<Listing<Ticket>>(
                "/api/user/support/tickets",
                &[("page", page.max(1).to_string())],
                Some(token),
            )
            .await?
            .into_page())
    }

    /// A ticket with its full message thread.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for tickets the customer does not own.
    #[instrument(skip(self, token), fields(ticket = %id))]
    pub async fn my_ticket(&self, token: &str, id: TicketId) -> Result<Ticket, ApiError> {
        self.get(&format!("/api/user/support/tickets/{id}"), &[], Some(token))
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token, ticket), fields(subject = %ticket.subject))]
    pub async fn open_ticket(&self, token: &str, ticket: &NewTicket) -> Result<Ticket, ApiError> {
        self.post("/api/user/support/tickets", Some(token), ticket)
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token, reply), fields(ticket = %id))]
    pub async fn reply_to_ticket(
        &self,
        token: &str,
        id: TicketId,
        reply: &ReplyDraft,
    ) -> Result<(), ApiError> {
        self.send(
            Method::POST,
            &format!("/api/user/support/tickets/{id}/messages"),
            Some(token),
            Some(reply),
        )
        .await
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(ticket = %id))]
    pub async fn close_ticket(&self, token: &str, id: TicketId) -> Result<(), ApiError> {
        self.send_empty(
            Method::POST,
            &format!("/api/user/support/tickets/{id}/close"),
            Some(token),
        )
        .await
    }
}
