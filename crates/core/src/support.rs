//! Support tickets shared by the storefront and the merchant dashboard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::is_http_url;
use crate::{OrderId, TicketId, TicketMessageId, UserRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub const ALL: [Self; 4] = [Self::Open, Self::InProgress, Self::Resolved, Self::Closed];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::InProgress => "In progress",
            Self::Resolved => "Resolved",
            Self::Closed => "Closed",
        }
    }

    #[must_use]
    pub const fn badge_class(self) -> &'static str {
        match self {
            Self::Open => "bg-blue-100 text-blue-700",
            Self::InProgress => "bg-yellow-100 text-yellow-700",
            Self::Resolved => "bg-green-100 text-green-700",
            Self::Closed => "bg-gray-100 text-gray-600",
        }
    }

    /// Closed tickets are read-only.
    #[must_use]
    pub const fn accepts_replies(self) -> bool {
        !matches!(self, Self::Closed)
    }

    #[must_use]
    pub fn from_param(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TicketPriority {
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Urgent];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Urgent => "Urgent",
        }
    }

    #[must_use]
    pub const fn badge_class(self) -> &'static str {
        match self {
            Self::Low => "bg-gray-100 text-gray-600",
            Self::Medium => "bg-blue-100 text-blue-700",
            Self::High => "bg-orange-100 text-orange-700",
            Self::Urgent => "bg-red-100 text-red-700",
        }
    }

    #[must_use]
    pub fn from_param(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == value)
    }
}

/// One message in a ticket thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketMessage {
    #[serde(alias = "message_id")]
    pub id: TicketMessageId,
    #[serde(default)]
    pub author_role: UserRole,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(alias = "message")]
    pub body: String,
    #[serde(default)]
    pub attachment_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl TicketMessage {
    #[must_use]
    pub const fn is_from_staff(&self) -> bool {
        self.author_role.is_staff()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    #[serde(alias = "ticket_id")]
    pub id: TicketId,
    pub subject: String,
    #[serde(default)]
    pub status: TicketStatus,
    #[serde(default)]
    pub priority: TicketPriority,
    #[serde(default)]
    pub created_by_role: UserRole,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub order_id: Option<OrderId>,
    #[serde(default)]
    pub messages: Vec<TicketMessage>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TicketError {
    #[error("Subject must be between {min} and {max} characters")]
    SubjectLength { min: usize, max: usize },
    #[error("Message is required")]
    EmptyMessage,
    #[error("Message must be at most {0} characters")]
    MessageTooLong(usize),
    #[error("Attachment must be an http(s) URL")]
    InvalidAttachment,
    #[error("This ticket is closed")]
    Closed,
}

pub const SUBJECT_MIN: usize = 3;
pub const SUBJECT_MAX: usize = 150;
pub const MESSAGE_MAX: usize = 5000;

/// Reply form input, also used for the first message of a new ticket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyDraft {
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub attachment_url: Option<String>,
}

impl ReplyDraft {
    /// Trim and check the message.
    ///
    /// # Errors
    ///
    /// Returns the first failed rule.
    pub fn validate(&self) -> Result<Self, TicketError> {
        let body = self.body.trim();
        if body.is_empty() {
            return Err(TicketError::EmptyMessage);
        }
        if body.chars().count() > MESSAGE_MAX {
            return Err(TicketError::MessageTooLong(MESSAGE_MAX));
        }
        let attachment_url = self
            .attachment_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);
        if attachment_url.as_deref().is_some_and(|u| !is_http_url(u)) {
            return Err(TicketError::InvalidAttachment);
        }
        Ok(Self {
            body: body.to_string(),
            attachment_url,
        })
    }

    /// Validate a reply to an existing ticket.
    ///
    /// # Errors
    ///
    /// [`TicketError::Closed`] for closed tickets, otherwise as
    /// [`validate`](Self::validate).
    pub fn validate_for(&self, status: TicketStatus) -> Result<Self, TicketError> {
        if !status.accepts_replies() {
            return Err(TicketError::Closed);
        }
        self.validate()
    }
}

/// New ticket form input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTicket {
    pub subject: String,
    #[serde(default)]
    pub priority: TicketPriority,
    #[serde(default)]
    pub order_id: Option<OrderId>,
    #[serde(flatten)]
    pub message: ReplyDraft,
}

impl NewTicket {
    /// # Errors
    ///
    /// Returns the first failed rule.
    pub fn validate(&self) -> Result<Self, TicketError> {
        let subject = self.subject.trim();
        let len = subject.chars().count();
        if !(SUBJECT_MIN..=SUBJECT_MAX).contains(&len) {
            return Err(TicketError::SubjectLength {
                min: SUBJECT_MIN,
                max: SUBJECT_MAX,
            });
        }
        Ok(Self {
            subject: subject.to_string(),
            priority: self.priority,
            order_id: self.order_id,
            message: self.message.validate()?,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ticket(subject: &str, body: &str) -> NewTicket {
        NewTicket {
            subject: subject.into(),
            priority: TicketPriority::High,
            order_id: None,
            message: ReplyDraft {
                body: body.into(),
                attachment_url: None,
            },
        }
    }

    #[test]
    fn test_new_ticket_subject_bounds() {
        assert!(ticket("Hi", "body").validate().is_err());
        assert!(ticket("Hey", "body").validate().is_ok());
        assert!(ticket(&"s".repeat(151), "body").validate().is_err());
        assert_eq!(ticket("  Late parcel ", "x").validate().unwrap().subject, "Late parcel");
    }

    #[test]
    fn test_message_rules() {
        assert_eq!(ticket("Help me", "   ").validate(), Err(TicketError::EmptyMessage));
        assert_eq!(
            ticket("Help me", &"m".repeat(5001)).validate(),
            Err(TicketError::MessageTooLong(5000))
        );
        let bad_attachment = ReplyDraft {
            body: "see file".into(),
            attachment_url: Some("file:///etc/passwd".into()),
        };
        assert_eq!(bad_attachment.validate(), Err(TicketError::InvalidAttachment));
    }

    #[test]
    fn test_closed_tickets_reject_replies() {
        let reply = ReplyDraft {
            body: "any update?".into(),
            attachment_url: None,
        };
        assert_eq!(reply.validate_for(TicketStatus::Closed), Err(TicketError::Closed));
        assert!(reply.validate_for(TicketStatus::Resolved).is_ok());
    }

    #[test]
    fn test_status_and_priority_params() {
        assert_eq!(TicketStatus::from_param("in_progress"), Some(TicketStatus::InProgress));
        assert_eq!(TicketStatus::from_param("bogus"), None);
        assert_eq!(TicketPriority::from_param("urgent"), Some(TicketPriority::Urgent));
        assert!(TicketPriority::Urgent > TicketPriority::Low);
    }

    #[test]
    fn test_ticket_deserializes_with_defaults() {
        let t: Ticket = serde_json::from_str(
            r#"{"ticket_id": 4, "subject": "Where is my order?",
                "messages": [{"id": 1, "message": "Hello", "author_role": "merchant"}]}"#,
        )
        .unwrap();
        assert_eq!(t.status, TicketStatus::Open);
        assert_eq!(t.priority, TicketPriority::Medium);
        assert!(t.messages.first().unwrap().is_from_staff());
    }
}
