use thiserror::Error;

/// Errors returned by [`BackendClient`](crate::BackendClient) calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The bearer token is missing, expired or revoked.
    #[error("Not signed in")]
    Unauthorized,

    /// Signed in, but not allowed to do this.
    #[error("Access denied")]
    Forbidden,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend rejected the input (400/422).
    #[error("{0}")]
    Validation(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success status.
    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configured base URL plus path is not a valid URL.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Message safe to show to the person using the site.
    ///
    /// Validation messages come from the backend and are meant for users;
    /// everything else gets a generic line.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Unauthorized => "Please sign in to continue.".to_string(),
            Self::Forbidden => "You do not have access to that.".to_string(),
            Self::NotFound(_) => "We could not find what you were looking for.".to_string(),
            Self::RateLimited(_) => "Too many requests. Please try again shortly.".to_string(),
            Self::Http(_) | Self::Status { .. } | Self::Parse(_) | Self::Url(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }
}
