use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};
use url::Url;

use crate::cache::{CacheKey, CacheValue};
use crate::error::ApiError;

/// Client for the commerce backend's REST API.
///
/// Cheap to clone; clones share the HTTP connection pool and the catalog
/// cache.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

impl BackendClient {
    /// Create a client for `base_url` (e.g. `https://api.example.com`).
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL does not parse or the HTTP client
    /// cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base = Url::parse(base_url)?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("bazaar/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .support_invalidation_closures()
            .build();

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: base.as_str().trim_end_matches('/').to_string(),
                cache,
            }),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub(crate) fn cache(&self) -> &Cache<CacheKey, CacheValue> {
        &self.inner.cache
    }

    fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&format!("{}{path}", self.inner.base_url))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Send one request and return the body of a successful response.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<String, ApiError> {
        let url = self.url(path, query)?;
        debug!(%method, %url, "Backend request");

        let mut request = self
            .inner
            .client
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        // Read the body as text first for better error diagnostics
        let text = response.text().await?;
        if status.is_success() {
            return Ok(text);
        }

        let message = error_message(&text);
        if status.is_server_error() {
            error!(
                status = %status,
                path,
                body = %text.chars().take(500).collect::<String>(),
                "Backend returned server error"
            );
        } else {
            debug!(status = %status, path, reason = %message, "Backend rejected request");
        }

        Err(match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
            StatusCode::FORBIDDEN => ApiError::Forbidden,
            StatusCode::NOT_FOUND => ApiError::NotFound(path.to_string()),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ApiError::Validation(message)
            }
            other => ApiError::Status {
                status: other.as_u16(),
                message,
            },
        })
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        token: Option<&str>,
    ) -> Result<T, ApiError> {
        let text = self.execute(Method::GET, path, query, token, None).await?;
        decode(&text, path)
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        token: Option<&str>,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body)?;
        let text = self
            .execute(Method::POST, path, &[], token, Some(body))
            .await?;
        decode(&text, path)
    }

    /// Send a request whose response body is not needed.
    pub(crate) async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<&B>,
    ) -> Result<(), ApiError> {
        let body = body.map(serde_json::to_value).transpose()?;
        self.execute(method, path, &[], token, body).await?;
        Ok(())
    }

    /// [`send`](Self::send) without a body.
    pub(crate) async fn send_empty(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
    ) -> Result<(), ApiError> {
        self.execute(method, path, &[], token, None).await?;
        Ok(())
    }
}

/// Parse a response body that may be bare or wrapped in `{"data": ...}`.
pub(crate) fn decode<T: DeserializeOwned>(text: &str, path: &str) -> Result<T, ApiError> {
    let value: Value = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(text).map_err(|e| {
            warn!(error = %e, path, "Backend response is not JSON");
            e
        })?
    };

    // A `data` array usually sits next to paging fields, so the whole object
    // is tried first; any other `data` value is an envelope.
    if let Value::Object(map) = &value
        && let Some(data) = map.get("data")
    {
        if data.is_array() {
            if let Ok(whole) = T::deserialize(&value) {
                return Ok(whole);
            }
            if let Ok(inner) = T::deserialize(data) {
                return Ok(inner);
            }
        } else if let Ok(inner) = T::deserialize(data) {
            return Ok(inner);
        }
    }

    serde_json::from_value(value).map_err(|e| {
        error!(
            error = %e,
            path,
            body = %text.chars().take(500).collect::<String>(),
            "Failed to parse backend response"
        );
        ApiError::Parse(e)
    })
}

/// Best human-readable message from an error body.
///
/// Understands `{"message": ...}`, `{"error": ...}` and field-error maps
/// (`{"errors": {"email": ["taken"]}}`), falling back to the raw text.
fn error_message(text: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(text) {
        let first_field_error = map.get("errors").and_then(|errors| match errors {
            Value::Object(fields) => fields.values().find_map(|v| match v {
                Value::Array(items) => items.first().and_then(Value::as_str).map(String::from),
                Value::String(s) => Some(s.clone()),
                _ => None,
            }),
            Value::Array(items) => items.first().and_then(Value::as_str).map(String::from),
            _ => None,
        });
        let message = map
            .get("message")
            .or_else(|| map.get("error"))
            .and_then(Value::as_str)
            .map(String::from);
        if let Some(message) = first_field_error.or(message) {
            return message;
        }
    }
    let trimmed = text.trim();
    if trimmed.is_empty() {
        "no details".to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::Router;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use serde::Deserialize;

    use super::*;
    use crate::testing::serve;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Thing {
        id: i64,
    }

    #[test]
    fn test_decode_unwraps_data() {
        let wrapped: Thing = decode(r#"{"data": {"id": 3}}"#, "/x").unwrap();
        assert_eq!(wrapped, Thing { id: 3 });
        let bare: Thing = decode(r#"{"id": 4}"#, "/x").unwrap();
        assert_eq!(bare, Thing { id: 4 });
        decode::<()>("", "/x").unwrap();
        assert!(matches!(decode::<Thing>("<html>", "/x"), Err(ApiError::Parse(_))));
    }

    #[test]
    fn test_error_message_shapes() {
        assert_eq!(error_message(r#"{"message": "Bad input"}"#), "Bad input");
        assert_eq!(
            error_message(r#"{"message": "Invalid", "errors": {"email": ["Email taken"]}}"#),
            "Email taken"
        );
        assert_eq!(error_message(r#"{"error": "nope"}"#), "nope");
        assert_eq!(error_message("plain failure"), "plain failure");
        assert_eq!(error_message(""), "no details");
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let router = Router::new()
            .route("/401", get(|| async { StatusCode::UNAUTHORIZED }))
            .route("/403", get(|| async { StatusCode::FORBIDDEN }))
            .route(
                "/422",
                get(|| async {
                    (
                        StatusCode::UNPROCESSABLE_ENTITY,
                        r#"{"message": "Title is required"}"#,
                    )
                }),
            )
            .route(
                "/429",
                get(|| async { (StatusCode::TOO_MANY_REQUESTS, [("retry-after", "7")], "") }),
            )
            .route("/500", get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }));
        let client = serve(router).await;

        let err = client.get::<Value>("/401", &[], None).await.unwrap_err();
        assert!(err.is_unauthorized());
        assert!(matches!(
            client.get::<Value>("/403", &[], None).await,
            Err(ApiError::Forbidden)
        ));
        assert!(client.get::<Value>("/missing", &[], None).await.unwrap_err().is_not_found());
        match client.get::<Value>("/422", &[], None).await {
            Err(ApiError::Validation(message)) => assert_eq!(message, "Title is required"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            client.get::<Value>("/429", &[], None).await,
            Err(ApiError::RateLimited(7))
        ));
        match client.get::<Value>("/500", &[], None).await {
            Err(ApiError::Status { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_bearer_token_and_query_are_sent() {
        let router = Router::new().route(
            "/echo",
            post(
                |headers: HeaderMap,
                 axum::extract::RawQuery(query): axum::extract::RawQuery,
                 body: String| async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    axum::Json(serde_json::json!({
                        "auth": auth,
                        "query": query,
                        "body": body,
                    }))
                },
            ),
        )
        .route(
            "/search",
            get(|axum::extract::RawQuery(query): axum::extract::RawQuery| async move {
                axum::Json(serde_json::json!({ "query": query }))
            }),
        );
        let client = serve(router).await;

        let echoed: Value = client
            .post("/echo", Some("tok-123"), &serde_json::json!({"a": 1}))
            .await
            .unwrap();
        assert_eq!(echoed["auth"], "Bearer tok-123");
        assert_eq!(echoed["body"], r#"{"a":1}"#);

        let searched: Value = client
            .get("/search", &[("q", "blue shirt".to_string()), ("page", "2".to_string())], None)
            .await
            .unwrap();
        assert_eq!(searched["query"], "q=blue+shirt&page=2");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            BackendClient::new("not a url", Duration::from_secs(1)),
            Err(ApiError::Url(_))
        ));
    }
}
