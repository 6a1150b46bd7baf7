//! End-to-end harness for Bazaar.
//!
//! Each test starts a fake commerce backend plus real storefront and
//! back-office routers on ephemeral ports, then drives them over HTTP with a
//! cookie-keeping client. Sessions live in `MemoryStore`, so no database is
//! needed.

#![allow(clippy::unwrap_used)]

pub mod fake_backend;

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use bazaar_backend::BackendClient;
use secrecy::SecretString;
use tower_sessions::MemoryStore;

pub use fake_backend::FakeBackend;

/// Shops served by the test storefront. Requests to `127.0.0.1` fall back to
/// the default shop.
pub const TEST_SHOPS: &str = r#"
default: acme
shops:
  - id: 1
    slug: acme
    name: Acme Goods
    hosts: ["acme.localhost"]
    currency: USD
    shipping:
      flat_fee: "5.00"
      free_over: "50.00"
"#;

const SESSION_SECRET: &str = "k7Qp2Zx9Lm4Rt8Vb1Nc6Hd3Jf5Gs0Wy";

/// Serve `router` on an ephemeral port with peer addresses available to
/// handlers.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    addr
}

/// A running fake backend, storefront and back office.
pub struct TestEnv {
    pub backend: FakeBackend,
    storefront: SocketAddr,
    admin: SocketAddr,
}

impl TestEnv {
    pub async fn start() -> Self {
        let backend = FakeBackend::default();
        let backend_url = format!("http://{}", serve(backend.router()).await);
        let storefront = serve(storefront_app(&backend_url)).await;
        let admin = serve(admin_app(&backend_url)).await;
        Self {
            backend,
            storefront,
            admin,
        }
    }

    #[must_use]
    pub fn storefront_url(&self, path: &str) -> String {
        format!("http://{}{path}", self.storefront)
    }

    #[must_use]
    pub fn admin_url(&self, path: &str) -> String {
        format!("http://{}{path}", self.admin)
    }
}

fn backend_client(base_url: &str) -> BackendClient {
    BackendClient::new(base_url, Duration::from_secs(5)).unwrap()
}

fn storefront_app(backend_url: &str) -> Router {
    use bazaar_storefront::config::{ApiConfig, StorefrontConfig, parse_shops};

    let config = StorefrontConfig {
        database_url: SecretString::from("postgres://localhost/unused"),
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: "http://127.0.0.1".to_string(),
        session_secret: SecretString::from(SESSION_SECRET),
        api: ApiConfig {
            base_url: backend_url.to_string(),
            timeout: Duration::from_secs(5),
        },
        shops_file: "shops.yaml".into(),
        json_logs: false,
        sentry_dsn: None,
        sentry_environment: None,
    };
    let shops = parse_shops(TEST_SHOPS).unwrap();
    let session_layer =
        bazaar_storefront::middleware::create_session_layer(MemoryStore::default(), &config);
    let state = bazaar_storefront::state::AppState::new(config, backend_client(backend_url), shops);
    bazaar_storefront::app(state, session_layer)
}

fn admin_app(backend_url: &str) -> Router {
    use bazaar_admin::config::{AdminConfig, ApiConfig};

    let config = AdminConfig {
        database_url: SecretString::from("postgres://localhost/unused"),
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: "http://127.0.0.1".to_string(),
        session_secret: SecretString::from(SESSION_SECRET),
        api: ApiConfig {
            base_url: backend_url.to_string(),
            timeout: Duration::from_secs(5),
        },
        json_logs: false,
        sentry_dsn: None,
        sentry_environment: None,
    };
    let session_layer =
        bazaar_admin::middleware::create_session_layer(MemoryStore::default(), &config);
    let state = bazaar_admin::state::AppState::new(config, backend_client(backend_url));
    bazaar_admin::app(state, session_layer)
}

/// A browser-like client: keeps cookies, never follows redirects so tests
/// can assert on `Location`.
#[must_use]
pub fn browser() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// `Location` header of a redirect response.
#[must_use]
pub fn location(response: &reqwest::Response) -> &str {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// Sign `client` in through a login form at `url`.
pub async fn sign_in(
    client: &reqwest::Client,
    url: &str,
    email: &str,
    next: Option<&str>,
) -> reqwest::Response {
    let mut form = vec![("email", email), ("password", fake_backend::PASSWORD)];
    if let Some(next) = next {
        form.push(("next", next));
    }
    client.post(url).form(&form).send().await.unwrap()
}

/// Wait for work the apps hand to spawned tasks (analytics calls) to reach
/// the backend. Returns whether `done` held within two seconds.
pub async fn eventually(
    backend: &FakeBackend,
    done: impl Fn(&fake_backend::Recorded) -> bool,
) -> bool {
    for _ in 0..100 {
        if done(&backend.recorded()) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}
