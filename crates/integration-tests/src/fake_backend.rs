//! A small stand-in for the commerce backend.
//!
//! Serves a two-product catalog for shop 1, a handful of accounts that all
//! share [`PASSWORD`], and remembers what the apps wrote so tests can
//! assert on it. Only `lin@example.com` has a delivered order, for
//! [`DELIVERED_ORDER_ID`] holding product 1.

use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};

pub const PASSWORD: &str = "correct horse battery";

/// Order id handed out by the first successful checkout.
pub const FIRST_ORDER_ID: u64 = 501;

/// Delivered order in the history of `lin@example.com`.
pub const DELIVERED_ORDER_ID: u64 = 77;

#[derive(Debug, Clone, Copy)]
struct Account {
    id: u64,
    name: &'static str,
    email: &'static str,
    role: &'static str,
    shop_id: Option<u64>,
    token: &'static str,
    /// Login works but every later call is refused with 401.
    revoked: bool,
}

const ACCOUNTS: [Account; 5] = [
    Account {
        id: 10,
        name: "Ada Shopper",
        email: "ada@example.com",
        role: "customer",
        shop_id: None,
        token: "customer-token",
        revoked: false,
    },
    Account {
        id: 12,
        name: "Lin Reviewer",
        email: "lin@example.com",
        role: "customer",
        shop_id: None,
        token: "reviewer-token",
        revoked: false,
    },
    Account {
        id: 11,
        name: "Grace Revoked",
        email: "revoked@example.com",
        role: "customer",
        shop_id: None,
        token: "revoked-token",
        revoked: true,
    },
    Account {
        id: 20,
        name: "Mona Merchant",
        email: "merchant@example.com",
        role: "merchant",
        shop_id: Some(1),
        token: "merchant-token",
        revoked: false,
    },
    Account {
        id: 1,
        name: "Root",
        email: "root@example.com",
        role: "superadmin",
        shop_id: None,
        token: "root-token",
        revoked: false,
    },
];

impl Account {
    fn user(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "email": self.email,
            "role": self.role,
            "shop_id": self.shop_id,
        })
    }
}

/// What the apps sent to the backend.
#[derive(Debug, Default)]
pub struct Recorded {
    pub orders: Vec<Value>,
    pub status_updates: Vec<(u64, Value)>,
    pub visits: usize,
    pub visit_updates: Vec<Value>,
    pub conversions: Vec<Value>,
    pub reviews: Vec<(u64, Value)>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    recorded: Arc<Mutex<Recorded>>,
}

impl FakeBackend {
    /// # Panics
    ///
    /// Panics if a handler panicked while holding the lock.
    #[must_use]
    pub fn recorded(&self) -> MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap()
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/public/shops/{shop}/products", get(products))
            .route("/api/public/shops/{shop}/products/{id}", get(product))
            .route(
                "/api/public/shops/{shop}/products/{id}/reviews",
                get(empty_list).post(submit_review),
            )
            .route("/api/public/shops/{shop}/categories", get(empty_list))
            .route("/api/public/shops/{shop}/brands", get(empty_list))
            .route("/api/analytics/track-visit", post(track_visit))
            .route("/api/analytics/update-visit", post(update_visit))
            .route("/api/analytics/mark-converted", post(mark_converted))
            .route("/api/orders/user", get(my_orders).post(place_order))
            .route("/api/orders/user/{id}", get(my_order))
            .route("/api/merchant-dashboard/summary", get(summary))
            .route("/api/shops/{shop}/orders", get(shop_orders))
            .route("/api/shops/{shop}/orders/{id}/status", post(order_status))
            .route("/api/superadmin/admins", get(admins))
            .with_state(self.clone())
    }
}

fn catalog() -> Vec<Value> {
    vec![
        json!({
            "id": 1,
            "name": "Canvas Tote",
            "price": "24.00",
            "stock_qty": 12,
            "short_description": "Heavy cotton, reinforced handles."
        }),
        json!({
            "id": 2,
            "name": "Enamel Mug",
            "price": "14.00",
            "special_price": "12.50",
            "stock_qty": 3
        }),
    ]
}

fn page(items: Vec<Value>) -> Value {
    let total = items.len();
    json!({
        "items": items,
        "page": 1,
        "per_page": 20,
        "total": total,
        "last_page": 1
    })
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

/// Account behind the request's bearer token, if it is still valid.
fn authorize(headers: &HeaderMap, roles: &[&str]) -> Result<Account, Response> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Unauthenticated."))?;
    let account = ACCOUNTS
        .into_iter()
        .find(|a| a.token == token && !a.revoked)
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Unauthenticated."))?;
    if roles.contains(&account.role) {
        Ok(account)
    } else {
        Err(error(StatusCode::FORBIDDEN, "Forbidden."))
    }
}

async fn login(Json(body): Json<Value>) -> Response {
    let field = |name: &str| body.get(name).and_then(Value::as_str).unwrap_or_default();
    let (email, password) = (field("email"), field("password"));
    match ACCOUNTS.into_iter().find(|a| a.email == email) {
        Some(account) if password == PASSWORD => Json(json!({
            "token": account.token,
            "user": account.user(),
        }))
        .into_response(),
        _ => error(StatusCode::UNAUTHORIZED, "Invalid credentials."),
    }
}

async fn products() -> Json<Value> {
    Json(page(catalog()))
}

async fn product(Path((_shop, id)): Path<(u64, u64)>) -> Response {
    catalog()
        .into_iter()
        .find(|p| p["id"] == id)
        .map_or_else(
            || error(StatusCode::NOT_FOUND, "Product not found."),
            |p| Json(p).into_response(),
        )
}

async fn empty_list() -> Json<Value> {
    Json(json!([]))
}

async fn track_visit(State(fake): State<FakeBackend>) -> Json<Value> {
    let mut recorded = fake.recorded();
    recorded.visits += 1;
    Json(json!({ "visit_id": recorded.visits }))
}

async fn update_visit(State(fake): State<FakeBackend>, Json(update): Json<Value>) -> StatusCode {
    fake.recorded().visit_updates.push(update);
    StatusCode::NO_CONTENT
}

async fn mark_converted(
    State(fake): State<FakeBackend>,
    Json(conversion): Json<Value>,
) -> StatusCode {
    fake.recorded().conversions.push(conversion);
    StatusCode::NO_CONTENT
}

async fn submit_review(
    State(fake): State<FakeBackend>,
    headers: HeaderMap,
    Path((_shop, id)): Path<(u64, u64)>,
    Json(review): Json<Value>,
) -> Response {
    if let Err(rejection) = authorize(&headers, &["customer"]) {
        return rejection;
    }
    fake.recorded().reviews.push((id, review));
    StatusCode::CREATED.into_response()
}

fn delivered_order() -> Value {
    json!({
        "id": DELIVERED_ORDER_ID,
        "status": "Delivered",
        "total": "24.00",
        "delivered_at": "2024-03-01T10:00:00Z",
        "items": [{
            "product_id": 1,
            "name": "Canvas Tote",
            "quantity": 1,
            "unit_price": "24.00"
        }]
    })
}

fn placed_order(id: u64, request: &Value) -> Value {
    json!({
        "id": id,
        "shop_id": request["shop_id"],
        "status": "open",
        "total": "24.00",
        "shipping_address": request["shipping_address"],
    })
}

async fn my_orders(State(fake): State<FakeBackend>, headers: HeaderMap) -> Response {
    let account = match authorize(&headers, &["customer"]) {
        Ok(account) => account,
        Err(rejection) => return rejection,
    };
    if account.email == "lin@example.com" {
        return Json(page(vec![delivered_order()])).into_response();
    }
    let orders = fake
        .recorded()
        .orders
        .iter()
        .zip(FIRST_ORDER_ID..)
        .map(|(request, id)| placed_order(id, request))
        .collect();
    Json(page(orders)).into_response()
}

async fn my_order(
    State(fake): State<FakeBackend>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response {
    if let Err(rejection) = authorize(&headers, &["customer"]) {
        return rejection;
    }
    let recorded = fake.recorded();
    id.checked_sub(FIRST_ORDER_ID)
        .and_then(|index| recorded.orders.get(usize::try_from(index).ok()?))
        .map_or_else(
            || error(StatusCode::NOT_FOUND, "Order not found."),
            |request| Json(placed_order(id, request)).into_response(),
        )
}

async fn place_order(
    State(fake): State<FakeBackend>,
    headers: HeaderMap,
    Json(request): Json<Value>,
) -> Response {
    if let Err(rejection) = authorize(&headers, &["customer"]) {
        return rejection;
    }
    if request["items"].as_array().is_none_or(Vec::is_empty) {
        return error(StatusCode::UNPROCESSABLE_ENTITY, "Your cart is empty.");
    }
    let mut recorded = fake.recorded();
    recorded.orders.push(request.clone());
    let id = FIRST_ORDER_ID + u64::try_from(recorded.orders.len() - 1).unwrap();
    (StatusCode::CREATED, Json(placed_order(id, &request))).into_response()
}

async fn summary(headers: HeaderMap) -> Response {
    if let Err(rejection) = authorize(&headers, &["merchant"]) {
        return rejection;
    }
    Json(json!({
        "total_orders": 7,
        "pending_orders": 2,
        "total_revenue": "1234.50",
        "total_products": 2,
        "low_stock_count": 1,
        "open_tickets": 0,
        "recent_orders": []
    }))
    .into_response()
}

async fn shop_orders(headers: HeaderMap) -> Response {
    if let Err(rejection) = authorize(&headers, &["merchant"]) {
        return rejection;
    }
    Json(page(vec![json!({
        "id": 42,
        "status": "open",
        "total": "24.00",
        "customer_email": "ada@example.com"
    })]))
    .into_response()
}

async fn order_status(
    State(fake): State<FakeBackend>,
    headers: HeaderMap,
    Path((_shop, id)): Path<(u64, u64)>,
    Json(update): Json<Value>,
) -> Response {
    if let Err(rejection) = authorize(&headers, &["merchant"]) {
        return rejection;
    }
    fake.recorded().status_updates.push((id, update));
    StatusCode::NO_CONTENT.into_response()
}

async fn admins(headers: HeaderMap) -> Response {
    if let Err(rejection) = authorize(&headers, &["superadmin"]) {
        return rejection;
    }
    let staff: Vec<Value> = ACCOUNTS
        .iter()
        .filter(|a| a.role != "customer")
        .map(Account::user)
        .collect();
    Json(json!(staff)).into_response()
}
