//! Back-office sign-in and role gating against the fake backend.

#![allow(clippy::unwrap_used)]

use bazaar_integration_tests::{TestEnv, browser, location, sign_in};
use reqwest::StatusCode;

#[tokio::test]
async fn test_customers_cannot_sign_in() {
    let env = TestEnv::start().await;
    let client = browser();

    let response = sign_in(&client, &env.admin_url("/auth/login"), "ada@example.com", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .text()
            .await
            .unwrap()
            .contains("This account cannot sign in to the dashboard.")
    );

    let dashboard = client.get(env.admin_url("/")).send().await.unwrap();
    assert_eq!(dashboard.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&dashboard), "/auth/login");
}

#[tokio::test]
async fn test_merchant_reaches_dashboard_but_not_platform_pages() {
    let env = TestEnv::start().await;
    let client = browser();

    let login = sign_in(&client, &env.admin_url("/auth/login"), "merchant@example.com", None).await;
    assert_eq!(login.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&login), "/");

    let dashboard = client.get(env.admin_url("/")).send().await.unwrap();
    assert_eq!(dashboard.status(), StatusCode::OK);
    let html = dashboard.text().await.unwrap();
    assert!(html.contains("1234.50"));
    assert!(html.contains("Mona Merchant"));

    let orders = client.get(env.admin_url("/orders")).send().await.unwrap();
    assert_eq!(orders.status(), StatusCode::OK);
    assert!(orders.text().await.unwrap().contains("ada@example.com"));

    let admins = client
        .get(env.admin_url("/superadmin/admins"))
        .send()
        .await
        .unwrap();
    assert_eq!(admins.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_order_transitions_are_checked_before_the_backend() {
    let env = TestEnv::start().await;
    let client = browser();
    sign_in(&client, &env.admin_url("/auth/login"), "merchant@example.com", None).await;

    let refused = client
        .post(env.admin_url("/orders/42/status"))
        .form(&[("current", "delivered"), ("status", "open")])
        .send()
        .await
        .unwrap();
    assert_eq!(refused.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&refused), "/orders?page=1");
    assert!(env.backend.recorded().status_updates.is_empty());

    let accepted = client
        .post(env.admin_url("/orders/42/status"))
        .form(&[("current", "open"), ("status", "processing"), ("note", "Packing")])
        .send()
        .await
        .unwrap();
    assert_eq!(accepted.status(), StatusCode::SEE_OTHER);

    let recorded = env.backend.recorded();
    assert_eq!(recorded.status_updates.len(), 1);
    let (order, update) = &recorded.status_updates[0];
    assert_eq!(*order, 42);
    assert_eq!(update["status"], "processing");
    assert_eq!(update["note"], "Packing");
}

#[tokio::test]
async fn test_superadmin_lands_on_accounts() {
    let env = TestEnv::start().await;
    let client = browser();

    let login = sign_in(&client, &env.admin_url("/auth/login"), "root@example.com", None).await;
    assert_eq!(login.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&login), "/superadmin/admins");

    let admins = client
        .get(env.admin_url("/superadmin/admins"))
        .send()
        .await
        .unwrap();
    assert_eq!(admins.status(), StatusCode::OK);
    let html = admins.text().await.unwrap();
    assert!(html.contains("merchant@example.com"));
    assert!(!html.contains("ada@example.com"));

    // Platform accounts have no shop to manage.
    let orders = client.get(env.admin_url("/orders")).send().await.unwrap();
    assert_eq!(orders.status(), StatusCode::FORBIDDEN);
}
