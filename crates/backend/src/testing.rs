//! In-process fake backend for client tests.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use axum::Router;

use crate::BackendClient;

/// Serve `router` on an ephemeral port and return a client pointed at it.
pub async fn serve(router: Router) -> BackendClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    BackendClient::new(&format!("http://{addr}"), Duration::from_secs(5)).unwrap()
}
