//! End-to-end tests for plain HTTP forwarding.

mod common;

use common::*;
use header_proxy::http::server::UPSTREAM_FAILED_BODY;

#[tokio::test]
async fn injected_headers_are_appended_in_order() {
    let (backend, mut captured) = start_capture_backend().await;
    let proxy = start_proxy(proxy_settings(
        backend,
        &[("x-user", "injected"), ("x-role", "admin"), ("x-user", "second")],
    ))
    .await;

    let response = http_client()
        .get(proxy.http_url("/api/items?id=7"))
        .header("x-user", "original")
        .header("x-trace", "abc")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "captured");

    let request = captured.recv().await.unwrap();
    let users: Vec<_> = request
        .headers
        .get_all("x-user")
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(users, vec!["original", "injected", "second"]);
    assert_eq!(request.headers["x-role"], "admin");
    assert_eq!(request.headers["x-trace"], "abc");
}

#[tokio::test]
async fn path_and_query_are_forwarded() {
    let (backend, mut captured) = start_capture_backend().await;
    let proxy = start_proxy(proxy_settings(backend, &[])).await;

    http_client()
        .delete(proxy.http_url("/api/items/42?force=true&reason=old"))
        .send()
        .await
        .unwrap();

    let request = captured.recv().await.unwrap();
    assert_eq!(request.uri.path(), "/api/items/42");
    assert_eq!(request.uri.query(), Some("force=true&reason=old"));
}

#[tokio::test]
async fn client_address_is_added_to_forwarded_for() {
    let (backend, mut captured) = start_capture_backend().await;
    let proxy = start_proxy(proxy_settings(backend, &[])).await;

    http_client()
        .get(proxy.http_url("/"))
        .header("x-forwarded-for", "203.0.113.9")
        .send()
        .await
        .unwrap();

    let request = captured.recv().await.unwrap();
    assert_eq!(request.headers["x-forwarded-for"], "203.0.113.9, 127.0.0.1");
}

#[tokio::test]
async fn request_body_reaches_backend_and_response_comes_back() {
    let backend = start_echo_backend().await;
    let proxy = start_proxy(proxy_settings(backend, &[("x-user", "alice")])).await;

    let body = "some request payload".repeat(1000);
    let response = http_client()
        .post(proxy.http_url("/upload"))
        .body(body.clone())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), body);
}

#[tokio::test]
async fn unreachable_backend_returns_internal_error() {
    let proxy = start_proxy(proxy_settings(unused_addr().await, &[])).await;

    let response = http_client()
        .get(proxy.http_url("/anything"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
    assert_eq!(response.text().await.unwrap(), UPSTREAM_FAILED_BODY);
}
