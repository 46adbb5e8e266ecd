mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};

use common::spawn_app;
use eventide_server::models::Role;

fn page(uri: &str) -> axum::http::request::Builder {
    Request::builder().uri(uri)
}

#[tokio::test]
async fn anonymous_dashboard_visit_redirects_to_signin() {
    let app = spawn_app();

    let response = app
        .send(page("/dashboard/events/new").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.location(), Some("/auth/signin"));

    let localized = app
        .send(page("/ru/dashboard").body(Body::empty()).unwrap())
        .await;
    assert_eq!(localized.location(), Some("/ru/auth/signin"));
}

#[tokio::test]
async fn signed_in_user_is_sent_to_dashboard() {
    let app = spawn_app();
    let (_, token) = app.seed_user("Ada", "ada@example.com", Role::User).await;

    let response = app
        .send(
            page("/auth/signin")
                .header(header::COOKIE, format!("session={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.location(), Some("/dashboard"));

    // With a session the dashboard itself is let through
    let dashboard = app
        .send(
            page("/dashboard")
                .header(header::COOKIE, format!("session={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_ne!(dashboard.status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(dashboard.headers[header::CONTENT_LANGUAGE], "en");
}

#[tokio::test]
async fn default_locale_prefix_is_stripped() {
    let app = spawn_app();
    let response = app
        .send(page("/en/events/42?ref=home").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.location(), Some("/events/42?ref=home"));
}

#[tokio::test]
async fn stripping_the_prefix_keeps_redirects_on_site() {
    let app = spawn_app();
    let response = app
        .send(page("/en//evil.com/login").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.location(), Some("/evil.com/login"));
}

#[tokio::test]
async fn preferred_locale_is_applied() {
    let app = spawn_app();

    let redirected = app
        .send(
            page("/about")
                .header(header::ACCEPT_LANGUAGE, "ru-RU,ru;q=0.9,en;q=0.5")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(redirected.location(), Some("/ru/about"));

    let resolved = app.send(page("/ru/about").body(Body::empty()).unwrap()).await;
    assert_eq!(resolved.status, StatusCode::NOT_FOUND);
    assert_eq!(resolved.headers[header::CONTENT_LANGUAGE], "ru");
}

#[tokio::test]
async fn api_and_assets_bypass_the_guard() {
    let app = spawn_app();

    let api = app
        .send(
            page("/api/events")
                .header(header::ACCEPT_LANGUAGE, "ru")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(api.status, StatusCode::OK);
    assert_eq!(api.headers[header::CACHE_CONTROL], "no-store");
    assert_eq!(api.headers["x-content-type-options"], "nosniff");
    assert!(!api.headers.contains_key(header::CONTENT_LANGUAGE));

    let asset = app
        .send(page("/dashboard/logo.png").body(Body::empty()).unwrap())
        .await;
    assert_eq!(asset.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_check_responds() {
    let app = spawn_app();
    let response = app.get("/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["status"], "ok");
}
