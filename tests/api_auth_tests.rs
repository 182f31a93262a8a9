// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password signup/login/logout through the HTTP surface.

use axum::http::{header, Request, StatusCode};
use axum::body::Body;
use chrono::Duration;
use serde_json::json;

mod common;
use common::{
    body_json, cookie_pair, create_test_app, empty_request, find_cookie, json_request,
    set_cookie_headers, signup,
};

#[tokio::test]
async fn test_signup_sets_token_cookie_and_returns_root() {
    let app = create_test_app();

    let response = app
        .send(json_request(
            "POST",
            "/signup",
            None,
            json!({"uname": "alice", "passwd": "wonderland"}),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookie_headers(&response);
    let token = find_cookie(&cookies, "token");
    assert_eq!(body_json(response).await, json!("/"));

    let value = cookie_pair(&token);
    assert_eq!(value.len(), "token=".len() + 32);
}

#[tokio::test]
async fn test_duplicate_signup_is_rejected() {
    let app = create_test_app();
    signup(&app, "bob", "pw").await;

    let response = app
        .send(json_request(
            "POST",
            "/signup",
            None,
            json!({"uname": "bob", "passwd": "other"}),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "already_exists");
    assert_eq!(body["details"], "User is already exist!");
}

#[tokio::test]
async fn test_login_with_correct_and_wrong_password() {
    let app = create_test_app();
    signup(&app, "carol", "right").await;

    let ok = app
        .send(json_request(
            "POST",
            "/login",
            None,
            json!({"uname": "carol", "passwd": "right"}),
        ))
        .await;
    assert_eq!(ok.status(), StatusCode::OK);
    find_cookie(&set_cookie_headers(&ok), "token");

    for body in [
        json!({"uname": "carol", "passwd": "wrong"}),
        json!({"uname": "nobody", "passwd": "right"}),
    ] {
        let response = app.send(json_request("POST", "/login", None, body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(set_cookie_headers(&response).is_empty());
        assert_eq!(body_json(response).await["error"], "invalid_credentials");
    }
}

#[tokio::test]
async fn test_malformed_credentials_are_400() {
    let app = create_test_app();

    for body in [
        json!({"uname": "", "passwd": "pw"}),
        json!({"uname": "dave", "passwd": ""}),
        json!({"uname": "dave"}),
        json!("not an object"),
    ] {
        let response = app.send(json_request("POST", "/signup", None, body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "validation_error");
    }
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    let app = create_test_app();

    let response = app.send(empty_request("GET", "/events", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "unauthenticated");

    let response = app
        .send(empty_request("GET", "/events", Some("token=forged")))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bearer_header_is_accepted() {
    let app = create_test_app();
    let cookie = signup(&app, "erin", "pw").await;
    let token = cookie.trim_start_matches("token=");

    let response = app
        .send(
            Request::builder()
                .uri("/events")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_session_expires_after_nine_hours() {
    let app = create_test_app();
    let cookie = signup(&app, "frank", "pw").await;

    app.clock.advance(Duration::hours(9) - Duration::seconds(1));
    let response = app.send(empty_request("GET", "/events", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);

    app.clock.advance(Duration::seconds(2));
    let response = app.send(empty_request("GET", "/events", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        app.store
            .count(event_reminder::db::collections::SESSIONS),
        0
    );
}

#[tokio::test]
async fn test_root_reports_authentication() {
    let app = create_test_app();

    let response = app.send(empty_request("GET", "/", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"authenticated": false}));

    let cookie = signup(&app, "gina", "pw").await;
    let response = app.send(empty_request("GET", "/", Some(&cookie))).await;
    assert_eq!(body_json(response).await, json!({"authenticated": true}));
}

#[tokio::test]
async fn test_logout_revokes_session() {
    let app = create_test_app();
    let cookie = signup(&app, "hank", "pw").await;

    let response = app
        .send(empty_request("DELETE", "/logout", Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"text": "/login"}));

    let response = app.send(empty_request("GET", "/events", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_without_session_still_succeeds() {
    let app = create_test_app();
    let response = app.send(empty_request("DELETE", "/logout", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health() {
    let app = create_test_app();
    let response = app.send(empty_request("GET", "/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_stale_token_cookie_does_not_hide_live_session_cookie() {
    let app = create_test_app();
    let live = signup(&app, "ivan", "pw").await;
    let live_token = live.trim_start_matches("token=");
    let cookies = format!("token=stale-revoked-token; session={live_token}");

    let response = app.send(empty_request("GET", "/events", Some(&cookies))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.send(empty_request("GET", "/", Some(&cookies))).await;
    assert_eq!(body_json(response).await, json!({"authenticated": true}));
}

#[tokio::test]
async fn test_logout_revokes_every_carried_session() {
    let app = create_test_app();
    let alice = signup(&app, "judy", "pw").await;
    let bob = signup(&app, "ken", "pw").await;
    let bob_token = bob.trim_start_matches("token=");

    let response = app
        .send(empty_request(
            "DELETE",
            "/logout",
            Some(&format!("{alice}; session={bob_token}")),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    for cookie in [alice.clone(), format!("session={bob_token}")] {
        let response = app.send(empty_request("GET", "/events", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{cookie}");
    }
    assert_eq!(
        app.store
            .count(event_reminder::db::collections::SESSIONS),
        0
    );
}

#[tokio::test]
async fn test_password_longer_than_bcrypt_input_is_rejected() {
    let app = create_test_app();
    let response = app
        .send(json_request(
            "POST",
            "/signup",
            None,
            json!({"uname": "lena", "passwd": "x".repeat(73)}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "validation_error");
}
