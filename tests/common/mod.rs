// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::TimeZone;
use event_reminder::config::Config;
use event_reminder::db::{FirestoreDb, MemoryStore};
use event_reminder::routes::create_router;
use event_reminder::services::{IdentityProvider, OidcError, VerifiedLogin};
use event_reminder::time_utils::FixedClock;
use event_reminder::AppState;
use std::sync::Arc;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Identity provider double: every code is accepted except ones starting
/// with `bad`, and the subject is derived from the code.
#[allow(dead_code)]
pub struct FakeProvider;

#[async_trait]
impl IdentityProvider for FakeProvider {
    fn authorization_url(&self, state: &str, nonce: &str) -> String {
        format!("https://idp.test/auth?state={state}&nonce={nonce}")
    }

    async fn exchange_code(&self, code: &str, _nonce: &str) -> Result<VerifiedLogin, OidcError> {
        if code.starts_with("bad") {
            return Err(OidcError::Rejected("invalid_grant".to_string()));
        }
        Ok(VerifiedLogin {
            access_token: format!("access-{code}"),
            expires_in: 3600,
            subject: format!("sub-{code}"),
            email: format!("{code}@example.com"),
        })
    }
}

/// App wired to an in-memory store and a pinned clock.
#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<FixedClock>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

/// Test app starting at 2024-01-01T00:00:00Z with Google sign-in enabled.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    create_test_app_with_config(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::new(
        chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    ));
    let provider: Option<Arc<dyn IdentityProvider>> = match config.google {
        Some(_) => Some(Arc::new(FakeProvider)),
        None => None,
    };

    let state = Arc::new(
        AppState::new(config, store.clone(), clock.clone(), provider)
            .expect("Failed to build app state"),
    );

    TestApp {
        router: create_router(state.clone()),
        state,
        store,
        clock,
    }
}

#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[allow(dead_code)]
pub fn empty_request(method: &str, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

#[allow(dead_code)]
pub async fn body_json(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[allow(dead_code)]
pub async fn body_text(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

#[allow(dead_code)]
pub fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

#[allow(dead_code)]
pub fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}

/// `name=value` pair from a Set-Cookie header, ready for a Cookie header.
#[allow(dead_code)]
pub fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap().trim().to_string()
}

/// Sign up `username` and return the `token=...` cookie pair.
#[allow(dead_code)]
pub async fn signup(app: &TestApp, username: &str, password: &str) -> String {
    let response = app
        .send(json_request(
            "POST",
            "/signup",
            None,
            serde_json::json!({"uname": username, "passwd": password}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    cookie_pair(&find_cookie(&set_cookie_headers(&response), "token"))
}
