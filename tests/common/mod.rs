#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt; // for `oneshot`

use eventide_server::models::{Role, User};
use eventide_server::store::{MemoryStore, UserRepository};
use eventide_server::{create_routes, AppState, Config};

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}

pub fn test_config() -> Config {
    Config {
        session_secret: "integration-test-secret".into(),
        bcrypt_cost: 4,
        ..Config::default()
    }
}

pub fn spawn_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::with_store(store.clone(), test_config());
    TestApp {
        router: create_routes(state.clone()),
        state,
        store,
    }
}

impl TestApp {
    /// Inserts a user straight into the store and returns a session token for them.
    pub async fn seed_user(&self, name: &str, email: &str, role: Role) -> (User, String) {
        let mut user = User::new(name.into(), email.into(), None, None);
        user.role = role;
        self.store.insert_user(&user).await.unwrap();
        let token = self.state.sessions.issue(&user).unwrap();
        (user, token)
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None, None).await
    }

    pub async fn create_event(&self, token: &str, body: Value) -> TestResponse {
        self.request(Method::POST, "/api/events", Some(token), Some(body))
            .await
    }
}

pub fn event_body(title: &str, start_at: &str, city: &str) -> Value {
    json!({
        "title": title,
        "startAt": start_at,
        "endAt": start_at,
        "city": city,
        "countryCode": "US",
    })
}

pub fn demo_conf() -> Value {
    json!({
        "title": "Demo Conf",
        "startAt": "2025-01-10T09:00:00Z",
        "endAt": "2025-01-10T17:00:00Z",
        "city": "Austin",
        "countryCode": "US",
        "currency": "USD",
        "price": 10.00,
    })
}
