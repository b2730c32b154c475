#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use inventario_api::{
    auth::AuthUser,
    config::AppConfig,
    db::{self, DbConfig},
    services::SeedAccount,
    AppState,
};
use serde_json::{json, Value};
use tower::ServiceExt;

pub const ADMIN: (&str, &str) = ("ADMIN", "admin123");
pub const PRODUCTOS: (&str, &str) = ("PRODUCTOS", "productos 19");
pub const ALMACENES: (&str, &str) = ("ALMACENES", "almacenes11");

/// Helper harness for spinning up the full router over an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    /// Construct a new test application with a fresh, seeded database.
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "development".to_string(),
        );
        // One connection, so every query sees the same in-memory database
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_with_config(&DbConfig::from(&cfg))
            .await
            .expect("failed to create test database");

        let state = AppState::new(Arc::new(pool), cfg);
        state
            .users
            .bootstrap(&SeedAccount::defaults())
            .await
            .expect("failed to seed accounts");

        let router = inventario_api::build_router(state.clone());
        Self { router, state }
    }

    /// Send a request, optionally carrying a session cookie and JSON body.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        cookie: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        let body = if let Some(json) = body {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Submit a urlencoded form, e.g. the login page.
    pub async fn submit_form(&self, uri: &str, form: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = builder
            .body(Body::from(form.to_string()))
            .expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Log in through `/api/login` and return the raw login response.
    pub async fn login_response(&self, name: &str, password: &str) -> Response {
        self.request(
            Method::POST,
            "/api/login",
            Some(json!({ "nombre": name, "password": password })),
            None,
        )
        .await
    }

    /// Log in and return the `name=value` pair to send back as `Cookie`.
    pub async fn login(&self, (name, password): (&str, &str)) -> String {
        let response = self.login_response(name, password).await;
        assert_eq!(response.status(), StatusCode::OK, "login as {name} failed");
        session_cookie(&response).expect("login did not set a session cookie")
    }

    /// Session identity resolved straight from the service layer.
    pub async fn identity(&self, (name, password): (&str, &str)) -> AuthUser {
        self.state
            .auth
            .authenticate(name, password)
            .await
            .expect("seed credentials should authenticate")
    }

    /// Create a warehouse through the API as `cookie`, returning its id.
    pub async fn create_warehouse(&self, cookie: &str, name: &str) -> i64 {
        let response = self
            .request(
                Method::POST,
                "/api/almacenes",
                Some(json!({ "nombre": name })),
                Some(cookie),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = response_json(response).await;
        body["data"]["id"].as_i64().expect("warehouse id")
    }

    /// Create a product through the API as `cookie`, returning its JSON.
    pub async fn create_product(&self, cookie: &str, product: Value) -> Value {
        let response = self
            .request(Method::POST, "/api/productos", Some(product), Some(cookie))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        response_json(response).await["data"].clone()
    }
}

/// Extracts the session cookie pair from a response's `Set-Cookie` headers.
pub fn session_cookie(response: &Response) -> Option<String> {
    set_cookie_pair(response, "inventario_session")
}

/// Finds the `name=value` pair for cookie `name` among `Set-Cookie` headers.
pub fn set_cookie_pair(response: &Response, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .find(|pair| pair.starts_with(&format!("{name}=")))
        .map(str::to_string)
}

pub async fn response_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&bytes).expect("response body is not JSON")
}

pub fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}
