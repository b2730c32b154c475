//! Inventario API Library
//!
//! Role-gated inventory backend: cookie sessions, product and warehouse
//! management and the schema they live in.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod services;
pub mod tracing;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method, Request},
    middleware::Next,
    Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
};

use crate::auth::{AuthConfig, AuthService};
use crate::services::{ProductService, UserService, WarehouseService};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub auth: Arc<AuthService>,
    pub products: ProductService,
    pub warehouses: WarehouseService,
    pub users: UserService,
}

impl AppState {
    /// Wires every service onto one shared connection pool
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let auth = Arc::new(AuthService::new(AuthConfig::from(&config), db.clone()));
        Self {
            products: ProductService::new(db.clone()),
            warehouses: WarehouseService::new(db.clone()),
            users: UserService::new(db.clone()),
            auth,
            config,
            db,
        }
    }
}

// Common response wrapper for mutations
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            meta: Some(ResponseMeta::capture()),
        }
    }

    /// Success with nothing to return, e.g. after a delete
    pub fn acknowledged() -> Self {
        Self {
            success: true,
            data: None,
            meta: Some(ResponseMeta::capture()),
        }
    }
}


/// Builds the CORS layer from configuration.
///
/// Returns `None` when no origins are configured and permissive CORS is not
/// allowed for this environment.
pub fn cors_layer(cfg: &config::AppConfig) -> Option<CorsLayer> {
    let configured_origins: Option<Vec<HeaderValue>> = cfg
        .cors_allowed_origins
        .as_ref()
        .map(|raw| {
            raw.split(',')
                .filter_map(|origin| {
                    let trimmed = origin.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        HeaderValue::from_str(trimmed).ok()
                    }
                })
                .collect::<Vec<_>>()
        })
        .filter(|origins| !origins.is_empty());

    if let Some(origins) = configured_origins {
        let layer = CorsLayer::new().allow_origin(origins);
        // Credentials cannot be combined with wildcard methods or headers
        Some(if cfg.cors_allow_credentials {
            layer
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE])
                .allow_credentials(true)
        } else {
            layer.allow_methods(Any).allow_headers(Any)
        })
    } else if cfg.should_allow_permissive_cors() {
        ::tracing::info!(
            "Using permissive CORS because explicit origins were not configured ({})",
            if cfg.is_development() {
                "development environment"
            } else {
                "explicit override enabled"
            }
        );
        Some(CorsLayer::permissive())
    } else {
        None
    }
}

async fn inject_auth_service(
    State(auth): State<Arc<AuthService>>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> axum::response::Response {
    req.extensions_mut().insert(auth);
    next.run(req).await
}

/// Full application router: API, pages and health, with the shared layers.
///
/// Layers apply outside-in: request id, auth service injection, CORS,
/// timeout, then HTTP tracing closest to the handlers.
pub fn build_router(state: AppState) -> Router {
    let timeout = state.config.request_timeout();
    let cors = cors_layer(&state.config).unwrap_or_else(|| {
        ::tracing::warn!("CORS disabled: no allowed origins configured");
        CorsLayer::new()
    });

    Router::new()
        .merge(handlers::auth::auth_routes())
        .merge(handlers::users::user_routes())
        .merge(handlers::products::product_routes())
        .merge(handlers::warehouses::warehouse_routes())
        .merge(handlers::pages::page_routes())
        .merge(handlers::health::health_routes())
        // HTTP tracing layer for consistent request/response telemetry
        .layer(crate::tracing::configure_http_tracing())
        .layer(TimeoutLayer::new(timeout))
        .layer(cors)
        // Inject AuthService into request extensions for auth middleware
        .layer(axum::middleware::from_fn_with_state(
            state.auth.clone(),
            inject_auth_service,
        ))
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}

pub mod prelude {
    pub use crate::auth::{AuthService, AuthUser, Role};
    pub use crate::db::*;
    pub use crate::errors::*;
    pub use crate::services::*;
    pub use crate::{build_router, AppState};
}
