/*!
 * # Authentication and Authorization Module
 *
 * Cookie sessions backed by the `sessions` table, Argon2 credential checks and
 * the role gate that protects every non-public route.
 *
 * - [`AuthService`] authenticates credentials and resolves session tokens
 * - [`rbac`] holds the [`Role`] enum, the static allow-lists and [`authorize`]
 * - [`AuthRouterExt`] composes the gate onto routers, either answering with
 *   JSON errors (API routes) or with redirects (page routes)
 */

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{Duration as ChronoDuration, Utc};
use metrics::counter;
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::config::AppConfig;
use crate::errors::ServiceError;

pub mod cookies;
pub mod password;
pub mod rbac;
pub mod session;
pub mod user;

pub use rbac::{allow, authorize, Role, UnknownRole};

/// Length of the random session token handed out in the cookie
const SESSION_TOKEN_LEN: usize = 48;

pub const LOGIN_REQUIRED_MESSAGE: &str = "Por favor, inicia sesión para acceder.";
pub const PAGE_FORBIDDEN_MESSAGE: &str = "No tienes permiso para acceder a esta página.";

/// Identity of the caller, resolved from the session on every request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: i32,
    pub name: String,
    pub role: Role,
}

/// Session configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub session_ttl: Duration,
    pub cookie_name: String,
    pub cookie_secure: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl: Duration::from_secs(12 * 60 * 60),
            cookie_name: "inventario_session".to_string(),
            cookie_secure: false,
        }
    }
}

impl From<&AppConfig> for AuthConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            session_ttl: cfg.session_ttl(),
            cookie_name: cfg.session_cookie_name.clone(),
            cookie_secure: cfg.session_cookie_secure,
        }
    }
}

/// SHA-256 hex digest under which a session token is stored
pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn generate_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Authentication service: credential checks and session lifecycle
#[derive(Debug, Clone)]
pub struct AuthService {
    pub config: AuthConfig,
    pub db: Arc<DatabaseConnection>,
}

impl AuthService {
    pub fn new(config: AuthConfig, db: Arc<DatabaseConnection>) -> Self {
        Self { config, db }
    }

    /// Checks `name`/`password` and stamps the login time on success.
    ///
    /// Unknown names and wrong passwords fail identically, and an unknown
    /// name still pays for one Argon2 verification.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, name: &str, password: &str) -> Result<AuthUser, AuthError> {
        let db = &*self.db;
        let found = user::Entity::find()
            .filter(user::Column::Name.eq(name))
            .one(db)
            .await?;

        let supplied = password.to_string();
        let Some(account) = found else {
            let _ = tokio::task::spawn_blocking(move || password::verify_dummy(&supplied)).await;
            counter!("inventario_auth.login_failure", 1);
            debug!("login rejected");
            return Err(AuthError::InvalidCredentials);
        };

        let stored = account.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || {
            password::verify_password(&stored, &supplied)
        })
        .await
        .map_err(|e| AuthError::InternalError(format!("verification task failed: {e}")))?;

        if !verified {
            counter!("inventario_auth.login_failure", 1);
            debug!("login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let role = account
            .role()
            .map_err(|e| AuthError::InternalError(e.to_string()))?;

        // Never move the stamp backwards, even if the wall clock does
        let now = Utc::now();
        let stamp = account.last_login_at.map_or(now, |prev| prev.max(now));
        let identity = AuthUser {
            user_id: account.id,
            name: account.name.clone(),
            role,
        };

        let mut active = account.into_active_model();
        active.last_login_at = Set(Some(stamp));
        active.update(db).await?;

        counter!("inventario_auth.login_success", 1);
        info!(user_id = identity.user_id, role = %identity.role, "user logged in");
        Ok(identity)
    }

    /// Creates a session for `identity` and returns the raw cookie token
    #[instrument(skip(self), fields(user_id = identity.user_id))]
    pub async fn open_session(&self, identity: &AuthUser) -> Result<String, AuthError> {
        let token = generate_token();
        let now = Utc::now();
        let ttl = ChronoDuration::from_std(self.config.session_ttl)
            .map_err(|_| AuthError::InternalError("Invalid session duration".to_string()))?;

        session::ActiveModel {
            id: Set(token_digest(&token)),
            user_id: Set(identity.user_id),
            created_at: Set(now),
            expires_at: Set(now + ttl),
        }
        .insert(&*self.db)
        .await?;

        Ok(token)
    }

    /// Maps a session token to the caller's current identity.
    ///
    /// The user row is re-read every time, so role changes apply to sessions
    /// that are already open.
    pub async fn resolve(&self, token: &str) -> Result<AuthUser, AuthError> {
        let db = &*self.db;
        let digest = token_digest(token);
        let found = session::Entity::find_by_id(digest.clone()).one(db).await?;
        let Some(current) = found else {
            return Err(AuthError::MissingAuth);
        };

        if current.is_expired_at(Utc::now()) {
            session::Entity::delete_by_id(digest).exec(db).await?;
            return Err(AuthError::SessionExpired);
        }

        let account = user::Entity::find_by_id(current.user_id)
            .one(db)
            .await?
            .ok_or(AuthError::MissingAuth)?;
        let role = account
            .role()
            .map_err(|e| AuthError::InternalError(e.to_string()))?;

        Ok(AuthUser {
            user_id: account.id,
            name: account.name,
            role,
        })
    }

    /// Deletes the session behind `token`. Unknown tokens are ignored.
    pub async fn close_session(&self, token: &str) -> Result<(), AuthError> {
        session::Entity::delete_by_id(token_digest(token))
            .exec(&*self.db)
            .await?;
        Ok(())
    }

    /// Removes every expired session, returning how many were dropped
    pub async fn purge_expired(&self) -> Result<u64, AuthError> {
        let result = session::Entity::delete_many()
            .filter(session::Column::ExpiresAt.lte(Utc::now()))
            .exec(&*self.db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Session token carried by the request, if any
    pub fn token_from_headers(&self, headers: &axum::http::HeaderMap) -> Option<String> {
        cookies::parse_cookie(headers, &self.config.cookie_name)
    }
}

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Session has expired")]
    SessionExpired,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingAuth | AuthError::SessionExpired => ServiceError::Unauthenticated,
            AuthError::InvalidCredentials => ServiceError::AuthFailure,
            AuthError::InsufficientPermissions => {
                ServiceError::Forbidden("insufficient permissions".to_string())
            }
            AuthError::DatabaseError(e) => ServiceError::DatabaseError(e),
            AuthError::InternalError(msg) => ServiceError::InternalError(msg),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ServiceError::from(self).into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingAuth)
    }
}

/// Owned service handle and token, taken before the first await
fn session_lookup(request: &Request) -> Result<(Arc<AuthService>, String), AuthError> {
    let auth_service = request
        .extensions()
        .get::<Arc<AuthService>>()
        .cloned()
        .ok_or_else(|| AuthError::InternalError("Authentication service not available".into()))?;
    let token = auth_service
        .token_from_headers(request.headers())
        .ok_or(AuthError::MissingAuth)?;
    Ok((auth_service, token))
}

async fn identify(
    lookup: Result<(Arc<AuthService>, String), AuthError>,
) -> Result<AuthUser, AuthError> {
    let (auth_service, token) = lookup?;
    auth_service.resolve(&token).await
}

fn redirect_with_flash(to: &str, message: &str) -> Response {
    let mut response = Redirect::to(to).into_response();
    if let Some(value) = cookies::flash_cookie(message) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    response
}

/// Authentication middleware for API routes: 401 JSON when no valid session
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let lookup = session_lookup(&request);
    match identify(lookup).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Authentication middleware for page routes: redirects to the login page
pub async fn page_auth_middleware(mut request: Request, next: Next) -> Response {
    let lookup = session_lookup(&request);
    match identify(lookup).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(AuthError::MissingAuth | AuthError::SessionExpired) => {
            redirect_with_flash("/", LOGIN_REQUIRED_MESSAGE)
        }
        Err(e) => e.into_response(),
    }
}

/// Role middleware for API routes: 403 JSON when the role is not allowed
pub async fn role_middleware(
    State(allowed): State<&'static [Role]>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    authorize(request.extensions().get::<AuthUser>(), allowed)?;
    Ok(next.run(request).await)
}

/// Role middleware for page routes: bounces forbidden callers to `/inicio`
pub async fn page_role_middleware(
    State(allowed): State<&'static [Role]>,
    request: Request,
    next: Next,
) -> Response {
    let decision = authorize(request.extensions().get::<AuthUser>(), allowed);
    match decision {
        Ok(()) => next.run(request).await,
        Err(AuthError::InsufficientPermissions) => {
            warn!(path = %request.uri().path(), "page access denied");
            redirect_with_flash("/inicio", PAGE_FORBIDDEN_MESSAGE)
        }
        Err(_) => redirect_with_flash("/", LOGIN_REQUIRED_MESSAGE),
    }
}

/// Extension methods for Router to add auth middleware
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
    fn with_roles(self, allowed: &'static [Role]) -> Self;
    fn with_page_auth(self) -> Self;
    fn with_page_roles(self, allowed: &'static [Role]) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }

    fn with_roles(self, allowed: &'static [Role]) -> Self {
        self.layer(axum::middleware::from_fn_with_state(allowed, role_middleware))
            .with_auth()
    }

    fn with_page_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(page_auth_middleware))
    }

    fn with_page_roles(self, allowed: &'static [Role]) -> Self {
        self.layer(axum::middleware::from_fn_with_state(
            allowed,
            page_role_middleware,
        ))
        .with_page_auth()
    }
}
