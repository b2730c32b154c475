use super::common::{json_body, success_response, with_cookies};
use crate::{
    auth::{cookies, AuthUser},
    errors::ServiceError,
    handlers::AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::HeaderMap,
    response::Response,
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Login request payload
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(rename = "nombre", default)]
    pub name: String,
    #[serde(default)]
    pub password: String,
}

/// Identity returned after a successful login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub id: i32,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "rol")]
    pub role: String,
}

impl From<&AuthUser> for SessionResponse {
    fn from(user: &AuthUser) -> Self {
        Self {
            id: user.user_id,
            name: user.name.clone(),
            role: user.role.to_string(),
        }
    }
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
}

/// Checks credentials and opens a session carried by cookie.
///
/// Every failure answers with the same 401 and the same message.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let body = json_body(payload)?;
    let identity = state.auth.authenticate(&body.name, &body.password).await?;
    let token = state.auth.open_session(&identity).await?;

    info!(user_id = identity.user_id, "session opened");
    Ok(with_cookies(
        success_response(SessionResponse::from(&identity)),
        [cookies::session_cookie(&state.auth.config, &token)],
    ))
}

/// Drops the caller's session, if any, and clears the cookie
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ServiceError> {
    if let Some(token) = state.auth.token_from_headers(&headers) {
        if let Err(e) = state.auth.close_session(&token).await {
            warn!(error = %e, "failed to delete session on logout");
            return Err(e.into());
        }
    }
    Ok(with_cookies(
        super::common::acknowledged_response(),
        [cookies::clear_session_cookie(&state.auth.config)],
    ))
}
