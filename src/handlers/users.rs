use super::common::{created_response, json_body};
use crate::{
    auth::{allow, user, AuthRouterExt, AuthUser},
    errors::ServiceError,
    handlers::AppState,
    services::NewUser,
};
use axum::{
    extract::{rejection::JsonRejection, Json, State},
    response::Response,
    routing::post,
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/usuarios`
#[derive(Debug, Default, Deserialize)]
pub struct CreateUserRequest {
    #[serde(rename = "nombre", default)]
    pub name: String,
    #[serde(default)]
    pub password: String,
    #[serde(rename = "rol", default)]
    pub role: String,
}

/// Public view of an account; never carries the password hash
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i32,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "rol")]
    pub role: String,
    #[serde(rename = "ultimo_acceso")]
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            role: model.role,
            last_login_at: model.last_login_at,
        }
    }
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/usuarios", post(create_user))
        .with_roles(allow::USERS_CREATE)
}

/// Create an account. Only administrators reach this handler.
pub async fn create_user(
    State(state): State<AppState>,
    actor: AuthUser,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let body = json_body(payload)?;
    let new_user = NewUser {
        name: body.name,
        password: body.password,
        role: body.role,
    };
    let created = state.users.create_user(new_user, &actor).await?;
    Ok(created_response(UserResponse::from(created)))
}
