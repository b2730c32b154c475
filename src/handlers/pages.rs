//! Page routes. Rendering happens elsewhere; these handlers answer with the
//! view context a template needs and enforce the page-level access rules.

use super::common::with_cookies;
use crate::{
    auth::{allow, cookies, AuthError, AuthRouterExt, AuthUser},
    errors::AUTH_FAILURE_MESSAGE,
    handlers::AppState,
};
use axum::{
    extract::{Form, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Context handed to the template renderer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageView {
    pub active_page: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flash: Option<String>,
}

impl PageView {
    fn login(flash: Option<String>) -> Self {
        Self {
            active_page: "login".to_string(),
            user_role: None,
            user_name: None,
            flash,
        }
    }

    fn for_user(active_page: &str, user: &AuthUser, flash: Option<String>) -> Self {
        Self {
            active_page: active_page.to_string(),
            user_role: Some(user.role.to_string()),
            user_name: Some(user.name.clone()),
            flash,
        }
    }
}

/// Login form fields
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(rename = "nombre", default)]
    pub name: String,
    #[serde(default)]
    pub password: String,
}

pub fn page_routes() -> Router<AppState> {
    let public = Router::new().route("/", get(login_page).post(login_submit));

    let authenticated = Router::new()
        .route("/logout", get(logout_page))
        .route("/inicio", get(home_page))
        .route("/productos", get(products_page))
        .route("/almacenes", get(warehouses_page))
        .with_page_roles(allow::ANY_AUTHENTICATED);

    let admin = Router::new()
        .route("/admin", get(admin_page))
        .with_page_roles(allow::ADMIN_PAGE);

    public.merge(authenticated).merge(admin)
}

/// Shows the view context for `page`, consuming any pending flash message
async fn render(page: &'static str, headers: HeaderMap, user: AuthUser) -> Response {
    let view = PageView::for_user(page, &user, cookies::read_flash(&headers));
    with_cookies(Json(view).into_response(), [cookies::clear_flash_cookie()])
}

pub async fn home_page(headers: HeaderMap, user: AuthUser) -> Response {
    render("inicio", headers, user).await
}

pub async fn products_page(headers: HeaderMap, user: AuthUser) -> Response {
    render("productos", headers, user).await
}

pub async fn warehouses_page(headers: HeaderMap, user: AuthUser) -> Response {
    render("almacenes", headers, user).await
}

/// Administration page, ADMIN only
pub async fn admin_page(headers: HeaderMap, user: AuthUser) -> Response {
    render("admin", headers, user).await
}

/// Login view; callers with a live session go straight to `/inicio`
pub async fn login_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = state.auth.token_from_headers(&headers) {
        match state.auth.resolve(&token).await {
            Ok(_) => return Redirect::to("/inicio").into_response(),
            Err(AuthError::MissingAuth | AuthError::SessionExpired) => {}
            Err(e) => return e.into_response(),
        }
    }

    let view = PageView::login(cookies::read_flash(&headers));
    with_cookies(Json(view).into_response(), [cookies::clear_flash_cookie()])
}

/// Form login: 303 to `/inicio` with the session cookie, or the login view
/// again with the failure message
pub async fn login_submit(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    let identity = match state.auth.authenticate(&form.name, &form.password).await {
        Ok(identity) => identity,
        Err(AuthError::InvalidCredentials) => {
            let view = PageView::login(Some(AUTH_FAILURE_MESSAGE.to_string()));
            return (StatusCode::UNAUTHORIZED, Json(view)).into_response();
        }
        Err(e) => return e.into_response(),
    };

    match state.auth.open_session(&identity).await {
        Ok(token) => {
            info!(user_id = identity.user_id, "session opened from login form");
            with_cookies(
                Redirect::to("/inicio").into_response(),
                [cookies::session_cookie(&state.auth.config, &token)],
            )
        }
        Err(e) => e.into_response(),
    }
}

/// Ends the session and returns to the login page
pub async fn logout_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = state.auth.token_from_headers(&headers) {
        if let Err(e) = state.auth.close_session(&token).await {
            warn!(error = %e, "failed to delete session on logout");
            return e.into_response();
        }
    }
    with_cookies(
        Redirect::to("/").into_response(),
        [cookies::clear_session_cookie(&state.auth.config)],
    )
}
