use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::{errors::ServiceError, ApiResponse};

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(ApiResponse::success(data))).into_response()
}

/// `{"success": true}` with no payload
pub fn acknowledged_response() -> Response {
    (StatusCode::OK, Json(ApiResponse::<()>::acknowledged())).into_response()
}

/// Unwraps a JSON body, turning malformed input into a validation error
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ServiceError> {
    payload.map(|Json(body)| body).map_err(ServiceError::from)
}

/// Appends `Set-Cookie` headers to `response`, skipping values that failed to build
pub fn with_cookies<I>(mut response: Response, cookies: I) -> Response
where
    I: IntoIterator<Item = Option<HeaderValue>>,
{
    for cookie in cookies.into_iter().flatten() {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    response
}
