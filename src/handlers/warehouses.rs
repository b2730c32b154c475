use super::common::{acknowledged_response, created_response, json_body, success_response};
use crate::{
    auth::{allow, AuthRouterExt, AuthUser},
    entities::warehouse,
    errors::ServiceError,
    handlers::AppState,
    services::WarehouseDraft,
};
use axum::{
    extract::{rejection::JsonRejection, Json, Path, State},
    response::Response,
    routing::{get, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct WarehouseRequest {
    #[serde(rename = "nombre")]
    pub name: Option<String>,
}

/// Warehouse as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseResponse {
    pub id: i32,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "fecha_hora_creacion")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "fecha_modificacion")]
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "usuario_modificacion")]
    pub updated_by: String,
}

impl From<warehouse::Model> for WarehouseResponse {
    fn from(model: warehouse::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            created_at: model.created_at,
            updated_at: model.updated_at,
            updated_by: model.updated_by,
        }
    }
}

pub fn warehouse_routes() -> Router<AppState> {
    let read = Router::new()
        .route("/api/almacenes", get(list_warehouses))
        .route("/api/almacenes/:id", get(get_warehouse))
        .with_roles(allow::ANY_AUTHENTICATED);

    let write = Router::new()
        .route("/api/almacenes", post(create_warehouse))
        .route(
            "/api/almacenes/:id",
            put(update_warehouse).delete(delete_warehouse),
        )
        .with_roles(allow::WAREHOUSES_WRITE);

    read.merge(write)
}

pub async fn list_warehouses(
    State(state): State<AppState>,
) -> Result<Json<Vec<WarehouseResponse>>, ServiceError> {
    let warehouses = state.warehouses.list().await?;
    Ok(Json(
        warehouses.into_iter().map(WarehouseResponse::from).collect(),
    ))
}

pub async fn get_warehouse(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    let warehouse = state.warehouses.get(id).await?;
    Ok(success_response(WarehouseResponse::from(warehouse)))
}

pub async fn create_warehouse(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<WarehouseRequest>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let body = json_body(payload)?;
    let created = state
        .warehouses
        .create(WarehouseDraft { name: body.name }, &user)
        .await?;
    Ok(created_response(WarehouseResponse::from(created)))
}

pub async fn update_warehouse(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    user: AuthUser,
    payload: Result<Json<WarehouseRequest>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let body = json_body(payload)?;
    let updated = state
        .warehouses
        .update(id, WarehouseDraft { name: body.name }, &user)
        .await?;
    Ok(success_response(WarehouseResponse::from(updated)))
}

/// Delete a warehouse; 409 while products still reference it
pub async fn delete_warehouse(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    state.warehouses.delete(id).await?;
    Ok(acknowledged_response())
}
