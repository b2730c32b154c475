use super::common::{acknowledged_response, created_response, json_body, success_response};
use crate::{
    auth::{allow, AuthRouterExt, AuthUser},
    entities::product,
    errors::ServiceError,
    handlers::AppState,
    services::ProductDraft,
};
use axum::{
    extract::{rejection::JsonRejection, Json, Path, State},
    response::Response,
    routing::{get, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Body of product create and update requests
#[derive(Debug, Default, Deserialize)]
pub struct ProductRequest {
    #[serde(rename = "nombre")]
    pub name: Option<String>,
    #[serde(rename = "precio")]
    pub price: Option<Decimal>,
    #[serde(rename = "cantidad")]
    pub quantity: Option<i64>,
    #[serde(rename = "departamento")]
    pub department: Option<String>,
    #[serde(rename = "almacen")]
    pub warehouse_id: Option<i32>,
}

impl From<ProductRequest> for ProductDraft {
    fn from(req: ProductRequest) -> Self {
        ProductDraft {
            name: req.name,
            price: req.price,
            quantity: req.quantity,
            department: req.department,
            warehouse_id: req.warehouse_id,
        }
    }
}

/// Product as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductResponse {
    pub id: i32,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "precio", with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(rename = "cantidad")]
    pub quantity: i32,
    #[serde(rename = "departamento")]
    pub department: String,
    #[serde(rename = "almacen")]
    pub warehouse_id: i32,
    #[serde(rename = "fecha_hora_creacion")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "fecha_modificacion")]
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "usuario_modificacion")]
    pub updated_by: String,
}

impl From<product::Model> for ProductResponse {
    fn from(model: product::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            price: model.price,
            quantity: model.quantity,
            department: model.department,
            warehouse_id: model.warehouse_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
            updated_by: model.updated_by,
        }
    }
}

/// Product routes, reads open to every role and writes to ADMIN and PRODUCTOS
pub fn product_routes() -> Router<AppState> {
    let read = Router::new()
        .route("/api/productos", get(list_products))
        .route("/api/productos/:id", get(get_product))
        .with_roles(allow::ANY_AUTHENTICATED);

    let write = Router::new()
        .route("/api/productos", post(create_product))
        .route(
            "/api/productos/:id",
            put(update_product).delete(delete_product),
        )
        .with_roles(allow::PRODUCTS_WRITE);

    read.merge(write)
}

/// List every product as a bare array
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductResponse>>, ServiceError> {
    let products = state.products.list().await?;
    Ok(Json(products.into_iter().map(ProductResponse::from).collect()))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    let product = state.products.get(id).await?;
    Ok(success_response(ProductResponse::from(product)))
}

/// Create a product
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<ProductRequest>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let draft = ProductDraft::from(json_body(payload)?);
    let created = state.products.create(draft, &user).await?;
    Ok(created_response(ProductResponse::from(created)))
}

/// Replace a product
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    user: AuthUser,
    payload: Result<Json<ProductRequest>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let draft = ProductDraft::from(json_body(payload)?);
    let updated = state.products.update(id, draft, &user).await?;
    Ok(success_response(ProductResponse::from(updated)))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    state.products.delete(id).await?;
    Ok(acknowledged_response())
}
