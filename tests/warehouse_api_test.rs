//! Warehouse CRUD and the delete guard.

mod common;

use assert_matches::assert_matches;
use axum::http::{Method, StatusCode};
use common::{response_json, TestApp, ADMIN, ALMACENES, PRODUCTOS};
use inventario_api::{
    errors::{ServiceError, WAREHOUSE_IN_USE_MESSAGE},
    services::{ProductDraft, WarehouseDraft},
};
use rust_decimal::Decimal;
use serde_json::json;

#[tokio::test]
async fn referenced_warehouse_cannot_be_deleted() {
    let app = TestApp::new().await;
    let admin = app.login(ADMIN).await;
    let warehouse = app.create_warehouse(&admin, "Central").await;
    app.create_product(
        &admin,
        json!({
            "nombre": "Clavo",
            "precio": 0.25,
            "cantidad": 500,
            "departamento": "Ferretería",
            "almacen": warehouse
        }),
    )
    .await;

    let cookie = app.login(ALMACENES).await;
    let response = app
        .request(
            Method::DELETE,
            &format!("/api/almacenes/{warehouse}"),
            None,
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = response_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], WAREHOUSE_IN_USE_MESSAGE);

    // Nothing changed
    let response = app
        .request(Method::GET, "/api/almacenes", None, Some(&cookie))
        .await;
    assert_eq!(response_json(response).await.as_array().unwrap().len(), 1);
    let response = app
        .request(Method::GET, "/api/productos", None, Some(&cookie))
        .await;
    assert_eq!(response_json(response).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unreferenced_warehouse_deletes() {
    let app = TestApp::new().await;
    let cookie = app.login(ALMACENES).await;
    let warehouse = app.create_warehouse(&cookie, "Temporal").await;

    let uri = format!("/api/almacenes/{warehouse}");
    let response = app.request(Method::DELETE, &uri, None, Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.request(Method::DELETE, &uri, None, Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn warehouse_freed_after_its_products_are_deleted() {
    let app = TestApp::new().await;
    let actor = app.identity(ADMIN).await;
    let warehouses = &app.state.warehouses;
    let products = &app.state.products;

    let warehouse = warehouses
        .create(WarehouseDraft { name: Some("Central".into()) }, &actor)
        .await
        .unwrap();
    let product = products
        .create(
            ProductDraft {
                name: Some("Tornillo".into()),
                price: Some(Decimal::new(5, 1)),
                quantity: Some(10),
                department: Some("Ferretería".into()),
                warehouse_id: Some(warehouse.id),
            },
            &actor,
        )
        .await
        .unwrap();

    assert_matches!(
        warehouses.delete(warehouse.id).await,
        Err(ServiceError::ReferentialConflict(msg)) if msg == WAREHOUSE_IN_USE_MESSAGE
    );

    products.delete(product.id).await.unwrap();
    warehouses.delete(warehouse.id).await.unwrap();
    assert_matches!(
        warehouses.get(warehouse.id).await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn rename_keeps_creation_time_and_records_actor() {
    let app = TestApp::new().await;
    let admin = app.login(ADMIN).await;
    let id = app.create_warehouse(&admin, "Central").await;

    let response = app
        .request(Method::GET, "/api/almacenes", None, Some(&admin))
        .await;
    let original = response_json(response).await[0].clone();

    let cookie = app.login(ALMACENES).await;
    let response = app
        .request(
            Method::PUT,
            &format!("/api/almacenes/{id}"),
            Some(json!({ "nombre": "  Central Norte " })),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = response_json(response).await["data"].clone();
    assert_eq!(updated["nombre"], "Central Norte");
    assert_eq!(updated["usuario_modificacion"], "ALMACENES");
    assert_eq!(updated["fecha_hora_creacion"], original["fecha_hora_creacion"]);
}

#[tokio::test]
async fn blank_name_is_rejected() {
    let app = TestApp::new().await;
    let cookie = app.login(ADMIN).await;
    let response = app
        .request(
            Method::POST,
            "/api/almacenes",
            Some(json!({ "nombre": "   " })),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn productos_role_cannot_delete_warehouses() {
    let app = TestApp::new().await;
    let admin = app.login(ADMIN).await;
    let id = app.create_warehouse(&admin, "Central").await;
    let cookie = app.login(PRODUCTOS).await;

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/almacenes/{id}"),
            None,
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn missing_warehouse_is_404() {
    let app = TestApp::new().await;
    let cookie = app.login(ALMACENES).await;

    let response = app
        .request(
            Method::PUT,
            "/api/almacenes/999",
            Some(json!({ "nombre": "Fantasma" })),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .request(Method::DELETE, "/api/almacenes/999", None, Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response_json(response).await["success"], false);
}
