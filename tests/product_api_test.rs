//! Product CRUD through the API.

mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp, ADMIN, PRODUCTOS};
use serde_json::{json, Value};

fn martillo(warehouse: i64) -> Value {
    json!({
        "nombre": "Martillo",
        "precio": 12.5,
        "cantidad": 7,
        "departamento": "Herramientas",
        "almacen": warehouse
    })
}

#[tokio::test]
async fn create_then_list_preserves_fields() {
    let app = TestApp::new().await;
    let admin = app.login(ADMIN).await;
    let warehouse = app.create_warehouse(&admin, "Central").await;
    let cookie = app.login(PRODUCTOS).await;

    let created = app.create_product(&cookie, martillo(warehouse)).await;
    assert!(created["id"].as_i64().is_some());
    assert_eq!(created["usuario_modificacion"], "PRODUCTOS");
    assert_eq!(created["fecha_hora_creacion"], created["fecha_modificacion"]);

    let response = app
        .request(Method::GET, "/api/productos", None, Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let list = response_json(response).await;
    let items = list.as_array().expect("bare array");
    assert_eq!(items.len(), 1);
    let item = &items[0];
    assert_eq!(item["nombre"], "Martillo");
    assert_eq!(item["precio"], json!(12.5));
    assert_eq!(item["cantidad"], 7);
    assert_eq!(item["departamento"], "Herramientas");
    assert_eq!(item["almacen"], warehouse);
}

#[tokio::test]
async fn update_keeps_creation_time_and_restamps() {
    let app = TestApp::new().await;
    let admin = app.login(ADMIN).await;
    let warehouse = app.create_warehouse(&admin, "Central").await;
    let other = app.create_warehouse(&admin, "Norte").await;
    let created = app.create_product(&admin, martillo(warehouse)).await;
    let id = created["id"].as_i64().unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let cookie = app.login(PRODUCTOS).await;
    let response = app
        .request(
            Method::PUT,
            &format!("/api/productos/{id}"),
            Some(json!({
                "nombre": "Martillo grande",
                "precio": 3.25,
                "cantidad": 0,
                "departamento": "Herramientas",
                "almacen": other
            })),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = response_json(response).await["data"].clone();

    assert_eq!(updated["nombre"], "Martillo grande");
    assert_eq!(updated["precio"], json!(3.25));
    assert_eq!(updated["almacen"], other);
    assert_eq!(updated["fecha_hora_creacion"], created["fecha_hora_creacion"]);
    assert_eq!(updated["usuario_modificacion"], "PRODUCTOS");

    let before = chrono::DateTime::parse_from_rfc3339(created["fecha_modificacion"].as_str().unwrap())
        .unwrap();
    let after = chrono::DateTime::parse_from_rfc3339(updated["fecha_modificacion"].as_str().unwrap())
        .unwrap();
    assert!(after > before);
}

#[tokio::test]
async fn unknown_warehouse_is_rejected() {
    let app = TestApp::new().await;
    let cookie = app.login(ADMIN).await;

    let response = app
        .request(Method::POST, "/api/productos", Some(martillo(999)), Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request(Method::GET, "/api/productos", None, Some(&cookie))
        .await;
    assert_eq!(response_json(response).await, json!([]));
}

#[tokio::test]
async fn invalid_fields_are_listed() {
    let app = TestApp::new().await;
    let cookie = app.login(ADMIN).await;

    let response = app
        .request(
            Method::POST,
            "/api/productos",
            Some(json!({ "nombre": "", "precio": -1, "cantidad": 2 })),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    let error = body["error"].as_str().unwrap();
    for field in ["nombre", "precio", "departamento", "almacen"] {
        assert!(error.contains(field), "{field} missing from {error}");
    }
    assert!(!error.contains("cantidad"));
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = TestApp::new().await;
    let cookie = app.login(ADMIN).await;

    let response = app
        .request(
            Method::POST,
            "/api/productos",
            Some(json!({ "precio": "caro" })),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_removes_and_missing_ids_are_404() {
    let app = TestApp::new().await;
    let cookie = app.login(ADMIN).await;
    let warehouse = app.create_warehouse(&cookie, "Central").await;
    let id = app.create_product(&cookie, martillo(warehouse)).await["id"]
        .as_i64()
        .unwrap();

    let uri = format!("/api/productos/{id}");
    let response = app.request(Method::DELETE, &uri, None, Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["success"], true);

    let response = app.request(Method::DELETE, &uri, None, Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .request(Method::PUT, &uri, Some(martillo(warehouse)), Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_is_ordered_by_id() {
    let app = TestApp::new().await;
    let cookie = app.login(ADMIN).await;
    let warehouse = app.create_warehouse(&cookie, "Central").await;
    for name in ["c", "a", "b"] {
        let mut body = martillo(warehouse);
        body["nombre"] = json!(name);
        app.create_product(&cookie, body).await;
    }

    let response = app
        .request(Method::GET, "/api/productos", None, Some(&cookie))
        .await;
    let list = response_json(response).await;
    let ids: Vec<i64> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(ids, sorted);
    assert_eq!(list[0]["nombre"], "c");
}
