//! Role gate checks through the HTTP surface.

mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp, ADMIN, ALMACENES, PRODUCTOS};
use rstest::rstest;
use serde_json::json;

#[rstest]
#[case(ADMIN, StatusCode::CREATED)]
#[case(PRODUCTOS, StatusCode::FORBIDDEN)]
#[case(ALMACENES, StatusCode::CREATED)]
#[tokio::test]
async fn warehouse_creation_is_gated(#[case] who: (&str, &str), #[case] expected: StatusCode) {
    let app = TestApp::new().await;
    let cookie = app.login(who).await;

    let response = app
        .request(
            Method::POST,
            "/api/almacenes",
            Some(json!({ "nombre": "Central" })),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), expected);
}

#[rstest]
#[case(ADMIN, StatusCode::CREATED)]
#[case(PRODUCTOS, StatusCode::CREATED)]
#[case(ALMACENES, StatusCode::FORBIDDEN)]
#[tokio::test]
async fn product_creation_is_gated(#[case] who: (&str, &str), #[case] expected: StatusCode) {
    let app = TestApp::new().await;
    let admin = app.login(ADMIN).await;
    let warehouse = app.create_warehouse(&admin, "Central").await;
    let cookie = app.login(who).await;

    let response = app
        .request(
            Method::POST,
            "/api/productos",
            Some(json!({
                "nombre": "Tuerca",
                "precio": 0.5,
                "cantidad": 100,
                "departamento": "Ferretería",
                "almacen": warehouse
            })),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), expected);
}

#[rstest]
#[case(ADMIN, StatusCode::CREATED)]
#[case(PRODUCTOS, StatusCode::FORBIDDEN)]
#[case(ALMACENES, StatusCode::FORBIDDEN)]
#[tokio::test]
async fn user_creation_is_admin_only(#[case] who: (&str, &str), #[case] expected: StatusCode) {
    let app = TestApp::new().await;
    let cookie = app.login(who).await;

    let response = app
        .request(
            Method::POST,
            "/api/usuarios",
            Some(json!({ "nombre": "nuevo", "password": "secreto", "rol": "productos" })),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), expected);
}

#[rstest]
#[case(ADMIN)]
#[case(PRODUCTOS)]
#[case(ALMACENES)]
#[tokio::test]
async fn every_role_can_read(#[case] who: (&str, &str)) {
    let app = TestApp::new().await;
    let cookie = app.login(who).await;

    for uri in ["/api/productos", "/api/almacenes"] {
        let response = app.request(Method::GET, uri, None, Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }
}

#[rstest]
#[case(Method::PUT)]
#[case(Method::DELETE)]
#[tokio::test]
async fn almacenes_cannot_modify_products(#[case] method: Method) {
    let app = TestApp::new().await;
    let admin = app.login(ADMIN).await;
    let warehouse = app.create_warehouse(&admin, "Central").await;
    let product = json!({
        "nombre": "Tuerca",
        "precio": 0.5,
        "cantidad": 100,
        "departamento": "Ferretería",
        "almacen": warehouse
    });
    let id = app.create_product(&admin, product.clone()).await["id"]
        .as_i64()
        .unwrap();

    let cookie = app.login(ALMACENES).await;
    let body = (method == Method::PUT).then(|| product.clone());
    let response = app
        .request(method, &format!("/api/productos/{id}"), body, Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .request(Method::GET, "/api/productos", None, Some(&cookie))
        .await;
    assert_eq!(response_json(response).await[0]["nombre"], "Tuerca");
}

#[tokio::test]
async fn productos_cannot_rename_warehouses() {
    let app = TestApp::new().await;
    let admin = app.login(ADMIN).await;
    let id = app.create_warehouse(&admin, "Central").await;

    let cookie = app.login(PRODUCTOS).await;
    let response = app
        .request(
            Method::PUT,
            &format!("/api/almacenes/{id}"),
            Some(json!({ "nombre": "Norte" })),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .request(Method::GET, "/api/almacenes", None, Some(&cookie))
        .await;
    assert_eq!(response_json(response).await[0]["nombre"], "Central");
}

#[tokio::test]
async fn forbidden_write_changes_nothing() {
    let app = TestApp::new().await;
    let cookie = app.login(PRODUCTOS).await;

    let response = app
        .request(
            Method::POST,
            "/api/almacenes",
            Some(json!({ "nombre": "Sur" })),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = response_json(response).await;
    assert_eq!(body["success"], false);

    let response = app
        .request(Method::GET, "/api/almacenes", None, Some(&cookie))
        .await;
    assert_eq!(response_json(response).await, json!([]));
}

#[tokio::test]
async fn unauthenticated_write_is_401_not_403() {
    let app = TestApp::new().await;
    let response = app
        .request(
            Method::POST,
            "/api/almacenes",
            Some(json!({ "nombre": "Sur" })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn created_user_can_log_in_and_duplicates_conflict() {
    let app = TestApp::new().await;
    let cookie = app.login(ADMIN).await;
    let payload = json!({ "nombre": "bodega2", "password": "clave", "rol": "almacenes" });

    let response = app
        .request(Method::POST, "/api/usuarios", Some(payload.clone()), Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["data"]["rol"], "ALMACENES");
    assert!(body["data"].get("password_hash").is_none());

    let response = app
        .request(Method::POST, "/api/usuarios", Some(payload), Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    app.login(("bodega2", "clave")).await;
}

#[tokio::test]
async fn unknown_role_is_a_validation_error() {
    let app = TestApp::new().await;
    let cookie = app.login(ADMIN).await;

    let response = app
        .request(
            Method::POST,
            "/api/usuarios",
            Some(json!({ "nombre": "x", "password": "y", "rol": "GERENTE" })),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
