//! HTTP round trips through the real router: auth gating, order creation,
//! duplicate replay and order history.

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
};
use common::TestApp;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn response_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn order_payload(product_id: &str, key: &str) -> Value {
    json!({
        "items": [{ "product_id": product_id, "quantity": 1, "unit_price": "1000" }],
        "shipping_name": "Asha Mwangi",
        "shipping_email": "asha@example.com",
        "shipping_phone": "+254700000001",
        "shipping_address": "Moi Avenue 12",
        "shipping_city": "Nairobi",
        "payment_method": "mpesa",
        "delivery_method": "self_pickup",
        "idempotency_key": key
    })
}

#[tokio::test]
async fn create_order_without_a_token_is_unauthorized() {
    let app = TestApp::new().await;
    let watch = app.seed_product("Chrono Classic", "watches", dec!(1000), 5).await;

    let response = app
        .router()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/checkout/orders",
            None,
            order_payload(&watch.id.to_string(), "key-http-unauth"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.order_count().await, 0);
}

#[tokio::test]
async fn create_order_round_trip_and_duplicate_replay() {
    let app = TestApp::new().await;
    let watch = app.seed_product("Chrono Classic", "watches", dec!(1000), 5).await;
    let token = app.token();

    let response = app
        .router()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/checkout/orders",
            Some(&token),
            order_payload(&watch.id.to_string(), "key-http-1"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    let order_id = body["order_id"].as_str().unwrap().to_string();
    assert_eq!(body["duplicate"], json!(false));

    // Same key again: 200 with the original id, no second order
    let response = app
        .router()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/checkout/orders",
            Some(&token),
            order_payload(&watch.id.to_string(), "key-http-1"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["order_id"].as_str().unwrap(), order_id);
    assert_eq!(body["duplicate"], json!(true));
    assert_eq!(app.order_count().await, 1);
}

#[tokio::test]
async fn validation_failures_surface_their_specific_message() {
    let app = TestApp::new().await;
    let watch = app.seed_product("Chrono Classic", "watches", dec!(1000), 2).await;
    let token = app.token();

    let mut payload = order_payload(&watch.id.to_string(), "key-http-stock");
    payload["items"][0]["quantity"] = json!(3);

    let response = app
        .router()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/checkout/orders",
            Some(&token),
            payload,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response_json(response).await;
    let message = body["message"].as_str().unwrap();
    assert!(
        message.contains("Chrono Classic") && message.contains("2"),
        "message should name the product and the remaining count: {}",
        message
    );
}

#[tokio::test]
async fn order_history_requires_auth_and_returns_the_order() {
    let app = TestApp::new().await;
    let watch = app.seed_product("Chrono Classic", "watches", dec!(1000), 5).await;
    let token = app.token();

    app.router()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/checkout/orders",
            Some(&token),
            order_payload(&watch.id.to_string(), "key-http-hist"),
        ))
        .await
        .unwrap();

    let response = app
        .router()
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/api/v1/orders")
                .header(header::AUTHORIZATION, format!("Bearer {}", app.token()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["pagination"]["total"], json!(1));
    assert_eq!(body["orders"][0]["total"].as_str().unwrap(), "2000");

    let response = app
        .router()
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/api/v1/orders")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn delivery_options_are_public() {
    let app = TestApp::new().await;
    app.seed_area("CBD", "Moi Avenue", dec!(150)).await;

    let response = app
        .router()
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/api/v1/delivery/options")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["areas"].as_array().unwrap().len(), 1);
    assert_eq!(body["currency"], json!("KES"));
    assert_eq!(
        body["partial_payment_categories"],
        json!(["watches"])
    );
}

#[tokio::test]
async fn quote_is_public_and_flags_a_required_area() {
    let app = TestApp::new().await;
    app.seed_area("CBD", "Moi Avenue", dec!(150)).await;
    let watch = app.seed_product("Chrono Classic", "watches", dec!(1000), 5).await;

    let payload = json!({
        "items": [{ "product_id": watch.id.to_string(), "quantity": 1, "unit_price": "1000" }],
        "delivery_method": "rider"
    });

    let response = app
        .router()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/checkout/quote",
            None,
            payload,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["area_required"], json!(true));
}
