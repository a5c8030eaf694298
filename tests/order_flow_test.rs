//! Order placement: server-side pricing, stock checks, and the invariant
//! that creation never moves stock.

mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use storefront_api::entities::UserRole;
use uuid::Uuid;

fn money(value: &Value) -> Decimal {
    value
        .as_str()
        .expect("money serialized as string")
        .parse()
        .expect("valid decimal")
}

#[tokio::test]
async fn creates_order_with_fresh_prices_and_leaves_stock_alone() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_user("shopper@example.com", UserRole::User).await;
    let cat = app.seed_category("Dresses", "dresses").await;
    let product = app
        .seed_product("Silk Maxi Dress", dec!(85000), 25, cat.id)
        .await;

    let payload = json!({
        "items": [{ "productId": product.id, "quantity": 2, "size": "M" }],
        "shippingAddress": "12 Allen Avenue, Ikeja, Lagos"
    });
    let response = app
        .request(Method::POST, "/api/v1/orders", Some(payload), Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response_json(response).await;
    let order = &body["data"];
    assert_eq!(money(&order["total_amount"]), dec!(170000));
    assert_eq!(order["payment_status"], json!("PENDING"));
    assert_eq!(order["status"], json!("processing"));
    assert_eq!(money(&order["items"][0]["unit_price"]), dec!(85000));
    assert!(order["payment_reference"].is_null());

    // Stock is untouched until payment is confirmed.
    let reloaded = app.reload_product(product.id).await;
    assert_eq!(reloaded.stock, 25);
}

#[tokio::test]
async fn client_supplied_prices_are_ignored() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_user("bargainer@example.com", UserRole::User).await;
    let cat = app.seed_category("Shoes", "shoes").await;
    let product = app
        .seed_product("Leather Loafers", dec!(42000), 10, cat.id)
        .await;

    // The extra unit_price field is not part of the contract and changes
    // nothing; totals always come from the catalog.
    let payload = json!({
        "items": [{ "productId": product.id, "quantity": 1, "unitPrice": "1" }],
        "shippingAddress": "3 Marina Road, Lagos Island"
    });
    let response = app
        .request(Method::POST, "/api/v1/orders", Some(payload), Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response_json(response).await;
    assert_eq!(money(&body["data"]["total_amount"]), dec!(42000));
}

#[tokio::test]
async fn rejects_order_exceeding_stock_and_names_the_product() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_user("greedy@example.com", UserRole::User).await;
    let cat = app.seed_category("Bags", "bags").await;
    let product = app.seed_product("Tote Bag", dec!(15000), 3, cat.id).await;

    let payload = json!({
        "items": [{ "productId": product.id, "quantity": 5 }],
        "shippingAddress": "7 Awolowo Road, Ikoyi"
    });
    let response = app
        .request(Method::POST, "/api/v1/orders", Some(payload), Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response_json(response).await;
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("Tote Bag"), "message was: {}", message);

    let reloaded = app.reload_product(product.id).await;
    assert_eq!(reloaded.stock, 3);
}

#[tokio::test]
async fn rejects_empty_and_malformed_orders() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_user("careless@example.com", UserRole::User).await;
    let cat = app.seed_category("Hats", "hats").await;
    let product = app.seed_product("Bucket Hat", dec!(8000), 5, cat.id).await;

    // No items
    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({ "items": [], "shippingAddress": "somewhere" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Zero quantity
    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "items": [{ "productId": product.id, "quantity": 0 }],
                "shippingAddress": "somewhere"
            })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Empty shipping address
    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "items": [{ "productId": product.id, "quantity": 1 }],
                "shippingAddress": ""
            })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Unknown product
    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "items": [{ "productId": Uuid::new_v4(), "quantity": 1 }],
                "shippingAddress": "somewhere"
            })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn requires_authentication() {
    let app = TestApp::new().await;
    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({ "items": [], "shippingAddress": "x" })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn my_orders_lists_newest_first_with_items() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_user("repeat@example.com", UserRole::User).await;
    let cat = app.seed_category("Tops", "tops").await;
    let first = app.seed_product("Linen Shirt", dec!(20000), 10, cat.id).await;
    let second = app.seed_product("Crop Top", dec!(12000), 10, cat.id).await;

    for product in [&first, &second] {
        let payload = json!({
            "items": [{ "productId": product.id, "quantity": 1 }],
            "shippingAddress": "5 Broad Street, Lagos"
        });
        let response = app
            .request(Method::POST, "/api/v1/orders", Some(payload), Some(&token))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .request(Method::GET, "/api/v1/orders/mine", None, Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    let orders = body["data"].as_array().unwrap();
    assert_eq!(orders.len(), 2);
    // Newest first: the Crop Top order was placed last.
    assert_eq!(orders[0]["items"][0]["product_name"], json!("Crop Top"));
    assert_eq!(orders[1]["items"][0]["product_name"], json!("Linen Shirt"));

    // Another user sees none of them.
    let (_, other_token) = app.seed_user("other@example.com", UserRole::User).await;
    let response = app
        .request(Method::GET, "/api/v1/orders/mine", None, Some(&other_token))
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}
