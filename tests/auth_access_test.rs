//! Accounts, role enforcement, and the authenticated surfaces: wishlist,
//! reviews, catalog admin, back-office.

mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;
use storefront_api::entities::UserRole;

#[tokio::test]
async fn register_then_login_round_trip() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/register",
            Some(json!({
                "name": "Ada Obi",
                "email": "Ada@Example.com",
                "password": "correct-horse-battery",
                "phone": "+2348012345678"
            })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert!(body["data"]["token"].as_str().is_some());
    // Emails are normalized to lowercase.
    assert_eq!(body["data"]["user"]["email"], json!("ada@example.com"));
    assert_eq!(body["data"]["user"]["role"], json!("USER"));
    // The stored hash never leaves the server.
    assert!(body["data"]["user"].get("password_hash").is_none());

    // Duplicate registration conflicts.
    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/register",
            Some(json!({
                "name": "Ada Again",
                "email": "ada@example.com",
                "password": "another-password"
            })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Login with the right password works, wrong password does not.
    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "email": "ada@example.com", "password": "correct-horse-battery" })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "email": "ada@example.com", "password": "wrong" })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_surfaces_reject_regular_users() {
    let app = TestApp::new().await;
    let (_, user_token) = app.seed_user("user@example.com", UserRole::User).await;
    let cat = app.seed_category("Dresses", "dresses").await;

    let admin_calls = [
        (Method::GET, "/api/v1/admin/orders", None),
        (Method::GET, "/api/v1/admin/customers", None),
        (Method::GET, "/api/v1/admin/coupons", None),
        (
            Method::POST,
            "/api/v1/products",
            Some(json!({
                "name": "Sneakers",
                "description": "White sneakers",
                "price": "30000",
                "category_id": cat.id,
                "stock": 5
            })),
        ),
        (
            Method::POST,
            "/api/v1/categories",
            Some(json!({ "name": "New", "slug": "new" })),
        ),
    ];

    for (method, uri, body) in admin_calls {
        let response = app.request(method, uri, body, Some(&user_token)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "uri: {}", uri);
    }
}

#[tokio::test]
async fn admin_manages_catalog_orders_and_roles() {
    let app = TestApp::new().await;
    let (_, admin_token) = app.seed_user("admin@example.com", UserRole::Admin).await;
    let (shopper, shopper_token) = app.seed_user("shopper@example.com", UserRole::User).await;
    let cat = app.seed_category("Dresses", "dresses").await;

    // Admin creates a product.
    let response = app
        .request(
            Method::POST,
            "/api/v1/products",
            Some(json!({
                "name": "Wrap Dress",
                "description": "Jersey wrap dress",
                "price": "55000",
                "category_id": cat.id,
                "stock": 8,
                "sizes": ["S", "M"]
            })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let product_id = response_json(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    // Admin sets absolute stock via update.
    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/products/{}", product_id),
            Some(json!({ "stock": 3 })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["stock"], json!(3));

    // Shopper places an order; admin sees it and ships it.
    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "items": [{ "productId": product_id, "quantity": 1 }],
                "shippingAddress": "1 Unity Road, Kano"
            })),
            Some(&shopper_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let order_id = response_json(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .request(Method::GET, "/api/v1/admin/orders", None, Some(&admin_token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    let rows = body["data"]["orders"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["customer_email"], json!("shopper@example.com"));
    assert_eq!(rows[0]["item_count"], json!(1));

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/admin/orders/{}/status", order_id),
            Some(json!({ "status": "shipped" })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["status"], json!("shipped"));

    // Unknown status is rejected.
    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/admin/orders/{}/status", order_id),
            Some(json!({ "status": "teleported" })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Admin promotes the shopper.
    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/admin/customers/{}/role", shopper.id),
            Some(json!({ "role": "ADMIN" })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["role"], json!("ADMIN"));
}

#[tokio::test]
async fn wishlist_toggle_adds_then_removes() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_user("wisher@example.com", UserRole::User).await;
    let cat = app.seed_category("Bags", "bags").await;
    let product = app.seed_product("Clutch", dec!(25000), 4, cat.id).await;

    let payload = json!({ "product_id": product.id });
    let response = app
        .request(
            Method::POST,
            "/api/v1/wishlist",
            Some(payload.clone()),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["action"], json!("added"));

    let response = app
        .request(Method::GET, "/api/v1/wishlist", None, Some(&token))
        .await;
    let body = response_json(response).await;
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], json!("Clutch"));
    assert_eq!(items[0]["in_stock"], json!(true));

    let response = app
        .request(Method::POST, "/api/v1/wishlist", Some(payload), Some(&token))
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["action"], json!("removed"));

    let response = app
        .request(Method::GET, "/api/v1/wishlist", None, Some(&token))
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn reviews_are_validated_and_listed_newest_first() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_user("critic@example.com", UserRole::User).await;
    let cat = app.seed_category("Shoes", "shoes").await;
    let product = app.seed_product("Heels", dec!(40000), 6, cat.id).await;

    // Out-of-range rating.
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/products/{}/reviews", product.id),
            Some(json!({ "rating": 6, "comment": "too good" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Anonymous review attempts are rejected.
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/products/{}/reviews", product.id),
            Some(json!({ "rating": 5 })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    for (rating, comment) in [(4, "solid"), (5, "love them")] {
        let response = app
            .request(
                Method::POST,
                &format!("/api/v1/products/{}/reviews", product.id),
                Some(json!({ "rating": rating, "comment": comment })),
                Some(&token),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/products/{}/reviews", product.id),
            None,
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    let reviews = body["data"].as_array().unwrap();
    assert_eq!(reviews.len(), 2);
    assert_eq!(reviews[0]["comment"], json!("love them"));
    assert_eq!(reviews[0]["reviewer_name"], json!("Test User"));
}

#[tokio::test]
async fn coupons_lifecycle() {
    let app = TestApp::new().await;
    let (_, admin_token) = app.seed_user("admin@example.com", UserRole::SuperAdmin).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/admin/coupons",
            Some(json!({ "code": "welcome10", "percent_off": 10 })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    // Codes are normalized to uppercase.
    assert_eq!(body["data"]["code"], json!("WELCOME10"));
    let coupon_id = body["data"]["id"].as_str().unwrap().to_string();

    // Duplicate code conflicts regardless of case.
    let response = app
        .request(
            Method::POST,
            "/api/v1/admin/coupons",
            Some(json!({ "code": "WELCOME10", "percent_off": 15 })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/admin/coupons/{}", coupon_id),
            None,
            Some(&admin_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["is_active"], json!(false));
}

#[tokio::test]
async fn catalog_listing_filters_and_sorts() {
    let app = TestApp::new().await;
    let dresses = app.seed_category("Dresses", "dresses").await;
    let shoes = app.seed_category("Shoes", "shoes").await;
    app.seed_product("Cheap Dress", dec!(10000), 5, dresses.id)
        .await;
    app.seed_product("Pricey Dress", dec!(90000), 5, dresses.id)
        .await;
    app.seed_product("Boots", dec!(50000), 5, shoes.id).await;

    let response = app
        .request(
            Method::GET,
            "/api/v1/products?category=dresses&sort=price-low",
            None,
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    let products = body["data"]["products"].as_array().unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0]["name"], json!("Cheap Dress"));
    assert_eq!(body["data"]["total"], json!(2));

    // Unknown category slug is a 404, not an empty page.
    let response = app
        .request(Method::GET, "/api/v1/products?category=hats", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Categories come back name-ordered with counts.
    let response = app.request(Method::GET, "/api/v1/categories", None, None).await;
    let body = response_json(response).await;
    let categories = body["data"].as_array().unwrap();
    assert_eq!(categories[0]["name"], json!("Dresses"));
    assert_eq!(categories[0]["product_count"], json!(2));
    assert_eq!(categories[1]["product_count"], json!(1));
}
