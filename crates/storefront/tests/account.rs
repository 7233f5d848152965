//! Sign-in, menu browsing and the account pages.

#![allow(clippy::unwrap_used)]

mod common;

use axum::http::{Method, StatusCode};
use rust_decimal_macros::dec;
use serde_json::json;

use common::{TestClient, add_dish, ten_dollar_dish};
use sage_kitchen_core::catalog::Category;

#[tokio::test]
async fn test_health_endpoints() {
    let mut client = TestClient::new();
    assert_eq!(client.get("/health").await.status, StatusCode::OK);
    assert_eq!(client.get("/health/ready").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_menu_filters_by_category_and_search() {
    let mut client = TestClient::new();
    let pizza = ten_dollar_dish(&client.backend).await;
    add_dish(&client.backend, "Ramen", dec!(12.50), Category::Japanese).await;

    let all = client.get("/products").await;
    assert_eq!(all.body.as_array().unwrap().len(), 2);

    let japanese = client.get("/products?category=japanese").await;
    assert_eq!(japanese.body.as_array().unwrap().len(), 1);
    assert_eq!(japanese.body[0]["name"], "Ramen");

    let search = client.get("/products?q=margh").await;
    assert_eq!(search.body.as_array().unwrap().len(), 1);

    let detail = client.get(&format!("/products/{}", pizza.id)).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.body["name"], "Margherita");

    let missing = client
        .get("/products/00000000-0000-0000-0000-000000000000")
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_signup_login_logout() {
    let mut client = TestClient::new();
    let created = client.sign_up("Diner@Example.com").await;
    assert_eq!(created.body["email"], "diner@example.com");
    assert_eq!(client.get("/orders").await.status, StatusCode::OK);

    let out = client.empty(Method::POST, "/auth/logout").await;
    assert_eq!(out.status, StatusCode::NO_CONTENT);
    assert_eq!(client.get("/orders").await.status, StatusCode::UNAUTHORIZED);

    let bad = client
        .post(
            "/auth/login",
            json!({ "email": "diner@example.com", "password": "wrong-password" }),
        )
        .await;
    assert_eq!(bad.status, StatusCode::UNAUTHORIZED);
    assert_eq!(bad.body["error"], "Invalid email or password");

    let good = client
        .post(
            "/auth/login",
            json!({ "email": "diner@example.com", "password": "olive-oil-2024" }),
        )
        .await;
    assert_eq!(good.status, StatusCode::OK);
    assert_eq!(client.get("/orders").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_signup_validation() {
    let mut client = TestClient::new();
    client.sign_up("diner@example.com").await;

    let mut other = client.stranger();
    let duplicate = other
        .post(
            "/auth/signup",
            json!({ "email": "diner@example.com", "password": "olive-oil-2024" }),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let short = other
        .post(
            "/auth/signup",
            json!({ "email": "new@example.com", "password": "short" }),
        )
        .await;
    assert_eq!(short.status, StatusCode::BAD_REQUEST);

    let bad_email = other
        .post(
            "/auth/signup",
            json!({ "email": "not-an-email", "password": "olive-oil-2024" }),
        )
        .await;
    assert_eq!(bad_email.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cart_survives_sign_in() {
    let mut client = TestClient::new();
    let pizza = ten_dollar_dish(&client.backend).await;
    client
        .post("/cart/items", json!({ "product_id": pizza.id }))
        .await;

    client.sign_up("diner@example.com").await;
    assert_eq!(client.get("/cart/count").await.body["count"], 1);
}

#[tokio::test]
async fn test_favorites_toggle() {
    let mut client = TestClient::new();
    let pizza = ten_dollar_dish(&client.backend).await;
    client.sign_up("diner@example.com").await;
    let path = format!("/favorites/{}", pizza.id);

    let on = client.empty(Method::POST, &path).await;
    assert_eq!(on.body["favorite"], true);
    let list = client.get("/favorites").await;
    assert_eq!(list.body[0]["name"], "Margherita");

    let off = client.empty(Method::POST, &path).await;
    assert_eq!(off.body["favorite"], false);
    assert_eq!(client.get("/favorites").await.body, json!([]));

    client.empty(Method::POST, &path).await;
    let removed = client.empty(Method::DELETE, &path).await;
    assert_eq!(removed.status, StatusCode::NO_CONTENT);
    assert_eq!(client.get("/favorites").await.body, json!([]));
}

#[tokio::test]
async fn test_meal_plans() {
    let mut client = TestClient::new();
    let pizza = ten_dollar_dish(&client.backend).await;
    client.sign_up("diner@example.com").await;

    let no_meal = client
        .post(
            "/plans",
            json!({ "meal_id": "00000000-0000-0000-0000-000000000000" }),
        )
        .await;
    assert_eq!(no_meal.status, StatusCode::BAD_REQUEST);
    assert_eq!(no_meal.body["error"], "Please select a meal");

    let plan = client
        .post(
            "/plans",
            json!({ "meal_id": pizza.id, "delivery_time": "18:30" }),
        )
        .await;
    assert_eq!(plan.status, StatusCode::CREATED);
    assert_eq!(plan.body["status"], "active");
    assert_eq!(plan.body["frequency"], "daily");
    let plan_id = plan.body["id"].as_str().unwrap().to_owned();

    let listed = client.get("/plans").await;
    assert_eq!(listed.body[0]["product"]["name"], "Margherita");

    let mut stranger = client.stranger();
    stranger.sign_up("other@example.com").await;
    let foreign = stranger
        .empty(Method::POST, &format!("/plans/{plan_id}/cancel"))
        .await;
    assert_eq!(foreign.status, StatusCode::NOT_FOUND);

    let cancelled = client
        .empty(Method::POST, &format!("/plans/{plan_id}/cancel"))
        .await;
    assert_eq!(cancelled.body["status"], "cancelled");
}

#[tokio::test]
async fn test_profile_page() {
    let mut client = TestClient::new();
    let pizza = ten_dollar_dish(&client.backend).await;
    client.sign_up("diner@example.com").await;

    let plan = client.post("/plans", json!({ "meal_id": pizza.id })).await;
    let plan_id = plan.body["id"].as_str().unwrap().to_owned();
    client.post("/plans", json!({ "meal_id": pizza.id })).await;
    client
        .empty(Method::POST, &format!("/plans/{plan_id}/cancel"))
        .await;

    let updated = client
        .json(
            Method::PUT,
            "/profile",
            json!({ "full_name": "  Sage Diner ", "phone": "   " }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["full_name"], "Sage Diner");
    assert!(updated.body["phone"].is_null());

    let page = client.get("/profile").await;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.body["user"]["email"], "diner@example.com");
    assert_eq!(page.body["profile"]["full_name"], "Sage Diner");
    assert_eq!(page.body["recent_orders"], json!([]));
    assert_eq!(page.body["active_plans"].as_array().unwrap().len(), 1);
}
