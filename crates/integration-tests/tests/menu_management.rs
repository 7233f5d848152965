//! Admin menu edits as seen from the storefront.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{Value, json};

use sage_kitchen_integration_tests::{PASSWORD, TestContext};

async fn admin_client(ctx: &TestContext) -> reqwest::Client {
    ctx.create_user("chef@example.com", true).await.unwrap();
    let admin = TestContext::client().unwrap();
    let resp = admin
        .post(ctx.admin("/auth/login"))
        .json(&json!({ "email": "chef@example.com", "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    admin
}

fn money(value: &Value) -> Decimal {
    value.as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn test_new_dish_appears_on_storefront() {
    let ctx = TestContext::start().await.unwrap();
    let admin = admin_client(&ctx).await;

    let form = Form::new()
        .text("name", "Greek Salad")
        .text("description", "Tomato, cucumber, feta")
        .text("price", "9.00")
        .text("category", "Healthy")
        .part("images", Part::bytes(b"jpeg bytes".to_vec()).file_name("salad.jpg"));
    let resp = admin
        .post(ctx.admin("/products"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = resp.json().await.unwrap();

    let shopper = TestContext::client().unwrap();
    let menu: Value = shopper
        .get(ctx.storefront("/products?category=Healthy"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(menu.as_array().unwrap().len(), 1);
    assert_eq!(menu[0]["id"], created["id"]);
    assert!(menu[0]["images"][0].as_str().unwrap().contains("products/"));
}

#[tokio::test]
async fn test_cart_keeps_snapshot_after_menu_edits() {
    let ctx = TestContext::start().await.unwrap();
    let admin = admin_client(&ctx).await;
    let burger = ctx
        .add_dish(
            "Smash Burger",
            dec!(11.00),
            sage_kitchen_core::catalog::Category::American,
        )
        .await
        .unwrap();

    let shopper = TestContext::client().unwrap();
    shopper
        .post(ctx.storefront("/cart/items"))
        .json(&json!({ "product_id": burger.id }))
        .send()
        .await
        .unwrap();

    let resp = admin
        .put(ctx.admin(&format!("/products/{}", burger.id)))
        .json(&json!({ "name": "Smash Burger", "price": "13.00", "category": "American" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let cart: Value = shopper
        .get(ctx.storefront("/cart"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(money(&cart["total"]), dec!(11));

    let resp = admin
        .delete(ctx.admin(&format!("/products/{}", burger.id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = shopper
        .get(ctx.storefront(&format!("/products/{}", burger.id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let cart: Value = shopper
        .get(ctx.storefront("/cart"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart["items"][0]["name"], "Smash Burger");
    assert_eq!(cart["item_count"], 1);
}
