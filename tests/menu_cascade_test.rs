mod common;

use axum::http::{Method, StatusCode};
use common::{create_business_for, TestApp};
use serde_json::json;

/// Seeds a business with one category, one subcategory, and one item,
/// returning (category_id, subcategory_id, item_id, owner_token).
async fn seed_menu(app: &TestApp) -> (i64, i64, i64, String) {
    let (owner, token) = app.owner().await;
    let (business_id, token) =
        create_business_for(app, &owner, &token, "pizza-place", "Pizza Place").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/menu/categories",
            Some(json!({ "business_id": business_id, "name": "Pizzas" })),
            Some(&token),
        )
        .await;
    let category = TestApp::read_json(response, StatusCode::CREATED).await;
    let category_id = category["id"].as_i64().unwrap();

    let response = app
        .request(
            Method::POST,
            "/api/v1/menu/subcategories",
            Some(json!({ "category_id": category_id, "name": "Classic" })),
            Some(&token),
        )
        .await;
    let subcategory = TestApp::read_json(response, StatusCode::CREATED).await;
    let subcategory_id = subcategory["id"].as_i64().unwrap();

    let response = app
        .request(
            Method::POST,
            "/api/v1/menu/items",
            Some(json!({
                "subcategory_id": subcategory_id,
                "name": "Margherita",
                "price": "9.5",
            })),
            Some(&token),
        )
        .await;
    let item = TestApp::read_json(response, StatusCode::CREATED).await;
    let item_id = item["id"].as_i64().unwrap();

    (category_id, subcategory_id, item_id, token)
}

#[tokio::test]
async fn created_item_round_trips_through_listing() {
    let app = TestApp::new().await;
    let (_, subcategory_id, _, _) = seed_menu(&app).await;

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/menu/subcategories/{}/items", subcategory_id),
            None,
            None,
        )
        .await;
    let items = TestApp::read_json(response, StatusCode::OK).await;

    let items = items.as_array().expect("items array");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "Margherita");
    assert_eq!(items[0]["price"], "9.5");
}

#[tokio::test]
async fn deleting_category_cascades_to_all_descendants() {
    let app = TestApp::new().await;
    let (category_id, subcategory_id, _, token) = seed_menu(&app).await;

    // A second subcategory with its own item, to prove the cascade walks
    // every branch
    let response = app
        .request(
            Method::POST,
            "/api/v1/menu/subcategories",
            Some(json!({ "category_id": category_id, "name": "Specials" })),
            Some(&token),
        )
        .await;
    let specials = TestApp::read_json(response, StatusCode::CREATED).await;
    let specials_id = specials["id"].as_i64().unwrap();

    let response = app
        .request(
            Method::POST,
            "/api/v1/menu/items",
            Some(json!({
                "subcategory_id": specials_id,
                "name": "Truffle Pizza",
                "price": "24.00",
            })),
            Some(&token),
        )
        .await;
    TestApp::read_json(response, StatusCode::CREATED).await;

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/menu/categories/{}", category_id),
            None,
            Some(&token),
        )
        .await;
    let outcome = TestApp::read_json(response, StatusCode::OK).await;
    assert_eq!(outcome["subcategories_deleted"], 2);
    assert_eq!(outcome["items_deleted"], 2);

    // Listing any part of the deleted subtree returns empty sets
    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/menu/categories/{}/subcategories", category_id),
            None,
            None,
        )
        .await;
    let subcategories = TestApp::read_json(response, StatusCode::OK).await;
    assert_eq!(subcategories.as_array().unwrap().len(), 0);

    for sub in [subcategory_id, specials_id] {
        let response = app
            .request(
                Method::GET,
                &format!("/api/v1/menu/subcategories/{}/items", sub),
                None,
                None,
            )
            .await;
        let items = TestApp::read_json(response, StatusCode::OK).await;
        assert_eq!(items.as_array().unwrap().len(), 0);
    }
}

#[tokio::test]
async fn deleting_subcategory_leaves_category_and_business_intact() {
    let app = TestApp::new().await;
    let (category_id, subcategory_id, _, token) = seed_menu(&app).await;

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/menu/subcategories/{}", subcategory_id),
            None,
            Some(&token),
        )
        .await;
    let outcome = TestApp::read_json(response, StatusCode::OK).await;
    assert_eq!(outcome["items_deleted"], 1);

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/menu/subcategories/{}/items", subcategory_id),
            None,
            None,
        )
        .await;
    let items = TestApp::read_json(response, StatusCode::OK).await;
    assert_eq!(items.as_array().unwrap().len(), 0);

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/menu/categories/{}/subcategories", category_id),
            None,
            None,
        )
        .await;
    let subcategories = TestApp::read_json(response, StatusCode::OK).await;
    assert_eq!(subcategories.as_array().unwrap().len(), 0);

    // The category and the business survive
    let response = app
        .request(
            Method::GET,
            "/api/v1/businesses/by-username/pizza-place",
            None,
            None,
        )
        .await;
    let business = TestApp::read_json(response, StatusCode::OK).await;
    let business_id = business["id"].as_i64().unwrap();

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/menu/categories?business_id={}", business_id),
            None,
            None,
        )
        .await;
    let categories = TestApp::read_json(response, StatusCode::OK).await;
    let categories = categories.as_array().unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0]["name"], "Pizzas");
}

#[tokio::test]
async fn non_numeric_price_is_rejected_before_any_write() {
    let app = TestApp::new().await;
    let (_, subcategory_id, _, token) = seed_menu(&app).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/menu/items",
            Some(json!({
                "subcategory_id": subcategory_id,
                "name": "Mystery Dish",
                "price": "abc",
            })),
            Some(&token),
        )
        .await;
    let error = TestApp::read_json(response, StatusCode::BAD_REQUEST).await;
    assert!(error["message"]
        .as_str()
        .unwrap()
        .contains("Price must be a number"));

    // Nothing was persisted
    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/menu/subcategories/{}/items", subcategory_id),
            None,
            None,
        )
        .await;
    let items = TestApp::read_json(response, StatusCode::OK).await;
    assert_eq!(items.as_array().unwrap().len(), 1); // only the seeded Margherita
}

#[tokio::test]
async fn categories_are_listed_by_display_order_then_id() {
    let app = TestApp::new().await;
    let (owner, token) = app.owner().await;
    let (business_id, token) =
        create_business_for(&app, &owner, &token, "taco-town", "Taco Town").await;

    for (name, display_order) in [("Second", 2), ("First", 1), ("Also first", 1)] {
        let response = app
            .request(
                Method::POST,
                "/api/v1/menu/categories",
                Some(json!({
                    "business_id": business_id,
                    "name": name,
                    "display_order": display_order,
                })),
                Some(&token),
            )
            .await;
        TestApp::read_json(response, StatusCode::CREATED).await;
    }

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/menu/categories?business_id={}", business_id),
            None,
            None,
        )
        .await;
    let categories = TestApp::read_json(response, StatusCode::OK).await;
    let names: Vec<&str> = categories
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();

    // display_order ascending; the tie between the two 1s breaks by insert id
    assert_eq!(names, vec!["First", "Also first", "Second"]);
}

#[tokio::test]
async fn empty_category_name_is_a_validation_error() {
    let app = TestApp::new().await;
    let (owner, token) = app.owner().await;
    let (business_id, token) =
        create_business_for(&app, &owner, &token, "noodle-bar", "Noodle Bar").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/menu/categories",
            Some(json!({ "business_id": business_id, "name": "   " })),
            Some(&token),
        )
        .await;
    TestApp::read_json(response, StatusCode::BAD_REQUEST).await;
}

#[tokio::test]
async fn foreign_owner_cannot_touch_another_menu() {
    let app = TestApp::new().await;
    let (owner, token) = app.owner().await;
    let (business_id, _token) =
        create_business_for(&app, &owner, &token, "sushi-spot", "Sushi Spot").await;

    let (intruder, intruder_token) = app.owner().await;
    let (_intruder_business, intruder_token) = create_business_for(
        &app,
        &intruder,
        &intruder_token,
        "rival-rolls",
        "Rival Rolls",
    )
    .await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/menu/categories",
            Some(json!({ "business_id": business_id, "name": "Hijacked" })),
            Some(&intruder_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn mutations_require_authentication() {
    let app = TestApp::new().await;
    let (owner, token) = app.owner().await;
    let (business_id, _) =
        create_business_for(&app, &owner, &token, "bagel-barn", "Bagel Barn").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/menu/categories",
            Some(json!({ "business_id": business_id, "name": "Bagels" })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
