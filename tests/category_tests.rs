#[macro_use]
mod test_utils;

use actix_web::{http::StatusCode, test};
use serde_json::{json, Value};
use test_utils::*;

#[actix_rt::test]
async fn created_category_gets_a_slug_and_is_listed_publicly() {
    let ctx = TestContext::new();
    let app = test_app!(ctx.state);
    let cookie = admin_cookie!(app, ctx);

    let req = test::TestRequest::post()
        .uri("/api/admin/categories")
        .cookie(cookie)
        .set_json(json!({ "name": "Black & White!!", "description": "Monochrome work" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["category"]["slug"], "black-white");
    assert_eq!(ctx.invalidator.call_count(), 1);

    let req = test::TestRequest::get().uri("/api/categories").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["categories"].as_array().unwrap().len(), 1);
    assert_eq!(body["categories"][0]["name"], "Black & White!!");
}

#[actix_rt::test]
async fn duplicate_slug_is_a_conflict() {
    let ctx = TestContext::new();
    ctx.db.seed_category("Street", "street");
    let app = test_app!(ctx.state);
    let cookie = admin_cookie!(app, ctx);

    let req = test::TestRequest::post()
        .uri("/api/admin/categories")
        .cookie(cookie)
        .set_json(json!({ "name": "Street!" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(ctx.db.categories().len(), 1);
}

#[actix_rt::test]
async fn name_without_slug_characters_is_rejected() {
    let ctx = TestContext::new();
    let app = test_app!(ctx.state);
    let cookie = admin_cookie!(app, ctx);

    let req = test::TestRequest::post()
        .uri("/api/admin/categories")
        .cookie(cookie)
        .set_json(json!({ "name": "!!!" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(ctx.db.categories().is_empty());
}

#[actix_rt::test]
async fn renaming_a_category_regenerates_its_slug() {
    let ctx = TestContext::new();
    let category = ctx.db.seed_category("Street", "street");
    let app = test_app!(ctx.state);
    let cookie = admin_cookie!(app, ctx);

    let req = test::TestRequest::put()
        .uri(&format!("/api/admin/categories/{}", category.id))
        .cookie(cookie)
        .set_json(json!({ "name": "Street Life", "description": null }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["category"]["slug"], "street-life");
    assert!(body["category"]["description"].is_null());
}

#[actix_rt::test]
async fn updating_a_missing_category_is_not_found() {
    let ctx = TestContext::new();
    let app = test_app!(ctx.state);
    let cookie = admin_cookie!(app, ctx);

    let req = test::TestRequest::put()
        .uri(&format!("/api/admin/categories/{}", uuid::Uuid::new_v4()))
        .cookie(cookie)
        .set_json(json!({ "name": "Nothing" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn category_in_use_cannot_be_deleted() {
    let ctx = TestContext::new();
    let category = ctx.db.seed_category("Street", "street");
    ctx.db.seed_photo("alley", 0, Some(category.id), false);
    let app = test_app!(ctx.state);
    let cookie = admin_cookie!(app, ctx);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/admin/categories/{}", category.id))
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("1 photo(s)"));
    assert_eq!(ctx.db.categories().len(), 1);
}

#[actix_rt::test]
async fn unused_category_is_deleted() {
    let ctx = TestContext::new();
    let category = ctx.db.seed_category("Street", "street");
    let app = test_app!(ctx.state);
    let cookie = admin_cookie!(app, ctx);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/admin/categories/{}", category.id))
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert!(ctx.db.categories().is_empty());
}

#[actix_rt::test]
async fn malformed_category_id_is_a_bad_request() {
    let ctx = TestContext::new();
    let app = test_app!(ctx.state);
    let cookie = admin_cookie!(app, ctx);

    let req = test::TestRequest::delete()
        .uri("/api/admin/categories/not-a-uuid")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
