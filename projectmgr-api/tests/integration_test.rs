/// Integration tests for the projectmgr API
///
/// Drive the full router over the in-memory store:
/// - Registration and login
/// - Project creation and ownership-scoped access
/// - Listing, search and pagination

mod common;

use axum::http::{Method, StatusCode};
use common::TestContext;
use projectmgr_shared::store::Store;
use serde_json::json;

#[tokio::test]
async fn test_end_to_end_scenario() {
    let ctx = TestContext::new();

    let (status, alice) = ctx
        .post(
            "/api/users/register/",
            None,
            json!({ "username": "alice", "email": "alice@example.com", "password": "password123" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(alice["username"], "alice");
    assert!(alice.get("password").is_none());

    let (status, _) = ctx.post("/api/projects/", None, json!({ "title": "T" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let token = ctx.login("alice").await;
    let project = ctx.create_project(&token, "T").await;
    assert_eq!(project["owner"]["username"], "alice");

    let id = project["id"].as_i64().unwrap();
    let (status, _) = ctx.get(&format!("/api/projects/{}/bob/", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = ctx.get(&format!("/api/projects/{}/alice/", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "T");
}

#[tokio::test]
async fn test_unauthenticated_create_stores_nothing() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .post("/api/projects/", None, json!({ "title": "Orphan" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, list) = ctx.get("/api/projects/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["count"], 0);
}

#[tokio::test]
async fn test_unauthenticated_create_forbidden_before_validation() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .post("/api/projects/", None, json!({ "title": "   " }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
    assert!(body.get("details").is_none());

    let (status, _) = ctx
        .post("/api/projects/", None, json!({ "title": "x".repeat(101) }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_positional_project_body_rejected() {
    let ctx = TestContext::new();
    let token = ctx.register_and_login("alice").await;

    let (status, body) = ctx
        .post("/api/projects/", Some(&token), json!(["Positional", "desc"]))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (_, list) = ctx.get("/api/projects/", None).await;
    assert_eq!(list["count"], 0);
}

#[tokio::test]
async fn test_null_title_rejected() {
    let ctx = TestContext::new();
    let alice = ctx.register_and_login("alice").await;
    let project = ctx.create_project(&alice, "Kept").await;
    let id = project["id"].as_i64().unwrap();

    let (status, body) = ctx
        .request(
            Method::PATCH,
            &format!("/api/projects/{}/alice/", id),
            Some(&alice),
            Some(json!({ "title": null })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "title");
    assert_eq!(body["details"][0]["message"], "This field may not be null.");

    let (_, stored) = ctx.get(&format!("/api/projects/{}/", id), None).await;
    assert_eq!(stored["title"], "Kept");

    // Unknown keys stay ignored, null or not
    let (status, _) = ctx
        .request(
            Method::PATCH,
            &format!("/api/projects/{}/alice/", id),
            Some(&alice),
            Some(json!({ "owner": null })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_owner_in_body_is_ignored() {
    let ctx = TestContext::new();
    let bob = ctx.register("bob").await;
    let token = ctx.register_and_login("alice").await;

    let (status, project) = ctx
        .post(
            "/api/projects/",
            Some(&token),
            json!({ "title": "Mine", "owner": bob["id"] }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(project["owner"]["username"], "alice");
}

#[tokio::test]
async fn test_project_defaults() {
    let ctx = TestContext::new();
    let token = ctx.register_and_login("alice").await;

    let (status, project) = ctx.post("/api/projects/", Some(&token), json!({})).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(project["title"], "Untitled Project");
    assert_eq!(project["description"], "");
    assert!(project["created_at"].is_string());
}

#[tokio::test]
async fn test_project_title_trimmed_and_validated() {
    let ctx = TestContext::new();
    let token = ctx.register_and_login("alice").await;

    let project = ctx.create_project(&token, "  Padded  ").await;
    assert_eq!(project["title"], "Padded");

    let (status, body) = ctx
        .post("/api/projects/", Some(&token), json!({ "title": "   " }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "title");
    assert_eq!(body["details"][0]["message"], "This field may not be blank.");

    let (status, body) = ctx
        .post("/api/projects/", Some(&token), json!({ "title": "x".repeat(101) }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "title");
}

#[tokio::test]
async fn test_duplicate_project_title() {
    let ctx = TestContext::new();
    let alice = ctx.register_and_login("alice").await;
    let bob = ctx.register_and_login("bob").await;

    ctx.create_project(&alice, "Shared").await;

    let (status, body) = ctx
        .post("/api/projects/", Some(&bob), json!({ "title": "Shared" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "title");
    assert_eq!(
        body["details"][0]["message"],
        "project with this title already exists."
    );
}

#[tokio::test]
async fn test_patch_through_other_username_is_not_found() {
    let ctx = TestContext::new();
    ctx.register("bob").await;
    let alice = ctx.register_and_login("alice").await;
    let project = ctx.create_project(&alice, "Guarded").await;
    let id = project["id"].as_i64().unwrap();

    // Credentials don't matter, the path username does
    let (status, _) = ctx
        .request(
            Method::PATCH,
            &format!("/api/projects/{}/bob/", id),
            Some(&alice),
            Some(json!({ "title": "Hijacked" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .request(Method::DELETE, &format!("/api/projects/{}/bob/", id), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, unchanged) = ctx.get(&format!("/api/projects/{}/", id), None).await;
    assert_eq!(unchanged["title"], "Guarded");
}

#[tokio::test]
async fn test_patch_by_owner_persists() {
    let ctx = TestContext::new();
    let alice = ctx.register_and_login("alice").await;
    let project = ctx.create_project(&alice, "Draft").await;
    let id = project["id"].as_i64().unwrap();

    let (status, body) = ctx
        .request(
            Method::PATCH,
            &format!("/api/projects/{}/alice/", id),
            Some(&alice),
            Some(json!({ "description": "  Now with details " })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Draft");
    assert_eq!(body["description"], "Now with details");

    let (status, body) = ctx
        .request(
            Method::PUT,
            &format!("/api/projects/{}/alice/", id),
            Some(&alice),
            Some(json!({ "title": "Final", "description": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Final");

    let (_, stored) = ctx.get(&format!("/api/projects/{}/", id), None).await;
    assert_eq!(stored["title"], "Final");
    assert_eq!(stored["description"], "");
    assert_eq!(stored["owner"]["username"], "alice");
}

#[tokio::test]
async fn test_delete_by_owner() {
    let ctx = TestContext::new();
    let alice = ctx.register_and_login("alice").await;
    let project = ctx.create_project(&alice, "Short-lived").await;
    let id = project["id"].as_i64().unwrap();

    let (status, body) = ctx
        .request(Method::DELETE, &format!("/api/projects/{}/alice/", id), None, None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, _) = ctx.get(&format!("/api/projects/{}/", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_project_ids() {
    let ctx = TestContext::new();
    ctx.register("alice").await;

    let (status, _) = ctx.get("/api/projects/999/", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.get("/api/projects/999/alice/", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.get("/api/projects/abc/", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_is_case_insensitive_and_paginated() {
    let ctx = TestContext::new();
    let token = ctx.register_and_login("alice").await;

    for i in 1..=7 {
        ctx.create_project(&token, &format!("foo project {}", i)).await;
    }
    ctx.create_project(&token, "FOOTBALL").await;
    ctx.create_project(&token, "Unrelated").await;

    let (status, page) = ctx.get("/api/projects/?search=Foo", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["count"], 8);
    assert_eq!(page["results"].as_array().unwrap().len(), 5);
    assert_eq!(page["next"], "/api/projects/?page=2&search=Foo");
    assert!(page["previous"].is_null());

    let (status, page) = ctx.get("/api/projects/?search=Foo&page=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["results"].as_array().unwrap().len(), 3);
    assert!(page["next"].is_null());
    assert_eq!(page["previous"], "/api/projects/?search=Foo");

    let (status, page) = ctx.get("/api/projects/?search=foo&page_size=20", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["results"].as_array().unwrap().len(), 8);
    assert!(page["results"]
        .as_array()
        .unwrap()
        .iter()
        .all(|p| p["title"].as_str().unwrap().to_lowercase().contains("foo")));
}

#[tokio::test]
async fn test_invalid_page() {
    let ctx = TestContext::new();

    let (status, _) = ctx.get("/api/projects/", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx.get("/api/projects/?page=2", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Invalid page.");

    let (status, _) = ctx.get("/api/projects/?page=last", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_filters_and_ordering() {
    let ctx = TestContext::new();
    let alice = ctx.register_and_login("alice").await;
    let bob = ctx.register_and_login("bob").await;

    ctx.create_project(&alice, "Beta").await;
    ctx.create_project(&alice, "Alpha").await;
    let bobs = ctx.create_project(&bob, "Gamma").await;
    let bob_id = bobs["owner"]["id"].as_i64().unwrap();

    let (_, page) = ctx
        .get(&format!("/api/projects/?owner={}", bob_id), None)
        .await;
    assert_eq!(page["count"], 1);
    assert_eq!(page["results"][0]["title"], "Gamma");

    let (_, page) = ctx.get("/api/projects/?title=Alpha", None).await;
    assert_eq!(page["count"], 1);

    let (_, page) = ctx.get("/api/projects/?ordering=title", None).await;
    let titles: Vec<&str> = page["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Alpha", "Beta", "Gamma"]);

    let (_, page) = ctx.get("/api/projects/?ordering=-title", None).await;
    assert_eq!(page["results"][0]["title"], "Gamma");

    let (status, body) = ctx.get("/api/projects/?owner=abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "owner");
}

#[tokio::test]
async fn test_project_create_after_owner_deleted() {
    let ctx = TestContext::new();
    let alice = ctx.register_and_login("alice").await;

    let user = ctx
        .store
        .find_user_by_username("alice")
        .await
        .unwrap()
        .unwrap();
    ctx.store.delete_user(user.id).await.unwrap();

    let (status, _) = ctx
        .post("/api/projects/", Some(&alice), json!({ "title": "Late" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_and_docs() {
    let ctx = TestContext::new();

    let (status, health) = ctx.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["backend"], "memory");

    let (status, doc) = ctx.get("/api/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/api/projects/"].is_object());

    let (status, page) = ctx.get("/swagger/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.as_str().unwrap().contains("swagger-ui"));

    let (status, script) = ctx.get("/swagger/swagger-initializer.js", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(script.as_str().unwrap().contains("/api/openapi.json"));
}
