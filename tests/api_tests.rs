mod common;

use axum::http::StatusCode;
use common::{PNG, spawn_app};
use serde_json::json;

#[tokio::test]
async fn test_register_login_and_me() {
    let app = spawn_app().await;

    let reply = app
        .post(
            "/api/users/",
            None,
            json!({
                "email": "cook@example.com",
                "username": "cook",
                "first_name": "Ann",
                "last_name": "Cook",
                "password": "s3cret-pass",
            }),
        )
        .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    let body = reply.json();
    assert_eq!(body["username"], "cook");
    assert!(body.get("password").is_none());

    let reply = app
        .post(
            "/api/auth/token/login/",
            None,
            json!({"email": "cook@example.com", "password": "s3cret-pass"}),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    let token = reply.json()["auth_token"].as_str().unwrap().to_string();

    // A second login hands out the same token.
    let again = app
        .post(
            "/api/auth/token/login/",
            None,
            json!({"email": "cook@example.com", "password": "s3cret-pass"}),
        )
        .await;
    assert_eq!(again.json()["auth_token"], token.as_str());

    let reply = app.get("/api/users/me/", Some(&token)).await;
    assert_eq!(reply.status, StatusCode::OK);
    let me = reply.json();
    assert_eq!(me["email"], "cook@example.com");
    assert_eq!(me["is_subscribed"], false);
    assert!(me["avatar"].is_null());
}

#[tokio::test]
async fn test_register_reports_field_errors() {
    let app = spawn_app().await;
    app.sign_up("taken").await;

    let reply = app
        .post(
            "/api/users/",
            None,
            json!({
                "email": "taken@example.com",
                "username": "taken",
                "first_name": "A",
                "last_name": "B",
                "password": "pw",
            }),
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    let body = reply.json();
    assert_eq!(body["email"][0], "A user with that email already exists.");
    assert_eq!(body["username"][0], "A user with that username already exists.");

    let reply = app.post("/api/users/", None, json!({})).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    let body = reply.json();
    for field in ["email", "username", "first_name", "last_name", "password"] {
        assert!(body.get(field).is_some(), "missing error for {field}");
    }
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let app = spawn_app().await;
    app.sign_up("alice").await;

    let reply = app
        .post(
            "/api/auth/token/login/",
            None,
            json!({"email": "alice@example.com", "password": "nope"}),
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        reply.json()["non_field_errors"][0],
        "Unable to log in with provided credentials."
    );
}

#[tokio::test]
async fn test_token_header_handling() {
    let app = spawn_app().await;
    let (_, token) = app.sign_up("alice").await;

    let reply = app.get("/api/users/me/", Some("definitely-not-a-token")).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.json()["detail"], "Invalid token.");

    // Placeholder values count as anonymous, so public reads still work.
    let reply = app.get("/api/recipes/", Some("null")).await;
    assert_eq!(reply.status, StatusCode::OK);

    let reply = app.get("/api/users/me/", None).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    let reply = app
        .request("POST", "/api/auth/token/logout/", Some(&token), None)
        .await;
    assert_eq!(reply.status, StatusCode::NO_CONTENT);

    let reply = app.get("/api/users/me/", Some(&token)).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_set_password() {
    let app = spawn_app().await;
    let (_, token) = app.sign_up("alice").await;

    let reply = app
        .post("/api/users/set_password/", Some(&token), json!({}))
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        reply.json()["errors"],
        "Both current_password and new_password are required."
    );

    let reply = app
        .post(
            "/api/users/set_password/",
            Some(&token),
            json!({"current_password": "wrong", "new_password": "fresh-pass"}),
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["errors"], "Current password is incorrect.");

    let reply = app
        .post(
            "/api/users/set_password/",
            Some(&token),
            json!({"current_password": "s3cret-pass", "new_password": "fresh-pass"}),
        )
        .await;
    assert_eq!(reply.status, StatusCode::NO_CONTENT);

    let reply = app
        .post(
            "/api/auth/token/login/",
            None,
            json!({"email": "alice@example.com", "password": "fresh-pass"}),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn test_avatar_upload_and_removal() {
    let app = spawn_app().await;
    let (_, token) = app.sign_up("alice").await;

    let reply = app
        .request("PUT", "/api/users/me/avatar/", Some(&token), Some(json!({})))
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.json().get("avatar").is_some());

    let reply = app
        .request(
            "PUT",
            "/api/users/me/avatar/",
            Some(&token),
            Some(json!({"avatar": PNG})),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    let avatar = reply.json()["avatar"].as_str().unwrap().to_string();
    assert!(avatar.ends_with(".png"));
    assert!(avatar.contains("/media/avatars/"));

    let me = app.get("/api/users/me/", Some(&token)).await.json();
    assert_eq!(me["avatar"], avatar.as_str());

    let reply = app.delete("/api/users/me/avatar/", Some(&token)).await;
    assert_eq!(reply.status, StatusCode::NO_CONTENT);
    let me = app.get("/api/users/me/", Some(&token)).await.json();
    assert!(me["avatar"].is_null());

    // Nothing left to remove.
    let reply = app.delete("/api/users/me/avatar/", Some(&token)).await;
    assert_eq!(reply.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_user_lookup_and_paging() {
    let app = spawn_app().await;
    let (alice, _) = app.sign_up("alice").await;
    for name in ["bob", "carol", "dave"] {
        app.sign_up(name).await;
    }

    let reply = app.get(&format!("/api/users/{alice}/"), None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["username"], "alice");

    let reply = app.get("/api/users/9999/", None).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);

    let reply = app.get("/api/users/abc/", None).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let reply = app.get("/api/users/?page=2&limit=3", None).await;
    assert_eq!(reply.status, StatusCode::OK);
    let page = reply.json();
    assert_eq!(page["count"], 4);
    assert_eq!(page["results"].as_array().unwrap().len(), 1);
    assert!(page["next"].is_null());
    let previous = page["previous"].as_str().unwrap();
    assert!(previous.contains("limit=3"));
    assert!(!previous.contains("page="));

    let reply = app.get("/api/users/?page=5", None).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.json()["detail"], "Invalid page.");
}

#[tokio::test]
async fn test_ingredient_search() {
    let app = spawn_app().await;
    let ids = app
        .seed_ingredients(&[("Salt", "g"), ("Sugar", "g"), ("Egg", "pcs")])
        .await;

    let reply = app.get("/api/ingredients/?name=S", None).await;
    assert_eq!(reply.status, StatusCode::OK);
    let names: Vec<String> = reply
        .json()
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["Salt", "Sugar"]);

    let reply = app.get("/api/ingredients/", None).await;
    assert_eq!(reply.json().as_array().unwrap().len(), 3);

    let reply = app.get(&format!("/api/ingredients/{}/", ids[2]), None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        reply.json(),
        json!({"id": ids[2], "name": "Egg", "measurement_unit": "pcs"})
    );

    let reply = app.get("/api/ingredients/424242/", None).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);

    let reply = app.get("/api/ingredients/salt/", None).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_metrics_disabled_without_recorder() {
    let app = spawn_app().await;

    let reply = app.get("/api/metrics", None).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_far_out_pages_are_not_found() {
    let app = spawn_app().await;
    let (_, token) = app.sign_up("alice").await;

    for uri in [
        "/api/recipes/?page=9223372036854775807&limit=2",
        "/api/users/?page=9223372036854775807&limit=2",
        "/api/users/subscriptions/?page=18446744073709551615",
    ] {
        let reply = app.get(uri, Some(&token)).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(reply.json()["detail"], "Invalid page.");
    }
}
