mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn registered_token_resolves_to_same_user() {
    let t = TestApp::spawn("auth-roundtrip").await;
    let (status, body) = t
        .post(
            "/auth/register",
            None,
            json!({"email": "  Reader@Example.com ", "username": "reader_1", "password": "member-password"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "reader@example.com");
    assert_eq!(body["user"]["role"], "MEMBER");
    let token = body["accessToken"].as_str().unwrap().to_string();

    let (status, me) = t.get("/auth/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], body["user"]["id"]);
    assert_eq!(me["username"], "reader_1");
    assert_eq!(me["role"], "MEMBER");
}

#[tokio::test]
async fn duplicate_email_and_username_conflict() {
    let t = TestApp::spawn("auth-dupes").await;
    t.register("a@example.com", "alpha").await;

    let (status, body) = t
        .post(
            "/auth/register",
            None,
            json!({"email": "A@example.com", "username": "other", "password": "member-password"}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
    assert_eq!(body["error"]["message"], "Email already registered");

    let (status, body) = t
        .post(
            "/auth/register",
            None,
            json!({"email": "b@example.com", "username": "alpha", "password": "member-password"}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["message"], "Username already taken");
}

#[tokio::test]
async fn registration_input_is_validated() {
    let t = TestApp::spawn("auth-validation").await;
    for payload in [
        json!({"email": "not-an-email", "username": "valid_name", "password": "member-password"}),
        json!({"email": "c@example.com", "username": "no spaces", "password": "member-password"}),
        json!({"email": "c@example.com", "username": "valid_name", "password": "short"}),
    ] {
        let (status, body) = t.post("/auth/register", None, payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    let (status, _) = t
        .post("/auth/login", None, json!({"email": "c@example.com", "password": "short"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_failures_share_one_message() {
    let t = TestApp::spawn("auth-login").await;
    t.register("d@example.com", "delta").await;

    let (status, wrong_pw) = t
        .post("/auth/login", None, json!({"email": "d@example.com", "password": "not-the-password"}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, unknown) = t
        .post("/auth/login", None, json!({"email": "nobody@example.com", "password": "member-password"}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_pw["error"]["message"], "Invalid credentials");
    assert_eq!(wrong_pw, unknown);

    let (status, body) = t
        .post("/auth/login", None, json!({"email": "D@example.com", "password": "member-password"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "delta");
}

#[tokio::test]
async fn password_change_invalidates_earlier_tokens() {
    let t = TestApp::spawn("auth-stamp").await;
    let old_token = t.register("e@example.com", "echo").await;

    let (status, _) = t
        .post(
            "/auth/change-password",
            Some(&old_token),
            json!({"currentPassword": "wrong-password", "newPassword": "brand-new-pass"}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = t
        .post(
            "/auth/change-password",
            Some(&old_token),
            json!({"currentPassword": "member-password", "newPassword": "brand-new-pass"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let new_token = body["accessToken"].as_str().unwrap().to_string();

    let (status, body) = t.get("/auth/me", Some(&old_token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], "Token has been invalidated");

    let (status, _) = t.get("/auth/me", Some(&new_token)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = t
        .post("/auth/login", None, json!({"email": "e@example.com", "password": "brand-new-pass"}))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn missing_or_garbage_token_is_unauthorized() {
    let t = TestApp::spawn("auth-missing").await;
    let (status, body) = t.get("/auth/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let (status, _) = t.get("/auth/me", Some("not.a.jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn privileged_routes_reject_members_and_anonymous() {
    let t = TestApp::spawn("auth-guard").await;
    let member = t.register("f@example.com", "foxtrot").await;
    let owner = t.owner_token().await;
    let genre = json!({"name": "Action", "slug": "action"});

    let (status, _) = t.post("/genres", None, genre.clone()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, body) = t.post("/genres", Some(&member), genre.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");
    let (status, _) = t.post("/genres", Some(&owner), genre).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = t.get("/users", Some(&member)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = t.get("/users?page=1&limit=1", Some(&owner)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["limit"], 1);
    assert_eq!(body["users"].as_array().unwrap().len(), 1);
    assert!(body["users"][0].get("passwordHash").is_none());
}

#[tokio::test]
async fn owner_promotes_member_and_stamp_rotates() {
    let t = TestApp::spawn("auth-role").await;
    let member = t.register("g@example.com", "golf").await;
    let owner = t.owner_token().await;
    let (_, me) = t.get("/auth/me", Some(&member)).await;
    let member_id = me["id"].as_str().unwrap().to_string();
    let (_, owner_me) = t.get("/auth/me", Some(&owner)).await;
    let owner_id = owner_me["id"].as_str().unwrap().to_string();

    let uri = format!("/users/{member_id}/role");
    let (status, _) = t.put(&uri, Some(&member), json!({"role": "ADMIN"})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = t.put(&uri, Some(&owner), json!({"role": "OWNER"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = t
        .put(&format!("/users/{owner_id}/role"), Some(&owner), json!({"role": "MEMBER"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = t.put(&uri, Some(&owner), json!({"role": "ADMIN"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "ADMIN");

    let (status, _) = t.get("/auth/me", Some(&member)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, login) = t
        .post("/auth/login", None, json!({"email": "g@example.com", "password": "member-password"}))
        .await;
    let admin = login["accessToken"].as_str().unwrap();
    let (status, _) = t
        .post("/tags", Some(admin), json!({"name": "Isekai", "slug": "isekai"}))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = t
        .put("/users/missing-id/role", Some(&owner), json!({"role": "ADMIN"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_bodies_use_error_envelope() {
    let t = TestApp::spawn("auth-malformed").await;
    let (status, body) = t
        .post(
            "/auth/register",
            None,
            json!({"email": "h@example.com", "password": "member-password"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["message"].as_str().unwrap().contains("username"));

    let (status, body) = t
        .post("/auth/login", None, json!({"email": 42, "password": "member-password"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let owner = t.owner_token().await;
    let (status, body) = t.get("/users?page=first", Some(&owner)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}
