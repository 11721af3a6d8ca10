// SPDX-License-Identifier: MIT

//! API input validation tests.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;
use uuid::Uuid;

mod common;

fn authed_request(
    method: &str,
    uri: &str,
    token: &str,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));

    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[tokio::test]
async fn test_unknown_sort_mode_rejected() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(Uuid::new_v4(), &state.config.jwt_secret);

    let response = app
        .oneshot(authed_request(
            "GET",
            "/api/games?sort=alphabetical",
            &token,
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_challenge_filters_rejected() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(Uuid::new_v4(), &state.config.jwt_secret);

    for uri in [
        "/api/challenges?status=Finished",
        "/api/challenges?difficulty=Nightmare",
    ] {
        let response = app
            .clone()
            .oneshot(authed_request("GET", uri, &token, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn test_completion_pct_out_of_range_rejected() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(Uuid::new_v4(), &state.config.jwt_secret);

    let payload = serde_json::json!({
        "game_id": 1,
        "name": "All achievements",
        "completion_pct": 150,
        "status": "In Progress"
    });

    let response = app
        .oneshot(authed_request("POST", "/api/challenges", &token, Some(payload)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_challenge_date_rejected() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(Uuid::new_v4(), &state.config.jwt_secret);

    let payload = serde_json::json!({
        "game_id": 1,
        "name": "All achievements",
        "completion_pct": 0,
        "started_at": "2024-03-15T14:00:00Z"
    });

    let response = app
        .oneshot(authed_request("POST", "/api/challenges", &token, Some(payload)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_challenge_status_rejected() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(Uuid::new_v4(), &state.config.jwt_secret);

    let payload = serde_json::json!({
        "game_id": 1,
        "name": "All achievements",
        "completion_pct": 0,
        "status": "Done"
    });

    let response = app
        .oneshot(authed_request("POST", "/api/challenges", &token, Some(payload)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_empty_game_name_rejected() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(Uuid::new_v4(), &state.config.jwt_secret);

    let payload = serde_json::json!({ "name": "" });

    let response = app
        .oneshot(authed_request("POST", "/api/games", &token, Some(payload)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_playtime_rejected() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(Uuid::new_v4(), &state.config.jwt_secret);

    let payload = serde_json::json!({
        "name": "Celeste",
        "playtime": "ninety hours"
    });

    let response = app
        .oneshot(authed_request("POST", "/api/games", &token, Some(payload)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_personal_rating_out_of_range_rejected() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(Uuid::new_v4(), &state.config.jwt_secret);

    let payload = serde_json::json!({
        "status": "Playing",
        "personal_rating": 11
    });

    let response = app
        .oneshot(authed_request("PUT", "/api/games/1", &token, Some(payload)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_requires_valid_email() {
    let (app, _state) = common::create_test_app();

    let payload = serde_json::json!({
        "email": "not-an-email",
        "password": "hunter22",
        "name": "Ana"
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_requires_minimum_password_length() {
    let (app, _state) = common::create_test_app();

    let payload = serde_json::json!({
        "email": "ana@example.com",
        "password": "abc",
        "name": "Ana"
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unsupported_oauth_provider_rejected() {
    let (app, _state) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/auth/oauth/myspace")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
