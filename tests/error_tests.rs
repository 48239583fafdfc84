// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Store failures and malformed requests surface as JSON errors.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use daily_workout::error::AppError;
use serde_json::json;
use tower::ServiceExt;

mod common;
use common::{bearer, create_offline_app, create_test_app, get, json_body, post_json, saturday};

#[test]
fn test_error_display() {
    let err = AppError::Database("connection reset".to_string());
    assert_eq!(err.to_string(), "Database error: connection reset");

    let err = AppError::BadRequest("Unknown weekday: Funday".to_string());
    assert_eq!(err.to_string(), "Invalid request: Unknown weekday: Funday");
}

#[tokio::test]
async fn test_database_error_body_is_human_readable() {
    let response = AppError::Database("grpc status 14".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = json_body(response).await;
    assert_eq!(body["error"], "database_error");
    let details = body["details"].as_str().unwrap();
    assert!(!details.contains("grpc"));
}

#[tokio::test]
async fn test_offline_store_fails_request_not_process() {
    let (app, state) = create_offline_app();
    let auth = bearer(&state, "alice");

    for uri in ["/api/workout/today", "/api/sessions", "/api/progress/weekly", "/api/stats"] {
        let response = app.clone().oneshot(get(uri, &auth)).await.unwrap();
        assert_eq!(
            response.status(),
            StatusCode::INTERNAL_SERVER_ERROR,
            "{} should fail with the store offline",
            uri
        );
        let body = json_body(response).await;
        assert_eq!(body["error"], "database_error");
    }

    // The catalog needs no store.
    let response = app.oneshot(get("/api/plan", &auth)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_offline_store_rejects_completion() {
    let (app, state) = create_offline_app();

    let response = app
        .oneshot(post_json(
            "/api/workout/complete",
            &bearer(&state, "alice"),
            json!({"duration_minutes": 10}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_malformed_completion_body() {
    let (app, state) = create_test_app(saturday());

    let response = app
        .oneshot(post_json(
            "/api/workout/exercises",
            &bearer(&state, "alice"),
            json!({"exercise_name": "Plank", "sets_completed": -1, "reps": 10}),
        ))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_unknown_exercise_history_is_not_found() {
    let (app, state) = create_test_app(saturday());

    let response = app
        .oneshot(get("/api/exercises/Deadlift/recent", &bearer(&state, "alice")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["error"], "not_found");
}
