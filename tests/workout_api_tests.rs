// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! End-to-end workout flow through the HTTP API on the in-memory store.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use daily_workout::db::{MemoryDb, Store};
use daily_workout::routes::create_router;
use serde_json::json;
use tower::ServiceExt;

mod common;
use common::{bearer, create_test_app, date, get, json_body, post_json, saturday, test_state};

#[tokio::test]
async fn test_plan_lists_every_weekday() {
    let (app, state) = create_test_app(saturday());

    let response = app
        .oneshot(get("/api/plan", &bearer(&state, "alice")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let days = body.as_array().unwrap();
    assert_eq!(days.len(), 7);
    assert_eq!(days[0]["day"], "Monday");
    assert_eq!(days[0]["exercises"].as_array().unwrap().len(), 6);
    assert_eq!(days[6]["day"], "Sunday");
    assert_eq!(days[6]["is_rest_day"], true);
}

#[tokio::test]
async fn test_plan_day_lookup() {
    let (app, state) = create_test_app(saturday());
    let auth = bearer(&state, "alice");

    let response = app
        .clone()
        .oneshot(get("/api/plan/tuesday", &auth))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["day"], "Tuesday");
    assert_eq!(body["exercises"][0]["name"], "Flat Bench Press");

    let response = app.oneshot(get("/api/plan/someday", &auth)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_exercise_lookup_by_name() {
    let (app, state) = create_test_app(saturday());
    let auth = bearer(&state, "alice");

    let response = app
        .clone()
        .oneshot(get("/api/exercises/Farmer%20Walk%20(2%20Rounds)", &auth))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["sets"], 2);
    assert_eq!(body["reps"], 20);

    let response = app
        .oneshot(get("/api/exercises/Deadlift", &auth))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_today_creates_session_and_stats_once() {
    let (app, state) = create_test_app(saturday());
    let auth = bearer(&state, "alice");

    let first = json_body(
        app.clone()
            .oneshot(get("/api/workout/today", &auth))
            .await
            .unwrap(),
    )
    .await;
    let second = json_body(
        app.clone()
            .oneshot(get("/api/workout/today", &auth))
            .await
            .unwrap(),
    )
    .await;

    assert_eq!(first["day"], "Saturday");
    assert_eq!(first["is_rest_day"], false);
    assert_eq!(first["exercises"].as_array().unwrap().len(), 8);
    assert_eq!(first["session"]["total_exercises"], 8);
    assert_eq!(first["session"]["id"], second["session"]["id"]);

    let sessions = json_body(app.oneshot(get("/api/sessions", &auth)).await.unwrap()).await;
    assert_eq!(sessions.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_exercise_completion_flow() {
    let (app, state) = create_test_app(saturday());
    let auth = bearer(&state, "alice");

    // Zero sets: ignored
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/workout/exercises",
            &auth,
            json!({"exercise_name": "Plank", "sets_completed": 0, "reps": 60}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["recorded"], false);
    assert_eq!(body["session"]["completed_exercises"], 0);

    // Same exercise twice: one record
    for sets in [2, 3] {
        let body = json_body(
            app.clone()
                .oneshot(post_json(
                    "/api/workout/exercises",
                    &auth,
                    json!({
                        "exercise_name": "Plank",
                        "sets_completed": sets,
                        "reps": 60,
                        "notes": "felt good"
                    }),
                ))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(body["recorded"], true);
        assert_eq!(body["session"]["completed_exercises"], 1);
    }

    let today = json_body(
        app.clone()
            .oneshot(get("/api/workout/today", &auth))
            .await
            .unwrap(),
    )
    .await;
    let progress = today["progress"].as_array().unwrap();
    assert_eq!(progress.len(), 1);
    assert_eq!(progress[0]["sets_completed"], 3);
    assert_eq!(progress[0]["notes"], "felt good");

    let recent = json_body(
        app.clone()
            .oneshot(get("/api/exercises/Plank/recent", &auth))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(recent.as_array().unwrap().len(), 1);

    // Recording exercises never touches stats
    let stats = json_body(app.oneshot(get("/api/stats", &auth)).await.unwrap()).await;
    assert_eq!(stats["total_workouts"], 0);
}

#[tokio::test]
async fn test_complete_workout_refreshes_stats() {
    let (app, state) = create_test_app(saturday());
    let auth = bearer(&state, "alice");

    let response = app
        .clone()
        .oneshot(post_json("/api/workout/start", &auth, json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let started = json_body(response).await;
    assert!(started["started_at"].is_string());

    let response = app
        .clone()
        .oneshot(post_json("/api/workout/complete", &auth, json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;

    assert_eq!(body["session"]["is_completed"], true);
    assert_eq!(body["session"]["completed_exercises"], 8);
    assert_eq!(body["session"]["duration_minutes"], 1);
    assert_eq!(body["stats"]["total_workouts"], 1);
    assert_eq!(body["stats"]["current_streak"], 1);
    assert_eq!(body["stats"]["last_workout_date"], "2026-10-17");

    let streak = json_body(
        app.clone()
            .oneshot(get("/api/progress/streak", &auth))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(streak["current_streak"], 1);
    assert_eq!(streak["is_on_streak"], true);

    let weekly = json_body(
        app.clone()
            .oneshot(get("/api/progress/weekly", &auth))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(weekly["week_start"], "2026-10-12");
    assert_eq!(weekly["progress"]["Saturday"], true);
    assert_eq!(weekly["progress"]["Monday"], false);
    assert!(weekly["progress"].get("Sunday").is_none());

    let monthly = json_body(
        app.clone()
            .oneshot(get("/api/progress/monthly", &auth))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(monthly["total_workouts"], 1);
    assert_eq!(monthly["completion_rate"], 1.0);

    let frequency = json_body(
        app.oneshot(get("/api/progress/frequency", &auth))
            .await
            .unwrap(),
    )
    .await;
    let frequency = frequency.as_array().unwrap();
    assert_eq!(frequency.len(), 6);
    assert_eq!(frequency[5]["day"], "Saturday");
    assert_eq!(frequency[5]["frequency"], 1);
}

#[tokio::test]
async fn test_complete_workout_without_body() {
    let (app, state) = create_test_app(saturday());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/workout/complete")
                .header(header::AUTHORIZATION, bearer(&state, "alice"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["session"]["is_completed"], true);
    assert_eq!(body["session"]["duration_minutes"], 1);
    assert_eq!(body["stats"]["total_workouts"], 1);
}

#[tokio::test]
async fn test_streak_across_days_with_pending_today() {
    let store = Store::Memory(MemoryDb::new());

    // Complete Mon 12 through Fri 16, one app per day.
    for day in 12..=16 {
        let state = test_state(store.clone(), date(2026, 10, day));
        let app = create_router(state.clone());
        let response = app
            .oneshot(post_json(
                "/api/workout/complete",
                &bearer(&state, "alice"),
                json!({"duration_minutes": 30}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    // Saturday: session opened but not completed.
    let state = test_state(store, saturday());
    let app = create_router(state.clone());
    let auth = bearer(&state, "alice");
    app.clone()
        .oneshot(get("/api/workout/today", &auth))
        .await
        .unwrap();

    let streak = json_body(
        app.clone()
            .oneshot(get("/api/progress/streak", &auth))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(streak["current_streak"], 5);
    assert_eq!(streak["longest_streak"], 5);

    let monthly = json_body(
        app.oneshot(get("/api/progress/monthly", &auth))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(monthly["total_workouts"], 5);
    assert_eq!(monthly["total_days"], 6);
    assert_eq!(monthly["total_workout_time"], 150);
    assert_eq!(monthly["average_workout_time"], 30);
}

#[tokio::test]
async fn test_users_are_isolated() {
    let (app, state) = create_test_app(saturday());

    app.clone()
        .oneshot(post_json(
            "/api/workout/complete",
            &bearer(&state, "alice"),
            json!({"duration_minutes": 20}),
        ))
        .await
        .unwrap();

    let bob = bearer(&state, "bob");
    let sessions = json_body(app.clone().oneshot(get("/api/sessions", &bob)).await.unwrap()).await;
    assert!(sessions.as_array().unwrap().is_empty());

    let stats = json_body(app.oneshot(get("/api/stats", &bob)).await.unwrap()).await;
    assert_eq!(stats["total_workouts"], 0);
}
