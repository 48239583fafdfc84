// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, Response};
use chrono::NaiveDate;
use daily_workout::config::Config;
use daily_workout::db::{FirestoreDb, MemoryDb, Store};
use daily_workout::middleware::auth::create_jwt;
use daily_workout::routes::create_router;
use daily_workout::services::{PlanCatalog, ProgressCalculator, WorkoutTracker};
use daily_workout::time_utils::Clock;
use daily_workout::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Saturday, a scheduled day with eight exercises.
#[allow(dead_code)]
pub fn saturday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
}

#[allow(dead_code)]
pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Build app state over `store` with the clock pinned to `today`.
#[allow(dead_code)]
pub fn test_state(store: Store, today: NaiveDate) -> Arc<AppState> {
    let config = Config::test_default();
    let catalog = PlanCatalog::builtin().expect("builtin plan");
    let calculator = ProgressCalculator::for_plan(&catalog, config.rest_day, config.streak_anchor)
        .expect("rest day matches plan");
    let tracker = WorkoutTracker::new(
        store,
        catalog,
        calculator,
        Clock::fixed_on(today),
        config.weekly_goal,
    );

    Arc::new(AppState { config, tracker })
}

/// Create a test app on a fresh in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app(today: NaiveDate) -> (axum::Router, Arc<AppState>) {
    let state = test_state(Store::Memory(MemoryDb::new()), today);
    (create_router(state.clone()), state)
}

/// Create a test app whose store is offline (every call fails).
#[allow(dead_code)]
pub fn create_offline_app() -> (axum::Router, Arc<AppState>) {
    let state = test_state(Store::Firestore(FirestoreDb::new_mock()), saturday());
    (create_router(state.clone()), state)
}

/// Bearer token for `user_id` signed with the test key.
#[allow(dead_code)]
pub fn bearer(state: &AppState, user_id: &str) -> String {
    let token = create_jwt(user_id, &state.config.jwt_signing_key, 1).unwrap();
    format!("Bearer {}", token)
}

#[allow(dead_code)]
pub fn get(uri: &str, auth: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, auth)
        .body(Body::empty())
        .unwrap()
}

#[allow(dead_code)]
pub fn post_json(uri: &str, auth: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, auth)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
