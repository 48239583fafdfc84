// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{
    DayFrequency, DayStatus, Exercise, ExerciseProgress, MonthlyStats, StreakInfo, UserStats,
    WorkoutSession,
};
use crate::services::{
    ExerciseCompletion, ExerciseOutcome, ProgressRefresher, TodaysWorkout, WorkoutCompletion,
};
use crate::time_utils::{parse_weekday, weekday_name};
use crate::AppState;
use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{NaiveDate, Weekday};
use futures_util::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/plan", get(get_plan))
        .route("/api/plan/{day}", get(get_plan_day))
        .route("/api/exercises/{name}", get(get_exercise))
        .route("/api/exercises/{name}/recent", get(get_recent_progress))
        .route("/api/workout/today", get(get_today))
        .route("/api/workout/start", post(start_workout))
        .route("/api/workout/exercises", post(complete_exercise))
        .route("/api/workout/complete", post(complete_workout))
        .route("/api/sessions", get(get_sessions))
        .route("/api/progress/weekly", get(get_weekly_progress))
        .route("/api/progress/monthly", get(get_monthly_stats))
        .route("/api/progress/frequency", get(get_frequency))
        .route("/api/progress/streak", get(get_streak))
        .route("/api/progress/stream", get(progress_stream))
        .route("/api/stats", get(get_stats))
}

// ─── Plan Catalog ────────────────────────────────────────────

/// One weekday of the plan.
#[derive(Serialize)]
pub struct PlanDayResponse {
    pub day: String,
    pub is_rest_day: bool,
    pub exercises: Vec<Exercise>,
}

fn plan_day(state: &AppState, day: Weekday) -> PlanDayResponse {
    let catalog = state.tracker.catalog();
    PlanDayResponse {
        day: weekday_name(day).to_string(),
        is_rest_day: catalog.is_rest_day(day),
        exercises: catalog.exercises_for(day).to_vec(),
    }
}

/// Full weekly plan, Monday first.
async fn get_plan(State(state): State<Arc<AppState>>) -> Json<Vec<PlanDayResponse>> {
    let days = state
        .tracker
        .catalog()
        .days()
        .map(|(day, _)| plan_day(&state, day))
        .collect();
    Json(days)
}

async fn get_plan_day(
    State(state): State<Arc<AppState>>,
    Path(day): Path<String>,
) -> Result<Json<PlanDayResponse>> {
    let weekday = parse_weekday(&day)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown weekday: {}", day)))?;
    Ok(Json(plan_day(&state, weekday)))
}

/// First plan entry with this name, searching Monday through Sunday.
async fn get_exercise(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Exercise>> {
    state
        .tracker
        .catalog()
        .find_exercise(&name)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Exercise {} not found", name)))
}

async fn get_recent_progress(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(name): Path<String>,
) -> Result<Json<Vec<ExerciseProgress>>> {
    if state.tracker.catalog().find_exercise(&name).is_none() {
        return Err(AppError::NotFound(format!("Exercise {} not found", name)));
    }
    let records = state.tracker.recent_progress(&user.user_id, &name).await?;
    Ok(Json(records))
}

// ─── Today's Workout ─────────────────────────────────────────

async fn get_today(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<TodaysWorkout>> {
    Ok(Json(state.tracker.todays_workout(&user.user_id).await?))
}

async fn start_workout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<WorkoutSession>> {
    Ok(Json(state.tracker.start_workout(&user.user_id).await?))
}

/// Record one exercise. Invalid input is reported as `recorded: false`.
async fn complete_exercise(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<ExerciseCompletion>,
) -> Result<Json<ExerciseOutcome>> {
    Ok(Json(
        state
            .tracker
            .complete_exercise(&user.user_id, &input)
            .await?,
    ))
}

#[derive(Debug, Deserialize)]
struct CompleteWorkoutRequest {
    /// Minutes spent; derived from the start stamp when omitted
    #[serde(default)]
    duration_minutes: Option<u64>,
}

/// Complete today's workout. The body is optional.
async fn complete_workout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    body: Option<Json<CompleteWorkoutRequest>>,
) -> Result<Json<WorkoutCompletion>> {
    let duration = body.and_then(|Json(req)| req.duration_minutes);
    Ok(Json(
        state
            .tracker
            .complete_workout(&user.user_id, duration)
            .await?,
    ))
}

// ─── History & Progress ──────────────────────────────────────

/// All sessions, newest first.
async fn get_sessions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<WorkoutSession>>> {
    Ok(Json(state.tracker.all_sessions(&user.user_id).await?))
}

/// Weekly progress response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WeeklyProgressResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub week_start: NaiveDate,
    /// Weekday name -> completed
    pub progress: HashMap<String, bool>,
    #[cfg_attr(feature = "binding-generation", ts(skip))]
    pub days: Vec<DayStatus>,
    pub completed_days: usize,
    pub completion_rate: f32,
}

async fn get_weekly_progress(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<WeeklyProgressResponse>> {
    let weekly = state.tracker.weekly_progress(&user.user_id).await?;

    Ok(Json(WeeklyProgressResponse {
        week_start: weekly.week_start,
        progress: weekly.to_map(),
        completed_days: weekly.completed_days(),
        completion_rate: weekly.completion_rate(),
        days: weekly.days,
    }))
}

async fn get_monthly_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<MonthlyStats>> {
    Ok(Json(state.tracker.monthly_stats(&user.user_id).await?))
}

async fn get_frequency(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<DayFrequency>>> {
    Ok(Json(state.tracker.workout_frequency(&user.user_id).await?))
}

async fn get_streak(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<StreakInfo>> {
    Ok(Json(state.tracker.streak_info(&user.user_id).await?))
}

/// Stored aggregate; defaults when the user has none yet.
async fn get_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserStats>> {
    Ok(Json(state.tracker.user_stats(&user.user_id).await?))
}

/// Server-sent progress snapshots.
///
/// The refresh task lives inside the stream state and is aborted when the
/// client disconnects and axum drops the stream.
async fn progress_stream(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, axum::Error>>>> {
    tracing::debug!(user_id = %user.user_id, "Progress stream opened");

    let refresher = ProgressRefresher::spawn(
        state.tracker.clone(),
        user.user_id,
        state.config.refresh_interval,
    )
    .await?;

    let events = stream::unfold(refresher, |mut refresher| async move {
        let snapshot = refresher.next().await?;
        let event = Event::default().event("progress").json_data(&snapshot);
        Some((event, refresher))
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
