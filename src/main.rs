// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily-Workout API Server
//!
//! Serves the weekly workout plan and records daily sessions, exercise
//! progress and streaks for authenticated users.

use daily_workout::{
    config::Config,
    db::Store,
    services::{PlanCatalog, ProgressCalculator, WorkoutTracker},
    time_utils::{weekday_name, Clock},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Structured JSON logging
    init_logging()?;

    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        backend = config.store_backend.name(),
        rest_day = weekday_name(config.rest_day),
        streak_anchor = ?config.streak_anchor,
        "Starting Daily-Workout API"
    );

    let store = Store::connect(&config).await?;

    let catalog = PlanCatalog::builtin()?;
    let calculator =
        ProgressCalculator::for_plan(&catalog, config.rest_day, config.streak_anchor)?;

    let tracker = WorkoutTracker::new(
        store,
        catalog,
        calculator,
        Clock::System,
        config.weekly_goal,
    );

    let state = Arc::new(AppState {
        config: config.clone(),
        tracker,
    });

    let app = daily_workout::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("daily_workout=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
