// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Daily-Workout: track a weekly gym plan, sessions and streaks
//!
//! This crate provides the backend API for recording daily workout
//! sessions against a fixed weekly plan and deriving streak and progress
//! statistics from the session history.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Store;
use services::WorkoutTracker;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub tracker: WorkoutTracker<Store>,
}
