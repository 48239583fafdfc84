// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod catalog;
pub mod progress;
pub mod refresh;
pub mod workout;

pub use catalog::{CatalogError, PlanCatalog};
pub use progress::{ProgressCalculator, SessionHistory, StreakAnchor};
pub use refresh::{ProgressRefresher, ProgressSnapshot};
pub use workout::{
    ExerciseCompletion, ExerciseOutcome, TodaysWorkout, WorkoutCompletion, WorkoutTracker,
};
