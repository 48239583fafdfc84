// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod exercise;
pub mod session;
pub mod stats;

pub use exercise::{Exercise, Prescription, WorkoutPlan};
pub use session::{ExerciseProgress, WorkoutSession};
pub use stats::{DayFrequency, DayStatus, MonthlyStats, StreakInfo, UserStats, WeeklyProgress};
