// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Workout session and per-exercise progress records.

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::time_utils::{parse_weekday, weekday_name};

/// One calendar day's workout attempt.
///
/// At most one session exists per user and date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSession {
    /// Opaque unique identifier
    pub id: String,
    /// Owner
    pub user_id: String,
    /// Calendar day (serialized as "YYYY-MM-DD")
    pub date: NaiveDate,
    /// Weekday name at creation ("Monday")
    pub day_of_week: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub completed_exercises: u32,
    /// Snapshot of the plan's exercise count for this weekday
    #[serde(default)]
    pub total_exercises: u32,
    #[serde(default)]
    pub duration_minutes: u64,
    pub created_at: DateTime<Utc>,
    /// Set when the user starts the workout timer
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl WorkoutSession {
    pub fn new(
        user_id: &str,
        date: NaiveDate,
        total_exercises: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            date,
            day_of_week: weekday_name(date.weekday()).to_string(),
            is_completed: false,
            completed_exercises: 0,
            total_exercises,
            duration_minutes: 0,
            created_at,
            started_at: None,
            completed_at: None,
        }
    }

    /// Weekday this session was recorded under, falling back to the date.
    pub fn weekday(&self) -> Weekday {
        parse_weekday(&self.day_of_week).unwrap_or_else(|| self.date.weekday())
    }
}

/// Completion detail for one exercise within one session.
///
/// Identified by `(session_id, exercise_name)`; a repeat completion
/// overwrites the previous record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseProgress {
    pub user_id: String,
    pub session_id: String,
    pub exercise_name: String,
    pub sets_completed: u32,
    /// Snapshot of the prescribed set count
    pub total_sets: u32,
    /// Weight used (kg)
    #[serde(default)]
    pub weight: f32,
    pub reps: u32,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub notes: String,
    pub updated_at: DateTime<Utc>,
}

impl ExerciseProgress {
    /// Document ID: session ID plus URL-encoded exercise name.
    pub fn document_id(&self) -> String {
        progress_document_id(&self.session_id, &self.exercise_name)
    }
}

pub fn progress_document_id(session_id: &str, exercise_name: &str) -> String {
    format!("{}_{}", session_id, urlencoding::encode(exercise_name))
}
