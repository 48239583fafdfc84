// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout plan catalog loading and lookup.

use crate::models::{Exercise, WorkoutPlan};
use crate::time_utils::parse_weekday;
use chrono::Weekday;
use serde::Deserialize;

/// Plan shipped with the binary.
const BUILTIN_PLAN: &str = include_str!("../../data/workout_plan.json");

/// Newest plan document version this build understands.
pub const PLAN_VERSION: u32 = 2;

#[derive(Deserialize)]
struct PlanDocument {
    version: u32,
    schedule: Vec<PlanDay>,
}

#[derive(Deserialize)]
struct PlanDay {
    day: String,
    #[serde(default)]
    exercises: Vec<Exercise>,
}

/// Read-only weekly plan, built once per process.
#[derive(Default, Clone)]
pub struct PlanCatalog {
    plan: WorkoutPlan,
}

impl PlanCatalog {
    /// The plan embedded at compile time.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::load_from_json(BUILTIN_PLAN)
    }

    /// Load a plan from a JSON string.
    ///
    /// Weekdays absent from the document are rest days. A weekday listed
    /// twice is rejected rather than merged.
    pub fn load_from_json(json_data: &str) -> Result<Self, CatalogError> {
        let doc: PlanDocument =
            serde_json::from_str(json_data).map_err(|e| CatalogError::ParseError(e.to_string()))?;

        if doc.version > PLAN_VERSION {
            return Err(CatalogError::UnsupportedVersion(doc.version));
        }

        let mut schedule: [Vec<Exercise>; 7] = Default::default();
        let mut seen = [false; 7];

        for entry in doc.schedule {
            let day = parse_weekday(&entry.day)
                .ok_or_else(|| CatalogError::UnknownDay(entry.day.clone()))?;
            let idx = day.num_days_from_monday() as usize;
            if seen[idx] {
                return Err(CatalogError::DuplicateDay(entry.day));
            }
            seen[idx] = true;
            schedule[idx] = entry.exercises;
        }

        let plan = WorkoutPlan::new(schedule);
        let total: usize = plan.days().map(|(_, exercises)| exercises.len()).sum();
        tracing::info!(version = doc.version, exercises = total, "Loaded workout plan");

        Ok(Self { plan })
    }

    /// Ordered exercises for a weekday (empty on a rest day).
    pub fn exercises_for(&self, day: Weekday) -> &[Exercise] {
        self.plan.exercises_for(day)
    }

    pub fn is_rest_day(&self, day: Weekday) -> bool {
        self.plan.is_rest_day(day)
    }

    /// Every weekday key, Monday first.
    pub fn days(&self) -> impl Iterator<Item = (Weekday, &[Exercise])> {
        self.plan.days()
    }

    /// First exercise with this name across all weekdays.
    pub fn find_exercise(&self, name: &str) -> Option<&Exercise> {
        self.plan.find_exercise(name)
    }

    /// Exercise scheduled on the given weekday, if any.
    pub fn find_on_day(&self, day: Weekday, name: &str) -> Option<&Exercise> {
        self.exercises_for(day).iter().find(|e| e.name == name)
    }
}

/// Errors from catalog loading.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to parse plan: {0}")]
    ParseError(String),

    #[error("Unsupported plan version: {0}")]
    UnsupportedVersion(u32),

    #[error("Unknown weekday: {0}")]
    UnknownDay(String),

    #[error("Weekday listed twice: {0}")]
    DuplicateDay(String),

    #[error("Rest day {0} has scheduled exercises")]
    ScheduledRestDay(String),
}
