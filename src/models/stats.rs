//! User statistics and time-windowed progress aggregates.
//!
//! `UserStats` is a materialized view over the session history: it is
//! recomputed from a full scan after every workout completion rather than
//! patched incrementally.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Default number of non-rest days per week.
pub const DEFAULT_WEEKLY_GOAL: u32 = 6;

/// Per-user aggregate, stored at `user_stats/{user_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    // ─── Streaks ─────────────────────────────────────────────────
    /// Consecutive qualifying days ending at or before today
    #[serde(default)]
    pub current_streak: u32,
    /// Longest streak ever observed (never decreases)
    #[serde(default)]
    pub longest_streak: u32,

    // ─── Totals ──────────────────────────────────────────────────
    /// Completed sessions, by full scan
    #[serde(default)]
    pub total_workouts: u32,
    /// Distinct dates with a completed session
    #[serde(default)]
    pub total_workout_days: u32,
    /// Most recent date with a completed session
    #[serde(default)]
    pub last_workout_date: Option<NaiveDate>,

    // ─── Goals ───────────────────────────────────────────────────
    #[serde(default = "default_weekly_goal")]
    pub weekly_goal: u32,

    // ─── Metadata ────────────────────────────────────────────────
    /// Last recomputation timestamp (RFC3339)
    #[serde(default)]
    pub updated_at: String,
}

fn default_weekly_goal() -> u32 {
    DEFAULT_WEEKLY_GOAL
}

impl Default for UserStats {
    fn default() -> Self {
        Self {
            current_streak: 0,
            longest_streak: 0,
            total_workouts: 0,
            total_workout_days: 0,
            last_workout_date: None,
            weekly_goal: DEFAULT_WEEKLY_GOAL,
            updated_at: String::new(),
        }
    }
}

impl UserStats {
    /// Zero-value stats with a custom weekly goal.
    pub fn with_goal(weekly_goal: u32) -> Self {
        Self {
            weekly_goal,
            ..Self::default()
        }
    }
}

/// Streak summary for the presentation layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StreakInfo {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub is_on_streak: bool,
}

/// Completion of one tracked weekday in the current week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayStatus {
    pub day: String,
    pub date: NaiveDate,
    pub completed: bool,
}

/// Weekly completion for the non-rest days of the week containing "today".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyProgress {
    /// Monday of the week
    pub week_start: NaiveDate,
    /// Tracked days in week order
    pub days: Vec<DayStatus>,
}

impl WeeklyProgress {
    pub fn completed_days(&self) -> usize {
        self.days.iter().filter(|d| d.completed).count()
    }

    /// Completed days / tracked days, 0 when nothing is tracked.
    pub fn completion_rate(&self) -> f32 {
        if self.days.is_empty() {
            0.0
        } else {
            self.completed_days() as f32 / self.days.len() as f32
        }
    }

    /// Weekday name -> completed.
    pub fn to_map(&self) -> HashMap<String, bool> {
        self.days
            .iter()
            .map(|d| (d.day.clone(), d.completed))
            .collect()
    }
}

/// Aggregates over the sessions of the current calendar month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MonthlyStats {
    pub year: i32,
    pub month: u32,
    /// Completed sessions this month
    pub total_workouts: u32,
    /// All sessions this month, including incomplete ones
    pub total_days: u32,
    /// Summed duration of completed sessions (minutes)
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_workout_time: u64,
    /// `total_workout_time / total_workouts`, 0 with no completions
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub average_workout_time: u64,
    /// `total_workouts / total_days`, 0 with no sessions
    pub completion_rate: f32,
}

/// All-time completed sessions for one weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DayFrequency {
    pub day: String,
    pub frequency: u32,
}
