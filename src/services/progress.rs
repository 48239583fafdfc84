// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Streak and progress calculation.
//!
//! Everything here is a pure function of a session-history snapshot and
//! "today". Nothing is cached between calls: `UserStats` is rebuilt from a
//! full scan each time, carrying over only the longest streak and the
//! weekly goal from the previous value.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

use crate::config::ConfigError;
use crate::services::catalog::{CatalogError, PlanCatalog};
use crate::models::{
    DayFrequency, DayStatus, MonthlyStats, UserStats, WeeklyProgress, WorkoutSession,
};
use crate::time_utils::{format_utc_rfc3339, week_start, weekday_name, WEEK};

/// Where the backward streak walk begins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StreakAnchor {
    /// Start at today. A completed session today counts; an unfinished
    /// one neither extends nor breaks the streak.
    #[default]
    Today,
    /// Start at yesterday. Today never counts, completed or not.
    Yesterday,
}

impl FromStr for StreakAnchor {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(StreakAnchor::Today),
            "yesterday" => Ok(StreakAnchor::Yesterday),
            other => Err(ConfigError::Invalid("STREAK_ANCHOR", other.to_string())),
        }
    }
}

/// Immutable snapshot of one user's sessions.
#[derive(Debug, Clone, Default)]
pub struct SessionHistory {
    sessions: Vec<WorkoutSession>,
    completed_dates: BTreeSet<NaiveDate>,
}

impl SessionHistory {
    pub fn new(sessions: Vec<WorkoutSession>) -> Self {
        let completed_dates = sessions
            .iter()
            .filter(|s| s.is_completed)
            .map(|s| s.date)
            .collect();
        Self {
            sessions,
            completed_dates,
        }
    }

    pub fn sessions(&self) -> &[WorkoutSession] {
        &self.sessions
    }

    pub fn is_completed_on(&self, date: NaiveDate) -> bool {
        self.completed_dates.contains(&date)
    }

    pub fn completed_count(&self) -> usize {
        self.sessions.iter().filter(|s| s.is_completed).count()
    }

    pub fn completed_days(&self) -> usize {
        self.completed_dates.len()
    }

    pub fn first_completed(&self) -> Option<NaiveDate> {
        self.completed_dates.first().copied()
    }

    pub fn last_completed(&self) -> Option<NaiveDate> {
        self.completed_dates.last().copied()
    }
}

/// Derives streaks and aggregates from a [`SessionHistory`].
#[derive(Debug, Clone, Copy)]
pub struct ProgressCalculator {
    /// Untracked weekdays, indexed from Monday
    rest_days: [bool; 7],
    anchor: StreakAnchor,
}

impl Default for ProgressCalculator {
    fn default() -> Self {
        Self::new(Weekday::Sun, StreakAnchor::Today)
    }
}

impl ProgressCalculator {
    pub fn new(rest_day: Weekday, anchor: StreakAnchor) -> Self {
        let mut rest_days = [false; 7];
        rest_days[rest_day.num_days_from_monday() as usize] = true;
        Self { rest_days, anchor }
    }

    /// Calculator whose rest days agree with `catalog`.
    ///
    /// The configured rest day must have nothing scheduled. Any other
    /// weekday the plan leaves empty is untracked as well.
    pub fn for_plan(
        catalog: &PlanCatalog,
        rest_day: Weekday,
        anchor: StreakAnchor,
    ) -> Result<Self, CatalogError> {
        if !catalog.is_rest_day(rest_day) {
            return Err(CatalogError::ScheduledRestDay(
                weekday_name(rest_day).to_string(),
            ));
        }

        let mut calculator = Self::new(rest_day, anchor);
        for (day, exercises) in catalog.days() {
            if exercises.is_empty() {
                calculator.rest_days[day.num_days_from_monday() as usize] = true;
            }
        }
        Ok(calculator)
    }

    /// True for weekdays that neither count toward nor break a streak.
    pub fn is_rest_day(&self, day: Weekday) -> bool {
        self.rest_days[day.num_days_from_monday() as usize]
    }

    /// Weekdays that are tracked for progress, Monday first.
    pub fn tracked_days(&self) -> impl Iterator<Item = Weekday> + '_ {
        WEEK.iter().copied().filter(move |d| !self.is_rest_day(*d))
    }

    /// Consecutive qualifying days, walking backward from the anchor.
    ///
    /// Rest days are skipped. The walk stops at the first tracked day without
    /// a completed session, except for today under [`StreakAnchor::Today`],
    /// which is still in progress. It never goes past the earliest completed
    /// session, so it terminates for any history.
    pub fn current_streak(&self, history: &SessionHistory, today: NaiveDate) -> u32 {
        let Some(earliest) = history.first_completed() else {
            return 0;
        };

        let start = match self.anchor {
            StreakAnchor::Today => Some(today),
            StreakAnchor::Yesterday => today.pred_opt(),
        };

        let mut streak = 0;
        let mut cursor = start;

        while let Some(day) = cursor.filter(|d| *d >= earliest) {
            cursor = day.checked_sub_days(Days::new(1));

            if self.is_rest_day(day.weekday()) {
                continue;
            }

            if history.is_completed_on(day) {
                streak += 1;
            } else if day == today {
                tracing::debug!(date = %day, "Today not completed yet, streak unaffected");
            } else {
                break;
            }
        }

        streak
    }

    /// Rebuild stats from the full history.
    pub fn refresh_stats(
        &self,
        previous: &UserStats,
        history: &SessionHistory,
        today: NaiveDate,
        now: chrono::DateTime<chrono::Utc>,
    ) -> UserStats {
        let current_streak = self.current_streak(history, today);

        UserStats {
            current_streak,
            longest_streak: previous.longest_streak.max(current_streak),
            total_workouts: history.completed_count() as u32,
            total_workout_days: history.completed_days() as u32,
            last_workout_date: history.last_completed(),
            weekly_goal: previous.weekly_goal,
            updated_at: format_utc_rfc3339(now),
        }
    }

    /// Completion of each tracked day in the week (Monday start) containing `today`.
    pub fn weekly_progress(&self, history: &SessionHistory, today: NaiveDate) -> WeeklyProgress {
        let monday = week_start(today);

        let days = monday
            .iter_days()
            .take(7)
            .filter(|date| !self.is_rest_day(date.weekday()))
            .map(|date| DayStatus {
                day: weekday_name(date.weekday()).to_string(),
                date,
                completed: history.is_completed_on(date),
            })
            .collect();

        WeeklyProgress {
            week_start: monday,
            days,
        }
    }

    /// Aggregates over sessions in the calendar month of `today`.
    pub fn monthly_stats(&self, history: &SessionHistory, today: NaiveDate) -> MonthlyStats {
        let in_month: Vec<&WorkoutSession> = history
            .sessions()
            .iter()
            .filter(|s| s.date.year() == today.year() && s.date.month() == today.month())
            .collect();

        let completed: Vec<&&WorkoutSession> = in_month.iter().filter(|s| s.is_completed).collect();
        let total_workouts = completed.len() as u32;
        let total_days = in_month.len() as u32;
        let total_workout_time: u64 = completed.iter().map(|s| s.duration_minutes).sum();

        let average_workout_time = if total_workouts > 0 {
            total_workout_time / u64::from(total_workouts)
        } else {
            0
        };

        let completion_rate = if total_days > 0 {
            total_workouts as f32 / total_days as f32
        } else {
            0.0
        };

        MonthlyStats {
            year: today.year(),
            month: today.month(),
            total_workouts,
            total_days,
            total_workout_time,
            average_workout_time,
            completion_rate,
        }
    }

    /// All-time completed sessions per tracked weekday.
    pub fn workout_frequency(&self, history: &SessionHistory) -> Vec<DayFrequency> {
        let mut counts: HashMap<Weekday, u32> = HashMap::new();
        for session in history.sessions().iter().filter(|s| s.is_completed) {
            *counts.entry(session.weekday()).or_insert(0) += 1;
        }

        self.tracked_days()
            .map(|day| DayFrequency {
                day: weekday_name(day).to_string(),
                frequency: counts.get(&day).copied().unwrap_or(0),
            })
            .collect()
    }
}
