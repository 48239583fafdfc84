// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout session lifecycle.
//!
//! Handles the core workflow for one user:
//! 1. Get or create the session for today
//! 2. Record per-exercise completions against it
//! 3. Complete the workout and rebuild the user's stats
//!
//! Stats are rebuilt only on workout completion. Recording an exercise
//! updates the session's completed count and nothing else.

use chrono::{Datelike, NaiveDate};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

use crate::db::SessionStore;
use crate::error::Result;
use crate::models::{
    DayFrequency, Exercise, ExerciseProgress, MonthlyStats, StreakInfo, UserStats,
    WeeklyProgress, WorkoutSession,
};
use crate::services::catalog::PlanCatalog;
use crate::services::progress::{ProgressCalculator, SessionHistory};
use crate::time_utils::{weekday_name, Clock};

/// Records returned by "recent progress" lookups.
pub const RECENT_PROGRESS_LIMIT: u32 = 10;

/// Completion data submitted for one exercise.
#[derive(Debug, Clone, Deserialize)]
pub struct ExerciseCompletion {
    pub exercise_name: String,
    pub sets_completed: u32,
    pub reps: u32,
    #[serde(default)]
    pub weight: f32,
    #[serde(default)]
    pub notes: String,
}

/// Today's plan together with the user's session for it.
#[derive(Debug, Clone, Serialize)]
pub struct TodaysWorkout {
    pub date: NaiveDate,
    pub day: String,
    pub is_rest_day: bool,
    pub exercises: Vec<Exercise>,
    pub session: WorkoutSession,
    pub progress: Vec<ExerciseProgress>,
}

/// Result of submitting an exercise completion.
#[derive(Debug, Clone, Serialize)]
pub struct ExerciseOutcome {
    /// False when the input was ignored
    pub recorded: bool,
    pub session: WorkoutSession,
}

/// Result of completing a workout.
#[derive(Debug, Clone, Serialize)]
pub struct WorkoutCompletion {
    pub session: WorkoutSession,
    pub stats: UserStats,
}

type SessionSender = Arc<watch::Sender<Option<WorkoutSession>>>;

/// Session lifecycle manager and presentation-facing queries.
#[derive(Clone)]
pub struct WorkoutTracker<S> {
    store: S,
    catalog: Arc<PlanCatalog>,
    calculator: ProgressCalculator,
    clock: Clock,
    weekly_goal: u32,
    /// Per-user observable of today's session
    current: Arc<DashMap<String, SessionSender>>,
}

impl<S: SessionStore> WorkoutTracker<S> {
    pub fn new(
        store: S,
        catalog: PlanCatalog,
        calculator: ProgressCalculator,
        clock: Clock,
        weekly_goal: u32,
    ) -> Self {
        Self {
            store,
            catalog: Arc::new(catalog),
            calculator,
            clock,
            weekly_goal,
            current: Arc::new(DashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn catalog(&self) -> &PlanCatalog {
        &self.catalog
    }

    pub fn calculator(&self) -> &ProgressCalculator {
        &self.calculator
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Exercises scheduled for today's weekday.
    pub fn todays_exercises(&self) -> &[Exercise] {
        self.catalog.exercises_for(self.today().weekday())
    }

    // ─── Session Lifecycle ───────────────────────────────────────

    /// Today's session, created on first visit.
    pub async fn get_or_create_todays_session(&self, user_id: &str) -> Result<WorkoutSession> {
        let today = self.today();

        if let Some(session) = self.store.get_session_for_date(user_id, today).await? {
            tracing::debug!(user_id, date = %today, session_id = %session.id, "Found today's session");
            return Ok(session);
        }

        let total = self.catalog.exercises_for(today.weekday()).len() as u32;
        let candidate = WorkoutSession::new(user_id, today, total, self.clock.now());
        let session = self.store.create_session(&candidate).await?;

        tracing::info!(
            user_id,
            date = %today,
            session_id = %session.id,
            total_exercises = session.total_exercises,
            "Created workout session"
        );

        self.publish(&session);
        Ok(session)
    }

    /// Stamp the start of today's workout (restarts the timer if already set).
    pub async fn start_workout(&self, user_id: &str) -> Result<WorkoutSession> {
        let mut session = self.get_or_create_todays_session(user_id).await?;
        session.started_at = Some(self.clock.now());
        self.store.update_session(&session).await?;

        tracing::info!(user_id, session_id = %session.id, "Workout started");
        self.publish(&session);
        Ok(session)
    }

    /// Record completion data for one exercise in `session`.
    ///
    /// Returns `None` without touching storage when sets or reps are zero,
    /// or when the exercise is not scheduled for the session's weekday.
    /// Otherwise the progress record is upserted and the session's
    /// completed count is recounted from the stored records.
    pub async fn record_exercise_completion(
        &self,
        session: &WorkoutSession,
        input: &ExerciseCompletion,
    ) -> Result<Option<WorkoutSession>> {
        if input.sets_completed == 0 || input.reps == 0 {
            tracing::debug!(
                session_id = %session.id,
                exercise = %input.exercise_name,
                sets = input.sets_completed,
                reps = input.reps,
                "Ignoring completion with zero sets or reps"
            );
            return Ok(None);
        }

        let Some(exercise) = self
            .catalog
            .find_on_day(session.weekday(), &input.exercise_name)
        else {
            tracing::debug!(
                session_id = %session.id,
                exercise = %input.exercise_name,
                day = %session.day_of_week,
                "Ignoring completion for unscheduled exercise"
            );
            return Ok(None);
        };

        let progress = ExerciseProgress {
            user_id: session.user_id.clone(),
            session_id: session.id.clone(),
            exercise_name: exercise.name.clone(),
            sets_completed: input.sets_completed,
            total_sets: exercise.sets.target(),
            weight: input.weight,
            reps: input.reps,
            is_completed: true,
            notes: input.notes.clone(),
            updated_at: self.clock.now(),
        };
        self.store.upsert_progress(&progress).await?;

        let completed = self
            .store
            .get_progress_for_session(&session.user_id, &session.id)
            .await?
            .iter()
            .filter(|p| p.is_completed)
            .count() as u32;

        let mut updated = session.clone();
        updated.completed_exercises = completed;
        self.store.update_session(&updated).await?;

        tracing::info!(
            user_id = %updated.user_id,
            session_id = %updated.id,
            exercise = %progress.exercise_name,
            completed_exercises = updated.completed_exercises,
            total_exercises = updated.total_exercises,
            "Exercise recorded"
        );

        self.publish(&updated);
        Ok(Some(updated))
    }

    /// Mark `session` completed and rebuild the user's stats.
    ///
    /// The recorded duration is never below one minute.
    pub async fn complete_session(
        &self,
        session: &WorkoutSession,
        duration_minutes: u64,
    ) -> Result<WorkoutCompletion> {
        let mut updated = session.clone();
        updated.is_completed = true;
        updated.completed_exercises = updated.total_exercises;
        updated.duration_minutes = duration_minutes.max(1);
        updated.completed_at = Some(self.clock.now());
        self.store.update_session(&updated).await?;

        tracing::info!(
            user_id = %updated.user_id,
            session_id = %updated.id,
            duration_minutes = updated.duration_minutes,
            "Workout completed"
        );

        self.publish(&updated);
        let stats = self.refresh_user_stats(&updated.user_id).await?;

        Ok(WorkoutCompletion {
            session: updated,
            stats,
        })
    }

    // ─── Presentation Operations ─────────────────────────────────

    /// Today's plan and session, initializing stats on first use.
    pub async fn todays_workout(&self, user_id: &str) -> Result<TodaysWorkout> {
        self.ensure_user_stats(user_id).await?;
        let session = self.get_or_create_todays_session(user_id).await?;
        let progress = self
            .store
            .get_progress_for_session(user_id, &session.id)
            .await?;

        let today = self.today();
        Ok(TodaysWorkout {
            date: today,
            day: weekday_name(today.weekday()).to_string(),
            is_rest_day: self.catalog.is_rest_day(today.weekday()),
            exercises: self.todays_exercises().to_vec(),
            session,
            progress,
        })
    }

    /// Record an exercise against today's session.
    pub async fn complete_exercise(
        &self,
        user_id: &str,
        input: &ExerciseCompletion,
    ) -> Result<ExerciseOutcome> {
        let session = self.get_or_create_todays_session(user_id).await?;

        Ok(match self.record_exercise_completion(&session, input).await? {
            Some(updated) => ExerciseOutcome {
                recorded: true,
                session: updated,
            },
            None => ExerciseOutcome {
                recorded: false,
                session,
            },
        })
    }

    /// Complete today's workout.
    ///
    /// Without an explicit duration the elapsed minutes since the workout
    /// was started are used, or one minute if it was never started.
    pub async fn complete_workout(
        &self,
        user_id: &str,
        duration_minutes: Option<u64>,
    ) -> Result<WorkoutCompletion> {
        let session = self.get_or_create_todays_session(user_id).await?;

        let duration = duration_minutes.unwrap_or_else(|| {
            session
                .started_at
                .map(|start| (self.clock.now() - start).num_minutes().max(0) as u64)
                .unwrap_or(1)
        });

        self.complete_session(&session, duration).await
    }

    /// Today's session if one exists, without creating it.
    pub async fn current_session(&self, user_id: &str) -> Result<Option<WorkoutSession>> {
        self.store.get_session_for_date(user_id, self.today()).await
    }

    /// Watch today's session for a user.
    ///
    /// The receiver starts with the stored session (if any) and sees every
    /// change made through this tracker.
    pub async fn subscribe_current_session(
        &self,
        user_id: &str,
    ) -> Result<watch::Receiver<Option<WorkoutSession>>> {
        let sender = self.sender_for(user_id);
        if sender.borrow().is_none() {
            let stored = self.current_session(user_id).await?;
            sender.send_if_modified(|current| {
                if current.is_none() && stored.is_some() {
                    *current = stored;
                    true
                } else {
                    false
                }
            });
        }
        Ok(sender.subscribe())
    }

    pub async fn all_sessions(&self, user_id: &str) -> Result<Vec<WorkoutSession>> {
        self.store.get_all_sessions(user_id).await
    }

    /// Latest completed records for one exercise.
    pub async fn recent_progress(
        &self,
        user_id: &str,
        exercise_name: &str,
    ) -> Result<Vec<ExerciseProgress>> {
        self.store
            .get_recent_progress(user_id, exercise_name, RECENT_PROGRESS_LIMIT)
            .await
    }

    // ─── Stats & Progress ────────────────────────────────────────

    /// Stored stats, writing zero-value stats on first use.
    pub async fn ensure_user_stats(&self, user_id: &str) -> Result<UserStats> {
        if let Some(stats) = self.store.get_user_stats(user_id).await? {
            return Ok(stats);
        }

        let stats = UserStats::with_goal(self.weekly_goal);
        self.store.set_user_stats(user_id, &stats).await?;
        tracing::info!(user_id, weekly_goal = self.weekly_goal, "Initialized user stats");
        Ok(stats)
    }

    /// Stored stats, or defaults when none exist yet. Never writes.
    pub async fn user_stats(&self, user_id: &str) -> Result<UserStats> {
        Ok(self
            .store
            .get_user_stats(user_id)
            .await?
            .unwrap_or_else(|| UserStats::with_goal(self.weekly_goal)))
    }

    /// Rebuild and overwrite the user's stats from the full history.
    pub async fn refresh_user_stats(&self, user_id: &str) -> Result<UserStats> {
        let previous = self.user_stats(user_id).await?;
        let history = self.history(user_id).await?;
        let stats = self
            .calculator
            .refresh_stats(&previous, &history, self.today(), self.clock.now());

        self.store.set_user_stats(user_id, &stats).await?;

        tracing::info!(
            user_id,
            current_streak = stats.current_streak,
            longest_streak = stats.longest_streak,
            total_workouts = stats.total_workouts,
            "User stats recomputed"
        );

        Ok(stats)
    }

    pub async fn history(&self, user_id: &str) -> Result<SessionHistory> {
        Ok(SessionHistory::new(self.store.get_all_sessions(user_id).await?))
    }

    pub async fn weekly_progress(&self, user_id: &str) -> Result<WeeklyProgress> {
        let history = self.history(user_id).await?;
        Ok(self.calculator.weekly_progress(&history, self.today()))
    }

    pub async fn monthly_stats(&self, user_id: &str) -> Result<MonthlyStats> {
        let history = self.history(user_id).await?;
        Ok(self.calculator.monthly_stats(&history, self.today()))
    }

    pub async fn workout_frequency(&self, user_id: &str) -> Result<Vec<DayFrequency>> {
        let history = self.history(user_id).await?;
        Ok(self.calculator.workout_frequency(&history))
    }

    /// Streak as of now, computed from the history without writing stats.
    pub async fn streak_info(&self, user_id: &str) -> Result<StreakInfo> {
        let stored = self.user_stats(user_id).await?;
        let history = self.history(user_id).await?;
        Ok(self.streak_from(&stored, &history))
    }

    pub(crate) fn streak_from(&self, stored: &UserStats, history: &SessionHistory) -> StreakInfo {
        let current = self.calculator.current_streak(history, self.today());
        StreakInfo {
            current_streak: current,
            longest_streak: stored.longest_streak.max(current),
            is_on_streak: current > 0,
        }
    }

    // ─── Observers ───────────────────────────────────────────────

    fn sender_for(&self, user_id: &str) -> SessionSender {
        self.current
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(watch::channel(None).0))
            .value()
            .clone()
    }

    /// Push `session` to subscribers of today's session, if there are any.
    fn publish(&self, session: &WorkoutSession) {
        if session.date != self.today() {
            return;
        }
        if let Some(sender) = self.current.get(&session.user_id) {
            sender.send_replace(Some(session.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;
    use crate::services::progress::StreakAnchor;
    use chrono::Weekday;

    // Saturday: eight exercises scheduled.
    fn saturday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    fn tracker_on(date: NaiveDate, store: MemoryDb) -> WorkoutTracker<MemoryDb> {
        WorkoutTracker::new(
            store,
            PlanCatalog::builtin().unwrap(),
            ProgressCalculator::new(Weekday::Sun, StreakAnchor::Today),
            Clock::fixed_on(date),
            6,
        )
    }

    fn plank(sets: u32, reps: u32) -> ExerciseCompletion {
        ExerciseCompletion {
            exercise_name: "Plank".to_string(),
            sets_completed: sets,
            reps,
            weight: 0.0,
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn test_todays_session_is_created_once() {
        let tracker = tracker_on(saturday(), MemoryDb::new());

        let first = tracker.get_or_create_todays_session("alice").await.unwrap();
        let second = tracker.get_or_create_todays_session("alice").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.total_exercises, 8);
        assert_eq!(first.completed_exercises, 0);
        assert!(!first.is_completed);
        assert_eq!(tracker.all_sessions("alice").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_first_visits_share_session() {
        let tracker = tracker_on(saturday(), MemoryDb::new());

        let (a, b) = tokio::join!(
            tracker.get_or_create_todays_session("alice"),
            tracker.get_or_create_todays_session("alice")
        );
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(a.id, b.id);

        let outcome = tracker.complete_exercise("alice", &plank(3, 60)).await.unwrap();
        assert_eq!(outcome.session.id, a.id);
        assert_eq!(outcome.session.completed_exercises, 1);
    }

    #[tokio::test]
    async fn test_zero_sets_is_a_no_op() {
        let tracker = tracker_on(saturday(), MemoryDb::new());
        let session = tracker.get_or_create_todays_session("alice").await.unwrap();

        let outcome = tracker.record_exercise_completion(&session, &plank(0, 60)).await.unwrap();
        assert!(outcome.is_none());
        let outcome = tracker.record_exercise_completion(&session, &plank(3, 0)).await.unwrap();
        assert!(outcome.is_none());

        let stored = tracker.current_session("alice").await.unwrap().unwrap();
        assert_eq!(stored.completed_exercises, 0);
        assert!(tracker
            .store()
            .get_progress_for_session("alice", &session.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_unscheduled_exercise_is_ignored() {
        let tracker = tracker_on(saturday(), MemoryDb::new());
        let mut input = plank(3, 12);
        input.exercise_name = "Squat".to_string();

        let outcome = tracker.complete_exercise("alice", &input).await.unwrap();
        assert!(!outcome.recorded);
        assert_eq!(outcome.session.completed_exercises, 0);
    }

    #[tokio::test]
    async fn test_repeat_completion_overwrites() {
        let tracker = tracker_on(saturday(), MemoryDb::new());

        for sets in 1..=3 {
            let outcome = tracker.complete_exercise("alice", &plank(sets, 60)).await.unwrap();
            assert!(outcome.recorded);
            assert_eq!(outcome.session.completed_exercises, 1);
        }

        let session = tracker.current_session("alice").await.unwrap().unwrap();
        let progress = tracker
            .store()
            .get_progress_for_session("alice", &session.id)
            .await
            .unwrap();
        assert_eq!(progress.len(), 1);
        assert_eq!(progress[0].sets_completed, 3);
        assert_eq!(progress[0].total_sets, 3);
    }

    #[tokio::test]
    async fn test_exercise_completion_does_not_touch_stats() {
        let tracker = tracker_on(saturday(), MemoryDb::new());
        tracker.ensure_user_stats("alice").await.unwrap();
        tracker.complete_exercise("alice", &plank(3, 60)).await.unwrap();

        let stats = tracker.user_stats("alice").await.unwrap();
        assert_eq!(stats.total_workouts, 0);
        assert_eq!(stats.current_streak, 0);
    }

    #[tokio::test]
    async fn test_complete_workout_updates_stats() {
        let tracker = tracker_on(saturday(), MemoryDb::new());
        let before = tracker.history("alice").await.unwrap().completed_count();

        let done = tracker.complete_workout("alice", Some(42)).await.unwrap();

        assert!(done.session.is_completed);
        assert_eq!(done.session.completed_exercises, done.session.total_exercises);
        assert_eq!(done.session.duration_minutes, 42);
        assert!(done.session.completed_at.is_some());
        assert_eq!(done.stats.total_workouts as usize, before + 1);
        assert_eq!(done.stats.current_streak, 1);
        assert_eq!(done.stats.longest_streak, 1);
        assert_eq!(done.stats.last_workout_date, Some(saturday()));
    }

    #[tokio::test]
    async fn test_duration_is_at_least_one_minute() {
        let tracker = tracker_on(saturday(), MemoryDb::new());

        let done = tracker.complete_workout("alice", Some(0)).await.unwrap();
        assert_eq!(done.session.duration_minutes, 1);

        let tracker = tracker_on(saturday(), MemoryDb::new());
        tracker.start_workout("bob").await.unwrap();
        // Fixed clock: zero minutes elapsed since start.
        let done = tracker.complete_workout("bob", None).await.unwrap();
        assert_eq!(done.session.duration_minutes, 1);

        let done = tracker.complete_workout("carol", None).await.unwrap();
        assert_eq!(done.session.duration_minutes, 1);
    }

    #[tokio::test]
    async fn test_streak_builds_across_days() {
        let store = MemoryDb::new();
        // Thu 15, Fri 16 completed; check on Saturday before and after.
        for day in [15, 16] {
            let tracker = tracker_on(NaiveDate::from_ymd_opt(2026, 10, day).unwrap(), store.clone());
            tracker.complete_workout("alice", Some(30)).await.unwrap();
        }

        let tracker = tracker_on(saturday(), store);
        let info = tracker.streak_info("alice").await.unwrap();
        assert_eq!(info.current_streak, 2);
        assert!(info.is_on_streak);

        let done = tracker.complete_workout("alice", Some(30)).await.unwrap();
        assert_eq!(done.stats.current_streak, 3);
        assert_eq!(done.stats.total_workout_days, 3);
    }

    #[tokio::test]
    async fn test_ensure_user_stats_initializes_once() {
        let tracker = tracker_on(saturday(), MemoryDb::new());
        assert!(tracker.store().get_user_stats("alice").await.unwrap().is_none());

        let stats = tracker.ensure_user_stats("alice").await.unwrap();
        assert_eq!(stats, UserStats::with_goal(6));
        assert!(tracker.store().get_user_stats("alice").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_subscribers_see_session_changes() {
        let tracker = tracker_on(saturday(), MemoryDb::new());
        let mut rx = tracker.subscribe_current_session("alice").await.unwrap();
        assert!(rx.borrow().is_none());

        tracker.complete_exercise("alice", &plank(3, 60)).await.unwrap();
        rx.changed().await.unwrap();
        let seen = rx.borrow_and_update().clone().unwrap();
        assert_eq!(seen.completed_exercises, 1);
    }

    #[tokio::test]
    async fn test_writes_without_subscribers_keep_no_channel() {
        let tracker = tracker_on(saturday(), MemoryDb::new());

        tracker.complete_exercise("alice", &plank(3, 60)).await.unwrap();
        tracker.complete_workout("bob", Some(20)).await.unwrap();
        assert!(tracker.current.is_empty());

        let _rx = tracker.subscribe_current_session("alice").await.unwrap();
        assert_eq!(tracker.current.len(), 1);
    }

    #[tokio::test]
    async fn test_subscribe_seeds_from_store() {
        let store = MemoryDb::new();
        tracker_on(saturday(), store.clone())
            .get_or_create_todays_session("alice")
            .await
            .unwrap();

        let tracker = tracker_on(saturday(), store);
        let rx = tracker.subscribe_current_session("alice").await.unwrap();
        assert!(rx.borrow().is_some());
    }
}
