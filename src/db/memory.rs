// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process session store.

use chrono::NaiveDate;
use dashmap::DashMap;
use std::sync::Arc;

use crate::db::SessionStore;
use crate::error::AppError;
use crate::models::{ExerciseProgress, UserStats, WorkoutSession};

/// Session store backed by concurrent maps. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryDb {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    /// (user_id, date) -> session
    sessions: DashMap<(String, NaiveDate), WorkoutSession>,
    /// progress document ID -> record
    progress: DashMap<String, ExerciseProgress>,
    /// user_id -> stats
    stats: DashMap<String, UserStats>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryDb {
    async fn get_session_for_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<WorkoutSession>, AppError> {
        Ok(self
            .inner
            .sessions
            .get(&(user_id.to_string(), date))
            .map(|entry| entry.value().clone()))
    }

    async fn create_session(&self, session: &WorkoutSession) -> Result<WorkoutSession, AppError> {
        let stored = self
            .inner
            .sessions
            .entry((session.user_id.clone(), session.date))
            .or_insert_with(|| session.clone())
            .value()
            .clone();
        Ok(stored)
    }

    async fn update_session(&self, session: &WorkoutSession) -> Result<(), AppError> {
        self.inner
            .sessions
            .insert((session.user_id.clone(), session.date), session.clone());
        Ok(())
    }

    async fn get_all_sessions(&self, user_id: &str) -> Result<Vec<WorkoutSession>, AppError> {
        let mut sessions: Vec<WorkoutSession> = self
            .inner
            .sessions
            .iter()
            .filter(|entry| entry.key().0 == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        sessions.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(sessions)
    }

    async fn get_progress_for_session(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Vec<ExerciseProgress>, AppError> {
        Ok(self
            .inner
            .progress
            .iter()
            .filter(|entry| entry.user_id == user_id && entry.session_id == session_id)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn upsert_progress(&self, progress: &ExerciseProgress) -> Result<(), AppError> {
        self.inner
            .progress
            .insert(progress.document_id(), progress.clone());
        Ok(())
    }

    async fn get_recent_progress(
        &self,
        user_id: &str,
        exercise_name: &str,
        limit: u32,
    ) -> Result<Vec<ExerciseProgress>, AppError> {
        let mut records: Vec<ExerciseProgress> = self
            .inner
            .progress
            .iter()
            .filter(|entry| {
                entry.user_id == user_id && entry.exercise_name == exercise_name && entry.is_completed
            })
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        records.truncate(limit as usize);
        Ok(records)
    }

    async fn get_user_stats(&self, user_id: &str) -> Result<Option<UserStats>, AppError> {
        Ok(self
            .inner
            .stats
            .get(user_id)
            .map(|entry| entry.value().clone()))
    }

    async fn set_user_stats(&self, user_id: &str, stats: &UserStats) -> Result<(), AppError> {
        self.inner.stats.insert(user_id.to_string(), stats.clone());
        Ok(())
    }
}
