// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session store layer.
//!
//! The engine talks to storage only through [`SessionStore`]. Three
//! backends implement it: Firestore (remote), SQLite (local) and an
//! in-process map used by tests and offline runs.

pub mod firestore;
pub mod memory;
pub mod sqlite;

use chrono::NaiveDate;
use std::future::Future;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;
pub use sqlite::SqliteDb;

use crate::config::{Config, StoreBackend};
use crate::error::AppError;
use crate::models::{ExerciseProgress, UserStats, WorkoutSession};

/// Collection (table) names as constants.
pub mod collections {
    /// One document per user and date
    pub const WORKOUT_SESSIONS: &str = "workout_sessions";
    /// One document per session and exercise name
    pub const EXERCISE_PROGRESS: &str = "exercise_progress";
    /// User stats aggregates (keyed by user_id)
    pub const USER_STATS: &str = "user_stats";
}

/// Storage operations consumed by the workout engine, scoped per user.
///
/// Implementations enforce "at most one session per user and date" and
/// "one progress record per session and exercise name" structurally, so
/// callers never have to check before writing.
pub trait SessionStore: Clone + Send + Sync + 'static {
    fn get_session_for_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Option<WorkoutSession>, AppError>> + Send;

    /// Insert a session unless one already exists for its user and date.
    ///
    /// Returns whichever session is stored afterwards.
    fn create_session(
        &self,
        session: &WorkoutSession,
    ) -> impl Future<Output = Result<WorkoutSession, AppError>> + Send;

    fn update_session(
        &self,
        session: &WorkoutSession,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Every session of the user, newest date first.
    fn get_all_sessions(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Vec<WorkoutSession>, AppError>> + Send;

    fn get_progress_for_session(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> impl Future<Output = Result<Vec<ExerciseProgress>, AppError>> + Send;

    /// Insert or overwrite the record for `(session_id, exercise_name)`.
    fn upsert_progress(
        &self,
        progress: &ExerciseProgress,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Completed records for one exercise, most recently updated first.
    fn get_recent_progress(
        &self,
        user_id: &str,
        exercise_name: &str,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<ExerciseProgress>, AppError>> + Send;

    fn get_user_stats(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Option<UserStats>, AppError>> + Send;

    fn set_user_stats(
        &self,
        user_id: &str,
        stats: &UserStats,
    ) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// The configured backend.
#[derive(Clone)]
pub enum Store {
    Firestore(FirestoreDb),
    Sqlite(SqliteDb),
    Memory(MemoryDb),
}

impl Store {
    /// Connect to the backend selected by `config.store_backend`.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        match config.store_backend {
            StoreBackend::Firestore => Ok(Store::Firestore(
                FirestoreDb::new(&config.gcp_project_id).await?,
            )),
            StoreBackend::Sqlite => Ok(Store::Sqlite(SqliteDb::open(&config.sqlite_path).await?)),
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store, data is lost on restart");
                Ok(Store::Memory(MemoryDb::new()))
            }
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $db:ident => $call:expr) => {
        match $self {
            Store::Firestore($db) => $call.await,
            Store::Sqlite($db) => $call.await,
            Store::Memory($db) => $call.await,
        }
    };
}

impl SessionStore for Store {
    async fn get_session_for_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<WorkoutSession>, AppError> {
        dispatch!(self, db => db.get_session_for_date(user_id, date))
    }

    async fn create_session(&self, session: &WorkoutSession) -> Result<WorkoutSession, AppError> {
        dispatch!(self, db => db.create_session(session))
    }

    async fn update_session(&self, session: &WorkoutSession) -> Result<(), AppError> {
        dispatch!(self, db => db.update_session(session))
    }

    async fn get_all_sessions(&self, user_id: &str) -> Result<Vec<WorkoutSession>, AppError> {
        dispatch!(self, db => db.get_all_sessions(user_id))
    }

    async fn get_progress_for_session(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Vec<ExerciseProgress>, AppError> {
        dispatch!(self, db => db.get_progress_for_session(user_id, session_id))
    }

    async fn upsert_progress(&self, progress: &ExerciseProgress) -> Result<(), AppError> {
        dispatch!(self, db => db.upsert_progress(progress))
    }

    async fn get_recent_progress(
        &self,
        user_id: &str,
        exercise_name: &str,
        limit: u32,
    ) -> Result<Vec<ExerciseProgress>, AppError> {
        dispatch!(self, db => db.get_recent_progress(user_id, exercise_name, limit))
    }

    async fn get_user_stats(&self, user_id: &str) -> Result<Option<UserStats>, AppError> {
        dispatch!(self, db => db.get_user_stats(user_id))
    }

    async fn set_user_stats(&self, user_id: &str, stats: &UserStats) -> Result<(), AppError> {
        dispatch!(self, db => db.set_user_stats(user_id, stats))
    }
}

/// Document ID of a user's session on a date.
pub fn session_document_id(user_id: &str, date: NaiveDate) -> String {
    format!(
        "{}_{}",
        urlencoding::encode(user_id),
        crate::time_utils::format_date(date)
    )
}
