// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local SQLite session store.
//!
//! Timestamps and dates are stored as TEXT (RFC3339 and `YYYY-MM-DD`).
//! Uniqueness of sessions per (user, date) and of progress per
//! (session, exercise) is enforced by the schema.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;

use crate::db::SessionStore;
use crate::error::AppError;
use crate::models::{ExerciseProgress, UserStats, WorkoutSession};
use crate::time_utils::{format_date, parse_date};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS workout_sessions (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    date TEXT NOT NULL,
    day_of_week TEXT NOT NULL,
    is_completed INTEGER NOT NULL DEFAULT 0,
    completed_exercises INTEGER NOT NULL DEFAULT 0,
    total_exercises INTEGER NOT NULL DEFAULT 0,
    duration_minutes INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    started_at TEXT,
    completed_at TEXT,
    UNIQUE (user_id, date)
);

CREATE TABLE IF NOT EXISTS exercise_progress (
    session_id TEXT NOT NULL,
    exercise_name TEXT NOT NULL,
    user_id TEXT NOT NULL,
    sets_completed INTEGER NOT NULL,
    total_sets INTEGER NOT NULL,
    weight REAL NOT NULL DEFAULT 0,
    reps INTEGER NOT NULL,
    is_completed INTEGER NOT NULL DEFAULT 0,
    notes TEXT NOT NULL DEFAULT '',
    updated_at TEXT NOT NULL,
    PRIMARY KEY (session_id, exercise_name)
);

CREATE INDEX IF NOT EXISTS idx_progress_user_exercise
    ON exercise_progress (user_id, exercise_name);

CREATE TABLE IF NOT EXISTS user_stats (
    user_id TEXT PRIMARY KEY,
    current_streak INTEGER NOT NULL DEFAULT 0,
    longest_streak INTEGER NOT NULL DEFAULT 0,
    total_workouts INTEGER NOT NULL DEFAULT 0,
    total_workout_days INTEGER NOT NULL DEFAULT 0,
    last_workout_date TEXT,
    weekly_goal INTEGER NOT NULL,
    updated_at TEXT NOT NULL DEFAULT ''
);
"#;

const SESSION_COLUMNS: &str = "id, user_id, date, day_of_week, is_completed, completed_exercises, \
     total_exercises, duration_minutes, created_at, started_at, completed_at";

const PROGRESS_COLUMNS: &str = "session_id, exercise_name, user_id, sets_completed, total_sets, \
     weight, reps, is_completed, notes, updated_at";

/// SQLite connection pool with the workout schema applied.
#[derive(Clone)]
pub struct SqliteDb {
    pool: SqlitePool,
}

impl SqliteDb {
    /// Open (creating if missing) the database at `path` and apply the schema.
    ///
    /// `path` is a connection string such as `sqlite://daily_workout.db` or
    /// `sqlite::memory:`.
    pub async fn open(path: &str) -> Result<Self, AppError> {
        let opts = SqliteConnectOptions::from_str(path)
            .map_err(|e| AppError::Database(format!("Invalid SQLite path {}: {}", path, e)))?
            .create_if_missing(true);

        // Every connection to :memory: is a separate database.
        let max_connections = if path.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await
            .map_err(|e| AppError::Database(format!("Failed to open SQLite: {}", e)))?;

        sqlx::raw_sql(SCHEMA)
            .execute(&pool)
            .await
            .map_err(db_error)?;

        tracing::info!(path, "Opened SQLite session store");

        Ok(Self { pool })
    }
}

fn db_error(e: sqlx::Error) -> AppError {
    AppError::Database(e.to_string())
}

fn corrupt(column: &str, value: &str) -> AppError {
    AppError::Database(format!("Unreadable {} value: {:?}", column, value))
}

fn parse_timestamp(column: &str, raw: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| corrupt(column, raw))
}

fn parse_stored_date(column: &str, raw: &str) -> Result<NaiveDate, AppError> {
    parse_date(raw).ok_or_else(|| corrupt(column, raw))
}

#[derive(FromRow)]
struct SessionRow {
    id: String,
    user_id: String,
    date: String,
    day_of_week: String,
    is_completed: bool,
    completed_exercises: i64,
    total_exercises: i64,
    duration_minutes: i64,
    created_at: String,
    started_at: Option<String>,
    completed_at: Option<String>,
}

impl TryFrom<SessionRow> for WorkoutSession {
    type Error = AppError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        Ok(WorkoutSession {
            date: parse_stored_date("date", &row.date)?,
            created_at: parse_timestamp("created_at", &row.created_at)?,
            started_at: row
                .started_at
                .as_deref()
                .map(|raw| parse_timestamp("started_at", raw))
                .transpose()?,
            completed_at: row
                .completed_at
                .as_deref()
                .map(|raw| parse_timestamp("completed_at", raw))
                .transpose()?,
            id: row.id,
            user_id: row.user_id,
            day_of_week: row.day_of_week,
            is_completed: row.is_completed,
            completed_exercises: row.completed_exercises as u32,
            total_exercises: row.total_exercises as u32,
            duration_minutes: row.duration_minutes as u64,
        })
    }
}

#[derive(FromRow)]
struct ProgressRow {
    session_id: String,
    exercise_name: String,
    user_id: String,
    sets_completed: i64,
    total_sets: i64,
    weight: f64,
    reps: i64,
    is_completed: bool,
    notes: String,
    updated_at: String,
}

impl TryFrom<ProgressRow> for ExerciseProgress {
    type Error = AppError;

    fn try_from(row: ProgressRow) -> Result<Self, Self::Error> {
        Ok(ExerciseProgress {
            updated_at: parse_timestamp("updated_at", &row.updated_at)?,
            user_id: row.user_id,
            session_id: row.session_id,
            exercise_name: row.exercise_name,
            sets_completed: row.sets_completed as u32,
            total_sets: row.total_sets as u32,
            weight: row.weight as f32,
            reps: row.reps as u32,
            is_completed: row.is_completed,
            notes: row.notes,
        })
    }
}

#[derive(FromRow)]
struct StatsRow {
    current_streak: i64,
    longest_streak: i64,
    total_workouts: i64,
    total_workout_days: i64,
    last_workout_date: Option<String>,
    weekly_goal: i64,
    updated_at: String,
}

impl TryFrom<StatsRow> for UserStats {
    type Error = AppError;

    fn try_from(row: StatsRow) -> Result<Self, Self::Error> {
        Ok(UserStats {
            current_streak: row.current_streak as u32,
            longest_streak: row.longest_streak as u32,
            total_workouts: row.total_workouts as u32,
            total_workout_days: row.total_workout_days as u32,
            last_workout_date: row
                .last_workout_date
                .as_deref()
                .map(|raw| parse_stored_date("last_workout_date", raw))
                .transpose()?,
            weekly_goal: row.weekly_goal as u32,
            updated_at: row.updated_at,
        })
    }
}

fn collect_rows<R, T>(rows: Vec<R>) -> Result<Vec<T>, AppError>
where
    T: TryFrom<R, Error = AppError>,
{
    rows.into_iter().map(T::try_from).collect()
}

impl SessionStore for SqliteDb {
    async fn get_session_for_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<WorkoutSession>, AppError> {
        let row: Option<SessionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM workout_sessions WHERE user_id = ? AND date = ?",
            SESSION_COLUMNS
        ))
        .bind(user_id)
        .bind(format_date(date))
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(WorkoutSession::try_from).transpose()
    }

    async fn create_session(&self, session: &WorkoutSession) -> Result<WorkoutSession, AppError> {
        sqlx::query(&format!(
            "INSERT INTO workout_sessions ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT (user_id, date) DO NOTHING",
            SESSION_COLUMNS
        ))
        .bind(&session.id)
        .bind(&session.user_id)
        .bind(format_date(session.date))
        .bind(&session.day_of_week)
        .bind(session.is_completed)
        .bind(i64::from(session.completed_exercises))
        .bind(i64::from(session.total_exercises))
        .bind(session.duration_minutes as i64)
        .bind(session.created_at.to_rfc3339())
        .bind(session.started_at.map(|t| t.to_rfc3339()))
        .bind(session.completed_at.map(|t| t.to_rfc3339()))
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        self.get_session_for_date(&session.user_id, session.date)
            .await?
            .ok_or_else(|| AppError::Database("Session vanished after insert".to_string()))
    }

    async fn update_session(&self, session: &WorkoutSession) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE workout_sessions SET is_completed = ?, completed_exercises = ?, \
             total_exercises = ?, duration_minutes = ?, started_at = ?, completed_at = ? \
             WHERE user_id = ? AND date = ?",
        )
        .bind(session.is_completed)
        .bind(i64::from(session.completed_exercises))
        .bind(i64::from(session.total_exercises))
        .bind(session.duration_minutes as i64)
        .bind(session.started_at.map(|t| t.to_rfc3339()))
        .bind(session.completed_at.map(|t| t.to_rfc3339()))
        .bind(&session.user_id)
        .bind(format_date(session.date))
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn get_all_sessions(&self, user_id: &str) -> Result<Vec<WorkoutSession>, AppError> {
        let rows: Vec<SessionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM workout_sessions WHERE user_id = ? ORDER BY date DESC",
            SESSION_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        collect_rows(rows)
    }

    async fn get_progress_for_session(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Vec<ExerciseProgress>, AppError> {
        let rows: Vec<ProgressRow> = sqlx::query_as(&format!(
            "SELECT {} FROM exercise_progress WHERE user_id = ? AND session_id = ?",
            PROGRESS_COLUMNS
        ))
        .bind(user_id)
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        collect_rows(rows)
    }

    async fn upsert_progress(&self, progress: &ExerciseProgress) -> Result<(), AppError> {
        sqlx::query(&format!(
            "INSERT INTO exercise_progress ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT (session_id, exercise_name) DO UPDATE SET \
             sets_completed = excluded.sets_completed, total_sets = excluded.total_sets, \
             weight = excluded.weight, reps = excluded.reps, \
             is_completed = excluded.is_completed, notes = excluded.notes, \
             updated_at = excluded.updated_at",
            PROGRESS_COLUMNS
        ))
        .bind(&progress.session_id)
        .bind(&progress.exercise_name)
        .bind(&progress.user_id)
        .bind(i64::from(progress.sets_completed))
        .bind(i64::from(progress.total_sets))
        .bind(f64::from(progress.weight))
        .bind(i64::from(progress.reps))
        .bind(progress.is_completed)
        .bind(&progress.notes)
        .bind(progress.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn get_recent_progress(
        &self,
        user_id: &str,
        exercise_name: &str,
        limit: u32,
    ) -> Result<Vec<ExerciseProgress>, AppError> {
        let rows: Vec<ProgressRow> = sqlx::query_as(&format!(
            "SELECT {} FROM exercise_progress \
             WHERE user_id = ? AND exercise_name = ? AND is_completed = 1 \
             ORDER BY updated_at DESC LIMIT ?",
            PROGRESS_COLUMNS
        ))
        .bind(user_id)
        .bind(exercise_name)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        collect_rows(rows)
    }

    async fn get_user_stats(&self, user_id: &str) -> Result<Option<UserStats>, AppError> {
        let row: Option<StatsRow> = sqlx::query_as(
            "SELECT current_streak, longest_streak, total_workouts, total_workout_days, \
             last_workout_date, weekly_goal, updated_at FROM user_stats WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(UserStats::try_from).transpose()
    }

    async fn set_user_stats(&self, user_id: &str, stats: &UserStats) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO user_stats (user_id, current_streak, longest_streak, total_workouts, \
             total_workout_days, last_workout_date, weekly_goal, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT (user_id) DO UPDATE SET \
             current_streak = excluded.current_streak, longest_streak = excluded.longest_streak, \
             total_workouts = excluded.total_workouts, \
             total_workout_days = excluded.total_workout_days, \
             last_workout_date = excluded.last_workout_date, \
             weekly_goal = excluded.weekly_goal, updated_at = excluded.updated_at",
        )
        .bind(user_id)
        .bind(i64::from(stats.current_streak))
        .bind(i64::from(stats.longest_streak))
        .bind(i64::from(stats.total_workouts))
        .bind(i64::from(stats.total_workout_days))
        .bind(stats.last_workout_date.map(format_date))
        .bind(i64::from(stats.weekly_goal))
        .bind(&stats.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }
}
