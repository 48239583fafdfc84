// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Layout, all top-level collections carrying a `user_id` field:
//! - `workout_sessions/{user_id}_{date}`
//! - `exercise_progress/{session_id}_{exercise_name}`
//! - `user_stats/{user_id}`

use chrono::NaiveDate;
use firestore::errors::FirestoreError;

use crate::db::{collections, session_document_id, SessionStore};
use crate::error::AppError;
use crate::models::{ExerciseProgress, UserStats, WorkoutSession};

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator accepts unauthenticated connections; skip local credentials.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Offline client: every operation fails with `AppError::Database`.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    async fn get_session_by_doc_id(&self, doc_id: &str) -> Result<Option<WorkoutSession>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::WORKOUT_SESSIONS)
            .obj()
            .one(doc_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn write_session(&self, session: &WorkoutSession) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::WORKOUT_SESSIONS)
            .document_id(session_document_id(&session.user_id, session.date))
            .object(session)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

impl SessionStore for FirestoreDb {
    // ─── Session Operations ──────────────────────────────────────

    async fn get_session_for_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<WorkoutSession>, AppError> {
        self.get_session_by_doc_id(&session_document_id(user_id, date))
            .await
    }

    async fn create_session(&self, session: &WorkoutSession) -> Result<WorkoutSession, AppError> {
        let doc_id = session_document_id(&session.user_id, session.date);

        // Insert fails with a conflict when the (user, date) document exists,
        // so the first writer's session is the one everybody gets back.
        let inserted: Result<WorkoutSession, FirestoreError> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::WORKOUT_SESSIONS)
            .document_id(&doc_id)
            .object(session)
            .execute()
            .await;

        match inserted {
            Ok(_) => Ok(session.clone()),
            Err(FirestoreError::DataConflictError(_)) => {
                tracing::debug!(
                    user_id = %session.user_id,
                    date = %session.date,
                    "Session already exists, returning stored one"
                );
                self.get_session_by_doc_id(&doc_id).await?.ok_or_else(|| {
                    AppError::Database(format!("Session {} vanished after conflict", doc_id))
                })
            }
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    async fn update_session(&self, session: &WorkoutSession) -> Result<(), AppError> {
        self.write_session(session).await
    }

    async fn get_all_sessions(&self, user_id: &str) -> Result<Vec<WorkoutSession>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::WORKOUT_SESSIONS)
            .filter(|q| q.for_all([q.field("user_id").eq(user_id)]))
            .order_by([("date", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Exercise Progress Operations ────────────────────────────

    async fn get_progress_for_session(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Vec<ExerciseProgress>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::EXERCISE_PROGRESS)
            .filter(|q| {
                q.for_all([
                    q.field("user_id").eq(user_id),
                    q.field("session_id").eq(session_id),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn upsert_progress(&self, progress: &ExerciseProgress) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::EXERCISE_PROGRESS)
            .document_id(progress.document_id())
            .object(progress)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn get_recent_progress(
        &self,
        user_id: &str,
        exercise_name: &str,
        limit: u32,
    ) -> Result<Vec<ExerciseProgress>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::EXERCISE_PROGRESS)
            .filter(|q| {
                q.for_all([
                    q.field("user_id").eq(user_id),
                    q.field("exercise_name").eq(exercise_name),
                    q.field("is_completed").eq(true),
                ])
            })
            .order_by([("updated_at", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── User Stats Operations ───────────────────────────────────

    async fn get_user_stats(&self, user_id: &str) -> Result<Option<UserStats>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USER_STATS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn set_user_stats(&self, user_id: &str, stats: &UserStats) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USER_STATS)
            .document_id(user_id)
            .object(stats)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
