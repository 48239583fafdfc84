// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Periodic progress refresh for one user.
//!
//! A background task recomputes a [`ProgressSnapshot`] on every interval
//! tick and whenever the user's current session changes through the
//! tracker. The tick picks up changes made elsewhere (another device,
//! the date rolling over). Dropping the [`ProgressRefresher`] stops it.

use serde::Serialize;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::db::SessionStore;
use crate::error::Result;
use crate::models::{StreakInfo, WeeklyProgress, WorkoutSession};
use crate::services::workout::WorkoutTracker;

/// What the presentation layer shows on its progress screen.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressSnapshot {
    pub weekly: WeeklyProgress,
    pub weekly_completion_rate: f32,
    pub streak: StreakInfo,
    pub current_session: Option<WorkoutSession>,
}

/// Compute a snapshot from the store.
pub async fn progress_snapshot<S: SessionStore>(
    tracker: &WorkoutTracker<S>,
    user_id: &str,
) -> Result<ProgressSnapshot> {
    let history = tracker.history(user_id).await?;
    let stored = tracker.user_stats(user_id).await?;
    let today = tracker.today();

    let weekly = tracker.calculator().weekly_progress(&history, today);
    let current_session = history
        .sessions()
        .iter()
        .find(|s| s.date == today)
        .cloned();

    Ok(ProgressSnapshot {
        weekly_completion_rate: weekly.completion_rate(),
        weekly,
        streak: tracker.streak_from(&stored, &history),
        current_session,
    })
}

/// Handle to a running refresh task.
pub struct ProgressRefresher {
    snapshots: watch::Receiver<Option<ProgressSnapshot>>,
    handle: JoinHandle<()>,
}

impl ProgressRefresher {
    /// Start refreshing `user_id`'s progress every `interval`.
    ///
    /// The first snapshot is computed immediately.
    pub async fn spawn<S: SessionStore>(
        tracker: WorkoutTracker<S>,
        user_id: String,
        interval: Duration,
    ) -> Result<Self> {
        let mut sessions = tracker.subscribe_current_session(&user_id).await?;
        let (tx, rx) = watch::channel(None);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    changed = sessions.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }

                match progress_snapshot(&tracker, &user_id).await {
                    Ok(snapshot) => {
                        if tx.send(Some(snapshot)).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(user_id = %user_id, error = %e, "Progress refresh failed");
                    }
                }
            }

            tracing::debug!(user_id = %user_id, "Progress refresh stopped");
        });

        tracing::debug!(interval_secs = interval.as_secs(), "Progress refresh started");

        Ok(Self {
            snapshots: rx,
            handle,
        })
    }

    /// Wait for the next snapshot. `None` once the task has stopped.
    pub async fn next(&mut self) -> Option<ProgressSnapshot> {
        loop {
            self.snapshots.changed().await.ok()?;
            if let Some(snapshot) = self.snapshots.borrow_and_update().clone() {
                return Some(snapshot);
            }
        }
    }
}

impl Drop for ProgressRefresher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
