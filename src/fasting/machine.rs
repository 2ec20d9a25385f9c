// ABOUTME: Per-user fasting session state machine with serialized commands and CAS persistence
// ABOUTME: Publishes derived session snapshots and UI signals, archives ended sessions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::signals::UiSignals;
use super::theme::ThemeTier;
use crate::clock::Clock;
use crate::constants::fasting::SECONDS_PER_HOUR;
use crate::errors::{SessionError, StoreError};
use crate::logging::CoachLogger;
use crate::models::{
    ActivityRecord, BehaviorSnapshot, FastingSession, FastingState, FastingType, SessionCommand,
};
use crate::notifications::{NotificationEvent, NotificationSink};
use crate::observable::ObservableCell;
use crate::store::{ActivityLogStore, SessionStore};

/// Why a snapshot was published
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotOrigin {
    /// A start/pause/resume/end command committed
    Command,
    /// Periodic display refresh
    Tick,
    /// First read from the store
    Load,
}

/// A session plus everything derived from it at one instant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    /// The session as persisted
    pub session: FastingSession,
    /// Instant the derived values were computed for
    pub observed_at: DateTime<Utc>,
    /// Fasted seconds, pauses excluded
    pub elapsed_secs: i64,
    /// Seconds until the target
    pub remaining_secs: i64,
    /// Elapsed over target in [0, 1]
    pub progress: f64,
    /// Visual tier for `progress`
    pub theme: ThemeTier,
    /// Motivational line for `theme`
    pub motivation: &'static str,
    /// What produced this snapshot
    pub origin: SnapshotOrigin,
}

impl SessionSnapshot {
    /// Derive a snapshot of `session` as seen at `now`
    #[must_use]
    pub fn capture(session: &FastingSession, now: DateTime<Utc>, origin: SnapshotOrigin) -> Self {
        let progress = session.progress(now);
        let theme = ThemeTier::for_progress(progress);
        Self {
            session: session.clone(),
            observed_at: now,
            elapsed_secs: session.elapsed(now).num_seconds(),
            remaining_secs: session.remaining(now).num_seconds(),
            progress,
            theme,
            motivation: theme.motivation(),
            origin,
        }
    }

    /// Fasted time, pauses excluded
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        Duration::seconds(self.elapsed_secs)
    }

    /// Time left until the target
    #[must_use]
    pub const fn remaining(&self) -> Duration {
        Duration::seconds(self.remaining_secs)
    }

    /// Session state at the time of capture
    #[must_use]
    pub const fn state(&self) -> FastingState {
        self.session.state
    }
}

/// Recomputes behavior statistics after a session ends
#[async_trait]
pub trait SnapshotRefresher: Send + Sync {
    /// Force a recompute for `user_id`
    ///
    /// # Errors
    ///
    /// Returns an error if the activity log cannot be read
    async fn refresh_snapshot(&self, user_id: Uuid) -> Result<BehaviorSnapshot, StoreError>;
}

#[derive(Default)]
struct SlotState {
    session: Option<FastingSession>,
    loaded: bool,
}

struct UserSlot {
    state: Mutex<SlotState>,
    snapshot: ObservableCell<Option<SessionSnapshot>>,
    signals: ObservableCell<UiSignals>,
}

impl UserSlot {
    fn new() -> Self {
        Self {
            state: Mutex::new(SlotState::default()),
            snapshot: ObservableCell::new(None),
            signals: ObservableCell::new(UiSignals::idle()),
        }
    }

    /// Align UI signals with `session`; callers hold `state`
    fn publish_signals(&self, session: Option<&FastingSession>) {
        let open = session.is_some_and(|s| s.state.is_open());
        self.signals.publish(if open {
            UiSignals::fasting()
        } else {
            UiSignals::idle()
        });
    }
}

/// Owns every user's fasting session.
///
/// Commands for one user are serialized by a per-user async mutex; commands
/// for different users run concurrently. A command is validated against a
/// copy of the current session, persisted with compare-and-set, and only
/// then applied in memory and published. A failed write leaves both the
/// in-memory session and the published snapshot untouched.
pub struct SessionStateMachine {
    store: Arc<dyn SessionStore>,
    activity: Arc<dyn ActivityLogStore>,
    notifier: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    refresher: Option<Arc<dyn SnapshotRefresher>>,
    slots: DashMap<Uuid, Arc<UserSlot>>,
}

impl SessionStateMachine {
    /// Create a state machine over the given stores
    #[must_use]
    pub fn new(
        store: Arc<dyn SessionStore>,
        activity: Arc<dyn ActivityLogStore>,
        notifier: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            activity,
            notifier,
            clock,
            refresher: None,
            slots: DashMap::new(),
        }
    }

    /// Recompute behavior statistics through `refresher` whenever a session ends
    #[must_use]
    pub fn with_refresher(mut self, refresher: Arc<dyn SnapshotRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    fn slot(&self, user_id: Uuid) -> Arc<UserSlot> {
        self.slots
            .entry(user_id)
            .or_insert_with(|| Arc::new(UserSlot::new()))
            .clone()
    }

    /// Load the stored session on first access; returns whether it loaded now
    async fn ensure_loaded(
        &self,
        slot: &UserSlot,
        state: &mut SlotState,
        user_id: Uuid,
    ) -> Result<bool, StoreError> {
        if state.loaded {
            return Ok(false);
        }
        state.session = self.store.load_current(user_id).await?;
        state.loaded = true;
        slot.publish_signals(state.session.as_ref());
        Ok(true)
    }

    /// Validate, persist, then apply one command under the user's lock
    async fn run_command<F>(
        &self,
        user_id: Uuid,
        command: SessionCommand,
        mut transition: F,
    ) -> Result<SessionSnapshot, SessionError>
    where
        F: FnMut(Option<&FastingSession>, DateTime<Utc>) -> Result<FastingSession, SessionError>
            + Send,
    {
        let slot = self.slot(user_id);
        let mut state = slot.state.lock().await;
        self.ensure_loaded(&slot, &mut state, user_id).await?;

        let mut reloaded = false;
        loop {
            let now = self.clock.now();
            let next = transition(state.session.as_ref(), now)?;
            let expected = state.session.as_ref().map_or(0, |s| s.version);

            match self.store.save_current(&next, expected).await {
                Ok(version) => {
                    let mut committed = next;
                    committed.version = version;
                    let snapshot =
                        SessionSnapshot::capture(&committed, now, SnapshotOrigin::Command);
                    state.session = Some(committed);
                    slot.publish_signals(state.session.as_ref());
                    slot.snapshot.publish(Some(snapshot.clone()));
                    CoachLogger::log_session_transition(
                        user_id,
                        snapshot.session.id,
                        command,
                        snapshot.state(),
                        snapshot.progress,
                    );
                    return Ok(snapshot);
                }
                Err(StoreError::VersionConflict { expected, actual }) if !reloaded => {
                    warn!(
                        user.id = %user_id,
                        %command,
                        expected,
                        actual,
                        "session changed underneath command, reloading"
                    );
                    reloaded = true;
                    state.session = self.store.load_current(user_id).await?;
                    slot.publish_signals(state.session.as_ref());
                }
                Err(e) => {
                    warn!(user.id = %user_id, %command, error = %e, "session write failed");
                    return Err(SessionError::Persistence(e));
                }
            }
        }
    }

    /// Begin a fast.
    ///
    /// # Errors
    ///
    /// - `SessionError::Conflict` if a session is already Active or Paused
    /// - `SessionError::InvalidTarget` for an out-of-range custom target
    /// - `SessionError::Persistence` if the write fails
    #[instrument(skip(self, personal_goal), fields(user.id = %user_id))]
    pub async fn start(
        &self,
        user_id: Uuid,
        fasting_type: FastingType,
        personal_goal: Option<String>,
    ) -> Result<SessionSnapshot, SessionError> {
        let snapshot = self
            .run_command(user_id, SessionCommand::Start, |current, now| {
                if let Some(open) = current.filter(|s| s.state.is_open()) {
                    return Err(SessionError::Conflict {
                        user_id,
                        session_id: open.id,
                    });
                }
                fasting_type.validate()?;
                Ok(FastingSession::start(
                    user_id,
                    fasting_type,
                    personal_goal.clone(),
                    now,
                ))
            })
            .await?;

        self.notifier.push(NotificationEvent::SessionStarted {
            user_id,
            session_id: snapshot.session.id,
            fasting_type,
            target_end: snapshot.session.started_at + snapshot.session.target_duration(),
        });
        Ok(snapshot)
    }

    /// Pause the running fast.
    ///
    /// # Errors
    ///
    /// - `SessionError::InvalidTransition` unless the session is Active
    /// - `SessionError::Persistence` if the write fails
    #[instrument(skip(self), fields(user.id = %user_id))]
    pub async fn pause(&self, user_id: Uuid) -> Result<SessionSnapshot, SessionError> {
        let snapshot = self
            .run_command(user_id, SessionCommand::Pause, |current, now| {
                let mut next = existing(current, SessionCommand::Pause)?;
                next.pause_at(now)?;
                Ok(next)
            })
            .await?;
        self.notifier.push(NotificationEvent::SessionPaused {
            user_id,
            session_id: snapshot.session.id,
        });
        Ok(snapshot)
    }

    /// Resume a paused fast.
    ///
    /// # Errors
    ///
    /// - `SessionError::InvalidTransition` unless the session is Paused
    /// - `SessionError::Persistence` if the write fails
    #[instrument(skip(self), fields(user.id = %user_id))]
    pub async fn resume(&self, user_id: Uuid) -> Result<SessionSnapshot, SessionError> {
        let snapshot = self
            .run_command(user_id, SessionCommand::Resume, |current, now| {
                let mut next = existing(current, SessionCommand::Resume)?;
                next.resume_at(now)?;
                Ok(next)
            })
            .await?;
        self.notifier.push(NotificationEvent::SessionResumed {
            user_id,
            session_id: snapshot.session.id,
        });
        Ok(snapshot)
    }

    /// Finish the fast as Completed (`completed = true`) or Abandoned.
    ///
    /// The ended session is appended to the activity log and a statistics
    /// recompute is spawned; neither delays the returned snapshot on failure.
    ///
    /// # Errors
    ///
    /// - `SessionError::InvalidTransition` unless the session is Active or Paused
    /// - `SessionError::Persistence` if the write fails
    #[instrument(skip(self), fields(user.id = %user_id))]
    pub async fn end(&self, user_id: Uuid, completed: bool) -> Result<SessionSnapshot, SessionError> {
        let snapshot = self
            .run_command(user_id, SessionCommand::End, |current, now| {
                let mut next = existing(current, SessionCommand::End)?;
                next.end_at(now, completed)?;
                Ok(next)
            })
            .await?;

        let session_id = snapshot.session.id;
        let elapsed_hours = snapshot.elapsed().num_seconds() as f64 / SECONDS_PER_HOUR as f64;
        self.notifier.push(if completed {
            NotificationEvent::SessionCompleted {
                user_id,
                session_id,
                elapsed_hours,
            }
        } else {
            NotificationEvent::SessionAbandoned {
                user_id,
                session_id,
                elapsed_hours,
            }
        });

        if let Err(e) = self
            .activity
            .append(ActivityRecord::Fasting(snapshot.session.clone()))
            .await
        {
            warn!(
                user.id = %user_id,
                session.id = %session_id,
                error = %e,
                "failed to archive ended session"
            );
        }

        self.spawn_refresh(user_id);
        Ok(snapshot)
    }

    fn spawn_refresh(&self, user_id: Uuid) {
        let Some(refresher) = self.refresher.clone() else {
            return;
        };
        tokio::spawn(async move {
            match refresher.refresh_snapshot(user_id).await {
                Ok(snapshot) => debug!(
                    user.id = %user_id,
                    records = snapshot.record_count,
                    "behavior snapshot refreshed after session end"
                ),
                Err(e) => warn!(
                    user.id = %user_id,
                    error = %e,
                    "behavior snapshot refresh after session end failed"
                ),
            }
        });
    }

    /// Current session for a user, loading it from the store on first access
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Persistence` if the store cannot be read
    pub async fn current(&self, user_id: Uuid) -> Result<Option<SessionSnapshot>, SessionError> {
        let slot = self.slot(user_id);
        let mut state = slot.state.lock().await;
        let first_load = self.ensure_loaded(&slot, &mut state, user_id).await?;

        let now = self.clock.now();
        let snapshot = state
            .session
            .as_ref()
            .map(|s| SessionSnapshot::capture(s, now, SnapshotOrigin::Load));
        if first_load {
            slot.snapshot.publish(snapshot.clone());
        }
        Ok(snapshot)
    }

    /// Recompute the displayed snapshot for the current instant.
    ///
    /// Never touches the store. Returns `None` when nothing has been loaded
    /// for this user yet.
    pub async fn refresh_display(&self, user_id: Uuid) -> Option<SessionSnapshot> {
        let slot = self.slot(user_id);
        let state = slot.state.lock().await;
        let session = state.session.as_ref()?;
        let snapshot = SessionSnapshot::capture(session, self.clock.now(), SnapshotOrigin::Tick);
        slot.snapshot.publish(Some(snapshot.clone()));
        Some(snapshot)
    }

    /// Observe published snapshots for a user
    #[must_use]
    pub fn subscribe(&self, user_id: Uuid) -> watch::Receiver<Option<SessionSnapshot>> {
        self.slot(user_id).snapshot.subscribe()
    }

    /// Current UI signals for a user
    #[must_use]
    pub fn ui_signals(&self, user_id: Uuid) -> UiSignals {
        self.slot(user_id).signals.get()
    }

    /// Observe UI signal changes for a user
    #[must_use]
    pub fn subscribe_signals(&self, user_id: Uuid) -> watch::Receiver<UiSignals> {
        self.slot(user_id).signals.subscribe()
    }

    /// State of the user's session as last seen, without touching the store
    pub async fn observed_state(&self, user_id: Uuid) -> FastingState {
        let slot = self.slot(user_id);
        let state = slot.state.lock().await;
        state
            .session
            .as_ref()
            .map_or(FastingState::Idle, |s| s.state)
    }
}

/// Copy of the current session, or the Idle rejection for `command`
fn existing(
    current: Option<&FastingSession>,
    command: SessionCommand,
) -> Result<FastingSession, SessionError> {
    current.cloned().ok_or(SessionError::InvalidTransition {
        from: FastingState::Idle,
        command,
    })
}
