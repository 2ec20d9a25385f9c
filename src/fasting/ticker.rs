// ABOUTME: Background task that refreshes a user's displayed session on a fixed period
// ABOUTME: Cancelled through a shutdown channel or immediately on drop
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, trace};
use uuid::Uuid;

use super::machine::SessionStateMachine;

/// Periodic display refresh for one user's session
pub struct SessionTicker {
    user_id: Uuid,
    shutdown_tx: mpsc::Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl SessionTicker {
    /// Start ticking every `period`.
    ///
    /// Each tick calls `refresh_display`, which never touches the store.
    /// Missed ticks are skipped rather than replayed.
    #[must_use]
    pub fn spawn(machine: Arc<SessionStateMachine>, user_id: Uuid, period: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let period = period.max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            let mut ticks = interval(period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticks.tick() => {
                        let refreshed = machine.refresh_display(user_id).await;
                        trace!(user.id = %user_id, refreshed = refreshed.is_some(), "session tick");
                    }
                    _ = shutdown_rx.recv() => {
                        debug!(user.id = %user_id, "session ticker received shutdown signal");
                        break;
                    }
                }
            }
        });

        Self {
            user_id,
            shutdown_tx,
            handle: Some(handle),
        }
    }

    /// User this ticker refreshes
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// Whether the background task has exited
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Stop ticking and wait for the task to exit
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.try_send(());
        if let Some(handle) = self.handle.take() {
            handle.abort();
            let _ = handle.await;
        }
    }
}

impl Drop for SessionTicker {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown_tx.try_send(()) {
            debug!(error = ?e, "ticker shutdown signal send failed (task likely stopped)");
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
