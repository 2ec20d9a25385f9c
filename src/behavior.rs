// ABOUTME: Staleness-aware cache of per-user behavior snapshots over the activity log
// ABOUTME: Recomputes through PatternAnalyzer and publishes results to observers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use dashmap::DashMap;
use fastwell_intelligence::PatternAnalyzer;
use tokio::sync::{watch, Mutex};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::errors::StoreError;
use crate::fasting::SnapshotRefresher;
use crate::models::BehaviorSnapshot;
use crate::observable::ObservableCell;
use crate::store::{ActivityFilter, ActivityLogStore};

struct BehaviorSlot {
    cell: ObservableCell<Option<BehaviorSnapshot>>,
    recompute: Mutex<()>,
}

/// Owns behavior snapshots and decides when to recompute them
pub struct BehaviorService {
    activity: Arc<dyn ActivityLogStore>,
    analyzer: PatternAnalyzer,
    clock: Arc<dyn Clock>,
    staleness: Duration,
    slots: DashMap<Uuid, Arc<BehaviorSlot>>,
    recomputes: AtomicU64,
}

impl BehaviorService {
    /// Create a service that treats snapshots older than `staleness` as expired
    #[must_use]
    pub fn new(
        activity: Arc<dyn ActivityLogStore>,
        analyzer: PatternAnalyzer,
        clock: Arc<dyn Clock>,
        staleness: Duration,
    ) -> Self {
        Self {
            activity,
            analyzer,
            clock,
            staleness,
            slots: DashMap::new(),
            recomputes: AtomicU64::new(0),
        }
    }

    fn slot(&self, user_id: Uuid) -> Arc<BehaviorSlot> {
        self.slots
            .entry(user_id)
            .or_insert_with(|| {
                Arc::new(BehaviorSlot {
                    cell: ObservableCell::new(None),
                    recompute: Mutex::new(()),
                })
            })
            .clone()
    }

    fn fresh(&self, slot: &BehaviorSlot) -> Option<BehaviorSnapshot> {
        let now = self.clock.now();
        slot.cell
            .get()
            .filter(|snapshot| !snapshot.is_stale(now, self.staleness))
    }

    /// Cached snapshot when fresh, otherwise a recompute.
    ///
    /// Concurrent callers for the same user share one recompute.
    ///
    /// # Errors
    ///
    /// Returns an error if the activity log cannot be read
    #[instrument(skip(self), fields(user.id = %user_id))]
    pub async fn snapshot(&self, user_id: Uuid) -> Result<BehaviorSnapshot, StoreError> {
        let slot = self.slot(user_id);
        if let Some(cached) = self.fresh(&slot) {
            return Ok(cached);
        }
        let _guard = slot.recompute.lock().await;
        if let Some(cached) = self.fresh(&slot) {
            return Ok(cached);
        }
        self.recompute(user_id, &slot).await
    }

    /// Recompute regardless of age
    ///
    /// # Errors
    ///
    /// Returns an error if the activity log cannot be read
    #[instrument(skip(self), fields(user.id = %user_id))]
    pub async fn refresh(&self, user_id: Uuid) -> Result<BehaviorSnapshot, StoreError> {
        let slot = self.slot(user_id);
        let _guard = slot.recompute.lock().await;
        self.recompute(user_id, &slot).await
    }

    async fn recompute(
        &self,
        user_id: Uuid,
        slot: &BehaviorSlot,
    ) -> Result<BehaviorSnapshot, StoreError> {
        let now = self.clock.now();
        let window = &self.analyzer.config().window;
        let filter = ActivityFilter::all()
            .since(now - Duration::days(window.lookback_days))
            .until(now);

        let records = match self
            .activity
            .query(user_id, &filter, Some(window.max_records))
            .await
        {
            Ok(records) => records,
            Err(e) => {
                warn!(user.id = %user_id, error = %e, "behavior recompute failed to read activity log");
                return Err(e);
            }
        };

        let snapshot = self.analyzer.analyze(user_id, &records, now);
        self.recomputes.fetch_add(1, Ordering::Relaxed);
        slot.cell.publish(Some(snapshot.clone()));
        debug!(user.id = %user_id, records = records.len(), "behavior snapshot published");
        Ok(snapshot)
    }

    /// Last published snapshot without triggering a recompute
    #[must_use]
    pub fn cached(&self, user_id: Uuid) -> Option<BehaviorSnapshot> {
        self.slot(user_id).cell.get()
    }

    /// Observe published snapshots for a user
    #[must_use]
    pub fn subscribe(&self, user_id: Uuid) -> watch::Receiver<Option<BehaviorSnapshot>> {
        self.slot(user_id).cell.subscribe()
    }

    /// Recompute in the background; failures are logged and dropped
    pub fn spawn_refresh(self: &Arc<Self>, user_id: Uuid) {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = service.refresh(user_id).await {
                warn!(user.id = %user_id, error = %e, "background behavior refresh failed");
            }
        });
    }

    /// Number of recomputes performed since creation
    #[must_use]
    pub fn recompute_count(&self) -> u64 {
        self.recomputes.load(Ordering::Relaxed)
    }

    /// Maximum snapshot age before a recompute
    #[must_use]
    pub const fn staleness(&self) -> Duration {
        self.staleness
    }

    /// Analyzer used for recomputes
    #[must_use]
    pub const fn analyzer(&self) -> &PatternAnalyzer {
        &self.analyzer
    }
}

#[async_trait]
impl SnapshotRefresher for BehaviorService {
    async fn refresh_snapshot(&self, user_id: Uuid) -> Result<BehaviorSnapshot, StoreError> {
        self.refresh(user_id).await
    }
}
