// ABOUTME: In-memory implementation of every store trait, backed by DashMap and tokio channels
// ABOUTME: Used by the CLI, simulations, and tests; keeps activity logs sorted by timestamp
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::{broadcast, watch};
use tracing::debug;
use uuid::Uuid;

use super::{
    ActivityFilter, ActivityLogStore, AdviceStore, FeedbackStore, ProfileStore, SessionStore,
    StoreResult,
};
use crate::errors::StoreError;
use crate::models::{
    ActivityRecord, AdviceRecord, AdviceStatusUpdate, FastingSession, FeedbackRecord,
    HealthProfile, ProfileUpdate,
};

/// Capacity of the per-user activity feed and the advice feed
const FEED_CAPACITY: usize = 256;

/// Process-local store implementing all persistence traits
pub struct InMemoryStore {
    activity: DashMap<Uuid, Vec<ActivityRecord>>,
    activity_feeds: DashMap<Uuid, broadcast::Sender<ActivityRecord>>,
    profiles: DashMap<Uuid, watch::Sender<Option<HealthProfile>>>,
    sessions: DashMap<Uuid, watch::Sender<Option<FastingSession>>>,
    advice: DashMap<Uuid, AdviceRecord>,
    advice_feed: broadcast::Sender<AdviceRecord>,
    feedback: DashMap<Uuid, Vec<FeedbackRecord>>,
}

impl InMemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        let (advice_feed, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            activity: DashMap::new(),
            activity_feeds: DashMap::new(),
            profiles: DashMap::new(),
            sessions: DashMap::new(),
            advice: DashMap::new(),
            advice_feed,
            feedback: DashMap::new(),
        }
    }

    fn activity_feed(&self, user_id: Uuid) -> broadcast::Sender<ActivityRecord> {
        self.activity_feeds
            .entry(user_id)
            .or_insert_with(|| broadcast::channel(FEED_CAPACITY).0)
            .clone()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActivityLogStore for InMemoryStore {
    async fn append(&self, record: ActivityRecord) -> StoreResult<()> {
        let user_id = record.user_id();
        {
            let mut log = self.activity.entry(user_id).or_default();
            let ts = record.timestamp();
            let idx = log.partition_point(|existing| existing.timestamp() <= ts);
            log.insert(idx, record.clone());
        }
        // Nobody listening is fine
        let _ = self.activity_feed(user_id).send(record);
        Ok(())
    }

    async fn query(
        &self,
        user_id: Uuid,
        filter: &ActivityFilter,
        limit: Option<usize>,
    ) -> StoreResult<Vec<ActivityRecord>> {
        let Some(log) = self.activity.get(&user_id) else {
            return Ok(Vec::new());
        };
        let mut matched: Vec<ActivityRecord> =
            log.iter().filter(|r| filter.matches(r)).cloned().collect();
        if let Some(limit) = limit {
            let skip = matched.len().saturating_sub(limit);
            matched.drain(..skip);
        }
        Ok(matched)
    }

    fn subscribe(&self, user_id: Uuid) -> broadcast::Receiver<ActivityRecord> {
        self.activity_feed(user_id).subscribe()
    }
}

#[async_trait]
impl ProfileStore for InMemoryStore {
    async fn get(&self, user_id: Uuid) -> StoreResult<Option<HealthProfile>> {
        Ok(self
            .profiles
            .get(&user_id)
            .and_then(|tx| tx.borrow().clone()))
    }

    async fn save(&self, profile: HealthProfile) -> StoreResult<()> {
        let user_id = profile.user_id;
        self.profiles
            .entry(user_id)
            .or_insert_with(|| watch::channel(None).0)
            .send_replace(Some(profile));
        Ok(())
    }

    async fn merge(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
        at: DateTime<Utc>,
    ) -> StoreResult<HealthProfile> {
        let tx = self
            .profiles
            .get(&user_id)
            .ok_or_else(|| StoreError::not_found("profile", user_id))?;
        let mut pending = Some(update);
        let mut merged = None;
        tx.send_if_modified(|slot| match (slot.as_mut(), pending.take()) {
            (Some(profile), Some(update)) => {
                profile.apply(update, at);
                merged = Some(profile.clone());
                true
            }
            _ => false,
        });
        merged.ok_or_else(|| StoreError::not_found("profile", user_id))
    }

    fn subscribe(&self, user_id: Uuid) -> watch::Receiver<Option<HealthProfile>> {
        self.profiles
            .entry(user_id)
            .or_insert_with(|| watch::channel(None).0)
            .subscribe()
    }

    async fn list_user_ids(&self) -> StoreResult<Vec<Uuid>> {
        let mut ids: Vec<Uuid> = self
            .profiles
            .iter()
            .filter(|entry| entry.value().borrow().is_some())
            .map(|entry| *entry.key())
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn load_current(&self, user_id: Uuid) -> StoreResult<Option<FastingSession>> {
        Ok(self
            .sessions
            .get(&user_id)
            .and_then(|tx| tx.borrow().clone()))
    }

    async fn save_current(
        &self,
        session: &FastingSession,
        expected_version: u64,
    ) -> StoreResult<u64> {
        let tx = self
            .sessions
            .entry(session.user_id)
            .or_insert_with(|| watch::channel(None).0);
        let mut outcome = Ok(expected_version + 1);
        tx.send_if_modified(|slot| {
            let actual = slot.as_ref().map_or(0, |stored| stored.version);
            if actual != expected_version {
                outcome = Err(StoreError::VersionConflict {
                    expected: expected_version,
                    actual,
                });
                return false;
            }
            let mut stored = session.clone();
            stored.version = expected_version + 1;
            *slot = Some(stored);
            true
        });
        if let Err(ref e) = outcome {
            debug!(user.id = %session.user_id, error = %e, "session compare-and-set rejected");
        }
        outcome
    }

    fn subscribe(&self, user_id: Uuid) -> watch::Receiver<Option<FastingSession>> {
        self.sessions
            .entry(user_id)
            .or_insert_with(|| watch::channel(None).0)
            .subscribe()
    }
}

#[async_trait]
impl AdviceStore for InMemoryStore {
    async fn insert(&self, record: AdviceRecord) -> StoreResult<()> {
        self.advice.insert(record.id(), record.clone());
        let _ = self.advice_feed.send(record);
        Ok(())
    }

    async fn get(&self, advice_id: Uuid) -> StoreResult<Option<AdviceRecord>> {
        Ok(self.advice.get(&advice_id).map(|r| r.value().clone()))
    }

    async fn list_for_user(&self, user_id: Uuid, limit: usize) -> StoreResult<Vec<AdviceRecord>> {
        let mut records: Vec<AdviceRecord> = self
            .advice
            .iter()
            .filter(|entry| entry.value().user_id() == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        records.truncate(limit);
        Ok(records)
    }

    async fn update_status(
        &self,
        advice_id: Uuid,
        update: AdviceStatusUpdate,
    ) -> StoreResult<AdviceRecord> {
        let updated = {
            let mut entry = self
                .advice
                .get_mut(&advice_id)
                .ok_or_else(|| StoreError::not_found("advice", advice_id))?;
            entry.apply_status(update);
            entry.value().clone()
        };
        let _ = self.advice_feed.send(updated.clone());
        Ok(updated)
    }

    fn subscribe(&self) -> broadcast::Receiver<AdviceRecord> {
        self.advice_feed.subscribe()
    }
}

#[async_trait]
impl FeedbackStore for InMemoryStore {
    async fn append(&self, record: FeedbackRecord) -> StoreResult<()> {
        self.feedback.entry(record.user_id).or_default().push(record);
        Ok(())
    }

    async fn recent_for_user(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> StoreResult<Vec<FeedbackRecord>> {
        let Some(history) = self.feedback.get(&user_id) else {
            return Ok(Vec::new());
        };
        let skip = history.len().saturating_sub(limit);
        Ok(history[skip..].to_vec())
    }

    async fn for_advice(&self, advice_id: Uuid) -> StoreResult<Vec<FeedbackRecord>> {
        let mut matched: Vec<FeedbackRecord> = self
            .feedback
            .iter()
            .flat_map(|entry| {
                entry
                    .value()
                    .iter()
                    .filter(|r| r.advice_id == advice_id)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect();
        matched.sort_by_key(|r| r.created_at);
        Ok(matched)
    }
}
