// ABOUTME: Persistence seams for activity logs, profiles, sessions, advice, and feedback
// ABOUTME: Async store traits plus the shared in-memory implementation used by the engine
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

//! # Store Traits
//!
//! Every stateful component talks to persistence through one of these traits.
//! Each call is a suspension point. Implementations must be safe to share
//! across tasks; the engine holds them as `Arc<dyn Trait>`.

mod memory;

pub use memory::InMemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, watch};
use uuid::Uuid;

use crate::errors::StoreError;
use crate::models::{
    ActivityKind, ActivityRecord, AdviceRecord, AdviceStatusUpdate, FastingSession,
    FeedbackRecord, HealthProfile, ProfileUpdate,
};

/// Result alias for store calls
pub type StoreResult<T> = Result<T, StoreError>;

/// Narrows an activity log query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityFilter {
    /// Only these kinds; empty means all kinds
    pub kinds: Vec<ActivityKind>,
    /// Inclusive lower bound on the record timestamp
    pub since: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the record timestamp
    pub until: Option<DateTime<Utc>>,
}

impl ActivityFilter {
    /// Filter that matches every record
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to a single kind
    #[must_use]
    pub fn kind(mut self, kind: ActivityKind) -> Self {
        self.kinds.push(kind);
        self
    }

    /// Restrict to records at or after `since`
    #[must_use]
    pub const fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    /// Restrict to records at or before `until`
    #[must_use]
    pub const fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    /// Whether a record passes this filter
    #[must_use]
    pub fn matches(&self, record: &ActivityRecord) -> bool {
        let ts = record.timestamp();
        (self.kinds.is_empty() || self.kinds.contains(&record.kind()))
            && self.since.is_none_or(|since| ts >= since)
            && self.until.is_none_or(|until| ts <= until)
    }
}

/// Append-only log of meals, fasts, workouts, and sleep
#[async_trait]
pub trait ActivityLogStore: Send + Sync {
    /// Append a record to its owner's log
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write
    async fn append(&self, record: ActivityRecord) -> StoreResult<()>;

    /// Records for a user in chronological order.
    ///
    /// With a `limit`, only the most recent `limit` matching records are
    /// returned, still oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read
    async fn query(
        &self,
        user_id: Uuid,
        filter: &ActivityFilter,
        limit: Option<usize>,
    ) -> StoreResult<Vec<ActivityRecord>>;

    /// Live feed of records appended for a user after this call
    fn subscribe(&self, user_id: Uuid) -> broadcast::Receiver<ActivityRecord>;
}

/// Health profiles keyed by user
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Load a profile
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read
    async fn get(&self, user_id: Uuid) -> StoreResult<Option<HealthProfile>>;

    /// Insert or replace a profile
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write
    async fn save(&self, profile: HealthProfile) -> StoreResult<()>;

    /// Apply a partial update atomically and return the merged profile
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` when the user has no profile
    async fn merge(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
        at: DateTime<Utc>,
    ) -> StoreResult<HealthProfile>;

    /// Observe a user's profile
    fn subscribe(&self, user_id: Uuid) -> watch::Receiver<Option<HealthProfile>>;

    /// Every user with a stored profile
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read
    async fn list_user_ids(&self) -> StoreResult<Vec<Uuid>>;
}

/// Current fasting session per user with optimistic concurrency
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the user's most recent session
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read
    async fn load_current(&self, user_id: Uuid) -> StoreResult<Option<FastingSession>>;

    /// Compare-and-set write.
    ///
    /// Succeeds only when the stored version equals `expected_version`
    /// (0 when nothing is stored yet) and returns the new version.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::VersionConflict` when another writer got there first
    async fn save_current(&self, session: &FastingSession, expected_version: u64)
        -> StoreResult<u64>;

    /// Observe the persisted session for a user
    fn subscribe(&self, user_id: Uuid) -> watch::Receiver<Option<FastingSession>>;
}

/// Generated advice records
#[async_trait]
pub trait AdviceStore: Send + Sync {
    /// Persist a new record
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write
    async fn insert(&self, record: AdviceRecord) -> StoreResult<()>;

    /// Fetch one record
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read
    async fn get(&self, advice_id: Uuid) -> StoreResult<Option<AdviceRecord>>;

    /// A user's advice, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read
    async fn list_for_user(&self, user_id: Uuid, limit: usize) -> StoreResult<Vec<AdviceRecord>>;

    /// Apply a status change and return the updated record
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` when the record does not exist
    async fn update_status(
        &self,
        advice_id: Uuid,
        update: AdviceStatusUpdate,
    ) -> StoreResult<AdviceRecord>;

    /// Feed of inserted and updated records
    fn subscribe(&self) -> broadcast::Receiver<AdviceRecord>;
}

/// Append-only feedback history
#[async_trait]
pub trait FeedbackStore: Send + Sync {
    /// Append one rating
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write
    async fn append(&self, record: FeedbackRecord) -> StoreResult<()>;

    /// The user's most recent `limit` ratings, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read
    async fn recent_for_user(&self, user_id: Uuid, limit: usize)
        -> StoreResult<Vec<FeedbackRecord>>;

    /// Every rating left on one advice record, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read
    async fn for_advice(&self, advice_id: Uuid) -> StoreResult<Vec<FeedbackRecord>>;
}
