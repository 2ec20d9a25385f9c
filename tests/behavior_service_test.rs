// ABOUTME: Integration tests for the behavior snapshot cache
// ABOUTME: Staleness, forced refresh, shared recomputes, session-end refresh, and read failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::Duration;
use common::{fast, meal, t0, Harness};
use fastwell::behavior::BehaviorService;
use fastwell::clock::ManualClock;
use fastwell::errors::StoreError;
use fastwell::intelligence::PatternAnalyzer;
use fastwell::models::{ActivityRecord, FastingType};
use fastwell::store::{ActivityFilter, ActivityLogStore};
use futures_util::future::join_all;
use tokio::sync::broadcast;
use tokio::time::timeout;
use uuid::Uuid;

#[tokio::test]
async fn test_fresh_snapshot_is_served_from_cache() {
    let h = Harness::new();
    let behavior = h.services.behavior();
    let user = Uuid::new_v4();
    ActivityLogStore::append(&*h.store, meal(user, t0() - Duration::hours(3)))
        .await
        .unwrap();

    let first = behavior.snapshot(user).await.unwrap();
    h.clock.advance(Duration::minutes(20));
    let second = behavior.snapshot(user).await.unwrap();

    assert_eq!(behavior.recompute_count(), 1);
    assert_eq!(first, second);
    assert_eq!(second.computed_at, t0());
}

#[tokio::test]
async fn test_stale_snapshot_is_recomputed() {
    let h = Harness::new();
    let behavior = h.services.behavior();
    let user = Uuid::new_v4();

    behavior.snapshot(user).await.unwrap();
    ActivityLogStore::append(&*h.store, meal(user, t0() + Duration::minutes(30)))
        .await
        .unwrap();
    h.clock.advance(Duration::hours(1));

    let snapshot = behavior.snapshot(user).await.unwrap();
    assert_eq!(behavior.recompute_count(), 2);
    assert_eq!(snapshot.record_count, 1);
    assert_eq!(snapshot.computed_at, t0() + Duration::hours(1));
}

#[tokio::test]
async fn test_refresh_ignores_staleness() {
    let h = Harness::new();
    let behavior = h.services.behavior();
    let user = Uuid::new_v4();

    behavior.snapshot(user).await.unwrap();
    ActivityLogStore::append(&*h.store, meal(user, t0() - Duration::hours(1)))
        .await
        .unwrap();
    let refreshed = behavior.refresh(user).await.unwrap();

    assert_eq!(behavior.recompute_count(), 2);
    assert_eq!(refreshed.record_count, 1);
    assert_eq!(behavior.cached(user), Some(refreshed));
}

#[tokio::test]
async fn test_concurrent_callers_share_one_recompute() {
    let h = Harness::new();
    let behavior = Arc::clone(h.services.behavior());
    let user = Uuid::new_v4();
    for day in 1..=10 {
        ActivityLogStore::append(&*h.store, meal(user, t0() - Duration::days(day)))
            .await
            .unwrap();
    }

    let calls = (0..8).map(|_| {
        let behavior = Arc::clone(&behavior);
        async move { behavior.snapshot(user).await }
    });
    let results = join_all(calls).await;

    assert!(results.iter().all(Result::is_ok));
    assert_eq!(behavior.recompute_count(), 1);
}

#[tokio::test]
async fn test_session_end_refreshes_snapshot() {
    let h = Harness::new();
    let user = Uuid::new_v4();
    ActivityLogStore::append(&*h.store, fast(user, t0() - Duration::days(2), 16, true))
        .await
        .unwrap();
    h.services.behavior().snapshot(user).await.unwrap();
    let mut rx = h.services.behavior().subscribe(user);
    rx.borrow_and_update();

    let sessions = h.services.sessions();
    sessions
        .start(user, FastingType::SixteenEight, None)
        .await
        .unwrap();
    h.clock.advance(Duration::hours(4));
    sessions.end(user, false).await.unwrap();

    timeout(StdDuration::from_secs(5), rx.changed())
        .await
        .expect("refresh after session end")
        .unwrap();
    let snapshot = rx.borrow().clone().unwrap();
    let fasting = snapshot.fasting_patterns.unwrap();
    assert_eq!(fasting.completed_count, 1);
    assert_eq!(fasting.abandoned_count, 1);
}

struct BrokenActivityLog;

#[async_trait]
impl ActivityLogStore for BrokenActivityLog {
    async fn append(&self, _record: ActivityRecord) -> Result<(), StoreError> {
        Ok(())
    }

    async fn query(
        &self,
        _user_id: Uuid,
        _filter: &ActivityFilter,
        _limit: Option<usize>,
    ) -> Result<Vec<ActivityRecord>, StoreError> {
        Err(StoreError::Backend("replica lagging".to_owned()))
    }

    fn subscribe(&self, _user_id: Uuid) -> broadcast::Receiver<ActivityRecord> {
        broadcast::channel(1).1
    }
}

#[tokio::test]
async fn test_read_failure_is_returned_and_nothing_is_cached() {
    common::init_test_logging();
    let service = BehaviorService::new(
        Arc::new(BrokenActivityLog),
        PatternAnalyzer::default(),
        Arc::new(ManualClock::new(t0())),
        Duration::hours(1),
    );
    let user = Uuid::new_v4();

    let err = service.snapshot(user).await.unwrap_err();
    assert!(matches!(err, StoreError::Backend(_)));
    assert!(service.cached(user).is_none());
    assert_eq!(service.recompute_count(), 0);
}
