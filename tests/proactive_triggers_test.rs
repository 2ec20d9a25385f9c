// ABOUTME: Integration tests for proactive trigger rules and scheduling
// ABOUTME: Rule evaluation order, generated advice, whole-user passes, app-open checks, and the schedule
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::time::Duration as StdDuration;

use chrono::Duration;
use common::{fast, meal, t0, Harness};
use fastwell::config::CoachConfig;
use fastwell::models::{AdviceType, BehaviorSnapshot, HealthGoal, HealthProfile, TriggerKind};
use fastwell::notifications::NotificationEvent;
use fastwell::store::{ActivityLogStore, AdviceStore, ProfileStore};
use tokio::time::sleep;
use uuid::Uuid;

/// One lunch a day at 12:00 for the last `days` days
async fn seed_regular_meals(h: &Harness, user: Uuid, days: i64) {
    for day in 1..=days {
        let at = t0() - Duration::days(day) + Duration::hours(6);
        ActivityLogStore::append(&*h.store, meal(user, at)).await.unwrap();
    }
}

async fn snapshot_for(h: &Harness, user: Uuid) -> BehaviorSnapshot {
    h.services.behavior().refresh(user).await.unwrap()
}

#[tokio::test]
async fn test_regular_user_fires_nothing() {
    let h = Harness::new();
    let user = Uuid::new_v4();
    let profile = HealthProfile::new(user, t0()).with_goals(vec![HealthGoal::BetterSleep]);
    seed_regular_meals(&h, user, 5).await;

    let snapshot = snapshot_for(&h, user).await;
    let fired = h.services.triggers().evaluate(&profile, &snapshot, t0());
    assert!(fired.is_empty(), "unexpected triggers: {fired:?}");
}

#[tokio::test]
async fn test_rules_fire_in_order() {
    let h = Harness::new();
    let user = Uuid::new_v4();
    let profile = HealthProfile::new(user, t0())
        .with_goals(vec![HealthGoal::WeightLoss])
        .with_conditions(vec!["Type 2 Diabetes".to_owned(), "seasonal allergies".to_owned()]);

    let snapshot = snapshot_for(&h, user).await;
    let fired = h.services.triggers().evaluate(&profile, &snapshot, t0());
    assert_eq!(
        fired,
        vec![
            TriggerKind::MealLoggingGap,
            TriggerKind::WeightLossMotivation,
            TriggerKind::ChronicConditionReminder,
        ]
    );
}

#[tokio::test]
async fn test_meal_gap_counts_from_last_meal() {
    let h = Harness::new();
    let user = Uuid::new_v4();
    let profile = HealthProfile::new(user, t0());
    ActivityLogStore::append(&*h.store, meal(user, t0() - Duration::days(2)))
        .await
        .unwrap();
    let second = t0() - Duration::days(2) + Duration::minutes(30);
    ActivityLogStore::append(&*h.store, meal(user, second))
        .await
        .unwrap();
    let snapshot = snapshot_for(&h, user).await;
    let engine = h.services.triggers();

    assert!(engine.evaluate(&profile, &snapshot, t0()).is_empty());
    let later = t0() + Duration::days(2);
    assert_eq!(
        engine.evaluate(&profile, &snapshot, later),
        vec![TriggerKind::MealLoggingGap]
    );
}

#[tokio::test]
async fn test_low_success_needs_enough_terminal_sessions() {
    let h = Harness::new();
    let user = Uuid::new_v4();
    let profile = HealthProfile::new(user, t0());
    seed_regular_meals(&h, user, 4).await;
    ActivityLogStore::append(&*h.store, fast(user, t0() - Duration::days(3), 5, false))
        .await
        .unwrap();
    ActivityLogStore::append(&*h.store, fast(user, t0() - Duration::days(2), 4, false))
        .await
        .unwrap();
    let engine = h.services.triggers();

    let snapshot = snapshot_for(&h, user).await;
    assert!(engine.evaluate(&profile, &snapshot, t0()).is_empty());

    ActivityLogStore::append(&*h.store, fast(user, t0() - Duration::days(1), 16, true))
        .await
        .unwrap();
    let snapshot = snapshot_for(&h, user).await;
    assert_eq!(
        engine.evaluate(&profile, &snapshot, t0()),
        vec![TriggerKind::LowFastingSuccess]
    );
}

#[tokio::test]
async fn test_irregular_meal_timing() {
    let h = Harness::new();
    let user = Uuid::new_v4();
    let profile = HealthProfile::new(user, t0());
    // Alternating 01:00 and 23:00 meals
    for (day, offset) in (1_i64..).zip([-5, 17, -5, 17]) {
        ActivityLogStore::append(
            &*h.store,
            meal(user, t0() - Duration::days(day) + Duration::hours(offset)),
        )
        .await
        .unwrap();
    }

    let snapshot = snapshot_for(&h, user).await;
    assert!(snapshot.meal_consistency().unwrap() < 0.6);
    assert_eq!(
        h.services.triggers().evaluate(&profile, &snapshot, t0()),
        vec![TriggerKind::IrregularMealTiming]
    );
}

#[tokio::test]
async fn test_thresholds_come_from_config() {
    let mut config = CoachConfig::default();
    config.triggers.meal_gap_days = 10;
    let h = Harness::with_config(config);
    let user = Uuid::new_v4();
    ActivityLogStore::append(&*h.store, meal(user, t0() - Duration::days(5)))
        .await
        .unwrap();

    let engine = h.services.triggers();
    assert_eq!(engine.thresholds().meal_gap_days, 10);
    let snapshot = snapshot_for(&h, user).await;
    assert!(engine
        .evaluate(&HealthProfile::new(user, t0()), &snapshot, t0())
        .is_empty());
}

#[tokio::test]
async fn test_run_for_user_generates_proactive_advice() {
    let h = Harness::new();
    let user = Uuid::new_v4();
    ProfileStore::save(
        &*h.store,
        HealthProfile::new(user, t0()).with_goals(vec![HealthGoal::WeightLoss]),
    )
    .await
    .unwrap();
    let mut events = h.services.notifications().subscribe();

    let outcome = h.services.triggers().on_app_open(user).await;
    assert_eq!(
        outcome.fired,
        vec![TriggerKind::MealLoggingGap, TriggerKind::WeightLossMotivation]
    );
    assert_eq!(outcome.advice_ids.len(), 2);

    let gap_advice = AdviceStore::get(&*h.store, outcome.advice_ids[0])
        .await
        .unwrap()
        .unwrap();
    assert!(gap_advice.is_proactive());
    assert_eq!(gap_advice.trigger(), Some(TriggerKind::MealLoggingGap));
    assert_eq!(gap_advice.advice_type(), AdviceType::Nutrition);

    let motivation = AdviceStore::get(&*h.store, outcome.advice_ids[1])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(motivation.advice_type(), AdviceType::Motivation);

    for expected in &outcome.advice_ids {
        match events.try_recv().unwrap() {
            NotificationEvent::AdviceReady {
                user_id, advice_id, ..
            } => {
                assert_eq!(user_id, user);
                assert_eq!(advice_id, *expected);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_pass_covers_every_profile() {
    let h = Harness::new();
    let quiet = Uuid::new_v4();
    let lapsed = Uuid::new_v4();
    ProfileStore::save(&*h.store, HealthProfile::new(quiet, t0()))
        .await
        .unwrap();
    ProfileStore::save(
        &*h.store,
        HealthProfile::new(lapsed, t0()).with_conditions(vec!["Hypertension".to_owned()]),
    )
    .await
    .unwrap();
    seed_regular_meals(&h, quiet, 5).await;

    let mut outcomes = h.services.triggers().run_pass().await;
    outcomes.sort_by_key(|o| o.user_id == lapsed);
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].user_id, quiet);
    assert!(outcomes[0].fired.is_empty());
    assert_eq!(outcomes[1].user_id, lapsed);
    assert_eq!(
        outcomes[1].fired,
        vec![
            TriggerKind::MealLoggingGap,
            TriggerKind::ChronicConditionReminder
        ]
    );

    let stored = AdviceStore::list_for_user(&*h.store, lapsed, 10)
        .await
        .unwrap();
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|r| r.is_proactive()));
    assert!(AdviceStore::list_for_user(&*h.store, quiet, 10)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_schedule_runs_passes_until_shutdown() {
    let h = Harness::new();
    let user = Uuid::new_v4();
    ProfileStore::save(&*h.store, HealthProfile::new(user, t0()))
        .await
        .unwrap();

    let handle = h
        .services
        .triggers()
        .spawn_schedule(StdDuration::from_secs(60));
    sleep(StdDuration::from_secs(30)).await;
    assert!(AdviceStore::list_for_user(&*h.store, user, 10)
        .await
        .unwrap()
        .is_empty());

    sleep(StdDuration::from_secs(45)).await;
    assert!(!handle.is_finished());
    let stored = AdviceStore::list_for_user(&*h.store, user, 10)
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].trigger(), Some(TriggerKind::MealLoggingGap));

    handle.shutdown().await;
    sleep(StdDuration::from_secs(600)).await;
    assert_eq!(
        AdviceStore::list_for_user(&*h.store, user, 10)
            .await
            .unwrap()
            .len(),
        1
    );
}
