// ABOUTME: Integration tests for retrieval-augmented advice generation
// ABOUTME: Happy path, degraded fallbacks for down or slow backends, context capture, and notifications
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use chrono::Duration;
use common::{
    meal, t0, DownBackend, DownRetriever, FixedBackend, Harness, StalledBackend, GOOD_RESPONSE,
};
use fastwell::advice::AdviceRequest;
use fastwell::constants::scores::{
    CANNED_ADVICE_CONFIDENCE, DEGRADED_CONFIDENCE_CEILING, PARSE_FALLBACK_CONFIDENCE,
};
use fastwell::context::CoachServices;
use fastwell::llm::TextGenerationBackend;
use fastwell::models::{
    AdviceCategory, AdvicePriority, AdviceType, FastingType, HealthGoal, HealthProfile,
    TriggerKind,
};
use fastwell::notifications::NotificationEvent;
use fastwell::store::{ActivityLogStore, AdviceStore, ProfileStore};
use uuid::Uuid;

async fn seed_profile(h: &Harness, goals: Vec<HealthGoal>) -> Uuid {
    let user = Uuid::new_v4();
    let profile = HealthProfile::new(user, t0())
        .with_age(41)
        .with_goals(goals);
    ProfileStore::save(&*h.store, profile).await.unwrap();
    user
}

#[tokio::test]
async fn test_generated_advice_is_grounded_and_persisted() {
    let backend = Arc::new(FixedBackend::new(GOOD_RESPONSE));
    let h = Harness::with(CoachServices::builder().backend(backend.clone()));
    let user = seed_profile(&h, vec![HealthGoal::MuscleGain]).await;

    let record = h
        .services
        .generator()
        .generate(
            AdviceRequest::for_user(user)
                .with_query("How much protein should my first meal have?"),
        )
        .await;

    assert!(!record.is_degraded());
    assert_eq!(record.advice_type(), AdviceType::Nutrition);
    assert_eq!(record.category(), AdviceCategory::Tip);
    assert_eq!(record.priority(), AdvicePriority::High);
    assert!((record.confidence() - 0.82).abs() < 1e-9);
    assert_eq!(record.body().title, "Front-load protein after your fast");
    assert!(record.body().tags.contains(&"nutrition".to_owned()));
    assert!(!record.rag_sources().is_empty());
    assert!(!record.is_proactive());
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);

    let stored = AdviceStore::get(&*h.store, record.id()).await.unwrap();
    assert_eq!(stored, Some(record));
}

#[tokio::test]
async fn test_unavailable_backend_yields_canned_advice() {
    let h = Harness::with(CoachServices::builder().backend(Arc::new(DownBackend)));
    let user = seed_profile(&h, vec![HealthGoal::WeightLoss]).await;

    let record = h
        .services
        .generator()
        .generate(AdviceRequest::for_user(user).with_type(AdviceType::Fasting))
        .await;

    assert!(record.is_degraded());
    assert_eq!(record.advice_type(), AdviceType::Fasting);
    assert_eq!(record.priority(), AdvicePriority::Low);
    assert!((record.confidence() - CANNED_ADVICE_CONFIDENCE).abs() < 1e-9);
    assert!(!record.body().title.is_empty());
    assert!(!record.body().suggested_actions.is_empty());
    assert!(AdviceStore::get(&*h.store, record.id())
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_retrieval_outage_skips_generation() {
    let backend = Arc::new(FixedBackend::new(GOOD_RESPONSE));
    let h = Harness::with(
        CoachServices::builder()
            .backend(backend.clone())
            .retriever(Arc::new(DownRetriever)),
    );
    let user = seed_profile(&h, Vec::new()).await;

    let record = h
        .services
        .generator()
        .generate(AdviceRequest::for_user(user).with_type(AdviceType::Sleep))
        .await;

    assert!(record.is_degraded());
    assert!(record.rag_sources().is_empty());
    assert!((record.confidence() - CANNED_ADVICE_CONFIDENCE).abs() < 1e-9);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_stalled_backend_times_out_into_canned_advice() {
    let h = Harness::with(CoachServices::builder().backend(Arc::new(StalledBackend)));
    let user = seed_profile(&h, Vec::new()).await;

    let record = h
        .services
        .generator()
        .generate(AdviceRequest::for_user(user).with_type(AdviceType::Exercise))
        .await;

    assert!(record.is_degraded());
    assert!((record.confidence() - CANNED_ADVICE_CONFIDENCE).abs() < 1e-9);
}

#[tokio::test]
async fn test_unparseable_response_yields_safe_default() {
    let h = Harness::with(
        CoachServices::builder().backend(Arc::new(FixedBackend::new(
            "Sure! Here are some thoughts about fasting without any JSON.",
        ))),
    );
    let user = seed_profile(&h, Vec::new()).await;

    let record = h
        .services
        .generator()
        .generate(AdviceRequest::for_user(user).with_type(AdviceType::Motivation))
        .await;

    assert!(record.is_degraded());
    assert!((record.confidence() - PARSE_FALLBACK_CONFIDENCE).abs() < 1e-9);
    assert_eq!(record.priority(), AdvicePriority::Low);
}

#[tokio::test]
async fn test_degraded_confidence_stays_under_ceiling() {
    let backends: Vec<Arc<dyn TextGenerationBackend>> = vec![
        Arc::new(DownBackend),
        Arc::new(FixedBackend::new("{ not json")),
        Arc::new(FixedBackend::new(r#"{"title": "", "content": ""}"#)),
    ];
    for backend in backends {
        let h = Harness::with(CoachServices::builder().backend(backend));
        let user = seed_profile(&h, Vec::new()).await;
        for advice_type in AdviceType::ALL {
            let record = h
                .services
                .generator()
                .generate(AdviceRequest::for_user(user).with_type(advice_type))
                .await;
            assert!(record.is_degraded());
            assert!(record.confidence() <= DEGRADED_CONFIDENCE_CEILING);
        }
    }
}

#[tokio::test]
async fn test_missing_profile_still_produces_advice() {
    let h = Harness::new();
    let record = h
        .services
        .generator()
        .generate(AdviceRequest::for_user(Uuid::new_v4()))
        .await;

    assert!(!record.is_degraded());
    assert_eq!(record.advice_type(), AdviceType::Fasting);
    assert!(record.context().profile.goals.is_empty());
}

#[tokio::test]
async fn test_context_captures_open_session_and_behavior() {
    let h = Harness::new();
    let user = seed_profile(&h, vec![HealthGoal::WeightLoss]).await;
    for day in 1..=3 {
        ActivityLogStore::append(&*h.store, meal(user, t0() - Duration::days(day)))
            .await
            .unwrap();
    }
    h.services
        .sessions()
        .start(user, FastingType::SixteenEight, None)
        .await
        .unwrap();
    h.clock.advance(Duration::hours(3));

    let record = h
        .services
        .generator()
        .generate(AdviceRequest::for_user(user).with_query("I'm hungry, any tips?"))
        .await;

    let context = record.context();
    let session = context.session.as_ref().expect("open session captured");
    assert!((session.elapsed_hours - 3.0).abs() < 1e-9);
    let behavior = context.behavior.as_ref().expect("behavior captured");
    assert!((behavior.meals_per_day.unwrap() - 1.0).abs() < 1e-9);
    assert_eq!(context.captured_at, t0() + Duration::hours(3));
}

#[tokio::test]
async fn test_context_omits_ended_session() {
    let h = Harness::new();
    let user = seed_profile(&h, Vec::new()).await;
    let sessions = h.services.sessions();
    sessions
        .start(user, FastingType::TwelveTwelve, None)
        .await
        .unwrap();
    h.clock.advance(Duration::hours(12));
    sessions.end(user, true).await.unwrap();

    let record = h
        .services
        .generator()
        .generate(AdviceRequest::for_user(user))
        .await;
    assert!(record.context().session.is_none());
}

#[tokio::test]
async fn test_proactive_advice_is_announced() {
    let h = Harness::new();
    let mut events = h.services.notifications().subscribe();
    let user = seed_profile(&h, vec![HealthGoal::WeightLoss]).await;

    let record = h
        .services
        .generator()
        .generate(AdviceRequest::for_user(user).triggered_by(TriggerKind::WeightLossMotivation))
        .await;

    assert!(record.is_proactive());
    assert_eq!(record.trigger(), Some(TriggerKind::WeightLossMotivation));
    assert_eq!(record.advice_type(), AdviceType::Motivation);
    match events.recv().await.unwrap() {
        NotificationEvent::AdviceReady {
            advice_id, trigger, ..
        } => {
            assert_eq!(advice_id, record.id());
            assert_eq!(trigger, Some(TriggerKind::WeightLossMotivation));
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn test_requested_advice_is_not_announced() {
    let h = Harness::new();
    let mut events = h.services.notifications().subscribe();
    let user = seed_profile(&h, Vec::new()).await;

    h.services
        .generator()
        .generate(AdviceRequest::for_user(user).with_type(AdviceType::Sleep))
        .await;
    assert!(events.try_recv().is_err());
}
