// ABOUTME: Integration tests for advice feedback and personalization
// ABOUTME: Rating validation, last-write-wins status, history, insights, and their effect on new advice
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use chrono::Duration;
use common::{t0, Harness};
use fastwell::advice::AdviceRequest;
use fastwell::errors::FeedbackError;
use fastwell::models::{AdviceRecord, AdviceStatusUpdate, AdviceType, HealthGoal, HealthProfile};
use fastwell::store::{AdviceStore, ProfileStore};
use uuid::Uuid;

async fn advice_for(h: &Harness, user: Uuid, advice_type: AdviceType) -> AdviceRecord {
    h.services
        .generator()
        .generate(AdviceRequest::for_user(user).with_type(advice_type))
        .await
}

#[tokio::test]
async fn test_ratings_outside_range_are_rejected() {
    let h = Harness::new();
    let record = advice_for(&h, Uuid::new_v4(), AdviceType::Nutrition).await;

    for rating in [0, 6, 200] {
        let err = h
            .services
            .feedback()
            .record_feedback(record.id(), rating, None)
            .await
            .unwrap_err();
        assert!(matches!(err, FeedbackError::InvalidRating(r) if r == rating));
    }
    assert!(h
        .services
        .feedback()
        .history_for(record.id())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_unknown_advice_is_rejected() {
    let h = Harness::new();
    let missing = Uuid::new_v4();
    let err = h
        .services
        .feedback()
        .record_feedback(missing, 4, None)
        .await
        .unwrap_err();
    assert!(matches!(err, FeedbackError::AdviceNotFound(id) if id == missing));
}

#[tokio::test]
async fn test_latest_rating_wins_and_history_keeps_every_rating() {
    let h = Harness::new();
    let user = Uuid::new_v4();
    ProfileStore::save(&*h.store, HealthProfile::new(user, t0()))
        .await
        .unwrap();
    let record = advice_for(&h, user, AdviceType::Exercise).await;
    let feedback = h.services.feedback();

    feedback
        .record_feedback(record.id(), 2, Some("too generic".to_owned()))
        .await
        .unwrap();
    h.clock.advance(Duration::minutes(5));
    let second = feedback
        .record_feedback(record.id(), 5, Some("   ".to_owned()))
        .await
        .unwrap();
    assert!(second.comment.is_none());
    assert_eq!(second.advice_type, AdviceType::Exercise);

    let stored = AdviceStore::get(&*h.store, record.id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status().user_rating, Some(5));

    let profile = ProfileStore::get(&*h.store, user).await.unwrap().unwrap();
    assert_eq!(profile.advice_feedback.get(&record.id()), Some(&5));

    let history = feedback.history_for(record.id()).await.unwrap();
    let ratings: Vec<u8> = history.iter().map(|f| f.rating).collect();
    assert_eq!(ratings, vec![2, 5]);
    assert_eq!(history[0].comment.as_deref(), Some("too generic"));
}

#[tokio::test]
async fn test_feedback_creates_missing_profile() {
    let h = Harness::new();
    let user = Uuid::new_v4();
    let record = advice_for(&h, user, AdviceType::Sleep).await;

    h.services
        .feedback()
        .record_feedback(record.id(), 3, None)
        .await
        .unwrap();

    let profile = ProfileStore::get(&*h.store, user).await.unwrap().unwrap();
    assert_eq!(profile.advice_feedback.get(&record.id()), Some(&3));
}

#[tokio::test]
async fn test_no_feedback_means_no_insights() {
    let h = Harness::new();
    let insights = h
        .services
        .feedback()
        .improve_recommendations(Uuid::new_v4())
        .await
        .unwrap();
    assert!(insights.is_none());
}

#[tokio::test]
async fn test_low_ratings_steer_open_ended_advice_away() {
    let h = Harness::new();
    let user = Uuid::new_v4();
    ProfileStore::save(
        &*h.store,
        HealthProfile::new(user, t0()).with_goals(vec![HealthGoal::BetterSleep]),
    )
    .await
    .unwrap();
    let feedback = h.services.feedback();

    for rating in [2, 1] {
        let record = advice_for(&h, user, AdviceType::Sleep).await;
        feedback.record_feedback(record.id(), rating, None).await.unwrap();
        h.clock.advance(Duration::minutes(1));
    }
    for _ in 0..2 {
        let record = advice_for(&h, user, AdviceType::Fasting).await;
        feedback.record_feedback(record.id(), 5, None).await.unwrap();
        h.clock.advance(Duration::minutes(1));
    }

    let insights = feedback
        .improve_recommendations(user)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(insights.sample_size, 4);
    assert!(insights.is_suppressed(AdviceType::Sleep));
    assert_eq!(insights.preferred_types, vec![AdviceType::Fasting]);
    assert!(insights.trend_delta > 0.0);

    let profile = ProfileStore::get(&*h.store, user).await.unwrap().unwrap();
    assert_eq!(profile.personalized_insights, Some(insights));

    let open_ended = h
        .services
        .generator()
        .generate(AdviceRequest::for_user(user))
        .await;
    assert_eq!(open_ended.advice_type(), AdviceType::Fasting);

    let explicit = advice_for(&h, user, AdviceType::Sleep).await;
    assert_eq!(explicit.advice_type(), AdviceType::Sleep);

    let asked = h
        .services
        .generator()
        .generate(AdviceRequest::for_user(user).with_query("I feel tired at bedtime"))
        .await;
    assert_eq!(asked.advice_type(), AdviceType::Sleep);
}

#[tokio::test]
async fn test_status_updates() {
    let h = Harness::new();
    let record = advice_for(&h, Uuid::new_v4(), AdviceType::Motivation).await;
    let feedback = h.services.feedback();

    let read = feedback
        .update_status(record.id(), AdviceStatusUpdate::MarkRead)
        .await
        .unwrap();
    assert!(read.status().is_read);

    let bookmarked = feedback
        .update_status(record.id(), AdviceStatusUpdate::Bookmark(true))
        .await
        .unwrap();
    assert!(bookmarked.status().is_bookmarked);
    assert!(bookmarked.status().is_read);
    assert_eq!(bookmarked.body(), record.body());

    let err = feedback
        .update_status(record.id(), AdviceStatusUpdate::Rate(9))
        .await
        .unwrap_err();
    assert!(matches!(err, FeedbackError::InvalidRating(9)));

    let err = feedback
        .update_status(Uuid::new_v4(), AdviceStatusUpdate::Dismiss)
        .await
        .unwrap_err();
    assert!(matches!(err, FeedbackError::AdviceNotFound(_)));
}
