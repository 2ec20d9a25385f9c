// ABOUTME: Core data models for the fastwell coaching engine
// ABOUTME: Re-exports profile, fasting, activity, snapshot, advice, and feedback types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

//! # Data Models
//!
//! Every entity is an explicit tagged record with optional fields, so a
//! missing or renamed field is a compile error rather than a runtime lookup
//! miss.
//!
//! ## Ownership
//!
//! - `HealthProfile`: owned by the user, superseded but never deleted
//! - `FastingSession`: mutated only through state transitions, archived when terminal
//! - `MealRecord`, `ExerciseRecord`, `SleepRecord`: immutable log entries
//! - `BehaviorSnapshot`: a recomputed cache, never the source of truth
//! - `AdviceRecord`: immutable content with a small mutable status block
//! - `FeedbackRecord`: append-only

mod activity;
mod advice;
mod behavior;
mod fasting;
mod feedback;
mod nutrition;
mod profile;

// Activity log domain
pub use activity::{ActivityKind, ActivityRecord, ExerciseRecord, SleepRecord};

// Fasting domain
pub use fasting::{FastingSession, FastingState, FastingType, PauseInterval, SessionCommand};

// Nutrition domain
pub use nutrition::{MacroBreakdown, MealRecord, MealType};

// Behavior snapshot domain
pub use behavior::{
    BehaviorSnapshot, ExercisePatterns, FastingPatterns, MealPatterns, NutritionTrend,
    SleepPatterns, TrendPoint,
};

// Advice domain
pub use advice::{
    AdviceBody, AdviceCategory, AdviceContext, AdvicePriority, AdviceRecord, AdviceStatus,
    AdviceStatusUpdate, AdviceType, BehaviorExcerpt, NewAdvice, ProfileExcerpt, SessionExcerpt,
    TriggerKind,
};

// Feedback domain
pub use feedback::FeedbackRecord;

// Profile domain
pub use profile::{
    ActivityLevel, BiologicalSex, HealthGoal, HealthProfile, PersonalizedInsights,
    ProfileUpdate, TypeFeedbackSummary,
};
