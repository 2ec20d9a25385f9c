// ABOUTME: Advice record model with immutable content, frozen context, and mutable status flags
// ABOUTME: AdviceType, AdviceCategory, AdvicePriority, TriggerKind, and context excerpts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

use super::behavior::BehaviorSnapshot;
use super::fasting::{FastingSession, FastingState};
use super::profile::{ActivityLevel, BiologicalSex, HealthGoal, HealthProfile};
use crate::constants::scores::{MAX_SCORE, MIN_SCORE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Subject area of a piece of advice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdviceType {
    /// Food choices and meal timing
    Nutrition,
    /// Fasting protocol and adherence
    Fasting,
    /// Physical activity
    Exercise,
    /// Sleep habits
    Sleep,
    /// Weight goals
    WeightManagement,
    /// Encouragement
    Motivation,
    /// Medical follow-up reminders
    HealthReminder,
    /// Anything else
    General,
}

impl AdviceType {
    /// Every advice type, in the default preference order
    pub const ALL: [Self; 8] = [
        Self::Fasting,
        Self::Nutrition,
        Self::Exercise,
        Self::Sleep,
        Self::WeightManagement,
        Self::Motivation,
        Self::HealthReminder,
        Self::General,
    ];

    /// Snake-case label
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nutrition => "nutrition",
            Self::Fasting => "fasting",
            Self::Exercise => "exercise",
            Self::Sleep => "sleep",
            Self::WeightManagement => "weight_management",
            Self::Motivation => "motivation",
            Self::HealthReminder => "health_reminder",
            Self::General => "general",
        }
    }

    /// Parse a snake-case label
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|t| t.as_str() == normalized)
    }
}

impl fmt::Display for AdviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presentation category of a piece of advice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AdviceCategory {
    /// Actionable suggestion
    #[default]
    Tip,
    /// Observation about the user's data
    Insight,
    /// Nudge to do something
    Reminder,
    /// Encouragement
    Motivation,
    /// Something to be careful about
    Warning,
}

impl AdviceCategory {
    /// Parse a category label, `None` when unknown
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "tip" => Some(Self::Tip),
            "insight" => Some(Self::Insight),
            "reminder" => Some(Self::Reminder),
            "motivation" => Some(Self::Motivation),
            "warning" => Some(Self::Warning),
            _ => None,
        }
    }
}

/// Display priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvicePriority {
    /// Degraded or filler advice
    Low,
    /// Default
    Medium,
    /// Backend flagged it important
    High,
    /// Backend flagged it urgent
    Urgent,
}

impl AdvicePriority {
    /// Deterministic mapping from the generated urgent/important flags
    #[must_use]
    pub const fn from_flags(urgent: bool, important: bool) -> Self {
        if urgent {
            Self::Urgent
        } else if important {
            Self::High
        } else {
            Self::Medium
        }
    }
}

/// Rule that caused proactive advice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// No meal logged for several days
    MealLoggingGap,
    /// Active weight-loss goal
    WeightLossMotivation,
    /// Chronic condition on the profile
    ChronicConditionReminder,
    /// Most recent fasts were abandoned
    LowFastingSuccess,
    /// Meal times vary a lot
    IrregularMealTiming,
}

impl TriggerKind {
    /// Snake-case label
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MealLoggingGap => "meal_logging_gap",
            Self::WeightLossMotivation => "weight_loss_motivation",
            Self::ChronicConditionReminder => "chronic_condition_reminder",
            Self::LowFastingSuccess => "low_fasting_success",
            Self::IrregularMealTiming => "irregular_meal_timing",
        }
    }
}

/// Profile facts frozen into an advice record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileExcerpt {
    /// Age in years
    pub age: Option<u32>,
    /// Biological sex
    pub sex: Option<BiologicalSex>,
    /// Activity level
    pub activity_level: Option<ActivityLevel>,
    /// Goals
    pub goals: Vec<HealthGoal>,
    /// Dietary constraints
    pub dietary_restrictions: Vec<String>,
    /// Declared conditions
    pub health_conditions: Vec<String>,
    /// Derived BMI
    pub bmi: Option<f64>,
}

impl ProfileExcerpt {
    /// Copy the prompt-relevant facts out of a profile
    #[must_use]
    pub fn from_profile(profile: &HealthProfile) -> Self {
        Self {
            age: profile.age,
            sex: profile.sex,
            activity_level: profile.activity_level,
            goals: profile.goals.clone(),
            dietary_restrictions: profile.dietary_restrictions.clone(),
            health_conditions: profile.health_conditions.clone(),
            bmi: profile.bmi(),
        }
    }
}

/// Behavior facts frozen into an advice record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorExcerpt {
    /// When the source snapshot was computed
    pub computed_at: DateTime<Utc>,
    /// Overall score
    pub overall_health_score: Option<f64>,
    /// Meal timing consistency
    pub meal_consistency: Option<f64>,
    /// Meals per active day
    pub meals_per_day: Option<f64>,
    /// Fasting success rate
    pub fasting_success_rate: Option<f64>,
    /// Normalized exercise frequency
    pub exercise_frequency: Option<f64>,
    /// Sleep quality
    pub sleep_quality: Option<f64>,
    /// Whole days since the last meal was logged
    pub days_since_last_meal: Option<i64>,
}

impl BehaviorExcerpt {
    /// Copy the headline numbers out of a snapshot
    #[must_use]
    pub fn from_snapshot(snapshot: &BehaviorSnapshot, now: DateTime<Utc>) -> Self {
        Self {
            computed_at: snapshot.computed_at,
            overall_health_score: snapshot.overall_health_score,
            meal_consistency: snapshot.meal_consistency(),
            meals_per_day: snapshot.meal_patterns.as_ref().map(|m| m.meals_per_day),
            fasting_success_rate: snapshot.fasting_success_rate(),
            exercise_frequency: snapshot.exercise_frequency(),
            sleep_quality: snapshot.sleep_quality(),
            days_since_last_meal: snapshot.last_meal_at().map(|at| (now - at).num_days()),
        }
    }
}

/// Session facts frozen into an advice record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionExcerpt {
    /// Session id
    pub session_id: Uuid,
    /// Protocol label
    pub fasting_type: String,
    /// State at generation time
    pub state: FastingState,
    /// Progress in [0, 1]
    pub progress: f64,
    /// Elapsed hours
    pub elapsed_hours: f64,
}

impl SessionExcerpt {
    /// Copy the derived timing out of a session
    #[must_use]
    pub fn from_session(session: &FastingSession, now: DateTime<Utc>) -> Self {
        Self {
            session_id: session.id,
            fasting_type: session.fasting_type.label().to_owned(),
            state: session.state,
            progress: session.progress(now),
            elapsed_hours: session.elapsed(now).num_seconds() as f64 / 3600.0,
        }
    }
}

/// Everything the generator saw, frozen at generation time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdviceContext {
    /// Owner
    pub user_id: Uuid,
    /// When the context was assembled
    pub captured_at: DateTime<Utc>,
    /// Profile facts
    pub profile: ProfileExcerpt,
    /// Behavior facts, when a snapshot was available
    pub behavior: Option<BehaviorExcerpt>,
    /// Session facts, when a session was open
    pub session: Option<SessionExcerpt>,
}

/// Mutable flags on an advice record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdviceStatus {
    /// Latest rating, last write wins
    pub user_rating: Option<u8>,
    /// Opened by the user
    pub is_read: bool,
    /// Saved by the user
    pub is_bookmarked: bool,
    /// Hidden by the user
    pub is_dismissed: bool,
}

/// The only mutations an advice record accepts after creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum AdviceStatusUpdate {
    /// Set the denormalized rating
    Rate(u8),
    /// Mark as read
    MarkRead,
    /// Set or clear the bookmark
    Bookmark(bool),
    /// Dismiss
    Dismiss,
}

impl AdviceStatus {
    /// Apply one status update
    pub fn apply(&mut self, update: AdviceStatusUpdate) {
        match update {
            AdviceStatusUpdate::Rate(rating) => self.user_rating = Some(rating),
            AdviceStatusUpdate::MarkRead => self.is_read = true,
            AdviceStatusUpdate::Bookmark(flag) => self.is_bookmarked = flag,
            AdviceStatusUpdate::Dismiss => self.is_dismissed = true,
        }
    }
}

/// Generated text of an advice record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdviceBody {
    /// Headline
    pub title: String,
    /// Full text
    pub content: String,
    /// One-line summary
    pub summary: String,
    /// Concrete next steps
    pub suggested_actions: Vec<String>,
    /// Free-form tags
    pub tags: Vec<String>,
}

/// Input for creating an advice record
#[derive(Debug, Clone)]
pub struct NewAdvice {
    /// Owner
    pub user_id: Uuid,
    /// Subject area
    pub advice_type: AdviceType,
    /// Presentation category
    pub category: AdviceCategory,
    /// Display priority
    pub priority: AdvicePriority,
    /// Generated text
    pub body: AdviceBody,
    /// Frozen context
    pub context: AdviceContext,
    /// Source ids of the retrieved snippets
    pub rag_sources: Vec<String>,
    /// Confidence, clamped into [0, 1] on creation
    pub confidence: f64,
    /// Pushed by a trigger rather than requested
    pub proactive: bool,
    /// Rule that fired, for proactive advice
    pub trigger: Option<TriggerKind>,
    /// Produced by a fallback path
    pub degraded: bool,
}

/// A stored piece of advice.
///
/// Content and context are private and have no setters; only the status
/// block changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdviceRecord {
    id: Uuid,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    advice_type: AdviceType,
    category: AdviceCategory,
    priority: AdvicePriority,
    body: AdviceBody,
    context: AdviceContext,
    rag_sources: Vec<String>,
    confidence: f64,
    proactive: bool,
    trigger: Option<TriggerKind>,
    degraded: bool,
    status: AdviceStatus,
}

impl AdviceRecord {
    /// Create a record with a fresh id and default status
    #[must_use]
    pub fn create(new: NewAdvice, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            created_at,
            advice_type: new.advice_type,
            category: new.category,
            priority: new.priority,
            body: new.body,
            context: new.context,
            rag_sources: new.rag_sources,
            confidence: if new.confidence.is_finite() {
                new.confidence.clamp(MIN_SCORE, MAX_SCORE)
            } else {
                MIN_SCORE
            },
            proactive: new.proactive,
            trigger: new.trigger,
            degraded: new.degraded,
            status: AdviceStatus::default(),
        }
    }

    /// Record id
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Owner
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// Creation time
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Subject area
    #[must_use]
    pub const fn advice_type(&self) -> AdviceType {
        self.advice_type
    }

    /// Presentation category
    #[must_use]
    pub const fn category(&self) -> AdviceCategory {
        self.category
    }

    /// Display priority
    #[must_use]
    pub const fn priority(&self) -> AdvicePriority {
        self.priority
    }

    /// Generated text
    #[must_use]
    pub const fn body(&self) -> &AdviceBody {
        &self.body
    }

    /// Frozen context
    #[must_use]
    pub const fn context(&self) -> &AdviceContext {
        &self.context
    }

    /// Retrieved source ids
    #[must_use]
    pub fn rag_sources(&self) -> &[String] {
        &self.rag_sources
    }

    /// Confidence in [0, 1]
    #[must_use]
    pub const fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Pushed by a trigger
    #[must_use]
    pub const fn is_proactive(&self) -> bool {
        self.proactive
    }

    /// Rule that fired
    #[must_use]
    pub const fn trigger(&self) -> Option<TriggerKind> {
        self.trigger
    }

    /// Produced by a fallback path
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Mutable flags
    #[must_use]
    pub const fn status(&self) -> AdviceStatus {
        self.status
    }

    /// Apply a status update; content and context are untouched
    pub fn apply_status(&mut self, update: AdviceStatusUpdate) {
        self.status.apply(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> AdviceContext {
        let now = Utc::now();
        let profile = HealthProfile::new(Uuid::new_v4(), now);
        AdviceContext {
            user_id: profile.user_id,
            captured_at: now,
            profile: ProfileExcerpt::from_profile(&profile),
            behavior: None,
            session: None,
        }
    }

    fn new_advice(confidence: f64) -> NewAdvice {
        let context = context();
        NewAdvice {
            user_id: context.user_id,
            advice_type: AdviceType::Fasting,
            category: AdviceCategory::Tip,
            priority: AdvicePriority::Medium,
            body: AdviceBody {
                title: "Hydrate".to_owned(),
                content: "Drink water".to_owned(),
                summary: "Water".to_owned(),
                suggested_actions: vec![],
                tags: vec![],
            },
            context,
            rag_sources: vec![],
            confidence,
            proactive: false,
            trigger: None,
            degraded: false,
        }
    }

    #[test]
    fn test_priority_from_flags() {
        assert_eq!(AdvicePriority::from_flags(true, true), AdvicePriority::Urgent);
        assert_eq!(AdvicePriority::from_flags(false, true), AdvicePriority::High);
        assert_eq!(AdvicePriority::from_flags(false, false), AdvicePriority::Medium);
    }

    #[test]
    fn test_confidence_is_clamped() {
        let now = Utc::now();
        assert!((AdviceRecord::create(new_advice(1.7), now).confidence() - 1.0).abs() < f64::EPSILON);
        assert!(AdviceRecord::create(new_advice(-0.2), now).confidence().abs() < f64::EPSILON);
        assert!(AdviceRecord::create(new_advice(f64::NAN), now).confidence().abs() < f64::EPSILON);
    }

    #[test]
    fn test_status_updates_leave_content_untouched() {
        let mut record = AdviceRecord::create(new_advice(0.8), Utc::now());
        let body = record.body().clone();
        let context = record.context().clone();

        record.apply_status(AdviceStatusUpdate::Rate(4));
        record.apply_status(AdviceStatusUpdate::MarkRead);
        record.apply_status(AdviceStatusUpdate::Bookmark(true));
        record.apply_status(AdviceStatusUpdate::Rate(2));

        assert_eq!(record.status().user_rating, Some(2));
        assert!(record.status().is_read);
        assert!(record.status().is_bookmarked);
        assert!(!record.status().is_dismissed);
        assert_eq!(record.body(), &body);
        assert_eq!(record.context(), &context);
    }

    #[test]
    fn test_advice_type_parse() {
        assert_eq!(AdviceType::parse("weight-management"), Some(AdviceType::WeightManagement));
        assert_eq!(AdviceType::parse("Sleep"), Some(AdviceType::Sleep));
        assert_eq!(AdviceType::parse("astrology"), None);
    }
}
