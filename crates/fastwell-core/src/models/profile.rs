// ABOUTME: Health profile model with goals, conditions, feedback map, and personalization insights
// ABOUTME: ProfileUpdate is the typed merge command applied by feedback and analytics writers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

use super::advice::AdviceType;
use crate::constants::health::CHRONIC_CONDITION_KEYWORDS;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Biological sex, used only for context in prompts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiologicalSex {
    /// Female
    Female,
    /// Male
    Male,
    /// Other or not disclosed
    Other,
}

/// Self-reported daily activity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    /// Little or no exercise
    Sedentary,
    /// 1-3 days a week
    Light,
    /// 3-5 days a week
    Moderate,
    /// 6-7 days a week
    Active,
    /// Physical job or twice-daily training
    VeryActive,
}

/// Goals chosen during onboarding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthGoal {
    /// Lose body weight
    WeightLoss,
    /// Gain lean mass
    MuscleGain,
    /// Keep current weight
    Maintenance,
    /// Feel more energetic during the day
    ImprovedEnergy,
    /// Sleep better
    BetterSleep,
    /// Improve glucose and lipid markers
    MetabolicHealth,
    /// General long-term health
    Longevity,
}

impl HealthGoal {
    /// Lowercase tag used for knowledge retrieval boosts
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::WeightLoss => "weight_loss",
            Self::MuscleGain => "muscle_gain",
            Self::Maintenance => "maintenance",
            Self::ImprovedEnergy => "energy",
            Self::BetterSleep => "sleep",
            Self::MetabolicHealth => "metabolic",
            Self::Longevity => "longevity",
        }
    }
}

/// Feedback summary for one advice type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeFeedbackSummary {
    /// Advice type the ratings belong to
    pub advice_type: AdviceType,
    /// Number of ratings in the window
    pub samples: usize,
    /// Mean rating
    pub average_rating: f64,
    /// Recent-half mean minus older-half mean (0 when too few samples)
    pub trend_delta: f64,
}

/// Adaptation signals written by the feedback loop and read by the advice generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalizedInsights {
    /// When these insights were computed
    pub computed_at: DateTime<Utc>,
    /// Number of feedback records considered
    pub sample_size: usize,
    /// Mean rating over the window
    pub average_rating: f64,
    /// Mean of the newer half of the window
    pub recent_average: f64,
    /// Mean of the older half of the window
    pub older_average: f64,
    /// `recent_average - older_average`
    pub trend_delta: f64,
    /// Per advice type summaries
    pub per_type: Vec<TypeFeedbackSummary>,
    /// Types with a sustained negative signal; skipped unless explicitly requested
    pub suppressed_types: Vec<AdviceType>,
    /// Types the user rates well
    pub preferred_types: Vec<AdviceType>,
}

impl PersonalizedInsights {
    /// Whether generation should steer away from this type
    #[must_use]
    pub fn is_suppressed(&self, advice_type: AdviceType) -> bool {
        self.suppressed_types.contains(&advice_type)
    }
}

/// A user's health profile.
///
/// Profiles are superseded, never deleted: writers replace the whole record
/// or apply a `ProfileUpdate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthProfile {
    /// Owner
    pub user_id: Uuid,
    /// Age in years
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    /// Biological sex
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<BiologicalSex>,
    /// Height in centimeters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<f64>,
    /// Weight in kilograms
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    /// Daily activity level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_level: Option<ActivityLevel>,
    /// Goals in priority order
    #[serde(default)]
    pub goals: Vec<HealthGoal>,
    /// Dietary constraints ("vegetarian", "lactose intolerant")
    #[serde(default)]
    pub dietary_restrictions: Vec<String>,
    /// Declared health conditions
    #[serde(default)]
    pub health_conditions: Vec<String>,
    /// Advice id to latest rating
    #[serde(default)]
    pub advice_feedback: HashMap<Uuid, u8>,
    /// Latest adaptation signals
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personalized_insights: Option<PersonalizedInsights>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last write time
    pub updated_at: DateTime<Utc>,
}

impl HealthProfile {
    /// Create an empty profile for a user
    #[must_use]
    pub fn new(user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            age: None,
            sex: None,
            height_cm: None,
            weight_kg: None,
            activity_level: None,
            goals: Vec::new(),
            dietary_restrictions: Vec::new(),
            health_conditions: Vec::new(),
            advice_feedback: HashMap::new(),
            personalized_insights: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set age
    #[must_use]
    pub const fn with_age(mut self, age: u32) -> Self {
        self.age = Some(age);
        self
    }

    /// Set height and weight
    #[must_use]
    pub const fn with_body(mut self, height_cm: f64, weight_kg: f64) -> Self {
        self.height_cm = Some(height_cm);
        self.weight_kg = Some(weight_kg);
        self
    }

    /// Replace goals
    #[must_use]
    pub fn with_goals(mut self, goals: Vec<HealthGoal>) -> Self {
        self.goals = goals;
        self
    }

    /// Replace health conditions
    #[must_use]
    pub fn with_conditions(mut self, conditions: Vec<String>) -> Self {
        self.health_conditions = conditions;
        self
    }

    /// Body mass index, when height and weight are both known and positive
    #[must_use]
    pub fn bmi(&self) -> Option<f64> {
        let height_m = self.height_cm.filter(|h| *h > 0.0)? / 100.0;
        let weight = self.weight_kg.filter(|w| *w > 0.0)?;
        Some(weight / (height_m * height_m))
    }

    /// Whether the goal is present
    #[must_use]
    pub fn has_goal(&self, goal: HealthGoal) -> bool {
        self.goals.contains(&goal)
    }

    /// Conditions matching the chronic-condition keyword table
    #[must_use]
    pub fn chronic_conditions(&self) -> Vec<&str> {
        self.health_conditions
            .iter()
            .filter(|condition| {
                let lower = condition.to_lowercase();
                CHRONIC_CONDITION_KEYWORDS
                    .iter()
                    .any(|keyword| lower.contains(keyword))
            })
            .map(String::as_str)
            .collect()
    }

    /// Apply a typed merge command
    pub fn apply(&mut self, update: ProfileUpdate, at: DateTime<Utc>) {
        match update {
            ProfileUpdate::RecordAdviceRating { advice_id, rating } => {
                self.advice_feedback.insert(advice_id, rating);
            }
            ProfileUpdate::SetPersonalizedInsights(insights) => {
                self.personalized_insights = Some(insights);
            }
            ProfileUpdate::SetGoals(goals) => self.goals = goals,
            ProfileUpdate::SetWeight(weight_kg) => self.weight_kg = Some(weight_kg),
        }
        self.updated_at = at;
    }
}

/// Partial update merged into a stored profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum ProfileUpdate {
    /// Store the latest rating for an advice record
    RecordAdviceRating {
        /// Rated advice
        advice_id: Uuid,
        /// Rating 1..=5
        rating: u8,
    },
    /// Replace personalization insights
    SetPersonalizedInsights(PersonalizedInsights),
    /// Replace goals
    SetGoals(Vec<HealthGoal>),
    /// Update body weight
    SetWeight(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bmi_requires_both_measurements() {
        let now = Utc::now();
        let profile = HealthProfile::new(Uuid::new_v4(), now);
        assert!(profile.bmi().is_none());

        let profile = profile.with_body(180.0, 81.0);
        let bmi = profile.bmi().unwrap();
        assert!((bmi - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_chronic_condition_keywords_match_case_insensitively() {
        let profile = HealthProfile::new(Uuid::new_v4(), Utc::now()).with_conditions(vec![
            "Type 2 Diabetes".to_owned(),
            "seasonal allergies".to_owned(),
        ]);
        assert_eq!(profile.chronic_conditions(), vec!["Type 2 Diabetes"]);
    }

    #[test]
    fn test_rating_merge_is_last_write_wins() {
        let now = Utc::now();
        let advice_id = Uuid::new_v4();
        let mut profile = HealthProfile::new(Uuid::new_v4(), now);
        profile.apply(ProfileUpdate::RecordAdviceRating { advice_id, rating: 2 }, now);
        profile.apply(ProfileUpdate::RecordAdviceRating { advice_id, rating: 5 }, now);
        assert_eq!(profile.advice_feedback.get(&advice_id), Some(&5));
        assert_eq!(profile.advice_feedback.len(), 1);
    }
}
