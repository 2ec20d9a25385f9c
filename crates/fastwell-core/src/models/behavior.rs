// ABOUTME: Behavior snapshot model produced by the pattern analyzer
// ABOUTME: Meal, fasting, exercise, and sleep pattern summaries plus the overall health score
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One raw point of the nutrition trend series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// Meal timestamp
    pub at: DateTime<Utc>,
    /// Calories for the meal, if estimated
    pub calories: Option<f64>,
    /// Protein grams
    pub protein_g: Option<f64>,
    /// Carbohydrate grams
    pub carbohydrates_g: Option<f64>,
    /// Fat grams
    pub fat_g: Option<f64>,
}

/// Raw per-meal macro series in chronological order, unsmoothed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionTrend {
    /// Points, oldest first
    pub points: Vec<TrendPoint>,
}

/// Meal timing and frequency summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPatterns {
    /// Meals in the window
    pub meal_count: usize,
    /// Distinct calendar days with at least one meal
    pub active_days: usize,
    /// Meals per active day
    pub meals_per_day: f64,
    /// Regularity of meal time-of-day in [0, 1]; absent with fewer than two meals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing_consistency: Option<f64>,
    /// Mean fractional hour of day
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_meal_hour: Option<f64>,
    /// Mean calories over meals that have an estimate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_calories: Option<f64>,
    /// Most recent meal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_meal_at: Option<DateTime<Utc>>,
    /// Raw macro series
    pub nutrition_trend: NutritionTrend,
}

/// Fasting adherence summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FastingPatterns {
    /// Sessions in the window, open ones included
    pub session_count: usize,
    /// Sessions that ended as Completed
    pub completed_count: usize,
    /// Sessions that ended as Abandoned
    pub abandoned_count: usize,
    /// Completed over terminal sessions in [0, 1]; absent with no terminal sessions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_rate: Option<f64>,
    /// Mean elapsed hours of terminal sessions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_elapsed_hours: Option<f64>,
    /// Regularity of session start time-of-day
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time_consistency: Option<f64>,
    /// Sessions per active day
    pub sessions_per_day: f64,
}

/// Exercise frequency summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExercisePatterns {
    /// Workouts in the window
    pub session_count: usize,
    /// Distinct days with a workout
    pub active_days: usize,
    /// Workouts per active day
    pub sessions_per_day: f64,
    /// Active days per week over the window
    pub active_days_per_week: f64,
    /// Active days per week over the weekly target, clamped to [0, 1]
    pub normalized_frequency: f64,
    /// Mean workout length
    pub average_duration_minutes: f64,
    /// Regularity of workout time-of-day
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing_consistency: Option<f64>,
}

/// Sleep summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepPatterns {
    /// Nights in the window
    pub night_count: usize,
    /// Mean hours per night
    pub average_duration_hours: f64,
    /// Quality in [0, 1]: mean recorded quality, or a duration-based score
    pub quality_score: f64,
    /// Regularity of bedtime
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedtime_consistency: Option<f64>,
}

/// Point-in-time statistical summary of a user's activity log.
///
/// This is a cache. It is recomputed as a whole and never patched; the
/// activity log stays authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorSnapshot {
    /// Owner
    pub user_id: Uuid,
    /// When the analysis ran
    pub computed_at: DateTime<Utc>,
    /// Records that survived windowing and correction filtering
    pub record_count: usize,
    /// Meal summary; absent with no meals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_patterns: Option<MealPatterns>,
    /// Fasting summary; absent with no sessions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fasting_patterns: Option<FastingPatterns>,
    /// Exercise summary; absent with no workouts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exercise_patterns: Option<ExercisePatterns>,
    /// Sleep summary; absent with no nights
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_patterns: Option<SleepPatterns>,
    /// Weighted mean over the sub-scores that are present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_health_score: Option<f64>,
}

impl BehaviorSnapshot {
    /// Snapshot with no data in any category
    #[must_use]
    pub const fn empty(user_id: Uuid, computed_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            computed_at,
            record_count: 0,
            meal_patterns: None,
            fasting_patterns: None,
            exercise_patterns: None,
            sleep_patterns: None,
            overall_health_score: None,
        }
    }

    /// Whether the snapshot is older than `max_age` at `now`
    #[must_use]
    pub fn is_stale(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        now - self.computed_at >= max_age
    }

    /// Meal timing consistency, if known
    #[must_use]
    pub fn meal_consistency(&self) -> Option<f64> {
        self.meal_patterns.as_ref()?.timing_consistency
    }

    /// Fasting success rate, if known
    #[must_use]
    pub fn fasting_success_rate(&self) -> Option<f64> {
        self.fasting_patterns.as_ref()?.success_rate
    }

    /// Normalized exercise frequency, if any workouts exist
    #[must_use]
    pub fn exercise_frequency(&self) -> Option<f64> {
        self.exercise_patterns.as_ref().map(|e| e.normalized_frequency)
    }

    /// Sleep quality, if any nights exist
    #[must_use]
    pub fn sleep_quality(&self) -> Option<f64> {
        self.sleep_patterns.as_ref().map(|s| s.quality_score)
    }

    /// Most recent meal timestamp
    #[must_use]
    pub fn last_meal_at(&self) -> Option<DateTime<Utc>> {
        self.meal_patterns.as_ref()?.last_meal_at
    }
}
