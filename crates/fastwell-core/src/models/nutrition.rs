// ABOUTME: Meal logging models for the activity log
// ABOUTME: MealRecord, MealType, and MacroBreakdown definitions with correction semantics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Type of meal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    /// Breakfast meal
    Breakfast,
    /// Lunch meal
    Lunch,
    /// Dinner meal
    Dinner,
    /// Snack between meals
    Snack,
    /// Unspecified or other meal type
    #[default]
    Other,
}

impl MealType {
    /// Parse meal type from string
    #[must_use]
    pub fn from_str_lossy(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "breakfast" => Self::Breakfast,
            "lunch" => Self::Lunch,
            "dinner" => Self::Dinner,
            "snack" => Self::Snack,
            _ => Self::Other,
        }
    }
}

/// Macro-nutrient estimate for one meal, in grams
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct MacroBreakdown {
    /// Protein in grams
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protein_g: Option<f64>,
    /// Carbohydrates in grams
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carbohydrates_g: Option<f64>,
    /// Fat in grams
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fat_g: Option<f64>,
    /// Fiber in grams
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fiber_g: Option<f64>,
}

/// A logged meal.
///
/// Records are never edited in place. A correction is a new record whose
/// `corrects` field names the record it supersedes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MealRecord {
    /// Record identifier
    pub id: Uuid,
    /// Owner
    pub user_id: Uuid,
    /// When the meal was eaten
    pub timestamp: DateTime<Utc>,
    /// Estimated calories
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    /// Macro-nutrient estimate
    #[serde(default)]
    pub macros: MacroBreakdown,
    /// Meal slot
    #[serde(default)]
    pub meal_type: MealType,
    /// Record superseded by this one, if this is a correction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrects: Option<Uuid>,
}

impl MealRecord {
    /// Create a new meal record with a fresh id
    #[must_use]
    pub fn new(user_id: Uuid, timestamp: DateTime<Utc>, meal_type: MealType) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            timestamp,
            calories: None,
            macros: MacroBreakdown::default(),
            meal_type,
            corrects: None,
        }
    }

    /// Set the calorie estimate
    #[must_use]
    pub const fn with_calories(mut self, calories: f64) -> Self {
        self.calories = Some(calories);
        self
    }

    /// Set the macro breakdown
    #[must_use]
    pub const fn with_macros(mut self, macros: MacroBreakdown) -> Self {
        self.macros = macros;
        self
    }

    /// Build a correction of this record: a new id that supersedes this one
    #[must_use]
    pub fn correction(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            corrects: Some(self.id),
            ..self.clone()
        }
    }
}
