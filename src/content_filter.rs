// ABOUTME: Suppresses food-related content while a fast is active
// ABOUTME: Pluggable policy trait with a severity-aware default and table-driven substitutes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

use serde::{Deserialize, Serialize};

use crate::models::FastingState;

/// Kind of content the app is about to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Photos or illustrations of food
    FoodImagery,
    /// Recipe cards
    Recipe,
    /// Restaurant and delivery promotions
    RestaurantPromotion,
    /// "What to eat next" suggestions
    MealSuggestion,
    /// Educational or general content
    Article,
}

/// How aggressively food content is hidden
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterSeverity {
    /// Show everything
    Off,
    /// Hide imagery and recipes
    #[default]
    Mild,
    /// Also hide promotions and meal suggestions
    Strict,
}

impl FilterSeverity {
    /// Parse a configuration string
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none" => Some(Self::Off),
            "mild" => Some(Self::Mild),
            "strict" => Some(Self::Strict),
            _ => None,
        }
    }
}

/// A piece of content submitted for filtering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Caller's identifier for the item
    pub id: String,
    /// What the item is
    pub kind: ContentKind,
    /// Display title
    pub title: String,
}

impl ContentItem {
    /// Create an item
    #[must_use]
    pub fn new(id: impl Into<String>, kind: ContentKind, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
        }
    }
}

/// Outcome of filtering one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum FilterDecision {
    /// Show as-is
    Allow,
    /// Replace with `substitute`
    Suppress {
        /// Text shown in place of the item
        substitute: &'static str,
    },
}

impl FilterDecision {
    /// Whether the item should be shown
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Decides what content may be shown in a given fasting state
pub trait ContentFilterPolicy: Send + Sync {
    /// Evaluate one item
    fn evaluate(
        &self,
        item: &ContentItem,
        state: FastingState,
        severity: FilterSeverity,
    ) -> FilterDecision;
}

/// (kind, minimum severity that suppresses it, substitute text)
const SUPPRESSION_TABLE: [(ContentKind, FilterSeverity, &str); 4] = [
    (
        ContentKind::FoodImagery,
        FilterSeverity::Mild,
        "Image hidden while you fast. Take a breath and sip some water.",
    ),
    (
        ContentKind::Recipe,
        FilterSeverity::Mild,
        "Recipes are tucked away until your eating window opens.",
    ),
    (
        ContentKind::RestaurantPromotion,
        FilterSeverity::Strict,
        "Offers will be back after your fast.",
    ),
    (
        ContentKind::MealSuggestion,
        FilterSeverity::Strict,
        "Meal ideas return when your fast ends.",
    ),
];

/// Default policy: filters only while the session is Active
#[derive(Debug, Clone, Copy, Default)]
pub struct FoodContentPolicy;

impl ContentFilterPolicy for FoodContentPolicy {
    fn evaluate(
        &self,
        item: &ContentItem,
        state: FastingState,
        severity: FilterSeverity,
    ) -> FilterDecision {
        if state != FastingState::Active || severity == FilterSeverity::Off {
            return FilterDecision::Allow;
        }
        SUPPRESSION_TABLE
            .iter()
            .find(|(kind, min, _)| *kind == item.kind && severity_at_least(severity, *min))
            .map_or(FilterDecision::Allow, |&(_, _, substitute)| {
                FilterDecision::Suppress { substitute }
            })
    }
}

const fn severity_at_least(actual: FilterSeverity, min: FilterSeverity) -> bool {
    const fn rank(s: FilterSeverity) -> u8 {
        match s {
            FilterSeverity::Off => 0,
            FilterSeverity::Mild => 1,
            FilterSeverity::Strict => 2,
        }
    }
    rank(actual) >= rank(min)
}
