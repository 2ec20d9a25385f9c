// ABOUTME: Configuration for the pattern analyzer and feedback trend analysis
// ABOUTME: Analysis window, score weights, targets, and suppression thresholds with validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

//! Analyzer configuration
//!
//! Defaults reproduce the documented behavior: a 30 day / 500 record window,
//! equal 0.25 weights over the four health sub-scores, and a 20 record
//! feedback window.

use fastwell_core::errors::ConfigError;
use serde::{Deserialize, Serialize};

/// Tolerance when checking that weights sum to one
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Pattern analyzer configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Which records are considered
    pub window: AnalysisWindow,
    /// Weights for the overall health score
    pub weights: ScoreWeights,
    /// Reference values for normalization
    pub targets: AnalysisTargets,
}

/// Bounded input window, by count and by time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisWindow {
    /// Keep at most this many of the most recent records
    pub max_records: usize,
    /// Ignore records older than this many days
    pub lookback_days: i64,
}

/// Weights of the overall health score components
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// Meal timing consistency
    pub meal_consistency: f64,
    /// Fasting success rate
    pub fasting_success: f64,
    /// Normalized exercise frequency
    pub exercise_frequency: f64,
    /// Sleep quality
    pub sleep_quality: f64,
}

/// Reference values used to normalize raw metrics into [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisTargets {
    /// Active exercise days per week that count as a full score
    pub exercise_days_per_week: f64,
    /// Sleep duration that scores 1.0 when no quality is recorded
    pub ideal_sleep_hours: f64,
    /// Distance from the ideal at which the duration score reaches 0
    pub sleep_tolerance_hours: f64,
}

/// Feedback trend configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeedbackTrendConfig {
    /// Number of most recent feedback records considered
    pub window: usize,
    /// Types averaging at or below this with a non-positive trend are suppressed
    pub suppress_below: f64,
    /// Types averaging at or above this are preferred
    pub prefer_above: f64,
    /// Minimum ratings of a type before it can be suppressed or preferred
    pub min_samples: usize,
}

impl Default for AnalysisWindow {
    fn default() -> Self {
        Self {
            max_records: 500,
            lookback_days: 30,
        }
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            meal_consistency: 0.25,
            fasting_success: 0.25,
            exercise_frequency: 0.25,
            sleep_quality: 0.25,
        }
    }
}

impl Default for AnalysisTargets {
    fn default() -> Self {
        Self {
            exercise_days_per_week: 4.0,
            ideal_sleep_hours: 8.0,
            sleep_tolerance_hours: 4.0,
        }
    }
}

impl Default for FeedbackTrendConfig {
    fn default() -> Self {
        Self {
            window: 20,
            suppress_below: 2.5,
            prefer_above: 4.0,
            min_samples: 2,
        }
    }
}

impl ScoreWeights {
    /// Sum of all weights
    #[must_use]
    pub fn total(&self) -> f64 {
        self.meal_consistency + self.fasting_success + self.exercise_frequency + self.sleep_quality
    }

    /// Validate that weights are non-negative and sum to 1.0
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidWeights` otherwise.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let all = [
            self.meal_consistency,
            self.fasting_success,
            self.exercise_frequency,
            self.sleep_quality,
        ];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ConfigError::InvalidWeights(
                "score weights must be finite and non-negative",
            ));
        }
        if (self.total() - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::InvalidWeights("score weights must sum to 1.0"));
        }
        Ok(())
    }
}

impl AnalyzerConfig {
    /// Validate every section
    ///
    /// # Errors
    ///
    /// Returns the first invalid field found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.max_records == 0 {
            return Err(ConfigError::InvalidRange("max_records must be at least 1"));
        }
        if self.window.lookback_days <= 0 {
            return Err(ConfigError::InvalidRange("lookback_days must be positive"));
        }
        if self.targets.exercise_days_per_week <= 0.0 || self.targets.exercise_days_per_week > 7.0 {
            return Err(ConfigError::InvalidRange(
                "exercise_days_per_week must be in (0, 7]",
            ));
        }
        if self.targets.sleep_tolerance_hours <= 0.0 {
            return Err(ConfigError::InvalidRange(
                "sleep_tolerance_hours must be positive",
            ));
        }
        self.weights.validate()
    }
}

impl FeedbackTrendConfig {
    /// Validate thresholds
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidRange` for an empty window or thresholds outside 1..=5.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window == 0 {
            return Err(ConfigError::InvalidRange("feedback window must be at least 1"));
        }
        let in_scale = |v: f64| (1.0..=5.0).contains(&v);
        if !in_scale(self.suppress_below) || !in_scale(self.prefer_above) {
            return Err(ConfigError::InvalidRange(
                "feedback thresholds must be within the 1-5 rating scale",
            ));
        }
        if self.suppress_below >= self.prefer_above {
            return Err(ConfigError::InvalidRange(
                "suppress_below must be lower than prefer_above",
            ));
        }
        Ok(())
    }
}
