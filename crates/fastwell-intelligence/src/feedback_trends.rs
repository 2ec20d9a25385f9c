// ABOUTME: Feedback trend analysis producing personalization insights from rating history
// ABOUTME: Average rating, recent-versus-older delta, and per advice type suppression signals
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

//! Coarse, explainable feedback heuristics.
//!
//! The window is split chronologically in half. The trend is the newer
//! half's mean minus the older half's mean. A type is suppressed when it
//! has enough ratings, a low average and a trend that is not improving.

use crate::config::FeedbackTrendConfig;
use crate::statistics::mean;
use chrono::{DateTime, Utc};
use fastwell_core::models::{AdviceType, FeedbackRecord, PersonalizedInsights, TypeFeedbackSummary};

/// Computes `PersonalizedInsights` from feedback history
#[derive(Debug, Clone, Default)]
pub struct FeedbackTrendAnalyzer {
    config: FeedbackTrendConfig,
}

/// Mean, older-half mean and newer-half mean of a chronological series
fn split_means(ratings: &[f64]) -> Option<(f64, f64, f64)> {
    let average = mean(ratings)?;
    if ratings.len() < 2 {
        return Some((average, average, average));
    }
    let (older, recent) = ratings.split_at(ratings.len() / 2);
    Some((average, mean(older)?, mean(recent)?))
}

impl FeedbackTrendAnalyzer {
    /// Create an analyzer with the given configuration
    #[must_use]
    pub const fn new(config: FeedbackTrendConfig) -> Self {
        Self { config }
    }

    /// Number of records considered
    #[must_use]
    pub const fn window(&self) -> usize {
        self.config.window
    }

    /// Analyze the most recent `window` records; `None` with no feedback.
    #[must_use]
    pub fn analyze(
        &self,
        records: &[FeedbackRecord],
        now: DateTime<Utc>,
    ) -> Option<PersonalizedInsights> {
        let mut ordered: Vec<&FeedbackRecord> = records.iter().collect();
        ordered.sort_by_key(|r| r.created_at);
        let excess = ordered.len().saturating_sub(self.config.window);
        let window = &ordered[excess..];

        let ratings: Vec<f64> = window.iter().map(|r| f64::from(r.rating)).collect();
        let (average_rating, older_average, recent_average) = split_means(&ratings)?;

        let per_type: Vec<TypeFeedbackSummary> = AdviceType::ALL
            .into_iter()
            .filter_map(|advice_type| Self::summarize_type(window, advice_type))
            .collect();

        let suppressed_types = per_type
            .iter()
            .filter(|s| {
                s.samples >= self.config.min_samples
                    && s.average_rating <= self.config.suppress_below
                    && s.trend_delta <= 0.0
            })
            .map(|s| s.advice_type)
            .collect();
        let preferred_types = per_type
            .iter()
            .filter(|s| {
                s.samples >= self.config.min_samples && s.average_rating >= self.config.prefer_above
            })
            .map(|s| s.advice_type)
            .collect();

        Some(PersonalizedInsights {
            computed_at: now,
            sample_size: window.len(),
            average_rating,
            recent_average,
            older_average,
            trend_delta: recent_average - older_average,
            per_type,
            suppressed_types,
            preferred_types,
        })
    }

    fn summarize_type(
        window: &[&FeedbackRecord],
        advice_type: AdviceType,
    ) -> Option<TypeFeedbackSummary> {
        let ratings: Vec<f64> = window
            .iter()
            .filter(|r| r.advice_type == advice_type)
            .map(|r| f64::from(r.rating))
            .collect();
        let (average_rating, older, recent) = split_means(&ratings)?;
        Some(TypeFeedbackSummary {
            advice_type,
            samples: ratings.len(),
            average_rating,
            trend_delta: recent - older,
        })
    }
}
