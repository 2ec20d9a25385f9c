// ABOUTME: Closes the loop between user ratings and future advice selection
// ABOUTME: Records ratings, updates advice status, and recomputes personalized insights
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

use std::sync::Arc;

use chrono::{DateTime, Utc};
use fastwell_intelligence::FeedbackTrendAnalyzer;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::clock::Clock;
use crate::constants::feedback::{MAX_RATING, MIN_RATING};
use crate::errors::{FeedbackError, StoreError};
use crate::logging::CoachLogger;
use crate::models::{
    AdviceRecord, AdviceStatusUpdate, FeedbackRecord, HealthProfile, PersonalizedInsights,
    ProfileUpdate,
};
use crate::store::{AdviceStore, FeedbackStore, ProfileStore};

/// Records feedback and derives personalization from it
pub struct FeedbackLoop {
    advice: Arc<dyn AdviceStore>,
    feedback: Arc<dyn FeedbackStore>,
    profiles: Arc<dyn ProfileStore>,
    analyzer: FeedbackTrendAnalyzer,
    clock: Arc<dyn Clock>,
}

impl FeedbackLoop {
    /// Create a feedback loop over the given stores
    #[must_use]
    pub fn new(
        advice: Arc<dyn AdviceStore>,
        feedback: Arc<dyn FeedbackStore>,
        profiles: Arc<dyn ProfileStore>,
        analyzer: FeedbackTrendAnalyzer,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            advice,
            feedback,
            profiles,
            analyzer,
            clock,
        }
    }

    /// Rate an advice record.
    ///
    /// Every call appends to the feedback history. The advice status and the
    /// profile keep only the latest rating.
    ///
    /// # Errors
    ///
    /// - `FeedbackError::InvalidRating` when `rating` is outside 1..=5
    /// - `FeedbackError::AdviceNotFound` when the advice does not exist
    /// - `FeedbackError::Persistence` when a store write fails
    #[instrument(skip(self, comment), fields(advice.id = %advice_id))]
    pub async fn record_feedback(
        &self,
        advice_id: Uuid,
        rating: u8,
        comment: Option<String>,
    ) -> Result<FeedbackRecord, FeedbackError> {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(FeedbackError::InvalidRating(rating));
        }
        let advice = self
            .advice
            .get(advice_id)
            .await?
            .ok_or(FeedbackError::AdviceNotFound(advice_id))?;

        let now = self.clock.now();
        let record = FeedbackRecord {
            id: Uuid::new_v4(),
            user_id: advice.user_id(),
            advice_id,
            advice_type: advice.advice_type(),
            rating,
            comment: comment.filter(|c| !c.trim().is_empty()),
            created_at: now,
        };
        self.feedback.append(record.clone()).await?;
        self.advice
            .update_status(advice_id, AdviceStatusUpdate::Rate(rating))
            .await?;
        self.merge_profile(
            advice.user_id(),
            ProfileUpdate::RecordAdviceRating { advice_id, rating },
            now,
        )
        .await?;

        CoachLogger::log_feedback(advice.user_id(), advice_id, advice.advice_type(), rating);
        Ok(record)
    }

    /// Recompute personalized insights from the most recent feedback window
    /// and store them on the profile. `None` when the user has no feedback.
    ///
    /// # Errors
    ///
    /// Returns `FeedbackError::Persistence` when a store call fails
    #[instrument(skip(self), fields(user.id = %user_id))]
    pub async fn improve_recommendations(
        &self,
        user_id: Uuid,
    ) -> Result<Option<PersonalizedInsights>, FeedbackError> {
        let history = self
            .feedback
            .recent_for_user(user_id, self.analyzer.window())
            .await?;
        let now = self.clock.now();
        let Some(insights) = self.analyzer.analyze(&history, now) else {
            debug!(user.id = %user_id, "no feedback yet, insights unchanged");
            return Ok(None);
        };
        self.merge_profile(
            user_id,
            ProfileUpdate::SetPersonalizedInsights(insights.clone()),
            now,
        )
        .await?;
        debug!(
            user.id = %user_id,
            samples = insights.sample_size,
            suppressed = insights.suppressed_types.len(),
            preferred = insights.preferred_types.len(),
            "personalized insights updated"
        );
        Ok(Some(insights))
    }

    /// Mark advice read, bookmarked or dismissed
    ///
    /// # Errors
    ///
    /// - `FeedbackError::AdviceNotFound` when the advice does not exist
    /// - `FeedbackError::Persistence` when the store write fails
    pub async fn update_status(
        &self,
        advice_id: Uuid,
        update: AdviceStatusUpdate,
    ) -> Result<AdviceRecord, FeedbackError> {
        if let AdviceStatusUpdate::Rate(rating) = update {
            if !(MIN_RATING..=MAX_RATING).contains(&rating) {
                return Err(FeedbackError::InvalidRating(rating));
            }
        }
        self.advice
            .update_status(advice_id, update)
            .await
            .map_err(|e| match e {
                StoreError::NotFound { .. } => FeedbackError::AdviceNotFound(advice_id),
                other => FeedbackError::Persistence(other),
            })
    }

    /// All ratings left on one advice record, oldest first
    ///
    /// # Errors
    ///
    /// Returns `FeedbackError::Persistence` when the store cannot be read
    pub async fn history_for(&self, advice_id: Uuid) -> Result<Vec<FeedbackRecord>, FeedbackError> {
        Ok(self.feedback.for_advice(advice_id).await?)
    }

    /// Merge into the stored profile, creating a minimal one when absent
    async fn merge_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
        at: DateTime<Utc>,
    ) -> Result<HealthProfile, StoreError> {
        match self.profiles.merge(user_id, update.clone(), at).await {
            Err(StoreError::NotFound { .. }) => {
                let mut profile = HealthProfile::new(user_id, at);
                profile.apply(update, at);
                self.profiles.save(profile.clone()).await?;
                Ok(profile)
            }
            other => other,
        }
    }
}
