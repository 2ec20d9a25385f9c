// ABOUTME: Feedback record model for user ratings on advice
// ABOUTME: Append-only, many feedback records per advice record
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

use super::advice::AdviceType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One rating event on a piece of advice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    /// Record id
    pub id: Uuid,
    /// Rater
    pub user_id: Uuid,
    /// Rated advice
    pub advice_id: Uuid,
    /// Type of the rated advice, copied for trend grouping
    pub advice_type: AdviceType,
    /// Rating 1..=5
    pub rating: u8,
    /// Optional free text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// When the rating was given
    pub created_at: DateTime<Utc>,
}
