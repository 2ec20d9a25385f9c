// ABOUTME: Feedback loop error types for rating validation and persistence
// ABOUTME: Invalid ratings, unknown advice ids, and wrapped store failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

use super::StoreError;
use thiserror::Error;
use uuid::Uuid;

/// Errors returned by the feedback loop
#[derive(Debug, Error)]
pub enum FeedbackError {
    /// Rating outside 1..=5
    #[error("rating {0} is outside 1..=5")]
    InvalidRating(u8),

    /// Feedback refers to advice that does not exist
    #[error("advice {0} not found")]
    AdviceNotFound(Uuid),

    /// A store write failed
    #[error("feedback persistence failed: {0}")]
    Persistence(#[from] StoreError),
}
