// ABOUTME: Advice pipeline error types for retrieval, generation, and parsing stages
// ABOUTME: Absorbed at the advice generator boundary and replaced with degraded advice
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

use super::StoreError;
use thiserror::Error;

/// Failures inside the retrieval-augmented advice pipeline.
///
/// None of these reach the end user: the generator logs them and substitutes
/// a low-confidence record.
#[derive(Debug, Error)]
pub enum AdviceError {
    /// Knowledge retriever failed or is unreachable
    #[error("knowledge retrieval unavailable: {0}")]
    RetrievalUnavailable(String),

    /// Text generation backend failed or is unreachable
    #[error("text generation unavailable: {0}")]
    GenerationUnavailable(String),

    /// Backend output did not contain the requested structure
    #[error("could not parse generated advice: {0}")]
    GenerationParse(String),

    /// A backend call exceeded its time budget
    #[error("{stage} timed out after {after_ms}ms")]
    Timeout {
        /// Pipeline stage (retrieval or generation)
        stage: &'static str,
        /// Configured budget in milliseconds
        after_ms: u64,
    },

    /// Advice store write failed
    #[error("advice persistence failed: {0}")]
    Persistence(#[from] StoreError),
}

impl AdviceError {
    /// Whether this failure means a backend could not be used at all
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::RetrievalUnavailable(_) | Self::GenerationUnavailable(_) | Self::Timeout { .. }
        )
    }
}
