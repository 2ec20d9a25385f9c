// ABOUTME: Knowledge retrieval seam for grounding generated advice in reference material
// ABOUTME: Snippet type, retriever trait, and the built-in keyword-scored knowledge base
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

mod static_kb;

pub use static_kb::StaticKnowledgeBase;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AdviceError;
use crate::models::AdviceContext;

/// One retrieved piece of reference material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeSnippet {
    /// Stable identifier recorded on the advice as a source
    pub source_id: String,
    /// Short heading
    pub title: String,
    /// Reference text
    pub body: String,
    /// Topic tags
    pub tags: Vec<String>,
    /// Relevance score assigned by the retriever
    pub score: f64,
}

/// Finds reference material relevant to a query
#[async_trait]
pub trait KnowledgeRetriever: Send + Sync {
    /// Return at most `top_k` snippets, best first
    ///
    /// # Errors
    ///
    /// Returns `AdviceError::RetrievalUnavailable` when the backing index
    /// cannot be reached
    async fn retrieve(
        &self,
        query: &str,
        context: &AdviceContext,
        top_k: usize,
    ) -> Result<Vec<KnowledgeSnippet>, AdviceError>;
}

/// Lowercased alphanumeric tokens of at least three characters
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|token| token.chars().count() >= 3)
        .map(str::to_lowercase)
        .collect()
}
