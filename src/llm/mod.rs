// ABOUTME: Text generation seam used by the advice generator
// ABOUTME: Chat message and prompt types, backend trait, HTTP and offline template backends
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

//! # Text Generation
//!
//! The advice generator builds a `PromptSpec` and hands it to a
//! `TextGenerationBackend`. Backends return raw text; turning it into
//! structured advice is the job of `parser`.

mod openai_compatible;
/// Lenient parsing of constrained JSON responses
pub mod parser;
mod template;

pub use openai_compatible::OpenAiCompatibleBackend;
pub use parser::{parse_generated, GeneratedAdvice};
pub use template::TemplateBackend;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AdviceError;
use crate::models::AdviceType;
use crate::rag::KnowledgeSnippet;

// ============================================================================
// Message Types
// ============================================================================

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instruction message
    System,
    /// User input message
    User,
}

impl MessageRole {
    /// Wire name of the role
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
        }
    }
}

/// A single message in a chat conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender
    pub role: MessageRole,
    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    /// Create a system message
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// Create a user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

// ============================================================================
// Prompt
// ============================================================================

/// Everything a backend needs to produce one advice response
#[derive(Debug, Clone)]
pub struct PromptSpec {
    /// System instructions, including the response schema
    pub system: String,
    /// User turn: question plus serialized context
    pub user: String,
    /// Advice type being generated
    pub advice_type: AdviceType,
    /// Retrieved reference material
    pub snippets: Vec<KnowledgeSnippet>,
    /// Sampling temperature
    pub temperature: f32,
    /// Completion budget
    pub max_tokens: u32,
    /// Ask the backend for a JSON object response
    pub json_response: bool,
}

impl PromptSpec {
    /// Chat messages for this prompt
    #[must_use]
    pub fn messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system.clone()),
            ChatMessage::user(self.user.clone()),
        ]
    }
}

// ============================================================================
// Backend Trait
// ============================================================================

/// Produces raw text for a prompt
#[async_trait]
pub trait TextGenerationBackend: Send + Sync {
    /// Backend identifier for logs
    fn name(&self) -> &'static str;

    /// Generate a completion
    ///
    /// # Errors
    ///
    /// Returns `AdviceError::GenerationUnavailable` when the backend cannot
    /// be reached or rejects the request
    async fn generate(&self, prompt: &PromptSpec) -> Result<String, AdviceError>;
}
