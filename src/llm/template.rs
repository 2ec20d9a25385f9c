// ABOUTME: Offline text generation backend that assembles advice from retrieved snippets
// ABOUTME: Deterministic output in the same JSON shape requested from hosted models
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

use async_trait::async_trait;
use serde_json::json;

use super::{PromptSpec, TextGenerationBackend};
use crate::errors::AdviceError;
use crate::models::AdviceType;

/// Snippets quoted in the generated content
const MAX_QUOTED_SNIPPETS: usize = 2;

/// Builds responses from the prompt's snippets without any network access
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateBackend;

impl TemplateBackend {
    /// Create the backend
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    const fn headline(advice_type: AdviceType) -> &'static str {
        match advice_type {
            AdviceType::Fasting => "Make your next fast easier",
            AdviceType::Nutrition => "Tune your eating window",
            AdviceType::Exercise => "Keep moving",
            AdviceType::Sleep => "Protect your sleep",
            AdviceType::WeightManagement => "Stay on course with your weight goal",
            AdviceType::Motivation => "You're making progress",
            AdviceType::HealthReminder => "A quick health check-in",
            AdviceType::General => "A small step for today",
        }
    }
}

#[async_trait]
impl TextGenerationBackend for TemplateBackend {
    fn name(&self) -> &'static str {
        "template"
    }

    async fn generate(&self, prompt: &PromptSpec) -> Result<String, AdviceError> {
        let quoted: Vec<&str> = prompt
            .snippets
            .iter()
            .take(MAX_QUOTED_SNIPPETS)
            .map(|s| s.body.as_str())
            .collect();
        let content = if quoted.is_empty() {
            format!(
                "{}. Small, consistent changes add up over time.",
                Self::headline(prompt.advice_type)
            )
        } else {
            quoted.join(" ")
        };
        let actions: Vec<String> = prompt
            .snippets
            .iter()
            .map(|s| format!("Read: {}", s.title))
            .collect();
        let mut tags: Vec<String> = prompt
            .snippets
            .iter()
            .flat_map(|s| s.tags.iter().cloned())
            .collect();
        tags.sort();
        tags.dedup();

        let confidence = 0.05_f64.mul_add(prompt.snippets.len() as f64, 0.55).min(0.8);

        let body = json!({
            "title": Self::headline(prompt.advice_type),
            "content": content,
            "summary": Self::headline(prompt.advice_type),
            "actions": actions,
            "tags": tags,
            "confidence": confidence,
            "category": "tip",
        });
        Ok(body.to_string())
    }
}
