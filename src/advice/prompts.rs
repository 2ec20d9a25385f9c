// ABOUTME: Prompt assembly for advice generation
// ABOUTME: Coach system prompt loaded at compile time plus the per-request user turn
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

use std::fmt::Write;

use crate::models::{AdviceContext, AdviceType};
use crate::rag::KnowledgeSnippet;

/// Coach system prompt, including the response schema
pub const COACH_SYSTEM_PROMPT: &str = include_str!("coach_system.md");

/// User turn: the question, the advice type, the user context and the references
#[must_use]
pub fn build_user_prompt(
    question: &str,
    advice_type: AdviceType,
    context: &AdviceContext,
    snippets: &[KnowledgeSnippet],
) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "Question: {question}");
    let _ = writeln!(prompt, "Advice type: {advice_type}");
    prompt.push('\n');

    prompt.push_str("User context (JSON):\n");
    prompt.push_str(&serde_json::to_string_pretty(context).unwrap_or_default());
    prompt.push_str("\n\n");

    if snippets.is_empty() {
        prompt.push_str("No reference material was found; rely on general guidance.\n");
    } else {
        prompt.push_str("Reference material:\n");
        for (i, snippet) in snippets.iter().enumerate() {
            let _ = writeln!(
                prompt,
                "[{}] {} ({}): {}",
                i + 1,
                snippet.title,
                snippet.source_id,
                snippet.body
            );
        }
    }
    prompt
}
