// ABOUTME: Lenient parser for the constrained JSON structure requested from generation backends
// ABOUTME: Strips code fences, extracts the first JSON object, validates required fields
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::AdviceError;

/// Structured advice as returned by a backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedAdvice {
    /// Headline
    pub title: String,
    /// Full advice text
    pub content: String,
    /// One-line summary
    #[serde(default)]
    pub summary: String,
    /// Concrete next steps
    #[serde(default)]
    pub actions: Vec<String>,
    /// Topic tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Self-reported confidence in [0, 1]
    #[serde(default)]
    pub confidence: Option<f64>,
    /// Backend flags the advice as time-critical
    #[serde(default)]
    pub urgent: Option<bool>,
    /// Backend flags the advice as important
    #[serde(default)]
    pub important: Option<bool>,
    /// Category label such as "tip" or "warning"
    #[serde(default)]
    pub category: Option<String>,
}

fn fence_regex() -> Option<&'static Regex> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    FENCE
        .get_or_init(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").ok())
        .as_ref()
}

/// Text between the first `{` and its matching `}`, skipping braces inside strings
fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0_usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse a backend response into `GeneratedAdvice`.
///
/// # Errors
///
/// Returns `AdviceError::GenerationParse` when no JSON object can be found,
/// it does not match the expected shape, or title/content are blank.
pub fn parse_generated(raw: &str) -> Result<GeneratedAdvice, AdviceError> {
    let unfenced = fence_regex()
        .and_then(|re| re.captures(raw))
        .and_then(|caps| caps.get(1))
        .map_or(raw, |m| m.as_str());

    let object = first_json_object(unfenced)
        .ok_or_else(|| AdviceError::GenerationParse("no JSON object in response".to_owned()))?;

    let mut advice: GeneratedAdvice = serde_json::from_str(object)
        .map_err(|e| AdviceError::GenerationParse(e.to_string()))?;

    advice.title = advice.title.trim().to_owned();
    advice.content = advice.content.trim().to_owned();
    if advice.title.is_empty() || advice.content.is_empty() {
        return Err(AdviceError::GenerationParse(
            "title and content are required".to_owned(),
        ));
    }
    if advice.summary.trim().is_empty() {
        advice.summary = advice
            .content
            .split_terminator(['.', '!', '?'])
            .next()
            .unwrap_or(&advice.content)
            .trim()
            .to_owned();
    }
    advice.actions.retain(|a| !a.trim().is_empty());
    advice.confidence = advice.confidence.filter(|c| c.is_finite());
    Ok(advice)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fenced_json_with_prose_around_it() {
        let raw = "Sure! Here you go:\n```json\n{\"title\":\"Hydrate\",\"content\":\"Drink water. It helps.\",\"actions\":[\"Drink\",\"\"],\"urgent\":false}\n```\nGood luck";
        let advice = parse_generated(raw).unwrap();
        assert_eq!(advice.title, "Hydrate");
        assert_eq!(advice.summary, "Drink water");
        assert_eq!(advice.actions, vec!["Drink".to_owned()]);
        assert_eq!(advice.urgent, Some(false));
        assert_eq!(advice.important, None);
    }

    #[test]
    fn braces_inside_strings_do_not_end_the_object() {
        let raw = r#"{"title":"a {b}","content":"c } d","confidence":0.8} trailing {"#;
        let advice = parse_generated(raw).unwrap();
        assert_eq!(advice.content, "c } d");
        assert_eq!(advice.confidence, Some(0.8));
    }

    #[test]
    fn rejects_missing_or_blank_fields() {
        assert!(parse_generated("no json here").is_err());
        assert!(parse_generated(r#"{"title":"  ","content":"x"}"#).is_err());
        assert!(parse_generated(r#"{"content":"x"}"#).is_err());
    }
}
