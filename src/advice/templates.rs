// ABOUTME: Per-advice-type table of default queries, canned fallbacks, and inference keywords
// ABOUTME: Keyword-based advice type inference for free-text questions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

use crate::models::{AdviceCategory, AdviceType, TriggerKind};

/// Fixed text and keywords for one advice type
#[derive(Debug)]
pub struct TypeTemplate {
    /// Type this row describes
    pub advice_type: AdviceType,
    /// Query used when the caller did not ask anything specific
    pub default_query: &'static str,
    /// Category of canned and default advice
    pub category: AdviceCategory,
    /// Canned title used when generation is unavailable
    pub canned_title: &'static str,
    /// Canned body used when generation is unavailable
    pub canned_content: &'static str,
    /// Canned next steps
    pub canned_actions: &'static [&'static str],
    /// Words in a question that point at this type
    pub keywords: &'static [&'static str],
}

const TEMPLATES: [TypeTemplate; 8] = [
    TypeTemplate {
        advice_type: AdviceType::Fasting,
        default_query: "How can I make my fasting routine easier and more consistent?",
        category: AdviceCategory::Tip,
        canned_title: "Keep your fasts steady",
        canned_content: "Start your fasts at the same time each day and drink water regularly. If a fast feels too hard, a shorter protocol you complete is better than a longer one you abandon.",
        canned_actions: &["Pick a fixed start time", "Keep a water bottle nearby"],
        keywords: &["fast", "fasting", "fasted", "hunger", "hungry", "window", "omad", "autophagy"],
    },
    TypeTemplate {
        advice_type: AdviceType::Nutrition,
        default_query: "What should I eat during my eating window?",
        category: AdviceCategory::Tip,
        canned_title: "Build balanced meals",
        canned_content: "Center each meal on protein and vegetables, add some healthy fat, and log what you eat so patterns become visible.",
        canned_actions: &["Log your next meal", "Add a protein source to each meal"],
        keywords: &["eat", "meal", "meals", "food", "protein", "carb", "carbs", "calories", "diet", "snack", "breakfast", "lunch", "dinner"],
    },
    TypeTemplate {
        advice_type: AdviceType::Exercise,
        default_query: "How should I fit exercise around fasting?",
        category: AdviceCategory::Tip,
        canned_title: "Move most days",
        canned_content: "Aim for some movement four days a week. Light activity is fine while fasting; schedule harder sessions close to your eating window.",
        canned_actions: &["Take a 20 minute walk", "Plan two workouts this week"],
        keywords: &["exercise", "workout", "training", "run", "running", "gym", "walk", "lift", "cardio"],
    },
    TypeTemplate {
        advice_type: AdviceType::Sleep,
        default_query: "How can I sleep better while fasting?",
        category: AdviceCategory::Tip,
        canned_title: "Protect your sleep",
        canned_content: "Keep a consistent bedtime and finish your last meal two to three hours before bed.",
        canned_actions: &["Set a bedtime reminder", "Finish eating earlier tonight"],
        keywords: &["sleep", "bed", "bedtime", "insomnia", "tired", "rest", "nap"],
    },
    TypeTemplate {
        advice_type: AdviceType::WeightManagement,
        default_query: "How do I keep making progress on my weight goal?",
        category: AdviceCategory::Insight,
        canned_title: "Watch the trend, not the day",
        canned_content: "Weight moves around day to day. Look at the trend over a few weeks and keep your fasting and meal habits steady.",
        canned_actions: &["Weigh in at the same time each week"],
        keywords: &["weight", "scale", "plateau", "pounds", "kilos", "bmi", "fat"],
    },
    TypeTemplate {
        advice_type: AdviceType::Motivation,
        default_query: "Give me some encouragement to keep going.",
        category: AdviceCategory::Motivation,
        canned_title: "Every fast counts",
        canned_content: "Consistency matters more than perfection. Each completed fast builds the habit, and a missed one is just information.",
        canned_actions: &["Review your completed fasts"],
        keywords: &["motivation", "motivated", "give", "quit", "struggling", "encourage", "streak"],
    },
    TypeTemplate {
        advice_type: AdviceType::HealthReminder,
        default_query: "What should I keep in mind about fasting with my health conditions?",
        category: AdviceCategory::Reminder,
        canned_title: "Check in with your clinician",
        canned_content: "If you live with a chronic condition or take medication, review your fasting plan with your clinician and watch for dizziness or unusual fatigue.",
        canned_actions: &["Note any symptoms during fasts", "Book a check-up"],
        keywords: &["doctor", "medication", "medicine", "diabetes", "blood", "pressure", "condition", "dizzy", "symptom"],
    },
    TypeTemplate {
        advice_type: AdviceType::General,
        default_query: "What is one thing I can improve today?",
        category: AdviceCategory::Tip,
        canned_title: "One small step",
        canned_content: "Pick one habit to focus on today, whether a full fast, a logged meal, a walk or an earlier bedtime.",
        canned_actions: &["Choose today's focus"],
        keywords: &[],
    },
];

/// Template row for an advice type
#[must_use]
pub fn template_for(advice_type: AdviceType) -> &'static TypeTemplate {
    TEMPLATES
        .iter()
        .find(|t| t.advice_type == advice_type)
        .unwrap_or(&TEMPLATES[TEMPLATES.len() - 1])
}

/// Advice type whose keywords appear most often in `query`; ties go to the earlier row
#[must_use]
pub fn infer_type(query: &str) -> Option<AdviceType> {
    let words: Vec<String> = query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();

    let mut best: Option<(usize, AdviceType)> = None;
    for template in &TEMPLATES {
        let hits = words
            .iter()
            .filter(|w| template.keywords.contains(&w.as_str()))
            .count();
        if hits > 0 && best.is_none_or(|(top, _)| hits > top) {
            best = Some((hits, template.advice_type));
        }
    }
    best.map(|(_, advice_type)| advice_type)
}

/// Advice type and question produced by a proactive rule
#[must_use]
pub const fn trigger_request(trigger: TriggerKind) -> (AdviceType, &'static str) {
    match trigger {
        TriggerKind::MealLoggingGap => (
            AdviceType::Nutrition,
            "I haven't logged a meal in a few days. How do I get back on track with logging meals?",
        ),
        TriggerKind::WeightLossMotivation => (
            AdviceType::Motivation,
            "Encourage me to keep going with my weight loss goal.",
        ),
        TriggerKind::ChronicConditionReminder => (
            AdviceType::HealthReminder,
            "What should I keep in mind about fasting with my medical condition?",
        ),
        TriggerKind::LowFastingSuccess => (
            AdviceType::Fasting,
            "I keep abandoning my fasts. How can I complete more of them?",
        ),
        TriggerKind::IrregularMealTiming => (
            AdviceType::Nutrition,
            "My meal times are irregular. How do I make them more consistent?",
        ),
    }
}
